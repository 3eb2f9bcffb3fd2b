use rustc_hash::FxHashSet;
use tact_cfg::Block;

use tact_absint::{HasBottom, HasTop, JoinSemiLattice, Widen};

/// Saturating counter capped at `K`: a chain lattice of height `K + 1`.
///
/// Handy for termination tests, because the number of loop iterations the
/// solver can spend on this domain is bounded by the cap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Clamp<const K: u64>(pub u64);

impl<const K: u64> Clamp<K> {
    /// The transfer function of a "count one step" block.
    pub fn bump(self) -> Self {
        Clamp(self.0.saturating_add(1).min(K))
    }
}

impl<const K: u64> JoinSemiLattice for Clamp<K> {
    fn join(&self, other: &Self) -> Self {
        Clamp(self.0.max(other.0))
    }

    fn is_subseteq(&self, other: &Self) -> bool {
        self.0 <= other.0
    }
}

impl<const K: u64> HasBottom for Clamp<K> {
    fn bottom() -> Self {
        Clamp(0)
    }
}

impl<const K: u64> HasTop for Clamp<K> {
    fn top() -> Self {
        Clamp(K)
    }
}

impl<const K: u64> Widen for Clamp<K> {
    fn widen(&self, next: &Self) -> Self {
        if next.0 > self.0 { Clamp(K) } else { *self }
    }
}

/// The flat lattice over `T`: bottom, a single known value, or top.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flat<T> {
    None,
    Value(T),
    Any,
}

impl<T: Clone + PartialEq> JoinSemiLattice for Flat<T> {
    fn join(&self, other: &Self) -> Self {
        match (self, other) {
            (Flat::None, x) | (x, Flat::None) => x.clone(),
            (Flat::Value(a), Flat::Value(b)) if a == b => self.clone(),
            _ => Flat::Any,
        }
    }

    fn is_subseteq(&self, other: &Self) -> bool {
        match (self, other) {
            (Flat::None, _) | (_, Flat::Any) => true,
            (Flat::Value(a), Flat::Value(b)) => a == b,
            _ => false,
        }
    }
}

impl<T: Clone + PartialEq> HasBottom for Flat<T> {
    fn bottom() -> Self {
        Flat::None
    }
}

impl<T: Clone + PartialEq> HasTop for Flat<T> {
    fn top() -> Self {
        Flat::Any
    }
}

/// Powerset of blocks under union, used to track which blocks a value has
/// flowed through.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReachSet(pub FxHashSet<Block>);

impl ReachSet {
    pub fn with(mut self, block: Block) -> Self {
        self.0.insert(block);
        self
    }

    pub fn contains(&self, block: Block) -> bool {
        self.0.contains(&block)
    }
}

impl JoinSemiLattice for ReachSet {
    fn join(&self, other: &Self) -> Self {
        let mut out = self.0.clone();
        out.extend(other.0.iter().copied());
        ReachSet(out)
    }

    fn is_subseteq(&self, other: &Self) -> bool {
        self.0.is_subset(&other.0)
    }
}

impl HasBottom for ReachSet {
    fn bottom() -> Self {
        ReachSet::default()
    }
}
