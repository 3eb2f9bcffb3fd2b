/// A join-semilattice of abstract values.
///
/// Implementations must satisfy the usual laws:
///
/// - `join` is commutative, associative and idempotent;
/// - `is_subseteq` is the partial order induced by `join`, i.e.
///   `a.is_subseteq(b)` iff `a.join(b) == b`.
///
/// Termination of the solver additionally requires that every ascending
/// chain produced by joining transfer-function outputs stabilizes.
pub trait JoinSemiLattice: Sized {
    /// Least upper bound of `self` and `other`.
    fn join(&self, other: &Self) -> Self;

    /// In-place join, `*self = self ⊔ other`.
    fn join_with(&mut self, other: &Self) {
        *self = self.join(other);
    }

    /// Partial-order test, `self ⊑ other`.
    fn is_subseteq(&self, other: &Self) -> bool;
}

/// Lattices with a least element, the identity of `join`.
pub trait HasBottom: JoinSemiLattice {
    fn bottom() -> Self;

    fn is_bottom(&self) -> bool
    where
        Self: PartialEq,
    {
        *self == Self::bottom()
    }
}

/// Lattices with a greatest element.
pub trait HasTop: JoinSemiLattice {
    fn top() -> Self;
}
