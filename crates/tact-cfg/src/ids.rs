use std::hash::Hash;

/// Raw arena index.
///
/// An `Idx` can only be minted by [`Arena::alloc`](crate::Arena::alloc), so a
/// typed identifier is always a valid reference into the store that created
/// it.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Idx(pub(crate) usize);

impl Idx {
    /// Return the raw index as `usize`.
    pub fn raw(self) -> usize {
        self.0
    }
}

pub trait EntityId:
    Sized + Clone + Copy + Hash + std::fmt::Debug + PartialEq + Eq + From<Idx> + Into<Idx>
{
}

macro_rules! entity {
    ($(#[$attr:meta])* struct $name:ident, $prefix:literal) => {
        $(#[$attr])*
        // Ord gives tests a stable sort order; it carries no graph meaning.
        #[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
        pub struct $name(pub(crate) Idx);

        impl From<Idx> for $name {
            fn from(value: Idx) -> Self {
                Self(value)
            }
        }

        impl From<$name> for Idx {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl crate::ids::EntityId for $name {}

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0.raw())
            }
        }
    };
}

entity! {
    /// A unique identifier for a basic block. Blocks are program-global:
    /// two blocks of different CFGs never share an id.
    struct Block, "bb"
}

entity! {
    /// A unique identifier for a control-flow edge.
    struct Edge, "e"
}

entity! {
    /// A unique identifier for a control-flow graph within a [`Program`].
    ///
    /// [`Program`]: crate::Program
    struct CfgId, "cfg"
}
