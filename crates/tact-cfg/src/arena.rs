use crate::ids::{EntityId, Idx};

/// A typed, append-only store.
///
/// Entities are never removed: a CFG is built once and then consumed
/// read-only by the analyses, so identifiers stay valid for the lifetime of
/// the store.
#[derive(Debug, Clone)]
pub struct Arena<I: EntityId, T> {
    items: Vec<T>,
    marker: std::marker::PhantomData<I>,
}

impl<I: EntityId, T> Default for Arena<I, T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            marker: std::marker::PhantomData,
        }
    }
}

impl<I: EntityId, T> Arena<I, T> {
    pub fn next_id(&self) -> I {
        I::from(Idx(self.items.len()))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Allocate a new item and return its identifier.
    pub fn alloc(&mut self, item: T) -> I {
        let id = self.next_id();
        self.items.push(item);
        id
    }

    pub fn get(&self, id: impl Into<I>) -> Option<&T> {
        self.items.get(id.into().into().raw())
    }

    pub fn get_mut(&mut self, id: impl Into<I>) -> Option<&mut T> {
        self.items.get_mut(id.into().into().raw())
    }

    pub fn ids(&self) -> impl Iterator<Item = I> + use<I, T> {
        (0..self.items.len()).map(|i| I::from(Idx(i)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| (I::from(Idx(i)), item))
    }
}

impl<T, I: EntityId> std::ops::Index<I> for Arena<I, T> {
    type Output = T;

    fn index(&self, index: I) -> &Self::Output {
        &self.items[index.into().raw()]
    }
}

impl<T, I: EntityId> std::ops::IndexMut<I> for Arena<I, T> {
    fn index_mut(&mut self, index: I) -> &mut Self::Output {
        &mut self.items[index.into().raw()]
    }
}
