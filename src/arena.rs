use alloc::vec::Vec;

use log::debug;

use crate::node::{NodeIndex, RedwoodNode};

// Freed cells form a linked list threaded through the vacant slots. The head
// lives in the arena; allocating pops the head, freeing pushes the cell.
#[derive(Debug, Clone)]
enum Slot<K, V> {
    Occupied(RedwoodNode<K, V>),
    Vacant { next_free: Option<NodeIndex> },
}

/// Node storage owning every live node of a tree.
#[derive(Debug, Clone)]
pub(crate) struct NodeArena<K, V> {
    storage: Vec<Slot<K, V>>,
    free_head: Option<NodeIndex>,
    len: usize,
}

impl<K, V> NodeArena<K, V> {
    pub(crate) const fn new() -> Self {
        Self {
            storage: Vec::new(),
            free_head: None,
            len: 0,
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: Vec::with_capacity(capacity),
            free_head: None,
            len: 0,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    /// Reserves room for `additional` more nodes, counting vacant cells as free room.
    pub(crate) fn reserve(&mut self, additional: usize) {
        let vacant = self.storage.len() - self.len;
        self.storage.reserve(additional.saturating_sub(vacant));
    }

    /// Releases unused memory. Vacant cells can only be dropped once no live node
    /// remains, since indices of live nodes must stay stable.
    pub(crate) fn shrink_to_fit(&mut self) {
        if self.len == 0 {
            self.storage.clear();
            self.free_head = None;
        }
        self.storage.shrink_to_fit();
    }

    pub(crate) fn alloc(&mut self, node: RedwoodNode<K, V>) -> NodeIndex {
        self.len += 1;

        if let Some(idx) = self.free_head {
            let slot = &mut self.storage[idx.0];
            let Slot::Vacant { next_free } = *slot else {
                unreachable!("free list points at an occupied cell {idx:?}");
            };

            self.free_head = next_free;
            *slot = Slot::Occupied(node);
            return idx;
        }

        if self.storage.len() == self.storage.capacity() {
            debug!("growing node arena past {} cells", self.storage.len());
        }

        let idx = NodeIndex(self.storage.len());
        self.storage.push(Slot::Occupied(node));
        idx
    }

    /// Moves the node out of its cell and puts the cell on the free list.
    pub(crate) fn free(&mut self, idx: NodeIndex) -> RedwoodNode<K, V> {
        let vacant = Slot::Vacant {
            next_free: self.free_head,
        };

        match core::mem::replace(&mut self.storage[idx.0], vacant) {
            Slot::Occupied(node) => {
                self.free_head = Some(idx);
                self.len -= 1;
                node
            }
            Slot::Vacant { .. } => unreachable!("double free of node {idx:?}"),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.storage.clear();
        self.free_head = None;
        self.len = 0;
    }

    #[inline]
    pub(crate) fn get(&self, idx: NodeIndex) -> &RedwoodNode<K, V> {
        match &self.storage[idx.0] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => unreachable!("access to freed node {idx:?}"),
        }
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, idx: NodeIndex) -> &mut RedwoodNode<K, V> {
        match &mut self.storage[idx.0] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => unreachable!("access to freed node {idx:?}"),
        }
    }
}
