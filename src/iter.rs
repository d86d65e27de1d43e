use core::iter::FusedIterator;

use alloc::vec::Vec;

use crate::{
    Redwood,
    node::{Link, NodeIndex},
};

/// In-order iterator over the entries of a [`Redwood`].
pub struct Iter<'a, K, V> {
    tree: &'a Redwood<K, V>,
    curr: Link,
    stack: Vec<NodeIndex>,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(tree: &'a Redwood<K, V>) -> Self {
        Self {
            tree,
            curr: tree.root(),
            stack: Vec::new(),
            remaining: tree.len(),
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.tree;

        while let Some(idx) = self.curr {
            self.stack.push(idx);
            self.curr = tree.node(idx).left_child();
        }

        let node = tree.node(self.stack.pop()?);
        self.curr = node.right_child();
        self.remaining -= 1;

        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            curr: self.curr,
            stack: self.stack.clone(),
            remaining: self.remaining,
        }
    }
}
