//! An ordered map built on a red-black tree whose nodes live in an arena.
//!
//! Nodes refer to their parent and children by arena index, so the tree needs no
//! reference counting and no unsafe pointer surgery. Every mutation restores the
//! red-black invariants before returning:
//!
//! 1. Keys are in binary-search-tree order.
//! 2. No red node has a red child.
//! 3. Every path from a node down to a missing child crosses the same number of black nodes.
//! 4. The root is black.
//! 5. Parent and child links agree with each other.
extern crate alloc;

use core::{borrow::Borrow, cmp::Ordering, fmt};

use log::{debug, trace};

mod arena;
mod error;
mod iter;
#[cfg(any(test, feature = "model"))]
pub mod model;
mod node;
mod set;


pub use error::{Error, Result};
pub use iter::Iter;
pub use set::RedwoodSet;

use arena::NodeArena;
use node::{Dir, Link, NodeColor, NodeIndex, RedwoodNode};

/// An ordered map based on a [red-black tree].
///
/// [red-black tree]: https://en.wikipedia.org/wiki/Red%E2%80%93black_tree
#[derive(Clone)]
pub struct Redwood<K, V> {
    arena: NodeArena<K, V>,
    root: Link,
}

impl<K, V> Redwood<K, V> {
    /// Returns a new empty tree. Does not allocate.
    pub const fn new() -> Self {
        Self {
            arena: NodeArena::new(),
            root: None,
        }
    }

    /// Returns a new empty tree with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            arena: NodeArena::with_capacity(capacity),
            root: None,
        }
    }

    /// Returns the number of entries in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Returns `true` if the tree contains no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let empty = self.root.is_none();
        debug_assert_eq!(empty, self.len() == 0);
        empty
    }

    /// Returns the number of nodes the tree can hold without reallocating.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// Reserves room for at least `additional` more entries.
    pub fn reserve(&mut self, additional: usize) {
        self.arena.reserve(additional);
    }

    /// Shrinks the backing storage as much as possible.
    ///
    /// Cells freed by removals are only released once the tree is empty.
    pub fn shrink_to_fit(&mut self) {
        self.arena.shrink_to_fit();
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        debug!("clearing tree of {} entries", self.len());
        self.arena.clear();
        self.root = None;
    }

    /// Returns the number of nodes on the longest path from the root to a leaf.
    #[must_use]
    pub fn height(&self) -> usize {
        self.root.map_or(0, |root| self.height_at(root))
    }

    fn height_at(&self, idx: NodeIndex) -> usize {
        let node = self.node(idx);
        let left = node.left_child().map_or(0, |child| self.height_at(child));
        let right = node.right_child().map_or(0, |child| self.height_at(child));

        1 + left.max(right)
    }

    /// Returns an iterator over the entries, in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self)
    }

    #[inline]
    pub(crate) fn root(&self) -> Link {
        self.root
    }

    #[inline]
    pub(crate) fn node(&self, idx: NodeIndex) -> &RedwoodNode<K, V> {
        self.arena.get(idx)
    }

    #[inline]
    fn node_mut(&mut self, idx: NodeIndex) -> &mut RedwoodNode<K, V> {
        self.arena.get_mut(idx)
    }

    #[inline]
    fn set_color(&mut self, idx: NodeIndex, color: NodeColor) {
        self.node_mut(idx).color = color;
    }

    // Side of `parent` that `child` hangs from.
    fn side_of(&self, parent: NodeIndex, child: NodeIndex) -> Dir {
        if self.node(parent).left_child() == Some(child) {
            Dir::Left
        } else {
            debug_assert_eq!(self.node(parent).right_child(), Some(child));
            Dir::Right
        }
    }

    // Walks from `idx` towards `dir` until there is no further child.
    fn extreme(&self, mut idx: NodeIndex, dir: Dir) -> NodeIndex {
        while let Some(next) = self.node(idx).child(dir) {
            idx = next;
        }
        idx
    }

    // Points the link of `parent` that referred to `old_child` at `new_child`, or
    // makes `new_child` the root if there is no parent.
    //
    // `new_child`'s parent link is not updated.
    fn replace_child_or_set_root(&mut self, parent: Link, old_child: NodeIndex, new_child: Link) {
        match parent {
            Some(parent) => {
                let side = self.side_of(parent, old_child);
                self.node_mut(parent).set_child(side, new_child);
            }
            None => self.root = new_child,
        }
    }

    /// Rotates the subtree rooted at `center` towards `dir`.
    ///
    /// `Dir::Left` is a left rotation: the right child of `center` takes its place
    /// and `center` becomes that child's left child. `Dir::Right` mirrors it.
    ///
    /// The child on the side opposite to `dir` must exist.
    fn rotate(&mut self, center: NodeIndex, dir: Dir) {
        let pivot = self
            .node(center)
            .child(!dir)
            .expect("rotation pivot must exist");
        let grandparent = self.node(center).parent;
        let inner = self.node(pivot).child(dir);

        trace!("rotate {dir:?} at {center:?}, pivot {pivot:?}");

        self.node_mut(center).set_child(!dir, inner);
        if let Some(inner) = inner {
            self.node_mut(inner).parent = Some(center);
        }

        self.replace_child_or_set_root(grandparent, center, Some(pivot));
        self.node_mut(pivot).parent = grandparent;

        self.node_mut(pivot).set_child(dir, Some(center));
        self.node_mut(center).parent = Some(pivot);
    }

    /// Exchanges the tree positions of `a` and `b`.
    ///
    /// Links and colors trade places, keys and values stay in their nodes. Either
    /// node may be the parent of the other.
    fn swap_positions(&mut self, a: NodeIndex, b: NodeIndex) {
        if a == b {
            return;
        }

        let swap = move |link: Link| {
            link.map(|idx| match idx {
                idx if idx == a => b,
                idx if idx == b => a,
                idx => idx,
            })
        };

        let (a_parent, a_children, a_color) = {
            let node = self.node(a);
            (node.parent, node.children, node.color)
        };
        let (b_parent, b_children, b_color) = {
            let node = self.node(b);
            (node.parent, node.children, node.color)
        };

        // Sides are read before any link moves; `a` and `b` may share a parent.
        let a_side = a_parent.map(|parent| self.side_of(parent, a));
        let b_side = b_parent.map(|parent| self.side_of(parent, b));

        {
            let node = self.node_mut(a);
            node.parent = swap(b_parent);
            node.children = b_children.map(swap);
            node.color = b_color;
        }
        {
            let node = self.node_mut(b);
            node.parent = swap(a_parent);
            node.children = a_children.map(swap);
            node.color = a_color;
        }

        match (a_parent, a_side) {
            (Some(parent), Some(side)) if parent != b => {
                self.node_mut(parent).set_child(side, Some(b));
            }
            (None, _) => self.root = Some(b),
            _ => {}
        }
        match (b_parent, b_side) {
            (Some(parent), Some(side)) if parent != a => {
                self.node_mut(parent).set_child(side, Some(a));
            }
            (None, _) => self.root = Some(a),
            _ => {}
        }

        for (idx, children) in [(a, self.node(a).children), (b, self.node(b).children)] {
            for child in children.into_iter().flatten() {
                self.node_mut(child).parent = Some(idx);
            }
        }
    }

    /// Asserts that every red-black invariant holds, returning the black-height of the tree.
    #[doc(hidden)]
    pub fn assert_invariants(&self) -> usize
    where
        K: Ord,
    {
        let Some(root) = self.root else {
            assert_eq!(self.len(), 0, "empty tree reports live nodes");
            return 0;
        };

        let root_node = self.node(root);
        assert_eq!(root_node.parent, None, "root has a parent link");
        assert!(!root_node.is_red(), "root is red");

        let (count, black_height) = self.assert_invariants_at(root, None, None);
        assert_eq!(count, self.len(), "reachable nodes differ from live nodes");

        black_height
    }

    fn assert_invariants_at<'a>(
        &'a self,
        idx: NodeIndex,
        lower: Option<&'a K>,
        upper: Option<&'a K>,
    ) -> (usize, usize)
    where
        K: Ord,
    {
        let node = self.node(idx);

        if let Some(lower) = lower {
            assert!(node.key > *lower, "key order violated at {idx:?}");
        }
        if let Some(upper) = upper {
            assert!(node.key < *upper, "key order violated at {idx:?}");
        }

        let mut count = 1;
        let mut black_heights = [0; 2];

        for dir in [Dir::Left, Dir::Right] {
            let Some(child) = node.child(dir) else {
                continue;
            };
            let child_node = self.node(child);

            assert_eq!(
                child_node.parent,
                Some(idx),
                "parent link of {child:?} does not point back to {idx:?}"
            );
            assert!(
                !(node.is_red() && child_node.is_red()),
                "red node {idx:?} has red child {child:?}"
            );

            let (lower, upper) = match dir {
                Dir::Left => (lower, Some(&node.key)),
                Dir::Right => (Some(&node.key), upper),
            };
            let (child_count, child_black_height) = self.assert_invariants_at(child, lower, upper);

            count += child_count;
            black_heights[dir as usize] = child_black_height;
        }

        assert_eq!(
            black_heights[0], black_heights[1],
            "black-height differs between the subtrees of {idx:?}"
        );

        (count, black_heights[0] + usize::from(!node.is_red()))
    }
}

impl<K: Ord, V> Redwood<K, V> {
    fn find<Q>(&self, key: &Q) -> Link
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut current_node = self.root;

        while let Some(idx) = current_node {
            let node = self.node(idx);

            match key.cmp(node.key.borrow()) {
                Ordering::Less => current_node = node.left_child(),
                Ordering::Equal => return Some(idx),
                Ordering::Greater => current_node = node.right_child(),
            }
        }

        None
    }

    /// Returns `true` if the tree contains an entry for `key`.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).is_some()
    }

    /// Returns a reference to the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the tree has no entry for `key`.
    pub fn get<Q>(&self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let idx = self.find(key).ok_or(Error::NotFound)?;
        Ok(&self.node(idx).value)
    }

    /// Returns a mutable reference to the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the tree has no entry for `key`.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Result<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let idx = self.find(key).ok_or(Error::NotFound)?;
        Ok(&mut self.node_mut(idx).value)
    }

    /// Stores `value` under `key`, replacing the value of an existing entry.
    ///
    /// Overwriting an existing entry leaves the shape of the tree untouched.
    /// This operation completes in _O(log(n))_ time.
    pub fn set(&mut self, key: K, value: V) -> &mut Self {
        let mut current_node = self.root;
        let mut parent_node = None;
        let mut dir = Dir::Left;

        while let Some(idx) = current_node {
            let node = self.node_mut(idx);

            dir = match key.cmp(&node.key) {
                Ordering::Less => Dir::Left,
                Ordering::Equal => {
                    node.value = value;
                    return self;
                }
                Ordering::Greater => Dir::Right,
            };

            parent_node = Some(idx);
            current_node = node.child(dir);
        }

        let new_node = self.arena.alloc(RedwoodNode::new_isolated(key, value));

        match parent_node {
            None => {
                self.set_color(new_node, NodeColor::Black);
                self.root = Some(new_node);
            }
            Some(parent) => {
                self.node_mut(parent).set_child(dir, Some(new_node));
                self.node_mut(new_node).parent = Some(parent);
                self.fix_red_violation(new_node);
            }
        }

        self
    }

    // Restores the "no red node has a red child" rule after `start_node` was
    // inserted red. Only `start_node` and its parent may be in violation.
    fn fix_red_violation(&mut self, start_node: NodeIndex) {
        let mut curr_node = start_node;

        loop {
            debug_assert!(self.node(curr_node).is_red());

            let Some(parent) = self.node(curr_node).parent else {
                trace!("red-red repair reached the root at {curr_node:?}");
                self.set_color(curr_node, NodeColor::Black);
                return;
            };

            if !self.node(parent).is_red() {
                return;
            }

            let grandparent = self
                .node(parent)
                .parent
                .expect("a red node is never the root");
            let parent_side = self.side_of(grandparent, parent);
            let uncle = self.node(grandparent).child(!parent_side);

            if let Some(uncle) = uncle.filter(|&uncle| self.node(uncle).is_red()) {
                trace!("red uncle {uncle:?}, recoloring and moving to {grandparent:?}");

                self.set_color(parent, NodeColor::Black);
                self.set_color(uncle, NodeColor::Black);
                self.set_color(grandparent, NodeColor::Red);

                curr_node = grandparent;
                continue;
            }

            if self.side_of(parent, curr_node) == parent_side {
                trace!("black uncle, outer child {curr_node:?}");

                self.rotate(grandparent, !parent_side);
                self.set_color(parent, NodeColor::Black);
                self.set_color(grandparent, NodeColor::Red);
            } else {
                trace!("black uncle, inner child {curr_node:?}");

                self.rotate(parent, parent_side);
                self.rotate(grandparent, !parent_side);
                self.set_color(grandparent, NodeColor::Red);
                self.set_color(curr_node, NodeColor::Black);
            }

            return;
        }
    }

    /// Removes the entry for `key`, if any.
    ///
    /// Removing a key that is not in the tree is a no-op.
    /// This operation completes in _O(log(n))_ time.
    pub fn remove<Q>(&mut self, key: &Q) -> &mut Self
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.take(key);
        self
    }

    /// Removes the entry for `key` and returns its value.
    pub fn take<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let target = self.find(key)?;
        let (_, value) = self.remove_at(target);

        Some(value)
    }

    // In-order neighbour that `target` trades places with on its way down to a
    // leaf position: the successor when there is a right subtree, else the
    // predecessor.
    fn removal_neighbor(&self, target: NodeIndex) -> Link {
        let node = self.node(target);

        if let Some(right) = node.right_child() {
            Some(self.extreme(right, Dir::Left))
        } else {
            node.left_child().map(|left| self.extreme(left, Dir::Right))
        }
    }

    fn remove_at(&mut self, target: NodeIndex) -> (K, V) {
        while let Some(neighbor) = self.removal_neighbor(target) {
            trace!("moving {target:?} below its neighbour {neighbor:?}");
            self.swap_positions(target, neighbor);
        }

        let node = self.node(target);
        debug_assert!(node.is_leaf());

        let (parent, was_red) = (node.parent, node.is_red());

        match parent {
            None => self.root = None,
            Some(parent) => {
                let side = self.side_of(parent, target);
                self.node_mut(parent).set_child(side, None);

                if !was_red {
                    self.fix_black_deficit(parent, side);
                }
            }
        }

        let RedwoodNode { key, value, .. } = self.arena.free(target);
        (key, value)
    }

    // Restores equal black-heights after the subtree hanging from `parent` on
    // side `dir` lost one black node. The sibling subtree on `!dir` must exist.
    fn fix_black_deficit(&mut self, mut parent: NodeIndex, mut dir: Dir) {
        loop {
            let sibling = self
                .node(parent)
                .child(!dir)
                .expect("the sibling of a black-height deficit always exists");

            if self.node(sibling).is_red() {
                trace!("red sibling {sibling:?}, rotating {dir:?} at {parent:?}");

                // The father is black here. After the rotation it is red and the
                // deficit stays below it, where the cases below finish the repair.
                self.set_color(sibling, NodeColor::Black);
                self.set_color(parent, NodeColor::Red);
                self.rotate(parent, dir);
                continue;
            }

            let father_color = self.node(parent).color;
            let far = self.node(sibling).child(!dir);
            let near = self.node(sibling).child(dir);

            if let Some(far) = far.filter(|&far| self.node(far).is_red()) {
                trace!("red far nephew {far:?}, rotating {dir:?} at {parent:?}");

                self.set_color(sibling, father_color);
                self.set_color(parent, NodeColor::Black);
                self.set_color(far, NodeColor::Black);
                self.rotate(parent, dir);
                return;
            }

            if let Some(near) = near.filter(|&near| self.node(near).is_red()) {
                trace!("red near nephew {near:?}, double rotation at {parent:?}");

                self.set_color(near, father_color);
                self.set_color(parent, NodeColor::Black);
                self.rotate(sibling, !dir);
                self.rotate(parent, dir);
                return;
            }

            self.set_color(sibling, NodeColor::Red);

            if father_color == NodeColor::Red {
                trace!("red father {parent:?} absorbs the deficit");
                self.set_color(parent, NodeColor::Black);
                return;
            }

            match self.node(parent).parent {
                Some(grandparent) => {
                    trace!("deficit moves up from {parent:?} to {grandparent:?}");
                    dir = self.side_of(grandparent, parent);
                    parent = grandparent;
                }
                None => return,
            }
        }
    }
}

impl<K, V> Default for Redwood<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Redwood<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Ord, V> Extend<(K, V)> for Redwood<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.set(key, value);
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for Redwood<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<'a, K, V> IntoIterator for &'a Redwood<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
