use core::{borrow::Borrow, fmt};

use crate::Redwood;

/// An ordered set of keys.
///
/// Uses a Redwood red-black tree with an empty value type.
#[derive(Clone)]
pub struct RedwoodSet<K> {
    tree: Redwood<K, ()>,
}

impl<K> RedwoodSet<K> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tree: Redwood::new(),
        }
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tree: Redwood::with_capacity(capacity),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Returns an iterator over the keys, in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &K> + '_ {
        self.tree.iter().map(|(key, ())| key)
    }
}

impl<K: Ord> RedwoodSet<K> {
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.contains(key)
    }

    /// Adds `key` to the set. Returns `false` if it was already present.
    pub fn insert(&mut self, key: K) -> bool {
        if self.tree.contains(&key) {
            return false;
        }

        self.tree.set(key, ());
        true
    }

    /// Removes `key` from the set. Returns `false` if it was not present.
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.take(key).is_some()
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self) -> usize {
        self.tree.assert_invariants()
    }
}

impl<K> Default for RedwoodSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug> fmt::Debug for RedwoodSet<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K: Ord> Extend<K> for RedwoodSet<K> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        self.tree.extend(iter.into_iter().map(|key| (key, ())));
    }
}

impl<K: Ord> FromIterator<K> for RedwoodSet<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

#[cfg(test)]
mod tests {
    use super::RedwoodSet;

    #[test]
    pub fn set_multi_insertion() {
        let mut set = RedwoodSet::<usize>::new();

        assert!(set.insert(3));
        assert!(set.insert(2));
        assert!(set.insert(1));
        assert!(!set.insert(3));

        assert!(set.contains(&2));
        assert!(set.contains(&1));
        assert!(set.contains(&3));
        assert_eq!(set.len(), 3);
        set.assert_invariants();
    }

    #[test]
    pub fn set_remove() {
        let mut set: RedwoodSet<usize> = (0..16).collect();

        assert!(set.remove(&7));
        assert!(!set.remove(&7));
        assert!(!set.contains(&7));
        assert_eq!(set.len(), 15);
        set.assert_invariants();
    }

    #[test]
    pub fn set_borrowed_lookup() {
        let set: RedwoodSet<String> = ["pear", "apple", "fig"]
            .map(String::from)
            .into_iter()
            .collect();

        assert!(set.contains("fig"));
        assert!(!set.contains("plum"));
        assert_eq!(set.iter().collect::<Vec<_>>(), ["apple", "fig", "pear"]);
    }
}
