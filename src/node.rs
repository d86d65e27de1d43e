use core::ops::Not;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum NodeColor {
    #[default]
    Red,
    Black,
}

/// Side of a child relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Dir {
    Left = 0,
    Right = 1,
}

impl Not for Dir {
    type Output = Dir;

    fn not(self) -> Self::Output {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

/// Stable position of a node inside the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeIndex(pub(crate) usize);

pub(crate) type Link = Option<NodeIndex>;

#[derive(Debug, Clone)]
pub(crate) struct RedwoodNode<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) color: NodeColor,
    pub(crate) parent: Link,
    pub(crate) children: [Link; 2],
}

impl<K, V> RedwoodNode<K, V> {
    pub(crate) fn new_isolated(key: K, value: V) -> Self {
        Self {
            key,
            value,
            color: NodeColor::default(),
            parent: None,
            children: [None, None],
        }
    }

    #[inline]
    pub(crate) fn child(&self, dir: Dir) -> Link {
        self.children[dir as usize]
    }

    #[inline]
    pub(crate) fn set_child(&mut self, dir: Dir, child: Link) {
        self.children[dir as usize] = child;
    }

    #[inline]
    pub(crate) fn left_child(&self) -> Link {
        self.child(Dir::Left)
    }

    #[inline]
    pub(crate) fn right_child(&self) -> Link {
        self.child(Dir::Right)
    }

    #[inline]
    pub(crate) fn is_leaf(&self) -> bool {
        self.children == [None, None]
    }

    #[inline]
    pub(crate) fn is_red(&self) -> bool {
        self.color == NodeColor::Red
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_negation() {
        assert_eq!(!Dir::Left, Dir::Right);
        assert_eq!(!Dir::Right, Dir::Left);
    }

    #[test]
    fn isolated_node_is_red_leaf() {
        let node = RedwoodNode::new_isolated(1u32, "a");

        assert!(node.is_red());
        assert!(node.is_leaf());
        assert_eq!(node.parent, None);
    }

    #[test]
    fn child_accessors() {
        let mut node = RedwoodNode::new_isolated(1u32, ());
        node.set_child(Dir::Right, Some(NodeIndex(4)));

        assert_eq!(node.left_child(), None);
        assert_eq!(node.right_child(), Some(NodeIndex(4)));
        assert!(!node.is_leaf());
    }
}
