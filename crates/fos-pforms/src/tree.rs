//! Balanced Interval Tree
//!
//! AVL tree keyed by inclusive `[first, last]` ranges of 64-bit keys. The
//! character classification table stores one code point or a range of code
//! points per node; the ligature tables store one packed code point pair per
//! node (see [`crate::ligature_key`]).
//!
//! Nodes are kept in an arena and refer to their children by index, so the
//! tree owns all of its data and is freed in one go with its owner.

/// Index of a node in the arena
type NodeIndex = usize;

/// Side of a subtree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

impl Side {
    fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// Where a node is linked from: the root slot or a child slot of a parent
#[derive(Debug, Clone, Copy)]
enum Link {
    Root,
    Child(NodeIndex, Side),
}

#[derive(Debug, Clone)]
struct Node<T> {
    first: u64,
    last: u64,
    left: Option<NodeIndex>,
    right: Option<NodeIndex>,
    /// Taller subtree, `None` when both have the same height
    balance: Option<Side>,
    value: T,
}

/// Insertion rejected because the new range intersects a stored one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlap {
    /// First key of the stored range
    pub first: u64,
    /// Last key of the stored range
    pub last: u64,
}

/// AVL tree of non-overlapping inclusive ranges
#[derive(Debug, Clone)]
pub struct IntervalTree<T> {
    nodes: Vec<Node<T>>,
    root: Option<NodeIndex>,
}

impl<T> IntervalTree<T> {
    /// Create an empty tree
    pub fn new() -> Self {
        Self { nodes: Vec::new(), root: None }
    }

    /// Number of stored ranges
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn child(&self, at: NodeIndex, side: Side) -> Option<NodeIndex> {
        match side {
            Side::Left => self.nodes[at].left,
            Side::Right => self.nodes[at].right,
        }
    }

    fn set_child(&mut self, at: NodeIndex, side: Side, to: Option<NodeIndex>) {
        match side {
            Side::Left => self.nodes[at].left = to,
            Side::Right => self.nodes[at].right = to,
        }
    }

    fn follow(&self, link: Link) -> Option<NodeIndex> {
        match link {
            Link::Root => self.root,
            Link::Child(at, side) => self.child(at, side),
        }
    }

    fn relink(&mut self, link: Link, to: NodeIndex) {
        match link {
            Link::Root => self.root = Some(to),
            Link::Child(at, side) => self.set_child(at, side, Some(to)),
        }
    }

    /// Insert the range `[first, last]`
    ///
    /// Fails, leaving the tree untouched, when any stored range shares a key
    /// with the new one.
    pub fn insert(&mut self, first: u64, last: u64, value: T) -> Result<(), Overlap> {
        debug_assert!(first <= last);

        let new = self.nodes.len();
        let node = Node { first, last, left: None, right: None, balance: None, value };

        let Some(mut p) = self.root else {
            self.nodes.push(node);
            self.root = Some(new);
            return Ok(());
        };

        // `s` is the last node on the path with a non-zero balance factor,
        // `t` the link it hangs from. Rebalancing never reaches above it.
        let mut s = p;
        let mut t = Link::Root;

        let insert_at = loop {
            let current = &self.nodes[p];
            if first <= current.last && last >= current.first {
                return Err(Overlap { first: current.first, last: current.last });
            }

            let side = if first > current.last { Side::Right } else { Side::Left };
            let link = Link::Child(p, side);
            match self.follow(link) {
                None => break link,
                Some(next) => {
                    p = next;
                    if self.nodes[next].balance.is_some() {
                        s = next;
                        t = link;
                    }
                }
            }
        };

        self.nodes.push(node);
        self.relink(insert_at, new);

        let a = if last < self.nodes[s].first { Side::Left } else { Side::Right };
        let r = self.child(s, a).unwrap_or(new);

        // Everything strictly between `s` and the new node was balanced and
        // now leans towards the new node.
        let mut p = r;
        while p != new {
            let side = if last < self.nodes[p].first { Side::Left } else { Side::Right };
            self.nodes[p].balance = Some(side);
            match self.child(p, side) {
                Some(next) => p = next,
                None => break,
            }
        }

        match self.nodes[s].balance {
            None => self.nodes[s].balance = Some(a),
            Some(lean) if lean != a => self.nodes[s].balance = None,
            Some(_) => {
                let top = match (self.nodes[r].balance == Some(a), self.child(r, a.opposite())) {
                    (false, Some(p)) => self.rotate_double(s, r, p, a),
                    _ => self.rotate_single(s, r, a),
                };
                self.relink(t, top);
            }
        }

        Ok(())
    }

    fn rotate_single(&mut self, s: NodeIndex, r: NodeIndex, a: Side) -> NodeIndex {
        let inner = self.child(r, a.opposite());
        self.set_child(s, a, inner);
        self.set_child(r, a.opposite(), Some(s));
        self.nodes[s].balance = None;
        self.nodes[r].balance = None;
        r
    }

    fn rotate_double(&mut self, s: NodeIndex, r: NodeIndex, p: NodeIndex, a: Side) -> NodeIndex {
        let b = a.opposite();

        let p_outer = self.child(p, a);
        let p_inner = self.child(p, b);
        self.set_child(r, b, p_outer);
        self.set_child(p, a, Some(r));
        self.set_child(s, a, p_inner);
        self.set_child(p, b, Some(s));

        let lean = self.nodes[p].balance;
        self.nodes[s].balance = if lean == Some(a) { Some(b) } else { None };
        self.nodes[r].balance = if lean == Some(b) { Some(a) } else { None };
        self.nodes[p].balance = None;
        p
    }

    /// Find the value whose range contains `key`
    pub fn search(&self, key: u64) -> Option<&T> {
        let mut p = self.root;
        while let Some(at) = p {
            let node = &self.nodes[at];
            if key >= node.first && key <= node.last {
                return Some(&node.value);
            }
            p = if key < node.first { node.left } else { node.right };
        }
        None
    }

    /// Iterate over `(first, last, value)` in key order
    pub fn iter(&self) -> Iter<'_, T> {
        let mut iter = Iter { tree: self, stack: Vec::new() };
        iter.descend(self.root);
        iter
    }

    #[cfg(test)]
    fn height_at(&self, at: Option<NodeIndex>) -> usize {
        match at {
            None => 0,
            Some(at) => {
                1 + self
                    .height_at(self.nodes[at].left)
                    .max(self.height_at(self.nodes[at].right))
            }
        }
    }

    /// Every node's subtrees differ in height by at most one
    #[cfg(test)]
    fn is_balanced(&self) -> bool {
        (0..self.nodes.len()).all(|at| {
            let left = self.height_at(self.nodes[at].left);
            let right = self.height_at(self.nodes[at].right);
            left.abs_diff(right) <= 1
        })
    }
}

impl<T> Default for IntervalTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// In-order iterator over an [`IntervalTree`]
pub struct Iter<'a, T> {
    tree: &'a IntervalTree<T>,
    stack: Vec<NodeIndex>,
}

impl<'a, T> Iter<'a, T> {
    fn descend(&mut self, mut at: Option<NodeIndex>) {
        while let Some(node) = at {
            self.stack.push(node);
            at = self.tree.nodes[node].left;
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (u64, u64, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let at = self.stack.pop()?;
        let node = &self.tree.nodes[at];
        self.descend(node.right);
        Some((node.first, node.last, &node.value))
    }
}
