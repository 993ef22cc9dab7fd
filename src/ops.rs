//! Search, insert, delete and teardown over caller-held root handles.
//!
//! Every mutating call takes the current root and returns the root of the same
//! logical tree afterwards. Rotations and deletions can change which node is
//! the root, so callers must always store the returned handle.

use std::cmp::Ordering;
use std::fmt::Write as _;
use std::iter::FusedIterator;

use tracing::debug;

use crate::arena::{Key, Node, NodeArena, NodeId};
use crate::error::InsertResult;

impl<V> NodeArena<V> {
    /// Find the node holding `key`. Read-only.
    pub fn search(&self, root: Option<NodeId>, key: Key) -> Option<NodeId> {
        let mut current = root;
        while let Some(id) = current {
            let node = self.node(id);
            current = match key.cmp(&node.key) {
                Ordering::Equal => return Some(id),
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
            };
        }
        None
    }

    /// Insert `key` or replace its value, returning the new root.
    ///
    /// Replacing a value leaves the shape of the tree untouched. If a new node
    /// cannot be allocated the tree is unchanged and the error carries `value`
    /// back to the caller.
    pub fn insert(&mut self, root: Option<NodeId>, key: Key, value: V) -> InsertResult<NodeId, V> {
        self.insert_replace(root, key, value).map(|(root, _)| root)
    }

    /// Like [`insert`](Self::insert), also handing back the value that was
    /// replaced, if any.
    pub(crate) fn insert_replace(
        &mut self,
        node: Option<NodeId>,
        key: Key,
        value: V,
    ) -> InsertResult<(NodeId, Option<V>), V> {
        let Some(id) = node else {
            return self.alloc(key, value).map(|id| (id, None));
        };

        let current = self.node(id);
        let (left, right) = (current.left, current.right);

        match key.cmp(&current.key) {
            Ordering::Equal => {
                let old = std::mem::replace(&mut self.node_mut(id).value, value);
                return Ok((id, Some(old)));
            }
            Ordering::Less => {
                let (child, replaced) = self.insert_replace(left, key, value)?;
                if replaced.is_some() {
                    return Ok((id, replaced));
                }
                self.node_mut(id).left = Some(child);
            }
            Ordering::Greater => {
                let (child, replaced) = self.insert_replace(right, key, value)?;
                if replaced.is_some() {
                    return Ok((id, replaced));
                }
                self.node_mut(id).right = Some(child);
            }
        }

        self.update_height(id);
        Ok((self.rebalance(id), None))
    }

    /// Remove `key`, returning the new root. Removing a missing key is a no-op.
    pub fn delete(&mut self, root: Option<NodeId>, key: Key) -> Option<NodeId> {
        self.take(root, key).0
    }

    /// Remove `key`, returning the new root together with the removed value.
    pub fn take(&mut self, node: Option<NodeId>, key: Key) -> (Option<NodeId>, Option<V>) {
        let Some(id) = node else {
            return (None, None);
        };

        let current = self.node(id);
        let (left, right) = (current.left, current.right);

        let removed = match key.cmp(&current.key) {
            Ordering::Less => {
                let (child, removed) = self.take(left, key);
                self.node_mut(id).left = child;
                removed
            }
            Ordering::Greater => {
                let (child, removed) = self.take(right, key);
                self.node_mut(id).right = child;
                removed
            }
            Ordering::Equal => match (left, right) {
                (None, None) => return (None, Some(self.release(id).value)),
                (Some(child), None) | (None, Some(child)) => {
                    return (Some(child), Some(self.release(id).value));
                }
                (Some(_), Some(right)) => {
                    // The in-order successor has no left child, so removing it
                    // from the right subtree hits one of the cases above. Its
                    // entry then moves into this node, which stays in place.
                    let successor_key = self.node(self.leftmost(right)).key;
                    let (child, successor) = self.take(Some(right), successor_key);
                    let successor = successor.expect("successor is in the right subtree");

                    let node = self.node_mut(id);
                    node.right = child;
                    node.key = successor_key;
                    Some(std::mem::replace(&mut node.value, successor))
                }
            },
        };

        if removed.is_none() {
            return (Some(id), None);
        }

        self.update_height(id);
        (Some(self.rebalance(id)), removed)
    }

    fn leftmost(&self, mut id: NodeId) -> NodeId {
        while let Some(left) = self.node(id).left {
            id = left;
        }
        id
    }

    /// Release every node of the tree at `root`. Returns how many were freed.
    ///
    /// Handles into the destroyed tree must not be used afterwards.
    pub fn destroy(&mut self, root: Option<NodeId>) -> usize {
        let mut released = 0usize;
        let mut stack: Vec<NodeId> = root.into_iter().collect();
        while let Some(id) = stack.pop() {
            let node = self.release(id);
            stack.extend(node.left);
            stack.extend(node.right);
            released += 1;
        }
        debug!(released, live = self.live_nodes(), "destroyed tree");
        released
    }

    /// In-order `(key, height)` pairs. Clone the iterator to restart it.
    pub fn traverse_inorder(&self, root: Option<NodeId>) -> Inorder<'_, V> {
        Inorder {
            walk: Walk::new(self, root),
        }
    }

    /// In-order `(key, &value)` pairs.
    pub fn entries(&self, root: Option<NodeId>) -> Entries<'_, V> {
        Entries {
            walk: Walk::new(self, root),
        }
    }

    /// Render the tree sideways, right subtree on top, one node per line as
    /// `"<depth spaces> key [height]"`.
    pub fn render(&self, root: Option<NodeId>) -> String {
        let mut out = String::new();
        self.render_into(&mut out, root, 0);
        out
    }

    fn render_into(&self, out: &mut String, node: Option<NodeId>, depth: usize) {
        let Some(id) = node else {
            return;
        };
        let node = self.node(id);
        self.render_into(out, node.right, depth + 1);
        // Writing to a `String` cannot fail.
        let _ = writeln!(out, "{:depth$} {} [{}]", "", node.key, node.height);
        self.render_into(out, node.left, depth + 1);
    }
}

// =============================================================================
// Iterators
// =============================================================================

/// Explicit-stack in-order walk: the stack holds the left spine still to visit.
struct Walk<'a, V> {
    arena: &'a NodeArena<V>,
    stack: Vec<NodeId>,
}

impl<'a, V> Walk<'a, V> {
    fn new(arena: &'a NodeArena<V>, root: Option<NodeId>) -> Self {
        let mut walk = Self {
            arena,
            stack: Vec::new(),
        };
        walk.push_left_spine(root);
        walk
    }

    fn push_left_spine(&mut self, mut node: Option<NodeId>) {
        while let Some(id) = node {
            self.stack.push(id);
            node = self.arena.node(id).left;
        }
    }

    fn next_node(&mut self) -> Option<&'a Node<V>> {
        let id = self.stack.pop()?;
        let node = self.arena.node(id);
        self.push_left_spine(node.right);
        Some(node)
    }
}

impl<V> Clone for Walk<'_, V> {
    fn clone(&self) -> Self {
        Self {
            arena: self.arena,
            stack: self.stack.clone(),
        }
    }
}

/// Iterator returned by [`NodeArena::traverse_inorder`].
pub struct Inorder<'a, V> {
    walk: Walk<'a, V>,
}

impl<V> Iterator for Inorder<'_, V> {
    type Item = (Key, u8);

    fn next(&mut self) -> Option<Self::Item> {
        self.walk.next_node().map(|node| (node.key, node.height))
    }
}

impl<V> FusedIterator for Inorder<'_, V> {}

impl<V> Clone for Inorder<'_, V> {
    fn clone(&self) -> Self {
        Self {
            walk: self.walk.clone(),
        }
    }
}

/// Iterator returned by [`NodeArena::entries`].
pub struct Entries<'a, V> {
    walk: Walk<'a, V>,
}

impl<'a, V> Iterator for Entries<'a, V> {
    type Item = (Key, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.walk.next_node().map(|node| (node.key, &node.value))
    }
}

impl<V> FusedIterator for Entries<'_, V> {}

impl<V> Clone for Entries<'_, V> {
    fn clone(&self) -> Self {
        Self {
            walk: self.walk.clone(),
        }
    }
}
