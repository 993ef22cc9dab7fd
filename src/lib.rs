//! # avl-rs
//!
//! A height-balanced (AVL) binary search tree over `i64` keys, stored in a
//! node arena and addressed through caller-held root handles.
//!
//! Search, insert and delete are all O(log n): after every mutation the nodes
//! on the path back to the root refresh their cached height and rebalance with
//! at most two rotations each.
//!
//! The engine itself is root-passing: [`NodeArena`] stores nodes, and each
//! operation takes the current root and returns the new one. [`AvlMap`] wraps
//! an arena and a root for callers that just want a map.
//!
//! ## Example
//!
//! ```rust
//! use avl_rs::NodeArena;
//!
//! let mut arena: NodeArena<&str> = NodeArena::new();
//! let mut root = None;
//! for key in [3, 2, 1] {
//!     root = Some(arena.insert(root, key, "value")?);
//! }
//!
//! // Inserting 3, 2, 1 triggers a right rotation: 2 is now the root.
//! let top = arena.node(root.unwrap());
//! assert_eq!(top.key(), 2);
//! assert_eq!(top.height(), 2);
//!
//! root = arena.delete(root, 2);
//! assert!(arena.search(root, 2).is_none());
//! assert_eq!(arena.traverse_inorder(root).collect::<Vec<_>>(), vec![(1, 1), (3, 2)]);
//!
//! arena.destroy(root);
//! assert_eq!(arena.live_nodes(), 0);
//! # Ok::<(), avl_rs::AvlError>(())
//! ```

#![deny(unsafe_code)]

pub mod arena;
mod balance;
pub mod error;
mod ops;

pub use arena::{Config, Key, Node, NodeArena, NodeId};
pub use error::{AllocationFailureReason, AvlError, InsertError, InsertResult, Result};
pub use ops::{Entries, Inorder};

// =============================================================================
// AvlMap
// =============================================================================

/// An ordered map from `i64` keys to values, backed by its own [`NodeArena`].
pub struct AvlMap<V> {
    arena: NodeArena<V>,
    root: Option<NodeId>,
    count: usize,
}

impl<V> AvlMap<V> {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            arena: NodeArena::with_config(config),
            root: None,
            count: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Height of the tree; 0 when empty.
    #[inline]
    pub fn height(&self) -> u8 {
        self.arena.height(self.root)
    }

    #[inline]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    #[inline]
    pub fn arena(&self) -> &NodeArena<V> {
        &self.arena
    }

    pub fn get(&self, key: Key) -> Option<&V> {
        let id = self.arena.search(self.root, key)?;
        Some(self.arena.node(id).value())
    }

    pub fn get_mut(&mut self, key: Key) -> Option<&mut V> {
        let id = self.arena.search(self.root, key)?;
        Some(self.arena.value_mut(id))
    }

    pub fn contains_key(&self, key: Key) -> bool {
        self.arena.search(self.root, key).is_some()
    }

    /// Insert a key-value pair.
    ///
    /// Returns the previous value if the key already existed. Fails only when
    /// a new node cannot be allocated, in which case the map is unchanged and
    /// `value` comes back inside the [`InsertError`].
    pub fn insert(&mut self, key: Key, value: V) -> InsertResult<Option<V>, V> {
        let (root, replaced) = self.arena.insert_replace(self.root, key, value)?;
        self.root = Some(root);
        if replaced.is_none() {
            self.count += 1;
        }
        Ok(replaced)
    }

    pub fn remove(&mut self, key: Key) -> Option<V> {
        let (root, removed) = self.arena.take(self.root, key);
        self.root = root;
        if removed.is_some() {
            self.count -= 1;
        }
        removed
    }

    /// Entries in ascending key order.
    pub fn iter(&self) -> Entries<'_, V> {
        self.arena.entries(self.root)
    }

    pub fn keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.iter().map(|(key, _)| key)
    }

    /// Remove every entry, keeping the arena's slot storage for reuse.
    pub fn clear(&mut self) {
        self.arena.destroy(self.root.take());
        self.count = 0;
    }

    /// Sideways rendering of the tree; see [`NodeArena::render`].
    pub fn render(&self) -> String {
        self.arena.render(self.root)
    }
}

impl<V> Default for AvlMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> Clone for AvlMap<V> {
    fn clone(&self) -> Self {
        Self {
            arena: self.arena.clone(),
            root: self.root,
            count: self.count,
        }
    }
}

impl<V: std::fmt::Debug> std::fmt::Debug for AvlMap<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, V> IntoIterator for &'a AvlMap<V> {
    type Item = (Key, &'a V);
    type IntoIter = Entries<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}


#[cfg(test)]
mod proptests;
