//! Node storage.
//!
//! Nodes live in a slot vector and point at each other through 32-bit
//! [`NodeId`] handles instead of boxes. Each node owns its two child slots
//! exclusively, so a tree is nothing more than a root handle held by the
//! caller. Several independent trees may share one arena.
//!
//! Released slots go onto a free list and are reused before the slot vector
//! grows. Growth goes through `try_reserve`, so an allocator refusal comes back
//! as [`AvlError::AllocationFailure`] rather than aborting the process.

use tracing::{debug, warn};

use crate::error::{AllocationFailureReason, AvlError, InsertError, InsertResult, Result};

/// Key type stored in every node.
pub type Key = i64;

// =============================================================================
// Handles and nodes
// =============================================================================

/// Handle to a node inside a [`NodeArena`].
///
/// Handles are plain indices: copying one never copies the node. A handle is
/// only meaningful for the arena that produced it and only until that node is
/// released by `delete`, `take` or `destroy`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }

    /// Raw slot index, for display and debugging.
    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// A single tree node.
#[derive(Clone, Debug)]
pub struct Node<V> {
    pub(crate) key: Key,
    pub(crate) value: V,
    /// Cached height of the subtree rooted here; 1 for a leaf.
    pub(crate) height: u8,
    pub(crate) left: Option<NodeId>,
    pub(crate) right: Option<NodeId>,
}

impl<V> Node<V> {
    fn leaf(key: Key, value: V) -> Self {
        Self {
            key,
            value,
            height: 1,
            left: None,
            right: None,
        }
    }

    #[inline]
    pub fn key(&self) -> Key {
        self.key
    }

    #[inline]
    pub fn value(&self) -> &V {
        &self.value
    }

    #[inline]
    pub fn height(&self) -> u8 {
        self.height
    }

    #[inline]
    pub fn left(&self) -> Option<NodeId> {
        self.left
    }

    #[inline]
    pub fn right(&self) -> Option<NodeId> {
        self.right
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for a [`NodeArena`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Number of node slots reserved up front.
    pub initial_capacity: usize,
    /// Upper bound on live nodes. Inserts that would exceed it fail with
    /// [`AvlError::AllocationFailure`].
    pub max_nodes: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_capacity: 1024,
            max_nodes: None,
        }
    }
}

// =============================================================================
// Arena
// =============================================================================

/// Slot storage for AVL nodes, with a free list for released slots.
#[derive(Clone)]
pub struct NodeArena<V> {
    slots: Vec<Option<Node<V>>>,
    free: Vec<u32>,
    live: usize,
    config: Config,
}

impl<V> NodeArena<V> {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let reserve = match config.max_nodes {
            Some(max_nodes) => config.initial_capacity.min(max_nodes),
            None => config.initial_capacity,
        };
        Self {
            slots: Vec::with_capacity(reserve),
            free: Vec::new(),
            live: 0,
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of nodes currently allocated across every tree in this arena.
    #[inline]
    pub fn live_nodes(&self) -> usize {
        self.live
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    pub fn memory_usage(&self) -> usize {
        self.slots.capacity() * std::mem::size_of::<Option<Node<V>>>()
            + self.free.capacity() * std::mem::size_of::<u32>()
    }

    /// Drop vacant slots at the tail and release spare capacity.
    ///
    /// Live handles stay valid: only trailing vacant slots are removed.
    pub fn shrink_to_fit(&mut self) {
        while matches!(self.slots.last(), Some(None)) {
            self.slots.pop();
        }
        let len = self.slots.len();
        self.free.retain(|&idx| (idx as usize) < len);
        self.slots.shrink_to_fit();
        self.free.shrink_to_fit();
    }

    /// Borrow a live node.
    ///
    /// # Panics
    ///
    /// Panics if `id` has been released.
    #[inline]
    pub fn node(&self, id: NodeId) -> &Node<V> {
        match self.slots.get(id.index()) {
            Some(Some(node)) => node,
            _ => panic!("stale node handle {id:?}"),
        }
    }

    /// Borrow a node if `id` still refers to a live slot.
    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&Node<V>> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node<V> {
        match self.slots.get_mut(id.index()) {
            Some(Some(node)) => node,
            _ => panic!("stale node handle {id:?}"),
        }
    }

    /// Mutable access to a node's value. Keys and links are not exposed
    /// mutably since changing them would break ordering.
    #[inline]
    pub fn value_mut(&mut self, id: NodeId) -> &mut V {
        &mut self.node_mut(id).value
    }

    /// Allocate a leaf node (height 1, no children).
    ///
    /// Room for the node is secured before `value` is moved in, so a refusal
    /// hands the value back inside the error.
    pub(crate) fn alloc(&mut self, key: Key, value: V) -> InsertResult<NodeId, V> {
        match self.claim_slot(key) {
            Ok(idx) => {
                let node = Node::leaf(key, value);
                match self.slots.get_mut(idx as usize) {
                    Some(slot) => *slot = Some(node),
                    None => self.slots.push(Some(node)),
                }
                self.live += 1;
                Ok(NodeId(idx))
            }
            Err(error) => Err(InsertError::new(error, value)),
        }
    }

    /// Pick the slot index for the next node: a freed slot, or one past the
    /// end once the vector is known to have room for it.
    fn claim_slot(&mut self, key: Key) -> Result<u32> {
        if let Some(max_nodes) = self.config.max_nodes {
            if self.live >= max_nodes {
                return Err(self.refuse(key, AllocationFailureReason::CapacityLimit { max_nodes }));
            }
        }

        if let Some(idx) = self.free.pop() {
            return Ok(idx);
        }

        let Ok(idx) = u32::try_from(self.slots.len()) else {
            return Err(self.refuse(key, AllocationFailureReason::HandleSpaceExhausted));
        };

        if self.slots.len() == self.slots.capacity() {
            let before = self.slots.capacity();
            if let Err(err) = self.slots.try_reserve(1) {
                return Err(self.refuse(key, err.into()));
            }
            debug!(from = before, to = self.slots.capacity(), "grew node slots");
        }

        Ok(idx)
    }

    /// Free a node's slot and hand the node back by value.
    pub(crate) fn release(&mut self, id: NodeId) -> Node<V> {
        let node = self
            .slots
            .get_mut(id.index())
            .and_then(Option::take)
            .unwrap_or_else(|| panic!("node {id:?} released twice"));
        self.free.push(id.0);
        self.live -= 1;
        node
    }

    fn refuse(&self, key: Key, reason: AllocationFailureReason) -> AvlError {
        warn!(key, live = self.live, %reason, "node allocation refused");
        AvlError::AllocationFailure { key, reason }
    }
}

impl<V> Default for NodeArena<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> std::fmt::Debug for NodeArena<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeArena")
            .field("live", &self.live)
            .field("slots", &self.slots.len())
            .field("free", &self.free.len())
            .finish()
    }
}
