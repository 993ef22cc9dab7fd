//! Height bookkeeping, rotations and the AVL rebalance policy.

use tracing::trace;

use crate::arena::{NodeArena, NodeId};

impl<V> NodeArena<V> {
    /// Cached height of the subtree at `node`; 0 when absent.
    #[inline]
    pub fn height(&self, node: Option<NodeId>) -> u8 {
        node.map_or(0, |id| self.node(id).height)
    }

    /// `height(left) - height(right)`; 0 when absent.
    #[inline]
    pub fn balance_factor(&self, node: Option<NodeId>) -> i32 {
        let Some(id) = node else {
            return 0;
        };
        let node = self.node(id);
        i32::from(self.height(node.left)) - i32::from(self.height(node.right))
    }

    /// Recompute the cached height of `id` from its children's cached heights.
    ///
    /// The children must already be up to date.
    #[inline]
    pub(crate) fn update_height(&mut self, id: NodeId) {
        let node = self.node(id);
        let height = self.height(node.left).max(self.height(node.right)) + 1;
        self.node_mut(id).height = height;
    }

    /// Promote the left child of `id`. Returns the new subtree root.
    pub(crate) fn rotate_right(&mut self, id: NodeId) -> NodeId {
        debug_assert!(self.node(id).left.is_some(), "right rotation without a left child");
        let Some(pivot) = self.node(id).left else {
            return id;
        };
        let inner = self.node(pivot).right;

        self.node_mut(pivot).right = Some(id);
        self.node_mut(id).left = inner;

        // Demoted node first: the pivot's height depends on it.
        self.update_height(id);
        self.update_height(pivot);

        trace!(demoted = self.node(id).key, promoted = self.node(pivot).key, "rotate right");
        pivot
    }

    /// Promote the right child of `id`. Returns the new subtree root.
    pub(crate) fn rotate_left(&mut self, id: NodeId) -> NodeId {
        debug_assert!(self.node(id).right.is_some(), "left rotation without a right child");
        let Some(pivot) = self.node(id).right else {
            return id;
        };
        let inner = self.node(pivot).left;

        self.node_mut(pivot).left = Some(id);
        self.node_mut(id).right = inner;

        self.update_height(id);
        self.update_height(pivot);

        trace!(demoted = self.node(id).key, promoted = self.node(pivot).key, "rotate left");
        pivot
    }

    /// Restore the AVL bound at `id`, whose subtrees are already balanced and
    /// whose own height is current. Returns the root of the rebalanced subtree,
    /// which the caller must store in place of `id`.
    ///
    /// Single versus double rotation is decided by the sign of the heavy
    /// child's balance factor, never by comparing keys.
    pub(crate) fn rebalance(&mut self, id: NodeId) -> NodeId {
        let node = self.node(id);
        let (left, right) = (node.left, node.right);

        match self.balance_factor(Some(id)) {
            balance if balance > 1 => {
                // Left-right: straighten the left child first.
                if let Some(child) = left.filter(|&l| self.balance_factor(Some(l)) < 0) {
                    let straightened = self.rotate_left(child);
                    self.node_mut(id).left = Some(straightened);
                }
                self.rotate_right(id)
            }
            balance if balance < -1 => {
                // Right-left.
                if let Some(child) = right.filter(|&r| self.balance_factor(Some(r)) > 0) {
                    let straightened = self.rotate_right(child);
                    self.node_mut(id).right = Some(straightened);
                }
                self.rotate_left(id)
            }
            _ => id,
        }
    }
}
