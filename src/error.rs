//! Error types for the AVL engine.

use std::collections::TryReserveError;

use thiserror::Error;

/// Result type alias using `AvlError`
pub type Result<T> = std::result::Result<T, AvlError>;

/// Result of an insert, which hands the value back on failure.
pub type InsertResult<T, V> = std::result::Result<T, InsertError<V>>;

/// Errors surfaced by the engine.
///
/// Looking up or deleting a key that is not present is not an error; those
/// calls simply return `None` or leave the tree untouched.
#[derive(Error, Debug)]
pub enum AvlError {
    /// A new node could not be allocated. The tree the insert was aimed at is
    /// unchanged.
    #[error("failed to allocate node for key {key}: {reason}")]
    AllocationFailure {
        key: i64,
        #[source]
        reason: AllocationFailureReason,
    },
}

/// Why a node allocation was refused.
#[derive(Error, Debug)]
pub enum AllocationFailureReason {
    /// The arena is configured with a node limit and it has been reached.
    #[error("node limit of {max_nodes} reached")]
    CapacityLimit { max_nodes: usize },

    /// Every 32-bit handle is in use.
    #[error("node handle space exhausted")]
    HandleSpaceExhausted,

    /// The global allocator refused to grow the slot vector.
    #[error("allocator refused to grow slot storage: {0}")]
    Allocator(#[from] TryReserveError),
}

impl AvlError {
    /// Key of the insert that failed.
    pub fn key(&self) -> i64 {
        match self {
            AvlError::AllocationFailure { key, .. } => *key,
        }
    }
}

/// A refused insert. Owns the value that could not be stored so the caller
/// gets it back.
#[derive(Error)]
#[error("{error}")]
pub struct InsertError<V> {
    #[source]
    error: AvlError,
    value: V,
}

impl<V> InsertError<V> {
    pub(crate) fn new(error: AvlError, value: V) -> Self {
        Self { error, value }
    }

    pub fn error(&self) -> &AvlError {
        &self.error
    }

    /// Key of the insert that failed.
    pub fn key(&self) -> i64 {
        self.error.key()
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    /// Take back the value that was not inserted.
    pub fn into_value(self) -> V {
        self.value
    }

    pub fn into_parts(self) -> (AvlError, V) {
        (self.error, self.value)
    }
}

// The value is opaque to the engine, so it is left out.
impl<V> std::fmt::Debug for InsertError<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InsertError")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<V> From<InsertError<V>> for AvlError {
    fn from(err: InsertError<V>) -> Self {
        err.error
    }
}
