use crate::error::StorageError;
use crate::types::{NormalizedItem, StoredBook};
use async_trait::async_trait;

/// Result of offering an item to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// First sighting of this title; a new row was written.
    Inserted { book_id: i64 },
    /// A row with the same title already exists; nothing was written.
    Skipped,
}

/// Lifecycle of a store instance. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    Uninitialized,
    Ready,
    Closed,
}

impl StoreState {
    /// Gate for every data operation.
    pub fn check_ready(self) -> Result<(), StorageError> {
        match self {
            StoreState::Ready => Ok(()),
            StoreState::Uninitialized => Err(StorageError::NotInitialized),
            StoreState::Closed => Err(StorageError::Closed),
        }
    }
}

/// Deduplicating book storage keyed on title
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Create the `book` table if it does not exist yet. Safe to call on every start.
    async fn ensure_schema(&self) -> Result<(), StorageError>;

    /// Store the item unless a book with the same title is already present.
    /// The existence check and the insert happen atomically.
    async fn insert_if_absent(&self, item: &NormalizedItem) -> Result<Outcome, StorageError>;

    async fn get_by_title(&self, title: &str) -> Result<Option<StoredBook>, StorageError>;
    async fn count(&self) -> Result<usize, StorageError>;
    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<StoredBook>, StorageError>;

    /// Release the underlying connection. Calling it again is a no-op.
    async fn close(&self) -> Result<(), StorageError>;

    fn state(&self) -> StoreState;
}
