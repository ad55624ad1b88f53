use super::traits::{BookStore, Outcome, StoreState};
use crate::error::StorageError;
use crate::types::{NormalizedItem, StoredBook};
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

struct Inner {
    books: Vec<StoredBook>,
    next_id: i64,
    state: StoreState,
}

/// In-memory book store for dry runs and tests
pub struct InMemoryBookStore {
    inner: Mutex<Inner>,
}

impl Default for InMemoryBookStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBookStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                books: Vec::new(),
                next_id: 1,
                state: StoreState::Uninitialized,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl BookStore for InMemoryBookStore {
    async fn ensure_schema(&self) -> Result<(), StorageError> {
        let mut inner = self.lock();
        if inner.state == StoreState::Closed {
            return Err(StorageError::Closed);
        }
        inner.state = StoreState::Ready;
        Ok(())
    }

    async fn insert_if_absent(&self, item: &NormalizedItem) -> Result<Outcome, StorageError> {
        let mut inner = self.lock();
        inner.state.check_ready()?;

        if inner.books.iter().any(|b| b.item.title == item.title) {
            debug!("Skipping duplicate book: {}", item.title);
            return Ok(Outcome::Skipped);
        }

        let book_id = inner.next_id;
        inner.next_id += 1;
        inner.books.push(StoredBook {
            book_id,
            item: item.clone(),
        });

        debug!("Stored book: {} with id {}", item.title, book_id);
        Ok(Outcome::Inserted { book_id })
    }

    async fn get_by_title(&self, title: &str) -> Result<Option<StoredBook>, StorageError> {
        let inner = self.lock();
        inner.state.check_ready()?;
        Ok(inner.books.iter().find(|b| b.item.title == title).cloned())
    }

    async fn count(&self) -> Result<usize, StorageError> {
        let inner = self.lock();
        inner.state.check_ready()?;
        Ok(inner.books.len())
    }

    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<StoredBook>, StorageError> {
        let inner = self.lock();
        inner.state.check_ready()?;
        Ok(inner.books.iter().skip(offset).take(limit).cloned().collect())
    }

    async fn close(&self) -> Result<(), StorageError> {
        self.lock().state = StoreState::Closed;
        Ok(())
    }

    fn state(&self) -> StoreState {
        self.lock().state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(title: &str) -> NormalizedItem {
        NormalizedItem {
            url: "https://books.toscrape.com/".to_string(),
            title: title.to_string(),
            product_type: "books".to_string(),
            price_excl_tax: 10.0,
            price_incl_tax: 10.0,
            tax: 0.0,
            availability: 0,
            stars: 5,
            category: "travel".to_string(),
            description: String::new(),
            price: 10.0,
        }
    }

    #[tokio::test]
    async fn test_dedup_by_title() {
        let store = InMemoryBookStore::new();
        store.ensure_schema().await.unwrap();

        assert_eq!(
            store.insert_if_absent(&book("Olio")).await.unwrap(),
            Outcome::Inserted { book_id: 1 }
        );
        assert_eq!(store.insert_if_absent(&book("Olio")).await.unwrap(), Outcome::Skipped);
        assert_eq!(
            store.insert_if_absent(&book("Mesaerion")).await.unwrap(),
            Outcome::Inserted { book_id: 2 }
        );
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_state_machine() {
        let store = InMemoryBookStore::new();
        assert!(matches!(store.count().await, Err(StorageError::NotInitialized)));

        store.ensure_schema().await.unwrap();
        store.close().await.unwrap();
        store.close().await.unwrap();
        assert!(matches!(store.ensure_schema().await, Err(StorageError::Closed)));
        assert!(matches!(
            store.get_by_title("Olio").await,
            Err(StorageError::Closed)
        ));
    }
}
