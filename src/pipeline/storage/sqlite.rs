use super::traits::{BookStore, Outcome, StoreState};
use crate::constants::BOOK_TABLE;
use crate::error::StorageError;
use crate::types::{NormalizedItem, StoredBook};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SELECT_COLUMNS: &str = "book_id, url, title, product_type, price_excl_tax, price_incl_tax, \
     tax, availability, stars, category, description, price";

struct Inner {
    conn: Option<Connection>,
    state: StoreState,
}

impl Inner {
    fn ready_conn(&mut self) -> Result<&mut Connection, StorageError> {
        self.state.check_ready()?;
        self.conn.as_mut().ok_or(StorageError::Closed)
    }
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// SQLite-backed book table.
///
/// The connection sits behind a mutex, so the check-then-insert of
/// `insert_if_absent` is serialized for all callers sharing this store.
/// Each insert additionally runs in an IMMEDIATE transaction, which takes
/// the database write lock up front and keeps other processes from racing
/// the same title. Database calls run on the blocking pool so a busy wait
/// on that lock never stalls a runtime worker.
pub struct SqliteBookStore {
    inner: Arc<Mutex<Inner>>,
    location: Option<PathBuf>,
}

impl SqliteBookStore {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self, StorageError> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(db_path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        debug!("Opened book database at {}", db_path.display());
        Ok(Self::from_connection(conn, Some(db_path.to_path_buf())))
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self::from_connection(conn, None))
    }

    fn from_connection(conn: Connection, location: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                conn: Some(conn),
                state: StoreState::Uninitialized,
            })),
            location,
        }
    }

    /// Path of the database file, `None` for in-memory stores.
    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    /// Run `f` with the store locked, on tokio's blocking pool.
    async fn blocking<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&mut Inner) -> Result<T, StorageError> + Send + 'static,
        T: Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || f(&mut lock(&inner))).await?
    }
}

fn row_to_book(row: &Row<'_>) -> rusqlite::Result<StoredBook> {
    Ok(StoredBook {
        book_id: row.get(0)?,
        item: NormalizedItem {
            url: row.get(1)?,
            title: row.get(2)?,
            product_type: row.get(3)?,
            price_excl_tax: row.get(4)?,
            price_incl_tax: row.get(5)?,
            tax: row.get(6)?,
            availability: row.get(7)?,
            stars: row.get(8)?,
            category: row.get(9)?,
            description: row.get(10)?,
            price: row.get(11)?,
        },
    })
}

fn create_schema(inner: &mut Inner) -> Result<(), StorageError> {
    if inner.state == StoreState::Closed {
        return Err(StorageError::Closed);
    }
    let conn = inner.conn.as_ref().ok_or(StorageError::Closed)?;
    conn.execute_batch(&format!(
        r#"
        PRAGMA journal_mode=WAL;
        CREATE TABLE IF NOT EXISTS {BOOK_TABLE} (
            book_id         INTEGER PRIMARY KEY AUTOINCREMENT,
            url             TEXT    NOT NULL,
            title           TEXT    NOT NULL,
            product_type    TEXT    NOT NULL,
            price_excl_tax  REAL    NOT NULL,
            price_incl_tax  REAL    NOT NULL,
            tax             REAL    NOT NULL,
            availability    INTEGER NOT NULL,
            stars           INTEGER NOT NULL,
            category        TEXT    NOT NULL,
            description     TEXT    NOT NULL,
            price           REAL    NOT NULL
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_{BOOK_TABLE}_title ON {BOOK_TABLE} (title);
        "#
    ))?;
    inner.state = StoreState::Ready;
    Ok(())
}

fn insert_book(inner: &mut Inner, item: &NormalizedItem) -> Result<Outcome, StorageError> {
    let conn = inner.ready_conn()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let exists: bool = tx.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {BOOK_TABLE} WHERE title = ?1)"),
        params![item.title],
        |row| row.get(0),
    )?;
    if exists {
        // Dropping the transaction rolls it back; nothing was written
        debug!("Skipping duplicate book: {}", item.title);
        return Ok(Outcome::Skipped);
    }

    tx.execute(
        &format!(
            "INSERT INTO {BOOK_TABLE} (url, title, product_type, price_excl_tax, price_incl_tax, \
             tax, availability, stars, category, description, price) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
        ),
        params![
            item.url,
            item.title,
            item.product_type,
            item.price_excl_tax,
            item.price_incl_tax,
            item.tax,
            item.availability,
            item.stars,
            item.category,
            item.description,
            item.price,
        ],
    )?;
    let book_id = tx.last_insert_rowid();
    tx.commit()?;

    debug!("Stored book: {} with id {}", item.title, book_id);
    Ok(Outcome::Inserted { book_id })
}

#[async_trait]
impl BookStore for SqliteBookStore {
    async fn ensure_schema(&self) -> Result<(), StorageError> {
        self.blocking(create_schema).await?;
        info!("Book schema ready");
        Ok(())
    }

    async fn insert_if_absent(&self, item: &NormalizedItem) -> Result<Outcome, StorageError> {
        let item = item.clone();
        self.blocking(move |inner| insert_book(inner, &item)).await
    }

    async fn get_by_title(&self, title: &str) -> Result<Option<StoredBook>, StorageError> {
        let title = title.to_string();
        self.blocking(move |inner| {
            let book = inner
                .ready_conn()?
                .query_row(
                    &format!("SELECT {SELECT_COLUMNS} FROM {BOOK_TABLE} WHERE title = ?1"),
                    params![title],
                    row_to_book,
                )
                .optional()?;
            Ok(book)
        })
        .await
    }

    async fn count(&self) -> Result<usize, StorageError> {
        self.blocking(|inner| {
            let n: i64 = inner.ready_conn()?.query_row(
                &format!("SELECT COUNT(*) FROM {BOOK_TABLE}"),
                [],
                |row| row.get(0),
            )?;
            Ok(n as usize)
        })
        .await
    }

    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<StoredBook>, StorageError> {
        self.blocking(move |inner| {
            let conn = inner.ready_conn()?;
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM {BOOK_TABLE} ORDER BY book_id LIMIT ?1 OFFSET ?2"
            ))?;
            let books = stmt
                .query_map(params![limit as i64, offset as i64], row_to_book)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(books)
        })
        .await
    }

    async fn close(&self) -> Result<(), StorageError> {
        self.blocking(|inner| {
            inner.state = StoreState::Closed;
            if let Some(conn) = inner.conn.take() {
                conn.close().map_err(|(_, e)| StorageError::Sqlite(e))?;
                debug!("Closed book database");
            }
            Ok(())
        })
        .await
    }

    fn state(&self) -> StoreState {
        lock(&self.inner).state
    }
}
