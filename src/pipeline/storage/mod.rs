// Dedup store: the book table and its backends

pub mod in_memory;
pub mod sqlite;
pub mod traits;

pub use in_memory::InMemoryBookStore;
pub use sqlite::SqliteBookStore;
pub use traits::{BookStore, Outcome, StoreState};
