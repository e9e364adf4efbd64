//! Infrastructure layer: row store implementations and DI container
//!
//! This layer implements the I/O boundary trait and wires up services.

pub mod di;
pub mod error;
pub mod memory;
pub mod sqlite;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryRowStore;
pub use sqlite::SqliteRowStore;
pub use traits::RowStore;
