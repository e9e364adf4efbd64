//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on the I/O boundary trait (RowStore)
//! but are themselves concrete structs, not traits.

mod tree_path;

pub use tree_path::TreePathService;
