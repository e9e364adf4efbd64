//! Assemble flat tree-path rows into ordered, labeled hierarchies and keep
//! them in SQLite.
//!
//! Layers, innermost first:
//! - [`domain`]: rows, the arena forest and the assembly algorithm
//! - [`infrastructure`]: the [`RowStore`](infrastructure::RowStore) seam and its backends
//! - [`application`]: [`TreePathService`](application::services::TreePathService)
//! - [`cli`]: argument parsing and command dispatch

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod tree_traits;
pub mod util;
