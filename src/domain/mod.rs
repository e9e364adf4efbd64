//! Domain layer: entities and tree assembly
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod assembler;
pub mod entities;
pub mod error;

pub use arena::{TreeArena, TreeIterator, TreeNode};
pub use assembler::{dropped_rows, organize_into_tree, TreeAssembler};
pub use entities::*;
pub use error::{DomainError, DomainResult};
