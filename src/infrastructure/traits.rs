//! I/O boundary traits for testability
//!
//! The row store is the only I/O the crate performs. Services depend on the trait,
//! so they run against SQLite in production and against memory in tests.

use crate::domain::{HierarchyRow, RowIdentity};
use crate::infrastructure::error::StoreResult;

/// Persistence boundary for tree-path rows.
///
/// Every call is its own transaction: it commits when it succeeds and rolls back
/// otherwise. Writes return `Ok(true)` iff exactly one row was affected; a write
/// that affects no row (or more than one) is rolled back and returns `Ok(false)`.
/// Transport faults are returned as errors after rollback and are never retried.
pub trait RowStore: Send + Sync {
    /// All rows, in insertion order.
    fn fetch_all(&self) -> StoreResult<Vec<HierarchyRow>>;

    /// Rows at `depth` whose parent is `parent_ident`, ordered by sort order.
    ///
    /// `None` selects parentless rows.
    fn fetch_by_depth_and_parent(
        &self,
        depth: u16,
        parent_ident: Option<&str>,
    ) -> StoreResult<Vec<HierarchyRow>>;

    /// The row with the given identity, if any.
    fn fetch_one(&self, identity: &RowIdentity) -> StoreResult<Option<HierarchyRow>>;

    /// Insert a row. Fails (`Ok(false)`) if its identity is already present.
    fn insert(&self, row: &HierarchyRow) -> StoreResult<bool>;

    /// Delete the row with the given identity.
    fn delete(&self, identity: &RowIdentity) -> StoreResult<bool>;

    /// Set the sort order of the row with the given identity.
    fn update_sort_order(&self, identity: &RowIdentity, sort_order: i16) -> StoreResult<bool>;

    /// Set (or clear) the label of the row with the given identity.
    fn update_label(&self, identity: &RowIdentity, label: Option<&str>) -> StoreResult<bool>;

    /// Delete all rows, returning how many were removed.
    fn clear(&self) -> StoreResult<usize>;
}
