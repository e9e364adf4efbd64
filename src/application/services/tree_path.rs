//! Tree-path service
//!
//! Composes the row store with tree assembly. Reads fetch a fresh snapshot and
//! assemble it; writes are forwarded to the store by identity and never touch a
//! previously assembled forest.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::application::ApplicationResult;
use crate::domain::{dropped_rows, organize_into_tree, HierarchyRow, RowIdentity, TreeArena};
use crate::infrastructure::traits::RowStore;

/// Service for reading and editing a persisted tree-path hierarchy.
pub struct TreePathService {
    store: Arc<dyn RowStore>,
}

impl TreePathService {
    /// Create a new tree-path service.
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        Self { store }
    }

    /// Fetch every row and assemble the forest.
    ///
    /// Rows with no path back to a root are silently absent; use
    /// [`TreePathService::load_with_dropped`] to see them.
    #[instrument(level = "debug", skip(self))]
    pub fn load_forest(&self) -> ApplicationResult<TreeArena> {
        let rows = self.store.fetch_all()?;
        let forest = organize_into_tree(&rows);
        debug!("load_forest: {} rows, {} placed", rows.len(), forest.len());
        Ok(forest)
    }

    /// Like [`TreePathService::load_forest`], also returning the rows assembly dropped.
    pub fn load_with_dropped(&self) -> ApplicationResult<(TreeArena, Vec<HierarchyRow>)> {
        let rows = self.store.fetch_all()?;
        let forest = organize_into_tree(&rows);
        let dropped = dropped_rows(&rows, &forest);
        if !dropped.is_empty() {
            debug!("load_with_dropped: {} rows unreachable from a root", dropped.len());
        }
        Ok((forest, dropped))
    }

    /// Rows of `rows` that assembly leaves out (orphans, depth gaps, unclaimed duplicates).
    pub fn dropped_rows(&self, rows: &[HierarchyRow]) -> Vec<HierarchyRow> {
        dropped_rows(rows, &organize_into_tree(rows))
    }

    /// All stored rows, unassembled.
    pub fn rows(&self) -> ApplicationResult<Vec<HierarchyRow>> {
        Ok(self.store.fetch_all()?)
    }

    /// Rows directly below `parent_ident` at `depth`, in sort order.
    pub fn children_of(
        &self,
        depth: u16,
        parent_ident: Option<&str>,
    ) -> ApplicationResult<Vec<HierarchyRow>> {
        Ok(self.store.fetch_by_depth_and_parent(depth, parent_ident)?)
    }

    pub fn find(&self, identity: &RowIdentity) -> ApplicationResult<Option<HierarchyRow>> {
        Ok(self.store.fetch_one(identity)?)
    }

    #[instrument(level = "debug", skip(self), fields(identity = %row.identity()))]
    pub fn insert(&self, row: &HierarchyRow) -> ApplicationResult<bool> {
        let inserted = self.store.insert(row)?;
        self.log_outcome("insert", &row.identity(), inserted);
        Ok(inserted)
    }

    #[instrument(level = "debug", skip(self), fields(identity = %identity))]
    pub fn delete(&self, identity: &RowIdentity) -> ApplicationResult<bool> {
        let deleted = self.store.delete(identity)?;
        self.log_outcome("delete", identity, deleted);
        Ok(deleted)
    }

    /// Change the sort order of the row identified by `row`'s identity triple.
    ///
    /// Returns `false` when no single persisted row matches. The caller re-assembles
    /// to see the new order.
    #[instrument(level = "debug", skip(self), fields(identity = %row.identity()))]
    pub fn update_sort_order(&self, row: &HierarchyRow, sort_order: i16) -> ApplicationResult<bool> {
        let identity = row.identity();
        let updated = self.store.update_sort_order(&identity, sort_order)?;
        self.log_outcome("update_sort_order", &identity, updated);
        Ok(updated)
    }

    /// Change (or clear) the label of the row identified by `row`'s identity triple.
    #[instrument(level = "debug", skip(self), fields(identity = %row.identity()))]
    pub fn update_label(&self, row: &HierarchyRow, label: Option<&str>) -> ApplicationResult<bool> {
        let identity = row.identity();
        let updated = self.store.update_label(&identity, label)?;
        self.log_outcome("update_label", &identity, updated);
        Ok(updated)
    }

    /// Delete every row.
    pub fn clear(&self) -> ApplicationResult<usize> {
        let removed = self.store.clear()?;
        info!("cleared {removed} rows");
        Ok(removed)
    }

    fn log_outcome(&self, op: &str, identity: &RowIdentity, ok: bool) {
        if ok {
            info!("{op}: {identity}");
        } else {
            warn!("{op}: no single row matched {identity}");
        }
    }
}
