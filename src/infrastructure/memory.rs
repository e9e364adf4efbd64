//! In-memory row store
//!
//! Same contract as the SQLite store. A keyed write first locates its matches and
//! mutates only when there is exactly one, which gives commit-or-rollback per call.

use std::sync::{Mutex, MutexGuard};

use tracing::{debug, instrument};

use crate::domain::{validate_label, HierarchyRow, RowIdentity};
use crate::infrastructure::error::{StoreError, StoreResult};
use crate::infrastructure::traits::RowStore;

#[derive(Debug, Default)]
pub struct InMemoryRowStore {
    rows: Mutex<Vec<HierarchyRow>>,
}

impl InMemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `rows`, kept as given (no identity or length checks).
    pub fn with_rows(rows: Vec<HierarchyRow>) -> Self {
        Self {
            rows: Mutex::new(rows),
        }
    }

    fn checkout(&self) -> StoreResult<MutexGuard<'_, Vec<HierarchyRow>>> {
        self.rows.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Apply `write` to the single row matching `identity`; leave everything untouched otherwise.
    fn write_one<F>(&self, op: &str, identity: &RowIdentity, write: F) -> StoreResult<bool>
    where
        F: FnOnce(&mut Vec<HierarchyRow>, usize),
    {
        let mut rows = self.checkout()?;
        let hits: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, r)| identity.matches(r))
            .map(|(pos, _)| pos)
            .collect();
        match hits[..] {
            [pos] => {
                write(&mut rows, pos);
                debug!("{op}: committed");
                Ok(true)
            }
            _ => {
                debug!("{op}: {} rows matched, rolled back", hits.len());
                Ok(false)
            }
        }
    }
}

impl RowStore for InMemoryRowStore {
    fn fetch_all(&self) -> StoreResult<Vec<HierarchyRow>> {
        Ok(self.checkout()?.clone())
    }

    fn fetch_by_depth_and_parent(
        &self,
        depth: u16,
        parent_ident: Option<&str>,
    ) -> StoreResult<Vec<HierarchyRow>> {
        let mut rows: Vec<HierarchyRow> = self
            .checkout()?
            .iter()
            .filter(|r| r.depth == depth && r.parent_ident.as_deref() == parent_ident)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.sort_order);
        Ok(rows)
    }

    fn fetch_one(&self, identity: &RowIdentity) -> StoreResult<Option<HierarchyRow>> {
        Ok(self
            .checkout()?
            .iter()
            .find(|r| identity.matches(r))
            .cloned())
    }

    #[instrument(level = "debug", skip(self), fields(identity = %row.identity()))]
    fn insert(&self, row: &HierarchyRow) -> StoreResult<bool> {
        row.validate()?;
        let identity = row.identity();
        let mut rows = self.checkout()?;
        if rows.iter().any(|r| identity.matches(r)) {
            debug!("insert: identity exists, rolled back");
            return Ok(false);
        }
        rows.push(row.clone());
        debug!("insert: committed");
        Ok(true)
    }

    #[instrument(level = "debug", skip(self), fields(identity = %identity))]
    fn delete(&self, identity: &RowIdentity) -> StoreResult<bool> {
        self.write_one("delete", identity, |rows, pos| {
            rows.remove(pos);
        })
    }

    #[instrument(level = "debug", skip(self), fields(identity = %identity))]
    fn update_sort_order(&self, identity: &RowIdentity, sort_order: i16) -> StoreResult<bool> {
        self.write_one("update_sort_order", identity, |rows, pos| {
            rows[pos].sort_order = sort_order;
        })
    }

    #[instrument(level = "debug", skip(self), fields(identity = %identity))]
    fn update_label(&self, identity: &RowIdentity, label: Option<&str>) -> StoreResult<bool> {
        validate_label(label)?;
        self.write_one("update_label", identity, |rows, pos| {
            rows[pos].label = label.map(str::to_string);
        })
    }

    fn clear(&self) -> StoreResult<usize> {
        let mut rows = self.checkout()?;
        let removed = rows.len();
        rows.clear();
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_two_rows_with_same_identity_when_updating_then_rolls_back() {
        let store = InMemoryRowStore::with_rows(vec![
            HierarchyRow::root("a", 1, None),
            HierarchyRow::root("a", 2, None),
        ]);

        let changed = store
            .update_sort_order(&RowIdentity::new("a", 0, None), 9)
            .unwrap();

        assert!(!changed);
        let orders: Vec<_> = store.fetch_all().unwrap().iter().map(|r| r.sort_order).collect();
        assert_eq!(orders, vec![1, 2]);
    }

    #[test]
    fn given_rows_when_fetching_children_then_ordered_by_sort_order() {
        let store = InMemoryRowStore::with_rows(vec![
            HierarchyRow::new("dod", Some("org"), 2, 6, None),
            HierarchyRow::new("nist", Some("org"), 2, 5, None),
            HierarchyRow::new("org", Some("iso"), 1, 3, None),
        ]);

        let idents: Vec<_> = store
            .fetch_by_depth_and_parent(2, Some("org"))
            .unwrap()
            .into_iter()
            .map(|r| r.ident)
            .collect();
        assert_eq!(idents, vec!["nist", "dod"]);
    }

    #[test]
    fn given_two_rows_with_same_identity_when_deleting_then_both_kept() {
        let store = InMemoryRowStore::with_rows(vec![
            HierarchyRow::root("a", 1, None),
            HierarchyRow::root("a", 2, None),
        ]);

        assert!(!store.delete(&RowIdentity::new("a", 0, None)).unwrap());
        assert_eq!(store.fetch_all().unwrap().len(), 2);
    }

    #[test]
    fn given_single_match_when_deleting_then_only_that_row_removed() {
        let store = InMemoryRowStore::with_rows(vec![
            HierarchyRow::root("a", 1, None),
            HierarchyRow::new("a", Some("a"), 1, 1, None),
            HierarchyRow::root("b", 2, None),
        ]);

        assert!(store.delete(&RowIdentity::new("a", 0, None)).unwrap());

        let left: Vec<_> = store.fetch_all().unwrap().into_iter().map(|r| r.identity()).collect();
        assert_eq!(
            left,
            vec![RowIdentity::new("a", 1, Some("a")), RowIdentity::new("b", 0, None)]
        );
    }
}
