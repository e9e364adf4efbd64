//! Tree assembly: flat tree-path rows into an arena-backed forest.
//!
//! A row is placed iff an unbroken chain of `(parent_ident, depth - 1)` matches
//! leads from it to a parentless depth-0 row. Everything else (orphans, depth
//! gaps, duplicates already claimed by an earlier match) stays in the pool and is
//! dropped without an error.

use std::collections::HashMap;

use generational_arena::Index;
use tracing::{instrument, trace};

use crate::domain::arena::TreeArena;
use crate::domain::entities::HierarchyRow;

/// Pool key: depth of the row and the ident it names as parent.
type SlotKey = (u16, Option<String>);

/// Removable multiset of not-yet-placed rows.
///
/// Rows are bucketed by `(depth, parent_ident)` so claiming the children of a
/// node is a single removal. Each bucket keeps input order, which becomes the
/// tie-break for equal sort orders.
struct RowPool {
    slots: HashMap<SlotKey, Vec<HierarchyRow>>,
    remaining: usize,
}

impl RowPool {
    fn new(rows: &[HierarchyRow]) -> Self {
        let mut slots: HashMap<SlotKey, Vec<HierarchyRow>> = HashMap::new();
        for row in rows {
            slots
                .entry((row.depth, row.parent_ident.clone()))
                .or_default()
                .push(row.clone());
        }
        Self {
            slots,
            remaining: rows.len(),
        }
    }

    /// Remove and return every pooled row at `depth` whose parent is `parent_ident`.
    fn claim(&mut self, depth: u16, parent_ident: Option<&str>) -> Vec<HierarchyRow> {
        let key = (depth, parent_ident.map(str::to_string));
        let claimed = self.slots.remove(&key).unwrap_or_default();
        self.remaining -= claimed.len();
        claimed
    }
}

/// Organize rows into a forest of top-level nodes, each owning its ordered children.
///
/// Rows without a connected path back to a parentless depth-0 row are not part of
/// the result, so `result.len()` may be less than `rows.len()`. Siblings are in
/// ascending `sort_order`; equal sort orders keep their input order.
#[instrument(level = "debug", skip(rows), fields(rows = rows.len()))]
pub fn organize_into_tree(rows: &[HierarchyRow]) -> TreeArena {
    let mut pool = RowPool::new(rows);
    let mut tree = TreeArena::new();

    // Roots are claimed first; every popped node then claims its own children
    // before its next sibling is visited, i.e. claims happen in preorder of input order.
    let roots = place(&mut tree, &mut pool, None, 0, None);
    let mut stack: Vec<Index> = roots.into_iter().rev().collect();

    while let Some(node_idx) = stack.pop() {
        let Some(node) = tree.get_node(node_idx) else {
            continue;
        };
        let Some(child_depth) = node.row.depth.checked_add(1) else {
            continue;
        };
        let ident = node.row.ident.clone();

        let children = place(&mut tree, &mut pool, Some(node_idx), child_depth, Some(&ident));
        stack.extend(children.into_iter().rev());
    }

    if pool.remaining > 0 {
        trace!(dropped = pool.remaining, "rows without a path to a root were dropped");
    }
    trace!(placed = tree.len(), "assembly done");
    tree
}

/// Stateless handle on [`organize_into_tree`], for callers that hold an assembler value.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeAssembler;

impl TreeAssembler {
    pub fn assemble(&self, rows: &[HierarchyRow]) -> TreeArena {
        organize_into_tree(rows)
    }
}

/// Claim the sibling group for one parent context, insert it, and sort it.
///
/// Returns the new indices in claim order (input order), which is the order the
/// caller visits them in.
fn place(
    tree: &mut TreeArena,
    pool: &mut RowPool,
    parent: Option<Index>,
    depth: u16,
    parent_ident: Option<&str>,
) -> Vec<Index> {
    let group = pool.claim(depth, parent_ident);
    if group.is_empty() {
        return Vec::new();
    }

    let placed: Vec<Index> = group
        .into_iter()
        .map(|row| tree.insert_node(row, parent))
        .collect();
    tree.sort_siblings(parent);
    placed
}

/// Rows of `rows` that `forest` does not contain, as a multiset difference.
///
/// Assembly never reports what it dropped; this recovers it for callers that
/// need to show orphans.
pub fn dropped_rows(rows: &[HierarchyRow], forest: &TreeArena) -> Vec<HierarchyRow> {
    let mut placed: HashMap<&HierarchyRow, usize> = HashMap::new();
    for row in forest.flatten() {
        *placed.entry(row).or_default() += 1;
    }

    rows.iter()
        .filter(|row| match placed.get_mut(row) {
            Some(count) if *count > 0 => {
                *count -= 1;
                false
            }
            _ => true,
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(ident: &str, parent: Option<&str>, depth: u16, order: i16, label: &str) -> HierarchyRow {
        HierarchyRow::new(ident, parent, depth, order, Some(label))
    }

    fn labels(tree: &TreeArena, idxs: &[Index]) -> Vec<String> {
        idxs.iter()
            .filter_map(|&i| tree.get_node(i))
            .filter_map(|n| n.row.label.clone())
            .collect()
    }

    #[test]
    fn given_single_root_when_assembling_then_one_childless_root() {
        let tree = organize_into_tree(&[row("A", None, 0, 1, "Root")]);

        assert_eq!(labels(&tree, tree.roots()), vec!["Root"]);
        assert!(tree.children(tree.roots()[0]).is_empty());
    }

    #[test]
    fn given_children_out_of_order_when_assembling_then_sorted_by_sort_order() {
        let rows = vec![
            row("A", None, 0, 1, "Root"),
            row("B", Some("A"), 1, 2, "Second"),
            row("C", Some("A"), 1, 1, "First"),
        ];
        let tree = organize_into_tree(&rows);

        let root = tree.roots()[0];
        assert_eq!(labels(&tree, tree.children(root)), vec!["First", "Second"]);
    }

    #[test]
    fn given_orphan_only_when_assembling_then_empty_forest() {
        let rows = vec![row("B", Some("A"), 1, 1, "Orphan")];
        let tree = organize_into_tree(&rows);

        assert!(tree.is_empty());
        assert_eq!(dropped_rows(&rows, &tree), rows);
    }

    #[test]
    fn given_depth_gap_when_assembling_then_gapped_row_dropped() {
        let rows = vec![
            row("A", None, 0, 1, "Root"),
            row("B", Some("A"), 2, 1, "SkipsDepth1"),
        ];
        let tree = organize_into_tree(&rows);

        assert_eq!(tree.len(), 1);
        assert!(tree.children(tree.roots()[0]).is_empty());
        assert_eq!(dropped_rows(&rows, &tree), vec![rows[1].clone()]);
    }

    #[test]
    fn given_depth_zero_row_with_parent_when_assembling_then_not_a_root() {
        let rows = vec![row("A", Some("X"), 0, 1, "NotRoot"), row("B", None, 0, 2, "Root")];
        let tree = organize_into_tree(&rows);

        assert_eq!(labels(&tree, tree.roots()), vec!["Root"]);
    }

    #[test]
    fn given_same_ident_under_two_parents_when_assembling_then_both_positions_kept() {
        let rows = vec![
            row("r1", None, 0, 1, "R1"),
            row("r2", None, 0, 2, "R2"),
            row("shared", Some("r1"), 1, 1, "Under R1"),
            row("shared", Some("r2"), 1, 1, "Under R2"),
        ];
        let tree = organize_into_tree(&rows);

        assert_eq!(tree.len(), 4);
        let paths: Vec<_> = tree.iter().map(|(i, _)| tree.path(i)).collect();
        assert_eq!(paths, vec!["/r1/", "/r1/shared/", "/r2/", "/r2/shared/"]);
    }

    #[test]
    fn given_duplicate_parent_idents_when_assembling_then_first_claims_children() {
        // Two roots named "A": the one visited first (input order) takes the child.
        let rows = vec![
            row("A", None, 0, 2, "First A"),
            row("A", None, 0, 1, "Second A"),
            row("B", Some("A"), 1, 1, "Child"),
        ];
        let tree = organize_into_tree(&rows);

        assert_eq!(tree.len(), 3);
        let roots = tree.roots();
        assert_eq!(labels(&tree, roots), vec!["Second A", "First A"]);
        assert!(tree.children(roots[0]).is_empty());
        assert_eq!(labels(&tree, tree.children(roots[1])), vec!["Child"]);
    }

    #[test]
    fn given_equal_sort_orders_when_assembling_then_input_order_kept() {
        let rows = vec![
            row("A", None, 0, 1, "Root"),
            row("x", Some("A"), 1, 5, "x"),
            row("y", Some("A"), 1, 5, "y"),
            row("z", Some("A"), 1, 1, "z"),
        ];
        let tree = organize_into_tree(&rows);

        let root = tree.roots()[0];
        assert_eq!(labels(&tree, tree.children(root)), vec!["z", "x", "y"]);
    }

    #[test]
    fn given_input_when_assembling_then_input_untouched() {
        let rows = vec![row("A", None, 0, 1, "Root"), row("B", Some("A"), 1, 1, "Child")];
        let before = rows.clone();
        let _ = organize_into_tree(&rows);
        assert_eq!(rows, before);
    }

    #[test]
    fn given_empty_input_when_assembling_then_empty_forest() {
        let tree = organize_into_tree(&[]);
        assert!(tree.is_empty());
        assert!(tree.roots().is_empty());
    }

    #[test]
    fn given_assembler_value_when_assembling_then_same_as_free_function() {
        let rows = vec![row("A", None, 0, 1, "Root"), row("B", Some("A"), 1, 1, "Child")];
        let tree = TreeAssembler.assemble(&rows);
        assert_eq!(tree.flatten(), organize_into_tree(&rows).flatten());
    }
}
