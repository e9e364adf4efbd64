//! Assembly behaviour of `organize_into_tree` on whole row sets.

use std::collections::HashSet;

use proptest::prelude::*;
use rstest::{fixture, rstest};
use generational_arena::Index;
use treepath::domain::{dropped_rows, organize_into_tree, HierarchyRow, TreeArena};
use treepath::util::testing;

fn row(ident: &str, parent: Option<&str>, depth: u16, order: i16) -> HierarchyRow {
    HierarchyRow::new(ident, parent, depth, order, Some(ident.to_uppercase().as_str()))
}

#[fixture]
fn iso_rows() -> Vec<HierarchyRow> {
    testing::init_test_setup();
    vec![
        row("iso", None, 0, 1),
        row("org", Some("iso"), 1, 3),
        row("dod", Some("org"), 2, 6),
        row("nist", Some("org"), 2, 5),
        row("internet", Some("dod"), 3, 1),
        row("private", Some("internet"), 4, 4),
    ]
}

fn idents(forest: &TreeArena) -> Vec<&str> {
    forest.flatten().iter().map(|r| r.ident.as_str()).collect()
}

// ============================================================
// Scenarios
// ============================================================

#[rstest]
fn given_iso_rows_when_organizing_then_full_chain_in_preorder(iso_rows: Vec<HierarchyRow>) {
    let forest = organize_into_tree(&iso_rows);

    assert_eq!(forest.len(), 6);
    assert_eq!(forest.roots().len(), 1);
    assert_eq!(forest.depth(), 5);
    assert_eq!(
        idents(&forest),
        vec!["iso", "org", "nist", "dod", "internet", "private"]
    );
    assert_eq!(
        forest.leaf_nodes(),
        vec!["/iso/org/nist/", "/iso/org/dod/internet/private/"]
    );
}

#[rstest]
fn given_removed_interior_row_when_organizing_then_subtree_dropped(iso_rows: Vec<HierarchyRow>) {
    let rows: Vec<_> = iso_rows.into_iter().filter(|r| r.ident != "org").collect();

    let forest = organize_into_tree(&rows);

    assert_eq!(idents(&forest), vec!["iso"]);
    let dropped: Vec<_> = dropped_rows(&rows, &forest)
        .into_iter()
        .map(|r| r.ident)
        .collect();
    assert_eq!(dropped, vec!["dod", "nist", "internet", "private"]);
}

#[rstest]
#[case::depth_gap(vec![row("a", None, 0, 1), row("b", Some("a"), 2, 1)], vec!["a"])]
#[case::wrong_parent(vec![row("a", None, 0, 1), row("b", Some("x"), 1, 1)], vec!["a"])]
#[case::no_root(vec![row("b", Some("a"), 1, 1)], vec![])]
#[case::rooted_depth_zero_with_parent(vec![row("a", Some("z"), 0, 1)], vec![])]
fn given_disconnected_rows_when_organizing_then_silently_dropped(
    #[case] rows: Vec<HierarchyRow>,
    #[case] expected: Vec<&str>,
) {
    testing::init_test_setup();
    let forest = organize_into_tree(&rows);
    assert_eq!(idents(&forest), expected);
}

#[test]
fn given_several_roots_when_organizing_then_roots_sorted() {
    testing::init_test_setup();
    let rows = vec![
        row("c", None, 0, 9),
        row("a", None, 0, -1),
        row("b", None, 0, 4),
    ];

    let forest = organize_into_tree(&rows);

    let roots: Vec<_> = forest
        .roots()
        .iter()
        .filter_map(|&idx| forest.get_node(idx))
        .map(|n| n.row.ident.as_str())
        .collect();
    assert_eq!(roots, vec!["a", "b", "c"]);
}

// ============================================================
// Properties
// ============================================================

/// A forest as plain nested values, comparable across assemblies.
#[derive(Debug, PartialEq)]
struct Shape {
    row: HierarchyRow,
    children: Vec<Shape>,
}

fn shape_of(forest: &TreeArena) -> Vec<Shape> {
    fn node(forest: &TreeArena, idx: Index) -> Shape {
        Shape {
            row: forest.get_node(idx).unwrap().row.clone(),
            children: forest.children(idx).iter().map(|&c| node(forest, c)).collect(),
        }
    }
    forest.roots().iter().map(|&r| node(forest, r)).collect()
}

/// Straightforward assembly: scan the whole pool for each sibling group,
/// recurse into the group in input order, then stable-sort it.
fn scan_assemble(rows: &[HierarchyRow]) -> Vec<Shape> {
    fn group(pool: &mut Vec<HierarchyRow>, depth: u16, parent: Option<&str>) -> Vec<Shape> {
        let mut claimed = Vec::new();
        let mut i = 0;
        while i < pool.len() {
            if pool[i].depth == depth && pool[i].parent_ident.as_deref() == parent {
                claimed.push(pool.remove(i));
            } else {
                i += 1;
            }
        }

        let mut shapes: Vec<Shape> = claimed
            .into_iter()
            .map(|row| Shape {
                row,
                children: Vec::new(),
            })
            .collect();
        for shape in shapes.iter_mut() {
            shape.children = group(pool, depth + 1, Some(&shape.row.ident));
        }
        shapes.sort_by_key(|s| s.row.sort_order);
        shapes
    }

    let mut pool = rows.to_vec();
    group(&mut pool, 0, None)
}

fn arb_row() -> impl Strategy<Value = HierarchyRow> {
    let ident = prop::sample::select(vec!["a", "b", "c", "d", "e"]);
    let parent = prop::option::weighted(0.8, prop::sample::select(vec!["a", "b", "c", "d", "e"]));
    (ident, parent, 0u16..4, -3i16..4).prop_map(|(ident, parent, depth, order)| {
        let parent = if depth == 0 { None } else { parent };
        HierarchyRow::new(ident, parent, depth, order, None)
    })
}

fn arb_rows() -> impl Strategy<Value = Vec<HierarchyRow>> {
    prop::collection::vec(arb_row(), 0..24)
}

proptest! {
    #[test]
    fn placed_rows_are_a_sub_multiset_of_input(rows in arb_rows()) {
        let forest = organize_into_tree(&rows);
        let dropped = dropped_rows(&rows, &forest);
        prop_assert_eq!(forest.len() + dropped.len(), rows.len());
    }

    #[test]
    fn every_parentless_depth_zero_row_is_a_root(rows in arb_rows()) {
        let forest = organize_into_tree(&rows);
        let expected = rows
            .iter()
            .filter(|r| r.depth == 0 && r.parent_ident.is_none())
            .count();
        prop_assert_eq!(forest.roots().len(), expected);
        for &idx in forest.roots() {
            let node = forest.get_node(idx).unwrap();
            prop_assert_eq!(node.row.depth, 0);
            prop_assert!(node.row.parent_ident.is_none());
        }
    }

    #[test]
    fn children_link_to_their_parent_one_level_down(rows in arb_rows()) {
        let forest = organize_into_tree(&rows);
        for (_, node) in forest.iter() {
            let Some(parent_idx) = node.parent else { continue };
            let parent = forest.get_node(parent_idx).unwrap();
            prop_assert_eq!(node.row.depth, parent.row.depth + 1);
            prop_assert_eq!(node.row.parent_ident.as_deref(), Some(parent.row.ident.as_str()));
        }
    }

    #[test]
    fn siblings_are_in_ascending_sort_order(rows in arb_rows()) {
        let forest = organize_into_tree(&rows);
        let mut groups = vec![forest.roots().to_vec()];
        groups.extend(forest.iter().map(|(_, node)| node.children.clone()));
        for group in groups {
            let orders: Vec<_> = group
                .iter()
                .map(|&idx| forest.get_node(idx).unwrap().row.sort_order)
                .collect();
            prop_assert!(orders.windows(2).all(|w| w[0] <= w[1]), "{:?}", orders);
        }
    }

    #[test]
    fn assembling_the_same_rows_twice_gives_identical_forests(rows in arb_rows()) {
        let first = organize_into_tree(&rows);
        let second = organize_into_tree(&rows);
        prop_assert_eq!(shape_of(&first), shape_of(&second));
    }

    #[test]
    fn bucketed_assembly_matches_a_full_pool_scan(rows in arb_rows()) {
        let forest = organize_into_tree(&rows);
        prop_assert_eq!(shape_of(&forest), scan_assemble(&rows));
    }

    #[test]
    fn reassembling_a_flattened_forest_is_stable(rows in arb_rows()) {
        // One row per (depth, ident), so no two nodes compete for the same children
        let mut seen = HashSet::new();
        let rows: Vec<_> = rows
            .into_iter()
            .filter(|r| seen.insert((r.depth, r.ident.clone())))
            .collect();

        let first = organize_into_tree(&rows);
        let flat: Vec<HierarchyRow> = first.flatten().into_iter().cloned().collect();
        let second = organize_into_tree(&flat);

        let again: Vec<HierarchyRow> = second.flatten().into_iter().cloned().collect();
        prop_assert_eq!(flat, again);
    }
}
