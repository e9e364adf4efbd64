/*
Rendering lives in a trait so the domain arena stays free of display concerns;
the CLI is the only caller.
 */
use std::collections::HashMap;

use generational_arena::Index;
use termtree::Tree;
use tracing::instrument;

use crate::domain::TreeArena;

pub trait TreeNodeConvert {
    /// Render with node labels (`Label (ident)`).
    fn to_tree_string(&self) -> Tree<String>;

    /// Render with full tree paths (`/a/b/`).
    fn to_path_tree(&self) -> Tree<String>;
}

// The forest is shown under a synthetic "/" root, the prefix every tree path starts with.
impl TreeNodeConvert for TreeArena {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self) -> Tree<String> {
        render(self, |arena, idx| {
            arena
                .get_node(idx)
                .map(|n| n.to_string())
                .unwrap_or_default()
        })
    }

    fn to_path_tree(&self) -> Tree<String> {
        render(self, |arena, idx| arena.path(idx))
    }
}

/// Levels below this are collapsed into a single `...` leaf.
pub const MAX_RENDER_DEPTH: usize = 512;

// Built bottom-up from a preorder listing, so neither building nor dropping the
// termtree recurses deeper than MAX_RENDER_DEPTH.
fn render<F>(arena: &TreeArena, text: F) -> Tree<String>
where
    F: Fn(&TreeArena, Index) -> String,
{
    let mut preorder = Vec::with_capacity(arena.len());
    let mut stack: Vec<(Index, usize)> = arena.roots().iter().rev().map(|&r| (r, 1)).collect();
    while let Some((idx, level)) = stack.pop() {
        preorder.push((idx, level));
        if level < MAX_RENDER_DEPTH {
            stack.extend(arena.children(idx).iter().rev().map(|&c| (c, level + 1)));
        }
    }

    // Reverse preorder finishes every child before its parent
    let mut built: HashMap<Index, Tree<String>> = HashMap::with_capacity(preorder.len());
    for &(idx, level) in preorder.iter().rev() {
        let children = arena.children(idx);
        let mut tree = Tree::new(text(arena, idx));
        if level < MAX_RENDER_DEPTH {
            tree = tree.with_leaves(children.iter().filter_map(|c| built.remove(c)));
        } else if !children.is_empty() {
            tree.push(Tree::new("...".to_string()));
        }
        built.insert(idx, tree);
    }

    let leaves: Vec<_> = arena.roots().iter().filter_map(|r| built.remove(r)).collect();
    Tree::new("/".to_string()).with_leaves(leaves)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{organize_into_tree, HierarchyRow};

    #[test]
    fn given_forest_when_rendering_paths_then_nested_under_slash() {
        let tree = organize_into_tree(&[
            HierarchyRow::root("iso", 1, Some("ISO")),
            HierarchyRow::new("org", Some("iso"), 1, 3, Some("ORG")),
        ]);

        let rendered = tree.to_path_tree().to_string();
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(lines[0], "/");
        assert!(lines[1].ends_with("/iso/"));
        assert!(lines[2].ends_with("/iso/org/"));

        let labels = tree.to_tree_string().to_string();
        assert!(labels.contains("ORG (org)"));
    }

    #[test]
    fn given_chain_deeper_than_render_limit_when_rendering_then_truncated() {
        let rows: Vec<_> = (0..5_000u16)
            .map(|level| {
                let parent = level.checked_sub(1).map(|p| format!("n{p}"));
                HierarchyRow::new(format!("n{level}"), parent.as_deref(), level, 0, None)
            })
            .collect();
        let tree = organize_into_tree(&rows);

        let rendered = tree.to_tree_string().to_string();
        let lines: Vec<_> = rendered.lines().collect();

        // "/" + one line per rendered level + the collapsed marker
        assert_eq!(lines.len(), MAX_RENDER_DEPTH + 2);
        assert!(lines[MAX_RENDER_DEPTH].ends_with(&format!("n{}", MAX_RENDER_DEPTH - 1)));
        assert!(lines[MAX_RENDER_DEPTH + 1].ends_with("..."));
    }
}
