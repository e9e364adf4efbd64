use generational_arena::{Arena, Index};
use std::fmt;
use tracing::instrument;

use crate::domain::entities::HierarchyRow;

/// Tree node in the arena-based forest.
#[derive(Debug)]
pub struct TreeNode {
    /// Row this node was assembled from
    pub row: HierarchyRow,
    /// Index of parent node in the arena, None for root nodes
    pub parent: Option<Index>,
    /// Indices of child nodes in the arena, in sibling order
    pub children: Vec<Index>,
}

impl fmt::Display for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.row)
    }
}

/// Arena-based forest of assembled tree-path rows.
///
/// Parents own their children through index lists; the child-to-parent link is
/// a plain index, so there are no ownership cycles. A forest is a snapshot: it is
/// rebuilt from rows on every assembly and never written back.
#[derive(Debug)]
pub struct TreeArena {
    /// Arena storage for all tree nodes
    arena: Arena<TreeNode>,
    /// Indices of the top-level nodes, in sibling order
    roots: Vec<Index>,
}

impl Default for TreeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeArena {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            roots: Vec::new(),
        }
    }

    /// Add a node below `parent` (or as a root) after any existing siblings.
    #[instrument(level = "trace", skip(self))]
    pub fn insert_node(&mut self, row: HierarchyRow, parent: Option<Index>) -> Index {
        let node = TreeNode {
            row,
            parent,
            children: Vec::new(),
        };
        let node_idx = self.arena.insert(node);

        match parent {
            Some(parent_idx) => {
                if let Some(parent) = self.arena.get_mut(parent_idx) {
                    parent.children.push(node_idx);
                }
            }
            None => self.roots.push(node_idx),
        }

        node_idx
    }

    /// Stable-sort the children of `parent` (or the roots) by ascending sort order.
    pub fn sort_siblings(&mut self, parent: Option<Index>) {
        let mut siblings = match parent {
            Some(idx) => match self.arena.get_mut(idx) {
                Some(node) => std::mem::take(&mut node.children),
                None => return,
            },
            None => std::mem::take(&mut self.roots),
        };

        siblings.sort_by_key(|&idx| self.arena.get(idx).map(|n| n.row.sort_order));

        match parent {
            Some(idx) => {
                if let Some(node) = self.arena.get_mut(idx) {
                    node.children = siblings;
                }
            }
            None => self.roots = siblings,
        }
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub fn roots(&self) -> &[Index] {
        &self.roots
    }

    /// Child indices of a node; empty for unknown indices.
    pub fn children(&self, idx: Index) -> &[Index] {
        self.arena
            .get(idx)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Preorder traversal: each root followed by its subtree, siblings in order.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    /// Rows of the forest in preorder.
    pub fn flatten(&self) -> Vec<&HierarchyRow> {
        self.iter().map(|(_, node)| &node.row).collect()
    }

    /// Height of the tallest tree (0 for an empty forest).
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        let mut max_level = 0;
        let mut stack: Vec<(Index, usize)> = self.roots.iter().map(|&root| (root, 1)).collect();
        while let Some((idx, level)) = stack.pop() {
            max_level = max_level.max(level);
            stack.extend(self.children(idx).iter().map(|&child| (child, level + 1)));
        }
        max_level
    }

    /// Slash-separated idents from the root down to `idx`, e.g. `/iso/org/dod/`.
    ///
    /// Follows the parent back-references, so it is only meaningful for indices
    /// of this arena; unknown indices yield `/`.
    pub fn path(&self, idx: Index) -> String {
        let mut idents = Vec::new();
        let mut current = Some(idx);
        while let Some(node) = current.and_then(|i| self.get_node(i)) {
            idents.push(node.row.ident.as_str());
            current = node.parent;
        }

        let mut path = String::from("/");
        for ident in idents.iter().rev() {
            path.push_str(ident);
            path.push('/');
        }
        path
    }

    /// Tree paths of all leaf nodes (nodes with no children), in preorder.
    #[instrument(level = "debug", skip(self))]
    pub fn leaf_nodes(&self) -> Vec<String> {
        self.iter()
            .filter(|(_, node)| node.children.is_empty())
            .map(|(idx, _)| self.path(idx))
            .collect()
    }
}

pub struct TreeIterator<'a> {
    arena: &'a TreeArena,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(arena: &'a TreeArena) -> Self {
        // Reverse so the first root is popped first
        let stack = arena.roots.iter().rev().copied().collect();
        Self { arena, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}
