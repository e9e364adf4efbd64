//! Domain entities: core data structures

use std::fmt;

use crate::domain::error::{DomainError, DomainResult};

/// Maximum length of `ident` and `parent_ident` (char(12) column).
pub const MAX_IDENT_LEN: usize = 12;

/// Maximum length of `label` (char(32) column).
pub const MAX_LABEL_LEN: usize = 32;

/// One persisted position of one node in a tree-shaped dataset.
///
/// The same `ident` may appear in several rows, at different depths or under
/// different parents. Only the triple `(ident, parent_ident, depth)` identifies a row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HierarchyRow {
    /// Logical node identifier
    pub ident: String,
    /// Identifier of the parent node, None for top-level rows
    pub parent_ident: Option<String>,
    /// 0 for top-level rows, 1 for their children, etc.
    pub depth: u16,
    /// Sibling order, ascending
    pub sort_order: i16,
    /// Display label
    pub label: Option<String>,
}

impl HierarchyRow {
    pub fn new(
        ident: impl Into<String>,
        parent_ident: Option<&str>,
        depth: u16,
        sort_order: i16,
        label: Option<&str>,
    ) -> Self {
        Self {
            ident: ident.into(),
            parent_ident: parent_ident.map(str::to_string),
            depth,
            sort_order,
            label: label.map(str::to_string),
        }
    }

    /// Top-level row: depth 0, no parent.
    pub fn root(ident: impl Into<String>, sort_order: i16, label: Option<&str>) -> Self {
        Self::new(ident, None, 0, sort_order, label)
    }

    /// Composite key used by every keyed store operation.
    pub fn identity(&self) -> RowIdentity {
        RowIdentity {
            ident: self.ident.clone(),
            parent_ident: self.parent_ident.clone(),
            depth: self.depth,
        }
    }

    /// Check field lengths against the persisted column widths.
    pub fn validate(&self) -> DomainResult<()> {
        validate_ident("ident", &self.ident)?;
        if let Some(parent) = &self.parent_ident {
            check_len("parent_ident", parent, MAX_IDENT_LEN)?;
        }
        validate_label(self.label.as_deref())
    }
}

impl fmt::Display for HierarchyRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{} ({})", label, self.ident),
            None => write!(f, "{}", self.ident),
        }
    }
}

/// Composite identity `(ident, parent_ident, depth)` of a row.
///
/// `parent_ident == None` matches only parentless rows; it is never a wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowIdentity {
    pub ident: String,
    pub parent_ident: Option<String>,
    pub depth: u16,
}

impl RowIdentity {
    pub fn new(ident: impl Into<String>, depth: u16, parent_ident: Option<&str>) -> Self {
        Self {
            ident: ident.into(),
            parent_ident: parent_ident.map(str::to_string),
            depth,
        }
    }

    pub fn matches(&self, row: &HierarchyRow) -> bool {
        self.ident == row.ident && self.depth == row.depth && self.parent_ident == row.parent_ident
    }
}

impl fmt::Display for RowIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{} (parent: {})",
            self.ident,
            self.depth,
            self.parent_ident.as_deref().unwrap_or("-")
        )
    }
}

/// Validate an identifier value (non-empty, at most 12 chars).
pub fn validate_ident(field: &'static str, value: &str) -> DomainResult<()> {
    if value.is_empty() {
        return Err(DomainError::EmptyIdent);
    }
    check_len(field, value, MAX_IDENT_LEN)
}

/// Validate a label value (at most 32 chars).
pub fn validate_label(label: Option<&str>) -> DomainResult<()> {
    match label {
        Some(label) => check_len("label", label, MAX_LABEL_LEN),
        None => Ok(()),
    }
}

fn check_len(field: &'static str, value: &str, max: usize) -> DomainResult<()> {
    let len = value.chars().count();
    if len > max {
        return Err(DomainError::FieldTooLong {
            field,
            value: value.to_string(),
            len,
            max,
        });
    }
    Ok(())
}
