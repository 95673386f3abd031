//! The matcher tree: the tabular backend's output schema.
//!
//! A [`Matcher`] maps property-name paths onto flat columns. The tree is
//! immutable, built once before serialization begins, and shared by every
//! row the run emits. Three node kinds:
//!
//! - [`Matcher::Leaf`]: this path targets one column. Carries the field
//!   index and the separator used to join a nested collection found under
//!   the path into a single field.
//! - [`Matcher::Recurse`]: a structural grouping node; its children carry
//!   the meaning. Cannot record a value and has no separator.
//! - [`Matcher::IgnoreChildren`]: this path and everything beneath it is
//!   discarded without error.
//!
//! Duplicate child names are rejected at build time; last-wins
//! registration would silently drop a column mapping.
//!
//! ## Examples
//!
//! ```rust
//! use polyser::Matcher;
//!
//! let root = Matcher::root([
//!     ("name", Matcher::leaf(0, ",")),
//!     ("address", Matcher::recurse([
//!         ("city", Matcher::leaf(1, ",")),
//!     ])?),
//!     ("internal", Matcher::ignore_children()),
//! ])?;
//!
//! assert!(root.match_child("name").is_ok());
//! assert!(root.match_child("unknown").is_err());
//! # Ok::<(), polyser::Error>(())
//! ```

use indexmap::IndexMap;

use crate::error::StructuralViolation;
use crate::row::Row;
use crate::Result;

/// One node of the path-matching tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Matcher {
    /// The path targets the column at `field_index`; nested collections
    /// under it are joined with `separator`.
    Leaf {
        field_index: usize,
        separator: String,
    },
    /// A grouping node whose children resolve the next path component.
    Recurse {
        children: IndexMap<String, Matcher>,
    },
    /// Swallows this path and all its descendants.
    IgnoreChildren,
}

impl Matcher {
    /// A leaf targeting `field_index`, joining nested collections with
    /// `separator`.
    pub fn leaf(field_index: usize, separator: impl Into<String>) -> Self {
        Matcher::Leaf {
            field_index,
            separator: separator.into(),
        }
    }

    /// A grouping node with the given named children.
    ///
    /// # Errors
    ///
    /// [`StructuralViolation::DuplicateMatcherChild`] if two children share
    /// a name.
    pub fn recurse<N, I>(children: I) -> Result<Self>
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, Matcher)>,
    {
        let mut index = IndexMap::new();
        for (name, child) in children {
            let name = name.into();
            if index.contains_key(&name) {
                return Err(StructuralViolation::DuplicateMatcherChild { name }.into());
            }
            index.insert(name, child);
        }
        Ok(Matcher::Recurse { children: index })
    }

    /// The root of a matcher tree: a grouping node matching the top-level
    /// map's properties.
    ///
    /// # Errors
    ///
    /// As [`Matcher::recurse`].
    pub fn root<N, I>(children: I) -> Result<Self>
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, Matcher)>,
    {
        Matcher::recurse(children)
    }

    /// A node discarding everything at and beneath its path.
    #[must_use]
    pub fn ignore_children() -> Self {
        Matcher::IgnoreChildren
    }

    /// Resolves the child matcher for a property name.
    ///
    /// An ignore node resolves every name to itself, so whole subtrees are
    /// swallowed without registration.
    ///
    /// # Errors
    ///
    /// A leaf has no children; a grouping node fails for unregistered
    /// names.
    pub fn match_child(&self, name: &str) -> Result<&Matcher> {
        match self {
            Matcher::Leaf { .. } => Err(StructuralViolation::LeafHasNoChildren {
                name: name.to_string(),
            }
            .into()),
            Matcher::Recurse { children } => children.get(name).ok_or_else(|| {
                StructuralViolation::UnknownMatcherChild {
                    name: name.to_string(),
                }
                .into()
            }),
            Matcher::IgnoreChildren => Ok(self),
        }
    }

    /// Records a raw value through this node.
    ///
    /// A leaf writes into its column; an ignore node drops the value.
    ///
    /// # Errors
    ///
    /// A grouping node is structural and cannot record; the row rejects
    /// duplicate or out-of-range indices.
    pub fn record_value(&self, raw_value: &str, row: &mut Row) -> Result<()> {
        match self {
            Matcher::Leaf { field_index, .. } => row.record_value(*field_index, raw_value),
            Matcher::Recurse { .. } => Err(StructuralViolation::RecurseCannotRecord {
                value: raw_value.to_string(),
            }
            .into()),
            Matcher::IgnoreChildren => Ok(()),
        }
    }

    /// The separator joining a nested collection under this path.
    ///
    /// # Errors
    ///
    /// A grouping node has no separator.
    pub fn separator(&self) -> Result<&str> {
        match self {
            Matcher::Leaf { separator, .. } => Ok(separator),
            Matcher::Recurse { .. } => Err(StructuralViolation::RecurseHasNoSeparator.into()),
            Matcher::IgnoreChildren => Ok(""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn duplicate_children_fail_at_build_time() {
        let err = Matcher::root([
            ("name", Matcher::leaf(0, ",")),
            ("name", Matcher::leaf(1, ",")),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Structure(StructuralViolation::DuplicateMatcherChild { .. })
        ));
    }

    #[test]
    fn leaf_contract() {
        let leaf = Matcher::leaf(2, ";");
        assert!(matches!(
            leaf.match_child("anything").unwrap_err(),
            Error::Structure(StructuralViolation::LeafHasNoChildren { .. })
        ));
        assert_eq!(leaf.separator().unwrap(), ";");

        let mut row = Row::fixed(3);
        leaf.record_value("v", &mut row).unwrap();
    }

    #[test]
    fn recurse_contract() {
        let root = Matcher::root([("a", Matcher::leaf(0, ","))]).unwrap();
        assert!(matches!(
            root.match_child("b").unwrap_err(),
            Error::Structure(StructuralViolation::UnknownMatcherChild { .. })
        ));
        let mut row = Row::fixed(1);
        assert!(matches!(
            root.record_value("v", &mut row).unwrap_err(),
            Error::Structure(StructuralViolation::RecurseCannotRecord { .. })
        ));
        assert!(root.separator().is_err());
    }

    #[test]
    fn ignore_swallows_names_and_values() {
        let ignore = Matcher::ignore_children();
        let resolved = ignore.match_child("deeply").unwrap();
        let resolved = resolved.match_child("nested").unwrap();
        let mut row = Row::fixed(1);
        resolved.record_value("dropped", &mut row).unwrap();
        assert_eq!(ignore.separator().unwrap(), "");
    }
}
