//! Dynamic value representation for graph properties.
//!
//! [`Value`] is the single dynamic type the shared dispatcher routes on.
//! Where the graph's shape is known statically, callers use the typed
//! operations on [`MapSerializer`](crate::MapSerializer) and
//! [`ValueSerializer`](crate::ValueSerializer) directly; `Value` covers the
//! generically-typed case: a property whose category is only known at run
//! time.
//!
//! The enum is closed: every category a backend can render has a variant,
//! and the dispatcher matches exhaustively, so there is no "unsupported
//! type" failure left to raise.
//!
//! ## Examples
//!
//! ```rust
//! use polyser::Value;
//!
//! let answer = Value::from(42i64);
//! let name = Value::from("Ada");
//! assert!(!answer.is_null());
//! assert!(Value::Null.is_null());
//! ```

use std::borrow::Cow;
use std::fmt;

use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use uuid::Uuid;

use crate::protocol::{MapSerializable, MapSerializer, ValueSerializable};
use crate::Result;

/// A dynamically-typed graph value.
///
/// Borrowed throughout: a `Value` is a cheap, copyable view over data owned
/// by the caller's object model, built just long enough to route one write.
///
/// The variant order mirrors the dispatch priority: null first, then the
/// visitor capabilities, then aggregates of them, then primitives and
/// identifier-like scalars, then generic collections and maps.
#[derive(Clone, Copy, Debug, Default)]
pub enum Value<'a> {
    /// An explicitly absent scalar.
    #[default]
    Null,
    /// A node rendering itself as a set of named properties.
    Map(&'a dyn MapSerializable),
    /// A node rendering itself as one scalar.
    Scalar(&'a dyn ValueSerializable),
    /// An array of map-capable nodes.
    MapArray(&'a [&'a dyn MapSerializable]),
    /// An array of scalar-capable nodes.
    ScalarArray(&'a [&'a dyn ValueSerializable]),
    /// A signed integer (all machine widths funnel through `i64`).
    Int(i64),
    /// A boolean, rendered through the shared `"true"`/`"false"` tokens.
    Bool(bool),
    /// Borrowed text.
    String(&'a str),
    /// An arbitrary-precision integer, rendered as bare digit text.
    BigInt(&'a BigInt),
    /// An identifier, rendered in canonical hyphenated form.
    Uuid(Uuid),
    /// A point in time, rendered as RFC 3339 text.
    Timestamp(DateTime<Utc>),
    /// An ordered generic collection.
    List(&'a [Value<'a>]),
    /// An unordered generic collection (order as supplied).
    Set(&'a [Value<'a>]),
    /// A generic map, rendered as a synthetic map node whose keys are
    /// stringified through [`PropertyNameSerializable`].
    Entries(&'a [(&'a dyn PropertyNameSerializable, Value<'a>)]),
}

impl Value<'_> {
    /// Returns `true` for [`Value::Null`].
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<bool> for Value<'_> {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value<'_> {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<i64> for Value<'_> {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(value: &'a str) -> Self {
        Value::String(value)
    }
}

impl<'a> From<&'a BigInt> for Value<'a> {
    fn from(value: &'a BigInt) -> Self {
        Value::BigInt(value)
    }
}

impl From<Uuid> for Value<'_> {
    fn from(value: Uuid) -> Self {
        Value::Uuid(value)
    }
}

impl From<DateTime<Utc>> for Value<'_> {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Timestamp(value)
    }
}

/// A key type that knows how to render itself as a property name.
///
/// Generic-map keys are stringified through this trait when a map is
/// serialized as a synthetic map node; implement it for domain key types
/// whose natural display form is not the right field token.
pub trait PropertyNameSerializable: fmt::Debug {
    /// Renders this key as a field token.
    fn serialise_to_property_name(&self) -> Cow<'_, str>;
}

impl PropertyNameSerializable for str {
    fn serialise_to_property_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl PropertyNameSerializable for String {
    fn serialise_to_property_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_str())
    }
}

impl PropertyNameSerializable for i64 {
    fn serialise_to_property_name(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }
}

impl PropertyNameSerializable for u64 {
    fn serialise_to_property_name(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }
}

impl PropertyNameSerializable for Uuid {
    fn serialise_to_property_name(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }
}

/// A generic map wrapped as a synthetic map node.
///
/// Every entry is written with the map-entry flag set, so backends that
/// distinguish map entries from ordinary properties (XML's
/// `<map-entry key="...">`) render them correctly.
#[derive(Clone, Copy, Debug)]
pub struct GenericMap<'a> {
    entries: &'a [(&'a dyn PropertyNameSerializable, Value<'a>)],
}

impl<'a> GenericMap<'a> {
    /// Wraps a slice of key/value pairs.
    #[must_use]
    pub const fn new(entries: &'a [(&'a dyn PropertyNameSerializable, Value<'a>)]) -> Self {
        GenericMap { entries }
    }
}

impl MapSerializable for GenericMap<'_> {
    fn serialise_map(&self, serializer: &mut dyn MapSerializer) -> Result<()> {
        for (key, value) in self.entries {
            let name = key.serialise_to_property_name();
            serializer.write_property(&name, value, true)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_checks() {
        assert!(Value::Null.is_null());
        assert!(!Value::from(false).is_null());
        assert!(!Value::from("").is_null());
    }

    #[test]
    fn conversions() {
        assert!(matches!(Value::from(7i32), Value::Int(7)));
        assert!(matches!(Value::from(true), Value::Bool(true)));
        assert!(matches!(Value::from("x"), Value::String("x")));
    }

    #[test]
    fn property_names_render() {
        assert_eq!("age".serialise_to_property_name(), "age");
        assert_eq!(42i64.serialise_to_property_name(), "42");
        let id = Uuid::nil();
        assert_eq!(
            id.serialise_to_property_name(),
            "00000000-0000-0000-0000-000000000000"
        );
    }
}
