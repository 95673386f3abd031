//! The visitor protocol shared by every backend.
//!
//! A graph node is either *map-capable*, exposing named properties
//! through [`MapSerializable`], or *value-capable*, rendering itself as
//! one scalar through [`ValueSerializable`]. The serializer is the visitor
//! target: the node calls back into [`MapSerializer`] / [`ValueSerializer`]
//! operations, and each backend renders the structural punctuation its
//! format needs.
//!
//! The backends differ only in their primitive write operations. Everything
//! shared (boolean tokens, the numeric and identifier funnels, and the
//! dynamic [`Value`] dispatcher) lives here as provided trait methods so a
//! backend implements the small required core and inherits the rest.
//!
//! ## Examples
//!
//! ```rust
//! use polyser::{MapSerializable, MapSerializer, Result, Value};
//!
//! #[derive(Debug)]
//! struct User {
//!     name: String,
//!     active: bool,
//! }
//!
//! impl MapSerializable for User {
//!     fn serialise_map(&self, serializer: &mut dyn MapSerializer) -> Result<()> {
//!         serializer.write_property_string("name", &self.name, false)?;
//!         serializer.write_property_bool("active", self.active, false)?;
//!         Ok(())
//!     }
//! }
//!
//! let user = User { name: "Ada".to_string(), active: true };
//! let json = polyser::to_json_string(&user)?;
//! assert_eq!(json, r#"{"name":"Ada","active":"true"}"#);
//! # Ok::<(), polyser::Error>(())
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use uuid::Uuid;

use crate::value::{GenericMap, Value};
use crate::Result;

/// The token booleans render as when `true`.
pub const TRUE_TOKEN: &str = "true";

/// The token booleans render as when `false`.
pub const FALSE_TOKEN: &str = "false";

/// The shared boolean-to-text convention used by every backend.
#[inline]
#[must_use]
pub const fn bool_token(value: bool) -> &'static str {
    if value {
        TRUE_TOKEN
    } else {
        FALSE_TOKEN
    }
}

/// A graph node exposing named properties.
///
/// The `Debug` bound gives every node a string form of last resort, used
/// for error context and for the tabular backend's flattening fallback.
pub trait MapSerializable: fmt::Debug {
    /// Writes this node's properties to the serializer.
    ///
    /// Property names must be non-empty and unique within this node.
    ///
    /// # Errors
    ///
    /// Propagates any failure from the serializer.
    fn serialise_map(&self, serializer: &mut dyn MapSerializer) -> Result<()>;
}

/// A graph node rendering itself as one scalar.
pub trait ValueSerializable: fmt::Debug {
    /// Writes this node's scalar rendering to the serializer.
    ///
    /// # Errors
    ///
    /// Propagates any failure from the serializer.
    fn serialise_value(&self, serializer: &mut dyn ValueSerializer) -> Result<()>;
}

/// The value-position write operations a backend must render.
///
/// The required methods are the backend's primitives; the provided methods
/// funnel richer scalar types through [`write_value_string`] (a backend
/// overrides them where its format has a native rendering; JSON overrides
/// the integer funnels to emit bare number text) and
/// [`write_value`](ValueSerializer::write_value) routes a dynamic
/// [`Value`] to the right operation.
///
/// [`write_value_string`]: ValueSerializer::write_value_string
pub trait ValueSerializer {
    /// Writes the format's rendering of an absent value.
    fn write_value_null(&mut self) -> Result<()>;

    /// Writes one text scalar.
    fn write_value_string(&mut self, value: &str) -> Result<()>;

    /// Writes a map-capable node in value position.
    fn write_value_map(&mut self, value: &dyn MapSerializable) -> Result<()>;

    /// Writes a scalar-capable node in value position.
    fn write_value_scalar(&mut self, value: &dyn ValueSerializable) -> Result<()>;

    /// Writes an array of map-capable nodes.
    fn write_value_map_array(&mut self, values: &[&dyn MapSerializable]) -> Result<()>;

    /// Writes an array of scalar-capable nodes.
    fn write_value_scalar_array(&mut self, values: &[&dyn ValueSerializable]) -> Result<()>;

    /// Writes an ordered generic collection.
    fn write_value_list(&mut self, values: &[Value<'_>]) -> Result<()>;

    /// Writes an unordered generic collection.
    fn write_value_set(&mut self, values: &[Value<'_>]) -> Result<()>;

    /// Writes a boolean through the shared token convention.
    fn write_value_bool(&mut self, value: bool) -> Result<()> {
        self.write_value_string(bool_token(value))
    }

    /// Writes a signed integer. Funnels to text; numeric formats override.
    fn write_value_i64(&mut self, value: i64) -> Result<()> {
        self.write_value_string(&value.to_string())
    }

    /// Writes an arbitrary-precision integer. Funnels to text; numeric
    /// formats override.
    fn write_value_big_int(&mut self, value: &BigInt) -> Result<()> {
        self.write_value_string(&value.to_string())
    }

    /// Writes an identifier in canonical hyphenated form.
    fn write_value_uuid(&mut self, value: Uuid) -> Result<()> {
        self.write_value_string(&value.to_string())
    }

    /// Writes a point in time as RFC 3339 text.
    fn write_value_timestamp(&mut self, value: DateTime<Utc>) -> Result<()> {
        self.write_value_string(&value.to_rfc3339())
    }

    /// Routes a dynamic value to the matching typed operation.
    ///
    /// The match is exhaustive over the closed [`Value`] enum; every arm
    /// returns, so no category can fall through to a later arm.
    fn write_value(&mut self, value: &Value<'_>) -> Result<()> {
        match value {
            Value::Null => self.write_value_null(),
            Value::Map(v) => self.write_value_map(*v),
            Value::Scalar(v) => self.write_value_scalar(*v),
            Value::MapArray(vs) => self.write_value_map_array(vs),
            Value::ScalarArray(vs) => self.write_value_scalar_array(vs),
            Value::Int(v) => self.write_value_i64(*v),
            Value::Bool(v) => self.write_value_bool(*v),
            Value::String(v) => self.write_value_string(v),
            Value::BigInt(v) => self.write_value_big_int(v),
            Value::Uuid(v) => self.write_value_uuid(*v),
            Value::Timestamp(v) => self.write_value_timestamp(*v),
            Value::List(vs) => self.write_value_list(vs),
            Value::Set(vs) => self.write_value_set(vs),
            Value::Entries(entries) => self.write_value_map(&GenericMap::new(entries)),
        }
    }
}

/// The property-position write operations a backend must render.
///
/// Every operation carries `is_map_entry`: `true` when the property comes
/// from a generic map rather than a fixed field, which backends may render
/// differently (XML emits `<map-entry key="...">` instead of using the name
/// as a tag).
pub trait MapSerializer {
    /// Writes a text property.
    fn write_property_string(&mut self, name: &str, value: &str, is_map_entry: bool)
        -> Result<()>;

    /// Writes an explicitly absent property.
    fn write_property_null(&mut self, name: &str, is_map_entry: bool) -> Result<()>;

    /// Writes a nested map-capable property.
    fn write_property_map(
        &mut self,
        name: &str,
        value: &dyn MapSerializable,
        is_map_entry: bool,
    ) -> Result<()>;

    /// Writes a scalar-capable property.
    fn write_property_scalar(
        &mut self,
        name: &str,
        value: &dyn ValueSerializable,
        is_map_entry: bool,
    ) -> Result<()>;

    /// Writes an array of map-capable nodes under one property.
    fn write_property_map_array(
        &mut self,
        name: &str,
        values: &[&dyn MapSerializable],
        is_map_entry: bool,
    ) -> Result<()>;

    /// Writes an array of scalar-capable nodes under one property.
    fn write_property_scalar_array(
        &mut self,
        name: &str,
        values: &[&dyn ValueSerializable],
        is_map_entry: bool,
    ) -> Result<()>;

    /// Writes an ordered generic collection under one property.
    fn write_property_list(
        &mut self,
        name: &str,
        values: &[Value<'_>],
        is_map_entry: bool,
    ) -> Result<()>;

    /// Writes an unordered generic collection under one property.
    fn write_property_set(
        &mut self,
        name: &str,
        values: &[Value<'_>],
        is_map_entry: bool,
    ) -> Result<()>;

    /// Writes a boolean property through the shared token convention.
    fn write_property_bool(&mut self, name: &str, value: bool, is_map_entry: bool) -> Result<()> {
        self.write_property_string(name, bool_token(value), is_map_entry)
    }

    /// Writes a signed integer property. Funnels to text; numeric formats
    /// override.
    fn write_property_i64(&mut self, name: &str, value: i64, is_map_entry: bool) -> Result<()> {
        self.write_property_string(name, &value.to_string(), is_map_entry)
    }

    /// Writes an arbitrary-precision integer property.
    fn write_property_big_int(
        &mut self,
        name: &str,
        value: &BigInt,
        is_map_entry: bool,
    ) -> Result<()> {
        self.write_property_string(name, &value.to_string(), is_map_entry)
    }

    /// Writes an identifier property in canonical hyphenated form.
    fn write_property_uuid(&mut self, name: &str, value: Uuid, is_map_entry: bool) -> Result<()> {
        self.write_property_string(name, &value.to_string(), is_map_entry)
    }

    /// Writes a point-in-time property as RFC 3339 text.
    fn write_property_timestamp(
        &mut self,
        name: &str,
        value: DateTime<Utc>,
        is_map_entry: bool,
    ) -> Result<()> {
        self.write_property_string(name, &value.to_rfc3339(), is_map_entry)
    }

    /// Routes a dynamic value to the matching typed property operation.
    fn write_property(&mut self, name: &str, value: &Value<'_>, is_map_entry: bool) -> Result<()> {
        match value {
            Value::Null => self.write_property_null(name, is_map_entry),
            Value::Map(v) => self.write_property_map(name, *v, is_map_entry),
            Value::Scalar(v) => self.write_property_scalar(name, *v, is_map_entry),
            Value::MapArray(vs) => self.write_property_map_array(name, vs, is_map_entry),
            Value::ScalarArray(vs) => self.write_property_scalar_array(name, vs, is_map_entry),
            Value::Int(v) => self.write_property_i64(name, *v, is_map_entry),
            Value::Bool(v) => self.write_property_bool(name, *v, is_map_entry),
            Value::String(v) => self.write_property_string(name, v, is_map_entry),
            Value::BigInt(v) => self.write_property_big_int(name, v, is_map_entry),
            Value::Uuid(v) => self.write_property_uuid(name, *v, is_map_entry),
            Value::Timestamp(v) => self.write_property_timestamp(name, *v, is_map_entry),
            Value::List(vs) => self.write_property_list(name, vs, is_map_entry),
            Value::Set(vs) => self.write_property_set(name, vs, is_map_entry),
            Value::Entries(entries) => {
                self.write_property_map(name, &GenericMap::new(entries), is_map_entry)
            }
        }
    }
}

/// A complete backend: both write surfaces plus the stream lifecycle.
///
/// One instance serializes exactly one graph: `start`, walk, `finish`.
/// `finish` flushes the sink but never closes it; the sink's lifecycle
/// belongs to the caller, including on the error path.
pub trait Serializer: MapSerializer + ValueSerializer {
    /// Writes any preamble the format needs before the graph walk.
    fn start(&mut self) -> Result<()>;

    /// Writes any trailer the format needs, then flushes the sink.
    fn finish(&mut self) -> Result<()>;
}

/// Writes the property if `Some`, or the format's null rendering if `None`.
pub fn write_nullable_string_property<S>(
    serializer: &mut S,
    name: &str,
    value: Option<&str>,
) -> Result<()>
where
    S: MapSerializer + ?Sized,
{
    match value {
        Some(value) => serializer.write_property_string(name, value, false),
        None => serializer.write_property_null(name, false),
    }
}

/// Writes the property if `Some`, or the format's null rendering if `None`.
pub fn write_nullable_i64_property<S>(
    serializer: &mut S,
    name: &str,
    value: Option<i64>,
) -> Result<()>
where
    S: MapSerializer + ?Sized,
{
    match value {
        Some(value) => serializer.write_property_i64(name, value, false),
        None => serializer.write_property_null(name, false),
    }
}

/// Writes the property if `Some`, or the format's null rendering if `None`.
pub fn write_nullable_bool_property<S>(
    serializer: &mut S,
    name: &str,
    value: Option<bool>,
) -> Result<()>
where
    S: MapSerializer + ?Sized,
{
    match value {
        Some(value) => serializer.write_property_bool(name, value, false),
        None => serializer.write_property_null(name, false),
    }
}

/// Writes the property if `Some`; skips it entirely if `None`.
pub fn write_optional_scalar_property<S>(
    serializer: &mut S,
    name: &str,
    value: Option<&dyn ValueSerializable>,
) -> Result<()>
where
    S: MapSerializer + ?Sized,
{
    match value {
        Some(value) => serializer.write_property_scalar(name, value, false),
        None => Ok(()),
    }
}
