//! Streaming JSON backend.
//!
//! [`JsonSerializer`] renders the graph walk as a single JSON document,
//! forward-only. The only state it needs is one flag per open scope, "has
//! a property been written here yet", which decides between emitting `"`
//! and `,"` in front of each key. Scopes nest with the call stack, so the
//! flag is saved into a local on entering a nested map or array and
//! restored on the way out; nothing is left to unwind at `finish`.
//!
//! Strings are escaped code unit by code unit: the conventional short
//! escapes for backspace, tab, line feed, form feed and carriage return,
//! `\u00xx` for the remaining codes at or below U+0019, and backslash
//! escapes for `"`, `\` and `/`. Everything else passes through untouched,
//! including astral code points, whose surrogate pairs are never collapsed
//! or individually escaped.
//!
//! ## Examples
//!
//! ```rust
//! use polyser::{MapSerializable, MapSerializer, Result};
//!
//! #[derive(Debug)]
//! struct Point {
//!     x: i64,
//!     y: i64,
//! }
//!
//! impl MapSerializable for Point {
//!     fn serialise_map(&self, serializer: &mut dyn MapSerializer) -> Result<()> {
//!         serializer.write_property_i64("x", self.x, false)?;
//!         serializer.write_property_i64("y", self.y, false)
//!     }
//! }
//!
//! let json = polyser::to_json_string(&Point { x: 1, y: 2 })?;
//! assert_eq!(json, r#"{"x":1,"y":2}"#);
//! # Ok::<(), polyser::Error>(())
//! ```

use std::io::Write;
use std::mem;

use num_bigint::BigInt;

use crate::protocol::{
    MapSerializable, MapSerializer, Serializer, ValueSerializable, ValueSerializer,
};
use crate::value::Value;
use crate::Result;

/// Per-scope structural state.
#[derive(Clone, Copy, Debug, Default)]
struct NodeState {
    has_subsequent_property: bool,
}

/// A streaming JSON serializer over any byte sink.
///
/// Single-use: one instance serializes one graph between
/// [`start`](Serializer::start) and [`finish`](Serializer::finish). The
/// root of the graph is a single map node, written through
/// [`write_value_map`](ValueSerializer::write_value_map).
#[derive(Debug)]
pub struct JsonSerializer<W: Write> {
    writer: W,
    scope: NodeState,
}

impl<W: Write> JsonSerializer<W> {
    /// Creates a serializer writing to `writer`.
    pub fn new(writer: W) -> Self {
        JsonSerializer {
            writer,
            scope: NodeState::default(),
        }
    }

    /// Consumes the serializer, returning the sink.
    pub fn into_inner(self) -> W {
        self.writer
    }

    pub(crate) fn writer_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Emits the punctuation in front of a key: `,"` between siblings, a
    /// bare `"` for the first property of the scope.
    fn begin_property(&mut self) -> Result<()> {
        if self.scope.has_subsequent_property {
            self.writer.write_all(b",\"")?;
        } else {
            self.writer.write_all(b"\"")?;
            self.scope.has_subsequent_property = true;
        }
        Ok(())
    }

    fn begin_named_value(&mut self, name: &str) -> Result<()> {
        self.begin_property()?;
        escape_into(name, &mut self.writer)?;
        self.writer.write_all(b"\":")?;
        Ok(())
    }
}

impl<W: Write> MapSerializer for JsonSerializer<W> {
    fn write_property_string(
        &mut self,
        name: &str,
        value: &str,
        _is_map_entry: bool,
    ) -> Result<()> {
        self.begin_property()?;
        escape_into(name, &mut self.writer)?;
        self.writer.write_all(b"\":\"")?;
        escape_into(value, &mut self.writer)?;
        self.writer.write_all(b"\"")?;
        Ok(())
    }

    fn write_property_null(&mut self, name: &str, _is_map_entry: bool) -> Result<()> {
        self.begin_named_value(name)?;
        self.write_value_null()
    }

    fn write_property_map(
        &mut self,
        name: &str,
        value: &dyn MapSerializable,
        _is_map_entry: bool,
    ) -> Result<()> {
        self.begin_named_value(name)?;
        self.write_value_map(value)
    }

    fn write_property_scalar(
        &mut self,
        name: &str,
        value: &dyn ValueSerializable,
        _is_map_entry: bool,
    ) -> Result<()> {
        self.begin_named_value(name)?;
        self.write_value_scalar(value)
    }

    fn write_property_map_array(
        &mut self,
        name: &str,
        values: &[&dyn MapSerializable],
        _is_map_entry: bool,
    ) -> Result<()> {
        self.begin_named_value(name)?;
        self.write_value_map_array(values)
    }

    fn write_property_scalar_array(
        &mut self,
        name: &str,
        values: &[&dyn ValueSerializable],
        _is_map_entry: bool,
    ) -> Result<()> {
        self.begin_named_value(name)?;
        self.write_value_scalar_array(values)
    }

    fn write_property_list(
        &mut self,
        name: &str,
        values: &[Value<'_>],
        _is_map_entry: bool,
    ) -> Result<()> {
        self.begin_named_value(name)?;
        self.write_value_list(values)
    }

    fn write_property_set(
        &mut self,
        name: &str,
        values: &[Value<'_>],
        _is_map_entry: bool,
    ) -> Result<()> {
        self.begin_named_value(name)?;
        self.write_value_set(values)
    }

    fn write_property_i64(&mut self, name: &str, value: i64, _is_map_entry: bool) -> Result<()> {
        self.begin_named_value(name)?;
        self.write_value_i64(value)
    }

    fn write_property_big_int(
        &mut self,
        name: &str,
        value: &BigInt,
        _is_map_entry: bool,
    ) -> Result<()> {
        self.begin_named_value(name)?;
        self.write_value_big_int(value)
    }
}

impl<W: Write> ValueSerializer for JsonSerializer<W> {
    fn write_value_null(&mut self) -> Result<()> {
        self.writer.write_all(b"null")?;
        Ok(())
    }

    fn write_value_string(&mut self, value: &str) -> Result<()> {
        self.writer.write_all(b"\"")?;
        escape_into(value, &mut self.writer)?;
        self.writer.write_all(b"\"")?;
        Ok(())
    }

    // Integers render as bare JSON numbers, not quoted text.
    fn write_value_i64(&mut self, value: i64) -> Result<()> {
        write!(self.writer, "{value}")?;
        Ok(())
    }

    fn write_value_big_int(&mut self, value: &BigInt) -> Result<()> {
        write!(self.writer, "{value}")?;
        Ok(())
    }

    fn write_value_map(&mut self, value: &dyn MapSerializable) -> Result<()> {
        let saved = mem::take(&mut self.scope);
        self.writer.write_all(b"{")?;
        value.serialise_map(self)?;
        self.writer.write_all(b"}")?;
        self.scope = saved;
        Ok(())
    }

    fn write_value_scalar(&mut self, value: &dyn ValueSerializable) -> Result<()> {
        value.serialise_value(self)
    }

    fn write_value_map_array(&mut self, values: &[&dyn MapSerializable]) -> Result<()> {
        let saved = mem::take(&mut self.scope);
        self.writer.write_all(b"[")?;
        for (index, value) in values.iter().enumerate() {
            if index != 0 {
                self.writer.write_all(b",")?;
            }
            self.write_value_map(*value)?;
        }
        self.writer.write_all(b"]")?;
        self.scope = saved;
        Ok(())
    }

    fn write_value_scalar_array(&mut self, values: &[&dyn ValueSerializable]) -> Result<()> {
        let saved = mem::take(&mut self.scope);
        self.writer.write_all(b"[")?;
        for (index, value) in values.iter().enumerate() {
            if index != 0 {
                self.writer.write_all(b",")?;
            }
            self.write_value_scalar(*value)?;
        }
        self.writer.write_all(b"]")?;
        self.scope = saved;
        Ok(())
    }

    fn write_value_list(&mut self, values: &[Value<'_>]) -> Result<()> {
        let saved = mem::take(&mut self.scope);
        self.writer.write_all(b"[")?;
        for (index, value) in values.iter().enumerate() {
            if index != 0 {
                self.writer.write_all(b",")?;
            }
            self.write_value(value)?;
        }
        self.writer.write_all(b"]")?;
        self.scope = saved;
        Ok(())
    }

    fn write_value_set(&mut self, values: &[Value<'_>]) -> Result<()> {
        self.write_value_list(values)
    }
}

impl<W: Write> Serializer for JsonSerializer<W> {
    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Escapes `value` into `writer` per the JSON string grammar.
///
/// Only code points at or below U+0019 plus `"`, `\` and `/` are ever
/// escaped, so scanning by `char` emits the same bytes as scanning UTF-16
/// code units would: astral code points pass through as their two
/// unescaped units.
pub(crate) fn escape_into<W: Write>(value: &str, writer: &mut W) -> Result<()> {
    for ch in value.chars() {
        match ch {
            '\u{08}' => writer.write_all(b"\\b")?,
            '\t' => writer.write_all(b"\\t")?,
            '\n' => writer.write_all(b"\\n")?,
            '\u{0C}' => writer.write_all(b"\\f")?,
            '\r' => writer.write_all(b"\\r")?,
            '"' => writer.write_all(b"\\\"")?,
            '\\' => writer.write_all(b"\\\\")?,
            '/' => writer.write_all(b"\\/")?,
            ch if ch <= '\u{19}' => write!(writer, "\\u{:04x}", ch as u32)?,
            ch => {
                let mut buf = [0u8; 4];
                writer.write_all(ch.encode_utf8(&mut buf).as_bytes())?;
            }
        }
    }
    Ok(())
}
