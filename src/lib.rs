//! # polyser
//!
//! A streaming serialization core that renders an in-memory object graph
//! into JSON (plus a JSONP variant), XML, or delimited tabular text
//! (CSV/TSV) through a single polymorphic visitor protocol.
//!
//! ## How it works
//!
//! Your object model implements the visitor capabilities:
//!
//! - [`MapSerializable`]: the node exposes named properties;
//! - [`ValueSerializable`]: the node renders itself as one scalar.
//!
//! A backend ([`JsonSerializer`], [`JsonPSerializer`], [`XmlSerializer`],
//! [`SeparatedValueSerializer`]) is the visitor target: the graph walks
//! itself by calling `write_property_*` / `write_value_*` operations, and
//! the backend keeps whatever per-nesting-level state its format needs to
//! emit correct structural punctuation while streaming forward-only.
//!
//! ## Key properties
//!
//! - **Streaming**: output goes straight to any [`std::io::Write`], no
//!   intermediate document tree.
//! - **One protocol, three text shapes**: the same graph serializes to
//!   JSON, XML, or flat delimited rows without touching the object model.
//! - **Typed failures**: sink errors, encoding violations and structural
//!   (contract) violations are distinct, inspectable error families.
//! - **Deterministic**: serializing the same immutable graph twice yields
//!   byte-identical output.
//!
//! ## Quick start
//!
//! ```rust
//! use polyser::{MapSerializable, MapSerializer, Result};
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
//!
//! let json = polyser::to_json_string(&user)?;
//! assert_eq!(json, r#"{"name":"Ada","active":"true"}"#);
//! # Ok::<(), polyser::Error>(())
//! ```
//!
//! ## Tabular output
//!
//! The tabular backend needs a schema: a [`Matcher`] tree mapping
//! property-name paths onto column indices.
//!
//! ```rust
//! use polyser::{MapSerializable, MapSerializer, Matcher, Result};
//! # #[derive(Debug)]
//! # struct User { name: String, active: bool }
//! # impl MapSerializable for User {
//! #     fn serialise_map(&self, serializer: &mut dyn MapSerializer) -> Result<()> {
//! #         serializer.write_property_string("name", &self.name, false)?;
//! #         serializer.write_property_bool("active", self.active, false)?;
//! #         Ok(())
//! #     }
//! # }
//!
//! let root = Matcher::root([
//!     ("name", Matcher::leaf(0, ",")),
//!     ("active", Matcher::leaf(1, ",")),
//! ])?;
//!
//! let ada = User { name: "Ada".to_string(), active: true };
//! let rows: Vec<&dyn MapSerializable> = vec![&ada];
//! let csv = polyser::to_csv_string(root, &["name", "active"], true, &rows)?;
//! assert_eq!(csv, "\"name\",\"active\"\r\n\"Ada\",\"true\"\r\n");
//! # Ok::<(), polyser::Error>(())
//! ```
//!
//! ## Scope
//!
//! This is a one-way writer. There is no deserialization, no
//! pretty-printing, and no schema validation; a serializer instance is
//! single-use and single-threaded, and the byte sink's lifecycle belongs to
//! the caller: `finish` flushes but never closes.

pub mod error;
pub mod escaper;
pub mod flatten;
pub mod json;
pub mod jsonp;
pub mod matcher;
pub mod protocol;
pub mod row;
pub mod separated;
pub mod utf16;
pub mod value;
pub mod xml;

pub use error::{EncodingViolation, Error, Result, StructuralViolation};
pub use escaper::{
    EscapePolicy, FieldEscaper, COMMA_SEPARATED, TAB_SEPARATED_SANITISING, TAB_SEPARATED_STRICT,
};
pub use flatten::FlatteningValueSerializer;
pub use json::JsonSerializer;
pub use jsonp::{validate_function_name, validate_function_name_utf16, JsonPSerializer};
pub use matcher::Matcher;
pub use protocol::{
    bool_token, write_nullable_bool_property, write_nullable_i64_property,
    write_nullable_string_property, write_optional_scalar_property, MapSerializable,
    MapSerializer, Serializer, ValueSerializable, ValueSerializer, FALSE_TOKEN, TRUE_TOKEN,
};
pub use row::Row;
pub use separated::SeparatedValueSerializer;
pub use utf16::decode_utf16_strict;
pub use value::{GenericMap, PropertyNameSerializable, Value};
pub use xml::{XmlOptions, XmlSerializer, XML_SCHEMA_INSTANCE_NAMESPACE};

use std::io;

/// Serializes a graph to JSON, writing to `writer`.
///
/// The root of the graph is a single map node, rendered as one JSON
/// object.
///
/// # Errors
///
/// Any failure from the graph walk or the sink.
pub fn to_json_writer<W>(writer: W, graph: &dyn MapSerializable) -> Result<()>
where
    W: io::Write,
{
    let mut serializer = JsonSerializer::new(writer);
    serializer.start()?;
    serializer.write_value_map(graph)?;
    serializer.finish()
}

/// Serializes a graph to a JSON string.
///
/// # Errors
///
/// Any failure from the graph walk.
pub fn to_json_string(graph: &dyn MapSerializable) -> Result<String> {
    let mut serializer = JsonSerializer::new(Vec::new());
    serializer.start()?;
    serializer.write_value_map(graph)?;
    serializer.finish()?;
    Ok(into_utf8(serializer.into_inner()))
}

/// Serializes a graph to a JSONP envelope, writing to `writer`.
///
/// The output is exactly `<prefix>(<json>);` followed by a line feed. The
/// prefix is validated against the ECMAScript identifier grammar before
/// any byte is written.
///
/// # Errors
///
/// An invalid prefix, or any failure from the graph walk or the sink.
pub fn to_jsonp_writer<W>(writer: W, prefix: &str, graph: &dyn MapSerializable) -> Result<()>
where
    W: io::Write,
{
    let mut serializer = JsonPSerializer::new(writer, prefix)?;
    serializer.start()?;
    serializer.write_value_map(graph)?;
    serializer.finish()
}

/// Serializes a graph to a JSONP string.
///
/// # Errors
///
/// An invalid prefix, or any failure from the graph walk.
pub fn to_jsonp_string(prefix: &str, graph: &dyn MapSerializable) -> Result<String> {
    let mut serializer = JsonPSerializer::new(Vec::new(), prefix)?;
    serializer.start()?;
    serializer.write_value_map(graph)?;
    serializer.finish()?;
    Ok(into_utf8(serializer.into_inner()))
}

/// Serializes a graph to XML, writing to `writer`.
///
/// The document root is opened and closed by the serializer; the graph's
/// root map supplies its child elements.
///
/// # Errors
///
/// Invalid options, or any failure from the graph walk or the sink.
pub fn to_xml_writer<W>(writer: W, options: XmlOptions, graph: &dyn MapSerializable) -> Result<()>
where
    W: io::Write,
{
    let mut serializer = XmlSerializer::new(writer, options)?;
    serializer.start()?;
    serializer.write_value_map(graph)?;
    serializer.finish()
}

/// Serializes a graph to an XML string.
///
/// # Errors
///
/// Invalid options, or any failure from the graph walk.
pub fn to_xml_string(options: XmlOptions, graph: &dyn MapSerializable) -> Result<String> {
    let mut serializer = XmlSerializer::new(Vec::new(), options)?;
    serializer.start()?;
    serializer.write_value_map(graph)?;
    serializer.finish()?;
    Ok(into_utf8(serializer.into_inner()))
}

/// Serializes records to CSV, writing to `writer`.
///
/// One row per element of `records`, projected onto columns by the matcher
/// tree; `headings` fix the row width and, when `write_header_line` is
/// set, supply the first line.
///
/// # Errors
///
/// Any failure from the graph walk or the sink.
pub fn to_csv_writer<W>(
    writer: W,
    root: Matcher,
    headings: &[&str],
    write_header_line: bool,
    records: &[&dyn MapSerializable],
) -> Result<()>
where
    W: io::Write,
{
    let mut serializer =
        SeparatedValueSerializer::comma_separated(writer, root, write_header_line, headings);
    serializer.start()?;
    serializer.write_value_map_array(records)?;
    serializer.finish()
}

/// Serializes records to a CSV string.
///
/// # Errors
///
/// Any failure from the graph walk.
pub fn to_csv_string(
    root: Matcher,
    headings: &[&str],
    write_header_line: bool,
    records: &[&dyn MapSerializable],
) -> Result<String> {
    let mut serializer =
        SeparatedValueSerializer::comma_separated(Vec::new(), root, write_header_line, headings);
    serializer.start()?;
    serializer.write_value_map_array(records)?;
    serializer.finish()?;
    Ok(into_utf8(serializer.into_inner()))
}

/// Serializes records to sanitizing TSV, writing to `writer`.
///
/// # Errors
///
/// Any failure from the graph walk or the sink.
pub fn to_tsv_writer<W>(
    writer: W,
    root: Matcher,
    headings: &[&str],
    write_header_line: bool,
    records: &[&dyn MapSerializable],
) -> Result<()>
where
    W: io::Write,
{
    let mut serializer =
        SeparatedValueSerializer::tab_separated(writer, root, write_header_line, headings);
    serializer.start()?;
    serializer.write_value_map_array(records)?;
    serializer.finish()
}

/// Serializes records to a sanitizing TSV string.
///
/// # Errors
///
/// Any failure from the graph walk.
pub fn to_tsv_string(
    root: Matcher,
    headings: &[&str],
    write_header_line: bool,
    records: &[&dyn MapSerializable],
) -> Result<String> {
    let mut serializer =
        SeparatedValueSerializer::tab_separated(Vec::new(), root, write_header_line, headings);
    serializer.start()?;
    serializer.write_value_map_array(records)?;
    serializer.finish()?;
    Ok(into_utf8(serializer.into_inner()))
}

// The backends only ever emit whole UTF-8 sequences.
fn into_utf8(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).expect("serializer output is valid UTF-8")
}
