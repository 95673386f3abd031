//! Streaming XML backend.
//!
//! Properties render as elements named by their field token; map entries
//! (properties that came from a generic map) render as
//! `<map-entry key="...">` so arbitrary keys never have to be legal element
//! names; array items render as `element`-named children. A null scalar is
//! a self-closing empty tag, carrying `xsi:nil="true"` when the XML
//! Schema-Instance namespace was registered for the document.
//!
//! The document root is opened by `start` (optionally preceded by an XML
//! declaration) and closed by `finish`, which attempts the close even when
//! an error occurred while writing the body.
//!
//! Text and attribute values are escaped with the five predefined entities,
//! numeric character references for the control ranges, and outright
//! rejection of U+0000, U+FFFE and U+FFFF, which no XML document may carry.
//!
//! ## Examples
//!
//! ```rust
//! use polyser::{MapSerializable, MapSerializer, Result, XmlOptions};
//!
//! #[derive(Debug)]
//! struct Greeting {
//!     text: String,
//! }
//!
//! impl MapSerializable for Greeting {
//!     fn serialise_map(&self, serializer: &mut dyn MapSerializer) -> Result<()> {
//!         serializer.write_property_string("text", &self.text, false)
//!     }
//! }
//!
//! let options = XmlOptions::new("greeting").with_declaration(false);
//! let xml = polyser::to_xml_string(options, &Greeting { text: "a<b".to_string() })?;
//! assert_eq!(xml, "<greeting><text>a&lt;b</text></greeting>");
//! # Ok::<(), polyser::Error>(())
//! ```

use std::io::Write;
use std::slice;

use crate::error::{EncodingViolation, StructuralViolation};
use crate::protocol::{
    MapSerializable, MapSerializer, Serializer, ValueSerializable, ValueSerializer,
};
use crate::utf16::decode_utf16_strict;
use crate::value::Value;
use crate::{Error, Result};

/// The namespace URI whose registration enables `xsi:nil` markers.
pub const XML_SCHEMA_INSTANCE_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

const MAP_ENTRY_NODE_NAME: &str = "map-entry";
const LIST_ELEMENT_NODE_NAME: &str = "element";
const RESERVED_KEY_ATTRIBUTE: &str = "key";

/// Document-level configuration for the XML backend.
///
/// Built once, then handed to [`XmlSerializer::new`], which validates it.
///
/// # Examples
///
/// ```rust
/// use polyser::{XmlOptions, XML_SCHEMA_INSTANCE_NAMESPACE};
///
/// let options = XmlOptions::new("report")
///     .with_namespace(XML_SCHEMA_INSTANCE_NAMESPACE, "xsi")
///     .with_root_attribute("version", "3");
/// ```
#[derive(Clone, Debug)]
pub struct XmlOptions {
    root_name: String,
    declaration: bool,
    encoding: String,
    namespaces: Vec<(String, String)>,
    root_attributes: Vec<(String, String)>,
}

impl XmlOptions {
    /// Creates options for a document rooted at `root_name`, with an XML
    /// declaration and UTF-8 encoding.
    pub fn new(root_name: impl Into<String>) -> Self {
        XmlOptions {
            root_name: root_name.into(),
            declaration: true,
            encoding: "UTF-8".to_string(),
            namespaces: Vec::new(),
            root_attributes: Vec::new(),
        }
    }

    /// Sets whether the `<?xml ...?>` declaration is written.
    ///
    /// Omitting the declaration fixes the encoding to UTF-8.
    #[must_use]
    pub fn with_declaration(mut self, declaration: bool) -> Self {
        self.declaration = declaration;
        self
    }

    /// Sets the encoding name written in the declaration (upper-cased on
    /// output).
    #[must_use]
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    /// Registers a namespace, declared on the root as
    /// `xmlns:<prefix>="<uri>"`.
    ///
    /// Registering [`XML_SCHEMA_INSTANCE_NAMESPACE`] additionally enables
    /// `xsi:nil="true"` markers on null properties (under the prefix given
    /// here).
    #[must_use]
    pub fn with_namespace(mut self, uri: impl Into<String>, prefix: impl Into<String>) -> Self {
        self.namespaces.push((uri.into(), prefix.into()));
        self
    }

    /// Adds an attribute to the root element.
    #[must_use]
    pub fn with_root_attribute(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.root_attributes.push((name.into(), value.into()));
        self
    }
}

/// A streaming XML serializer over any byte sink.
///
/// Single-use: one instance serializes one graph between
/// [`start`](Serializer::start) and [`finish`](Serializer::finish).
#[derive(Debug)]
pub struct XmlSerializer<W: Write> {
    writer: W,
    root_name: String,
    declaration: bool,
    encoding: String,
    root_attributes: Vec<(String, String)>,
    nil_attribute: Option<(String, String)>,
}

impl<W: Write> XmlSerializer<W> {
    /// Creates a serializer writing to `writer`, validating the options.
    ///
    /// # Errors
    ///
    /// [`StructuralViolation`] for a namespace prefix beginning with
    /// `xml`, a duplicate namespace URI, colliding root attribute names,
    /// or a non-UTF-8 encoding with the declaration omitted.
    pub fn new(writer: W, options: XmlOptions) -> Result<Self> {
        if !options.declaration && !options.encoding.eq_ignore_ascii_case("UTF-8") {
            return Err(StructuralViolation::NonUtf8WithoutDeclaration {
                encoding: options.encoding,
            }
            .into());
        }

        let mut root_attributes: Vec<(String, String)> = Vec::new();
        let mut nil_attribute = None;
        for (uri, prefix) in &options.namespaces {
            if prefix.starts_with("xml") {
                return Err(StructuralViolation::ReservedNamespacePrefix {
                    prefix: prefix.clone(),
                }
                .into());
            }
            if options.namespaces.iter().filter(|(u, _)| u == uri).count() > 1 {
                return Err(StructuralViolation::DuplicateNamespace { uri: uri.clone() }.into());
            }
            push_attribute_once(&mut root_attributes, format!("xmlns:{prefix}"), uri.clone())?;
            if uri == XML_SCHEMA_INSTANCE_NAMESPACE {
                nil_attribute = Some((format!("{prefix}:nil"), "true".to_string()));
            }
        }
        for (name, value) in &options.root_attributes {
            push_attribute_once(&mut root_attributes, name.clone(), value.clone())?;
        }

        Ok(XmlSerializer {
            writer,
            root_name: options.root_name,
            declaration: options.declaration,
            encoding: options.encoding,
            root_attributes,
            nil_attribute,
        })
    }

    /// Consumes the serializer, returning the sink.
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Writes already-escaped-checked text arriving as raw UTF-16 units.
    ///
    /// The units are strictly decoded first, so any unpaired surrogate,
    /// including a trailing high surrogate, is an
    /// [`EncodingViolation::UnpairedSurrogate`].
    ///
    /// # Errors
    ///
    /// Decoding or escaping failures, or a sink failure.
    pub fn write_text_utf16(&mut self, units: &[u16]) -> Result<()> {
        let decoded = decode_utf16_strict(units)?;
        escape_text_into(&decoded, &mut self.writer)
    }

    fn write_empty_property(
        &mut self,
        name: &str,
        is_map_entry: bool,
        with_nil: bool,
    ) -> Result<()> {
        match (&self.nil_attribute, with_nil) {
            (Some(nil), true) => write_element_empty(
                &mut self.writer,
                name,
                is_map_entry,
                slice::from_ref(nil),
            ),
            _ => write_element_empty(&mut self.writer, name, is_map_entry, &[]),
        }
    }
}

fn push_attribute_once(
    attributes: &mut Vec<(String, String)>,
    name: String,
    value: String,
) -> Result<()> {
    if attributes.iter().any(|(existing, _)| *existing == name) {
        return Err(StructuralViolation::DuplicateRootAttribute { name }.into());
    }
    attributes.push((name, value));
    Ok(())
}

impl<W: Write> MapSerializer for XmlSerializer<W> {
    fn write_property_string(&mut self, name: &str, value: &str, is_map_entry: bool) -> Result<()> {
        if value.is_empty() {
            return self.write_empty_property(name, is_map_entry, false);
        }
        write_element_open(&mut self.writer, name, is_map_entry, &[])?;
        escape_text_into(value, &mut self.writer)?;
        write_element_close(&mut self.writer, name, is_map_entry)
    }

    fn write_property_null(&mut self, name: &str, is_map_entry: bool) -> Result<()> {
        self.write_empty_property(name, is_map_entry, true)
    }

    fn write_property_map(
        &mut self,
        name: &str,
        value: &dyn MapSerializable,
        is_map_entry: bool,
    ) -> Result<()> {
        write_element_open(&mut self.writer, name, is_map_entry, &[])?;
        self.write_value_map(value)?;
        write_element_close(&mut self.writer, name, is_map_entry)
    }

    fn write_property_scalar(
        &mut self,
        name: &str,
        value: &dyn ValueSerializable,
        is_map_entry: bool,
    ) -> Result<()> {
        write_element_open(&mut self.writer, name, is_map_entry, &[])?;
        self.write_value_scalar(value)?;
        write_element_close(&mut self.writer, name, is_map_entry)
    }

    fn write_property_map_array(
        &mut self,
        name: &str,
        values: &[&dyn MapSerializable],
        is_map_entry: bool,
    ) -> Result<()> {
        write_element_open(&mut self.writer, name, is_map_entry, &[])?;
        self.write_value_map_array(values)?;
        write_element_close(&mut self.writer, name, is_map_entry)
    }

    fn write_property_scalar_array(
        &mut self,
        name: &str,
        values: &[&dyn ValueSerializable],
        is_map_entry: bool,
    ) -> Result<()> {
        write_element_open(&mut self.writer, name, is_map_entry, &[])?;
        self.write_value_scalar_array(values)?;
        write_element_close(&mut self.writer, name, is_map_entry)
    }

    fn write_property_list(
        &mut self,
        name: &str,
        values: &[Value<'_>],
        is_map_entry: bool,
    ) -> Result<()> {
        write_element_open(&mut self.writer, name, is_map_entry, &[])?;
        self.write_value_list(values)?;
        write_element_close(&mut self.writer, name, is_map_entry)
    }

    fn write_property_set(
        &mut self,
        name: &str,
        values: &[Value<'_>],
        is_map_entry: bool,
    ) -> Result<()> {
        self.write_property_list(name, values, is_map_entry)
    }
}

impl<W: Write> ValueSerializer for XmlSerializer<W> {
    // A bare null in value position renders nothing; null properties render
    // their empty tag through write_property_null instead.
    fn write_value_null(&mut self) -> Result<()> {
        Ok(())
    }

    fn write_value_string(&mut self, value: &str) -> Result<()> {
        escape_text_into(value, &mut self.writer)
    }

    fn write_value_map(&mut self, value: &dyn MapSerializable) -> Result<()> {
        value.serialise_map(self)
    }

    fn write_value_scalar(&mut self, value: &dyn ValueSerializable) -> Result<()> {
        value.serialise_value(self)
    }

    fn write_value_map_array(&mut self, values: &[&dyn MapSerializable]) -> Result<()> {
        for value in values {
            self.write_property_map(LIST_ELEMENT_NODE_NAME, *value, false)?;
        }
        Ok(())
    }

    fn write_value_scalar_array(&mut self, values: &[&dyn ValueSerializable]) -> Result<()> {
        for value in values {
            self.write_property_scalar(LIST_ELEMENT_NODE_NAME, *value, false)?;
        }
        Ok(())
    }

    fn write_value_list(&mut self, values: &[Value<'_>]) -> Result<()> {
        for value in values {
            if value.is_null() {
                self.write_empty_property(LIST_ELEMENT_NODE_NAME, false, false)?;
            } else {
                self.write_property(LIST_ELEMENT_NODE_NAME, value, false)?;
            }
        }
        Ok(())
    }

    fn write_value_set(&mut self, values: &[Value<'_>]) -> Result<()> {
        self.write_value_list(values)
    }
}

impl<W: Write> Serializer for XmlSerializer<W> {
    fn start(&mut self) -> Result<()> {
        if self.declaration {
            write!(
                self.writer,
                "<?xml version=\"1.0\" encoding=\"{}\" standalone=\"yes\"?>",
                self.encoding.to_uppercase()
            )?;
        }
        write_element_open(&mut self.writer, &self.root_name, false, &self.root_attributes)
    }

    fn finish(&mut self) -> Result<()> {
        // The root close is attempted even after a body error, and the
        // flush even after a failed close; the first error wins.
        let closed = write_element_close(&mut self.writer, &self.root_name, false);
        let flushed = self.writer.flush().map_err(Error::from);
        closed.and(flushed)
    }
}

fn write_element_open<W: Write>(
    writer: &mut W,
    name: &str,
    is_map_entry: bool,
    attributes: &[(String, String)],
) -> Result<()> {
    writer.write_all(b"<")?;
    write_node_name(writer, name, is_map_entry)?;
    write_attributes(writer, name, is_map_entry, attributes)?;
    writer.write_all(b">")?;
    Ok(())
}

fn write_element_close<W: Write>(writer: &mut W, name: &str, is_map_entry: bool) -> Result<()> {
    writer.write_all(b"</")?;
    write_node_name(writer, name, is_map_entry)?;
    writer.write_all(b">")?;
    Ok(())
}

fn write_element_empty<W: Write>(
    writer: &mut W,
    name: &str,
    is_map_entry: bool,
    attributes: &[(String, String)],
) -> Result<()> {
    writer.write_all(b"<")?;
    write_node_name(writer, name, is_map_entry)?;
    write_attributes(writer, name, is_map_entry, attributes)?;
    writer.write_all(b"/>")?;
    Ok(())
}

fn write_node_name<W: Write>(writer: &mut W, name: &str, is_map_entry: bool) -> Result<()> {
    let node_name = if is_map_entry { MAP_ENTRY_NODE_NAME } else { name };
    escape_text_into(node_name, writer)
}

fn write_attributes<W: Write>(
    writer: &mut W,
    name: &str,
    is_map_entry: bool,
    attributes: &[(String, String)],
) -> Result<()> {
    if is_map_entry {
        writer.write_all(b" ")?;
        escape_text_into(RESERVED_KEY_ATTRIBUTE, writer)?;
        writer.write_all(b"=\"")?;
        escape_text_into(name, writer)?;
        writer.write_all(b"\"")?;
    }
    for (attribute_name, attribute_value) in attributes {
        if is_map_entry && attribute_name == RESERVED_KEY_ATTRIBUTE {
            return Err(StructuralViolation::ReservedMapEntryAttribute.into());
        }
        writer.write_all(b" ")?;
        escape_text_into(attribute_name, writer)?;
        writer.write_all(b"=\"")?;
        escape_text_into(attribute_value, writer)?;
        writer.write_all(b"\"")?;
    }
    Ok(())
}

/// Escapes `value` into `writer` per the XML character rules.
///
/// U+0000, U+FFFE and U+FFFF are rejected; 0x01–0x19 and 0x7F–0x9F become
/// zero-padded decimal character references; `"`, `&`, `'`, `<` and `>`
/// use the predefined entities; everything else passes through.
pub(crate) fn escape_text_into<W: Write>(value: &str, writer: &mut W) -> Result<()> {
    for ch in value.chars() {
        match ch {
            '\u{0000}' | '\u{FFFE}' | '\u{FFFF}' => {
                return Err(EncodingViolation::DisallowedCodePoint {
                    code_point: ch as u32,
                }
                .into())
            }
            '"' => writer.write_all(b"&quot;")?,
            '&' => writer.write_all(b"&amp;")?,
            '\'' => writer.write_all(b"&apos;")?,
            '<' => writer.write_all(b"&lt;")?,
            '>' => writer.write_all(b"&gt;")?,
            ch if matches!(ch as u32, 0x01..=0x19 | 0x7F..=0x9F) => {
                write!(writer, "&#{:04};", ch as u32)?;
            }
            ch => {
                let mut buf = [0u8; 4];
                writer.write_all(ch.encode_utf8(&mut buf).as_bytes())?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escaped(value: &str) -> Result<String> {
        let mut out = Vec::new();
        escape_text_into(value, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn predefined_entities() {
        assert_eq!(escaped("a<b").unwrap(), "a&lt;b");
        assert_eq!(escaped("a>b").unwrap(), "a&gt;b");
        assert_eq!(escaped("a&b").unwrap(), "a&amp;b");
        assert_eq!(escaped("a\"b").unwrap(), "a&quot;b");
        assert_eq!(escaped("a'b").unwrap(), "a&apos;b");
    }

    #[test]
    fn control_ranges_become_numeric_references() {
        assert_eq!(escaped("\u{01}").unwrap(), "&#0001;");
        assert_eq!(escaped("\t").unwrap(), "&#0009;");
        assert_eq!(escaped("\n").unwrap(), "&#0010;");
        assert_eq!(escaped("\u{19}").unwrap(), "&#0025;");
        assert_eq!(escaped("\u{7F}").unwrap(), "&#0127;");
        assert_eq!(escaped("\u{9F}").unwrap(), "&#0159;");
        // 0x20 and 0xA0 sit outside both ranges.
        assert_eq!(escaped(" ").unwrap(), " ");
        assert_eq!(escaped("\u{A0}").unwrap(), "\u{A0}");
    }

    #[test]
    fn forbidden_code_points_are_rejected() {
        for ch in ['\u{0000}', '\u{FFFE}', '\u{FFFF}'] {
            let err = escaped(&ch.to_string()).unwrap_err();
            assert!(matches!(
                err,
                Error::Encoding(EncodingViolation::DisallowedCodePoint { .. })
            ));
        }
    }

    #[test]
    fn astral_text_passes_through() {
        assert_eq!(escaped("ok \u{1F600}").unwrap(), "ok \u{1F600}");
    }

    #[test]
    fn options_validation() {
        let bad_prefix = XmlOptions::new("r").with_namespace("urn:a", "xmlfoo");
        assert!(matches!(
            XmlSerializer::new(Vec::new(), bad_prefix).unwrap_err(),
            Error::Structure(StructuralViolation::ReservedNamespacePrefix { .. })
        ));

        let duplicate = XmlOptions::new("r")
            .with_namespace("urn:a", "a")
            .with_namespace("urn:a", "b");
        assert!(matches!(
            XmlSerializer::new(Vec::new(), duplicate).unwrap_err(),
            Error::Structure(StructuralViolation::DuplicateNamespace { .. })
        ));

        let colliding = XmlOptions::new("r")
            .with_root_attribute("version", "1")
            .with_root_attribute("version", "2");
        assert!(matches!(
            XmlSerializer::new(Vec::new(), colliding).unwrap_err(),
            Error::Structure(StructuralViolation::DuplicateRootAttribute { .. })
        ));

        let latin1_bare = XmlOptions::new("r")
            .with_declaration(false)
            .with_encoding("ISO-8859-1");
        assert!(matches!(
            XmlSerializer::new(Vec::new(), latin1_bare).unwrap_err(),
            Error::Structure(StructuralViolation::NonUtf8WithoutDeclaration { .. })
        ));
    }

    #[test]
    fn utf16_text_entry_checks_pairing() {
        let options = XmlOptions::new("r").with_declaration(false);
        let mut serializer = XmlSerializer::new(Vec::new(), options).unwrap();
        assert!(serializer.write_text_utf16(&[0x0061, 0x0062]).is_ok());
        let err = serializer.write_text_utf16(&[0x0061, 0xD800]).unwrap_err();
        assert!(matches!(
            err,
            Error::Encoding(EncodingViolation::UnpairedSurrogate { unit: 0xD800, .. })
        ));
    }
}
