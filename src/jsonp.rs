//! JSONP envelope and callback-name validation.
//!
//! [`JsonPSerializer`] wraps the JSON backend in a `prefix(...);` envelope
//! so the document can be consumed through a cross-origin script tag. The
//! callback prefix is validated against the ECMAScript identifier grammar
//! before construction succeeds, so no byte is ever written for a bad prefix.
//!
//! [`validate_function_name`] is exposed on its own for callers that accept
//! callback names from the network and want to reject them early.
//!
//! ## Examples
//!
//! ```rust
//! use polyser::validate_function_name;
//!
//! assert!(validate_function_name("$valid_1").is_ok());
//! assert!(validate_function_name("jsonp.callbacks.first").is_ok());
//! assert!(validate_function_name("class").is_err());
//! assert!(validate_function_name("a.").is_err());
//! ```

use std::io::Write;

use num_bigint::BigInt;
use unicode_properties::{GeneralCategory, UnicodeGeneralCategory};

use crate::error::{EncodingViolation, StructuralViolation};
use crate::json::JsonSerializer;
use crate::protocol::{
    MapSerializable, MapSerializer, Serializer, ValueSerializable, ValueSerializer,
};
use crate::utf16::decode_utf16_strict;
use crate::value::Value;
use crate::{Error, Result};

/// The fixed ECMAScript keyword and literal set a callback segment must not
/// match.
const RESERVED_WORDS: &[&str] = &[
    "break",
    "do",
    "instanceof",
    "typeof",
    "case",
    "else",
    "new",
    "var",
    "catch",
    "finally",
    "return",
    "void",
    "continue",
    "for",
    "switch",
    "while",
    "debugger",
    "function",
    "this",
    "with",
    "default",
    "if",
    "throw",
    "delete",
    "in",
    "try",
    "class",
    "enum",
    "extends",
    "super",
    "const",
    "export",
    "import",
    "implements",
    "let",
    "private",
    "public",
    "yield",
    "interface",
    "package",
    "protected",
    "static",
    "null",
    "true",
    "false",
];

const ZERO_WIDTH_NON_JOINER: char = '\u{200C}';
const ZERO_WIDTH_JOINER: char = '\u{200D}';

/// Checks a JSONP callback name against the ECMAScript identifier grammar.
///
/// The name is split on `.`; each segment must be a non-empty,
/// non-reserved-word identifier. The first code point of a segment must be
/// `$`, `_` or a letter category (Lu, Ll, Lt, Lm, Lo, Nl); subsequent code
/// points additionally allow the zero-width joiners and the Mn, Mc, Nd and
/// Pc categories.
///
/// # Errors
///
/// Returns the [`EncodingViolation`] describing the first offending
/// segment or code point.
pub fn validate_function_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(EncodingViolation::EmptyFunctionName.into());
    }
    for segment in name.split('.') {
        validate_segment(name, segment)?;
    }
    Ok(())
}

/// [`validate_function_name`] over raw UTF-16 code units.
///
/// The units are strictly decoded first, so a lone surrogate anywhere in
/// the buffer is rejected before the grammar runs.
///
/// # Errors
///
/// Returns [`EncodingViolation::UnpairedSurrogate`] for mis-paired input,
/// or whatever the grammar check reports.
pub fn validate_function_name_utf16(units: &[u16]) -> Result<()> {
    let decoded = decode_utf16_strict(units)?;
    validate_function_name(&decoded)
}

fn validate_segment(name: &str, segment: &str) -> Result<()> {
    if segment.is_empty() {
        return Err(EncodingViolation::EmptyFunctionNameSegment {
            name: name.to_string(),
        }
        .into());
    }
    if RESERVED_WORDS.contains(&segment) {
        return Err(EncodingViolation::ReservedWord {
            segment: segment.to_string(),
        }
        .into());
    }
    for (position, ch) in segment.chars().enumerate() {
        let valid = if position == 0 {
            is_identifier_start(ch)
        } else {
            is_identifier_part(ch)
        };
        if !valid {
            return Err(EncodingViolation::InvalidFunctionNameCharacter {
                segment: segment.to_string(),
                code_point: ch as u32,
            }
            .into());
        }
    }
    Ok(())
}

fn is_identifier_start(ch: char) -> bool {
    if ch == '$' || ch == '_' {
        return true;
    }
    matches!(
        ch.general_category(),
        GeneralCategory::UppercaseLetter
            | GeneralCategory::LowercaseLetter
            | GeneralCategory::TitlecaseLetter
            | GeneralCategory::ModifierLetter
            | GeneralCategory::OtherLetter
            | GeneralCategory::LetterNumber
    )
}

fn is_identifier_part(ch: char) -> bool {
    is_identifier_start(ch)
        || ch == ZERO_WIDTH_NON_JOINER
        || ch == ZERO_WIDTH_JOINER
        || matches!(
            ch.general_category(),
            GeneralCategory::NonspacingMark
                | GeneralCategory::SpacingMark
                | GeneralCategory::DecimalNumber
                | GeneralCategory::ConnectorPunctuation
        )
}

/// A JSON serializer wrapped in a `prefix(...);` envelope.
///
/// `start` writes `prefix(`; `finish` writes `);` plus a line feed and then
/// flushes. The trailer is attempted even when the flush is going to fail,
/// and the flush is attempted even when the trailer write failed; the
/// first error is the one reported.
#[derive(Debug)]
pub struct JsonPSerializer<W: Write> {
    inner: JsonSerializer<W>,
    prefix: String,
}

impl<W: Write> JsonPSerializer<W> {
    /// Creates a serializer writing `prefix(...)` to `writer`.
    ///
    /// # Errors
    ///
    /// [`StructuralViolation::EmptyJsonPPrefix`] for an empty prefix, or
    /// the [`EncodingViolation`] from [`validate_function_name`] for a
    /// prefix that is not a valid callback name.
    pub fn new(writer: W, prefix: &str) -> Result<Self> {
        if prefix.is_empty() {
            return Err(StructuralViolation::EmptyJsonPPrefix.into());
        }
        validate_function_name(prefix)?;
        Ok(JsonPSerializer {
            inner: JsonSerializer::new(writer),
            prefix: prefix.to_string(),
        })
    }

    /// Consumes the serializer, returning the sink.
    pub fn into_inner(self) -> W {
        self.inner.into_inner()
    }
}

impl<W: Write> MapSerializer for JsonPSerializer<W> {
    fn write_property_string(&mut self, name: &str, value: &str, is_map_entry: bool) -> Result<()> {
        self.inner.write_property_string(name, value, is_map_entry)
    }

    fn write_property_null(&mut self, name: &str, is_map_entry: bool) -> Result<()> {
        self.inner.write_property_null(name, is_map_entry)
    }

    fn write_property_map(
        &mut self,
        name: &str,
        value: &dyn MapSerializable,
        is_map_entry: bool,
    ) -> Result<()> {
        self.inner.write_property_map(name, value, is_map_entry)
    }

    fn write_property_scalar(
        &mut self,
        name: &str,
        value: &dyn ValueSerializable,
        is_map_entry: bool,
    ) -> Result<()> {
        self.inner.write_property_scalar(name, value, is_map_entry)
    }

    fn write_property_map_array(
        &mut self,
        name: &str,
        values: &[&dyn MapSerializable],
        is_map_entry: bool,
    ) -> Result<()> {
        self.inner.write_property_map_array(name, values, is_map_entry)
    }

    fn write_property_scalar_array(
        &mut self,
        name: &str,
        values: &[&dyn ValueSerializable],
        is_map_entry: bool,
    ) -> Result<()> {
        self.inner
            .write_property_scalar_array(name, values, is_map_entry)
    }

    fn write_property_list(
        &mut self,
        name: &str,
        values: &[Value<'_>],
        is_map_entry: bool,
    ) -> Result<()> {
        self.inner.write_property_list(name, values, is_map_entry)
    }

    fn write_property_set(
        &mut self,
        name: &str,
        values: &[Value<'_>],
        is_map_entry: bool,
    ) -> Result<()> {
        self.inner.write_property_set(name, values, is_map_entry)
    }

    fn write_property_i64(&mut self, name: &str, value: i64, is_map_entry: bool) -> Result<()> {
        self.inner.write_property_i64(name, value, is_map_entry)
    }

    fn write_property_big_int(
        &mut self,
        name: &str,
        value: &BigInt,
        is_map_entry: bool,
    ) -> Result<()> {
        self.inner.write_property_big_int(name, value, is_map_entry)
    }
}

impl<W: Write> ValueSerializer for JsonPSerializer<W> {
    fn write_value_null(&mut self) -> Result<()> {
        self.inner.write_value_null()
    }

    fn write_value_string(&mut self, value: &str) -> Result<()> {
        self.inner.write_value_string(value)
    }

    fn write_value_i64(&mut self, value: i64) -> Result<()> {
        self.inner.write_value_i64(value)
    }

    fn write_value_big_int(&mut self, value: &BigInt) -> Result<()> {
        self.inner.write_value_big_int(value)
    }

    fn write_value_map(&mut self, value: &dyn MapSerializable) -> Result<()> {
        self.inner.write_value_map(value)
    }

    fn write_value_scalar(&mut self, value: &dyn ValueSerializable) -> Result<()> {
        self.inner.write_value_scalar(value)
    }

    fn write_value_map_array(&mut self, values: &[&dyn MapSerializable]) -> Result<()> {
        self.inner.write_value_map_array(values)
    }

    fn write_value_scalar_array(&mut self, values: &[&dyn ValueSerializable]) -> Result<()> {
        self.inner.write_value_scalar_array(values)
    }

    fn write_value_list(&mut self, values: &[Value<'_>]) -> Result<()> {
        self.inner.write_value_list(values)
    }

    fn write_value_set(&mut self, values: &[Value<'_>]) -> Result<()> {
        self.inner.write_value_set(values)
    }
}

impl<W: Write> Serializer for JsonPSerializer<W> {
    fn start(&mut self) -> Result<()> {
        self.inner.start()?;
        self.inner.writer_mut().write_all(self.prefix.as_bytes())?;
        self.inner.writer_mut().write_all(b"(")?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let trailer = self
            .inner
            .writer_mut()
            .write_all(b");\n")
            .map_err(Error::from);
        let flushed = self.inner.finish();
        trailer.and(flushed)
    }
}
