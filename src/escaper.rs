//! Field escaping policies for delimited tabular output.
//!
//! A [`FieldEscaper`] is an immutable configuration value: the field
//! separator, the end-of-line sequence, and the [`EscapePolicy`] applied to
//! each field's text. The three standard configurations are shared
//! `const`s; there is no mutable escaper state anywhere.
//!
//! - [`COMMA_SEPARATED`]: CSV. Every field double-quoted, embedded quotes
//!   doubled, comma-separated, CRLF line endings.
//! - [`TAB_SEPARATED_STRICT`]: TSV that refuses fields containing tab, CR
//!   or LF.
//! - [`TAB_SEPARATED_SANITISING`]: TSV that replaces tab, CR and LF with
//!   U+FFFD.

use std::io::Write;

use crate::error::EncodingViolation;
use crate::Result;

/// How one field's text is encoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EscapePolicy {
    /// Wrap the field in double quotes and double any embedded quote.
    QuoteAndDouble,
    /// Fail on tab, CR or LF inside the field.
    RejectControl,
    /// Replace tab, CR and LF with the Unicode replacement character.
    ReplaceControl,
}

/// An immutable field-escaping configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldEscaper {
    field_separator: char,
    line_ending: &'static str,
    policy: EscapePolicy,
}

/// The CSV configuration: quoted fields, commas, CRLF.
pub const COMMA_SEPARATED: FieldEscaper = FieldEscaper {
    field_separator: ',',
    line_ending: "\r\n",
    policy: EscapePolicy::QuoteAndDouble,
};

/// The strict TSV configuration: tabs, LF, control characters rejected.
pub const TAB_SEPARATED_STRICT: FieldEscaper = FieldEscaper {
    field_separator: '\t',
    line_ending: "\n",
    policy: EscapePolicy::RejectControl,
};

/// The sanitizing TSV configuration: tabs, LF, control characters replaced
/// with U+FFFD.
pub const TAB_SEPARATED_SANITISING: FieldEscaper = FieldEscaper {
    field_separator: '\t',
    line_ending: "\n",
    policy: EscapePolicy::ReplaceControl,
};

const REPLACEMENT_CHARACTER: char = '\u{FFFD}';

fn is_forbidden(ch: char) -> bool {
    matches!(ch, '\t' | '\r' | '\n')
}

impl FieldEscaper {
    /// Builds a custom configuration.
    #[must_use]
    pub const fn new(
        field_separator: char,
        line_ending: &'static str,
        policy: EscapePolicy,
    ) -> Self {
        FieldEscaper {
            field_separator,
            line_ending,
            policy,
        }
    }

    /// Writes one field's text under this configuration's policy.
    ///
    /// # Errors
    ///
    /// [`EncodingViolation::ForbiddenFieldCharacter`] under
    /// [`EscapePolicy::RejectControl`]; sink failures otherwise.
    pub fn escape_field<W: Write>(&self, field: &str, writer: &mut W) -> Result<()> {
        match self.policy {
            EscapePolicy::QuoteAndDouble => {
                writer.write_all(b"\"")?;
                for ch in field.chars() {
                    if ch == '"' {
                        writer.write_all(b"\"")?;
                    }
                    write_char(writer, ch)?;
                }
                writer.write_all(b"\"")?;
                Ok(())
            }
            EscapePolicy::RejectControl => {
                if let Some(found) = field.chars().find(|ch| is_forbidden(*ch)) {
                    return Err(EncodingViolation::ForbiddenFieldCharacter {
                        field: field.to_string(),
                        found,
                    }
                    .into());
                }
                writer.write_all(field.as_bytes())?;
                Ok(())
            }
            EscapePolicy::ReplaceControl => {
                for ch in field.chars() {
                    let actual = if is_forbidden(ch) {
                        REPLACEMENT_CHARACTER
                    } else {
                        ch
                    };
                    write_char(writer, actual)?;
                }
                Ok(())
            }
        }
    }

    /// Writes the separator between two fields.
    ///
    /// # Errors
    ///
    /// Sink failures.
    pub fn write_field_separator<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_char(writer, self.field_separator)
    }

    /// Writes the end-of-line sequence.
    ///
    /// # Errors
    ///
    /// Sink failures.
    pub fn write_line_ending<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(self.line_ending.as_bytes())?;
        Ok(())
    }
}

fn write_char<W: Write>(writer: &mut W, ch: char) -> Result<()> {
    let mut buf = [0u8; 4];
    writer.write_all(ch.encode_utf8(&mut buf).as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn escaped(escaper: &FieldEscaper, field: &str) -> Result<String> {
        let mut out = Vec::new();
        escaper.escape_field(field, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn csv_quotes_everything_and_doubles_quotes() {
        assert_eq!(escaped(&COMMA_SEPARATED, "plain").unwrap(), "\"plain\"");
        assert_eq!(escaped(&COMMA_SEPARATED, "a\"b").unwrap(), "\"a\"\"b\"");
        assert_eq!(escaped(&COMMA_SEPARATED, "").unwrap(), "\"\"");
        // CSV does not mind embedded separators or line breaks; quoting
        // covers them.
        assert_eq!(escaped(&COMMA_SEPARATED, "a,b\r\n").unwrap(), "\"a,b\r\n\"");
    }

    #[test]
    fn strict_tsv_rejects_control_characters() {
        for field in ["a\tb", "a\rb", "a\nb"] {
            assert!(matches!(
                escaped(&TAB_SEPARATED_STRICT, field).unwrap_err(),
                Error::Encoding(EncodingViolation::ForbiddenFieldCharacter { .. })
            ));
        }
        assert_eq!(escaped(&TAB_SEPARATED_STRICT, "clean").unwrap(), "clean");
    }

    #[test]
    fn sanitising_tsv_replaces_control_characters() {
        assert_eq!(
            escaped(&TAB_SEPARATED_SANITISING, "a\tb\rc\nd").unwrap(),
            "a\u{FFFD}b\u{FFFD}c\u{FFFD}d"
        );
    }

    #[test]
    fn separators_and_line_endings() {
        let mut out = Vec::new();
        COMMA_SEPARATED.write_field_separator(&mut out).unwrap();
        COMMA_SEPARATED.write_line_ending(&mut out).unwrap();
        assert_eq!(out, b",\r\n");

        let mut out = Vec::new();
        TAB_SEPARATED_STRICT.write_field_separator(&mut out).unwrap();
        TAB_SEPARATED_STRICT.write_line_ending(&mut out).unwrap();
        assert_eq!(out, b"\t\n");
    }
}
