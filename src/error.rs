//! Error types for graph serialization.
//!
//! Failures fall into three families, kept as distinct types so callers can
//! tell them apart without string matching:
//!
//! - [`Error::Io`]: the underlying sink failed. Never retried internally,
//!   since text encoding is deterministic and a retry cannot help.
//! - [`Error::Encoding`]: the data cannot be represented in the target
//!   encoding (lone surrogate, disallowed code point, invalid JSONP
//!   identifier, control character under strict tab separation).
//! - [`Error::Structure`]: the caller broke a construction or traversal
//!   contract (unknown matcher child, duplicate field write, reserved
//!   attribute name, and so on). These indicate a programming error in the
//!   calling code, not bad data.
//!
//! A violation aborts the write in progress; bytes already flushed to the
//! sink are not rolled back, and the partial output must be discarded.
//!
//! ## Examples
//!
//! ```rust
//! use polyser::{Error, Matcher};
//!
//! let root = Matcher::root([("name", Matcher::leaf(0, ","))]).unwrap();
//! let err = root.match_child("unknown").unwrap_err();
//! assert!(matches!(err, Error::Structure(_)));
//! ```

use std::io;
use thiserror::Error;

/// Any failure raised while serializing a graph.
#[derive(Debug, Error)]
pub enum Error {
    /// The underlying byte sink failed.
    #[error("could not write to the underlying sink: {0}")]
    Io(#[from] io::Error),

    /// The data cannot be represented in the target encoding.
    #[error(transparent)]
    Encoding(#[from] EncodingViolation),

    /// A construction or traversal contract was broken.
    #[error(transparent)]
    Structure(#[from] StructuralViolation),
}

/// Data that cannot be represented in the target text encoding.
///
/// Each variant carries enough of the offending input to localize it
/// without access to the encoder's internal state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingViolation {
    /// A UTF-16 code unit in the surrogate range had no partner.
    #[error("lone surrogate 0x{unit:04X} at code unit index {index}")]
    UnpairedSurrogate { unit: u16, index: usize },

    /// U+0000, U+FFFE and U+FFFF are never valid in XML output.
    #[error("code point U+{code_point:04X} cannot be represented in XML")]
    DisallowedCodePoint { code_point: u32 },

    /// A JSONP function name was empty.
    #[error("a JSONP function name must not be empty")]
    EmptyFunctionName,

    /// A dot-separated segment of a JSONP function name was empty.
    #[error("JSONP function name {name:?} contains an empty segment")]
    EmptyFunctionNameSegment { name: String },

    /// A segment of a JSONP function name matched an ECMAScript reserved
    /// word.
    #[error("JSONP function name segment {segment:?} is a reserved word")]
    ReservedWord { segment: String },

    /// A code point is not permitted by the ECMAScript identifier grammar
    /// at its position.
    #[error(
        "JSONP function name segment {segment:?} contains U+{code_point:04X}, \
         which is not a valid identifier character here"
    )]
    InvalidFunctionNameCharacter { segment: String, code_point: u32 },

    /// Strict tab separation forbids tab, CR and LF inside a field.
    #[error("field {field:?} contains {found:?}, which strict tab separation forbids")]
    ForbiddenFieldCharacter { field: String, found: char },
}

/// A broken construction or traversal contract.
///
/// These are programming errors in the calling code: the graph walk or the
/// configuration disagreed with what the serializer was built for.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralViolation {
    /// No matcher child is registered under this name.
    #[error("no matcher child is registered for the name {name:?}")]
    UnknownMatcherChild { name: String },

    /// A leaf matcher was asked to look up a child.
    #[error("a leaf matcher has no children (asked for {name:?})")]
    LeafHasNoChildren { name: String },

    /// A recurse matcher was asked to record a scalar value.
    #[error("a recurse matcher is structural and cannot record the value {value:?}")]
    RecurseCannotRecord { value: String },

    /// A recurse matcher was asked for an element-join separator.
    #[error("a recurse matcher is structural and has no element separator")]
    RecurseHasNoSeparator,

    /// Two children of the same matcher were registered under one name.
    #[error("duplicate registration of matcher child {name:?}")]
    DuplicateMatcherChild { name: String },

    /// A row field index was written twice.
    #[error("field index {index} has already been recorded in this row")]
    FieldAlreadyRecorded { index: usize },

    /// A row field index is outside the fixed row width.
    #[error("field index {index} is out of range for a row of {width} fields")]
    FieldIndexOutOfRange { index: usize, width: usize },

    /// A scalar was written while no row was being assembled.
    #[error("no row is being assembled at this point in the graph walk")]
    NoActiveRow,

    /// The JSONP callback prefix was empty.
    #[error("a JSONP callback prefix must be at least one character")]
    EmptyJsonPPrefix,

    /// An XML namespace prefix began with the reserved letters `xml`.
    #[error("namespace prefix {prefix:?} must not begin with \"xml\"")]
    ReservedNamespacePrefix { prefix: String },

    /// The same namespace URI was declared twice.
    #[error("duplicate namespace declaration for {uri:?}")]
    DuplicateNamespace { uri: String },

    /// Two root attributes (or a namespace and an attribute) collided.
    #[error("duplicate root attribute {name:?}")]
    DuplicateRootAttribute { name: String },

    /// `key` is reserved for map-entry elements.
    #[error("the attribute name \"key\" is reserved on map-entry elements")]
    ReservedMapEntryAttribute,

    /// Omitting the XML declaration fixes the encoding to UTF-8.
    #[error("declaration-less XML output must be UTF-8, not {encoding:?}")]
    NonUtf8WithoutDeclaration { encoding: String },
}

impl Error {
    /// Returns `true` if this is an underlying sink failure.
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io(_))
    }

    /// Returns `true` if the data could not be represented in the target
    /// encoding.
    #[must_use]
    pub fn is_encoding(&self) -> bool {
        matches!(self, Error::Encoding(_))
    }

    /// Returns `true` if a construction or traversal contract was broken.
    #[must_use]
    pub fn is_structure(&self) -> bool {
        matches!(self, Error::Structure(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
