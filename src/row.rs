//! The in-progress buffer for one tabular record.
//!
//! A [`Row`] collects field values in any order as the graph walk visits
//! them, then renders itself as one output line through a
//! [`FieldEscaper`](crate::FieldEscaper). Fixed-width rows (the header
//! width) reject out-of-range indices; variable rows grow on demand. In
//! both modes an index may be written at most once per row, and indices
//! never written render as the empty string.
//!
//! Rows are created fresh per emitted record and discarded once the line
//! has been written.

use std::io::Write;

use crate::error::StructuralViolation;
use crate::escaper::FieldEscaper;
use crate::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RowWidth {
    Fixed(usize),
    Variable,
}

/// An ordered sequence of optional field values for one record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Row {
    fields: Vec<Option<String>>,
    width: RowWidth,
}

impl Row {
    /// A row of exactly `width` fields.
    #[must_use]
    pub fn fixed(width: usize) -> Self {
        Row {
            fields: vec![None; width],
            width: RowWidth::Fixed(width),
        }
    }

    /// A row that grows to the highest index written.
    #[must_use]
    pub fn variable() -> Self {
        Row {
            fields: Vec::new(),
            width: RowWidth::Variable,
        }
    }

    /// Records a field value at `index`.
    ///
    /// # Errors
    ///
    /// [`StructuralViolation::FieldIndexOutOfRange`] beyond a fixed width;
    /// [`StructuralViolation::FieldAlreadyRecorded`] for a second write to
    /// the same index.
    pub fn record_value(&mut self, index: usize, raw_value: &str) -> Result<()> {
        if let RowWidth::Fixed(width) = self.width {
            if index >= width {
                return Err(StructuralViolation::FieldIndexOutOfRange { index, width }.into());
            }
        }
        if index >= self.fields.len() {
            self.fields.resize(index + 1, None);
        }
        if self.fields[index].is_some() {
            return Err(StructuralViolation::FieldAlreadyRecorded { index }.into());
        }
        self.fields[index] = Some(raw_value.to_string());
        Ok(())
    }

    /// The number of fields this row will render.
    #[must_use]
    pub fn len(&self) -> usize {
        match self.width {
            RowWidth::Fixed(width) => width,
            RowWidth::Variable => self.fields.len(),
        }
    }

    /// Returns `true` if the row renders no fields at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Renders the row as one line: fields separated, missing fields as
    /// the empty string, terminated by the escaper's line ending.
    ///
    /// An empty row still emits the line ending.
    ///
    /// # Errors
    ///
    /// Escaping or sink failures.
    pub fn write_line<W: Write>(&self, writer: &mut W, escaper: &FieldEscaper) -> Result<()> {
        for index in 0..self.len() {
            if index != 0 {
                escaper.write_field_separator(writer)?;
            }
            let field = self
                .fields
                .get(index)
                .and_then(|field| field.as_deref())
                .unwrap_or("");
            escaper.escape_field(field, writer)?;
        }
        escaper.write_line_ending(writer)
    }
}
