//! Streaming delimited tabular backend (CSV/TSV).
//!
//! [`SeparatedValueSerializer`] projects the graph walk onto flat rows
//! through an immutable [`Matcher`] tree supplied at construction. The tree
//! decides, for every property-name path the graph actually emits, whether
//! the path targets a column, is a grouping node to descend through, or is
//! discarded outright.
//!
//! The traversal keeps a path-of-names stack that mirrors map nesting,
//! resolved against the tree on each write; the spine of the walk is:
//!
//! - a scalar property records its text into the active [`Row`] at the
//!   resolved leaf's column;
//! - a nested map property pushes its name and recurses;
//! - an array met while a row is active is flattened into one delimited
//!   field with the leaf's separator;
//! - an array met with no active row is the record stream itself: one
//!   fresh row per element, written out as a line when the element
//!   finishes.
//!
//! ## Examples
//!
//! ```rust
//! use polyser::{MapSerializable, MapSerializer, Matcher, Result};
//!
//! #[derive(Debug)]
//! struct City {
//!     name: &'static str,
//!     population: i64,
//! }
//!
//! impl MapSerializable for City {
//!     fn serialise_map(&self, serializer: &mut dyn MapSerializer) -> Result<()> {
//!         serializer.write_property_string("name", self.name, false)?;
//!         serializer.write_property_i64("population", self.population, false)
//!     }
//! }
//!
//! let root = Matcher::root([
//!     ("name", Matcher::leaf(0, ",")),
//!     ("population", Matcher::leaf(1, ",")),
//! ])?;
//!
//! let rows: Vec<&dyn MapSerializable> =
//!     vec![&City { name: "Lagos", population: 16_000_000 }];
//! let csv = polyser::to_csv_string(root, &["name", "population"], true, &rows)?;
//! assert_eq!(csv, "\"name\",\"population\"\r\n\"Lagos\",\"16000000\"\r\n");
//! # Ok::<(), polyser::Error>(())
//! ```

use std::io::Write;

use crate::error::StructuralViolation;
use crate::escaper::{
    FieldEscaper, COMMA_SEPARATED, TAB_SEPARATED_SANITISING, TAB_SEPARATED_STRICT,
};
use crate::flatten::{flatten_map_array, flatten_scalar_array, flatten_values};
use crate::matcher::Matcher;
use crate::protocol::{
    MapSerializable, MapSerializer, Serializer, ValueSerializable, ValueSerializer,
};
use crate::row::Row;
use crate::value::Value;
use crate::Result;

/// A streaming delimited-text serializer over any byte sink.
///
/// Single-use: one instance serializes one graph between
/// [`start`](Serializer::start) and [`finish`](Serializer::finish). The
/// root of the graph is an array of map nodes, one row per element,
/// written through
/// [`write_value_map_array`](ValueSerializer::write_value_map_array).
pub struct SeparatedValueSerializer<W: Write> {
    writer: W,
    escaper: FieldEscaper,
    root: Matcher,
    path: Vec<String>,
    row: Option<Row>,
    headings: Vec<String>,
    write_header_line: bool,
}

impl<W: Write> SeparatedValueSerializer<W> {
    /// A CSV serializer: quoted fields, commas, CRLF.
    pub fn comma_separated(
        writer: W,
        root: Matcher,
        write_header_line: bool,
        headings: &[&str],
    ) -> Self {
        Self::with_escaper(writer, COMMA_SEPARATED, root, write_header_line, headings)
    }

    /// A sanitizing TSV serializer: tab/CR/LF in fields become U+FFFD.
    pub fn tab_separated(
        writer: W,
        root: Matcher,
        write_header_line: bool,
        headings: &[&str],
    ) -> Self {
        Self::with_escaper(
            writer,
            TAB_SEPARATED_SANITISING,
            root,
            write_header_line,
            headings,
        )
    }

    /// A strict TSV serializer: tab/CR/LF in fields fail the write.
    pub fn tab_separated_strict(
        writer: W,
        root: Matcher,
        write_header_line: bool,
        headings: &[&str],
    ) -> Self {
        Self::with_escaper(
            writer,
            TAB_SEPARATED_STRICT,
            root,
            write_header_line,
            headings,
        )
    }

    /// A serializer with a custom field escaper.
    ///
    /// The headings fix the row width (and supply the optional header
    /// line); with no headings, rows grow to the highest column written.
    pub fn with_escaper(
        writer: W,
        escaper: FieldEscaper,
        root: Matcher,
        write_header_line: bool,
        headings: &[&str],
    ) -> Self {
        SeparatedValueSerializer {
            writer,
            escaper,
            root,
            path: Vec::new(),
            row: None,
            headings: headings.iter().map(|h| (*h).to_string()).collect(),
            write_header_line,
        }
    }

    /// Consumes the serializer, returning the sink.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn fresh_row(&self) -> Row {
        if self.headings.is_empty() {
            Row::variable()
        } else {
            Row::fixed(self.headings.len())
        }
    }

    fn record_at_current(&mut self, raw_value: &str) -> Result<()> {
        let matcher = resolve(&self.root, &self.path)?;
        record(matcher, raw_value, &mut self.row)
    }

    fn record_at_child(&mut self, name: &str, raw_value: &str) -> Result<()> {
        let matcher = resolve(&self.root, &self.path)?.match_child(name)?;
        record(matcher, raw_value, &mut self.row)
    }

    /// The separator to use when flattening directly in value position:
    /// the current leaf's, or nothing when the walk is not under a leaf.
    fn current_separator(&self) -> Result<String> {
        Ok(match resolve(&self.root, &self.path)? {
            Matcher::Leaf { separator, .. } => separator.clone(),
            _ => String::new(),
        })
    }

    fn child_separator(&self, name: &str) -> Result<String> {
        let child = resolve(&self.root, &self.path)?.match_child(name)?;
        Ok(child.separator()?.to_string())
    }

    fn write_row_per_element<T, F>(&mut self, elements: &[T], mut write_element: F) -> Result<()>
    where
        F: FnMut(&mut Self, &T) -> Result<()>,
    {
        for element in elements {
            self.row = Some(self.fresh_row());
            write_element(self, element)?;
            if let Some(row) = self.row.take() {
                row.write_line(&mut self.writer, &self.escaper)?;
            }
        }
        Ok(())
    }
}

/// Walks the matcher tree along the open map scopes.
fn resolve<'a>(root: &'a Matcher, path: &[String]) -> Result<&'a Matcher> {
    let mut current = root;
    for name in path {
        current = current.match_child(name)?;
    }
    Ok(current)
}

fn record(matcher: &Matcher, raw_value: &str, row: &mut Option<Row>) -> Result<()> {
    // An ignore node drops the value whether or not a row is active.
    if matches!(matcher, Matcher::IgnoreChildren) {
        return Ok(());
    }
    let row = row.as_mut().ok_or(StructuralViolation::NoActiveRow)?;
    matcher.record_value(raw_value, row)
}

impl<W: Write> MapSerializer for SeparatedValueSerializer<W> {
    fn write_property_string(
        &mut self,
        name: &str,
        value: &str,
        _is_map_entry: bool,
    ) -> Result<()> {
        self.record_at_child(name, value)
    }

    fn write_property_null(&mut self, name: &str, is_map_entry: bool) -> Result<()> {
        self.write_property_string(name, "", is_map_entry)
    }

    fn write_property_map(
        &mut self,
        name: &str,
        value: &dyn MapSerializable,
        _is_map_entry: bool,
    ) -> Result<()> {
        resolve(&self.root, &self.path)?.match_child(name)?;
        self.path.push(name.to_string());
        let result = self.write_value_map(value);
        self.path.pop();
        result
    }

    fn write_property_scalar(
        &mut self,
        name: &str,
        value: &dyn ValueSerializable,
        _is_map_entry: bool,
    ) -> Result<()> {
        resolve(&self.root, &self.path)?.match_child(name)?;
        self.path.push(name.to_string());
        let result = self.write_value_scalar(value);
        self.path.pop();
        result
    }

    fn write_property_map_array(
        &mut self,
        name: &str,
        values: &[&dyn MapSerializable],
        _is_map_entry: bool,
    ) -> Result<()> {
        let separator = self.child_separator(name)?;
        let flattened = flatten_map_array(values, &separator)?;
        self.record_at_child(name, &flattened)
    }

    fn write_property_scalar_array(
        &mut self,
        name: &str,
        values: &[&dyn ValueSerializable],
        _is_map_entry: bool,
    ) -> Result<()> {
        let separator = self.child_separator(name)?;
        let flattened = flatten_scalar_array(values, &separator)?;
        self.record_at_child(name, &flattened)
    }

    fn write_property_list(
        &mut self,
        name: &str,
        values: &[Value<'_>],
        _is_map_entry: bool,
    ) -> Result<()> {
        let separator = self.child_separator(name)?;
        let flattened = flatten_values(values, &separator)?;
        self.record_at_child(name, &flattened)
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

impl<W: Write> ValueSerializer for SeparatedValueSerializer<W> {
    fn write_value_null(&mut self) -> Result<()> {
        self.write_value_string("")
    }

    fn write_value_string(&mut self, value: &str) -> Result<()> {
        self.record_at_current(value)
    }

    fn write_value_map(&mut self, value: &dyn MapSerializable) -> Result<()> {
        value.serialise_map(self)
    }

    fn write_value_scalar(&mut self, value: &dyn ValueSerializable) -> Result<()> {
        value.serialise_value(self)
    }

    fn write_value_map_array(&mut self, values: &[&dyn MapSerializable]) -> Result<()> {
        if self.row.is_some() {
            let separator = self.current_separator()?;
            let flattened = flatten_map_array(values, &separator)?;
            return self.write_value_string(&flattened);
        }
        self.write_row_per_element(values, |serializer, value| {
            serializer.write_value_map(*value)
        })
    }

    fn write_value_scalar_array(&mut self, values: &[&dyn ValueSerializable]) -> Result<()> {
        if self.row.is_some() {
            let separator = self.current_separator()?;
            let flattened = flatten_scalar_array(values, &separator)?;
            return self.write_value_string(&flattened);
        }
        self.write_row_per_element(values, |serializer, value| {
            serializer.write_value_scalar(*value)
        })
    }

    fn write_value_list(&mut self, values: &[Value<'_>]) -> Result<()> {
        if self.row.is_some() {
            let separator = self.current_separator()?;
            let flattened = flatten_values(values, &separator)?;
            return self.write_value_string(&flattened);
        }
        self.write_row_per_element(values, |serializer, value| serializer.write_value(value))
    }

    fn write_value_set(&mut self, values: &[Value<'_>]) -> Result<()> {
        self.write_value_list(values)
    }
}

impl<W: Write> Serializer for SeparatedValueSerializer<W> {
    fn start(&mut self) -> Result<()> {
        if self.write_header_line {
            let mut header = Row::fixed(self.headings.len());
            for (index, heading) in self.headings.iter().enumerate() {
                header.record_value(index, heading)?;
            }
            header.write_line(&mut self.writer, &self.escaper)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
