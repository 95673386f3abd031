//! Collapsing nested collections into one delimited field.
//!
//! When the tabular backend meets an array underneath a leaf's path (a row
//! is already being assembled, so the array cannot become rows of its own),
//! the array is *flattened*: each element is rendered through
//! [`FlatteningValueSerializer`] and the renderings are joined with the
//! leaf's configured separator into a single string, recorded as that one
//! field's value.
//!
//! The flattening serializer applies the same dispatch rules as any other
//! backend, with two reductions: null renders as the empty string, and a
//! map-typed element falls back to its `Debug` form (there is no sub-field
//! structure left to spread it into).

use crate::protocol::{MapSerializable, ValueSerializable, ValueSerializer};
use crate::value::Value;
use crate::Result;

/// A value serializer rendering everything into one `String`.
#[derive(Debug)]
pub struct FlatteningValueSerializer {
    output: String,
    separator: String,
}

impl FlatteningValueSerializer {
    /// Creates a flattener joining collection elements with `separator`.
    pub fn new(separator: impl Into<String>) -> Self {
        FlatteningValueSerializer {
            output: String::new(),
            separator: separator.into(),
        }
    }

    /// Consumes the flattener, returning the accumulated text.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.output
    }

    fn push_separator_after_first(&mut self, index: usize) {
        if index != 0 {
            self.output.push_str(&self.separator);
        }
    }
}

impl ValueSerializer for FlatteningValueSerializer {
    fn write_value_null(&mut self) -> Result<()> {
        // Null flattens to the empty string.
        Ok(())
    }

    fn write_value_string(&mut self, value: &str) -> Result<()> {
        self.output.push_str(value);
        Ok(())
    }

    fn write_value_map(&mut self, value: &dyn MapSerializable) -> Result<()> {
        self.output.push_str(&format!("{value:?}"));
        Ok(())
    }

    fn write_value_scalar(&mut self, value: &dyn ValueSerializable) -> Result<()> {
        value.serialise_value(self)
    }

    fn write_value_map_array(&mut self, values: &[&dyn MapSerializable]) -> Result<()> {
        for (index, value) in values.iter().enumerate() {
            self.push_separator_after_first(index);
            self.write_value_map(*value)?;
        }
        Ok(())
    }

    fn write_value_scalar_array(&mut self, values: &[&dyn ValueSerializable]) -> Result<()> {
        for (index, value) in values.iter().enumerate() {
            self.push_separator_after_first(index);
            self.write_value_scalar(*value)?;
        }
        Ok(())
    }

    fn write_value_list(&mut self, values: &[Value<'_>]) -> Result<()> {
        for (index, value) in values.iter().enumerate() {
            self.push_separator_after_first(index);
            self.write_value(value)?;
        }
        Ok(())
    }

    fn write_value_set(&mut self, values: &[Value<'_>]) -> Result<()> {
        self.write_value_list(values)
    }
}

pub(crate) fn flatten_map_array(
    values: &[&dyn MapSerializable],
    separator: &str,
) -> Result<String> {
    let mut flattener = FlatteningValueSerializer::new(separator);
    flattener.write_value_map_array(values)?;
    Ok(flattener.into_inner())
}

pub(crate) fn flatten_scalar_array(
    values: &[&dyn ValueSerializable],
    separator: &str,
) -> Result<String> {
    let mut flattener = FlatteningValueSerializer::new(separator);
    flattener.write_value_scalar_array(values)?;
    Ok(flattener.into_inner())
}

pub(crate) fn flatten_values(values: &[Value<'_>], separator: &str) -> Result<String> {
    let mut flattener = FlatteningValueSerializer::new(separator);
    flattener.write_value_list(values)?;
    Ok(flattener.into_inner())
}
