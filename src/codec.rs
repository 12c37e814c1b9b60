//! Rendering of bound values as SQL literal text.

use std::fmt::Write;

use chrono::NaiveDateTime;

use crate::error::SqlMapperError;
use crate::types::RowValues;

/// `MySQL`-like timestamp layout with millisecond precision.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Turns `RowValues` into the literal text substituted for a placeholder.
///
/// Text is quoted verbatim; callers binding untrusted text must pass it through
/// `Engine::escape` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueCodec {
    timestamp_format: &'static str,
    null_literal: &'static str,
}

impl Default for ValueCodec {
    fn default() -> Self {
        Self::new(DEFAULT_TIMESTAMP_FORMAT)
    }
}

impl ValueCodec {
    #[must_use]
    pub const fn new(timestamp_format: &'static str) -> Self {
        Self {
            timestamp_format,
            null_literal: "null",
        }
    }

    #[must_use]
    pub const fn with_null_literal(mut self, null_literal: &'static str) -> Self {
        self.null_literal = null_literal;
        self
    }

    /// Render `value` as SQL literal text.
    ///
    /// # Errors
    /// Returns `SqlMapperError::UnsupportedValueType` for JSON, blobs and non-finite floats.
    pub fn render(&self, value: &RowValues) -> Result<String, SqlMapperError> {
        let mut out = String::new();
        self.render_into(value, &mut out)?;
        Ok(out)
    }

    fn render_into(&self, value: &RowValues, out: &mut String) -> Result<(), SqlMapperError> {
        match value {
            RowValues::Null => out.push_str(self.null_literal),
            RowValues::Int(i) => {
                let _ = write!(out, "{i}");
            }
            RowValues::Float(f) if f.is_finite() => {
                let _ = write!(out, "{f}");
            }
            RowValues::Float(f) => {
                return Err(SqlMapperError::UnsupportedValueType(format!("Float({f})")));
            }
            RowValues::Bool(b) => out.push(if *b { '1' } else { '0' }),
            RowValues::Text(s) => {
                out.push('\'');
                out.push_str(s);
                out.push('\'');
            }
            RowValues::Timestamp(ts) => self.push_timestamp(ts, out),
            RowValues::DateTime(dt) => self.push_timestamp(&dt.naive_utc(), out),
            RowValues::List(items) => {
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        out.push(',');
                    }
                    self.render_into(item, out)?;
                }
            }
            RowValues::JSON(_) | RowValues::Blob(_) => {
                return Err(SqlMapperError::UnsupportedValueType(value.kind().to_string()));
            }
        }
        Ok(())
    }

    fn push_timestamp(&self, ts: &NaiveDateTime, out: &mut String) {
        out.push('\'');
        let _ = write!(out, "{}", ts.format(self.timestamp_format));
        out.push('\'');
    }
}
