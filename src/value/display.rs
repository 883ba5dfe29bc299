//! Human-readable rendering of values and parameter lists for diagnostics.
//!
//! Statements always carry their values as bound parameters; this rendering
//! only feeds `tracing` events and error messages, never statement text.

use core::fmt::{self, Display, Formatter, Write};

use super::Value;

/// Blobs longer than this are abbreviated to their leading bytes.
const BLOB_PREVIEW_BYTES: usize = 16;

impl Display for Value {
    /// Renders the value in SQL literal syntax.
    ///
    /// Non-finite reals have no literal form and render as `NaN`, `inf` or
    /// `-inf`. Blobs longer than 16 bytes are abbreviated, followed by their
    /// total length.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Integer(v) => write!(f, "{v}"),
            // `{:?}` keeps the fractional part, so 1.0 is not mistaken for 1.
            Value::Real(v) => write!(f, "{v:?}"),
            Value::Text(text) => {
                f.write_char('\'')?;
                for chunk in text.split_inclusive('\'') {
                    f.write_str(chunk)?;
                    if chunk.ends_with('\'') {
                        f.write_char('\'')?;
                    }
                }
                f.write_char('\'')
            }
            Value::Blob(bytes) => {
                f.write_str("X'")?;
                for byte in bytes.iter().take(BLOB_PREVIEW_BYTES) {
                    write!(f, "{byte:02X}")?;
                }
                if bytes.len() > BLOB_PREVIEW_BYTES {
                    write!(f, "...' ({} bytes)", bytes.len())
                } else {
                    f.write_char('\'')
                }
            }
        }
    }
}

/// Display adapter listing statement parameters with their 1-based position.
///
/// Obtained from [`Command::bindings`](crate::Command::bindings).
#[derive(Debug, Clone, Copy)]
pub struct Bindings<'a>(pub(crate) &'a [Value]);

impl Display for Bindings<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_char('[')?;
        for (position, value) in self.0.iter().enumerate() {
            if position > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={value}", position + 1)?;
        }
        f.write_char(']')
    }
}
