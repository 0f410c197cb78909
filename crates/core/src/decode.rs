//! Tagged Cell Decoder
//!
//! Turns one [`TaggedCell`] into exactly one [`Decoded`] outcome. Reading the
//! payload goes through [`TaggedCell::payload`], so only the union member
//! selected by the tag is ever touched.
//!
//! | Tag          | Outcome                                     |
//! |--------------|---------------------------------------------|
//! | nil          | `Value::Nil`                                |
//! | bool         | `Value::Bool(content == 1)`                 |
//! | integer      | `Value::Int`                                |
//! | double       | `Value::Double`                             |
//! | rational     | `Value::Rational` (exact, never a float)    |
//! | complex      | `Value::Complex`                            |
//! | string       | `Value::String` (owned copy)                |
//! | symbol       | `Value::Symbol` (owned copy)                |
//! | keyword      | `Value::Keyword` (owned copy)               |
//! | vector-start | `Decoded::OpenVector`                       |
//! | vector-end   | `Decoded::CloseVector`                      |
//! | void, zero   | `Decoded::Void` (nothing is stored)         |
//! | anything else| `Decoded::Unknown(raw)` (diagnostic only)   |

use std::borrow::Cow;
use std::ffi::CStr;

use num_complex::Complex64;
use num_rational::{Ratio, Rational64};
use tracing::{debug, trace};

use crate::cell::{Payload, Tag, TaggedCell};
use crate::error::CellError;
use crate::value::{Keyword, Symbol, Value};

/// The outcome of decoding one cell
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// A leaf value to store in the active container
    Value(Value),
    /// Structural marker: open a vector
    OpenVector,
    /// Structural marker: close the innermost vector
    CloseVector,
    /// Produces nothing
    Void,
    /// Unrecognized tag; carries the raw wire value
    Unknown(i32),
}

/// Decode one cell.
///
/// Textual payloads are copied into owned strings before returning; the
/// result holds no reference into the cell.
///
/// # Safety
/// The cell must come from a producer honoring the wire contract: the
/// payload member selected by the tag is initialized, and string pointers
/// are null or point to NUL-terminated strings alive for this call.
pub unsafe fn decode(cell: &TaggedCell) -> Result<Decoded, CellError> {
    let Some(tag) = cell.tag() else {
        return Ok(Decoded::Unknown(cell.type_));
    };

    let payload = unsafe { cell.payload(tag) };
    trace!(%tag, "decoding cell");

    let decoded = match (tag, payload) {
        (Tag::VectorStart, _) => Decoded::OpenVector,
        (Tag::VectorEnd, _) => Decoded::CloseVector,
        (Tag::Void, _) => Decoded::Void,
        (Tag::Zero, _) => {
            debug!("dropping zero-tagged cell");
            Decoded::Void
        }
        (Tag::Unknown, _) => Decoded::Unknown(tag.raw()),
        (Tag::Nil, _) => Decoded::Value(Value::Nil),
        (Tag::Bool, Payload::Integer(n)) => Decoded::Value(Value::Bool(n == 1)),
        (Tag::Integer, Payload::Integer(n)) => Decoded::Value(Value::Int(i64::from(n))),
        (Tag::Double, Payload::Double(d)) => Decoded::Value(Value::Double(d)),
        (Tag::Rational, Payload::Rational(parts)) => {
            let numerator = i64::from(parts.numerator);
            let denominator = i64::from(parts.denominator);
            if denominator == 0 {
                return Err(CellError::ZeroDenominator { numerator });
            }
            Decoded::Value(Value::Rational(exact_rational(numerator, denominator)?))
        }
        (Tag::Complex, Payload::Complex(parts)) => {
            Decoded::Value(Value::Complex(Complex64::new(parts.real, parts.imag)))
        }
        (Tag::String | Tag::Symbol | Tag::Keyword, Payload::Text(text)) => {
            let text = text.ok_or(CellError::NullString { tag })?;
            let owned = copy_text(tag, text);
            Decoded::Value(match tag {
                Tag::Symbol => Value::Symbol(Symbol { name: owned }),
                Tag::Keyword => Value::Keyword(Keyword { name: owned }),
                _ => Value::String(owned),
            })
        }
        // payload() returns the member matching the tag, so the pairs
        // above are exhaustive for well-formed calls
        (tag, _) => Decoded::Unknown(tag.raw()),
    };

    Ok(decoded)
}

/// Reduce `numerator/denominator` to lowest terms with a positive denominator.
///
/// Normalizing can need one bit more than i64 (`i64::MIN / -1`), so it is
/// done in i128 and narrowed afterwards.
fn exact_rational(numerator: i64, denominator: i64) -> Result<Rational64, CellError> {
    let wide = Ratio::<i128>::new(i128::from(numerator), i128::from(denominator));
    match (i64::try_from(*wide.numer()), i64::try_from(*wide.denom())) {
        (Ok(n), Ok(d)) => Ok(Rational64::new_raw(n, d)),
        _ => Err(CellError::RationalOverflow {
            numerator,
            denominator,
        }),
    }
}

/// Copy foreign text into host-owned memory
fn copy_text(tag: Tag, text: &CStr) -> String {
    match text.to_string_lossy() {
        Cow::Borrowed(s) => s.to_owned(),
        Cow::Owned(s) => {
            debug!(%tag, "replaced invalid UTF-8 in foreign text");
            s
        }
    }
}
