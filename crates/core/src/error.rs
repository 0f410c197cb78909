//! Error Handling
//!
//! Two scopes of failure:
//!
//! - [`CellError`]: one cell could not be decoded or placed. It is logged,
//!   recorded on the evaluation, and the cell is dropped. The evaluation
//!   carries on with the next cell.
//! - [`BridgeError`]: the evaluation call as a whole could not be made.
//!
//! Errors never cross the foreign callback boundary. A problem that has no
//! evaluation to be reported into (a callback arriving between calls, or a
//! panic escaping the callback itself) is kept per thread as the stray
//! error. C code polls it and copies it into its own buffer:
//!
//! ```ignore
//! char msg[256];
//! if (evalbridge_error_pending()) {
//!     size_t len = evalbridge_copy_error(msg, sizeof msg);
//!     /* len >= sizeof msg: truncated, error still pending */
//! }
//! ```

use std::cell::RefCell;
use std::ffi::{NulError, c_char};
use std::fmt;
use std::io;
use std::ptr;

use crate::cell::Tag;

/// Failure scoped to a single cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellError {
    /// Vector-end arrived with no open vector
    UnmatchedVectorEnd,
    /// The evaluation ended with vectors still open
    UnclosedVector { depth: usize },
    /// Rational cell with a zero denominator
    ZeroDenominator { numerator: i64 },
    /// Rational whose lowest-terms form does not fit in i64
    RationalOverflow { numerator: i64, denominator: i64 },
    /// Textual cell with a null string pointer
    NullString { tag: Tag },
    /// Tag outside the known set, or the explicit unknown tag
    UnknownTag(i32),
    /// The callback received a null cell pointer
    NullCell,
    /// Processing the cell panicked
    Panic(String),
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellError::UnmatchedVectorEnd => {
                write!(f, "vector-end without a matching vector-start")
            }
            CellError::UnclosedVector { depth } => {
                write!(f, "evaluation ended with {} unclosed vector(s)", depth)
            }
            CellError::ZeroDenominator { numerator } => {
                write!(f, "rational {}/0 has a zero denominator", numerator)
            }
            CellError::RationalOverflow {
                numerator,
                denominator,
            } => write!(
                f,
                "rational {}/{} cannot be represented with 64-bit terms",
                numerator, denominator
            ),
            CellError::NullString { tag } => write!(f, "{} cell has a null string pointer", tag),
            CellError::UnknownTag(raw) => write!(f, "unknown cell type tag {}", raw),
            CellError::NullCell => write!(f, "callback received a null cell pointer"),
            CellError::Panic(msg) => write!(f, "panic while processing cell: {}", msg),
        }
    }
}

impl std::error::Error for CellError {}

/// Failure of an evaluation call as a whole
#[derive(Debug)]
pub enum BridgeError {
    /// The expression contains an interior NUL byte and cannot be passed to C
    InteriorNul(NulError),
    /// The foreign library could not be loaded or lacks the entry point
    Library(String),
    /// Invalid configuration
    Config(String),
    /// Reading input failed
    Io(io::Error),
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeError::InteriorNul(e) => {
                write!(f, "expression contains a NUL byte at position {}", e.nul_position())
            }
            BridgeError::Library(msg) => write!(f, "library error: {}", msg),
            BridgeError::Config(msg) => write!(f, "configuration error: {}", msg),
            BridgeError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for BridgeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BridgeError::InteriorNul(e) => Some(e),
            BridgeError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<NulError> for BridgeError {
    fn from(e: NulError) -> Self {
        BridgeError::InteriorNul(e)
    }
}

impl From<io::Error> for BridgeError {
    fn from(e: io::Error) -> Self {
        BridgeError::Io(e)
    }
}

/// Format a panic payload into an error message
pub fn format_panic_payload(payload: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

thread_local! {
    /// Most recent problem on this thread that no evaluation could take.
    /// A newer one replaces an unread older one.
    static STRAY_ERROR: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Keep `msg` as this thread's stray error
pub fn report_stray_error(msg: impl Into<String>) {
    let msg = msg.into();
    STRAY_ERROR.with(|slot| *slot.borrow_mut() = Some(msg));
}

/// Remove and return this thread's stray error
pub fn take_stray_error() -> Option<String> {
    STRAY_ERROR.with(|slot| slot.borrow_mut().take())
}

pub fn stray_error_pending() -> bool {
    STRAY_ERROR.with(|slot| slot.borrow().is_some())
}

pub fn discard_stray_error() {
    STRAY_ERROR.with(|slot| *slot.borrow_mut() = None);
}

/// Whether a stray error is waiting on this thread
#[unsafe(no_mangle)]
pub extern "C" fn evalbridge_error_pending() -> bool {
    stray_error_pending()
}

/// Copy the stray error into `buf` as a NUL-terminated string.
///
/// Returns the message length in bytes, without the terminator, or 0 when
/// nothing is pending. Works like `snprintf`: if the return value is not
/// less than `capacity`, the copy was truncated and the error stays pending
/// so the caller can retry with a larger buffer. Otherwise the error is
/// consumed. A null `buf` with zero capacity just reports the length.
///
/// # Safety
/// `buf` must be null or valid for writes of `capacity` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn evalbridge_copy_error(buf: *mut c_char, capacity: usize) -> usize {
    STRAY_ERROR.with(|slot| {
        let mut slot = slot.borrow_mut();
        let Some(msg) = slot.as_deref() else {
            return 0;
        };
        let len = msg.len();
        if buf.is_null() || capacity == 0 {
            return len;
        }

        let copied = len.min(capacity - 1);
        unsafe {
            ptr::copy_nonoverlapping(msg.as_ptr().cast::<c_char>(), buf, copied);
            *buf.add(copied) = 0;
        }
        if copied == len {
            *slot = None;
        }
        len
    })
}

/// Drop the stray error without reading it
#[unsafe(no_mangle)]
pub extern "C" fn evalbridge_discard_error() {
    discard_stray_error();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    #[test]
    fn test_stray_error_is_taken_once() {
        discard_stray_error();
        assert!(!stray_error_pending());

        report_stray_error("first");
        report_stray_error("cell outside any evaluation");
        assert!(evalbridge_error_pending());
        assert_eq!(
            take_stray_error(),
            Some("cell outside any evaluation".to_string())
        );
        assert_eq!(take_stray_error(), None);
    }

    #[test]
    fn test_copy_error_into_buffer() {
        report_stray_error("unknown cell type tag 77");
        let mut buf = [0 as c_char; 64];
        let len = unsafe { evalbridge_copy_error(buf.as_mut_ptr(), buf.len()) };
        assert_eq!(len, 24);
        let msg = unsafe { CStr::from_ptr(buf.as_ptr()) };
        assert_eq!(msg.to_str().unwrap(), "unknown cell type tag 77");
        assert!(!stray_error_pending());
        assert_eq!(unsafe { evalbridge_copy_error(buf.as_mut_ptr(), buf.len()) }, 0);
    }

    #[test]
    fn test_copy_error_truncates_and_keeps_pending() {
        report_stray_error("abcdef");
        assert_eq!(unsafe { evalbridge_copy_error(ptr::null_mut(), 0) }, 6);

        let mut small = [0 as c_char; 4];
        let len = unsafe { evalbridge_copy_error(small.as_mut_ptr(), small.len()) };
        assert_eq!(len, 6);
        let msg = unsafe { CStr::from_ptr(small.as_ptr()) };
        assert_eq!(msg.to_str().unwrap(), "abc");
        assert!(stray_error_pending());

        evalbridge_discard_error();
        assert!(!stray_error_pending());
    }

    #[test]
    fn test_format_panic_payload() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("panic message");
        assert_eq!(format_panic_payload(&payload), "panic message");

        let payload: Box<dyn std::any::Any + Send> = Box::new("owned panic".to_string());
        assert_eq!(format_panic_payload(&payload), "owned panic");

        let payload: Box<dyn std::any::Any + Send> = Box::new(7u8);
        assert_eq!(format_panic_payload(&payload), "unknown panic");
    }

    #[test]
    fn test_cell_error_messages() {
        assert_eq!(
            CellError::UnmatchedVectorEnd.to_string(),
            "vector-end without a matching vector-start"
        );
        assert_eq!(
            CellError::NullString { tag: Tag::Symbol }.to_string(),
            "symbol cell has a null string pointer"
        );
        assert_eq!(CellError::UnknownTag(42).to_string(), "unknown cell type tag 42");
        assert_eq!(
            CellError::RationalOverflow {
                numerator: i64::MIN,
                denominator: -1,
            }
            .to_string(),
            "rational -9223372036854775808/-1 cannot be represented with 64-bit terms"
        );
    }

    #[test]
    fn test_io_error_is_not_a_config_error() {
        let err = BridgeError::from(io::Error::new(io::ErrorKind::InvalidData, "bad bytes"));
        assert!(matches!(err, BridgeError::Io(_)));
        assert_eq!(err.to_string(), "I/O error: bad bytes");
        assert!(std::error::Error::source(&err).is_some());
    }
}
