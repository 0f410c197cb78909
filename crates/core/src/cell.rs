//! Wire Protocol: Tagged Cells
//!
//! The foreign evaluator reports each result value as one fixed-layout
//! record handed to the host callback: a 32-bit type tag followed by a
//! C union whose active member is selected by that tag.
//!
//! ## Cell Layout
//!
//! ```text
//! ┌──────────────┬───────────────────────────────────────────────┐
//! │ type (i32)   │ content (union, 16 bytes)                     │
//! ├──────────────┼───────────────────────────────────────────────┤
//! │ INTEGER/BOOL │ integer: long                                 │
//! │ DOUBLE       │ double: f64                                   │
//! │ STRING/SYM/  │ string: const char* (NUL-terminated)          │
//! │ KEYWORD      │                                               │
//! │ COMPLEX      │ complex: { real: f64, imag: f64 }             │
//! │ RATIONAL     │ rational: { numerator: long, denominator: long }│
//! │ markers      │ (unused)                                      │
//! └──────────────┴───────────────────────────────────────────────┘
//! ```
//!
//! Rationals carry their own payload shape; they never reuse the complex
//! member's layout.
//!
//! Only [`TaggedCell::payload`] reads the union, and it reads exactly the
//! member the tag selects.

use std::ffi::{CStr, c_char, c_long};
use std::fmt;

/// Type tag values. These must match the foreign side exactly.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    VectorStart = -256,
    VectorEnd = -255,
    Unknown = -2,
    Void = -1,
    Zero = 0,
    Nil = 1,
    Bool = 2,
    Integer = 3,
    String = 4,
    Double = 5,
    Rational = 6,
    Complex = 7,
    Symbol = 8,
    Keyword = 9,
}

impl Tag {
    /// Map a raw wire tag to a known tag. Unlisted values yield `None`.
    pub fn from_raw(raw: i32) -> Option<Tag> {
        let tag = match raw {
            -256 => Tag::VectorStart,
            -255 => Tag::VectorEnd,
            -2 => Tag::Unknown,
            -1 => Tag::Void,
            0 => Tag::Zero,
            1 => Tag::Nil,
            2 => Tag::Bool,
            3 => Tag::Integer,
            4 => Tag::String,
            5 => Tag::Double,
            6 => Tag::Rational,
            7 => Tag::Complex,
            8 => Tag::Symbol,
            9 => Tag::Keyword,
            _ => return None,
        };
        Some(tag)
    }

    /// The raw wire value
    pub fn raw(self) -> i32 {
        self as i32
    }

    /// Lower-case name used in diagnostics
    pub fn name(self) -> &'static str {
        match self {
            Tag::VectorStart => "vector-start",
            Tag::VectorEnd => "vector-end",
            Tag::Unknown => "unknown",
            Tag::Void => "void",
            Tag::Zero => "zero",
            Tag::Nil => "nil",
            Tag::Bool => "bool",
            Tag::Integer => "integer",
            Tag::String => "string",
            Tag::Double => "double",
            Tag::Rational => "rational",
            Tag::Complex => "complex",
            Tag::Symbol => "symbol",
            Tag::Keyword => "keyword",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Real and imaginary parts of a complex payload
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComplexParts {
    pub real: f64,
    pub imag: f64,
}

/// Numerator and denominator of a rational payload
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RationalParts {
    pub numerator: c_long,
    pub denominator: c_long,
}

/// The cell payload. The active member is determined by [`TaggedCell::type_`].
#[repr(C)]
#[derive(Clone, Copy)]
pub union CellContent {
    pub integer: c_long,
    pub double: f64,
    pub string: *const c_char,
    pub complex: ComplexParts,
    pub rational: RationalParts,
}

/// One wire record: type tag plus payload.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct TaggedCell {
    pub type_: i32,
    pub content: CellContent,
}

/// The payload of a cell, read through its tag.
///
/// Borrowed strings are only valid for the lifetime of the cell, which for
/// foreign cells means the duration of one callback invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Payload<'a> {
    /// Tags that carry no payload (nil, void, zero, markers, unknown)
    Empty,
    Integer(c_long),
    Double(f64),
    /// String pointer; `None` when the foreign side sent a null pointer
    Text(Option<&'a CStr>),
    Rational(RationalParts),
    Complex(ComplexParts),
}

impl TaggedCell {
    /// A cell whose payload is zeroed
    pub fn marker(tag: Tag) -> Self {
        TaggedCell {
            type_: tag.raw(),
            content: CellContent {
                rational: RationalParts {
                    numerator: 0,
                    denominator: 0,
                },
            },
        }
    }

    /// A cell with an arbitrary raw tag and zeroed payload
    pub fn with_raw_tag(raw: i32) -> Self {
        let mut cell = Self::marker(Tag::Zero);
        cell.type_ = raw;
        cell
    }

    pub fn nil() -> Self {
        Self::marker(Tag::Nil)
    }

    /// A boolean cell as the foreign side encodes it: 1 for true, 0 for false
    pub fn boolean(b: bool) -> Self {
        Self::raw_bool(c_long::from(b))
    }

    /// A boolean cell with an arbitrary integer content
    pub fn raw_bool(content: c_long) -> Self {
        TaggedCell {
            type_: Tag::Bool.raw(),
            ..Self::integer(content)
        }
    }

    pub fn integer(n: c_long) -> Self {
        let mut cell = Self::marker(Tag::Integer);
        cell.content.integer = n;
        cell
    }

    pub fn double(d: f64) -> Self {
        let mut cell = Self::marker(Tag::Double);
        cell.content.double = d;
        cell
    }

    pub fn rational(numerator: c_long, denominator: c_long) -> Self {
        TaggedCell {
            type_: Tag::Rational.raw(),
            content: CellContent {
                rational: RationalParts {
                    numerator,
                    denominator,
                },
            },
        }
    }

    pub fn complex(real: f64, imag: f64) -> Self {
        TaggedCell {
            type_: Tag::Complex.raw(),
            content: CellContent {
                complex: ComplexParts { real, imag },
            },
        }
    }

    /// A string cell pointing at `s`. The cell borrows `s` without tracking it;
    /// the caller keeps `s` alive while the cell is in use.
    pub fn string(s: &CStr) -> Self {
        Self::text(Tag::String, s)
    }

    /// See [`TaggedCell::string`] for the borrowing rule.
    pub fn symbol(name: &CStr) -> Self {
        Self::text(Tag::Symbol, name)
    }

    /// See [`TaggedCell::string`] for the borrowing rule.
    pub fn keyword(name: &CStr) -> Self {
        Self::text(Tag::Keyword, name)
    }

    fn text(tag: Tag, s: &CStr) -> Self {
        let mut cell = Self::marker(tag);
        cell.content.string = s.as_ptr();
        cell
    }

    /// The known tag, or `None` for unlisted raw values
    pub fn tag(&self) -> Option<Tag> {
        Tag::from_raw(self.type_)
    }

    /// Read the payload member selected by `tag`.
    ///
    /// # Safety
    /// The member selected by `tag` must be initialized, and for textual
    /// tags a non-null pointer must reference a NUL-terminated string that
    /// stays valid for the lifetime of `self`.
    pub unsafe fn payload(&self, tag: Tag) -> Payload<'_> {
        match tag {
            Tag::Bool | Tag::Integer => Payload::Integer(unsafe { self.content.integer }),
            Tag::Double => Payload::Double(unsafe { self.content.double }),
            Tag::Rational => Payload::Rational(unsafe { self.content.rational }),
            Tag::Complex => Payload::Complex(unsafe { self.content.complex }),
            Tag::String | Tag::Symbol | Tag::Keyword => {
                let ptr = unsafe { self.content.string };
                if ptr.is_null() {
                    Payload::Text(None)
                } else {
                    Payload::Text(Some(unsafe { CStr::from_ptr(ptr) }))
                }
            }
            Tag::VectorStart
            | Tag::VectorEnd
            | Tag::Unknown
            | Tag::Void
            | Tag::Zero
            | Tag::Nil => Payload::Empty,
        }
    }
}

impl fmt::Debug for TaggedCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Only the tag is safe to inspect without trusting the producer
        match self.tag() {
            Some(tag) => write!(f, "TaggedCell({})", tag),
            None => write!(f, "TaggedCell(raw tag {})", self.type_),
        }
    }
}

// Compile-time layout checks: i32 tag, then a union aligned to 8 bytes
const _: () = assert!(std::mem::align_of::<TaggedCell>() == 8);
const _: () = assert!(std::mem::size_of::<CellContent>() == 16);
