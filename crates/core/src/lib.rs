//! evalbridge core: host-side marshalling for an embedded Scheme interpreter
//!
//! The interpreter evaluates an expression and reports every result value
//! through a C callback, one tagged cell at a time. This crate decodes those
//! cells and rebuilds the host-side result: a sequence of [`Value`]s, one per
//! returned value, with nested vectors reconstructed from the flat stream.
//!
//! Key design principles:
//! - TaggedCell: the `#[repr(C)]` wire record (tag + payload union)
//! - Value: what the interpreter talks about, in owned host form
//! - ContainerStack: which vector the next value lands in
//! - Evaluation: the values of one call plus any per-cell errors
//!
//! # Modules
//!
//! - `cell`: wire layout, tag values, and the one place the union is read
//! - `value`: Value enum (Nil, Bool, Int, Double, Rational, Complex, ...)
//! - `decode`: TaggedCell -> Decoded
//! - `builder`: ContainerStack (open/close/push)
//! - `accumulator`: per-call state and dispatch, error capture
//! - `driver`: `evaluate`, the foreign evaluator seam, and the C callback
//! - `error`: error types and the per-thread stray error for C callers
//! - `display`: Scheme-style printing

pub mod accumulator;
pub mod builder;
pub mod cell;
pub mod decode;
pub mod display;
pub mod driver;
pub mod error;
pub mod value;

#[cfg(test)]
mod testing;

pub use accumulator::{Accumulator, Evaluation};
pub use builder::ContainerStack;
pub use cell::{CellContent, ComplexParts, Payload, RationalParts, Tag, TaggedCell};
pub use decode::{Decoded, decode};
pub use display::{PrintConfig, value_to_scheme};
pub use driver::{
    CellCallback, EvaluateFn, ForeignEvaluator, ForeignFn, evalbridge_receive_cell, evaluate,
    evaluate_values,
};
pub use value::{Keyword, Symbol, Value};

// Error handling
pub use error::{
    BridgeError, CellError, discard_stray_error, evalbridge_copy_error, evalbridge_discard_error,
    evalbridge_error_pending, report_stray_error, stray_error_pending, take_stray_error,
};

// Numeric tower types used in Value
pub use num_complex::Complex64;
pub use num_rational::Rational64;
