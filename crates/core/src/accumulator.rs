//! Value Accumulator
//!
//! Routes each decoded cell into the [`ContainerStack`]: structural markers
//! open and close vectors, leaf values are appended to the active container,
//! void and unknown cells are dropped.
//!
//! `feed` never fails outward. A cell that cannot be decoded or placed is
//! logged, recorded on the evaluation, and skipped; later cells are still
//! processed. Panics are caught here as well, so nothing unwinds into the
//! foreign caller. Results are never rolled back: a dropped cell just makes
//! the returned sequence shorter.

use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};

use crate::builder::ContainerStack;
use crate::cell::TaggedCell;
use crate::decode::{Decoded, decode};
use crate::error::{CellError, format_panic_payload};
use crate::value::Value;

/// Per-call evaluation state
#[derive(Debug, Default)]
pub struct Accumulator {
    stack: ContainerStack,
    errors: Vec<CellError>,
    cells: usize,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one cell.
    ///
    /// # Safety
    /// Same contract as [`decode`]: the payload member selected by the tag is
    /// initialized and any string pointer is valid for this call.
    pub unsafe fn feed(&mut self, cell: &TaggedCell) {
        self.cells += 1;
        let index = self.cells;

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| unsafe { self.process(cell) }));
        let error = match outcome {
            Ok(Ok(())) => return,
            Ok(Err(e)) => e,
            Err(payload) => CellError::Panic(format_panic_payload(&payload)),
        };

        warn!(index, ?cell, "dropping cell: {}", error);
        self.errors.push(error);
    }

    unsafe fn process(&mut self, cell: &TaggedCell) -> Result<(), CellError> {
        match unsafe { decode(cell) }? {
            Decoded::Value(value) => {
                debug!(kind = value.type_name(), depth = self.stack.depth(), "value");
                self.stack.push(value);
            }
            Decoded::OpenVector => self.stack.open_vector(),
            Decoded::CloseVector => self.stack.close_vector()?,
            Decoded::Void => {}
            Decoded::Unknown(raw) => return Err(CellError::UnknownTag(raw)),
        }
        Ok(())
    }

    /// Record an error that did not come from a cell's contents
    pub fn record(&mut self, error: CellError) {
        warn!("{}", error);
        self.errors.push(error);
    }

    /// Current vector nesting depth
    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    /// Number of cells fed so far
    pub fn cells_seen(&self) -> usize {
        self.cells
    }

    /// End the evaluation. Vectors left open are sealed and reported.
    pub fn finish(mut self) -> Evaluation {
        let (values, unclosed) = self.stack.finish();
        if unclosed > 0 {
            warn!(depth = unclosed, "evaluation ended with open vectors");
            self.errors.push(CellError::UnclosedVector { depth: unclosed });
        }
        debug!(
            cells = self.cells,
            values = values.len(),
            errors = self.errors.len(),
            "evaluation finished"
        );
        Evaluation {
            values,
            errors: self.errors,
        }
    }
}

/// The outcome of one evaluation call
///
/// `values` is the top-level result sequence: empty for a void result, one
/// element for an ordinary result, N elements for N multiple values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Evaluation {
    pub values: Vec<Value>,
    pub errors: Vec<CellError>,
}

impl Evaluation {
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Per-cell errors reported during the call
    pub fn errors(&self) -> &[CellError] {
        &self.errors
    }

    /// True if no cell was dropped
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
