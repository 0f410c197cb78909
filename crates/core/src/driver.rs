//! Evaluation Driver
//!
//! Hands an expression to the foreign evaluator together with
//! [`evalbridge_receive_cell`] and collects whatever cells arrive before the
//! foreign call returns.
//!
//! The C callback carries no user-data pointer, so the driver parks the
//! call's [`Accumulator`] in a thread-local slot for exactly the duration of
//! the foreign call. Each call gets a fresh accumulator; nested calls on the
//! same thread stack on top of each other and each sees only its own cells.
//!
//! ```ignore
//! let evaluator = unsafe { ForeignFn::new(scheme_evaluate) };
//! let eval = evaluate(&evaluator, "(values 3 4)")?;
//! assert_eq!(eval.values(), &[Value::Int(3), Value::Int(4)]);
//! ```

use std::cell::RefCell;
use std::ffi::{CStr, CString, c_char};
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};

use crate::accumulator::{Accumulator, Evaluation};
use crate::cell::TaggedCell;
use crate::error::{BridgeError, CellError, format_panic_payload, report_stray_error};
use crate::value::Value;

/// Callback the foreign evaluator invokes once per produced cell
pub type CellCallback = unsafe extern "C" fn(*const TaggedCell);

/// Foreign entry point: `void evaluate(const char *expr, void (*cb)(cell *))`
pub type EvaluateFn = unsafe extern "C" fn(*const c_char, CellCallback);

/// Something that can evaluate an expression and report cells.
///
/// # Safety
/// Implementors guarantee that every cell passed to `callback` honors the
/// wire contract (the payload member selected by the tag is initialized,
/// string pointers are null or valid NUL-terminated strings for the duration
/// of that callback) and that `callback` is only invoked on the calling
/// thread before `call` returns.
pub unsafe trait ForeignEvaluator {
    fn call(&self, expression: &CStr, callback: CellCallback);
}

/// A raw foreign entry point
#[derive(Debug, Clone, Copy)]
pub struct ForeignFn(EvaluateFn);

impl ForeignFn {
    /// # Safety
    /// `f` must satisfy the [`ForeignEvaluator`] contract.
    pub unsafe fn new(f: EvaluateFn) -> Self {
        ForeignFn(f)
    }
}

unsafe impl ForeignEvaluator for ForeignFn {
    fn call(&self, expression: &CStr, callback: CellCallback) {
        unsafe { (self.0)(expression.as_ptr(), callback) }
    }
}

unsafe impl<E: ForeignEvaluator + ?Sized> ForeignEvaluator for &E {
    fn call(&self, expression: &CStr, callback: CellCallback) {
        (**self).call(expression, callback)
    }
}

thread_local! {
    /// Accumulators of the evaluation calls in progress on this thread,
    /// innermost last
    static ACTIVE: RefCell<Vec<Accumulator>> = const { RefCell::new(Vec::new()) };
}

/// Keeps an accumulator parked for the duration of one foreign call and
/// removes it again even if the evaluator unwinds.
struct ActiveCall {
    slot: usize,
    done: bool,
}

impl ActiveCall {
    fn begin() -> Self {
        let slot = ACTIVE.with(|active| {
            let mut active = active.borrow_mut();
            active.push(Accumulator::new());
            active.len() - 1
        });
        ActiveCall { slot, done: false }
    }

    fn end(mut self) -> Accumulator {
        self.done = true;
        self.take()
    }

    fn take(&self) -> Accumulator {
        ACTIVE.with(|active| {
            let mut active = active.borrow_mut();
            // Anything above our slot belongs to a nested call that never ended
            active.truncate(self.slot + 1);
            active.pop().unwrap_or_default()
        })
    }
}

impl Drop for ActiveCall {
    fn drop(&mut self) {
        if !self.done {
            let _ = self.take();
        }
    }
}

/// Evaluate `expression` and collect the result sequence.
///
/// Per-cell problems do not fail the call; they are listed in
/// [`Evaluation::errors`] and the offending cells are left out of the values.
pub fn evaluate<E: ForeignEvaluator + ?Sized>(
    evaluator: &E,
    expression: &str,
) -> Result<Evaluation, BridgeError> {
    let expression = CString::new(expression)?;
    debug!(expression = %expression.to_string_lossy(), "evaluating");

    let call = ActiveCall::begin();
    evaluator.call(&expression, evalbridge_receive_cell);
    let accumulator = call.end();

    Ok(accumulator.finish())
}

/// Evaluate and return only the values, discarding per-cell errors
pub fn evaluate_values<E: ForeignEvaluator + ?Sized>(
    evaluator: &E,
    expression: &str,
) -> Result<Vec<Value>, BridgeError> {
    evaluate(evaluator, expression).map(Evaluation::into_values)
}

/// Cell callback handed to the foreign evaluator.
///
/// Feeds the cell into the innermost evaluation in progress on this thread.
/// Never unwinds: failures are logged and recorded, then the callback
/// returns normally.
///
/// # Safety
/// `cell` must be null or point to a cell honoring the wire contract for
/// the duration of this call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn evalbridge_receive_cell(cell: *const TaggedCell) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        ACTIVE.with(|active| {
            let mut active = active.borrow_mut();
            let Some(accumulator) = active.last_mut() else {
                warn!("cell received with no evaluation in progress");
                report_stray_error("cell received with no evaluation in progress");
                return;
            };
            match unsafe { cell.as_ref() } {
                Some(cell) => unsafe { accumulator.feed(cell) },
                None => accumulator.record(CellError::NullCell),
            }
        })
    }));

    if let Err(payload) = outcome {
        let msg = format_panic_payload(&payload);
        warn!("panic in cell callback: {}", msg);
        report_stray_error(format!("panic in cell callback: {}", msg));
    }
}
