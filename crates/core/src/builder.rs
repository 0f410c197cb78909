//! Container Stack
//!
//! Rebuilds nested structure from the flat cell stream. The bottom entry is
//! the top-level result sequence; every entry above it is a vector that has
//! been opened and not yet closed.
//!
//! ```text
//! cells:  VSTART  1  VSTART  2  VEND  3  VEND  4
//!
//! after "2":     [ results=[] | [1] | [2] ]      depth 2
//! after 2nd VEND:[ results=[#(1 #(2) 3)] ]       depth 0
//! after "4":     [ results=[#(1 #(2) 3), 4] ]
//! ```
//!
//! A vector is appended to its parent when it is closed. Nothing else can
//! reach the parent while the child is open, so arrival order is preserved.

use tracing::trace;

use crate::error::CellError;
use crate::value::Value;

#[derive(Debug, Clone)]
pub struct ContainerStack {
    /// `containers[0]` is the result sequence and is never popped
    containers: Vec<Vec<Value>>,
}

impl Default for ContainerStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerStack {
    pub fn new() -> Self {
        ContainerStack {
            containers: vec![Vec::new()],
        }
    }

    /// Number of currently open vectors
    #[inline]
    pub fn depth(&self) -> usize {
        self.containers.len() - 1
    }

    /// Append to the innermost open vector, or to the results at depth 0
    pub fn push(&mut self, value: Value) {
        self.active().push(value);
    }

    pub fn open_vector(&mut self) {
        self.containers.push(Vec::new());
        trace!(depth = self.depth(), "opened vector");
    }

    /// Seal the innermost vector and append it to its parent.
    ///
    /// At depth 0 this is a protocol violation; the stack is left untouched.
    pub fn close_vector(&mut self) -> Result<(), CellError> {
        if self.depth() == 0 {
            return Err(CellError::UnmatchedVectorEnd);
        }
        let sealed = self.containers.pop().unwrap_or_default();
        self.active().push(Value::Vector(sealed));
        trace!(depth = self.depth(), "closed vector");
        Ok(())
    }

    /// Values accumulated at the top level so far
    pub fn results(&self) -> &[Value] {
        &self.containers[0]
    }

    /// Seal any vectors still open and hand back the result sequence along
    /// with how many vectors had to be sealed.
    pub fn finish(mut self) -> (Vec<Value>, usize) {
        let unclosed = self.depth();
        while self.depth() > 0 {
            // depth > 0 so close_vector cannot fail
            let _ = self.close_vector();
        }
        let results = self.containers.pop().unwrap_or_default();
        (results, unclosed)
    }

    fn active(&mut self) -> &mut Vec<Value> {
        let last = self.containers.len() - 1;
        &mut self.containers[last]
    }
}
