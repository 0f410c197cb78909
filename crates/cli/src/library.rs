//! Foreign evaluator backed by a shared library
//!
//! The library must export
//! `void <symbol>(const char *expr, void (*callback)(const cell *))`
//! and call `callback` on the calling thread before returning.

use std::ffi::CStr;

use evalbridge_core::{BridgeError, CellCallback, EvaluateFn, ForeignEvaluator};
use libloading::Library;
use tracing::info;

use crate::config::BridgeConfig;

pub struct SchemeLibrary {
    // Must outlive `entry`
    _library: Library,
    entry: EvaluateFn,
}

impl SchemeLibrary {
    /// Load the library named in `config` and resolve its entry point
    pub fn open(config: &BridgeConfig) -> Result<Self, BridgeError> {
        let library = unsafe { Library::new(&config.library) }.map_err(|e| {
            BridgeError::Library(format!("cannot load {}: {}", config.library.display(), e))
        })?;

        let entry = unsafe { library.get::<EvaluateFn>(config.symbol.as_bytes()) }
            .map(|symbol| *symbol)
            .map_err(|e| {
                BridgeError::Library(format!(
                    "{} does not export '{}': {}",
                    config.library.display(),
                    config.symbol,
                    e
                ))
            })?;

        info!(library = %config.library.display(), symbol = %config.symbol, "loaded interpreter");

        Ok(SchemeLibrary {
            _library: library,
            entry,
        })
    }
}

// The loaded library is trusted to honor the cell contract; there is no
// way to check it from this side.
unsafe impl ForeignEvaluator for SchemeLibrary {
    fn call(&self, expression: &CStr, callback: CellCallback) {
        unsafe { (self.entry)(expression.as_ptr(), callback) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_library_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = BridgeConfig::new(dir.path().join("libabsent.so"));
        let err = SchemeLibrary::open(&config).err().expect("load should fail");
        assert!(matches!(err, BridgeError::Library(_)));
        assert!(err.to_string().contains("cannot load"));
    }
}
