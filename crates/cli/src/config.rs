//! CLI configuration
//!
//! Settings come from an optional TOML file and are then overridden by
//! command-line flags.
//!
//! ```toml
//! library = "/usr/local/lib/libscheme_shim.so"
//! symbol = "evaluate"
//! format = "json"
//! pretty = true
//! ```

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use evalbridge_core::BridgeError;
use serde::Deserialize;

/// Default name of the foreign entry point
pub const DEFAULT_SYMBOL: &str = "evaluate";

/// How result values are printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Scheme notation, one value per line
    #[default]
    Scheme,
    /// One JSON document per value
    Json,
}

/// Settings as read from a config file. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub library: Option<PathBuf>,
    pub symbol: Option<String>,
    pub format: Option<OutputFormat>,
    pub pretty: Option<bool>,
}

impl FileConfig {
    pub fn from_toml(toml_str: &str) -> Result<Self, BridgeError> {
        toml::from_str(toml_str)
            .map_err(|e| BridgeError::Config(format!("failed to parse config: {}", e)))
    }

    pub fn load(path: &Path) -> Result<Self, BridgeError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BridgeError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }
}

/// Resolved configuration for one run
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
    /// Shared library exporting the evaluate entry point
    pub library: PathBuf,
    /// Exported symbol name
    pub symbol: String,
    pub format: OutputFormat,
    pub pretty: bool,
}

impl BridgeConfig {
    pub fn new(library: impl Into<PathBuf>) -> Self {
        BridgeConfig {
            library: library.into(),
            symbol: DEFAULT_SYMBOL.to_string(),
            format: OutputFormat::default(),
            pretty: false,
        }
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Merge file settings with flag overrides. Flags win.
    pub fn resolve(file: FileConfig, overrides: FileConfig) -> Result<Self, BridgeError> {
        let library = overrides
            .library
            .or(file.library)
            .ok_or_else(|| BridgeError::Config("no library given (use --library)".to_string()))?;

        let config = BridgeConfig::new(library)
            .with_symbol(
                overrides
                    .symbol
                    .or(file.symbol)
                    .unwrap_or_else(|| DEFAULT_SYMBOL.to_string()),
            )
            .with_format(overrides.format.or(file.format).unwrap_or_default())
            .with_pretty(overrides.pretty.or(file.pretty).unwrap_or(false));

        config.validate()?;
        Ok(config)
    }

    /// The symbol must be a plain C identifier
    pub fn validate(&self) -> Result<(), BridgeError> {
        let mut chars = self.symbol.chars();
        let valid = match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        };
        if !valid {
            return Err(BridgeError::Config(format!(
                "invalid symbol '{}': expected a C identifier",
                self.symbol
            )));
        }
        Ok(())
    }
}
