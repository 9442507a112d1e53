//! Runtime configuration, loaded from an optional TOML file.
//!
//! Every field has a default, so an absent file or a partial one is fine:
//!
//! ```toml
//! [futures]
//! symbol = "ZR=F"
//! range = "max"
//! output = "data/rough_rice_yahoo.csv"
//!
//! [spreadsheet]
//! output = "data/rice_wb_thai5.csv"
//! layout = "row"
//!
//! [forecast]
//! horizon = 30
//! ```

use crate::data::spreadsheet::{LayoutLocator, LocatorChain, RowLabelLocator};
use crate::data::{FuturesRequest, WORLD_BANK_CMO_URL};
use crate::forecast::DEFAULT_HORIZON;
use crate::series::SourceKind;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_FUTURES_OUTPUT: &str = "data/rough_rice_yahoo.csv";
pub const DEFAULT_SPREADSHEET_OUTPUT: &str = "data/rice_wb_thai5.csv";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("parse config: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FuturesConfig {
    #[serde(flatten)]
    pub request: FuturesRequest,
    pub output: PathBuf,
    /// Chart API host, overridable for mirrors and tests.
    pub base_url: String,
}

impl Default for FuturesConfig {
    fn default() -> Self {
        Self {
            request: FuturesRequest::default(),
            output: PathBuf::from(DEFAULT_FUTURES_OUTPUT),
            base_url: crate::data::yahoo::DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Which worksheet layouts the spreadsheet fetch searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpreadsheetLayout {
    /// Label row with periods across a header row.
    #[default]
    Row,
    /// Label row first, then a labelled column with periods down column 0.
    Auto,
}

impl SpreadsheetLayout {
    pub fn locator(self) -> Box<dyn LayoutLocator> {
        match self {
            Self::Row => Box::new(RowLabelLocator::default()),
            Self::Auto => Box::new(LocatorChain::default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpreadsheetConfig {
    pub url: String,
    pub output: PathBuf,
    pub layout: SpreadsheetLayout,
}

impl Default for SpreadsheetConfig {
    fn default() -> Self {
        Self {
            url: WORLD_BANK_CMO_URL.to_string(),
            output: PathBuf::from(DEFAULT_SPREADSHEET_OUTPUT),
            layout: SpreadsheetLayout::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub horizon: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon: DEFAULT_HORIZON,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RicecastConfig {
    pub futures: FuturesConfig,
    pub spreadsheet: SpreadsheetConfig,
    pub forecast: ForecastConfig,
}

impl RicecastConfig {
    /// Load from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Canonical CSV location for a source.
    pub fn output_for(&self, source: SourceKind) -> &Path {
        match source {
            SourceKind::Futures => &self.futures.output,
            SourceKind::Spreadsheet => &self.spreadsheet.output,
        }
    }
}
