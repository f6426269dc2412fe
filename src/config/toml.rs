//! TOML configuration file parsing
//!
//! Every field is optional. A file can hold just backend settings, just
//! workload settings, or both:
//!
//! ```toml
//! [run]
//! files = 8
//! chunk_size = "16M"
//! prefix = "bench-"
//!
//! [store]
//! bucket = "perf"
//! endpoint = "http://127.0.0.1:9000"
//! path_style = true
//! ```

use crate::util::buffer::FillPattern;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Contents of a configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub run: FileRunSection,
    #[serde(default)]
    pub store: FileStoreSection,
}

/// `[run]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileRunSection {
    pub files: Option<usize>,
    pub concurrency: Option<usize>,
    /// Size string, e.g. "64M"
    pub chunk_size: Option<String>,
    /// Size string, e.g. "1G"
    pub object_size: Option<String>,
    pub prefix: Option<String>,
    pub fill: Option<FillPattern>,
    pub duration_secs: Option<u64>,
    pub delete_after: Option<bool>,
}

/// `[store]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileStoreSection {
    pub bucket: Option<String>,
    pub endpoint: Option<String>,
    pub region: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub path_style: Option<bool>,
}

/// Parse TOML configuration file
pub fn parse_toml_file(path: &Path) -> Result<FileConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML configuration from string
pub fn parse_toml_string(contents: &str) -> Result<FileConfig> {
    ::toml::from_str(contents).context("Failed to parse TOML configuration")
}
