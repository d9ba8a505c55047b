//! Run configuration for the fetch pipeline.
//!
//! Values come from built-in defaults, optionally replaced by a camelCase JSON
//! file; the CLI applies its explicit flags on top.

use super::constants::{DEFAULT_API_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::domain::{HaloError, HaloResult};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct FetchConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub output_dir: PathBuf,
    /// Query parameters forwarded to every cutout download.
    pub cutout_params: BTreeMap<String, String>,
    pub unwrap_periodic: bool,
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: None,
            output_dir: PathBuf::from("."),
            cutout_params: BTreeMap::new(),
            unwrap_periodic: false,
            timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl FetchConfig {
    pub fn load(path: &Path) -> HaloResult<Self> {
        let source = fs::read_to_string(path).map_err(|source| {
            HaloError::io_system(
                "IO.CONFIG_READ",
                format!("failed to read config '{}': {}", path.display(), source),
            )
        })?;
        Self::from_json(&source).map_err(|error| {
            HaloError::input_validation(
                "INPUT.CONFIG_PARSE",
                format!("invalid config '{}': {}", path.display(), error.message()),
            )
        })
    }

    pub fn from_json(source: &str) -> HaloResult<Self> {
        serde_json::from_str(source)
            .map_err(|error| HaloError::input_validation("INPUT.CONFIG_PARSE", error.to_string()))
    }

    /// Base URL with a guaranteed trailing slash so endpoint joins stay flat.
    pub fn normalized_base_url(&self) -> String {
        if self.base_url.ends_with('/') {
            self.base_url.clone()
        } else {
            format!("{}/", self.base_url)
        }
    }

    pub fn require_api_key(&self) -> HaloResult<&str> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(HaloError::input_validation(
                "INPUT.API_KEY",
                "an API key is required (pass --api-key or set ILLUSTRIS_API_KEY)",
            )),
        }
    }
}

/// Parses `key=value` pairs into an ordered map, rejecting malformed entries.
pub fn parse_key_value_pairs<I, S>(
    pairs: I,
    placeholder: &'static str,
) -> HaloResult<BTreeMap<String, String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parsed = BTreeMap::new();
    for pair in pairs {
        let pair = pair.as_ref();
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            HaloError::input_validation(placeholder, format!("expected key=value, got '{pair}'"))
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(HaloError::input_validation(
                placeholder,
                format!("empty key in '{pair}'"),
            ));
        }
        parsed.insert(key.to_string(), value.trim().to_string());
    }
    Ok(parsed)
}
