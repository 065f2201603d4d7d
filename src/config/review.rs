//! Position-resolution settings, loaded from a TOML file.
//!
//! ```toml
//! [resolver]
//! strict_validation = false
//! tolerance = "whitespace"
//! ```

use crate::error::{Error, Result};
use crate::resolver::{ResolveOptions, Tolerance};
use serde::Deserialize;
use std::path::Path;

/// Top-level TOML wrapper.
#[derive(Debug, Default, Deserialize)]
struct ReviewFile {
    #[serde(default)]
    resolver: ReviewSettings,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ReviewSettings {
    /// Stale precomputed positions count as not found.
    #[serde(default)]
    pub strict_validation: bool,
    #[serde(default)]
    pub tolerance: Tolerance,
}

impl ReviewSettings {
    /// Settings from the file named by `PROOFDESK_REVIEW_CONFIG`, or
    /// defaults when it is unset.
    pub fn from_env() -> Result<Self> {
        match std::env::var("PROOFDESK_REVIEW_CONFIG") {
            Ok(path) => Self::load(Path::new(&path)),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Read settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read review config {}: {e}", path.display()))
        })?;
        Self::parse(&content)
            .map_err(|e| Error::Config(format!("bad review config {}: {e}", path.display())))
    }

    /// Parse settings from TOML text.
    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        let file: ReviewFile = toml::from_str(content)?;
        Ok(file.resolver)
    }

    /// Resolver options with these settings and no search hint.
    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions::default()
            .strict(self.strict_validation)
            .tolerance(self.tolerance)
    }
}
