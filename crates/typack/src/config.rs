//! Bundling options
//!
//! The config is a plain value handed to a [`crate::session::BundlingSession`];
//! discovery and layering of configuration files is the embedder's concern.

use anyhow::{Context, Result};
use serde::Deserialize;

/// Options controlling collision policy and output shape
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct BundleConfig {
    /// When set, the entry declaration always keeps its bare name in its
    /// collision group, even when it is not the path-sorted first member.
    ///
    /// Off by default: path-sorted tie-breaking gives reproducible output
    /// that does not depend on which member was the entry.
    pub prefer_entry_name: bool,

    /// Emit a `// Name (from path)` provenance comment above each
    /// bundled declaration.
    pub provenance_comments: bool,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            prefer_entry_name: false,
            provenance_comments: true,
        }
    }
}

impl BundleConfig {
    /// Parse a config from TOML text
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("failed to parse bundle config")
    }
}
