//! `[resolver]` and `[[routes]]` configuration.
//!
//! # Example
//!
//! ```toml
//! [resolver]
//! modules_dir = "node_modules"
//! build_id_file = ".frontserve/build-id"
//!
//! [[routes]]
//! package = "lit"
//! legacy_route = "/lit-legacy"     # Used for variant > 0 requests
//!
//! [[routes]]
//! package = "polyfill"
//! replace = "/vendor/polyfill.min.js"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Module specifier resolution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Directory holding installed packages (`<dir>/<package>/package.json`).
    pub modules_dir: PathBuf,

    /// File holding the build identifier used for URL versioning.
    pub build_id_file: PathBuf,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            modules_dir: PathBuf::from("node_modules"),
            build_id_file: PathBuf::from(".frontserve/build-id"),
        }
    }
}

/// Per-package rewrite override.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RouteOverrideConfig {
    /// Package name the override applies to (first specifier segment).
    pub package: String,

    /// Replace the whole specifier with this URL.
    pub replace: Option<String>,

    /// Route prefix substituted for the package on legacy variants.
    pub legacy_route: Option<String>,
}
