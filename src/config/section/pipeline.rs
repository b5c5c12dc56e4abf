//! `[pipeline]` section configuration.
//!
//! Toggles for the response transform chain.
//!
//! # Example
//!
//! ```toml
//! [pipeline]
//! enable_server_cache = true
//! enable_minify = true
//! enable_gzip = true
//! minify_css = false
//! cache_max_age_header = 3600        # Cache-Control max-age, seconds
//! url_cache_string_mode = "simple"   # Append ?v=<build id> to rewritten URLs
//! extension_exempt_prefixes = ["nf-"]
//! producer_timeout_ms = 30000
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How rewritten module URLs are versioned for client-side caching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlCacheStringMode {
    /// Leave URLs untouched.
    #[default]
    Disabled,
    /// Append the build identifier as `?v=<id>`.
    Simple,
}

/// Transform chain settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Keep processed responses in memory.
    pub enable_server_cache: bool,

    /// Minify JavaScript (and HTML/CSS template literals inside it).
    pub enable_minify: bool,

    /// Gzip compressible responses.
    pub enable_gzip: bool,

    /// Minify `text/css` responses.
    pub minify_css: bool,

    /// Value of `max-age` in `Cache-Control`, and the `Expires` offset.
    pub cache_max_age_header: Option<u64>,

    /// Versioning of rewritten module URLs.
    pub url_cache_string_mode: UrlCacheStringMode,

    /// File names starting with one of these never get a `.js` suffix.
    pub extension_exempt_prefixes: Vec<String>,

    /// Upper bound for a single producer invocation.
    pub producer_timeout_ms: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            enable_server_cache: true,
            enable_minify: false,
            enable_gzip: false,
            minify_css: false,
            cache_max_age_header: None,
            url_cache_string_mode: UrlCacheStringMode::Disabled,
            extension_exempt_prefixes: vec!["nf-".into()],
            producer_timeout_ms: None,
        }
    }
}

impl PipelineConfig {
    pub fn producer_timeout(&self) -> Option<Duration> {
        self.producer_timeout_ms.map(Duration::from_millis)
    }
}
