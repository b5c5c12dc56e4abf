//! Build identifier for versioned module URLs.
//!
//! The identifier is read once at startup. Rewritten URLs carry it as a query
//! string so a new build invalidates client caches.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::debug;

const GENERATED_LEN: usize = 12;

/// Read the build id from `path`, or generate a random one.
pub fn load_build_id(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(content) if !content.trim().is_empty() => content.trim().to_string(),
        _ => {
            let id = generate_build_id();
            debug!("resolve"; "no build id at {}, using {}", path.display(), id);
            id
        }
    }
}

fn generate_build_id() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos());

    let mut hasher = blake3::Hasher::new();
    hasher.update(&nanos.to_le_bytes());
    hasher.update(&std::process::id().to_le_bytes());
    let hex = hasher.finalize().to_hex();
    hex.as_str()[..GENERATED_LEN].to_string()
}

/// Appends `v=<build id>` to URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheString {
    build_id: String,
}

impl CacheString {
    pub fn new(build_id: impl Into<String>) -> Self {
        Self {
            build_id: build_id.into(),
        }
    }

    pub fn build_id(&self) -> &str {
        &self.build_id
    }

    pub fn apply(&self, url: &str) -> String {
        let sep = if url.contains('?') { '&' } else { '?' };
        format!("{url}{sep}v={}", self.build_id)
    }
}
