//! Per-request pipeline options and cache keys.

use serde::{Deserialize, Serialize};

/// Whether a route allows minification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MinifyPolicy {
    #[default]
    Normal,
    Deny,
}

/// Client-specific parameters that select an artifact variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CustomOptions {
    /// `0` for the default build, non-zero for legacy builds.
    pub variant: u32,
}

/// How one resource should be processed.
#[derive(Debug, Clone, Default)]
pub struct ResponseOptions {
    /// Essence MIME type of the produced content.
    pub mime_type: String,
    /// Skip module specifier rewriting.
    pub deny_path_replace: bool,
    pub minify: MinifyPolicy,
    pub custom: CustomOptions,
    /// `Content-Type` header value when it should differ from `mime_type`.
    pub content_type: Option<String>,
}

impl ResponseOptions {
    pub fn new(mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            ..Self::default()
        }
    }

    pub fn deny_path_replace(mut self, deny: bool) -> Self {
        self.deny_path_replace = deny;
        self
    }

    pub fn minify(mut self, policy: MinifyPolicy) -> Self {
        self.minify = policy;
        self
    }

    pub fn variant(mut self, variant: u32) -> Self {
        self.custom.variant = variant;
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Header value for `Content-Type` before any canonicalization.
    pub fn header_content_type(&self) -> &str {
        self.content_type.as_deref().unwrap_or(&self.mime_type)
    }
}

/// Cache key for a logical path: `path` or `path#<variant>`.
pub fn cache_key(path: &str, custom: &CustomOptions) -> String {
    match custom.variant {
        0 => path.to_string(),
        variant => format!("{path}#{variant}"),
    }
}
