//! MIME type detection and classification.
//!
//! Types are bare essence strings (no `charset` parameter) so that the
//! transform chain can compare them directly.

use std::path::Path;

/// Common MIME type constants.
pub mod types {
    // Text
    pub const HTML: &str = "text/html";
    pub const PLAIN: &str = "text/plain";
    pub const CSS: &str = "text/css";
    pub const JAVASCRIPT: &str = "application/javascript";
    pub const TEXT_JAVASCRIPT: &str = "text/javascript";
    pub const JSON: &str = "application/json";
    pub const XML: &str = "application/xml";
    pub const MARKDOWN: &str = "text/markdown";

    // Binary
    pub const OCTET_STREAM: &str = "application/octet-stream";
    pub const WASM: &str = "application/wasm";

    // Images
    pub const PNG: &str = "image/png";
    pub const JPEG: &str = "image/jpeg";
    pub const GIF: &str = "image/gif";
    pub const WEBP: &str = "image/webp";
    pub const AVIF: &str = "image/avif";
    pub const SVG: &str = "image/svg+xml";
    pub const ICO: &str = "image/x-icon";

    // Fonts
    pub const WOFF: &str = "font/woff";
    pub const WOFF2: &str = "font/woff2";
    pub const TTF: &str = "font/ttf";
    pub const OTF: &str = "font/otf";
}

/// Guess MIME type from file extension.
pub fn from_path(path: &Path) -> &'static str {
    from_extension(path.extension().and_then(|e| e.to_str()))
}

/// Guess MIME type from file extension string.
pub fn from_extension(ext: Option<&str>) -> &'static str {
    match ext {
        Some("html" | "htm") => types::HTML,
        Some("css") => types::CSS,
        Some("js" | "mjs" | "cjs") => types::JAVASCRIPT,
        Some("json" | "map") => types::JSON,
        Some("xml") => types::XML,
        Some("txt") => types::PLAIN,
        Some("md") => types::MARKDOWN,

        Some("svg") => types::SVG,
        Some("png") => types::PNG,
        Some("jpg" | "jpeg") => types::JPEG,
        Some("gif") => types::GIF,
        Some("webp") => types::WEBP,
        Some("avif") => types::AVIF,
        Some("ico") => types::ICO,

        Some("woff") => types::WOFF,
        Some("woff2") => types::WOFF2,
        Some("ttf") => types::TTF,
        Some("otf") => types::OTF,

        Some("wasm") => types::WASM,

        _ => types::OCTET_STREAM,
    }
}

/// JavaScript module source.
pub fn is_script(mime: &str) -> bool {
    mime == types::JAVASCRIPT || mime == types::TEXT_JAVASCRIPT
}

/// Content that is decoded to text before transforming.
pub fn is_textual(mime: &str) -> bool {
    matches!(
        mime,
        types::HTML | types::JAVASCRIPT | types::CSS | types::SVG | types::TEXT_JAVASCRIPT
    )
}

/// Content whose module specifiers get rewritten.
pub fn is_rewritable(mime: &str) -> bool {
    is_script(mime) || mime == types::HTML
}

/// Content worth gzip-encoding.
pub fn is_compressible(mime: &str) -> bool {
    matches!(
        mime,
        types::HTML | types::JAVASCRIPT | types::TEXT_JAVASCRIPT | types::CSS | types::SVG
    )
}

/// Canonical `Content-Type` for rewritten content.
pub fn canonical(mime: &str) -> &str {
    if is_script(mime) { types::JAVASCRIPT } else { mime }
}
