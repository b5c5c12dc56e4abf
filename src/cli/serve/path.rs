//! URL to filesystem path resolution.

use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};

/// Normalize a request URL: strip the query string and decode.
///
/// Returns `None` when the path is not valid UTF-8 after decoding.
pub fn normalize_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    percent_decode_str(path)
        .decode_utf8()
        .ok()
        .map(std::borrow::Cow::into_owned)
}

/// Clean a user-supplied relative path.
///
/// Resolves `.` and `..` as if the path were rooted, so the result never
/// climbs above its base. Backslashes count as separators.
pub fn clean(user_path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in user_path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    parts.join("/")
}

/// Join a cleaned user path onto `base`.
pub fn sanitize(base: &Path, user_path: &str) -> PathBuf {
    let cleaned = clean(user_path);
    if cleaned.is_empty() {
        base.to_path_buf()
    } else {
        base.join(cleaned)
    }
}
