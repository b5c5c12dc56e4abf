//! Content hashing for response validators.

/// Hex-encoded blake3 digest of `data`.
pub fn content_hash(data: &[u8]) -> String {
    hex::encode(blake3::hash(data).as_bytes())
}

/// Weak entity tag over the exact bytes that will be sent.
pub fn weak_etag(data: &[u8]) -> String {
    format!("W/\"{}\"", content_hash(data))
}

/// Extract the hash from a weak (or strong) entity tag.
pub fn etag_hash(etag: &str) -> &str {
    etag.trim_start_matches("W/").trim_matches('"')
}
