//! Response header names and freshness headers.

use std::time::{Duration, SystemTime};

use crate::cache::Headers;

pub const CACHE_CONTROL: &str = "Cache-Control";
pub const CONTENT_ENCODING: &str = "Content-Encoding";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const ETAG: &str = "ETag";
pub const EXPIRES: &str = "Expires";
pub const LAST_MODIFIED: &str = "Last-Modified";

/// Headers for a freshly produced cacheable response.
///
/// `Expires` is only set when a max-age is configured.
pub fn cache_headers(max_age: Option<u64>, content_type: &str, now: SystemTime) -> Headers {
    let mut headers = Headers::new();
    headers.insert(
        CACHE_CONTROL.into(),
        format!("public, max-age={}", max_age.unwrap_or(0)),
    );
    headers.insert(LAST_MODIFIED.into(), httpdate::fmt_http_date(now));
    if let Some(secs) = max_age {
        let expires = now + Duration::from_secs(secs);
        headers.insert(EXPIRES.into(), httpdate::fmt_http_date(expires));
    }
    headers.insert(CONTENT_TYPE.into(), content_type.into());
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_without_max_age() {
        let now = SystemTime::now();
        let headers = cache_headers(None, "text/css", now);
        assert_eq!(headers[CACHE_CONTROL], "public, max-age=0");
        assert_eq!(headers[CONTENT_TYPE], "text/css");
        assert!(!headers.contains_key(EXPIRES));
        assert_eq!(headers[LAST_MODIFIED], httpdate::fmt_http_date(now));
    }

    #[test]
    fn test_with_max_age() {
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
        let headers = cache_headers(Some(3600), "text/html", now);
        assert_eq!(headers[CACHE_CONTROL], "public, max-age=3600");

        let expires = httpdate::parse_http_date(&headers[EXPIRES]).unwrap();
        assert_eq!(expires, now + Duration::from_secs(3600));
    }
}
