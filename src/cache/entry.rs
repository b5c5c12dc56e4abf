//! Cached artifact types.

use std::collections::BTreeMap;

use bytes::Bytes;

/// Weight charged for a negative entry.
pub const NOT_FOUND_WEIGHT: usize = 64;

/// Response headers, keyed by canonical header name.
pub type Headers = BTreeMap<String, String>;

/// Response metadata stored next to a body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub headers: Headers,
    /// The producer had nothing for this key.
    pub notfound: bool,
}

/// One processed artifact variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub metadata: Metadata,
    pub body: Option<Bytes>,
}

impl CacheEntry {
    /// A processed body with its headers.
    pub fn found(headers: Headers, body: Bytes) -> Self {
        Self {
            metadata: Metadata {
                headers,
                notfound: false,
            },
            body: Some(body),
        }
    }

    /// A negative entry: the resource does not exist.
    pub fn not_found(headers: Headers) -> Self {
        Self {
            metadata: Metadata {
                headers,
                notfound: true,
            },
            body: None,
        }
    }

    /// Eviction weight: body length, or a fixed charge for negative entries.
    #[inline]
    pub fn weight(&self) -> usize {
        self.body.as_ref().map_or(NOT_FOUND_WEIGHT, Bytes::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight() {
        let found = CacheEntry::found(Headers::new(), Bytes::from_static(b"12345"));
        assert_eq!(found.weight(), 5);
        assert!(!found.metadata.notfound);

        let missing = CacheEntry::not_found(Headers::new());
        assert_eq!(missing.weight(), NOT_FOUND_WEIGHT);
        assert!(missing.metadata.notfound);
    }
}
