//! Response preparation pipeline.
//!
//! Turns a cache key, processing options and a content producer into a
//! ready-to-send body with headers.
//!
//! # Flow
//!
//! ```text
//! prepare_response(key, opts, producer)
//!   ├── cache hit ──────────────────────────────► stored body / notfound
//!   └── miss ─► single-flight leader
//!                 producer() ─► None ───────────► store notfound
//!                     │
//!                     ▼
//!               decode ─► rewrite ─► minify ─► gzip ─► etag ─► store
//! ```
//!
//! Concurrent misses on one key share a single producer call. With the
//! server cache disabled every call runs the producer and nothing is stored.

mod error;
pub mod headers;
mod options;

pub use error::PipelineError;
pub use options::{CustomOptions, MinifyPolicy, ResponseOptions, cache_key};

use std::future::Future;
use std::io;
use std::time::SystemTime;

use bytes::Bytes;
use parking_lot::Mutex;

use crate::asset::{compress, etag, minify};
use crate::cache::{CacheEntry, CacheStore, Flight, Flights, Headers, flight};
use crate::config::{CacheConfig, PipelineConfig, ServerConfig};
use crate::resolve::{ResolveOptions, Resolver, SourceKind};
use crate::stream::{self, ByteStream};
use crate::utils::mime::{self, types};
use crate::{debug, log};

use headers::{CONTENT_ENCODING, CONTENT_TYPE, ETAG, LAST_MODIFIED};

// ============================================================================
// Types
// ============================================================================

/// What a producer hands to the pipeline.
pub enum Produced {
    Bytes(Bytes),
    Stream(ByteStream),
}

impl Produced {
    /// Materialize the content in memory.
    pub async fn into_bytes(self) -> io::Result<Bytes> {
        match self {
            Self::Bytes(bytes) => Ok(bytes),
            Self::Stream(stream) => stream::collect(stream).await,
        }
    }
}

impl From<Bytes> for Produced {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<ByteStream> for Produced {
    fn from(stream: ByteStream) -> Self {
        Self::Stream(stream)
    }
}

impl From<String> for Produced {
    fn from(text: String) -> Self {
        Self::Bytes(Bytes::from(text))
    }
}

impl From<&'static str> for Produced {
    fn from(text: &'static str) -> Self {
        Self::Bytes(Bytes::from_static(text.as_bytes()))
    }
}

/// Outcome of [`Pipeline::prepare_response`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prepared {
    Found { body: Bytes, headers: Headers },
    NotFound,
}

impl Prepared {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    pub fn headers(&self) -> Option<&Headers> {
        match self {
            Self::Found { headers, .. } => Some(headers),
            Self::NotFound => None,
        }
    }

    /// The entity tag, if one was computed.
    pub fn etag(&self) -> Option<&str> {
        self.headers()?.get(ETAG).map(String::as_str)
    }
}

impl From<CacheEntry> for Prepared {
    fn from(entry: CacheEntry) -> Self {
        match entry.body {
            Some(body) if !entry.metadata.notfound => Self::Found {
                body,
                headers: entry.metadata.headers,
            },
            _ => Self::NotFound,
        }
    }
}

/// Result shared with coalesced callers; errors travel as their message.
type Shared = Result<Prepared, String>;

// ============================================================================
// Pipeline
// ============================================================================

/// Cache-backed response preparation service.
pub struct Pipeline {
    config: PipelineConfig,
    store: Mutex<CacheStore>,
    flights: Flights<Shared>,
    resolver: Resolver,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, cache: &CacheConfig, resolver: Resolver) -> Self {
        Self {
            config,
            store: Mutex::new(CacheStore::new(cache.max_bytes, cache.max_age())),
            flights: Flights::new(),
            resolver,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            config.pipeline.clone(),
            &config.cache,
            Resolver::from_config(config),
        )
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Drop every cached response.
    pub fn clear_cache(&self) {
        self.store.lock().clear();
    }

    /// Number of cached entries, negative entries included.
    pub fn cached_len(&self) -> usize {
        self.store.lock().len()
    }

    /// Return the processed response for `key`, producing it on a miss.
    ///
    /// `producer` returns `Ok(None)` when the resource does not exist. Its
    /// errors are returned unchanged to the caller that ran it; callers that
    /// were waiting on the same key get [`PipelineError::Coalesced`].
    pub async fn prepare_response<F, Fut>(
        &self,
        key: &str,
        opts: &ResponseOptions,
        producer: F,
    ) -> Result<Prepared, PipelineError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = io::Result<Option<Produced>>>,
    {
        if !self.config.enable_server_cache {
            return self.prepare_uncached(key, opts, producer).await;
        }

        let leader = loop {
            if let Some(hit) = self.lookup(key) {
                return Ok(hit);
            }
            match self.flights.join(key) {
                Flight::Leader(leader) => break leader,
                Flight::Follower(rx) => match flight::wait(rx).await {
                    Some(Ok(prepared)) => return Ok(prepared),
                    Some(Err(message)) => {
                        return Err(PipelineError::Coalesced {
                            key: key.to_string(),
                            message,
                        });
                    }
                    // leader abandoned; try again
                    None => continue,
                },
            }
        };

        // a previous leader may have stored the entry between lookup and join
        if let Some(hit) = self.lookup(key) {
            leader.complete(Ok(hit.clone()));
            return Ok(hit);
        }

        let result = self.prepare_cached(key, opts, producer).await;
        leader.complete(match &result {
            Ok(prepared) => Ok(prepared.clone()),
            Err(err) => Err(err.to_string()),
        });
        result
    }

    fn lookup(&self, key: &str) -> Option<Prepared> {
        let entry = self.store.lock().get(key)?;
        debug!("cache"; "hit {}", key);
        Some(Prepared::from(entry))
    }

    async fn prepare_cached<F, Fut>(
        &self,
        key: &str,
        opts: &ResponseOptions,
        producer: F,
    ) -> Result<Prepared, PipelineError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = io::Result<Option<Produced>>>,
    {
        let mut headers = headers::cache_headers(
            self.config.cache_max_age_header,
            opts.header_content_type(),
            SystemTime::now(),
        );

        let Some(body) = self.produce(producer).await? else {
            debug!("cache"; "notfound {}", key);
            self.store.lock().set(key, CacheEntry::not_found(headers));
            return Ok(Prepared::NotFound);
        };

        let body = self.transform(key, body, opts, &mut headers).await;
        headers.insert(LAST_MODIFIED.into(), httpdate::fmt_http_date(SystemTime::now()));

        self.store
            .lock()
            .set(key, CacheEntry::found(headers.clone(), body.clone()));
        debug!("cache"; "stored {} ({} bytes)", key, body.len());

        Ok(Prepared::Found { body, headers })
    }

    async fn prepare_uncached<F, Fut>(
        &self,
        key: &str,
        opts: &ResponseOptions,
        producer: F,
    ) -> Result<Prepared, PipelineError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = io::Result<Option<Produced>>>,
    {
        let Some(body) = self.produce(producer).await? else {
            return Ok(Prepared::NotFound);
        };

        let mut headers = Headers::new();
        headers.insert(CONTENT_TYPE.into(), opts.header_content_type().into());
        let body = self.transform(key, body, opts, &mut headers).await;
        Ok(Prepared::Found { body, headers })
    }

    /// Run the producer and read its output, bounded by the configured timeout.
    async fn produce<F, Fut>(&self, producer: F) -> Result<Option<Bytes>, PipelineError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = io::Result<Option<Produced>>>,
    {
        let run = async {
            match producer().await? {
                Some(produced) => produced.into_bytes().await.map(Some),
                None => Ok(None),
            }
        };

        match self.config.producer_timeout() {
            Some(limit) => tokio::time::timeout(limit, run)
                .await
                .map_err(|_| PipelineError::Timeout(limit))?
                .map_err(PipelineError::from),
            None => run.await.map_err(PipelineError::from),
        }
    }

    /// Apply the transform chain. Transform failures keep the previous body.
    async fn transform(
        &self,
        key: &str,
        body: Bytes,
        opts: &ResponseOptions,
        headers: &mut Headers,
    ) -> Bytes {
        let mime_type = opts.mime_type.as_str();
        let mut body = body;

        if mime::is_textual(mime_type) {
            match std::str::from_utf8(&body) {
                Ok(text) => {
                    let text = self.transform_text(key, text, opts, headers).await;
                    body = Bytes::from(text);
                }
                Err(_) => log!("warning"; "{} is not valid utf-8, serving as is", key),
            }
        }

        if self.config.enable_gzip && mime::is_compressible(mime_type) {
            match compress::gzip(&body) {
                Ok(compressed) => {
                    body = Bytes::from(compressed);
                    headers.insert(CONTENT_ENCODING.into(), "gzip".into());
                }
                Err(e) => log!("warning"; "gzip failed for {}: {}", key, e),
            }
        }

        headers.insert(ETAG.into(), etag::weak_etag(&body));
        body
    }

    async fn transform_text(
        &self,
        key: &str,
        text: &str,
        opts: &ResponseOptions,
        headers: &mut Headers,
    ) -> String {
        let mime_type = opts.mime_type.as_str();
        let mut text = text.to_string();

        if mime::is_rewritable(mime_type) {
            if !opts.deny_path_replace {
                let kind = if mime_type == types::HTML {
                    SourceKind::Html
                } else {
                    SourceKind::Script
                };
                let resolve = ResolveOptions {
                    variant: opts.custom.variant,
                };
                text = self.resolver.rewrite(&text, kind, resolve).await;
            }
            if opts.content_type.is_none() {
                headers.insert(CONTENT_TYPE.into(), mime::canonical(mime_type).into());
            }
        }

        let minify_allowed = opts.minify != MinifyPolicy::Deny;
        if self.config.enable_minify && minify_allowed && mime::is_script(mime_type) {
            match minify::minify_script(&text) {
                Some(minified) => text = minified,
                None => log!("minify"; "{} failed to parse, serving unminified", key),
            }
        }
        if self.config.minify_css && minify_allowed && mime_type == types::CSS {
            match minify::minify_css(&text) {
                Some(minified) => text = minified,
                None => log!("minify"; "{} failed to parse, serving unminified", key),
            }
        }

        text
    }
}

// ============================================================================
// tests
// ============================================================================
