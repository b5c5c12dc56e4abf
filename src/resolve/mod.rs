//! Module specifier resolution.
//!
//! Turns specifiers found in served scripts and HTML into absolute URLs the
//! browser can fetch:
//!
//! ```text
//! lit              → /lit/index.js          (package.json entry)
//! foo/bar          → /foo/bar.js
//! foo/nf-widget    → /foo/nf-widget         (extension-exempt)
//! ./local          → ./local.js
//! ```
//!
//! Resolution never fails. A missing or broken manifest falls back to the
//! package path itself.

mod manifest;
mod rewrite;
mod specifier;
mod version;

pub use manifest::{ManifestError, PackageManifest, read_manifest};
pub use rewrite::{SourceKind, find_specifiers, splice};
pub use specifier::{Specifier, is_external};
pub use version::{CacheString, load_build_id};

use std::path::PathBuf;

use rustc_hash::FxHashMap;

use crate::config::{ServerConfig, UrlCacheStringMode};
use crate::debug;

/// Per-package rewrite override.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteOverride {
    /// Substitutes the whole specifier verbatim.
    pub replace: Option<String>,
    /// Replaces the package prefix for non-zero variants.
    pub legacy_route: Option<String>,
}

/// Request parameters that affect resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Client variant discriminator; non-zero selects legacy routes.
    pub variant: u32,
}

/// Specifier resolver.
#[derive(Debug, Clone)]
pub struct Resolver {
    modules_dir: PathBuf,
    exempt_prefixes: Vec<String>,
    cache_string: Option<CacheString>,
    overrides: FxHashMap<String, RouteOverride>,
}

impl Resolver {
    pub fn new(modules_dir: impl Into<PathBuf>) -> Self {
        Self {
            modules_dir: modules_dir.into(),
            exempt_prefixes: vec!["nf-".into()],
            cache_string: None,
            overrides: FxHashMap::default(),
        }
    }

    /// Build from loaded configuration, reading the build id if versioning is on.
    pub fn from_config(config: &ServerConfig) -> Self {
        let mut resolver = Self::new(&config.resolver.modules_dir)
            .with_exempt_prefixes(config.pipeline.extension_exempt_prefixes.clone());

        if config.pipeline.url_cache_string_mode == UrlCacheStringMode::Simple {
            let build_id = load_build_id(&config.resolver.build_id_file);
            resolver = resolver.with_cache_string(CacheString::new(build_id));
        }

        for route in &config.routes {
            resolver = resolver.with_override(
                route.package.clone(),
                RouteOverride {
                    replace: route.replace.clone(),
                    legacy_route: route.legacy_route.clone(),
                },
            );
        }
        resolver
    }

    pub fn with_exempt_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.exempt_prefixes = prefixes;
        self
    }

    pub fn with_cache_string(mut self, cache_string: CacheString) -> Self {
        self.cache_string = Some(cache_string);
        self
    }

    pub fn with_override(mut self, package: impl Into<String>, route: RouteOverride) -> Self {
        self.overrides.insert(package.into(), route);
        self
    }

    /// Rewrite one specifier into a fetchable URL.
    pub async fn resolve(&self, specifier: &str, opts: ResolveOptions) -> String {
        if is_external(specifier) {
            return specifier.to_string();
        }

        let parsed = Specifier::parse(specifier);
        let path = match (parsed.package, parsed.remainder) {
            (Some(package), remainder) => {
                if let Some(route) = self.overrides.get(package) {
                    if let Some(replace) = &route.replace {
                        return replace.clone();
                    }
                    if opts.variant > 0
                        && let Some(legacy) = &route.legacy_route
                    {
                        let joined = join_route(legacy, remainder.unwrap_or_default());
                        return self.finish(anchor(joined));
                    }
                }
                match remainder {
                    Some(rest) => format!("/{package}/{rest}"),
                    None => self.package_entry(package).await,
                }
            }
            (None, Some(rest)) => anchor(rest.to_string()),
            (None, None) => return specifier.to_string(),
        };

        self.finish(path)
    }

    /// Rewrite every specifier in `text`.
    pub async fn rewrite(&self, text: &str, kind: SourceKind, opts: ResolveOptions) -> String {
        let ranges = find_specifiers(text, kind);
        if ranges.is_empty() {
            return text.to_string();
        }

        let mut resolved: FxHashMap<&str, String> = FxHashMap::default();
        let mut edits = Vec::with_capacity(ranges.len());
        for range in ranges {
            let specifier = &text[range.clone()];
            let url = match resolved.get(specifier) {
                Some(url) => url.clone(),
                None => {
                    let url = self.resolve(specifier, opts).await;
                    resolved.insert(specifier, url.clone());
                    url
                }
            };
            edits.push((range, url));
        }
        splice(text, &edits)
    }

    /// `/<package>/<entry>` from the manifest, or `/<package>` when it can't be read.
    async fn package_entry(&self, package: &str) -> String {
        match read_manifest(&self.modules_dir, package).await {
            Ok(manifest) => match manifest.entry() {
                Some(entry) => join_route(&format!("/{package}"), entry),
                None => {
                    debug!("resolve"; "{} has no entry point", package);
                    format!("/{package}")
                }
            },
            Err(err) => {
                debug!("resolve"; "{}: {}", package, err);
                format!("/{package}")
            }
        }
    }

    /// Append the default extension and the version query.
    fn finish(&self, mut path: String) -> String {
        if self.needs_extension(&path) {
            path.push_str(".js");
        }
        match &self.cache_string {
            Some(cs) => cs.apply(&path),
            None => path,
        }
    }

    fn needs_extension(&self, path: &str) -> bool {
        let name = path.rsplit('/').next().unwrap_or(path);
        if name.is_empty() || name == "." || name == ".." {
            return false;
        }
        if self.exempt_prefixes.iter().any(|p| name.starts_with(p.as_str())) {
            return false;
        }
        !has_extension(name)
    }
}

/// `name.ext` with a non-empty extension and a non-empty stem.
fn has_extension(name: &str) -> bool {
    matches!(name.rfind('.'), Some(dot) if dot > 0 && dot + 1 < name.len())
}

/// Prefix `/` unless the path is already relative or absolute.
fn anchor(path: String) -> String {
    if path.starts_with('.') || path.starts_with('/') {
        path
    } else {
        format!("/{path}")
    }
}

fn join_route(base: &str, rest: &str) -> String {
    let rest = rest.trim_start_matches("./").trim_start_matches('/');
    if rest.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base.trim_end_matches('/'), rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn resolver(dir: &Path) -> Resolver {
        Resolver::new(dir)
    }

    fn write_manifest(dir: &Path, package: &str, json: &str) {
        let pkg = dir.join(package);
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join("package.json"), json).unwrap();
    }

    async fn resolve(r: &Resolver, specifier: &str) -> String {
        r.resolve(specifier, ResolveOptions::default()).await
    }

    #[tokio::test]
    async fn test_package_with_remainder() {
        let dir = TempDir::new().unwrap();
        let r = resolver(dir.path());
        assert_eq!(resolve(&r, "foo/bar").await, "/foo/bar.js");
        assert_eq!(resolve(&r, "foo/bar/baz.mjs").await, "/foo/bar/baz.mjs");
    }

    #[tokio::test]
    async fn test_extension_exempt() {
        let dir = TempDir::new().unwrap();
        let r = resolver(dir.path());
        assert_eq!(resolve(&r, "foo/nf-widget").await, "/foo/nf-widget");
        assert_eq!(resolve(&r, "./nf-local").await, "./nf-local");
    }

    #[tokio::test]
    async fn test_relative_and_absolute() {
        let dir = TempDir::new().unwrap();
        let r = resolver(dir.path());
        assert_eq!(resolve(&r, "./local").await, "./local.js");
        assert_eq!(resolve(&r, "../up/x.js").await, "../up/x.js");
        assert_eq!(resolve(&r, "/abs/mod").await, "/abs/mod.js");
    }

    #[tokio::test]
    async fn test_manifest_entry() {
        let dir = TempDir::new().unwrap();
        write_manifest(dir.path(), "@scope/pkg", r#"{"module": "dist/es.js", "main": "dist/cjs.js"}"#);
        write_manifest(dir.path(), "legacy", r#"{"main": "./lib/index"}"#);

        let r = resolver(dir.path());
        assert_eq!(resolve(&r, "@scope/pkg").await, "/@scope/pkg/dist/es.js");
        assert_eq!(resolve(&r, "legacy").await, "/legacy/lib/index.js");
    }

    #[tokio::test]
    async fn test_manifest_failure_falls_back() {
        let dir = TempDir::new().unwrap();
        write_manifest(dir.path(), "broken", "{ nope");
        let r = resolver(dir.path());
        assert_eq!(resolve(&r, "missing").await, "/missing.js");
        assert_eq!(resolve(&r, "broken").await, "/broken.js");
    }

    #[tokio::test]
    async fn test_external_untouched() {
        let dir = TempDir::new().unwrap();
        let r = resolver(dir.path());
        assert_eq!(
            resolve(&r, "https://cdn.example.com/x").await,
            "https://cdn.example.com/x"
        );
    }

    #[tokio::test]
    async fn test_cache_string() {
        let dir = TempDir::new().unwrap();
        let r = resolver(dir.path()).with_cache_string(CacheString::new("b1"));
        assert_eq!(resolve(&r, "foo/bar").await, "/foo/bar.js?v=b1");
    }

    #[tokio::test]
    async fn test_custom_exempt_prefixes() {
        let dir = TempDir::new().unwrap();
        let r = resolver(dir.path()).with_exempt_prefixes(vec!["raw-".into()]);
        assert_eq!(resolve(&r, "foo/raw-x").await, "/foo/raw-x");
        assert_eq!(resolve(&r, "foo/nf-x").await, "/foo/nf-x.js");
    }

    #[tokio::test]
    async fn test_route_overrides() {
        let dir = TempDir::new().unwrap();
        let r = resolver(dir.path())
            .with_override(
                "polyfill",
                RouteOverride {
                    replace: Some("/vendor/polyfill.min.js".into()),
                    legacy_route: None,
                },
            )
            .with_override(
                "lit",
                RouteOverride {
                    replace: None,
                    legacy_route: Some("/lit-legacy".into()),
                },
            );

        assert_eq!(resolve(&r, "polyfill/anything").await, "/vendor/polyfill.min.js");
        assert_eq!(resolve(&r, "lit/decorators").await, "/lit/decorators.js");

        let legacy = ResolveOptions { variant: 1 };
        assert_eq!(
            r.resolve("lit/decorators", legacy).await,
            "/lit-legacy/decorators.js"
        );
        assert_eq!(r.resolve("lit", legacy).await, "/lit-legacy.js");
    }

    #[tokio::test]
    async fn test_rewrite_text() {
        let dir = TempDir::new().unwrap();
        write_manifest(dir.path(), "lit", r#"{"module": "index.js"}"#);
        let r = resolver(dir.path());

        let js = "import { html } from 'lit';\nimport './side';\nimport x from 'https://e.com/x.js';\n";
        let out = r.rewrite(js, SourceKind::Script, ResolveOptions::default()).await;
        assert_eq!(
            out,
            "import { html } from '/lit/index.js';\nimport './side.js';\nimport x from 'https://e.com/x.js';\n"
        );
    }

    #[tokio::test]
    async fn test_rewrite_html() {
        let dir = TempDir::new().unwrap();
        let r = resolver(dir.path());
        let html = r#"<script type="module" src="app/main"></script><p>import x from "y"</p>"#;
        let out = r.rewrite(html, SourceKind::Html, ResolveOptions::default()).await;
        assert_eq!(
            out,
            r#"<script type="module" src="/app/main.js"></script><p>import x from "/y.js"</p>"#
        );
    }

    #[test]
    fn test_has_extension() {
        assert!(has_extension("a.js"));
        assert!(!has_extension("a"));
        assert!(!has_extension(".hidden"));
        assert!(!has_extension("trailing."));
    }
}
