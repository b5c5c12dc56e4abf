//! Request path routing.
//!
//! ```text
//! /                      → <static_dir>/<index>
//! /@front/init.js        → init files, concatenated
//! /static/*              → <static_dir>/*
//! /<elements>/<name>.js  → element module (+ theme patch)
//! /<lib>/*               → library directory
//! ```

use std::path::{Path, PathBuf};

use super::path::{clean, sanitize};
use crate::config::{ElementsConfig, LibConfig, ServeConfig};

pub const INIT_PATH: &str = "/@front/init.js";
const STATIC_PREFIX: &str = "static";

/// A library directory (or file) mounted at `/<prefix>`.
#[derive(Debug, Clone)]
pub struct LibRoute {
    pub prefix: String,
    pub root: PathBuf,
    pub config: LibConfig,
}

impl LibRoute {
    /// Filesystem path for a cleaned relative path.
    pub fn file(&self, rel: &str) -> PathBuf {
        if self.config.single_file {
            self.root.clone()
        } else {
            sanitize(&self.root, rel)
        }
    }
}

/// A directory of custom elements mounted at `/<prefix>`.
#[derive(Debug, Clone)]
pub struct ElementRoute {
    pub prefix: String,
    pub dir: PathBuf,
    pub theme_dir: Option<PathBuf>,
}

impl ElementRoute {
    pub fn module(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.js"))
    }

    pub fn theme(&self, name: &str) -> Option<PathBuf> {
        Some(self.theme_dir.as_ref()?.join(format!("{name}.css")))
    }
}

/// A matched request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route<'a> {
    Index,
    Init,
    Static { rel: String },
    Lib { lib: &'a LibRoute, rel: String },
    Element { route: &'a ElementRoute, name: String },
}

// Mounted routes are identified by their prefix.
impl PartialEq for LibRoute {
    fn eq(&self, other: &Self) -> bool {
        self.prefix == other.prefix
    }
}
impl Eq for LibRoute {}

impl PartialEq for ElementRoute {
    fn eq(&self, other: &Self) -> bool {
        self.prefix == other.prefix
    }
}
impl Eq for ElementRoute {}

/// Route table built from `[serve]`.
#[derive(Debug, Clone)]
pub struct Router {
    libs: Vec<LibRoute>,
    elements: Vec<ElementRoute>,
}

impl Router {
    pub fn new(serve: &ServeConfig, modules_dir: &Path) -> Self {
        let mut libs: Vec<LibRoute> = serve
            .libs
            .iter()
            .map(|lib| lib_route(lib, modules_dir))
            .collect();
        // longest prefix wins
        libs.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));

        let elements = serve.elements.iter().map(element_route).collect();
        Self { libs, elements }
    }

    pub fn route(&self, path: &str) -> Option<Route<'_>> {
        if path.is_empty() || path == "/" {
            return Some(Route::Index);
        }
        if path == INIT_PATH {
            return Some(Route::Init);
        }
        if let Some(rest) = under(path, STATIC_PREFIX) {
            return Some(Route::Static { rel: clean(rest) });
        }

        for route in &self.elements {
            if let Some(name) = under(path, &route.prefix).and_then(element_name) {
                return Some(Route::Element {
                    route,
                    name: name.to_string(),
                });
            }
        }

        for lib in &self.libs {
            if lib.config.single_file {
                if path.trim_start_matches('/') == lib.prefix {
                    return Some(Route::Lib {
                        lib,
                        rel: String::new(),
                    });
                }
                continue;
            }

            let Some(rest) = under(path, &lib.prefix) else {
                continue;
            };
            let rel = clean(rest);
            if rel.eq_ignore_ascii_case("package.json") && !lib.config.allow_package_json {
                return None;
            }
            return Some(Route::Lib { lib, rel });
        }

        None
    }
}

fn lib_route(lib: &LibConfig, modules_dir: &Path) -> LibRoute {
    let prefix = lib.route.trim_matches('/').to_string();
    let root = lib
        .path
        .clone()
        .unwrap_or_else(|| modules_dir.join(&prefix));
    LibRoute {
        prefix,
        root,
        config: lib.clone(),
    }
}

fn element_route(elements: &ElementsConfig) -> ElementRoute {
    ElementRoute {
        prefix: elements.route.trim_matches('/').to_string(),
        dir: elements.dir.clone(),
        theme_dir: elements.theme_dir.clone(),
    }
}

/// Remainder of `path` below `/<prefix>/`; `""` for `/<prefix>` itself.
fn under<'p>(path: &'p str, prefix: &str) -> Option<&'p str> {
    let rest = path.strip_prefix('/')?.strip_prefix(prefix)?;
    if rest.is_empty() {
        return Some(rest);
    }
    rest.strip_prefix('/')
}

/// `<name>` of a single-segment `<name>.js`.
fn element_name(rest: &str) -> Option<&str> {
    let name = rest.strip_suffix(".js")?;
    (!name.is_empty() && !name.contains('/') && name != "." && name != "..").then_some(name)
}
