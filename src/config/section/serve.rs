//! `[serve]` section configuration.
//!
//! Contains HTTP server settings and the route table.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"     # Network interface (127.0.0.1 = localhost only)
//! port = 5180                 # HTTP port number
//! static_dir = "static"       # Served under /static/*
//! index = "_index.html"       # Served at /
//! init_files = ["components/init.js", "app/init.js"]
//!
//! [[serve.libs]]
//! route = "lit"               # GET /lit/* from node_modules/lit
//!
//! [[serve.libs]]
//! route = "app"
//! path = "src/app"
//! minify = "deny"
//!
//! [[serve.elements]]
//! route = "components"
//! dir = "src/components"      # <name>.js files
//! theme_dir = "theme/default" # optional <name>.css appended as a style patch
//! ```
//!
//! Use `interface = "0.0.0.0"` to make the server accessible from LAN.

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::pipeline::MinifyPolicy;

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    pub interface: IpAddr,

    /// HTTP port number.
    pub port: u16,

    /// Request worker threads.
    pub workers: usize,

    /// Directory served under `/static/*`.
    pub static_dir: PathBuf,

    /// Page served at `/`, relative to `static_dir`.
    pub index: PathBuf,

    /// Files concatenated, in order, into `/@front/init.js`.
    pub init_files: Vec<PathBuf>,

    /// Library directories.
    pub libs: Vec<LibConfig>,

    /// Custom element directories.
    pub elements: Vec<ElementsConfig>,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 5180,
            workers: 4,
            static_dir: PathBuf::from("static"),
            index: PathBuf::from("_index.html"),
            init_files: Vec::new(),
            libs: Vec::new(),
            elements: Vec::new(),
        }
    }
}

/// A directory of modules served under `/<route>/*`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LibConfig {
    /// URL prefix (without slashes).
    pub route: String,

    /// Directory on disk. Defaults to `<modules_dir>/<route>`.
    pub path: Option<PathBuf>,

    /// Serve `path` itself for `/<route>` instead of a directory.
    pub single_file: bool,

    /// Keep module specifiers as written.
    pub deny_path_replace: bool,

    /// Per-library minification policy.
    pub minify: MinifyPolicy,

    /// Expose the library's `package.json`.
    pub allow_package_json: bool,
}

/// A directory of custom element modules served under `/<route>/<name>.js`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementsConfig {
    /// URL prefix (without slashes).
    pub route: String,

    /// Directory with `<name>.js` element modules.
    pub dir: PathBuf,

    /// Directory with optional `<name>.css` theme sheets.
    pub theme_dir: Option<PathBuf>,
}
