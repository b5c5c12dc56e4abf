//! Server configuration management for `frontserve.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── cache      # [cache]
//! │   ├── pipeline   # [pipeline]
//! │   ├── resolver   # [resolver], [[routes]]
//! │   └── serve      # [serve]
//! ├── error          # ConfigError
//! └── mod.rs         # ServerConfig (this file)
//! ```
//!
//! Every section is optional; a missing file yields the defaults.

mod error;
pub mod section;
mod util;

pub use error::ConfigError;
pub use section::{
    CacheConfig, ElementsConfig, LibConfig, PipelineConfig, ResolverConfig, RouteOverrideConfig,
    ServeConfig, UrlCacheStringMode,
};

use util::{anchor, find_config_file};

use crate::{
    cli::{Cli, Commands},
    log,
};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing frontserve.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Response cache bounds
    #[serde(default)]
    pub cache: CacheConfig,

    /// Transform chain toggles
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Module specifier resolution
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Per-package rewrite overrides
    #[serde(default)]
    pub routes: Vec<RouteOverrideConfig>,

    /// HTTP server settings
    #[serde(default)]
    pub serve: ServeConfig,
}

impl ServerConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd for the config file. The project root is the
    /// config file's parent directory, or cwd when no file exists.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let (mut config, config_path) = match find_config_file(&cli.config) {
            Some(path) => (Self::from_path(&path)?, path),
            None => {
                log!("warning"; "config file '{}' not found, using defaults", cli.config.display());
                (Self::default(), cwd.join(&cli.config))
            }
        };

        let root = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or(cwd);

        config.config_path = config_path;
        config.root = root.clone();
        config.normalize_paths(&root);
        config.apply_command_options(cli);
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            log!("warning"; "unknown fields in {}, ignoring:", path.display());
            for field in &ignored {
                eprintln!("- {}", field);
            }
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::from)?;
        Ok((config, ignored))
    }

    /// Anchor every configured path at the project root.
    fn normalize_paths(&mut self, root: &Path) {
        anchor(root, &mut self.resolver.modules_dir);
        anchor(root, &mut self.resolver.build_id_file);
        anchor(root, &mut self.serve.static_dir);
        for file in &mut self.serve.init_files {
            anchor(root, file);
        }
        for lib in &mut self.serve.libs {
            if let Some(path) = lib.path.as_mut() {
                anchor(root, path);
            }
        }
        for elements in &mut self.serve.elements {
            anchor(root, &mut elements.dir);
            if let Some(theme) = elements.theme_dir.as_mut() {
                anchor(root, theme);
            }
        }
    }

    /// Apply command-line overrides.
    fn apply_command_options(&mut self, cli: &Cli) {
        let Commands::Serve {
            interface,
            port,
            cache,
            minify,
            gzip,
        } = &cli.command;

        Self::update_option(&mut self.serve.interface, interface.as_ref());
        Self::update_option(&mut self.serve.port, port.as_ref());
        Self::update_option(&mut self.pipeline.enable_server_cache, cache.as_ref());
        Self::update_option(&mut self.pipeline.enable_minify, minify.as_ref());
        Self::update_option(&mut self.pipeline.enable_gzip, gzip.as_ref());
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Validate configuration.
    ///
    /// Collects all validation errors and returns them at once.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.cache.max_bytes == 0 {
            errors.push("[cache.max_bytes] must be greater than 0".to_string());
        }
        if self.serve.workers == 0 {
            errors.push("[serve.workers] must be greater than 0".to_string());
        }
        for (i, lib) in self.serve.libs.iter().enumerate() {
            if lib.route.trim_matches('/').is_empty() {
                errors.push(format!("[serve.libs.{i}.route] must not be empty"));
            }
            if lib.single_file && lib.path.is_none() {
                errors.push(format!(
                    "[serve.libs.{i}] single_file requires an explicit `path`"
                ));
            }
        }
        for (i, elements) in self.serve.elements.iter().enumerate() {
            if elements.route.trim_matches('/').is_empty() {
                errors.push(format!("[serve.elements.{i}.route] must not be empty"));
            }
        }
        for (i, route) in self.routes.iter().enumerate() {
            if route.package.is_empty() {
                errors.push(format!("[routes.{i}.package] must not be empty"));
            }
        }

        if !errors.is_empty() {
            bail!(ConfigError::Validation(errors));
        }
        Ok(())
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        &self.root
    }

    /// Join a path with the root directory.
    pub fn root_join(&self, path: impl AsRef<Path>) -> PathBuf {
        self.root.join(path)
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> ServerConfig {
    let (parsed, ignored) = ServerConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_invalid_toml() {
        let result = ServerConfig::from_str("[cache\nmax_bytes = 1");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[cache]\nmax_bytes = 10\n[unknown_section]\nfield = \"value\"";
        let (config, ignored) = ServerConfig::parse_with_ignored(content).unwrap();

        assert_eq!(config.cache.max_bytes, 10);
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
    }

    #[test]
    fn test_normalize_paths() {
        let mut config = test_parse_config(
            "[serve]\ninit_files = [\"a/init.js\", \"/abs/init.js\"]\n\n[[serve.libs]]\nroute = \"app\"\npath = \"src/app\"",
        );
        config.normalize_paths(Path::new("/srv"));

        assert_eq!(config.resolver.modules_dir, PathBuf::from("/srv/node_modules"));
        assert_eq!(config.serve.static_dir, PathBuf::from("/srv/static"));
        assert_eq!(
            config.serve.init_files,
            vec![PathBuf::from("/srv/a/init.js"), PathBuf::from("/abs/init.js")]
        );
        assert_eq!(config.serve.libs[0].path, Some(PathBuf::from("/srv/src/app")));
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let config = test_parse_config(
            "[cache]\nmax_bytes = 0\n\n[[serve.libs]]\nroute = \"/\"\n\n[[routes]]\nreplace = \"/x.js\"",
        );
        let err = config.validate().unwrap_err();
        let Some(ConfigError::Validation(errors)) = err.downcast_ref::<ConfigError>() else {
            panic!("expected validation error, got {err}");
        };
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_command_options_override_file() {
        use clap::Parser;

        let mut config = test_parse_config(
            "[serve]\nport = 8080\n\n[pipeline]\nenable_minify = true\nenable_gzip = true",
        );
        let cli = Cli::parse_from(["frontserve", "serve", "-p", "9000", "--minify", "false"]);
        config.apply_command_options(&cli);

        assert_eq!(config.serve.port, 9000);
        assert!(!config.pipeline.enable_minify);
        assert!(config.pipeline.enable_gzip);
        assert!(config.pipeline.enable_server_cache);
    }

    #[test]
    fn test_update_option() {
        let mut port = 5180u16;
        ServerConfig::update_option(&mut port, Some(&8080));
        assert_eq!(port, 8080);
        ServerConfig::update_option(&mut port, None);
        assert_eq!(port, 8080);
    }
}
