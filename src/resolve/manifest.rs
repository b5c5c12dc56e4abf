//! `package.json` lookup.

use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// The entry-point fields of a package manifest.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PackageManifest {
    pub module: Option<String>,
    #[serde(rename = "jsnext:main")]
    pub jsnext_main: Option<String>,
    pub main: Option<String>,
}

impl PackageManifest {
    /// Preferred browser entry: `module`, then `jsnext:main`, then `main`.
    pub fn entry(&self) -> Option<&str> {
        [&self.module, &self.jsnext_main, &self.main]
            .into_iter()
            .filter_map(|field| field.as_deref())
            .find(|file| !file.is_empty())
    }
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read {0}")]
    Io(PathBuf, #[source] io::Error),

    #[error("invalid manifest {0}")]
    Json(PathBuf, #[source] serde_json::Error),
}

/// Read `<modules_dir>/<package>/package.json`.
pub async fn read_manifest(
    modules_dir: &Path,
    package: &str,
) -> Result<PackageManifest, ManifestError> {
    let path = modules_dir.join(package).join("package.json");
    let content = tokio::fs::read(&path)
        .await
        .map_err(|e| ManifestError::Io(path.clone(), e))?;
    serde_json::from_slice(&content).map_err(|e| ManifestError::Json(path, e))
}
