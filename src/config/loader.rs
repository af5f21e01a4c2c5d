//! Loading of the update config and the version to promote

use super::UpdateConfig;
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default config location relative to the working directory
pub const DEFAULT_CONFIG_FILE: &str = ".jx/updatebot.yaml";

/// Default version file relative to the working directory
pub const DEFAULT_VERSION_FILE: &str = "VERSION";

/// Resolve the config path: explicit path, else `<dir>/.jx/updatebot.yaml`
pub fn config_path(dir: &Path, explicit: Option<&Path>) -> PathBuf {
    explicit.map_or_else(|| dir.join(DEFAULT_CONFIG_FILE), Path::to_path_buf)
}

/// Load the update config.
///
/// A missing file is not an error: it is logged and an empty config is
/// returned, so the run creates no pull requests.
pub fn load_update_config(path: &Path) -> Result<UpdateConfig> {
    if !path.exists() {
        warn!(
            path = %path.display(),
            "config file does not exist so cannot create any updatebot Pull Requests"
        );
        return Ok(UpdateConfig::default());
    }

    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
    parse_update_config(&content)
        .map_err(|e| Error::Config(format!("failed to load config file {}: {e}", path.display())))
}

/// Parse an update config from YAML
pub fn parse_update_config(yaml: &str) -> Result<UpdateConfig> {
    Ok(serde_yaml::from_str(yaml)?)
}

/// Where the version to promote comes from
#[derive(Debug, Clone, Default)]
pub struct VersionSource<'a> {
    /// `--version`
    pub explicit: Option<&'a str>,
    /// `--version-file`; defaults to `<dir>/VERSION`
    pub version_file: Option<&'a Path>,
    /// Value of `$VERSION`
    pub env: Option<&'a str>,
    /// `--no-version`
    pub no_version: bool,
}

/// Resolve the version: explicit > version file > `$VERSION` > error.
///
/// Returns an empty string when nothing is found and `no_version` is set.
pub fn resolve_version(dir: &Path, source: &VersionSource<'_>) -> Result<String> {
    if let Some(v) = source.explicit.map(str::trim).filter(|v| !v.is_empty()) {
        return Ok(v.to_string());
    }

    let version_file = source
        .version_file
        .map_or_else(|| dir.join(DEFAULT_VERSION_FILE), Path::to_path_buf);
    if version_file.is_file() {
        let data = fs::read_to_string(&version_file).map_err(|e| {
            Error::Config(format!(
                "failed to read version file {}: {e}",
                version_file.display()
            ))
        })?;
        let version = data.trim();
        if !version.is_empty() {
            return Ok(version.to_string());
        }
    } else {
        info!(path = %version_file.display(), "version file does not exist");
    }

    if let Some(v) = source.env.map(str::trim).filter(|v| !v.is_empty()) {
        return Ok(v.to_string());
    }

    if source.no_version {
        Ok(String::new())
    } else {
        Err(Error::MissingOption("version".to_string()))
    }
}
