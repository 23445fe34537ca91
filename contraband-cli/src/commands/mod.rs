//! Command handlers -- one module per subcommand

pub mod config;
pub mod scan;

use std::fmt;
use std::path::{Path, PathBuf};

use contraband_core::config::ContrabandConfig;

use crate::error::CliError;

/// Default configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "contraband.toml";

/// Where the effective configuration comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// A configuration file.
    File(PathBuf),
    /// Built-in defaults plus environment overrides.
    Defaults,
}

impl ConfigSource {
    /// Resolve the `--config` flag.
    ///
    /// An explicit path is always used (and must exist). Without one, the
    /// default file is used only if it exists in `cwd`.
    pub fn resolve(explicit: Option<&Path>, cwd: &Path) -> Self {
        match explicit {
            Some(path) => Self::File(path.to_path_buf()),
            None => {
                let candidate = cwd.join(DEFAULT_CONFIG_FILE);
                if candidate.is_file() {
                    Self::File(candidate)
                } else {
                    Self::Defaults
                }
            }
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Defaults => write!(f, "(defaults)"),
        }
    }
}

/// Load, override from the environment and validate the configuration.
pub async fn load_config(source: &ConfigSource) -> Result<ContrabandConfig, CliError> {
    match source {
        ConfigSource::File(path) => Ok(ContrabandConfig::load(path).await?),
        ConfigSource::Defaults => {
            let mut config = ContrabandConfig::default();
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_explicit_path() {
        let source = ConfigSource::resolve(Some(Path::new("/etc/contraband.toml")), Path::new("."));
        assert_eq!(source, ConfigSource::File(PathBuf::from("/etc/contraband.toml")));
    }

    #[test]
    fn test_resolve_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(ConfigSource::resolve(None, dir.path()), ConfigSource::Defaults);

        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "").expect("write");
        assert_eq!(
            ConfigSource::resolve(None, dir.path()),
            ConfigSource::File(dir.path().join(DEFAULT_CONFIG_FILE))
        );
    }

    #[tokio::test]
    async fn test_load_missing_explicit_file_is_config_error() {
        let source = ConfigSource::File(PathBuf::from("/nonexistent/contraband.toml"));
        let err = load_config(&source).await.expect_err("missing file");
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test]
    async fn test_load_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("contraband.toml");
        std::fs::write(&path, "[pool]\nqueue_capacity = 8\n").expect("write");
        let config = load_config(&ConfigSource::File(path)).await.expect("load");
        assert_eq!(config.pool.queue_capacity, 8);
    }
}
