use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::AppConfig;

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config.toml: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Pick the data directory: an explicit flag, then `LB_HOME`, then
/// `$HOME/.laneboard`.
pub fn resolve_data_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }
    if let Ok(dir) = std::env::var("LB_HOME")
        && !dir.is_empty()
    {
        return PathBuf::from(dir);
    }
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".laneboard")
}

/// Read config.toml from the data directory. A missing file yields defaults.
pub fn read_config(data_dir: &Path) -> Result<AppConfig, ConfigError> {
    let path = data_dir.join("config.toml");
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(AppConfig::default()),
        Err(e) => return Err(ConfigError::ReadError { path, source: e }),
    };
    Ok(toml::from_str(&text)?)
}

/// Where the remote store lives, if configured. Relative paths are taken
/// from the data directory.
pub fn remote_root(data_dir: &Path, config: &AppConfig) -> Option<PathBuf> {
    let dir = config.sync.remote_dir.as_deref()?;
    let path = Path::new(dir);
    Some(if path.is_absolute() {
        path.to_path_buf()
    } else {
        data_dir.join(path)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = read_config(dir.path()).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.sync.debounce_ms, 500);
        assert_eq!(config.storage.cache_file, "dashboard.json");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("config.toml"),
            "[sync]\nremote_dir = \"cloud\"\n\n[storage]\nwarn_kb = 1\n",
        )
        .unwrap();
        let config = read_config(dir.path()).unwrap();
        assert_eq!(config.sync.debounce_ms, 500);
        assert_eq!(config.storage.warn_kb, 1);
        assert_eq!(config.storage.capacity_kb, 5120);
        assert_eq!(
            remote_root(dir.path(), &config),
            Some(dir.path().join("cloud"))
        );
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.toml"), "[sync\n").unwrap();
        assert!(matches!(
            read_config(dir.path()),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn explicit_dir_wins() {
        let p = Path::new("/tmp/somewhere");
        assert_eq!(resolve_data_dir(Some(p)), p.to_path_buf());
    }

    #[test]
    fn no_remote_when_unset() {
        let dir = TempDir::new().unwrap();
        assert_eq!(remote_root(dir.path(), &AppConfig::default()), None);
    }
}
