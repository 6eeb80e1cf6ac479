// src/config/loader.rs

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{CONFIG_FILE_NAME, ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; use [`load_and_validate`] to
/// also check paths and durations.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run validation.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Load `<root>/sitewatch.toml`, falling back to defaults when it is absent.
pub fn load_for_root(root: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = config_path(root);
    match load_and_validate(&path) {
        Ok(cfg) => {
            debug!(path = %path.display(), "loaded site config");
            Ok(cfg)
        }
        Err(crate::errors::SiteError::IoError(e)) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no site config; using defaults");
            ConfigFile::try_from(RawConfigFile::default())
        }
        Err(e) => Err(e),
    }
}

pub fn config_path(root: impl AsRef<Path>) -> PathBuf {
    root.as_ref().join(CONFIG_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let cfg = load_for_root(dir.path())?;
        assert_eq!(cfg.output_dir, "out");
        Ok(())
    }

    #[test]
    fn present_file_is_parsed_and_validated() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(
            config_path(dir.path()),
            "[build]\ncmd = \"make site\"\n[watch]\npoll_interval = \"1s\"\n",
        )?;
        let cfg = load_for_root(dir.path())?;
        assert_eq!(cfg.build_cmd.as_deref(), Some("make site"));
        assert_eq!(cfg.poll_interval, std::time::Duration::from_secs(1));
        Ok(())
    }

    #[test]
    fn malformed_file_is_an_error_not_a_default() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(config_path(dir.path()), "[watch\n")?;
        assert!(matches!(
            load_for_root(dir.path()),
            Err(crate::errors::SiteError::TomlError(_))
        ));
        Ok(())
    }
}
