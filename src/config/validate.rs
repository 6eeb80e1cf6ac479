// src/config/validate.rs

use std::path::{Component, Path};

use crate::config::duration::parse_duration;
use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, SiteError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = SiteError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_site(&raw)?;
        validate_build(&raw)?;
        let poll_interval = validate_poll_interval(&raw)?;
        let exclude = effective_exclude(&raw)?;

        Ok(ConfigFile::new_unchecked(
            raw.site,
            raw.build,
            poll_interval,
            raw.watch.mode,
            exclude,
        ))
    }
}

fn validate_site(cfg: &RawConfigFile) -> Result<()> {
    ensure_single_component("[site].output_dir", &cfg.site.output_dir)?;
    ensure_single_component("[site].cache_dir", &cfg.site.cache_dir)?;
    if cfg.site.output_dir == cfg.site.cache_dir {
        return Err(SiteError::ConfigError(format!(
            "[site].output_dir and [site].cache_dir must differ (both are '{}')",
            cfg.site.output_dir
        )));
    }
    Ok(())
}

fn validate_build(cfg: &RawConfigFile) -> Result<()> {
    if let Some(ref cmd) = cfg.build.cmd {
        if cmd.trim().is_empty() {
            return Err(SiteError::ConfigError(
                "[build].cmd must not be empty".to_string(),
            ));
        }
    }
    if let Some(ref theme) = cfg.build.theme {
        if theme.trim().is_empty() {
            return Err(SiteError::ConfigError(
                "[build].theme must not be empty".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_poll_interval(cfg: &RawConfigFile) -> Result<std::time::Duration> {
    let interval = parse_duration(&cfg.watch.poll_interval).map_err(|e| {
        SiteError::ConfigError(format!("[watch].poll_interval: {e}"))
    })?;
    if interval.is_zero() {
        return Err(SiteError::ConfigError(
            "[watch].poll_interval must be greater than zero".to_string(),
        ));
    }
    Ok(interval)
}

/// Exclusions only ever name root-level directories.
fn effective_exclude(cfg: &RawConfigFile) -> Result<Vec<String>> {
    match cfg.watch.exclude {
        Some(ref names) => {
            for name in names {
                ensure_single_component("[watch].exclude entry", name)?;
            }
            Ok(names.clone())
        }
        None => Ok(vec![cfg.site.output_dir.clone(), cfg.site.cache_dir.clone()]),
    }
}

fn ensure_single_component(field: &str, value: &str) -> Result<()> {
    let mut components = Path::new(value).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(SiteError::ConfigError(format!(
            "{field} must be a single directory name (got '{value}')"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WatchMode;
    use std::time::Duration;

    fn parse(toml_src: &str) -> Result<ConfigFile> {
        let raw: RawConfigFile = toml::from_str(toml_src)?;
        ConfigFile::try_from(raw)
    }

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = parse("").unwrap();
        assert_eq!(cfg.output_dir, "out");
        assert_eq!(cfg.cache_dir, ".sitewatch");
        assert_eq!(cfg.poll_interval, Duration::from_millis(500));
        assert_eq!(cfg.mode, WatchMode::Poll);
        assert_eq!(cfg.exclude, vec!["out", ".sitewatch"]);
        assert!(cfg.build_cmd.is_none());
    }

    #[test]
    fn default_exclusions_follow_renamed_directories() {
        let cfg = parse(
            r#"
            [site]
            output_dir = "public"
            cache_dir = ".cache"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.exclude, vec!["public", ".cache"]);
    }

    #[test]
    fn explicit_exclusions_replace_defaults() {
        let cfg = parse(
            r#"
            [watch]
            exclude = ["out", ".sitewatch", ".git"]
            mode = "events"
            poll_interval = "2s"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.exclude, vec!["out", ".sitewatch", ".git"]);
        assert_eq!(cfg.mode, WatchMode::Events);
        assert_eq!(cfg.poll_interval, Duration::from_secs(2));
    }

    #[test]
    fn nested_exclusions_are_rejected() {
        let err = parse(
            r#"
            [watch]
            exclude = ["src/drafts"]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, SiteError::ConfigError(_)));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let err = parse(
            r#"
            [watch]
            poll_interval = "0ms"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("greater than zero"));
    }

    #[test]
    fn blank_build_command_is_rejected() {
        assert!(parse("[build]\ncmd = \"  \"\n").is_err());
    }

    #[test]
    fn output_and_cache_dirs_must_differ() {
        let err = parse("[site]\noutput_dir = \"out\"\ncache_dir = \"out\"\n").unwrap_err();
        assert!(matches!(err, SiteError::ConfigError(_)));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let raw: std::result::Result<RawConfigFile, _> = toml::from_str("[watch]\npoll = \"1s\"\n");
        assert!(raw.is_err());
    }
}
