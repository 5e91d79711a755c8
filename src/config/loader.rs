// src/config/loader.rs

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};

use crate::config::model::ConfigFile;

/// Load a configuration file from a given path and return the raw `ConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
///
/// A missing config file is not an error: every section has defaults, so we
/// fall back to `ConfigFile::default()`.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(ConfigFile::default());
    }

    let contents =
        fs::read_to_string(path).with_context(|| format!("reading config file at {:?}", path))?;

    let config: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("parsing TOML config from {:?}", path))?;

    Ok(config)
}

/// Load a configuration file from path and run basic validation.
///
/// This is the recommended entry point for the rest of the application.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let config = load_from_path(&path)?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(cfg: &ConfigFile) -> Result<()> {
    if cfg.scheduler.poll_interval_secs == 0 {
        return Err(anyhow!(
            "[scheduler].poll_interval_secs must be >= 1 (got 0)"
        ));
    }
    if cfg.tasks.max_dependencies == 0 {
        return Err(anyhow!("[tasks].max_dependencies must be >= 1 (got 0)"));
    }
    if cfg.store.path.trim().is_empty() {
        return Err(anyhow!("[store].path must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = load_and_validate("does-not-exist.toml").unwrap();
        assert_eq!(cfg.scheduler.poll_interval_secs, 30);
        assert_eq!(cfg.tasks.max_dependencies, 32);
        assert_eq!(cfg.store.path, "conduit.db");
    }

    #[test]
    fn rejects_zero_poll_interval() {
        let mut cfg = ConfigFile::default();
        cfg.scheduler.poll_interval_secs = 0;
        assert!(validate_config(&cfg).is_err());
    }
}
