use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFAULT_MANIFEST: &str = "dev-requirements.txt";
const LOCAL_CONFIG: &str = "devreqs.toml";

/// How `check` treats a tool declared more than once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    #[default]
    Warn,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    pub duplicates: DuplicatePolicy,
    /// Require every entry to pin an exact version with `==`.
    pub pinned_only: bool,
}

/// Settings read from `devreqs.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Manifest used when no file is given on the command line.
    #[serde(default = "default_manifest")]
    pub manifest: String,
    #[serde(default)]
    pub check: CheckConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            manifest: DEFAULT_MANIFEST.to_string(),
            check: CheckConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        toml::from_str(&contents).with_context(|| format!("Failed to parse config file {:?}", path))
    }

    /// Find and load the active configuration.
    ///
    /// An explicit path must exist. Otherwise `./devreqs.toml` is tried, then
    /// `$XDG_CONFIG_HOME/devreqs/config.toml`, and finally the defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                bail!("Config file {:?} does not exist", path);
            }
            debug!(path = %path.display(), "using explicit config");
            return Self::load(path);
        }

        let local = PathBuf::from(LOCAL_CONFIG);
        if local.exists() {
            debug!(path = %local.display(), "using local config");
            return Self::load(&local);
        }

        let user = config_dir()?.join("config.toml");
        debug!(path = %user.display(), "using user config");
        Self::load(&user)
    }

    /// Default manifest path with `~` and environment variables expanded.
    pub fn manifest_path(&self) -> Result<PathBuf> {
        let expanded = shellexpand::full(&self.manifest).map_err(|err| {
            anyhow::anyhow!("Failed to expand manifest path '{}': {}", self.manifest, err)
        })?;
        Ok(PathBuf::from(expanded.as_ref()))
    }
}

fn default_manifest() -> String {
    DEFAULT_MANIFEST.to_string()
}

/// Returns `$XDG_CONFIG_HOME/devreqs` or `~/.config/devreqs` if not set.
pub fn config_dir() -> Result<PathBuf> {
    let base = match env::var("XDG_CONFIG_HOME") {
        Ok(value) if !value.is_empty() => PathBuf::from(value),
        _ => directories::BaseDirs::new()
            .context("Failed to get home directory")?
            .home_dir()
            .join(".config"),
    };

    Ok(base.join("devreqs"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn missing_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let config = Config::load(&temp.path().join("devreqs.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.manifest, "dev-requirements.txt");
        assert_eq!(config.check.duplicates, DuplicatePolicy::Warn);
        assert!(!config.check.pinned_only);
    }

    #[test]
    fn parses_check_settings() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("devreqs.toml");
        fs::write(
            &path,
            r#"
manifest = "requirements/dev.txt"

[check]
duplicates = "error"
pinned_only = true
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.manifest, "requirements/dev.txt");
        assert_eq!(config.check.duplicates, DuplicatePolicy::Error);
        assert!(config.check.pinned_only);
    }

    #[test]
    fn partial_check_table_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("devreqs.toml");
        fs::write(&path, "[check]\npinned_only = true\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.manifest, "dev-requirements.txt");
        assert_eq!(config.check.duplicates, DuplicatePolicy::Warn);
        assert!(config.check.pinned_only);
    }

    #[test]
    fn invalid_policy_errors() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("devreqs.toml");
        fs::write(&path, "[check]\nduplicates = \"sometimes\"\n").unwrap();

        let error = Config::load(&path).unwrap_err();
        assert!(format!("{error:#}").contains("Failed to parse config file"));
    }

    #[test]
    fn explicit_config_must_exist() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.toml");
        let error = Config::resolve(Some(missing.as_path())).unwrap_err();
        assert!(error.to_string().contains("does not exist"));
    }

    #[test]
    #[serial]
    fn config_dir_honours_xdg() {
        let temp = TempDir::new().unwrap();
        env::set_var("XDG_CONFIG_HOME", temp.path());
        let dir = config_dir().unwrap();
        env::remove_var("XDG_CONFIG_HOME");
        assert_eq!(dir, temp.path().join("devreqs"));
    }

    #[test]
    #[serial]
    fn manifest_path_expands_env() {
        env::set_var("DEVREQS_TEST_ROOT", "/srv/project");
        let config = Config {
            manifest: "$DEVREQS_TEST_ROOT/dev-requirements.txt".to_string(),
            ..Config::default()
        };
        let path = config.manifest_path().unwrap();
        env::remove_var("DEVREQS_TEST_ROOT");
        assert_eq!(path, PathBuf::from("/srv/project/dev-requirements.txt"));
    }
}
