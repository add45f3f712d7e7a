//! TOML configuration file support.
//!
//! Loads from (in order):
//! 1. An explicit `--config` path
//! 2. `licsign.toml` next to the executable
//! 3. `$HOME/.config/licsign/config.toml` (`%LOCALAPPDATA%\licsign\config.toml` on Windows)
//! 4. Built-in defaults
//!
//! Environment variables (e.g. `LICSIGN_PUBLIC_KEY`) override the file, and
//! CLI arguments always take precedence over both.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, ResultExt as _};

// ---------------------------------------------------------------------------
// Config structs (map 1-to-1 with the TOML sections)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LicsignConfig {
    pub paths: PathsConfig,
    pub logging: LoggingConfig,
    pub verify: VerifyConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Issuer private key (PEM).  Only the issuing machine needs it.
    pub private_key: Option<PathBuf>,
    pub public_key: Option<PathBuf>,
    /// Default bundle location for both `issue --out` and `verify --bundle`.
    pub bundle: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Path to a JSON-lines structured log file.
    /// Empty string means no file logging.
    pub json_log_file: String,
    /// Whether to output JSON to stdout instead of text to stderr.
    pub json_stdout: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VerifyConfig {
    /// Also reject licenses outside their `valid_from`..=`expiry` window.
    pub enforce_validity_window: bool,
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            private_key: None,
            public_key: None,
            bundle: PathBuf::from("license.json"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_log_file: String::new(),
            json_stdout: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl LicsignConfig {
    /// Try to load from a specific path.  Returns `Ok(default)` if the file
    /// does not exist; returns `Err` if the file exists but is malformed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .ctx_config(&format!("read config file {}", path.display()))?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).ctx_config("parse config TOML")
    }

    /// Load config using the standard search order (see module docs).
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(p) = explicit {
            return Self::load_from(p);
        }

        if let Ok(exe) = std::env::current_exe() {
            let candidate = exe.with_file_name("licsign.toml");
            if candidate.exists() {
                return Self::load_from(&candidate);
            }
        }

        #[cfg(windows)]
        {
            if let Ok(local) = std::env::var("LOCALAPPDATA") {
                let candidate = PathBuf::from(local).join("licsign").join("config.toml");
                if candidate.exists() {
                    return Self::load_from(&candidate);
                }
            }
        }

        #[cfg(not(windows))]
        {
            if let Some(home) = std::env::var_os("HOME") {
                let candidate = PathBuf::from(home)
                    .join(".config")
                    .join("licsign")
                    .join("config.toml");
                if candidate.exists() {
                    return Self::load_from(&candidate);
                }
            }
        }

        Ok(Self::default())
    }

    /// Apply environment variable overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any `LICSIGN_*` lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(p) = lookup("LICSIGN_PRIVATE_KEY") {
            self.paths.private_key = Some(PathBuf::from(p));
        }
        if let Some(p) = lookup("LICSIGN_PUBLIC_KEY") {
            self.paths.public_key = Some(PathBuf::from(p));
        }
        if let Some(p) = lookup("LICSIGN_BUNDLE") {
            self.paths.bundle = PathBuf::from(p);
        }
        if let Some(level) = lookup("LICSIGN_LOG_LEVEL") {
            self.logging.level = level;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_values() {
        let cfg = LicsignConfig::default();
        assert_eq!(cfg.paths.bundle, PathBuf::from("license.json"));
        assert!(cfg.paths.private_key.is_none());
        assert_eq!(cfg.logging.level, "info");
        assert!(!cfg.verify.enforce_validity_window);
    }

    #[test]
    fn load_missing_file_returns_default() {
        let cfg = LicsignConfig::load_from(Path::new("nonexistent_file_xyz.toml")).unwrap();
        assert_eq!(cfg.paths.bundle, PathBuf::from("license.json"));
    }

    #[test]
    fn parse_partial_toml() {
        let cfg = LicsignConfig::from_toml_str(
            r#"
[paths]
public_key = "keys/issuer_public.pem"

[verify]
enforce_validity_window = true
"#,
        )
        .unwrap();
        assert_eq!(
            cfg.paths.public_key,
            Some(PathBuf::from("keys/issuer_public.pem"))
        );
        assert!(cfg.verify.enforce_validity_window);
        // Other sections should be defaults.
        assert_eq!(cfg.paths.bundle, PathBuf::from("license.json"));
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn unknown_section_rejected() {
        let err = LicsignConfig::from_toml_str("[mail]\nrecipient = \"x\"\n").unwrap_err();
        assert!(err.to_string().contains("config"));
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut cfg = LicsignConfig::default();
        cfg.apply_overrides(|k| match k {
            "LICSIGN_PUBLIC_KEY" => Some("pub.pem".to_string()),
            "LICSIGN_LOG_LEVEL" => Some("debug".to_string()),
            _ => None,
        });
        assert_eq!(cfg.paths.public_key, Some(PathBuf::from("pub.pem")));
        assert_eq!(cfg.logging.level, "debug");
        assert!(cfg.paths.private_key.is_none());
    }
}
