//! Configuration module for the analyzer.
//!
//! Layered configuration: defaults, then `vestige.toml`, then environment
//! variable overrides, then CLI flags (applied by the binary).
//!
//! # Environment Variables
//!
//! Environment variables are prefixed with `VESTIGE_` and use double
//! underscores to separate nested levels:
//! - `VESTIGE_ANALYSIS__RETAIN_PUBLIC=true` sets `analysis.retain_public`
//! - `VESTIGE_SCAN__THREADS=8` sets `scan.threads`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

pub const CONFIG_FILE: &str = "vestige.toml";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Settings {
    /// Analysis options. Each option affects exactly one pass; the table of
    /// (option, pass) pairs is kept in DESIGN.md.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Scan driving configuration
    #[serde(default)]
    pub scan: ScanConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AnalysisConfig {
    /// Mark declarations with public or open effective accessibility live.
    #[serde(default = "default_false")]
    pub retain_public: bool,

    /// Retain declarations whose USR indicates Objective-C bridging.
    #[serde(default = "default_false")]
    pub retain_objc_accessible: bool,

    /// Do not report properties that are only assigned.
    #[serde(default = "default_false")]
    pub retain_assign_only_properties: bool,

    /// Do not report unused parameters of protocol requirements and their
    /// implementations.
    #[serde(default = "default_true")]
    pub retain_unused_protocol_func_params: bool,

    /// Protocol names that behave as Encodable for member synthesis.
    #[serde(default)]
    pub external_encodable_protocols: Vec<String>,

    /// Ignore in-source `// periphery:` commands.
    #[serde(default = "default_false")]
    pub ignore_comment_commands: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScanConfig {
    /// Worker threads for the ingest and reconcile pools.
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Patterns excluded from the source walk.
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,

    /// Index store directories.
    #[serde(default)]
    pub index_stores: Vec<PathBuf>,

    /// Path to the syntax provider's output.
    #[serde(default)]
    pub syntax: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default level: error, warn, info, debug, trace
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module level overrides
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_threads() -> usize {
    num_cpus::get()
}
fn default_log_level() -> String {
    "warn".to_string()
}
fn default_ignore_patterns() -> Vec<String> {
    vec![
        ".build/**".to_string(),
        "Pods/**".to_string(),
        "DerivedData/**".to_string(),
    ]
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            retain_public: false,
            retain_objc_accessible: false,
            retain_assign_only_properties: false,
            retain_unused_protocol_func_params: true,
            external_encodable_protocols: Vec::new(),
            ignore_comment_commands: false,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            threads: default_threads(),
            ignore_patterns: default_ignore_patterns(),
            index_stores: Vec::new(),
            syntax: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources, starting at the current
    /// directory and walking up to find `vestige.toml`.
    pub fn load() -> Result<Self, figment::Error> {
        let config_path = Self::find_config().unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
        Self::load_from(config_path)
    }

    /// Load configuration from a specific file plus environment overrides.
    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("VESTIGE_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
    }

    fn find_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        for ancestor in current.ancestors() {
            let candidate = ancestor.join(CONFIG_FILE);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        None
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<(), Box<dyn std::error::Error>> {
        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;
        Ok(())
    }

    /// Create a default settings file in the current directory.
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = PathBuf::from(CONFIG_FILE);
        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }
        Settings::default().save(&config_path)?;
        Ok(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert!(!settings.analysis.retain_public);
        assert!(settings.analysis.retain_unused_protocol_func_params);
        assert!(settings.scan.threads > 0);
        assert_eq!(settings.logging.default, "warn");
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(CONFIG_FILE);

        let toml_content = r#"
[analysis]
retain_public = true
external_encodable_protocols = ["SecureCodable"]

[scan]
threads = 4
index_stores = ["/build/index"]

[logging]
default = "info"
"#;
        fs::write(&config_path, toml_content).unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert!(settings.analysis.retain_public);
        assert_eq!(
            settings.analysis.external_encodable_protocols,
            vec!["SecureCodable"]
        );
        assert_eq!(settings.scan.threads, 4);
        assert_eq!(settings.scan.index_stores, vec![PathBuf::from("/build/index")]);
        assert_eq!(settings.logging.default, "info");
        // Defaults fill in everything the file left out.
        assert!(settings.analysis.retain_unused_protocol_func_params);
    }

    #[test]
    fn test_save_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(CONFIG_FILE);

        let mut settings = Settings::default();
        settings.analysis.retain_objc_accessible = true;
        settings.scan.threads = 2;
        settings.save(&config_path).unwrap();

        let loaded = Settings::load_from(&config_path).unwrap();
        assert!(loaded.analysis.retain_objc_accessible);
        assert_eq!(loaded.scan.threads, 2);
    }
}
