use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::error::{CodeAtlasError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source code extraction configuration
    pub extraction: ExtractionConfig,

    /// Dependency discovery settings
    pub discovery: DiscoveryConfig,

    /// Statistics reporting settings
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Languages with dedicated tree-sitter extractors; anything else
    /// falls back to the lexical extractor
    pub languages: Vec<String>,

    /// Maximum file size to extract (in bytes)
    pub max_file_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Maximum number of fixpoint passes before unresolved references
    /// are force-classified as external
    pub max_passes: usize,

    /// Known standard-library module names, keyed by language
    pub stdlib_modules: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Functions at or above this cyclomatic complexity are listed
    /// as complexity hotspots
    pub complexity_threshold: u32,

    /// Maximum number of most-called functions to report
    pub hotspot_limit: usize,
}

impl DiscoveryConfig {
    /// Stdlib name set for a language, empty if the language is unknown
    pub fn stdlib_set(&self, language: &str) -> HashSet<String> {
        self.stdlib_modules
            .get(language)
            .map(|names| names.iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut stdlib_modules = HashMap::new();
        stdlib_modules.insert(
            "python".to_string(),
            [
                "os", "sys", "re", "json", "time", "datetime", "collections",
                "itertools", "functools", "pathlib", "typing", "abc", "enum",
                "logging", "argparse", "configparser", "io", "shutil",
                "subprocess", "threading", "multiprocessing", "asyncio",
                "contextlib", "traceback", "unittest", "math", "random",
                "string", "copy", "pickle",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        );
        stdlib_modules.insert(
            "rust".to_string(),
            ["std", "core", "alloc", "proc_macro", "test"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );

        Self {
            extraction: ExtractionConfig {
                languages: vec!["python".to_string(), "rust".to_string()],
                max_file_size: 1024 * 1024, // 1MB
            },
            discovery: DiscoveryConfig {
                max_passes: 10,
                stdlib_modules,
            },
            report: ReportConfig {
                complexity_threshold: 10,
                hotspot_limit: 10,
            },
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| CodeAtlasError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| CodeAtlasError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration with fallback to default
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(p) => {
                if p.as_ref().exists() {
                    Self::load(p)
                } else {
                    Ok(Self::default())
                }
            }
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_has_stdlib_sets() {
        let config = Config::default();
        let python = config.discovery.stdlib_set("python");
        assert!(python.contains("os"));
        assert!(python.contains("json"));
        assert!(config.discovery.stdlib_set("rust").contains("std"));
        assert!(config.discovery.stdlib_set("cobol").is_empty());
    }

    #[test]
    fn test_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("codeatlas.toml");

        let mut config = Config::default();
        config.discovery.max_passes = 4;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.discovery.max_passes, 4);
        assert_eq!(loaded.report.hotspot_limit, config.report.hotspot_limit);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default(Some("does-not-exist.toml")).unwrap();
        assert_eq!(config.discovery.max_passes, 10);
    }
}
