//! Configuration for casewarden.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (CASEWARDEN_HOME, GEMINI_API_KEY, CASEWARDEN_USER)
//! 2. Config file (.casewarden/config.yaml)
//! 3. Defaults (~/.casewarden)
//!
//! Config file discovery:
//! - Searches current directory and parents for .casewarden/config.yaml
//! - A relative `home` is resolved against the .casewarden/ directory

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::adapters::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::adapters::GenerationConfig;
use crate::core::RetryPolicy;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

const CONFIG_DIR: &str = ".casewarden";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub version: Option<String>,
    /// State directory (relative to .casewarden/)
    #[serde(default)]
    pub home: Option<String>,
    /// Identity recorded in audit stamps
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub oracle: Option<OracleConfig>,
    #[serde(default)]
    pub retry: Option<RetryPolicy>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OracleConfig {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub temperature: Option<f64>,
    pub top_k: Option<u32>,
    pub top_p: Option<f64>,
    pub max_output_tokens: Option<u32>,
}

/// Resolved oracle settings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OracleSettings {
    pub base_url: String,
    pub model: String,
    pub timeout_seconds: u64,
    pub generation: GenerationConfig,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_seconds: 120,
            generation: GenerationConfig::default(),
        }
    }
}

impl OracleSettings {
    fn merge(config: Option<&OracleConfig>) -> Self {
        let defaults = Self::default();
        let Some(c) = config else {
            return defaults;
        };

        Self {
            base_url: c.base_url.clone().unwrap_or(defaults.base_url),
            model: c.model.clone().unwrap_or(defaults.model),
            timeout_seconds: c.timeout_seconds.unwrap_or(defaults.timeout_seconds),
            generation: GenerationConfig {
                temperature: c.temperature.unwrap_or(defaults.generation.temperature),
                top_k: c.top_k.unwrap_or(defaults.generation.top_k),
                top_p: c.top_p.unwrap_or(defaults.generation.top_p),
                max_output_tokens: c
                    .max_output_tokens
                    .unwrap_or(defaults.generation.max_output_tokens),
            },
        }
    }
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    /// State directory (file library, history)
    pub home: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    /// Audit identity, if any
    pub user: Option<String>,
    #[serde(skip)]
    pub api_key: Option<String>,
    pub oracle: OracleSettings,
    pub retry: RetryPolicy,
}

impl ResolvedConfig {
    /// Directory holding per-owner file catalogs
    pub fn files_dir(&self) -> PathBuf {
        self.home.join("files")
    }

    /// Correction history log
    pub fn history_path(&self) -> PathBuf {
        self.home.join("history.jsonl")
    }

    /// Render for display with the key redacted
    pub fn redacted_yaml(&self) -> Result<String> {
        let mut value = serde_yaml::to_value(self).context("Failed to serialize config")?;
        if let serde_yaml::Value::Mapping(ref mut map) = value {
            let key = if self.api_key.is_some() { "<set>" } else { "<unset>" };
            map.insert("api_key".into(), key.into());
        }
        serde_yaml::to_string(&value).context("Failed to render config")
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(CONFIG_DIR).join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config directory
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Combine a parsed file (if any) with the environment
fn resolve(config_file: Option<PathBuf>, file: ConfigFile) -> Result<ResolvedConfig> {
    let home = if let Some(env_home) = env_nonempty("CASEWARDEN_HOME") {
        PathBuf::from(env_home)
    } else if let (Some(home_path), Some(config_path)) = (file.home.as_deref(), &config_file) {
        let config_dir = config_path.parent().unwrap_or(Path::new("."));
        resolve_path(config_dir, home_path)
    } else {
        dirs::home_dir()
            .context("Failed to determine home directory")?
            .join(CONFIG_DIR)
    };

    let api_key = env_nonempty("GEMINI_API_KEY").or_else(|| env_nonempty("GOOGLE_GENAI_API_KEY"));
    let user = env_nonempty("CASEWARDEN_USER").or(file.user);

    Ok(ResolvedConfig {
        home,
        config_file,
        user,
        api_key,
        oracle: OracleSettings::merge(file.oracle.as_ref()),
        retry: file.retry.unwrap_or_default(),
    })
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    match find_config_file() {
        Some(path) => {
            let file = load_config_file(&path)?;
            resolve(Some(path), file)
        }
        None => resolve(None, ConfigFile::default()),
    }
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let config_dir = temp.path().join(CONFIG_DIR);
        std::fs::create_dir_all(&config_dir).unwrap();

        let config_path = config_dir.join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
version: "1.0"
home: ./state
user: auditor@example.org
oracle:
  model: gemini-1.5-flash
  timeout_seconds: 30
  top_k: 20
retry:
  max_attempts: 5
"#
        )
        .unwrap();

        let config = load_config_file(&config_path).unwrap();
        assert_eq!(config.version.as_deref(), Some("1.0"));
        assert_eq!(config.home.as_deref(), Some("./state"));

        let oracle = OracleSettings::merge(config.oracle.as_ref());
        assert_eq!(oracle.model, "gemini-1.5-flash");
        assert_eq!(oracle.timeout_seconds, 30);
        assert_eq!(oracle.generation.top_k, 20);
        assert_eq!(oracle.generation.max_output_tokens, 2048);
        assert_eq!(oracle.base_url, DEFAULT_BASE_URL);

        let retry = config.retry.unwrap();
        assert_eq!(retry.max_attempts, 5);
        assert_eq!(retry.initial_delay_ms, 1000);
    }

    #[test]
    fn test_oracle_defaults() {
        let oracle = OracleSettings::merge(None);
        assert_eq!(oracle.model, "gemini-1.5-pro");
        assert_eq!(oracle.timeout_seconds, 120);
        assert_eq!(oracle.generation, GenerationConfig::default());
    }

    #[test]
    fn test_redacted_yaml_hides_key() {
        let config = ResolvedConfig {
            home: PathBuf::from("/test/.casewarden"),
            config_file: None,
            user: None,
            api_key: Some("secret-key".to_string()),
            oracle: OracleSettings::default(),
            retry: RetryPolicy::default(),
        };

        let rendered = config.redacted_yaml().unwrap();
        assert!(!rendered.contains("secret-key"));
        assert!(rendered.contains("api_key"));
        assert!(rendered.contains("<set>"));
        assert_eq!(config.files_dir(), PathBuf::from("/test/.casewarden/files"));
    }

    #[test]
    fn test_resolve_relative_path() {
        let base = PathBuf::from("/home/user/project");

        assert_eq!(
            resolve_path(&base, "./subdir"),
            PathBuf::from("/home/user/project/subdir")
        );
        assert_eq!(
            resolve_path(&base, "/absolute/path"),
            PathBuf::from("/absolute/path")
        );
    }
}
