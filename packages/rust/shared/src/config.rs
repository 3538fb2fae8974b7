//! Application configuration for Solguide.
//!
//! User config lives at `~/.solguide/solguide.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SolguideError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "solguide.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".solguide";

// ---------------------------------------------------------------------------
// Config structs (matching solguide.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Record-store (opportunity database) settings.
    #[serde(default)]
    pub record_store: RecordStoreConfig,

    /// Object-store (artifact bucket) settings.
    #[serde(default)]
    pub object_store: ObjectStoreConfig,

    /// Generation pipeline settings.
    #[serde(default)]
    pub generation: GenerationConfig,
}

/// `[record_store]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordStoreConfig {
    /// Base URL of the record-store REST endpoint.
    #[serde(default = "default_store_endpoint")]
    pub endpoint: String,

    /// Table holding opportunity rows.
    #[serde(default = "default_table")]
    pub table: String,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_records_key_env")]
    pub api_key_env: String,
}

impl Default for RecordStoreConfig {
    fn default() -> Self {
        Self {
            endpoint: default_store_endpoint(),
            table: default_table(),
            api_key_env: default_records_key_env(),
        }
    }
}

fn default_store_endpoint() -> String {
    "http://localhost:54321".into()
}
fn default_table() -> String {
    "opportunities".into()
}
fn default_records_key_env() -> String {
    "SOLGUIDE_RECORDS_KEY".into()
}

/// `[object_store]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStoreConfig {
    /// Base URL of the object-store endpoint.
    #[serde(default = "default_store_endpoint")]
    pub endpoint: String,

    /// Bucket the rendered guides are uploaded into.
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Name of the env var holding the API key.
    #[serde(default = "default_storage_key_env")]
    pub api_key_env: String,
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self {
            endpoint: default_store_endpoint(),
            bucket: default_bucket(),
            api_key_env: default_storage_key_env(),
        }
    }
}

fn default_bucket() -> String {
    "instruction-documents".into()
}
fn default_storage_key_env() -> String {
    "SOLGUIDE_STORAGE_KEY".into()
}

/// `[generation]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Fixed delay between batch items, in milliseconds. Cooperative pacing
    /// to avoid overloading the fetch/storage endpoints, not a rate limiter.
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,

    /// Age in days after which a live opportunity's guide is considered stale.
    #[serde(default = "default_staleness_days")]
    pub staleness_days: i64,

    /// HTTP timeout for source-document fetches, in seconds.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            pacing_ms: default_pacing_ms(),
            staleness_days: default_staleness_days(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

fn default_pacing_ms() -> u64 {
    2000
}
fn default_staleness_days() -> i64 {
    7
}
fn default_fetch_timeout_secs() -> u64 {
    30
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.solguide/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| SolguideError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.solguide/solguide.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SolguideError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| SolguideError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| SolguideError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| SolguideError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| SolguideError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that both store API key env vars are set and non-empty.
pub fn validate_api_keys(config: &AppConfig) -> Result<()> {
    for var_name in [
        &config.record_store.api_key_env,
        &config.object_store.api_key_env,
    ] {
        match std::env::var(var_name) {
            Ok(val) if !val.is_empty() => {}
            _ => {
                return Err(SolguideError::config(format!(
                    "API key not found. Set the {var_name} environment variable."
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("instruction-documents"));
        assert!(toml_str.contains("SOLGUIDE_RECORDS_KEY"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.generation.pacing_ms, 2000);
        assert_eq!(parsed.generation.staleness_days, 7);
        assert_eq!(parsed.record_store.table, "opportunities");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[record_store]
endpoint = "https://records.example.com"

[generation]
pacing_ms = 500
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.record_store.endpoint, "https://records.example.com");
        assert_eq!(config.record_store.table, "opportunities");
        assert_eq!(config.generation.pacing_ms, 500);
        assert_eq!(config.generation.staleness_days, 7);
        assert_eq!(config.object_store.bucket, "instruction-documents");
    }

    #[test]
    fn api_key_validation() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.record_store.api_key_env = "SOLGUIDE_TEST_NONEXISTENT_KEY_12345".into();
        let result = validate_api_keys(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key not found"));
    }
}
