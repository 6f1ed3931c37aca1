//! Reads a [`ProxyConfig`] from disk, layered with `RELAY__*` environment
//! overrides (e.g. `RELAY__LIMITS__MAX_RESPONSE_BODY_BYTES=4096`).
use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use eyre::{Context, Result};

use crate::config::models::ProxyConfig;

/// Load configuration from `config_path`.
///
/// The format follows the file extension (YAML, JSON, TOML or INI; YAML when
/// unknown). Environment variables take precedence over file values.
pub async fn load_config(config_path: &str) -> Result<ProxyConfig> {
    let path = Path::new(config_path);
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    Config::builder()
        .add_source(File::from_str(&contents, format_for(path)))
        .add_source(
            Environment::with_prefix("RELAY")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()
        .and_then(|settings| settings.try_deserialize::<ProxyConfig>())
        .with_context(|| format!("Failed to parse config from {}", path.display()))
}

fn format_for(path: &Path) -> FileFormat {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => FileFormat::Json,
        Some("toml") => FileFormat::Toml,
        Some("ini") => FileFormat::Ini,
        _ => FileFormat::Yaml,
    }
}
