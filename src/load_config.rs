//! Loads the YAML configuration file and injects secrets from the
//! environment, producing the typed config structs the collaborators are
//! constructed from.
//!
//! This is the only place untrusted YAML is parsed, and the only place the
//! process environment is consulted for credentials. Provider options flow
//! through explicit [`CatalogConfig`] and [`DriverConfig`] values rather
//! than module-wide globals.

use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{error, info};

use crate::catalog::CatalogConfig;
use crate::driver::DriverConfig;

/// Fully resolved application configuration.
#[derive(Debug)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub driver: DriverConfig,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    catalog: CatalogSection,
    driver: DriverSection,
}

#[derive(Debug, Deserialize)]
struct CatalogSection {
    base_url: String,
    /// Name of the environment variable holding the catalog API key.
    #[serde(default)]
    api_key_env: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DriverSection {
    name: String,
    endpoint: String,
    container: String,
    /// Name of the environment variable holding the storage access key.
    #[serde(default)]
    access_key_env: Option<String>,
    #[serde(default)]
    advanced_rules: bool,
}

/// Load the YAML config at `path` and resolve env-referenced secrets.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let raw: RawConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => conf,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    let config = AppConfig {
        catalog: CatalogConfig {
            base_url: raw.catalog.base_url,
            api_key: secret_from_env(raw.catalog.api_key_env.as_deref())?,
        },
        driver: DriverConfig {
            name: raw.driver.name,
            endpoint: raw.driver.endpoint,
            container: raw.driver.container,
            access_key: secret_from_env(raw.driver.access_key_env.as_deref())?,
            advanced_rules: raw.driver.advanced_rules,
        },
    };
    info!(
        catalog = %config.catalog.base_url,
        driver = %config.driver.name,
        "configuration loaded"
    );
    Ok(config)
}

/// Resolve an env-referenced secret. A named but unset variable is a
/// configuration error; an unnamed one simply means no credential.
fn secret_from_env(var_name: Option<&str>) -> Result<Option<String>> {
    match var_name {
        None => Ok(None),
        Some(name) => match std::env::var(name) {
            Ok(value) => Ok(Some(value)),
            Err(_) => Err(anyhow::anyhow!(
                "Config references environment variable `{name}`, but it is not set"
            )),
        },
    }
}
