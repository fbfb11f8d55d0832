//! Reqwest-backed catalog client.
//!
//! Speaks the catalog's small resource API: fetch a record by identifier,
//! patch its upload pointer, and (for the administrative `initdb` command)
//! reset the catalog schema. All transport and serialization details stay in
//! here; the engine only ever sees [`CatalogClient`] and its domain errors.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{error, info};

use crate::contract::{CatalogClient, CatalogError, ResourceRecord, UrlType};

/// Explicit catalog connection settings; built by config loading, never read
/// from ambient globals.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Base URL of the catalog API, e.g. `https://catalog.example.org`.
    pub base_url: String,
    /// API key sent as the `Authorization` header, when the catalog requires
    /// one.
    pub api_key: Option<String>,
}

pub struct HttpCatalog {
    http: reqwest::Client,
    config: CatalogConfig,
}

/// Record shape as the catalog serves it; mapped to the domain
/// [`ResourceRecord`] before it leaves this module.
#[derive(Debug, Deserialize)]
struct WireRecord {
    id: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    url_type: Option<String>,
    #[serde(default)]
    upload_pointer: Option<String>,
}

impl HttpCatalog {
    pub fn new(config: CatalogConfig) -> Self {
        info!(base_url = %config.base_url, "initialised catalog client");
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn resource_url(&self, id: &str) -> String {
        format!(
            "{}/resources/{id}",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn with_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => req.header(reqwest::header::AUTHORIZATION, key.as_str()),
            None => req,
        }
    }

    /// Drop and recreate the catalog's storage tables. Administrative;
    /// deliberately not part of the engine-facing [`CatalogClient`] trait.
    pub async fn reset_schema(&self) -> Result<(), CatalogError> {
        let url = format!(
            "{}/admin/schema/reset",
            self.config.base_url.trim_end_matches('/')
        );
        info!(%url, "reinitialising catalog schema");
        let response = self
            .with_auth(self.http.post(&url))
            .send()
            .await
            .map_err(|e| CatalogError::Backend(e.to_string()))?;
        response
            .error_for_status()
            .map_err(|e| CatalogError::Backend(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl CatalogClient for HttpCatalog {
    async fn lookup(&self, id: &str) -> Result<ResourceRecord, CatalogError> {
        let url = self.resource_url(id);
        let response = self
            .with_auth(self.http.get(&url))
            .send()
            .await
            .map_err(|e| {
                error!(resource = %id, error = %e, "catalog lookup failed");
                CatalogError::Backend(e.to_string())
            })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(id.to_string()));
        }
        let response = response
            .error_for_status()
            .map_err(|e| CatalogError::Backend(e.to_string()))?;

        let wire: WireRecord = response
            .json()
            .await
            .map_err(|e| CatalogError::Backend(format!("malformed record payload: {e}")))?;

        Ok(ResourceRecord {
            id: wire.id,
            url: wire.url,
            url_type: wire
                .url_type
                .as_deref()
                .map(UrlType::from)
                .unwrap_or(UrlType::Other(String::new())),
            upload_pointer: wire.upload_pointer,
        })
    }

    async fn update_pointer(&self, id: &str, pointer: &str) -> Result<(), CatalogError> {
        let url = self.resource_url(id);
        info!(resource = %id, pointer, "updating upload pointer");
        let response = self
            .with_auth(self.http.patch(&url))
            .json(&serde_json::json!({ "upload_pointer": pointer }))
            .send()
            .await
            .map_err(|e| CatalogError::Backend(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(id.to_string()));
        }
        response
            .error_for_status()
            .map_err(|e| CatalogError::Backend(e.to_string()))?;
        Ok(())
    }
}
