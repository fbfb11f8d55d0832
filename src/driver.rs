//! HTTP blob storage driver.
//!
//! Uploads objects with streaming `PUT` requests against a blob endpoint and,
//! for backends that expose advanced service rules, replaces the container's
//! CORS configuration. The driver is built from an explicit [`DriverConfig`];
//! provider options never live in global state.

use async_trait::async_trait;
use tokio_util::io::ReaderStream;
use tracing::{error, info};

use crate::contract::{
    ByteStream, CorsError, DriverCapabilities, StorageDriver, StorageError, UploadOutcome,
};

/// Connection settings for [`HttpBlobDriver`]. Secrets are injected by config
/// loading (from the environment), not read here.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Provider label reported through `capabilities()`, e.g. `azurite`.
    pub name: String,
    /// Base URL of the blob service.
    pub endpoint: String,
    /// Container (bucket) all object keys are placed under.
    pub container: String,
    /// Access key sent as `x-api-key`, when the backend requires one.
    pub access_key: Option<String>,
    /// Whether the backend supports service-level rules such as CORS.
    pub advanced_rules: bool,
}

pub struct HttpBlobDriver {
    http: reqwest::Client,
    config: DriverConfig,
}

impl HttpBlobDriver {
    pub fn new(config: DriverConfig) -> Self {
        info!(
            driver = %config.name,
            endpoint = %config.endpoint,
            container = %config.container,
            "initialised storage driver"
        );
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!(
            "{}/{}/{key}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.container
        )
    }

    fn with_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.access_key {
            Some(key) => req.header("x-api-key", key.as_str()),
            None => req,
        }
    }
}

#[async_trait]
impl StorageDriver for HttpBlobDriver {
    fn capabilities(&self) -> DriverCapabilities {
        DriverCapabilities {
            driver_name: self.config.name.clone(),
            supports_advanced_rules: self.config.advanced_rules,
        }
    }

    async fn upload(
        &self,
        key: &str,
        stream: ByteStream,
        content_length: u64,
    ) -> Result<UploadOutcome, StorageError> {
        let url = self.object_url(key);
        info!(%key, bytes = content_length, "uploading object");

        // PUT overwrites an existing object under the same key, so retrying
        // a failed entry is safe.
        let body = reqwest::Body::wrap_stream(ReaderStream::new(stream));
        let response = self
            .with_auth(self.http.put(&url))
            .header(reqwest::header::CONTENT_LENGTH, content_length)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                error!(%key, error = %e, "object upload failed");
                StorageError::Backend(e.to_string())
            })?;
        response
            .error_for_status()
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Ok(UploadOutcome {
            key: key.to_string(),
            bytes: content_length,
        })
    }

    async fn configure_cors(
        &self,
        allowed_origins: &[String],
        allowed_methods: &[String],
    ) -> Result<(), CorsError> {
        if !self.config.advanced_rules {
            return Err(CorsError::Unsupported {
                driver: self.config.name.clone(),
            });
        }

        let url = format!(
            "{}/{}?comp=cors",
            self.config.endpoint.trim_end_matches('/'),
            self.config.container
        );
        info!(origins = ?allowed_origins, methods = ?allowed_methods, "replacing CORS rules");
        let response = self
            .with_auth(self.http.put(&url))
            .json(&serde_json::json!({
                "allowed_origins": allowed_origins,
                "allowed_methods": allowed_methods,
            }))
            .send()
            .await
            .map_err(|e| CorsError::Backend(e.to_string()))?;
        response
            .error_for_status()
            .map_err(|e| CorsError::Backend(e.to_string()))?;
        Ok(())
    }
}
