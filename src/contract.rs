//! # contract: collaborator interfaces for the migration engine
//!
//! This module defines the two traits the engine depends on and the concrete
//! supporting types they exchange:
//!
//! - [`CatalogClient`] — the resource catalog: look up a record by its
//!   identifier, rewrite its upload pointer after a successful migration.
//! - [`StorageDriver`] — the remote object store: typed capability query,
//!   streaming upload, optional CORS rule management.
//!
//! ## Interface & Extensibility
//! - Implement [`CatalogClient`] or [`StorageDriver`] to target a new catalog
//!   backend or storage provider.
//! - All I/O methods are async and return domain error enums; implementors
//!   convert transport errors into the matching variant.
//!
//! ## Mocking & Testing
//! - Both traits are annotated for `mockall` so consumers can generate
//!   deterministic mocks for unit/integration tests (exported under the
//!   `test-export-mocks` feature).

use async_trait::async_trait;
use std::fmt;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

/// Byte source handed to [`StorageDriver::upload`]. Drivers must consume it
/// incrementally; the full file is never buffered in memory.
pub type ByteStream = Box<dyn tokio::io::AsyncRead + Send + Unpin>;

/// Where a catalog record's content currently lives, per its `url_type` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlType {
    /// Content was uploaded to the portal and lives in its storage.
    Upload,
    /// The record merely links to content hosted elsewhere.
    Link,
    /// Any other (or absent) type the catalog may carry.
    Other(String),
}

impl From<&str> for UrlType {
    fn from(s: &str) -> Self {
        match s {
            "upload" => UrlType::Upload,
            "link" => UrlType::Link,
            other => UrlType::Other(other.to_string()),
        }
    }
}

/// A resource record as fetched from the catalog. Owned by the catalog; the
/// engine only reads it and conditionally rewrites the upload pointer.
#[derive(Debug, Clone)]
pub struct ResourceRecord {
    pub id: String,
    /// Public URL of the resource; the remote object key is derived from its
    /// last path segment.
    pub url: String,
    pub url_type: UrlType,
    /// Opaque pointer recording where the content currently lives.
    pub upload_pointer: Option<String>,
}

/// Errors surfaced by a [`CatalogClient`].
#[derive(Debug)]
pub enum CatalogError {
    /// No record exists for the identifier. Recoverable: the engine skips
    /// the entry.
    NotFound(String),
    /// Transport or backend failure; treated as the catalog being
    /// unreachable.
    Backend(String),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::NotFound(id) => write!(f, "resource `{id}` not found in catalog"),
            CatalogError::Backend(msg) => write!(f, "catalog error: {msg}"),
        }
    }
}

impl std::error::Error for CatalogError {}

/// Read and mutate catalog records by resource identifier.
///
/// Lookups are read-only and side-effect-free. Pointer updates are
/// idempotent: re-applying the same pointer value is a no-op for the caller.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Fetch the record for `id`, or [`CatalogError::NotFound`].
    async fn lookup(&self, id: &str) -> Result<ResourceRecord, CatalogError>;

    /// Rewrite the record's upload pointer after content has moved.
    async fn update_pointer(&self, id: &str, pointer: &str) -> Result<(), CatalogError>;
}

/// Typed capability report of a [`StorageDriver`].
#[derive(Debug, Clone)]
pub struct DriverCapabilities {
    pub driver_name: String,
    /// Whether the backend exposes advanced service rules (CORS management).
    pub supports_advanced_rules: bool,
}

/// Summary of a completed upload.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub key: String,
    pub bytes: u64,
}

/// Errors surfaced by [`StorageDriver::upload`].
#[derive(Debug)]
pub enum StorageError {
    Io(std::io::Error),
    Backend(String),
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e)
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "storage I/O error: {e}"),
            StorageError::Backend(msg) => write!(f, "storage backend error: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {}

/// Errors surfaced by [`StorageDriver::configure_cors`].
#[derive(Debug)]
pub enum CorsError {
    /// The driver does not expose advanced rules; callers report this to the
    /// operator without treating it as fatal.
    Unsupported { driver: String },
    Backend(String),
}

impl fmt::Display for CorsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorsError::Unsupported { driver } => {
                write!(f, "driver `{driver}` does not support updating CORS rules")
            }
            CorsError::Backend(msg) => write!(f, "CORS update failed: {msg}"),
        }
    }
}

impl std::error::Error for CorsError {}

/// Remote object-storage backend.
///
/// `upload` must be safe to retry: writing the same key twice overwrites the
/// object rather than corrupting it.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait StorageDriver: Send + Sync {
    /// Report the driver's name and feature support as a typed struct.
    fn capabilities(&self) -> DriverCapabilities;

    /// Stream `content_length` bytes from `stream` into the object named
    /// `key` inside the configured container.
    async fn upload(
        &self,
        key: &str,
        stream: ByteStream,
        content_length: u64,
    ) -> Result<UploadOutcome, StorageError>;

    /// Replace the container's CORS rules. Only supported when
    /// [`DriverCapabilities::supports_advanced_rules`] is true; all other
    /// drivers return [`CorsError::Unsupported`] without touching the
    /// backend.
    async fn configure_cors(
        &self,
        allowed_origins: &[String],
        allowed_methods: &[String],
    ) -> Result<(), CorsError>;
}
