//! CLI surface for cloudstore-migrate: command parsing, argument exposure,
//! and orchestration glue.
//!
//! All migration logic lives in the library modules ([`crate::migrate`] and
//! the collaborator traits in [`crate::contract`]); this module only wires
//! parsed arguments and loaded configuration into them.
//!
//! The async [`run`] entrypoint exists so integration tests can invoke the
//! CLI programmatically with a constructed [`Cli`].

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::catalog::HttpCatalog;
use crate::contract::{CorsError, StorageDriver};
use crate::driver::HttpBlobDriver;
use crate::load_config::load_config;
use crate::migrate::{migrate, MigrateOptions};

/// CLI for cloudstore-migrate: move locally stored resource files into the
/// remote object store.
#[derive(Parser)]
#[clap(
    name = "cloudstore-migrate",
    version,
    about = "Migrate locally stored resource files into remote object storage"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload local storage to the remote, reconciling against the catalog
    Migrate {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Bounded upload fan-out; 1 processes the batch sequentially
        #[clap(long, default_value_t = 1)]
        jobs: usize,
        /// Root of the sharded local storage tree
        path_to_storage: PathBuf,
        /// Restrict the run to a single derived resource identifier
        resource_id: Option<String>,
    },
    /// Update the container's CORS rules where the driver supports it
    FixCors {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Origins to allow
        #[clap(required = true)]
        allowed_origins: Vec<String>,
    },
    /// Reinitialize the catalog's storage tables
    Initdb {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Migrate {
            config,
            jobs,
            path_to_storage,
            resource_id,
        } => {
            let config = load_config(config)?;
            tracing::info!(command = "migrate", "starting migration");
            let catalog = HttpCatalog::new(config.catalog);
            let driver = HttpBlobDriver::new(config.driver);
            let options = MigrateOptions {
                root: path_to_storage,
                resource_id,
                jobs,
            };
            let report = migrate(&catalog, &driver, &options).await?;
            println!(
                "Migrated {}/{} resources ({} not found, {} skipped, {} failed)",
                report.uploaded,
                report.total,
                report.missing,
                report.skipped,
                report.failed.len()
            );
            // Partial failures are reported, not fatal: the run still exits 0.
            if let Some(path) = report.failure_log {
                println!(
                    "IDs of all failed uploads are saved to `{}`",
                    path.display()
                );
            }
            Ok(())
        }
        Commands::FixCors {
            config,
            allowed_origins,
        } => {
            let config = load_config(config)?;
            let driver = HttpBlobDriver::new(config.driver);
            fix_cors(&driver, &allowed_origins).await
        }
        Commands::Initdb { config } => {
            let config = load_config(config)?;
            let catalog = HttpCatalog::new(config.catalog);
            catalog.reset_schema().await?;
            println!("Catalog tables are reinitialized");
            Ok(())
        }
    }
}

/// Replace the container's CORS rules with the given origins (GET only).
/// Drivers without advanced-rules support get an operator message, never an
/// error.
pub async fn fix_cors<D: StorageDriver>(driver: &D, allowed_origins: &[String]) -> Result<()> {
    let capabilities = driver.capabilities();
    if !capabilities.supports_advanced_rules {
        println!(
            "The driver {} being used does not currently support updating CORS rules",
            capabilities.driver_name
        );
        return Ok(());
    }

    let methods = vec!["GET".to_string()];
    match driver.configure_cors(allowed_origins, &methods).await {
        Ok(()) => {
            println!("Done!");
            Ok(())
        }
        Err(CorsError::Unsupported { driver }) => {
            println!("The driver {driver} being used does not currently support updating CORS rules");
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "CORS update failed");
            Err(anyhow::Error::new(e))
        }
    }
}
