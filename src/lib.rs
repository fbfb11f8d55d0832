#![doc = "cloudstore-migrate: move locally stored resource files into a remote object store."]

//! Walks a sharded on-disk resource tree, reconciles each file against the
//! resource catalog, and streams upload-type resources into the configured
//! storage backend. Partial failures are collected into a failure log rather
//! than aborting the batch.

pub mod catalog;
pub mod cli;
pub mod contract;
pub mod discover;
pub mod driver;
pub mod load_config;
pub mod migrate;
pub mod resolver;

pub use cli::{run, Cli, Commands};
