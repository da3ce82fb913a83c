//! Configuration module for Steam-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! The configuration is built once at process start and handed by reference to
//! the checkpoint stores, fetchers and crawl drivers.
//!
//! # Example
//!
//! ```no_run
//! use steam_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Catalog retries: {}", config.catalog.retry.max_attempts);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{CatalogConfig, Config, HttpConfig, ImagesConfig, RetryConfig, StorageConfig};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
