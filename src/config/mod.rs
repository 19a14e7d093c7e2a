//! Configuration module for doc-harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! and resolving them into the effective settings of the fresh and resume pipelines.
//!
//! # Example
//!
//! ```no_run
//! use doc_harvest::config::{load_config, PipelineSettings};
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! let settings = PipelineSettings::fresh(&config);
//! println!("Harvesting with {} workers", settings.concurrency);
//! ```

mod parser;
mod settings;
mod types;
mod validation;

// Re-export types
pub use settings::{FetchTimings, PipelineSettings, QualityMode, QualityThresholds, StrategyPriority};
pub use types::{
    Config, FetchConfig, OutputConfig, PipelineConfig, QualityConfig, ResumeConfig, SiteConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
