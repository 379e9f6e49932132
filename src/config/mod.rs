//! Configuration module for docbundle
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! A configuration names an output directory and one `[[doc]]` table per
//! documentation set, each carrying its source, crawl options, cleanup
//! filters, entry extractor and response hooks.
//!
//! # Example
//!
//! ```no_run
//! use docbundle::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("docbundle.toml")).unwrap();
//! for doc in &config.docs {
//!     println!("{} from {}", doc.name, doc.base_url);
//! }
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, DocConfig, ExtractorConfig, ExtractorKind, FilterConfig, FilterKind, HooksConfig,
    OptionsConfig, OutputConfig, RewriteConfig, SourceConfig, SourceKind,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
