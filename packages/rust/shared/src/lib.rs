//! Shared types, error model, and configuration for Solguide.
//!
//! This crate is the foundation depended on by all other Solguide crates.
//! It provides:
//! - [`SolguideError`] — the unified error type
//! - Domain types ([`Opportunity`], [`ParsedDocument`], [`ConsolidatedModel`], …)
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, GenerationConfig, ObjectStoreConfig, RecordStoreConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, validate_api_keys,
};
pub use error::{Result, SolguideError};
pub use types::{
    ConflictAnalysis, ConsolidatedModel, DocumentType, GenerationDebug, GenerationResult,
    LIVE_STATUSES, MergePriority, Opportunity, OpportunitySummary, ParsedDocument, Status,
    VolumeRequirement,
};
