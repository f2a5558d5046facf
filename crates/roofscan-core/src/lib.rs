//! Roofscan Core: configuration, error types and text normalization.

pub mod config;
pub mod error;
pub mod text;

pub use config::{
    ClassifierConfig, ExtractionConfig, IssueCostDefaults, ResolverThresholds, RoofscanConfig,
};
pub use error::{Error, Result};
pub use text::normalize;
