//! Property resolution against a registry snapshot.
//!
//! Strategies are tried as tiers (exact, address, fuzzy, partial); the first
//! tier that produces a candidate wins.

pub mod registry;
pub mod resolver;
pub mod similarity;
pub mod types;

pub use registry::PropertyRegistry;
pub use resolver::PropertyResolver;
pub use similarity::similarity;
pub use types::*;
