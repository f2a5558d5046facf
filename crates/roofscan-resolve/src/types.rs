//! Resolver types.

use serde::{Deserialize, Serialize};

/// Which tier produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    /// Normalized names are identical.
    Exact,
    /// One normalized address contains the other.
    Address,
    /// Edit-distance similarity of names.
    Fuzzy,
    /// Word-level overlap of names.
    Partial,
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Address => write!(f, "address"),
            Self::Fuzzy => write!(f, "fuzzy"),
            Self::Partial => write!(f, "partial"),
        }
    }
}

/// A non-deleted property record as exposed by the registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
}

/// A registry entry that matched extracted property identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyMatch {
    pub id: String,
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub confidence: f64,
    pub match_type: MatchType,
}

impl PropertyMatch {
    pub fn from_record(record: &PropertyRecord, confidence: f64, match_type: MatchType) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            address: record.address.clone(),
            city: record.city.clone(),
            state: record.state.clone(),
            confidence: confidence.clamp(0.0, 1.0),
            match_type,
        }
    }
}
