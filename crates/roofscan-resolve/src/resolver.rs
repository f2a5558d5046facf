//! Tiered property resolver: exact → address → fuzzy → partial.

use roofscan_core::{normalize, ResolverThresholds};
use tracing::debug;

use crate::registry::{snapshot, PropertyRegistry};
use crate::similarity::normalized_similarity;
use crate::types::*;

/// Registry entry with its comparison keys computed once per call.
struct Candidate<'a> {
    record: &'a PropertyRecord,
    name: String,
    address: String,
}

fn candidates(registry: &[PropertyRecord]) -> Vec<Candidate<'_>> {
    registry
        .iter()
        .map(|record| Candidate {
            record,
            name: normalize(&record.name),
            address: normalize(&record.address),
        })
        .collect()
}

/// Resolves extracted property names/addresses against a registry snapshot.
#[derive(Debug, Clone, Default)]
pub struct PropertyResolver {
    thresholds: ResolverThresholds,
}

impl PropertyResolver {
    pub fn new(thresholds: ResolverThresholds) -> Self {
        Self { thresholds }
    }


    /// Best single match, trying each tier only if the previous found nothing.
    ///
    /// Ties within a tier keep the first entry in registry order.
    pub fn find_best_match(
        &self,
        name: &str,
        address: Option<&str>,
        registry: &[PropertyRecord],
    ) -> Option<PropertyMatch> {
        if registry.is_empty() {
            return None;
        }

        let name = normalize(name);
        let address = address.map(normalize).unwrap_or_default();
        let candidates = candidates(registry);

        let found = self
            .exact(&name, &candidates)
            .or_else(|| self.by_address(&address, &candidates))
            .or_else(|| self.fuzzy(&name, &candidates))
            .or_else(|| self.partial(&name, &candidates));

        match &found {
            Some(m) => debug!(
                "Resolved {:?} to property {} ({}, {:.2})",
                name, m.id, m.match_type, m.confidence
            ),
            None => debug!("No property match for {:?}", name),
        }
        found
    }

    /// Ranked shortlist by fuzzy similarity for manual disambiguation.
    pub fn potential_matches(
        &self,
        name: &str,
        _address: Option<&str>,
        registry: &[PropertyRecord],
        limit: usize,
    ) -> Vec<PropertyMatch> {
        let name = normalize(name);
        if name.is_empty() || limit == 0 {
            return Vec::new();
        }

        let mut matches: Vec<PropertyMatch> = candidates(registry)
            .iter()
            .filter_map(|c| {
                let score = normalized_similarity(&name, &c.name);
                (score >= self.thresholds.shortlist_min)
                    .then(|| PropertyMatch::from_record(c.record, score, MatchType::Fuzzy))
            })
            .collect();

        // Stable sort keeps registry order among equal scores.
        matches.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(limit);
        matches
    }

    /// [`find_best_match`](Self::find_best_match) against a registry source.
    pub fn resolve<R: PropertyRegistry + ?Sized>(
        &self,
        name: &str,
        address: Option<&str>,
        registry: &R,
    ) -> Option<PropertyMatch> {
        self.find_best_match(name, address, &snapshot(registry))
    }

    /// [`potential_matches`](Self::potential_matches) against a registry source.
    pub fn shortlist<R: PropertyRegistry + ?Sized>(
        &self,
        name: &str,
        address: Option<&str>,
        registry: &R,
        limit: usize,
    ) -> Vec<PropertyMatch> {
        self.potential_matches(name, address, &snapshot(registry), limit)
    }

    fn exact(&self, name: &str, candidates: &[Candidate<'_>]) -> Option<PropertyMatch> {
        if name.is_empty() {
            return None;
        }
        candidates.iter().find(|c| c.name == name).map(|c| {
            PropertyMatch::from_record(c.record, self.thresholds.exact_confidence, MatchType::Exact)
        })
    }

    fn by_address(&self, address: &str, candidates: &[Candidate<'_>]) -> Option<PropertyMatch> {
        if address.is_empty() {
            return None;
        }
        candidates
            .iter()
            .find(|c| {
                !c.address.is_empty()
                    && (address.contains(c.address.as_str()) || c.address.contains(address))
            })
            .map(|c| {
                PropertyMatch::from_record(
                    c.record,
                    self.thresholds.address_confidence,
                    MatchType::Address,
                )
            })
    }

    fn fuzzy(&self, name: &str, candidates: &[Candidate<'_>]) -> Option<PropertyMatch> {
        if name.is_empty() {
            return None;
        }
        best_by(candidates, self.thresholds.fuzzy_min, |c| {
            normalized_similarity(name, &c.name)
        })
        .map(|(c, score)| PropertyMatch::from_record(c.record, score, MatchType::Fuzzy))
    }

    fn partial(&self, name: &str, candidates: &[Candidate<'_>]) -> Option<PropertyMatch> {
        let min_len = self.thresholds.min_token_len;
        let extracted = tokens(name, min_len);
        if extracted.is_empty() {
            return None;
        }
        best_by(candidates, self.thresholds.partial_min, |c| {
            token_overlap(&extracted, &tokens(&c.name, min_len))
        })
        .map(|(c, score)| PropertyMatch::from_record(c.record, score, MatchType::Partial))
    }
}

/// Highest-scoring candidate at or above `min`; first wins on ties.
fn best_by<'c, 'r, F>(
    candidates: &'c [Candidate<'r>],
    min: f64,
    score: F,
) -> Option<(&'c Candidate<'r>, f64)>
where
    F: Fn(&Candidate<'r>) -> f64,
{
    let mut best: Option<(&Candidate<'r>, f64)> = None;
    for c in candidates {
        let s = score(c);
        if s < min {
            continue;
        }
        if best.map_or(true, |(_, b)| s > b) {
            best = Some((c, s));
        }
    }
    best
}

fn tokens(normalized: &str, min_len: usize) -> Vec<&str> {
    normalized
        .split_whitespace()
        .filter(|t| t.chars().count() >= min_len)
        .collect()
}

/// Share of tokens that pair up by equality or containment.
///
/// Each registry token satisfies at most one extracted token.
fn token_overlap(extracted: &[&str], registry: &[&str]) -> f64 {
    let denominator = extracted.len().max(registry.len());
    if denominator == 0 {
        return 0.0;
    }

    let mut consumed = vec![false; registry.len()];
    let mut matched = 0usize;
    for e in extracted {
        let hit = (0..registry.len()).find(|&i| {
            let r = registry[i];
            !consumed[i] && (*e == r || e.contains(r) || r.contains(*e))
        });
        if let Some(i) = hit {
            consumed[i] = true;
            matched += 1;
        }
    }
    matched as f64 / denominator as f64
}
