//! Inspection-type classification by weighted keyword families.
//!
//! Confidence is `score / max_score` where `max_score` is a fixed empirical
//! normalizer, not the analytic maximum of the weight table. Treat it as a
//! ranking signal, not a probability.

use once_cell::sync::Lazy;
use regex::Regex;
use roofscan_core::ClassifierConfig;
use serde::{Deserialize, Serialize};

use super::issues::Severity;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionType {
    Annual,
    Storm,
    DueDiligence,
    Survey,
    #[default]
    Unknown,
}

impl std::fmt::Display for InspectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Annual => write!(f, "annual"),
            Self::Storm => write!(f, "storm"),
            Self::DueDiligence => write!(f, "due_diligence"),
            Self::Survey => write!(f, "survey"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub primary_type: InspectionType,
    pub confidence: f64,
    /// Matched evidence in discovery order.
    pub indicators: Vec<String>,
    pub urgency: Severity,
}

struct Family {
    kind: InspectionType,
    pattern: Regex,
}

fn keyword_pattern(keywords: &[&str]) -> Regex {
    let mut sorted: Vec<&str> = keywords.to_vec();
    sorted.sort_by_key(|k| std::cmp::Reverse(k.len()));
    let alternation = sorted
        .iter()
        .map(|k| regex::escape(k).replace(' ', r"\s+"))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternation)).expect("keyword pattern")
}

static FAMILIES: Lazy<Vec<Family>> = Lazy::new(|| {
    let table: [(InspectionType, &[&str]); 4] = [
        (
            InspectionType::Storm,
            &[
                "storm damage", "hail damage", "wind damage", "storm", "hail", "hurricane",
                "tornado", "wind", "insurance claim", "impact damage",
            ],
        ),
        (
            InspectionType::Annual,
            &[
                "annual inspection", "annual", "semi-annual", "routine", "preventive maintenance",
                "maintenance inspection", "yearly", "scheduled inspection",
            ],
        ),
        (
            InspectionType::DueDiligence,
            &[
                "due diligence", "acquisition", "pre-purchase", "property condition assessment",
                "transaction", "buyer", "purchase", "lender",
            ],
        ),
        (
            InspectionType::Survey,
            &[
                "roof survey", "survey", "infrared", "core sample", "core cut", "moisture scan",
                "condition assessment", "capital planning",
            ],
        ),
    ];
    table
        .into_iter()
        .map(|(kind, keywords)| Family {
            kind,
            pattern: keyword_pattern(keywords),
        })
        .collect()
});

static CONTEXT_CLUES: Lazy<Regex> = Lazy::new(|| {
    keyword_pattern(&[
        "insurance adjuster", "adjuster", "claim number", "date of loss", "closing date",
        "purchase agreement", "maintenance schedule", "warranty compliance", "moisture survey",
        "infrared scan",
    ])
});

static EMERGENCY: Lazy<Regex> =
    Lazy::new(|| keyword_pattern(&["immediate", "immediately", "emergency", "critical"]));

/// Label-only fallback, first match wins.
static LABEL_FALLBACK: Lazy<Vec<(Regex, InspectionType)>> = Lazy::new(|| {
    vec![
        (keyword_pattern(&["storm", "hail", "wind"]), InspectionType::Storm),
        (keyword_pattern(&["annual"]), InspectionType::Annual),
        (keyword_pattern(&["due diligence", "acquisition"]), InspectionType::DueDiligence),
        (keyword_pattern(&["survey"]), InspectionType::Survey),
    ]
});

struct FamilyScore {
    kind: InspectionType,
    score: f64,
    indicators: Vec<String>,
}

fn score_family(family: &Family, text: &str, label: &str, config: &ClassifierConfig) -> FamilyScore {
    let weight = match family.kind {
        InspectionType::Storm => config.storm_weight,
        InspectionType::Annual => config.annual_weight,
        InspectionType::DueDiligence => config.due_diligence_weight,
        InspectionType::Survey => config.survey_weight,
        InspectionType::Unknown => 0.0,
    };

    let mut score = 0.0;
    let mut indicators = Vec::new();

    if let Some(m) = family.pattern.find(label) {
        score += config.label_multiplier * weight;
        indicators.push(format!("report type: {}", m.as_str().to_lowercase()));
    }

    let mut hits = 0usize;
    for m in family.pattern.find_iter(text) {
        hits += 1;
        let keyword = m.as_str().split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
        if !indicators.contains(&keyword) {
            indicators.push(keyword);
        }
    }
    if hits > 0 {
        let repeats = (hits - 1).min(config.max_repetitions);
        score += weight + repeats as f64 * config.repeat_fraction * weight;
    }

    FamilyScore {
        kind: family.kind,
        score,
        indicators,
    }
}

/// Classify a report from its text and free-text report-type label.
pub fn classify(text: &str, label: &str, config: &ClassifierConfig, max_indicators: usize) -> Classification {
    let scores: Vec<FamilyScore> = FAMILIES
        .iter()
        .map(|f| score_family(f, text, label, config))
        .collect();

    // Earlier families win ties.
    let best = scores.iter().fold(None::<&FamilyScore>, |best, s| match best {
        Some(b) if b.score >= s.score => Some(b),
        _ => Some(s),
    });

    let mut clues: Vec<String> = Vec::new();
    for m in CONTEXT_CLUES.find_iter(text) {
        let clue = m.as_str().split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
        if !clues.contains(&clue) {
            clues.push(clue);
        }
    }
    let bonus = clues.len() as f64 * config.context_bonus;

    let mut indicators: Vec<String> = Vec::new();
    let (mut primary_type, mut confidence) = match best {
        Some(b) if b.score > 0.0 && b.score >= config.min_score => {
            indicators.extend(b.indicators.iter().cloned());
            (b.kind, b.score / config.max_score + bonus)
        }
        _ => {
            let partial = best.map_or(0.0, |b| b.score);
            match LABEL_FALLBACK.iter().find(|(re, _)| re.is_match(label)) {
                Some((re, kind)) => {
                    if let Some(m) = re.find(label) {
                        indicators.push(format!("report type: {}", m.as_str().to_lowercase()));
                    }
                    let derived = partial / config.max_score + bonus;
                    (*kind, derived.max(config.label_fallback_confidence))
                }
                None => {
                    if let Some(b) = best.filter(|b| b.score > 0.0) {
                        indicators.extend(b.indicators.iter().cloned());
                    }
                    (InspectionType::Unknown, (partial / config.max_score + bonus).max(0.0))
                }
            }
        }
    };

    for clue in clues {
        if !indicators.contains(&clue) {
            indicators.push(clue);
        }
    }

    let mut urgency = if primary_type == InspectionType::Storm {
        Severity::Medium
    } else {
        Severity::Low
    };

    if let Some(m) = EMERGENCY.find(text) {
        urgency = urgency.max(Severity::High);
        indicators.push(format!("urgent: {}", m.as_str().to_lowercase()));
        if primary_type == InspectionType::Unknown {
            primary_type = InspectionType::Storm;
            confidence = confidence.max(config.emergency_storm_confidence);
        }
    }

    indicators.truncate(max_indicators);
    let confidence = confidence.clamp(0.0, 1.0);

    tracing::debug!(
        primary_type = %primary_type,
        confidence,
        indicators = indicators.len(),
        "Classified inspection"
    );

    Classification {
        primary_type,
        confidence,
        indicators,
        urgency,
    }
}
