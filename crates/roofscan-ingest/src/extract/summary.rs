//! Report-level rollups derived from the issue list, with explicit
//! statements in the text taking precedence.

use once_cell::sync::Lazy;
use regex::Regex;
use roofscan_core::text::collapse_whitespace;
use serde::{Deserialize, Serialize};

use super::issues::{Issue, Severity};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallCondition {
    Excellent,
    #[default]
    Good,
    Fair,
    Poor,
    Critical,
}

impl OverallCondition {
    pub fn from_label(label: &str) -> Option<Self> {
        match collapse_whitespace(&label.to_lowercase()).as_str() {
            "excellent" => Some(Self::Excellent),
            "good" | "very good" => Some(Self::Good),
            "fair" => Some(Self::Fair),
            "poor" => Some(Self::Poor),
            "critical" | "failed" | "failing" => Some(Self::Critical),
            _ => None,
        }
    }
}

static CONDITION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:overall|general)[ \t]+(?:roof[ \t]+)?condition(?:[ \t]+(?:rating|is|was))?[ \t]*[:\-]?[ \t]*(excellent|very[ \t]+good|good|fair|poor|critical|failed|failing)\b",
    )
    .expect("condition pattern")
});

static WITHIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bwithin[ \t]+(?:the[ \t]+next[ \t]+)?(\d{1,3})[ \t]+(days?|weeks?|months?)\b")
        .expect("within pattern")
});

static TIMEFRAME_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^[ \t]*(?:recommended[ \t]+)?time[ \t]?frame[ \t]*:[ \t]*(.+?)[ \t]*$")
        .expect("timeframe pattern")
});

/// Explicit overall condition, else derived from issue severities.
pub fn overall_condition(text: &str, issues: &[Issue]) -> OverallCondition {
    if let Some(explicit) = CONDITION_RE
        .captures(text)
        .and_then(|c| OverallCondition::from_label(&c[1]))
    {
        return explicit;
    }

    let count = |s: Severity| issues.iter().filter(|i| i.severity == s).count();
    let high = count(Severity::High);
    if count(Severity::Critical) > 0 {
        OverallCondition::Critical
    } else if high >= 3 {
        OverallCondition::Poor
    } else if high > 0 || count(Severity::Medium) >= 3 {
        OverallCondition::Fair
    } else {
        OverallCondition::Good
    }
}

/// Recommendations of critical, then high issues, without repeats.
pub fn priority_actions(issues: &[Issue], limit: usize) -> Vec<String> {
    let mut actions: Vec<String> = Vec::new();
    for tier in [Severity::Critical, Severity::High] {
        for issue in issues.iter().filter(|i| i.severity == tier) {
            if actions.len() >= limit {
                return actions;
            }
            if !actions.contains(&issue.recommendation) {
                actions.push(issue.recommendation.clone());
            }
        }
    }
    actions
}

pub fn recommended_timeframe(text: &str, issues: &[Issue]) -> String {
    if let Some(c) = TIMEFRAME_LABEL_RE.captures(text) {
        return collapse_whitespace(&c[1]);
    }
    if let Some(c) = WITHIN_RE.captures(text) {
        return format!("Within {} {}", &c[1], c[2].to_lowercase());
    }

    match issues.iter().map(|i| i.severity).max() {
        Some(Severity::Critical) => "Immediate".into(),
        Some(Severity::High) => "Within 30 days".into(),
        Some(Severity::Medium) => "Within 90 days".into(),
        Some(Severity::Low) => "Next scheduled maintenance".into(),
        None => String::new(),
    }
}

pub fn estimated_repair_cost(issues: &[Issue]) -> f64 {
    issues.iter().map(|i| i.estimated_cost).sum()
}
