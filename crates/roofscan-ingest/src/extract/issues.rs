//! Deficiency extraction. Named sections are read first, then
//! whole-document patterns, then single-keyword fallbacks.
//!
//! Every layer feeds one [`IssueCollector`], which rejects short
//! descriptions, near-duplicates and anything past the cap. A layer that
//! finds nothing is not an error.

use once_cell::sync::Lazy;
use regex::Regex;
use roofscan_core::text::collapse_whitespace;
use roofscan_core::{normalize, ExtractionConfig, IssueCostDefaults};
use serde::{Deserialize, Serialize};

use super::sections::{find_sections, strip_bullet, SectionKind};

/// Location recorded when none can be inferred.
pub const DEFAULT_LOCATION: &str = "General";
/// Type recorded when no keyword family matches.
pub const DEFAULT_ISSUE_TYPE: &str = "General";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Map a severity label ("minor", "severe", ...) to a tier.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "low" | "minor" => Some(Self::Low),
            "medium" | "moderate" => Some(Self::Medium),
            "high" | "severe" | "major" => Some(Self::High),
            "critical" | "urgent" | "emergency" => Some(Self::Critical),
            _ => None,
        }
    }

    pub fn default_cost(self, costs: &IssueCostDefaults) -> f64 {
        match self {
            Self::Critical => costs.critical,
            Self::High => costs.high,
            Self::Medium => costs.medium,
            Self::Low => costs.low,
        }
    }

    pub fn default_recommendation(self) -> &'static str {
        match self {
            Self::Critical => "Repair immediately to prevent further damage",
            Self::High => "Schedule repair within 30 days",
            Self::Medium => "Address during the next maintenance cycle",
            Self::Low => "Monitor during routine inspections",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// A single deficiency found in a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    #[serde(rename = "type")]
    pub issue_type: String,
    pub severity: Severity,
    pub location: String,
    pub description: String,
    pub recommendation: String,
    pub estimated_cost: f64,
}

// Severity keyword families, checked critical → high → low; otherwise medium.
static CRITICAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:immediate(?:ly)?|emergency|fail(?:s|ed|ing|ure|ures)?|active[ \t]+leak(?:s|ing)?|critical)\b")
        .expect("critical pattern")
});
static HIGH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:severe(?:ly)?|major|damage[ds]?|crack(?:s|ed|ing)?|missing)\b").expect("high pattern")
});
static LOW_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:minor|cosmetic|monitor(?:ed|ing)?)\b").expect("low pattern")
});

/// Keyword → issue type, first match wins.
static TYPE_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"\bleak", "Active Leak"),
        (r"\bponding\b|\bstanding[ \t]+water\b", "Ponding Water"),
        (r"\bhail\b", "Hail Damage"),
        (r"\bwind\b", "Wind Damage"),
        (r"\bflashings?\b", "Flashing"),
        (r"\bseams?\b", "Seam Failure"),
        (r"\bblister", "Blistering"),
        (r"\bpunctur|\bholes?\b", "Puncture"),
        (r"\bdrains?\b|\bscuppers?\b|\bgutters?\b|\bdownspouts?\b", "Drainage"),
        (r"\bmembrane\b", "Membrane Damage"),
        (r"\bsealant\b|\bcaulk", "Sealant Failure"),
        (r"\bcoping\b|\bparapet", "Coping/Parapet"),
        (r"\bhvac\b|\bcurbs?\b|\bpenetrations?\b|\bpipe[ \t]+boots?\b|\bequipment\b", "Penetrations"),
        (r"\binsulation\b|\bmoisture\b|\bwet\b", "Wet Insulation"),
        (r"\bshingles?\b|\bgranules?\b", "Shingles"),
        (r"\brust|\bcorro", "Corrosion"),
        (r"\bdebris\b|\bvegetation\b", "Debris"),
        (r"\bcrack", "Cracking"),
        (r"\bskylights?\b", "Skylight"),
    ]
    .into_iter()
    .map(|(p, t)| (Regex::new(&format!("(?i){}", p)).expect("type pattern"), t))
    .collect()
});

const LOCATION_PREFIX: &str = r"(?:north|south|east|west)(?:east|west)?(?:ern)?[ \t]+(?:side|corner|section|elevation|wall|area|parapet|roof|slope|end)|(?:main|upper|lower|low|high)[ \t]+roof(?:[ \t]+(?:area|section))?|roof[ \t]+(?:area|section)[ \t]+(?-i:[A-Z0-9]{1,2})|(?:mechanical|penthouse)[ \t]+(?:area|roof)";

static LOCATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b({}|(?:near|at|around)[ \t]+(?:the[ \t]+)?(?:roof[ \t]+)?(?:drains?|hvac(?:[ \t]+units?)?|skylights?|parapet(?:[ \t]+walls?)?|scuppers?|curbs?|penetrations?|loading[ \t]+dock|canopy))\b",
        LOCATION_PREFIX
    ))
    .expect("location pattern")
});

/// "North side: description" lines.
static LOCATION_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?im)^[ \t]*(?:[-*•–][ \t]*)?({})[ \t]*[:\-–][ \t]*(.+)$",
        LOCATION_PREFIX
    ))
    .expect("location line pattern")
});

/// "Issue: description – location – severity – cost" tuples.
static TUPLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?im)^[ \t]*(?:[-*•][ \t]*)?(?:issue|deficiency|finding|problem)[ \t]*(?:#?[ \t]*\d+)?[ \t]*:[ \t]*(.+?)[ \t]+[-–—|][ \t]+(.+?)[ \t]+[-–—|][ \t]+([a-z]+)(?:[ \t]+[-–—|][ \t]+\$?[ \t]*(\d[\d,]*(?:\.\d+)?))?[ \t]*$",
    )
    .expect("tuple pattern")
});

static COST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$[ \t]*(\d[\d,]*(?:\.\d{1,2})?)").expect("cost pattern")
});

/// Low-confidence single-keyword fallbacks. Types match [`TYPE_RULES`] names.
static LEGACY_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"\bponding(?:[ \t]+water)?\b", "Ponding Water"),
        (r"\bmembrane[ \t]+(?:damage|deterioration|shrinkage|failure)\b", "Membrane Damage"),
        (r"\bhail[ \t]+(?:damage|impacts?|strikes?)\b", "Hail Damage"),
        (r"\bwind[ \t]+(?:damage|uplift|scour)\b", "Wind Damage"),
        (
            r"\bflashing[ \t]+(?:damage|failure|separation|deterioration)\b|\b(?:loose|damaged|missing|failed)[ \t]+flashings?\b",
            "Flashing",
        ),
        (r"\b(?:open|split|failed|separated)[ \t]+(?:lap[ \t]+)?seams?\b", "Seam Failure"),
        (r"\bblister(?:s|ing)\b", "Blistering"),
        (r"\bpunctures?\b", "Puncture"),
        (
            r"\b(?:clogged|blocked|obstructed)[ \t]+(?:roof[ \t]+)?(?:drains?|scuppers?|gutters?)\b",
            "Drainage",
        ),
        (r"\bwet[ \t]+insulation\b|\bmoisture[ \t]+intrusion\b", "Wet Insulation"),
        (r"\bactive[ \t]+leaks?\b|\broof[ \t]+leaks?\b", "Active Leak"),
        (r"\bmissing[ \t]+shingles?\b|\bgranule[ \t]+loss\b", "Shingles"),
        (
            r"\b(?:deteriorated|cracked|failed|missing)[ \t]+(?:sealant|caulk(?:ing)?)\b",
            "Sealant Failure",
        ),
        (r"\brust(?:ed|ing)?\b|\bcorrosion\b", "Corrosion"),
        (r"\bdebris\b", "Debris"),
    ]
    .into_iter()
    .map(|(p, t)| (Regex::new(&format!("(?i){}", p)).expect("legacy pattern"), t))
    .collect()
});

/// Infer severity from description wording.
pub fn infer_severity(text: &str) -> Severity {
    if CRITICAL_RE.is_match(text) {
        Severity::Critical
    } else if HIGH_RE.is_match(text) {
        Severity::High
    } else if LOW_RE.is_match(text) {
        Severity::Low
    } else {
        Severity::Medium
    }
}

/// Infer an issue type label from description wording.
pub fn infer_type(text: &str) -> &'static str {
    TYPE_RULES
        .iter()
        .find(|(re, _)| re.is_match(text))
        .map(|(_, t)| *t)
        .unwrap_or(DEFAULT_ISSUE_TYPE)
}

/// Location phrase mentioned in a description, if any.
pub fn infer_location(text: &str) -> Option<String> {
    LOCATION_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| collapse_whitespace(m.as_str()))
}

/// First explicit `$` amount in a description.
pub fn explicit_cost(text: &str) -> Option<f64> {
    COST_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().replace(',', "").parse().ok())
}

/// Accumulates issues while enforcing length, dedup and cap rules.
pub struct IssueCollector<'c> {
    config: &'c ExtractionConfig,
    costs: &'c IssueCostDefaults,
    issues: Vec<Issue>,
    /// (normalized description, normalized location, normalized type)
    keys: Vec<(String, String, String)>,
}

impl<'c> IssueCollector<'c> {
    pub fn new(config: &'c ExtractionConfig, costs: &'c IssueCostDefaults) -> Self {
        Self {
            config,
            costs,
            issues: Vec::new(),
            keys: Vec::new(),
        }
    }

    pub fn is_full(&self) -> bool {
        self.issues.len() >= self.config.max_issues
    }

    pub fn has_type(&self, issue_type: &str) -> bool {
        let t = normalize(issue_type);
        self.keys.iter().any(|(_, _, kt)| *kt == t)
    }

    /// Build an issue from free description text, inferring the rest.
    pub fn push_description(&mut self, description: &str, recommendation: Option<&str>) -> bool {
        let description = collapse_whitespace(description);
        let severity = infer_severity(&description);
        let issue = Issue {
            issue_type: infer_type(&description).to_string(),
            severity,
            location: infer_location(&description).unwrap_or_else(|| DEFAULT_LOCATION.into()),
            recommendation: recommendation
                .map(collapse_whitespace)
                .unwrap_or_else(|| severity.default_recommendation().into()),
            estimated_cost: explicit_cost(&description)
                .unwrap_or_else(|| severity.default_cost(self.costs)),
            description,
        };
        self.push(issue)
    }

    /// Add an issue unless it is too short, a near-duplicate, or over the cap.
    pub fn push(&mut self, issue: Issue) -> bool {
        if self.is_full() {
            return false;
        }
        if issue.description.trim().chars().count() <= self.config.min_description_len {
            return false;
        }

        let desc = normalize(&issue.description);
        let loc = normalize(&issue.location);
        let kind = normalize(&issue.issue_type);
        if desc.is_empty() || self.is_duplicate(&desc, &loc, &kind) {
            return false;
        }

        self.keys.push((desc, loc, kind));
        self.issues.push(Issue {
            estimated_cost: issue.estimated_cost.max(0.0),
            ..issue
        });
        true
    }

    fn is_duplicate(&self, desc: &str, loc: &str, kind: &str) -> bool {
        let generic = normalize(DEFAULT_LOCATION);
        self.keys.iter().any(|(d, l, k)| {
            let same_description = d.contains(desc) || desc.contains(d.as_str());
            let same_place = k == kind
                && !loc.is_empty()
                && *loc != generic
                && (l.contains(loc) || loc.contains(l.as_str()));
            same_description || same_place
        })
    }

    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }
}

/// Extract a de-duplicated, capped issue list from report text.
pub fn extract_issues(
    text: &str,
    config: &ExtractionConfig,
    costs: &IssueCostDefaults,
) -> Vec<Issue> {
    let mut collector = IssueCollector::new(config, costs);

    collect_sections(text, &mut collector);
    collect_tuples(text, &mut collector);
    collect_location_lines(text, &mut collector);
    collect_legacy(text, &mut collector);

    collector.into_issues()
}

/// Layer 1: one issue per bulleted/numbered line in a named section.
fn collect_sections(text: &str, collector: &mut IssueCollector<'_>) {
    for section in find_sections(text) {
        let mut items: Vec<String> = Vec::new();
        for line in &section.lines {
            match strip_bullet(line) {
                Some(body) => items.push(body.to_string()),
                // Wrapped continuation of the previous item.
                None => {
                    if let Some(last) = items.last_mut() {
                        last.push(' ');
                        last.push_str(line);
                    }
                }
            }
        }

        for item in items {
            let recommendation =
                (section.kind == SectionKind::Recommendations).then_some(item.as_str());
            collector.push_description(&item, recommendation);
        }
    }
}

/// Layer 2a: label-separated tuples.
fn collect_tuples(text: &str, collector: &mut IssueCollector<'_>) {
    for caps in TUPLE_RE.captures_iter(text) {
        let description = collapse_whitespace(&caps[1]);
        let location = collapse_whitespace(&caps[2]);
        let (severity, cost) = match Severity::from_label(&caps[3]) {
            Some(s) => (s, s.default_cost(collector.costs)),
            None => (Severity::Medium, collector.costs.fallback),
        };
        let estimated_cost = caps
            .get(4)
            .and_then(|m| m.as_str().replace(',', "").parse().ok())
            .unwrap_or(cost);

        collector.push(Issue {
            issue_type: infer_type(&description).to_string(),
            severity,
            location,
            recommendation: severity.default_recommendation().into(),
            estimated_cost,
            description,
        });
    }
}

/// Layer 2b: location-anchored lines.
fn collect_location_lines(text: &str, collector: &mut IssueCollector<'_>) {
    for caps in LOCATION_LINE_RE.captures_iter(text) {
        let location = collapse_whitespace(&caps[1]);
        let description = collapse_whitespace(&caps[2]);
        let severity = infer_severity(&description);
        collector.push(Issue {
            issue_type: infer_type(&description).to_string(),
            severity,
            location,
            recommendation: severity.default_recommendation().into(),
            estimated_cost: explicit_cost(&description)
                .unwrap_or_else(|| severity.default_cost(collector.costs)),
            description,
        });
    }
}

/// Layer 3: single-keyword fallbacks, skipped when the type is already known.
fn collect_legacy(text: &str, collector: &mut IssueCollector<'_>) {
    for (re, issue_type) in LEGACY_RULES.iter() {
        if collector.is_full() {
            return;
        }
        if collector.has_type(issue_type) {
            continue;
        }
        let Some(m) = re.find(text) else {
            continue;
        };

        let line = enclosing_line(text, m.start(), m.end());
        let description = strip_bullet(line).unwrap_or(line);
        let description = collapse_whitespace(description);
        let severity = infer_severity(&description);
        collector.push(Issue {
            issue_type: (*issue_type).to_string(),
            severity,
            location: infer_location(&description).unwrap_or_else(|| DEFAULT_LOCATION.into()),
            recommendation: severity.default_recommendation().into(),
            estimated_cost: explicit_cost(&description)
                .unwrap_or_else(|| severity.default_cost(collector.costs)),
            description,
        });
    }
}

fn enclosing_line(text: &str, start: usize, end: usize) -> &str {
    let line_start = text[..start].rfind('\n').map_or(0, |i| i + 1);
    let line_end = text[end..].find('\n').map_or(text.len(), |i| end + i);
    text[line_start..line_end].trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> Vec<Issue> {
        extract_issues(text, &ExtractionConfig::default(), &IssueCostDefaults::default())
    }

    #[test]
    fn test_deficiencies_section_three_bullets() {
        let text = "\
DEFICIENCIES
- Ponding water observed near the northeast roof drain
- Open seams along the west parapet wall flashing
- Minor granule loss on the canopy shingles
";
        let issues = extract(text);
        assert_eq!(issues.len(), 3);
        for issue in &issues {
            assert!(issue.description.len() > 10);
        }
        assert_eq!(issues[0].issue_type, "Ponding Water");
        assert_eq!(issues[0].location, "northeast roof");
        assert_eq!(issues[1].location, "west parapet");
        assert_eq!(issues[2].severity, Severity::Low);
        assert_eq!(issues[2].location, DEFAULT_LOCATION);
    }

    #[test]
    fn test_severity_inference() {
        assert_eq!(infer_severity("Active leak above suite 200"), Severity::Critical);
        assert_eq!(infer_severity("Immediate replacement required"), Severity::Critical);
        assert_eq!(infer_severity("Flashing has failed at the curb"), Severity::Critical);
        assert_eq!(infer_severity("Severe blistering across field"), Severity::High);
        assert_eq!(infer_severity("Cracked sealant at coping joints"), Severity::High);
        assert_eq!(infer_severity("Minor surface crazing"), Severity::Low);
        assert_eq!(infer_severity("Cosmetic staining on walls"), Severity::Low);
        assert_eq!(infer_severity("Debris accumulation at scupper"), Severity::Medium);
    }

    #[test]
    fn test_default_costs_by_severity() {
        let costs = IssueCostDefaults::default();
        assert_eq!(Severity::Critical.default_cost(&costs), 5000.0);
        assert_eq!(Severity::High.default_cost(&costs), 2500.0);
        assert_eq!(Severity::Medium.default_cost(&costs), 1200.0);
        assert_eq!(Severity::Low.default_cost(&costs), 500.0);
    }

    #[test]
    fn test_explicit_cost_wins() {
        let text = "FINDINGS\n- Replace 40 LF of loose coping cap, estimated $3,250.00\n";
        let issues = extract(text);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].estimated_cost, 3250.0);
        assert_eq!(issues[0].issue_type, "Coping/Parapet");
    }

    #[test]
    fn test_structured_tuple() {
        let text = "Issue 1: Split membrane seam at drain sump – Roof Area B – high – $1,800\n\
                    Issue 2: Loose pitch pan at gas line – Mechanical area – urgentish\n";
        let issues = extract(text);
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].description, "Split membrane seam at drain sump");
        assert_eq!(issues[0].location, "Roof Area B");
        assert_eq!(issues[0].severity, Severity::High);
        assert_eq!(issues[0].estimated_cost, 1800.0);
        // Unrecognized severity label: medium tier, fallback cost.
        assert_eq!(issues[1].severity, Severity::Medium);
        assert_eq!(issues[1].estimated_cost, 1000.0);
    }

    #[test]
    fn test_location_anchored_line() {
        let text = "North side: Coping cap displaced along 30 feet of parapet\n";
        let issues = extract(text);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].location, "North side");
        assert_eq!(issues[0].description, "Coping cap displaced along 30 feet of parapet");
    }

    #[test]
    fn test_legacy_keyword_fallback() {
        let text = "During the walk we noted ponding water at the low roof.\n\
                    Additional ponding was seen later.";
        let issues = extract(text);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, "Ponding Water");
        assert_eq!(issues[0].location, "low roof");
    }

    #[test]
    fn test_legacy_skips_overlap_with_section_issue() {
        let text = "\
FINDINGS
- Blistering across the east section of the field membrane

The blistering noted above appears stable.
";
        let issues = extract(text);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, "Blistering");
    }

    #[test]
    fn test_summary_repeats_are_deduplicated() {
        let text = "\
EXECUTIVE SUMMARY
- Clogged drains at the north side causing ponding

DEFICIENCIES
1. Clogged drains at the north side causing ponding
2. Wet insulation under the HVAC curb at the mechanical area
";
        let issues = extract(text);
        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn test_recommendation_section_sets_recommendation() {
        let text = "RECOMMENDATIONS\n- Replace deteriorated pitch pans at rooftop units\n";
        let issues = extract(text);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].recommendation, issues[0].description);
    }

    #[test]
    fn test_short_descriptions_rejected() {
        let issues = extract("DEFICIENCIES\n- Leak\n- Bad drain\n");
        assert!(issues.is_empty());
    }

    #[test]
    fn test_cap_at_max_issues() {
        let mut text = String::from("DEFICIENCIES\n");
        for i in 0..45 {
            text.push_str(&format!("- Deficiency number {} observed at test cut location {}\n", i, i));
        }
        let issues = extract(&text);
        assert_eq!(issues.len(), 25);
        assert!(issues[0].description.contains("number 0 "));
        assert!(issues[24].description.contains("number 24 "));
    }

    #[test]
    fn test_wrapped_line_continues_item() {
        let text = "FINDINGS\n- Base flashing has separated from the\nparapet wall at the south elevation\n";
        let issues = extract(text);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].description.ends_with("south elevation"));
    }

    #[test]
    fn test_empty_text() {
        assert!(extract("").is_empty());
    }
}
