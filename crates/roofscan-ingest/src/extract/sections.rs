//! Named-section detection as a line state machine.
//!
//! A header line enters a section; body lines are collected until a blank
//! line or a new all-caps header. Blank lines directly under a header are
//! skipped.

use roofscan_core::normalize;
use serde::{Deserialize, Serialize};

/// Longest line still considered a header.
const MAX_HEADER_LEN: usize = 60;

const BULLETS: [char; 7] = ['-', '*', '•', '–', '·', '▪', '●'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    ExecutiveSummary,
    Deficiencies,
    Findings,
    Recommendations,
}

impl SectionKind {
    /// Header keywords, normalized. Checked in declaration order so that
    /// "summary of findings" lands in the executive summary.
    const KEYWORDS: &'static [(SectionKind, &'static [&'static str])] = &[
        (
            SectionKind::ExecutiveSummary,
            &["executive summary", "summary of findings", "inspection summary"],
        ),
        (
            SectionKind::Deficiencies,
            &["deficiencies", "deficiency", "issues identified", "problems identified", "roof issues"],
        ),
        (SectionKind::Findings, &["findings", "observations"]),
        (
            SectionKind::Recommendations,
            &["recommendations", "priority repairs", "recommended repairs", "repair recommendations"],
        ),
    ];
}

/// A located section and its non-blank body lines, trimmed.
#[derive(Debug, Clone, PartialEq)]
pub struct Section<'a> {
    pub kind: SectionKind,
    pub lines: Vec<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Outside,
    InSection { kind: SectionKind, has_body: bool },
}

/// Scan `text` for named sections, in document order.
pub fn find_sections(text: &str) -> Vec<Section<'_>> {
    let mut sections: Vec<Section<'_>> = Vec::new();
    let mut state = State::Outside;

    for raw in text.lines() {
        let line = raw.trim();
        state = match state {
            State::Outside => match header_kind(line) {
                Some(kind) => enter(&mut sections, kind),
                None => State::Outside,
            },
            State::InSection { kind, has_body } => {
                if line.is_empty() {
                    if has_body {
                        State::Outside
                    } else {
                        State::InSection { kind, has_body }
                    }
                } else if let Some(next) = header_kind(line) {
                    enter(&mut sections, next)
                } else if is_caps_header(line) {
                    State::Outside
                } else {
                    if let Some(section) = sections.last_mut() {
                        section.lines.push(line);
                    }
                    State::InSection { kind, has_body: true }
                }
            }
        };
    }

    sections.retain(|s| !s.lines.is_empty());
    sections
}

fn enter<'a>(sections: &mut Vec<Section<'a>>, kind: SectionKind) -> State {
    sections.push(Section { kind, lines: Vec::new() });
    State::InSection { kind, has_body: false }
}

/// Section kind named by a header line, if the line is shaped like a header.
pub fn header_kind(line: &str) -> Option<SectionKind> {
    // Numbered headers ("3. Findings") are allowed; symbol bullets are not.
    if line.is_empty() || line.chars().count() > MAX_HEADER_LEN || starts_with_symbol(line) {
        return None;
    }

    let normalized = strip_numbering(&normalize(line));
    let word_count = normalized.split_whitespace().count();

    SectionKind::KEYWORDS.iter().find_map(|(kind, keywords)| {
        let hit = keywords.iter().find(|kw| normalized.contains(**kw))?;
        let shaped = is_caps_header(line)
            || line.ends_with(':')
            || (word_count <= 5 && normalized.starts_with(*hit));
        shaped.then_some(*kind)
    })
}

/// All-caps line with at least three letters.
pub fn is_caps_header(line: &str) -> bool {
    if line.chars().count() > MAX_HEADER_LEN || is_bullet(line) {
        return false;
    }
    let letters = line.chars().filter(|c| c.is_alphabetic()).count();
    letters >= 3 && !line.chars().any(|c| c.is_lowercase())
}

/// Bulleted or numbered list line.
pub fn is_bullet(line: &str) -> bool {
    strip_bullet(line).is_some()
}

fn starts_with_symbol(line: &str) -> bool {
    line.trim_start().starts_with(BULLETS)
}

/// Body of a bulleted (`-`, `*`, `•`, `–`) or numbered (`1.`, `1)`, `(1)`) line.
pub fn strip_bullet(line: &str) -> Option<&str> {
    let line = line.trim_start();
    let rest = if let Some(rest) = line.strip_prefix(BULLETS) {
        rest
    } else if let Some(rest) = line.strip_prefix('(') {
        let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits == 0 || digits > 2 {
            return None;
        }
        rest[digits..].strip_prefix(')')?
    } else {
        let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits == 0 || digits > 2 {
            return None;
        }
        line[digits..].strip_prefix(['.', ')'])?
    };

    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let body = rest.trim();
    (!body.is_empty()).then_some(body)
}

/// Drop leading section numbering such as "3 " or "iv " from a normalized header.
fn strip_numbering(normalized: &str) -> String {
    let mut words = normalized.split_whitespace().peekable();
    while let Some(word) = words.peek() {
        let roman = word.len() <= 4 && word.chars().all(|c| "ivx".contains(c));
        let numeric = word.chars().all(|c| c.is_ascii_digit());
        if (roman || numeric || *word == "section") && words.clone().count() > 1 {
            words.next();
        } else {
            break;
        }
    }
    words.collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_detection() {
        assert_eq!(header_kind("DEFICIENCIES"), Some(SectionKind::Deficiencies));
        assert_eq!(header_kind("Executive Summary"), Some(SectionKind::ExecutiveSummary));
        assert_eq!(header_kind("SUMMARY OF FINDINGS"), Some(SectionKind::ExecutiveSummary));
        assert_eq!(header_kind("3. Findings and Observations"), Some(SectionKind::Findings));
        assert_eq!(header_kind("Priority Repairs:"), Some(SectionKind::Recommendations));
        assert_eq!(header_kind("IV. RECOMMENDATIONS"), Some(SectionKind::Recommendations));
    }

    #[test]
    fn test_prose_is_not_a_header() {
        assert_eq!(header_kind("Several deficiencies were noted on the roof."), None);
        assert_eq!(header_kind("- Deficiencies at the drain"), None);
        assert_eq!(header_kind(""), None);
    }

    #[test]
    fn test_strip_bullet() {
        assert_eq!(strip_bullet("- Ponding water"), Some("Ponding water"));
        assert_eq!(strip_bullet("  • Loose flashing "), Some("Loose flashing"));
        assert_eq!(strip_bullet("12. Open seams"), Some("Open seams"));
        assert_eq!(strip_bullet("3) Clogged drain"), Some("Clogged drain"));
        assert_eq!(strip_bullet("(2) Blistering"), Some("Blistering"));
        assert_eq!(strip_bullet("2024 was a dry year"), None);
        assert_eq!(strip_bullet("-10 degrees"), None);
        assert_eq!(strip_bullet("Plain sentence."), None);
    }

    #[test]
    fn test_section_ends_at_blank_line() {
        let text = "DEFICIENCIES\n\n- One\n- Two\n\n- Not in section\n";
        let sections = find_sections(text);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].kind, SectionKind::Deficiencies);
        assert_eq!(sections[0].lines, vec!["- One", "- Two"]);
    }

    #[test]
    fn test_section_ends_at_caps_header() {
        let text = "FINDINGS\n- Alpha\nPHOTOGRAPHS\n- Beta\nRECOMMENDATIONS\n- Gamma\n";
        let sections = find_sections(text);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].kind, SectionKind::Findings);
        assert_eq!(sections[0].lines, vec!["- Alpha"]);
        assert_eq!(sections[1].kind, SectionKind::Recommendations);
        assert_eq!(sections[1].lines, vec!["- Gamma"]);
    }

    #[test]
    fn test_empty_sections_dropped() {
        assert!(find_sections("EXECUTIVE SUMMARY\n\n\n").is_empty());
        assert!(find_sections("").is_empty());
    }
}
