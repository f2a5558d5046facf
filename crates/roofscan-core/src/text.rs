//! Text normalization shared by matching and classification.

/// Lower-case, strip punctuation and collapse whitespace.
///
/// Punctuation is removed rather than replaced, so `"Duro-Last"` becomes
/// `"durolast"`. Underscores count as whitespace.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for c in text.chars() {
        if c.is_whitespace() || c == '_' {
            pending_space = !out.is_empty();
        } else if c.is_alphanumeric() {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.extend(c.to_lowercase());
        }
    }
    out
}

/// Collapse runs of whitespace to single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to at most `max` characters on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_case_and_punctuation() {
        assert_eq!(normalize("Dallas Corporate Center!!"), "dallas corporate center");
        assert_eq!(normalize("  1200  Main St.,  Suite #4 "), "1200 main st suite 4");
    }

    #[test]
    fn test_normalize_underscores_and_hyphens() {
        assert_eq!(normalize("Oak_Ridge__Plaza"), "oak ridge plaza");
        assert_eq!(normalize("Duro-Last"), "durolast");
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" !!! "), "");
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("ñandú roof", 5), "ñandú");
        assert_eq!(truncate_chars("short", 50), "short");
    }
}
