//! Edit-distance similarity between property names.

use roofscan_core::normalize;

/// Similarity of two strings after normalization, in `[0, 1]`.
///
/// `(max_len - levenshtein) / max_len`, counted in characters. Two empty
/// strings are identical (1.0).
pub fn similarity(a: &str, b: &str) -> f64 {
    normalized_similarity(&normalize(a), &normalize(b))
}

/// Same as [`similarity`] for inputs that are already normalized.
pub fn normalized_similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    let distance = strsim::levenshtein(a, b);
    (max_len - distance.min(max_len)) as f64 / max_len as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reflexive() {
        for s in ["", "a", "Dallas Corporate Center", "Warehouse Complex A", "ñ-roof 12"] {
            assert_eq!(similarity(s, s), 1.0);
        }
    }

    #[test]
    fn test_symmetric() {
        let pairs = [
            ("Central Distrib Center", "Central Distribution Center"),
            ("Warehouse Complex A", "Oak Ridge Plaza"),
            ("", "something"),
            ("abc", "abd"),
        ];
        for (a, b) in pairs {
            assert_eq!(similarity(a, b), similarity(b, a));
        }
    }

    #[test]
    fn test_normalization_invariance() {
        let score = similarity("Dallas Corporate Center", "dallas corporate center!!");
        assert!((score - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_ratio_value() {
        // "central distrib center" (22) vs "central distribution center" (27): 5 insertions
        let score = similarity("Central Distrib Center", "Central Distribution Center");
        assert!((score - 22.0 / 27.0).abs() < 1e-9);
    }

    #[test]
    fn test_completely_different() {
        assert_eq!(normalized_similarity("abc", "xyz"), 0.0);
        assert_eq!(normalized_similarity("", "xyz"), 0.0);
    }
}
