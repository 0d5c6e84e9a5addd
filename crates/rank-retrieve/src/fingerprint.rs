//! Exact- and near-duplicate fingerprints derived from a question's text.

use crate::text::{normalize_template_text, normalize_text, stable_hash};

/// Hash of normalized stem, options, and answer. Two documents with the same
/// normalized content collide here regardless of surface formatting.
pub fn exact_hash(stem: &str, options: &[String], answer: Option<&str>) -> String {
    let normalized_options: Vec<String> = options.iter().map(|o| normalize_text(o)).collect();
    let payload = format!(
        "{}||{}||{}",
        normalize_text(stem),
        normalized_options.join("|"),
        normalize_text(answer.unwrap_or(""))
    );
    stable_hash(&payload)
}

/// Hash of the stem with numerals masked, used to find near-duplicates that
/// differ only in numeric values.
pub fn template_hash(stem: &str) -> String {
    stable_hash(&normalize_template_text(stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_hash_ignores_surface_formatting() {
        let a = exact_hash(
            "Find the derivative of x^2 + 3x.",
            &["2x+3".into(), "x+3".into(), "2x".into(), "3x".into()],
            Some("A"),
        );
        let b = exact_hash(
            "FIND THE DERIVATIVE OF X^2 + 3X!",
            &["2x + 3".into(), "x + 3".into(), "2x".into(), "3x".into()],
            Some("a"),
        );
        assert_eq!(a, b);
    }

    #[test]
    fn exact_hash_distinguishes_different_answers() {
        let a = exact_hash("same stem", &["x".into(), "y".into()], Some("A"));
        let b = exact_hash("same stem", &["x".into(), "y".into()], Some("B"));
        assert_ne!(a, b);
    }

    #[test]
    fn template_hash_collapses_differing_numerals() {
        let a = template_hash("What is 2 + 3?");
        let b = template_hash("What is 17 + 42?");
        assert_eq!(a, b);
    }

    #[test]
    fn template_hash_leaves_digits_glued_to_letters_unmasked() {
        // "x^2" and "3x" keep their digits; only the free-standing "3" would
        // mask. A stem differing solely in the glued numeral must not collide.
        let a = template_hash("Find the derivative of x^2 + 3x.");
        let b = template_hash("Find the derivative of x^2 + 9x.");
        assert_ne!(a, b);
    }
}
