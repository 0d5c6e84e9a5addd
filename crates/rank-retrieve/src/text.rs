//! Text normalization, tokenization, and the stable hash used for fingerprints
//! and the deterministic embedder.

/// Lower-cases, replaces every character outside `[a-z0-9\s]` with a space,
/// collapses runs of whitespace to one space, and trims.
pub fn normalize_text(text: &str) -> String {
    let lowered = text.to_lowercase();
    let mut replaced = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        if c.is_ascii_alphanumeric() || c.is_whitespace() {
            replaced.push(c);
        } else {
            replaced.push(' ');
        }
    }
    let collapsed: Vec<&str> = replaced.split_whitespace().collect();
    collapsed.join(" ")
}

/// `normalize_text` followed by masking every maximal numeric token
/// (integer or decimal) with the literal `<num>`, but only at a word
/// boundary: a digit run glued to a letter on either side (`2x`, `abc123`)
/// is left untouched, mirroring `\b\d+(\.\d+)?\b` on the reference's
/// already-alphanumeric-only text.
pub fn normalize_template_text(text: &str) -> String {
    let normalized = normalize_text(text);
    let bytes = normalized.as_bytes();
    let mut out = String::with_capacity(normalized.len());
    let mut i = 0;
    while i < bytes.len() {
        let c = normalized[i..].chars().next().unwrap();
        if c.is_ascii_digit() {
            let prev_is_alpha = i > 0 && bytes[i - 1].is_ascii_alphabetic();
            let mut end = i;
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
            if end < bytes.len() && bytes[end] == b'.' && end + 1 < bytes.len() && bytes[end + 1].is_ascii_digit() {
                end += 1;
                while end < bytes.len() && bytes[end].is_ascii_digit() {
                    end += 1;
                }
            }
            let next_is_alpha = end < bytes.len() && bytes[end].is_ascii_alphabetic();
            if prev_is_alpha || next_is_alpha {
                out.push_str(&normalized[i..end]);
            } else {
                out.push_str("<num>");
            }
            i = end;
        } else {
            out.push(c);
            i += c.len_utf8();
        }
    }
    out
}

/// Normalizes then splits on single space, dropping empty tokens. Preserves
/// input order and duplicates.
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized = normalize_text(text);
    if normalized.is_empty() {
        return Vec::new();
    }
    normalized
        .split(' ')
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Deterministic 64-bit hash rendered as 16 lowercase hex digits. Must stay
/// bit-exact across languages, so it iterates UTF-16 code units rather than
/// bytes or chars.
pub fn stable_hash(text: &str) -> String {
    let mut h1: u32 = 0xDEADBEEF;
    let mut h2: u32 = 0x41C6CE57;
    for c in text.encode_utf16() {
        let c = c as u32;
        h1 = (h1 ^ c).wrapping_mul(2654435761);
        h2 = (h2 ^ c).wrapping_mul(1597334677);
    }
    let h1_final = ((h1 ^ (h1 >> 16)).wrapping_mul(2246822507)) ^ ((h2 ^ (h2 >> 13)).wrapping_mul(3266489909));
    let h2_final = ((h2 ^ (h2 >> 16)).wrapping_mul(2246822507)) ^ ((h1_final ^ (h1_final >> 13)).wrapping_mul(3266489909));
    format!("{:08x}{:08x}", h2_final, h1_final)
}

pub fn clamp01(x: f32) -> f32 {
    x.max(0.0).min(1.0)
}

/// 0 if either slice is empty, lengths differ, or either norm is 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|y| y * y).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na * nb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_punctuation_and_collapses_space() {
        assert_eq!(normalize_text("Find the derivative of x^2 + 3x."), "find the derivative of x 2 3x");
    }

    #[test]
    fn normalize_template_masks_integers_and_decimals() {
        assert_eq!(normalize_template_text("3.14 apples and 7 oranges"), "<num> apples and <num> oranges");
    }

    #[test]
    fn normalize_template_leaves_digits_glued_to_letters_alone() {
        assert_eq!(
            normalize_template_text("2x+3 is the answer, 100 items, abc123"),
            "2x <num> is the answer <num> items abc123"
        );
        assert_eq!(normalize_template_text("Find the derivative of x^2 + 3x."), "find the derivative of x <num> 3x");
    }

    #[test]
    fn tokenize_empty_string_is_empty() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn tokenize_preserves_order_and_duplicates() {
        assert_eq!(tokenize("a a b"), vec!["a", "a", "b"]);
    }

    #[test]
    fn stable_hash_is_deterministic_and_16_hex_chars() {
        let h1 = stable_hash("hello world");
        let h2 = stable_hash("hello world");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 16);
        assert!(h1.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn stable_hash_differs_for_different_input() {
        assert_ne!(stable_hash("a"), stable_hash("b"));
    }

    #[test]
    fn clamp01_bounds() {
        assert_eq!(clamp01(-1.0), 0.0);
        assert_eq!(clamp01(2.0), 1.0);
        assert_eq!(clamp01(0.5), 0.5);
    }

    #[test]
    fn cosine_similarity_mismatched_lengths_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
    }

    #[test]
    fn cosine_similarity_identical_vectors_is_one() {
        let v = [0.6, 0.8];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_zero_vector_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }
}
