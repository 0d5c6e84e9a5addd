//! Pluggable text embedding.

use crate::text::{stable_hash, tokenize};

/// A text-to-vector encoder. The only implementation this crate ships is
/// [`DeterministicHashEmbedder`], which needs no trained model and is
/// reproducible across processes and languages.
pub trait Embedder {
    fn encode(&self, text: &str) -> Vec<f32>;
}

/// Hashes each token into a signed bucket of a fixed-dimension vector, then
/// L2-normalizes. Empty input (or input that tokenizes to nothing) yields the
/// zero vector.
#[derive(Debug, Clone, Copy)]
pub struct DeterministicHashEmbedder {
    dense_dim: usize,
}

impl DeterministicHashEmbedder {
    pub fn new(dense_dim: usize) -> Self {
        Self { dense_dim }
    }

    pub fn dense_dim(&self) -> usize {
        self.dense_dim
    }
}

impl Default for DeterministicHashEmbedder {
    fn default() -> Self {
        Self::new(512)
    }
}

impl Embedder for DeterministicHashEmbedder {
    fn encode(&self, text: &str) -> Vec<f32> {
        let mut out = vec![0.0f32; self.dense_dim];
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return out;
        }
        for token in &tokens {
            let h = stable_hash(token);
            let bucket_part = &h[0..8];
            let sign_part = &h[8..16];
            let bucket = u32::from_str_radix(bucket_part, 16).unwrap_or(0) as usize % self.dense_dim;
            let sign_val = u32::from_str_radix(sign_part, 16).unwrap_or(0);
            let sign: f32 = if sign_val % 2 == 0 { 1.0 } else { -1.0 };
            out[bucket] += sign;
        }
        let norm = out.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm == 0.0 {
            return out;
        }
        for x in out.iter_mut() {
            *x /= norm;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_zero_vector() {
        let e = DeterministicHashEmbedder::new(16);
        let v = e.encode("");
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn nonempty_text_is_unit_norm() {
        let e = DeterministicHashEmbedder::new(64);
        let v = e.encode("find the derivative of a polynomial");
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn encode_is_deterministic() {
        let e = DeterministicHashEmbedder::new(32);
        assert_eq!(e.encode("repeatable text"), e.encode("repeatable text"));
    }

    #[test]
    fn different_dims_change_vector_length() {
        let e = DeterministicHashEmbedder::new(8);
        assert_eq!(e.encode("abc").len(), 8);
    }
}
