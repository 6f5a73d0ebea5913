//! Vector similarity utilities.
//!
//! Pure-Rust implementations of:
//! - Cosine similarity
//! - Term-frequency vectors for lexical similarity when no embedding model is wired in

use std::collections::HashMap;

/// Words too common to say anything about relevance.
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "can", "do", "does", "for", "from",
    "how", "i", "if", "in", "is", "it", "me", "my", "of", "on", "or", "our", "so", "that", "the",
    "this", "to", "was", "we", "what", "when", "where", "which", "who", "why", "with", "you",
    "your",
];

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 if either vector is zero-length or empty.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Lowercased content words of `text`, stopwords removed.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 1)
        .map(|w| w.to_lowercase())
        .filter(|w| !STOPWORDS.contains(&w.as_str()))
        .collect()
}

/// Cosine similarity of the term-frequency vectors of two texts, in [0, 1].
pub fn lexical_similarity(query: &str, document: &str) -> f32 {
    let q = term_counts(query);
    let d = term_counts(document);
    if q.is_empty() || d.is_empty() {
        return 0.0;
    }

    let mut vocabulary: Vec<&String> = q.keys().chain(d.keys()).collect();
    vocabulary.sort_unstable();
    vocabulary.dedup();

    let qv: Vec<f32> = vocabulary.iter().map(|t| *q.get(*t).unwrap_or(&0) as f32).collect();
    let dv: Vec<f32> = vocabulary.iter().map(|t| *d.get(*t).unwrap_or(&0) as f32).collect();
    cosine_similarity(&qv, &dv).clamp(0.0, 1.0)
}

fn term_counts(text: &str) -> HashMap<String, u32> {
    let mut counts = HashMap::new();
    for token in tokenize(text) {
        *counts.entry(token).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_identical_vectors() {
        let v = vec![1.0, 2.0, 3.0];
        let sim = cosine_similarity(&v, &v);
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_orthogonal_vectors() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn cosine_empty_and_mismatched() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn cosine_known_value() {
        // similarity = 1 / sqrt(2) ≈ 0.7071
        let sim = cosine_similarity(&[1.0, 1.0], &[1.0, 0.0]);
        assert!((sim - 0.7071).abs() < 0.001);
    }

    #[test]
    fn tokenize_drops_stopwords_and_punctuation() {
        assert_eq!(
            tokenize("What is the Refund policy?"),
            vec!["refund".to_string(), "policy".to_string()]
        );
    }

    #[test]
    fn lexical_similarity_orders_by_overlap() {
        let query = "refund policy for damaged items";
        let close = lexical_similarity(query, "Our refund policy covers damaged items within 30 days.");
        let far = lexical_similarity(query, "Store hours are nine to five on weekdays.");
        assert!(close > 0.5, "close = {close}");
        assert_eq!(far, 0.0);
    }

    #[test]
    fn lexical_similarity_identical_text_is_one() {
        let sim = lexical_similarity("shipping times", "shipping times");
        assert!((sim - 1.0).abs() < 1e-6);
    }
}
