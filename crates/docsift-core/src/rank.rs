//! Term-weighted lexical ranking (TF-IDF + cosine similarity).
//!
//! Scores candidate chunks against a query over a joint vocabulary drawn
//! from the query and every candidate. Purely lexical: no embedding
//! vectors, no index, no model.
//!
//! # Algorithm
//!
//! 1. Tokenize the query and every candidate into lowercase alphanumeric
//!    runs of length ≥ 2.
//! 2. Build TF-IDF weight vectors over the joint vocabulary: TF is the
//!    term count normalized by document length, IDF is
//!    `ln((1 + N) / (1 + df)) + 1` where `N` counts the joint set and
//!    `df` the documents containing the term.
//! 3. Cosine similarity between the query vector and each candidate,
//!    `0.0` when either norm is zero.
//! 4. Stable sort descending; ties keep original candidate order.

use std::collections::HashMap;

/// A candidate scored against the query.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranked {
    /// Index into the original candidate slice.
    pub index: usize,
    /// Cosine similarity in `[0.0, 1.0]`.
    pub score: f64,
}

/// Lowercase alphanumeric tokens of length ≥ 2.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 2)
        .map(str::to_string)
        .collect()
}

fn cosine(a: &[f64], b: &[f64]) -> f64 {
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f64::EPSILON {
        return 0.0;
    }
    dot / denom
}

/// Rank `candidates` against `query` by TF-IDF cosine similarity.
///
/// Returns at most `min(top_k, candidates.len())` entries in descending
/// score order; ties preserve original candidate order. Empty candidates
/// or `top_k == 0` yield an empty vec — never an error. Deterministic for
/// fixed input.
pub fn rank(query: &str, candidates: &[&str], top_k: usize) -> Vec<Ranked> {
    if candidates.is_empty() || top_k == 0 {
        return Vec::new();
    }

    let docs: Vec<Vec<String>> = std::iter::once(query)
        .chain(candidates.iter().copied())
        .map(tokenize)
        .collect();

    // A sorted vocabulary keeps vector layout (and float summation order)
    // independent of hash-map iteration.
    let mut vocab: Vec<&str> = docs.iter().flatten().map(String::as_str).collect();
    vocab.sort_unstable();
    vocab.dedup();

    let term_index: HashMap<&str, usize> =
        vocab.iter().enumerate().map(|(i, t)| (*t, i)).collect();

    let mut df = vec![0usize; vocab.len()];
    for doc in &docs {
        let mut seen = vec![false; vocab.len()];
        for term in doc {
            let i = term_index[term.as_str()];
            if !seen[i] {
                seen[i] = true;
                df[i] += 1;
            }
        }
    }

    let n = docs.len();
    let idf: Vec<f64> = df
        .iter()
        .map(|&d| ((1 + n) as f64 / (1 + d) as f64).ln() + 1.0)
        .collect();

    let vectors: Vec<Vec<f64>> = docs
        .iter()
        .map(|doc| {
            let mut weights = vec![0.0; vocab.len()];
            if doc.is_empty() {
                return weights;
            }
            for term in doc {
                weights[term_index[term.as_str()]] += 1.0;
            }
            let len = doc.len() as f64;
            for (w, idf) in weights.iter_mut().zip(&idf) {
                *w = *w / len * idf;
            }
            weights
        })
        .collect();

    let query_vec = &vectors[0];
    let mut ranked: Vec<Ranked> = vectors[1..]
        .iter()
        .enumerate()
        .map(|(index, v)| Ranked {
            index,
            score: cosine(query_vec, v),
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(top_k);
    ranked
}
