//! Max-similarity scoring over multi-vector embeddings.

use midras_core::Embedding;

/// Cosine similarity of two vectors. Zero vectors score 0.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0_f32;
    let mut norm_a = 0.0_f32;
    let mut norm_b = 0.0_f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Late-interaction score: for each query vector, the best cosine similarity against
/// any document vector, summed over query vectors.
pub fn max_sim(query: &[Embedding], document: &[Embedding]) -> f32 {
    query
        .iter()
        .map(|q| {
            document
                .iter()
                .map(|d| cosine(q, d))
                .fold(f32::NEG_INFINITY, f32::max)
        })
        .filter(|best| best.is_finite())
        .sum()
}
