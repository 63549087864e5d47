use midras_core::{ColBert, Embedding, Payload, payload};
use serde_json::json;

/// Unit vector of width `dims` with a 1.0 at `hot`.
pub fn one_hot(dims: usize, hot: usize) -> Embedding {
    let mut vec = vec![0.0; dims];
    vec[hot % dims] = 1.0;
    vec
}

/// One one-hot vector per entry of `axes`.
pub fn axis_colbert(dims: usize, axes: &[usize]) -> ColBert {
    axes.iter().map(|&axis| one_hot(dims, axis)).collect()
}

/// Payload shaped like page metadata.
pub fn sample_payload(page: u64) -> Payload {
    payload(json!({
        "test": "midras",
        "page": page,
        "source": { "file": "fixture.pdf", "tags": ["a", "b"] },
    }))
}
