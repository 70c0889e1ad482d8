// Property tests for scoring primitives and ranking invariants

use quickcheck::TestResult;
use quickcheck_macros::quickcheck;
use std::sync::Arc;

use stylerag::corpus::{InMemoryCorpus, StyleEntry};
use stylerag::rag::scoring::{cosine_similarity, min_max_normalize};
use stylerag::{RetrievalEngine, RetrievalMode, RetrievalRequest};

fn finite(values: &[f32]) -> Vec<f32> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite() && v.abs() < 1e6)
        .collect()
}

#[quickcheck]
fn prop_normalize_within_unit_range(scores: Vec<f32>) -> bool {
    let scores = finite(&scores);
    let normalized = min_max_normalize(&scores);
    normalized.len() == scores.len() && normalized.iter().all(|v| (0.0..=1.0).contains(v))
}

#[quickcheck]
fn prop_normalize_all_equal_is_ones(value: f32, len: u8) -> TestResult {
    if !value.is_finite() || len == 0 {
        return TestResult::discard();
    }
    let scores = vec![value; len as usize];
    TestResult::from_bool(min_max_normalize(&scores).iter().all(|v| *v == 1.0))
}

#[quickcheck]
fn prop_normalize_ones_idempotent(len: u8) -> bool {
    let ones = vec![1.0f32; len as usize];
    min_max_normalize(&ones) == ones
}

#[quickcheck]
fn prop_normalize_preserves_order(scores: Vec<f32>) -> bool {
    let scores = finite(&scores);
    let normalized = min_max_normalize(&scores);
    scores.iter().zip(&normalized).all(|(a, na)| {
        scores
            .iter()
            .zip(&normalized)
            .all(|(b, nb)| !(a < b) || na <= nb)
    })
}

#[quickcheck]
fn prop_cosine_bounded(pairs: Vec<(f32, f32)>) -> bool {
    let (a, b): (Vec<f32>, Vec<f32>) = pairs
        .into_iter()
        .filter(|(x, y)| x.is_finite() && y.is_finite() && x.abs() < 1e3 && y.abs() < 1e3)
        .unzip();
    let sim = cosine_similarity(&a, &b);
    (-1.0 - 1e-4..=1.0 + 1e-4).contains(&sim)
}

#[quickcheck]
fn prop_cosine_symmetric(pairs: Vec<(i8, i8)>) -> bool {
    let (a, b): (Vec<f32>, Vec<f32>) = pairs
        .into_iter()
        .map(|(x, y)| (x as f32, y as f32))
        .unzip();
    (cosine_similarity(&a, &b) - cosine_similarity(&b, &a)).abs() < 1e-6
}

fn corpus_from(texts: &[String]) -> InMemoryCorpus {
    let devices = ["robot_vacuum", "washer", "oven"];
    InMemoryCorpus::new(
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| {
                StyleEntry::new(format!("e{}", i), text.clone())
                    .with_device(devices[i % devices.len()])
                    .with_feature(format!("f{}", i % 4))
            })
            .collect(),
    )
}

#[quickcheck]
fn prop_items_bounded_and_sorted(texts: Vec<String>, query: String, top_k: i8, style: bool) -> bool {
    let engine = RetrievalEngine::new(Arc::new(corpus_from(&texts)));
    let mode = if style { RetrievalMode::Style } else { RetrievalMode::Feature };
    let request = RetrievalRequest::new(query)
        .with_top_k(top_k as i64)
        .with_mode(mode);

    let result = match tokio_test::block_on(engine.retrieve(&request)) {
        Ok(result) => result,
        Err(_) => return false,
    };

    let bound = (top_k as i64).clamp(1, 20) as usize;
    result.items.len() <= bound
        && result.items.len() == bound.min(texts.len())
        && result.items.windows(2).all(|w| w[0].score >= w[1].score)
}

#[quickcheck]
fn prop_retrieval_is_deterministic(texts: Vec<String>, query: String) -> bool {
    let engine = RetrievalEngine::new(Arc::new(corpus_from(&texts)));
    let request = RetrievalRequest::new(query).with_top_k(4);

    let first = tokio_test::block_on(engine.retrieve(&request));
    let second = tokio_test::block_on(engine.retrieve(&request));
    match (first, second) {
        (Ok(a), Ok(b)) => a.items == b.items && a.mode == b.mode && a.tier == b.tier,
        _ => false,
    }
}
