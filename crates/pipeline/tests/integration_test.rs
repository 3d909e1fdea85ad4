//! Integration tests for the pipeline.
//!
//! These tests verify that normalization, filters and the reranker work
//! together in a realistic scenario.

use catalog::{ItemId, RawCandidate, RawId};
use pipeline::filters::*;
use pipeline::{context_vectors, normalize, FilterPipeline, MmrReranker, RankContext};
use std::collections::HashSet;
use taste::{answers_to_traits, TraitVector};

fn create_test_pool(size: usize) -> Vec<RawCandidate> {
    (0..size)
        .map(|i| {
            // Deterministic spread of trait values
            let values: Vec<f64> = (0..9).map(|d| ((i * 7 + d * 3) % 11) as f64 / 10.0).collect();
            RawCandidate {
                id: Some(RawId::Number(1000 + i as u64)),
                title: Some(format!("Movie {i}")),
                year: Some(1980 + (i % 40) as i32),
                traits: Some(TraitVector::from_slice(&values)),
                match_score: Some(0.95 - i as f64 * 0.005),
                ..Default::default()
            }
        })
        .collect()
}

fn standard_pipeline() -> FilterPipeline {
    FilterPipeline::new()
        .add_filter(DedupFilter)
        .add_filter(PoolLimitFilter::new(80))
}

#[test]
fn test_recommend_six_from_eighty() {
    let user = answers_to_traits(&[0.8, 0.2, 0.5, 0.9, 0.1, 0.3, 0.7, 0.6, 0.4]).unwrap();
    let context = RankContext::new(user);

    let raw = create_test_pool(80);
    let pool = standard_pipeline()
        .apply(normalize(raw).collect(), &context)
        .unwrap();
    assert_eq!(pool.len(), 80);

    let top = MmrReranker::new(6, 0.72).with_seed(7).select(pool, &context);

    assert_eq!(top.len(), 6);
    let unique: HashSet<_> = top.iter().map(|c| c.id.clone()).collect();
    assert_eq!(unique.len(), 6, "Recommendations should be unique");
    for c in &top {
        let score = c.score.unwrap();
        assert!((0.0..=1.0).contains(&score), "Score {score} outside [0, 1]");
    }
}

#[test]
fn test_duplicates_removed_before_rerank() {
    let mut raw = create_test_pool(10);
    // Same id, and same (title, year) under a new id
    raw.push(raw[0].clone());
    let mut retitled = raw[1].clone();
    retitled.id = Some(RawId::Text("tt-copy".to_string()));
    retitled.title = retitled.title.map(|t| t.to_uppercase());
    raw.push(retitled);

    let context = RankContext::new(TraitVector::neutral());
    let pool = standard_pipeline()
        .apply(normalize(raw).collect(), &context)
        .unwrap();
    assert_eq!(pool.len(), 10);

    let top = MmrReranker::new(20, 0.72).with_jitter(0.0).select(pool, &context);
    assert_eq!(top.len(), 10);
}

#[test]
fn test_heterogeneous_records() {
    let raw: Vec<RawCandidate> = serde_json::from_str(
        r#"[
            {"id": 1, "title": "Arrival", "year": 2016, "traits": {"depth": 0.9}, "match": 0.8},
            {"tmdb_id": "2", "title": "Paddington 2", "vector": [0.4, 0.8, 0.3, 0.9, 0.2, 1.0, 0.1, 0.8, 0.0]},
            {"title": "Untitled Record"},
            {"year": 2001}
        ]"#,
    )
    .unwrap();

    let candidates: Vec<_> = normalize(raw).collect();
    assert_eq!(candidates.len(), 3);
    assert_eq!(candidates[2].id.as_str(), "untitled-record");

    let top = MmrReranker::new(3, 0.72)
        .with_jitter(0.0)
        .select(candidates, &RankContext::new(TraitVector::neutral()));
    assert_eq!(top.len(), 3);
    assert!(top.iter().all(|c| c.score.is_some()));
}

#[test]
fn test_recently_seen_items_are_demoted() {
    let raw = create_test_pool(12);
    let first_id = ItemId::new("1000");

    let fresh = RankContext::new(TraitVector::neutral());
    let seen = RankContext::new(TraitVector::neutral()).with_seen(HashSet::from([first_id.clone()]));

    let pool: Vec<_> = normalize(raw).collect();
    let reranker = MmrReranker::new(1, 1.0).with_jitter(0.0);

    let top_fresh = reranker.select(pool.clone(), &fresh);
    let top_seen = reranker.select(pool, &seen);

    assert_eq!(top_fresh[0].id, first_id);
    assert_ne!(top_seen[0].id, first_id);
}

#[test]
fn test_context_vectors_for_selection() {
    let user = TraitVector::neutral();
    let context = RankContext::new(user);
    let pool: Vec<_> = normalize(create_test_pool(20)).collect();
    let top = MmrReranker::new(6, 0.72).with_seed(1).select(pool, &context);

    let contexts = context_vectors(&user, &top);
    assert_eq!(contexts.len(), top.len());
    for ((id, x), c) in contexts.iter().zip(&top) {
        assert_eq!(id, &c.id);
        assert_eq!(x.len(), pipeline::CONTEXT_DIMENSIONS);
    }
}
