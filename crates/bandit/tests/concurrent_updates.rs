//! Stress tests: concurrent updates to one item must never lose a contribution.

use bandit::{ArmStore, FileArmStore, InMemoryArmStore, LinUcb, DEFAULT_DIMENSIONS};
use catalog::ItemId;
use std::sync::Arc;

const TASKS: usize = 32;
const UPDATES_PER_TASK: usize = 5;

fn unit_context(value: f64) -> Vec<f64> {
    vec![value; DEFAULT_DIMENSIONS]
}

async fn run_updates(bandit: Arc<LinUcb>, item: ItemId, reward: f64) {
    let x = unit_context(0.5);
    for _ in 0..UPDATES_PER_TASK {
        bandit.update(&item, &x, reward).await.unwrap();
    }
}

fn assert_no_lost_updates(a00: f64, b0: f64, total: usize, reward: f64) {
    // Each update adds 0.25 to every cell of A and 0.5 * reward to every entry of b
    let expected_a = 1.0 + 0.25 * total as f64;
    let expected_b = 0.5 * reward * total as f64;
    assert!((a00 - expected_a).abs() < 1e-9, "A[0][0] = {a00}, expected {expected_a}");
    assert!((b0 - expected_b).abs() < 1e-9, "b[0] = {b0}, expected {expected_b}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_same_item_updates_are_serialized() {
    let bandit = Arc::new(LinUcb::new(Arc::new(InMemoryArmStore::new())));
    let item = ItemId::new("603");

    let handles: Vec<_> = (0..TASKS)
        .map(|_| tokio::spawn(run_updates(bandit.clone(), item.clone(), 1.0)))
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    let state = bandit.state(&item).await.unwrap();
    assert_no_lost_updates(state.a()[(0, 0)], state.b()[0], TASKS * UPDATES_PER_TASK, 1.0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_independent_writers_share_a_store() {
    // Two bandits over one store model two processes: no shared item locks,
    // only the version check keeps them honest.
    let store: Arc<dyn ArmStore> = Arc::new(InMemoryArmStore::new());
    let first = Arc::new(LinUcb::new(store.clone()).with_max_retries(10_000));
    let second = Arc::new(LinUcb::new(store.clone()).with_max_retries(10_000));
    let item = ItemId::new("42");

    let mut handles = Vec::new();
    for i in 0..TASKS {
        let bandit = if i % 2 == 0 { first.clone() } else { second.clone() };
        handles.push(tokio::spawn(run_updates(bandit, item.clone(), 0.6)));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let state = first.state(&item).await.unwrap();
    assert_no_lost_updates(state.a()[(0, 0)], state.b()[0], TASKS * UPDATES_PER_TASK, 0.6);
    let version = store.load(&item).await.unwrap().unwrap().version;
    assert_eq!(version, (TASKS * UPDATES_PER_TASK) as u64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_file_store_concurrent_updates_persist() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("arms.json");
    let item = ItemId::new("7");

    {
        let store = Arc::new(FileArmStore::open(&path).unwrap());
        let bandit = Arc::new(LinUcb::new(store));
        let handles: Vec<_> = (0..8)
            .map(|_| tokio::spawn(run_updates(bandit.clone(), item.clone(), 1.0)))
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }
    }

    let reopened = LinUcb::new(Arc::new(FileArmStore::open(&path).unwrap()));
    let state = reopened.state(&item).await.unwrap();
    assert_no_lost_updates(state.a()[(0, 0)], state.b()[0], 8 * UPDATES_PER_TASK, 1.0);
}

#[tokio::test]
async fn test_other_items_unaffected() {
    let bandit = LinUcb::new(Arc::new(InMemoryArmStore::new()));
    let x = unit_context(0.5);
    bandit.update(&ItemId::new("a"), &x, 1.0).await.unwrap();

    let untouched = bandit.state(&ItemId::new("b")).await.unwrap();
    assert_eq!(untouched.a()[(0, 0)], 1.0);
    assert_eq!(untouched.b()[0], 0.0);
}
