//! Concurrent matching against one shared matcher
//!
//! Parameter caches fill on first use; racing queries must agree on the
//! result regardless of which task built a candidate's parameters.

mod helpers;

use helpers::{build_matcher, query, reference_corpus};
use serial_test::serial;
use std::sync::Arc;
use tokio::task::JoinSet;

#[tokio::test]
#[serial]
async fn test_concurrent_matches_agree() {
    let matcher = Arc::new(build_matcher(reference_corpus()));
    let names = [
        "Acacia dealbata",
        "Acacia baileyana",
        "Racosperma dealbatum",
        "Fabaceae",
    ];

    let mut join_set = JoinSet::new();
    for i in 0..32 {
        let matcher = Arc::clone(&matcher);
        let name = names[i % names.len()];
        join_set.spawn_blocking(move || {
            let result = matcher
                .find_match(query(&matcher, &[("scientificName", name)]))
                .unwrap_or_else(|e| panic!("Task {} failed: {}", i, e));
            (
                name,
                result.matched().map(|m| m.id().to_string()),
                result.probability(),
            )
        });
    }

    let mut results = Vec::new();
    while let Some(joined) = join_set.join_next().await {
        results.push(joined.expect("Task panicked"));
    }
    assert_eq!(results.len(), 32);

    for name in names {
        let for_name: Vec<_> = results.iter().filter(|(n, _, _)| *n == name).collect();
        assert_eq!(for_name.len(), 8);
        let (_, first_id, first_p) = for_name[0];
        assert!(first_id.is_some(), "{} did not match", name);
        for (_, id, p) in &for_name {
            assert_eq!(id, first_id, "{} matched differently across tasks", name);
            assert_eq!(p, first_p);
        }
    }
}

#[tokio::test]
#[serial]
async fn test_homonym_outcome_stable_under_concurrency() {
    let matcher = Arc::new(build_matcher(reference_corpus()));

    let mut join_set = JoinSet::new();
    for i in 0..10 {
        let matcher = Arc::clone(&matcher);
        join_set.spawn_blocking(move || {
            let result = matcher
                .find_match(query(&matcher, &[("scientificName", "Agathis")]))
                .unwrap();
            (i, result.is_valid())
        });
    }

    let mut task_ids = Vec::new();
    while let Some(joined) = join_set.join_next().await {
        let (task_id, valid) = joined.expect("Task panicked");
        assert!(!valid, "Task {} resolved a bare homonym", task_id);
        task_ids.push(task_id);
    }
    task_ids.sort();
    assert_eq!(task_ids, (0..10).collect::<Vec<_>>());
}
