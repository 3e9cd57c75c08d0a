//! Deployment-train bookkeeping: grouping query results, detecting
//! retracted targets, and collecting the union of all targets.

use std::collections::{BTreeMap, HashSet};

use crate::bazel::CqueryResult;

/// Trains keyed by deployment branch, each holding a sorted target list.
///
/// The `BTreeMap` makes train iteration order deterministic across runs.
pub type Trains = BTreeMap<String, Vec<String>>;

/// Bucket results by their `deployment_branch` attribute.
///
/// Only targets whose `release_branch_prefix` equals `release_branch` and
/// whose `deployment_branch` is non-empty are included. Each bucket is
/// sorted for reproducible commit messages and branch state.
pub fn group_by_train(qr: &CqueryResult, release_branch: &str) -> Trains {
    let mut trains = Trains::new();

    for result in &qr.results {
        let rule = &result.target.rule;

        let mut dep_branch = "";
        let mut matches_branch = false;

        for attr in &rule.attribute {
            match attr.name.as_str() {
                "deployment_branch" => dep_branch = &attr.string_value,
                "release_branch_prefix" => {
                    if attr.string_value == release_branch {
                        matches_branch = true;
                    }
                }
                _ => continue,
            }
        }

        if !matches_branch || dep_branch.is_empty() {
            continue;
        }

        trains
            .entry(dep_branch.to_string())
            .or_default()
            .push(rule.name.clone());
    }

    for targets in trains.values_mut() {
        targets.sort();
    }

    trains
}

/// Whether any previously deployed target is missing from the current set.
pub fn has_deleted_targets(prev: &[String], current: &[String]) -> bool {
    let current: HashSet<&str> = current.iter().map(String::as_str).collect();
    prev.iter().any(|target| !current.contains(target.as_str()))
}

/// The deduplicated, sorted union of all trains' targets.
pub fn collect_all_targets(trains: &Trains) -> Vec<String> {
    let mut all: Vec<String> = trains
        .values()
        .flatten()
        .cloned()
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    all.sort();
    all
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
