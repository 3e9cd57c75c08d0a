//! The end-to-end train pipeline.
//!
//! Discover targets, group them by train, reconcile each train onto its
//! deployment branch, push images, then publish branches and pull
//! requests. Trains are processed sequentially; only the image push phase
//! is parallel.

use std::collections::{HashMap, VecDeque};
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use shunter_core::{commitmsg, digest, exec, label, CancelToken};
use shunter_git::Repo;
use shunter_stamp::stamp_file;

use crate::bazel;
use crate::config::Config;
use crate::error::{repo_err, TrainError};
use crate::trains::{self, has_deleted_targets};

/// Execute the full PR creation workflow described by `cfg`.
pub fn run(cfg: &Config, cancel: &CancelToken) -> Result<(), TrainError> {
    // Step 1: discover deployment targets.
    let query = bazel::build_kind_query(cfg);
    let qr = bazel::cquery(&cfg.bazel_cmd, &query)?;

    // Step 2: group by deployment train.
    let trains = trains::group_by_train(&qr, &cfg.release_branch);
    if trains.is_empty() {
        tracing::info!(branch = %cfg.release_branch, "no targets matching release branch");
        return Ok(());
    }

    // Step 3: clone the manifest repository. The guard removes the clone
    // directory on every exit path, panics included.
    let clone_dir = cfg.tmp_dir.join("gitops");
    let repo = Repo::clone(
        &cfg.git_repo,
        &clone_dir,
        cfg.git_mirror.as_deref(),
        &cfg.primary_branch,
        &cfg.gitops_path,
    )
    .map_err(repo_err("cloning manifest repository"))?;
    let repo = CleanupGuard(repo);

    // Make existing deployment branches visible locally.
    let fetch_pattern = format!("{}*", cfg.deployment_branch_prefix);
    repo.fetch(&fetch_pattern)
        .map_err(repo_err("fetching deployment branches"))?;

    // Step 4: reconcile each train.
    let stamp_ctx = stamp_context(&cfg.git_commit, &cfg.branch_name);
    let mut updated_branches = Vec::new();

    for (train, targets) in &trains {
        let dep_branch = format!(
            "{}{train}{}",
            cfg.deployment_branch_prefix, cfg.deployment_branch_suffix
        );
        tracing::info!(train = %train, branch = %dep_branch, targets = targets.len(), "processing deployment train");

        if process_train(&repo, cfg, &dep_branch, targets, &stamp_ctx)? {
            updated_branches.push(dep_branch);
        }
    }

    // Step 5: push images for the union of all trains' targets.
    if updated_branches.is_empty() {
        tracing::info!("no branches updated, skipping push");
        return Ok(());
    }

    let all_targets = trains::collect_all_targets(&trains);
    push_images(cfg, &all_targets, cancel)?;

    // Step 6: publish branches and pull requests.
    if cfg.dry_run {
        tracing::info!(branches = ?updated_branches, "dry run: skipping push and PR creation");
        return Ok(());
    }

    repo.push(&updated_branches)
        .map_err(repo_err("pushing deployment branches"))?;

    for branch in &updated_branches {
        cfg.provider
            .create_pr(cancel, branch, &cfg.primary_branch, &cfg.pr_title, &cfg.pr_body)
            .map_err(|source| TrainError::CreatePr {
                branch: branch.clone(),
                source,
            })?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Per-train reconciliation
// ---------------------------------------------------------------------------

/// Reconcile a single train: switch (or recreate) the deployment branch,
/// run the target executables, stamp changed files, and commit. Returns
/// `true` when changes were committed.
fn process_train(
    repo: &Repo,
    cfg: &Config,
    dep_branch: &str,
    targets: &[String],
    stamp_ctx: &HashMap<String, String>,
) -> Result<bool, TrainError> {
    let is_new = repo
        .switch_to_branch(dep_branch, &cfg.primary_branch)
        .map_err(repo_err("switching deployment branch"))?;

    // A previously deployed target that disappeared from the current set
    // means the branch must be rebuilt from primary.
    if !is_new {
        let last_msg = repo.last_commit_message();
        let prev = commitmsg::extract(&last_msg);

        if has_deleted_targets(&prev, targets) {
            tracing::info!(branch = %dep_branch, "recreating branch due to deleted targets");
            repo.recreate_branch(dep_branch, &cfg.primary_branch)
                .map_err(repo_err("recreating deployment branch"))?;
        }
    }

    // The build system produced these executables; a failure here is a
    // build bug, not a recoverable condition.
    for target in targets {
        let exe = label::target_to_executable(target);
        exec::must_run(Some(&cfg.workspace), &exe, &[]);
    }

    if cfg.stamp {
        stamp_changed_files(repo, stamp_ctx)?;
    }

    let msg = commitmsg::generate(targets);
    repo.commit(&msg, &cfg.gitops_path)
        .map_err(repo_err("committing deployment changes"))
}

/// Walk the changed files: restore the ones whose digest sidecar still
/// matches (no semantic change), stamp and re-record the rest.
fn stamp_changed_files(repo: &Repo, stamp_ctx: &HashMap<String, String>) -> Result<(), TrainError> {
    let changed = repo
        .changed_files()
        .map_err(repo_err("listing changed files"))?;

    for file in changed {
        let abs = repo.dir.join(&file);

        let unchanged = digest::verify(&abs).map_err(|source| TrainError::Digest {
            file: file.clone(),
            source,
        })?;

        if unchanged {
            repo.restore_file(&file)
                .map_err(repo_err("restoring unchanged file"))?;
            continue;
        }

        stamp_file(&abs, stamp_ctx).map_err(|source| TrainError::Stamp {
            file: file.clone(),
            source,
        })?;
        digest::save(&abs).map_err(|source| TrainError::Digest { file, source })?;
    }

    Ok(())
}

/// Template variables for file stamping.
fn stamp_context(git_commit: &str, branch_name: &str) -> HashMap<String, String> {
    HashMap::from([
        ("STABLE_GIT_COMMIT".to_string(), git_commit.to_string()),
        ("STABLE_GIT_BRANCH".to_string(), branch_name.to_string()),
        ("BUILD_TIMESTAMP".to_string(), "0".to_string()),
        ("BUILD_EMBED_LABEL".to_string(), String::new()),
        ("RANDOM_SEED".to_string(), String::new()),
        ("STABLE_BUILD_LABEL".to_string(), String::new()),
    ])
}

// ---------------------------------------------------------------------------
// Image push
// ---------------------------------------------------------------------------

/// Find the image push targets for `targets` and run them under the
/// bounded worker pool.
fn push_images(cfg: &Config, targets: &[String], cancel: &CancelToken) -> Result<(), TrainError> {
    let deps_query = bazel::build_deps_query(targets, cfg);
    if deps_query.is_empty() {
        tracing::info!("no push targets to query");
        return Ok(());
    }

    let qr = bazel::cquery(&cfg.bazel_cmd, &deps_query)?;
    let push_targets = bazel::extract_target_names(&qr);
    if push_targets.is_empty() {
        tracing::info!("no push targets found");
        return Ok(());
    }

    let parallelism = cfg.push_parallelism.max(1);
    tracing::info!(
        count = push_targets.len(),
        parallelism,
        "pushing images"
    );

    let mut errors = run_push_pool(cfg, push_targets, parallelism, cancel);
    if !errors.is_empty() {
        let count = errors.len();
        let first = Box::new(errors.remove(0));
        return Err(TrainError::PushFailures { count, first });
    }

    Ok(())
}

/// Run every push target to completion on `parallelism` workers.
///
/// Completion contracts: the pool joins all workers before returning;
/// errors accumulate under a mutex and one task's failure cancels nothing;
/// cancellation is checked before each dispatch, recorded once, and lets
/// already-running tasks finish.
fn run_push_pool(
    cfg: &Config,
    push_targets: Vec<String>,
    parallelism: usize,
    cancel: &CancelToken,
) -> Vec<TrainError> {
    let queue = Mutex::new(VecDeque::from(push_targets));
    let errors = Mutex::new(Vec::new());
    let cancel_recorded = AtomicBool::new(false);

    std::thread::scope(|scope| {
        for _ in 0..parallelism {
            scope.spawn(|| loop {
                if cancel.is_cancelled() {
                    if !cancel_recorded.swap(true, Ordering::SeqCst) {
                        lock(&errors).push(TrainError::Cancelled);
                    }
                    break;
                }

                let Some(target) = lock(&queue).pop_front() else {
                    break;
                };

                let exe = label::target_to_executable(&target);
                if let Err(source) = exec::run(Some(&cfg.workspace), &exe, &[]) {
                    lock(&errors).push(TrainError::Push { target, source });
                }
            });
        }
    });

    errors.into_inner().unwrap_or_else(PoisonError::into_inner)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Clone cleanup
// ---------------------------------------------------------------------------

/// Removes the clone directory when dropped, on every exit path.
struct CleanupGuard(Repo);

impl Deref for CleanupGuard {
    type Target = Repo;

    fn deref(&self) -> &Repo {
        &self.0
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if let Err(err) = self.0.clean() {
            tracing::error!(error = %err, "failed to clean repo");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trains::tests::test_config;

    #[test]
    fn stamp_context_has_all_fixed_keys() {
        let ctx = stamp_context("abc123", "feature/foo");

        assert_eq!(ctx["STABLE_GIT_COMMIT"], "abc123");
        assert_eq!(ctx["STABLE_GIT_BRANCH"], "feature/foo");
        assert_eq!(ctx["BUILD_TIMESTAMP"], "0");

        for key in [
            "STABLE_GIT_COMMIT",
            "STABLE_GIT_BRANCH",
            "BUILD_TIMESTAMP",
            "BUILD_EMBED_LABEL",
            "RANDOM_SEED",
            "STABLE_BUILD_LABEL",
        ] {
            assert!(ctx.contains_key(key), "missing key: {key}");
        }
    }

    #[test]
    #[cfg(unix)]
    fn push_pool_runs_every_target() {
        use std::os::unix::fs::PermissionsExt;

        let workspace = tempfile::TempDir::new().unwrap();
        let out_dir = workspace.path().join("out");
        std::fs::create_dir_all(&out_dir).unwrap();

        let mut targets = Vec::new();
        for idx in 0..6 {
            let name = format!("push-{idx}");
            let script = workspace.path().join(&name);
            std::fs::write(
                &script,
                format!("#!/bin/sh\ntouch {}/{name}\n", out_dir.display()),
            )
            .unwrap();
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
            targets.push(name);
        }

        let mut cfg = test_config();
        cfg.workspace = workspace.path().to_path_buf();

        let cancel = CancelToken::new();
        let errors = run_push_pool(&cfg, targets.clone(), 2, &cancel);
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");

        for name in targets {
            assert!(out_dir.join(name).exists(), "target did not run");
        }
    }

    #[test]
    #[cfg(unix)]
    fn push_pool_accumulates_failures_without_cancelling_others() {
        use std::os::unix::fs::PermissionsExt;

        let workspace = tempfile::TempDir::new().unwrap();
        let marker = workspace.path().join("ok-ran");

        let good = workspace.path().join("good");
        std::fs::write(&good, format!("#!/bin/sh\ntouch {}\n", marker.display())).unwrap();
        std::fs::set_permissions(&good, std::fs::Permissions::from_mode(0o755)).unwrap();

        let bad = workspace.path().join("bad");
        std::fs::write(&bad, "#!/bin/sh\nexit 7\n").unwrap();
        std::fs::set_permissions(&bad, std::fs::Permissions::from_mode(0o755)).unwrap();

        let mut cfg = test_config();
        cfg.workspace = workspace.path().to_path_buf();

        let cancel = CancelToken::new();
        let errors = run_push_pool(
            &cfg,
            vec!["bad".to_string(), "good".to_string()],
            1,
            &cancel,
        );

        assert_eq!(errors.len(), 1);
        assert!(matches!(&errors[0], TrainError::Push { target, .. } if target == "bad"));
        assert!(marker.exists(), "later target should still run");
    }

    #[test]
    fn push_pool_records_cancellation_once_and_dispatches_nothing() {
        let cfg = test_config();
        let cancel = CancelToken::new();
        cancel.cancel();

        let errors = run_push_pool(
            &cfg,
            vec!["would-fail-if-run".to_string(); 8],
            4,
            &cancel,
        );

        assert_eq!(errors.len(), 1, "cancellation must be recorded exactly once");
        assert!(matches!(errors[0], TrainError::Cancelled));
    }
}
