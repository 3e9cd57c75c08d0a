//! Run configuration for the orchestrator.

use std::path::PathBuf;

use shunter_git::HostProvider;

/// All settings for one gitops PR creation run.
pub struct Config {
    /// Build tool binary name or path.
    pub bazel_cmd: String,
    /// Build workspace root, where target executables run.
    pub workspace: PathBuf,
    /// Build query target pattern.
    pub target: String,

    /// Remote manifest repository URL.
    pub git_repo: String,
    /// Optional local mirror used as a reference clone.
    pub git_mirror: Option<String>,
    /// Subdirectory for sparse checkout; empty means the repository root.
    pub gitops_path: String,
    /// Directory for temporary clones.
    pub tmp_dir: PathBuf,

    /// Release branch that targets must match to participate.
    pub release_branch: String,
    /// Primary branch of the manifest repository (e.g. `main`).
    pub primary_branch: String,
    /// Prefix for deployment branch names.
    pub deployment_branch_prefix: String,
    /// Suffix for deployment branch names.
    pub deployment_branch_suffix: String,
    /// Source branch name, used in the stamp context.
    pub branch_name: String,
    /// Source commit SHA, used in the stamp context.
    pub git_commit: String,

    /// Number of concurrent image push workers.
    pub push_parallelism: usize,

    /// Rule kinds to query for deployment targets.
    pub gitops_kinds: Vec<String>,
    /// Rule names matched when building the image push query.
    pub gitops_rule_names: Vec<String>,
    /// Rule attributes matched when building the image push query.
    pub gitops_rule_attrs: Vec<String>,

    /// Title for created pull requests.
    pub pr_title: String,
    /// Body for created pull requests.
    pub pr_body: String,

    /// Skip push and PR creation when set.
    pub dry_run: bool,
    /// Stamp changed files when set.
    pub stamp: bool,

    /// Pull-request strategy for the hosting platform.
    pub provider: Box<dyn HostProvider>,
}
