//! `shunter create-prs` — the deployment-train orchestrator.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Args, ValueEnum};

use shunter_core::CancelToken;
use shunter_git::{bitbucket, github, gitlab, HostProvider, ProviderError};
use shunter_train::Config;

/// Arguments for `shunter create-prs`.
#[derive(Args, Debug)]
pub struct CreatePrsArgs {
    /// Build tool command name or path.
    #[arg(long = "bazel_cmd", default_value = "bazel")]
    pub bazel_cmd: String,

    /// Build workspace root directory.
    #[arg(long = "workspace", default_value = "", value_parser = parse_workspace_path)]
    pub workspace: PathBuf,

    /// Build query target pattern.
    #[arg(long = "target", default_value = "")]
    pub target: String,

    /// Remote manifest repository URL.
    #[arg(long = "git_repo", default_value = "")]
    pub git_repo: String,

    /// Local mirror used as a reference clone.
    #[arg(long = "git_mirror")]
    pub git_mirror: Option<String>,

    /// Subdirectory for sparse checkout (empty means the repository root).
    #[arg(long = "gitops_path", default_value = "")]
    pub gitops_path: String,

    /// Directory for temporary clones.
    #[arg(long = "tmp_dir", default_value_os_t = std::env::temp_dir())]
    pub tmp_dir: PathBuf,

    /// Release branch to filter targets by.
    #[arg(long = "release_branch", default_value = "")]
    pub release_branch: String,

    /// Primary branch name.
    #[arg(long = "primary_branch", default_value = "main")]
    pub primary_branch: String,

    /// Prefix for deployment branch names.
    #[arg(long = "deployment_branch_prefix", default_value = "deploy/")]
    pub deployment_branch_prefix: String,

    /// Suffix for deployment branch names.
    #[arg(long = "deployment_branch_suffix", default_value = "")]
    pub deployment_branch_suffix: String,

    /// Source branch name for the stamp context.
    #[arg(long = "branch_name", default_value = "")]
    pub branch_name: String,

    /// Source commit SHA for the stamp context.
    #[arg(long = "git_commit", default_value = "")]
    pub git_commit: String,

    /// Number of concurrent image push workers.
    #[arg(long = "push_parallelism", default_value_t = 4)]
    pub push_parallelism: usize,

    /// Rule kind to query (repeatable).
    #[arg(long = "gitops_kind", action = ArgAction::Append)]
    pub gitops_kind: Vec<String>,

    /// Rule name for the push deps query (repeatable).
    #[arg(long = "gitops_rule_name", action = ArgAction::Append)]
    pub gitops_rule_name: Vec<String>,

    /// Rule attribute for the push deps query (repeatable).
    #[arg(long = "gitops_rule_attr", action = ArgAction::Append)]
    pub gitops_rule_attr: Vec<String>,

    /// Title for created pull requests.
    #[arg(long = "pr_title", default_value = "GitOps deployment")]
    pub pr_title: String,

    /// Body for created pull requests.
    #[arg(long = "pr_body", default_value = "")]
    pub pr_body: String,

    /// Skip push and PR creation.
    #[arg(long = "dry_run")]
    pub dry_run: bool,

    /// Enable file stamping.
    #[arg(long = "stamp")]
    pub stamp: bool,

    /// Git hosting platform.
    #[arg(long = "git_server", value_enum, default_value = "github")]
    pub git_server: GitServer,

    /// GitHub repository owner.
    #[arg(long = "github_repo_owner", default_value = "")]
    pub github_repo_owner: String,

    /// GitHub repository name.
    #[arg(long = "github_repo", default_value = "")]
    pub github_repo: String,

    /// GitHub personal access token.
    #[arg(long = "github_access_token", default_value = "")]
    pub github_access_token: String,

    /// GitHub Enterprise hostname.
    #[arg(long = "github_enterprise_host", default_value = "")]
    pub github_enterprise_host: String,

    /// GitLab instance URL.
    #[arg(long = "gitlab_host", default_value = "")]
    pub gitlab_host: String,

    /// GitLab project path (org/project).
    #[arg(long = "gitlab_repo", default_value = "")]
    pub gitlab_repo: String,

    /// GitLab personal access token.
    #[arg(long = "gitlab_access_token", default_value = "")]
    pub gitlab_access_token: String,

    /// Bitbucket Server REST API URL for pull requests.
    #[arg(long = "bitbucket_api_endpoint", default_value = "")]
    pub bitbucket_api_endpoint: String,

    /// Bitbucket project key.
    #[arg(long = "bitbucket_project", default_value = "")]
    pub bitbucket_project: String,

    /// Bitbucket repository slug.
    #[arg(long = "bitbucket_repo", default_value = "")]
    pub bitbucket_repo: String,

    /// Bitbucket API username.
    #[arg(long = "bitbucket_user", default_value = "")]
    pub bitbucket_user: String,

    /// Bitbucket API password or token.
    #[arg(long = "bitbucket_password", default_value = "")]
    pub bitbucket_password: String,
}

/// Parses `--workspace`, allowing an empty string (clap's built-in `PathBuf`
/// parser rejects empty values, which would otherwise break the `""` default).
fn parse_workspace_path(s: &str) -> Result<PathBuf, std::convert::Infallible> {
    Ok(PathBuf::from(s))
}

/// Supported hosting platforms.
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum GitServer {
    Github,
    Gitlab,
    Bitbucket,
}

impl CreatePrsArgs {
    pub fn run(self) -> Result<()> {
        let provider = self.new_provider().context("create provider")?;

        let cfg = Config {
            bazel_cmd: self.bazel_cmd,
            workspace: self.workspace,
            target: self.target,
            git_repo: self.git_repo,
            git_mirror: self.git_mirror,
            gitops_path: self.gitops_path,
            tmp_dir: self.tmp_dir,
            release_branch: self.release_branch,
            primary_branch: self.primary_branch,
            deployment_branch_prefix: self.deployment_branch_prefix,
            deployment_branch_suffix: self.deployment_branch_suffix,
            branch_name: self.branch_name,
            git_commit: self.git_commit,
            push_parallelism: self.push_parallelism,
            gitops_kinds: self.gitops_kind,
            gitops_rule_names: self.gitops_rule_name,
            gitops_rule_attrs: self.gitops_rule_attr,
            pr_title: self.pr_title,
            pr_body: self.pr_body,
            dry_run: self.dry_run,
            stamp: self.stamp,
            provider,
        };

        run_blocking(cfg).context("running gitops pr creation")
    }

    /// Build the pull-request provider selected by `--git_server`.
    fn new_provider(&self) -> Result<Box<dyn HostProvider>, ProviderError> {
        match self.git_server {
            GitServer::Github => {
                let provider = github::Provider::new(github::Config {
                    repo_owner: self.github_repo_owner.clone(),
                    repo: self.github_repo.clone(),
                    access_token: self.github_access_token.clone(),
                    enterprise_host: self.github_enterprise_host.clone(),
                })?;
                Ok(Box::new(provider))
            }
            GitServer::Gitlab => {
                let provider = gitlab::Provider::new(gitlab::Config {
                    host: self.gitlab_host.clone(),
                    repo: self.gitlab_repo.clone(),
                    access_token: self.gitlab_access_token.clone(),
                })?;
                Ok(Box::new(provider))
            }
            GitServer::Bitbucket => {
                let provider = bitbucket::Provider::new(bitbucket::Config {
                    api_endpoint: self.bitbucket_api_endpoint.clone(),
                    project_key: self.bitbucket_project.clone(),
                    repo_slug: self.bitbucket_repo.clone(),
                    user: self.bitbucket_user.clone(),
                    password: self.bitbucket_password.clone(),
                })?;
                Ok(Box::new(provider))
            }
        }
    }
}

/// Drive the synchronous pipeline on a runtime that also watches for
/// ctrl-c: an interrupt flips the cancellation token, running subprocesses
/// finish, and the run reports `Cancelled`.
fn run_blocking(cfg: Config) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building runtime")?;

    runtime.block_on(async move {
        let cancel = CancelToken::new();

        let signal_task = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("interrupt received, cancelling run");
                    cancel.cancel();
                }
            }
        });

        let result = tokio::task::spawn_blocking(move || shunter_train::run(&cfg, &cancel)).await;
        signal_task.abort();

        match result {
            Ok(run_result) => run_result.map_err(Into::into),
            Err(join_err) if join_err.is_panic() => std::panic::resume_unwind(join_err.into_panic()),
            Err(join_err) => Err(anyhow!("run task failed: {join_err}")),
        }
    })
}
