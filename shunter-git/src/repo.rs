//! Local clone of the manifest repository, driven through the `git` CLI.
//!
//! The design contract is at the command-line boundary: every operation
//! shells out to `git` with a fixed argument order rather than binding a
//! native library.

use std::path::{Path, PathBuf};

use shunter_core::exec;

use crate::error::{io_err, GitError};

/// A local clone. Create with [`Repo::clone`], remove with [`Repo::clean`].
///
/// The on-disk directory is owned exclusively by this handle between those
/// two calls. The handle is not thread-safe; drive it from one thread.
#[derive(Debug)]
pub struct Repo {
    /// Filesystem location of the clone.
    pub dir: PathBuf,
    /// Name of the upstream remote.
    pub remote_name: String,
}

impl Repo {
    /// Clone `url` into `dir`, clearing `dir` first.
    ///
    /// The clone is partial (blobless, tagless), single-branch on
    /// `primary_branch`, and checked out only after an optional sparse
    /// pattern for `subdir` is in place. `mirror` adds a local reference
    /// clone.
    pub fn clone(
        url: &str,
        dir: &Path,
        mirror: Option<&str>,
        primary_branch: &str,
        subdir: &str,
    ) -> Result<Self, GitError> {
        match std::fs::remove_dir_all(dir) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(io_err(dir, err)),
        }

        let remote_name = "origin";

        let mut args = vec![
            "clone",
            "--no-checkout",
            "--single-branch",
            "--branch",
            primary_branch,
            "--filter=blob:none",
            "--no-tags",
            "--origin",
            remote_name,
        ];
        if let Some(mirror) = mirror {
            args.push("--reference");
            args.push(mirror);
        }
        let dir_str = dir.to_string_lossy();
        args.push(url);
        args.push(&dir_str);

        exec::run(None, "git", &args)?;

        // Restrict the checkout to the gitops subtree when one is set.
        if !is_root_path(subdir) {
            exec::run(
                Some(dir),
                "git",
                &["config", "--local", "core.sparsecheckout", "true"],
            )?;

            let sparse_path = dir.join(".git").join("info").join("sparse-checkout");
            std::fs::write(&sparse_path, format!("{subdir}/\n"))
                .map_err(|err| io_err(&sparse_path, err))?;
        }

        exec::run(Some(dir), "git", &["checkout", primary_branch])?;

        Ok(Self {
            dir: dir.to_path_buf(),
            remote_name: remote_name.to_string(),
        })
    }

    /// Remove the local clone directory.
    pub fn clean(&self) -> Result<(), GitError> {
        std::fs::remove_dir_all(&self.dir).map_err(|err| io_err(&self.dir, err))
    }

    /// Add `pattern` to the tracked remote branches and fetch them.
    pub fn fetch(&self, pattern: &str) -> Result<(), GitError> {
        exec::run(
            Some(&self.dir),
            "git",
            &[
                "remote",
                "set-branches",
                "--add",
                &self.remote_name,
                pattern,
            ],
        )?;
        exec::run(
            Some(&self.dir),
            "git",
            &[
                "fetch",
                "--force",
                "--filter=blob:none",
                "--no-tags",
                &self.remote_name,
            ],
        )?;
        Ok(())
    }

    /// Switch to `branch`, creating it from `primary_branch` if it does not
    /// exist. Returns `true` when the branch was newly created.
    pub fn switch_to_branch(&self, branch: &str, primary_branch: &str) -> Result<bool, GitError> {
        if exec::run(Some(&self.dir), "git", &["checkout", branch]).is_ok() {
            return Ok(false);
        }

        // Branch does not exist yet: create and check out.
        exec::run(Some(&self.dir), "git", &["branch", branch, primary_branch])?;
        exec::run(Some(&self.dir), "git", &["checkout", branch])?;
        Ok(true)
    }

    /// Discard the content of `branch` and reset it from `primary_branch`.
    pub fn recreate_branch(&self, branch: &str, primary_branch: &str) -> Result<(), GitError> {
        exec::run(Some(&self.dir), "git", &["checkout", primary_branch])?;
        exec::run(
            Some(&self.dir),
            "git",
            &["branch", "-f", branch, primary_branch],
        )?;
        exec::run(Some(&self.dir), "git", &["checkout", branch])?;
        Ok(())
    }

    /// Most recent commit message on the current branch, or an empty string
    /// when the log cannot be read.
    pub fn last_commit_message(&self) -> String {
        exec::run(Some(&self.dir), "git", &["log", "-1", "--pretty=%B"]).unwrap_or_default()
    }

    /// Stage all changes under `subdir` (everything at root) and commit.
    ///
    /// Returns `true` when changes were committed, `false` when the tree
    /// was clean.
    pub fn commit(&self, message: &str, subdir: &str) -> Result<bool, GitError> {
        if is_root_path(subdir) {
            exec::run(Some(&self.dir), "git", &["add", "."])?;
        } else {
            exec::run(Some(&self.dir), "git", &["add", subdir])?;
        }

        if self.is_clean()? {
            return Ok(false);
        }

        exec::run(Some(&self.dir), "git", &["commit", "-a", "-m", message])?;
        Ok(true)
    }

    /// Restore `file` to its last-committed state.
    pub fn restore_file(&self, file: &str) -> Result<(), GitError> {
        exec::run(Some(&self.dir), "git", &["checkout", "--", file])?;
        Ok(())
    }

    /// Paths that differ from the index (unstaged changes), one per line of
    /// `git diff --name-only`.
    pub fn changed_files(&self) -> Result<Vec<String>, GitError> {
        let out = exec::run(Some(&self.dir), "git", &["diff", "--name-only"])?;
        Ok(out
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Whether the working tree has no uncommitted changes.
    pub fn is_clean(&self) -> Result<bool, GitError> {
        let out = exec::run(Some(&self.dir), "git", &["status", "--porcelain"])?;
        Ok(out.is_empty())
    }

    /// Force-push `branches` to the remote with upstream tracking. All
    /// changes should be committed before calling this.
    pub fn push(&self, branches: &[String]) -> Result<(), GitError> {
        let mut args = vec!["push", &self.remote_name, "-f", "--set-upstream"];
        args.extend(branches.iter().map(String::as_str));
        exec::run(Some(&self.dir), "git", &args)?;
        Ok(())
    }
}

/// Whether `subdir` refers to the repository root.
pub(crate) fn is_root_path(subdir: &str) -> bool {
    subdir.is_empty() || subdir == "."
}
