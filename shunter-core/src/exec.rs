//! Subprocess gateway.
//!
//! Every external binary the toolkit drives (the build tool, the VCS, the
//! per-target executables) goes through [`run`] so that invocations and
//! their output land in the log in one place.

use std::path::Path;
use std::process::Command;

use crate::error::CoreError;

/// Execute `name` with `args` in `dir` and return the captured output,
/// stdout followed by stderr. Pass `None` as `dir` to inherit the current
/// working directory.
///
/// A non-zero exit is reported as [`CoreError::CommandFailed`] carrying the
/// command line and the captured output so callers may still log it.
pub fn run(dir: Option<&Path>, name: &str, args: &[&str]) -> Result<String, CoreError> {
    tracing::info!(cmd = name, args = args.join(" "), "executing");

    let mut cmd = Command::new(name);
    cmd.args(args);
    match dir {
        Some(dir) if !dir.as_os_str().is_empty() => {
            cmd.current_dir(dir);
        }
        _ => {}
    }

    let out = cmd.output().map_err(|source| CoreError::Spawn {
        command: command_line(name, args),
        source,
    })?;

    let mut combined = String::from_utf8_lossy(&out.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&out.stderr));

    tracing::info!(result = %combined, "output");

    if !out.status.success() {
        return Err(CoreError::CommandFailed {
            command: command_line(name, args),
            status: out.status.code().unwrap_or(-1),
            output: combined,
        });
    }

    Ok(combined)
}

/// Execute the command and panic on failure, terminating the process.
///
/// Only for call sites where a precondition makes failure a bug (e.g. an
/// executable the build system just produced); never for network calls.
pub fn must_run(dir: Option<&Path>, name: &str, args: &[&str]) -> String {
    match run(dir, name, args) {
        Ok(output) => output,
        Err(err) => panic!("command failed: {err}"),
    }
}

fn command_line(name: &str, args: &[&str]) -> String {
    if args.is_empty() {
        name.to_string()
    } else {
        format!("{name} {}", args.join(" "))
    }
}
