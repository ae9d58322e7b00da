use std::process::Command;

use super::{GitOperations, HISTORY_DELIMITER};
use crate::error::{KomittoError, Result};

/// Git collaborator backed by the `git` CLI.
///
/// The CLI is used instead of libgit2 so commits go through the user's
/// hooks, GPG signing, and the rest of their git config untouched, and
/// so diff output matches `git diff` byte for byte.
pub struct GitCli;

impl GitCli {
    pub fn new() -> Self {
        Self
    }

    fn run_git(&self, args: &[&str]) -> Result<std::process::Output> {
        tracing::debug!("Running: git {}", args.join(" "));
        Command::new("git")
            .args(args)
            .output()
            .map_err(|e| KomittoError::GitCommand(format!("failed to invoke git: {}", e)))
    }

    fn ensure_work_tree(&self) -> Result<()> {
        let output = self.run_git(&["rev-parse", "--is-inside-work-tree"])?;
        if !output.status.success() {
            return Err(KomittoError::Repository(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

impl GitOperations for GitCli {
    fn staged_diff(&self) -> Result<String> {
        self.ensure_work_tree()?;

        let output = self.run_git(&["diff", "--staged", "--no-prefix", "-U0"])?;
        if !output.status.success() {
            return Err(KomittoError::GitCommand(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let diff = String::from_utf8_lossy(&output.stdout).to_string();
        if diff.is_empty() {
            return Err(KomittoError::NoStagedChanges);
        }
        Ok(diff)
    }

    fn recent_log(&self, limit: usize) -> Result<Option<String>> {
        let limit_arg = limit.to_string();
        let output = self.run_git(&[
            "log",
            "-n",
            &limit_arg,
            "--date=iso",
            "--pretty=format:Commit: %h%nDate: %ad%nMessage:%n%B%n[Files]",
            "--name-status",
        ]);

        // History is decoration: any log failure (e.g. an unborn HEAD)
        // just omits the section.
        let output = match output {
            Ok(o) if o.status.success() => o,
            _ => return Ok(None),
        };

        let logs = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if logs.is_empty() {
            return Ok(None);
        }

        let blocks: Vec<String> = logs
            .split("Commit: ")
            .filter(|block| !block.trim().is_empty())
            .map(|block| format!("Commit: {}", block.trim()))
            .collect();

        Ok(Some(blocks.join(HISTORY_DELIMITER)))
    }

    fn commit_messages(&self, limit: usize) -> Result<Vec<String>> {
        let limit_arg = limit.to_string();
        let output = self.run_git(&["log", "-n", &limit_arg, "--pretty=format:%B%x1e"])?;
        if !output.status.success() {
            return Ok(vec![]);
        }

        let raw = String::from_utf8_lossy(&output.stdout).to_string();
        Ok(raw
            .split('\u{1e}')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn commit(&self, message: &str) -> Result<()> {
        let output = self.run_git(&["commit", "-m", message])?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let error_msg = if stderr.trim().is_empty() {
                // Some git errors land on stdout instead of stderr
                String::from_utf8_lossy(&output.stdout).trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(KomittoError::GitCommand(error_msg));
        }

        Ok(())
    }
}
