use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Handle to an opened repository working copy. All operations shell out
/// to the `git` binary; its behavior is the contract boundary.
pub struct GitRepo {
    path: PathBuf,
}

impl GitRepo {
    /// Open a handle iff `path` still looks like a working copy root.
    /// Detection and open race against the filesystem; a vanished or
    /// no-longer-repo path is the caller's benign-skip case.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.join(".git").exists() {
            bail!("not a git repository: {}", path.display());
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    fn git(&self, args: &[&str]) -> Result<Output> {
        Command::new("git")
            .arg("-C")
            .arg(&self.path)
            .args(args)
            .output()
            .context("Failed to run git. Is it installed and on PATH?")
    }

    /// True when the working tree has uncommitted changes, untracked
    /// files included.
    pub fn is_dirty(&self) -> Result<bool> {
        let output = self.git(&["status", "--porcelain"])?;
        if !output.status.success() {
            bail!("git status failed: {}", reason(&output.stderr));
        }
        Ok(!output.stdout.is_empty())
    }

    /// Shelve uncommitted changes. The stash entry is tagged so the
    /// owner can find it later with `git stash list`.
    pub fn stash_push(&self) -> Result<()> {
        let output = self.git(&["stash", "push", "-m", "repo-sweeper auto-stash"])?;
        if !output.status.success() {
            bail!("{}", reason(&output.stderr));
        }
        Ok(())
    }

    /// Throw away uncommitted changes. Only reachable through an
    /// explicit confirmation.
    pub fn reset_hard(&self) -> Result<()> {
        let output = self.git(&["reset", "--hard", "HEAD"])?;
        if !output.status.success() {
            bail!("{}", reason(&output.stderr));
        }
        Ok(())
    }

    /// Fast-forward from the configured remote. Returns true when new
    /// commits arrived, false when already up to date.
    pub fn pull(&self) -> Result<bool> {
        let output = self.git(&["pull", "--ff-only"])?;
        if !output.status.success() {
            bail!("{}", reason(&output.stderr));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(!stdout.contains("Already up to date"))
    }

    pub fn push(&self) -> Result<()> {
        let output = self.git(&["push"])?;
        if !output.status.success() {
            bail!("{}", reason(&output.stderr));
        }
        Ok(())
    }
}

/// First line of a git stderr blob, for one-line progress output.
fn reason(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    let line = text.trim().lines().next().unwrap_or("").trim();
    if line.is_empty() {
        "git error".to_string()
    } else {
        line.to_string()
    }
}
