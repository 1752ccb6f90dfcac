use std::path::{Path, PathBuf};
use std::sync::Arc;

// ============================================================
// CONFIRMATION TRAIT
// ============================================================

/// Trait for confirming a destructive hard reset on a dirty repository.
/// The console implementation serializes prompts; tests stub it out.
pub trait ConfirmReset: Send + Sync {
    /// Ask whether `repo` may be hard-reset. Only an explicit yes
    /// returns true; anything ambiguous declines.
    fn confirm_reset(&self, repo: &Path) -> bool;
}

// ============================================================
// APPLICATION TYPES
// ============================================================

/// The remote operation applied to every detected repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncCommand {
    Pull,
    Push,
    /// Walk and open only; used by `--dry-run` to report which
    /// repositories a real run would touch.
    NoOp,
}

impl SyncCommand {
    pub fn verb(self) -> &'static str {
        match self {
            Self::Pull => "pull",
            Self::Push => "push",
            Self::NoOp => "check",
        }
    }
}

/// One unit of work: created by the walk, consumed by exactly one worker.
#[derive(Debug, Clone)]
pub struct RepoTask {
    pub path: PathBuf,
    pub command: SyncCommand,
}

/// What to do when a pull meets uncommitted changes.
#[derive(Clone)]
pub enum DirtyPolicy {
    /// Stash the changes and continue; the stash is left in place.
    AutoStash,
    /// Ask before hard-resetting; a decline leaves the tree untouched.
    Confirm(Arc<dyn ConfirmReset>),
}

/// Terminal state of one repository update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Updated,
    UpToDate,
    /// Could not be updated safely; carries a one-line reason.
    Unresolved(String),
    /// The path stopped being a repository between detection and open.
    Skipped,
}

// ============================================================
// CHANNEL MESSAGES
// ============================================================

/// Posted by a worker exactly once per task.
#[derive(Debug, Clone)]
pub struct Report {
    pub path: PathBuf,
    pub outcome: Outcome,
}
