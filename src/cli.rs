use crate::types::SyncCommand;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "repo-sweeper", version)]
#[command(about = "Bulk-update every git repository found under one or more directory trees")]
pub struct Args {
    /// `pull` or `push` followed by root paths. A first value that is
    /// neither is taken as a path with the command defaulting to pull;
    /// no values at all means pull under the current directory.
    #[arg(value_name = "COMMAND|PATH")]
    pub targets: Vec<String>,

    /// Descend into repositories nested inside other repositories
    #[arg(long, short = 'c')]
    pub continue_when_meet_git: bool,

    /// Stop recursing once this depth below a root is reached
    #[arg(long, short = 'd', value_name = "N", default_value_t = 10)]
    pub stop_when_meet_max_depth: usize,

    /// Stash uncommitted changes instead of asking before a hard reset
    #[arg(long, short = 'y')]
    pub git_stash_if_have_uncommitted_changes: bool,

    /// Walk and report only; no repository is touched
    #[arg(long)]
    pub dry_run: bool,

    /// Number of concurrent update workers
    #[arg(long, short = 'n', env = "REPO_SWEEPER_WORKERS", default_value_t = 8)]
    pub workers: usize,

    /// Seconds to wait for all updates before reporting stragglers
    #[arg(long, short = 't', value_name = "SECS", default_value_t = 30)]
    pub join_timeout: u64,
}

/// Resolved positional arguments: the sync command plus the roots to walk.
#[derive(Debug, PartialEq, Eq)]
pub struct Invocation {
    pub command: SyncCommand,
    pub roots: Vec<PathBuf>,
}

impl Args {
    /// Unify the two historical invocation shapes: an explicit
    /// `pull`/`push` followed by paths, and a bare list of paths that
    /// implies pull.
    pub fn invocation(&self) -> Invocation {
        let (command, paths) = match self.targets.split_first() {
            Some((first, rest)) if first == "pull" => (SyncCommand::Pull, rest),
            Some((first, rest)) if first == "push" => (SyncCommand::Push, rest),
            _ => (SyncCommand::Pull, &self.targets[..]),
        };
        let roots = if paths.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            paths.iter().map(PathBuf::from).collect()
        };
        Invocation { command, roots }
    }
}
