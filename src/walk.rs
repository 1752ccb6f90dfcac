use crate::types::{RepoTask, SyncCommand};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

/// True iff version-control metadata sits directly under `path`.
/// A `.git` file counts too: linked worktrees use a gitfile pointer.
/// Missing or inaccessible paths are "not a repo", never an error.
pub fn is_repo_root(path: &Path) -> bool {
    path.join(".git").exists()
}

/// Recursive directory walk that feeds one task per detected repository
/// into the worker queue. Recursion is explicit and single-level so the
/// depth bound and the repo-as-leaf rule stay enforceable; a set of
/// canonicalized directories guarantees no directory is visited twice,
/// symlink loops included.
pub struct Walker {
    command: SyncCommand,
    continue_into_nested: bool,
    max_depth: usize,
    tasks: Sender<RepoTask>,
    visited: HashSet<PathBuf>,
    emitted: Vec<PathBuf>,
}

impl Walker {
    pub fn new(
        command: SyncCommand,
        continue_into_nested: bool,
        max_depth: usize,
        tasks: Sender<RepoTask>,
    ) -> Self {
        Self {
            command,
            continue_into_nested,
            max_depth,
            tasks,
            visited: HashSet::new(),
            emitted: Vec::new(),
        }
    }

    /// Walk one root. A root that does not exist or is not a directory
    /// is silently skipped, matching the detector's semantics.
    pub fn walk(&mut self, root: &Path) {
        self.walk_at(root, 0);
    }

    /// The paths a task was emitted for, in discovery order. Consuming
    /// the walker drops the task sender and closes the worker queue.
    pub fn into_emitted(self) -> Vec<PathBuf> {
        self.emitted
    }

    fn walk_at(&mut self, dir: &Path, depth: usize) {
        if depth >= self.max_depth {
            println!(
                "skip {}: too deep (depth {depth} >= max {})",
                dir.display(),
                self.max_depth
            );
            return;
        }
        let Ok(canonical) = dir.canonicalize() else {
            return;
        };
        if !canonical.is_dir() || !self.visited.insert(canonical) {
            return;
        }

        if is_repo_root(dir) {
            let _ = self.tasks.send(RepoTask {
                path: dir.to_path_buf(),
                command: self.command,
            });
            self.emitted.push(dir.to_path_buf());
            if !self.continue_into_nested {
                return;
            }
        }

        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };
        let mut subdirs: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_dir() && path.file_name().is_some_and(|n| n != ".git"))
            .collect();
        subdirs.sort();
        for sub in subdirs {
            self.walk_at(&sub, depth + 1);
        }
    }
}
