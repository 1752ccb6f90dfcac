use crate::git::GitRepo;
use crate::types::{DirtyPolicy, Outcome, Report, RepoTask, SyncCommand};
use anyhow::Result;
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

/// Spawn the worker pool. Each worker takes tasks from the shared queue
/// until the walk side closes it, posting exactly one report per task.
/// The pool bounds concurrency: a huge tree never means a thread per
/// repository.
pub fn start_workers(
    count: usize,
    tasks: Arc<Mutex<Receiver<RepoTask>>>,
    policy: &DirtyPolicy,
    reports: Sender<Report>,
) -> Vec<JoinHandle<()>> {
    (0..count.max(1))
        .map(|_| {
            let tasks = Arc::clone(&tasks);
            let policy = policy.clone();
            let reports = reports.clone();
            thread::spawn(move || loop {
                let task = {
                    let queue = tasks.lock().unwrap_or_else(PoisonError::into_inner);
                    match queue.recv() {
                        Ok(task) => task,
                        // Queue closed and drained: the walk is done.
                        Err(_) => return,
                    }
                };
                run_update(&task, &policy, &reports);
            })
        })
        .collect()
}

/// Per-repository update state machine: open, settle a dirty tree per
/// policy, dispatch the command. Every exit posts exactly one report so
/// the collector's bookkeeping stays exact.
pub fn run_update(task: &RepoTask, policy: &DirtyPolicy, reports: &Sender<Report>) {
    let send = |outcome: Outcome| {
        let _ = reports.send(Report {
            path: task.path.clone(),
            outcome,
        });
    };

    // The detector's check and this open race against the filesystem;
    // a path that stopped being a repo in between is not an error.
    let Ok(repo) = GitRepo::open(&task.path) else {
        send(Outcome::Skipped);
        return;
    };

    if task.command == SyncCommand::Pull {
        match repo.is_dirty() {
            Ok(false) => {}
            Ok(true) => match policy {
                DirtyPolicy::AutoStash => {
                    if let Err(e) = repo.stash_push() {
                        println!("stash failed for {}: {e}", task.path.display());
                        send(Outcome::Unresolved(format!("stash failed: {e}")));
                        return;
                    }
                    println!("stashed uncommitted changes in {}", task.path.display());
                }
                DirtyPolicy::Confirm(prompter) => {
                    if prompter.confirm_reset(&task.path) {
                        if let Err(e) = repo.reset_hard() {
                            println!("reset failed for {}: {e}", task.path.display());
                            send(Outcome::Unresolved(format!("reset failed: {e}")));
                            return;
                        }
                    } else {
                        send(Outcome::Unresolved("uncommitted changes".to_string()));
                        return;
                    }
                }
            },
            Err(e) => {
                send(Outcome::Unresolved(e.to_string()));
                return;
            }
        }
    }

    println!("start {} for {}", task.command.verb(), task.path.display());
    match dispatch(task.command, &repo) {
        Ok(outcome) => {
            if outcome == Outcome::UpToDate && task.command == SyncCommand::Pull {
                println!("done {} for {} (already up to date)", task.command.verb(), task.path.display());
            } else {
                println!("done {} for {}", task.command.verb(), task.path.display());
            }
            send(outcome);
        }
        Err(e) => {
            println!("{} failed for {}: {e}", task.command.verb(), task.path.display());
            send(Outcome::Unresolved(e.to_string()));
        }
    }
}

/// Single dispatch point from the command variant to the corresponding
/// git client call.
fn dispatch(command: SyncCommand, repo: &GitRepo) -> Result<Outcome> {
    match command {
        SyncCommand::Pull => Ok(if repo.pull()? {
            Outcome::Updated
        } else {
            Outcome::UpToDate
        }),
        SyncCommand::Push => repo.push().map(|()| Outcome::Updated),
        SyncCommand::NoOp => Ok(Outcome::UpToDate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report;
    use crate::types::ConfirmReset;
    use crate::walk::Walker;
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::process::Command;
    use std::sync::mpsc;
    use std::time::Duration;
    use tempfile::TempDir;

    struct Decline;

    impl ConfirmReset for Decline {
        fn confirm_reset(&self, _repo: &Path) -> bool {
            false
        }
    }

    fn git_in(dir: &Path, args: &[&str]) {
        let output = Command::new("git")
            .arg("-C")
            .arg(dir)
            .args(args)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
    }

    fn init_repo(dir: &Path) {
        fs::create_dir_all(dir).unwrap();
        git_in(dir, &["init"]);
        git_in(dir, &["config", "user.email", "test@example.com"]);
        git_in(dir, &["config", "user.name", "Test"]);
        fs::write(dir.join("README"), "hello\n").unwrap();
        git_in(dir, &["add", "."]);
        git_in(dir, &["commit", "-m", "init"]);
    }

    fn clone_repo(origin: &Path, dir: &Path) {
        git_in(
            origin.parent().unwrap(),
            &[
                "clone",
                origin.to_str().unwrap(),
                dir.to_str().unwrap(),
            ],
        );
        git_in(dir, &["config", "user.email", "test@example.com"]);
        git_in(dir, &["config", "user.name", "Test"]);
    }

    fn run_one(task: &RepoTask, policy: &DirtyPolicy) -> Outcome {
        let (tx, rx) = mpsc::channel();
        run_update(task, policy, &tx);
        rx.recv().unwrap().outcome
    }

    #[test]
    fn vanished_repo_is_skipped_quietly() {
        let tmp = TempDir::new().unwrap();
        let task = RepoTask {
            path: tmp.path().join("gone"),
            command: SyncCommand::Pull,
        };
        assert_eq!(run_one(&task, &DirtyPolicy::AutoStash), Outcome::Skipped);
    }

    #[test]
    fn declined_confirmation_leaves_tree_untouched() {
        let tmp = TempDir::new().unwrap();
        let repo = tmp.path().join("repo");
        init_repo(&repo);
        fs::write(repo.join("README"), "local edit\n").unwrap();

        let task = RepoTask {
            path: repo.clone(),
            command: SyncCommand::Pull,
        };
        let policy = DirtyPolicy::Confirm(std::sync::Arc::new(Decline));
        let outcome = run_one(&task, &policy);

        assert_eq!(outcome, Outcome::Unresolved("uncommitted changes".to_string()));
        assert_eq!(fs::read_to_string(repo.join("README")).unwrap(), "local edit\n");
    }

    #[test]
    fn auto_stash_then_pull() {
        let tmp = TempDir::new().unwrap();
        let origin = tmp.path().join("origin");
        let work = tmp.path().join("work");
        init_repo(&origin);
        clone_repo(&origin, &work);
        fs::write(work.join("README"), "local edit\n").unwrap();

        let task = RepoTask {
            path: work.clone(),
            command: SyncCommand::Pull,
        };
        let outcome = run_one(&task, &DirtyPolicy::AutoStash);

        assert_eq!(outcome, Outcome::UpToDate);
        // The edit went into the stash, not the tree.
        assert_eq!(fs::read_to_string(work.join("README")).unwrap(), "hello\n");
    }

    #[test]
    fn failed_stash_means_unresolved_and_no_pull() {
        let tmp = TempDir::new().unwrap();
        let repo = tmp.path().join("repo");
        // No commits yet: git cannot stash on an unborn branch, so the
        // stash attempt itself fails.
        fs::create_dir_all(&repo).unwrap();
        git_in(&repo, &["init"]);
        fs::write(repo.join("untracked.txt"), "x\n").unwrap();

        let task = RepoTask {
            path: repo,
            command: SyncCommand::Pull,
        };
        match run_one(&task, &DirtyPolicy::AutoStash) {
            Outcome::Unresolved(msg) => assert!(msg.starts_with("stash failed")),
            other => panic!("expected unresolved, got {other:?}"),
        }
    }

    /// Three siblings: a clean clone, a dirty repo with a declined
    /// confirmation, and a plain directory. One pull happens, one repo
    /// lands in the unresolved report, the plain directory is ignored.
    #[test]
    fn end_to_end_walk_and_update() {
        let tmp = TempDir::new().unwrap();
        let roots = tmp.path().join("roots");
        fs::create_dir_all(&roots).unwrap();
        let origin = tmp.path().join("origin");
        init_repo(&origin);

        let clean = roots.join("clean");
        let dirty = roots.join("dirty");
        clone_repo(&origin, &clean);
        init_repo(&dirty);
        fs::write(dirty.join("README"), "local edit\n").unwrap();
        fs::create_dir_all(roots.join("plain")).unwrap();

        let (task_tx, task_rx) = mpsc::channel();
        let (report_tx, report_rx) = mpsc::channel();
        let policy = DirtyPolicy::Confirm(std::sync::Arc::new(Decline));
        let _workers = start_workers(
            4,
            Arc::new(Mutex::new(task_rx)),
            &policy,
            report_tx,
        );

        let mut walker = Walker::new(SyncCommand::Pull, false, 10, task_tx);
        walker.walk(&roots);
        let expected = walker.into_emitted();
        assert_eq!(expected.len(), 2);

        let summary = report::collect(&report_rx, expected, Duration::from_secs(60));
        assert_eq!(summary.up_to_date, 1);
        assert_eq!(summary.updated, 0);
        assert!(summary.timed_out.is_empty());
        let unresolved: Vec<&PathBuf> = summary.unresolved.iter().map(|(p, _)| p).collect();
        assert_eq!(unresolved, vec![&dirty]);
    }
}
