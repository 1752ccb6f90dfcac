mod cli;
mod git;
mod prompt;
mod report;
mod sync;
mod types;
mod walk;

use clap::Parser;
use std::process::ExitCode;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cli::Args;
use prompt::ConsolePrompter;
use types::{DirtyPolicy, SyncCommand};
use walk::Walker;

fn main() -> ExitCode {
    let args = Args::parse();
    let invocation = args.invocation();
    let command = if args.dry_run {
        SyncCommand::NoOp
    } else {
        invocation.command
    };

    let policy = if args.git_stash_if_have_uncommitted_changes {
        DirtyPolicy::AutoStash
    } else {
        DirtyPolicy::Confirm(Arc::new(ConsolePrompter::new()))
    };

    let (task_tx, task_rx) = mpsc::channel();
    let (report_tx, report_rx) = mpsc::channel();
    let _workers = sync::start_workers(
        args.workers,
        Arc::new(Mutex::new(task_rx)),
        &policy,
        report_tx,
    );

    let mut walker = Walker::new(
        command,
        args.continue_when_meet_git,
        args.stop_when_meet_max_depth,
        task_tx,
    );
    for root in &invocation.roots {
        walker.walk(root);
    }
    // Consuming the walker drops the task sender; workers drain the
    // queue and exit.
    let expected = walker.into_emitted();

    if expected.is_empty() {
        println!("no repositories found");
        return ExitCode::SUCCESS;
    }
    println!("found {} repositories", expected.len());

    let summary = report::collect(
        &report_rx,
        expected,
        Duration::from_secs(args.join_timeout),
    );
    summary.print();

    // Unresolved or timed-out repositories make the run non-zero so
    // scripts can gate on it; option-parse errors already exited 2.
    if summary.problems() > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
