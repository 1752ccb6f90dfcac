use crate::types::ConfirmReset;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

/// Console confirmation for destructive resets. Workers run
/// concurrently; the lock keeps two dirty repositories from
/// interleaving their prompts on shared stdin/stdout.
#[derive(Default)]
pub struct ConsolePrompter {
    lock: Mutex<()>,
}

impl ConsolePrompter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfirmReset for ConsolePrompter {
    fn confirm_reset(&self, repo: &Path) -> bool {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        print!(
            "{} has uncommitted changes. Hard-reset and continue? [y/N] ",
            repo.display()
        );
        io::stdout().flush().ok();

        let mut buf = String::new();
        if io::stdin().lock().read_line(&mut buf).is_err() {
            return false;
        }
        let answer = buf.trim().to_ascii_lowercase();
        answer == "y" || answer == "yes"
    }
}
