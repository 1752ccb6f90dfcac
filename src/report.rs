use crate::types::{Outcome, Report};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

/// End-of-run tallies. `unresolved` and `timed_out` keep completion
/// order; nothing is deduplicated because the walk emits each
/// repository at most once.
#[derive(Debug, Default)]
pub struct Summary {
    pub updated: usize,
    pub up_to_date: usize,
    pub skipped: usize,
    pub unresolved: Vec<(PathBuf, String)>,
    pub timed_out: Vec<PathBuf>,
}

impl Summary {
    /// Repositories that need manual attention.
    pub fn problems(&self) -> usize {
        self.unresolved.len() + self.timed_out.len()
    }

    pub fn print(&self) {
        println!();
        println!(
            "{} updated, {} already up to date, {} skipped",
            self.updated, self.up_to_date, self.skipped
        );
        if !self.unresolved.is_empty() {
            println!("these repos could not be updated:");
            for (path, reason) in &self.unresolved {
                println!("  {}: {reason}, please check", path.display());
            }
        }
        if !self.timed_out.is_empty() {
            println!("these repos did not finish before the deadline:");
            for path in &self.timed_out {
                println!("  {}", path.display());
            }
        }
    }
}

/// Drain worker reports until every expected path has reported or the
/// deadline passes. Stragglers are abandoned, not joined, and are
/// booked as timed out rather than silently omitted. A worker can still
/// finish after this returns; its repository is then already listed as
/// timed out, which is the race the deadline trades for.
pub fn collect(rx: &Receiver<Report>, expected: Vec<PathBuf>, timeout: Duration) -> Summary {
    let deadline = Instant::now() + timeout;
    let mut pending: HashSet<PathBuf> = expected.into_iter().collect();
    let mut summary = Summary::default();

    while !pending.is_empty() {
        let Some(wait) = deadline.checked_duration_since(Instant::now()) else {
            break;
        };
        match rx.recv_timeout(wait) {
            Ok(report) => {
                pending.remove(&report.path);
                match report.outcome {
                    Outcome::Updated => summary.updated += 1,
                    Outcome::UpToDate => summary.up_to_date += 1,
                    Outcome::Skipped => summary.skipped += 1,
                    Outcome::Unresolved(reason) => summary.unresolved.push((report.path, reason)),
                }
            }
            Err(RecvTimeoutError::Timeout) => break,
            // All workers gone with tasks still pending: their reports
            // can never arrive, book them below.
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    let mut stragglers: Vec<PathBuf> = pending.into_iter().collect();
    stragglers.sort();
    summary.timed_out.extend(stragglers);
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn report(path: &str, outcome: Outcome) -> Report {
        Report {
            path: PathBuf::from(path),
            outcome,
        }
    }

    #[test]
    fn books_missing_reports_as_timed_out() {
        let (tx, rx) = mpsc::channel();
        tx.send(report("/a", Outcome::Updated)).unwrap();
        tx.send(report("/b", Outcome::Unresolved("dirty".to_string())))
            .unwrap();

        let expected = vec![PathBuf::from("/a"), PathBuf::from("/b"), PathBuf::from("/c")];
        let summary = collect(&rx, expected, Duration::from_millis(50));

        assert_eq!(summary.updated, 1);
        assert_eq!(summary.unresolved.len(), 1);
        assert_eq!(summary.timed_out, vec![PathBuf::from("/c")]);
        assert_eq!(summary.problems(), 2);
    }

    #[test]
    fn returns_as_soon_as_everything_reported() {
        let (tx, rx) = mpsc::channel();
        tx.send(report("/b", Outcome::UpToDate)).unwrap();
        tx.send(report("/a", Outcome::Skipped)).unwrap();

        let start = Instant::now();
        let expected = vec![PathBuf::from("/a"), PathBuf::from("/b")];
        let summary = collect(&rx, expected, Duration::from_secs(30));

        assert!(start.elapsed() < Duration::from_secs(5));
        assert_eq!(summary.up_to_date, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.problems(), 0);
    }

    #[test]
    fn unresolved_order_is_completion_order() {
        let (tx, rx) = mpsc::channel();
        tx.send(report("/z", Outcome::Unresolved("x".to_string()))).unwrap();
        tx.send(report("/a", Outcome::Unresolved("y".to_string()))).unwrap();

        let expected = vec![PathBuf::from("/a"), PathBuf::from("/z")];
        let summary = collect(&rx, expected, Duration::from_secs(30));

        let order: Vec<&PathBuf> = summary.unresolved.iter().map(|(p, _)| p).collect();
        assert_eq!(order, vec![&PathBuf::from("/z"), &PathBuf::from("/a")]);
    }

    #[test]
    fn closed_channel_books_stragglers() {
        let (tx, rx) = mpsc::channel::<Report>();
        drop(tx);
        let summary = collect(&rx, vec![PathBuf::from("/a")], Duration::from_secs(30));
        assert_eq!(summary.timed_out, vec![PathBuf::from("/a")]);
    }
}
