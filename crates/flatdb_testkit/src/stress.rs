//! Helpers for running transactions on several threads.

use crate::fixtures::TestStore;
use crate::records::Counter;
use flatdb_core::{CoreError, CoreResult};
use parking_lot::Mutex;
use std::sync::Barrier;
use std::thread;

/// Runs `f` on `threads` threads started together and returns the results
/// in thread order.
pub fn run_concurrently<T, F>(threads: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync,
{
    let barrier = Barrier::new(threads);
    let results = Mutex::new(Vec::with_capacity(threads));

    thread::scope(|scope| {
        for index in 0..threads {
            let barrier = &barrier;
            let results = &results;
            let f = &f;
            scope.spawn(move || {
                barrier.wait();
                let value = f(index);
                results.lock().push((index, value));
            });
        }
    });

    let mut results = results.into_inner();
    results.sort_by_key(|(index, _)| *index);
    results.into_iter().map(|(_, value)| value).collect()
}

/// Outcome of a read-modify-write loop under contention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentionReport {
    /// Increments that committed.
    pub committed: usize,
    /// Attempts that failed with a retryable conflict.
    pub conflicts: usize,
}

impl ContentionReport {
    /// Adds up reports from several threads.
    pub fn merge(reports: impl IntoIterator<Item = Self>) -> Self {
        reports.into_iter().fold(Self::default(), |acc, r| Self {
            committed: acc.committed + r.committed,
            conflicts: acc.conflicts + r.conflicts,
        })
    }
}

/// Increments the counter stored under `key` `rounds` times, retrying each
/// increment until it commits.
///
/// Retryable conflicts are counted; any other error is returned.
pub fn increment_counter(
    fixture: &TestStore<Counter>,
    key: &str,
    rounds: usize,
) -> CoreResult<ContentionReport> {
    let mut report = ContentionReport::default();

    for _ in 0..rounds {
        loop {
            match try_increment(fixture, key) {
                Ok(()) => {
                    report.committed += 1;
                    break;
                }
                Err(e) if e.is_retryable() => report.conflicts += 1,
                Err(e) => return Err(e),
            }
        }
    }

    Ok(report)
}

fn try_increment(fixture: &TestStore<Counter>, key: &str) -> CoreResult<()> {
    let mut txn = fixture.begin();
    let mut counter = fixture
        .store
        .read(&mut txn, key)?
        .ok_or_else(|| CoreError::invalid_operation(format!("counter {key} does not exist")))?;
    counter.set("value", |c| c.value += 1)?;
    fixture.store.update(&mut txn, &counter)?;
    txn.commit()
}
