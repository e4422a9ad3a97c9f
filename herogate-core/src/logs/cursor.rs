//! Ordering and incremental delivery of log batches.

use crate::types::LogEntry;

/// Concatenate builder then deployer entries and sort by timestamp.
///
/// The sort is stable, so on equal timestamps builder entries stay first.
pub fn merge(builder: Vec<LogEntry>, deployer: Vec<LogEntry>) -> Vec<LogEntry> {
    let mut entries = builder;
    entries.extend(deployer);
    entries.sort_by_key(|entry| entry.timestamp);
    entries
}

/// Entries of a fresh batch not yet delivered.
///
/// If `last_seen` is in the batch, everything after its last occurrence is new.
/// Otherwise its id space is gone (a new build started) and entries newer than
/// its timestamp are new.
pub fn new_since(entries: Vec<LogEntry>, last_seen: Option<&LogEntry>) -> Vec<LogEntry> {
    let Some(last_seen) = last_seen else {
        return entries;
    };

    match entries.iter().rposition(|entry| entry.id == last_seen.id) {
        Some(position) => entries.into_iter().skip(position + 1).collect(),
        None => entries.into_iter().filter(|entry| entry.timestamp > last_seen.timestamp).collect(),
    }
}

/// Keep the final `n` entries.
pub fn last_n(mut entries: Vec<LogEntry>, n: usize) -> Vec<LogEntry> {
    if entries.len() > n {
        entries.drain(..entries.len() - n);
    }
    entries
}
