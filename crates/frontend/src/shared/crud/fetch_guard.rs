//! Stale-response suppression.
//!
//! Every logical async target (the list query, each async-validated
//! field) owns one guard. Issuing a sequence number supersedes all
//! earlier ones; a completion whose number is no longer current must be
//! discarded, so the visible state always reflects the most recently
//! *issued* request, not the most recently resolved one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct SequenceGuard {
    latest: Arc<AtomicU64>,
}

impl SequenceGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, superseding every earlier one.
    pub fn issue(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Whether a completion for `seq` may still be applied.
    pub fn is_current(&self, seq: u64) -> bool {
        self.latest.load(Ordering::Relaxed) == seq
    }

    /// Invalidate everything in flight (teardown: no completion may
    /// mutate state after this).
    pub fn cancel_all(&self) {
        self.latest.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_issued_wins() {
        let guard = SequenceGuard::new();
        let first = guard.issue();
        let second = guard.issue();
        assert!(!guard.is_current(first));
        assert!(guard.is_current(second));
    }

    #[test]
    fn test_out_of_order_settlement() {
        // Responses settle in reverse order; only the last-issued one
        // may be applied, regardless of arrival order.
        let guard = SequenceGuard::new();
        let seqs: Vec<u64> = (0..3).map(|_| guard.issue()).collect();
        let mut applied = Vec::new();
        for seq in seqs.iter().rev() {
            if guard.is_current(*seq) {
                applied.push(*seq);
            }
        }
        assert_eq!(applied, vec![seqs[2]]);
    }

    #[test]
    fn test_cancel_all_invalidates_in_flight() {
        let guard = SequenceGuard::new();
        let seq = guard.issue();
        guard.cancel_all();
        assert!(!guard.is_current(seq));
    }

    #[test]
    fn test_independent_targets_do_not_interfere() {
        let list = SequenceGuard::new();
        let field = SequenceGuard::new();
        let list_seq = list.issue();
        field.issue();
        field.issue();
        assert!(list.is_current(list_seq));
    }
}
