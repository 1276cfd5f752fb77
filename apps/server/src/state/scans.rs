//! # Scan Bridge
//!
//! Relays barcode scans from one device to the screens polling for them,
//! e.g. a phone camera feeding the checkout screen on the till.
//!
//! ```text
//!   POST /api/scans ──► ScanDeduper ──► Duplicate? ──► dropped
//!                                          │
//!                                          ▼ Accepted
//!                            ┌──────────────────────────────┐
//!                            │ ring buffer (oldest evicted) │
//!                            │  seq 41 │ seq 42 │ seq 43    │
//!                            └──────────────────────────────┘
//!                                          ▲
//!   GET /api/scans?after=41 ───────────────┘  returns 42, 43
//! ```
//!
//! Nothing is persisted. A restart resets `seq` to zero, so pollers that
//! see `latestSeq` go backwards start again from 0.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use tally_core::scan::{ScanDecision, ScanDeduper, ScanEvent};
use tracing::{debug, warn};

#[derive(Debug)]
pub struct ScanBridge {
    buffer: VecDeque<ScanEvent>,
    capacity: usize,
    deduper: ScanDeduper,
    last_seq: u64,
}

impl ScanBridge {
    pub fn new(capacity: usize, cooldown_ms: i64) -> Self {
        let capacity = capacity.max(1);
        ScanBridge {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
            deduper: ScanDeduper::new(cooldown_ms),
            last_seq: 0,
        }
    }

    /// Records a scan unless it repeats one from the same source inside the
    /// cooldown. Returns the stored event when accepted.
    pub fn record(&mut self, barcode: &str, source: &str, at: DateTime<Utc>) -> Option<ScanEvent> {
        match self.deduper.check(barcode, source, at) {
            ScanDecision::Duplicate { since_ms } => {
                warn!(barcode = %barcode, source = %source, since_ms, "Duplicate scan suppressed");
                None
            }
            ScanDecision::Accepted => {
                self.last_seq += 1;
                let event = ScanEvent {
                    seq: self.last_seq,
                    barcode: barcode.to_string(),
                    source: source.to_string(),
                    scanned_at: at,
                };

                if self.buffer.len() == self.capacity {
                    self.buffer.pop_front();
                }
                self.buffer.push_back(event.clone());

                debug!(seq = event.seq, barcode = %barcode, source = %source, "Scan relayed");
                Some(event)
            }
        }
    }

    /// Scans with `seq > after`, oldest first.
    pub fn since(&self, after: u64) -> Vec<ScanEvent> {
        self.buffer
            .iter()
            .filter(|e| e.seq > after)
            .cloned()
            .collect()
    }

    pub fn latest(&self) -> Option<&ScanEvent> {
        self.buffer.back()
    }

    /// Highest seq handed out so far (0 before the first scan).
    pub fn latest_seq(&self) -> u64 {
        self.last_seq
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 12, 0, 0).unwrap() + Duration::milliseconds(ms)
    }

    #[test]
    fn test_duplicates_within_cooldown_are_dropped() {
        let mut bridge = ScanBridge::new(10, 2_000);

        assert!(bridge.record("123", "till", at(0)).is_some());
        assert!(bridge.record("123", "till", at(500)).is_none());
        assert!(bridge.record("123", "phone", at(600)).is_some());
        assert!(bridge.record("123", "till", at(2_100)).is_some());

        assert_eq!(bridge.len(), 3);
        assert_eq!(bridge.latest_seq(), 3);
    }

    #[test]
    fn test_since_returns_newer_scans_in_order() {
        let mut bridge = ScanBridge::new(10, 0);
        for (i, code) in ["A", "B", "C"].iter().enumerate() {
            bridge.record(code, "till", at(i as i64));
        }

        let newer: Vec<String> = bridge.since(1).into_iter().map(|e| e.barcode).collect();
        assert_eq!(newer, vec!["B", "C"]);
        assert!(bridge.since(3).is_empty());
        assert_eq!(bridge.latest().map(|e| e.barcode.as_str()), Some("C"));
    }

    #[test]
    fn test_buffer_evicts_oldest() {
        let mut bridge = ScanBridge::new(2, 0);
        bridge.record("A", "till", at(0));
        bridge.record("B", "till", at(1));
        bridge.record("C", "till", at(2));

        assert_eq!(bridge.len(), 2);
        let seqs: Vec<u64> = bridge.since(0).iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![2, 3]);
    }

    #[test]
    fn test_empty_bridge() {
        let bridge = ScanBridge::new(5, 2_000);
        assert!(bridge.is_empty());
        assert!(bridge.latest().is_none());
        assert_eq!(bridge.latest_seq(), 0);
    }
}
