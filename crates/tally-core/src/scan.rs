//! # Scan De-duplication
//!
//! Hand scanners and phone cameras report the same barcode several times in
//! quick succession. The scan bridge runs every incoming scan through a
//! [`ScanDeduper`] before it is relayed to the pollers.
//!
//! ```text
//!  t=0ms    source=till-1  4006381333931  ──► Accepted
//!  t=400ms  source=till-1  4006381333931  ──► Duplicate (within 2000ms)
//!  t=600ms  source=phone   4006381333931  ──► Accepted  (other source)
//!  t=2100ms source=till-1  4006381333931  ──► Accepted  (cooldown over)
//! ```
//!
//! Best effort only: there is no acknowledgement and nothing is persisted.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Default window in which a repeat scan is suppressed.
pub const DEFAULT_COOLDOWN_MS: i64 = 2_000;

/// Source name used when the scanner does not identify itself.
pub const DEFAULT_SOURCE: &str = "default";

/// A scan relayed to pollers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ScanEvent {
    /// Monotonic per server process. Pollers ask for `after = last seq`.
    #[ts(type = "number")]
    pub seq: u64,
    pub barcode: String,
    pub source: String,
    #[ts(as = "String")]
    pub scanned_at: DateTime<Utc>,
}

/// Outcome of [`ScanDeduper::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanDecision {
    Accepted,
    /// Seen from the same source `since_ms` ago.
    Duplicate { since_ms: i64 },
}

impl ScanDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ScanDecision::Accepted)
    }
}

/// Remembers when each (source, barcode) pair was last accepted.
#[derive(Debug, Clone)]
pub struct ScanDeduper {
    cooldown: Duration,
    last_seen: HashMap<(String, String), DateTime<Utc>>,
}

impl Default for ScanDeduper {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN_MS)
    }
}

impl ScanDeduper {
    /// A non-positive cooldown disables suppression.
    pub fn new(cooldown_ms: i64) -> Self {
        ScanDeduper {
            cooldown: Duration::milliseconds(cooldown_ms.max(0)),
            last_seen: HashMap::new(),
        }
    }

    pub fn cooldown_ms(&self) -> i64 {
        self.cooldown.num_milliseconds()
    }

    /// Decides whether a scan at `at` is new, and records it if so.
    ///
    /// A suppressed duplicate does not extend the window, so a barcode held
    /// under the scanner is accepted again once per cooldown.
    pub fn check(&mut self, barcode: &str, source: &str, at: DateTime<Utc>) -> ScanDecision {
        self.prune(at);

        let key = (source.to_string(), barcode.to_string());
        if let Some(previous) = self.last_seen.get(&key) {
            let since = at - *previous;
            if since < self.cooldown {
                return ScanDecision::Duplicate {
                    since_ms: since.num_milliseconds(),
                };
            }
        }

        self.last_seen.insert(key, at);
        ScanDecision::Accepted
    }

    /// Drops entries whose cooldown has passed.
    fn prune(&mut self, now: DateTime<Utc>) {
        let cooldown = self.cooldown;
        self.last_seen.retain(|_, seen| now - *seen < cooldown);
    }

    pub fn tracked(&self) -> usize {
        self.last_seen.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap() + Duration::milliseconds(ms)
    }

    #[test]
    fn test_repeat_within_cooldown_is_duplicate() {
        let mut d = ScanDeduper::default();
        assert_eq!(d.check("123", "till", at(0)), ScanDecision::Accepted);
        assert_eq!(
            d.check("123", "till", at(400)),
            ScanDecision::Duplicate { since_ms: 400 }
        );
    }

    #[test]
    fn test_other_source_or_barcode_is_accepted() {
        let mut d = ScanDeduper::default();
        assert!(d.check("123", "till", at(0)).is_accepted());
        assert!(d.check("123", "phone", at(100)).is_accepted());
        assert!(d.check("456", "till", at(200)).is_accepted());
    }

    #[test]
    fn test_accepted_again_after_cooldown() {
        let mut d = ScanDeduper::new(2_000);
        assert!(d.check("123", "till", at(0)).is_accepted());
        assert!(!d.check("123", "till", at(1_999)).is_accepted());
        assert!(d.check("123", "till", at(2_000)).is_accepted());
    }

    #[test]
    fn test_duplicates_do_not_extend_window() {
        let mut d = ScanDeduper::new(1_000);
        assert!(d.check("123", "till", at(0)).is_accepted());
        assert!(!d.check("123", "till", at(900)).is_accepted());
        assert!(d.check("123", "till", at(1_100)).is_accepted());
    }

    #[test]
    fn test_prune_forgets_old_entries() {
        let mut d = ScanDeduper::new(1_000);
        d.check("1", "till", at(0));
        d.check("2", "till", at(10));
        assert_eq!(d.tracked(), 2);
        d.check("3", "till", at(5_000));
        assert_eq!(d.tracked(), 1);
    }

    #[test]
    fn test_zero_cooldown_accepts_everything() {
        let mut d = ScanDeduper::new(0);
        assert!(d.check("123", "till", at(0)).is_accepted());
        assert!(d.check("123", "till", at(0)).is_accepted());
    }
}
