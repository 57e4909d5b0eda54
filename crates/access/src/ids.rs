// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out `content-<millis>` ids. Two ids in the same millisecond get consecutive stamps.
#[derive(Debug, Default)]
pub struct ContentIdGenerator {
    last: AtomicU64,
}

impl ContentIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> String {
        let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
        format!("content-{}", self.next_stamp(now))
    }

    fn next_stamp(&self, now: u64) -> u64 {
        let mut stamp = now;
        // fetch_update only errs when the closure returns None
        let _ = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                stamp = now.max(last + 1);
                Some(stamp)
            });
        stamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_same_millisecond_gets_distinct_stamps() {
        let ids = ContentIdGenerator::new();
        assert_eq!(ids.next_stamp(1_000), 1_000);
        assert_eq!(ids.next_stamp(1_000), 1_001);
        assert_eq!(ids.next_stamp(999), 1_002);
        assert_eq!(ids.next_stamp(5_000), 5_000);
    }

    #[test]
    fn test_ids_are_unique() {
        let ids = ContentIdGenerator::new();
        let generated: HashSet<String> = (0..500).map(|_| ids.next_id()).collect();
        assert_eq!(generated.len(), 500);
        assert!(generated.iter().all(|id| id.starts_with("content-")));
    }
}
