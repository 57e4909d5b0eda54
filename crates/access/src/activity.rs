// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::collections::VecDeque;
use std::fmt;

pub const ACTIVITY_CAPACITY: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityAction {
    View,
    Create,
    Decrypt,
}

impl fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityAction::View => write!(f, "VIEW"),
            ActivityAction::Create => write!(f, "CREATE"),
            ActivityAction::Decrypt => write!(f, "DECRYPT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityStatus {
    Success,
    Failed,
}

impl fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityStatus::Success => write!(f, "SUCCESS"),
            ActivityStatus::Failed => write!(f, "FAILED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityEntry {
    pub action: ActivityAction,
    pub content_id: String,
    /// Milliseconds since the epoch
    pub timestamp: i64,
    pub status: ActivityStatus,
}

/// Session-local, most recent first, never more than [`ACTIVITY_CAPACITY`] entries
#[derive(Debug, Clone, Default)]
pub struct ActivityLedger {
    entries: VecDeque<ActivityEntry>,
}

impl ActivityLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        action: ActivityAction,
        content_id: impl Into<String>,
        status: ActivityStatus,
    ) {
        self.entries.push_front(ActivityEntry {
            action,
            content_id: content_id.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            status,
        });
        self.entries.truncate(ACTIVITY_CAPACITY);
    }

    pub fn entries(&self) -> Vec<ActivityEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_newest_first() {
        let mut ledger = ActivityLedger::new();
        for i in 0..25 {
            ledger.record(
                ActivityAction::View,
                format!("content-{i}"),
                ActivityStatus::Success,
            );
            assert!(ledger.len() <= ACTIVITY_CAPACITY);
        }

        let entries = ledger.entries();
        assert_eq!(entries.len(), ACTIVITY_CAPACITY);
        assert_eq!(entries[0].content_id, "content-24");
        assert_eq!(entries[9].content_id, "content-15");
        assert!(entries.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    }

    #[test]
    fn test_labels() {
        assert_eq!(ActivityAction::Decrypt.to_string(), "DECRYPT");
        assert_eq!(ActivityStatus::Failed.to_string(), "FAILED");
    }
}
