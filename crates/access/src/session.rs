// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::activity::{ActivityAction, ActivityLedger, ActivityStatus};
use crate::record::ContentRecord;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Everything the session knows: the record snapshot and the activity log
#[derive(Debug, Default)]
pub struct SessionState {
    pub(crate) records: Vec<ContentRecord>,
    pub(crate) activity: ActivityLedger,
}

impl SessionState {
    pub fn records(&self) -> &[ContentRecord] {
        &self.records
    }

    pub fn activity(&self) -> &ActivityLedger {
        &self.activity
    }

    pub(crate) fn record_mut(&mut self, id: &str) -> Option<&mut ContentRecord> {
        self.records.iter_mut().find(|r| r.id == id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SharedSession {
    inner: Arc<RwLock<SessionState>>,
}

impl SharedSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn read(&self) -> tokio::sync::RwLockReadGuard<'_, SessionState> {
        self.inner.read().await
    }

    pub(crate) async fn write(&self) -> tokio::sync::RwLockWriteGuard<'_, SessionState> {
        self.inner.write().await
    }

    pub(crate) async fn record_activity(
        &self,
        action: ActivityAction,
        content_id: &str,
        status: ActivityStatus,
    ) {
        self.write()
            .await
            .activity
            .record(action, content_id, status);
    }
}
