// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Pending,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusNotice {
    pub kind: NoticeKind,
    pub message: String,
    seq: u64,
}

impl StatusNotice {
    pub fn is_terminal(&self) -> bool {
        self.kind != NoticeKind::Pending
    }
}

impl fmt::Display for StatusNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Publishes one transient notice at a time. Success and error notices clear themselves
/// after `dismiss_after` unless a newer notice replaced them first.
#[derive(Clone)]
pub struct StatusNotifier {
    tx: Arc<watch::Sender<Option<StatusNotice>>>,
    seq: Arc<AtomicU64>,
    dismiss_after: Duration,
}

impl StatusNotifier {
    pub fn new(dismiss_after: Duration) -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            tx: Arc::new(tx),
            seq: Arc::new(AtomicU64::new(0)),
            dismiss_after,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<StatusNotice>> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> Option<StatusNotice> {
        self.tx.borrow().clone()
    }

    pub fn pending(&self, message: impl Into<String>) {
        self.publish(NoticeKind::Pending, message.into());
    }

    pub fn success(&self, message: impl Into<String>) {
        self.publish(NoticeKind::Success, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.publish(NoticeKind::Error, message.into());
    }

    fn publish(&self, kind: NoticeKind, message: String) {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let notice = StatusNotice { kind, message, seq };
        trace!(?notice.kind, message=%notice.message, "Status notice");
        let terminal = notice.is_terminal();
        self.tx.send_replace(Some(notice));

        if terminal {
            let tx = self.tx.clone();
            let dismiss_after = self.dismiss_after;
            tokio::spawn(async move {
                tokio::time::sleep(dismiss_after).await;
                tx.send_if_modified(|current| match current {
                    Some(notice) if notice.seq == seq => {
                        *current = None;
                        true
                    }
                    _ => false,
                });
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_terminal_notice_auto_dismisses() {
        let notifier = StatusNotifier::new(Duration::from_millis(3000));
        notifier.pending("Creating encrypted content...");
        notifier.success("Content created successfully!");
        assert_eq!(
            notifier.current().map(|n| n.kind),
            Some(NoticeKind::Success)
        );

        tokio::time::sleep(Duration::from_millis(2999)).await;
        assert!(notifier.current().is_some());
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(notifier.current(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_old_timer_leaves_newer_notice_alone() {
        let notifier = StatusNotifier::new(Duration::from_millis(3000));
        notifier.error("Failed to load data");
        tokio::time::sleep(Duration::from_millis(2000)).await;
        notifier.success("System is available!");

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(
            notifier.current().map(|n| n.message),
            Some("System is available!".to_string())
        );
        tokio::time::sleep(Duration::from_millis(1600)).await;
        assert_eq!(notifier.current(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_stays_until_replaced() {
        let notifier = StatusNotifier::new(Duration::from_millis(100));
        let mut rx = notifier.subscribe();
        notifier.pending("Waiting for confirmation...");
        rx.changed().await.unwrap();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(
            notifier.current().map(|n| n.kind),
            Some(NoticeKind::Pending)
        );
    }
}
