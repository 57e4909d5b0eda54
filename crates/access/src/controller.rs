// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::activity::{ActivityAction, ActivityEntry, ActivityStatus};
use crate::coordinator::{DecryptionCoordinator, DecryptionReport};
use crate::error::AccessError;
use crate::ids::ContentIdGenerator;
use crate::notifier::{StatusNotice, StatusNotifier};
use crate::record::ContentRecord;
use crate::repository::{AccessRecordRepository, NewContent};
use crate::session::SharedSession;
use cg_config::AppConfig;
use cg_ledger::{
    retry::{call_with_retry, ReadRetryPolicy},
    LedgerRead, LedgerWrite,
};
use cg_relayer::{DecryptionOracle, EncryptionGateway};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, instrument};

/// Timeouts and policies the controller needs from configuration
#[derive(Debug, Clone)]
pub struct GateSettings {
    pub read_retry: ReadRetryPolicy,
    pub oracle_timeout: Duration,
    pub notice_dismiss: Duration,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            read_retry: ReadRetryPolicy::default(),
            oracle_timeout: Duration::from_secs(60),
            notice_dismiss: Duration::from_millis(3000),
        }
    }
}

impl From<&AppConfig> for GateSettings {
    fn from(config: &AppConfig) -> Self {
        let timeouts = config.timeouts();
        let retry = config.read_retry();
        Self {
            read_retry: ReadRetryPolicy {
                max_attempts: retry.max_attempts,
                initial_delay: retry.initial_delay(),
                attempt_timeout: timeouts.ledger_read(),
            },
            oracle_timeout: timeouts.oracle(),
            notice_dismiss: config.notice_dismiss(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentStats {
    pub total_contents: usize,
    pub verified_contents: usize,
    pub average_access_level: f64,
    pub user_actions: usize,
}

/// Entry point for the presentation layer. Owns the session and routes every user action
/// through the repository, the coordinator, the activity log and the status notifier.
pub struct ContentGate {
    session: SharedSession,
    repository: AccessRecordRepository,
    coordinator: DecryptionCoordinator,
    encryption: EncryptionGateway,
    writer: Option<Arc<dyn LedgerWrite>>,
    notifier: StatusNotifier,
    ids: ContentIdGenerator,
}

impl ContentGate {
    pub fn new(
        ledger: Arc<dyn LedgerRead>,
        writer: Option<Arc<dyn LedgerWrite>>,
        encryption: EncryptionGateway,
        oracle: Arc<dyn DecryptionOracle>,
        settings: GateSettings,
    ) -> Self {
        let session = SharedSession::new();
        Self {
            repository: AccessRecordRepository::new(
                ledger,
                session.clone(),
                settings.read_retry.clone(),
            ),
            coordinator: DecryptionCoordinator::new(
                writer.clone(),
                oracle,
                settings.oracle_timeout,
            ),
            session,
            encryption,
            writer,
            notifier: StatusNotifier::new(settings.notice_dismiss),
            ids: ContentIdGenerator::new(),
        }
    }

    pub fn can_sign(&self) -> bool {
        self.writer.is_some()
    }

    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<Vec<ContentRecord>, AccessError> {
        let result = self.repository.refresh().await;
        if let Err(e) = &result {
            error!(error=%e, "Failed to load content records");
            self.notifier.error("Failed to load data");
        }
        result
    }

    /// Create a record and return its id
    #[instrument(skip(self, content), fields(title = %content.title))]
    pub async fn create_record(&self, content: NewContent) -> Result<String, AccessError> {
        let content_id = self.ids.next_id();
        let Some(writer) = self.writer.as_deref() else {
            self.session
                .record_activity(ActivityAction::Create, &content_id, ActivityStatus::Failed)
                .await;
            self.notifier.error("Please connect wallet first");
            return Err(AccessError::SignerUnavailable);
        };

        self.notifier.pending("Creating encrypted content...");
        let result = self
            .repository
            .create_record(
                &content_id,
                content,
                &self.encryption,
                writer,
                &self.notifier,
            )
            .await;

        match result {
            Ok(()) => {
                self.session
                    .record_activity(ActivityAction::Create, &content_id, ActivityStatus::Success)
                    .await;
                self.notifier.success("Content created successfully!");
                Ok(content_id)
            }
            Err(e) => {
                error!(%content_id, error=%e, "Creation failed");
                self.session
                    .record_activity(ActivityAction::Create, &content_id, ActivityStatus::Failed)
                    .await;
                if e.is_rejection() {
                    self.notifier.error("Transaction rejected");
                } else {
                    self.notifier.error("Creation failed");
                }
                Err(e)
            }
        }
    }

    /// Decrypt the record's access level. Failures are logged and recorded, never raised.
    pub async fn decrypt(&self, content_id: &str) -> Option<u64> {
        self.decrypt_with_report(content_id).await.value
    }

    #[instrument(skip(self))]
    pub async fn decrypt_with_report(&self, content_id: &str) -> DecryptionReport {
        self.notifier.pending("Decrypting content...");
        let report = self.coordinator.run(&self.repository, content_id).await;

        let status = if report.is_success() {
            self.notifier.success("Decryption verified!");
            ActivityStatus::Success
        } else {
            match report.error() {
                Some(e) if e.is_rejection() => self.notifier.error("Transaction rejected"),
                _ => self.notifier.error("Decryption failed"),
            }
            ActivityStatus::Failed
        };
        self.session
            .record_activity(ActivityAction::Decrypt, content_id, status)
            .await;
        info!(%content_id, stage=%report.stage, "Decryption finished");
        report
    }

    pub async fn view(&self, content_id: &str) -> Option<ContentRecord> {
        let record = self.repository.get(content_id).await;
        let status = match record {
            Some(_) => ActivityStatus::Success,
            None => ActivityStatus::Failed,
        };
        self.session
            .record_activity(ActivityAction::View, content_id, status)
            .await;
        record
    }

    #[instrument(skip(self))]
    pub async fn check_availability(&self) -> bool {
        let ledger = self.repository.ledger();
        let result = call_with_retry("isAvailable", self.repository.retry_policy(), || {
            ledger.is_available()
        })
        .await;

        match result {
            Ok(true) => {
                self.notifier.success("System is available!");
                true
            }
            Ok(false) => {
                info!("Contract reports it is not available");
                self.notifier.error("Availability check failed");
                false
            }
            Err(e) => {
                error!(error=%e, "Availability check failed");
                self.notifier.error("Availability check failed");
                false
            }
        }
    }

    pub async fn stats(&self) -> ContentStats {
        let session = self.session.read().await;
        let records = session.records();
        let total_contents = records.len();
        let verified_contents = records.iter().filter(|r| r.is_verified()).count();
        let average_access_level = if total_contents == 0 {
            0.0
        } else {
            records
                .iter()
                .map(|r| r.access_level_public_estimate as f64)
                .sum::<f64>()
                / total_contents as f64
        };
        ContentStats {
            total_contents,
            verified_contents,
            average_access_level,
            user_actions: session.activity().len(),
        }
    }

    pub async fn snapshot(&self) -> Vec<ContentRecord> {
        self.repository.snapshot().await
    }

    pub async fn get(&self, content_id: &str) -> Option<ContentRecord> {
        self.repository.get(content_id).await
    }

    pub async fn activity(&self) -> Vec<ActivityEntry> {
        self.session.read().await.activity().entries()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<Option<StatusNotice>> {
        self.notifier.subscribe()
    }

    pub fn current_status(&self) -> Option<StatusNotice> {
        self.notifier.current()
    }
}
