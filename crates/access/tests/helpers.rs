// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use cg_access::{ContentGate, GateSettings, NewContent};
use cg_ledger::retry::ReadRetryPolicy;
use cg_relayer::EncryptionGateway;
use cg_test_helpers::{FakeEncryptionService, FakeOracle, InMemoryLedger, ScriptedApprover};
use std::sync::Arc;
use std::time::Duration;

pub struct Harness {
    pub ledger: InMemoryLedger,
    pub encryption: Arc<FakeEncryptionService>,
    pub oracle: Arc<FakeOracle>,
    pub approver: Arc<ScriptedApprover>,
    pub gate: ContentGate,
}

pub fn settings() -> GateSettings {
    GateSettings {
        read_retry: ReadRetryPolicy {
            max_attempts: 2,
            initial_delay: Duration::from_millis(10),
            attempt_timeout: Duration::from_secs(1),
        },
        oracle_timeout: Duration::from_secs(5),
        notice_dismiss: Duration::from_millis(3000),
    }
}

pub fn setup() -> Harness {
    setup_with(ScriptedApprover::approving())
}

pub fn setup_with(approver: ScriptedApprover) -> Harness {
    let approver = Arc::new(approver);
    let ledger = InMemoryLedger::with_approver(approver.clone());
    let encryption = Arc::new(FakeEncryptionService::new());
    let oracle = Arc::new(FakeOracle::new(ledger.clone()));
    let gateway = EncryptionGateway::new(encryption.clone(), 1..=10, Duration::from_secs(5));
    let gate = ContentGate::new(
        Arc::new(ledger.clone()),
        Some(Arc::new(ledger.clone())),
        gateway,
        oracle.clone(),
        settings(),
    );
    Harness {
        ledger,
        encryption,
        oracle,
        approver,
        gate,
    }
}

/// A session that can read but holds no signing key
pub fn setup_read_only() -> Harness {
    let mut harness = setup();
    let gateway = EncryptionGateway::new(
        harness.encryption.clone(),
        1..=10,
        Duration::from_secs(5),
    );
    harness.gate = ContentGate::new(
        Arc::new(harness.ledger.clone()),
        None,
        gateway,
        harness.oracle.clone(),
        settings(),
    );
    harness
}

pub fn content(title: &str, access_level: u64) -> NewContent {
    NewContent {
        title: title.to_string(),
        description: format!("{title} for members"),
        access_level,
    }
}
