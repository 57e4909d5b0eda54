// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use super::approver::ConsoleApprover;
use super::private_key::ask_for_private_key;
use anyhow::{Context, Result};
use cg_access::{ContentGate, GateSettings};
use cg_config::{validation::validate_http_url, AppConfig};
use cg_ledger::{AutoApprove, ContentGateContractFactory, LedgerWrite, SigningApprover};
use cg_relayer::{EncryptionGateway, HttpDecryptionOracle, HttpEncryptionService};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ReadOnly,
    /// Signing calls are confirmed on the terminal unless `auto_approve` is set
    Signing { auto_approve: bool },
}

/// Wire the controller to the configured contract and relayer
pub async fn connect(config: &AppConfig, access: Access) -> Result<ContentGate> {
    let chain = config.chain();
    let rpc_url = chain.rpc_url()?.as_http_url()?;
    let contract = chain.contract_address()?.to_string();

    let reader = ContentGateContractFactory::create_read(&rpc_url, &contract)
        .await
        .with_context(|| format!("Could not connect to {rpc_url}"))?;

    let writer: Option<Arc<dyn LedgerWrite>> = match access {
        Access::ReadOnly => None,
        Access::Signing { auto_approve } => {
            let private_key = ask_for_private_key()?;
            let approver: Arc<dyn SigningApprover> = if auto_approve {
                Arc::new(AutoApprove)
            } else {
                Arc::new(ConsoleApprover)
            };
            let writer = ContentGateContractFactory::create_write(
                &rpc_url,
                &contract,
                &private_key,
                approver,
                config.timeouts().ledger_write(),
            )
            .await
            .context("Could not create signing contract")?;
            Some(Arc::new(writer))
        }
    };

    let relayer_url = validate_http_url(&config.relayer().url)?;
    let range = config.access_level();
    let encryption = EncryptionGateway::new(
        Arc::new(HttpEncryptionService::new(&relayer_url)?),
        range.min..=range.max,
        config.timeouts().encryption(),
    );
    let oracle = HttpDecryptionOracle::new(&relayer_url)?;

    info!(chain=%chain.name, %contract, relayer=%relayer_url, "Connected");
    Ok(ContentGate::new(
        Arc::new(reader),
        writer,
        encryption,
        Arc::new(oracle),
        GateSettings::from(config),
    ))
}
