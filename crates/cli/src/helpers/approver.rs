// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use async_trait::async_trait;
use cg_ledger::{SigningApprover, SigningRequest};
use dialoguer::{theme::ColorfulTheme, Confirm};
use tracing::warn;

/// Asks on the terminal before every signing call
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleApprover;

#[async_trait]
impl SigningApprover for ConsoleApprover {
    async fn approve(&self, request: &SigningRequest) -> bool {
        let prompt = format!("Sign a transaction to {request}?");
        let answer = tokio::task::spawn_blocking(move || {
            Confirm::with_theme(&ColorfulTheme::default())
                .with_prompt(prompt)
                .default(false)
                .interact()
        })
        .await;

        match answer {
            Ok(Ok(approved)) => approved,
            Ok(Err(e)) => {
                warn!(error=%e, "Could not read approval, declining");
                false
            }
            Err(e) => {
                warn!(error=%e, "Approval prompt failed, declining");
                false
            }
        }
    }
}
