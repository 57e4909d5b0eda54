// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::helpers::output::print_notice;
use anyhow::{bail, Result};
use cg_access::ContentGate;

pub async fn execute(gate: &ContentGate, id: &str) -> Result<()> {
    gate.refresh().await?;
    let report = gate.decrypt_with_report(id).await;
    print_notice(gate.current_status());

    match (report.value, report.error()) {
        (Some(value), _) => {
            println!("{value}");
            Ok(())
        }
        (None, Some(e)) => bail!("Decryption of {id} failed at {}: {e}", fail_stage(&report)),
        (None, None) => bail!("Decryption of {id} failed"),
    }
}

fn fail_stage(report: &cg_access::DecryptionReport) -> String {
    report
        .failed_at()
        .map(ToString::to_string)
        .unwrap_or_default()
}
