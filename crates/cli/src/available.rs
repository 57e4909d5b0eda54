// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::helpers::output::print_notice;
use anyhow::{bail, Result};
use cg_access::ContentGate;

pub async fn execute(gate: &ContentGate) -> Result<()> {
    let available = gate.check_availability().await;
    print_notice(gate.current_status());
    if !available {
        bail!("ContentGate contract is not available");
    }
    Ok(())
}
