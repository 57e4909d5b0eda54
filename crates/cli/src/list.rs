// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::helpers::output::print_records;
use anyhow::Result;
use cg_access::ContentGate;

pub async fn execute(gate: &ContentGate) -> Result<()> {
    let records = gate.refresh().await?;
    print_records(&records);
    Ok(())
}
