// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::helpers::output::print_record;
use anyhow::{bail, Result};
use cg_access::ContentGate;

pub async fn execute(gate: &ContentGate, id: &str) -> Result<()> {
    gate.refresh().await?;
    let Some(record) = gate.view(id).await else {
        bail!("Content record {id} not found");
    };
    print_record(&record);
    Ok(())
}
