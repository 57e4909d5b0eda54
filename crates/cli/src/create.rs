// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::helpers::output::print_notice;
use anyhow::Result;
use cg_access::{ContentGate, NewContent};

pub async fn execute(
    gate: &ContentGate,
    title: String,
    description: String,
    access_level: u64,
) -> Result<()> {
    let result = gate
        .create_record(NewContent {
            title,
            description,
            access_level,
        })
        .await;
    print_notice(gate.current_status());

    let id = result?;
    println!("{id}");
    Ok(())
}
