// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::helpers::output::print_activity;
use anyhow::Result;
use cg_access::ContentGate;

pub async fn execute(gate: &ContentGate) -> Result<()> {
    gate.refresh().await?;
    let stats = gate.stats().await;
    println!("total contents:       {}", stats.total_contents);
    println!("verified contents:    {}", stats.verified_contents);
    println!("average access level: {:.1}", stats.average_access_level);
    println!("actions this session: {}", stats.user_actions);
    print_activity(&gate.activity().await);
    Ok(())
}
