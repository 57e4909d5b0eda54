// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use cg_access::{ActivityEntry, ContentRecord, DecryptionState, NoticeKind, StatusNotice};
use chrono::{DateTime, Utc};
use tokio::sync::watch;

pub fn state_label(record: &ContentRecord) -> String {
    match record.state() {
        DecryptionState::Unresolved => "encrypted".to_string(),
        DecryptionState::LocallyDecrypted(value) => format!("{value} (unverified)"),
        DecryptionState::Verified(value) => format!("{value} (verified)"),
    }
}

fn format_seconds(secs: u64) -> String {
    DateTime::<Utc>::from_timestamp(secs as i64, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| secs.to_string())
}

fn format_millis(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| ms.to_string())
}

pub fn print_records(records: &[ContentRecord]) {
    if records.is_empty() {
        println!("No content records found.");
        return;
    }
    println!(
        "{:<22} {:<28} {:>5} {:<18} {}",
        "ID", "TITLE", "LEVEL", "ACCESS", "CREATED"
    );
    for record in records {
        println!(
            "{:<22} {:<28} {:>5} {:<18} {}",
            record.id,
            truncate(&record.title, 28),
            record.access_level_public_estimate,
            state_label(record),
            format_seconds(record.created_at)
        );
    }
}

pub fn print_record(record: &ContentRecord) {
    println!("id:           {}", record.id);
    println!("title:        {}", record.title);
    println!("description:  {}", record.description);
    println!("creator:      {}", record.creator);
    println!("created:      {}", format_seconds(record.created_at));
    println!("access level: {}", record.access_level_public_estimate);
    println!("decryption:   {}", state_label(record));
}

pub fn print_activity(entries: &[ActivityEntry]) {
    for entry in entries {
        println!(
            "{} {:<8} {:<22} {}",
            format_millis(entry.timestamp),
            entry.action,
            entry.content_id,
            entry.status
        );
    }
}

pub fn print_notice(notice: Option<StatusNotice>) {
    let Some(notice) = notice else {
        return;
    };
    match notice.kind {
        NoticeKind::Pending => eprintln!("… {notice}"),
        NoticeKind::Success => eprintln!("✓ {notice}"),
        NoticeKind::Error => eprintln!("✗ {notice}"),
    }
}

/// Echo pending notices while a command runs. Terminal notices are printed by the command.
pub fn spawn_pending_printer(mut status: watch::Receiver<Option<StatusNotice>>) {
    tokio::spawn(async move {
        while status.changed().await.is_ok() {
            let notice = status.borrow_and_update().clone();
            if notice.as_ref().is_some_and(|n| n.kind == NoticeKind::Pending) {
                print_notice(notice);
            }
        }
    });
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut out: String = value.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}
