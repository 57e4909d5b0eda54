// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod approver;
mod ledger;
mod relayer;

pub use approver::*;
pub use ledger::*;
pub use relayer::*;

use std::sync::{Mutex, MutexGuard};

/// Fakes never hold a lock across a panic worth propagating
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
