// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::lock;
use async_trait::async_trait;
use cg_ledger::{SigningApprover, SigningRequest};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Answers signing requests from a script, falling back to a fixed answer once the script
/// runs out. Keeps every request it was shown.
#[derive(Debug)]
pub struct ScriptedApprover {
    script: Mutex<VecDeque<bool>>,
    fallback: bool,
    seen: Mutex<Vec<SigningRequest>>,
}

impl ScriptedApprover {
    pub fn new(script: impl IntoIterator<Item = bool>, fallback: bool) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn approving() -> Self {
        Self::new([], true)
    }

    pub fn declining() -> Self {
        Self::new([], false)
    }

    pub fn requests(&self) -> Vec<SigningRequest> {
        lock(&self.seen).clone()
    }
}

#[async_trait]
impl SigningApprover for ScriptedApprover {
    async fn approve(&self, request: &SigningRequest) -> bool {
        lock(&self.seen).push(request.clone());
        lock(&self.script).pop_front().unwrap_or(self.fallback)
    }
}
