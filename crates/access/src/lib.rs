// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod activity;
mod controller;
mod coordinator;
mod error;
mod ids;
mod notifier;
mod record;
mod repository;
mod session;

pub use activity::*;
pub use controller::*;
pub use coordinator::*;
pub use error::*;
pub use ids::*;
pub use notifier::*;
pub use record::*;
pub use repository::*;
pub use session::*;
