// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod encrypt;
mod error;
mod oracle;

pub use encrypt::*;
pub use error::*;
pub use oracle::*;
