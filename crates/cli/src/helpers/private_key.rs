// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use super::ensure_hex_zeroizing;
use anyhow::{Context, Result};
use dialoguer::{theme::ColorfulTheme, Password};
use zeroize::Zeroizing;

pub const PRIVATE_KEY_ENV: &str = "CONTENTGATE_PRIVATE_KEY";

/// Read the signing key from the environment, or ask for it
pub fn ask_for_private_key() -> Result<Zeroizing<String>> {
    if let Ok(from_env) = std::env::var(PRIVATE_KEY_ENV) {
        let from_env = Zeroizing::new(from_env);
        return ensure_hex_zeroizing(&from_env)
            .with_context(|| format!("{PRIVATE_KEY_ENV} is not a valid private key"));
    }

    let input = Zeroizing::new(
        Password::with_theme(&ColorfulTheme::default())
            .with_prompt("Enter your Ethereum private key")
            .validate_with(|input: &String| ensure_hex_zeroizing(input).map(|_| ()))
            .interact()?,
    );
    ensure_hex_zeroizing(&input)
}
