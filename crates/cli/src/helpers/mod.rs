// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::{bail, Result};
use zeroize::{Zeroize, Zeroizing};

pub mod approver;
pub mod connect;
pub mod output;
pub mod private_key;
pub mod telemetry;

/// Parse to a Zeroizing String
pub fn parse_zeroizing(s: &str) -> Result<Zeroizing<String>> {
    Ok(Zeroizing::new(s.to_string()))
}

/// Ensure hex is of the form 0x12435687abcdef...
pub fn ensure_hex_zeroizing(s: &str) -> Result<Zeroizing<String>> {
    parse_zeroizing(ensure_hex(s.trim())?)
}

/// Ensure a 32 byte hexadecimal private key
fn ensure_hex(s: &str) -> Result<&str> {
    if !s.starts_with("0x") {
        bail!("hex value must start with '0x'")
    }
    if !s[2..].chars().all(|c| c.is_ascii_hexdigit()) {
        bail!("private key must only contain hex characters [0-9a-fA-F]");
    }
    let mut bytes = hex::decode(&s[2..])?;
    let len = bytes.len();
    bytes.zeroize();
    if len != 32 {
        bail!("private key must be 32 bytes, got {len}");
    }
    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_hex() {
        let key = format!("0x{}", "ab".repeat(32));
        assert_eq!(ensure_hex_zeroizing(&key).unwrap().as_str(), key);
        assert!(ensure_hex_zeroizing(&"ab".repeat(32)).is_err());
        assert!(ensure_hex_zeroizing("0xzz").is_err());
        assert!(ensure_hex_zeroizing("0xabcd").is_err());
    }
}
