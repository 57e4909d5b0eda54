// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::rpc::RPC;
use alloy_primitives::Address;
use anyhow::*;
use serde::{Deserialize, Serialize};

/// The chain hosting the ContentGate contract
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChainConfig {
    pub name: String,
    pub rpc_url: String,
    /// Deployed ContentGate contract address
    pub contract: String,
    pub chain_id: Option<u64>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            name: "localhost".to_string(),
            rpc_url: "http://localhost:8545".to_string(),
            contract: Address::ZERO.to_string(),
            chain_id: None,
        }
    }
}

impl ChainConfig {
    pub fn rpc_url(&self) -> Result<RPC> {
        RPC::from_url(&self.rpc_url)
            .map_err(|e| anyhow!("Failed to parse RPC URL for chain {}: {}", self.name, e))
    }

    pub fn contract_address(&self) -> Result<Address> {
        self.contract.parse::<Address>().map_err(|e| {
            anyhow!(
                "Invalid contract address '{}' for chain {}: {}",
                self.contract,
                self.name,
                e
            )
        })
    }

    pub fn validate(&self) -> Result<()> {
        self.rpc_url()?;
        let address = self.contract_address()?;
        if address == Address::ZERO {
            bail!(
                "No contract address configured for chain {}. Set `chain.contract` in your configuration.",
                self.name
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_address_parses() -> Result<()> {
        let chain = ChainConfig {
            contract: "0x9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0".to_string(),
            ..ChainConfig::default()
        };
        chain.validate()?;
        assert_eq!(
            chain.contract_address()?,
            "0x9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0".parse::<Address>()?
        );
        Ok(())
    }

    #[test]
    fn test_zero_contract_is_rejected() {
        let err = ChainConfig::default().validate().unwrap_err();
        assert!(err.to_string().contains("No contract address configured"));
    }

    #[test]
    fn test_bad_rpc_is_rejected() {
        let chain = ChainConfig {
            rpc_url: "ftp://localhost:8545".to_string(),
            contract: "0x9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0".to_string(),
            ..ChainConfig::default()
        };
        assert!(chain.validate().is_err());
    }
}
