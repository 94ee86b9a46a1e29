//! Client configuration.

use credentials_core::IssuerHash;
use serde::{Deserialize, Serialize};

/// Connection details for a ledger network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub name: String,
    /// Native token symbol
    pub unit: String,
    /// RPC endpoint (host:port/path)
    pub rpc: String,
    /// Decimal places of the native token
    pub denomination: u32,
}

impl NetworkConfig {
    pub fn testnet() -> Self {
        Self {
            name: "raman network".to_string(),
            unit: "TRUE".to_string(),
            rpc: "raman.truenetwork.io/ws".to_string(),
            denomination: 10,
        }
    }

    pub fn localnet() -> Self {
        Self {
            name: "localnet".to_string(),
            unit: "TRUE".to_string(),
            rpc: "127.0.0.1:9944".to_string(),
            denomination: 10,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::testnet()
    }
}

/// Configuration for [`AttestationOrchestrator`](crate::AttestationOrchestrator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub network: NetworkConfig,
    /// Resolve submissions on finalization instead of first inclusion
    #[serde(default)]
    pub wait_for_finalization: bool,
    /// Issuer to act for, if already registered
    #[serde(default)]
    pub issuer: Option<IssuerHash>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            wait_for_finalization: false,
            issuer: None,
        }
    }
}

impl ClientConfig {
    pub fn with_issuer(mut self, issuer: IssuerHash) -> Self {
        self.issuer = Some(issuer);
        self
    }

    pub fn wait_for_finalization(mut self, wait: bool) -> Self {
        self.wait_for_finalization = wait;
        self
    }
}
