//! The `deployment.json` artifact written when the event factory is deployed.

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const EVENT_FACTORY: &str = "EventFactory";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentInfo {
    pub network: String,
    pub chain_id: u64,
    pub deployer: String,
    pub contracts: BTreeMap<String, DeployedContract>,
    pub deployed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bscscan_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeployedContract {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abi: Option<JsonValue>,
}

impl DeploymentInfo {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("{} is not a valid deployment file", path.display()))
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(path, raw).with_context(|| format!("failed to write {}", path.display()))
    }

    pub fn event_factory_address(&self) -> Option<&str> {
        self.contracts.get(EVENT_FACTORY).map(|c| c.address.as_str())
    }

    /// Record for a factory deployed outside the toolkit.
    pub fn for_event_factory(network: &str, chain_id: u64, deployer: &str, address: &str) -> Self {
        let mut contracts = BTreeMap::new();
        contracts.insert(
            EVENT_FACTORY.to_string(),
            DeployedContract {
                address: address.to_string(),
                abi: None,
            },
        );
        let bscscan_url = match chain_id {
            97 => Some(format!("https://testnet.bscscan.com/address/{}", address)),
            56 => Some(format!("https://bscscan.com/address/{}", address)),
            _ => None,
        };
        Self {
            network: network.to_string(),
            chain_id,
            deployer: deployer.to_string(),
            contracts,
            deployed_at: Utc::now(),
            bscscan_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_the_toolkit_format() {
        let raw = r#"{
            "network": "BNB Chain Testnet",
            "chainId": 97,
            "deployer": "0x1234567890123456789012345678901234567890",
            "contracts": {
                "EventFactory": {
                    "address": "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
                    "abi": []
                }
            },
            "deployedAt": "2025-01-01T12:00:00.000Z",
            "bscscanUrl": "https://testnet.bscscan.com/address/0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
        }"#;
        let info: DeploymentInfo = serde_json::from_str(raw).unwrap();
        assert_eq!(info.chain_id, 97);
        assert_eq!(
            info.event_factory_address(),
            Some("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed")
        );
    }

    #[test]
    fn save_then_load_keeps_the_factory_address() {
        let path = std::env::temp_dir().join(format!("deployment-{}.json", uuid::Uuid::new_v4()));
        let info = DeploymentInfo::for_event_factory(
            "BNB Chain Testnet",
            97,
            "0x1234567890123456789012345678901234567890",
            "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed",
        );
        info.save(&path).unwrap();
        let loaded = DeploymentInfo::load(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(loaded.event_factory_address(), info.event_factory_address());
        assert!(loaded.bscscan_url.unwrap().starts_with("https://testnet.bscscan.com/"));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(DeploymentInfo::load(Path::new("/nonexistent/deployment.json")).is_err());
    }
}
