//! Chain parameters handed to the browser wallet (`wallet_addEthereumChain`).

use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
    /// Hex chain id, e.g. `0x61`.
    pub chain_id: String,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
}

impl NetworkConfig {
    pub fn for_chain(chain_id: u64, rpc_url: Option<&str>) -> Self {
        let (chain_name, currency, symbol, explorer, default_rpc) = match chain_id {
            56 => (
                "BNB Smart Chain",
                "BNB",
                "BNB",
                "https://bscscan.com/",
                "https://bsc-dataseed.binance.org/",
            ),
            97 => (
                "BNB Smart Chain Testnet",
                "BNB",
                "tBNB",
                "https://testnet.bscscan.com/",
                "https://data-seed-prebsc-1-s1.binance.org:8545/",
            ),
            _ => ("Custom EVM Chain", "Ether", "ETH", "", ""),
        };
        let rpc_urls = rpc_url
            .or(Some(default_rpc).filter(|s| !s.is_empty()))
            .map(|s| vec![s.to_string()])
            .unwrap_or_default();
        let block_explorer_urls = if explorer.is_empty() {
            Vec::new()
        } else {
            vec![explorer.to_string()]
        };
        Self {
            chain_id: format!("0x{:x}", chain_id),
            chain_name: chain_name.to_string(),
            native_currency: NativeCurrency {
                name: currency.to_string(),
                symbol: symbol.to_string(),
                decimals: 18,
            },
            rpc_urls,
            block_explorer_urls,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bnb_testnet_matches_wallet_parameters() {
        let n = NetworkConfig::for_chain(97, None);
        assert_eq!(n.chain_id, "0x61");
        assert_eq!(n.native_currency.symbol, "tBNB");
        assert_eq!(n.rpc_urls, vec!["https://data-seed-prebsc-1-s1.binance.org:8545/"]);
        let v = serde_json::to_value(&n).unwrap();
        assert!(v.get("blockExplorerUrls").is_some());
        assert!(v.get("nativeCurrency").is_some());
    }

    #[test]
    fn configured_rpc_wins_over_default() {
        let n = NetworkConfig::for_chain(1337, Some("http://localhost:8545"));
        assert_eq!(n.chain_id, "0x539");
        assert_eq!(n.rpc_urls, vec!["http://localhost:8545"]);
        assert!(n.block_explorer_urls.is_empty());
    }
}
