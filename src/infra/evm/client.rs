// Read-only JSON-RPC client for the EVM chain the tokens live on.

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Deserialize, Debug)]
struct RpcError {
    code: i64,
    message: String,
}

pub struct EvmClient {
    http: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl EvmClient {
    pub fn new(url: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            url: url.into(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: JsonValue) -> anyhow::Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params });
        let resp: RpcResponse<T> = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("{} request to {} failed", method, self.url))?
            .error_for_status()?
            .json()
            .await
            .with_context(|| format!("{} returned an unreadable body", method))?;
        if let Some(err) = resp.error {
            anyhow::bail!("{} failed: {} (code {})", method, err.message, err.code);
        }
        resp.result
            .with_context(|| format!("{} returned no result", method))
    }

    pub async fn block_number(&self) -> anyhow::Result<u64> {
        let hex: String = self.call("eth_blockNumber", json!([])).await?;
        parse_quantity(&hex)
    }

    pub async fn chain_id(&self) -> anyhow::Result<u64> {
        let hex: String = self.call("eth_chainId", json!([])).await?;
        parse_quantity(&hex)
    }

    /// Deployed bytecode at `address`; `"0x"` when nothing is deployed.
    pub async fn get_code(&self, address: &str) -> anyhow::Result<String> {
        self.call("eth_getCode", json!([address, "latest"])).await
    }
}

/// Parses a JSON-RPC hex quantity (`"0x1b4"`).
pub fn parse_quantity(s: &str) -> anyhow::Result<u64> {
    let digits = s
        .strip_prefix("0x")
        .with_context(|| format!("quantity '{}' lacks 0x prefix", s))?;
    if digits.is_empty() {
        anyhow::bail!("empty quantity");
    }
    u64::from_str_radix(digits, 16).with_context(|| format!("invalid quantity '{}'", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_quantities() {
        assert_eq!(parse_quantity("0x0").unwrap(), 0);
        assert_eq!(parse_quantity("0x61").unwrap(), 97);
        assert_eq!(parse_quantity("0x1b4").unwrap(), 436);
        assert!(parse_quantity("97").is_err());
        assert!(parse_quantity("0x").is_err());
        assert!(parse_quantity("0xzz").is_err());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_error() {
        let client = EvmClient::new("http://127.0.0.1:9").unwrap();
        assert!(client.block_number().await.is_err());
    }
}
