//! Shared harness: serves the real router over a ledger store.

#![allow(dead_code)]

use banka_ledger::infra::evm::NetworkConfig;
use banka_ledger::{transport, BankaService, LedgerStore, MemoryLedgerStore};
use serde_json::{json, Value};
use std::sync::Arc;

pub const FACTORY: &str = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed";

pub struct TestServer {
    pub base_url: String,
    pub client: reqwest::Client,
}

pub async fn spawn_server() -> Result<TestServer, Box<dyn std::error::Error>> {
    spawn_server_with(Arc::new(MemoryLedgerStore::new())).await
}

pub async fn spawn_server_with(
    store: Arc<dyn LedgerStore>,
) -> Result<TestServer, Box<dyn std::error::Error>> {
    let service = BankaService::new(store, Some(FACTORY.to_string()), 24)?;
    let state = transport::http::AppState {
        service: Arc::new(service),
        chain: None,
        network: NetworkConfig::for_chain(97, None),
    };
    let router = transport::http::create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()?;
    Ok(TestServer {
        base_url: format!("http://{}", addr),
        client,
    })
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> (u16, Value) {
        let mut req = self.client.get(self.url(path));
        if let Some(t) = token {
            req = req.bearer_auth(t);
        }
        let resp = req.send().await.unwrap();
        let status = resp.status().as_u16();
        (status, resp.json::<Value>().await.unwrap_or(Value::Null))
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> (u16, Value) {
        self.send(self.client.post(self.url(path)), token, body).await
    }

    pub async fn put(&self, path: &str, token: Option<&str>, body: Value) -> (u16, Value) {
        self.send(self.client.put(self.url(path)), token, body).await
    }

    async fn send(
        &self,
        req: reqwest::RequestBuilder,
        token: Option<&str>,
        body: Value,
    ) -> (u16, Value) {
        let mut req = req.json(&body);
        if let Some(t) = token {
            req = req.bearer_auth(t);
        }
        let resp = req.send().await.unwrap();
        let status = resp.status().as_u16();
        (status, resp.json::<Value>().await.unwrap_or(Value::Null))
    }

    /// Registers an account and returns `(user_id, wallet_address, token)`.
    pub async fn register(&self, name: &str, email: &str) -> (String, String, String) {
        let (status, body) = self
            .post(
                "/api/auth/register",
                None,
                json!({"name": name, "email": email, "password": "TestPassword123"}),
            )
            .await;
        assert_eq!(status, 200, "register failed: {}", body);
        (
            body["user"]["id"].as_str().unwrap().to_string(),
            body["user"]["wallet_address"].as_str().unwrap().to_string(),
            body["token"].as_str().unwrap().to_string(),
        )
    }

    /// Creates an event with one token and returns `(event_id, token_address)`.
    pub async fn event_with_token(
        &self,
        organizer_token: &str,
        supply: i64,
        sale_mode: &str,
    ) -> (String, String) {
        let (status, body) = self
            .post(
                "/api/events",
                Some(organizer_token),
                json!({"name": "Arraial", "date": "2025-06-13T18:00:00", "location": "Alfama"}),
            )
            .await;
        assert_eq!(status, 200, "create event failed: {}", body);
        let event_id = body["event"]["id"].as_str().unwrap().to_string();

        let (status, body) = self
            .post(
                &format!("/api/events/{}/tokens", event_id),
                Some(organizer_token),
                json!({
                    "name": "SARDINHA",
                    "price_cents": 300,
                    "initial_supply": supply,
                    "sale_mode": sale_mode
                }),
            )
            .await;
        assert_eq!(status, 200, "create token failed: {}", body);
        let token_address = body["token"]["contract_address"].as_str().unwrap().to_string();
        (event_id, token_address)
    }
}
