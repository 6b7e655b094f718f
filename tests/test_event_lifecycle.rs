//! Organizer/buyer walk-through over HTTP:
//! 1) Register an organizer and a buyer, log in, read the profile.
//! 2) Create an event and a token, see them in the public listing.
//! 3) Buy tokens online until stock runs out.
//! 4) Read balances and the transaction history.

mod common;

use serde_json::json;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_event_lifecycle() -> Result<(), Box<dyn std::error::Error>> {
    let server = common::spawn_server().await?;

    let (status, body) = server.get("/", None).await;
    assert_eq!(status, 200);
    assert!(body["message"].as_str().unwrap().contains("BanKa"));

    let (status, health) = server.get("/api/health", None).await;
    assert_eq!(status, 200);
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["database_connected"], true);
    assert_eq!(health["blockchain_connected"], false);

    // --- Accounts ---
    let (organizer_id, _, organizer_token) = server.register("Organizer", "org@banka.test").await;
    let (buyer_id, buyer_wallet, _) = server.register("Buyer", "buyer@banka.test").await;
    assert!(buyer_wallet.starts_with("0x") && buyer_wallet.len() == 42);

    let (status, body) = server
        .post(
            "/api/auth/register",
            None,
            json!({"name": "Dup", "email": "ORG@banka.test", "password": "TestPassword123"}),
        )
        .await;
    assert_eq!(status, 409, "{}", body);

    let (status, login) = server
        .post(
            "/api/auth/login",
            None,
            json!({"email": "org@banka.test", "password": "TestPassword123"}),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(login["user"]["id"].as_str().unwrap(), organizer_id);
    assert!(login["user"].get("password_hash").is_none());

    let (status, _) = server
        .post(
            "/api/auth/login",
            None,
            json!({"email": "org@banka.test", "password": "nope-nope"}),
        )
        .await;
    assert_eq!(status, 401);

    let (status, body) = server.get("/api/profile", None).await;
    assert_eq!(status, 401);
    assert!(body["detail"].is_string());

    let (status, profile) = server.get("/api/profile", Some(&organizer_token)).await;
    assert_eq!(status, 200);
    assert_eq!(profile["wallet"]["custodial"], true);
    assert!(profile["wallet"]["private_key"].as_str().unwrap().starts_with("0x"));
    assert_eq!(profile["events"].as_array().unwrap().len(), 0);

    // --- Catalog ---
    let (event_id, token_address) = server.event_with_token(&organizer_token, 5, "both").await;

    let (status, mine) = server.get("/api/events", Some(&organizer_token)).await;
    assert_eq!(status, 200);
    assert_eq!(mine["events"][0]["id"].as_str().unwrap(), event_id);
    assert_eq!(mine["events"][0]["tokens"][0]["contract_address"], token_address.as_str());

    let (status, public) = server.get("/api/events/public", None).await;
    assert_eq!(status, 200);
    assert_eq!(public["events"].as_array().unwrap().len(), 1);

    let (status, event) = server.get(&format!("/api/events/{}", event_id), None).await;
    assert_eq!(status, 200);
    assert_eq!(event["name"], "Arraial");
    assert_eq!(event["tokens"][0]["sale_mode"], "both");

    let (status, _) = server.get("/api/events/not-a-uuid", None).await;
    assert_eq!(status, 404);

    // Only the organizer may mint tokens for the event.
    let (_, _, outsider_token) = server.register("Outsider", "out@banka.test").await;
    let (status, _) = server
        .post(
            &format!("/api/events/{}/tokens", event_id),
            Some(&outsider_token),
            json!({"name": "FAKE", "price_cents": 1, "initial_supply": 1}),
        )
        .await;
    assert_eq!(status, 403);

    // --- Purchases ---
    let purchase_path = format!("/api/users/{}/purchase", buyer_id);
    let (status, body) = server
        .post(&purchase_path, None, json!({"token_address": token_address, "amount": 3}))
        .await;
    assert_eq!(status, 200, "{}", body);
    assert_eq!(body["purchase"]["total_cents"], 900);
    assert_eq!(body["purchase"]["status"], "completed");
    assert_eq!(body["purchase"]["tx_hash"].as_str().unwrap().len(), 66);

    let (status, body) = server
        .post(&purchase_path, None, json!({"token_address": token_address, "amount": 3}))
        .await;
    assert_eq!(status, 409);
    assert!(body["detail"].as_str().unwrap().contains("remaining 2"));

    let (status, _) = server
        .post(&purchase_path, None, json!({"token_address": token_address, "amount": 0}))
        .await;
    assert_eq!(status, 400);

    let (status, _) = server
        .post(&purchase_path, None, json!({"token_address": token_address}))
        .await;
    assert_eq!(status, 422);

    let (status, tokens) = server
        .get(&format!("/api/events/{}/tokens", event_id), None)
        .await;
    assert_eq!(status, 200);
    assert_eq!(tokens["tokens"][0]["total_sold"], 3);

    // --- Reads ---
    let (status, user) = server.get(&format!("/api/users/{}", buyer_id), None).await;
    assert_eq!(status, 200);
    assert!(user["user"].get("wallet_private_key").is_none());
    assert_eq!(user["balances"][0]["amount"], 3);

    let (status, history) = server
        .get(&format!("/api/users/{}/transactions", buyer_id), None)
        .await;
    assert_eq!(status, 200);
    assert_eq!(history["transactions"][0]["type"], "purchase");

    let (status, _) = server
        .get(&format!("/api/users/{}", uuid::Uuid::new_v4()), None)
        .await;
    assert_eq!(status, 404);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_network_and_qr() -> Result<(), Box<dyn std::error::Error>> {
    let server = common::spawn_server().await?;

    let (status, body) = server.get("/api/network", None).await;
    assert_eq!(status, 200);
    assert_eq!(body["network"]["chainId"], "0x61");
    assert_eq!(body["event_factory_address"], common::FACTORY);

    let (status, qr) = server.get(&format!("/api/generate-qr/{}", common::FACTORY), None).await;
    assert_eq!(status, 200);
    assert_eq!(qr["qr_data"], "banka://pay/0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");

    let (status, _) = server.get("/api/generate-qr/vendor-1", None).await;
    assert_eq!(status, 400);

    let (status, legacy) = server
        .post(
            "/api/users/register",
            None,
            json!({"name": "Kiosk", "email": "kiosk@banka.test"}),
        )
        .await;
    assert_eq!(status, 200);
    assert!(legacy["wallet_address"].as_str().unwrap().starts_with("0x"));

    Ok(())
}
