use crate::app::BankaService;
use crate::domain::model::{
    Balance, Event, EventWithTokens, OfflineTransfer, Purchase, Token, Transaction, Transfer, User,
};
use crate::infra::evm::{EvmClient, NetworkConfig};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<BankaService>,
    /// `None` when no RPC endpoint is configured.
    pub chain: Option<Arc<EvmClient>>,
    pub network: NetworkConfig,
}

/// Error body shared by every endpoint.
#[derive(Serialize, Debug, ToSchema)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub database_connected: bool,
    pub blockchain_connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_block: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct NetworkResponse {
    pub network: NetworkConfig,
    pub event_factory_address: Option<String>,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
    pub message: String,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct LegacyUserResponse {
    pub id: Uuid,
    pub name: String,
    pub wallet_address: String,
    pub message: String,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct UserView {
    pub user: User,
    pub balances: Vec<Balance>,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct EventsResponse {
    pub events: Vec<EventWithTokens>,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct EventCreatedResponse {
    pub event: Event,
    pub message: String,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct EventUpdatedResponse {
    pub event: Event,
    pub message: String,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct TokenUpdatedResponse {
    pub token: Token,
    pub message: String,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct TokensResponse {
    pub tokens: Vec<Token>,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct TokenCreatedResponse {
    pub token: Token,
    pub message: String,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct PurchaseResponse {
    pub purchase: Purchase,
    pub message: String,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct TransferResponse {
    pub transfer: Transfer,
    pub message: String,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct OfflineTransferResponse {
    pub offline_transfer: OfflineTransfer,
    pub message: String,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct TransactionsResponse {
    /// Tagged by `type`: `purchase`, `transfer` or `offline_transfer`.
    #[schema(value_type = Vec<Object>)]
    pub transactions: Vec<Transaction>,
}
