use crate::app::banka_service::{
    ActiveUpdate, EventCreate, LoginRequest, OfflineTransferRequest, RegisterRequest, TokenCreate,
    TokenPurchase, TokenTransfer, UserRegister,
};
use crate::app::{Profile, VendorQr};
use crate::domain::model::{
    Balance, Event, EventWithTokens, OfflineTransfer, Purchase, SaleMode, Token, Transfer,
    TxStatus, User, WalletInfo,
};
use crate::infra::evm::network::{NativeCurrency, NetworkConfig};
use crate::transport::http::handlers::{accounts, events, health, network, transfers};
use crate::transport::http::types::{
    AppState, AuthResponse, ErrorBody, EventCreatedResponse, EventUpdatedResponse,
    EventsResponse, HealthResponse, LegacyUserResponse, MessageResponse, NetworkResponse,
    OfflineTransferResponse, PurchaseResponse, TokenCreatedResponse, TokenUpdatedResponse,
    TokensResponse, TransactionsResponse, TransferResponse, UserView,
};
use axum::routing::{get, post, put};
use axum::Router;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::root_handler,
        health::healthcheck_handler,
        network::network_handler,
        network::generate_qr_handler,
        accounts::register_handler,
        accounts::login_handler,
        accounts::profile_handler,
        accounts::register_user_handler,
        accounts::get_user_handler,
        accounts::transactions_handler,
        events::list_my_events_handler,
        events::create_event_handler,
        events::public_events_handler,
        events::get_event_handler,
        events::list_tokens_handler,
        events::create_token_handler,
        events::set_event_status_handler,
        events::set_token_status_handler,
        transfers::purchase_handler,
        transfers::transfer_handler,
        transfers::offline_transfer_handler
    ),
    components(schemas(
        ErrorBody,
        MessageResponse,
        HealthResponse,
        NetworkResponse,
        NetworkConfig,
        NativeCurrency,
        RegisterRequest,
        LoginRequest,
        UserRegister,
        AuthResponse,
        LegacyUserResponse,
        Profile,
        User,
        WalletInfo,
        UserView,
        Balance,
        EventCreate,
        Event,
        EventWithTokens,
        EventsResponse,
        EventCreatedResponse,
        ActiveUpdate,
        EventUpdatedResponse,
        TokenCreate,
        Token,
        SaleMode,
        TokensResponse,
        TokenCreatedResponse,
        TokenUpdatedResponse,
        TokenPurchase,
        Purchase,
        PurchaseResponse,
        TokenTransfer,
        Transfer,
        TransferResponse,
        OfflineTransferRequest,
        OfflineTransfer,
        OfflineTransferResponse,
        TxStatus,
        TransactionsResponse,
        VendorQr
    )),
    modifiers(&BearerAuth)
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(health::root_handler))
        .route("/api/health", get(health::healthcheck_handler))
        .route("/api/network", get(network::network_handler))
        .route(
            "/api/generate-qr/:vendor_address",
            get(network::generate_qr_handler),
        )
        .route("/api/auth/register", post(accounts::register_handler))
        .route("/api/auth/login", post(accounts::login_handler))
        .route("/api/profile", get(accounts::profile_handler))
        .route(
            "/api/events",
            get(events::list_my_events_handler).post(events::create_event_handler),
        )
        .route("/api/events/public", get(events::public_events_handler))
        .route("/api/events/:event_id", get(events::get_event_handler))
        .route(
            "/api/events/:event_id/tokens",
            get(events::list_tokens_handler).post(events::create_token_handler),
        )
        .route(
            "/api/events/:event_id/status",
            put(events::set_event_status_handler),
        )
        .route(
            "/api/tokens/:token_address/status",
            put(events::set_token_status_handler),
        )
        .route("/api/users/register", post(accounts::register_user_handler))
        .route("/api/users/:user_id", get(accounts::get_user_handler))
        .route("/api/users/:user_id/purchase", post(transfers::purchase_handler))
        .route("/api/users/:user_id/transfer", post(transfers::transfer_handler))
        .route(
            "/api/users/:user_id/transactions",
            get(accounts::transactions_handler),
        )
        .route("/api/transfer/offline", post(transfers::offline_transfer_handler))
        .with_state(app_state)
}
