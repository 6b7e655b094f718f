use crate::app::banka_service::{OfflineTransferRequest, TokenPurchase, TokenTransfer};
use crate::transport::http::auth::AuthUser;
use crate::transport::http::handlers::common::{json_body, path_id, ApiError};
use crate::transport::http::types::{
    AppState, ErrorBody, OfflineTransferResponse, PurchaseResponse, TransferResponse,
};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/api/users/{user_id}/purchase",
    params(("user_id" = Uuid, Path, description = "Buyer id")),
    request_body = TokenPurchase,
    responses(
        (status = 200, description = "Tokens bought online", body = PurchaseResponse),
        (status = 400, description = "Invalid amount or address", body = ErrorBody),
        (status = 404, description = "Unknown user or token", body = ErrorBody),
        (status = 409, description = "Insufficient stock, offline-only token or inactive token", body = ErrorBody),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ErrorBody)
    )
)]
pub async fn purchase_handler(
    State(state): State<AppState>,
    user_id: Result<Path<Uuid>, PathRejection>,
    request: Result<Json<TokenPurchase>, JsonRejection>,
) -> Result<Json<PurchaseResponse>, ApiError> {
    let user_id = path_id(user_id, "User")?;
    let request = json_body(request)?;
    let purchase = state.service.purchase(user_id, request).await?;
    Ok(Json(PurchaseResponse {
        message: format!("Purchased {} tokens", purchase.amount),
        purchase,
    }))
}

#[utoipa::path(
    post,
    path = "/api/users/{user_id}/transfer",
    security(("bearer" = [])),
    params(("user_id" = Uuid, Path, description = "Sender id, must be the caller")),
    request_body = TokenTransfer,
    responses(
        (status = 200, description = "Tokens moved to another wallet", body = TransferResponse),
        (status = 400, description = "Invalid amount or address", body = ErrorBody),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody),
        (status = 403, description = "Sender is not the caller", body = ErrorBody),
        (status = 404, description = "Unknown user or token", body = ErrorBody),
        (status = 409, description = "Insufficient balance or inactive token", body = ErrorBody),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ErrorBody)
    )
)]
pub async fn transfer_handler(
    State(state): State<AppState>,
    AuthUser(sender): AuthUser,
    user_id: Result<Path<Uuid>, PathRejection>,
    request: Result<Json<TokenTransfer>, JsonRejection>,
) -> Result<Json<TransferResponse>, ApiError> {
    let user_id = path_id(user_id, "User")?;
    let request = json_body(request)?;
    let transfer = state.service.transfer(&sender, user_id, request).await?;
    Ok(Json(TransferResponse {
        message: format!("Transferred {} tokens", transfer.amount),
        transfer,
    }))
}

#[utoipa::path(
    post,
    path = "/api/transfer/offline",
    security(("bearer" = [])),
    request_body = OfflineTransferRequest,
    responses(
        (status = 200, description = "Tokens granted at the venue", body = OfflineTransferResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody),
        (status = 403, description = "Caller is not the organizer", body = ErrorBody),
        (status = 404, description = "Unknown user or token", body = ErrorBody),
        (status = 409, description = "Insufficient stock, online-only token or inactive token", body = ErrorBody)
    )
)]
pub async fn offline_transfer_handler(
    State(state): State<AppState>,
    AuthUser(cashier): AuthUser,
    request: Result<Json<OfflineTransferRequest>, JsonRejection>,
) -> Result<Json<OfflineTransferResponse>, ApiError> {
    let request = json_body(request)?;
    let grant = state.service.offline_transfer(&cashier, request).await?;
    Ok(Json(OfflineTransferResponse {
        message: format!("Offline transfer of {} tokens completed", grant.amount),
        offline_transfer: grant,
    }))
}
