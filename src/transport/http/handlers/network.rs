use crate::app::{vendor_qr, VendorQr};
use crate::infra::config::ZERO_ADDRESS;
use crate::transport::http::handlers::common::ApiError;
use crate::transport::http::types::{AppState, ErrorBody, NetworkResponse};
use axum::extract::{Path, State};
use axum::Json;

#[utoipa::path(
    get,
    path = "/api/network",
    responses((status = 200, description = "Parameters for wallet_addEthereumChain and the factory address", body = NetworkResponse))
)]
pub async fn network_handler(State(state): State<AppState>) -> Json<NetworkResponse> {
    let factory = state.service.factory_address();
    Json(NetworkResponse {
        network: state.network.clone(),
        event_factory_address: (factory != ZERO_ADDRESS).then(|| factory.to_string()),
    })
}

#[utoipa::path(
    get,
    path = "/api/generate-qr/{vendor_address}",
    params(("vendor_address" = String, Path, description = "Vendor wallet address")),
    responses(
        (status = 200, description = "Payment QR payload", body = VendorQr),
        (status = 400, description = "Not a wallet address", body = ErrorBody)
    )
)]
pub async fn generate_qr_handler(Path(vendor_address): Path<String>) -> Result<Json<VendorQr>, ApiError> {
    Ok(Json(vendor_qr(&vendor_address)?))
}
