use crate::app::banka_service::{LoginRequest, RegisterRequest, UserRegister};
use crate::app::Profile;
use crate::transport::http::auth::AuthUser;
use crate::transport::http::handlers::common::{json_body, path_id, ApiError};
use crate::transport::http::types::{
    AppState, AuthResponse, ErrorBody, LegacyUserResponse, TransactionsResponse, UserView,
};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created, session opened", body = AuthResponse),
        (status = 400, description = "Invalid field", body = ErrorBody),
        (status = 409, description = "Email or external wallet already registered", body = ErrorBody),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ErrorBody)
    )
)]
pub async fn register_handler(
    State(state): State<AppState>,
    request: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let request = json_body(request)?;
    let session = state.service.register(request).await?;
    Ok(Json(AuthResponse {
        user: session.user,
        token: session.token,
        message: "User registered successfully".to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session opened", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = ErrorBody),
        (status = 409, description = "Connected wallet does not match", body = ErrorBody),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ErrorBody)
    )
)]
pub async fn login_handler(
    State(state): State<AppState>,
    request: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let request = json_body(request)?;
    let session = state.service.login(request).await?;
    Ok(Json(AuthResponse {
        user: session.user,
        token: session.token,
        message: "Login successful".to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/profile",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Caller's account, wallet, events and balances", body = Profile),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody)
    )
)]
pub async fn profile_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Profile>, ApiError> {
    Ok(Json(state.service.profile(user).await?))
}

#[utoipa::path(
    post,
    path = "/api/users/register",
    request_body = UserRegister,
    responses(
        (status = 200, description = "User created with a custodial wallet", body = LegacyUserResponse),
        (status = 400, description = "Invalid field", body = ErrorBody),
        (status = 409, description = "Email already registered", body = ErrorBody)
    )
)]
pub async fn register_user_handler(
    State(state): State<AppState>,
    request: Result<Json<UserRegister>, JsonRejection>,
) -> Result<Json<LegacyUserResponse>, ApiError> {
    let request = json_body(request)?;
    let user = state.service.register_legacy(request).await?;
    Ok(Json(LegacyUserResponse {
        id: user.id,
        name: user.name,
        wallet_address: user.wallet_address,
        message: "User registered successfully".to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}",
    params(("user_id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Public user view with balances", body = UserView),
        (status = 404, description = "Unknown user", body = ErrorBody)
    )
)]
pub async fn get_user_handler(
    State(state): State<AppState>,
    user_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<UserView>, ApiError> {
    let user_id = path_id(user_id, "User")?;
    let (user, balances) = state.service.get_user(user_id).await?;
    Ok(Json(UserView { user, balances }))
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}/transactions",
    params(("user_id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Purchases, sent transfers and offline grants, newest first", body = TransactionsResponse),
        (status = 404, description = "Unknown user", body = ErrorBody)
    )
)]
pub async fn transactions_handler(
    State(state): State<AppState>,
    user_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<TransactionsResponse>, ApiError> {
    let user_id = path_id(user_id, "User")?;
    let transactions = state.service.transactions(user_id).await?;
    Ok(Json(TransactionsResponse { transactions }))
}
