use crate::app::banka_service::{ActiveUpdate, EventCreate, TokenCreate};
use crate::domain::model::EventWithTokens;
use crate::transport::http::auth::AuthUser;
use crate::transport::http::handlers::common::{json_body, path_id, ApiError};
use crate::transport::http::types::{
    AppState, ErrorBody, EventCreatedResponse, EventUpdatedResponse, EventsResponse,
    TokenCreatedResponse, TokenUpdatedResponse, TokensResponse,
};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/events",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Events organized by the caller, newest first", body = EventsResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody)
    )
)]
pub async fn list_my_events_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<EventsResponse>, ApiError> {
    let events = state.service.list_organizer_events(&user).await?;
    Ok(Json(EventsResponse { events }))
}

#[utoipa::path(
    post,
    path = "/api/events",
    security(("bearer" = [])),
    request_body = EventCreate,
    responses(
        (status = 200, description = "Event created", body = EventCreatedResponse),
        (status = 400, description = "Invalid field", body = ErrorBody),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ErrorBody)
    )
)]
pub async fn create_event_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    request: Result<Json<EventCreate>, JsonRejection>,
) -> Result<Json<EventCreatedResponse>, ApiError> {
    let request = json_body(request)?;
    let event = state.service.create_event(&user, request).await?;
    Ok(Json(EventCreatedResponse {
        event,
        message: "Event created successfully".to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/events/public",
    responses((status = 200, description = "Active events with their tokens, by date", body = EventsResponse))
)]
pub async fn public_events_handler(
    State(state): State<AppState>,
) -> Result<Json<EventsResponse>, ApiError> {
    let events = state.service.list_public_events().await?;
    Ok(Json(EventsResponse { events }))
}

#[utoipa::path(
    get,
    path = "/api/events/{event_id}",
    params(("event_id" = Uuid, Path, description = "Event id")),
    responses(
        (status = 200, description = "Event with its tokens", body = EventWithTokens),
        (status = 404, description = "Unknown event", body = ErrorBody)
    )
)]
pub async fn get_event_handler(
    State(state): State<AppState>,
    event_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<EventWithTokens>, ApiError> {
    let event_id = path_id(event_id, "Event")?;
    Ok(Json(state.service.get_event(event_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/events/{event_id}/tokens",
    params(("event_id" = Uuid, Path, description = "Event id")),
    responses(
        (status = 200, description = "Tokens of the event", body = TokensResponse),
        (status = 404, description = "Unknown event", body = ErrorBody)
    )
)]
pub async fn list_tokens_handler(
    State(state): State<AppState>,
    event_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<TokensResponse>, ApiError> {
    let event_id = path_id(event_id, "Event")?;
    let tokens = state.service.event_tokens(event_id).await?;
    Ok(Json(TokensResponse { tokens }))
}

#[utoipa::path(
    post,
    path = "/api/events/{event_id}/tokens",
    security(("bearer" = [])),
    params(("event_id" = Uuid, Path, description = "Event id")),
    request_body = TokenCreate,
    responses(
        (status = 200, description = "Token created", body = TokenCreatedResponse),
        (status = 400, description = "Invalid field", body = ErrorBody),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody),
        (status = 403, description = "Caller is not the organizer", body = ErrorBody),
        (status = 404, description = "Unknown event", body = ErrorBody),
        (status = 409, description = "Contract address already in use", body = ErrorBody)
    )
)]
pub async fn create_token_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    event_id: Result<Path<Uuid>, PathRejection>,
    request: Result<Json<TokenCreate>, JsonRejection>,
) -> Result<Json<TokenCreatedResponse>, ApiError> {
    let event_id = path_id(event_id, "Event")?;
    let request = json_body(request)?;
    let token = state.service.create_token(&user, event_id, request).await?;
    Ok(Json(TokenCreatedResponse {
        token,
        message: "Token created successfully".to_string(),
    }))
}

fn status_word(is_active: bool) -> &'static str {
    if is_active {
        "activated"
    } else {
        "deactivated"
    }
}

#[utoipa::path(
    put,
    path = "/api/events/{event_id}/status",
    security(("bearer" = [])),
    params(("event_id" = Uuid, Path, description = "Event id")),
    request_body = ActiveUpdate,
    responses(
        (status = 200, description = "Event opened or closed for trading", body = EventUpdatedResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody),
        (status = 403, description = "Caller is not the organizer", body = ErrorBody),
        (status = 404, description = "Unknown event", body = ErrorBody)
    )
)]
pub async fn set_event_status_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    event_id: Result<Path<Uuid>, PathRejection>,
    request: Result<Json<ActiveUpdate>, JsonRejection>,
) -> Result<Json<EventUpdatedResponse>, ApiError> {
    let event_id = path_id(event_id, "Event")?;
    let request = json_body(request)?;
    let event = state
        .service
        .set_event_active(&user, event_id, request.is_active)
        .await?;
    Ok(Json(EventUpdatedResponse {
        message: format!("Event {}", status_word(event.is_active)),
        event,
    }))
}

#[utoipa::path(
    put,
    path = "/api/tokens/{token_address}/status",
    security(("bearer" = [])),
    params(("token_address" = String, Path, description = "Token contract address")),
    request_body = ActiveUpdate,
    responses(
        (status = 200, description = "Token opened or closed for trading", body = TokenUpdatedResponse),
        (status = 400, description = "Invalid address", body = ErrorBody),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorBody),
        (status = 403, description = "Caller is not the organizer", body = ErrorBody),
        (status = 404, description = "Unknown token", body = ErrorBody)
    )
)]
pub async fn set_token_status_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(token_address): Path<String>,
    request: Result<Json<ActiveUpdate>, JsonRejection>,
) -> Result<Json<TokenUpdatedResponse>, ApiError> {
    let request = json_body(request)?;
    let token = state
        .service
        .set_token_active(&user, &token_address, request.is_active)
        .await?;
    Ok(Json(TokenUpdatedResponse {
        message: format!("Token {}", status_word(token.is_active)),
        token,
    }))
}
