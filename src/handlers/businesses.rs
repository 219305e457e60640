// src/handlers/businesses.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    handlers::ConfirmQuery,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::business::CreateBusinessPayload,
};

// POST /api/businesses
pub async fn create_business(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<CreateBusinessPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let business = app_state
        .business_service
        .create(user.account.id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(business)))
}

// GET /api/businesses
pub async fn list_my_businesses(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let businesses = app_state
        .business_service
        .list(user.account.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(businesses))
}

// DELETE /api/businesses/{id}?confirm=true (só o dono)
pub async fn delete_business(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Query(confirm): Query<ConfirmQuery>,
) -> Result<StatusCode, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    confirm.require().map_err(to_api)?;
    app_state
        .business_service
        .delete(user.account.id, id)
        .await
        .map_err(to_api)?;

    Ok(StatusCode::NO_CONTENT)
}
