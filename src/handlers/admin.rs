// src/handlers/admin.rs

//! Painel de administração. O papel de admin é conferido no serviço, a partir
//! do `Actor` montado com o perfil do chamador.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    handlers::ConfirmQuery,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantAllPayload {
    /// Sem negócio: acesso total em todos os negócios existentes.
    pub business_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

// GET /api/admin/profiles
pub async fn list_profiles(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let profiles = app_state
        .approval_service
        .list_profiles(&user.actor())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(profiles))
}

// POST /api/admin/profiles/{id}/approve
pub async fn approve(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(target_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = app_state
        .approval_service
        .approve(&user.actor(), target_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(profile))
}

// POST /api/admin/profiles/{id}/revoke
pub async fn revoke(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(target_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = app_state
        .approval_service
        .revoke(&user.actor(), target_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(profile))
}

// POST /api/admin/profiles/approve-all
pub async fn approve_all(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let count = app_state
        .approval_service
        .approve_all_pending(&user.actor())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(CountResponse { count }))
}

// DELETE /api/admin/profiles/{id}?confirm=true
pub async fn delete_user(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(target_id): Path<Uuid>,
    Query(confirm): Query<ConfirmQuery>,
) -> Result<StatusCode, ApiError> {
    confirm
        .require()
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .approval_service
        .delete_user(&user.actor(), target_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// POST /api/admin/profiles/{id}/grant-all
pub async fn grant_all(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(target_id): Path<Uuid>,
    payload: Option<Json<GrantAllPayload>>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload.unwrap_or_default();
    let actor = user.actor();

    let count = match payload.business_id {
        Some(business_id) => app_state
            .approval_service
            .grant_all_permissions(&actor, target_id, business_id)
            .await
            .map(|_| 1),
        None => app_state.approval_service.grant_full_access(&actor, target_id).await,
    }
    .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(CountResponse { count }))
}
