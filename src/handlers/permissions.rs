// src/handlers/permissions.rs

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, tenancy::BusinessContext},
    models::{
        permission::{Action, Module, PermissionGrant},
        profile::SystemRole,
    },
    services::permission_resolver::SessionPermissions,
};

// Conjunto efetivo da sessão no negócio selecionado
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionsResponse {
    pub role: SystemRole,
    pub is_owner: bool,
    pub grants: Vec<PermissionGrant>,
}

impl From<&SessionPermissions> for PermissionsResponse {
    fn from(session: &SessionPermissions) -> Self {
        Self {
            role: session.role,
            is_owner: session.is_owner,
            grants: session.effective(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CheckQuery {
    pub module: Module,
    pub action: Action,
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub allowed: bool,
}

// GET /api/permissions
pub async fn list_permissions(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    business: BusinessContext,
) -> Result<Json<PermissionsResponse>, ApiError> {
    let session = app_state
        .permission_cache
        .get_or_load(user.account.id, business.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(PermissionsResponse::from(session.as_ref())))
}

// POST /api/permissions/reload
pub async fn reload_permissions(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    business: BusinessContext,
) -> Result<Json<PermissionsResponse>, ApiError> {
    let session = app_state
        .permission_cache
        .reload(user.account.id, business.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tracing::debug!("Permissões de {} no negócio {} recarregadas", user.account.id, business.0);
    Ok(Json(PermissionsResponse::from(session.as_ref())))
}

// GET /api/permissions/check?module=companies&action=view
pub async fn check_permission(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    business: BusinessContext,
    Query(query): Query<CheckQuery>,
) -> Result<Json<CheckResponse>, ApiError> {
    let session = app_state
        .permission_cache
        .get_or_load(user.account.id, business.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(CheckResponse {
        allowed: session.can(query.module, query.action),
    }))
}
