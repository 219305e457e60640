// src/handlers/backup.rs

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use crate::{
    common::error::ApiError,
    config::AppState,
    handlers::ConfirmQuery,
    middleware::{
        i18n::Locale,
        rbac::{PermBackupManage, PermBackupView, RequirePermission},
        tenancy::BusinessContext,
    },
};

// GET /api/backup (download do JSON)
pub async fn export_backup(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermBackupView>,
    business: BusinessContext,
) -> Response {
    let file = app_state.backup_service.export(business.0);
    let filename = format!(
        "attachment; filename=\"backup_{}_{}.json\"",
        business.0,
        file.exported_at.format("%Y-%m-%d")
    );

    ([(header::CONTENT_DISPOSITION, filename)], Json(file)).into_response()
}

// POST /api/backup?confirm=true
pub async fn import_backup(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermBackupManage>,
    business: BusinessContext,
    Query(confirm): Query<ConfirmQuery>,
    Json(raw): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = confirm
        .require()
        .and_then(|_| app_state.backup_service.import(business.0, raw))
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(summary))
}
