// src/handlers/validations.rs

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{PermValidationsCreate, PermValidationsManage, PermValidationsView, RequirePermission},
        tenancy::BusinessContext,
    },
    models::validation::{IssueCertificatePayload, IssueDocumentPayload, ValidationKind},
};

// Registro recém-emitido + a URL pública que vai no QR code
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedValidation<T> {
    #[serde(flatten)]
    pub record: T,
    pub public_url: String,
}

// POST /api/validations/documents
pub async fn issue_document(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermValidationsCreate>,
    business: BusinessContext,
    Json(payload): Json<IssueDocumentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let service = &app_state.validation_service;
    let record = service
        .issue_document(business.0, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let public_url = service.public_url(ValidationKind::Documents, &record.validation_code);
    Ok((StatusCode::CREATED, Json(IssuedValidation { record, public_url })))
}

// POST /api/validations/certificates
pub async fn issue_certificate(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermValidationsCreate>,
    business: BusinessContext,
    Json(payload): Json<IssueCertificatePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let service = &app_state.validation_service;
    let record = service
        .issue_certificate(business.0, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let public_url = service.public_url(ValidationKind::Certificates, &record.validation_code);
    Ok((StatusCode::CREATED, Json(IssuedValidation { record, public_url })))
}

// POST /api/validations/{kind}/{code}/invalidate
pub async fn invalidate(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermValidationsManage>,
    business: BusinessContext,
    Path((kind, code)): Path<(ValidationKind, String)>,
) -> Result<StatusCode, ApiError> {
    app_state
        .validation_service
        .invalidate(kind, business.0, &code)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/validations/{kind}/{code}/qrcode.png
pub async fn qr_code(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermValidationsView>,
    business: BusinessContext,
    Path((kind, code)): Path<(ValidationKind, String)>,
) -> Result<Response, ApiError> {
    let png = app_state
        .validation_service
        .qr_png(kind, business.0, &code)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let headers = [
        (header::CONTENT_TYPE, "image/png".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"qrcode_{}.png\"", code),
        ),
    ];

    Ok((headers, png).into_response())
}

// --- Consulta pública (sem autenticação) ---
// Código malformado e código inexistente respondem exatamente igual.

// GET /validate-doc/{code}
pub async fn public_document(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(code): Path<String>,
) -> Result<Response, ApiError> {
    let record = app_state
        .validation_service
        .resolve_document(&code)
        .await
        .and_then(|found| found.ok_or(AppError::NotFound))
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(record).into_response())
}

// GET /validate-cert/{code}
pub async fn public_certificate(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(code): Path<String>,
) -> Result<Response, ApiError> {
    let record = app_state
        .validation_service
        .resolve_certificate(&code)
        .await
        .and_then(|found| found.ok_or(AppError::NotFound))
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(record).into_response())
}
