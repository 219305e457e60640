// src/handlers/companies.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    handlers::ConfirmQuery,
    middleware::{
        i18n::Locale,
        rbac::{
            PermCompaniesCreate, PermCompaniesDelete, PermCompaniesUpdate, PermCompaniesView,
            RequirePermission,
        },
        tenancy::BusinessContext,
    },
    models::company::{Company, CompanyDraft, CompanyPatch},
};

#[derive(Debug, Deserialize)]
pub struct CompanyListQuery {
    pub q: Option<String>,
}

// GET /api/companies?q=
pub async fn list_companies(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermCompaniesView>,
    business: BusinessContext,
    Query(query): Query<CompanyListQuery>,
) -> Json<Vec<Company>> {
    Json(app_state.company_service.list(business.0, query.q.as_deref()))
}

// GET /api/companies/{id}
pub async fn get_company(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermCompaniesView>,
    business: BusinessContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let company = app_state
        .company_service
        .get(business.0, id)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(company))
}

// POST /api/companies
pub async fn create_company(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermCompaniesCreate>,
    business: BusinessContext,
    Json(draft): Json<CompanyDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let company = app_state
        .company_service
        .create(business.0, draft)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(company)))
}

// PUT /api/companies/{id}
pub async fn update_company(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermCompaniesUpdate>,
    business: BusinessContext,
    Path(id): Path<Uuid>,
    Json(patch): Json<CompanyPatch>,
) -> Result<impl IntoResponse, ApiError> {
    let company = app_state
        .company_service
        .update(business.0, id, patch)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(company))
}

// DELETE /api/companies/{id}?confirm=true
pub async fn delete_company(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermCompaniesDelete>,
    business: BusinessContext,
    Path(id): Path<Uuid>,
    Query(confirm): Query<ConfirmQuery>,
) -> Result<StatusCode, ApiError> {
    confirm
        .require()
        .and_then(|_| app_state.company_service.delete(business.0, id))
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// DELETE /api/companies?confirm=true
pub async fn clear_companies(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermCompaniesDelete>,
    business: BusinessContext,
    Query(confirm): Query<ConfirmQuery>,
) -> Result<StatusCode, ApiError> {
    confirm
        .require()
        .and_then(|_| app_state.company_service.clear_all(business.0))
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tracing::info!("Coleção de empresas do negócio {} apagada", business.0);
    Ok(StatusCode::NO_CONTENT)
}
