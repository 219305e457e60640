// src/handlers/employees.rs

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
            PermEmployeesCreate, PermEmployeesDelete, PermEmployeesUpdate, PermEmployeesView,
            RequirePermission,
        },
        tenancy::BusinessContext,
    },
    models::employee::{EmployeeDraft, EmployeePatch},
    services::employee_service::EmployeeView,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeListQuery {
    pub q: Option<String>,
    pub company_id: Option<Uuid>,
}

// GET /api/employees?q=&companyId=
pub async fn list_employees(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermEmployeesView>,
    business: BusinessContext,
    Query(query): Query<EmployeeListQuery>,
) -> Json<Vec<EmployeeView>> {
    Json(
        app_state
            .employee_service
            .list(business.0, query.q.as_deref(), query.company_id),
    )
}

// GET /api/employees/{id}
pub async fn get_employee(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermEmployeesView>,
    business: BusinessContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let employee = app_state
        .employee_service
        .get(business.0, id)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(employee))
}

// POST /api/employees
pub async fn create_employee(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermEmployeesCreate>,
    business: BusinessContext,
    Json(draft): Json<EmployeeDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let employee = app_state
        .employee_service
        .create(business.0, draft)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(employee)))
}

// PUT /api/employees/{id}
pub async fn update_employee(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermEmployeesUpdate>,
    business: BusinessContext,
    Path(id): Path<Uuid>,
    Json(patch): Json<EmployeePatch>,
) -> Result<impl IntoResponse, ApiError> {
    let employee = app_state
        .employee_service
        .update(business.0, id, patch)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(employee))
}

// DELETE /api/employees/{id}?confirm=true
pub async fn delete_employee(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermEmployeesDelete>,
    business: BusinessContext,
    Path(id): Path<Uuid>,
    Query(confirm): Query<ConfirmQuery>,
) -> Result<StatusCode, ApiError> {
    confirm
        .require()
        .and_then(|_| app_state.employee_service.delete(business.0, id))
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// DELETE /api/employees?confirm=true
pub async fn clear_employees(
    State(app_state): State<AppState>,
    locale: Locale,
    _perm: RequirePermission<PermEmployeesDelete>,
    business: BusinessContext,
    Query(confirm): Query<ConfirmQuery>,
) -> Result<StatusCode, ApiError> {
    confirm
        .require()
        .and_then(|_| app_state.employee_service.clear_all(business.0))
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tracing::info!("Coleção de colaboradores do negócio {} apagada", business.0);
    Ok(StatusCode::NO_CONTENT)
}
