// src/handlers/search.rs

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermCompaniesView, RequirePermission},
        tenancy::BusinessContext,
    },
    models::permission::{Action, Module},
    services::search_service::SearchResults,
};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

// GET /api/search?q=
pub async fn global_search(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _perm: RequirePermission<PermCompaniesView>,
    business: BusinessContext,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResults>, ApiError> {
    let session = app_state
        .permission_cache
        .get_or_load(user.account.id, business.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let mut results = app_state.search_service.search(business.0, &query.q);
    // Colaboradores só para quem pode vê-los
    if !session.can(Module::Employees, Action::View) {
        results.employees.clear();
    }

    Ok(Json(results))
}
