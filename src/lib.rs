// src/lib.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};

pub mod common;
pub mod config;
pub mod db;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use crate::config::AppState;
use crate::middleware::auth::{approved_guard, auth_guard};

/// Monta o router completo com o estado injetado.
pub fn app(app_state: AppState) -> Router {
    // Define as rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    // Rotas que o usuário pendente ainda acessa (só token)
    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let session_routes = Router::new()
        .route("/", get(handlers::session::current_state))
        .route("/watch", get(handlers::session::watch))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    // Daqui para baixo: token + perfil aprovado
    let business_routes = Router::new()
        .route(
            "/",
            post(handlers::businesses::create_business).get(handlers::businesses::list_my_businesses),
        )
        .route("/{id}", delete(handlers::businesses::delete_business));

    let company_routes = Router::new()
        .route(
            "/",
            get(handlers::companies::list_companies)
                .post(handlers::companies::create_company)
                .delete(handlers::companies::clear_companies),
        )
        .route(
            "/{id}",
            get(handlers::companies::get_company)
                .put(handlers::companies::update_company)
                .delete(handlers::companies::delete_company),
        );

    let employee_routes = Router::new()
        .route(
            "/",
            get(handlers::employees::list_employees)
                .post(handlers::employees::create_employee)
                .delete(handlers::employees::clear_employees),
        )
        .route(
            "/{id}",
            get(handlers::employees::get_employee)
                .put(handlers::employees::update_employee)
                .delete(handlers::employees::delete_employee),
        );

    let permission_routes = Router::new()
        .route("/", get(handlers::permissions::list_permissions))
        .route("/reload", post(handlers::permissions::reload_permissions))
        .route("/check", get(handlers::permissions::check_permission));

    let admin_routes = Router::new()
        .route("/profiles", get(handlers::admin::list_profiles))
        .route("/profiles/approve-all", post(handlers::admin::approve_all))
        .route("/profiles/{id}", delete(handlers::admin::delete_user))
        .route("/profiles/{id}/approve", post(handlers::admin::approve))
        .route("/profiles/{id}/revoke", post(handlers::admin::revoke))
        .route("/profiles/{id}/grant-all", post(handlers::admin::grant_all));

    let validation_routes = Router::new()
        .route("/documents", post(handlers::validations::issue_document))
        .route("/certificates", post(handlers::validations::issue_certificate))
        .route("/{kind}/{code}/invalidate", post(handlers::validations::invalidate))
        .route("/{kind}/{code}/qrcode.png", get(handlers::validations::qr_code));

    let approved_routes = Router::new()
        .nest("/businesses", business_routes)
        .nest("/companies", company_routes)
        .nest("/employees", employee_routes)
        .nest("/permissions", permission_routes)
        .nest("/admin", admin_routes)
        .nest("/validations", validation_routes)
        .route("/search", get(handlers::search::global_search))
        .route(
            "/backup",
            get(handlers::backup::export_backup).post(handlers::backup::import_backup),
        )
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), approved_guard));

    // Combina tudo no router principal
    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/validate-doc/{code}", get(handlers::validations::public_document))
        .route("/validate-cert/{code}", get(handlers::validations::public_certificate))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/session", session_routes)
        .nest("/api", approved_routes)
        .with_state(app_state)
}
