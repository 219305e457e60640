// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    db::backend::with_timeout,
    middleware::i18n::Locale,
    models::{
        auth::Account,
        profile::{SystemRole, UserProfile},
    },
    services::approval_service::{check_access, Actor},
};

// Identidade + perfil + papel do chamador, resolvidos uma vez por requisição
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub account: Account,
    pub profile: UserProfile,
    pub role: SystemRole,
}

impl AuthenticatedUser {
    pub fn actor(&self) -> Actor {
        Actor::new(&self.profile, self.role)
    }
}

async fn authenticate(
    app_state: &AppState,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
) -> Result<AuthenticatedUser, AppError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(AppError::InvalidToken)?;
    let account = app_state.auth_service.validate_token(bearer.token()).await?;

    let backend = &app_state.backend;
    let timeout = app_state.config.backend_timeout;
    let profile = with_timeout(timeout, backend.get_profile(account.id))
        .await?
        .ok_or(AppError::InvalidToken)?;
    let role = with_timeout(timeout, backend.system_role(account.id)).await?;

    Ok(AuthenticatedUser { account, profile, role })
}

/// Só exige token válido. Usado por rotas que o usuário pendente ainda acessa.
pub async fn auth_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&app_state, bearer)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Token válido e perfil aprovado (qualquer papel).
pub async fn approved_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&app_state, bearer)
        .await
        .and_then(|user| check_access(&user.profile).map(|_| user))
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

// Extrator para obter o usuário autenticado diretamente nos handlers
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::InvalidToken)
    }
}
