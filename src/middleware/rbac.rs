// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, tenancy::BusinessContext},
    models::permission::{Action, Module},
};

/// 1. O Trait que define o que é uma Permissão
pub trait PermissionDef: Send + Sync + 'static {
    const MODULE: Module;
    const ACTION: Action;
}

/// 2. O Extractor (Guardião)
pub struct RequirePermission<T>(pub PhantomData<T>);

async fn check<T: PermissionDef>(app_state: &AppState, parts: &Parts) -> Result<(), AppError> {
    // A. Usuário (inserido pelo approved_guard)
    let user = parts
        .extensions
        .get::<AuthenticatedUser>()
        .ok_or(AppError::InvalidToken)?;

    // B. Negócio selecionado
    let BusinessContext(business_id) = BusinessContext::from_parts(parts)?;

    // C. Permissões da sessão (cache)
    let permissions = app_state
        .permission_cache
        .get_or_load(user.account.id, business_id)
        .await?;

    if !permissions.can(T::MODULE, T::ACTION) {
        tracing::debug!(
            "Usuário {} sem {}:{} no negócio {}",
            user.account.id,
            T::MODULE,
            T::ACTION,
            business_id
        );
        return Err(AppError::PermissionDenied {
            module: T::MODULE,
            action: T::ACTION,
        });
    }
    Ok(())
}

// 3. Implementação do FromRequestParts
impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        check::<T>(&app_state, parts)
            .await
            .map_err(|e| e.to_api_error(&Locale::from_parts(parts), &app_state.i18n_store))?;

        Ok(RequirePermission(PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

macro_rules! permission {
    ($name:ident, $module:ident, $action:ident) => {
        pub struct $name;
        impl PermissionDef for $name {
            const MODULE: Module = Module::$module;
            const ACTION: Action = Action::$action;
        }
    };
}

permission!(PermCompaniesView, Companies, View);
permission!(PermCompaniesCreate, Companies, Create);
permission!(PermCompaniesUpdate, Companies, Update);
permission!(PermCompaniesDelete, Companies, Delete);

permission!(PermEmployeesView, Employees, View);
permission!(PermEmployeesCreate, Employees, Create);
permission!(PermEmployeesUpdate, Employees, Update);
permission!(PermEmployeesDelete, Employees, Delete);

permission!(PermValidationsCreate, Validations, Create);
permission!(PermValidationsView, Validations, View);
permission!(PermValidationsManage, Validations, Manage);

permission!(PermBackupView, Backup, View);
permission!(PermBackupManage, Backup, Manage);
