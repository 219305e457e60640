// src/middleware/tenancy.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use uuid::Uuid;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
};

// O nome do nosso cabeçalho HTTP customizado
pub const BUSINESS_ID_HEADER: &str = "x-business-id";

// Negócio selecionado pelo cliente. Toda operação sobre dados é escopada por ele.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessContext(pub Uuid);

impl BusinessContext {
    pub fn from_parts(parts: &Parts) -> Result<Self, AppError> {
        let value = parts
            .headers
            .get(BUSINESS_ID_HEADER)
            .ok_or(AppError::MissingBusinessHeader)?;

        let value = value.to_str().map_err(|_| AppError::InvalidBusinessHeader)?;
        let business_id = Uuid::parse_str(value.trim()).map_err(|_| AppError::InvalidBusinessHeader)?;

        Ok(BusinessContext(business_id))
    }
}

impl<S> FromRequestParts<S> for BusinessContext
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        BusinessContext::from_parts(parts).map_err(|e| {
            let app_state = AppState::from_ref(state);
            let locale = Locale::from_parts(parts);
            e.to_api_error(&locale, &app_state.i18n_store)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/companies");
        if let Some(value) = header {
            builder = builder.header(BUSINESS_ID_HEADER, value);
        }
        builder.body(()).map(|r| r.into_parts().0).expect("requisição")
    }

    #[test]
    fn reads_the_business_header() {
        let id = Uuid::new_v4();
        let ctx = BusinessContext::from_parts(&parts(Some(&id.to_string()))).expect("válido");
        assert_eq!(ctx, BusinessContext(id));
    }

    #[test]
    fn missing_and_invalid_are_distinct() {
        assert!(matches!(
            BusinessContext::from_parts(&parts(None)),
            Err(AppError::MissingBusinessHeader)
        ));
        assert!(matches!(
            BusinessContext::from_parts(&parts(Some("loja-1"))),
            Err(AppError::InvalidBusinessHeader)
        ));
    }
}
