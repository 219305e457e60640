// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::{
    common::i18n::I18nStore,
    db::slot_storage::StoreError,
    middleware::i18n::Locale,
    models::permission::{Action, Module},
    services::record_validator::RecordError,
};

// Erro de domínio. Serviços e repositórios devolvem sempre este tipo;
// os handlers convertem para `ApiError` com a mensagem no idioma do cliente.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Registro inválido: {0}")]
    RecordInvalid(#[from] RecordError),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Acesso aguardando aprovação")]
    AccessPending,

    #[error("Acesso restrito a administradores")]
    NotAdmin,

    #[error("Permissão negada: {module}:{action}")]
    PermissionDenied { module: Module, action: Action },

    #[error("Ação restrita ao dono do negócio")]
    NotOwner,

    // Auto-proteção: ninguém revoga nem exclui o próprio perfil
    #[error("Ação não permitida")]
    ActionNotPermitted,

    #[error("Recurso não encontrado")]
    NotFound,

    #[error("Cabeçalho X-Business-ID ausente")]
    MissingBusinessHeader,

    #[error("Cabeçalho X-Business-ID inválido")]
    InvalidBusinessHeader,

    #[error("Operação destrutiva sem confirmação")]
    ConfirmationRequired,

    #[error("Backup inválido: {0}")]
    InvalidBackup(String),

    #[error("Falha ao gravar dados locais: {0}")]
    LocalSaveFailed(#[from] StoreError),

    #[error("Tempo esgotado aguardando o serviço remoto")]
    BackendTimeout,

    #[error("Erro do serviço remoto: {0}")]
    Backend(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    /// Código estável devolvido no corpo da resposta (e chave da tradução).
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation_error",
            AppError::RecordInvalid(_) => "record_invalid",
            AppError::EmailAlreadyExists => "email_already_exists",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::InvalidToken => "invalid_token",
            AppError::AccessPending => "access_pending",
            AppError::NotAdmin => "not_admin",
            AppError::PermissionDenied { .. } => "permission_denied",
            AppError::NotOwner => "not_owner",
            AppError::ActionNotPermitted => "action_not_permitted",
            AppError::NotFound => "not_found",
            AppError::MissingBusinessHeader => "missing_business",
            AppError::InvalidBusinessHeader => "invalid_business",
            AppError::ConfirmationRequired => "confirmation_required",
            AppError::InvalidBackup(_) => "invalid_backup",
            AppError::LocalSaveFailed(_) => "local_save_failed",
            AppError::BackendTimeout => "backend_timeout",
            AppError::Backend(_) => "backend_error",
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::RecordInvalid(_)
            | AppError::MissingBusinessHeader
            | AppError::InvalidBusinessHeader
            | AppError::InvalidBackup(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::AccessPending
            | AppError::NotAdmin
            | AppError::PermissionDenied { .. }
            | AppError::NotOwner
            | AppError::ActionNotPermitted => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::EmailAlreadyExists => StatusCode::CONFLICT,
            AppError::ConfirmationRequired => StatusCode::PRECONDITION_REQUIRED,
            AppError::LocalSaveFailed(_) => StatusCode::INSUFFICIENT_STORAGE,
            AppError::BackendTimeout => StatusCode::GATEWAY_TIMEOUT,
            AppError::Backend(_) => StatusCode::BAD_GATEWAY,
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_api_error(&self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let code = self.code();
        let status = self.status();
        let template = i18n.translate(locale, code);

        let (error, details) = match self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<Value> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| Value::from(m.to_string())))
                        .collect();
                    details.insert(field.to_string(), Value::Array(messages));
                }
                (template.to_string(), Some(Value::Object(details)))
            }
            AppError::RecordInvalid(record_err) => {
                // Mensagem específica do campo; o código vai nos detalhes
                let message = record_err.message(i18n.lang(locale));
                let details = json!({ (record_err.field()): [record_err.code()] });
                (message, Some(details))
            }
            AppError::PermissionDenied { module, action } => {
                let permission = format!("{module}:{action}");
                (template.replace("{permission}", &permission), None)
            }
            AppError::Backend(message) => {
                tracing::error!("Erro do serviço remoto: {}", message);
                (format!("{template}: {message}"), None)
            }
            AppError::LocalSaveFailed(e) => {
                tracing::error!("Falha ao gravar dados locais: {}", e);
                (template.to_string(), None)
            }
            AppError::BackendTimeout => {
                tracing::error!("Serviço remoto excedeu o tempo limite");
                (template.to_string(), None)
            }
            e if status == StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (template.to_string(), None)
            }
            _ => (template.to_string(), None),
        };

        ApiError {
            status,
            code,
            error,
            details,
        }
    }
}

// Erros de domínio fora de um handler (middlewares, extratores) respondem no idioma padrão.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default(), &I18nStore::default())
            .into_response()
    }
}

/// Rejeição HTTP: `{"error": "...", "code": "...", "details": {...}}`
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "code": self.code, "details": details }),
            None => json!({ "error": self.error, "code": self.code }),
        };
        (self.status, Json(body)).into_response()
    }
}
