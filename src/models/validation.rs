// src/models/validation.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

// Registro público de validação de documento. Imutável depois de emitido,
// exceto `is_valid`, que só vai de true para false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DocumentValidation {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub business_id: Uuid,
    pub document_name: String,
    pub document_type: String,
    pub issued_date: DateTime<Utc>,
    pub issuer: Option<String>,
    pub validation_code: String,
    pub is_valid: bool,
}

// Certificado de NR (exame/treinamento) de um colaborador
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CertificateValidation {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub business_id: Uuid,
    pub employee_name: String,
    pub nr_number: String,
    pub nr_title: String,
    pub exam_date: NaiveDate,
    pub issue_date: NaiveDate,
    pub issuer_name: String,
    pub issuer_crea: Option<String>,
    pub issuer_cft_eletrotecnico: Option<String>,
    pub issuer_cft_mecanico: Option<String>,
    pub validation_code: String,
    pub is_valid: bool,
}

// Só espaços conta como vazio: o serviço grava o valor aparado
fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IssueDocumentPayload {
    #[validate(custom(function = "not_blank", message = "O nome do documento é obrigatório."))]
    pub document_name: String,
    #[validate(custom(function = "not_blank", message = "O tipo do documento é obrigatório."))]
    pub document_type: String,
    pub issuer: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IssueCertificatePayload {
    #[validate(custom(function = "not_blank", message = "O nome do colaborador é obrigatório."))]
    pub employee_name: String,
    #[validate(custom(function = "not_blank", message = "O número da NR é obrigatório."))]
    pub nr_number: String,
    #[validate(custom(function = "not_blank", message = "O título da NR é obrigatório."))]
    pub nr_title: String,
    pub exam_date: NaiveDate,
    pub issue_date: Option<NaiveDate>,
    #[validate(custom(function = "not_blank", message = "O nome do emissor é obrigatório."))]
    pub issuer_name: String,
    pub issuer_crea: Option<String>,
    pub issuer_cft_eletrotecnico: Option<String>,
    pub issuer_cft_mecanico: Option<String>,
}

/// Segmento de rota `/api/validations/{kind}/...`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationKind {
    Documents,
    Certificates,
}

impl ValidationKind {
    /// Prefixo da URL pública impressa no QR code.
    pub fn public_prefix(self) -> &'static str {
        match self {
            ValidationKind::Documents => "validate-doc",
            ValidationKind::Certificates => "validate-cert",
        }
    }
}
