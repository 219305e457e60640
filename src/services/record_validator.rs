// src/services/record_validator.rs

//! Regras de aceite de Empresa e Colaborador, aplicadas no envio do formulário.
//!
//! Ordem fixa, primeiro erro vence: obrigatórios, tamanho do documento,
//! formato do e-mail, tamanho do telefone e (colaborador) empresa existente.
//! Nada aqui altera a entrada; a normalização acontece depois, no serviço.

use thiserror::Error;

use crate::{
    common::{
        i18n::Lang,
        normalize::{digits_only, CNPJ_DIGITS, CPF_DIGITS},
    },
    models::{company::Company, company::CompanyDraft, employee::EmployeeDraft},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("campo obrigatório: {0}")]
    Required(&'static str),

    #[error("{field} incompleto: são necessários {expected} dígitos")]
    IncompleteTaxId { field: &'static str, expected: usize },

    #[error("e-mail inválido: {0}")]
    InvalidEmail(&'static str),

    #[error("telefone inválido: {0}")]
    InvalidPhone(&'static str),

    #[error("nenhuma empresa selecionada")]
    CompanyNotSelected,
}

impl RecordError {
    pub fn field(&self) -> &'static str {
        match self {
            RecordError::Required(field)
            | RecordError::IncompleteTaxId { field, .. }
            | RecordError::InvalidEmail(field)
            | RecordError::InvalidPhone(field) => field,
            RecordError::CompanyNotSelected => "companyId",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            RecordError::Required(_) => "required",
            RecordError::IncompleteTaxId { .. } => "incomplete_tax_id",
            RecordError::InvalidEmail(_) => "invalid_email",
            RecordError::InvalidPhone(_) => "invalid_phone",
            RecordError::CompanyNotSelected => "company_not_selected",
        }
    }

    pub fn message(&self, lang: Lang) -> String {
        match (self, lang) {
            (RecordError::Required(field), Lang::Pt) => format!("Informe o campo obrigatório: {field}."),
            (RecordError::Required(field), Lang::En) => format!("The field '{field}' is required."),
            (RecordError::IncompleteTaxId { field, expected }, Lang::Pt) => {
                format!("{} incompleto: informe os {expected} dígitos.", field.to_uppercase())
            }
            (RecordError::IncompleteTaxId { field, expected }, Lang::En) => {
                format!("Incomplete {}: {expected} digits are required.", field.to_uppercase())
            }
            (RecordError::InvalidEmail(_), Lang::Pt) => "Informe um e-mail válido.".to_string(),
            (RecordError::InvalidEmail(_), Lang::En) => "Enter a valid e-mail address.".to_string(),
            (RecordError::InvalidPhone(_), Lang::Pt) => {
                "Telefone inválido: informe DDD + número (10 ou 11 dígitos).".to_string()
            }
            (RecordError::InvalidPhone(_), Lang::En) => {
                "Invalid phone: area code + number (10 or 11 digits).".to_string()
            }
            (RecordError::CompanyNotSelected, Lang::Pt) => "Selecione uma empresa.".to_string(),
            (RecordError::CompanyNotSelected, Lang::En) => "Select a company.".to_string(),
        }
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

// Forma básica `local@dominio.tld`, sem espaços em nenhum ponto
fn is_email_shaped(value: &str) -> bool {
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        return false;
    }

    value.match_indices('@').any(|(at, _)| {
        let (local, domain) = (&value[..at], &value[at + 1..]);
        !local.is_empty()
            && domain
                .match_indices('.')
                .any(|(dot, _)| dot > 0 && dot + 1 < domain.len())
    })
}

fn check_tax_id(value: &str, field: &'static str, expected: usize) -> Result<(), RecordError> {
    if digits_only(value).len() != expected {
        return Err(RecordError::IncompleteTaxId { field, expected });
    }
    Ok(())
}

fn check_contacts(email: Option<&str>, phone: Option<&str>) -> Result<(), RecordError> {
    if let Some(email) = email.map(str::trim).filter(|e| !e.is_empty()) {
        if !is_email_shaped(email) {
            return Err(RecordError::InvalidEmail("email"));
        }
    }

    if let Some(phone) = phone.filter(|p| !is_blank(p)) {
        let len = digits_only(phone).len();
        if len != 10 && len != 11 {
            return Err(RecordError::InvalidPhone("phone"));
        }
    }

    Ok(())
}

pub fn validate_company(draft: &CompanyDraft) -> Result<(), RecordError> {
    if is_blank(&draft.name) {
        return Err(RecordError::Required("name"));
    }
    if is_blank(&draft.cnpj) {
        return Err(RecordError::Required("cnpj"));
    }

    check_tax_id(&draft.cnpj, "cnpj", CNPJ_DIGITS)?;
    check_contacts(draft.email.as_deref(), draft.phone.as_deref())
}

/// `companies` é a coleção carregada no momento da validação.
pub fn validate_employee(draft: &EmployeeDraft, companies: &[Company]) -> Result<(), RecordError> {
    if is_blank(&draft.name) {
        return Err(RecordError::Required("name"));
    }
    if is_blank(&draft.cpf) {
        return Err(RecordError::Required("cpf"));
    }

    check_tax_id(&draft.cpf, "cpf", CPF_DIGITS)?;
    check_contacts(draft.email.as_deref(), draft.phone.as_deref())?;

    match draft.company_ref() {
        Some(id) if companies.iter().any(|c| c.id == id) => Ok(()),
        _ => Err(RecordError::CompanyNotSelected),
    }
}
