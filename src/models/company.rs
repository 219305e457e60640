// src/models/company.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::normalize::{format_cnpj, format_phone, normalize_optional};

// Empresa cliente, como fica gravada no slot "companies"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub cnpj: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub responsible: Option<String>,
    pub cnae: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

// Formulário de empresa (criação), ainda não validado nem normalizado
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cnpj: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub responsible: Option<String>,
    pub cnae: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

// Edição parcial: campo ausente = manter o valor atual
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyPatch {
    pub name: Option<String>,
    pub cnpj: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub responsible: Option<String>,
    pub cnae: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

impl CompanyDraft {
    /// Forma canônica: CNPJ e telefone mascarados, opcionais aparados.
    pub fn into_company(self, id: Uuid, created_at: DateTime<Utc>) -> Company {
        let mut company = Company {
            id,
            name: String::new(),
            cnpj: String::new(),
            email: None,
            phone: None,
            responsible: None,
            cnae: None,
            address: None,
            notes: None,
            created_at,
        };
        self.write_into(&mut company);
        company
    }

    /// Sobrescreve os campos editáveis; `id` e `created_at` nunca mudam.
    pub fn write_into(self, company: &mut Company) {
        company.name = self.name.trim().to_string();
        company.cnpj = format_cnpj(&self.cnpj);
        company.email = normalize_optional(self.email.as_deref());
        company.phone = normalize_optional(self.phone.as_deref()).map(|p| format_phone(&p));
        company.responsible = normalize_optional(self.responsible.as_deref());
        company.cnae = normalize_optional(self.cnae.as_deref());
        company.address = normalize_optional(self.address.as_deref());
        company.notes = normalize_optional(self.notes.as_deref());
    }
}

impl From<&Company> for CompanyDraft {
    fn from(c: &Company) -> Self {
        Self {
            name: c.name.clone(),
            cnpj: c.cnpj.clone(),
            email: c.email.clone(),
            phone: c.phone.clone(),
            responsible: c.responsible.clone(),
            cnae: c.cnae.clone(),
            address: c.address.clone(),
            notes: c.notes.clone(),
        }
    }
}

impl CompanyPatch {
    pub fn apply(self, draft: &mut CompanyDraft) {
        if let Some(v) = self.name {
            draft.name = v;
        }
        if let Some(v) = self.cnpj {
            draft.cnpj = v;
        }
        // Opcionais: string vazia no patch limpa o campo (normalize_optional)
        if self.email.is_some() {
            draft.email = self.email;
        }
        if self.phone.is_some() {
            draft.phone = self.phone;
        }
        if self.responsible.is_some() {
            draft.responsible = self.responsible;
        }
        if self.cnae.is_some() {
            draft.cnae = self.cnae;
        }
        if self.address.is_some() {
            draft.address = self.address;
        }
        if self.notes.is_some() {
            draft.notes = self.notes;
        }
    }
}
