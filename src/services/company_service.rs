// src/services/company_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::{error::AppError, normalize::digits_only},
    db::ScopedStores,
    models::company::{Company, CompanyDraft, CompanyPatch},
    services::record_validator::validate_company,
};

#[derive(Clone)]
pub struct CompanyService {
    companies: Arc<ScopedStores<Company>>,
}

// Campos pesquisáveis, concatenados (inclui o CNPJ só com dígitos)
fn haystack(c: &Company) -> String {
    [
        Some(c.name.as_str()),
        Some(c.cnpj.as_str()),
        Some(digits_only(&c.cnpj).as_str()),
        c.email.as_deref(),
        c.phone.as_deref(),
        c.responsible.as_deref(),
        c.cnae.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" ")
}

impl CompanyService {
    pub fn new(companies: Arc<ScopedStores<Company>>) -> Self {
        Self { companies }
    }

    /// Lista (mais novas primeiro), filtrando por `query` quando houver.
    pub fn list(&self, business_id: Uuid, query: Option<&str>) -> Vec<Company> {
        self.companies
            .for_business(business_id)
            .search_by(query.unwrap_or(""), haystack)
    }

    pub fn get(&self, business_id: Uuid, id: Uuid) -> Result<Company, AppError> {
        self.companies
            .for_business(business_id)
            .get(id)
            .ok_or(AppError::NotFound)
    }

    pub fn create(&self, business_id: Uuid, draft: CompanyDraft) -> Result<Company, AppError> {
        if let Err(e) = validate_company(&draft) {
            tracing::debug!("Empresa rejeitada: {}", e);
            return Err(e.into());
        }

        let company = self
            .companies
            .for_business(business_id)
            .create_with(|id, created_at| draft.into_company(id, created_at))?;

        tracing::debug!("Empresa {} criada no negócio {}", company.id, business_id);
        Ok(company)
    }

    /// Mescla o patch sobre o registro atual e valida o resultado como na criação.
    pub fn update(&self, business_id: Uuid, id: Uuid, patch: CompanyPatch) -> Result<Company, AppError> {
        let store = self.companies.for_business(business_id);
        let current = store.get(id).ok_or(AppError::NotFound)?;

        let mut draft = CompanyDraft::from(&current);
        patch.apply(&mut draft);

        if let Err(e) = validate_company(&draft) {
            tracing::debug!("Edição de empresa rejeitada: {}", e);
            return Err(e.into());
        }

        store
            .update(id, |company| draft.write_into(company))?
            .ok_or(AppError::NotFound)
    }

    /// Não remove colaboradores da empresa.
    pub fn delete(&self, business_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if !self.companies.for_business(business_id).delete(id)? {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    pub fn clear_all(&self, business_id: Uuid) -> Result<(), AppError> {
        self.companies.for_business(business_id).clear_all()?;
        tracing::info!("Empresas do negócio {} apagadas", business_id);
        Ok(())
    }
}
