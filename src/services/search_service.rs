// src/services/search_service.rs

use serde::Serialize;
use uuid::Uuid;

use crate::{
    models::company::Company,
    services::{
        company_service::CompanyService,
        employee_service::{EmployeeService, EmployeeView},
    },
};

pub const MIN_QUERY_CHARS: usize = 3;
pub const MAX_HITS_PER_KIND: usize = 5;

#[derive(Debug, Default, Serialize)]
pub struct SearchResults {
    pub companies: Vec<Company>,
    pub employees: Vec<EmployeeView>,
}

#[derive(Clone)]
pub struct SearchService {
    companies: CompanyService,
    employees: EmployeeService,
}

impl SearchService {
    pub fn new(companies: CompanyService, employees: EmployeeService) -> Self {
        Self { companies, employees }
    }

    /// Consultas curtas demais não devolvem nada.
    pub fn search(&self, business_id: Uuid, query: &str) -> SearchResults {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_CHARS {
            return SearchResults::default();
        }

        let mut companies = self.companies.list(business_id, Some(query));
        companies.truncate(MAX_HITS_PER_KIND);
        let mut employees = self.employees.list(business_id, Some(query), None);
        employees.truncate(MAX_HITS_PER_KIND);

        SearchResults { companies, employees }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        common::error::AppError,
        db::{MemorySlotStorage, ScopedStores, SlotStorage},
        models::{company::CompanyDraft, employee::EmployeeDraft},
    };

    #[test]
    fn short_queries_and_hit_limit() -> Result<(), AppError> {
        let storage: Arc<dyn SlotStorage> = Arc::new(MemorySlotStorage::new());
        let companies = Arc::new(ScopedStores::new(storage.clone()));
        let company_service = CompanyService::new(companies.clone());
        let employee_service = EmployeeService::new(Arc::new(ScopedStores::new(storage)), companies);
        let business = Uuid::new_v4();

        let mut first = None;
        for i in 0..7 {
            let company = company_service.create(
                business,
                CompanyDraft {
                    name: format!("Metalúrgica {i}"),
                    cnpj: "11222333000181".into(),
                    ..Default::default()
                },
            )?;
            first.get_or_insert(company.id);
        }
        employee_service.create(
            business,
            EmployeeDraft {
                name: "João Metal".into(),
                cpf: "52998224725".into(),
                company_id: first.map(|id| id.to_string()),
                ..Default::default()
            },
        )?;

        let search = SearchService::new(company_service, employee_service);

        let hits = search.search(business, "metal");
        assert_eq!(hits.companies.len(), MAX_HITS_PER_KIND);
        assert_eq!(hits.companies[0].name, "Metalúrgica 6");
        assert_eq!(hits.employees.len(), 1);

        let none = search.search(business, " me ");
        assert!(none.companies.is_empty() && none.employees.is_empty());
        Ok(())
    }
}
