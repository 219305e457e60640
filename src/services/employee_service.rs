// src/services/employee_service.rs

use std::{collections::HashMap, sync::Arc};

use serde::Serialize;
use uuid::Uuid;

use crate::{
    common::{error::AppError, normalize::digits_only},
    db::ScopedStores,
    models::{
        company::Company,
        employee::{Employee, EmployeeDraft, EmployeePatch},
    },
    services::record_validator::{validate_employee, RecordError},
};

// Nome exibido quando a empresa do colaborador não existe mais
pub const MISSING_COMPANY: &str = "—";

// Colaborador com o nome da empresa resolvido, para listagem
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeView {
    #[serde(flatten)]
    pub employee: Employee,
    pub company_name: String,
}

#[derive(Clone)]
pub struct EmployeeService {
    employees: Arc<ScopedStores<Employee>>,
    companies: Arc<ScopedStores<Company>>,
}

fn haystack(e: &Employee, company_name: &str) -> String {
    [
        Some(e.name.as_str()),
        Some(e.cpf.as_str()),
        Some(digits_only(&e.cpf).as_str()),
        e.role.as_deref(),
        e.sector.as_deref(),
        e.email.as_deref(),
        e.phone.as_deref(),
        Some(company_name),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" ")
}

impl EmployeeService {
    pub fn new(employees: Arc<ScopedStores<Employee>>, companies: Arc<ScopedStores<Company>>) -> Self {
        Self { employees, companies }
    }

    fn company_names(&self, business_id: Uuid) -> HashMap<Uuid, String> {
        self.companies
            .for_business(business_id)
            .load()
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect()
    }

    /// Busca inclui o nome da empresa; `company_id` filtra por empresa.
    pub fn list(
        &self,
        business_id: Uuid,
        query: Option<&str>,
        company_id: Option<Uuid>,
    ) -> Vec<EmployeeView> {
        let names = self.company_names(business_id);
        let name_of = |e: &Employee| {
            names
                .get(&e.company_id)
                .cloned()
                .unwrap_or_else(|| MISSING_COMPANY.to_string())
        };

        self.employees
            .for_business(business_id)
            .search_by(query.unwrap_or(""), |e| haystack(e, &name_of(e)))
            .into_iter()
            .filter(|e| company_id.is_none_or(|cid| e.company_id == cid))
            .map(|employee| EmployeeView {
                company_name: name_of(&employee),
                employee,
            })
            .collect()
    }

    pub fn get(&self, business_id: Uuid, id: Uuid) -> Result<Employee, AppError> {
        self.employees
            .for_business(business_id)
            .get(id)
            .ok_or(AppError::NotFound)
    }

    pub fn create(&self, business_id: Uuid, draft: EmployeeDraft) -> Result<Employee, AppError> {
        let companies = self.companies.for_business(business_id).load();
        if let Err(e) = validate_employee(&draft, &companies) {
            tracing::debug!("Colaborador rejeitado: {}", e);
            return Err(e.into());
        }
        let company_id = draft.company_ref().ok_or(RecordError::CompanyNotSelected)?;

        let employee = self
            .employees
            .for_business(business_id)
            .create_with(|id, created_at| draft.into_employee(company_id, id, created_at))?;

        tracing::debug!("Colaborador {} criado no negócio {}", employee.id, business_id);
        Ok(employee)
    }

    pub fn update(&self, business_id: Uuid, id: Uuid, patch: EmployeePatch) -> Result<Employee, AppError> {
        let store = self.employees.for_business(business_id);
        let current = store.get(id).ok_or(AppError::NotFound)?;

        let mut draft = EmployeeDraft::from(&current);
        patch.apply(&mut draft);

        let companies = self.companies.for_business(business_id).load();
        if let Err(e) = validate_employee(&draft, &companies) {
            tracing::debug!("Edição de colaborador rejeitada: {}", e);
            return Err(e.into());
        }
        let company_id = draft.company_ref().ok_or(RecordError::CompanyNotSelected)?;

        store
            .update(id, |employee| draft.write_into(company_id, employee))?
            .ok_or(AppError::NotFound)
    }

    pub fn delete(&self, business_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if !self.employees.for_business(business_id).delete(id)? {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    pub fn clear_all(&self, business_id: Uuid) -> Result<(), AppError> {
        self.employees.for_business(business_id).clear_all()?;
        tracing::info!("Colaboradores do negócio {} apagados", business_id);
        Ok(())
    }
}
