// src/services/backup_service.rs

//! Cópia de segurança das coleções locais de um negócio, em JSON.
//!
//! A importação passa cada registro pelas mesmas regras do formulário e grava
//! a forma canônica. Um registro inválido recusa o arquivo inteiro, e nada é
//! gravado pela metade: se a segunda coleção falha, a primeira volta ao que era.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::ScopedStores,
    models::{
        company::{Company, CompanyDraft},
        employee::{Employee, EmployeeDraft},
    },
    services::record_validator::{validate_company, validate_employee},
};

pub const BACKUP_VERSION: &str = "1.0";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackupData {
    #[serde(default)]
    pub companies: Vec<Company>,
    #[serde(default)]
    pub employees: Vec<Employee>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupFile {
    pub version: String,
    pub business_id: Uuid,
    pub exported_at: DateTime<Utc>,
    pub data: BackupData,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub companies: usize,
    pub employees: usize,
}

#[derive(Clone)]
pub struct BackupService {
    companies: Arc<ScopedStores<Company>>,
    employees: Arc<ScopedStores<Employee>>,
}

impl BackupService {
    pub fn new(companies: Arc<ScopedStores<Company>>, employees: Arc<ScopedStores<Employee>>) -> Self {
        Self { companies, employees }
    }

    pub fn export(&self, business_id: Uuid) -> BackupFile {
        BackupFile {
            version: BACKUP_VERSION.to_string(),
            business_id,
            exported_at: Utc::now(),
            data: BackupData {
                companies: self.companies.for_business(business_id).load(),
                employees: self.employees.for_business(business_id).load(),
            },
        }
    }

    /// Exige `version` e `data`. Registros cujo id já existe são ignorados;
    /// os novos entram no fim da coleção.
    pub fn import(&self, business_id: Uuid, raw: Value) -> Result<ImportSummary, AppError> {
        let version = raw.get("version").and_then(Value::as_str).filter(|v| !v.is_empty());
        let data = raw.get("data").filter(|d| d.is_object());
        let (Some(version), Some(data)) = (version, data) else {
            return Err(AppError::InvalidBackup("campos 'version' e 'data' são obrigatórios".into()));
        };

        let data: BackupData = serde_json::from_value(data.clone())
            .map_err(|e| AppError::InvalidBackup(e.to_string()))?;

        let company_store = self.companies.for_business(business_id);
        let employee_store = self.employees.for_business(business_id);

        let companies = canonical_companies(data.companies)?;
        let mut known = company_store.load();
        for company in &companies {
            if !known.iter().any(|c| c.id == company.id) {
                known.push(company.clone());
            }
        }
        let employees = canonical_employees(data.employees, &known)?;

        let before = company_store.snapshot()?;
        let added_companies = company_store.append_missing(companies)?;
        let added_employees = match employee_store.append_missing(employees) {
            Ok(added) => added,
            Err(e) => {
                if let Err(undo) = company_store.restore(before) {
                    tracing::error!("Falha ao desfazer a importação de empresas: {}", undo);
                }
                return Err(e.into());
            }
        };

        let summary = ImportSummary {
            companies: added_companies,
            employees: added_employees,
        };
        tracing::info!(
            "Backup {} importado no negócio {}: {} empresas, {} colaboradores",
            version,
            business_id,
            summary.companies,
            summary.employees
        );
        Ok(summary)
    }
}

fn canonical_companies(records: Vec<Company>) -> Result<Vec<Company>, AppError> {
    records
        .into_iter()
        .map(|mut company| {
            let draft = CompanyDraft::from(&company);
            validate_company(&draft).map_err(|e| {
                AppError::InvalidBackup(format!("empresa {}: {}", company.id, e))
            })?;
            draft.write_into(&mut company);
            Ok(company)
        })
        .collect()
}

/// `companies` é a coleção já mesclada (atual + importada).
fn canonical_employees(records: Vec<Employee>, companies: &[Company]) -> Result<Vec<Employee>, AppError> {
    records
        .into_iter()
        .map(|mut employee| {
            let draft = EmployeeDraft::from(&employee);
            validate_employee(&draft, companies).map_err(|e| {
                AppError::InvalidBackup(format!("colaborador {}: {}", employee.id, e))
            })?;
            let company_id = employee.company_id;
            draft.write_into(company_id, &mut employee);
            Ok(employee)
        })
        .collect()
}
