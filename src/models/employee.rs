// src/models/employee.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::common::normalize::{format_cpf, format_phone, normalize_optional};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EmployeeStatus {
    #[default]
    Active,
    Inactive,
}

// Colaborador, sempre ligado a uma empresa (referência conferida só na validação)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub cpf: String,
    pub role: Option<String>,
    pub sector: Option<String>,
    pub admission_date: Option<NaiveDate>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub status: EmployeeStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

// `companyId` chega como texto: o formulário manda "" quando nada foi escolhido
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDraft {
    pub company_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cpf: String,
    pub role: Option<String>,
    pub sector: Option<String>,
    pub admission_date: Option<NaiveDate>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub status: EmployeeStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeePatch {
    pub company_id: Option<String>,
    pub name: Option<String>,
    pub cpf: Option<String>,
    pub role: Option<String>,
    pub sector: Option<String>,
    /// Ausente mantém; `null` apaga a data.
    #[serde(default, deserialize_with = "present")]
    pub admission_date: Option<Option<NaiveDate>>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: Option<EmployeeStatus>,
    pub notes: Option<String>,
}

// Distingue campo ausente (`None`) de `null` explícito (`Some(None)`)
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl EmployeeDraft {
    /// Empresa escolhida. Vazio ou id malformado conta como nenhuma.
    pub fn company_ref(&self) -> Option<Uuid> {
        self.company_id
            .as_deref()
            .and_then(|id| Uuid::parse_str(id.trim()).ok())
    }

    /// Só chamar depois da validação: sem empresa não há colaborador.
    pub fn into_employee(self, company_id: Uuid, id: Uuid, created_at: DateTime<Utc>) -> Employee {
        let mut employee = Employee {
            id,
            company_id,
            name: String::new(),
            cpf: String::new(),
            role: None,
            sector: None,
            admission_date: None,
            email: None,
            phone: None,
            status: EmployeeStatus::Active,
            notes: None,
            created_at,
        };
        self.write_into(company_id, &mut employee);
        employee
    }

    pub fn write_into(self, company_id: Uuid, employee: &mut Employee) {
        employee.company_id = company_id;
        employee.name = self.name.trim().to_string();
        employee.cpf = format_cpf(&self.cpf);
        employee.role = normalize_optional(self.role.as_deref());
        employee.sector = normalize_optional(self.sector.as_deref());
        employee.admission_date = self.admission_date;
        employee.email = normalize_optional(self.email.as_deref());
        employee.phone = normalize_optional(self.phone.as_deref()).map(|p| format_phone(&p));
        employee.status = self.status;
        employee.notes = normalize_optional(self.notes.as_deref());
    }
}

impl From<&Employee> for EmployeeDraft {
    fn from(e: &Employee) -> Self {
        Self {
            company_id: Some(e.company_id.to_string()),
            name: e.name.clone(),
            cpf: e.cpf.clone(),
            role: e.role.clone(),
            sector: e.sector.clone(),
            admission_date: e.admission_date,
            email: e.email.clone(),
            phone: e.phone.clone(),
            status: e.status,
            notes: e.notes.clone(),
        }
    }
}

impl EmployeePatch {
    pub fn apply(self, draft: &mut EmployeeDraft) {
        if self.company_id.is_some() {
            draft.company_id = self.company_id;
        }
        if let Some(v) = self.name {
            draft.name = v;
        }
        if let Some(v) = self.cpf {
            draft.cpf = v;
        }
        if self.role.is_some() {
            draft.role = self.role;
        }
        if self.sector.is_some() {
            draft.sector = self.sector;
        }
        if let Some(v) = self.admission_date {
            draft.admission_date = v;
        }
        if self.email.is_some() {
            draft.email = self.email;
        }
        if self.phone.is_some() {
            draft.phone = self.phone;
        }
        if let Some(v) = self.status {
            draft.status = v;
        }
        if self.notes.is_some() {
            draft.notes = self.notes;
        }
    }
}
