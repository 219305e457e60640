// src/models/permission.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

// Módulos de negócio (conjunto fechado)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Module {
    Exams,
    Companies,
    Employees,
    Doctors,
    Risks,
    Calendar,
    Reports,
    Validations,
    Certificates,
    Documents,
    Team,
    Permissions,
    Settings,
    Backup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    View,
    Create,
    Update,
    Delete,
    Manage,
}

impl Module {
    pub const ALL: [Module; 14] = [
        Module::Exams,
        Module::Companies,
        Module::Employees,
        Module::Doctors,
        Module::Risks,
        Module::Calendar,
        Module::Reports,
        Module::Validations,
        Module::Certificates,
        Module::Documents,
        Module::Team,
        Module::Permissions,
        Module::Settings,
        Module::Backup,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Module::Exams => "exams",
            Module::Companies => "companies",
            Module::Employees => "employees",
            Module::Doctors => "doctors",
            Module::Risks => "risks",
            Module::Calendar => "calendar",
            Module::Reports => "reports",
            Module::Validations => "validations",
            Module::Certificates => "certificates",
            Module::Documents => "documents",
            Module::Team => "team",
            Module::Permissions => "permissions",
            Module::Settings => "settings",
            Module::Backup => "backup",
        }
    }
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::View,
        Action::Create,
        Action::Update,
        Action::Delete,
        Action::Manage,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Manage => "manage",
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownValue(pub String);

impl fmt::Display for UnknownValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "valor desconhecido: {}", self.0)
    }
}

impl std::error::Error for UnknownValue {}

impl FromStr for Module {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Module::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownValue(s.to_string()))
    }
}

impl FromStr for Action {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| UnknownValue(s.to_string()))
    }
}

// Concessão explícita (usuário, negócio) -> (módulo, ação)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionGrant {
    pub module: Module,
    pub action: Action,
}

impl PermissionGrant {
    pub fn new(module: Module, action: Action) -> Self {
        Self { module, action }
    }

    /// Todas as combinações módulo × ação (usado no "conceder tudo").
    pub fn all() -> Vec<PermissionGrant> {
        Module::ALL
            .into_iter()
            .flat_map(|m| Action::ALL.into_iter().map(move |a| PermissionGrant::new(m, a)))
            .collect()
    }
}
