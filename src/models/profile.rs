// src/models/profile.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// Perfil de acesso, separado da identidade (accounts). `approved = false`
// cobre tanto "pendente" quanto "revogado": para o usuário são idênticos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub plan: Option<String>,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApprovalStatus {
    Pending,
    Approved,
}

impl UserProfile {
    pub fn status(&self) -> ApprovalStatus {
        if self.approved {
            ApprovalStatus::Approved
        } else {
            ApprovalStatus::Pending
        }
    }
}

// Papel de sistema (tabela user_roles). Ausência de linha = Member.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemRole {
    Admin,
    #[default]
    Member,
}

impl SystemRole {
    pub fn is_admin(self) -> bool {
        matches!(self, SystemRole::Admin)
    }
}

/// Evento do feed em tempo real de um perfil.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileChange {
    Updated(UserProfile),
    Deleted(Uuid),
}

impl ProfileChange {
    pub fn profile_id(&self) -> Uuid {
        match self {
            ProfileChange::Updated(profile) => profile.id,
            ProfileChange::Deleted(id) => *id,
        }
    }
}
