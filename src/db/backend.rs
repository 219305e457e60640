// src/db/backend.rs

//! Contrato do serviço remoto (autenticação, perfis, papéis, negócios,
//! permissões, registros de validação e feed em tempo real de perfis).
//!
//! Os serviços recebem um `Arc<dyn Backend>` injetado; nunca há cliente
//! global. `PgBackend` fala com o Postgres, `MemoryBackend` roda em processo.

use std::{future::Future, time::Duration};

use async_trait::async_trait;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        auth::Account,
        business::Business,
        permission::PermissionGrant,
        profile::{ProfileChange, SystemRole, UserProfile},
        validation::{CertificateValidation, DocumentValidation, ValidationKind},
    },
};

// Dados de cadastro já com a senha em hash
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
    pub plan: Option<String>,
    /// Conta de administrador: recebe o papel admin e nasce aprovada.
    pub admin: bool,
}

#[async_trait]
pub trait Backend: Send + Sync {
    // --- Contas ---

    /// Cria a identidade e o perfil (pendente, salvo `admin`) numa única operação.
    async fn create_account(&self, account: NewAccount) -> Result<Account, AppError>;
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, AppError>;
    async fn find_account(&self, id: Uuid) -> Result<Option<Account>, AppError>;

    // --- Perfis ---

    async fn get_profile(&self, id: Uuid) -> Result<Option<UserProfile>, AppError>;
    /// Mais recentes primeiro.
    async fn list_profiles(&self) -> Result<Vec<UserProfile>, AppError>;
    /// `Ok(None)` se o perfil não existe.
    async fn set_approval(&self, id: Uuid, approved: bool) -> Result<Option<UserProfile>, AppError>;
    /// Aprova todos os pendentes; devolve quantos mudaram.
    async fn approve_all_pending(&self) -> Result<u64, AppError>;
    /// Remove conta, perfil, papéis, concessões e os negócios que o usuário possui.
    async fn delete_user(&self, id: Uuid) -> Result<bool, AppError>;

    // --- Papéis ---

    async fn system_role(&self, user_id: Uuid) -> Result<SystemRole, AppError>;

    // --- Negócios ---

    async fn create_business(
        &self,
        owner_id: Uuid,
        name: &str,
        business_type: Option<&str>,
    ) -> Result<Business, AppError>;
    /// Negócios do usuário: os que possui e os em que tem alguma concessão.
    async fn list_businesses(&self, user_id: Uuid) -> Result<Vec<Business>, AppError>;
    async fn get_business(&self, id: Uuid) -> Result<Option<Business>, AppError>;
    /// Ids dos negócios de que o usuário é dono.
    async fn owned_businesses(&self, owner_id: Uuid) -> Result<Vec<Uuid>, AppError>;
    /// Remove o negócio com suas concessões e registros de validação.
    async fn delete_business(&self, id: Uuid) -> Result<bool, AppError>;

    // --- Permissões ---

    async fn load_grants(&self, user_id: Uuid, business_id: Uuid) -> Result<Vec<PermissionGrant>, AppError>;
    async fn grant_all_permissions(&self, user_id: Uuid, business_id: Uuid) -> Result<(), AppError>;
    /// Concede tudo em todos os negócios existentes; devolve quantos negócios.
    async fn grant_full_access_all_businesses(&self, user_id: Uuid) -> Result<u64, AppError>;

    // --- Validações públicas ---

    async fn insert_document_validation(&self, record: &DocumentValidation) -> Result<(), AppError>;
    async fn find_document_validation(&self, code: &str) -> Result<Option<DocumentValidation>, AppError>;
    async fn insert_certificate_validation(&self, record: &CertificateValidation) -> Result<(), AppError>;
    async fn find_certificate_validation(
        &self,
        code: &str,
    ) -> Result<Option<CertificateValidation>, AppError>;
    /// Marca como inválido (só nesse sentido). `false` se o código não
    /// existe no negócio.
    async fn invalidate_validation(
        &self,
        kind: ValidationKind,
        business_id: Uuid,
        code: &str,
    ) -> Result<bool, AppError>;

    // --- Tempo real ---

    /// Assina as mudanças de um perfil. Soltar a assinatura cancela.
    fn subscribe_profile(&self, profile_id: Uuid) -> ProfileSubscription;
}

/// Assinatura do feed de perfis filtrada por um id.
pub struct ProfileSubscription {
    profile_id: Uuid,
    receiver: broadcast::Receiver<ProfileChange>,
}

impl ProfileSubscription {
    pub fn new(profile_id: Uuid, receiver: broadcast::Receiver<ProfileChange>) -> Self {
        Self { profile_id, receiver }
    }

    /// Próxima mudança deste perfil; `None` quando o feed foi encerrado.
    pub async fn next(&mut self) -> Option<ProfileChange> {
        loop {
            match self.receiver.recv().await {
                Ok(change) if change.profile_id() == self.profile_id => return Some(change),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Feed de perfis atrasado, {} eventos descartados", skipped);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Aplica o tempo limite configurado a uma chamada ao serviço remoto.
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| AppError::BackendTimeout)?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn slow_calls_time_out() {
        let result: Result<(), AppError> = with_timeout(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(AppError::BackendTimeout)));
    }

    #[tokio::test]
    async fn subscription_only_sees_its_profile() {
        let (tx, rx) = broadcast::channel(8);
        let mine = Uuid::new_v4();
        let mut sub = ProfileSubscription::new(mine, rx);

        tx.send(ProfileChange::Deleted(Uuid::new_v4())).expect("envia");
        tx.send(ProfileChange::Deleted(mine)).expect("envia");
        drop(tx);

        assert_eq!(sub.next().await, Some(ProfileChange::Deleted(mine)));
        assert_eq!(sub.next().await, None);
    }
}
