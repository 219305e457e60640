// src/services/approval_service.rs

//! Fluxo de liberação de acesso: pendente -> aprovado <-> revogado.
//!
//! Revogado e pendente são o mesmo flag (`approved = false`). O papel de
//! admin não dispensa a aprovação, e ninguém revoga ou exclui o próprio perfil.

use std::{sync::Arc, time::Duration};

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::backend::{with_timeout, Backend},
    models::profile::{SystemRole, UserProfile},
    services::{business_service::TenantData, permission_resolver::PermissionCache},
};

/// Quem executa a ação administrativa.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: SystemRole,
    pub approved: bool,
}

impl Actor {
    pub fn new(profile: &UserProfile, role: SystemRole) -> Self {
        Self {
            id: profile.id,
            role,
            approved: profile.approved,
        }
    }
}

/// Acesso ao app: só com o flag de aprovação, para qualquer papel.
pub fn check_access(profile: &UserProfile) -> Result<(), AppError> {
    if profile.approved {
        Ok(())
    } else {
        Err(AppError::AccessPending)
    }
}

fn require_admin(actor: &Actor) -> Result<(), AppError> {
    if !actor.approved {
        return Err(AppError::AccessPending);
    }
    if !actor.role.is_admin() {
        return Err(AppError::NotAdmin);
    }
    Ok(())
}

// Auto-proteção vem antes de qualquer outra checagem
fn forbid_self(actor: &Actor, target_id: Uuid) -> Result<(), AppError> {
    if actor.id == target_id {
        tracing::debug!("Usuário {} tentou agir sobre o próprio perfil", actor.id);
        return Err(AppError::ActionNotPermitted);
    }
    Ok(())
}

#[derive(Clone)]
pub struct ApprovalService {
    backend: Arc<dyn Backend>,
    permissions: Arc<PermissionCache>,
    tenants: TenantData,
    timeout: Duration,
}

impl ApprovalService {
    pub fn new(
        backend: Arc<dyn Backend>,
        permissions: Arc<PermissionCache>,
        tenants: TenantData,
        timeout: Duration,
    ) -> Self {
        Self {
            backend,
            permissions,
            tenants,
            timeout,
        }
    }

    pub async fn list_profiles(&self, actor: &Actor) -> Result<Vec<UserProfile>, AppError> {
        require_admin(actor)?;
        with_timeout(self.timeout, self.backend.list_profiles()).await
    }

    pub async fn approve(&self, actor: &Actor, target_id: Uuid) -> Result<UserProfile, AppError> {
        require_admin(actor)?;

        let profile = with_timeout(self.timeout, self.backend.set_approval(target_id, true))
            .await?
            .ok_or(AppError::NotFound)?;

        tracing::info!("✅ Admin {} aprovou o usuário {}", actor.id, target_id);
        Ok(profile)
    }

    pub async fn revoke(&self, actor: &Actor, target_id: Uuid) -> Result<UserProfile, AppError> {
        forbid_self(actor, target_id)?;
        require_admin(actor)?;

        let profile = with_timeout(self.timeout, self.backend.set_approval(target_id, false))
            .await?
            .ok_or(AppError::NotFound)?;

        tracing::info!("Admin {} revogou o acesso do usuário {}", actor.id, target_id);
        Ok(profile)
    }

    pub async fn approve_all_pending(&self, actor: &Actor) -> Result<u64, AppError> {
        require_admin(actor)?;

        let count = with_timeout(self.timeout, self.backend.approve_all_pending()).await?;

        tracing::info!("✅ Admin {} aprovou {} usuários pendentes", actor.id, count);
        Ok(count)
    }

    /// Exclusão permanente. Os negócios do usuário vão junto: no backend e
    /// nas coleções locais de cada um.
    pub async fn delete_user(&self, actor: &Actor, target_id: Uuid) -> Result<(), AppError> {
        forbid_self(actor, target_id)?;
        require_admin(actor)?;

        let owned = with_timeout(self.timeout, self.backend.owned_businesses(target_id)).await?;
        let deleted = with_timeout(self.timeout, self.backend.delete_user(target_id)).await?;
        if !deleted {
            return Err(AppError::NotFound);
        }
        self.permissions.forget_user(target_id).await;
        self.tenants.purge_all(&owned).await?;

        tracing::info!(
            "Admin {} excluiu o usuário {} e {} negócios",
            actor.id,
            target_id,
            owned.len()
        );
        Ok(())
    }

    pub async fn grant_all_permissions(
        &self,
        actor: &Actor,
        target_id: Uuid,
        business_id: Uuid,
    ) -> Result<(), AppError> {
        require_admin(actor)?;
        self.ensure_profile(target_id).await?;

        with_timeout(
            self.timeout,
            self.backend.grant_all_permissions(target_id, business_id),
        )
        .await?;

        tracing::info!(
            "Admin {} concedeu todas as permissões do negócio {} ao usuário {}",
            actor.id,
            business_id,
            target_id
        );
        Ok(())
    }

    pub async fn grant_full_access(&self, actor: &Actor, target_id: Uuid) -> Result<u64, AppError> {
        require_admin(actor)?;
        self.ensure_profile(target_id).await?;

        let count = with_timeout(
            self.timeout,
            self.backend.grant_full_access_all_businesses(target_id),
        )
        .await?;

        tracing::info!(
            "Admin {} concedeu acesso total ao usuário {} em {} negócios",
            actor.id,
            target_id,
            count
        );
        Ok(count)
    }

    async fn ensure_profile(&self, id: Uuid) -> Result<UserProfile, AppError> {
        with_timeout(self.timeout, self.backend.get_profile(id))
            .await?
            .ok_or(AppError::NotFound)
    }
}
