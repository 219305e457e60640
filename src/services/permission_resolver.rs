// src/services/permission_resolver.rs

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::Duration,
};

use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::backend::{with_timeout, Backend},
    models::{
        permission::{Action, Module, PermissionGrant},
        profile::SystemRole,
    },
};

/// Decisão pura, sem I/O. Admin de sistema ou dono do negócio podem tudo;
/// os demais só o que estiver concedido explicitamente (padrão: negar).
pub fn has_permission(
    role: SystemRole,
    is_owner: bool,
    grants: &HashSet<PermissionGrant>,
    module: Module,
    action: Action,
) -> bool {
    if role.is_admin() || is_owner {
        return true;
    }
    grants.contains(&PermissionGrant::new(module, action))
}

// Permissões de um usuário num negócio, carregadas uma vez e mantidas em cache
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPermissions {
    pub user_id: Uuid,
    pub business_id: Uuid,
    pub role: SystemRole,
    pub is_owner: bool,
    pub grants: HashSet<PermissionGrant>,
}

impl SessionPermissions {
    pub fn can(&self, module: Module, action: Action) -> bool {
        has_permission(self.role, self.is_owner, &self.grants, module, action)
    }

    /// Conjunto efetivo (admin/dono recebem todas as combinações).
    pub fn effective(&self) -> Vec<PermissionGrant> {
        PermissionGrant::all()
            .into_iter()
            .filter(|g| self.can(g.module, g.action))
            .collect()
    }
}

/// Cache por (usuário, negócio). Mudanças de concessão só aparecem depois de
/// `reload`; não há push para permissões.
pub struct PermissionCache {
    backend: Arc<dyn Backend>,
    timeout: Duration,
    entries: RwLock<HashMap<(Uuid, Uuid), Arc<SessionPermissions>>>,
}

impl PermissionCache {
    pub fn new(backend: Arc<dyn Backend>, timeout: Duration) -> Self {
        Self {
            backend,
            timeout,
            entries: RwLock::new(HashMap::new()),
        }
    }

    async fn fetch(&self, user_id: Uuid, business_id: Uuid) -> Result<SessionPermissions, AppError> {
        let business = with_timeout(self.timeout, self.backend.get_business(business_id))
            .await?
            .ok_or(AppError::NotFound)?;
        let role = with_timeout(self.timeout, self.backend.system_role(user_id)).await?;
        let grants = with_timeout(self.timeout, self.backend.load_grants(user_id, business_id)).await?;

        Ok(SessionPermissions {
            user_id,
            business_id,
            role,
            is_owner: business.owner_id == user_id,
            grants: grants.into_iter().collect(),
        })
    }

    pub async fn get_or_load(
        &self,
        user_id: Uuid,
        business_id: Uuid,
    ) -> Result<Arc<SessionPermissions>, AppError> {
        if let Some(cached) = self.entries.read().await.get(&(user_id, business_id)) {
            return Ok(cached.clone());
        }

        let loaded = Arc::new(self.fetch(user_id, business_id).await?);
        self.entries
            .write()
            .await
            .insert((user_id, business_id), loaded.clone());
        Ok(loaded)
    }

    /// Descarta a entrada e busca de novo no backend.
    pub async fn reload(
        &self,
        user_id: Uuid,
        business_id: Uuid,
    ) -> Result<Arc<SessionPermissions>, AppError> {
        self.entries.write().await.remove(&(user_id, business_id));
        self.get_or_load(user_id, business_id).await
    }

    pub async fn forget_user(&self, user_id: Uuid) {
        self.entries.write().await.retain(|(user, _), _| *user != user_id);
    }

    /// Descarta as entradas de todos os usuários naquele negócio.
    pub async fn forget_business(&self, business_id: Uuid) {
        self.entries
            .write()
            .await
            .retain(|(_, business), _| *business != business_id);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
