// src/services/business_service.rs

use std::{sync::Arc, time::Duration};

use uuid::Uuid;

use crate::{
    common::{error::AppError, normalize::normalize_optional},
    db::{
        backend::{with_timeout, Backend},
        ScopedStores,
    },
    models::{
        business::{Business, CreateBusinessPayload},
        company::Company,
        employee::Employee,
    },
    services::permission_resolver::PermissionCache,
};

/// O que fica fora do backend para cada negócio: as coleções locais e as
/// permissões em cache. Some junto com o negócio.
#[derive(Clone)]
pub struct TenantData {
    companies: Arc<ScopedStores<Company>>,
    employees: Arc<ScopedStores<Employee>>,
    permissions: Arc<PermissionCache>,
}

impl TenantData {
    pub fn new(
        companies: Arc<ScopedStores<Company>>,
        employees: Arc<ScopedStores<Employee>>,
        permissions: Arc<PermissionCache>,
    ) -> Self {
        Self {
            companies,
            employees,
            permissions,
        }
    }

    pub async fn purge(&self, business_id: Uuid) -> Result<(), AppError> {
        self.permissions.forget_business(business_id).await;
        self.employees.remove_business(business_id)?;
        self.companies.remove_business(business_id)?;

        tracing::info!("Dados locais do negócio {} removidos", business_id);
        Ok(())
    }

    /// Tenta todos; devolve a primeira falha.
    pub async fn purge_all(&self, business_ids: &[Uuid]) -> Result<(), AppError> {
        let mut first_error = None;
        for &id in business_ids {
            if let Err(e) = self.purge(id).await {
                tracing::error!("Falha ao remover os dados locais do negócio {}: {}", id, e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

#[derive(Clone)]
pub struct BusinessService {
    backend: Arc<dyn Backend>,
    tenants: TenantData,
    timeout: Duration,
}

impl BusinessService {
    pub fn new(backend: Arc<dyn Backend>, tenants: TenantData, timeout: Duration) -> Self {
        Self {
            backend,
            tenants,
            timeout,
        }
    }

    /// O criador vira dono e, por isso, tem todas as permissões no negócio.
    pub async fn create(&self, owner_id: Uuid, payload: CreateBusinessPayload) -> Result<Business, AppError> {
        let business_type = normalize_optional(payload.business_type.as_deref());
        let business = with_timeout(
            self.timeout,
            self.backend
                .create_business(owner_id, payload.name.trim(), business_type.as_deref()),
        )
        .await?;

        tracing::info!("Negócio {} criado por {}", business.id, owner_id);
        Ok(business)
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<Business>, AppError> {
        with_timeout(self.timeout, self.backend.list_businesses(user_id)).await
    }

    /// Só o dono exclui. Leva concessões, validações, empresas e colaboradores.
    pub async fn delete(&self, actor_id: Uuid, business_id: Uuid) -> Result<(), AppError> {
        let business = with_timeout(self.timeout, self.backend.get_business(business_id))
            .await?
            .ok_or(AppError::NotFound)?;
        if business.owner_id != actor_id {
            tracing::debug!("Usuário {} tentou excluir o negócio {} sem ser dono", actor_id, business_id);
            return Err(AppError::NotOwner);
        }

        if !with_timeout(self.timeout, self.backend.delete_business(business_id)).await? {
            return Err(AppError::NotFound);
        }
        self.tenants.purge(business_id).await?;

        tracing::info!("Negócio {} excluído pelo dono {}", business_id, actor_id);
        Ok(())
    }
}
