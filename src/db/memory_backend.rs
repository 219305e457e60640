// src/db/memory_backend.rs

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::backend::{Backend, NewAccount, ProfileSubscription},
    models::{
        auth::Account,
        business::Business,
        permission::PermissionGrant,
        profile::{ProfileChange, SystemRole, UserProfile},
        validation::{CertificateValidation, DocumentValidation, ValidationKind},
    },
};

const FEED_CAPACITY: usize = 64;

#[derive(Default)]
struct State {
    accounts: Vec<Account>,
    profiles: Vec<UserProfile>,
    roles: HashMap<Uuid, SystemRole>,
    businesses: Vec<Business>,
    grants: HashMap<(Uuid, Uuid), HashSet<PermissionGrant>>,
    documents: Vec<DocumentValidation>,
    certificates: Vec<CertificateValidation>,
}

/// Backend em processo. Modo local (sem DATABASE_URL) e testes.
pub struct MemoryBackend {
    state: RwLock<State>,
    feed: broadcast::Sender<ProfileChange>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        let (feed, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            state: RwLock::new(State::default()),
            feed,
        }
    }

    fn publish(&self, change: ProfileChange) {
        // Sem assinantes o envio falha; não é erro
        let _ = self.feed.send(change);
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn create_account(&self, new: NewAccount) -> Result<Account, AppError> {
        let mut state = self.state.write().await;

        if state.accounts.iter().any(|a| a.email == new.email) {
            return Err(AppError::EmailAlreadyExists);
        }

        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            email: new.email.clone(),
            password_hash: new.password_hash,
            created_at: now,
        };

        state.profiles.push(UserProfile {
            id: account.id,
            email: new.email,
            name: new.name,
            plan: new.plan,
            approved: new.admin,
            created_at: now,
        });
        if new.admin {
            state.roles.insert(account.id, SystemRole::Admin);
        }
        state.accounts.push(account.clone());

        Ok(account)
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        let state = self.state.read().await;
        Ok(state.accounts.iter().find(|a| a.email == email).cloned())
    }

    async fn find_account(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        let state = self.state.read().await;
        Ok(state.accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn get_profile(&self, id: Uuid) -> Result<Option<UserProfile>, AppError> {
        let state = self.state.read().await;
        Ok(state.profiles.iter().find(|p| p.id == id).cloned())
    }

    async fn list_profiles(&self) -> Result<Vec<UserProfile>, AppError> {
        let state = self.state.read().await;
        let mut profiles = state.profiles.clone();
        profiles.reverse();
        profiles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(profiles)
    }

    async fn set_approval(&self, id: Uuid, approved: bool) -> Result<Option<UserProfile>, AppError> {
        let updated = {
            let mut state = self.state.write().await;
            let Some(profile) = state.profiles.iter_mut().find(|p| p.id == id) else {
                return Ok(None);
            };
            profile.approved = approved;
            profile.clone()
        };

        self.publish(ProfileChange::Updated(updated.clone()));
        Ok(Some(updated))
    }

    async fn approve_all_pending(&self) -> Result<u64, AppError> {
        let changed: Vec<UserProfile> = {
            let mut state = self.state.write().await;
            state
                .profiles
                .iter_mut()
                .filter(|p| !p.approved)
                .map(|p| {
                    p.approved = true;
                    p.clone()
                })
                .collect()
        };

        let count = changed.len() as u64;
        for profile in changed {
            self.publish(ProfileChange::Updated(profile));
        }
        Ok(count)
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, AppError> {
        {
            let mut state = self.state.write().await;
            if !state.profiles.iter().any(|p| p.id == id) {
                return Ok(false);
            }

            let owned: HashSet<Uuid> = state
                .businesses
                .iter()
                .filter(|b| b.owner_id == id)
                .map(|b| b.id)
                .collect();

            state.accounts.retain(|a| a.id != id);
            state.profiles.retain(|p| p.id != id);
            state.roles.remove(&id);
            state.businesses.retain(|b| !owned.contains(&b.id));
            state
                .grants
                .retain(|(user, business), _| *user != id && !owned.contains(business));
            state.documents.retain(|d| !owned.contains(&d.business_id));
            state.certificates.retain(|c| !owned.contains(&c.business_id));
        }

        self.publish(ProfileChange::Deleted(id));
        Ok(true)
    }

    async fn system_role(&self, user_id: Uuid) -> Result<SystemRole, AppError> {
        let state = self.state.read().await;
        Ok(state.roles.get(&user_id).copied().unwrap_or_default())
    }

    async fn create_business(
        &self,
        owner_id: Uuid,
        name: &str,
        business_type: Option<&str>,
    ) -> Result<Business, AppError> {
        let business = Business {
            id: Uuid::new_v4(),
            owner_id,
            name: name.to_string(),
            business_type: business_type.map(str::to_string),
            created_at: Utc::now(),
        };

        self.state.write().await.businesses.push(business.clone());
        Ok(business)
    }

    async fn list_businesses(&self, user_id: Uuid) -> Result<Vec<Business>, AppError> {
        let state = self.state.read().await;
        let mut businesses: Vec<Business> = state
            .businesses
            .iter()
            .filter(|b| {
                b.owner_id == user_id
                    || state
                        .grants
                        .get(&(user_id, b.id))
                        .is_some_and(|g| !g.is_empty())
            })
            .cloned()
            .collect();
        businesses.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(businesses)
    }

    async fn get_business(&self, id: Uuid) -> Result<Option<Business>, AppError> {
        let state = self.state.read().await;
        Ok(state.businesses.iter().find(|b| b.id == id).cloned())
    }

    async fn owned_businesses(&self, owner_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .businesses
            .iter()
            .filter(|b| b.owner_id == owner_id)
            .map(|b| b.id)
            .collect())
    }

    async fn delete_business(&self, id: Uuid) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        if !state.businesses.iter().any(|b| b.id == id) {
            return Ok(false);
        }

        state.businesses.retain(|b| b.id != id);
        state.grants.retain(|(_, business), _| *business != id);
        state.documents.retain(|d| d.business_id != id);
        state.certificates.retain(|c| c.business_id != id);
        Ok(true)
    }

    async fn load_grants(&self, user_id: Uuid, business_id: Uuid) -> Result<Vec<PermissionGrant>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .grants
            .get(&(user_id, business_id))
            .map(|g| g.iter().copied().collect())
            .unwrap_or_default())
    }

    async fn grant_all_permissions(&self, user_id: Uuid, business_id: Uuid) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        if !state.businesses.iter().any(|b| b.id == business_id) {
            return Err(AppError::NotFound);
        }

        state
            .grants
            .entry((user_id, business_id))
            .or_default()
            .extend(PermissionGrant::all());
        Ok(())
    }

    async fn grant_full_access_all_businesses(&self, user_id: Uuid) -> Result<u64, AppError> {
        let mut state = self.state.write().await;
        let ids: Vec<Uuid> = state.businesses.iter().map(|b| b.id).collect();

        for business_id in &ids {
            state
                .grants
                .entry((user_id, *business_id))
                .or_default()
                .extend(PermissionGrant::all());
        }
        Ok(ids.len() as u64)
    }

    async fn insert_document_validation(&self, record: &DocumentValidation) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        if state.documents.iter().any(|d| d.validation_code == record.validation_code) {
            return Err(AppError::Backend("código de validação duplicado".into()));
        }
        state.documents.push(record.clone());
        Ok(())
    }

    async fn find_document_validation(&self, code: &str) -> Result<Option<DocumentValidation>, AppError> {
        let state = self.state.read().await;
        Ok(state.documents.iter().find(|d| d.validation_code == code).cloned())
    }

    async fn insert_certificate_validation(&self, record: &CertificateValidation) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        if state.certificates.iter().any(|c| c.validation_code == record.validation_code) {
            return Err(AppError::Backend("código de validação duplicado".into()));
        }
        state.certificates.push(record.clone());
        Ok(())
    }

    async fn find_certificate_validation(
        &self,
        code: &str,
    ) -> Result<Option<CertificateValidation>, AppError> {
        let state = self.state.read().await;
        Ok(state.certificates.iter().find(|c| c.validation_code == code).cloned())
    }

    async fn invalidate_validation(
        &self,
        kind: ValidationKind,
        business_id: Uuid,
        code: &str,
    ) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        let flag = match kind {
            ValidationKind::Documents => state
                .documents
                .iter_mut()
                .find(|d| d.business_id == business_id && d.validation_code == code)
                .map(|d| &mut d.is_valid),
            ValidationKind::Certificates => state
                .certificates
                .iter_mut()
                .find(|c| c.business_id == business_id && c.validation_code == code)
                .map(|c| &mut c.is_valid),
        };

        match flag {
            Some(is_valid) => {
                *is_valid = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn subscribe_profile(&self, profile_id: Uuid) -> ProfileSubscription {
        ProfileSubscription::new(profile_id, self.feed.subscribe())
    }
}
