// src/services/auth.rs

use std::{collections::HashSet, sync::Arc, time::Duration};

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::backend::{with_timeout, Backend, NewAccount},
    models::auth::{Account, Claims, MeResponse, RegisterUserPayload},
};

#[derive(Clone)]
pub struct AuthService {
    backend: Arc<dyn Backend>,
    jwt_secret: String,
    admin_emails: Arc<HashSet<String>>,
    bcrypt_cost: u32,
    timeout: Duration,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl AuthService {
    pub fn new(
        backend: Arc<dyn Backend>,
        jwt_secret: String,
        admin_emails: impl IntoIterator<Item = String>,
        timeout: Duration,
    ) -> Self {
        let admin_emails = admin_emails.into_iter().map(|e| normalize_email(&e)).collect();
        Self {
            backend,
            jwt_secret,
            admin_emails: Arc::new(admin_emails),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            timeout,
        }
    }

    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    pub async fn register_user(&self, payload: RegisterUserPayload) -> Result<String, AppError> {
        let email = normalize_email(&payload.email);

        if with_timeout(self.timeout, self.backend.find_account_by_email(&email))
            .await?
            .is_some()
        {
            return Err(AppError::EmailAlreadyExists);
        }

        // Hashing fora do runtime assíncrono
        let password = payload.password;
        let cost = self.bcrypt_cost;
        let password_hash = tokio::task::spawn_blocking(move || hash(&password, cost))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        let admin = self.admin_emails.contains(&email);
        let account = with_timeout(
            self.timeout,
            self.backend.create_account(NewAccount {
                email,
                password_hash,
                name: payload.name.filter(|n| !n.trim().is_empty()),
                plan: payload.plan,
                admin,
            }),
        )
        .await?;

        if admin {
            tracing::info!("Conta de administrador criada: {}", account.email);
        } else {
            tracing::info!("Nova conta aguardando aprovação: {}", account.email);
        }

        self.create_token(account.id)
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<String, AppError> {
        let account = with_timeout(
            self.timeout,
            self.backend.find_account_by_email(&normalize_email(email)),
        )
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        let password = password.to_owned();
        let password_hash = account.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        self.create_token(account.id)
    }

    /// Token expirado, adulterado ou de conta removida: `InvalidToken`.
    pub async fn validate_token(&self, token: &str) -> Result<Account, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        with_timeout(self.timeout, self.backend.find_account(token_data.claims.sub))
            .await?
            .ok_or(AppError::InvalidToken)
    }

    pub async fn me(&self, account: Account) -> Result<MeResponse, AppError> {
        let profile = with_timeout(self.timeout, self.backend.get_profile(account.id))
            .await?
            .ok_or(AppError::InvalidToken)?;
        let role = with_timeout(self.timeout, self.backend.system_role(account.id)).await?;

        Ok(MeResponse {
            access: profile.status(),
            account,
            profile,
            role,
        })
    }

    fn create_token(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(7);

        let claims = Claims {
            sub: user_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::MemoryBackend,
        models::profile::{ApprovalStatus, SystemRole},
    };

    fn service(backend: Arc<MemoryBackend>) -> AuthService {
        AuthService::new(
            backend,
            "segredo-de-teste".into(),
            ["Chefe@SST.com".to_string()],
            Duration::from_secs(1),
        )
        .with_bcrypt_cost(4) // bcrypt::MIN_COST is private in bcrypt 0.18
    }

    fn payload(email: &str) -> RegisterUserPayload {
        RegisterUserPayload {
            email: email.into(),
            password: "senha123".into(),
            name: Some("Ana".into()),
            plan: None,
        }
    }

    #[tokio::test]
    async fn register_then_login_with_any_case() -> Result<(), AppError> {
        let auth = service(Arc::new(MemoryBackend::new()));
        let token = auth.register_user(payload("Ana@Exemplo.com")).await?;

        let account = auth.validate_token(&token).await?;
        assert_eq!(account.email, "ana@exemplo.com");

        let again = auth.login_user("ANA@exemplo.com ", "senha123").await?;
        assert_eq!(auth.validate_token(&again).await?.id, account.id);
        Ok(())
    }

    #[tokio::test]
    async fn new_accounts_start_pending() -> Result<(), AppError> {
        let auth = service(Arc::new(MemoryBackend::new()));
        let token = auth.register_user(payload("ana@exemplo.com")).await?;

        let me = auth.me(auth.validate_token(&token).await?).await?;
        assert_eq!(me.access, ApprovalStatus::Pending);
        assert_eq!(me.role, SystemRole::Member);
        Ok(())
    }

    #[tokio::test]
    async fn listed_admin_emails_start_approved() -> Result<(), AppError> {
        let auth = service(Arc::new(MemoryBackend::new()));
        let token = auth.register_user(payload("chefe@sst.com")).await?;

        let me = auth.me(auth.validate_token(&token).await?).await?;
        assert_eq!(me.access, ApprovalStatus::Approved);
        assert_eq!(me.role, SystemRole::Admin);
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_email_and_bad_password() -> Result<(), AppError> {
        let auth = service(Arc::new(MemoryBackend::new()));
        auth.register_user(payload("ana@exemplo.com")).await?;

        let dup = auth.register_user(payload("ANA@exemplo.com")).await;
        assert!(matches!(dup, Err(AppError::EmailAlreadyExists)));

        let wrong = auth.login_user("ana@exemplo.com", "outra-senha").await;
        assert!(matches!(wrong, Err(AppError::InvalidCredentials)));

        let unknown = auth.login_user("ninguem@exemplo.com", "senha123").await;
        assert!(matches!(unknown, Err(AppError::InvalidCredentials)));
        Ok(())
    }

    #[tokio::test]
    async fn tampered_or_orphan_tokens_are_invalid() -> Result<(), AppError> {
        let backend = Arc::new(MemoryBackend::new());
        let auth = service(backend.clone());
        let token = auth.register_user(payload("ana@exemplo.com")).await?;

        let other = AuthService::new(backend.clone(), "outro".into(), Vec::<String>::new(), Duration::from_secs(1));
        assert!(matches!(other.validate_token(&token).await, Err(AppError::InvalidToken)));

        let id = auth.validate_token(&token).await?.id;
        backend.delete_user(id).await?;
        assert!(matches!(auth.validate_token(&token).await, Err(AppError::InvalidToken)));
        Ok(())
    }
}
