// src/db/pg_backend.rs

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use sqlx::{postgres::PgListener, PgPool};
use tokio::{sync::broadcast, task::JoinHandle};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::backend::{Backend, NewAccount, ProfileSubscription},
    models::{
        auth::Account,
        business::Business,
        permission::{Action, Module, PermissionGrant},
        profile::{ProfileChange, SystemRole, UserProfile},
        validation::{CertificateValidation, DocumentValidation, ValidationKind},
    },
};

const PROFILE_CHANNEL: &str = "profile_changes";
const FEED_CAPACITY: usize = 64;

// Payload do pg_notify disparado pelo trigger de profiles
#[derive(Debug, Deserialize)]
struct ProfileNotification {
    op: String,
    id: Uuid,
}

pub struct PgBackend {
    pool: PgPool,
    feed: broadcast::Sender<ProfileChange>,
    listener_task: JoinHandle<()>,
}

impl Drop for PgBackend {
    fn drop(&mut self) {
        self.listener_task.abort();
    }
}

fn map_unique_violation(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return match db_err.constraint() {
                Some("accounts_email_key") => AppError::EmailAlreadyExists,
                Some(constraint) => AppError::Backend(format!("registro duplicado ({constraint})")),
                None => AppError::Backend("registro duplicado".into()),
            };
        }
    }
    e.into()
}

impl PgBackend {
    /// Conecta o LISTEN do feed de perfis e devolve o backend pronto.
    pub async fn connect(pool: PgPool) -> Result<Self, AppError> {
        let mut listener = PgListener::connect_with(&pool).await?;
        listener.listen(PROFILE_CHANNEL).await?;

        let (feed, _) = broadcast::channel(FEED_CAPACITY);
        let listener_task = tokio::spawn(run_profile_listener(listener, pool.clone(), feed.clone()));

        Ok(Self {
            pool,
            feed,
            listener_task,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

// Converte NOTIFY em ProfileChange. UPDATE busca a linha nova; DELETE só leva o id.
async fn run_profile_listener(
    mut listener: PgListener,
    pool: PgPool,
    feed: broadcast::Sender<ProfileChange>,
) {
    loop {
        let notification = match listener.recv().await {
            Ok(n) => n,
            Err(e) => {
                // O PgListener reconecta sozinho na próxima chamada
                tracing::warn!("Falha no LISTEN {}: {}", PROFILE_CHANNEL, e);
                tokio::time::sleep(Duration::from_secs(1)).await;
                continue;
            }
        };

        let payload: ProfileNotification = match serde_json::from_str(notification.payload()) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("Notificação de perfil ilegível: {}", e);
                continue;
            }
        };

        let change = if payload.op == "DELETE" {
            ProfileChange::Deleted(payload.id)
        } else {
            match fetch_profile(&pool, payload.id).await {
                Ok(Some(profile)) => ProfileChange::Updated(profile),
                Ok(None) => ProfileChange::Deleted(payload.id),
                Err(e) => {
                    tracing::warn!("Falha ao recarregar o perfil {}: {}", payload.id, e);
                    continue;
                }
            }
        };

        let _ = feed.send(change);
    }
}

async fn fetch_profile(pool: &PgPool, id: Uuid) -> Result<Option<UserProfile>, sqlx::Error> {
    sqlx::query_as::<_, UserProfile>(
        "SELECT id, email, name, plan, approved, created_at FROM profiles WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

#[async_trait]
impl Backend for PgBackend {
    async fn create_account(&self, new: NewAccount) -> Result<Account, AppError> {
        // Conta, perfil e papel entram juntos ou não entram
        let mut tx = self.pool.begin().await?;

        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (id, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, password_hash, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.email)
        .bind(&new.password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_unique_violation)?;

        sqlx::query(
            r#"
            INSERT INTO profiles (id, email, name, plan, approved, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(account.id)
        .bind(&account.email)
        .bind(&new.name)
        .bind(&new.plan)
        .bind(new.admin)
        .bind(account.created_at)
        .execute(&mut *tx)
        .await?;

        if new.admin {
            sqlx::query("INSERT INTO user_roles (user_id, role) VALUES ($1, 'admin')")
                .bind(account.id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(account)
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT id, email, password_hash, created_at FROM accounts WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    async fn find_account(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT id, email, password_hash, created_at FROM accounts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    async fn get_profile(&self, id: Uuid) -> Result<Option<UserProfile>, AppError> {
        Ok(fetch_profile(&self.pool, id).await?)
    }

    async fn list_profiles(&self) -> Result<Vec<UserProfile>, AppError> {
        let profiles = sqlx::query_as::<_, UserProfile>(
            "SELECT id, email, name, plan, approved, created_at FROM profiles ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(profiles)
    }

    async fn set_approval(&self, id: Uuid, approved: bool) -> Result<Option<UserProfile>, AppError> {
        // O trigger profiles_notify publica a mudança
        let profile = sqlx::query_as::<_, UserProfile>(
            r#"
            UPDATE profiles SET approved = $2
            WHERE id = $1
            RETURNING id, email, name, plan, approved, created_at
            "#,
        )
        .bind(id)
        .bind(approved)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    async fn approve_all_pending(&self) -> Result<u64, AppError> {
        let result = sqlx::query("UPDATE profiles SET approved = true WHERE approved = false")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, AppError> {
        // ON DELETE CASCADE leva perfil, papéis, negócios próprios e concessões
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn system_role(&self, user_id: Uuid) -> Result<SystemRole, AppError> {
        let role: Option<String> = sqlx::query_scalar("SELECT role FROM user_roles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(match role.as_deref() {
            Some("admin") => SystemRole::Admin,
            _ => SystemRole::Member,
        })
    }

    async fn create_business(
        &self,
        owner_id: Uuid,
        name: &str,
        business_type: Option<&str>,
    ) -> Result<Business, AppError> {
        let business = sqlx::query_as::<_, Business>(
            r#"
            INSERT INTO businesses (id, owner_id, name, business_type)
            VALUES ($1, $2, $3, $4)
            RETURNING id, owner_id, name, business_type, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(name)
        .bind(business_type)
        .fetch_one(&self.pool)
        .await?;
        Ok(business)
    }

    async fn list_businesses(&self, user_id: Uuid) -> Result<Vec<Business>, AppError> {
        let businesses = sqlx::query_as::<_, Business>(
            r#"
            SELECT b.id, b.owner_id, b.name, b.business_type, b.created_at
            FROM businesses b
            WHERE b.owner_id = $1
               OR EXISTS (
                   SELECT 1 FROM permission_grants g
                   WHERE g.business_id = b.id AND g.user_id = $1
               )
            ORDER BY b.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(businesses)
    }

    async fn get_business(&self, id: Uuid) -> Result<Option<Business>, AppError> {
        let business = sqlx::query_as::<_, Business>(
            "SELECT id, owner_id, name, business_type, created_at FROM businesses WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(business)
    }

    async fn owned_businesses(&self, owner_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        let ids = sqlx::query_scalar::<_, Uuid>("SELECT id FROM businesses WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    async fn delete_business(&self, id: Uuid) -> Result<bool, AppError> {
        // ON DELETE CASCADE leva concessões e registros de validação
        let result = sqlx::query("DELETE FROM businesses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn load_grants(&self, user_id: Uuid, business_id: Uuid) -> Result<Vec<PermissionGrant>, AppError> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT module, action FROM permission_grants WHERE user_id = $1 AND business_id = $2",
        )
        .bind(user_id)
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        // Linhas com módulo/ação desconhecidos (versões antigas) são ignoradas
        let grants = rows
            .into_iter()
            .filter_map(|(module, action)| {
                match (module.parse::<Module>(), action.parse::<Action>()) {
                    (Ok(m), Ok(a)) => Some(PermissionGrant::new(m, a)),
                    _ => {
                        tracing::debug!("Concessão ignorada: {}:{}", module, action);
                        None
                    }
                }
            })
            .collect();
        Ok(grants)
    }

    async fn grant_all_permissions(&self, user_id: Uuid, business_id: Uuid) -> Result<(), AppError> {
        if self.get_business(business_id).await?.is_none() {
            return Err(AppError::NotFound);
        }

        let (modules, actions) = grant_columns();

        // Inserção em massa usando UNNEST
        sqlx::query(
            r#"
            INSERT INTO permission_grants (user_id, business_id, module, action)
            SELECT $1, $2, m, a FROM unnest($3::text[], $4::text[]) AS p(m, a)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(business_id)
        .bind(&modules)
        .bind(&actions)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn grant_full_access_all_businesses(&self, user_id: Uuid) -> Result<u64, AppError> {
        let (modules, actions) = grant_columns();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO permission_grants (user_id, business_id, module, action)
            SELECT $1, b.id, p.m, p.a
            FROM businesses b
            CROSS JOIN unnest($2::text[], $3::text[]) AS p(m, a)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(&modules)
        .bind(&actions)
        .execute(&mut *tx)
        .await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM businesses")
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(count.max(0) as u64)
    }

    async fn insert_document_validation(&self, record: &DocumentValidation) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO document_validations
                (id, business_id, document_name, document_type, issued_date, issuer, validation_code, is_valid)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.id)
        .bind(record.business_id)
        .bind(&record.document_name)
        .bind(&record.document_type)
        .bind(record.issued_date)
        .bind(&record.issuer)
        .bind(&record.validation_code)
        .bind(record.is_valid)
        .execute(&self.pool)
        .await
        .map_err(map_unique_violation)?;
        Ok(())
    }

    async fn find_document_validation(&self, code: &str) -> Result<Option<DocumentValidation>, AppError> {
        let record = sqlx::query_as::<_, DocumentValidation>(
            r#"
            SELECT id, business_id, document_name, document_type, issued_date, issuer,
                   validation_code, is_valid
            FROM document_validations
            WHERE validation_code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn insert_certificate_validation(&self, record: &CertificateValidation) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO certificate_validations
                (id, business_id, employee_name, nr_number, nr_title, exam_date, issue_date,
                 issuer_name, issuer_crea, issuer_cft_eletrotecnico, issuer_cft_mecanico,
                 validation_code, is_valid)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(record.id)
        .bind(record.business_id)
        .bind(&record.employee_name)
        .bind(&record.nr_number)
        .bind(&record.nr_title)
        .bind(record.exam_date)
        .bind(record.issue_date)
        .bind(&record.issuer_name)
        .bind(&record.issuer_crea)
        .bind(&record.issuer_cft_eletrotecnico)
        .bind(&record.issuer_cft_mecanico)
        .bind(&record.validation_code)
        .bind(record.is_valid)
        .execute(&self.pool)
        .await
        .map_err(map_unique_violation)?;
        Ok(())
    }

    async fn find_certificate_validation(
        &self,
        code: &str,
    ) -> Result<Option<CertificateValidation>, AppError> {
        let record = sqlx::query_as::<_, CertificateValidation>(
            r#"
            SELECT id, business_id, employee_name, nr_number, nr_title, exam_date, issue_date,
                   issuer_name, issuer_crea, issuer_cft_eletrotecnico, issuer_cft_mecanico,
                   validation_code, is_valid
            FROM certificate_validations
            WHERE validation_code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn invalidate_validation(
        &self,
        kind: ValidationKind,
        business_id: Uuid,
        code: &str,
    ) -> Result<bool, AppError> {
        let sql = match kind {
            ValidationKind::Documents => {
                "UPDATE document_validations SET is_valid = false WHERE business_id = $1 AND validation_code = $2"
            }
            ValidationKind::Certificates => {
                "UPDATE certificate_validations SET is_valid = false WHERE business_id = $1 AND validation_code = $2"
            }
        };

        let result = sqlx::query(sql)
            .bind(business_id)
            .bind(code)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    fn subscribe_profile(&self, profile_id: Uuid) -> ProfileSubscription {
        ProfileSubscription::new(profile_id, self.feed.subscribe())
    }
}

// Colunas paralelas (módulo, ação) com todas as combinações, para o UNNEST
fn grant_columns() -> (Vec<String>, Vec<String>) {
    PermissionGrant::all()
        .into_iter()
        .map(|g| (g.module.to_string(), g.action.to_string()))
        .unzip()
}
