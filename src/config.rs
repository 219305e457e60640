// src/config.rs

use std::{env, net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{Backend, FileSlotStorage, MemoryBackend, PgBackend, ScopedStores, SlotStorage},
    services::{
        ApprovalService, AuthService, BackupService, BusinessService, CompanyService,
        EmployeeService, PermissionCache, SearchService, TenantData, ValidationService,
    },
};

// Configuração lida do ambiente (e do .env, se existir)
#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    /// Sem banco: backend em memória (modo local).
    pub database_url: Option<String>,
    pub data_dir: PathBuf,
    pub bind_addr: SocketAddr,
    pub public_base_url: String,
    pub backend_timeout: Duration,
    pub db_max_connections: u32,
    pub admin_emails: Vec<String>,
    pub bcrypt_cost: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let jwt_secret = var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let bind_addr: SocketAddr = var("BIND_ADDR")
            .unwrap_or_else(|| "0.0.0.0:3000".into())
            .parse()
            .context("BIND_ADDR inválido")?;

        let backend_timeout = match var("BACKEND_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(v.parse().context("BACKEND_TIMEOUT_SECS inválido")?),
            None => Duration::from_secs(10),
        };

        let db_max_connections: u32 = match var("DB_MAX_CONNECTIONS") {
            Some(v) => v.parse().context("DB_MAX_CONNECTIONS inválido")?,
            None => 5,
        };

        let bcrypt_cost: u32 = match var("BCRYPT_COST") {
            Some(v) => v.parse().context("BCRYPT_COST inválido")?,
            None => bcrypt::DEFAULT_COST,
        };

        let admin_emails: Vec<String> = var("ADMIN_EMAILS")
            .map(|v| {
                v.split(',')
                    .map(|e| e.trim().to_lowercase())
                    .filter(|e| !e.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            jwt_secret,
            database_url: var("DATABASE_URL"),
            data_dir: var("DATA_DIR").unwrap_or_else(|| "./data".into()).into(),
            bind_addr,
            public_base_url: var("PUBLIC_BASE_URL").unwrap_or_else(|| "http://localhost:3000".into()),
            backend_timeout,
            db_max_connections,
            admin_emails,
            bcrypt_cost,
        })
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db_pool: Option<PgPool>,
    pub backend: Arc<dyn Backend>,
    pub i18n_store: Arc<I18nStore>,
    pub permission_cache: Arc<PermissionCache>,
    pub auth_service: AuthService,
    pub business_service: BusinessService,
    pub approval_service: ApprovalService,
    pub company_service: CompanyService,
    pub employee_service: EmployeeService,
    pub validation_service: ValidationService,
    pub backup_service: BackupService,
    pub search_service: SearchService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let (backend, db_pool): (Arc<dyn Backend>, Option<PgPool>) = match &config.database_url {
            Some(database_url) => {
                // Conecta ao banco de dados, usando '?' para propagar erros
                let pool = PgPoolOptions::new()
                    .max_connections(config.db_max_connections)
                    .acquire_timeout(Duration::from_secs(3))
                    .connect(database_url)
                    .await?;
                tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

                let backend = PgBackend::connect(pool.clone())
                    .await
                    .map_err(|e| anyhow::anyhow!("Falha ao escutar o feed de perfis: {e}"))?;
                (Arc::new(backend), Some(pool))
            }
            None => {
                tracing::warn!("DATABASE_URL ausente: usando backend em memória (dados remotos não persistem)");
                (Arc::new(MemoryBackend::new()), None)
            }
        };

        let slots = FileSlotStorage::new(&config.data_dir)
            .with_context(|| format!("Falha ao preparar {}", config.data_dir.display()))?;
        tracing::info!("Dados locais em {}", config.data_dir.display());

        let mut state = Self::with_parts(config, backend, Arc::new(slots));
        state.db_pool = db_pool;
        Ok(state)
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_parts(config: Config, backend: Arc<dyn Backend>, slots: Arc<dyn SlotStorage>) -> Self {
        let timeout = config.backend_timeout;

        let companies = Arc::new(ScopedStores::new(slots.clone()));
        let employees = Arc::new(ScopedStores::new(slots));
        let permission_cache = Arc::new(PermissionCache::new(backend.clone(), timeout));
        let tenants = TenantData::new(companies.clone(), employees.clone(), permission_cache.clone());

        let auth_service = AuthService::new(
            backend.clone(),
            config.jwt_secret.clone(),
            config.admin_emails.clone(),
            timeout,
        )
        .with_bcrypt_cost(config.bcrypt_cost);
        let company_service = CompanyService::new(companies.clone());
        let employee_service = EmployeeService::new(employees.clone(), companies.clone());

        Self {
            db_pool: None,
            i18n_store: Arc::new(I18nStore::default()),
            business_service: BusinessService::new(backend.clone(), tenants.clone(), timeout),
            approval_service: ApprovalService::new(
                backend.clone(),
                permission_cache.clone(),
                tenants,
                timeout,
            ),
            validation_service: ValidationService::new(
                backend.clone(),
                timeout,
                config.public_base_url.clone(),
            ),
            backup_service: BackupService::new(companies, employees),
            search_service: SearchService::new(company_service.clone(), employee_service.clone()),
            company_service,
            employee_service,
            auth_service,
            permission_cache,
            backend,
            config: Arc::new(config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_for_local_mode() -> anyhow::Result<()> {
        let config = Config::from_lookup(lookup(&[("JWT_SECRET", "s3cr3t")]))?;

        assert_eq!(config.database_url, None);
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.public_base_url, "http://localhost:3000");
        assert_eq!(config.backend_timeout, Duration::from_secs(10));
        assert_eq!(config.db_max_connections, 5);
        assert!(config.admin_emails.is_empty());
        Ok(())
    }

    #[test]
    fn reads_overrides() -> anyhow::Result<()> {
        let config = Config::from_lookup(lookup(&[
            ("JWT_SECRET", "s3cr3t"),
            ("DATABASE_URL", "postgres://localhost/sst"),
            ("BACKEND_TIMEOUT_SECS", "3"),
            ("ADMIN_EMAILS", " Chefe@SST.com, ,ops@sst.com"),
        ]))?;

        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/sst"));
        assert_eq!(config.backend_timeout, Duration::from_secs(3));
        assert_eq!(config.admin_emails, vec!["chefe@sst.com", "ops@sst.com"]);
        Ok(())
    }

    #[test]
    fn secret_is_required_and_numbers_are_checked() {
        assert!(Config::from_lookup(lookup(&[])).is_err());
        assert!(Config::from_lookup(lookup(&[("JWT_SECRET", "  ")])).is_err());
        assert!(Config::from_lookup(lookup(&[
            ("JWT_SECRET", "s"),
            ("BACKEND_TIMEOUT_SECS", "dez")
        ]))
        .is_err());
    }
}
