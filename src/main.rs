//src/main.rs

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use sst_hub::config::{AppState, Config};

#[tokio::main]
async fn main() {
    // Logger: RUST_LOG controla o nível (padrão: info)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // .expect() é bom aqui: se a configuração falhar, a aplicação não deve iniciar.
    let config = Config::from_env().expect("Configuração inválida.");
    let bind_addr = config.bind_addr;

    let app_state = AppState::new(config)
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // Faz o app rodar as migrações do SQLx na inicialização
    if let Some(pool) = &app_state.db_pool {
        sqlx::migrate!()
            .run(pool)
            .await
            .expect("Falha ao rodar as migrações do banco de dados.");

        tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");
    }

    let app = sst_hub::app(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(bind_addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", bind_addr);
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}
