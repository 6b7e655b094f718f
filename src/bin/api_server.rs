// src/bin/api_server.rs

use anyhow::Context;
use banka_ledger::infra::config::{Config, StorageBackend};
use banka_ledger::infra::evm::{self, EvmClient, NetworkConfig};
use banka_ledger::transport;
use banka_ledger::{BankaService, LedgerStore, MemoryLedgerStore, PgLedgerStore};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // --- Store ---
    let store: Arc<dyn LedgerStore> = match config.storage {
        StorageBackend::Postgres => {
            tracing::info!(max_connections = config.db_max_connections, "connecting to Postgres");
            let store = PgLedgerStore::connect(config.database_url()?, config.db_max_connections)
                .await
                .context("failed to open the ledger database")?;
            Arc::new(store)
        }
        StorageBackend::Memory => {
            tracing::warn!("STORAGE=memory: ledger state is lost on restart");
            Arc::new(MemoryLedgerStore::new())
        }
    };

    // --- Chain gateway (optional) ---
    let chain = match config.web3_provider_url.as_deref() {
        Some(url) => {
            let client = EvmClient::new(url)?;
            match client.chain_id().await {
                Ok(id) if id != config.chain_id => tracing::warn!(
                    expected = config.chain_id,
                    reported = id,
                    "RPC endpoint reports a different chain id"
                ),
                Ok(id) => tracing::info!(chain_id = id, rpc = url, "chain gateway reachable"),
                Err(e) => tracing::warn!(error = %e, rpc = url, "chain gateway unreachable; continuing"),
            }
            Some(Arc::new(client))
        }
        None => {
            tracing::info!("WEB3_PROVIDER_URL is empty; chain gateway disabled");
            None
        }
    };

    let factory_address = evm::resolve_factory_address(&config);
    match &factory_address {
        Some(addr) => tracing::info!(factory = %addr, "event factory configured"),
        None => tracing::warn!("no event factory address; contract addresses derive from the zero address"),
    }

    let service = BankaService::new(store, factory_address, config.session_ttl_hours)?;
    let app_state = transport::http::AppState {
        service: Arc::new(service),
        chain,
        network: NetworkConfig::for_chain(config.chain_id, config.web3_provider_url.as_deref()),
    };

    // --- API Server ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let app = transport::http::create_router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", transport::http::ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, "API server listening (Swagger UI at /swagger-ui)");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown signal received");
        })
        .await?;

    tracing::info!("graceful shutdown complete");
    Ok(())
}
