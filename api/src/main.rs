use std::sync::Arc;

use actix_web::{web, HttpServer};
use anyhow::Context;
use log::{info, warn};
use tokio_util::sync::CancellationToken;

use tw_api::{app::create_app, middleware::create_cors, AppState};
use tw_core::repositories::{IdentityDirectory, InMemoryTokenStore, TokenStore};
use tw_core::services::auth::AuthService;
use tw_core::services::token::{TokenCleanupConfig, TokenCleanupService, TokenService, TokenServiceConfig};
use tw_infra::{InMemoryIdentityDirectory, RedisClient, RedisTokenStore};
use tw_shared::{AppConfig, TokenStoreBackend};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().context("Invalid configuration")?;

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(config.logging.level.as_str()));

    info!("Starting TimeWise API Server ({})", config.environment);

    let store: Arc<dyn TokenStore> = match config.cache.backend {
        TokenStoreBackend::Memory => {
            if !config.environment.is_development() {
                warn!("Using the in-memory token store; revocations are not shared between instances");
            }
            Arc::new(InMemoryTokenStore::new())
        }
        TokenStoreBackend::Redis => {
            let client = RedisClient::new(&config.cache)
                .await
                .context("Failed to connect to Redis")?;
            if !client.health_check().await.context("Redis health check failed")? {
                anyhow::bail!("Redis health check returned an unexpected response");
            }
            info!("Using the Redis token store");
            Arc::new(RedisTokenStore::new(client))
        }
    };

    let directory: Arc<dyn IdentityDirectory> = match &config.auth.identity_seed_path {
        Some(path) => Arc::new(
            InMemoryIdentityDirectory::load(path)
                .with_context(|| format!("Failed to load identity seed {}", path.display()))?,
        ),
        None => {
            warn!("IDENTITY_SEED_PATH is not set; password grants will be rejected");
            Arc::new(InMemoryIdentityDirectory::new())
        }
    };

    let token_service = Arc::new(TokenService::new(
        Arc::clone(&store),
        TokenServiceConfig::from(&config.auth.jwt),
    )?);
    let auth_service = Arc::new(AuthService::new(token_service, directory));

    let cleanup = Arc::new(TokenCleanupService::new(
        store,
        TokenCleanupConfig::from(&config.auth.cleanup),
    ));
    let shutdown = CancellationToken::new();
    let cleanup_task = Arc::clone(&cleanup).start(shutdown.clone());

    let app_state = web::Data::new(AppState::new(auth_service, cleanup, config.cache.backend));

    let bind_address = config.server.bind_address();
    info!("Server will bind to: {}", bind_address);

    let server_config = config.server.clone();
    let environment = config.environment;
    let mut server = HttpServer::new(move || create_app(app_state.clone(), create_cors(&server_config, environment)));
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    let result = server.bind(&bind_address)?.run().await;

    // Stop the cleanup loop once the server has drained.
    shutdown.cancel();
    if let Some(task) = cleanup_task {
        if let Err(e) = task.await {
            warn!("Token cleanup task ended abnormally: {}", e);
        }
    }

    result.context("HTTP server error")
}
