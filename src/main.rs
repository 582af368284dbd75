use nuanyang::api::{self, app_state::AppState};
use nuanyang::config::loader::ConfigLoader;
use nuanyang::index::{create_embedding_model, create_vector_index};
use nuanyang::language::{Language, LanguageResolver};
use nuanyang::llm::create_llm_manager;
use nuanyang::memory::{
    CacheStore, MemoryStore, RedisStore, create_semantic_memory, create_short_term_memory,
};
use nuanyang::observability::{ObservabilityState, create_observability_router};
use nuanyang::services::create_chat_service;
use nuanyang::storage::{SurrealConversationRepository, SurrealPool, SurrealUserRepository};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigLoader::load()?;
    ConfigLoader::validate(&config)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!("Starting Nuanyang...");
    info!("Configuration loaded successfully");

    let db_pool = SurrealPool::new(&config.database).await?;
    let db = db_pool.inner().await;
    let user_repository = Arc::new(SurrealUserRepository::new(db.clone()));
    let conversation_repository = Arc::new(SurrealConversationRepository::new(db));
    info!("Repositories initialized");

    // 短期记忆后端绝不能让启动失败：Redis 不可用时退化为进程内缓存
    let cache_store: Arc<dyn CacheStore> = match RedisStore::connect(&config.redis.url).await {
        Ok(store) => {
            info!("Redis connected: {}", config.redis.url);
            Arc::new(store)
        }
        Err(e) => {
            warn!("Redis 不可用，短期记忆退化为进程内缓存: {}", e);
            Arc::new(MemoryStore::new())
        }
    };
    let short_term = Arc::new(create_short_term_memory(cache_store, &config.redis));
    info!("Short-term memory initialized");

    let embedding_model = create_embedding_model(&config.embedding)?;
    let vector_index = create_vector_index(Some(&config.qdrant))?;
    let semantic = Arc::new(create_semantic_memory(vector_index, embedding_model));
    semantic.ensure_collections().await;
    info!("Semantic memory initialized (enabled: {})", semantic.enabled());

    let dispatcher = Arc::from(create_llm_manager(&config.llm)?);
    info!("Model dispatcher initialized");

    let default_language =
        Language::parse(&config.chat.default_language).unwrap_or(Language::Zh);
    let resolver = LanguageResolver::new(default_language);

    let chat_service = create_chat_service(
        resolver,
        user_repository,
        conversation_repository,
        short_term,
        semantic,
        dispatcher,
        config.chat.context_limit,
    );
    info!("Chat service initialized");

    let observability_state = Arc::new(ObservabilityState::new("0.1.0".to_string()));
    let app_state = AppState::new(chat_service, observability_state.metrics.clone());
    let api_router = api::create_router(app_state, &config.server.static_dir);
    let router = create_observability_router(observability_state).merge(api_router);
    info!("API router created");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, router).await?;

    Ok(())
}
