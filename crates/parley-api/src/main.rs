use axum::{
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use parley_api::{
    config::Config,
    handlers::stream,
    middleware::logging,
    routes::{conversations, health, messages, preferences},
    state::AppState,
};
use parley_cache::{
    CacheBackend, EmbeddedThreadStateStore, MemoryThreadStateStore, RedisThreadStateStore,
    ThreadStateStore,
};
use parley_chat::ConversationOrchestrator;
use parley_context::ContextWindowPolicy;
use parley_agent::{GatewayRegistry, HttpRuntimeFactory};
use parley_persist::{ConversationStore, StoreClient};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        conversations::create_conversation,
        conversations::list_conversations,
        conversations::get_conversation,
        conversations::delete_conversation,
        conversations::update_title,
        messages::list_messages,
        preferences::get_preferences,
        preferences::save_preferences,
        stream::send_message_stream,
    ),
    components(schemas(
        health::HealthResponse,
        conversations::CreateConversationRequest,
        conversations::ConversationResponse,
        conversations::ListConversationsResponse,
        conversations::UpdateTitleRequest,
        conversations::UpdateTitleResponse,
        messages::MessageResponse,
        messages::MessageMetadataResponse,
        messages::ListMessagesResponse,
        preferences::SavePreferencesRequest,
        preferences::PreferencesResponse,
        stream::SendMessageRequest,
    )),
    tags(
        (name = "health", description = "Liveness"),
        (name = "conversations", description = "Conversation CRUD"),
        (name = "messages", description = "Message history and streaming sends"),
        (name = "preferences", description = "User preferences")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config =
        Config::load().map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    // Initialize logging
    init_logging(&config);

    tracing::info!("Starting Parley API server");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);

    // Persistence
    tracing::info!("Connecting to MongoDB");
    let store = StoreClient::builder()
        .mongodb_uri(&config.mongodb_uri)
        .database(&config.mongodb.database)
        .build()
        .await?;
    let store: Arc<dyn ConversationStore> = Arc::new(store);
    tracing::info!("MongoDB connected");

    // Thread-state cache backend
    let cache = build_cache(&config).await?;

    // Agent gateways
    let registry = GatewayRegistry::new(
        (&config.agent).into(),
        Arc::new(HttpRuntimeFactory::new(config.agent_api_key.clone())),
    )?;
    let registry = Arc::new(registry);

    // Warm up the default gateway; a failure here is retried lazily on the
    // first send, so the server still comes up
    if let Err(e) = registry.default_gateway().initialize().await {
        tracing::warn!("Agent gateway initialization deferred: {}", e);
    }

    // Orchestrator
    let orchestrator = Arc::new(ConversationOrchestrator::new(
        Arc::clone(&store),
        cache,
        registry,
        ContextWindowPolicy::default(),
        config.chat_limits(),
    ));

    // Create application state
    let state = AppState::new(config.clone(), orchestrator, store);

    // Build router
    let app = build_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);
    tracing::info!("API docs: http://{}/api/docs", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_cache(config: &Config) -> anyhow::Result<Arc<dyn ThreadStateStore>> {
    let cache: Arc<dyn ThreadStateStore> = match config.cache.backend {
        CacheBackend::Memory => {
            tracing::info!("Thread-state cache: in-process map");
            Arc::new(MemoryThreadStateStore::new())
        }
        CacheBackend::Redis => {
            let url = config
                .redis_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("REDIS_URL is required for the redis cache backend"))?;
            tracing::info!("Thread-state cache: redis");
            Arc::new(RedisThreadStateStore::connect(url).await?)
        }
        CacheBackend::Embedded => {
            tracing::info!("Thread-state cache: embedded in conversation records");
            Arc::new(EmbeddedThreadStateStore::new())
        }
    };
    Ok(cache)
}

fn build_router(state: AppState) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health
        .route("/health", get(health::health_check))
        // Conversations
        .route("/conversations", post(conversations::create_conversation))
        .route("/conversations", get(conversations::list_conversations))
        .route("/conversations/:conversation_id", get(conversations::get_conversation))
        .route("/conversations/:conversation_id", delete(conversations::delete_conversation))
        .route("/conversations/:conversation_id/title", patch(conversations::update_title))
        // Messages
        .route("/conversations/:conversation_id/messages", get(messages::list_messages))
        .route("/conversations/:conversation_id/messages", post(stream::send_message_stream))
        // Preferences
        .route("/preferences/:user_id", get(preferences::get_preferences))
        .route("/preferences/:user_id", put(preferences::save_preferences));

    // Build full router with middleware
    Router::new()
        .merge(SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", ApiDoc::openapi()))
        .merge(api_routes)
        .layer(middleware::from_fn(logging::log_request))
        .layer(TimeoutLayer::new(std::time::Duration::from_secs(300))) // 5 min for streaming
        .layer(CompressionLayer::new())
        .layer(build_cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    if config.cors.enabled {
        let mut cors = CorsLayer::new()
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::PATCH,
                axum::http::Method::PUT,
                axum::http::Method::DELETE,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers(Any);

        if config.cors.origins.iter().any(|o| o == "*") {
            cors = cors.allow_origin(Any);
        } else {
            for origin in &config.cors.origins {
                if let Ok(parsed_origin) = origin.parse::<axum::http::HeaderValue>() {
                    cors = cors.allow_origin(parsed_origin);
                }
            }
        }

        cors
    } else {
        CorsLayer::permissive()
    }
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}
