//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{db::DbAdapter, quiz_llm::OpenAiQuizAdapter},
    config::Config,
    error::ApiError,
    web::{
        analytics::my_analytics_handler,
        auth::{login_handler, logout_handler, signup_handler},
        bookmarks::{my_bookmarks_handler, toggle_bookmark_handler},
        companions::{
            create_companion_handler, delete_companion_handler, get_companion_handler,
            list_companions_handler,
        },
        middleware::require_auth,
        quiz::{generate_quiz_handler, record_quiz_result_handler},
        rest::ApiDoc,
        sessions::{
            complete_session_handler, my_sessions_handler, my_streak_handler,
            recent_sessions_handler,
        },
        state::AppState,
    },
};
use async_openai::{config::OpenAIConfig, Client};
use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool.clone()));
    info!("Running database migrations...");
    db_adapter
        .run_migrations()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    let openai_config = OpenAIConfig::new().with_api_key(
        config
            .openai_api_key
            .as_ref()
            .ok_or_else(|| ApiError::Internal("OPENAI_API_KEY is required".to_string()))?,
    );
    let openai_client = Client::with_config(openai_config);

    let quiz_adapter = Arc::new(OpenAiQuizAdapter::new(
        openai_client.clone(),
        config.quiz_model.clone(),
    ));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        db: db_adapter,
        config: config.clone(),
        quiz_adapter,
    });

    let cors = CorsLayer::new()
        .allow_origin(
            config
                .cors_origin
                .parse::<HeaderValue>()
                .map_err(|e| ApiError::Internal(format!("Invalid CORS_ORIGIN: {}", e)))?,
        )
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route(
            "/companions",
            post(create_companion_handler).get(list_companions_handler),
        )
        .route(
            "/companions/{id}",
            get(get_companion_handler).delete(delete_companion_handler),
        )
        .route("/companions/{id}/sessions", post(complete_session_handler))
        .route("/companions/{id}/bookmark", put(toggle_bookmark_handler))
        .route("/sessions/recent", get(recent_sessions_handler))
        .route("/me/sessions", get(my_sessions_handler))
        .route("/me/streak", get(my_streak_handler))
        .route("/me/bookmarks", get(my_bookmarks_handler))
        .route("/me/analytics", get(my_analytics_handler))
        .route("/quiz/generate", post(generate_quiz_handler))
        .route("/quiz/results", post(record_quiz_result_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    // Combine API routes
    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
