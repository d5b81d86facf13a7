//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        db::PgStore,
        security::{ArgonHasher, JwtTokens},
    },
    config::Config,
    error::ApiError,
    web::{
        accounts::{follow_handler, profile_handler},
        auth::{
            login_handler, me_handler, my_bookmarks_handler, register_handler, update_me_handler,
        },
        comments::{
            create_comment_handler, delete_comment_handler, like_comment_handler,
            list_comments_handler, list_replies_handler, update_comment_handler,
        },
        content::{
            bookmark_content_handler, create_category_handler, create_content_handler,
            delete_content_handler, get_content_handler, like_content_handler,
            list_categories_handler, list_content_handler, update_content_handler,
        },
        middleware::require_auth,
        state::AppState,
        ApiDoc,
    },
};
use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use publishing_core::comments::CommentThread;
use publishing_core::identity::IdentityStore;
use publishing_core::lifecycle::ContentLifecycle;
use publishing_core::ports::ContentStore;
use publishing_core::query::QueryEngine;
use publishing_core::slug::SlugRegistry;
use publishing_core::social::SocialGraph;
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
    let store = PgStore::new(db_pool.clone());
    info!("Running database migrations...");
    store.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Build the Engine Components ---
    let store: Arc<dyn ContentStore> = Arc::new(store);
    let hasher = Arc::new(ArgonHasher);
    let tokens = Arc::new(JwtTokens::new(&config.token_secret, config.token_ttl_hours));

    let identity = IdentityStore::new(store.clone(), hasher, tokens);
    let slugs = SlugRegistry::new(store.clone());
    let lifecycle = ContentLifecycle::new(store.clone(), slugs);
    let social = SocialGraph::new(store.clone());
    let comments = CommentThread::new(store.clone());
    let query = QueryEngine::new(
        store.clone(),
        config.default_page_size,
        config.max_page_size,
    );

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        identity,
        lifecycle,
        social,
        comments,
        query,
        config: config.clone(),
    });

    let cors = CorsLayer::new()
        .allow_origin(
            config
                .allowed_origin
                .parse::<HeaderValue>()
                .map_err(|e| ApiError::Internal(format!("Invalid ALLOWED_ORIGIN: {}", e)))?,
        )
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
        .route("/auth/register", post(register_handler))
        .route("/auth/login", post(login_handler))
        .route("/accounts/{id}", get(profile_handler))
        .route("/content", get(list_content_handler))
        .route("/content/{key}", get(get_content_handler))
        .route("/categories", get(list_categories_handler))
        .route("/comments/content/{id}", get(list_comments_handler))
        .route("/comments/{id}/replies", get(list_replies_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/auth/me", get(me_handler).put(update_me_handler))
        .route("/auth/me/bookmarks", get(my_bookmarks_handler))
        .route("/accounts/{id}/follow", post(follow_handler))
        .route("/content", post(create_content_handler))
        .route(
            "/content/{id}",
            put(update_content_handler).delete(delete_content_handler),
        )
        .route("/content/{id}/like", post(like_content_handler))
        .route("/content/{id}/bookmark", post(bookmark_content_handler))
        .route("/categories", post(create_category_handler))
        .route("/comments", post(create_comment_handler))
        .route(
            "/comments/{id}",
            put(update_comment_handler).delete(delete_comment_handler),
        )
        .route("/comments/{id}/like", post(like_comment_handler))
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
