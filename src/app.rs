use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, patch, post},
    Router,
};
use serde_json::{json, Value};
use sqlx::PgPool;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{Argon2Hasher, JwtKeys};
use crate::config::{AppConfig, SecurityConfig};
use crate::database::{PgRoleRepository, PgSchoolRepository, PgUserRepository};
use crate::handlers;
use crate::middleware::jwt_auth_middleware;
use crate::permissions::RolePermissions;
use crate::users::{BroadcastEventSink, UserService};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserService>,
    pub jwt: JwtKeys,
    pub events: BroadcastEventSink,
}

impl AppState {
    /// Wire the Postgres-backed services
    pub fn from_pool(pool: PgPool, config: &AppConfig) -> Self {
        let events = BroadcastEventSink::new(config.events.channel_capacity);
        let users = UserService::new(
            Arc::new(PgUserRepository::new(pool.clone())),
            Arc::new(PgSchoolRepository::new(pool.clone())),
            Arc::new(PgRoleRepository::new(pool)),
            Arc::new(RolePermissions),
            Arc::new(Argon2Hasher),
            Arc::new(events.clone()),
        );

        Self {
            users: Arc::new(users),
            jwt: JwtKeys::from_config(&config.security),
            events,
        }
    }
}

pub fn app(state: AppState, config: &AppConfig) -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_public_routes())
        // Protected
        .merge(protected_routes(state.clone()))
        // Global middleware
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(cors_layer(&config.security))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use handlers::auth;

    Router::new().route("/v1/auth/login", post(auth::login_post))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use handlers::{roles, users};

    Router::new()
        // Own profile
        .route("/v1/users/me", get(users::me_get))
        .route("/v1/users/me/update", patch(users::me_update))
        // User administration
        .route("/v1/users/all", get(users::list_get))
        .route("/v1/users/create", post(users::create_post))
        .route(
            "/v1/users/update",
            patch(users::update_patch).delete(users::remove_delete),
        )
        .route("/v1/users/update/role", patch(users::role_patch))
        .route("/v1/users/update/deactivate", patch(users::deactivate_patch))
        .route("/v1/users/update/reactivate", patch(users::reactivate_patch))
        .route("/v1/users/update/force", patch(users::force_patch))
        .route("/v1/users/events", get(users::events_get))
        .route("/v1/users/:user_id", get(users::user_get))
        // Roles
        .route("/v1/roles", get(roles::list_get))
        .route_layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }

    if security.cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::new()
            .allow_origin(AllowOrigin::any())
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Central Server",
            "version": version,
            "description": "School financial reporting - user and role management API",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth": "/v1/auth/login (public - token acquisition)",
                "users": "/v1/users/* (protected)",
                "roles": "/v1/roles (protected)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    health_report(crate::database::DatabaseManager::health_check().await)
}

fn health_report(
    check: Result<(), crate::database::DatabaseError>,
) -> (axum::http::StatusCode, axum::response::Json<Value>) {
    let now = chrono::Utc::now();

    match check {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            // Connection errors may carry hosts or credentials
            tracing::error!("Health check failed: {}", e);
            (
                axum::http::StatusCode::SERVICE_UNAVAILABLE,
                axum::response::Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "database": "unavailable"
                    }
                })),
            )
        }
    }
}
