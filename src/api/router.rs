use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;
use super::auth::require_auth;
use super::handlers;

pub fn create_router(state: AppState) -> Router {
    // Public routes: no authentication required
    let public = Router::new()
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::health::metrics))
        .route("/api/auth/signup", post(handlers::auth::signup))
        .route("/api/auth/login", post(handlers::auth::login));

    // Protected routes: require a Bearer JWT
    let protected = Router::new()
        // Trades, plus the legacy unprefixed mount older clients still call
        .merge(trade_routes("/api/trades"))
        .merge(trade_routes("/trades"))
        // Analytics
        .route("/api/analytics/summary", get(handlers::analytics::summary))
        .route("/api/analytics/charts", get(handlers::analytics::charts))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    public
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn trade_routes(prefix: &str) -> Router<AppState> {
    Router::new()
        .route(
            prefix,
            get(handlers::trades::list)
                .post(handlers::trades::create)
                .delete(handlers::trades::delete_all),
        )
        .route(&format!("{prefix}/table"), get(handlers::trades::table))
        .route(&format!("{prefix}/:id"), delete(handlers::trades::delete_one))
}
