//! HTTP API server for the marketplace backend.
//!
//! Exposes the user directory, product catalog, and order ledger over REST,
//! with structured logging (tracing) and Prometheus metrics. Handlers stay
//! thin: field validation and pagination bounds live here, everything
//! cross-entity lives in the `domain` crate.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::Router;
use domain::{OrderLedger, ProductCatalog, UserDirectory, ViewComposer};
use metrics_exporter_prometheus::PrometheusHandle;
use store::MarketStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::Config;

/// Shared application state accessible from all handlers.
pub struct AppState<S: MarketStore> {
    pub directory: UserDirectory<S>,
    pub catalog: ProductCatalog<S>,
    pub ledger: OrderLedger<S>,
    pub composer: ViewComposer<S>,
}

/// Creates the application state with one service per concern, each over a
/// handle to the same store.
pub fn create_default_state<S: MarketStore + Clone>(store: S) -> Arc<AppState<S>> {
    Arc::new(AppState {
        directory: UserDirectory::new(store.clone()),
        catalog: ProductCatalog::new(store.clone()),
        ledger: OrderLedger::new(store.clone()),
        composer: ViewComposer::new(store),
    })
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: MarketStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    let api_v1 = Router::new()
        .route("/auth/register", post(routes::auth::register::<S>))
        .route("/auth/login", post(routes::auth::login::<S>))
        .route("/auth/me", get(routes::auth::me::<S>))
        .route("/users/profile", get(routes::users::profile::<S>))
        .route("/users/profile", put(routes::users::update_profile::<S>))
        .route("/users/{id}", get(routes::users::get::<S>))
        .route("/products", post(routes::products::create::<S>))
        .route("/products", get(routes::products::list::<S>))
        .route("/products/my-products", get(routes::products::my_products::<S>))
        .route("/products/{id}", get(routes::products::get::<S>))
        .route("/products/{id}", put(routes::products::update::<S>))
        .route("/products/{id}", delete(routes::products::remove::<S>))
        .route("/orders", post(routes::orders::create::<S>))
        .route("/orders", get(routes::orders::purchases::<S>))
        .route("/orders/sales", get(routes::orders::sales::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}", put(routes::orders::update::<S>));

    Router::new()
        .route("/health", get(routes::health::check))
        .nest("/api/v1", api_v1)
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
