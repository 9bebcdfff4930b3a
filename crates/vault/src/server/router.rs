//! Axum router construction.

use std::time::Duration;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer, trace::TraceLayer};

use super::{handlers, state::AppState};

/// Build the application [`Router`] with all routes and middleware attached.
pub fn build(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/sales", get(handlers::list_sales).post(handlers::create_sale))
        .route("/sales/count", get(handlers::count_sales))
        .route("/sales/migration", post(handlers::migrate_sales))
        .route(
            "/sales/:id",
            get(handlers::get_sale)
                .put(handlers::update_sale)
                .delete(handlers::delete_sale),
        )
        .route(
            "/sales-persons",
            get(handlers::list_sales_persons).post(handlers::create_sales_person),
        )
        .route("/sales-persons/:id", delete(handlers::delete_sales_person))
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CompressionLayer::new())
        .with_state(state)
}
