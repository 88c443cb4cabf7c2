//! Catalog Routers

use crate::domain::repository::KvStore;
use crate::presentation::admin;
use crate::presentation::handlers::{self, CatalogAppState};
use axum::{
    Router,
    routing::{get, post},
};

/// Public API used by client installations
pub fn catalog_router<S>(state: CatalogAppState<S>) -> Router
where
    S: KvStore + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(handlers::home::<S>))
        .route("/ping", get(handlers::ping))
        .route("/amount", get(handlers::amount::<S>))
        .route("/get", get(handlers::get_barcode::<S>))
        .route(
            "/vote",
            get(handlers::vote::<S>).post(handlers::vote::<S>),
        )
        .route(
            "/report",
            get(handlers::report::<S>).post(handlers::report::<S>),
        )
        .route("/add", post(handlers::submit::<S>))
        .with_state(state)
}

/// Moderator API; the caller mounts it behind session authentication
pub fn admin_router<S>(state: CatalogAppState<S>) -> Router
where
    S: KvStore + Send + Sync + 'static,
{
    Router::new()
        .route("/stats", get(admin::stats::<S>))
        .route("/reports", get(admin::list_reports::<S>))
        .route("/reports/{id}/remove", post(admin::remove_reported::<S>))
        .route("/reports/{id}/dismiss", post(admin::dismiss_report::<S>))
        .route("/top", get(admin::top_barcodes::<S>))
        .route("/export", get(admin::export::<S>))
        .with_state(state)
}
