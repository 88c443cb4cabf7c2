//! HTTP Handlers for client installations
//!
//! Every action runs the same admission sequence: daily quota, uuid shape,
//! usage telemetry. Only then are barcode and name looked at.

use crate::application::config::CatalogConfig;
use crate::application::ranking::NameRanking;
use crate::application::rate_limiter::RateLimiter;
use crate::application::telemetry::{CachedCount, Telemetry};
use crate::domain::repository::KvStore;
use crate::domain::value_objects::{Barcode, ClientUuid, OriginTag, ProductName};
use crate::error::{CatalogError, CatalogResult};
use crate::presentation::dto::{FoundNamesResponse, OkResponse, SubmitRequest};
use crate::presentation::extract::ClientRequest;
use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Redirect};
use platform::clock::Clock;
use platform::rate_limit::{FailureLockout, RequestClass};
use std::sync::Arc;

const CACHE_PRIVATE: &str = "private";

/// Shared state for catalog handlers
pub struct CatalogAppState<S>
where
    S: KvStore + Send + Sync + 'static,
{
    pub store: Arc<S>,
    pub config: Arc<CatalogConfig>,
    pub clock: Arc<dyn Clock>,
    pub barcode_count: Arc<CachedCount>,
    /// Moderator login lockouts, reported by the admin statistics
    pub login_lockout: Option<Arc<FailureLockout>>,
}

impl<S> Clone for CatalogAppState<S>
where
    S: KvStore + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            config: self.config.clone(),
            clock: self.clock.clone(),
            barcode_count: self.barcode_count.clone(),
            login_lockout: self.login_lockout.clone(),
        }
    }
}

impl<S> CatalogAppState<S>
where
    S: KvStore + Send + Sync + 'static,
{
    pub fn new(store: Arc<S>, config: CatalogConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            config: Arc::new(config),
            clock,
            barcode_count: Arc::new(CachedCount::default()),
            login_lockout: None,
        }
    }

    pub fn with_login_lockout(mut self, lockout: Arc<FailureLockout>) -> Self {
        self.login_lockout = Some(lockout);
        self
    }

    pub fn ranking(&self) -> NameRanking<S> {
        NameRanking::new(self.store.clone(), self.config.clone())
    }

    pub fn telemetry(&self) -> Telemetry<S> {
        Telemetry::new(
            self.store.clone(),
            self.config.clone(),
            self.barcode_count.clone(),
        )
    }

    fn rate_limiter(&self) -> RateLimiter<S> {
        RateLimiter::new(self.store.clone(), self.config.clone(), self.clock.clone())
    }

    /// Quota, uuid check, usage telemetry
    async fn admit(&self, request: &ClientRequest, class: RequestClass) -> CatalogResult<ClientUuid> {
        self.rate_limiter().enforce(&request.address, class).await?;
        let uuid = ClientUuid::parse(&request.uuid)?;
        self.telemetry().record_user(&uuid).await?;
        Ok(uuid)
    }
}

/// GET /
pub async fn home<S>(State(state): State<CatalogAppState<S>>) -> impl IntoResponse
where
    S: KvStore + Send + Sync + 'static,
{
    (
        [(header::CACHE_CONTROL, "public, max-age=3600")],
        Redirect::to(&state.config.home_redirect),
    )
}

/// GET /ping
pub async fn ping() -> impl IntoResponse {
    ([(header::CACHE_CONTROL, "public, max-age=60")], "pong")
}

/// GET /amount
pub async fn amount<S>(State(state): State<CatalogAppState<S>>) -> impl IntoResponse
where
    S: KvStore + Send + Sync + 'static,
{
    (
        [(header::CACHE_CONTROL, "public, max-age=1800")],
        state.barcode_count.get().to_string(),
    )
}

/// GET /get
pub async fn get_barcode<S>(
    State(state): State<CatalogAppState<S>>,
    request: ClientRequest,
) -> CatalogResult<impl IntoResponse>
where
    S: KvStore + Send + Sync + 'static,
{
    state.admit(&request, RequestClass::Read).await?;
    let barcode = Barcode::parse(&request.barcode)?;

    let names = state.ranking().lookup(&barcode, true).await?;

    Ok((
        [(header::CACHE_CONTROL, CACHE_PRIVATE)],
        Json(FoundNamesResponse::new(names)),
    ))
}

/// GET|POST /vote
pub async fn vote<S>(
    State(state): State<CatalogAppState<S>>,
    request: ClientRequest,
) -> CatalogResult<impl IntoResponse>
where
    S: KvStore + Send + Sync + 'static,
{
    state.admit(&request, RequestClass::Read).await?;
    let barcode = Barcode::parse(&request.barcode)?;
    let name = ProductName::parse(&request.name)?;

    // A repeated vote is answered like an accepted one
    state.ranking().vote(&request.address, &barcode, &name).await?;

    Ok((
        [(header::CACHE_CONTROL, CACHE_PRIVATE)],
        Json(OkResponse::default()),
    ))
}

/// GET|POST /report
pub async fn report<S>(
    State(state): State<CatalogAppState<S>>,
    request: ClientRequest,
) -> CatalogResult<impl IntoResponse>
where
    S: KvStore + Send + Sync + 'static,
{
    state.admit(&request, RequestClass::Read).await?;
    let barcode = Barcode::parse(&request.barcode)?;
    let name = ProductName::parse(&request.name)?;

    state.ranking().report(&request.address, &barcode, &name).await?;

    Ok((
        [(header::CACHE_CONTROL, CACHE_PRIVATE)],
        Json(OkResponse::default()),
    ))
}

/// POST /add
pub async fn submit<S>(
    State(state): State<CatalogAppState<S>>,
    request: ClientRequest,
    body: Bytes,
) -> CatalogResult<impl IntoResponse>
where
    S: KvStore + Send + Sync + 'static,
{
    let uuid = state.admit(&request, RequestClass::Upload).await?;

    let payload: SubmitRequest = serde_json::from_slice(&body)
        .map_err(|e| CatalogError::InvalidInput(format!("submission body: {e}")))?;
    let entries = payload
        .server_barcodes
        .ok_or_else(|| CatalogError::InvalidInput("missing ServerBarcodes".to_string()))?;

    let pairs: Vec<(String, String)> = entries
        .into_iter()
        .map(|entry| (entry.barcode, entry.name))
        .collect();
    state
        .ranking()
        .submit_bulk(pairs, &OriginTag::from(&uuid))
        .await?;

    Ok((
        [(header::CACHE_CONTROL, CACHE_PRIVATE)],
        Json(OkResponse::default()),
    ))
}
