//! HTTP Handlers for the moderator
//!
//! Mounted behind the session middleware of the auth crate.

use crate::application::moderation::ModerationQueue;
use crate::domain::entities::{ProductRecord, ReportEntry, ReportId, Resolution, TopBarcode};
use crate::domain::repository::KvStore;
use crate::error::{CatalogError, CatalogResult};
use crate::presentation::dto::{ReportsResponse, StatsResponse};
use crate::presentation::handlers::CatalogAppState;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, header};
use axum::response::{IntoResponse, Response};

const CSV_MEDIA_TYPE: &str = "text/csv";

fn moderation<S>(state: &CatalogAppState<S>) -> ModerationQueue<S>
where
    S: KvStore + Send + Sync + 'static,
{
    ModerationQueue::new(state.store.clone(), state.config.clone())
}

fn parse_report_id(raw: &str) -> CatalogResult<ReportId> {
    ReportId::parse(raw).ok_or_else(|| CatalogError::InvalidInput("malformed report id".to_string()))
}

/// GET /admin/stats
pub async fn stats<S>(State(state): State<CatalogAppState<S>>) -> CatalogResult<Json<StatsResponse>>
where
    S: KvStore + Send + Sync + 'static,
{
    let totals = state.telemetry().totals().await?;
    let pending_reports = moderation(&state).list().await?.len();
    let blocked_addresses = state
        .login_lockout
        .as_ref()
        .map_or(0, |lockout| lockout.blocked_count());
    Ok(Json(StatsResponse {
        totals,
        pending_reports,
        blocked_addresses,
    }))
}

/// GET /admin/reports
pub async fn list_reports<S>(
    State(state): State<CatalogAppState<S>>,
) -> CatalogResult<Json<ReportsResponse>>
where
    S: KvStore + Send + Sync + 'static,
{
    let reports = moderation(&state).list().await?;
    Ok(Json(ReportsResponse { reports }))
}

/// POST /admin/reports/{id}/remove
pub async fn remove_reported<S>(
    State(state): State<CatalogAppState<S>>,
    Path(id): Path<String>,
) -> CatalogResult<Json<ReportEntry>>
where
    S: KvStore + Send + Sync + 'static,
{
    let id = parse_report_id(&id)?;
    let entry = moderation(&state).resolve(&id, Resolution::Remove).await?;
    Ok(Json(entry))
}

/// POST /admin/reports/{id}/dismiss
pub async fn dismiss_report<S>(
    State(state): State<CatalogAppState<S>>,
    Path(id): Path<String>,
) -> CatalogResult<Json<ReportEntry>>
where
    S: KvStore + Send + Sync + 'static,
{
    let id = parse_report_id(&id)?;
    let entry = moderation(&state).resolve(&id, Resolution::Dismiss).await?;
    Ok(Json(entry))
}

/// GET /admin/top
pub async fn top_barcodes<S>(
    State(state): State<CatalogAppState<S>>,
) -> CatalogResult<Json<Vec<TopBarcode>>>
where
    S: KvStore + Send + Sync + 'static,
{
    Ok(Json(state.telemetry().top_barcodes().await?))
}

/// GET /admin/export
///
/// JSON by default; `Accept: text/csv` gets one row per barcode, the
/// barcode followed by its visible names.
pub async fn export<S>(
    State(state): State<CatalogAppState<S>>,
    headers: HeaderMap,
) -> CatalogResult<Response>
where
    S: KvStore + Send + Sync + 'static,
{
    let records: Vec<ProductRecord> = state.telemetry().export().await?;
    tracing::info!(barcodes = records.len(), "Catalog exported");

    if wants_csv(&headers) {
        return Ok((
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"barcodes.csv\"",
                ),
            ],
            render_csv(&records),
        )
            .into_response());
    }

    Ok((
        [(
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"barcodes.json\"",
        )],
        Json(records),
    )
        .into_response())
}

fn wants_csv(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|media| media.split(';').next().is_some_and(|m| m.trim() == CSV_MEDIA_TYPE))
}

/// Header row, then `barcode,name,name,...` per record
fn render_csv(records: &[ProductRecord]) -> String {
    let mut out = String::from("barcode,names\r\n");
    for record in records {
        let row: Vec<String> = std::iter::once(record.barcode.as_str())
            .chain(record.names.iter().map(String::as_str))
            .map(csv_field)
            .collect();
        out.push_str(&row.join(","));
        out.push_str("\r\n");
    }
    out
}

fn csv_field(value: &str) -> String {
    let needs_quotes = value.starts_with(' ')
        || value.contains([',', '"', '\r', '\n']);
    if needs_quotes {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
