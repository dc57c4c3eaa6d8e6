//! KPI endpoint handlers.
//!
//! All four endpoints take the same query params: an optional partner filter
//! (`partner_id` | `partner_name` | `partner_identifier`, at most one) and
//! an optional `from`/`to` window (RFC 3339). The filter resolves once per
//! request; the resulting scope is passed into the aggregator unchanged for
//! every sub-query of that request.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

use crate::kpi::{Kpi, KpiQueries, PartnerFilter, ReportWindow};
use crate::rest::error::ApiError;
use crate::AppContext;

#[derive(Debug, Default, Deserialize)]
pub struct KpiParams {
    pub partner_id: Option<i64>,
    pub partner_name: Option<String>,
    pub partner_identifier: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl KpiParams {
    fn filter(&self) -> PartnerFilter {
        PartnerFilter {
            partner_id: self.partner_id,
            partner_name: self.partner_name.clone(),
            partner_identifier: self.partner_identifier.clone(),
        }
    }

    fn window(&self) -> ReportWindow {
        ReportWindow::normalize(self.from, self.to)
    }
}

/// `GET /api/kpi/partner` — one KPI result per partner active in the window.
pub async fn partner(
    State(ctx): State<Arc<AppContext>>,
    Query(params): Query<KpiParams>,
) -> Result<Json<Vec<Kpi>>, ApiError> {
    let scope = params.filter().resolve()?;
    let kpis = KpiQueries::new(ctx.storage.pool())
        .partner_kpi(&scope, params.window())
        .await?;
    Ok(Json(kpis))
}

/// `GET /api/kpi/message-count` — counts grouped by direction.
pub async fn message_count(
    State(ctx): State<Arc<AppContext>>,
    Query(params): Query<KpiParams>,
) -> Result<Json<Kpi>, ApiError> {
    let scope = params.filter().resolve()?;
    let kpi = KpiQueries::new(ctx.storage.pool())
        .message_count(&scope, params.window())
        .await?;
    Ok(Json(kpi))
}

/// `GET /api/kpi/message-type` — counts grouped by message type.
pub async fn message_type(
    State(ctx): State<Arc<AppContext>>,
    Query(params): Query<KpiParams>,
) -> Result<Json<Kpi>, ApiError> {
    let scope = params.filter().resolve()?;
    let kpi = KpiQueries::new(ctx.storage.pool())
        .message_type(&scope, params.window())
        .await?;
    Ok(Json(kpi))
}

/// `GET /api/kpi/error-rate` — single `ERROR_RATE_%` category.
pub async fn error_rate(
    State(ctx): State<Arc<AppContext>>,
    Query(params): Query<KpiParams>,
) -> Result<Json<Kpi>, ApiError> {
    let scope = params.filter().resolve()?;
    let kpi = KpiQueries::new(ctx.storage.pool())
        .error_rate(&scope, params.window())
        .await?;
    Ok(Json(kpi))
}
