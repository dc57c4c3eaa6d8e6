//! Grouped/aggregate queries over the transaction log.
//!
//! Every operation takes a resolved [`PartnerScope`] and a concrete
//! [`ReportWindow`] and pushes the aggregation down into SQLite — grouping
//! and counting happen in the database, never by post-filtering fetched
//! rows. All operations are read-only and re-query on every call.

use anyhow::{Context as _, Result};
use sqlx::SqlitePool;

use super::filter::PartnerScope;
use super::model::{Kpi, KpiEntry};
use super::window::ReportWindow;
use crate::storage::{format_ts, SUCCESS_STATUS};

/// Percentage of errors over total, rounded to two decimals.
/// An empty window (`total == 0`) is a 0.0 rate, not an error.
pub fn error_rate_percent(errors: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    ((errors as f64 / total as f64) * 100.0 * 100.0).round() / 100.0
}

/// KPI query layer. Borrows the shared pool; one short-lived pooled
/// connection per query, released when the query future completes.
pub struct KpiQueries {
    pool: SqlitePool,
}

impl KpiQueries {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Per-partner KPI: one result per distinct partner_id with transactions
    /// in the window, each carrying INBOUND / OUTBOUND / ERRORS counts in
    /// that fixed order (zero counts included). Partners without matching
    /// transactions produce no row at all.
    pub async fn partner_kpi(
        &self,
        scope: &PartnerScope,
        window: ReportWindow,
    ) -> Result<Vec<Kpi>> {
        let sql = format!(
            "SELECT partner_id,
                    SUM(CASE WHEN direction = 'INBOUND' THEN 1 ELSE 0 END) AS inbound,
                    SUM(CASE WHEN direction = 'OUTBOUND' THEN 1 ELSE 0 END) AS outbound,
                    SUM(CASE WHEN status <> {SUCCESS_STATUS} THEN 1 ELSE 0 END) AS errors
               FROM transactions
              WHERE created_at BETWEEN ? AND ?{scope_clause}
           GROUP BY partner_id
           ORDER BY partner_id ASC",
            scope_clause = scope.sql_clause(),
        );

        let query = sqlx::query_as::<_, (i64, i64, i64, i64)>(&sql)
            .bind(format_ts(window.start))
            .bind(format_ts(window.end));
        let rows = scope
            .bind(query)
            .fetch_all(&self.pool)
            .await
            .context("partner KPI query")?;

        Ok(rows
            .into_iter()
            .map(|(_partner_id, inbound, outbound, errors)| Kpi {
                data: vec![
                    KpiEntry::count("INBOUND", inbound),
                    KpiEntry::count("OUTBOUND", outbound),
                    KpiEntry::count("ERRORS", errors),
                ],
                period_start: window.start,
                period_end: window.end,
            })
            .collect())
    }

    /// Message counts grouped by direction. Only directions actually present
    /// in the window appear; nothing is zero-filled.
    pub async fn message_count(&self, scope: &PartnerScope, window: ReportWindow) -> Result<Kpi> {
        self.grouped_count("direction", scope, window)
            .await
            .context("message count KPI query")
    }

    /// Message counts grouped by message type, same omission rule as
    /// [`KpiQueries::message_count`].
    pub async fn message_type(&self, scope: &PartnerScope, window: ReportWindow) -> Result<Kpi> {
        self.grouped_count("message_type", scope, window)
            .await
            .context("message type KPI query")
    }

    async fn grouped_count(
        &self,
        column: &str,
        scope: &PartnerScope,
        window: ReportWindow,
    ) -> Result<Kpi> {
        let sql = format!(
            "SELECT {column}, COUNT(*) AS count
               FROM transactions
              WHERE created_at BETWEEN ? AND ?{scope_clause}
           GROUP BY {column}
           ORDER BY {column} ASC",
            scope_clause = scope.sql_clause(),
        );

        let query = sqlx::query_as::<_, (String, i64)>(&sql)
            .bind(format_ts(window.start))
            .bind(format_ts(window.end));
        let rows = scope.bind(query).fetch_all(&self.pool).await?;

        Ok(Kpi {
            data: rows
                .into_iter()
                .map(|(category, count)| KpiEntry::count(category, count))
                .collect(),
            period_start: window.start,
            period_end: window.end,
        })
    }

    /// Error rate over the window as a single `ERROR_RATE_%` category.
    ///
    /// `total` and `errors` are two independently-filtered aggregate queries,
    /// both carrying the identical scope and window — the error count is
    /// never derived by post-filtering the total's result set.
    pub async fn error_rate(&self, scope: &PartnerScope, window: ReportWindow) -> Result<Kpi> {
        let total_sql = format!(
            "SELECT COUNT(*) FROM transactions WHERE created_at BETWEEN ? AND ?{scope_clause}",
            scope_clause = scope.sql_clause(),
        );
        let errors_sql = format!(
            "SELECT COUNT(*) FROM transactions
              WHERE created_at BETWEEN ? AND ? AND status <> {SUCCESS_STATUS}{scope_clause}",
            scope_clause = scope.sql_clause(),
        );

        let total_query = sqlx::query_as::<_, (i64,)>(&total_sql)
            .bind(format_ts(window.start))
            .bind(format_ts(window.end));
        let (total,) = scope
            .bind(total_query)
            .fetch_one(&self.pool)
            .await
            .context("error rate total query")?;

        let errors_query = sqlx::query_as::<_, (i64,)>(&errors_sql)
            .bind(format_ts(window.start))
            .bind(format_ts(window.end));
        let (errors,) = scope
            .bind(errors_query)
            .fetch_one(&self.pool)
            .await
            .context("error rate errors query")?;

        Ok(Kpi {
            data: vec![KpiEntry::rate("ERROR_RATE_%", error_rate_percent(errors, total))],
            period_start: window.start,
            period_end: window.end,
        })
    }
}
