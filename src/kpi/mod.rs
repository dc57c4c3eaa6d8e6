//! KPI aggregation layer.
//!
//! Turns the transaction log plus an optional partner filter into
//! time-windowed, grouped statistics:
//!
//! - per-partner inbound/outbound/error counts ([`KpiQueries::partner_kpi`])
//! - message counts grouped by direction ([`KpiQueries::message_count`])
//! - message counts grouped by message type ([`KpiQueries::message_type`])
//! - error rate as a percentage ([`KpiQueries::error_rate`])
//!
//! Each request resolves its partner filter exactly once into a
//! [`PartnerScope`], which is then threaded unchanged into every aggregate
//! query issued for that request, so sub-queries can never diverge in how
//! they are filtered.

pub mod aggregate;
pub mod filter;
pub mod model;
pub mod window;

pub use aggregate::{error_rate_percent, KpiQueries};
pub use filter::{FilterError, PartnerFilter, PartnerScope};
pub use model::{Kpi, KpiEntry, KpiValue};
pub use window::ReportWindow;
