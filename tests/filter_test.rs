//! Partner filter precedence and the scoped subquery lookups.

use chrono::Utc;
use edistat::kpi::{FilterError, KpiEntry, KpiQueries, PartnerFilter, PartnerScope, ReportWindow};
use edistat::storage::{Direction, NewTransaction, Storage};
use tempfile::TempDir;

fn filter(id: Option<i64>, name: Option<&str>, identifier: Option<&str>) -> PartnerFilter {
    PartnerFilter {
        partner_id: id,
        partner_name: name.map(str::to_string),
        partner_identifier: identifier.map(str::to_string),
    }
}

#[test]
fn two_or_more_filters_always_reject() {
    let combos = [
        filter(Some(1), Some("Acme"), None),
        filter(Some(1), None, Some("ACME-001")),
        filter(None, Some("Acme"), Some("ACME-001")),
        filter(Some(1), Some("Acme"), Some("ACME-001")),
    ];
    for combo in combos {
        assert_eq!(combo.resolve(), Err(FilterError::Ambiguous), "{combo:?}");
    }
}

#[test]
fn single_filter_or_none_resolves() {
    assert_eq!(filter(None, None, None).resolve(), Ok(PartnerScope::Any));
    assert!(filter(Some(3), None, None).resolve().is_ok());
    assert!(filter(None, Some("Acme"), None).resolve().is_ok());
    assert!(filter(None, None, Some("ACME-001")).resolve().is_ok());
}

async fn seeded() -> (TempDir, Storage, i64) {
    let dir = TempDir::new().unwrap();
    let storage = Storage::new(dir.path()).await.unwrap();
    storage.upsert_status_code(40, "ok").await.unwrap();

    let acme = storage.create_partner("Acme GmbH", "ACME-001").await.unwrap();
    let globex = storage.create_partner("Globex", "GLX-200").await.unwrap();
    for partner_id in [acme.id, acme.id, globex.id] {
        storage
            .record_transaction(&NewTransaction {
                reference_number: "REF".to_string(),
                content: String::new(),
                message_type: "ORDERS".to_string(),
                direction: Direction::Inbound,
                status: 40,
                error_message: None,
                partner_id,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
    }
    (dir, storage, acme.id)
}

#[tokio::test]
async fn name_scope_is_case_insensitive_substring() {
    let (_dir, storage, _) = seeded().await;
    let queries = KpiQueries::new(storage.pool());
    let window = ReportWindow::normalize(None, None);

    let scope = filter(None, Some("acme"), None).resolve().unwrap();
    let kpi = queries.message_count(&scope, window).await.unwrap();
    assert_eq!(kpi.data, vec![KpiEntry::count("INBOUND", 2)]);

    // Substring in the middle of the name matches too.
    let scope = filter(None, Some("cme Gm"), None).resolve().unwrap();
    let kpi = queries.message_count(&scope, window).await.unwrap();
    assert_eq!(kpi.data, vec![KpiEntry::count("INBOUND", 2)]);
}

#[tokio::test]
async fn identifier_scope_matches_exactly() {
    let (_dir, storage, _) = seeded().await;
    let queries = KpiQueries::new(storage.pool());
    let window = ReportWindow::normalize(None, None);

    let scope = filter(None, None, Some("GLX-200")).resolve().unwrap();
    let kpi = queries.message_count(&scope, window).await.unwrap();
    assert_eq!(kpi.data, vec![KpiEntry::count("INBOUND", 1)]);

    // A prefix of the identifier is not a match.
    let scope = filter(None, None, Some("GLX")).resolve().unwrap();
    let kpi = queries.message_count(&scope, window).await.unwrap();
    assert!(kpi.data.is_empty());
}

#[tokio::test]
async fn unknown_partner_id_yields_empty_results_not_an_error() {
    let (_dir, storage, _) = seeded().await;
    let queries = KpiQueries::new(storage.pool());

    let scope = filter(Some(999), None, None).resolve().unwrap();
    let kpis = queries
        .partner_kpi(&scope, ReportWindow::normalize(None, None))
        .await
        .unwrap();
    assert!(kpis.is_empty());
}

#[tokio::test]
async fn id_scope_constrains_every_operation_identically() {
    let (_dir, storage, acme_id) = seeded().await;
    let queries = KpiQueries::new(storage.pool());
    let window = ReportWindow::normalize(None, None);
    let scope = filter(Some(acme_id), None, None).resolve().unwrap();

    let kpis = queries.partner_kpi(&scope, window).await.unwrap();
    assert_eq!(kpis.len(), 1);

    let count = queries.message_count(&scope, window).await.unwrap();
    assert_eq!(count.data, vec![KpiEntry::count("INBOUND", 2)]);

    let types = queries.message_type(&scope, window).await.unwrap();
    assert_eq!(types.data, vec![KpiEntry::count("ORDERS", 2)]);
}
