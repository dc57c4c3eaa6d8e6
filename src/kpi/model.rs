//! KPI result types — serialisable shapes returned by the KPI endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A category count. Integer for all counting categories; float only for
/// `ERROR_RATE_%`, whose "count" is a percentage rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KpiValue {
    Count(i64),
    Rate(f64),
}

/// One (category label, count) pair inside a KPI result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiEntry {
    pub category: String,
    pub count: KpiValue,
}

impl KpiEntry {
    pub fn count(category: impl Into<String>, count: i64) -> Self {
        Self {
            category: category.into(),
            count: KpiValue::Count(count),
        }
    }

    pub fn rate(category: impl Into<String>, rate: f64) -> Self {
        Self {
            category: category.into(),
            count: KpiValue::Rate(rate),
        }
    }
}

/// A named, time-windowed set of (category, count) pairs, carrying the
/// concrete window that was actually queried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kpi {
    pub data: Vec<KpiEntry>,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_serialize_as_bare_numbers() {
        let entry = KpiEntry::count("INBOUND", 3);
        assert_eq!(
            serde_json::to_string(&entry).unwrap(),
            r#"{"category":"INBOUND","count":3}"#
        );

        let entry = KpiEntry::rate("ERROR_RATE_%", 25.0);
        assert_eq!(
            serde_json::to_string(&entry).unwrap(),
            r#"{"category":"ERROR_RATE_%","count":25.0}"#
        );
    }

    #[test]
    fn untagged_count_roundtrip() {
        let kpi = Kpi {
            data: vec![KpiEntry::count("OUTBOUND", 1), KpiEntry::rate("ERROR_RATE_%", 0.0)],
            period_start: Utc::now(),
            period_end: Utc::now(),
        };
        let json = serde_json::to_string(&kpi).unwrap();
        let back: Kpi = serde_json::from_str(&json).unwrap();
        assert_eq!(back.data[0].count, KpiValue::Count(1));
        assert_eq!(back.data[1].count, KpiValue::Rate(0.0));
    }
}
