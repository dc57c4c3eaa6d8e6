//! Partner filter resolution.
//!
//! Callers may scope a KPI request to one partner by id, by name substring,
//! or by exact external identifier — but never by more than one of those at
//! once. The filter triple resolves into a [`PartnerScope`] exactly once per
//! request; the scope is then applied mechanically to every aggregate query
//! that request issues.

use serde::Deserialize;
use sqlx::sqlite::SqliteArguments;
use sqlx::{query::QueryAs, Sqlite};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("at most one of partner_id, partner_name, partner_identifier may be set")]
    Ambiguous,
}

/// The raw filter triple as received from the caller.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartnerFilter {
    pub partner_id: Option<i64>,
    pub partner_name: Option<String>,
    pub partner_identifier: Option<String>,
}

/// A resolved, validated partner constraint on the transaction log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartnerScope {
    /// No partner constraint.
    Any,
    /// `transactions.partner_id` equals the given id. No existence check —
    /// an id matching no partner yields an empty result set, not an error.
    ById(i64),
    /// Partner name contains the given text, case-insensitive.
    ByName(String),
    /// Partner identifier equals the given code exactly.
    ByIdentifier(String),
}

impl PartnerFilter {
    /// Validate and resolve the triple. Empty strings and id 0 count as
    /// absent. More than one present value is a client error, detected
    /// before any query runs.
    pub fn resolve(&self) -> Result<PartnerScope, FilterError> {
        let id = self.partner_id.filter(|&id| id != 0);
        let name = self.partner_name.as_deref().filter(|s| !s.is_empty());
        let identifier = self.partner_identifier.as_deref().filter(|s| !s.is_empty());

        let present =
            usize::from(id.is_some()) + usize::from(name.is_some()) + usize::from(identifier.is_some());
        if present > 1 {
            return Err(FilterError::Ambiguous);
        }

        Ok(if let Some(id) = id {
            PartnerScope::ById(id)
        } else if let Some(name) = name {
            PartnerScope::ByName(name.to_string())
        } else if let Some(identifier) = identifier {
            PartnerScope::ByIdentifier(identifier.to_string())
        } else {
            PartnerScope::Any
        })
    }
}

impl PartnerScope {
    /// SQL fragment appended after the time-window condition of every
    /// aggregate query. Contains at most one `?` placeholder, bound by
    /// [`PartnerScope::bind`]. Name and identifier scopes go through a
    /// subquery on the partners table — a back-reference lookup, not a join.
    pub fn sql_clause(&self) -> &'static str {
        match self {
            PartnerScope::Any => "",
            PartnerScope::ById(_) => " AND partner_id = ?",
            PartnerScope::ByName(_) => {
                " AND partner_id IN (SELECT id FROM partners WHERE name LIKE '%' || ? || '%')"
            }
            PartnerScope::ByIdentifier(_) => {
                " AND partner_id IN (SELECT id FROM partners WHERE identifier = ?)"
            }
        }
    }

    /// Bind this scope's value onto `query`, matching the placeholder that
    /// [`PartnerScope::sql_clause`] contributed. Always call this on every
    /// query whose SQL included the clause — and only on those.
    pub fn bind<'q, O>(
        &'q self,
        query: QueryAs<'q, Sqlite, O, SqliteArguments<'q>>,
    ) -> QueryAs<'q, Sqlite, O, SqliteArguments<'q>> {
        match self {
            PartnerScope::Any => query,
            PartnerScope::ById(id) => query.bind(*id),
            PartnerScope::ByName(name) => query.bind(name.as_str()),
            PartnerScope::ByIdentifier(identifier) => query.bind(identifier.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(
        id: Option<i64>,
        name: Option<&str>,
        identifier: Option<&str>,
    ) -> PartnerFilter {
        PartnerFilter {
            partner_id: id,
            partner_name: name.map(str::to_string),
            partner_identifier: identifier.map(str::to_string),
        }
    }

    #[test]
    fn single_filters_resolve() {
        assert_eq!(filter(None, None, None).resolve(), Ok(PartnerScope::Any));
        assert_eq!(filter(Some(7), None, None).resolve(), Ok(PartnerScope::ById(7)));
        assert_eq!(
            filter(None, Some("Acme"), None).resolve(),
            Ok(PartnerScope::ByName("Acme".to_string()))
        );
        assert_eq!(
            filter(None, None, Some("ACME-001")).resolve(),
            Ok(PartnerScope::ByIdentifier("ACME-001".to_string()))
        );
    }

    #[test]
    fn every_pair_of_filters_is_ambiguous() {
        let pairs = [
            filter(Some(1), Some("Acme"), None),
            filter(Some(1), None, Some("ACME-001")),
            filter(None, Some("Acme"), Some("ACME-001")),
            filter(Some(1), Some("Acme"), Some("ACME-001")),
        ];
        for f in pairs {
            assert_eq!(f.resolve(), Err(FilterError::Ambiguous), "{f:?}");
        }
    }

    #[test]
    fn zero_id_and_empty_strings_count_as_absent() {
        assert_eq!(filter(Some(0), None, None).resolve(), Ok(PartnerScope::Any));
        assert_eq!(filter(Some(0), Some(""), Some("")).resolve(), Ok(PartnerScope::Any));
        // One real value plus empty placeholders is still unambiguous.
        assert_eq!(
            filter(Some(0), Some("Acme"), Some("")).resolve(),
            Ok(PartnerScope::ByName("Acme".to_string()))
        );
    }

    #[test]
    fn clauses_carry_one_placeholder_each() {
        assert_eq!(PartnerScope::Any.sql_clause(), "");
        for scope in [
            PartnerScope::ById(1),
            PartnerScope::ByName("a".to_string()),
            PartnerScope::ByIdentifier("a".to_string()),
        ] {
            assert_eq!(scope.sql_clause().matches('?').count(), 1);
            assert!(scope.sql_clause().starts_with(" AND "));
        }
    }
}
