//! Plan computation from fetched accounts and the account mapping.
//!
//! Pure: no network access and no persistence.

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::money;
use crate::accounts::SourceAccount;
use crate::ynab::BudgetAccount;

/// Source account id to destination account id, unique on source id.
///
/// Serialized as a flat JSON object; iteration order is sorted by source id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountMapping(BTreeMap<String, String>);

impl AccountMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `source` to `destination`, returning the previous destination.
    pub fn insert(
        &mut self,
        source: impl Into<String>,
        destination: impl Into<String>,
    ) -> Option<String> {
        self.0.insert(source.into(), destination.into())
    }

    pub fn remove(&mut self, source: &str) -> Option<String> {
        self.0.remove(source)
    }

    pub fn get(&self, source: &str) -> Option<&str> {
        self.0.get(source).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(s, d)| (s.as_str(), d.as_str()))
    }
}

impl<S: Into<String>, D: Into<String>> FromIterator<(S, D)> for AccountMapping {
    fn from_iter<I: IntoIterator<Item = (S, D)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(s, d)| (s.into(), d.into()))
                .collect(),
        )
    }
}

/// How a plan is applied to the destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Overwrite the destination balance with the source equity.
    Balance,
    /// Create one adjustment transaction for the difference.
    #[default]
    Transaction,
}

impl SyncMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Balance => "balance",
            Self::Transaction => "transaction",
        }
    }
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One mapped pair with both balances known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    pub source_id: String,
    pub source_kind: String,
    pub destination_id: String,
    pub destination_name: String,
    pub current_minor: i64,
    pub new_minor: i64,
    pub delta_minor: i64,
}

impl PlanEntry {
    pub fn current_balance(&self) -> Decimal {
        money::from_minor(self.current_minor)
    }

    pub fn new_balance(&self) -> Decimal {
        money::from_minor(self.new_minor)
    }

    pub fn delta(&self) -> Decimal {
        money::from_minor(self.delta_minor)
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.delta_minor == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    UnknownSource,
    MissingBalance,
    UnknownDestination,
    OutOfRange,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::UnknownSource => "source account not found",
            Self::MissingBalance => "source balance unavailable",
            Self::UnknownDestination => "destination account not found",
            Self::OutOfRange => "amount out of range",
        })
    }
}

/// A mapping entry left out of the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub source_id: String,
    pub destination_id: String,
    pub reason: SkipReason,
}

/// Ordered balance updates for one sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationPlan {
    pub entries: Vec<PlanEntry>,
    pub skipped: Vec<SkippedEntry>,
}

impl ReconciliationPlan {
    /// Compute the plan in mapping iteration order.
    ///
    /// Zero deltas are kept; see [`ReconciliationPlan::for_mode`].
    pub fn compute(
        sources: &[SourceAccount],
        destinations: &[BudgetAccount],
        mapping: &AccountMapping,
    ) -> Self {
        let mut plan = Self::default();

        for (source_id, destination_id) in mapping.iter() {
            let skip = |reason: SkipReason| {
                warn!(source_id, destination_id, %reason, "Skipping mapping entry");
                SkippedEntry {
                    source_id: source_id.to_string(),
                    destination_id: destination_id.to_string(),
                    reason,
                }
            };

            let Some(source) = sources.iter().find(|s| s.id() == source_id) else {
                plan.skipped.push(skip(SkipReason::UnknownSource));
                continue;
            };
            let Some(equity) = source.total_equity() else {
                plan.skipped.push(skip(SkipReason::MissingBalance));
                continue;
            };
            let Some(destination) = destinations.iter().find(|d| d.id == destination_id) else {
                plan.skipped.push(skip(SkipReason::UnknownDestination));
                continue;
            };

            let current_minor = destination.balance;
            let Some((new_minor, delta_minor)) = money::to_minor(equity)
                .and_then(|new| Some((new, new.checked_sub(current_minor)?)))
            else {
                plan.skipped.push(skip(SkipReason::OutOfRange));
                continue;
            };

            debug!(source_id, destination_id, current_minor, new_minor, delta_minor, "Planned update");
            plan.entries.push(PlanEntry {
                source_id: source_id.to_string(),
                source_kind: source.kind().to_string(),
                destination_id: destination_id.to_string(),
                destination_name: destination.name.clone(),
                current_minor,
                new_minor,
                delta_minor,
            });
        }

        plan
    }

    /// Restrict to the entries the mode writes: transaction mode drops
    /// zero deltas, balance mode keeps everything.
    pub fn for_mode(mut self, mode: SyncMode) -> Self {
        if mode == SyncMode::Transaction {
            self.entries.retain(|entry| !entry.is_zero());
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Net change across all entries, in minor units.
    pub fn total_delta_minor(&self) -> i64 {
        self.entries
            .iter()
            .fold(0i64, |acc, e| acc.saturating_add(e.delta_minor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questrade::{Account, AccountBalances, PerCurrencyBalance};

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn source(id: &str, equity: Option<&str>) -> SourceAccount {
        let balances = equity.map(|e| AccountBalances {
            per_currency_balances: Vec::new(),
            combined_balances: vec![PerCurrencyBalance {
                currency: "CAD".to_string(),
                total_equity: dec(e),
                ..PerCurrencyBalance::default()
            }],
        });
        SourceAccount::new(
            Account {
                kind: "TFSA".to_string(),
                number: id.to_string(),
                ..Account::default()
            },
            balances,
        )
    }

    fn destination(id: &str, balance: i64) -> BudgetAccount {
        BudgetAccount {
            id: id.to_string(),
            name: format!("Budget {id}"),
            balance,
            ..BudgetAccount::default()
        }
    }

    #[test]
    fn balance_mode_plans_absolute_balance() {
        let mapping: AccountMapping = [("A1", "D1")].into_iter().collect();
        let plan = ReconciliationPlan::compute(
            &[source("A1", Some("1000.00"))],
            &[destination("D1", 950_000)],
            &mapping,
        )
        .for_mode(SyncMode::Balance);

        assert_eq!(plan.entries.len(), 1);
        let entry = &plan.entries[0];
        assert_eq!(entry.current_balance(), dec("950.00"));
        assert_eq!(entry.new_balance(), dec("1000.00"));
        assert_eq!(entry.delta(), dec("50.00"));
        assert_eq!(entry.destination_name, "Budget D1");
        assert!(plan.skipped.is_empty());
    }

    #[test]
    fn transaction_mode_elides_zero_delta() {
        let mapping: AccountMapping = [("A1", "D1")].into_iter().collect();
        let full = ReconciliationPlan::compute(
            &[source("A1", Some("500.00"))],
            &[destination("D1", 500_000)],
            &mapping,
        );

        assert_eq!(full.entries.len(), 1);
        assert!(full.entries[0].is_zero());
        assert!(full.clone().for_mode(SyncMode::Transaction).is_empty());
        assert_eq!(full.for_mode(SyncMode::Balance).entries.len(), 1);
    }

    #[test]
    fn unknown_and_unbalanced_entries_are_skipped_and_counted() {
        let mapping: AccountMapping = [
            ("A1", "D1"),
            ("A2", "D2"),
            ("GONE", "D1"),
            ("A3", "MISSING"),
            ("A4", "D3"),
        ]
        .into_iter()
        .collect();

        let plan = ReconciliationPlan::compute(
            &[
                source("A1", Some("10.00")),
                source("A2", None),
                source("A3", Some("30.00")),
                source("A4", Some("1.00")),
            ],
            &[
                destination("D1", 0),
                destination("D2", 0),
                destination("D3", i64::MIN),
            ],
            &mapping,
        );

        assert_eq!(plan.entries.len(), 1);
        assert_eq!(plan.entries[0].source_id, "A1");

        let reasons: Vec<_> = plan
            .skipped
            .iter()
            .map(|s| (s.source_id.as_str(), s.reason))
            .collect();
        assert_eq!(
            reasons,
            [
                ("A2", SkipReason::MissingBalance),
                ("A3", SkipReason::UnknownDestination),
                ("A4", SkipReason::OutOfRange),
                ("GONE", SkipReason::UnknownSource),
            ]
        );
    }

    #[test]
    fn sub_minor_equity_is_rounded_half_even() {
        let mapping: AccountMapping = [("A1", "D1")].into_iter().collect();
        let plan = ReconciliationPlan::compute(
            &[source("A1", Some("100.0005"))],
            &[destination("D1", 0)],
            &mapping,
        );
        assert_eq!(plan.entries[0].new_minor, 100_000);
    }

    #[test]
    fn replanning_after_apply_is_idempotent() {
        let mapping: AccountMapping = [("A1", "D1"), ("A2", "D2")].into_iter().collect();
        let sources = [source("A1", Some("1234.5678")), source("A2", Some("-20.01"))];
        let mut destinations = vec![destination("D1", 1_000_000), destination("D2", 5)];

        let plan = ReconciliationPlan::compute(&sources, &destinations, &mapping);
        for entry in &plan.entries {
            let dest = destinations
                .iter_mut()
                .find(|d| d.id == entry.destination_id)
                .unwrap();
            dest.balance += entry.delta_minor;
        }

        let again = ReconciliationPlan::compute(&sources, &destinations, &mapping);
        assert!(again.entries.iter().all(PlanEntry::is_zero));
        assert!(again.for_mode(SyncMode::Transaction).is_empty());
    }

    #[test]
    fn mapping_serializes_flat() {
        let mapping: AccountMapping = [("51234567", "ynab-1")].into_iter().collect();
        assert_eq!(
            serde_json::to_string(&mapping).unwrap(),
            r#"{"51234567":"ynab-1"}"#
        );
    }
}
