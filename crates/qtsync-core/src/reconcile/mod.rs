//! Balance reconciliation between source accounts and budget accounts.

mod engine;
pub mod money;

pub use engine::{
    AccountMapping, PlanEntry, ReconciliationPlan, SkipReason, SkippedEntry, SyncMode,
};
