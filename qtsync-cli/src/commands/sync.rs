use std::sync::Arc;

use anyhow::{Result, bail};
use chrono::Local;
use colored::*;
use qtsync_core::reconcile::SyncMode;
use qtsync_core::sync::{SyncExecutor, prepare};

use super::{CommandContext, spinner};
use crate::output;
use crate::prompt;

/// Preview the plan, confirm, then apply it.
pub async fn run(ctx: &CommandContext, mode: SyncMode, dry_run: bool, yes: bool) -> Result<()> {
    let tokens = ctx.ensure_credential().await?;
    let mapping = ctx.store.load_mapping().await?;
    if mapping.is_empty() {
        bail!("The account mapping is empty; run `qtsync mapping set` first");
    }

    let fetcher = ctx.fetcher(&tokens);
    let budget = Arc::new(ctx.budget_client().await?);

    let pb = spinner("Fetching balances...");
    let prepared = prepare(&fetcher, budget.as_ref(), &mapping, mode).await;
    pb.finish_and_clear();
    let prepared = prepared?;

    output::print_plan(&prepared.plan, mode);

    if prepared.plan.is_empty() {
        output::success("Everything is already in sync");
        return Ok(());
    }
    if dry_run {
        println!("\n{}", "[DRY RUN] No changes were made".yellow());
        return Ok(());
    }
    if !yes && !prompt::confirm("Apply these changes to YNAB?")? {
        println!("Sync cancelled");
        return Ok(());
    }

    let executor = SyncExecutor::new(budget, &ctx.config);
    let report = executor
        .apply(&prepared.plan, mode, Local::now().date_naive())
        .await;
    output::print_report(&report);

    if !report.is_success() {
        bail!("{} of {} update(s) failed", report.failed, report.failed + report.applied);
    }
    Ok(())
}
