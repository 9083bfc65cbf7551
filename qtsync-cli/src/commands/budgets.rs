use anyhow::Result;
use qtsync_core::ynab::{BudgetApi, YnabClient};

use super::{CommandContext, spinner};
use crate::output;

pub async fn list(ctx: &CommandContext) -> Result<()> {
    let destination = ctx.store.load().await?.destination;
    if destination.access_token.is_empty() {
        anyhow::bail!("No YNAB access token stored; run `qtsync auth set` first");
    }

    let client = YnabClient::new(
        ctx.http.clone(),
        ctx.config.budget_api_url.clone(),
        destination.access_token,
        destination.budget_id.clone(),
    );

    let pb = spinner("Fetching YNAB budgets...");
    let budgets = client.list_budgets().await;
    pb.finish_and_clear();
    let budgets = budgets?;

    output::heading("YNAB budgets");
    println!("{}", output::budgets_table(&budgets));
    if !destination.budget_id.is_empty() {
        println!("Selected budget: {}", destination.budget_id);
    }
    Ok(())
}
