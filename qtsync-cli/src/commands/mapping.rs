use std::fmt;

use anyhow::Result;
use colored::*;
use qtsync_core::accounts::SourceAccount;
use qtsync_core::reconcile::AccountMapping;
use qtsync_core::ynab::{BudgetAccount, BudgetApi};

use super::{CommandContext, spinner};
use crate::output;
use crate::prompt;

/// Both account lists, fetched concurrently.
async fn fetch_both(ctx: &CommandContext) -> Result<(Vec<SourceAccount>, Vec<BudgetAccount>)> {
    let tokens = ctx.ensure_credential().await?;
    let fetcher = ctx.fetcher(&tokens);
    let budget = ctx.budget_client().await?;

    let pb = spinner("Fetching accounts...");
    let result = tokio::try_join!(fetcher.fetch_accounts(), budget.list_accounts());
    pb.finish_and_clear();
    Ok(result?)
}

async fn load_or_empty(ctx: &CommandContext) -> Result<AccountMapping> {
    if tokio::fs::try_exists(ctx.store.mapping_path()).await? {
        Ok(ctx.store.load_mapping().await?)
    } else {
        Ok(AccountMapping::new())
    }
}

pub async fn list(ctx: &CommandContext) -> Result<()> {
    let (sources, destinations) = fetch_both(ctx).await?;
    let mapping = load_or_empty(ctx).await?;

    output::heading("Questrade accounts");
    println!("{}", output::source_accounts_table(&sources));

    output::heading("YNAB accounts");
    println!("{}", output::budget_accounts_table(&destinations));

    output::heading("Mappings");
    if mapping.is_empty() {
        println!("No mappings yet; run `qtsync mapping set`");
    } else {
        println!("{}", output::mapping_table(&mapping, &destinations));
    }
    Ok(())
}

enum SourceChoice<'a> {
    Account {
        account: &'a SourceAccount,
        mapped_to: Option<String>,
    },
    Finish,
}

impl fmt::Display for SourceChoice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Account { account, mapped_to } => {
                write!(f, "{} ({})", account.id(), account.kind())?;
                if let Some(name) = mapped_to {
                    write!(f, " → {name}")?;
                }
                Ok(())
            }
            Self::Finish => f.write_str("Finish mapping"),
        }
    }
}

enum DestinationChoice<'a> {
    Account(&'a BudgetAccount),
    Unmap,
}

impl fmt::Display for DestinationChoice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Account(account) => write!(
                f,
                "{} ({}, {})",
                account.name,
                account.kind,
                output::money(account.balance_major())
            ),
            Self::Unmap => f.write_str("Remove mapping"),
        }
    }
}

fn destination_name(destinations: &[BudgetAccount], id: &str) -> String {
    destinations
        .iter()
        .find(|d| d.id == id)
        .map(|d| d.name.clone())
        .unwrap_or_else(|| id.to_string())
}

/// Interactive mapping editor; saves once the user picks "Finish mapping".
pub async fn set(ctx: &CommandContext) -> Result<()> {
    let (sources, destinations) = fetch_both(ctx).await?;
    let mut mapping = load_or_empty(ctx).await?;
    let open: Vec<&BudgetAccount> = destinations.iter().filter(|d| !d.closed).collect();

    loop {
        let mut choices: Vec<SourceChoice> = sources
            .iter()
            .map(|account| SourceChoice::Account {
                account,
                mapped_to: mapping
                    .get(account.id())
                    .map(|id| destination_name(&destinations, id)),
            })
            .collect();
        choices.push(SourceChoice::Finish);

        let Some(SourceChoice::Account { account, .. }) =
            prompt::select("Select a Questrade account to map:", choices)?
        else {
            break;
        };

        let mut targets: Vec<DestinationChoice> =
            open.iter().map(|d| DestinationChoice::Account(d)).collect();
        if mapping.get(account.id()).is_some() {
            targets.push(DestinationChoice::Unmap);
        }

        let message = format!("Map {} to:", account.id());
        match prompt::select(&message, targets)? {
            Some(DestinationChoice::Account(target)) => {
                mapping.insert(account.id(), target.id.as_str());
                println!("{} → {}", account.id().cyan(), target.name.cyan());
            }
            Some(DestinationChoice::Unmap) => {
                mapping.remove(account.id());
                println!("Removed mapping for {}", account.id().cyan());
            }
            None => {}
        }
    }

    ctx.store.save_mapping(&mapping).await?;
    output::success(&format!(
        "Saved {} mapping(s) to {}",
        mapping.len(),
        ctx.store.mapping_path().display()
    ));
    Ok(())
}
