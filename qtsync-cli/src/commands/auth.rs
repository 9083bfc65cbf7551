use std::fmt;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use colored::*;
use qtsync_core::credentials::CredentialRecord;
use qtsync_core::persistence::{DestinationCredentials, StoredConfig};
use qtsync_core::ynab::{BudgetApi, BudgetSummary, YnabClient};

use super::{CommandContext, spinner};
use crate::output;
use crate::prompt;

struct BudgetChoice(BudgetSummary);

impl fmt::Display for BudgetChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.0.name, self.0.id)
    }
}

fn required(value: Option<String>, message: &str) -> Result<String> {
    let value = match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => v,
        _ => prompt::secret(message).context("Prompt failed")?,
    };
    if value.is_empty() {
        bail!("{} cannot be empty", message.trim_end_matches(':'));
    }
    Ok(value)
}

/// Replace `config.json` with fresh credentials.
pub async fn set(
    ctx: &CommandContext,
    questrade_token: Option<String>,
    ynab_token: Option<String>,
    budget_id: Option<String>,
) -> Result<()> {
    let refresh_token = required(questrade_token, "Questrade refresh token:")?;
    let access_token = required(ynab_token, "YNAB personal access token:")?;

    let budget_id = match budget_id.filter(|id| !id.trim().is_empty()) {
        Some(id) => id.trim().to_string(),
        None => choose_budget(ctx, &access_token).await?,
    };

    let config = StoredConfig {
        source: CredentialRecord {
            refresh_token,
            ..CredentialRecord::default()
        },
        destination: DestinationCredentials {
            access_token,
            budget_id,
        },
    };
    ctx.store.replace_all(&config).await?;

    output::success(&format!(
        "Credentials saved to {}",
        ctx.store.config_path().display()
    ));
    println!("Run `qtsync auth login` to exchange the Questrade token now.");
    Ok(())
}

async fn choose_budget(ctx: &CommandContext, access_token: &str) -> Result<String> {
    let client = YnabClient::new(
        ctx.http.clone(),
        ctx.config.budget_api_url.clone(),
        access_token,
        "",
    );

    let pb = spinner("Fetching YNAB budgets...");
    let budgets = client.list_budgets().await;
    pb.finish_and_clear();
    let budgets = budgets.context("Failed to list YNAB budgets")?;

    match budgets.len() {
        0 => bail!("No budgets found for this YNAB token"),
        1 => {
            let budget = &budgets[0];
            println!("Using budget {}", budget.name.cyan());
            Ok(budget.id.clone())
        }
        _ => {
            let choices = budgets.into_iter().map(BudgetChoice).collect();
            match prompt::select("Select a YNAB budget:", choices)? {
                Some(choice) => Ok(choice.0.id),
                None => bail!("No budget selected"),
            }
        }
    }
}

pub async fn show(ctx: &CommandContext, reveal: bool) -> Result<()> {
    let config = ctx.store.load().await?;
    println!("Config file: {}", ctx.store.config_path().display());
    output::print_credentials(&config, reveal);
    Ok(())
}

/// Make sure a valid Questrade access token is stored.
pub async fn login(ctx: &CommandContext) -> Result<()> {
    let tokens = ctx.ensure_credential().await?;

    output::success("Questrade access token is valid");
    println!("  API server: {}", tokens.api_server().cyan());
    if let Some(secs) = tokens.expires_in(Utc::now()) {
        println!("  Expires in: {} minutes", secs / 60);
    }
    Ok(())
}
