use colored::*;
use qtsync_core::accounts::SourceAccount;
use qtsync_core::credentials::redact;
use qtsync_core::persistence::StoredConfig;
use qtsync_core::reconcile::{AccountMapping, ReconciliationPlan, SyncMode};
use qtsync_core::sync::SyncReport;
use qtsync_core::ynab::{BudgetAccount, BudgetSummary};
use rust_decimal::Decimal;
use tabled::{Table, Tabled, settings::Style};

/// `$1,000.00`-style amount without grouping: `$1000.00`, `-$12.34`.
pub fn money(amount: Decimal) -> String {
    if amount.is_sign_negative() && !amount.is_zero() {
        format!("-${:.2}", amount.abs())
    } else {
        format!("${:.2}", amount.abs())
    }
}

/// Signed change, `+$50.00` / `-$12.34`.
pub fn change(delta: Decimal) -> String {
    if delta.is_zero() {
        money(delta)
    } else if delta.is_sign_positive() {
        format!("+{}", money(delta))
    } else {
        money(delta)
    }
}

pub fn heading(text: &str) {
    println!("\n{}", text.green().bold());
}

pub fn success(text: &str) {
    println!("{} {}", "✓".green(), text);
}

pub fn plan_table(plan: &ReconciliationPlan) -> String {
    #[derive(Tabled)]
    struct PlanRow {
        #[tabled(rename = "#")]
        index: usize,
        #[tabled(rename = "Questrade")]
        source: String,
        #[tabled(rename = "YNAB account")]
        destination: String,
        #[tabled(rename = "Current")]
        current: String,
        #[tabled(rename = "New")]
        new: String,
        #[tabled(rename = "Change")]
        change: String,
    }

    let rows = plan.entries.iter().enumerate().map(|(i, entry)| PlanRow {
        index: i + 1,
        source: format!("#{} ({})", entry.source_id, entry.source_kind),
        destination: entry.destination_name.clone(),
        current: money(entry.current_balance()),
        new: money(entry.new_balance()),
        change: change(entry.delta()),
    });

    Table::new(rows).with(Style::modern()).to_string()
}

pub fn print_plan(plan: &ReconciliationPlan, mode: SyncMode) {
    heading(&format!("Sync preview ({mode} mode)"));
    if plan.is_empty() {
        println!("No accounts to sync");
    } else {
        println!("{}", plan_table(plan));
        println!(
            "Net change: {}",
            change(qtsync_core::reconcile::money::from_minor(
                plan.total_delta_minor()
            ))
            .cyan()
        );
    }

    if !plan.skipped.is_empty() {
        println!("\n{}", format!("Skipped {} mapping(s):", plan.skipped.len()).yellow());
        for skipped in &plan.skipped {
            println!(
                "  #{} → {}: {}",
                skipped.source_id, skipped.destination_id, skipped.reason
            );
        }
    }
}

pub fn print_report(report: &SyncReport) {
    println!();
    let summary = format!(
        "Sync completed: {} updated, {} failed, {} skipped",
        report.applied, report.failed, report.skipped
    );
    if report.is_success() {
        success(&summary);
    } else {
        println!("{} {}", "✗".red(), summary);
        for failure in &report.failures {
            println!("  {}: {}", failure.destination_id.red(), failure.message);
        }
    }
}

pub fn source_accounts_table(accounts: &[SourceAccount]) -> String {
    #[derive(Tabled)]
    struct SourceRow<'a> {
        #[tabled(rename = "Number")]
        number: &'a str,
        #[tabled(rename = "Type")]
        kind: &'a str,
        #[tabled(rename = "Status")]
        status: &'a str,
        #[tabled(rename = "Total equity")]
        equity: String,
    }

    let rows = accounts.iter().map(|a| SourceRow {
        number: a.id(),
        kind: a.kind(),
        status: &a.account.status,
        equity: a.total_equity().map(money).unwrap_or_else(|| "N/A".to_string()),
    });
    Table::new(rows).with(Style::modern()).to_string()
}

pub fn budget_accounts_table(accounts: &[BudgetAccount]) -> String {
    #[derive(Tabled)]
    struct BudgetRow<'a> {
        #[tabled(rename = "Name")]
        name: &'a str,
        #[tabled(rename = "Type")]
        kind: &'a str,
        #[tabled(rename = "Balance")]
        balance: String,
        #[tabled(rename = "Id")]
        id: &'a str,
    }

    let rows = accounts.iter().map(|a| BudgetRow {
        name: &a.name,
        kind: &a.kind,
        balance: money(a.balance_major()),
        id: &a.id,
    });
    Table::new(rows).with(Style::modern()).to_string()
}

pub fn mapping_table(mapping: &AccountMapping, destinations: &[BudgetAccount]) -> String {
    #[derive(Tabled)]
    struct MappingRow<'a> {
        #[tabled(rename = "Questrade")]
        source: &'a str,
        #[tabled(rename = "YNAB account")]
        destination: String,
    }

    let rows = mapping.iter().map(|(source, destination)| MappingRow {
        source,
        destination: destinations
            .iter()
            .find(|d| d.id == destination)
            .map(|d| d.name.clone())
            .unwrap_or_else(|| format!("{destination} (not found)")),
    });
    Table::new(rows).with(Style::modern()).to_string()
}

pub fn budgets_table(budgets: &[BudgetSummary]) -> String {
    #[derive(Tabled)]
    struct BudgetSummaryRow<'a> {
        #[tabled(rename = "Name")]
        name: &'a str,
        #[tabled(rename = "Id")]
        id: &'a str,
    }

    let rows = budgets.iter().map(|b| BudgetSummaryRow {
        name: &b.name,
        id: &b.id,
    });
    Table::new(rows).with(Style::modern()).to_string()
}

pub fn print_credentials(config: &StoredConfig, reveal: bool) {
    let secret = |value: &str| -> String {
        if value.is_empty() {
            "(not set)".dimmed().to_string()
        } else if reveal {
            value.to_string()
        } else {
            redact(value)
        }
    };
    let optional = |value: Option<&str>| secret(value.unwrap_or_default());

    heading("Questrade");
    println!("  {}: {}", "Refresh token".yellow(), secret(&config.source.refresh_token));
    println!(
        "  {}: {}",
        "Access token".yellow(),
        optional(config.source.access_token.as_deref())
    );
    println!(
        "  {}: {}",
        "API server".yellow(),
        config.source.api_server.as_deref().unwrap_or("(not set)")
    );
    println!(
        "  {}: {}",
        "Expires in".yellow(),
        config
            .source
            .expires_in
            .map(|secs| format!("{secs}s (at last save)"))
            .unwrap_or_else(|| "(not set)".to_string())
    );

    heading("YNAB");
    println!(
        "  {}: {}",
        "Access token".yellow(),
        secret(&config.destination.access_token)
    );
    println!("  {}: {}", "Budget id".yellow(), config.destination.budget_id);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn money_formats_two_decimals_with_sign() {
        assert_eq!(money(dec("1000")), "$1000.00");
        assert_eq!(money(dec("-12.34")), "-$12.34");
        assert_eq!(money(dec("0.000")), "$0.00");
        assert_eq!(change(dec("50.000")), "+$50.00");
        assert_eq!(change(dec("-0.5")), "-$0.50");
    }

    #[test]
    fn plan_table_lists_entries_in_order() {
        use qtsync_core::reconcile::PlanEntry;

        colored::control::set_override(false);
        let plan = ReconciliationPlan {
            entries: vec![PlanEntry {
                source_id: "51234567".to_string(),
                source_kind: "TFSA".to_string(),
                destination_id: "d1".to_string(),
                destination_name: "Investments".to_string(),
                current_minor: 950_000,
                new_minor: 1_000_000,
                delta_minor: 50_000,
            }],
            skipped: Vec::new(),
        };

        let table = plan_table(&plan);
        assert!(table.contains("#51234567 (TFSA)"));
        assert!(table.contains("$950.00"));
        assert!(table.contains("+$50.00"));
    }
}
