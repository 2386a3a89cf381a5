use std::{
    io,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use bucketeer_lib::{
    budget::{Budget, BucketGoalProgress, GoalStatus},
    transaction::{AccountSet, CategorizedTransaction, Transaction},
    util::format_amount,
};
use chrono::Local;
use clap::{Parser, Subcommand};
use csv::Writer;
use serde::Serialize;
use slog::Logger;
use sloggers::{
    terminal::TerminalLoggerBuilder,
    types::{Severity, SourceLocation},
    Build,
};

/// Rule based budget buckets and goals
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the yaml budget of rules and buckets
    #[arg(long)]
    budget_path: PathBuf,
    /// File glob pattern of transaction files, csv or json account sets
    #[arg(long)]
    transaction_path_pattern: String,
    /// Log level
    #[arg(long)]
    log_level: Option<Severity>,
    // Subcommands
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
#[command()]
enum Command {
    /// Output the bucket assignments yaml
    #[command()]
    Classify,
    /// Output the progress of every bucket goal
    #[command()]
    Goals,
    /// Output the categorized transactions csv
    #[command()]
    Transactions,
}

/// Bucket assignments in priority order
#[derive(Debug, Serialize)]
struct ClassifyOutput<'a> {
    buckets: Vec<BucketOutput<'a>>,
    uncategorized: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
struct BucketOutput<'a> {
    id: &'a str,
    name: &'a str,
    transactions: Vec<&'a str>,
}

/// Flat csv row, csv cannot serialize flattened structs
#[derive(Debug, Serialize)]
struct TransactionRow<'a> {
    id: &'a str,
    posted: String,
    amount: String,
    description: &'a str,
    payee: Option<&'a str>,
    org_name: &'a str,
    account_name: &'a str,
    currency: &'a str,
    balance_before: Option<String>,
    balance_after: Option<String>,
    bucket_id: Option<&'a str>,
    bucket_name: Option<&'a str>,
}

impl<'a> From<&'a CategorizedTransaction> for TransactionRow<'a> {
    fn from(categorized: &'a CategorizedTransaction) -> Self {
        let transaction = &categorized.transaction;
        Self {
            id: &transaction.id,
            posted: transaction
                .posted_in(&Local)
                .map(|posted| posted.to_rfc3339())
                .unwrap_or_else(|| transaction.posted.to_string()),
            amount: transaction.amount.to_string(),
            description: &transaction.description,
            payee: transaction.payee.as_deref(),
            org_name: &transaction.org_name,
            account_name: &transaction.account_name,
            currency: &transaction.currency,
            balance_before: transaction.balance_before.as_ref().map(|b| b.to_string()),
            balance_after: transaction.balance_after.as_ref().map(|b| b.to_string()),
            bucket_id: categorized.bucket_id.as_deref(),
            bucket_name: categorized.bucket_name.as_deref(),
        }
    }
}

fn load_transactions(logger: &Logger, path: &Path) -> Result<Vec<Transaction>> {
    let is_json = path
        .extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("json"));
    let transactions = if is_json {
        AccountSet::from_json_file(path)?.transactions()
    } else {
        Transaction::from_csv_file(path)?
    };
    slog::debug!(
        logger,
        "loaded transactions";
        "count" => transactions.len(),
        "path" => %path.display()
    );
    Ok(transactions)
}

/// Currency shared by every transaction, `None` when mixed or empty
fn common_currency<'a>(transactions: &[&'a Transaction]) -> Option<&'a str> {
    let (first, rest) = transactions.split_first()?;
    rest.iter()
        .all(|t| t.currency == first.currency)
        .then_some(first.currency.as_str())
}

fn goal_line(progress: &BucketGoalProgress, currency: Option<&str>) -> String {
    let name = &progress.bucket_name;
    let GoalStatus::Progress(progress) = &progress.status else {
        return format!("{name}: not configured");
    };
    if progress.window.is_none() {
        return format!("{name}: {} goal has an invalid period", progress.goal_type);
    }
    let status = if progress.is_met_or_on_track {
        "on track"
    } else {
        "off track"
    };
    format!(
        "{name}: {} {} of {} ({}%), {} remaining, {status}",
        progress.goal_type,
        format_amount(&progress.relevant_amount, currency),
        format_amount(&progress.target_amount, currency),
        progress.progress_percentage,
        format_amount(&progress.remaining, currency),
    )
}

fn main() -> Result<()> {
    let args = Args::parse();

    let logger = TerminalLoggerBuilder::new()
        .level(args.log_level.unwrap_or_default())
        .source_location(SourceLocation::None)
        .build()?;
    let _guard = slog_scope::set_global_logger(logger.clone());
    slog_stdlog::init().context("failed to route library logs")?;

    let budget = Budget::from_yaml_file(&args.budget_path).context("failed to parse budget")?;
    let transaction_files = glob::glob(&args.transaction_path_pattern)?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to find transaction files")?;
    let mut transactions = Vec::new();
    for path in transaction_files.iter().filter(|f| f.is_file()) {
        let loaded = load_transactions(&logger, path)
            .with_context(|| format!("failed to parse transaction file {}", path.display()))?;
        transactions.extend(loaded);
    }

    match args.command {
        Command::Classify => {
            let classification = budget.classify(&transactions);
            let mut buckets = budget.buckets.iter().collect::<Vec<_>>();
            buckets.sort_by_key(|bucket| bucket.priority);
            let output = ClassifyOutput {
                buckets: buckets
                    .into_iter()
                    .map(|bucket| BucketOutput {
                        id: &bucket.id,
                        name: &bucket.name,
                        transactions: classification
                            .bucket(&bucket.id)
                            .iter()
                            .map(|t| t.id.as_str())
                            .collect(),
                    })
                    .collect(),
                uncategorized: classification
                    .uncategorized
                    .iter()
                    .map(|t| t.id.as_str())
                    .collect(),
            };
            println!("{}", serde_yaml::to_string(&output)?);
        }
        Command::Goals => {
            let classification = budget.classify(&transactions);
            for progress in budget.goal_progress(&classification, &Local::now()) {
                let currency = common_currency(classification.bucket(&progress.bucket_id));
                println!("{}", goal_line(&progress, currency));
            }
        }
        Command::Transactions => {
            let categorized = budget.categorize_in(&transactions, &Local);
            let mut writer = Writer::from_writer(io::stdout());
            for row in &categorized {
                writer.serialize(TransactionRow::from(row))?;
            }
            writer.flush()?;
        }
    }
    Ok(())
}
