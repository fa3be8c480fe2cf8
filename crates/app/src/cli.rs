use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "ledger", about = "Query the store ledger", disable_version_flag = true)]
pub struct Cli {
    /// Optional config file path (TOML).
    #[arg(long, global = true)]
    pub config: Option<String>,
    /// Override the database URL.
    #[arg(long, global = true, env = "LEDGER_DATABASE_URL")]
    pub database_url: Option<String>,
    /// Override the log level.
    #[arg(long, global = true)]
    pub log_level: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// One page of entries, newest first.
    List(FilterArgs),
    /// Number of matching entries.
    Count(FilterArgs),
    /// Income, expense and net.
    Totals(FilterArgs),
    /// Totals per day, month or year.
    Trend {
        #[command(flatten)]
        filter: FilterArgs,
        /// day, month or year.
        #[arg(long, default_value = "month")]
        grain: String,
    },
    /// Per-category amounts for income or expense.
    Breakdown {
        #[command(flatten)]
        filter: FilterArgs,
        /// income or expense.
        #[arg(long, default_value = "expense")]
        direction: String,
    },
    /// Income and expense side by side per category.
    Compare(FilterArgs),
    /// Totals, count, trend and breakdowns together.
    Report {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, default_value = "month")]
        grain: String,
    },
}

/// Filter flags, passed through as raw text and normalized by the engine.
#[derive(Debug, Clone, Args)]
pub struct FilterArgs {
    /// Id of the calling user.
    #[arg(long)]
    pub user: i64,
    #[arg(long)]
    pub store_id: Option<String>,
    #[arg(long)]
    pub category_id: Option<String>,
    #[arg(long)]
    pub start_date: Option<String>,
    #[arg(long)]
    pub end_date: Option<String>,
    #[arg(long)]
    pub min_amount: Option<String>,
    #[arg(long)]
    pub max_amount: Option<String>,
    /// absolute (default) or signed.
    #[arg(long)]
    pub amount_mode: Option<String>,
    #[arg(long)]
    pub keyword: Option<String>,
    #[arg(long)]
    pub page: Option<String>,
    #[arg(long)]
    pub page_size: Option<String>,
    /// day, week, month or year ending today; replaces the date flags.
    #[arg(long)]
    pub range: Option<String>,
}

impl FilterArgs {
    pub fn to_filter(&self) -> engine::CanonicalFilter {
        let filter = engine::normalize(&engine::RawFilter {
            store_id: self.store_id.clone(),
            category_id: self.category_id.clone(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            min_amount: self.min_amount.clone(),
            max_amount: self.max_amount.clone(),
            amount_mode: self.amount_mode.clone(),
            keyword: self.keyword.clone(),
            page: self.page.clone(),
            page_size: self.page_size.clone(),
        });
        match self.range.as_deref() {
            Some(range) => filter.with_time_range(
                engine::TimeRange::parse(range),
                chrono::Local::now().date_naive(),
            ),
            None => filter,
        }
    }
}
