use std::process::ExitCode;

use clap::Parser;
use engine::{Direction, Engine, EngineError, TrendGrain};
use migration::{Migrator, MigratorTrait};

use cli::{Cli, Command};
use settings::Settings;

mod cli;
mod settings;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            return ExitCode::from(78);
        }
    };
    if let Some(url) = &cli.database_url {
        settings.database.url = url.clone();
    }
    if let Some(level) = &cli.log_level {
        settings.app.level = level.clone();
    }

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(format!(
            "ledger={level},engine={level},migration={level}",
            level = settings.app.level
        ))
        .init();

    match run(cli.command, &settings).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!("command failed: {err}");
            eprintln!("error: {err}");
            ExitCode::from(exit_code(err.as_ref()))
        }
    }
}

async fn run(command: Command, settings: &Settings) -> Result<String, BoxError> {
    let engine = connect(settings).await?;

    let output = match command {
        Command::List(args) => json(&engine.list_accounts(args.user, &args.to_filter()).await?)?,
        Command::Count(args) => json(&engine.count_accounts(args.user, &args.to_filter()).await?)?,
        Command::Totals(args) => json(&engine.totals(args.user, &args.to_filter()).await?)?,
        Command::Trend { filter, grain } => json(
            &engine
                .trend(filter.user, &filter.to_filter(), TrendGrain::parse(&grain))
                .await?,
        )?,
        Command::Breakdown { filter, direction } => json(
            &engine
                .category_breakdown(
                    filter.user,
                    &filter.to_filter(),
                    Direction::parse(&direction),
                )
                .await?,
        )?,
        Command::Compare(args) => json(
            &engine
                .category_comparison(args.user, &args.to_filter())
                .await?,
        )?,
        Command::Report { filter, grain } => json(
            &engine
                .report(filter.user, &filter.to_filter(), TrendGrain::parse(&grain))
                .await?,
        )?,
    };

    engine.close().await?;
    Ok(output)
}

fn json<T: serde::Serialize>(value: &T) -> Result<String, BoxError> {
    Ok(serde_json::to_string_pretty(value)?)
}

async fn connect(settings: &Settings) -> Result<Engine, BoxError> {
    let mut options = sea_orm::ConnectOptions::new(settings.database.url.clone());
    options
        .max_connections(settings.database.max_connections)
        .sqlx_logging(false);

    let database = sea_orm::Database::connect(options).await?;
    Migrator::up(&database, None).await?;
    tracing::debug!(url = %settings.database.url, "database ready");

    Ok(Engine::builder()
        .database(database)
        .retry_policy((&settings.retry).into())
        .build()
        .await?)
}

/// Process exit status for a failed command. Engine errors get their own
/// codes so scripts can tell a bad caller from a busy database.
fn exit_code(err: &(dyn std::error::Error + 'static)) -> u8 {
    match err.downcast_ref::<EngineError>() {
        Some(EngineError::Unauthorized(_)) => 3,
        Some(EngineError::Forbidden(_)) => 4,
        Some(EngineError::KeyNotFound(_)) => 5,
        Some(
            EngineError::ExistingKey(_)
            | EngineError::InvalidAmount(_)
            | EngineError::InvalidName(_)
            | EngineError::InvalidCategory(_),
        ) => 6,
        Some(EngineError::RetryExhausted { .. }) => 75,
        Some(EngineError::Database(_)) | None => 1,
    }
}
