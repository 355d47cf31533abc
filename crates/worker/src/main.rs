use anyhow::Context;
use clap::{Parser, Subcommand};
use rankings_core::storage::rankings::{PgRankingStore, RankingStore};
use rankings_core::trending::{
    analyze_trending_data, filter_trending_data_by_time_range, TimeRange,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod import;

#[derive(Debug, Parser)]
#[command(name = "rankings_worker")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Import one ranking period document into the store.
    Import {
        /// JSON file: `{period, algorithm_version, rankings}` or a bare rankings array.
        file: PathBuf,

        /// Period id (YYYY-MM or YYYY-MM-DD). Overrides the document's own period.
        #[arg(long)]
        period: Option<String>,

        #[arg(long)]
        algorithm_version: Option<String>,

        /// Flag this period as the current ranking.
        #[arg(long)]
        current: bool,

        /// Validate the document without writing to the database.
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the trending analysis of every stored period as JSON.
    Trending {
        /// Number of months to keep, or `all`.
        #[arg(long, default_value = "all")]
        months: String,

        /// Reference date for the month window (YYYY-MM-DD). Defaults to today's UTC date.
        #[arg(long)]
        as_of: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = rankings_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let res = match args.command {
        Command::Import {
            file,
            period,
            algorithm_version,
            current,
            dry_run,
        } => {
            let opts = import::ImportOptions {
                period,
                algorithm_version,
            };
            run_import(&settings, file, opts, current, dry_run).await
        }
        Command::Trending { months, as_of } => {
            run_trending(&settings, &months, as_of.as_deref()).await
        }
    };

    if let Err(err) = &res {
        sentry_anyhow::capture_anyhow(err);
        tracing::error!(error = %err, "worker run failed");
    }
    res
}

async fn run_import(
    settings: &rankings_core::config::Settings,
    file: PathBuf,
    opts: import::ImportOptions,
    make_current: bool,
    dry_run: bool,
) -> anyhow::Result<()> {
    let doc = import::read_document(&file)?;
    let period = import::prepare_period(doc, &opts)?;

    if dry_run {
        tracing::info!(
            period = %period.period,
            dry_run = true,
            entries = period.rankings.len(),
            "ranking document is valid"
        );
        return Ok(());
    }

    let pool = connect(settings).await?;

    let mut lock_conn = pool
        .acquire()
        .await
        .context("acquire lock connection failed")?;
    let acquired =
        rankings_core::storage::lock::try_acquire_period_lock(&mut lock_conn, &period.period)
            .await?;
    if !acquired {
        tracing::warn!(period = %period.period, "period lock not acquired; another import in progress");
        return Ok(());
    }

    let res = import::import_period(&pool, &period, make_current).await;
    let released =
        rankings_core::storage::lock::release_period_lock(&mut lock_conn, &period.period).await;
    report_lock_release(&period.period, released);
    let id = res?;

    tracing::info!(
        period = %period.period,
        %id,
        entries = period.rankings.len(),
        current = make_current,
        "imported ranking period"
    );
    Ok(())
}

/// Logs a lock release that failed or found no lock held. Returns whether the lock was released.
fn report_lock_release(period: &str, released: anyhow::Result<bool>) -> bool {
    match released {
        Ok(true) => true,
        Ok(false) => {
            tracing::warn!(period, "period lock was not held at release");
            false
        }
        Err(e) => {
            tracing::warn!(period, error = %e, "failed to release period lock");
            false
        }
    }
}

async fn run_trending(
    settings: &rankings_core::config::Settings,
    months: &str,
    as_of: Option<&str>,
) -> anyhow::Result<()> {
    let range = TimeRange::from_query(Some(months));
    let reference_date = resolve_reference_date(as_of)?;

    let pool = connect(settings).await?;
    let store = PgRankingStore::new(pool);
    let periods = rankings_core::ingest::normalize_all(store.fetch_all().await?);

    let analysis = analyze_trending_data(&periods);
    let result = filter_trending_data_by_time_range(&analysis, range, reference_date);

    tracing::info!(
        time_range = %range,
        %reference_date,
        periods_processed = periods.len(),
        tools_found = result.tools.len(),
        "trending analysis completed"
    );

    let out = serde_json::to_string_pretty(&result).context("serialize trending result failed")?;
    println!("{out}");
    Ok(())
}

async fn connect(settings: &rankings_core::config::Settings) -> anyhow::Result<sqlx::PgPool> {
    let db_url = settings.require_database_url()?;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(2)
        .connect(db_url)
        .await
        .context("connect DATABASE_URL failed")?;

    rankings_core::storage::migrate(&pool).await?;
    Ok(pool)
}

fn init_sentry(settings: &rankings_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

fn resolve_reference_date(as_of: Option<&str>) -> anyhow::Result<chrono::NaiveDate> {
    if let Some(s) = as_of {
        return chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("invalid --as-of date: {s}"));
    }
    Ok(chrono::Utc::now().date_naive())
}
