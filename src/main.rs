use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use latestver::config::{self, ConfigFile};
use latestver::fetcher::FetcherRegistry;
use latestver::logging::{self, LogFormat};
use latestver::scheduler::{Orchestrator, PassReport, Schedule};
use latestver::store::{LogEntry, LogQuery, MetaStore, SqliteStore};

#[derive(Parser)]
#[command(name = "latestver")]
#[command(version, about = "Tracks the latest released versions of software artifacts")]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, global = true, env = "LATESTVER_CONFIG", default_value = "config.yaml")]
    config: PathBuf,

    /// Window every entry is checked once in (e.g. "1h", "30m");
    /// defaults to the config file's check_interval
    #[arg(long, global = true, env = "LATESTVER_CHECK_DISTRIBUTION", value_parser = humantime::parse_duration)]
    check_distribution: Option<Duration>,

    /// SQLite database path
    #[arg(long, global = true, env = "LATESTVER_STORAGE_DSN")]
    storage_dsn: Option<PathBuf>,

    #[arg(long, global = true, env = "LATESTVER_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Check entries on a fixed tick until interrupted (default)
    Run,
    /// Load and validate the configuration, then exit
    Validate,
    /// Run a single pass over the due entries, then exit
    Check,
    /// Print the newest version changes
    Log(LogArgs),
    /// Copy all stored state into another database
    Migrate {
        /// Destination database path
        #[arg(long)]
        to: PathBuf,
    },
}

#[derive(Args)]
struct LogArgs {
    #[arg(long, requires = "tag")]
    name: Option<String>,
    #[arg(long, requires = "name")]
    tag: Option<String>,
    /// Rows per page, 0 for all
    #[arg(long, default_value_t = config::DEFAULT_LOG_LIMIT)]
    limit: usize,
    #[arg(long, default_value_t = 0)]
    page: usize,
    /// Print one JSON object per line
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = logging::init(&cli.log_level, cli.log_format, cli.log_file.as_deref())?;

    match &cli.command {
        None | Some(Command::Run) => tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?
            .block_on(run(&cli)),
        Some(Command::Validate) => validate(&cli),
        Some(Command::Check) => tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?
            .block_on(check(&cli)),
        Some(Command::Log(args)) => print_log(&cli, args),
        Some(Command::Migrate { to }) => migrate(&cli, to),
    }
}

fn load_config(cli: &Cli, registry: &FetcherRegistry) -> anyhow::Result<ConfigFile> {
    let config = ConfigFile::load(&cli.config)?;
    config.validate_catalog(registry)?;
    info!(path = %cli.config.display(), entries = config.catalog.len(), "Configuration loaded");
    Ok(config)
}

fn open_store(cli: &Cli) -> anyhow::Result<SqliteStore> {
    let path = cli.storage_dsn.clone().unwrap_or_else(config::db_path);
    SqliteStore::open(&path).with_context(|| format!("opening store {}", path.display()))
}

fn build_orchestrator(
    cli: &Cli,
    config: &ConfigFile,
    registry: FetcherRegistry,
) -> anyhow::Result<Orchestrator<SqliteStore>> {
    let window = cli.check_distribution.unwrap_or(config.check_interval);
    let schedule = Schedule::new(window, config::SCHEDULER_TICK);

    Ok(Orchestrator::new(Arc::new(open_store(cli)?), Arc::new(registry), schedule))
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let registry = FetcherRegistry::with_defaults();
    let config = load_config(cli, &registry)?;
    let orchestrator = Arc::new(build_orchestrator(cli, &config, registry)?);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Unable to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    };
    orchestrator.run(Arc::new(config), shutdown).await;

    Ok(())
}

fn validate(cli: &Cli) -> anyhow::Result<()> {
    let registry = FetcherRegistry::with_defaults();
    let config = load_config(cli, &registry)?;

    println!("{}: {} catalog entries OK", cli.config.display(), config.catalog.len());
    Ok(())
}

async fn check(cli: &Cli) -> anyhow::Result<()> {
    let registry = FetcherRegistry::with_defaults();
    let config = load_config(cli, &registry)?;
    let orchestrator = build_orchestrator(cli, &config, registry)?;

    let report = orchestrator
        .run_pass(&config)
        .await
        .context("another pass is already running")?;
    print_report(&report);

    if report.store_failed > 0 {
        anyhow::bail!("{} entries could not be stored", report.store_failed);
    }
    Ok(())
}

fn print_report(report: &PassReport) {
    println!(
        "checked {}: {} updated, {} unchanged, {} rejected, {} fetch errors, {} compare errors ({} not due)",
        report.checked(),
        report.updated,
        report.unchanged,
        report.rejected,
        report.fetch_failed,
        report.compare_failed,
        report.not_due,
    );
}

fn print_log(cli: &Cli, args: &LogArgs) -> anyhow::Result<()> {
    let store = open_store(cli)?;

    let mut query = LogQuery::new(args.limit).page(args.page);
    if let (Some(name), Some(tag)) = (&args.name, &args.tag) {
        query = query.for_entry(name, tag);
    }

    for entry in store.list_logs(&query)? {
        if args.json {
            println!("{}", serde_json::to_string(&entry)?);
        } else {
            println!("{}", format_log_entry(&entry));
        }
    }
    Ok(())
}

fn format_log_entry(entry: &LogEntry) -> String {
    let from = if entry.version_from.is_empty() {
        "-"
    } else {
        entry.version_from.as_str()
    };

    format!(
        "{}  {}:{}  {} -> {}",
        entry.timestamp.to_rfc3339(),
        entry.catalog_name,
        entry.catalog_tag,
        from,
        entry.version_to
    )
}

fn migrate(cli: &Cli, to: &Path) -> anyhow::Result<()> {
    let source = open_store(cli)?;
    let dest = SqliteStore::open(to).with_context(|| format!("opening store {}", to.display()))?;

    let report = source.migrate_into(&dest)?;
    println!("migrated {} metas and {} log entries to {}", report.metas, report.logs, to.display());
    Ok(())
}
