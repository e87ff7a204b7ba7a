mod console;

use anyhow::{bail, Context, Result};
use arkham_core::{
    DashboardConfig, DashboardFrame, DashboardSession, HttpLogSource, LogSource, LogTable,
    PageLength, PollSchedule, TableQuery,
};
use arkham_store::{Category, FileSlot, LogCache, LogStore, MemorySlot, SnapshotSlot};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use console::ConsoleRenderer;
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("json-logs"));

    match matches.subcommand() {
        Some(("watch", args)) => watch_dashboard(args).await,
        Some(("status", args)) => status(args),
        Some(("table", args)) => table(args).await,
        Some(("purge", args)) => purge(args),
        _ => Ok(()),
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn cli() -> Command {
    let config_arg = Arg::new("config")
        .long("config")
        .short('c')
        .value_parser(value_parser!(PathBuf))
        .help("TOML configuration file");
    let base_url_arg = Arg::new("base-url")
        .long("base-url")
        .help("Backend origin, e.g. http://127.0.0.1:5000");
    let snapshot_arg = Arg::new("snapshot")
        .long("snapshot")
        .value_parser(value_parser!(PathBuf))
        .help("Snapshot file holding the cached log store");

    Command::new("arkham-dash")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Arkham Asylum security dashboard")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("watch")
                .about("Poll the backend and print the live dashboard")
                .arg(config_arg.clone())
                .arg(base_url_arg.clone())
                .arg(snapshot_arg.clone())
                .arg(
                    Arg::new("min-ms")
                        .long("min-ms")
                        .value_parser(value_parser!(u64))
                        .help("Shortest delay between polls"),
                )
                .arg(
                    Arg::new("max-ms")
                        .long("max-ms")
                        .value_parser(value_parser!(u64))
                        .help("Longest delay between polls"),
                ),
        )
        .subcommand(
            Command::new("status")
                .about("Summarize a snapshot without contacting the backend")
                .arg(snapshot_arg.clone().required(true))
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("table")
                .about("Show one category's log table")
                .arg(
                    Arg::new("category")
                        .required(true)
                        .value_parser(value_parser!(Category))
                        .help("network, server_logs, video_surveillance, ..."),
                )
                .arg(config_arg)
                .arg(base_url_arg)
                .arg(Arg::new("search").long("search").help("Case-insensitive filter"))
                .arg(
                    Arg::new("page")
                        .long("page")
                        .default_value("1")
                        .value_parser(value_parser!(usize))
                        .help("Page number, starting at 1"),
                )
                .arg(
                    Arg::new("page-length")
                        .long("page-length")
                        .default_value("15")
                        .value_parser(value_parser!(PageLength))
                        .help("Rows per page: 10, 15, 25, 50 or all"),
                )
                .arg(
                    Arg::new("follow")
                        .long("follow")
                        .action(ArgAction::SetTrue)
                        .help("Reload on the poll schedule until interrupted"),
                ),
        )
        .subcommand(
            Command::new("purge")
                .about("Drop expired records from a snapshot")
                .arg(snapshot_arg.required(true)),
        )
}

fn load_config(args: &ArgMatches) -> Result<DashboardConfig> {
    let mut config = match args.get_one::<PathBuf>("config") {
        Some(path) => DashboardConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => DashboardConfig::new(),
    };
    if let Some(url) = args.get_one::<String>("base-url") {
        config = config.with_base_url(url.clone());
    }
    if let Ok(Some(path)) = args.try_get_one::<PathBuf>("snapshot") {
        config = config.with_snapshot_path(path.clone());
    }
    if let (Ok(min), Ok(max)) = (
        args.try_get_one::<u64>("min-ms"),
        args.try_get_one::<u64>("max-ms"),
    ) {
        let min = min.copied().unwrap_or(config.poll_min_ms);
        let max = max.copied().unwrap_or(config.poll_max_ms);
        config = config.with_poll_range(min, max);
    }
    config.validate()?;
    Ok(config)
}

fn shutdown_on_ctrl_c() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("interrupt received, stopping"),
            Err(err) => tracing::error!(%err, "failed to listen for interrupt"),
        }
        let _ = tx.send(true);
    });
    rx
}

async fn watch_dashboard(args: &ArgMatches) -> Result<()> {
    let config = load_config(args)?;
    let source = HttpLogSource::new(&config)?;
    match snapshot_slot(&config) {
        Some(slot) => run_session(slot, source, config).await,
        None => run_session(MemorySlot::new(), source, config).await,
    }
    Ok(())
}

/// File slot for the configured snapshot path, if any
fn snapshot_slot(config: &DashboardConfig) -> Option<FileSlot> {
    let slot = config.snapshot_path.clone().map(FileSlot::new);
    if slot.is_none() {
        tracing::info!("no snapshot path configured, log cache is kept in memory only");
    }
    slot
}

async fn run_session<S: SnapshotSlot>(slot: S, source: HttpLogSource, config: DashboardConfig) {
    let (cache, origin) = LogCache::restore(slot);
    tracing::info!(?origin, records = cache.store().total_len(), "log store ready");

    let mut session = DashboardSession::new(cache, source, ConsoleRenderer::default(), config);
    session.recompute();
    session.run(shutdown_on_ctrl_c()).await;
}

fn read_snapshot(args: &ArgMatches) -> Result<(FileSlot, LogStore)> {
    let path = args
        .get_one::<PathBuf>("snapshot")
        .context("--snapshot is required")?;
    let slot = FileSlot::new(path.clone());
    let Some(contents) = slot.load()? else {
        bail!("no snapshot at {}", path.display());
    };
    let store = LogStore::from_json(&contents)
        .with_context(|| format!("parsing snapshot {}", path.display()))?;
    Ok((slot, store))
}

fn status(args: &ArgMatches) -> Result<()> {
    let (_, store) = read_snapshot(args)?;
    let limit = DashboardConfig::default().recent_activity_limit;
    let frame = DashboardFrame::from_store(&store, limit);
    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&frame)?);
    } else {
        console::print_frame(&frame);
    }
    Ok(())
}

fn purge(args: &ArgMatches) -> Result<()> {
    let (slot, _) = read_snapshot(args)?;
    let (mut cache, _) = LogCache::restore(slot);
    let removed = cache.purge_expired(chrono::Utc::now());
    cache.persist()?;
    println!("removed {removed} expired records, {} remain", cache.store().total_len());
    Ok(())
}

async fn table(args: &ArgMatches) -> Result<()> {
    let config = load_config(args)?;
    let category = *args
        .get_one::<Category>("category")
        .context("category is required")?;
    let page = args.get_one::<usize>("page").copied().unwrap_or(1);
    let query = TableQuery {
        search: args.get_one::<String>("search").cloned(),
        order: None,
        page: page.saturating_sub(1),
        page_length: args.get_one::<PageLength>("page-length").copied().unwrap_or_default(),
    };

    let source = HttpLogSource::new(&config)?;
    let table = LogTable::for_category(category);

    show_table(&source, &table, category, &query).await?;
    if !args.get_flag("follow") {
        return Ok(());
    }

    let mut schedule = PollSchedule::from_config(&config);
    let mut shutdown = shutdown_on_ctrl_c();
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            () = tokio::time::sleep(schedule.next_delay()) => {
                println!();
                if let Err(err) = show_table(&source, &table, category, &query).await {
                    tracing::warn!(%err, "table reload failed");
                }
            }
        }
    }
    Ok(())
}

async fn show_table(
    source: &HttpLogSource,
    table: &LogTable,
    category: Category,
    query: &TableQuery,
) -> Result<()> {
    let records = source.fetch_category(category).await?;
    let page = table.render(&records, query, &chrono::Local)?;
    console::print_table(&page);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn table_arguments_parse() {
        let matches = cli()
            .try_get_matches_from([
                "arkham-dash",
                "table",
                "biometric_access",
                "--page-length",
                "all",
            ])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        assert_eq!(args.get_one::<Category>("category"), Some(&Category::BiometricAccess));
        assert_eq!(args.get_one::<PageLength>("page-length"), Some(&PageLength::All));
    }

    #[test]
    fn poll_range_overrides_config() {
        let matches = cli()
            .try_get_matches_from(["arkham-dash", "watch", "--min-ms", "500", "--max-ms", "900"])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        let config = load_config(args).unwrap();
        assert_eq!((config.poll_min_ms, config.poll_max_ms), (500, 900));
        assert_eq!(config.snapshot_path, None);
    }

    #[test]
    fn snapshot_slot_follows_config() {
        assert!(snapshot_slot(&DashboardConfig::default()).is_none());

        let config = DashboardConfig::new().with_snapshot_path("/tmp/arkham/store.json");
        let slot = snapshot_slot(&config).unwrap();
        assert_eq!(slot.path(), Path::new("/tmp/arkham/store.json"));
    }

    #[test]
    fn unknown_category_is_rejected() {
        assert!(cli()
            .try_get_matches_from(["arkham-dash", "table", "weather"])
            .is_err());
    }
}
