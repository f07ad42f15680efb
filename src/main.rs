use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use invoice_dashboard::config::{config_dir, load_config, resolve_path, CONFIG_TEMPLATE};
use invoice_dashboard::display;
use invoice_dashboard::export::export_to_dir;
use invoice_dashboard::filter::selection;
use invoice_dashboard::ledger::derive::is_period;
use invoice_dashboard::summary::{top_n, Metric};
use invoice_dashboard::{
    render, Config, DashboardError, DashboardView, FilterState, Result, Snapshot, SnapshotCache,
    SourceSpec,
};

#[derive(Parser)]
#[command(name = "dashboard")]
#[command(version, about = "Invoice margin dashboard for the terminal", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct GlobalArgs {
    /// Path to config directory (default: ~/.invoice-dashboard or XDG config)
    #[arg(short = 'C', long, global = true)]
    config_dir: Option<PathBuf>,

    /// Workbook or CSV file to read (overrides [source] path)
    #[arg(long, global = true)]
    source: Option<PathBuf>,

    /// Sheet to read (default depends on the layout)
    #[arg(long, global = true)]
    sheet: Option<String>,

    /// Column layout of the source: invoices or combined
    #[arg(long, global = true)]
    layout: Option<String>,

    /// Only rows for this client ("all" for every client)
    #[arg(long, global = true)]
    client: Option<String>,

    /// Only rows for this period, YYYY-MM ("all" for every period)
    #[arg(long, global = true)]
    period: Option<String>,

    /// Only rows for this broker ("all" for every broker)
    #[arg(long, global = true)]
    broker: Option<String>,

    /// Rows shown in ranking tables (default: [display] top_n)
    #[arg(long, global = true)]
    top: Option<usize>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config directory with a template config.toml
    Init,

    /// Show headline figures for the current filters
    Summary,

    /// Summary by client
    Clients {
        /// Ranking metric
        #[arg(long, value_enum, default_value_t = SortBy::Profit)]
        by: SortBy,
    },

    /// Summary by client and project
    Projects {
        /// Ranking metric
        #[arg(long, value_enum, default_value_t = SortBy::Profit)]
        by: SortBy,
    },

    /// Summary by period with growth against the previous period
    Periods,

    /// Summary by broker
    Brokers {
        /// Ranking metric
        #[arg(long, value_enum, default_value_t = SortBy::Paid)]
        by: SortBy,
    },

    /// List invoice rows, newest first
    Records {
        /// Number of rows to show (default: all)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// List the values accepted by --client, --period and --broker
    Options,

    /// Export the filtered rows to a timestamped CSV file
    Export {
        /// Output directory (default: [export] output_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Interactive session: change filters and re-render without reloading
    Shell,
}

#[derive(Clone, Copy, ValueEnum)]
enum SortBy {
    Charged,
    Paid,
    Profit,
    Margin,
    Invoices,
}

impl From<SortBy> for Metric {
    fn from(s: SortBy) -> Self {
        match s {
            SortBy::Charged => Metric::TotalCharged,
            SortBy::Paid => Metric::TotalPaidBroker,
            SortBy::Profit => Metric::GrossProfit,
            SortBy::Margin => Metric::MarginPct,
            SortBy::Invoices => Metric::InvoiceCount,
        }
    }
}

/// A dashboard tab, as printed by a subcommand or a shell command
#[derive(Clone, Copy)]
enum Tab {
    Summary,
    Clients(SortBy),
    Projects(SortBy),
    Periods,
    Brokers(SortBy),
    Records(Option<usize>),
}

/// Resolved settings for one run
struct Session {
    config: Config,
    spec: SourceSpec,
    /// Base for relative export paths
    base_dir: PathBuf,
    /// Rows shown in ranking tables
    top: usize,
    json: bool,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let Cli { global, command } = Cli::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (warn)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if global.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .compact()
                .with_writer(io::stderr),
        )
        .init();

    let cfg_dir = match &global.config_dir {
        Some(p) => p.clone(),
        None => config_dir()?,
    };

    match command {
        Commands::Init => cmd_init(&cfg_dir),
        command => dispatch(&global, &cfg_dir, command),
    }
}

fn dispatch(global: &GlobalArgs, cfg_dir: &Path, command: Commands) -> Result<()> {
    let session = load_session(global, cfg_dir)?;
    let filters = parse_filters(
        global.client.as_deref(),
        global.period.as_deref(),
        global.broker.as_deref(),
    )?;

    match command {
        Commands::Init => cmd_init(cfg_dir),
        Commands::Summary => cmd_show(&session, &filters, Tab::Summary),
        Commands::Clients { by } => cmd_show(&session, &filters, Tab::Clients(by)),
        Commands::Projects { by } => cmd_show(&session, &filters, Tab::Projects(by)),
        Commands::Periods => cmd_show(&session, &filters, Tab::Periods),
        Commands::Brokers { by } => cmd_show(&session, &filters, Tab::Brokers(by)),
        Commands::Records { limit } => cmd_show(&session, &filters, Tab::Records(limit)),
        Commands::Options => cmd_options(&session),
        Commands::Export { output } => cmd_export(&session, &filters, output),
        Commands::Shell => cmd_shell(&session, filters),
    }
}

/// Initialize config directory with the template file
fn cmd_init(cfg_dir: &Path) -> Result<()> {
    use std::fs;

    if cfg_dir.exists() {
        return Err(DashboardError::AlreadyInitialized(cfg_dir.to_path_buf()));
    }

    fs::create_dir_all(cfg_dir)?;
    fs::write(cfg_dir.join("config.toml"), CONFIG_TEMPLATE)?;

    println!("Initialized dashboard config at: {}", cfg_dir.display());
    println!();
    println!("Next steps:");
    println!(
        "  1. Point [source] path at your workbook:  $EDITOR {}/config.toml",
        cfg_dir.display()
    );
    println!("  2. Check the headline figures:            dashboard summary");

    Ok(())
}

/// Merge config.toml with command-line overrides
fn load_session(cli: &GlobalArgs, cfg_dir: &Path) -> Result<Session> {
    let config_file = cfg_dir.join("config.toml");
    let (config, base_dir) = if config_file.exists() {
        (load_config(cfg_dir)?, cfg_dir.to_path_buf())
    } else if cli.source.is_some() {
        debug!(config = %config_file.display(), "no config file, using defaults");
        (Config::default(), std::env::current_dir()?)
    } else if !cfg_dir.exists() {
        return Err(DashboardError::ConfigNotFound(cfg_dir.to_path_buf()));
    } else {
        return Err(DashboardError::ConfigFileNotFound(config_file));
    };

    let layout = match &cli.layout {
        Some(l) => l.parse()?,
        None => config.source.layout,
    };

    let path = match &cli.source {
        Some(p) => p.clone(),
        None => config
            .source
            .path
            .as_deref()
            .map(|p| resolve_path(p, cfg_dir))
            .ok_or(DashboardError::NoSourceConfigured)?,
    };

    let spec = SourceSpec {
        path,
        sheet: cli.sheet.clone().or_else(|| config.source.sheet.clone()),
        layout,
        aliases: config.columns.clone(),
    };

    Ok(Session {
        top: cli.top.unwrap_or(config.display.top_n),
        json: cli.json,
        config,
        spec,
        base_dir,
    })
}

fn parse_filters(
    client: Option<&str>,
    period: Option<&str>,
    broker: Option<&str>,
) -> Result<FilterState> {
    let filters = FilterState::from_selections(client, period, broker);
    if let Some(p) = &filters.period {
        if !is_period(p) {
            return Err(DashboardError::InvalidPeriod(p.clone()));
        }
    }
    Ok(filters)
}

fn snapshot(session: &Session) -> Result<std::sync::Arc<Snapshot>> {
    SnapshotCache::global().get_or_load(|| Snapshot::load(&session.spec))
}

fn cmd_show(session: &Session, filters: &FilterState, tab: Tab) -> Result<()> {
    let snapshot = snapshot(session)?;
    let view = render(&snapshot, filters);
    print_tab(session, &view, tab)
}

fn describe_filters(filters: &FilterState) -> String {
    let value = |v: &Option<String>| v.clone().unwrap_or_else(|| "all".to_string());
    format!(
        "Filters: client={}, period={}, broker={}",
        value(&filters.client),
        value(&filters.period),
        value(&filters.broker)
    )
}

fn print_tab(session: &Session, view: &DashboardView, tab: Tab) -> Result<()> {
    let symbol = session.config.display.currency_symbol.as_str();
    let limit = session.top;

    if session.json {
        let json = match tab {
            Tab::Summary => serde_json::to_string_pretty(&view.kpis)?,
            Tab::Clients(by) => {
                serde_json::to_string_pretty(&top_n(&view.clients, by.into(), limit))?
            }
            Tab::Projects(by) => {
                serde_json::to_string_pretty(&top_n(&view.projects, by.into(), limit))?
            }
            Tab::Periods => serde_json::to_string_pretty(&serde_json::json!({
                "periods": view.periods,
                "trend": view.trend,
            }))?,
            Tab::Brokers(by) => {
                serde_json::to_string_pretty(&top_n(&view.brokers, by.into(), limit))?
            }
            Tab::Records(n) => {
                let n = n.unwrap_or(view.records.len()).min(view.records.len());
                let details: Vec<_> = view.records[..n].iter().map(|r| r.detail()).collect();
                serde_json::to_string_pretty(&details)?
            }
        };
        println!("{json}");
        return Ok(());
    }

    if !view.filters.is_unset() {
        println!("{}", describe_filters(&view.filters));
    }

    if view.is_empty() && !matches!(tab, Tab::Summary) {
        println!("No invoices match the current filters.");
        return Ok(());
    }

    let table = match tab {
        Tab::Summary => display::kpi_table(&view.kpis, symbol),
        Tab::Clients(by) => display::table(display::client_rows(
            &top_n(&view.clients, by.into(), limit),
            symbol,
        )),
        Tab::Projects(by) => display::table(display::project_rows(
            &top_n(&view.projects, by.into(), limit),
            symbol,
        )),
        Tab::Periods => display::table(display::period_rows(&view.periods, &view.trend, symbol)),
        Tab::Brokers(by) => display::table(display::broker_rows(
            &top_n(&view.brokers, by.into(), limit),
            symbol,
        )),
        Tab::Records(n) => {
            let n = n.unwrap_or(view.records.len()).min(view.records.len());
            display::table(display::record_rows(&view.records[..n], symbol))
        }
    };
    println!("{table}");

    if view.is_empty() {
        println!("No invoices match the current filters.");
    } else if let Tab::Records(_) = tab {
        println!();
        println!(
            "Total: {} rows, {} charged, {} gross profit ({})",
            view.records.len(),
            display::format_money(view.kpis.total_charged, symbol),
            display::format_money(view.kpis.gross_profit, symbol),
            display::format_pct(view.kpis.margin_pct)
        );
    }

    Ok(())
}

fn cmd_options(session: &Session) -> Result<()> {
    let snapshot = snapshot(session)?;
    let options = snapshot.options();
    if session.json {
        println!("{}", serde_json::to_string_pretty(&options)?);
    } else {
        print!("{}", display::options_text(&options));
    }
    Ok(())
}

fn export_dir(session: &Session, output: Option<PathBuf>) -> PathBuf {
    output.unwrap_or_else(|| resolve_path(&session.config.export.output_dir, &session.base_dir))
}

fn cmd_export(session: &Session, filters: &FilterState, output: Option<PathBuf>) -> Result<()> {
    let snapshot = snapshot(session)?;
    let filtered = filters.apply(snapshot.records());
    let path = export_to_dir(
        &export_dir(session, output),
        filtered.iter().copied(),
        chrono::Local::now(),
    )?;

    println!("Exported {} rows", filtered.len());
    println!("  Saved: {}", path.display());
    Ok(())
}

const SHELL_HELP: &str = "Commands:
  client <name|all>   period <YYYY-MM|all>   broker <name|all>   clear
  summary  clients  projects  periods  brokers  records [n]
  options  export  reload  help  quit";

/// Read commands from stdin until EOF or `quit`
fn cmd_shell(session: &Session, mut filters: FilterState) -> Result<()> {
    let cache = SnapshotCache::global();
    let loaded = cache.get_or_load(|| Snapshot::load(&session.spec))?;
    println!(
        "Loaded {} rows from {} ({})",
        loaded.records().len(),
        loaded.path().display(),
        loaded.sheet()
    );
    println!("{SHELL_HELP}");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("dashboard> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let line = line?;
        let (command, arg) = match line.trim().split_once(' ') {
            Some((c, a)) => (c, Some(a.trim())),
            None => (line.trim(), None),
        };

        let tab = match command {
            "" => continue,
            "quit" | "exit" => break,
            "help" => {
                println!("{SHELL_HELP}");
                continue;
            }
            "client" | "period" | "broker" => {
                let mut next = filters.clone();
                match command {
                    "client" => next.client = selection(arg),
                    "period" => next.period = selection(arg),
                    _ => next.broker = selection(arg),
                }
                match parse_filters(
                    next.client.as_deref(),
                    next.period.as_deref(),
                    next.broker.as_deref(),
                ) {
                    Ok(f) => filters = f,
                    Err(e) => {
                        println!("Error: {e}");
                        continue;
                    }
                }
                println!("{}", describe_filters(&filters));
                Tab::Summary
            }
            "clear" => {
                filters = FilterState::default();
                println!("{}", describe_filters(&filters));
                Tab::Summary
            }
            "reload" => {
                match cache.reload(|| Snapshot::load(&session.spec)) {
                    Ok(s) => println!("Reloaded {} rows", s.records().len()),
                    Err(e) => println!("Error: {e} (keeping previous data)"),
                }
                continue;
            }
            "options" => {
                cmd_options(session)?;
                continue;
            }
            "export" => {
                if let Err(e) = cmd_export(session, &filters, None) {
                    println!("Error: {e}");
                }
                continue;
            }
            "summary" => Tab::Summary,
            "clients" => Tab::Clients(SortBy::Profit),
            "projects" => Tab::Projects(SortBy::Profit),
            "periods" => Tab::Periods,
            "brokers" => Tab::Brokers(SortBy::Paid),
            "records" => Tab::Records(arg.and_then(|a| a.parse().ok())),
            other => {
                println!("Unknown command '{other}'. Type 'help' for commands.");
                continue;
            }
        };

        let current = snapshot(session)?;
        let view = render(&current, &filters);
        print_tab(session, &view, tab)?;
    }

    Ok(())
}
