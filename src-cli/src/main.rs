//! `ahd`: terminal dashboard for AWS Health events.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use ahd_core::config::{load_config, SourceKind};
use ahd_core::dashboard::ViewMode;
use ahd_core::domain::{Actionability, Category, Environment, Status};
use ahd_core::filter::FilterCriteria;
use clap::{Args, Parser, Subcommand, ValueEnum};
use healthdash::{
    build_source, run_export, run_list, run_show, run_watch, run_whoami, ListOptions,
    WatchOptions,
};
use time::OffsetDateTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// AWS Health Events dashboard
#[derive(Parser, Debug)]
#[command(name = "ahd", version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured event source
    #[arg(long, global = true, value_enum)]
    source: Option<SourceArg>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SourceArg {
    Mock,
    File,
    Http,
}

impl From<SourceArg> for SourceKind {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Mock => SourceKind::Mock,
            SourceArg::File => SourceKind::File,
            SourceArg::Http => SourceKind::Http,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum ViewArg {
    #[default]
    Table,
    Account,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch events once and print the dashboard
    List {
        #[command(flatten)]
        filters: FilterArgs,
        #[command(flatten)]
        display: DisplayArgs,
    },
    /// Refresh the dashboard on an interval
    Watch {
        #[command(flatten)]
        filters: FilterArgs,
        #[command(flatten)]
        display: DisplayArgs,
        /// Seconds between polls (defaults to poll_interval_secs)
        #[arg(long)]
        interval: Option<u64>,
        /// Stop after N polls
        #[arg(long)]
        iterations: Option<u32>,
    },
    /// Show one event with its affected resources
    Show {
        /// Event ARN
        arn: String,
        /// Narrow the resource list by id, ARN or type
        #[arg(long, default_value = "")]
        resource_search: String,
    },
    /// Check the current user against the configured source
    Whoami {
        /// Bearer token (defaults to api_token)
        #[arg(long)]
        token: Option<String>,
    },
    /// Write fetched events and their resources to a snapshot file
    Export {
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Case-insensitive text search
    #[arg(long)]
    search: Option<String>,
    /// issue | scheduledChange | accountNotification
    #[arg(long, value_parser = parse_category)]
    category: Option<Category>,
    /// ACTION_REQUIRED | ACTION_MAY_BE_REQUIRED | INFORMATIONAL
    #[arg(long, value_parser = parse_actionability)]
    actionability: Option<Actionability>,
    /// PRD | NPR | DEV | SANDBOX
    #[arg(long, value_parser = parse_environment)]
    environment: Option<Environment>,
    #[arg(long)]
    service: Option<String>,
    #[arg(long)]
    region: Option<String>,
    /// open | upcoming | closed
    #[arg(long, value_parser = parse_status)]
    status: Option<Status>,
}

impl From<FilterArgs> for FilterCriteria {
    fn from(a: FilterArgs) -> Self {
        FilterCriteria {
            search: a.search,
            category: a.category,
            actionability: a.actionability,
            environment: a.environment,
            service: a.service,
            region: a.region,
            status: a.status,
        }
    }
}

#[derive(Args, Debug, Default)]
struct DisplayArgs {
    #[arg(long, value_enum, default_value_t)]
    view: ViewArg,
    /// Expand every account group in the account view
    #[arg(long)]
    expand_all: bool,
    /// Print the derived view as JSON
    #[arg(long)]
    json: bool,
}

fn unknown_value(kind: &str, raw: &str) -> String {
    format!("unrecognized {kind} '{raw}'")
}

fn parse_category(raw: &str) -> Result<Category, String> {
    Category::parse(raw).ok_or_else(|| unknown_value("category", raw))
}

fn parse_actionability(raw: &str) -> Result<Actionability, String> {
    Actionability::parse(&raw.to_ascii_uppercase()).ok_or_else(|| unknown_value("actionability", raw))
}

fn parse_environment(raw: &str) -> Result<Environment, String> {
    Environment::parse(&raw.to_ascii_uppercase()).ok_or_else(|| unknown_value("environment", raw))
}

fn parse_status(raw: &str) -> Result<Status, String> {
    Status::parse(&raw.to_ascii_lowercase()).ok_or_else(|| unknown_value("status", raw))
}

fn list_options(filters: FilterArgs, display: DisplayArgs, limit: usize) -> ListOptions {
    ListOptions {
        filters: filters.into(),
        view: match display.view {
            ViewArg::Table => ViewMode::Table,
            ViewArg::Account => ViewMode::Account,
        },
        expand_all: display.expand_all,
        json: display.json,
        limit,
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr)
                .with_filter(EnvFilter::new(filter)),
        )
        .init();

    let mut config = load_config(cli.config.as_deref())
        .map_err(|e| anyhow::anyhow!("Configuration error: {e}"))?;
    if let Some(source) = cli.source {
        config.source = source.into();
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("Configuration error: {e}"))?;
    }
    let source = build_source(&config).map_err(|e| anyhow::anyhow!("{e}"))?;

    match cli.command {
        Commands::List { filters, display } => {
            let opts = list_options(filters, display, config.max_results);
            print!("{}", run_list(source.as_ref(), &opts)?);
        }
        Commands::Watch {
            filters,
            display,
            interval,
            iterations,
        } => {
            let interval = match interval {
                Some(0) => anyhow::bail!("--interval must be greater than zero"),
                Some(secs) => Duration::from_secs(secs),
                None => config.poll_interval(),
            };
            let opts = WatchOptions {
                list: list_options(filters, display, config.max_results),
                interval,
                iterations,
            };
            run_watch(source.as_ref(), &opts, &mut io::stdout())?;
        }
        Commands::Show {
            arn,
            resource_search,
        } => {
            print!("{}", run_show(source.as_ref(), &arn, &resource_search)?);
        }
        Commands::Whoami { token } => {
            let token = token.or_else(|| config.api_token.clone());
            print!("{}", run_whoami(source.as_ref(), token.as_deref()));
        }
        Commands::Export { out } => {
            let snapshot = run_export(
                source.as_ref(),
                &out,
                config.max_results,
                OffsetDateTime::now_utc(),
            )?;
            println!(
                "Exported {} events to {}",
                snapshot.events.len(),
                out.display()
            );
        }
    }
    Ok(())
}
