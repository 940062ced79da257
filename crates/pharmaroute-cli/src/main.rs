mod commands;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use pharmaroute_cli::output::{print_footer, OutputFormat};
use pharmaroute_lib::RoutingConfig;

use commands::route::RouteCommandArgs;
use commands::LocationArgs;

#[derive(Parser, Debug)]
#[command(author, version, about = "Find the nearest pharmacy and walk there")]
struct Cli {
    /// Override the dataset directory or file path.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Suppress the elapsed-time footer.
    #[arg(long, global = true)]
    no_footer: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import a JSON map export, replacing the current dataset.
    Import {
        /// Path to the JSON export.
        file: PathBuf,
    },
    /// Report the dataset location and row counts.
    Info,
    /// List nearby pharmacies by straight-line distance.
    Nearest {
        #[command(flatten)]
        location: LocationArgs,
        /// Number of pharmacies to list.
        #[arg(long)]
        limit: Option<usize>,
        /// Rank by walking route over the road network instead of straight line.
        #[arg(long)]
        network: bool,
    },
    /// Compute walking directions to a pharmacy.
    Route {
        #[command(flatten)]
        location: LocationArgs,
        /// Route to the pharmacy with this name instead of the nearest one.
        #[arg(long = "to")]
        to: Option<String>,
        /// Also write the route as GeoJSON to this path.
        #[arg(long)]
        geojson: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let started = Instant::now();
    let target = cli.data_dir.as_deref();

    match cli.command {
        Command::Import { file } => {
            commands::import::handle_import_command(target, cli.format, &file)?
        }
        Command::Info => commands::info::handle_info_command(target, cli.format)?,
        Command::Nearest {
            location,
            limit,
            network,
        } => {
            let config = load_config()?;
            commands::nearest::handle_nearest_command(
                target, cli.format, &config, &location, limit, network,
            )?
        }
        Command::Route {
            location,
            to,
            geojson,
        } => {
            let config = load_config()?;
            let args = RouteCommandArgs {
                location,
                to,
                geojson,
            };
            commands::route::handle_route_command(target, cli.format, &config, &args)?
        }
    }

    if !cli.no_footer && cli.format != OutputFormat::Json {
        print_footer(started.elapsed());
    }
    Ok(())
}

fn load_config() -> Result<RoutingConfig> {
    RoutingConfig::from_env().context("invalid PHARMAROUTE_* configuration")
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
