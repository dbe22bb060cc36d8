use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "wb")]
#[command(about = "wattbid bidding engine CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered bidders and the default
    List,

    /// Print the empty 24-row order skeleton for a delivery date as JSON
    Template {
        /// Delivery date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
    },

    /// Run one bidder against Postgres and submit to the auction
    Run {
        /// Bidder name; omitted or unknown runs the default
        #[arg(long)]
        bidder: Option<String>,

        /// Parameter override, repeatable (key=value)
        #[arg(long = "arg")]
        args: Vec<String>,

        /// Pin the reference date (YYYY-MM-DD) instead of today in bidding.timezone
        #[arg(long = "reference-date")]
        reference_date: Option<String>,

        /// Validate and print orders without contacting the auction
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Layered config paths in merge order
        #[arg(long = "config")]
        config_paths: Vec<String>,
    },

    /// Offline quote from forecast CSV files: hour_ID, quantity, price
    Quote {
        /// Delivery date (YYYY-MM-DD)
        #[arg(long)]
        date: String,

        /// CSV with `time` and `SolarPower` columns
        #[arg(long)]
        solar: String,

        /// CSV with `time` and `WindPower` columns
        #[arg(long)]
        wind: String,

        /// CSV with `time` and `Total demand` columns
        #[arg(long)]
        demand: String,

        /// CSV with `time` and `price` columns
        #[arg(long)]
        price: String,

        #[arg(long)]
        bidder: Option<String>,

        /// Parameter override, repeatable (key=value)
        #[arg(long = "arg")]
        args: Vec<String>,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> env -> overrides)
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Silent if the file does not exist.
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::List => commands::list()?,
        Commands::Template { date } => commands::template(&date)?,
        Commands::Run {
            bidder,
            args,
            reference_date,
            dry_run,
            config_paths,
        } => {
            commands::run::run_bidder(commands::run::RunArgs {
                bidder,
                args,
                reference_date,
                dry_run,
                config_paths,
            })
            .await?
        }
        Commands::Quote {
            date,
            solar,
            wind,
            demand,
            price,
            bidder,
            args,
        } => {
            commands::quote::quote(commands::quote::QuoteArgs {
                date,
                solar,
                wind,
                demand,
                price,
                bidder,
                args,
            })
            .await?
        }
        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = wb_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}
