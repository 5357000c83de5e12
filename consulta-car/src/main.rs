//! Point d'entrée CLI pour consulta-car

use anyhow::Result;
use clap::Parser;
use consulta_car::config::Settings;
use tracing::{debug, Level};
use tracing_subscriber::{fmt, EnvFilter};

// Charger .env au démarrage
fn load_env() {
    // Chercher .env dans le répertoire courant ou parent
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

mod cli;

use cli::Commands;

/// Look up the ZEE zones and APSE areas overlapping a CAR property
#[derive(Parser)]
#[command(name = "consulta-car")]
#[command(author, version)]
#[command(about = "Overlay a CAR property with the Tocantins ZEE and APSE layers")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    // Charger .env avant tout
    load_env();

    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Query {
            cars,
            car,
            zee,
            apse,
            pretty,
            fragments_out,
        } => {
            let settings = Settings::from_env().with_overrides(car, zee, apse);
            debug!(?settings, "Settings");
            cli::cmd_query(&cars, &settings, pretty, fragments_out.as_deref())?;
        }
        Commands::Inspect { path } => {
            cli::cmd_inspect(&path)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    // Logs sur stderr, stdout reste réservé au JSON
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
