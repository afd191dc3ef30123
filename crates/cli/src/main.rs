use std::{fs::File, io::stderr, path::PathBuf, sync::Mutex};

use clap::{ArgAction, Parser};
use commands::Commands;
use modkit_telemetry::TelemetryConfig;
use tracing::{debug, error, info};

mod commands;
mod config;
pub mod output;

pub use self::config::Options;
use crate::config::{Config, KnownDirs};

#[derive(Parser)]
#[command(
    name = "modkit",
    version,
    about = "Headless harness for modkit mods and their options menus",
    propagate_version = true,
    flatten_help = true
)]
struct Cli {
    #[clap(flatten)]
    config: Options,

    /// Disable tracing logs on the console.
    #[clap(short, long, action = ArgAction::SetTrue)]
    quiet: bool,

    /// Read this configuration file after the ones found in the search paths.
    #[clap(long, value_hint = clap::ValueHint::FilePath)]
    config_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn main() {
    let cli = Cli::parse();

    let known_dirs = KnownDirs::default();
    let config_sources: Vec<PathBuf> = known_dirs
        .config_dirs()
        .map(|dir| dir.join("modkit.toml"))
        .chain(cli.config_file)
        .collect();

    let (file_options, config_failures) = Options::from_files(&config_sources);
    let config = Config {
        known_dirs,
        options: file_options.merge(cli.config),
    };

    modkit_telemetry::install_error_handler(config.options.full_tracebacks);

    let mut telemetry_config = TelemetryConfig::default();
    if !cli.quiet {
        telemetry_config = telemetry_config.with_console_writer(stderr);
    }

    if let Some(log_file) = &config.options.log_file {
        match File::create(log_file) {
            Ok(file) => telemetry_config = telemetry_config.with_file_writer(Mutex::new(file)),
            Err(e) => eprintln!("couldn't open log file {}: {e}", log_file.display()),
        }
    }

    let _telemetry_guard = match modkit_telemetry::install(telemetry_config) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("couldn't install logging: {e}");
            None
        }
    };

    for path in &config_sources {
        debug!(?path, "searched for configuration in");
    }

    for (path, error) in config_failures {
        error!(?path, ?error, "skipping unreadable configuration file");
    }

    info!(version = env!("CARGO_PKG_VERSION"));

    let result = modkit_telemetry::with_root_span("modkit", "run command", || match cli.command {
        Commands::Info => commands::info::info(config),
        Commands::Menu(args) => commands::menu::menu(config, args),
        Commands::Settings(args) => commands::settings::show(config, args),
        Commands::Schema => commands::schema::schema(),
    });

    if let Err(e) = result {
        eprintln!("Error: {e:?}");
        std::process::exit(1);
    }
}
