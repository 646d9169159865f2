//! Nightshift helper
//!
//! Command-line entry point: `nightshift-helper [on|off|toggle|status|temp [0-100]]`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nightshift::client::BlueLightClient;
use nightshift::command::{self, Command};
use nightshift::config::NightshiftConfig;
use nightshift::ffi::{Bridge, LibObjc, LibraryLoader};
use nightshift::logging;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "nightshift-helper")]
#[command(version)]
#[command(about = "Control macOS Night Shift", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (default: $NIGHTSHIFT_CONFIG, then ~/.config/nightshift/nightshift.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Framework binary to load
    #[arg(long, global = true)]
    framework: Option<PathBuf>,

    /// Class to instantiate
    #[arg(long, global = true)]
    class: Option<String>,

    /// Reject malformed temp arguments instead of reading
    #[arg(long, global = true)]
    strict: bool,

    /// More log output on stderr (repeatable)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Print on or off (default)
    Status,

    /// Enable Night Shift
    On,

    /// Disable Night Shift
    Off,

    /// Flip Night Shift and print the new state
    Toggle,

    /// Print the strength, or set it when a percentage is given
    Temp {
        /// Strength from 0 to 100
        #[arg(allow_hyphen_values = true)]
        value: Option<String>,
    },

    /// Print every field of the status record
    Info,

    /// Print whether this machine supports Night Shift
    Supported,

    /// Resolve every known method and report which are missing
    Check,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = match &cli.config {
        Some(path) => NightshiftConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => NightshiftConfig::load_from_env().context("loading configuration")?,
    };
    if let Some(framework) = cli.framework {
        config.framework.path = framework;
    }
    if let Some(class) = cli.class {
        config.framework.class = class;
    }
    let strict = cli.strict || config.cli.strict_arguments;

    logging::init(config.log.level.raised(cli.verbose));

    // Arguments are validated before anything native is touched.
    let command = match cli.command.unwrap_or(Commands::Status) {
        Commands::Status => Command::Status,
        Commands::On => Command::On,
        Commands::Off => Command::Off,
        Commands::Toggle => Command::Toggle,
        Commands::Temp { value } => Command::temp(value.as_deref(), strict)?,
        Commands::Info => Command::Info,
        Commands::Supported => Command::Supported,
        Commands::Check => Command::Check,
    };

    let mut loader = LibraryLoader::new();
    let framework = loader.load(&config.framework.path)?;
    let runtime = LibObjc::load(&mut loader, &config.runtime.objc_library)?;
    let bridge = Bridge::connect(runtime, framework, &config.framework.class)?;
    let mut client = BlueLightClient::new(bridge);

    let outcome = command::execute(&mut client, command)?;
    println!("{}", outcome);

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
