//! rwmap CLI Binary
//!
//! Generates a read-write locked Go map type specialized for one key and
//! value type.
//!
//! # Usage
//!
//! ```bash
//! # Writes 001_counter.go in the current directory
//! rwmap --name Counter 'map[string]int'
//!
//! # Numeric accumulate operations, custom package, explicit output
//! rwmap --ex --pkg stats -o tally.go 'map[string]int64'
//!
//! # Inspect the specialized syntax tree
//! rwmap --dump-ast 'map[int]bool'
//! ```

use clap::{Parser, ValueEnum};
use rwmap_cli::{
    cli::RwmapConfig,
    commands::{generate::GenerateArgs, generate_command},
    diagnostics::{render_report, setup_error_reporting},
    CliError, Result,
};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(
    name = "rwmap",
    version = env!("CARGO_PKG_VERSION"),
    about = "Generate a read-write locked Go map for concrete key and value types",
    long_about = r#"
rwmap specializes a mutex-guarded Go map template for the key and value types
of a map type expression and writes the generated Go file.

EXAMPLES:
    rwmap 'map[string]int'                    # Writes 001_map.go
    rwmap --name Counter 'map[string]int'     # Writes 001_counter.go
    rwmap --ex -o tally.go 'map[string]int64' # With AddStore/AddStores
    rwmap -o - 'map[int]*Item'                # Print to standard output
    "#
)]
struct Cli {
    /// Map type to specialize for, e.g. map[string]int
    #[arg(value_name = "map[K]V")]
    map_type: String,

    /// Name of the generated type [default: Map]
    #[arg(long)]
    name: Option<String>,

    /// Package name of the generated file [default: main]
    #[arg(long = "pkg", value_name = "PACKAGE")]
    package: Option<String>,

    /// Output file, `-` for standard output [default: 001_<name>.go]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Generate AddStore/AddStores for numeric or string values
    #[arg(long = "ex")]
    extended: bool,

    /// Generate panicking AddStore/AddStores even if the config enables --ex
    #[arg(long = "no-ex", conflicts_with = "extended")]
    no_extended: bool,

    /// Print the specialized syntax tree as JSON instead of Go source
    #[arg(long)]
    dump_ast: bool,

    /// Enable verbose logging (use multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    quiet: bool,

    /// Set log level (overrides --verbose/--quiet)
    #[arg(long, value_enum)]
    log: Option<LogLevel>,

    /// Set log output format
    #[arg(long, value_enum, default_value = "pretty")]
    log_format: LogFormat,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Working directory
    #[arg(short = 'C', long)]
    directory: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_error_reporting()?;
    setup_logging(cli.verbose, cli.quiet, cli.log, cli.log_format)?;

    let verbose = cli.verbose;
    match run(cli) {
        Ok(()) => {
            if verbose > 0 {
                info!("Command completed successfully");
            }
            Ok(())
        }
        Err(e) => {
            if verbose > 0 {
                error!(?e, "detailed error context");
            }
            eprintln!("{}", render_report(e));
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Some(dir) = &cli.directory {
        std::env::set_current_dir(dir).map_err(CliError::Io)?;
    }

    let config = RwmapConfig::load(cli.config.as_deref())?;

    let args = GenerateArgs {
        map_type: cli.map_type,
        name: cli.name,
        package: cli.package,
        output: cli.output,
        extended: match (cli.extended, cli.no_extended) {
            (true, _) => Some(true),
            (false, true) => Some(false),
            (false, false) => None,
        },
        dump_ast: cli.dump_ast,
    };
    generate_command(args, &config)
}

fn setup_logging(
    verbose: u8,
    quiet: bool,
    log_level: Option<LogLevel>,
    log_format: LogFormat,
) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if let Some(level) = log_level {
        EnvFilter::new(match level {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        })
    } else if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // Logs go to stderr so `-o -` output stays clean.
    let formatter = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .with_level(true);

    let installed = match log_format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(formatter)
                .with(filter)
                .try_init()
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(formatter.json())
                .with(filter)
                .try_init()
        }
    };
    installed.map_err(|e| CliError::Config(format!("Failed to setup logging: {}", e)))?;

    Ok(())
}
