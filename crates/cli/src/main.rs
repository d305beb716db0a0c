mod config_commands;

use std::path::{Path, PathBuf};

use {
    anyhow::Context,
    clap::{Parser, Subcommand, ValueEnum},
    dynconf_config::{Settings, loader, resolve_value, settings},
    serde_json::{Map, Value},
    tracing::{debug, error, info},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "dynconf", about = "Resolve configuration files with @env, @math and @format directives")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file to use instead of searching the standard locations.
    #[arg(long, short, global = true, env = "DYNCONF_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and resolve the configuration, then print it (default).
    Resolve {
        #[arg(long, short, value_enum, default_value_t = OutputFormat::Json)]
        output: OutputFormat,
    },
    /// Print one resolved value by dotted path.
    Get { key: String },
    /// Resolve a single value, e.g. `dynconf eval "@math 60 * 60"`.
    Eval { value: String },
    /// Validate the configuration file and report errors/warnings.
    Check {
        /// Show informational diagnostics in addition to errors and warnings.
        #[arg(long)]
        verbose: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
    Toml,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Load, resolve and install the configuration. Any failure is fatal: the
/// error is logged with the file it came from and the process exits non-zero.
fn load_or_exit(explicit: Option<&Path>) -> &'static Settings {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match loader::find_config_file() {
            Some(path) => path,
            None => {
                error!("no config file found; pass --config or create dynconf.yaml");
                std::process::exit(1);
            },
        },
    };

    debug!(path = %path.display(), "loading config");
    let loaded = loader::load_config(&path)
        .map(|s| s.with_version(env!("CARGO_PKG_VERSION")))
        .and_then(settings::install);

    match loaded {
        Ok(settings) => {
            info!(
                path = %path.display(),
                keys = settings.as_map().len(),
                timezone = %settings.timezone(),
                "configuration resolved"
            );
            settings
        },
        Err(e) => {
            error!(path = %path.display(), error = %e, "failed to resolve configuration");
            std::process::exit(1);
        },
    }
}

fn render(values: &Map<String, Value>, output: OutputFormat) -> anyhow::Result<String> {
    Ok(match output {
        OutputFormat::Json => serde_json::to_string_pretty(values)?,
        OutputFormat::Yaml => serde_yaml::to_string(values)?,
        OutputFormat::Toml => {
            toml::to_string_pretty(values).context("resolved config cannot be written as TOML")?
        },
    })
}

fn print_value(value: &Value) -> anyhow::Result<()> {
    match value {
        Value::String(s) => println!("{s}"),
        Value::Null => println!(),
        other => println!("{}", serde_json::to_string_pretty(other)?),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    // Values from `.env` become visible to `@env` directives.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    debug!(version = env!("CARGO_PKG_VERSION"), "dynconf starting");

    match cli.command {
        None => {
            let settings = load_or_exit(cli.config.as_deref());
            println!("{}", render(settings.as_map(), OutputFormat::Json)?);
        },
        Some(Commands::Resolve { output }) => {
            let settings = load_or_exit(cli.config.as_deref());
            println!("{}", render(settings.as_map(), output)?);
        },
        Some(Commands::Get { key }) => {
            let settings = load_or_exit(cli.config.as_deref());
            match settings.require(&key) {
                Ok(value) => print_value(value)?,
                Err(e) => {
                    error!(key = %key, error = %e, "configuration key lookup failed");
                    std::process::exit(1);
                },
            }
        },
        Some(Commands::Eval { value }) => {
            match resolve_value(&Value::String(value)) {
                Ok(resolved) => print_value(&resolved)?,
                Err(e) => {
                    error!(error = %e, "failed to resolve value");
                    std::process::exit(1);
                },
            }
        },
        Some(Commands::Check { verbose }) => {
            config_commands::check(cli.config.as_deref(), verbose);
        },
    }

    Ok(())
}
