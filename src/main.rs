//! icon-resolver CLI.
//!
//! # Architecture Overview
//!
//! ```text
//!   icon id + params
//!        │
//!        ▼
//!   ┌──────────────┐   miss   ┌────────────────────────────────────────┐
//!   │ icon::key    │────────▶ │ fetch::failover                         │
//!   │ canonicalize │          │  host 0 ─▶ host 1 ─▶ ... (delay between)│
//!   └──────┬───────┘          │  transport → markup::parser → sanitizer │
//!          │ key              └───────────────────┬────────────────────┘
//!          ▼                                      │
//!   ┌──────────────┐   shared fetch handle        │
//!   │ cache (LRU)  │ ◀────────────────────────────┘
//!   └──────────────┘
//!
//!   config (TOML / configure patch) → validation → registry → engine
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use icon_resolver::config::loader::load_patch;
use icon_resolver::icon::canonicalize;
use icon_resolver::observability::logging;
use icon_resolver::{ConfigPatch, IconEngine, IconRequest, RenderParams};

#[derive(Parser)]
#[command(name = "icon-resolver")]
#[command(about = "Resolve icon identifiers into sanitized SVG markup", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch an icon and print it
    Resolve {
        /// Icon identifier, e.g. mdi:github
        icon: String,

        /// Render parameter as name=value (color, flip, rotate, size, download, box)
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,

        /// TOML configuration file applied over the defaults
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// API host, repeatable; replaces the configured host list
        #[arg(long = "host")]
        hosts: Vec<String>,

        #[arg(short, long, value_enum, default_value_t = Format::Svg)]
        format: Format,
    },
    /// Print the cache key and request URLs for an icon
    Key {
        icon: String,

        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,

        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the effective configuration as TOML
    Config {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Svg,
    Json,
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))
}

fn build_request(icon: String, params: &[(String, String)]) -> Result<IconRequest, Box<dyn std::error::Error>> {
    let params = RenderParams::from_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;
    Ok(IconRequest::new(icon).with_params(params))
}

fn build_engine(
    config: Option<PathBuf>,
    hosts: Vec<String>,
) -> Result<IconEngine, Box<dyn std::error::Error>> {
    let engine = IconEngine::new()?;
    if let Some(path) = config {
        engine.configure(load_patch(&path)?)?;
        tracing::info!(path = %path.display(), "Configuration loaded");
    }
    if !hosts.is_empty() {
        engine.configure(ConfigPatch::default().hosts(hosts))?;
    }
    Ok(engine)
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init(logging::DEFAULT_FILTER);

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Resolve {
            icon,
            params,
            config,
            hosts,
            format,
        } => {
            let request = build_request(icon, &params)?;
            let engine = build_engine(config, hosts)?;
            let data = engine.resolve_icon(&request).await?;
            match format {
                Format::Svg => println!("{}", data.to_svg()),
                Format::Json => println!("{}", serde_json::to_string_pretty(data.as_ref())?),
            }
        }
        Commands::Key {
            icon,
            params,
            config,
        } => {
            let request = build_request(icon, &params)?;
            let engine = build_engine(config, Vec::new())?;
            let config = engine.get_configuration();
            let canonical = canonicalize(&request);
            println!("{}", canonical.key);
            for index in 0..config.hosts.len() {
                println!("{}", canonical.url(&config.hosts, index)?);
            }
        }
        Commands::Config { config } => {
            let engine = build_engine(config, Vec::new())?;
            print!("{}", toml::to_string_pretty(engine.get_configuration().as_ref())?);
        }
    }

    Ok(())
}
