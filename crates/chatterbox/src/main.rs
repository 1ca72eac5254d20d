//! Chatterbox server entry point.

use std::path::PathBuf;

use anyhow::Context as _;
use chatterbox::chat::ChatApp;
use chatterbox::config::ConfigLoader;
use chatterbox::telemetry::init_telemetry;

/// Configuration file read when `--config` is not given.
const DEFAULT_CONFIG_FILE: &str = "chatterbox.toml";

/// Command-line arguments.
struct Args {
    /// Path to configuration file.
    config: Option<PathBuf>,
}

impl Args {
    fn parse() -> Self {
        let mut args = std::env::args().skip(1);
        let mut config = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    config = args.next().map(PathBuf::from);
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("chatterbox {}", chatterbox::VERSION);
                    std::process::exit(0);
                }
                other => {
                    eprintln!("Unknown argument: {other}");
                    eprintln!("Use --help for usage information");
                    std::process::exit(1);
                }
            }
        }

        Self { config }
    }
}

fn print_help() {
    println!(
        r"Chatterbox - long-polling chat server

USAGE:
    chatterbox [OPTIONS]

OPTIONS:
    -c, --config <PATH>    Path to configuration file (TOML or JSON)
    -h, --help             Print help information
    -v, --version          Print version information

Without --config, ./chatterbox.toml is read if present. A .env file is
loaded, then CHATTERBOX__* variables override the file. PORT, if set,
replaces the listen port.

ENVIRONMENT VARIABLES:
    CHATTERBOX__SERVER__HTTP_ADDR              Listen address (default: 127.0.0.1:8080)
    CHATTERBOX__CHAT__LONG_POLL_TIMEOUT_SECS   Long-poll wait (default: 60)
    CHATTERBOX__CHAT__SEED_DEMO_DATA           Seed demo users and messages
    CHATTERBOX__INVITES__CREATION_ENABLED      Allow POST /api/v1/invites
    CHATTERBOX__FRONTEND__MAP_FILE             Front-end path map (JSON)
    PORT                                       Listen port override
"
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let loader = ConfigLoader::new().with_defaults();
    let loader = match &args.config {
        Some(path) => loader.with_file(path),
        None => loader.with_optional_file(DEFAULT_CONFIG_FILE),
    }
    .context("failed to read configuration file")?;
    let config = loader
        .with_dotenv()
        .context("failed to read .env")?
        .with_env_prefix("CHATTERBOX")
        .with_port_env()
        .load()
        .context("invalid configuration")?;

    init_telemetry(&config.telemetry).context("failed to initialize telemetry")?;
    tracing::info!(
        version = chatterbox::VERSION,
        addr = %config.server.http_addr,
        "starting chatterbox"
    );

    let app = ChatApp::from_config(&config).context("failed to build application")?;
    app.into_server(&config).run().await?;

    tracing::info!("chatterbox stopped");
    Ok(())
}
