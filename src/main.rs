//! Binary entrypoint for the Liftoff game server.
//!
//! Usage: `liftoff <v4|v6> <port> [--config <path>] [-v|-vv]`

use anyhow::Result;
use clap::Parser;
use log::info;

use liftoff::config::Config;
use liftoff::game::{AddressFamily, GameServer};

#[derive(Parser)]
#[command(name = "liftoff")]
#[command(about = "A multiplayer round-based wagering game server")]
#[command(version)]
struct Cli {
    /// Address family to bind the listening socket on.
    family: AddressFamily,

    /// TCP port to listen on.
    port: u16,

    /// Configuration file path.
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Verbose logging (-v, -vv for more).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(&cli.config).await.unwrap_or_default();
    init_logging(&config, cli.verbose);

    info!("Starting Liftoff v{}", env!("CARGO_PKG_VERSION"));

    let server = GameServer::new(config);
    server.run(cli.family, cli.port).await
}

fn init_logging(config: &Config, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();

    let base_level = match verbosity {
        0 => config
            .logging
            .level
            .parse()
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    if let Some(ref file) = config.logging.file {
        if let Ok(f) = std::fs::OpenOptions::new().create(true).append(true).open(file) {
            let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
            let is_tty = atty::is(atty::Stream::Stdout);

            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());

                if let Ok(mut guard) = write_mutex.lock() {
                    let _ = writeln!(guard, "{}", line);
                }

                if is_tty {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
        }
    } else {
        builder.format(|fmt, record| {
            writeln!(
                fmt,
                "{} [{}] {}",
                chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
                record.level(),
                record.args()
            )
        });
    }

    let _ = builder.try_init();
}
