//! Server orchestration: binds the listening socket, spawns the round
//! engine, and hands off each accepted connection to a session task.

use anyhow::{Context, Result};
use log::{error, info};
use tokio::net::TcpListener;

use crate::config::Config;
use crate::game::engine::{CommandSender, Engine, RoundTiming};
use crate::game::explosion;
use crate::game::session;

/// Address family the listener binds to, chosen on the CLI per the
/// original protocol's `v4`/`v6` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum AddressFamily {
    #[value(name = "v4")]
    V4,
    #[value(name = "v6")]
    V6,
}

impl AddressFamily {
    fn bind_addr(self, port: u16) -> std::net::SocketAddr {
        match self {
            AddressFamily::V4 => (std::net::Ipv4Addr::UNSPECIFIED, port).into(),
            AddressFamily::V6 => (std::net::Ipv6Addr::UNSPECIFIED, port).into(),
        }
    }
}

/// Top-level server: owns the config, spawns the engine actor, and
/// runs the accept loop. Mirrors the corpus's convention of a single
/// struct coordinating startup and the main run loop.
pub struct GameServer {
    config: Config,
}

impl GameServer {
    pub fn new(config: Config) -> Self {
        GameServer { config }
    }

    /// Bind a listener for the requested address family/port and run
    /// the accept loop until an unrecoverable socket error occurs.
    pub async fn run(self, family: AddressFamily, port: u16) -> Result<()> {
        let timing = RoundTiming {
            betting_secs: self.config.round.betting_secs,
            pause_secs: self.config.round.pause_secs,
            tick_ms: self.config.round.tick_ms,
            multiplier_increment: self.config.round.multiplier_increment,
        };
        let model = explosion::model_by_name(&self.config.round.explosion_formula);
        let engine = Engine::new(self.config.round.capacity, model, timing);
        let (cmd_tx, cmd_rx): (CommandSender, _) = tokio::sync::mpsc::unbounded_channel();
        tokio::spawn(engine.run(cmd_rx));

        let addr = family.bind_addr(port);
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        info!("event=listening | addr={}", addr);

        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    info!("event=accept | peer={}", peer);
                    let cmd_tx = cmd_tx.clone();
                    tokio::spawn(session::handle_connection(stream, peer, cmd_tx));
                }
                Err(e) => {
                    error!("event=accept_failed | reason={}", e);
                }
            }
        }
    }
}
