//! # Liftoff - a multiplayer round-based wagering game server
//!
//! Liftoff implements the server side of a "crash" style game: players
//! connect over TCP, stake a wager during a bounded betting window, and
//! watch a multiplier climb until either they cash out or the round
//! explodes.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use liftoff::config::Config;
//! use liftoff::game::{AddressFamily, GameServer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let server = GameServer::new(config);
//!     server.run(AddressFamily::V4, 7878).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`game`] - the round engine, wire codec, registry, and session handling
//! - [`config`] - configuration loading and defaults
//! - [`validation`] - nickname validation
//! - [`metrics`] - in-process round/bet counters
//! - [`logutil`] - log-line sanitization helpers

pub mod config;
pub mod game;
pub mod logutil;
pub mod metrics;
pub mod validation;
