pub mod codec;
pub mod engine;
pub mod explosion;
pub mod registry;
pub mod server;
pub mod session;

pub use server::{AddressFamily, GameServer};
