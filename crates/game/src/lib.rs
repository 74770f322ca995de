pub mod broadcast;
pub mod commands;
pub mod config;
pub mod crypto;
pub mod entity;
pub mod galaxy;
pub mod geom;
pub mod sim;
pub mod wire;

pub use config::{DEFAULT_PORT, GALAXY_FILE, TICK_INTERVAL, TICK_RATE};
pub use crypto::{CipherAlgo, CryptoError, HandshakeError, MASTER_KEY_ENV};
pub use entity::player::{ChatNote, NavState, Player};
pub use galaxy::persist::{self, PersistError};
pub use galaxy::{Galaxy, MasterState, Supernova};
pub use geom::Quadrant;
pub use sim::{TickReport, World};
pub use wire::{
    PacketCommand, PacketHandshake, PacketLogin, PacketMessage, PacketUpdate, WireError,
};
