//! State shared between the tick thread, the network reactor and the
//! dashboard: the world behind its lock, per-slot socket writers behind
//! their own locks, and plain counters.

use std::net::TcpStream;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use ed25519_dalek::SigningKey;

use trek::config::MAX_CLIENTS;
use trek::{Quadrant, World};

/// A bound client's write half. Writes take this lock, never the world lock.
pub type Writer = Arc<Mutex<TcpStream>>;

pub struct Shared {
    pub world: Mutex<World>,
    /// One writer per player slot; `None` while nobody is bound.
    pub links: Mutex<Vec<Option<Writer>>>,
    pub master_key: [u8; 32],
    pub signing: SigningKey,
    pub data_path: PathBuf,
    pub running: AtomicBool,
    pub started: Instant,
    pub bytes_sent: AtomicU64,
    pub bytes_received: AtomicU64,
    pub connections_accepted: AtomicU64,
}

impl Shared {
    pub fn new(world: World, master_key: [u8; 32], signing: SigningKey, data_path: PathBuf) -> Self {
        Self {
            world: Mutex::new(world),
            links: Mutex::new(vec![None; MAX_CLIENTS]),
            master_key,
            signing,
            data_path,
            running: AtomicBool::new(true),
            started: Instant::now(),
            bytes_sent: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            connections_accepted: AtomicU64::new(0),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Detach a slot's writer and mark the player offline. Safe to call from
    /// either thread on a write failure.
    pub fn drop_link(&self, slot: usize) {
        let mut links = self.links.lock().expect("links lock");
        if links[slot].take().is_some() {
            log::info!("client in slot {slot} disconnected");
        }
        drop(links);

        let mut world = self.world.lock().expect("world lock");
        let player = &mut world.galaxy.players[slot];
        player.connected = false;
        player.active = false;
    }

    pub fn stats(&self) -> DashboardStats {
        let world = self.world.lock().expect("world lock");
        let galaxy = &world.galaxy;
        DashboardStats {
            uptime_secs: self.started.elapsed().as_secs(),
            tick: galaxy.tick,
            frame_id: galaxy.master.frame_id,
            players_online: galaxy.players.iter().filter(|p| p.connected).count(),
            players_known: galaxy.players.iter().filter(|p| !p.name.is_empty()).count(),
            npcs_active: galaxy.npcs.iter().filter(|n| n.active).count(),
            stars_active: galaxy.stars.iter().filter(|s| s.active).count(),
            supernova: (galaxy.supernova.timer > 0)
                .then_some((galaxy.supernova.quadrant, galaxy.supernova.timer)),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            connections_accepted: self.connections_accepted.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DashboardStats {
    pub uptime_secs: u64,
    pub tick: u64,
    pub frame_id: i64,
    pub players_online: usize,
    pub players_known: usize,
    pub npcs_active: usize,
    pub stars_active: usize,
    pub supernova: Option<(Quadrant, i32)>,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub connections_accepted: u64,
}
