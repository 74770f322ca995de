//! Game-balance constants. Centralized so the simulation, the commands and
//! the tests agree on the same numbers.

use std::time::Duration;

pub const DEFAULT_PORT: u16 = 5000;
pub const TICK_RATE: u32 = 30;
pub const TICK_INTERVAL: Duration = Duration::from_nanos(33_333_333);

pub const GALAXY_VERSION: i32 = 20260210;
pub const GALAXY_FILE: &str = "galaxy.dat";

/* Resources & limits */
pub const MAX_ENERGY_CAPACITY: i32 = 1_000_000;
pub const MAX_TORPEDO_CAPACITY: i32 = 1000;
pub const ENERGY_BASE_RECHARGE: i32 = 9_999_999;
pub const MAX_CARGO_ENERGY: i32 = 100_000;
pub const MAX_CARGO_TORPEDOES: i32 = 100;

/* Combat */
pub const DMG_TORPEDO: i32 = 75_000;
pub const DMG_TORPEDO_PLATFORM: i32 = 50_000;
pub const DMG_TORPEDO_MONSTER: i32 = 100_000;
pub const DMG_MINE: i32 = 25_000;
pub const SHIELD_MAX_STRENGTH: i32 = 10_000;
pub const SHIELD_REGEN_DELAY: i32 = 150;

/* Distances (sector units) */
pub const DIST_INTERACTION_MAX: f64 = 2.0;
pub const DIST_DISMANTLE_MAX: f64 = 1.5;
pub const DIST_BOARDING_MAX: f64 = 1.0;
pub const DIST_COLLISION_SHIP: f64 = 0.8;
pub const DIST_COLLISION_TORP: f64 = 0.8;
pub const DIST_GRAVITY_WELL: f64 = 3.0;
pub const DIST_EVENT_HORIZON: f64 = 0.6;
pub const DIST_MINE_TRIGGER: f64 = 0.4;
pub const DIST_RIFT_TRIGGER: f64 = 0.5;

/* Timers (ticks at 30 Hz) */
pub const TIMER_ALIGN: i32 = 60;
pub const TIMER_TORP_LOAD: i32 = 150;
pub const TIMER_TORP_TIMEOUT: i32 = 300;
pub const TIMER_SUPERNOVA: i32 = 1800;
pub const TIMER_WORMHOLE_SEQ: i32 = 450;
pub const CHECKPOINT_INTERVAL: u64 = 1800;
pub const STORM_DECAY_INTERVAL: u64 = 500;

/* Galactic barrier clamp on each absolute axis */
pub const BARRIER_MIN: f64 = 0.05;
pub const BARRIER_MAX: f64 = 99.95;

/* Global entity table sizes */
pub const MAX_CLIENTS: usize = 32;
pub const MAX_NPC: usize = 1000;
pub const MAX_PLANETS: usize = 1000;
pub const MAX_BASES: usize = 200;
pub const MAX_STARS: usize = 3000;
pub const MAX_BH: usize = 200;
pub const MAX_NEBULAS: usize = 500;
pub const MAX_PULSARS: usize = 200;
pub const MAX_COMETS: usize = 300;
pub const MAX_ASTEROIDS: usize = 2000;
pub const MAX_DERELICTS: usize = 150;
pub const MAX_MINES: usize = 1000;
pub const MAX_BUOYS: usize = 100;
pub const MAX_PLATFORMS: usize = 200;
pub const MAX_RIFTS: usize = 50;
pub const MAX_MONSTERS: usize = 30;

/* Per-quadrant spatial index capacities */
pub const MAX_Q_NPC: usize = 32;
pub const MAX_Q_PLANETS: usize = 32;
pub const MAX_Q_BASES: usize = 16;
pub const MAX_Q_STARS: usize = 64;
pub const MAX_Q_BH: usize = 8;
pub const MAX_Q_NEBULAS: usize = 16;
pub const MAX_Q_PULSARS: usize = 8;
pub const MAX_Q_COMETS: usize = 8;
pub const MAX_Q_ASTEROIDS: usize = 40;
pub const MAX_Q_DERELICTS: usize = 8;
pub const MAX_Q_MINES: usize = 32;
pub const MAX_Q_BUOYS: usize = 8;
pub const MAX_Q_PLATFORMS: usize = 16;
pub const MAX_Q_RIFTS: usize = 4;
pub const MAX_Q_MONSTERS: usize = 4;
pub const MAX_Q_PLAYERS: usize = 32;

/* Wire trailer capacities */
pub const MAX_NET_OBJECTS: usize = 128;
pub const MAX_NET_BEAMS: usize = 8;
