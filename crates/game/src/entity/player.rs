//! The per-player session record: identity, ship state, navigation machine,
//! torpedo slot and the one-shot transient effects drained by the broadcast.

use glam::DVec3;

use crate::config::*;
use crate::crypto::CipherAlgo;
use crate::geom::{self, Quadrant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum NavState {
    #[default]
    Idle = 0,
    Align = 1,
    Warp = 2,
    Realign = 3,
    Impulse = 4,
    Chase = 5,
    AlignImpulse = 6,
    Wormhole = 7,
}

impl NavState {
    pub fn from_i32(v: i32) -> Self {
        match v {
            1 => Self::Align,
            2 => Self::Warp,
            3 => Self::Realign,
            4 => Self::Impulse,
            5 => Self::Chase,
            6 => Self::AlignImpulse,
            7 => Self::Wormhole,
            _ => Self::Idle,
        }
    }

    pub fn is_moving(self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// Ship system slots in `system_health`.
pub mod system {
    pub const WARP: usize = 0;
    pub const IMPULSE: usize = 1;
    pub const SENSORS: usize = 2;
    pub const TRANSPORTER: usize = 3;
    pub const PHASERS: usize = 4;
    pub const TORPEDOES: usize = 5;
    pub const COMPUTER: usize = 6;
    pub const LIFE_SUPPORT: usize = 7;

    pub const NAMES: [&str; 8] = [
        "Warp", "Impulse", "Sensors", "Transp", "Phasers", "Torps", "Computer", "Life",
    ];
}

/// Inventory slots. Slot 0 is unused.
pub mod resource {
    pub const DILITHIUM: usize = 1;
    pub const TRITANIUM: usize = 2;
    pub const VERTERIUM: usize = 3;
    pub const MONOTANIUM: usize = 4;
    pub const ISOLINEAR: usize = 5;
    pub const GASES: usize = 6;

    pub const NAMES: [&str; 7] = [
        "-", "Dilithium", "Tritanium", "Verterium", "Monotanium", "Isolinear", "Gases",
    ];
}

/// The single tracked torpedo of a player. At most one is in flight.
#[derive(Debug, Clone, Default)]
pub struct Torpedo {
    pub active: bool,
    pub pos: DVec3,
    pub dir: DVec3,
    /// Universal id of the guided target, 0 for a manual shot.
    pub target: i32,
    /// Tube reload countdown after firing.
    pub load_timer: i32,
    /// Remaining flight time before self-destruct.
    pub timeout: i32,
}

/// Single-tick visual event, cleared after the next outbound snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct FxPoint {
    pub pos: DVec3,
    pub active: bool,
}

impl FxPoint {
    pub fn at(pos: DVec3) -> Self {
        Self { pos, active: true }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FxBeam {
    pub target: DVec3,
    /// Non-zero marks the beam live; monster beams carry their kind tag here.
    pub tag: i32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FxDismantle {
    pub pos: DVec3,
    pub species: i32,
    pub active: bool,
}

/// Outgoing event queues of depth one, drained into each snapshot.
#[derive(Debug, Clone, Default)]
pub struct Transients {
    pub beams: [FxBeam; MAX_NET_BEAMS],
    pub beam_count: usize,
    pub torp: FxPoint,
    pub boom: FxPoint,
    pub wormhole: FxPoint,
    pub jump_arrival: FxPoint,
    pub dismantle: FxDismantle,
}

impl Transients {
    pub fn push_beam(&mut self, target: DVec3, tag: i32) {
        if self.beam_count < MAX_NET_BEAMS {
            self.beams[self.beam_count] = FxBeam { target, tag };
            self.beam_count += 1;
        }
    }

    /// One-shot edge: everything except the torpedo tracer resets after send.
    pub fn clear_after_send(&mut self) {
        self.beam_count = 0;
        self.boom.active = false;
        self.wormhole.active = false;
        self.jump_arrival.active = false;
        self.dismantle.active = false;
    }
}

/// A chat line queued for one player, written out after the tick.
#[derive(Debug, Clone)]
pub struct ChatNote {
    pub from: String,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct Player {
    /// Empty name marks a free slot. Names are the persistence key.
    pub name: String,
    pub faction: i32,
    pub ship_class: i32,
    /// In-world and alive. A dead player keeps the slot with `active` false.
    pub active: bool,
    /// A socket is currently bound to this slot (never persisted).
    pub connected: bool,
    pub crypto_algo: CipherAlgo,
    pub session_key: [u8; 32],

    /* Position: `abs` is the source of truth, quadrant/sector derived. */
    pub abs: DVec3,
    pub quadrant: Quadrant,
    pub sector: DVec3,
    pub heading: f64,
    pub mark: f64,

    /* Navigation machine */
    pub target_abs: DVec3,
    pub dir: DVec3,
    pub target_h: f64,
    pub target_m: f64,
    pub start_h: f64,
    pub start_m: f64,
    pub nav_state: NavState,
    pub nav_timer: i32,
    pub warp_speed: f64,
    pub approach_dist: f64,

    pub torpedo: Torpedo,
    /// Wormhole mouth sector position during a jump sequence.
    pub wormhole_mouth: DVec3,
    pub shield_regen_delay: i32,
    pub renegade_timer: i32,
    pub pending_board_target: i32,
    pub pending_board_kind: i32,

    /* Ship systems */
    pub energy: i32,
    pub torpedoes: i32,
    pub cargo_energy: i32,
    pub cargo_torpedoes: i32,
    pub crew_count: i32,
    pub shields: [i32; 6],
    pub inventory: [i32; 7],
    pub system_health: [f32; 8],
    pub power_dist: [f32; 3],
    pub life_support: f32,
    pub corbomite_count: i32,
    pub lock_target: i32,
    pub cloaked: bool,

    pub fx: Transients,
    /// Chat lines produced this tick, drained by the server after broadcast.
    pub outbox: Vec<ChatNote>,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            name: String::new(),
            faction: 0,
            ship_class: 0,
            active: false,
            connected: false,
            crypto_algo: CipherAlgo::None,
            session_key: [0; 32],
            abs: DVec3::ZERO,
            quadrant: Quadrant::default(),
            sector: DVec3::ZERO,
            heading: 0.0,
            mark: 0.0,
            target_abs: DVec3::ZERO,
            dir: DVec3::ZERO,
            target_h: 0.0,
            target_m: 0.0,
            start_h: 0.0,
            start_m: 0.0,
            nav_state: NavState::Idle,
            nav_timer: 0,
            warp_speed: 0.0,
            approach_dist: 0.0,
            torpedo: Torpedo::default(),
            wormhole_mouth: DVec3::ZERO,
            shield_regen_delay: 0,
            renegade_timer: 0,
            pending_board_target: 0,
            pending_board_kind: 0,
            energy: 0,
            torpedoes: 0,
            cargo_energy: 0,
            cargo_torpedoes: 0,
            crew_count: 0,
            shields: [0; 6],
            inventory: [0; 7],
            system_health: [0.0; 8],
            power_dist: [0.0; 3],
            life_support: 0.0,
            corbomite_count: 0,
            lock_target: 0,
            cloaked: false,
            fx: Transients::default(),
            outbox: Vec::new(),
        }
    }
}

impl Player {
    pub fn is_free_slot(&self) -> bool {
        self.name.is_empty()
    }

    /// Alive means active with energy and crew left.
    pub fn is_alive(&self) -> bool {
        self.active && self.energy > 0 && self.crew_count > 0
    }

    /// Move to a quadrant/sector pair, syncing the absolute coordinates.
    pub fn place_at(&mut self, quadrant: Quadrant, sector: DVec3) {
        self.quadrant = quadrant;
        self.sector = sector;
        self.abs = geom::abs_of(quadrant, sector);
    }

    /// Recompute quadrant and sector from the absolute coordinates.
    pub fn sync_derived_position(&mut self) {
        self.quadrant = Quadrant::from_abs(self.abs);
        self.sector = self.abs - self.quadrant.origin();
    }

    pub fn say(&mut self, from: &str, text: impl Into<String>) {
        self.outbox.push(ChatNote {
            from: from.to_string(),
            text: text.into(),
        });
    }

    /// Kill the ship in place: zero energy and crew, stop, queue the boom.
    pub fn destroy(&mut self) {
        self.energy = 0;
        self.crew_count = 0;
        self.nav_state = NavState::Idle;
        self.warp_speed = 0.0;
        self.dir = DVec3::ZERO;
        self.fx.boom = FxPoint::at(self.sector);
    }

    /// Spread damage across the six shield facings, then the hull (energy).
    /// Returns the amount the shields soaked.
    pub fn apply_spread_damage(&mut self, damage: i32) -> i32 {
        let mut remaining = damage;
        for s in 0..6 {
            if remaining <= 0 {
                break;
            }
            let soak = (remaining / 6).min(self.shields[s]).max(0);
            self.shields[s] -= soak;
            remaining -= soak;
        }
        self.energy -= remaining;
        damage - remaining
    }

    /// First-login outfitting for a fresh slot.
    pub fn provision(&mut self, name: &str, faction: i32, ship_class: i32, quadrant: Quadrant) {
        self.name = name.to_string();
        self.faction = faction;
        self.ship_class = ship_class;
        self.energy = ENERGY_BASE_RECHARGE;
        self.torpedoes = MAX_TORPEDO_CAPACITY;
        self.crew_count = crate::entity::ShipClass::crew_complement(ship_class);
        self.place_at(quadrant, DVec3::splat(5.0));
        self.inventory[resource::DILITHIUM] = 10;
        self.system_health = [100.0; 8];
        self.life_support = 100.0;
        self.power_dist = [0.34, 0.33, 0.33];
    }
}
