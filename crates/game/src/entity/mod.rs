//! Typed records for everything that lives in the galaxy tables.
//!
//! Each entity carries an `active` flag and a stable id within its class;
//! the flat cross-class id space is defined in [`id`].

pub mod id;
pub mod player;

use glam::DVec3;

use crate::geom::Quadrant;

/// Object-kind tags used in the `NetObject` `kind` field. NPC ships use
/// their faction value (10+) instead of a kind tag.
pub mod kind {
    pub const PLAYER: i32 = 1;
    pub const BASE: i32 = 3;
    pub const STAR: i32 = 4;
    pub const PLANET: i32 = 5;
    pub const BLACK_HOLE: i32 = 6;
    pub const NEBULA: i32 = 7;
    pub const PULSAR: i32 = 8;
    pub const COMET: i32 = 9;
    pub const ASTEROID: i32 = 21;
    pub const DERELICT: i32 = 22;
    pub const MINE: i32 = 23;
    pub const BUOY: i32 = 24;
    pub const PLATFORM: i32 = 25;
    pub const RIFT: i32 = 26;
    pub const CRYSTALLINE: i32 = 30;
    pub const AMOEBA: i32 = 31;
}

pub mod faction {
    pub const FEDERATION: i32 = 0;
    pub const KLINGON: i32 = 10;
    pub const ROMULAN: i32 = 11;
    pub const BORG: i32 = 12;
    pub const CARDASSIAN: i32 = 13;
    pub const JEM_HADAR: i32 = 14;
    pub const THOLIAN: i32 = 15;
    pub const GORN: i32 = 16;
    pub const FERENGI: i32 = 17;
    pub const SPECIES_8472: i32 = 18;
    pub const BREEN: i32 = 19;
    pub const HIROGEN: i32 = 20;
}

/// Display name for a faction or object-kind tag.
pub fn species_name(s: i32) -> &'static str {
    match s {
        faction::FEDERATION => "Federation",
        faction::KLINGON => "Klingon",
        faction::ROMULAN => "Romulan",
        faction::BORG => "Borg",
        faction::CARDASSIAN => "Cardassian",
        faction::JEM_HADAR => "Jem'Hadar",
        faction::THOLIAN => "Tholian",
        faction::GORN => "Gorn",
        faction::FERENGI => "Ferengi",
        faction::SPECIES_8472 => "Species 8472",
        faction::BREEN => "Breen",
        faction::HIROGEN => "Hirogen",
        kind::STAR => "Star",
        kind::PLANET => "Planet",
        kind::BLACK_HOLE => "Black Hole",
        kind::NEBULA => "Nebula",
        kind::PULSAR => "Pulsar",
        kind::COMET => "Comet",
        kind::ASTEROID => "Asteroid",
        kind::MINE => "Mine",
        kind::BUOY => "Comm Buoy",
        kind::PLATFORM => "Defense Platform",
        kind::RIFT => "Spatial Rift",
        kind::CRYSTALLINE => "Crystalline Entity",
        kind::AMOEBA => "Space Amoeba",
        _ => "Unknown",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum ShipClass {
    #[default]
    Constitution = 0,
    Miranda = 1,
    Excelsior = 2,
    Constellation = 3,
    Defiant = 4,
    Galaxy = 5,
    Sovereign = 6,
    Intrepid = 7,
    Akira = 8,
    Nebula = 9,
    Ambassador = 10,
    Oberth = 11,
    Steamrunner = 12,
    GenericAlien = 13,
}

impl ShipClass {
    pub fn name(class: i32) -> &'static str {
        const NAMES: [&str; 14] = [
            "Constitution",
            "Miranda",
            "Excelsior",
            "Constellation",
            "Defiant",
            "Galaxy",
            "Sovereign",
            "Intrepid",
            "Akira",
            "Nebula",
            "Ambassador",
            "Oberth",
            "Steamrunner",
            "Vessel",
        ];
        NAMES.get(class as usize).copied().unwrap_or("Unknown")
    }

    /// Crew complement assigned at first login.
    pub fn crew_complement(class: i32) -> i32 {
        match class {
            5 => 1012, // Galaxy
            6 => 850,  // Sovereign
            0 => 430,  // Constitution
            2 => 750,  // Excelsior
            4 => 50,   // Defiant
            7 => 150,  // Intrepid
            11 => 80,  // Oberth
            _ => 200,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum AiState {
    #[default]
    Patrol = 0,
    Chase = 1,
    Flee = 2,
    // Reserved, declared by the AI table but without behavior yet.
    AttackRun = 3,
    AttackPosition = 4,
}

impl AiState {
    pub fn from_i32(v: i32) -> Self {
        match v {
            1 => Self::Chase,
            2 => Self::Flee,
            3 => Self::AttackRun,
            4 => Self::AttackPosition,
            _ => Self::Patrol,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Star {
    pub id: i32,
    pub faction: i32,
    pub quadrant: Quadrant,
    pub pos: DVec3,
    pub active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct BlackHole {
    pub id: i32,
    pub quadrant: Quadrant,
    pub pos: DVec3,
    pub active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Nebula {
    pub id: i32,
    pub quadrant: Quadrant,
    pub pos: DVec3,
    pub active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Pulsar {
    pub id: i32,
    pub quadrant: Quadrant,
    pub pos: DVec3,
    pub active: bool,
}

/// Comets follow an elliptical orbit around a fixed galactic center point;
/// quadrant and sector are recomputed from the orbit each tick.
#[derive(Debug, Clone, Default)]
pub struct Comet {
    pub id: i32,
    pub quadrant: Quadrant,
    pub pos: DVec3,
    pub heading: f64,
    pub mark: f64,
    pub semi_major: f64,
    pub semi_minor: f64,
    pub angle: f64,
    pub speed: f64,
    pub inclination: f64,
    pub center: DVec3,
    pub active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Asteroid {
    pub id: i32,
    pub quadrant: Quadrant,
    pub pos: DVec3,
    pub size: f32,
    pub resource_type: i32,
    pub amount: i32,
    pub active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Derelict {
    pub id: i32,
    pub quadrant: Quadrant,
    pub pos: DVec3,
    pub ship_class: i32,
    pub active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Mine {
    pub id: i32,
    pub quadrant: Quadrant,
    pub pos: DVec3,
    pub faction: i32,
    pub active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Buoy {
    pub id: i32,
    pub quadrant: Quadrant,
    pub pos: DVec3,
    pub active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Platform {
    pub id: i32,
    pub faction: i32,
    pub quadrant: Quadrant,
    pub pos: DVec3,
    pub health: i32,
    pub energy: i32,
    pub fire_cooldown: i32,
    pub active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Rift {
    pub id: i32,
    pub quadrant: Quadrant,
    pub pos: DVec3,
    pub active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Monster {
    pub id: i32,
    /// `kind::CRYSTALLINE` or `kind::AMOEBA`.
    pub kind: i32,
    pub quadrant: Quadrant,
    pub pos: DVec3,
    pub health: i32,
    pub energy: i32,
    pub behavior_timer: i32,
    pub active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Planet {
    pub id: i32,
    pub quadrant: Quadrant,
    pub pos: DVec3,
    pub resource_type: i32,
    pub amount: i32,
    pub active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Base {
    pub id: i32,
    pub faction: i32,
    pub quadrant: Quadrant,
    pub pos: DVec3,
    pub health: i32,
    pub active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NpcShip {
    pub id: i32,
    pub faction: i32,
    pub quadrant: Quadrant,
    pub pos: DVec3,
    pub heading: f64,
    pub mark: f64,
    /// Absolute galactic coordinates, the source of truth for motion.
    pub abs: DVec3,
    pub energy: i32,
    pub engine_health: f32,
    pub fire_cooldown: i32,
    pub ai_state: AiState,
    pub target_player: i32,
    pub nav_timer: i32,
    pub dir: DVec3,
    pub cloaked: bool,
    pub active: bool,
}

impl NpcShip {
    /// Reference energy used to express hull status as a percentage.
    pub fn max_energy(&self) -> i32 {
        if self.faction == faction::BORG {
            100_000
        } else {
            50_000
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crew_complement_by_class() {
        assert_eq!(ShipClass::crew_complement(ShipClass::Galaxy as i32), 1012);
        assert_eq!(ShipClass::crew_complement(ShipClass::Defiant as i32), 50);
        assert_eq!(ShipClass::crew_complement(ShipClass::Miranda as i32), 200);
    }

    #[test]
    fn species_names_cover_kinds() {
        assert_eq!(species_name(faction::BORG), "Borg");
        assert_eq!(species_name(kind::CRYSTALLINE), "Crystalline Entity");
        assert_eq!(species_name(999), "Unknown");
    }
}
