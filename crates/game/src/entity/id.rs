//! The flat 32-bit universal target id space.
//!
//! Every entity class maps onto a disjoint id range: class base offset plus
//! the slot index (players are 1-based). This mapping is part of the wire
//! contract; `lock`, `apr`, torpedo guidance, chase and the broadcast all
//! speak it.

use crate::config::*;

pub const PLAYER_BASE: i32 = 1;
pub const NPC_BASE: i32 = 1000;
pub const BASE_BASE: i32 = 2000;
pub const PLANET_BASE: i32 = 3000;
pub const STAR_BASE: i32 = 4000;
pub const BLACK_HOLE_BASE: i32 = 7000;
pub const NEBULA_BASE: i32 = 8000;
pub const PULSAR_BASE: i32 = 9000;
pub const COMET_BASE: i32 = 10000;
pub const DERELICT_BASE: i32 = 11000;
pub const ASTEROID_BASE: i32 = 12000;
pub const MINE_BASE: i32 = 14000;
pub const BUOY_BASE: i32 = 15000;
pub const PLATFORM_BASE: i32 = 16000;
pub const RIFT_BASE: i32 = 17000;
pub const MONSTER_BASE: i32 = 18000;

/// Entity class addressed by a universal target id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetClass {
    Player,
    Npc,
    Base,
    Planet,
    Star,
    BlackHole,
    Nebula,
    Pulsar,
    Comet,
    Derelict,
    Asteroid,
    Mine,
    Buoy,
    Platform,
    Rift,
    Monster,
}

/// Decompose a universal id into its class and zero-based slot index.
pub fn classify(id: i32) -> Option<(TargetClass, usize)> {
    let in_range = |base: i32, count: usize| -> Option<usize> {
        let off = id - base;
        if off >= 0 && (off as usize) < count {
            Some(off as usize)
        } else {
            None
        }
    };

    if id >= 1 && id <= MAX_CLIENTS as i32 {
        return Some((TargetClass::Player, (id - PLAYER_BASE) as usize));
    }
    if let Some(s) = in_range(NPC_BASE, MAX_NPC) {
        return Some((TargetClass::Npc, s));
    }
    if let Some(s) = in_range(BASE_BASE, MAX_BASES) {
        return Some((TargetClass::Base, s));
    }
    if let Some(s) = in_range(PLANET_BASE, MAX_PLANETS) {
        return Some((TargetClass::Planet, s));
    }
    if let Some(s) = in_range(STAR_BASE, MAX_STARS) {
        return Some((TargetClass::Star, s));
    }
    if let Some(s) = in_range(BLACK_HOLE_BASE, MAX_BH) {
        return Some((TargetClass::BlackHole, s));
    }
    if let Some(s) = in_range(NEBULA_BASE, MAX_NEBULAS) {
        return Some((TargetClass::Nebula, s));
    }
    if let Some(s) = in_range(PULSAR_BASE, MAX_PULSARS) {
        return Some((TargetClass::Pulsar, s));
    }
    if let Some(s) = in_range(COMET_BASE, MAX_COMETS) {
        return Some((TargetClass::Comet, s));
    }
    if let Some(s) = in_range(DERELICT_BASE, MAX_DERELICTS) {
        return Some((TargetClass::Derelict, s));
    }
    if let Some(s) = in_range(ASTEROID_BASE, MAX_ASTEROIDS) {
        return Some((TargetClass::Asteroid, s));
    }
    if let Some(s) = in_range(MINE_BASE, MAX_MINES) {
        return Some((TargetClass::Mine, s));
    }
    if let Some(s) = in_range(BUOY_BASE, MAX_BUOYS) {
        return Some((TargetClass::Buoy, s));
    }
    if let Some(s) = in_range(PLATFORM_BASE, MAX_PLATFORMS) {
        return Some((TargetClass::Platform, s));
    }
    if let Some(s) = in_range(RIFT_BASE, MAX_RIFTS) {
        return Some((TargetClass::Rift, s));
    }
    if let Some(s) = in_range(MONSTER_BASE, MAX_MONSTERS) {
        return Some((TargetClass::Monster, s));
    }
    None
}

pub fn player_id(slot: usize) -> i32 {
    slot as i32 + PLAYER_BASE
}

pub fn npc_id(slot: usize) -> i32 {
    slot as i32 + NPC_BASE
}
