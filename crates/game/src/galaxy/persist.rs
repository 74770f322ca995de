//! Versioned binary snapshot of the whole galaxy (`galaxy.dat`).
//!
//! Layout: version i32, master-state block, then each entity table
//! contiguously with its full fixed count (inactive records included), then
//! the 32 player slots. Every field is written little-endian through the
//! wire codec; the file never mirrors in-memory layout directly.

use std::fs;
use std::io;
use std::path::Path;

use glam::DVec3;
use thiserror::Error;

use crate::config::*;
use crate::crypto::CipherAlgo;
use crate::entity::player::{NavState, Player, Torpedo};
use crate::entity::{
    AiState, Asteroid, Base, BlackHole, Buoy, Comet, Derelict, Mine, Monster, Nebula, NpcShip,
    Planet, Platform, Pulsar, Rift, Star,
};
use crate::galaxy::{Galaxy, Supernova};
use crate::geom::Quadrant;
use crate::wire::{ByteReader, ByteWriter, WireError};

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("i/o failure: {0}")]
    Io(#[from] io::Error),
    #[error("snapshot version {found} does not match {expected}")]
    Version { found: i32, expected: i32 },
    #[error("corrupt snapshot: {0}")]
    Corrupt(#[from] WireError),
}

fn put_quadrant(w: &mut ByteWriter, q: Quadrant) {
    w.put_i32(q.q1);
    w.put_i32(q.q2);
    w.put_i32(q.q3);
}

fn get_quadrant(r: &mut ByteReader) -> Result<Quadrant, WireError> {
    Ok(Quadrant::new(r.get_i32()?, r.get_i32()?, r.get_i32()?))
}

fn put_dvec3(w: &mut ByteWriter, v: DVec3) {
    w.put_f64(v.x);
    w.put_f64(v.y);
    w.put_f64(v.z);
}

fn get_dvec3(r: &mut ByteReader) -> Result<DVec3, WireError> {
    Ok(DVec3::new(r.get_f64()?, r.get_f64()?, r.get_f64()?))
}

fn put_master(w: &mut ByteWriter, galaxy: &Galaxy) {
    w.put_i64(galaxy.master.frame_id);
    for plane in galaxy.master.g.iter() {
        for row in plane {
            for &v in row {
                w.put_i64(v);
            }
        }
    }
    for plane in galaxy.master.z.iter() {
        for row in plane {
            for &v in row {
                w.put_i64(v);
            }
        }
    }
    w.put_i32(galaxy.master.k9);
    w.put_i32(galaxy.master.b9);

    w.put_i64(galaxy.tick as i64);
    put_quadrant(w, galaxy.supernova.quadrant);
    put_dvec3(w, galaxy.supernova.epicenter);
    w.put_i32(galaxy.supernova.timer);
    w.put_i32(galaxy.supernova.star_id);
}

fn get_master(r: &mut ByteReader, galaxy: &mut Galaxy) -> Result<(), WireError> {
    galaxy.master.frame_id = r.get_i64()?;
    for plane in galaxy.master.g.iter_mut() {
        for row in plane {
            for v in row {
                *v = r.get_i64()?;
            }
        }
    }
    for plane in galaxy.master.z.iter_mut() {
        for row in plane {
            for v in row {
                *v = r.get_i64()?;
            }
        }
    }
    galaxy.master.k9 = r.get_i32()?;
    galaxy.master.b9 = r.get_i32()?;

    galaxy.tick = r.get_i64()?.max(0) as u64;
    galaxy.supernova = Supernova {
        quadrant: get_quadrant(r)?,
        epicenter: get_dvec3(r)?,
        timer: r.get_i32()?,
        star_id: r.get_i32()?,
    };
    Ok(())
}

fn put_npc(w: &mut ByteWriter, n: &NpcShip) {
    w.put_i32(n.id);
    w.put_i32(n.faction);
    put_quadrant(w, n.quadrant);
    put_dvec3(w, n.pos);
    w.put_f64(n.heading);
    w.put_f64(n.mark);
    put_dvec3(w, n.abs);
    w.put_i32(n.energy);
    w.put_f32(n.engine_health);
    w.put_i32(n.fire_cooldown);
    w.put_i32(n.ai_state as i32);
    w.put_i32(n.target_player);
    w.put_i32(n.nav_timer);
    put_dvec3(w, n.dir);
    w.put_bool(n.cloaked);
    w.put_bool(n.active);
}

fn get_npc(r: &mut ByteReader) -> Result<NpcShip, WireError> {
    Ok(NpcShip {
        id: r.get_i32()?,
        faction: r.get_i32()?,
        quadrant: get_quadrant(r)?,
        pos: get_dvec3(r)?,
        heading: r.get_f64()?,
        mark: r.get_f64()?,
        abs: get_dvec3(r)?,
        energy: r.get_i32()?,
        engine_health: r.get_f32()?,
        fire_cooldown: r.get_i32()?,
        ai_state: AiState::from_i32(r.get_i32()?),
        target_player: r.get_i32()?,
        nav_timer: r.get_i32()?,
        dir: get_dvec3(r)?,
        cloaked: r.get_bool()?,
        active: r.get_bool()?,
    })
}

fn put_star(w: &mut ByteWriter, s: &Star) {
    w.put_i32(s.id);
    w.put_i32(s.faction);
    put_quadrant(w, s.quadrant);
    put_dvec3(w, s.pos);
    w.put_bool(s.active);
}

fn get_star(r: &mut ByteReader) -> Result<Star, WireError> {
    Ok(Star {
        id: r.get_i32()?,
        faction: r.get_i32()?,
        quadrant: get_quadrant(r)?,
        pos: get_dvec3(r)?,
        active: r.get_bool()?,
    })
}

fn put_point_entity(w: &mut ByteWriter, id: i32, q: Quadrant, pos: DVec3, active: bool) {
    w.put_i32(id);
    put_quadrant(w, q);
    put_dvec3(w, pos);
    w.put_bool(active);
}

fn get_point_entity(r: &mut ByteReader) -> Result<(i32, Quadrant, DVec3, bool), WireError> {
    Ok((r.get_i32()?, get_quadrant(r)?, get_dvec3(r)?, r.get_bool()?))
}

fn put_planet(w: &mut ByteWriter, p: &Planet) {
    w.put_i32(p.id);
    put_quadrant(w, p.quadrant);
    put_dvec3(w, p.pos);
    w.put_i32(p.resource_type);
    w.put_i32(p.amount);
    w.put_bool(p.active);
}

fn get_planet(r: &mut ByteReader) -> Result<Planet, WireError> {
    Ok(Planet {
        id: r.get_i32()?,
        quadrant: get_quadrant(r)?,
        pos: get_dvec3(r)?,
        resource_type: r.get_i32()?,
        amount: r.get_i32()?,
        active: r.get_bool()?,
    })
}

fn put_base(w: &mut ByteWriter, b: &Base) {
    w.put_i32(b.id);
    w.put_i32(b.faction);
    put_quadrant(w, b.quadrant);
    put_dvec3(w, b.pos);
    w.put_i32(b.health);
    w.put_bool(b.active);
}

fn get_base(r: &mut ByteReader) -> Result<Base, WireError> {
    Ok(Base {
        id: r.get_i32()?,
        faction: r.get_i32()?,
        quadrant: get_quadrant(r)?,
        pos: get_dvec3(r)?,
        health: r.get_i32()?,
        active: r.get_bool()?,
    })
}

fn put_comet(w: &mut ByteWriter, c: &Comet) {
    w.put_i32(c.id);
    put_quadrant(w, c.quadrant);
    put_dvec3(w, c.pos);
    w.put_f64(c.heading);
    w.put_f64(c.mark);
    w.put_f64(c.semi_major);
    w.put_f64(c.semi_minor);
    w.put_f64(c.angle);
    w.put_f64(c.speed);
    w.put_f64(c.inclination);
    put_dvec3(w, c.center);
    w.put_bool(c.active);
}

fn get_comet(r: &mut ByteReader) -> Result<Comet, WireError> {
    Ok(Comet {
        id: r.get_i32()?,
        quadrant: get_quadrant(r)?,
        pos: get_dvec3(r)?,
        heading: r.get_f64()?,
        mark: r.get_f64()?,
        semi_major: r.get_f64()?,
        semi_minor: r.get_f64()?,
        angle: r.get_f64()?,
        speed: r.get_f64()?,
        inclination: r.get_f64()?,
        center: get_dvec3(r)?,
        active: r.get_bool()?,
    })
}

fn put_asteroid(w: &mut ByteWriter, a: &Asteroid) {
    w.put_i32(a.id);
    put_quadrant(w, a.quadrant);
    put_dvec3(w, a.pos);
    w.put_f32(a.size);
    w.put_i32(a.resource_type);
    w.put_i32(a.amount);
    w.put_bool(a.active);
}

fn get_asteroid(r: &mut ByteReader) -> Result<Asteroid, WireError> {
    Ok(Asteroid {
        id: r.get_i32()?,
        quadrant: get_quadrant(r)?,
        pos: get_dvec3(r)?,
        size: r.get_f32()?,
        resource_type: r.get_i32()?,
        amount: r.get_i32()?,
        active: r.get_bool()?,
    })
}

fn put_derelict(w: &mut ByteWriter, d: &Derelict) {
    w.put_i32(d.id);
    put_quadrant(w, d.quadrant);
    put_dvec3(w, d.pos);
    w.put_i32(d.ship_class);
    w.put_bool(d.active);
}

fn get_derelict(r: &mut ByteReader) -> Result<Derelict, WireError> {
    Ok(Derelict {
        id: r.get_i32()?,
        quadrant: get_quadrant(r)?,
        pos: get_dvec3(r)?,
        ship_class: r.get_i32()?,
        active: r.get_bool()?,
    })
}

fn put_mine(w: &mut ByteWriter, m: &Mine) {
    w.put_i32(m.id);
    put_quadrant(w, m.quadrant);
    put_dvec3(w, m.pos);
    w.put_i32(m.faction);
    w.put_bool(m.active);
}

fn get_mine(r: &mut ByteReader) -> Result<Mine, WireError> {
    Ok(Mine {
        id: r.get_i32()?,
        quadrant: get_quadrant(r)?,
        pos: get_dvec3(r)?,
        faction: r.get_i32()?,
        active: r.get_bool()?,
    })
}

fn put_platform(w: &mut ByteWriter, p: &Platform) {
    w.put_i32(p.id);
    w.put_i32(p.faction);
    put_quadrant(w, p.quadrant);
    put_dvec3(w, p.pos);
    w.put_i32(p.health);
    w.put_i32(p.energy);
    w.put_i32(p.fire_cooldown);
    w.put_bool(p.active);
}

fn get_platform(r: &mut ByteReader) -> Result<Platform, WireError> {
    Ok(Platform {
        id: r.get_i32()?,
        faction: r.get_i32()?,
        quadrant: get_quadrant(r)?,
        pos: get_dvec3(r)?,
        health: r.get_i32()?,
        energy: r.get_i32()?,
        fire_cooldown: r.get_i32()?,
        active: r.get_bool()?,
    })
}

fn put_monster(w: &mut ByteWriter, m: &Monster) {
    w.put_i32(m.id);
    w.put_i32(m.kind);
    put_quadrant(w, m.quadrant);
    put_dvec3(w, m.pos);
    w.put_i32(m.health);
    w.put_i32(m.energy);
    w.put_i32(m.behavior_timer);
    w.put_bool(m.active);
}

fn get_monster(r: &mut ByteReader) -> Result<Monster, WireError> {
    Ok(Monster {
        id: r.get_i32()?,
        kind: r.get_i32()?,
        quadrant: get_quadrant(r)?,
        pos: get_dvec3(r)?,
        health: r.get_i32()?,
        energy: r.get_i32()?,
        behavior_timer: r.get_i32()?,
        active: r.get_bool()?,
    })
}

fn put_player(w: &mut ByteWriter, p: &Player) {
    w.put_name(&p.name);
    w.put_i32(p.faction);
    w.put_i32(p.ship_class);
    w.put_bool(p.active);
    w.put_u8(p.crypto_algo as u8);
    w.put_bytes(&p.session_key);

    put_dvec3(w, p.abs);
    put_quadrant(w, p.quadrant);
    put_dvec3(w, p.sector);
    w.put_f64(p.heading);
    w.put_f64(p.mark);

    put_dvec3(w, p.target_abs);
    put_dvec3(w, p.dir);
    w.put_f64(p.target_h);
    w.put_f64(p.target_m);
    w.put_f64(p.start_h);
    w.put_f64(p.start_m);
    w.put_i32(p.nav_state as i32);
    w.put_i32(p.nav_timer);
    w.put_f64(p.warp_speed);
    w.put_f64(p.approach_dist);

    w.put_bool(p.torpedo.active);
    put_dvec3(w, p.torpedo.pos);
    put_dvec3(w, p.torpedo.dir);
    w.put_i32(p.torpedo.target);
    w.put_i32(p.torpedo.load_timer);
    w.put_i32(p.torpedo.timeout);

    put_dvec3(w, p.wormhole_mouth);
    w.put_i32(p.shield_regen_delay);
    w.put_i32(p.renegade_timer);
    w.put_i32(p.pending_board_target);
    w.put_i32(p.pending_board_kind);

    w.put_i32(p.energy);
    w.put_i32(p.torpedoes);
    w.put_i32(p.cargo_energy);
    w.put_i32(p.cargo_torpedoes);
    w.put_i32(p.crew_count);
    for v in p.shields {
        w.put_i32(v);
    }
    for v in p.inventory {
        w.put_i32(v);
    }
    for v in p.system_health {
        w.put_f32(v);
    }
    for v in p.power_dist {
        w.put_f32(v);
    }
    w.put_f32(p.life_support);
    w.put_i32(p.corbomite_count);
    w.put_i32(p.lock_target);
    w.put_bool(p.cloaked);
}

fn get_player(r: &mut ByteReader) -> Result<Player, WireError> {
    let mut p = Player {
        name: r.get_name()?,
        faction: r.get_i32()?,
        ship_class: r.get_i32()?,
        active: r.get_bool()?,
        crypto_algo: CipherAlgo::from_u8(r.get_u8()?),
        session_key: r.get_bytes()?,
        ..Player::default()
    };
    p.abs = get_dvec3(r)?;
    p.quadrant = get_quadrant(r)?;
    p.sector = get_dvec3(r)?;
    p.heading = r.get_f64()?;
    p.mark = r.get_f64()?;

    p.target_abs = get_dvec3(r)?;
    p.dir = get_dvec3(r)?;
    p.target_h = r.get_f64()?;
    p.target_m = r.get_f64()?;
    p.start_h = r.get_f64()?;
    p.start_m = r.get_f64()?;
    p.nav_state = NavState::from_i32(r.get_i32()?);
    p.nav_timer = r.get_i32()?;
    p.warp_speed = r.get_f64()?;
    p.approach_dist = r.get_f64()?;

    p.torpedo = Torpedo {
        active: r.get_bool()?,
        pos: get_dvec3(r)?,
        dir: get_dvec3(r)?,
        target: r.get_i32()?,
        load_timer: r.get_i32()?,
        timeout: r.get_i32()?,
    };

    p.wormhole_mouth = get_dvec3(r)?;
    p.shield_regen_delay = r.get_i32()?;
    p.renegade_timer = r.get_i32()?;
    p.pending_board_target = r.get_i32()?;
    p.pending_board_kind = r.get_i32()?;

    p.energy = r.get_i32()?;
    p.torpedoes = r.get_i32()?;
    p.cargo_energy = r.get_i32()?;
    p.cargo_torpedoes = r.get_i32()?;
    p.crew_count = r.get_i32()?;
    for v in &mut p.shields {
        *v = r.get_i32()?;
    }
    for v in &mut p.inventory {
        *v = r.get_i32()?;
    }
    for v in &mut p.system_health {
        *v = r.get_f32()?;
    }
    for v in &mut p.power_dist {
        *v = r.get_f32()?;
    }
    p.life_support = r.get_f32()?;
    p.corbomite_count = r.get_i32()?;
    p.lock_target = r.get_i32()?;
    p.cloaked = r.get_bool()?;
    Ok(p)
}

/// Serialize the whole galaxy into snapshot bytes.
pub fn encode_galaxy(galaxy: &Galaxy) -> Vec<u8> {
    let mut w = ByteWriter::with_capacity(1 << 20);
    w.put_i32(GALAXY_VERSION);
    put_master(&mut w, galaxy);

    for n in &galaxy.npcs {
        put_npc(&mut w, n);
    }
    for s in &galaxy.stars {
        put_star(&mut w, s);
    }
    for h in &galaxy.black_holes {
        put_point_entity(&mut w, h.id, h.quadrant, h.pos, h.active);
    }
    for p in &galaxy.planets {
        put_planet(&mut w, p);
    }
    for b in &galaxy.bases {
        put_base(&mut w, b);
    }
    for n in &galaxy.nebulas {
        put_point_entity(&mut w, n.id, n.quadrant, n.pos, n.active);
    }
    for p in &galaxy.pulsars {
        put_point_entity(&mut w, p.id, p.quadrant, p.pos, p.active);
    }
    for c in &galaxy.comets {
        put_comet(&mut w, c);
    }
    for a in &galaxy.asteroids {
        put_asteroid(&mut w, a);
    }
    for d in &galaxy.derelicts {
        put_derelict(&mut w, d);
    }
    for m in &galaxy.mines {
        put_mine(&mut w, m);
    }
    for b in &galaxy.buoys {
        put_point_entity(&mut w, b.id, b.quadrant, b.pos, b.active);
    }
    for p in &galaxy.platforms {
        put_platform(&mut w, p);
    }
    for r in &galaxy.rifts {
        put_point_entity(&mut w, r.id, r.quadrant, r.pos, r.active);
    }
    for m in &galaxy.monsters {
        put_monster(&mut w, m);
    }
    for p in &galaxy.players {
        put_player(&mut w, p);
    }
    w.into_bytes()
}

/// Rehydrate a galaxy from snapshot bytes. Pure inverse of
/// [`encode_galaxy`]; session-reset policy lives in [`load`].
pub fn decode_galaxy(bytes: &[u8]) -> Result<Galaxy, PersistError> {
    let mut r = ByteReader::new(bytes);
    let version = r.get_i32().map_err(PersistError::Corrupt)?;
    if version != GALAXY_VERSION {
        return Err(PersistError::Version {
            found: version,
            expected: GALAXY_VERSION,
        });
    }

    let mut galaxy = Galaxy::empty();
    get_master(&mut r, &mut galaxy)?;

    for slot in 0..MAX_NPC {
        galaxy.npcs[slot] = get_npc(&mut r)?;
    }
    for slot in 0..MAX_STARS {
        galaxy.stars[slot] = get_star(&mut r)?;
    }
    for slot in 0..MAX_BH {
        let (id, quadrant, pos, active) = get_point_entity(&mut r)?;
        galaxy.black_holes[slot] = BlackHole {
            id,
            quadrant,
            pos,
            active,
        };
    }
    for slot in 0..MAX_PLANETS {
        galaxy.planets[slot] = get_planet(&mut r)?;
    }
    for slot in 0..MAX_BASES {
        galaxy.bases[slot] = get_base(&mut r)?;
    }
    for slot in 0..MAX_NEBULAS {
        let (id, quadrant, pos, active) = get_point_entity(&mut r)?;
        galaxy.nebulas[slot] = Nebula {
            id,
            quadrant,
            pos,
            active,
        };
    }
    for slot in 0..MAX_PULSARS {
        let (id, quadrant, pos, active) = get_point_entity(&mut r)?;
        galaxy.pulsars[slot] = Pulsar {
            id,
            quadrant,
            pos,
            active,
        };
    }
    for slot in 0..MAX_COMETS {
        galaxy.comets[slot] = get_comet(&mut r)?;
    }
    for slot in 0..MAX_ASTEROIDS {
        galaxy.asteroids[slot] = get_asteroid(&mut r)?;
    }
    for slot in 0..MAX_DERELICTS {
        galaxy.derelicts[slot] = get_derelict(&mut r)?;
    }
    for slot in 0..MAX_MINES {
        galaxy.mines[slot] = get_mine(&mut r)?;
    }
    for slot in 0..MAX_BUOYS {
        let (id, quadrant, pos, active) = get_point_entity(&mut r)?;
        galaxy.buoys[slot] = Buoy {
            id,
            quadrant,
            pos,
            active,
        };
    }
    for slot in 0..MAX_PLATFORMS {
        galaxy.platforms[slot] = get_platform(&mut r)?;
    }
    for slot in 0..MAX_RIFTS {
        let (id, quadrant, pos, active) = get_point_entity(&mut r)?;
        galaxy.rifts[slot] = Rift {
            id,
            quadrant,
            pos,
            active,
        };
    }
    for slot in 0..MAX_MONSTERS {
        galaxy.monsters[slot] = get_monster(&mut r)?;
    }
    for slot in 0..MAX_CLIENTS {
        galaxy.players[slot] = get_player(&mut r)?;
    }
    Ok(galaxy)
}

/// The master-state block streamed to a client right after login: frame id,
/// census cube, scanned-map cube, then the global totals.
pub fn encode_master_sync(galaxy: &Galaxy) -> Vec<u8> {
    let mut w = ByteWriter::with_capacity(8 + 2 * 11 * 11 * 11 * 8 + 8);
    w.put_i64(galaxy.master.frame_id);
    for plane in galaxy.master.g.iter() {
        for row in plane {
            for &v in row {
                w.put_i64(v);
            }
        }
    }
    for plane in galaxy.master.z.iter() {
        for row in plane {
            for &v in row {
                w.put_i64(v);
            }
        }
    }
    w.put_i32(galaxy.master.k9);
    w.put_i32(galaxy.master.b9);
    w.into_bytes()
}

/// Write a checkpoint. A failure is logged by the caller and retried on the
/// next checkpoint boundary.
pub fn save(galaxy: &Galaxy, path: &Path) -> Result<(), PersistError> {
    let bytes = encode_galaxy(galaxy);
    fs::write(path, bytes)?;
    Ok(())
}

/// Load a snapshot and reset per-session state: nobody is connected after a
/// restart, and session keys from the previous process are void.
pub fn load(path: &Path) -> Result<Galaxy, PersistError> {
    let bytes = fs::read(path)?;
    let mut galaxy = decode_galaxy(&bytes)?;
    for player in &mut galaxy.players {
        player.active = false;
        player.connected = false;
        player.crypto_algo = CipherAlgo::None;
        player.session_key = [0; 32];
    }
    Ok(galaxy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_round_trip_is_byte_identical() {
        let mut galaxy = Galaxy::generate_with_seed(99);
        let slot = galaxy.free_player_slot().unwrap();
        galaxy.players[slot].provision("Kirk", 0, 5, Quadrant::new(3, 7, 2));
        galaxy.players[slot].active = true;
        galaxy.players[slot].lock_target = 1042;
        galaxy.tick = 5000;
        galaxy.master.frame_id = 5000;

        let bytes = encode_galaxy(&galaxy);
        let back = decode_galaxy(&bytes).unwrap();
        let bytes2 = encode_galaxy(&back);
        assert_eq!(bytes, bytes2);
    }

    #[test]
    fn master_sync_block_has_fixed_size() {
        let galaxy = Galaxy::generate_with_seed(2);
        let bytes = encode_master_sync(&galaxy);
        assert_eq!(bytes.len(), 8 + 2 * 11 * 11 * 11 * 8 + 8);
        // Frame id leads the block.
        assert_eq!(
            i64::from_le_bytes(bytes[..8].try_into().unwrap()),
            galaxy.master.frame_id
        );
    }

    #[test]
    fn version_mismatch_refused() {
        let galaxy = Galaxy::generate_with_seed(1);
        let mut bytes = encode_galaxy(&galaxy);
        bytes[0..4].copy_from_slice(&1234i32.to_le_bytes());
        assert!(matches!(
            decode_galaxy(&bytes),
            Err(PersistError::Version { found: 1234, .. })
        ));
    }

    #[test]
    fn truncated_snapshot_is_corrupt() {
        let galaxy = Galaxy::generate_with_seed(1);
        let bytes = encode_galaxy(&galaxy);
        assert!(matches!(
            decode_galaxy(&bytes[..bytes.len() / 2]),
            Err(PersistError::Corrupt(_))
        ));
    }

    #[test]
    fn load_resets_sessions() {
        let dir = std::env::temp_dir().join("trek-persist-test");
        let _ = fs::create_dir_all(&dir);
        let path = dir.join("galaxy.dat");

        let mut galaxy = Galaxy::generate_with_seed(5);
        let slot = galaxy.free_player_slot().unwrap();
        galaxy.players[slot].provision("Janeway", 0, 7, Quadrant::new(2, 2, 2));
        galaxy.players[slot].active = true;
        galaxy.players[slot].connected = true;
        galaxy.players[slot].session_key = [0xAA; 32];
        galaxy.players[slot].inventory[3] = 77;

        save(&galaxy, &path).unwrap();
        let loaded = load(&path).unwrap();

        assert!(!loaded.players[slot].active);
        assert!(!loaded.players[slot].connected);
        assert_eq!(loaded.players[slot].session_key, [0; 32]);
        assert_eq!(loaded.players[slot].name, "Janeway");
        assert_eq!(loaded.players[slot].inventory[3], 77);
        assert_eq!(loaded.players[slot].quadrant, Quadrant::new(2, 2, 2));

        let _ = fs::remove_file(&path);
    }
}
