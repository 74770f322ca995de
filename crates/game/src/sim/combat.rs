//! Weapons: target-lock reconciliation, torpedo flight and the phaser
//! damage pipeline shared with the command layer.

use glam::DVec3;

use crate::config::*;
use crate::entity::id::{self, TargetClass};
use crate::entity::player::{system, FxPoint, NavState};
use crate::galaxy::index::SpatialIndex;
use crate::galaxy::Galaxy;

/// Whether a lock on `target` is still tenable from `quadrant`-local rules:
/// mobile classes (players, NPCs, comets, platforms, monsters) hold from
/// anywhere while active; static classes require the viewer's quadrant.
pub fn lock_still_valid(galaxy: &Galaxy, viewer: usize, target: i32) -> bool {
    let here = galaxy.players[viewer].quadrant;
    let Some((class, s)) = id::classify(target) else {
        return false;
    };
    match class {
        TargetClass::Player => galaxy.players[s].active,
        TargetClass::Npc => galaxy.npcs[s].active,
        TargetClass::Comet => galaxy.comets[s].active,
        TargetClass::Platform => galaxy.platforms[s].active,
        TargetClass::Monster => galaxy.monsters[s].active,
        TargetClass::Base => galaxy.bases[s].active && galaxy.bases[s].quadrant == here,
        TargetClass::Planet => galaxy.planets[s].active && galaxy.planets[s].quadrant == here,
        TargetClass::Star => galaxy.stars[s].active && galaxy.stars[s].quadrant == here,
        TargetClass::BlackHole => {
            galaxy.black_holes[s].active && galaxy.black_holes[s].quadrant == here
        }
        TargetClass::Nebula => galaxy.nebulas[s].active && galaxy.nebulas[s].quadrant == here,
        TargetClass::Pulsar => galaxy.pulsars[s].active && galaxy.pulsars[s].quadrant == here,
        TargetClass::Derelict => {
            galaxy.derelicts[s].active && galaxy.derelicts[s].quadrant == here
        }
        TargetClass::Asteroid => {
            galaxy.asteroids[s].active && galaxy.asteroids[s].quadrant == here
        }
        TargetClass::Mine => galaxy.mines[s].active && galaxy.mines[s].quadrant == here,
        TargetClass::Buoy => galaxy.buoys[s].active && galaxy.buoys[s].quadrant == here,
        TargetClass::Rift => galaxy.rifts[s].active && galaxy.rifts[s].quadrant == here,
    }
}

/// Drop a lock whose target died or left scope.
pub fn revalidate_lock(galaxy: &mut Galaxy, slot: usize) {
    let target = galaxy.players[slot].lock_target;
    if target > 0 && !lock_still_valid(galaxy, slot, target) {
        let player = &mut galaxy.players[slot];
        player.lock_target = 0;
        player.say("TACTICAL", "Target lost. Lock released.");
    }
}

/// Session timer upkeep: tube reload, shield-hit cooldown, renegade decay.
pub fn tick_timers(galaxy: &mut Galaxy, slot: usize) {
    let player = &mut galaxy.players[slot];
    if player.torpedo.load_timer > 0 {
        player.torpedo.load_timer -= 1;
    }
    if player.shield_regen_delay > 0 {
        player.shield_regen_delay -= 1;
    }
    if player.renegade_timer > 0 {
        player.renegade_timer -= 1;
    }
}

/// Sector position of a torpedo guidance target, if it is still live and in
/// the shooter's quadrant.
fn guidance_point(galaxy: &Galaxy, shooter: usize, target: i32) -> Option<DVec3> {
    let here = galaxy.players[shooter].quadrant;
    match id::classify(target)? {
        (TargetClass::Player, s) => {
            let p = &galaxy.players[s];
            (p.active && p.quadrant == here).then_some(p.sector)
        }
        (TargetClass::Npc, s) => {
            let n = &galaxy.npcs[s];
            (n.active && n.quadrant == here).then_some(n.pos)
        }
        (TargetClass::Platform, s) => {
            let p = &galaxy.platforms[s];
            (p.active && p.quadrant == here).then_some(p.pos)
        }
        (TargetClass::Monster, s) => {
            let m = &galaxy.monsters[s];
            (m.active && m.quadrant == here).then_some(m.pos)
        }
        _ => None,
    }
}

/// One tick of torpedo flight for a player's tracked torpedo: guidance
/// blending, motion, collision sweep, timeout.
pub fn torpedo_step(galaxy: &mut Galaxy, index: &SpatialIndex, slot: usize) {
    if !galaxy.players[slot].torpedo.active {
        return;
    }

    // Self-destruct when the flight timer runs dry.
    {
        let torp = &mut galaxy.players[slot].torpedo;
        torp.timeout -= 1;
        if torp.timeout <= 0 {
            torp.active = false;
            galaxy.players[slot].fx.torp.active = false;
            return;
        }
    }

    // Guided shots blend half their vector toward the target every tick.
    let target = galaxy.players[slot].torpedo.target;
    if target > 0 {
        if let Some(aim) = guidance_point(galaxy, slot, target) {
            let torp = &mut galaxy.players[slot].torpedo;
            let delta = aim - torp.pos;
            let d = delta.length();
            if d > 0.01 {
                let blended = torp.dir * 0.5 + (delta / d) * 0.5;
                if blended.length() > f64::EPSILON {
                    torp.dir = blended.normalize();
                }
            }
        }
    }

    let (pos, quadrant) = {
        let player = &mut galaxy.players[slot];
        player.torpedo.pos += player.torpedo.dir * 0.25;
        player.fx.torp = FxPoint::at(player.torpedo.pos);
        (player.torpedo.pos, player.quadrant)
    };

    if !quadrant.is_valid() {
        return;
    }
    let cell = index.cell(quadrant);
    let mut hit = false;

    // Other players first.
    for j in cell.players.iter() {
        if j == slot || !galaxy.players[j].active {
            continue;
        }
        if (pos - galaxy.players[j].sector).length() < DIST_COLLISION_TORP {
            let victim = &mut galaxy.players[j];
            victim.apply_spread_damage(DMG_TORPEDO);
            victim.shield_regen_delay = SHIELD_REGEN_DELAY;
            victim.say("WARNING", "HIT BY PHOTON TORPEDO!");
            if victim.energy <= 0 {
                victim.energy = 0;
                victim.crew_count = 0;
                victim.nav_state = NavState::Idle;
                victim.warp_speed = 0.0;
                victim.fx.boom = FxPoint::at(victim.sector);
            }
            hit = true;
            break;
        }
    }

    if !hit {
        for n in cell.npcs.iter() {
            let npc = &mut galaxy.npcs[n];
            if (pos - npc.pos).length() < DIST_COLLISION_TORP {
                npc.energy -= DMG_TORPEDO;
                if npc.energy <= 0 {
                    npc.active = false;
                    let at = npc.pos;
                    galaxy.players[slot].fx.boom = FxPoint::at(at);
                }
                hit = true;
                break;
            }
        }
    }

    // Solid obstacles absorb the warhead.
    if !hit {
        for p in cell.planets.iter() {
            if (pos - galaxy.planets[p].pos).length() < 1.2 {
                hit = true;
                break;
            }
        }
    }
    if !hit {
        for s in cell.stars.iter() {
            if (pos - galaxy.stars[s].pos).length() < 1.5 {
                hit = true;
                break;
            }
        }
    }
    if !hit {
        for b in cell.bases.iter() {
            if (pos - galaxy.bases[b].pos).length() < 1.0 {
                hit = true;
                break;
            }
        }
    }

    if !hit {
        for pt in cell.platforms.iter() {
            let platform = &mut galaxy.platforms[pt];
            if (pos - platform.pos).length() < DIST_COLLISION_TORP {
                platform.energy -= DMG_TORPEDO_PLATFORM;
                if platform.energy <= 0 {
                    platform.active = false;
                    let at = platform.pos;
                    galaxy.players[slot].fx.boom = FxPoint::at(at);
                }
                hit = true;
                break;
            }
        }
    }
    if !hit {
        for mo in cell.monsters.iter() {
            let monster = &mut galaxy.monsters[mo];
            if (pos - monster.pos).length() < 1.0 {
                monster.energy -= DMG_TORPEDO_MONSTER;
                if monster.energy <= 0 {
                    monster.active = false;
                    let at = monster.pos;
                    galaxy.players[slot].fx.boom = FxPoint::at(at);
                }
                hit = true;
                break;
            }
        }
    }

    let out_of_sector = !(0.0..=10.0).contains(&pos.x)
        || !(0.0..=10.0).contains(&pos.y)
        || !(0.0..=10.0).contains(&pos.z);

    if hit || out_of_sector {
        let player = &mut galaxy.players[slot];
        if hit {
            player.fx.boom = FxPoint::at(pos);
            player.say("TACTICAL", "Torpedo impact confirmed.");
        }
        player.torpedo.active = false;
        player.fx.torp.active = false;
    }
}

/// Outcome of a phaser burst, fed back to the shooter's chat.
pub struct PhaserReport {
    pub hit: i32,
    pub connected: bool,
}

/// Fire a phaser burst at the shooter's locked target. Energy and system
/// gates are checked by the command layer; this applies geometry, power
/// allocation and integrity modifiers, then distributes damage.
pub fn fire_phasers(galaxy: &mut Galaxy, shooter: usize, energy: i32) -> PhaserReport {
    let here = galaxy.players[shooter].quadrant;
    let target_id = galaxy.players[shooter].lock_target;

    // Resolve a hittable target: another player or an NPC, same quadrant.
    let aim = match id::classify(target_id) {
        Some((TargetClass::Player, s)) if s != shooter => {
            let p = &galaxy.players[s];
            (p.active && p.quadrant == here).then_some(p.sector)
        }
        Some((TargetClass::Npc, s)) => {
            let n = &galaxy.npcs[s];
            (n.active && n.quadrant == here).then_some(n.pos)
        }
        _ => None,
    };

    let (beam_end, connected) = match aim {
        Some(point) => (point, true),
        None => {
            // Unaimed burst lights up empty space ahead.
            let p = &galaxy.players[shooter];
            (p.sector + crate::geom::dir_from_angles(p.heading, p.mark) * 5.0, false)
        }
    };

    let hit = {
        let p = &mut galaxy.players[shooter];
        p.energy -= energy;
        p.fx.push_beam(beam_end, 1);

        let dist = (beam_end - p.sector).length().max(0.1);
        let power_boost = 0.5 + p.power_dist[2] as f64;
        let integrity = p.system_health[system::PHASERS] as f64 / 100.0;
        ((energy as f64 / dist) * power_boost * integrity * 10.0) as i32
    };

    if !connected {
        return PhaserReport { hit, connected };
    }

    match id::classify(target_id) {
        Some((TargetClass::Player, s)) => {
            let same_faction = galaxy.players[s].faction == galaxy.players[shooter].faction;
            let victim = &mut galaxy.players[s];
            victim.apply_spread_damage(hit);
            victim.shield_regen_delay = SHIELD_REGEN_DELAY;
            if victim.energy <= 0 {
                victim.active = false;
                victim.fx.boom = FxPoint::at(victim.sector);
            }
            if same_faction {
                galaxy.players[shooter].renegade_timer = 9000;
            }
        }
        Some((TargetClass::Npc, s)) => {
            let npc = &mut galaxy.npcs[s];
            npc.energy -= hit;
            npc.engine_health = (npc.engine_health - (hit as f32 / 1000.0) * 10.0).max(0.0);
            if npc.energy <= 0 {
                npc.active = false;
                let at = npc.pos;
                galaxy.players[shooter].fx.boom = FxPoint::at(at);
            }
        }
        _ => {}
    }

    PhaserReport { hit, connected }
}
