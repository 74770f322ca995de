//! NPC ship, defense platform and monster behavior.

use glam::DVec3;
use rand::Rng;

use crate::config::*;
use crate::entity::{faction, kind, AiState};
use crate::galaxy::index::SpatialIndex;
use crate::galaxy::Galaxy;
use crate::geom::Quadrant;

/// Patrol / chase / flee state machine for every NPC ship.
pub fn update_npcs(galaxy: &mut Galaxy, index: &SpatialIndex) {
    let Galaxy {
        npcs,
        players,
        black_holes,
        rng,
        ..
    } = galaxy;

    for n in 0..MAX_NPC {
        let npc = &mut npcs[n];
        if !npc.active {
            continue;
        }

        // First tick after load: derive absolute coordinates from (q, s).
        if npc.abs.x <= 0.001 && npc.abs.y <= 0.001 {
            npc.abs = npc.quadrant.origin() + npc.pos;
        }

        if !npc.quadrant.is_valid() {
            continue;
        }
        let cell = index.cell(npc.quadrant);

        // Closest visible player within 10 absolute units.
        let mut closest: Option<usize> = None;
        let mut min_d2 = 100.0;
        for slot in cell.players.iter() {
            let p = &players[slot];
            if p.cloaked {
                continue;
            }
            let d2 = (npc.abs - p.abs).length_squared();
            if d2 < min_d2 {
                min_d2 = d2;
                closest = Some(slot);
            }
        }

        npc.ai_state = if npc.energy < 200 {
            AiState::Flee
        } else if closest.is_some() {
            AiState::Chase
        } else {
            AiState::Patrol
        };

        let mut step = DVec3::ZERO;
        let mut speed = 0.03;
        if npc.engine_health < 10.0 {
            speed = 0.0;
        } else {
            speed *= npc.engine_health as f64 / 100.0;
        }

        match npc.ai_state {
            AiState::Chase => {
                let target = closest.unwrap_or(0);
                let delta = players[target].abs - npc.abs;
                let d = delta.length();
                if d > 2.1 {
                    step = delta / d;
                }

                if npc.fire_cooldown > 0 {
                    npc.fire_cooldown -= 1;
                }
                if npc.fire_cooldown <= 0 && d < 6.0 {
                    let damage = match npc.faction {
                        faction::BORG => 50,
                        faction::KLINGON => 25,
                        _ => 10,
                    };
                    npc.fire_cooldown = if npc.faction == faction::BORG { 100 } else { 150 };
                    let beam_from = npc.pos;
                    let victim = &mut players[target];
                    victim.fx.push_beam(beam_from, 1);
                    victim.energy -= damage;
                    victim.shield_regen_delay = SHIELD_REGEN_DELAY;
                }
            }
            AiState::Flee => {
                if let Some(target) = closest {
                    let delta = npc.abs - players[target].abs;
                    let d = delta.length();
                    if d > 0.1 {
                        step = delta / d;
                        speed *= 1.8;
                    }
                    if d > 8.5 {
                        npc.ai_state = AiState::Patrol;
                    }
                }
            }
            _ => {
                // Random-walk heading, refreshed every 100..300 ticks.
                npc.nav_timer -= 1;
                if npc.nav_timer <= 0 {
                    npc.nav_timer = 100 + rng.gen_range(0..200);
                    let wander = DVec3::new(
                        rng.gen_range(-50..50) as f64 / 100.0,
                        rng.gen_range(-50..50) as f64 / 100.0,
                        rng.gen_range(-50..50) as f64 / 100.0,
                    );
                    if wander.length() > 0.001 {
                        npc.dir = wander.normalize();
                    }
                }
                step = npc.dir;
            }
        }

        npc.abs += step * speed;
        npc.abs = npc.abs.clamp(DVec3::splat(BARRIER_MIN), DVec3::splat(BARRIER_MAX));
        npc.quadrant = Quadrant::from_abs(npc.abs);
        npc.pos = npc.abs - npc.quadrant.origin();

        for h in cell.black_holes.iter() {
            if (black_holes[h].pos - npc.pos).length() < 1.0 {
                npc.active = false;
                break;
            }
        }
    }
}

/// Static defense: fire on the first visible player within range, then
/// cool down.
pub fn update_platforms(galaxy: &mut Galaxy, index: &SpatialIndex) {
    let Galaxy {
        platforms, players, ..
    } = galaxy;

    for platform in platforms.iter_mut().filter(|p| p.active) {
        if platform.fire_cooldown > 0 {
            platform.fire_cooldown -= 1;
            continue;
        }
        if !platform.quadrant.is_valid() {
            continue;
        }
        let cell = index.cell(platform.quadrant);
        for slot in cell.players.iter() {
            let player = &mut players[slot];
            if player.cloaked {
                continue;
            }
            if (player.sector - platform.pos).length() < 5.0 {
                player.fx.push_beam(platform.pos, 1);
                player.energy -= 100;
                player.shield_regen_delay = SHIELD_REGEN_DELAY;
                platform.fire_cooldown = 100;
                break;
            }
        }
    }
}

/// The two monster subtypes: the Crystalline Entity homes and fires a
/// resonance beam, the Space Amoeba drains anything adjacent.
pub fn update_monsters(galaxy: &mut Galaxy, index: &SpatialIndex) {
    let Galaxy {
        monsters,
        players,
        tick,
        ..
    } = galaxy;

    for monster in monsters.iter_mut().filter(|m| m.active) {
        if !monster.quadrant.is_valid() {
            continue;
        }
        let cell = index.cell(monster.quadrant);

        let mut target: Option<usize> = None;
        let mut min_d = 10.0;
        for slot in cell.players.iter() {
            let p = &players[slot];
            if p.cloaked {
                continue;
            }
            let d = (p.sector - monster.pos).length();
            if d < min_d {
                min_d = d;
                target = Some(slot);
            }
        }
        let Some(target) = target else {
            continue;
        };

        match monster.kind {
            kind::CRYSTALLINE => {
                let delta = players[target].sector - monster.pos;
                if min_d > f64::EPSILON {
                    monster.pos += (delta / min_d) * 0.05;
                }
                if min_d < 4.0 && *tick % 60 == 0 {
                    let victim = &mut players[target];
                    victim.fx.push_beam(monster.pos, kind::CRYSTALLINE);
                    victim.energy -= 500;
                    victim.say("SCIENCE", "CRYSTALLINE RESONANCE DETECTED! SHIELDS BUCKLING!");
                }
            }
            kind::AMOEBA => {
                if min_d < 1.5 {
                    let victim = &mut players[target];
                    victim.energy -= 200;
                    if *tick % 30 == 0 {
                        victim.say(
                            "WARNING",
                            "SPACE AMOEBA ADHERING TO HULL! ENERGY DRAIN CRITICAL!",
                        );
                    }
                }
            }
            _ => {}
        }
    }
}
