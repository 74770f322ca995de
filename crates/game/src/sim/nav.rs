//! Per-player navigation: align, warp, realign, impulse, chase and the
//! wormhole sequence, followed by the galactic-barrier clamp and solid-body
//! collision checks.

use glam::DVec3;

use crate::config::*;
use crate::entity::id::{self, TargetClass};
use crate::entity::player::{FxPoint, NavState};
use crate::galaxy::index::SpatialIndex;
use crate::galaxy::Galaxy;
use crate::geom::{self, Quadrant};

/// Advance one player's navigation state, then clamp to the barrier,
/// recompute derived coordinates and resolve collisions with solid bodies.
pub fn advance(galaxy: &mut Galaxy, index: &SpatialIndex, slot: usize) {
    match galaxy.players[slot].nav_state {
        NavState::Align | NavState::AlignImpulse => align_step(galaxy, slot),
        NavState::Warp => warp_step(galaxy, slot),
        NavState::Realign => realign_step(galaxy, slot),
        NavState::Impulse => impulse_step(galaxy, slot),
        NavState::Wormhole => wormhole_step(galaxy, slot),
        NavState::Chase => chase_step(galaxy, slot),
        NavState::Idle => {}
    }

    barrier_clamp(galaxy, slot);
    galaxy.players[slot].sync_derived_position();
    solid_body_collisions(galaxy, index, slot);
}

fn align_step(galaxy: &mut Galaxy, slot: usize) {
    let player = &mut galaxy.players[slot];
    player.nav_timer -= 1;

    let diff_h = geom::heading_delta(player.target_h, player.start_h);
    let diff_m = player.target_m - player.start_m;
    let t = 1.0 - player.nav_timer as f64 / TIMER_ALIGN as f64;
    player.heading = (player.start_h + diff_h * t).rem_euclid(360.0);
    player.mark = player.start_m + diff_m * t;

    if player.nav_timer > 0 {
        return;
    }

    if player.nav_state == NavState::Align {
        player.nav_state = NavState::Warp;
        let dist = (player.target_abs - player.abs).length();
        player.nav_timer = ((dist / 10.0 * 90.0) as i32).max(30);
        player.warp_speed = dist / player.nav_timer as f64;
    } else {
        player.nav_state = NavState::Impulse;
        let pct = player.warp_speed * 200.0;
        player.say("HELMSMAN", format!("Impulse engaged at {pct:.0}%."));
    }
}

fn warp_step(galaxy: &mut Galaxy, slot: usize) {
    let player = &mut galaxy.players[slot];
    player.nav_timer -= 1;
    player.abs += player.dir * player.warp_speed;
    player.sync_derived_position();

    if player.nav_timer <= 0 {
        player.nav_state = NavState::Realign;
        player.nav_timer = TIMER_ALIGN;
        player.start_h = player.heading;
        player.start_m = player.mark;
    }
}

fn realign_step(galaxy: &mut Galaxy, slot: usize) {
    let player = &mut galaxy.players[slot];
    player.nav_timer -= 1;
    let t = 1.0 - player.nav_timer as f64 / TIMER_ALIGN as f64;
    player.mark = player.start_m * (1.0 - t);
    if player.nav_timer <= 0 {
        player.mark = 0.0;
        player.nav_state = NavState::Idle;
        player.say("HELMSMAN", "Stabilization complete. Ship aligned.");
    }
}

fn impulse_step(galaxy: &mut Galaxy, slot: usize) {
    let player = &mut galaxy.players[slot];
    if player.energy > 0 {
        player.energy -= 1;
        // Impulse moves at ten times the stored fraction for responsiveness.
        player.abs += player.dir * player.warp_speed * 10.0;
        player.sync_derived_position();
    } else {
        player.nav_state = NavState::Idle;
        player.say("COMPUTER", "Impulse drive failure: Zero energy.");
    }
}

fn wormhole_step(galaxy: &mut Galaxy, slot: usize) {
    let player = &mut galaxy.players[slot];
    player.nav_timer -= 1;

    match player.nav_timer {
        180 => player.say(
            "ENGINEERING",
            "Injecting exotic matter into local Schwarzschild metric...",
        ),
        130 => player.say(
            "SCIENCE",
            "Einstein-Rosen Bridge detected. Stabilizing singularity...",
        ),
        80 => player.say("HELMSMAN", "Wormhole mouth stable. Entering event horizon."),
        _ => {}
    }

    player.fx.wormhole = FxPoint::at(player.wormhole_mouth);

    // Final approach: ease into the mouth over the last two seconds.
    if player.nav_timer < 60 {
        let cur = player.abs - player.quadrant.origin();
        player.abs += (player.wormhole_mouth - cur) * 0.05;
    }

    if player.nav_timer <= 0 {
        player.abs = player.target_abs;
        player.nav_state = NavState::Idle;
        player.fx.wormhole.active = false;
        player.sync_derived_position();
        player.fx.jump_arrival = FxPoint::at(player.sector);
        player.say(
            "HELMSMAN",
            "Wormhole traversal successful. Welcome to destination.",
        );
    }
}

/// Position, velocity and quadrant of a chase-able target.
fn chase_target(galaxy: &Galaxy, target: i32) -> Option<(DVec3, DVec3, Quadrant)> {
    match id::classify(target)? {
        (TargetClass::Player, s) => {
            let p = &galaxy.players[s];
            if !p.active {
                return None;
            }
            Some((p.abs, p.dir * p.warp_speed, p.quadrant))
        }
        (TargetClass::Npc, s) => {
            let n = &galaxy.npcs[s];
            if !n.active {
                return None;
            }
            Some((n.abs, n.dir * 0.03, n.quadrant))
        }
        (TargetClass::Comet, s) => {
            let c = &galaxy.comets[s];
            if !c.active {
                return None;
            }
            let vel = geom::dir_from_angles(c.heading, c.mark) * 0.02;
            Some((c.quadrant.origin() + c.pos, vel, c.quadrant))
        }
        _ => None,
    }
}

fn chase_step(galaxy: &mut Galaxy, slot: usize) {
    let target_id = galaxy.players[slot].lock_target;
    let target = chase_target(galaxy, target_id);
    let tick = galaxy.tick;

    let player = &mut galaxy.players[slot];
    let Some((tpos, tvel, tquad)) = target else {
        player.nav_state = NavState::Idle;
        player.say("COMPUTER", "Chase target lost.");
        return;
    };
    if player.energy <= 5000 {
        player.nav_state = NavState::Idle;
        return;
    }

    let delta = tpos - player.abs;
    let dist = delta.length();

    // Steer 15% toward the desired bearing each tick.
    if dist > 0.05 {
        let (des_h, des_m) = geom::angles_to(delta, dist);
        player.heading =
            (player.heading + geom::heading_delta(des_h, player.heading) * 0.15).rem_euclid(360.0);
        player.mark += (des_m - player.mark) * 0.15;
    }
    player.dir = geom::dir_from_angles(player.heading, player.mark);

    // Speed control: close on the approach distance, matching target speed,
    // blended 70/30 against the previous tick.
    let hold_dist = if player.approach_dist > 0.05 {
        player.approach_dist
    } else {
        2.0
    };
    let base = if dist > 10.0 { 0.8 } else { 0.4 };
    let ideal = ((dist - hold_dist) * base + tvel.length()).clamp(-0.1, 0.8);
    player.warp_speed = player.warp_speed * 0.7 + ideal * 0.3;
    player.abs += player.dir * player.warp_speed;

    let drain = 10 + (player.warp_speed.abs() * 20.0) as i32;
    player.energy -= drain;

    if player.quadrant != tquad && tick % 300 == 0 {
        player.say(
            "HELMSMAN",
            "Target has left the quadrant. Engaging inter-sector subspace tracking.",
        );
    }
}

fn barrier_clamp(galaxy: &mut Galaxy, slot: usize) {
    let player = &mut galaxy.players[slot];
    let clamped = player
        .abs
        .clamp(DVec3::splat(BARRIER_MIN), DVec3::splat(BARRIER_MAX));
    let hit = clamped != player.abs;
    player.abs = clamped;

    if hit && player.nav_state != NavState::Chase && player.nav_state != NavState::Idle {
        player.nav_state = NavState::Idle;
        player.warp_speed = 0.0;
        player.say(
            "HELMSMAN",
            "Warning: We have hit the Galactic Barrier. Engines disengaged.",
        );
    }
}

fn solid_body_collisions(galaxy: &mut Galaxy, index: &SpatialIndex, slot: usize) {
    let tick = galaxy.tick;
    let Galaxy {
        players,
        black_holes,
        stars,
        planets,
        ..
    } = galaxy;
    let player = &mut players[slot];
    if !player.quadrant.is_valid() {
        return;
    }
    let cell = index.cell(player.quadrant);

    for h in cell.black_holes.iter() {
        let d = (player.sector - black_holes[h].pos).length();
        if d < 2.5 {
            // Gravity well shear: shields and reactor bleed hard.
            let drain = ((2.5 - d) * 1000.0) as i32;
            for s in 0..6 {
                player.shields[s] = (player.shields[s] - drain / 10).max(0);
            }
            player.energy -= drain;
            if tick % 20 == 0 {
                player.say(
                    "WARNING",
                    "Extreme gravitational shear detected! Hull integrity at risk.",
                );
            }
        }
        if d < DIST_EVENT_HORIZON {
            player.say("CRITICAL", "Event Horizon crossed! Spaghettification in progress...");
            player.destroy();
            break;
        }
    }

    if player.active && player.energy > 0 {
        for s in cell.stars.iter() {
            if (player.sector - stars[s].pos).length() < DIST_COLLISION_SHIP {
                player.say("CRITICAL", "Impact with star corona! Hull melting...");
                player.destroy();
                break;
            }
        }
    }
    if player.active && player.energy > 0 {
        for p in cell.planets.iter() {
            if (player.sector - planets[p].pos).length() < DIST_COLLISION_SHIP {
                player.say("CRITICAL", "Planetary collision! Structural failure.");
                player.destroy();
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::player::Player;
    use crate::sim::World;

    fn world_with_idle_player(q: Quadrant, sector: DVec3) -> World {
        let mut galaxy = Galaxy::empty();
        let mut p = Player::default();
        p.provision("Test", 0, 0, q);
        p.place_at(q, sector);
        p.active = true;
        galaxy.players[0] = p;
        World::new(galaxy)
    }

    /// Drive `nav 0 0 1` by hand: align 60 ticks, warp, realign, idle.
    #[test]
    fn nav_plot_then_warp_sequence() {
        let q = Quadrant::new(5, 5, 5);
        let mut world = world_with_idle_player(q, DVec3::splat(5.0));
        let start_abs = world.galaxy.players[0].abs;

        {
            let p = &mut world.galaxy.players[0];
            p.target_h = 0.0;
            p.target_m = 0.0;
            p.start_h = p.heading;
            p.start_m = p.mark;
            p.dir = geom::dir_from_angles(0.0, 0.0);
            p.target_abs = p.abs + p.dir * 10.0;
            p.nav_state = NavState::Align;
            p.nav_timer = TIMER_ALIGN;
        }

        for _ in 0..TIMER_ALIGN {
            advance(&mut world.galaxy, &world.index, 0);
        }
        {
            let p = &world.galaxy.players[0];
            assert_eq!(p.nav_state, NavState::Warp);
            assert!(p.nav_timer >= 30);
            assert!((p.warp_speed * p.nav_timer as f64 - 10.0).abs() < 1e-9);
        }

        // The warp leg covers the full distance, monotonically along -y.
        let warp_ticks = world.galaxy.players[0].nav_timer;
        let mut last_y = world.galaxy.players[0].abs.y;
        for _ in 0..warp_ticks {
            advance(&mut world.galaxy, &world.index, 0);
            let y = world.galaxy.players[0].abs.y;
            assert!(y <= last_y);
            last_y = y;
        }
        {
            let p = &world.galaxy.players[0];
            assert_eq!(p.nav_state, NavState::Realign);
            assert!((p.abs - (start_abs + DVec3::new(0.0, -10.0, 0.0))).length() < 1e-6);
        }

        for _ in 0..TIMER_ALIGN {
            advance(&mut world.galaxy, &world.index, 0);
        }
        let p = &world.galaxy.players[0];
        assert_eq!(p.nav_state, NavState::Idle);
        assert_eq!(p.mark, 0.0);
    }

    #[test]
    fn warp_tick_travels_warp_speed() {
        let q = Quadrant::new(5, 5, 5);
        let mut world = world_with_idle_player(q, DVec3::splat(5.0));
        {
            let p = &mut world.galaxy.players[0];
            p.nav_state = NavState::Warp;
            p.nav_timer = 50;
            p.warp_speed = 0.123;
            p.dir = DVec3::new(1.0, 0.0, 0.0);
        }
        let before = world.galaxy.players[0].abs;
        advance(&mut world.galaxy, &world.index, 0);
        let travelled = (world.galaxy.players[0].abs - before).length();
        assert!((travelled - 0.123).abs() < 1e-12);
    }

    #[test]
    fn align_interpolates_heading() {
        let q = Quadrant::new(5, 5, 5);
        let mut world = world_with_idle_player(q, DVec3::splat(5.0));
        {
            let p = &mut world.galaxy.players[0];
            p.heading = 350.0;
            p.start_h = 350.0;
            p.target_h = 10.0; // crosses the wrap, +20 total
            p.nav_state = NavState::Align;
            p.nav_timer = TIMER_ALIGN;
            p.target_abs = p.abs;
        }
        for _ in 0..30 {
            advance(&mut world.galaxy, &world.index, 0);
        }
        let h = world.galaxy.players[0].heading;
        assert!((h - 0.0).abs() < 1.0 || (h - 360.0).abs() < 1.0);

        for _ in 0..30 {
            advance(&mut world.galaxy, &world.index, 0);
        }
        // Align completed: heading landed on target (modulo wrap).
        let p = &world.galaxy.players[0];
        assert!(geom::heading_delta(p.target_h, p.heading).abs() < 1e-6);
    }

    #[test]
    fn impulse_spends_energy_and_stops_dry() {
        let q = Quadrant::new(5, 5, 5);
        let mut world = world_with_idle_player(q, DVec3::splat(5.0));
        {
            let p = &mut world.galaxy.players[0];
            p.energy = 3;
            p.nav_state = NavState::Impulse;
            p.warp_speed = 0.05;
            p.dir = DVec3::new(0.0, 0.0, 1.0);
        }
        for _ in 0..3 {
            advance(&mut world.galaxy, &world.index, 0);
            assert_eq!(world.galaxy.players[0].nav_state, NavState::Impulse);
        }
        advance(&mut world.galaxy, &world.index, 0);
        assert_eq!(world.galaxy.players[0].nav_state, NavState::Idle);
        assert_eq!(world.galaxy.players[0].energy, 0);
    }

    #[test]
    fn wormhole_jump_lands_on_target() {
        let q = Quadrant::new(5, 5, 5);
        let mut world = world_with_idle_player(q, DVec3::splat(5.0));
        let destination = Quadrant::new(9, 2, 7).center();
        {
            let p = &mut world.galaxy.players[0];
            p.nav_state = NavState::Wormhole;
            p.nav_timer = TIMER_WORMHOLE_SEQ;
            p.target_abs = destination;
            p.wormhole_mouth = DVec3::new(5.0, 3.0, 5.0);
        }
        for _ in 0..TIMER_WORMHOLE_SEQ {
            advance(&mut world.galaxy, &world.index, 0);
        }
        let p = &world.galaxy.players[0];
        assert_eq!(p.nav_state, NavState::Idle);
        assert!((p.abs - destination).length() < 1e-9);
        assert_eq!(p.quadrant, Quadrant::new(9, 2, 7));
        assert!(p.fx.jump_arrival.active);
        assert!(!p.fx.wormhole.active);
    }

    #[test]
    fn chase_closes_on_npc() {
        let q = Quadrant::new(5, 5, 5);
        let mut world = world_with_idle_player(q, DVec3::new(2.0, 5.0, 5.0));
        world.galaxy.npcs[7] = crate::entity::NpcShip {
            id: 7,
            quadrant: q,
            pos: DVec3::new(8.0, 5.0, 5.0),
            abs: q.origin() + DVec3::new(8.0, 5.0, 5.0),
            energy: 10_000,
            engine_health: 0.0,
            active: true,
            ..crate::entity::NpcShip::default()
        };
        world.rebuild_index();
        {
            let p = &mut world.galaxy.players[0];
            p.lock_target = id::npc_id(7);
            p.nav_state = NavState::Chase;
            p.energy = 1_000_000;
        }

        let start = (world.galaxy.players[0].abs
            - world.galaxy.npcs[7].abs)
            .length();
        for _ in 0..120 {
            advance(&mut world.galaxy, &world.index, 0);
        }
        let end = (world.galaxy.players[0].abs - world.galaxy.npcs[7].abs).length();
        assert!(end < start);
        assert!(world.galaxy.players[0].energy < 1_000_000);
    }

    #[test]
    fn chase_falls_idle_when_target_gone() {
        let q = Quadrant::new(5, 5, 5);
        let mut world = world_with_idle_player(q, DVec3::splat(5.0));
        {
            let p = &mut world.galaxy.players[0];
            p.lock_target = id::npc_id(3); // inactive slot
            p.nav_state = NavState::Chase;
        }
        advance(&mut world.galaxy, &world.index, 0);
        assert_eq!(world.galaxy.players[0].nav_state, NavState::Idle);
    }

    #[test]
    fn star_collision_is_lethal() {
        let q = Quadrant::new(5, 5, 5);
        let mut world = world_with_idle_player(q, DVec3::new(5.0, 5.0, 5.0));
        world.galaxy.stars[0] = crate::entity::Star {
            quadrant: q,
            pos: DVec3::new(5.5, 5.0, 5.0),
            active: true,
            ..crate::entity::Star::default()
        };
        world.rebuild_index();

        advance(&mut world.galaxy, &world.index, 0);
        let p = &world.galaxy.players[0];
        assert_eq!(p.energy, 0);
        assert_eq!(p.crew_count, 0);
        assert!(p.fx.boom.active);
        assert!(!p.is_alive());
    }
}
