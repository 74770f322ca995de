//! Environmental hazards and events: comet orbits, the supernova singleton,
//! and the per-player hazard block that runs before navigation each tick.

use glam::DVec3;
use rand::Rng;

use crate::config::*;
use crate::entity::player::{resource, system, FxPoint, NavState};
use crate::galaxy::index::SpatialIndex;
use crate::galaxy::{census, Galaxy};
use crate::geom::Quadrant;

/// Advance every comet along its inclined elliptical orbit.
pub fn update_comets(galaxy: &mut Galaxy) {
    for comet in galaxy.comets.iter_mut().filter(|c| c.active) {
        comet.angle += comet.speed;
        if comet.angle > std::f64::consts::TAU {
            comet.angle -= std::f64::consts::TAU;
        }

        let ox = comet.semi_major * comet.angle.cos();
        let oy = comet.semi_minor * comet.angle.sin();
        let abs = DVec3::new(
            comet.center.x + ox,
            comet.center.y + oy * comet.inclination.cos(),
            comet.center.z + oy * comet.inclination.sin(),
        )
        .clamp(DVec3::ZERO, DVec3::splat(100.0));

        comet.quadrant = Quadrant::from_abs(abs);
        comet.pos = abs - comet.quadrant.origin();
    }
}

/// Supernova countdown and annihilation. Returns true when the blast just
/// went off (the caller rebuilds the index and checkpoints).
pub fn supernova_step(galaxy: &mut Galaxy, index: &SpatialIndex) -> bool {
    if galaxy.supernova.timer > 0 {
        galaxy.supernova.timer -= 1;
        let q = galaxy.supernova.quadrant;
        // Negative census is the map-wide distress signal.
        galaxy.master.set_census(q, -(galaxy.supernova.timer as i64));

        let timer = galaxy.supernova.timer;
        let sec = timer / 30;
        if sec > 0 && (timer % 300 == 0 || (sec <= 10 && timer % 30 == 0)) {
            let msg = format!(
                "!!! WARNING: SUPERNOVA IMMINENT IN Q-{}-{}-{}. T-MINUS {} SECONDS !!!",
                q.q1, q.q2, q.q3, sec
            );
            galaxy.broadcast_note("SCIENCE", &msg);
        }

        if timer == 0 {
            annihilate_quadrant(galaxy, q);
            return true;
        }
        return false;
    }

    // Arm a new event: 0.05% per tick, quadrant must hold a star.
    if galaxy.tick > 100 && galaxy.rng.gen_range(0..10_000) < 5 {
        let q = Quadrant::new(
            galaxy.rng.gen_range(1..=10),
            galaxy.rng.gen_range(1..=10),
            galaxy.rng.gen_range(1..=10),
        );
        let cell = index.cell(q);
        if let Some(star_slot) = cell.stars.first() {
            let star = &galaxy.stars[star_slot];
            galaxy.supernova.quadrant = q;
            galaxy.supernova.timer = TIMER_SUPERNOVA;
            galaxy.supernova.epicenter = star.pos;
            galaxy.supernova.star_id = star.id;
            log::info!("supernova armed in Q-{}-{}-{}", q.q1, q.q2, q.q3);
        }
    }
    false
}

fn annihilate_quadrant(galaxy: &mut Galaxy, q: Quadrant) {
    log::info!("supernova detonation in Q-{}-{}-{}", q.q1, q.q2, q.q3);

    for star in galaxy.stars.iter_mut() {
        if star.active && star.quadrant == q {
            star.active = false;
        }
    }
    for planet in galaxy.planets.iter_mut() {
        if planet.active && planet.quadrant == q {
            planet.active = false;
        }
    }
    for npc in galaxy.npcs.iter_mut() {
        if npc.active && npc.quadrant == q {
            npc.active = false;
        }
    }
    for base in galaxy.bases.iter_mut() {
        if base.active && base.quadrant == q {
            base.active = false;
        }
    }
    for player in galaxy.players.iter_mut() {
        if player.active && player.quadrant == q {
            player.say("CRITICAL", "SUPERNOVA IMPACT. VESSEL VAPORIZED.");
            player.energy = 0;
            player.crew_count = 0;
            player.fx.boom = FxPoint::at(player.sector);
            player.active = false;
        }
    }

    // The remnant: one black hole at the epicenter, nothing else.
    galaxy.master.set_census(q, 10_000);
    let epicenter = galaxy.supernova.epicenter;
    if let Some(slot) = galaxy.black_holes.iter().position(|h| !h.active) {
        let hole = &mut galaxy.black_holes[slot];
        hole.id = slot as i32;
        hole.quadrant = q;
        hole.pos = epicenter;
        hole.active = true;
    }
    galaxy.supernova.timer = 0;
}

/// The per-player hazard block: attrition, random events, anomalies,
/// gravity, mines and rifts. Runs before navigation.
pub fn player_environment(galaxy: &mut Galaxy, index: &SpatialIndex, slot: usize) {
    life_support_attrition(galaxy, slot);
    if !galaxy.players[slot].active {
        return;
    }
    random_event_roll(galaxy, slot);
    anomaly_effects(galaxy, index, slot);
    gravity_and_traps(galaxy, index, slot);

    // First tick after load: derive absolute coordinates if unset.
    let player = &mut galaxy.players[slot];
    if player.abs.x <= 0.001 && player.abs.y <= 0.001 {
        player.abs = player.quadrant.origin() + player.sector;
    }
}

fn life_support_attrition(galaxy: &mut Galaxy, slot: usize) {
    if galaxy.tick % 100 != 0 {
        return;
    }
    let tick = galaxy.tick;
    let player = &mut galaxy.players[slot];
    let ls = player.system_health[system::LIFE_SUPPORT];
    if ls >= 75.0 {
        return;
    }
    let loss = if ls < 25.0 { 5 } else { 1 };
    player.crew_count = (player.crew_count - loss).max(0);
    if player.crew_count == 0 {
        player.say("CRITICAL", "Life support failure. Crew lost. Vessel adrift.");
        player.fx.boom = FxPoint::at(player.sector);
        player.active = false;
    } else if tick % 300 == 0 {
        player.say(
            "MEDICAL",
            "Warning: Casualties reported due to life support instability.",
        );
    }
}

fn random_event_roll(galaxy: &mut Galaxy, slot: usize) {
    if galaxy.tick % 1000 != 0 {
        return;
    }
    let Galaxy { players, rng, master, .. } = galaxy;
    if rng.gen_range(0..100) >= 20 {
        return;
    }
    let player = &mut players[slot];
    match rng.gen_range(0..4) {
        0 | 1 => {
            player.say("SCIENCE", "Ion Storm detected! Sensors effectively blinded.");
            player.system_health[system::SENSORS] *= 0.5;
            if player.quadrant.is_valid() {
                let v = master.census(player.quadrant);
                master.set_census(player.quadrant, census::mark_ion_storm(v));
            }
        }
        2 => {
            player.say(
                "HELMSMAN",
                "Spatial shear encountered! We are being pushed off course!",
            );
            player.abs += DVec3::new(
                rng.gen_range(-50..50) as f64 / 50.0,
                rng.gen_range(-50..50) as f64 / 50.0,
                rng.gen_range(-50..50) as f64 / 50.0,
            );
            player.sync_derived_position();
        }
        _ => {
            player.say(
                "ENGINEERING",
                "Subspace surge detected. Power levels fluctuating.",
            );
            player.energy = (player.energy + rng.gen_range(-5000..5000)).max(0);
        }
    }
}

fn anomaly_effects(galaxy: &mut Galaxy, index: &SpatialIndex, slot: usize) {
    let tick = galaxy.tick;
    let Galaxy {
        players,
        nebulas,
        pulsars,
        comets,
        asteroids,
        rng,
        ..
    } = galaxy;
    let player = &mut players[slot];
    if !player.quadrant.is_valid() {
        return;
    }
    let cell = index.cell(player.quadrant);

    let mut in_nebula = false;
    for n in cell.nebulas.iter() {
        let d = (player.sector - nebulas[n].pos).length();
        if d < 2.0 {
            in_nebula = true;
            if tick % 60 == 0 {
                player.energy = (player.energy - 50).max(0);
            }
            if tick % 300 == 0 {
                player.say("COMPUTER", "Alert: Nebular interference draining shields.");
            }
        }
    }

    // Pulsar radiation burst: shield damage scaled by proximity, spillover
    // takes crew.
    for p in cell.pulsars.iter() {
        let d = (player.sector - pulsars[p].pos).length();
        if d < 2.5 && tick % 60 == 0 {
            let dmg = ((2.5 - d) * 400.0) as i32;
            let mut absorbed = 0;
            for s in 0..6 {
                if player.shields[s] > 0 {
                    let soak = (dmg / 6).min(player.shields[s]);
                    player.shields[s] -= soak;
                    absorbed += soak;
                }
            }
            if absorbed < dmg {
                player.crew_count = (player.crew_count - rng.gen_range(1..=5)).max(0);
            }
            player.say(
                "WARNING",
                format!("Radiation Critical! Shield Integrity Failing. (Dmg: {dmg})"),
            );
            if player.crew_count == 0 {
                player.say("CRITICAL", "ALL HANDS LOST TO RADIATION.");
                player.fx.boom = FxPoint::at(player.sector);
                player.active = false;
                return;
            }
        }
    }

    // Comet tail scooping.
    for c in cell.comets.iter() {
        let d = (player.sector - comets[c].pos).length();
        if d < 0.6 && tick % 100 == 0 {
            player.inventory[resource::GASES] += 5;
            player.say("ENGINEERING", "Collecting rare gases from comet tail.");
        }
    }

    // Asteroid grinding at speed.
    for a in cell.asteroids.iter() {
        let d = (player.sector - asteroids[a].pos).length();
        if d < 0.8 && player.warp_speed > 0.1 && tick % 30 == 0 {
            let dmg = (player.warp_speed * 1000.0) as i32;
            for s in 0..6 {
                player.shields[s] = (player.shields[s] - dmg / 10).max(0);
            }
            player.system_health[system::IMPULSE] =
                (player.system_health[system::IMPULSE] - 0.5).max(0.0);
            player.say("WARNING", "Colliding with asteroids! Reduce speed!");
        }
    }

    // Inside a nebula shields bleed instead of recharging.
    if in_nebula && player.energy > 0 {
        for s in 0..6 {
            if player.shields[s] < 5000 {
                player.shields[s] = (player.shields[s] - 2).max(0);
            }
        }
    }

    // Sustained pulsar exposure: radiation leaks through shields.
    for p in cell.pulsars.iter() {
        let d = (player.sector - pulsars[p].pos).length();
        if d < 2.0 {
            if rng.gen_range(0..100) < 10 {
                player.crew_count = (player.crew_count - 1).max(0);
                player.say("MEDICAL", "RADIATION ALERT! EQUIPMENT FAILURE IN SICKBAY!");
            }
            player.energy -= 50;
        }
    }
}

fn gravity_and_traps(galaxy: &mut Galaxy, index: &SpatialIndex, slot: usize) {
    let Galaxy {
        players,
        black_holes,
        mines,
        rifts,
        rng,
        ..
    } = galaxy;
    let player = &mut players[slot];
    if !player.quadrant.is_valid() {
        return;
    }
    let cell = index.cell(player.quadrant);

    // Black hole tug toward the singularity.
    for h in cell.black_holes.iter() {
        let delta = black_holes[h].pos - player.sector;
        let d = delta.length();
        if d < DIST_GRAVITY_WELL && d > 0.1 {
            let force = 0.05 / (d * d);
            player.sector += (delta / d) * force;
            player.abs = player.quadrant.origin() + player.sector;
        }
    }

    // Mines detonate on proximity.
    for m in cell.mines.iter() {
        let mine = &mut mines[m];
        if !mine.active {
            continue;
        }
        let d = (player.sector - mine.pos).length();
        if d < DIST_MINE_TRIGGER {
            mine.active = false;
            player.fx.boom = FxPoint::at(mine.pos);
            player.apply_spread_damage(DMG_MINE);
            player.shield_regen_delay = SHIELD_REGEN_DELAY;
            player.say("CRITICAL", "MINE DETONATION! PROXIMITY ALERT FAILURE!");
        }
    }

    // Rifts fold the ship to a random point in the galaxy.
    for r in cell.rifts.iter() {
        let d = (player.sector - rifts[r].pos).length();
        if d < DIST_RIFT_TRIGGER {
            let q = Quadrant::new(
                rng.gen_range(1..=10),
                rng.gen_range(1..=10),
                rng.gen_range(1..=10),
            );
            let sector = DVec3::new(
                rng.gen_range(0..100) as f64 / 10.0,
                rng.gen_range(0..100) as f64 / 10.0,
                rng.gen_range(0..100) as f64 / 10.0,
            );
            player.place_at(q, sector);
            player.nav_state = NavState::Idle;
            player.warp_speed = 0.0;
            player.say(
                "CRITICAL",
                "SPATIAL RIFT ENCOUNTERED! UNCONTROLLED SUBSPACE FOLDING IN PROGRESS!",
            );
            player.say(
                "HELMSMAN",
                "Teleportation complete. Sensors recalibrating to new position.",
            );
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::player::Player;
    use crate::entity::{Mine, Nebula, Rift, Star};
    use crate::sim::World;

    fn world_with_player(q: Quadrant, sector: DVec3) -> World {
        let mut galaxy = Galaxy::empty();
        let mut p = Player::default();
        p.provision("Test", 0, 0, q);
        p.place_at(q, sector);
        p.active = true;
        galaxy.players[0] = p;
        World::new(galaxy)
    }

    #[test]
    fn mine_detonates_within_trigger_radius() {
        let q = Quadrant::new(5, 5, 5);
        let mut world = world_with_player(q, DVec3::new(5.0, 5.0, 5.0));
        world.galaxy.mines[0] = Mine {
            quadrant: q,
            pos: DVec3::new(5.35, 5.0, 5.0),
            active: true,
            ..Mine::default()
        };
        world.galaxy.players[0].shields = [2000; 6];
        world.rebuild_index();

        let shields_before: i32 = world.galaxy.players[0].shields.iter().sum();
        let energy_before = world.galaxy.players[0].energy;
        gravity_and_traps(&mut world.galaxy, &world.index, 0);

        let p = &world.galaxy.players[0];
        assert!(!world.galaxy.mines[0].active);
        assert!(p.fx.boom.active);
        let shield_loss = shields_before - p.shields.iter().sum::<i32>();
        let hull_loss = energy_before - p.energy;
        assert_eq!(shield_loss + hull_loss, DMG_MINE);
    }

    #[test]
    fn mine_ignored_outside_radius() {
        let q = Quadrant::new(5, 5, 5);
        let mut world = world_with_player(q, DVec3::new(5.0, 5.0, 5.0));
        world.galaxy.mines[0] = Mine {
            quadrant: q,
            pos: DVec3::new(5.5, 5.0, 5.0),
            active: true,
            ..Mine::default()
        };
        world.rebuild_index();

        gravity_and_traps(&mut world.galaxy, &world.index, 0);
        assert!(world.galaxy.mines[0].active);
    }

    #[test]
    fn rift_teleports_and_clears_nav() {
        let q = Quadrant::new(2, 2, 2);
        let mut world = world_with_player(q, DVec3::new(5.0, 5.0, 5.0));
        world.galaxy.rifts[0] = Rift {
            quadrant: q,
            pos: DVec3::new(5.2, 5.0, 5.0),
            active: true,
            ..Rift::default()
        };
        world.galaxy.players[0].nav_state = NavState::Warp;
        world.galaxy.players[0].warp_speed = 0.5;
        world.rebuild_index();

        gravity_and_traps(&mut world.galaxy, &world.index, 0);
        let p = &world.galaxy.players[0];
        assert_eq!(p.nav_state, NavState::Idle);
        assert_eq!(p.warp_speed, 0.0);
        assert_eq!(Quadrant::from_abs(p.abs), p.quadrant);
    }

    #[test]
    fn black_hole_pulls_inward() {
        let q = Quadrant::new(3, 3, 3);
        let mut world = world_with_player(q, DVec3::new(5.0, 5.0, 5.0));
        world.galaxy.black_holes[0] = crate::entity::BlackHole {
            quadrant: q,
            pos: DVec3::new(7.0, 5.0, 5.0),
            active: true,
            ..crate::entity::BlackHole::default()
        };
        world.rebuild_index();

        gravity_and_traps(&mut world.galaxy, &world.index, 0);
        let p = &world.galaxy.players[0];
        assert!(p.sector.x > 5.0);
        assert!((p.sector.x - (5.0 + 0.05 / 4.0)).abs() < 1e-9);
    }

    #[test]
    fn nebula_drains_on_the_minute() {
        let q = Quadrant::new(4, 4, 4);
        let mut world = world_with_player(q, DVec3::new(5.0, 5.0, 5.0));
        world.galaxy.nebulas[0] = Nebula {
            quadrant: q,
            pos: DVec3::new(5.5, 5.0, 5.0),
            active: true,
            ..Nebula::default()
        };
        world.rebuild_index();
        world.galaxy.tick = 60;

        let before = world.galaxy.players[0].energy;
        anomaly_effects(&mut world.galaxy, &world.index, 0);
        assert_eq!(world.galaxy.players[0].energy, before - 50);
    }

    #[test]
    fn supernova_annihilates_quadrant() {
        let q = Quadrant::new(5, 5, 5);
        let mut world = world_with_player(q, DVec3::new(2.0, 2.0, 2.0));
        world.galaxy.stars[0] = Star {
            id: 0,
            faction: 4,
            quadrant: q,
            pos: DVec3::new(6.0, 6.0, 6.0),
            active: true,
        };
        world.galaxy.planets[0] = crate::entity::Planet {
            quadrant: q,
            pos: DVec3::new(3.0, 3.0, 3.0),
            active: true,
            ..crate::entity::Planet::default()
        };
        world.galaxy.npcs[0] = crate::entity::NpcShip {
            quadrant: q,
            pos: DVec3::new(8.0, 8.0, 8.0),
            abs: q.origin() + DVec3::new(8.0, 8.0, 8.0),
            energy: 10_000,
            active: true,
            ..crate::entity::NpcShip::default()
        };
        world.rebuild_index();

        world.galaxy.supernova.quadrant = q;
        world.galaxy.supernova.timer = 1;
        world.galaxy.supernova.epicenter = DVec3::new(6.0, 6.0, 6.0);

        let exploded = supernova_step(&mut world.galaxy, &world.index);
        assert!(exploded);
        assert!(!world.galaxy.stars[0].active);
        assert!(!world.galaxy.planets[0].active);
        assert!(!world.galaxy.npcs[0].active);
        assert!(!world.galaxy.players[0].active);
        assert!(world.galaxy.players[0].fx.boom.active);
        assert_eq!(world.galaxy.master.census(q), 10_000);

        let remnant = world
            .galaxy
            .black_holes
            .iter()
            .find(|h| h.active && h.quadrant == q)
            .expect("remnant black hole");
        assert!((remnant.pos - DVec3::new(6.0, 6.0, 6.0)).length() < 1e-9);
    }

    #[test]
    fn countdown_overrides_census() {
        let q = Quadrant::new(6, 6, 6);
        let mut world = world_with_player(Quadrant::new(1, 1, 1), DVec3::splat(5.0));
        world.galaxy.supernova.quadrant = q;
        world.galaxy.supernova.timer = 500;

        supernova_step(&mut world.galaxy, &world.index);
        assert_eq!(world.galaxy.master.census(q), -499);
    }
}
