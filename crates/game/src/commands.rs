//! The textual command dispatcher.
//!
//! Inbound command payloads are ASCII lines. A registry maps prefixes to
//! handlers, first hit wins and order matters ("nav " before "nav" style
//! collisions are resolved by the table). Handlers run under the world lock
//! and reply through the player's chat outbox.

use glam::DVec3;
use rand::Rng;

use crate::config::*;
use crate::crypto::CipherAlgo;
use crate::entity::id::{self, TargetClass};
use crate::entity::player::{resource, system, FxDismantle, FxPoint, NavState};
use crate::entity::{species_name, ShipClass};
use crate::galaxy::index::SpatialIndex;
use crate::galaxy::{census, Galaxy};
use crate::geom::{self, Quadrant};
use crate::sim::combat;

type Handler = fn(&mut Galaxy, &SpatialIndex, usize, &str);

struct CommandDef {
    prefix: &'static str,
    handler: Handler,
}

/// First-hit prefix table; entries taking arguments keep their trailing
/// space so `lock 5` does not collide with a future `lockdown`.
const REGISTRY: &[CommandDef] = &[
    CommandDef { prefix: "nav ", handler: handle_nav },
    CommandDef { prefix: "imp ", handler: handle_imp },
    CommandDef { prefix: "apr ", handler: handle_apr },
    CommandDef { prefix: "cha", handler: handle_cha },
    CommandDef { prefix: "srs", handler: handle_srs },
    CommandDef { prefix: "lrs", handler: handle_lrs },
    CommandDef { prefix: "pha ", handler: handle_pha },
    CommandDef { prefix: "tor", handler: handle_tor },
    CommandDef { prefix: "she ", handler: handle_she },
    CommandDef { prefix: "lock ", handler: handle_lock },
    CommandDef { prefix: "clo", handler: handle_clo },
    CommandDef { prefix: "bor", handler: handle_bor },
    CommandDef { prefix: "dis", handler: handle_dis },
    CommandDef { prefix: "min", handler: handle_min },
    CommandDef { prefix: "sco", handler: handle_sco },
    CommandDef { prefix: "har", handler: handle_har },
    CommandDef { prefix: "doc", handler: handle_doc },
    CommandDef { prefix: "con ", handler: handle_con },
    CommandDef { prefix: "load ", handler: handle_load },
    CommandDef { prefix: "rep ", handler: handle_rep },
    CommandDef { prefix: "jum ", handler: handle_jum },
    CommandDef { prefix: "psy", handler: handle_psy },
    CommandDef { prefix: "enc ", handler: handle_enc },
    CommandDef { prefix: "sta", handler: handle_sta },
    CommandDef { prefix: "inv", handler: handle_inv },
    CommandDef { prefix: "dam", handler: handle_dam },
    CommandDef { prefix: "cal ", handler: handle_cal },
    CommandDef { prefix: "who", handler: handle_who },
    CommandDef { prefix: "aux ", handler: handle_aux },
    CommandDef { prefix: "xxx", handler: handle_xxx },
];

/// Dispatch one command line for a player. Unknown input earns a computer
/// error reply, never a state change.
pub fn dispatch(galaxy: &mut Galaxy, index: &SpatialIndex, slot: usize, line: &str) {
    for def in REGISTRY {
        if let Some(params) = line.strip_prefix(def.prefix) {
            (def.handler)(galaxy, index, slot, params.trim());
            return;
        }
    }
    galaxy.players[slot].say("COMPUTER", "Invalid command. Type 'help' for assistance.");
}

fn floats(params: &str) -> Vec<f64> {
    params
        .split_whitespace()
        .map_while(|t| t.parse::<f64>().ok())
        .collect()
}

fn ints(params: &str) -> Vec<i32> {
    params
        .split_whitespace()
        .map_while(|t| t.parse::<i32>().ok())
        .collect()
}

fn handle_nav(galaxy: &mut Galaxy, _index: &SpatialIndex, slot: usize, params: &str) {
    let args = floats(params);
    let player = &mut galaxy.players[slot];
    let [mut h, mut m, w] = match args[..] {
        [h, m, w] => [h, m, w],
        _ => {
            player.say("COMPUTER", "Usage: nav <H> <M> <W>");
            return;
        }
    };

    geom::normalize_upright(&mut h, &mut m);
    player.target_h = h;
    player.target_m = m;
    player.start_h = player.heading;
    player.start_m = player.mark;
    player.dir = geom::dir_from_angles(h, m);
    player.target_abs = player.quadrant.origin() + player.sector + player.dir * w * 10.0;
    player.nav_state = NavState::Align;
    player.nav_timer = TIMER_ALIGN;
    player.say("HELMSMAN", "Course plotted. Aligning ship.");
}

fn handle_imp(galaxy: &mut Galaxy, _index: &SpatialIndex, slot: usize, params: &str) {
    let args = floats(params);
    let player = &mut galaxy.players[slot];
    // `imp S` keeps the current attitude; `imp H M S` turns first.
    let (mut h, mut m, s) = match args[..] {
        [s] => (player.heading, player.mark, s),
        [h, m, s] => (h, m, s),
        _ => {
            player.say("COMPUTER", "Usage: imp <H> <M> <S> or imp <S>");
            return;
        }
    };

    if s <= 0.0 {
        player.nav_state = NavState::Realign;
        player.nav_timer = TIMER_ALIGN;
        player.start_m = player.mark;
        player.warp_speed = 0.0;
        player.say("HELMSMAN", "Impulse All Stop. Stabilizing vector.");
        return;
    }

    let s = s.min(1.0);
    geom::normalize_upright(&mut h, &mut m);
    player.target_h = h;
    player.target_m = m;
    player.start_h = player.heading;
    player.start_m = player.mark;
    player.dir = geom::dir_from_angles(h, m);
    player.warp_speed = s * 0.5;
    player.nav_state = NavState::AlignImpulse;
    player.nav_timer = TIMER_ALIGN;
    player.say("HELMSMAN", "Course plotted. Aligning ship.");
}

/// Absolute position of an approach target in the player's quadrant.
fn approach_point(galaxy: &Galaxy, slot: usize, target: i32) -> Option<DVec3> {
    let here = galaxy.players[slot].quadrant;
    let local = |q: Quadrant, pos: DVec3, active: bool| (active && q == here).then(|| q.origin() + pos);
    match id::classify(target)? {
        (TargetClass::Player, s) => {
            let p = &galaxy.players[s];
            (p.active && p.quadrant == here && s != slot).then_some(p.abs)
        }
        (TargetClass::Npc, s) => {
            let n = &galaxy.npcs[s];
            local(n.quadrant, n.pos, n.active)
        }
        (TargetClass::Base, s) => {
            let b = &galaxy.bases[s];
            local(b.quadrant, b.pos, b.active)
        }
        (TargetClass::Planet, s) => {
            let p = &galaxy.planets[s];
            local(p.quadrant, p.pos, p.active)
        }
        (TargetClass::Star, s) => {
            let st = &galaxy.stars[s];
            local(st.quadrant, st.pos, st.active)
        }
        (TargetClass::BlackHole, s) => {
            let h = &galaxy.black_holes[s];
            local(h.quadrant, h.pos, h.active)
        }
        _ => None,
    }
}

fn handle_apr(galaxy: &mut Galaxy, _index: &SpatialIndex, slot: usize, params: &str) {
    let args = floats(params);
    let [target, hold] = match args[..] {
        [t, d] => [t, d],
        _ => {
            galaxy.players[slot].say("COMPUTER", "Usage: apr <ID> <DIST>");
            return;
        }
    };

    let Some(point) = approach_point(galaxy, slot, target as i32) else {
        galaxy.players[slot].say("COMPUTER", "Target not found in current quadrant.");
        return;
    };

    let player = &mut galaxy.players[slot];
    let delta = point - player.abs;
    let d = delta.length();
    if d <= hold {
        player.say("COMPUTER", "Target already in range.");
        return;
    }

    let (h, m) = geom::angles_to(delta, d);
    player.target_h = h;
    player.target_m = m;
    player.dir = delta / d;
    player.target_abs = player.abs + player.dir * (d - hold);
    player.start_h = player.heading;
    player.start_m = player.mark;
    player.nav_state = NavState::Align;
    player.nav_timer = TIMER_ALIGN;
    player.say("HELMSMAN", "Autopilot engaged.");
}

fn handle_cha(galaxy: &mut Galaxy, _index: &SpatialIndex, slot: usize, _params: &str) {
    let player = &mut galaxy.players[slot];
    if player.lock_target > 0 {
        player.nav_state = NavState::Chase;
        player.say("HELMSMAN", "Chase mode engaged. Intercepting target vector.");
    } else {
        player.say("COMPUTER", "Unable to comply. No target locked.");
    }
}

fn bearing_line(from: DVec3, to: DVec3) -> (f64, f64, f64) {
    let delta = to - from;
    let d = delta.length();
    let (h, m) = geom::angles_to(delta, d);
    (d, h, m)
}

fn handle_srs(galaxy: &mut Galaxy, index: &SpatialIndex, slot: usize, _params: &str) {
    let player = &galaxy.players[slot];
    let q = player.quadrant;
    let s = player.sector;
    let locked = player.lock_target;
    let chasing = player.nav_state == NavState::Chase;
    let status_for = |id: i32| -> &'static str {
        if id == locked {
            if chasing {
                "[LOCKED][CHASE]"
            } else {
                "[LOCKED]"
            }
        } else {
            ""
        }
    };

    let mut b = format!(
        "\n--- SHORT RANGE SENSOR ANALYSIS ---\nQUADRANT: [{},{},{}] | SECTOR: [{:.1},{:.1},{:.1}]\n",
        q.q1, q.q2, q.q3, s.x, s.y, s.z
    );
    b.push_str(&format!(
        "ENERGY: {} | TORPEDOES: {} | STATUS: {}\n",
        player.energy,
        player.torpedoes,
        if player.cloaked { "CLOAKED" } else { "NORMAL" }
    ));
    b.push_str("\nTYPE       ID    POSITION      DIST   H / M         DETAILS\n");

    let cell = index.cell(q);
    for j in cell.players.iter() {
        if j == slot || galaxy.players[j].cloaked {
            continue;
        }
        let p = &galaxy.players[j];
        let (d, h, m) = bearing_line(s, p.sector);
        let pid = id::player_id(j);
        b.push_str(&format!(
            "{:<10} {:<5} [{:.1},{:.1},{:.1}] {:<5.1} {:03.0} / {:+03.0}     {} (Player) [E:{}] {}\n",
            "Vessel", pid, p.sector.x, p.sector.y, p.sector.z, d, h, m, p.name, p.energy,
            status_for(pid)
        ));
    }
    for n in cell.npcs.iter() {
        let npc = &galaxy.npcs[n];
        let (d, h, m) = bearing_line(s, npc.pos);
        let nid = id::npc_id(n);
        b.push_str(&format!(
            "{:<10} {:<5} [{:.1},{:.1},{:.1}] {:<5.1} {:03.0} / {:+03.0}     {} [E:{}] [Engines:{:.0}%] {}\n",
            "Vessel", nid, npc.pos.x, npc.pos.y, npc.pos.z, d, h, m,
            species_name(npc.faction), npc.energy, npc.engine_health, status_for(nid)
        ));
    }
    for p in cell.planets.iter() {
        let planet = &galaxy.planets[p];
        let (d, h, m) = bearing_line(s, planet.pos);
        let pid = planet.id + id::PLANET_BASE;
        b.push_str(&format!(
            "{:<10} {:<5} [{:.1},{:.1},{:.1}] {:<5.1} {:03.0} / {:+03.0}     Class-M Planet {}\n",
            "Planet", pid, planet.pos.x, planet.pos.y, planet.pos.z, d, h, m, status_for(pid)
        ));
    }
    for st in cell.stars.iter() {
        let star = &galaxy.stars[st];
        let (d, h, m) = bearing_line(s, star.pos);
        let sid = star.id + id::STAR_BASE;
        b.push_str(&format!(
            "{:<10} {:<5} [{:.1},{:.1},{:.1}] {:<5.1} {:03.0} / {:+03.0}     Star {}\n",
            "Star", sid, star.pos.x, star.pos.y, star.pos.z, d, h, m, status_for(sid)
        ));
    }
    for hb in cell.black_holes.iter() {
        let hole = &galaxy.black_holes[hb];
        let (d, h, m) = bearing_line(s, hole.pos);
        let bid = hole.id + id::BLACK_HOLE_BASE;
        b.push_str(&format!(
            "{:<10} {:<5} [{:.1},{:.1},{:.1}] {:<5.1} {:03.0} / {:+03.0}     Black Hole {}\n",
            "B-Hole", bid, hole.pos.x, hole.pos.y, hole.pos.z, d, h, m, status_for(bid)
        ));
    }

    galaxy.players[slot].say("COMPUTER", b);
}

fn handle_lrs(galaxy: &mut Galaxy, index: &SpatialIndex, slot: usize, _params: &str) {
    let player = &galaxy.players[slot];
    let q = player.quadrant;
    let s = player.sector;
    let mut rep = String::from("\n--- 3D LONG RANGE SENSOR SCAN ---");

    for l in (q.q3 - 1..=q.q3 + 1).rev() {
        if !(1..=10).contains(&l) {
            continue;
        }
        rep.push_str(&format!("\n[ DECK Z:{l} ]\n"));
        rep.push_str("         X-1 (West)               X (Center)               X+1 (East)\n");
        for y in q.q2 - 1..=q.q2 + 1 {
            rep.push_str(if y == q.q2 - 1 {
                "Y-1 (N) "
            } else if y == q.q2 {
                "Y   (C) "
            } else {
                "Y+1 (S) "
            });
            for x in q.q1 - 1..=q.q1 + 1 {
                if (1..=10).contains(&x) && (1..=10).contains(&y) {
                    let cell = index.cell(Quadrant::new(x, y, l));
                    let val = cell.black_holes.len() * 10_000
                        + cell.planets.len() * 1000
                        + (cell.npcs.len() + cell.players.len()) * 100
                        + cell.bases.len() * 10
                        + cell.stars.len();
                    if x == q.q1 && y == q.q2 && l == q.q3 {
                        rep.push_str(":[        YOU         ]: ");
                    } else {
                        let dx = (x - q.q1) as f64 * 10.0 + (5.5 - s.x);
                        let dy = (q.q2 - y) as f64 * 10.0 + (s.y - 5.5);
                        let dz = (l - q.q3) as f64 * 10.0 + (5.5 - s.z);
                        let dist = (dx * dx + dy * dy + dz * dz).sqrt();
                        let m = if dist > 0.001 {
                            ((dz / dist).asin().to_degrees()) as i32
                        } else {
                            0
                        };
                        let h = match (y - q.q2, x - q.q1) {
                            (-1, -1) => 315,
                            (-1, 0) => 0,
                            (-1, 1) => 45,
                            (0, -1) => 270,
                            (0, 1) => 90,
                            (1, -1) => 225,
                            (1, 0) => 180,
                            (1, 1) => 135,
                            _ => 0,
                        };
                        rep.push_str(&format!(
                            "[{:05}/H{:03}/M{:+03}/W{:.1}]: ",
                            val,
                            h,
                            m,
                            dist / 10.0
                        ));
                    }
                } else {
                    rep.push_str(":[        ***         ]: ");
                }
            }
            rep.push('\n');
        }
    }

    galaxy.players[slot].say("SCIENCE", rep);
}

fn handle_pha(galaxy: &mut Galaxy, _index: &SpatialIndex, slot: usize, params: &str) {
    let Some(&energy) = ints(params).first() else {
        return;
    };
    let (reserve, bank_health) = {
        let player = &galaxy.players[slot];
        (player.energy, player.system_health[system::PHASERS])
    };
    if reserve < energy {
        galaxy.players[slot].say("COMPUTER", "Insufficient energy for phaser burst.");
        return;
    }
    if bank_health < 10.0 {
        galaxy.players[slot].say("WARNING", "Phaser banks inoperative.");
        return;
    }

    let report = combat::fire_phasers(galaxy, slot, energy);
    let note = if report.connected {
        format!("Phasers hit target! Damage: {}", report.hit)
    } else {
        "Phasers fired into space.".to_string()
    };
    galaxy.players[slot].say("TACTICAL", note);
}

/// Sector position a torpedo lock resolves against.
fn torpedo_aim(galaxy: &Galaxy, slot: usize, target: i32) -> Option<DVec3> {
    let here = galaxy.players[slot].quadrant;
    match id::classify(target)? {
        (TargetClass::Player, s) if s != slot => {
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

fn handle_tor(galaxy: &mut Galaxy, _index: &SpatialIndex, slot: usize, params: &str) {
    let (stock, in_flight, loading) = {
        let player = &galaxy.players[slot];
        (
            player.torpedoes,
            player.torpedo.active,
            player.torpedo.load_timer,
        )
    };
    if stock <= 0 {
        galaxy.players[slot].say("TACTICAL", "Torpedo bays empty.");
        return;
    }
    if in_flight {
        galaxy.players[slot].say("TACTICAL", "Torpedo already in flight.");
        return;
    }
    if loading > 0 {
        galaxy.players[slot].say("TACTICAL", "Torpedo tube still loading.");
        return;
    }

    let lock = galaxy.players[slot].lock_target;
    let aim = if lock > 0 {
        torpedo_aim(galaxy, slot, lock)
    } else {
        None
    };

    let (h, m, guided) = match aim {
        Some(point) => {
            let from = galaxy.players[slot].sector;
            let (_, h, m) = bearing_line(from, point);
            (h, m, true)
        }
        None => {
            let args = floats(params);
            match args[..] {
                [h, m] => (h, m, false),
                _ => {
                    galaxy.players[slot].say("TACTICAL", "No lock. Usage: tor <H> <M>");
                    return;
                }
            }
        }
    };

    let player = &mut galaxy.players[slot];
    player.torpedoes -= 1;
    player.torpedo.active = true;
    player.torpedo.target = if guided { lock } else { 0 };
    player.torpedo.pos = player.sector;
    player.torpedo.dir = geom::dir_from_angles(h, m);
    player.torpedo.load_timer = TIMER_TORP_LOAD;
    player.torpedo.timeout = TIMER_TORP_TIMEOUT;
    player.say(
        "TACTICAL",
        if guided { "Torpedo away (Locked)." } else { "Torpedo away (Manual)." },
    );
}

fn handle_she(galaxy: &mut Galaxy, _index: &SpatialIndex, slot: usize, params: &str) {
    let args = ints(params);
    if args.len() != 6 {
        return;
    }
    let player = &mut galaxy.players[slot];
    for (shield, &value) in player.shields.iter_mut().zip(args.iter()) {
        *shield = value.clamp(0, SHIELD_MAX_STRENGTH);
    }
    player.say("ENGINEERING", "Shields updated.");
}

fn handle_lock(galaxy: &mut Galaxy, _index: &SpatialIndex, slot: usize, params: &str) {
    let Some(&target) = ints(params).first() else {
        return;
    };
    if target == 0 {
        let player = &mut galaxy.players[slot];
        player.lock_target = 0;
        player.say("TACTICAL", "Lock released.");
        return;
    }

    let here = galaxy.players[slot].quadrant;
    let name = match id::classify(target) {
        Some((TargetClass::Player, s)) if s != slot && galaxy.players[s].active => {
            Some(galaxy.players[s].name.clone())
        }
        Some((TargetClass::Npc, s)) if galaxy.npcs[s].active => {
            Some(format!("{} Vessel", species_name(galaxy.npcs[s].faction)))
        }
        Some((TargetClass::Base, s))
            if galaxy.bases[s].active && galaxy.bases[s].quadrant == here =>
        {
            Some("Starbase".to_string())
        }
        Some((TargetClass::Planet, s))
            if galaxy.planets[s].active && galaxy.planets[s].quadrant == here =>
        {
            Some("Planet".to_string())
        }
        Some((TargetClass::Star, s))
            if galaxy.stars[s].active && galaxy.stars[s].quadrant == here =>
        {
            Some("Star".to_string())
        }
        Some((TargetClass::BlackHole, s))
            if galaxy.black_holes[s].active && galaxy.black_holes[s].quadrant == here =>
        {
            Some("Black Hole".to_string())
        }
        _ => None,
    };

    let player = &mut galaxy.players[slot];
    match name {
        Some(name) => {
            player.lock_target = target;
            player.say("TACTICAL", format!("Target locked: {name} (ID {target})"));
        }
        None => player.say("COMPUTER", "Unable to acquire lock. Target not found."),
    }
}

fn handle_clo(galaxy: &mut Galaxy, _index: &SpatialIndex, slot: usize, _params: &str) {
    let player = &mut galaxy.players[slot];
    player.cloaked = !player.cloaked;
    let note = if player.cloaked { "Cloak active." } else { "Cloak offline." };
    player.say("ENGINEERING", note);
}

fn handle_bor(galaxy: &mut Galaxy, _index: &SpatialIndex, slot: usize, _params: &str) {
    if galaxy.players[slot].energy < 5000 {
        galaxy.players[slot].say("COMPUTER", "Insufficient energy for boarding operation.");
        return;
    }
    let here = galaxy.players[slot].quadrant;
    let target = galaxy.players[slot].lock_target;

    enum Boarding {
        Ship(usize),
        Npc(usize),
    }
    let (pos, victim) = match id::classify(target) {
        Some((TargetClass::Player, s))
            if s != slot && galaxy.players[s].active && galaxy.players[s].quadrant == here =>
        {
            (galaxy.players[s].sector, Boarding::Ship(s))
        }
        Some((TargetClass::Npc, s))
            if galaxy.npcs[s].active && galaxy.npcs[s].quadrant == here =>
        {
            (galaxy.npcs[s].pos, Boarding::Npc(s))
        }
        _ => return,
    };

    let d = (pos - galaxy.players[slot].sector).length();
    if d >= DIST_BOARDING_MAX {
        galaxy.players[slot].say("COMPUTER", "Target out of transporter range.");
        return;
    }

    galaxy.players[slot].energy -= 5000;
    if galaxy.rng.gen_range(0..100) < 80 {
        match victim {
            Boarding::Ship(s) => {
                let target_player = &mut galaxy.players[s];
                for health in target_player.system_health.iter_mut() {
                    *health *= 0.5;
                }
                target_player.nav_state = NavState::Idle;
                target_player.say("CRITICAL", "ENEMY BOARDING PARTIES ON ALL DECKS!");
            }
            Boarding::Npc(s) => {
                let npc = &mut galaxy.npcs[s];
                npc.engine_health = 0.0;
                npc.energy = (npc.energy as f64 * 0.7) as i32;
            }
        }
        galaxy.players[slot].say("TACTICAL", "Boarding successful. Enemy systems disabled.");
    } else {
        galaxy.players[slot].say(
            "SECURITY",
            "Boarding party repelled! We sustained internal damage.",
        );
    }
}

fn handle_dis(galaxy: &mut Galaxy, _index: &SpatialIndex, slot: usize, _params: &str) {
    let here = galaxy.players[slot].quadrant;
    let target = galaxy.players[slot].lock_target;
    let Some((TargetClass::Npc, s)) = id::classify(target) else {
        return;
    };
    if !galaxy.npcs[s].active || galaxy.npcs[s].quadrant != here {
        return;
    }

    let pos = galaxy.npcs[s].pos;
    let d = (pos - galaxy.players[slot].sector).length();
    if d >= DIST_DISMANTLE_MAX {
        galaxy.players[slot].say("COMPUTER", "Target out of tractor beam range.");
        return;
    }
    if galaxy.npcs[s].engine_health > 10.0 {
        galaxy.players[slot].say(
            "COMPUTER",
            "Cannot dismantle active vessel. Disable engines first (use bor).",
        );
        return;
    }

    let yield_units = galaxy.npcs[s].energy / 100;
    let species = galaxy.npcs[s].faction;
    galaxy.npcs[s].active = false;

    let player = &mut galaxy.players[slot];
    player.fx.dismantle = FxDismantle {
        pos,
        species,
        active: true,
    };
    player.inventory[resource::TRITANIUM] += yield_units;
    player.inventory[resource::ISOLINEAR] += yield_units / 5;
    player.say("ENGINEERING", "Vessel dismantled. Resources recovered.");
}

fn handle_min(galaxy: &mut Galaxy, _index: &SpatialIndex, slot: usize, _params: &str) {
    let here = galaxy.players[slot].quadrant;
    let sector = galaxy.players[slot].sector;
    let found = galaxy
        .planets
        .iter_mut()
        .find(|p| p.active && p.quadrant == here && (p.pos - sector).length() < DIST_INTERACTION_MAX);

    match found {
        Some(planet) => {
            let extracted = planet.amount.min(100);
            planet.amount -= extracted;
            let kind = planet.resource_type as usize;
            let player = &mut galaxy.players[slot];
            if kind < player.inventory.len() {
                player.inventory[kind] += extracted;
            }
            player.say("GEOLOGY", "Mining successful.");
        }
        None => galaxy.players[slot].say("COMPUTER", "No planet in range."),
    }
}

fn handle_sco(galaxy: &mut Galaxy, _index: &SpatialIndex, slot: usize, _params: &str) {
    let here = galaxy.players[slot].quadrant;
    let sector = galaxy.players[slot].sector;
    let near = galaxy
        .stars
        .iter()
        .any(|s| s.active && s.quadrant == here && (s.pos - sector).length() < DIST_INTERACTION_MAX);

    if !near {
        galaxy.players[slot].say("COMPUTER", "No star in range.");
        return;
    }
    let facing = galaxy.rng.gen_range(0..6);
    let player = &mut galaxy.players[slot];
    player.cargo_energy = (player.cargo_energy + 5000).min(MAX_CARGO_ENERGY);
    player.shields[facing] = (player.shields[facing] - 500).max(0);
    player.say("ENGINEERING", "Solar energy stored.");
}

fn handle_har(galaxy: &mut Galaxy, _index: &SpatialIndex, slot: usize, _params: &str) {
    let here = galaxy.players[slot].quadrant;
    let sector = galaxy.players[slot].sector;
    let near = galaxy
        .black_holes
        .iter()
        .any(|h| h.active && h.quadrant == here && (h.pos - sector).length() < DIST_INTERACTION_MAX);

    if !near {
        galaxy.players[slot].say("COMPUTER", "No black hole in range.");
        return;
    }
    let facing = galaxy.rng.gen_range(0..6);
    let player = &mut galaxy.players[slot];
    player.cargo_energy = (player.cargo_energy + 10_000).min(MAX_CARGO_ENERGY);
    player.inventory[resource::DILITHIUM] += 100;
    player.shields[facing] = (player.shields[facing] - 1000).max(0);
    player.say("ENGINEERING", "Antimatter stored.");
}

fn handle_doc(galaxy: &mut Galaxy, _index: &SpatialIndex, slot: usize, _params: &str) {
    let here = galaxy.players[slot].quadrant;
    let sector = galaxy.players[slot].sector;
    let near = galaxy
        .bases
        .iter()
        .any(|b| b.active && b.quadrant == here && (b.pos - sector).length() < DIST_INTERACTION_MAX);

    if !near {
        galaxy.players[slot].say("COMPUTER", "No starbase in range.");
        return;
    }
    let player = &mut galaxy.players[slot];
    player.energy = 100_000;
    player.torpedoes = 100;
    player.system_health = [100.0; 8];
    player.say("STARBASE", "Docking complete.");
}

fn handle_con(galaxy: &mut Galaxy, _index: &SpatialIndex, slot: usize, params: &str) {
    let args = ints(params);
    let [kind, amount] = match args[..] {
        [t, a] => [t, a],
        _ => return,
    };
    let player = &mut galaxy.players[slot];
    let kind = kind as usize;
    if !(1..=6).contains(&kind) || amount < 0 || player.inventory[kind] < amount {
        return;
    }

    player.inventory[kind] -= amount;
    match kind {
        resource::DILITHIUM => player.cargo_energy += amount * 10,
        resource::TRITANIUM => player.cargo_energy += amount * 2,
        resource::VERTERIUM => player.cargo_torpedoes += amount / 20,
        resource::GASES => player.cargo_energy += amount * 5,
        _ => {}
    }
    player.cargo_energy = player.cargo_energy.min(MAX_CARGO_ENERGY);
    player.cargo_torpedoes = player.cargo_torpedoes.min(MAX_CARGO_TORPEDOES);
    player.say("ENGINEERING", "Assets stored in Cargo Bay.");
}

fn handle_load(galaxy: &mut Galaxy, _index: &SpatialIndex, slot: usize, params: &str) {
    let args = ints(params);
    let [kind, amount] = match args[..] {
        [t, a] => [t, a],
        _ => return,
    };
    if amount < 0 {
        return;
    }
    let player = &mut galaxy.players[slot];
    match kind {
        1 => {
            let amount = amount.min(player.cargo_energy);
            player.cargo_energy -= amount;
            player.energy = (player.energy + amount).min(MAX_CARGO_ENERGY);
            player.say("ENGINEERING", "Energy loaded.");
        }
        2 => {
            let amount = amount.min(player.cargo_torpedoes);
            player.cargo_torpedoes -= amount;
            player.torpedoes = (player.torpedoes + amount).min(MAX_CARGO_TORPEDOES);
            player.say("TACTICAL", "Torps loaded.");
        }
        _ => {}
    }
}

fn handle_rep(galaxy: &mut Galaxy, _index: &SpatialIndex, slot: usize, params: &str) {
    let Some(&sid) = ints(params).first() else {
        return;
    };
    if !(0..8).contains(&sid) {
        return;
    }
    let player = &mut galaxy.players[slot];
    // Structural systems take Monotanium, electronics take Isolinear chips.
    let structural = matches!(sid, 0 | 1 | 5 | 7);
    let affordable = if structural {
        if player.inventory[resource::MONOTANIUM] >= 50 {
            player.inventory[resource::MONOTANIUM] -= 50;
            true
        } else {
            false
        }
    } else if player.inventory[resource::ISOLINEAR] >= 30 {
        player.inventory[resource::ISOLINEAR] -= 30;
        true
    } else {
        false
    };

    if affordable {
        player.system_health[sid as usize] = 100.0;
        player.say("ENGINEERING", "Repairs complete.");
    } else {
        player.say("ENGINEERING", "Insufficient materials.");
    }
}

fn handle_jum(galaxy: &mut Galaxy, _index: &SpatialIndex, slot: usize, params: &str) {
    let args = ints(params);
    let [q1, q2, q3] = match args[..] {
        [a, b, c] => [a, b, c],
        _ => {
            galaxy.players[slot].say("COMPUTER", "Usage: jum <Q1> <Q2> <Q3>");
            return;
        }
    };
    let destination = Quadrant::new(q1, q2, q3);
    if !destination.is_valid() {
        galaxy.players[slot].say("COMPUTER", "Coordinates outside charted space.");
        return;
    }

    let player = &mut galaxy.players[slot];
    if player.energy < 5000 {
        player.say("COMPUTER", "Insufficient energy to open a wormhole.");
        return;
    }
    if player.inventory[resource::DILITHIUM] < 1 {
        player.say("ENGINEERING", "Wormhole drive requires Dilithium.");
        return;
    }

    player.energy -= 5000;
    player.inventory[resource::DILITHIUM] -= 1;
    player.target_abs = destination.center();
    // The mouth opens two units ahead of the bow.
    let mouth = player.sector + geom::dir_from_angles(player.heading, player.mark) * 2.0;
    player.wormhole_mouth = mouth.clamp(DVec3::ZERO, DVec3::splat(10.0));
    player.nav_state = NavState::Wormhole;
    player.nav_timer = TIMER_WORMHOLE_SEQ;
    player.warp_speed = 0.0;
    player.say("SCIENCE", "Charting Einstein-Rosen geodesic. Hold position.");
}

fn handle_psy(galaxy: &mut Galaxy, index: &SpatialIndex, slot: usize, _params: &str) {
    if galaxy.players[slot].corbomite_count <= 0 {
        galaxy.players[slot].say("COMPUTER", "No Corbomite devices available in inventory.");
        return;
    }
    galaxy.players[slot].say("COMMANDER", "Broadcasting Corbomite threat on all frequencies...");

    let here = galaxy.players[slot].quadrant;
    let bluffed = galaxy.rng.gen_range(0..100) < 60;
    if bluffed {
        let cell = index.cell(here);
        for n in cell.npcs.iter() {
            let npc = &mut galaxy.npcs[n];
            npc.ai_state = crate::entity::AiState::Flee;
            npc.energy += 5000;
        }
        galaxy.players[slot].say(
            "SCIENCE",
            "Bluff successful. Hostile vessels are breaking formation!",
        );
    } else {
        galaxy.players[slot].say(
            "TACTICAL",
            "The enemy is ignoring our broadcast. Bluff failed.",
        );
    }
    galaxy.players[slot].corbomite_count -= 1;
}

fn handle_enc(galaxy: &mut Galaxy, _index: &SpatialIndex, slot: usize, params: &str) {
    let player = &mut galaxy.players[slot];
    match CipherAlgo::from_name(params) {
        Some(algo) if algo.is_supported() => {
            player.crypto_algo = algo;
            let note = if algo == CipherAlgo::None {
                "Subspace encryption disabled.".to_string()
            } else {
                format!("Subspace encryption active: {}.", algo.name())
            };
            player.say("COMMS", note);
        }
        Some(algo) => player.say(
            "COMMS",
            format!("Cipher {} not provisioned on this relay.", algo.name()),
        ),
        None => player.say("COMPUTER", "Unknown cipher. Try: aes, chacha, pqc, off."),
    }
}

fn handle_sta(galaxy: &mut Galaxy, _index: &SpatialIndex, slot: usize, _params: &str) {
    let player = &galaxy.players[slot];
    let q = player.quadrant;
    let s = player.sector;
    let mut b = String::from("\n.--- LCARS MAIN COMPUTER: SHIP DIAGNOSTICS -----------------------.\n");
    b.push_str(&format!(
        " COMMANDER: {:<18} CLASS: {:<15}\n FACTION:   {:<18} STATUS: {}\n",
        player.name,
        ShipClass::name(player.ship_class),
        species_name(player.faction),
        if player.cloaked { "[ CLOAKED ]" } else { "[ ACTIVE ]" }
    ));
    b.push_str("\n[ POSITION AND TELEMETRY ]\n");
    b.push_str(&format!(
        " QUADRANT: [{},{},{}]  SECTOR: [{:.2}, {:.2}, {:.2}]\n",
        q.q1, q.q2, q.q3, s.x, s.y, s.z
    ));
    b.push_str(&format!(
        " HEADING:  {:03.0}        MARK:   {:+03.0}\n",
        player.heading, player.mark
    ));
    b.push_str(&format!(
        " NAV MODE: {}\n",
        if player.nav_state == NavState::Chase {
            "[ CHASE ACTIVE ]"
        } else {
            "[ NORMAL ]"
        }
    ));
    b.push_str("\n[ POWER AND REACTOR STATUS ]\n");
    let en_pct = player.energy as f32 / 100_000.0 * 100.0;
    let fills = (en_pct / 5.0) as usize;
    let bar: String = (0..20).map(|j| if j < fills { '|' } else { '-' }).collect();
    b.push_str(&format!(
        " MAIN REACTOR: [{}] {} / 100000 ({:.1}%)\n ALLOCATION:   ENGINES: {:.0}%  SHIELDS: {:.0}%  WEAPONS: {:.0}%\n",
        bar,
        player.energy,
        en_pct,
        player.power_dist[0] * 100.0,
        player.power_dist[1] * 100.0,
        player.power_dist[2] * 100.0
    ));
    b.push_str("[ CARGO BAY - LOGISTICS ]\n");
    b.push_str(&format!(
        " STORED ENERGY: {:<6}  STORED TORPS: {:<3}\n",
        player.cargo_energy, player.cargo_torpedoes
    ));
    b.push_str("[ STORED MINERALS & RESOURCES ]\n");
    b.push_str(&format!(
        " DILITHIUM:  {:<5}  TRITANIUM:  {:<5}  VERTERIUM: {:<5}\n",
        player.inventory[resource::DILITHIUM],
        player.inventory[resource::TRITANIUM],
        player.inventory[resource::VERTERIUM]
    ));
    b.push_str(&format!(
        " MONOTANIUM: {:<5}  ISOLINEAR:  {:<5}  GASES:     {:<5}\n",
        player.inventory[resource::MONOTANIUM],
        player.inventory[resource::ISOLINEAR],
        player.inventory[resource::GASES]
    ));
    b.push_str("\n[ DEFENSIVE GRID AND ARMAMENTS ]\n");
    b.push_str(&format!(
        " SHIELDS: F:{:<4} R:{:<4} T:{:<4} B:{:<4} L:{:<4} RI:{:<4}\n PHOTON TORPEDOES: {:<2}  LOCK: {}\n",
        player.shields[0],
        player.shields[1],
        player.shields[2],
        player.shields[3],
        player.shields[4],
        player.shields[5],
        player.torpedoes,
        if player.lock_target > 0 { "[ LOCKED ]" } else { "[ NONE ]" }
    ));
    b.push_str("\n[ SYSTEMS INTEGRITY ]\n");
    for (idx, name) in system::NAMES.iter().enumerate() {
        b.push_str(&format!(" {:<8}: {:5.1}% ", name, player.system_health[idx]));
        if idx == 3 {
            b.push('\n');
        }
    }
    b.push_str("\n'-----------------------------------------------------------------'\n");
    galaxy.players[slot].say("COMPUTER", b);
}

fn handle_inv(galaxy: &mut Galaxy, _index: &SpatialIndex, slot: usize, _params: &str) {
    let player = &galaxy.players[slot];
    let mut b = String::from("\n--- CARGO MANIFEST ---\n");
    for j in 1..=6 {
        b.push_str(&format!(" {:<12}: {:<4}\n", resource::NAMES[j], player.inventory[j]));
    }
    b.push_str(&format!(
        " Stored Energy: {}\n Stored Torps:  {}\n",
        player.cargo_energy, player.cargo_torpedoes
    ));
    galaxy.players[slot].say("LOGISTICS", b);
}

fn handle_dam(galaxy: &mut Galaxy, _index: &SpatialIndex, slot: usize, _params: &str) {
    let player = &galaxy.players[slot];
    let mut b = String::from("\n--- DAMAGE REPORT ---\n");
    for (idx, name) in system::NAMES.iter().enumerate() {
        b.push_str(&format!(" {:<10}: {:.1}%\n", name, player.system_health[idx]));
    }
    galaxy.players[slot].say("ENGINEERING", b);
}

fn handle_cal(galaxy: &mut Galaxy, _index: &SpatialIndex, slot: usize, params: &str) {
    let args = ints(params);
    let [qx, qy, qz] = match args[..] {
        [a, b, c] => [a, b, c],
        _ => return,
    };
    let player = &galaxy.players[slot];
    let delta = DVec3::new(
        (qx - player.quadrant.q1) as f64 * 10.0,
        (qy - player.quadrant.q2) as f64 * 10.0,
        (qz - player.quadrant.q3) as f64 * 10.0,
    );
    let d = delta.length();
    let note = if d < 0.001 {
        format!("Navigation: Ship is already at Q[{qx},{qy},{qz}].")
    } else {
        let (h, m) = geom::angles_to(delta, d);
        format!(
            "Course to Q[{},{},{}]: H:{:.1} M:{:.1} W:{:.2}",
            qx,
            qy,
            qz,
            h,
            m,
            d / 10.0
        )
    };
    galaxy.players[slot].say("COMPUTER", note);
}

fn handle_who(galaxy: &mut Galaxy, _index: &SpatialIndex, slot: usize, _params: &str) {
    let mut b = String::from("\n--- ACTIVE CAPTAINS IN GALAXY ---\n");
    for (j, p) in galaxy.players.iter().enumerate() {
        if !p.active {
            continue;
        }
        b.push_str(&format!(
            " ID:{:<2}  {:<16}  LOC:[{},{},{}]  STATUS:{}\n",
            id::player_id(j),
            p.name,
            p.quadrant.q1,
            p.quadrant.q2,
            p.quadrant.q3,
            if p.cloaked { "CLOAKED" } else { "ONLINE" }
        ));
    }
    galaxy.players[slot].say("COMPUTER", b);
}

fn handle_aux(galaxy: &mut Galaxy, _index: &SpatialIndex, slot: usize, params: &str) {
    if let Some(rest) = params.strip_prefix("probe ") {
        let args = ints(rest);
        if let [qx, qy, qz] = args[..] {
            let q = Quadrant::new(qx, qy, qz);
            if q.is_valid() {
                let v = galaxy.master.census(q);
                let note = format!(
                    "Probe Q[{},{},{}]: {:05} (BH:{} P:{} E:{} B:{} S:{})",
                    qx,
                    qy,
                    qz,
                    v.rem_euclid(100_000),
                    census::black_hole_digit(v),
                    census::planet_digit(v),
                    census::ship_digit(v),
                    census::base_digit(v),
                    census::star_digit(v)
                );
                galaxy.players[slot].say("SCIENCE", note);
            }
        }
    } else if params.starts_with("computer") {
        let k9 = galaxy.master.k9;
        let b9 = galaxy.master.b9;
        let note = format!(
            "\n--- STRATEGIC ANALYSIS ---\nHostiles: {}\nBases: {}\nStability: {:.1}%",
            k9,
            b9,
            (1.0 - k9 as f32 / 200.0) * 100.0
        );
        galaxy.players[slot].say("COMPUTER", note);
    } else if params.starts_with("jettison") {
        let player = &mut galaxy.players[slot];
        player.say("ENGINEERING", "CORE JETTISONED!");
        player.fx.boom = FxPoint::at(player.sector);
        player.active = false;
    }
}

fn handle_xxx(galaxy: &mut Galaxy, _index: &SpatialIndex, slot: usize, _params: &str) {
    let player = &mut galaxy.players[slot];
    player.say("CRITICAL", "SELF-DESTRUCT INITIATED. GODSPEED, CAPTAIN.");
    player.active = false;
    player.fx.boom = FxPoint::at(player.sector);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::player::Player;
    use crate::entity::{Base, NpcShip, Planet, Star};
    use crate::sim::World;

    fn world_with_player() -> World {
        let q = Quadrant::new(5, 5, 5);
        let mut galaxy = Galaxy::empty();
        let mut p = Player::default();
        p.provision("Kirk", 0, 0, q);
        p.active = true;
        galaxy.players[0] = p;
        World::new(galaxy)
    }

    fn last_note(world: &World, slot: usize) -> String {
        world.galaxy.players[slot]
            .outbox
            .last()
            .map(|n| n.text.clone())
            .unwrap_or_default()
    }

    #[test]
    fn unknown_command_is_an_error_reply() {
        let mut world = world_with_player();
        dispatch(&mut world.galaxy, &world.index, 0, "warp 9 engage");
        assert!(last_note(&world, 0).contains("Invalid command"));
    }

    #[test]
    fn nav_plots_an_align_course() {
        let mut world = world_with_player();
        dispatch(&mut world.galaxy, &world.index, 0, "nav 0 0 1");
        let p = &world.galaxy.players[0];
        assert_eq!(p.nav_state, NavState::Align);
        assert_eq!(p.nav_timer, TIMER_ALIGN);
        // Target is 10 units along -y from the start.
        assert!((p.target_abs - (p.abs + DVec3::new(0.0, -10.0, 0.0))).length() < 1e-9);
    }

    #[test]
    fn nav_normalizes_overturned_mark() {
        let mut world = world_with_player();
        dispatch(&mut world.galaxy, &world.index, 0, "nav 10 120 1");
        let p = &world.galaxy.players[0];
        assert!((p.target_m - 60.0).abs() < 1e-9);
        assert!((p.target_h - 190.0).abs() < 1e-9);
    }

    #[test]
    fn imp_zero_stops_the_ship() {
        let mut world = world_with_player();
        world.galaxy.players[0].warp_speed = 0.4;
        dispatch(&mut world.galaxy, &world.index, 0, "imp 0");
        let p = &world.galaxy.players[0];
        assert_eq!(p.warp_speed, 0.0);
        assert_eq!(p.nav_state, NavState::Realign);
    }

    #[test]
    fn imp_single_speed_keeps_attitude() {
        let mut world = world_with_player();
        world.galaxy.players[0].heading = 45.0;
        dispatch(&mut world.galaxy, &world.index, 0, "imp 0.8");
        let p = &world.galaxy.players[0];
        assert_eq!(p.nav_state, NavState::AlignImpulse);
        assert!((p.target_h - 45.0).abs() < 1e-9);
        assert!((p.warp_speed - 0.4).abs() < 1e-12);
    }

    #[test]
    fn lock_requires_live_target() {
        let mut world = world_with_player();
        dispatch(&mut world.galaxy, &world.index, 0, "lock 1005");
        assert_eq!(world.galaxy.players[0].lock_target, 0);

        let q = world.galaxy.players[0].quadrant;
        world.galaxy.npcs[5] = NpcShip {
            id: 5,
            quadrant: q,
            pos: DVec3::new(3.0, 3.0, 3.0),
            abs: q.origin() + DVec3::new(3.0, 3.0, 3.0),
            energy: 10_000,
            active: true,
            ..NpcShip::default()
        };
        world.rebuild_index();
        dispatch(&mut world.galaxy, &world.index, 0, "lock 1005");
        assert_eq!(world.galaxy.players[0].lock_target, 1005);

        dispatch(&mut world.galaxy, &world.index, 0, "lock 0");
        assert_eq!(world.galaxy.players[0].lock_target, 0);
    }

    #[test]
    fn pha_rejects_insufficient_energy() {
        let mut world = world_with_player();
        world.galaxy.players[0].energy = 100;
        dispatch(&mut world.galaxy, &world.index, 0, "pha 5000");
        assert!(last_note(&world, 0).contains("Insufficient energy"));
        assert_eq!(world.galaxy.players[0].energy, 100);
    }

    #[test]
    fn pha_rejects_dead_banks() {
        let mut world = world_with_player();
        world.galaxy.players[0].system_health[system::PHASERS] = 5.0;
        dispatch(&mut world.galaxy, &world.index, 0, "pha 100");
        assert!(last_note(&world, 0).contains("inoperative"));
    }

    #[test]
    fn tor_without_lock_needs_angles() {
        let mut world = world_with_player();
        dispatch(&mut world.galaxy, &world.index, 0, "tor");
        assert!(!world.galaxy.players[0].torpedo.active);

        dispatch(&mut world.galaxy, &world.index, 0, "tor 90 0");
        let p = &world.galaxy.players[0];
        assert!(p.torpedo.active);
        assert_eq!(p.torpedo.target, 0);
        assert_eq!(p.torpedoes, MAX_TORPEDO_CAPACITY - 1);
        assert_eq!(p.torpedo.load_timer, TIMER_TORP_LOAD);
    }

    #[test]
    fn tor_with_lock_is_guided() {
        let mut world = world_with_player();
        let q = world.galaxy.players[0].quadrant;
        world.galaxy.npcs[3] = NpcShip {
            id: 3,
            quadrant: q,
            pos: DVec3::new(7.0, 5.0, 5.0),
            abs: q.origin() + DVec3::new(7.0, 5.0, 5.0),
            energy: 10_000,
            active: true,
            ..NpcShip::default()
        };
        world.rebuild_index();
        world.galaxy.players[0].lock_target = id::npc_id(3);

        dispatch(&mut world.galaxy, &world.index, 0, "tor");
        let p = &world.galaxy.players[0];
        assert!(p.torpedo.active);
        assert_eq!(p.torpedo.target, id::npc_id(3));
        // Aimed along +x toward the target.
        assert!((p.torpedo.dir - DVec3::new(1.0, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn tor_respects_reload() {
        let mut world = world_with_player();
        dispatch(&mut world.galaxy, &world.index, 0, "tor 0 0");
        world.galaxy.players[0].torpedo.active = false; // spent in flight
        dispatch(&mut world.galaxy, &world.index, 0, "tor 0 0");
        assert!(!world.galaxy.players[0].torpedo.active);
        assert!(last_note(&world, 0).contains("loading"));
    }

    #[test]
    fn she_overwrites_and_clamps() {
        let mut world = world_with_player();
        dispatch(&mut world.galaxy, &world.index, 0, "she 100 200 300 400 99999 -5");
        assert_eq!(
            world.galaxy.players[0].shields,
            [100, 200, 300, 400, SHIELD_MAX_STRENGTH, 0]
        );
    }

    #[test]
    fn clo_toggles() {
        let mut world = world_with_player();
        dispatch(&mut world.galaxy, &world.index, 0, "clo");
        assert!(world.galaxy.players[0].cloaked);
        dispatch(&mut world.galaxy, &world.index, 0, "clo");
        assert!(!world.galaxy.players[0].cloaked);
    }

    #[test]
    fn dis_requires_disabled_engines() {
        let mut world = world_with_player();
        let q = world.galaxy.players[0].quadrant;
        world.galaxy.npcs[1] = NpcShip {
            id: 1,
            quadrant: q,
            pos: world.galaxy.players[0].sector + DVec3::new(1.0, 0.0, 0.0),
            abs: q.origin() + world.galaxy.players[0].sector + DVec3::new(1.0, 0.0, 0.0),
            energy: 10_000,
            engine_health: 100.0,
            active: true,
            ..NpcShip::default()
        };
        world.rebuild_index();
        world.galaxy.players[0].lock_target = id::npc_id(1);

        dispatch(&mut world.galaxy, &world.index, 0, "dis");
        assert!(world.galaxy.npcs[1].active);
        assert!(last_note(&world, 0).contains("Disable engines"));

        world.galaxy.npcs[1].engine_health = 5.0;
        dispatch(&mut world.galaxy, &world.index, 0, "dis");
        assert!(!world.galaxy.npcs[1].active);
        let p = &world.galaxy.players[0];
        assert_eq!(p.inventory[resource::TRITANIUM], 100);
        assert_eq!(p.inventory[resource::ISOLINEAR], 20);
        assert!(p.fx.dismantle.active);
    }

    #[test]
    fn min_extracts_planet_resources() {
        let mut world = world_with_player();
        let q = world.galaxy.players[0].quadrant;
        world.galaxy.planets[0] = Planet {
            quadrant: q,
            pos: world.galaxy.players[0].sector + DVec3::new(1.5, 0.0, 0.0),
            resource_type: resource::TRITANIUM as i32,
            amount: 150,
            active: true,
            ..Planet::default()
        };
        world.rebuild_index();

        dispatch(&mut world.galaxy, &world.index, 0, "min");
        assert_eq!(world.galaxy.players[0].inventory[resource::TRITANIUM], 100);
        assert_eq!(world.galaxy.planets[0].amount, 50);

        dispatch(&mut world.galaxy, &world.index, 0, "min");
        assert_eq!(world.galaxy.players[0].inventory[resource::TRITANIUM], 150);
        assert_eq!(world.galaxy.planets[0].amount, 0);
    }

    #[test]
    fn doc_refits_at_starbase() {
        let mut world = world_with_player();
        let q = world.galaxy.players[0].quadrant;
        world.galaxy.bases[0] = Base {
            quadrant: q,
            pos: world.galaxy.players[0].sector + DVec3::new(1.0, 1.0, 0.0),
            health: 5000,
            active: true,
            ..Base::default()
        };
        world.galaxy.players[0].energy = 5;
        world.galaxy.players[0].system_health = [10.0; 8];

        dispatch(&mut world.galaxy, &world.index, 0, "doc");
        let p = &world.galaxy.players[0];
        assert_eq!(p.energy, 100_000);
        assert_eq!(p.torpedoes, 100);
        assert!(p.system_health.iter().all(|&h| h == 100.0));
    }

    #[test]
    fn sco_needs_a_star() {
        let mut world = world_with_player();
        dispatch(&mut world.galaxy, &world.index, 0, "sco");
        assert!(last_note(&world, 0).contains("No star"));

        let q = world.galaxy.players[0].quadrant;
        world.galaxy.stars[0] = Star {
            quadrant: q,
            pos: world.galaxy.players[0].sector + DVec3::new(1.2, 0.0, 0.0),
            active: true,
            ..Star::default()
        };
        world.galaxy.players[0].shields = [6000; 6];
        dispatch(&mut world.galaxy, &world.index, 0, "sco");
        assert_eq!(world.galaxy.players[0].cargo_energy, 5000);
        assert_eq!(
            world.galaxy.players[0].shields.iter().sum::<i32>(),
            6 * 6000 - 500
        );
    }

    #[test]
    fn con_converts_dilithium() {
        let mut world = world_with_player();
        world.galaxy.players[0].inventory[resource::DILITHIUM] = 50;
        dispatch(&mut world.galaxy, &world.index, 0, "con 1 20");
        let p = &world.galaxy.players[0];
        assert_eq!(p.inventory[resource::DILITHIUM], 30);
        assert_eq!(p.cargo_energy, 200);
    }

    #[test]
    fn load_moves_cargo_to_ship() {
        let mut world = world_with_player();
        world.galaxy.players[0].cargo_energy = 500;
        world.galaxy.players[0].energy = 0;
        dispatch(&mut world.galaxy, &world.index, 0, "load 1 9999");
        let p = &world.galaxy.players[0];
        assert_eq!(p.cargo_energy, 0);
        assert_eq!(p.energy, 500);
    }

    #[test]
    fn rep_spends_materials() {
        let mut world = world_with_player();
        world.galaxy.players[0].system_health[system::WARP] = 20.0;
        dispatch(&mut world.galaxy, &world.index, 0, "rep 0");
        assert!(last_note(&world, 0).contains("Insufficient"));

        world.galaxy.players[0].inventory[resource::MONOTANIUM] = 60;
        dispatch(&mut world.galaxy, &world.index, 0, "rep 0");
        let p = &world.galaxy.players[0];
        assert_eq!(p.system_health[system::WARP], 100.0);
        assert_eq!(p.inventory[resource::MONOTANIUM], 10);
    }

    #[test]
    fn jum_opens_a_wormhole() {
        let mut world = world_with_player();
        world.galaxy.players[0].energy = 10_000;
        dispatch(&mut world.galaxy, &world.index, 0, "jum 9 2 7");
        let p = &world.galaxy.players[0];
        assert_eq!(p.nav_state, NavState::Wormhole);
        assert_eq!(p.nav_timer, TIMER_WORMHOLE_SEQ);
        assert_eq!(p.energy, 5000);
        assert_eq!(p.inventory[resource::DILITHIUM], 9);
        assert!((p.target_abs - Quadrant::new(9, 2, 7).center()).length() < 1e-9);
    }

    #[test]
    fn jum_requires_dilithium() {
        let mut world = world_with_player();
        world.galaxy.players[0].energy = 10_000;
        world.galaxy.players[0].inventory[resource::DILITHIUM] = 0;
        dispatch(&mut world.galaxy, &world.index, 0, "jum 1 1 1");
        assert_eq!(world.galaxy.players[0].nav_state, NavState::Idle);
        assert!(last_note(&world, 0).contains("Dilithium"));
    }

    #[test]
    fn psy_consumes_corbomite() {
        let mut world = world_with_player();
        dispatch(&mut world.galaxy, &world.index, 0, "psy");
        assert!(last_note(&world, 0).contains("No Corbomite"));

        world.galaxy.players[0].corbomite_count = 2;
        dispatch(&mut world.galaxy, &world.index, 0, "psy");
        assert_eq!(world.galaxy.players[0].corbomite_count, 1);
    }

    #[test]
    fn enc_selects_supported_cipher() {
        let mut world = world_with_player();
        dispatch(&mut world.galaxy, &world.index, 0, "enc chacha");
        assert_eq!(
            world.galaxy.players[0].crypto_algo,
            CipherAlgo::ChaCha20Poly1305
        );

        dispatch(&mut world.galaxy, &world.index, 0, "enc rc4");
        assert_eq!(
            world.galaxy.players[0].crypto_algo,
            CipherAlgo::ChaCha20Poly1305
        );
        assert!(last_note(&world, 0).contains("not provisioned"));

        dispatch(&mut world.galaxy, &world.index, 0, "enc off");
        assert_eq!(world.galaxy.players[0].crypto_algo, CipherAlgo::None);
    }

    #[test]
    fn xxx_scuttles_the_ship() {
        let mut world = world_with_player();
        dispatch(&mut world.galaxy, &world.index, 0, "xxx");
        let p = &world.galaxy.players[0];
        assert!(!p.active);
        assert!(p.fx.boom.active);
    }

    #[test]
    fn diagnostics_produce_reports() {
        let mut world = world_with_player();
        for cmd in ["srs", "sta", "inv", "dam", "who", "cal 9 9 9", "aux computer"] {
            dispatch(&mut world.galaxy, &world.index, 0, cmd);
        }
        let texts: Vec<String> = world.galaxy.players[0]
            .outbox
            .iter()
            .map(|n| n.text.clone())
            .collect();
        assert!(texts.iter().any(|t| t.contains("SHORT RANGE SENSOR")));
        assert!(texts.iter().any(|t| t.contains("SHIP DIAGNOSTICS")));
        assert!(texts.iter().any(|t| t.contains("CARGO MANIFEST")));
        assert!(texts.iter().any(|t| t.contains("DAMAGE REPORT")));
        assert!(texts.iter().any(|t| t.contains("ACTIVE CAPTAINS")));
        assert!(texts.iter().any(|t| t.contains("Course to Q[9,9,9]")));
        assert!(texts.iter().any(|t| t.contains("STRATEGIC ANALYSIS")));
    }

    #[test]
    fn apr_plots_an_approach() {
        let mut world = world_with_player();
        let q = world.galaxy.players[0].quadrant;
        world.galaxy.bases[0] = Base {
            id: 0,
            quadrant: q,
            pos: DVec3::new(8.0, 5.0, 5.0),
            health: 5000,
            active: true,
            ..Base::default()
        };
        world.rebuild_index();

        dispatch(&mut world.galaxy, &world.index, 0, "apr 2000 1.0");
        let p = &world.galaxy.players[0];
        assert_eq!(p.nav_state, NavState::Align);
        // Stops one unit short of the base along +x.
        assert!((p.target_abs - (q.origin() + DVec3::new(7.0, 5.0, 5.0))).length() < 1e-9);
    }
}
