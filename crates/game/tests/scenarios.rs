//! End-to-end simulation scenarios driven through the command dispatcher
//! and the tick loop, without sockets.

use glam::DVec3;

use trek::commands;
use trek::config::*;
use trek::entity::id;
use trek::entity::player::{resource, NavState, Player};
use trek::entity::{Mine, NpcShip, Star};
use trek::galaxy::{census, persist};
use trek::{Galaxy, Quadrant, World};

fn empty_world_with(players: &[(&str, Quadrant, DVec3)]) -> World {
    let mut galaxy = Galaxy::empty();
    for (slot, (name, q, sector)) in players.iter().enumerate() {
        let mut p = Player::default();
        p.provision(name, 0, 0, *q);
        p.place_at(*q, *sector);
        p.active = true;
        p.connected = true;
        galaxy.players[slot] = p;
    }
    World::new(galaxy)
}

#[test]
fn nav_plot_then_warp_then_realign() {
    let q = Quadrant::new(5, 5, 5);
    let mut world = empty_world_with(&[("Kirk", q, DVec3::splat(5.0))]);
    world.galaxy.players[0].energy = 1_000_000;

    {
        let World { galaxy, index } = &mut world;
        commands::dispatch(galaxy, index, 0, "nav 0 0 1");
    }
    assert_eq!(world.galaxy.players[0].nav_state, NavState::Align);

    // Sixty ticks of alignment.
    for _ in 0..TIMER_ALIGN {
        assert_eq!(world.galaxy.players[0].nav_state, NavState::Align);
        world.advance_tick();
    }
    let warp_timer = world.galaxy.players[0].nav_timer;
    assert_eq!(world.galaxy.players[0].nav_state, NavState::Warp);
    assert!(warp_timer >= 30);

    // Position advances monotonically along the plotted -y direction.
    let mut last_y = world.galaxy.players[0].abs.y;
    for _ in 0..warp_timer {
        world.advance_tick();
        let y = world.galaxy.players[0].abs.y;
        assert!(y <= last_y + 1e-12);
        last_y = y;
    }
    assert_eq!(world.galaxy.players[0].nav_state, NavState::Realign);

    for _ in 0..TIMER_ALIGN {
        world.advance_tick();
    }
    let p = &world.galaxy.players[0];
    assert_eq!(p.nav_state, NavState::Idle);
    assert_eq!(p.mark, 0.0);
}

#[test]
fn phaser_kill_produces_boom() {
    let q = Quadrant::new(5, 5, 5);
    let mut world = empty_world_with(&[
        ("A", q, DVec3::new(5.0, 5.0, 5.0)),
        ("B", q, DVec3::new(6.0, 5.0, 5.0)),
    ]);
    world.galaxy.players[1].shields = [0; 6];
    world.galaxy.players[1].energy = 100;
    world.galaxy.players[1].faction = 10;
    world.rebuild_index();

    {
        let World { galaxy, index } = &mut world;
        commands::dispatch(galaxy, index, 0, "lock 2");
        assert_eq!(galaxy.players[0].lock_target, 2);
        commands::dispatch(galaxy, index, 0, "pha 1000");
    }

    let victim = &world.galaxy.players[1];
    assert!(!victim.active);
    assert!(victim.fx.boom.active);
    let note = world.galaxy.players[0]
        .outbox
        .iter()
        .find(|n| n.text.contains("Damage:"))
        .expect("hit report");
    let reported: i32 = note
        .text
        .rsplit(' ')
        .next()
        .and_then(|v| v.parse().ok())
        .unwrap();
    assert!(reported >= 1);
}

#[test]
fn supernova_annihilates_and_leaves_black_hole() {
    let q = Quadrant::new(5, 5, 5);
    let mut world = empty_world_with(&[("P", q, DVec3::new(2.0, 2.0, 2.0))]);
    world.galaxy.stars[42] = Star {
        id: 42,
        faction: 4,
        quadrant: q,
        pos: DVec3::new(7.0, 7.0, 7.0),
        active: true,
    };
    world.galaxy.planets[7] = trek::entity::Planet {
        id: 7,
        quadrant: q,
        pos: DVec3::new(3.0, 8.0, 3.0),
        resource_type: 1,
        amount: 1000,
        active: true,
    };
    world.galaxy.npcs[100] = NpcShip {
        id: 100,
        quadrant: q,
        pos: DVec3::new(8.0, 2.0, 8.0),
        abs: q.origin() + DVec3::new(8.0, 2.0, 8.0),
        energy: 10_000,
        engine_health: 0.0,
        active: true,
        ..NpcShip::default()
    };
    world.rebuild_index();

    world.galaxy.supernova.quadrant = q;
    world.galaxy.supernova.timer = TIMER_SUPERNOVA;
    world.galaxy.supernova.epicenter = DVec3::new(7.0, 7.0, 7.0);
    world.galaxy.supernova.star_id = 42;

    let mut checkpoint_seen = false;
    for _ in 0..TIMER_SUPERNOVA {
        let report = world.advance_tick();
        checkpoint_seen |= report.checkpoint;
    }

    assert!(!world.galaxy.stars[42].active);
    assert!(!world.galaxy.planets[7].active);
    assert!(!world.galaxy.npcs[100].active);
    assert!(!world.galaxy.players[0].active);
    assert!(checkpoint_seen);

    let remnant = world
        .galaxy
        .black_holes
        .iter()
        .find(|h| h.active && h.quadrant == q)
        .expect("black hole remnant");
    assert!((remnant.pos - DVec3::new(7.0, 7.0, 7.0)).length() < 1e-9);

    // Census settles on exactly one black hole once the index rebuilds.
    assert_eq!(census::black_hole_digit(world.galaxy.master.census(q)), 1);
    assert_eq!(census::star_digit(world.galaxy.master.census(q)), 0);
}

#[test]
fn mine_detonation_within_one_tick() {
    let q = Quadrant::new(4, 4, 4);
    let mut world = empty_world_with(&[("P", q, DVec3::new(5.0, 5.0, 5.0))]);
    world.galaxy.mines[3] = Mine {
        id: 3,
        quadrant: q,
        pos: DVec3::new(5.35, 5.0, 5.0),
        faction: 10,
        active: true,
    };
    world.galaxy.players[0].shields = [4000; 6];
    world.galaxy.players[0].energy = 500_000;
    world.rebuild_index();

    let shields_before: i32 = world.galaxy.players[0].shields.iter().sum();
    let energy_before = world.galaxy.players[0].energy;
    world.advance_tick();

    let p = &world.galaxy.players[0];
    assert!(!world.galaxy.mines[3].active);
    let shield_loss = shields_before - p.shields.iter().sum::<i32>();
    let hull_loss = energy_before - p.energy;
    assert_eq!(shield_loss + hull_loss, 25_000);
    assert!(p.fx.boom.active);
    assert!((p.fx.boom.pos - DVec3::new(5.35, 5.0, 5.0)).length() < 1e-9);
}

#[test]
fn name_persistence_round_trip() {
    let dir = std::env::temp_dir().join("trek-scenarios");
    let _ = std::fs::create_dir_all(&dir);
    let path = dir.join("persist-roundtrip.dat");

    let q = Quadrant::new(3, 7, 2);
    let sector = DVec3::new(1.1, 2.2, 3.3);
    {
        let mut galaxy = Galaxy::generate_with_seed(8);
        let slot = galaxy.free_player_slot().unwrap();
        galaxy.players[slot].provision("Kirk", 0, 5, Quadrant::new(1, 1, 1));
        galaxy.players[slot].place_at(q, sector);
        galaxy.players[slot].inventory[resource::TRITANIUM] = 777;
        galaxy.players[slot].active = true;
        persist::save(&galaxy, &path).unwrap();
    }

    let galaxy = persist::load(&path).unwrap();
    let slot = galaxy.player_slot_by_name("Kirk").expect("known captain");
    let p = &galaxy.players[slot];
    assert!(!p.active); // offline after restart
    assert_eq!(p.quadrant, q);
    assert!((p.sector - sector).length() < 1e-12);
    assert_eq!(p.inventory[resource::TRITANIUM], 777);
    assert_eq!(p.inventory[resource::DILITHIUM], 10);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn census_digits_never_exceed_nine() {
    let mut world = World::new(Galaxy::generate_with_seed(31));
    for _ in 0..10 {
        world.advance_tick();
    }
    for q1 in 1..=10 {
        for q2 in 1..=10 {
            for q3 in 1..=10 {
                let mut v = world.galaxy.master.census(Quadrant::new(q1, q2, q3));
                if v < 0 {
                    continue; // supernova countdown override
                }
                while v > 0 {
                    assert!(v % 10 <= 9);
                    v /= 10;
                }
            }
        }
    }
}

#[test]
fn chase_command_follows_locked_npc() {
    let q = Quadrant::new(6, 6, 6);
    let mut world = empty_world_with(&[("Hunter", q, DVec3::new(2.0, 5.0, 5.0))]);
    world.galaxy.npcs[12] = NpcShip {
        id: 12,
        quadrant: q,
        pos: DVec3::new(8.0, 5.0, 5.0),
        abs: q.origin() + DVec3::new(8.0, 5.0, 5.0),
        energy: 30_000,
        engine_health: 100.0,
        active: true,
        ..NpcShip::default()
    };
    world.rebuild_index();
    world.galaxy.players[0].energy = 1_000_000;
    // Keep the quarry from noticing the hunter.
    world.galaxy.players[0].cloaked = true;

    {
        let World { galaxy, index } = &mut world;
        commands::dispatch(galaxy, index, 0, "lock 1012");
        commands::dispatch(galaxy, index, 0, "cha");
    }
    assert_eq!(world.galaxy.players[0].nav_state, NavState::Chase);

    let initial = (world.galaxy.players[0].abs - world.galaxy.npcs[12].abs).length();
    for _ in 0..150 {
        world.advance_tick();
    }
    let closed = (world.galaxy.players[0].abs - world.galaxy.npcs[12].abs).length();
    assert!(closed < initial);
}

#[test]
fn torpedo_command_to_impact() {
    let q = Quadrant::new(5, 5, 5);
    let mut world = empty_world_with(&[("Shooter", q, DVec3::new(5.0, 5.0, 5.0))]);
    world.galaxy.npcs[0] = NpcShip {
        id: 0,
        quadrant: q,
        pos: DVec3::new(5.0, 8.0, 5.0),
        abs: q.origin() + DVec3::new(5.0, 8.0, 5.0),
        energy: 50_000,
        engine_health: 0.0,
        active: true,
        ..NpcShip::default()
    };
    world.rebuild_index();
    world.galaxy.players[0].cloaked = true;

    {
        let World { galaxy, index } = &mut world;
        commands::dispatch(galaxy, index, 0, "lock 1000");
        commands::dispatch(galaxy, index, 0, "tor");
    }
    assert!(world.galaxy.players[0].torpedo.active);
    assert_eq!(world.galaxy.players[0].torpedoes, MAX_TORPEDO_CAPACITY - 1);

    for _ in 0..TIMER_TORP_TIMEOUT {
        world.advance_tick();
        if !world.galaxy.players[0].torpedo.active {
            break;
        }
    }
    assert!(!world.galaxy.players[0].torpedo.active);
    assert!(!world.galaxy.npcs[0].active);
}

#[test]
fn rift_relocates_into_valid_space() {
    let q = Quadrant::new(2, 2, 2);
    let mut world = empty_world_with(&[("P", q, DVec3::new(5.0, 5.0, 5.0))]);
    world.galaxy.rifts[0] = trek::entity::Rift {
        id: 0,
        quadrant: q,
        pos: DVec3::new(5.1, 5.0, 5.0),
        active: true,
    };
    world.rebuild_index();

    world.advance_tick();
    let p = &world.galaxy.players[0];
    assert!(p.quadrant.is_valid());
    assert_eq!(Quadrant::from_abs(p.abs), p.quadrant);
    assert_eq!(p.nav_state, NavState::Idle);
}

#[test]
fn lock_set_in_tick_references_live_entity() {
    let q = Quadrant::new(5, 5, 5);
    let mut world = empty_world_with(&[("P", q, DVec3::new(2.0, 2.0, 2.0))]);
    world.galaxy.npcs[9] = NpcShip {
        id: 9,
        quadrant: q,
        pos: DVec3::new(8.0, 8.0, 8.0),
        abs: q.origin() + DVec3::new(8.0, 8.0, 8.0),
        energy: 10_000,
        engine_health: 0.0,
        active: true,
        ..NpcShip::default()
    };
    world.rebuild_index();

    {
        let World { galaxy, index } = &mut world;
        commands::dispatch(galaxy, index, 0, "lock 1009");
    }
    assert_eq!(world.galaxy.players[0].lock_target, id::npc_id(9));

    // Kill the target: the next tick must reconcile the lock to zero.
    world.galaxy.npcs[9].active = false;
    world.advance_tick();
    assert_eq!(world.galaxy.players[0].lock_target, 0);
}
