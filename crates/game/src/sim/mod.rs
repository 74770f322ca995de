//! The fixed-rate simulation: one `advance_tick` call runs every phase of a
//! 30 Hz tick while the caller holds the world lock.

pub mod ai;
pub mod combat;
pub mod hazards;
pub mod nav;

use crate::config::*;
use crate::galaxy::index::SpatialIndex;
use crate::galaxy::{census, Galaxy};
use crate::geom::Quadrant;

/// The galaxy plus its derived spatial index. The index is rebuilt at the
/// end of every tick and read-only in between.
pub struct World {
    pub galaxy: Galaxy,
    pub index: SpatialIndex,
}

/// What the server should do after a tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickReport {
    pub checkpoint: bool,
}

impl World {
    pub fn new(galaxy: Galaxy) -> Self {
        let mut world = Self {
            galaxy,
            index: SpatialIndex::new(),
        };
        world.index.seed_static(&world.galaxy);
        world.rebuild_index();
        world
    }

    /// Full index rebuild plus census refresh.
    pub fn rebuild_index(&mut self) {
        self.index.rebuild(&self.galaxy);
        self.index.write_census(&mut self.galaxy);
    }

    /// Advance the world by one tick. Phases run to completion in order:
    /// map cleanup, NPC/platform/comet/supernova/monster updates, the
    /// per-player block (hazards, navigation, combat), index rebuild.
    pub fn advance_tick(&mut self) -> TickReport {
        let galaxy = &mut self.galaxy;
        let index = &self.index;

        galaxy.tick += 1;
        galaxy.master.frame_id += 1;

        /* Phase 0: ion storm decay on the census map. */
        if galaxy.tick % STORM_DECAY_INTERVAL == 0 {
            for q1 in 1..=10 {
                for q2 in 1..=10 {
                    for q3 in 1..=10 {
                        let q = Quadrant::new(q1, q2, q3);
                        let v = galaxy.master.census(q);
                        if v >= 0 {
                            galaxy.master.set_census(q, census::decay_ion_storm(v));
                        }
                    }
                }
            }
        }

        /* Phase 1: autonomous actors. */
        ai::update_npcs(galaxy, index);
        ai::update_platforms(galaxy, index);
        hazards::update_comets(galaxy);
        let exploded = hazards::supernova_step(galaxy, index);
        if exploded {
            self.rebuild_index();
            self.galaxy.save_requested = true;
        }
        let galaxy = &mut self.galaxy;
        let index = &self.index;
        ai::update_monsters(galaxy, index);

        /* Phase 2: players. */
        for slot in 0..MAX_CLIENTS {
            if !galaxy.players[slot].active {
                continue;
            }
            hazards::player_environment(galaxy, index, slot);
            if !galaxy.players[slot].active {
                continue;
            }
            nav::advance(galaxy, index, slot);
            combat::revalidate_lock(galaxy, slot);
            combat::torpedo_step(galaxy, index, slot);
            combat::tick_timers(galaxy, slot);
        }

        /* Phase 3: derived state. */
        self.rebuild_index();

        let checkpoint =
            self.galaxy.tick % CHECKPOINT_INTERVAL == 0 || std::mem::take(&mut self.galaxy.save_requested);
        TickReport { checkpoint }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::player::NavState;
    use glam::DVec3;

    fn world_with_player(seed: u64) -> (World, usize) {
        let mut galaxy = Galaxy::generate_with_seed(seed);
        let slot = galaxy.free_player_slot().unwrap();
        galaxy.players[slot].provision("Kirk", 0, 0, Quadrant::new(5, 5, 5));
        galaxy.players[slot].active = true;
        galaxy.players[slot].connected = true;
        (World::new(galaxy), slot)
    }

    #[test]
    fn tick_advances_frame_and_rebuilds() {
        let (mut world, slot) = world_with_player(17);
        let before = world.galaxy.master.frame_id;
        world.advance_tick();
        assert_eq!(world.galaxy.master.frame_id, before + 1);

        let q = world.galaxy.players[slot].quadrant;
        let listed = world.index.cell(q).players.iter().any(|s| s == slot);
        assert!(listed);
    }

    #[test]
    fn quadrant_always_agrees_with_absolute() {
        let (mut world, _) = world_with_player(23);
        for _ in 0..50 {
            world.advance_tick();
            for npc in world.galaxy.npcs.iter().filter(|n| n.active) {
                assert_eq!(Quadrant::from_abs(npc.abs), npc.quadrant);
            }
            for p in world.galaxy.players.iter().filter(|p| p.active) {
                assert_eq!(Quadrant::from_abs(p.abs), p.quadrant);
                assert!((p.abs - (p.quadrant.origin() + p.sector)).length() < 1e-9);
            }
        }
    }

    #[test]
    fn checkpoint_on_interval() {
        let (mut world, _) = world_with_player(3);
        world.galaxy.tick = CHECKPOINT_INTERVAL - 1;
        let report = world.advance_tick();
        assert!(report.checkpoint);
        let report = world.advance_tick();
        assert!(!report.checkpoint);
    }

    #[test]
    fn barrier_clamps_players() {
        // Empty galaxy: no hazards to interfere with the clamp itself.
        let mut galaxy = Galaxy::empty();
        let slot = 0;
        galaxy.players[slot].provision("Kirk", 0, 0, Quadrant::new(10, 5, 5));
        galaxy.players[slot].active = true;
        let mut world = World::new(galaxy);
        let p = &mut world.galaxy.players[slot];
        p.place_at(Quadrant::new(10, 5, 5), DVec3::new(9.9, 5.0, 5.0));
        p.nav_state = NavState::Warp;
        p.nav_timer = 100;
        p.warp_speed = 1.0;
        p.dir = DVec3::new(1.0, 0.0, 0.0);

        for _ in 0..5 {
            world.advance_tick();
        }
        let p = &world.galaxy.players[slot];
        assert!(p.abs.x <= BARRIER_MAX + 1e-9);
        assert_eq!(p.nav_state, NavState::Idle);
        assert_eq!(p.warp_speed, 0.0);
    }
}
