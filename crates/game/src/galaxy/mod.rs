//! The galaxy singleton: master census cubes, every entity table, the
//! per-player sessions and the supernova event record.

pub mod census;
pub mod index;
pub mod persist;

use glam::DVec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::*;
use crate::entity::player::Player;
use crate::entity::{
    faction, kind, AiState, Asteroid, Base, BlackHole, Buoy, Comet, Derelict, Mine, Monster,
    Nebula, NpcShip, Planet, Platform, Pulsar, Rift, Star,
};
use crate::geom::Quadrant;

/// Census cube plus the global bookkeeping shared with clients at login.
#[derive(Debug, Clone)]
pub struct MasterState {
    pub frame_id: i64,
    /// Census scalar per quadrant (1-based axes; plane 0 unused).
    pub g: Box<[[[i64; 11]; 11]; 11]>,
    /// Scanned-map cube mirrored to clients.
    pub z: Box<[[[i64; 11]; 11]; 11]>,
    /// Hostile and base totals recorded at generation.
    pub k9: i32,
    pub b9: i32,
}

impl Default for MasterState {
    fn default() -> Self {
        Self {
            frame_id: 0,
            g: Box::new([[[0; 11]; 11]; 11]),
            z: Box::new([[[0; 11]; 11]; 11]),
            k9: 0,
            b9: 0,
        }
    }
}

impl MasterState {
    pub fn census(&self, q: Quadrant) -> i64 {
        self.g[q.q1 as usize][q.q2 as usize][q.q3 as usize]
    }

    pub fn set_census(&mut self, q: Quadrant, v: i64) {
        self.g[q.q1 as usize][q.q2 as usize][q.q3 as usize] = v;
    }
}

/// The singleton supernova event; at most one is in flight.
#[derive(Debug, Clone, Copy, Default)]
pub struct Supernova {
    pub quadrant: Quadrant,
    /// Sector position of the exploding star.
    pub epicenter: DVec3,
    /// Ticks remaining; 0 means inactive.
    pub timer: i32,
    pub star_id: i32,
}

pub struct Galaxy {
    pub master: MasterState,
    pub supernova: Supernova,

    pub npcs: Vec<NpcShip>,
    pub stars: Vec<Star>,
    pub black_holes: Vec<BlackHole>,
    pub planets: Vec<Planet>,
    pub bases: Vec<Base>,
    pub nebulas: Vec<Nebula>,
    pub pulsars: Vec<Pulsar>,
    pub comets: Vec<Comet>,
    pub asteroids: Vec<Asteroid>,
    pub derelicts: Vec<Derelict>,
    pub mines: Vec<Mine>,
    pub buoys: Vec<Buoy>,
    pub platforms: Vec<Platform>,
    pub rifts: Vec<Rift>,
    pub monsters: Vec<Monster>,
    pub players: Vec<Player>,

    pub tick: u64,
    /// Set by the simulation when a checkpoint should happen now
    /// (supernova expiry); the server drains it.
    pub save_requested: bool,
    pub rng: StdRng,
}

impl Galaxy {
    /// Empty galaxy with full-size inactive tables.
    pub fn empty() -> Self {
        Self {
            master: MasterState::default(),
            supernova: Supernova::default(),
            npcs: vec![NpcShip::default(); MAX_NPC],
            stars: vec![Star::default(); MAX_STARS],
            black_holes: vec![BlackHole::default(); MAX_BH],
            planets: vec![Planet::default(); MAX_PLANETS],
            bases: vec![Base::default(); MAX_BASES],
            nebulas: vec![Nebula::default(); MAX_NEBULAS],
            pulsars: vec![Pulsar::default(); MAX_PULSARS],
            comets: vec![Comet::default(); MAX_COMETS],
            asteroids: vec![Asteroid::default(); MAX_ASTEROIDS],
            derelicts: vec![Derelict::default(); MAX_DERELICTS],
            mines: vec![Mine::default(); MAX_MINES],
            buoys: vec![Buoy::default(); MAX_BUOYS],
            platforms: vec![Platform::default(); MAX_PLATFORMS],
            rifts: vec![Rift::default(); MAX_RIFTS],
            monsters: vec![Monster::default(); MAX_MONSTERS],
            players: vec![Player::default(); MAX_CLIENTS],
            tick: 0,
            save_requested: false,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn generate() -> Self {
        let mut galaxy = Self::empty();
        let mut rng = StdRng::from_entropy();
        galaxy.populate(&mut rng);
        galaxy.rng = rng;
        galaxy
    }

    /// Deterministic generation for tests.
    pub fn generate_with_seed(seed: u64) -> Self {
        let mut galaxy = Self::empty();
        let mut rng = StdRng::seed_from_u64(seed);
        galaxy.populate(&mut rng);
        galaxy.rng = StdRng::seed_from_u64(seed.wrapping_add(1));
        galaxy
    }

    /// Roll every quadrant's contents and fill the entity tables.
    fn populate(&mut self, rng: &mut StdRng) {
        let mut n_count = 0;
        let mut b_count = 0;
        let mut p_count = 0;
        let mut s_count = 0;
        let mut bh_count = 0;
        let mut neb_count = 0;
        let mut pul_count = 0;
        let mut com_count = 0;
        let mut ast_count = 0;
        let mut der_count = 0;
        let mut mine_count = 0;
        let mut buoy_count = 0;
        let mut plat_count = 0;
        let mut rift_count = 0;
        let mut mon_count = 0;

        let random_sector =
            |rng: &mut StdRng| DVec3::new(rng.gen_range(0..100) as f64 / 10.0, rng.gen_range(0..100) as f64 / 10.0, rng.gen_range(0..100) as f64 / 10.0);

        for q1 in 1..=10 {
            for q2 in 1..=10 {
                for q3 in 1..=10 {
                    let q = Quadrant::new(q1, q2, q3);

                    let r = rng.gen_range(0..100);
                    let hostiles = if r > 96 {
                        3
                    } else if r > 92 {
                        2
                    } else if r > 85 {
                        1
                    } else {
                        0
                    };
                    let base = i32::from(rng.gen_range(0..100) > 98);
                    let planets = if rng.gen_range(0..100) > 90 { rng.gen_range(1..=2) } else { 0 };
                    let stars = if rng.gen_range(0..100) < 40 { rng.gen_range(1..=3) } else { 0 };
                    let holes = i32::from(rng.gen_range(0..100) < 10);
                    let nebulas = i32::from(rng.gen_range(0..100) < 15);
                    let pulsars = i32::from(rng.gen_range(0..100) < 5);
                    let comets = i32::from(rng.gen_range(0..100) < 10);
                    let asteroids = if rng.gen_range(0..100) < 20 { rng.gen_range(5..=14) } else { 0 };
                    let derelicts = i32::from(rng.gen_range(0..100) < 5);
                    let mines = if hostiles > 0 && rng.gen_range(0..100) < 30 { rng.gen_range(3..=7) } else { 0 };
                    let buoys = i32::from(rng.gen_range(0..100) < 8);
                    let platforms = if hostiles > 0 && rng.gen_range(0..100) < 40 { rng.gen_range(1..=2) } else { 0 };
                    let rifts = i32::from(rng.gen_range(0..100) < 5);
                    let monsters = i32::from(rng.gen_range(0..100) < 2);

                    for _ in 0..hostiles {
                        if n_count >= MAX_NPC {
                            break;
                        }
                        let species = faction::KLINGON + rng.gen_range(0..11);
                        let energy = match species {
                            faction::BORG => 80_000 + rng.gen_range(0..=20_000),
                            faction::SPECIES_8472 | faction::HIROGEN => 60_000 + rng.gen_range(0..=20_000),
                            faction::KLINGON | faction::ROMULAN | faction::JEM_HADAR => {
                                30_000 + rng.gen_range(0..=20_000)
                            }
                            _ => 10_000,
                        };
                        let pos = random_sector(rng);
                        self.npcs[n_count] = NpcShip {
                            id: n_count as i32,
                            faction: species,
                            quadrant: q,
                            pos,
                            abs: q.origin() + pos,
                            energy,
                            engine_health: 100.0,
                            nav_timer: 60 + rng.gen_range(0..241),
                            ai_state: AiState::Patrol,
                            active: true,
                            ..NpcShip::default()
                        };
                        n_count += 1;
                    }
                    for _ in 0..base {
                        if b_count >= MAX_BASES {
                            break;
                        }
                        self.bases[b_count] = Base {
                            id: b_count as i32,
                            faction: faction::FEDERATION,
                            quadrant: q,
                            pos: random_sector(rng),
                            health: 5000,
                            active: true,
                        };
                        b_count += 1;
                    }
                    for _ in 0..planets {
                        if p_count >= MAX_PLANETS {
                            break;
                        }
                        self.planets[p_count] = Planet {
                            id: p_count as i32,
                            quadrant: q,
                            pos: random_sector(rng),
                            resource_type: rng.gen_range(1..=6),
                            amount: 1000,
                            active: true,
                        };
                        p_count += 1;
                    }
                    for _ in 0..stars {
                        if s_count >= MAX_STARS {
                            break;
                        }
                        self.stars[s_count] = Star {
                            id: s_count as i32,
                            faction: kind::STAR,
                            quadrant: q,
                            pos: random_sector(rng),
                            active: true,
                        };
                        s_count += 1;
                    }
                    for _ in 0..holes {
                        if bh_count >= MAX_BH {
                            break;
                        }
                        self.black_holes[bh_count] = BlackHole {
                            id: bh_count as i32,
                            quadrant: q,
                            pos: random_sector(rng),
                            active: true,
                        };
                        bh_count += 1;
                    }
                    for _ in 0..nebulas {
                        if neb_count >= MAX_NEBULAS {
                            break;
                        }
                        self.nebulas[neb_count] = Nebula {
                            id: neb_count as i32,
                            quadrant: q,
                            pos: random_sector(rng),
                            active: true,
                        };
                        neb_count += 1;
                    }
                    for _ in 0..pulsars {
                        if pul_count >= MAX_PULSARS {
                            break;
                        }
                        self.pulsars[pul_count] = Pulsar {
                            id: pul_count as i32,
                            quadrant: q,
                            pos: random_sector(rng),
                            active: true,
                        };
                        pul_count += 1;
                    }
                    for _ in 0..comets {
                        if com_count >= MAX_COMETS {
                            break;
                        }
                        let a = 10.0 + rng.gen_range(0..300) as f64 / 10.0;
                        let b = a * (0.5 + rng.gen_range(0..40) as f64 / 100.0);
                        self.comets[com_count] = Comet {
                            id: com_count as i32,
                            quadrant: q,
                            pos: random_sector(rng),
                            semi_major: a,
                            semi_minor: b,
                            angle: (rng.gen_range(0..360) as f64).to_radians(),
                            speed: 0.02 / a,
                            inclination: (rng.gen_range(0..360) as f64).to_radians(),
                            center: DVec3::new(
                                50.0 + rng.gen_range(-50..50) as f64 / 10.0,
                                50.0 + rng.gen_range(-50..50) as f64 / 10.0,
                                50.0 + rng.gen_range(-50..50) as f64 / 10.0,
                            ),
                            active: true,
                            ..Comet::default()
                        };
                        com_count += 1;
                    }
                    for _ in 0..asteroids {
                        if ast_count >= MAX_ASTEROIDS {
                            break;
                        }
                        self.asteroids[ast_count] = Asteroid {
                            id: ast_count as i32,
                            quadrant: q,
                            pos: random_sector(rng),
                            size: 0.1 + rng.gen_range(0..20) as f32 / 100.0,
                            resource_type: if rng.gen_range(0..10) < 7 { 2 } else { 4 },
                            amount: 100 + rng.gen_range(0..=400),
                            active: true,
                        };
                        ast_count += 1;
                    }
                    for _ in 0..derelicts {
                        if der_count >= MAX_DERELICTS {
                            break;
                        }
                        self.derelicts[der_count] = Derelict {
                            id: der_count as i32,
                            quadrant: q,
                            pos: random_sector(rng),
                            ship_class: rng.gen_range(0..13),
                            active: true,
                        };
                        der_count += 1;
                    }
                    for _ in 0..mines {
                        if mine_count >= MAX_MINES {
                            break;
                        }
                        self.mines[mine_count] = Mine {
                            id: mine_count as i32,
                            quadrant: q,
                            pos: random_sector(rng),
                            faction: faction::KLINGON,
                            active: true,
                        };
                        mine_count += 1;
                    }
                    for _ in 0..buoys {
                        if buoy_count >= MAX_BUOYS {
                            break;
                        }
                        self.buoys[buoy_count] = Buoy {
                            id: buoy_count as i32,
                            quadrant: q,
                            pos: random_sector(rng),
                            active: true,
                        };
                        buoy_count += 1;
                    }
                    for _ in 0..platforms {
                        if plat_count >= MAX_PLATFORMS {
                            break;
                        }
                        self.platforms[plat_count] = Platform {
                            id: plat_count as i32,
                            faction: faction::KLINGON,
                            quadrant: q,
                            pos: random_sector(rng),
                            health: 5000,
                            energy: 10_000,
                            fire_cooldown: 0,
                            active: true,
                        };
                        plat_count += 1;
                    }
                    for _ in 0..rifts {
                        if rift_count >= MAX_RIFTS {
                            break;
                        }
                        self.rifts[rift_count] = Rift {
                            id: rift_count as i32,
                            quadrant: q,
                            pos: random_sector(rng),
                            active: true,
                        };
                        rift_count += 1;
                    }
                    for _ in 0..monsters {
                        if mon_count >= MAX_MONSTERS {
                            break;
                        }
                        self.monsters[mon_count] = Monster {
                            id: mon_count as i32,
                            kind: if rng.gen_range(0..100) < 50 { kind::CRYSTALLINE } else { kind::AMOEBA },
                            quadrant: q,
                            pos: random_sector(rng),
                            health: 100_000,
                            energy: 100_000,
                            behavior_timer: 0,
                            active: true,
                        };
                        mon_count += 1;
                    }

                    self.master.k9 += hostiles;
                    self.master.b9 += base;
                }
            }
        }

        log::info!(
            "galaxy generated: {} npcs, {} stars, {} planets, {} bases, {} hazards",
            n_count,
            s_count,
            p_count,
            b_count,
            bh_count + neb_count + pul_count + mine_count + rift_count
        );
    }

    /// Find a persistent player slot by name.
    pub fn player_slot_by_name(&self, name: &str) -> Option<usize> {
        self.players
            .iter()
            .position(|p| !p.name.is_empty() && p.name == name)
    }

    pub fn free_player_slot(&self) -> Option<usize> {
        self.players.iter().position(|p| p.is_free_slot())
    }

    /// A random quadrant outside an active supernova's blast zone.
    pub fn random_safe_quadrant(&mut self) -> Quadrant {
        loop {
            let q = Quadrant::new(
                self.rng.gen_range(1..=10),
                self.rng.gen_range(1..=10),
                self.rng.gen_range(1..=10),
            );
            if self.supernova.timer > 0 && q == self.supernova.quadrant {
                continue;
            }
            return q;
        }
    }

    /// Queue a chat line for every active, connected player.
    pub fn broadcast_note(&mut self, from: &str, text: &str) {
        for player in self.players.iter_mut().filter(|p| p.active) {
            player.say(from, text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_deterministic_per_seed() {
        let a = Galaxy::generate_with_seed(42);
        let b = Galaxy::generate_with_seed(42);
        let count = |g: &Galaxy| g.stars.iter().filter(|s| s.active).count();
        assert_eq!(count(&a), count(&b));
        assert!(count(&a) > 0);
        for (x, y) in a.stars.iter().zip(b.stars.iter()) {
            assert_eq!(x.quadrant, y.quadrant);
        }
    }

    #[test]
    fn generated_positions_agree_with_quadrants() {
        let g = Galaxy::generate_with_seed(3);
        for npc in g.npcs.iter().filter(|n| n.active) {
            assert!(npc.quadrant.is_valid());
            assert_eq!(Quadrant::from_abs(npc.abs), npc.quadrant);
            assert!(npc.pos.x >= 0.0 && npc.pos.x < 10.0);
        }
        for star in g.stars.iter().filter(|s| s.active) {
            assert!(star.quadrant.is_valid());
        }
    }

    #[test]
    fn slot_lookup_by_name() {
        let mut g = Galaxy::generate_with_seed(1);
        assert_eq!(g.player_slot_by_name("Kirk"), None);
        let slot = g.free_player_slot().unwrap();
        g.players[slot].provision("Kirk", 0, 0, Quadrant::new(1, 1, 1));
        assert_eq!(g.player_slot_by_name("Kirk"), Some(slot));
    }
}
