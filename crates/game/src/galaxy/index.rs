//! The per-quadrant spatial index.
//!
//! A dense 10x10x10 grid of cells, each holding short fixed-capacity lists
//! of slot indices into the master entity tables. Insertion truncates
//! silently at the per-quadrant cap; the census saturates at 9 per digit, so
//! truncation is only visible as absence from local-quadrant queries.
//!
//! The index is a pure derived cache: seeded once with static objects at
//! boot, fully rebuilt after mutation every tick, and read-only in between.

use crate::config::*;
use crate::galaxy::census::{self, CensusCounts};
use crate::galaxy::Galaxy;
use crate::geom::Quadrant;

/// Fixed-capacity list of table slot indices; pushes beyond the capacity
/// are dropped.
#[derive(Debug, Clone)]
pub struct SlotList<const N: usize> {
    ids: [u16; N],
    len: usize,
}

impl<const N: usize> Default for SlotList<N> {
    fn default() -> Self {
        Self { ids: [0; N], len: 0 }
    }
}

impl<const N: usize> SlotList<N> {
    pub fn push(&mut self, slot: usize) {
        if self.len < N {
            self.ids[self.len] = slot as u16;
            self.len += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.ids[..self.len].iter().map(|&id| id as usize)
    }

    pub fn first(&self) -> Option<usize> {
        self.iter().next()
    }
}

#[derive(Debug, Clone, Default)]
pub struct QuadrantCell {
    pub npcs: SlotList<MAX_Q_NPC>,
    pub planets: SlotList<MAX_Q_PLANETS>,
    pub bases: SlotList<MAX_Q_BASES>,
    pub stars: SlotList<MAX_Q_STARS>,
    pub black_holes: SlotList<MAX_Q_BH>,
    pub nebulas: SlotList<MAX_Q_NEBULAS>,
    pub pulsars: SlotList<MAX_Q_PULSARS>,
    pub comets: SlotList<MAX_Q_COMETS>,
    pub asteroids: SlotList<MAX_Q_ASTEROIDS>,
    pub derelicts: SlotList<MAX_Q_DERELICTS>,
    pub mines: SlotList<MAX_Q_MINES>,
    pub buoys: SlotList<MAX_Q_BUOYS>,
    pub platforms: SlotList<MAX_Q_PLATFORMS>,
    pub rifts: SlotList<MAX_Q_RIFTS>,
    pub monsters: SlotList<MAX_Q_MONSTERS>,
    pub players: SlotList<MAX_Q_PLAYERS>,

    /* Baseline counts recorded by the static seed. */
    pub static_stars: usize,
    pub static_planets: usize,
    pub static_bases: usize,
    pub static_black_holes: usize,
    pub static_nebulas: usize,
    pub static_pulsars: usize,
}

impl QuadrantCell {
    fn clear(&mut self) {
        *self = QuadrantCell::default();
    }

    pub fn census_counts(&self) -> CensusCounts {
        CensusCounts {
            stars: self.stars.len(),
            bases: self.bases.len(),
            ships: self.npcs.len() + self.players.len(),
            planets: self.planets.len(),
            black_holes: self.black_holes.len(),
            nebulas: self.nebulas.len(),
            pulsars: self.pulsars.len(),
            comets: self.comets.len(),
            asteroids: self.asteroids.len(),
            derelicts: self.derelicts.len(),
            mines: self.mines.len(),
            buoys: self.buoys.len(),
            platforms: self.platforms.len(),
            rifts: self.rifts.len(),
            monsters: self.monsters.len(),
        }
    }
}

pub struct SpatialIndex {
    cells: Vec<QuadrantCell>,
}

fn cell_offset(q: Quadrant) -> usize {
    ((q.q1 - 1) as usize * 100) + ((q.q2 - 1) as usize * 10) + (q.q3 - 1) as usize
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self {
            cells: vec![QuadrantCell::default(); 1000],
        }
    }

    pub fn cell(&self, q: Quadrant) -> &QuadrantCell {
        &self.cells[cell_offset(q)]
    }

    fn cell_mut(&mut self, q: Quadrant) -> &mut QuadrantCell {
        &mut self.cells[cell_offset(q)]
    }

    fn insert_static(&mut self, galaxy: &Galaxy) {
        for (s, planet) in galaxy.planets.iter().enumerate() {
            if planet.active && planet.quadrant.is_valid() {
                let cell = self.cell_mut(planet.quadrant);
                cell.planets.push(s);
                cell.static_planets = cell.planets.len();
            }
        }
        for (s, base) in galaxy.bases.iter().enumerate() {
            if base.active && base.quadrant.is_valid() {
                let cell = self.cell_mut(base.quadrant);
                cell.bases.push(s);
                cell.static_bases = cell.bases.len();
            }
        }
        for (s, star) in galaxy.stars.iter().enumerate() {
            if star.active && star.quadrant.is_valid() {
                let cell = self.cell_mut(star.quadrant);
                cell.stars.push(s);
                cell.static_stars = cell.stars.len();
            }
        }
        for (s, hole) in galaxy.black_holes.iter().enumerate() {
            if hole.active && hole.quadrant.is_valid() {
                let cell = self.cell_mut(hole.quadrant);
                cell.black_holes.push(s);
                cell.static_black_holes = cell.black_holes.len();
            }
        }
        for (s, nebula) in galaxy.nebulas.iter().enumerate() {
            if nebula.active && nebula.quadrant.is_valid() {
                let cell = self.cell_mut(nebula.quadrant);
                cell.nebulas.push(s);
                cell.static_nebulas = cell.nebulas.len();
            }
        }
        for (s, pulsar) in galaxy.pulsars.iter().enumerate() {
            if pulsar.active && pulsar.quadrant.is_valid() {
                let cell = self.cell_mut(pulsar.quadrant);
                cell.pulsars.push(s);
                cell.static_pulsars = cell.pulsars.len();
            }
        }
        for (s, asteroid) in galaxy.asteroids.iter().enumerate() {
            if asteroid.active && asteroid.quadrant.is_valid() {
                self.cell_mut(asteroid.quadrant).asteroids.push(s);
            }
        }
        for (s, derelict) in galaxy.derelicts.iter().enumerate() {
            if derelict.active && derelict.quadrant.is_valid() {
                self.cell_mut(derelict.quadrant).derelicts.push(s);
            }
        }
        for (s, mine) in galaxy.mines.iter().enumerate() {
            if mine.active && mine.quadrant.is_valid() {
                self.cell_mut(mine.quadrant).mines.push(s);
            }
        }
        for (s, buoy) in galaxy.buoys.iter().enumerate() {
            if buoy.active && buoy.quadrant.is_valid() {
                self.cell_mut(buoy.quadrant).buoys.push(s);
            }
        }
        for (s, platform) in galaxy.platforms.iter().enumerate() {
            if platform.active && platform.quadrant.is_valid() {
                self.cell_mut(platform.quadrant).platforms.push(s);
            }
        }
        for (s, rift) in galaxy.rifts.iter().enumerate() {
            if rift.active && rift.quadrant.is_valid() {
                self.cell_mut(rift.quadrant).rifts.push(s);
            }
        }
        for (s, monster) in galaxy.monsters.iter().enumerate() {
            if monster.active && monster.quadrant.is_valid() {
                self.cell_mut(monster.quadrant).monsters.push(s);
            }
        }
    }

    /// Boot-time seed: static objects only, recording the baseline counts.
    pub fn seed_static(&mut self, galaxy: &Galaxy) {
        for cell in &mut self.cells {
            cell.clear();
        }
        self.insert_static(galaxy);
    }

    /// Full rebuild after mutation: everything active, dynamic included.
    pub fn rebuild(&mut self, galaxy: &Galaxy) {
        for cell in &mut self.cells {
            cell.clear();
        }
        self.insert_static(galaxy);

        for (s, npc) in galaxy.npcs.iter().enumerate() {
            if npc.active && npc.quadrant.is_valid() {
                self.cell_mut(npc.quadrant).npcs.push(s);
            }
        }
        for (s, comet) in galaxy.comets.iter().enumerate() {
            if comet.active && comet.quadrant.is_valid() {
                self.cell_mut(comet.quadrant).comets.push(s);
            }
        }
        for (s, player) in galaxy.players.iter().enumerate() {
            if player.active && !player.name.is_empty() && player.quadrant.is_valid() {
                self.cell_mut(player.quadrant).players.push(s);
            }
        }
    }

    /// Recompute every quadrant's census scalar from the current cells,
    /// preserving ion-storm digits and leaving an active supernova's
    /// override untouched.
    pub fn write_census(&self, galaxy: &mut Galaxy) {
        for q1 in 1..=10 {
            for q2 in 1..=10 {
                for q3 in 1..=10 {
                    let q = Quadrant::new(q1, q2, q3);
                    if galaxy.supernova.timer > 0 && galaxy.supernova.quadrant == q {
                        continue;
                    }
                    let old = galaxy.master.census(q);
                    let mut v = census::encode(&self.cell(q).census_counts());
                    if old >= 0 && census::ion_storm_digit(old) > 0 {
                        v = census::mark_ion_storm(v);
                    }
                    galaxy.master.set_census(q, v);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_list_truncates_silently() {
        let mut list: SlotList<4> = SlotList::default();
        for i in 0..10 {
            list.push(i);
        }
        assert_eq!(list.len(), 4);
        let collected: Vec<usize> = list.iter().collect();
        assert_eq!(collected, vec![0, 1, 2, 3]);
    }

    #[test]
    fn rebuild_places_entities() {
        let mut galaxy = Galaxy::generate_with_seed(7);
        let mut index = SpatialIndex::new();
        index.rebuild(&galaxy);

        for (s, star) in galaxy.stars.iter().enumerate() {
            if star.active {
                let cell = index.cell(star.quadrant);
                let listed = cell.stars.iter().any(|i| i == s);
                let truncated = cell.stars.len() == MAX_Q_STARS;
                assert!(listed || truncated);
            }
        }

        index.write_census(&mut galaxy);
        for q1 in 1..=10 {
            for q2 in 1..=10 {
                for q3 in 1..=10 {
                    let q = Quadrant::new(q1, q2, q3);
                    let v = galaxy.master.census(q);
                    assert!(v >= 0);
                    assert_eq!(census::star_digit(v), index.cell(q).stars.len().min(9) as i64);
                }
            }
        }
    }

    #[test]
    fn census_preserves_storm_digit() {
        let mut galaxy = Galaxy::generate_with_seed(11);
        let mut index = SpatialIndex::new();
        index.rebuild(&galaxy);
        index.write_census(&mut galaxy);

        let q = Quadrant::new(2, 3, 4);
        let marked = census::mark_ion_storm(galaxy.master.census(q));
        galaxy.master.set_census(q, marked);

        index.write_census(&mut galaxy);
        assert_eq!(census::ion_storm_digit(galaxy.master.census(q)), 1);
    }
}
