//! Coordinate math shared by navigation, AI and combat.
//!
//! The galaxy is a continuous 100x100x100 space. A `Quadrant` is one cell of
//! the coarse 10x10x10 grid; the sector position inside it is `abs - origin`.

use glam::DVec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Quadrant {
    pub q1: i32,
    pub q2: i32,
    pub q3: i32,
}

impl Quadrant {
    pub fn new(q1: i32, q2: i32, q3: i32) -> Self {
        Self { q1, q2, q3 }
    }

    pub fn is_valid(self) -> bool {
        (1..=10).contains(&self.q1) && (1..=10).contains(&self.q2) && (1..=10).contains(&self.q3)
    }

    /// Quadrant containing an absolute coordinate, clamped to the grid.
    pub fn from_abs(abs: DVec3) -> Self {
        Self {
            q1: axis_quadrant(abs.x),
            q2: axis_quadrant(abs.y),
            q3: axis_quadrant(abs.z),
        }
    }

    /// Absolute position of this quadrant's origin corner.
    pub fn origin(self) -> DVec3 {
        DVec3::new(
            (self.q1 - 1) as f64 * 10.0,
            (self.q2 - 1) as f64 * 10.0,
            (self.q3 - 1) as f64 * 10.0,
        )
    }

    /// Absolute position of the quadrant center, sector (5,5,5).
    pub fn center(self) -> DVec3 {
        self.origin() + DVec3::splat(5.0)
    }
}

fn axis_quadrant(g: f64) -> i32 {
    ((g / 10.0) as i32 + 1).clamp(1, 10)
}

/// Sector position of an absolute coordinate within its (clamped) quadrant.
pub fn sector_of(abs: DVec3) -> DVec3 {
    abs - Quadrant::from_abs(abs).origin()
}

/// Absolute coordinate from a quadrant/sector pair.
pub fn abs_of(quadrant: Quadrant, sector: DVec3) -> DVec3 {
    quadrant.origin() + sector
}

/// Unit direction vector for a heading/mark pair in degrees.
///
/// Heading 0 points along -Y, increasing clockwise when viewed from +Z;
/// mark tilts out of the plane toward +Z.
pub fn dir_from_angles(heading: f64, mark: f64) -> DVec3 {
    let h = heading.to_radians();
    let m = mark.to_radians();
    DVec3::new(m.cos() * h.sin(), m.cos() * -h.cos(), m.sin())
}

/// Heading/mark in degrees toward a delta vector of length `dist`.
pub fn angles_to(delta: DVec3, dist: f64) -> (f64, f64) {
    if dist <= f64::EPSILON {
        return (0.0, 0.0);
    }
    let mut h = delta.x.atan2(-delta.y).to_degrees();
    if h < 0.0 {
        h += 360.0;
    }
    let m = (delta.z / dist).clamp(-1.0, 1.0).asin().to_degrees();
    (h, m)
}

/// Fold a heading/mark pair into the canonical upright ranges:
/// heading in [0,360), mark in [-90,+90]. A mark past the pole reflects and
/// flips the heading by 180 degrees.
pub fn normalize_upright(h: &mut f64, m: &mut f64) {
    *h = h.rem_euclid(360.0);
    while *m > 180.0 {
        *m -= 360.0;
    }
    while *m < -180.0 {
        *m += 360.0;
    }
    if *m > 90.0 {
        *m = 180.0 - *m;
        *h = (*h + 180.0).rem_euclid(360.0);
    } else if *m < -90.0 {
        *m = -180.0 - *m;
        *h = (*h + 180.0).rem_euclid(360.0);
    }
}

/// Smallest signed difference between two headings, in [-180,180].
pub fn heading_delta(target: f64, current: f64) -> f64 {
    let mut diff = target - current;
    while diff > 180.0 {
        diff -= 360.0;
    }
    while diff < -180.0 {
        diff += 360.0;
    }
    diff
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quadrant_from_abs_matches_floor_rule() {
        assert_eq!(Quadrant::from_abs(DVec3::new(0.0, 0.0, 0.0)), Quadrant::new(1, 1, 1));
        assert_eq!(Quadrant::from_abs(DVec3::new(9.99, 10.0, 45.0)), Quadrant::new(1, 2, 5));
        assert_eq!(Quadrant::from_abs(DVec3::new(99.95, 99.95, 99.95)), Quadrant::new(10, 10, 10));
    }

    #[test]
    fn sector_round_trip() {
        let abs = DVec3::new(42.5, 7.25, 99.0);
        let q = Quadrant::from_abs(abs);
        let s = sector_of(abs);
        assert!((abs_of(q, s) - abs).length() < 1e-12);
        assert!(s.x >= 0.0 && s.x < 10.0);
    }

    #[test]
    fn heading_zero_points_minus_y() {
        let d = dir_from_angles(0.0, 0.0);
        assert!((d - DVec3::new(0.0, -1.0, 0.0)).length() < 1e-12);
        let d = dir_from_angles(90.0, 0.0);
        assert!((d - DVec3::new(1.0, 0.0, 0.0)).length() < 1e-9);
        let d = dir_from_angles(0.0, 90.0);
        assert!((d - DVec3::new(0.0, 0.0, 1.0)).length() < 1e-9);
    }

    #[test]
    fn angles_invert_direction() {
        let (h, m) = (123.0, -37.5);
        let d = dir_from_angles(h, m);
        let (h2, m2) = angles_to(d, 1.0);
        assert!((h - h2).abs() < 1e-9);
        assert!((m - m2).abs() < 1e-9);
    }

    #[test]
    fn normalize_reflects_past_pole() {
        let (mut h, mut m) = (10.0, 120.0);
        normalize_upright(&mut h, &mut m);
        assert!((m - 60.0).abs() < 1e-12);
        assert!((h - 190.0).abs() < 1e-12);

        let (mut h, mut m) = (350.0, -135.0);
        normalize_upright(&mut h, &mut m);
        assert!((m + 45.0).abs() < 1e-12);
        assert!((h - 170.0).abs() < 1e-12);
    }
}
