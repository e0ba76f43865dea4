//! Low-precision analytic ephemeris for the Sun and Moon.
//!
//! Trigonometric series in Julian centuries from J2000, good to a fraction
//! of a degree over a few centuries. Equatorial rectangular output is
//! remapped into the render frame, a right-handed system with +X to the
//! left, +Y up and +Z into the view: `[-I, K, J]`.

use nalgebra::{Matrix4, Vector3};

use crate::angle::{cos_deg, sin_deg};
use crate::time::DAYS_PER_JULIAN_CENTURY;

// Body radii and orbit radii in km, for scale reasoning. The render unit
// is one Earth radius.
pub const EARTH_RADIUS_KM: f64 = 6378.1370;
pub const SUN_RADIUS_KM: f64 = 695_700.0;
pub const EARTH_ORBIT_KM: f64 = 149_597_870.700;
pub const MOON_RADIUS_KM: f64 = 1737.1;
pub const MOON_ORBIT_KM: f64 = 384_405.0;

/// Distance at which the Sun disk is drawn, in Earth radii. Far enough to
/// sit behind everything but the starfield.
pub const SUN_DRAW_DISTANCE: f64 = 200.0;

pub const MOON_SCALE: f64 = MOON_RADIUS_KM / EARTH_RADIUS_KM;
pub const MOON_MEAN_DISTANCE_ER: f64 = MOON_ORBIT_KM / EARTH_RADIUS_KM;

/// Mean obliquity of the ecliptic in degrees at `jc` Julian centuries
/// from J2000.
pub fn obliquity_deg(jc: f64) -> f64 {
    23.439291 - 0.0130042 * jc
}

/// Map equatorial rectangular components into the render frame.
fn render_direction(i: f64, j: f64, k: f64) -> Vector3<f64> {
    Vector3::new(-i, k, j).normalize()
}

#[derive(Debug, Clone, Copy)]
pub struct SunState {
    /// Unit vector from the Earth toward the Sun, render frame.
    pub direction: Vector3<f64>,
    /// Draw position: `direction` scaled to the fixed draw distance.
    pub position: Vector3<f64>,
    /// Disk scale that keeps the apparent size right at the draw
    /// distance, tracking the true orbital distance.
    pub apparent_scale: f64,
    /// Earth-Sun distance in astronomical units.
    pub distance_au: f64,
}

/// Solar position series (Vallado's low-precision form).
pub fn sun_state(time: f64) -> SunState {
    let jc = time / DAYS_PER_JULIAN_CENTURY;

    // Mean longitude and mean anomaly in degrees.
    let mean_longitude = 280.460 + 36000.77 * jc;
    let mean_anomaly = 357.5277233 + 35999.05034 * jc;

    let ecliptic_longitude = mean_longitude
        + 1.914666471 * sin_deg(mean_anomaly)
        + 0.019994643 * sin_deg(mean_anomaly + mean_anomaly);

    // Distance in astronomical units.
    let r = 1.000140612
        - 0.016708617 * cos_deg(mean_anomaly)
        - 0.000139589 * cos_deg(mean_anomaly + mean_anomaly);

    let obliquity = obliquity_deg(jc);

    // Geocentric equatorial coordinates.
    let sin_ecliptic_longitude = sin_deg(ecliptic_longitude);
    let i = r * cos_deg(ecliptic_longitude);
    let j = r * cos_deg(obliquity) * sin_ecliptic_longitude;
    let k = r * sin_deg(obliquity) * sin_ecliptic_longitude;

    let direction = render_direction(i, j, k);
    let sun_distance_er = EARTH_ORBIT_KM / EARTH_RADIUS_KM;
    SunState {
        direction,
        position: direction * SUN_DRAW_DISTANCE,
        apparent_scale: (SUN_RADIUS_KM / EARTH_RADIUS_KM)
            * (SUN_DRAW_DISTANCE / (sun_distance_er * r)),
        distance_au: r,
    }
}

struct SeriesTerm {
    amplitude: f64,
    phase: f64,
    rate: f64,
}

impl SeriesTerm {
    fn sin(&self, jc: f64) -> f64 {
        self.amplitude * sin_deg(self.phase + self.rate * jc)
    }

    fn cos(&self, jc: f64) -> f64 {
        self.amplitude * cos_deg(self.phase + self.rate * jc)
    }
}

// Lunar ecliptic longitude perturbations, degrees.
const MOON_LONGITUDE_TERMS: [SeriesTerm; 6] = [
    SeriesTerm { amplitude: 6.29, phase: 134.9, rate: 477198.85 },
    SeriesTerm { amplitude: -1.27, phase: 259.2, rate: -413335.38 },
    SeriesTerm { amplitude: 0.66, phase: 235.7, rate: 890534.23 },
    SeriesTerm { amplitude: 0.21, phase: 269.9, rate: 954397.70 },
    SeriesTerm { amplitude: -0.19, phase: 357.5, rate: 35999.05 },
    SeriesTerm { amplitude: -0.11, phase: 186.6, rate: 966404.05 },
];

// Lunar ecliptic latitude, degrees.
const MOON_LATITUDE_TERMS: [SeriesTerm; 4] = [
    SeriesTerm { amplitude: 5.13, phase: 93.3, rate: 483202.03 },
    SeriesTerm { amplitude: 0.28, phase: 228.2, rate: 960400.87 },
    SeriesTerm { amplitude: -0.28, phase: 318.3, rate: 6003.18 },
    SeriesTerm { amplitude: -0.17, phase: 217.6, rate: -407332.20 },
];

// Lunar horizontal parallax, degrees.
const MOON_PARALLAX_TERMS: [SeriesTerm; 4] = [
    SeriesTerm { amplitude: 0.0518, phase: 134.9, rate: 477198.85 },
    SeriesTerm { amplitude: 0.0095, phase: 259.2, rate: -413335.38 },
    SeriesTerm { amplitude: 0.0078, phase: 235.7, rate: 890534.23 },
    SeriesTerm { amplitude: 0.0028, phase: 269.9, rate: 954397.70 },
];

#[derive(Debug, Clone, Copy)]
pub struct MoonState {
    /// Unit vector from the Earth toward the Moon, render frame.
    pub direction: Vector3<f64>,
    /// Position in Earth radii: `direction` scaled by the true distance.
    pub position: Vector3<f64>,
    /// Earth-Moon distance in Earth radii.
    pub distance_er: f64,
    /// Horizontal parallax in degrees.
    pub parallax_deg: f64,
}

/// Lunar position series (Vallado's low-precision form).
///
/// The distance comes from `1 / sin(parallax)` with no guard; a singular
/// parallax propagates as a non-finite distance and position.
pub fn moon_state(time: f64) -> MoonState {
    let jc = time / DAYS_PER_JULIAN_CENTURY;

    let longitude = 218.32
        + 481267.8813 * jc
        + MOON_LONGITUDE_TERMS.iter().map(|t| t.sin(jc)).sum::<f64>();
    let latitude = MOON_LATITUDE_TERMS.iter().map(|t| t.sin(jc)).sum::<f64>();
    let parallax = 0.9508 + MOON_PARALLAX_TERMS.iter().map(|t| t.cos(jc)).sum::<f64>();

    let obliquity = obliquity_deg(jc);

    // Geocentric direction cosines.
    let l = cos_deg(latitude) * cos_deg(longitude);
    let m = cos_deg(obliquity) * cos_deg(latitude) * sin_deg(longitude)
        - sin_deg(obliquity) * sin_deg(latitude);
    let n = sin_deg(obliquity) * cos_deg(latitude) * sin_deg(longitude)
        + cos_deg(obliquity) * sin_deg(latitude);

    let distance_er = 1.0 / sin_deg(parallax);
    let direction = render_direction(l, m, n);
    MoonState {
        direction,
        position: direction * distance_er,
        distance_er,
        parallax_deg: parallax,
    }
}

/// Rotation whose local X axis maps onto `direction`. Used to line the
/// Moon's texture seam up with the Earth-Moon axis.
pub fn rotate_x_axis_to(direction: Vector3<f64>) -> Matrix4<f64> {
    let x = direction.normalize();
    // Pick a helper that cannot be parallel to the target.
    let helper = if x.y.abs() > 0.99 { Vector3::z() } else { Vector3::y() };
    let z = x.cross(&helper).normalize();
    let y = z.cross(&x);
    Matrix4::new(
        x.x, y.x, z.x, 0.0,
        x.y, y.y, z.y, 0.0,
        x.z, y.z, z.z, 0.0,
        0.0, 0.0, 0.0, 1.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sun_distance_bounds() {
        // One century either side of the epoch, sampled coarsely.
        let mut t = -DAYS_PER_JULIAN_CENTURY;
        while t <= DAYS_PER_JULIAN_CENTURY {
            let sun = sun_state(t);
            assert!(
                (0.97..=1.03).contains(&sun.distance_au),
                "sun distance {} au at t {}",
                sun.distance_au,
                t
            );
            assert!((sun.direction.norm() - 1.0).abs() < 1.0e-12);
            t += 211.7;
        }
    }

    #[test]
    fn test_sun_at_epoch() {
        let sun = sun_state(0.0);
        // Early January: the Sun stands south of the equator.
        assert!(sun.direction.y < 0.0);
        assert!((sun.position.norm() - SUN_DRAW_DISTANCE).abs() < 1.0e-9);
        assert!((0.90..=0.98).contains(&sun.apparent_scale));
    }

    #[test]
    fn test_sun_apparent_scale_range() {
        let mut t = 0.0;
        while t < 366.0 {
            let scale = sun_state(t).apparent_scale;
            assert!((0.90..=0.96).contains(&scale), "scale {scale} at t {t}");
            t += 1.0;
        }
    }

    #[test]
    fn test_sun_continuity_across_centuries() {
        // Series arguments grow by tens of thousands of degrees per
        // century; wrapped evaluation must stay continuous across the
        // wrap points far from the epoch.
        for &base in &[0.0, DAYS_PER_JULIAN_CENTURY, -3.0 * DAYS_PER_JULIAN_CENTURY] {
            let step = 0.01;
            let mut t = base - 5.0;
            let mut prev = sun_state(t).direction;
            while t < base + 5.0 {
                t += step;
                let next = sun_state(t).direction;
                assert!(
                    (next - prev).norm() < 2.0e-4,
                    "sun direction jump at t {t}"
                );
                prev = next;
            }
        }
    }

    #[test]
    fn test_moon_distance_bounds() {
        let mut t = -3000.0;
        while t <= 3000.0 {
            let moon = moon_state(t);
            assert!(
                (54.0..=64.0).contains(&moon.distance_er),
                "moon distance {} er at t {}",
                moon.distance_er,
                t
            );
            assert!((moon.direction.norm() - 1.0).abs() < 1.0e-12);
            assert!(moon.position.iter().all(|c| c.is_finite()));
            t += 7.3;
        }
    }

    #[test]
    fn test_moon_distance_is_unclamped_parallax() {
        // The distance must be exactly the unguarded reciprocal of the
        // parallax sine: no clamping between the two.
        for &t in &[0.0, 123.456, -987.0, 20000.0] {
            let moon = moon_state(t);
            assert_eq!(moon.distance_er, 1.0 / crate::angle::sin_deg(moon.parallax_deg));
        }
    }

    #[test]
    fn test_moon_period() {
        // The longitude advances one revolution per sidereal month.
        let a = moon_state(0.0).direction;
        let b = moon_state(27.321).direction;
        assert!((a - b).norm() < 0.2, "moon did not come back around");
    }

    #[test]
    fn test_rotate_x_axis_to_maps_x() {
        let targets = [
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(-0.3, 0.8, 0.5),
            Vector3::new(0.0, 0.999, 0.01),
            Vector3::new(0.0, -1.0, 0.0),
        ];
        for target in targets {
            let dir = target.normalize();
            let m = rotate_x_axis_to(dir);
            let mapped = m.transform_vector(&Vector3::x());
            assert!((mapped - dir).norm() < 1.0e-9, "x axis missed {dir:?}");
            // Orthonormal basis: transforming unit axes keeps lengths.
            let y = m.transform_vector(&Vector3::y());
            let z = m.transform_vector(&Vector3::z());
            assert!((y.norm() - 1.0).abs() < 1.0e-9);
            assert!((z.norm() - 1.0).abs() < 1.0e-9);
            assert!(mapped.dot(&y).abs() < 1.0e-9);
            assert!(mapped.dot(&z).abs() < 1.0e-9);
        }
    }

    #[test]
    fn test_obliquity_near_constant() {
        assert!((obliquity_deg(0.0) - 23.439291).abs() < 1.0e-9);
        assert!((obliquity_deg(1.0) - 23.4262868).abs() < 1.0e-6);
    }
}
