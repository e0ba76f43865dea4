//! Synthetic Walker-pattern satellite constellation.
//!
//! Circular orbits only: positions are a closed-form function of
//! simulation time, evenly phased satellites across evenly spaced
//! planes. Output is in Earth radii in the render frame, matching the
//! rest of the scene.

use nalgebra::Vector3;
use std::f64::consts::PI;

use crate::ephemeris::EARTH_RADIUS_KM;
use crate::time::SECONDS_PER_DAY;

pub const EARTH_MU_KM3_S2: f64 = 398600.4418;

pub struct WalkerConstellation {
    pub total_sats: usize,
    pub num_planes: usize,
    pub altitude_km: f64,
    pub inclination_deg: f64,
    /// Inter-plane phasing in fractions of the in-plane spacing.
    pub phasing: f64,
}

impl WalkerConstellation {
    pub fn sats_per_plane(&self) -> usize {
        self.total_sats / self.num_planes
    }

    pub fn orbit_radius_er(&self) -> f64 {
        (EARTH_RADIUS_KM + self.altitude_km) / EARTH_RADIUS_KM
    }

    pub fn period_seconds(&self) -> f64 {
        let semi_major = EARTH_RADIUS_KM + self.altitude_km;
        2.0 * PI * (semi_major.powi(3) / EARTH_MU_KM3_S2).sqrt()
    }

    /// Positions at `time` in days, Earth radii, render frame. Order is
    /// plane-major and stable across calls.
    pub fn satellite_positions(&self, time: f64) -> Vec<Vector3<f64>> {
        let mut positions = Vec::with_capacity(self.total_sats);
        let sats_per_plane = self.sats_per_plane();
        let radius = self.orbit_radius_er();
        let mean_motion = 2.0 * PI / self.period_seconds();
        let seconds = time * SECONDS_PER_DAY;
        let inc = self.inclination_deg.to_radians();
        let (inc_sin, inc_cos) = inc.sin_cos();
        let raan_step = 2.0 * PI / self.num_planes as f64;
        let sat_step = 2.0 * PI / sats_per_plane as f64;
        let phase_step = self.phasing * 2.0 * PI / self.total_sats as f64;

        for plane in 0..self.num_planes {
            let raan = raan_step * plane as f64;
            let (raan_sin, raan_cos) = raan.sin_cos();
            let phase_offset = phase_step * plane as f64;

            for sat in 0..sats_per_plane {
                let u = sat_step * sat as f64 + phase_offset + mean_motion * seconds;
                let (u_sin, u_cos) = u.sin_cos();

                // Equatorial rectangular components.
                let i = radius * (u_cos * raan_cos - u_sin * inc_cos * raan_sin);
                let j = radius * (u_cos * raan_sin + u_sin * inc_cos * raan_cos);
                let k = radius * (u_sin * inc_sin);

                positions.push(Vector3::new(-i, k, j));
            }
        }
        positions
    }
}

/// The shipping constellation: an Iridium-like shell.
pub fn default_constellation() -> WalkerConstellation {
    WalkerConstellation {
        total_sats: 66,
        num_planes: 6,
        altitude_km: 780.0,
        inclination_deg: 86.4,
        phasing: 2.0,
    }
}
