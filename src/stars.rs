//! Bright-star catalog and billboard mesh.
//!
//! The catalog ships as embedded JSON: name, sexagesimal RA/Dec,
//! V magnitude and an optional blackbody temperature. Each star becomes
//! a small hexagonal billboard baked onto the unit sphere at load time;
//! the stars node's inside-out transform places the result on the
//! celestial sphere. Parse failures abort the load, the catalog is
//! built-in data.

use nalgebra::{Matrix4, Vector3};
use serde::Deserialize;
use std::f64::consts::{FRAC_PI_2, PI};

use crate::angle::Angle;
use crate::mesh::MeshData;

pub const STAR_CATALOG_JSON: &str = include_str!("../assets/stars.json");

// V-magnitude interpolation bounds: the brightest stars get the biggest
// billboards and full alpha.
const MIN_V: f64 = -1.5;
const MAX_V: f64 = 8.0;
const MAX_SIZE: f64 = 0.0075;
const MIN_SIZE: f64 = 0.000075;

#[derive(Debug, Clone, Deserialize)]
pub struct StarRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "RA")]
    pub ra: String,
    #[serde(rename = "Dec")]
    pub dec: String,
    #[serde(rename = "V")]
    pub v: f64,
    #[serde(rename = "K", default)]
    pub k: Option<f64>,
}

pub fn load_catalog() -> Result<Vec<StarRecord>, String> {
    serde_json::from_str(STAR_CATALOG_JSON)
        .map_err(|e| format!("star catalog parse failed: {e}"))
}

fn magnitude_interpolant(v: f64) -> f64 {
    (v - MIN_V) / (MAX_V - MIN_V)
}

pub fn star_size(v: f64) -> f64 {
    let t = magnitude_interpolant(v);
    MAX_SIZE * (1.0 - t) + MIN_SIZE * t
}

pub fn star_alpha(v: f64) -> f64 {
    0.25 + 0.75 * (1.0 - magnitude_interpolant(v))
}

/// Linear RGB for a blackbody at the given temperature, using the
/// standard curve-fit approximation over 1000-40000 K.
pub fn blackbody_rgb(kelvin: f64) -> [f64; 3] {
    let t = kelvin.clamp(1000.0, 40000.0) / 100.0;
    let red = if t <= 66.0 {
        255.0
    } else {
        329.698727446 * (t - 60.0).powf(-0.1332047592)
    };
    let green = if t <= 66.0 {
        99.4708025861 * t.ln() - 161.1195681661
    } else {
        288.1221695283 * (t - 60.0).powf(-0.0755148492)
    };
    let blue = if t >= 66.0 {
        255.0
    } else if t <= 19.0 {
        0.0
    } else {
        138.5177312231 * (t - 10.0).ln() - 305.0447927307
    };
    [
        (red / 255.0).clamp(0.0, 1.0),
        (green / 255.0).clamp(0.0, 1.0),
        (blue / 255.0).clamp(0.0, 1.0),
    ]
}

/// One mesh for the whole catalog: a hexagon fan per star, transformed
/// onto the unit sphere. Rim vertices carry the star color at zero
/// alpha; the center is white at the magnitude-derived alpha, so each
/// billboard renders as a soft tinted point.
pub fn build_star_mesh(stars: &[StarRecord]) -> Result<MeshData, String> {
    let theta = PI / 3.0;
    let (s, c) = (theta.sin(), theta.cos());
    let hexagon: [[f64; 3]; 7] = [
        [1.0, 0.0, 0.0],
        [c, s, 0.0],
        [-c, s, 0.0],
        [-1.0, 0.0, 0.0],
        [-c, -s, 0.0],
        [c, -s, 0.0],
        [0.0, 0.0, 0.0],
    ];
    let fan: [u32; 18] = [6, 1, 0, 6, 2, 1, 6, 3, 2, 6, 4, 3, 6, 5, 4, 6, 0, 5];

    let mut mesh = MeshData::empty();
    for star in stars {
        // Account for the reversed, rotated frame of the stars node.
        let ra = -FRAC_PI_2 + Angle::parse(&star.ra)?.to_radians();
        let dec = -Angle::parse(&star.dec)?.to_radians();

        let size = star_size(star.v);
        let transform = Matrix4::new_rotation(Vector3::y() * ra)
            * Matrix4::new_rotation(Vector3::x() * dec)
            * Matrix4::new_translation(&Vector3::new(0.0, 0.0, 1.0))
            * Matrix4::new_scaling(size);

        let base = mesh.vertex_count() as u32;
        let color = match star.k {
            Some(k) => blackbody_rgb(k),
            None => [0.5, 0.5, 0.5],
        };
        let alpha = star_alpha(star.v);
        for (i, point) in hexagon.iter().enumerate() {
            let p = transform
                .transform_point(&nalgebra::Point3::new(point[0], point[1], point[2]));
            let n = transform.transform_vector(&Vector3::z()).normalize();
            mesh.positions.push([p.x as f32, p.y as f32, p.z as f32]);
            mesh.normals.push([n.x as f32, n.y as f32, n.z as f32]);
            mesh.uvs.push([0.0, 0.0]);
            if i < 6 {
                mesh.colors
                    .push([color[0] as f32, color[1] as f32, color[2] as f32, 0.0]);
            } else {
                mesh.colors.push([1.0, 1.0, 1.0, alpha as f32]);
            }
        }
        mesh.indices.extend(fan.iter().map(|i| i + base));
    }
    Ok(mesh)
}
