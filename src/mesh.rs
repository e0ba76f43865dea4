//! CPU-side mesh generation.
//!
//! Builds the vertex/index data the renderer uploads: lat-long balls for
//! textured bodies, an octahedrally subdivided sphere for the sun disk,
//! and surfaces of revolution. Positions sit on the unit shape; nodes
//! scale them with their transforms.

use nalgebra::{Matrix4, Point3, Vector3};
use std::f64::consts::PI;

pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub colors: Vec<[f32; 4]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn empty() -> Self {
        Self {
            positions: Vec::new(),
            normals: Vec::new(),
            uvs: Vec::new(),
            colors: Vec::new(),
            indices: Vec::new(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    fn push_vertex(&mut self, p: [f32; 3], n: [f32; 3], uv: [f32; 2]) {
        self.positions.push(p);
        self.normals.push(n);
        self.uvs.push(uv);
        self.colors.push([1.0, 1.0, 1.0, 1.0]);
    }

    /// Append another mesh, offsetting its indices.
    pub fn append(&mut self, other: &MeshData) {
        let base = self.positions.len() as u32;
        self.positions.extend_from_slice(&other.positions);
        self.normals.extend_from_slice(&other.normals);
        self.uvs.extend_from_slice(&other.uvs);
        self.colors.extend_from_slice(&other.colors);
        self.indices.extend(other.indices.iter().map(|i| i + base));
    }

    /// Bake a transform into positions; normals get the rotation part.
    pub fn transformed(&self, m: &Matrix4<f64>) -> MeshData {
        let mut out = MeshData::empty();
        for (i, p) in self.positions.iter().enumerate() {
            let tp = m.transform_point(&Point3::new(p[0] as f64, p[1] as f64, p[2] as f64));
            out.positions.push([tp.x as f32, tp.y as f32, tp.z as f32]);
            let n = self.normals[i];
            let tn = m
                .transform_vector(&Vector3::new(n[0] as f64, n[1] as f64, n[2] as f64));
            out.normals.push([tn.x as f32, tn.y as f32, tn.z as f32]);
        }
        out.uvs = self.uvs.clone();
        out.colors = self.colors.clone();
        out.indices = self.indices.clone();
        out
    }
}

/// Lat-long unit sphere with `steps` segments of longitude and half as
/// many bands of latitude. Texture seam along the -X meridian.
pub fn make_ball(steps: u32) -> MeshData {
    let bands = steps / 2;
    let mut mesh = MeshData::empty();
    for band in 0..=bands {
        let v = band as f64 / bands as f64;
        let lat = PI / 2.0 - v * PI;
        let (y, ring) = (lat.sin(), lat.cos());
        for step in 0..=steps {
            let u = step as f64 / steps as f64;
            let lon = -PI + u * 2.0 * PI;
            let x = ring * lon.cos();
            let z = -ring * lon.sin();
            let p = [x as f32, y as f32, z as f32];
            mesh.push_vertex(p, p, [u as f32, v as f32]);
        }
    }
    let stride = steps + 1;
    for band in 0..bands {
        for step in 0..steps {
            let a = band * stride + step;
            let b = a + stride;
            mesh.indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
        }
    }
    mesh
}

/// Octahedron subdivided onto the unit sphere. Distinct from the
/// lat-long builders: vertex distribution is even at the poles, which
/// suits the flat-shaded sun disk.
pub fn make_sphere2(subdivisions: u32) -> MeshData {
    let mut faces: Vec<[Vector3<f64>; 3]> = Vec::new();
    let top = Vector3::y();
    let bottom = -Vector3::y();
    let equator = [
        Vector3::x(),
        Vector3::z(),
        -Vector3::x(),
        -Vector3::z(),
    ];
    for i in 0..4 {
        let a = equator[i];
        let b = equator[(i + 1) % 4];
        faces.push([top, a, b]);
        faces.push([bottom, b, a]);
    }
    for _ in 0..subdivisions {
        let mut next = Vec::with_capacity(faces.len() * 4);
        for [a, b, c] in faces {
            let ab = (a + b).normalize();
            let bc = (b + c).normalize();
            let ca = (c + a).normalize();
            next.push([a, ab, ca]);
            next.push([ab, b, bc]);
            next.push([ca, bc, c]);
            next.push([ab, bc, ca]);
        }
        faces = next;
    }

    let mut mesh = MeshData::empty();
    for [a, b, c] in &faces {
        let base = mesh.vertex_count() as u32;
        for v in [a, b, c] {
            let p = [v.x as f32, v.y as f32, v.z as f32];
            let u = ((-v.z).atan2(v.x) + PI) / (2.0 * PI);
            let t = (PI / 2.0 - v.y.asin()) / PI;
            mesh.push_vertex(p, p, [u as f32, t as f32]);
        }
        mesh.indices.extend_from_slice(&[base, base + 1, base + 2]);
    }
    mesh
}

/// Surface of revolution around the Y axis. `profile` gives (radius, y)
/// outline points and `profile_normals` the matching 2-D normals;
/// consecutive pairs form the revolved quads, so hard edges repeat the
/// outline point with a different normal.
pub fn make_revolve(
    profile: &[[f64; 2]],
    profile_normals: &[[f64; 2]],
    steps: u32,
) -> MeshData {
    let mut mesh = MeshData::empty();
    for step in 0..=steps {
        let u = step as f64 / steps as f64;
        let angle = u * 2.0 * PI;
        let (sin_a, cos_a) = angle.sin_cos();
        for (i, point) in profile.iter().enumerate() {
            let [radius, y] = *point;
            let [nr, ny] = profile_normals[i];
            let p = [(radius * cos_a) as f32, y as f32, (-radius * sin_a) as f32];
            let n = [(nr * cos_a) as f32, ny as f32, (-nr * sin_a) as f32];
            let v = i as f64 / (profile.len() - 1) as f64;
            mesh.push_vertex(p, n, [u as f32, v as f32]);
        }
    }
    let stride = profile.len() as u32;
    for step in 0..steps {
        // Quads between consecutive outline pairs only (0-1, 2-3, ...).
        for pair in (0..stride - 1).step_by(2) {
            let a = step * stride + pair;
            let b = a + stride;
            mesh.indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
        }
    }
    mesh
}

/// The outline the scene's `cylinder` mesh revolves: an open ring with
/// inner and outer walls.
pub const CYLINDER_PROFILE: [[f64; 2]; 8] = [
    [1.0, 1.0], [1.0, -1.0], [1.0, -1.0], [0.8, -1.0],
    [0.8, -1.0], [0.8, 1.0], [0.8, 1.0], [1.0, 1.0],
];
pub const CYLINDER_NORMALS: [[f64; 2]; 8] = [
    [1.0, 0.0], [1.0, 0.0], [0.0, -1.0], [0.0, -1.0],
    [-1.0, 0.0], [-1.0, 0.0], [0.0, 1.0], [0.0, 1.0],
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ball_vertices_on_unit_sphere() {
        let mesh = make_ball(72);
        assert_eq!(mesh.vertex_count(), (73 * 37) as usize);
        for p in &mesh.positions {
            let norm = (p[0] as f64).hypot(p[1] as f64).hypot(p[2] as f64);
            assert!((norm - 1.0).abs() < 1.0e-6);
        }
        assert_eq!(mesh.indices.len() as u32, 72 * 36 * 6);
        for &i in &mesh.indices {
            assert!((i as usize) < mesh.vertex_count());
        }
    }

    #[test]
    fn test_sphere2_subdivision_counts() {
        // 8 octahedron faces, quadrupled per subdivision.
        let mesh = make_sphere2(3);
        assert_eq!(mesh.indices.len(), 8 * 4 * 4 * 4 * 3);
        for p in &mesh.positions {
            let norm = (p[0] as f64).hypot(p[1] as f64).hypot(p[2] as f64);
            assert!((norm - 1.0).abs() < 1.0e-6);
        }
    }

    #[test]
    fn test_revolve_closes_the_loop() {
        let mesh = make_revolve(&CYLINDER_PROFILE, &CYLINDER_NORMALS, 36);
        assert_eq!(mesh.vertex_count(), 37 * 8);
        // First and last rings coincide.
        for i in 0..8 {
            let first = mesh.positions[i];
            let last = mesh.positions[36 * 8 + i];
            for axis in 0..3 {
                assert!((first[axis] - last[axis]).abs() < 1.0e-5);
            }
        }
    }

    #[test]
    fn test_append_offsets_indices() {
        let mut a = make_sphere2(0);
        let b = make_sphere2(0);
        let base = a.vertex_count() as u32;
        a.append(&b);
        assert_eq!(a.vertex_count(), 2 * base as usize);
        assert!(a.indices[24..].iter().all(|&i| i >= base));
    }

    #[test]
    fn test_transformed_moves_positions_not_scale_normals() {
        let mesh = make_sphere2(0);
        let m = Matrix4::new_translation(&Vector3::new(5.0, 0.0, 0.0));
        let moved = mesh.transformed(&m);
        for (orig, new) in mesh.positions.iter().zip(&moved.positions) {
            assert!((new[0] - orig[0] - 5.0).abs() < 1.0e-6);
        }
        assert_eq!(mesh.normals, moved.normals);
    }
}
