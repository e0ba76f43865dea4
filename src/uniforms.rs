//! Shared per-frame uniform state.
//!
//! One bag is filled per frame: behavior bindings and node state hooks
//! write values, the renderer reads them when it binds a program. Keys
//! double as the GLSL uniform names.

use nalgebra::Matrix4;
use std::collections::HashMap;

pub const PROJECTION_MATRIX: &str = "PROJECTION_MATRIX";
pub const VIEW_MATRIX: &str = "VIEW_MATRIX";
pub const MODEL_MATRIX: &str = "MODEL_MATRIX";
pub const CAMERA_POSITION: &str = "CAMERA_POSITION";
pub const LIGHT_DIRECTION: &str = "LIGHT_DIRECTION";
pub const LIGHT_COLOR: &str = "LIGHT_COLOR";
pub const AMBIENT_LIGHT_COLOR: &str = "AMBIENT_LIGHT_COLOR";
pub const MODEL_COLOR: &str = "MODEL_COLOR";
pub const OUTPUT_ALPHA: &str = "OUTPUT_ALPHA";
pub const TEXTURE_SAMPLER: &str = "TEXTURE_SAMPLER";
pub const AMBIENT_CONTRIBUTION: &str = "AMBIENT_CONTRIBUTION";
pub const DIFFUSE_CONTRIBUTION: &str = "DIFFUSE_CONTRIBUTION";
pub const SPECULAR_CONTRIBUTION: &str = "SPECULAR_CONTRIBUTION";
pub const SPECULAR_EXPONENT: &str = "SPECULAR_EXPONENT";
pub const ATMOSPHERE_DEPTH: &str = "ATMOSPHERE_DEPTH";
pub const DAY_TX_SAMPLER: &str = "DAY_TX_SAMPLER";
pub const NIGHT_TX_SAMPLER: &str = "NIGHT_TX_SAMPLER";
pub const SPECULAR_MAP_TX_SAMPLER: &str = "SPECULAR_MAP_TX_SAMPLER";

#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Float(f64),
    Vec3([f64; 3]),
    Mat4(Matrix4<f64>),
    /// A texture referenced by registry name, bound to a unit at draw time.
    Texture(String),
}

#[derive(Debug, Clone, Default)]
pub struct DrawStateBag {
    values: HashMap<&'static str, UniformValue>,
}

impl DrawStateBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_float(&mut self, key: &'static str, value: f64) {
        self.values.insert(key, UniformValue::Float(value));
    }

    pub fn set_vec3(&mut self, key: &'static str, value: [f64; 3]) {
        self.values.insert(key, UniformValue::Vec3(value));
    }

    pub fn set_mat4(&mut self, key: &'static str, value: Matrix4<f64>) {
        self.values.insert(key, UniformValue::Mat4(value));
    }

    pub fn set_texture(&mut self, key: &'static str, name: &str) {
        self.values.insert(key, UniformValue::Texture(name.to_string()));
    }

    pub fn get(&self, key: &str) -> Option<&UniformValue> {
        self.values.get(key)
    }

    pub fn float(&self, key: &str) -> Option<f64> {
        match self.values.get(key) {
            Some(UniformValue::Float(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn vec3(&self, key: &str) -> Option<[f64; 3]> {
        match self.values.get(key) {
            Some(UniformValue::Vec3(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn mat4(&self, key: &str) -> Option<&Matrix4<f64>> {
        match self.values.get(key) {
            Some(UniformValue::Mat4(m)) => Some(m),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &UniformValue)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_accessors() {
        let mut bag = DrawStateBag::new();
        bag.set_float(OUTPUT_ALPHA, 0.9);
        bag.set_vec3(LIGHT_DIRECTION, [0.0, 1.0, 0.0]);
        bag.set_mat4(MODEL_MATRIX, Matrix4::identity());
        bag.set_texture(TEXTURE_SAMPLER, "starfield");

        assert_eq!(bag.float(OUTPUT_ALPHA), Some(0.9));
        assert_eq!(bag.vec3(LIGHT_DIRECTION), Some([0.0, 1.0, 0.0]));
        assert_eq!(bag.mat4(MODEL_MATRIX), Some(&Matrix4::identity()));
        assert_eq!(
            bag.get(TEXTURE_SAMPLER),
            Some(&UniformValue::Texture("starfield".to_string()))
        );
        // A typed accessor refuses a mismatched entry.
        assert_eq!(bag.float(LIGHT_DIRECTION), None);
    }

    #[test]
    fn test_overwrite_replaces() {
        let mut bag = DrawStateBag::new();
        bag.set_float(OUTPUT_ALPHA, 1.0);
        bag.set_float(OUTPUT_ALPHA, 0.25);
        assert_eq!(bag.float(OUTPUT_ALPHA), Some(0.25));
        assert_eq!(bag.len(), 1);
    }
}
