//! GPU resource registries and the glow draw surface.
//!
//! Owns named shader programs, textures and meshes, and implements the
//! [`DrawSurface`] the scene graph drives during a paint callback.
//! Compile and link failures are configuration errors and assert at
//! startup; unknown names at draw time surface as `Err` values.

use eframe::glow;
use glow::HasContext as _;
use std::collections::HashMap;

use crate::mesh::MeshData;
use crate::scene::DrawSurface;
use crate::shaders;
use crate::uniforms::{DrawStateBag, UniformValue};

// position(3) + normal(3) + uv(2) + color(4), tightly interleaved.
const VERTEX_FLOATS: usize = 12;

pub struct GpuMesh {
    vertex_array: glow::VertexArray,
    vertex_buffer: glow::Buffer,
    index_buffer: glow::Buffer,
    index_count: i32,
}

#[derive(Default)]
pub struct Renderer {
    programs: HashMap<String, glow::Program>,
    textures: HashMap<String, glow::Texture>,
    meshes: HashMap<String, GpuMesh>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_program(&self, name: &str) -> bool {
        self.programs.contains_key(name)
    }

    pub fn has_texture(&self, name: &str) -> bool {
        self.textures.contains_key(name)
    }

    pub fn has_mesh(&self, name: &str) -> bool {
        self.meshes.contains_key(name)
    }

    pub fn compile_program(
        &mut self,
        gl: &glow::Context,
        name: &str,
        vertex_source: &str,
        fragment_source: &str,
    ) {
        let shader_version = if cfg!(target_arch = "wasm32") {
            "#version 300 es"
        } else {
            "#version 330"
        };

        unsafe {
            let program = gl.create_program().expect("Cannot create program");

            let shader_sources = [
                (glow::VERTEX_SHADER, vertex_source),
                (glow::FRAGMENT_SHADER, fragment_source),
            ];

            let compiled: Vec<_> = shader_sources
                .iter()
                .map(|(shader_type, shader_source)| {
                    let shader = gl.create_shader(*shader_type).expect("Cannot create shader");
                    gl.shader_source(shader, &format!("{shader_version}\n{shader_source}"));
                    gl.compile_shader(shader);
                    assert!(
                        gl.get_shader_compile_status(shader),
                        "Failed to compile shader '{}': {}",
                        name,
                        gl.get_shader_info_log(shader)
                    );
                    gl.attach_shader(program, shader);
                    shader
                })
                .collect();

            gl.link_program(program);
            assert!(
                gl.get_program_link_status(program),
                "Failed to link program '{}': {}",
                name,
                gl.get_program_info_log(program)
            );

            for shader in compiled {
                gl.detach_shader(program, shader);
                gl.delete_shader(shader);
            }

            self.programs.insert(name.to_string(), program);
        }
    }

    /// Link every named program against the shared basic vertex shader.
    pub fn compile_standard_programs(&mut self, gl: &glow::Context) {
        for (name, fragment) in shaders::PROGRAMS {
            self.compile_program(gl, name, shaders::BASIC_VERTEX, fragment);
        }
    }

    /// Upload an RGBA texture under a registry name, replacing any
    /// placeholder already there.
    pub fn upload_texture(
        &mut self,
        gl: &glow::Context,
        name: &str,
        width: u32,
        height: u32,
        pixels: &[u8],
        mipmap: bool,
    ) {
        unsafe {
            let texture = gl.create_texture().expect("Cannot create texture");
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA as i32,
                width as i32,
                height as i32,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(pixels)),
            );
            let min_filter = if mipmap {
                gl.generate_mipmap(glow::TEXTURE_2D);
                glow::LINEAR_MIPMAP_LINEAR
            } else {
                glow::LINEAR
            };
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, min_filter as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::REPEAT as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);

            if let Some(old) = self.textures.insert(name.to_string(), texture) {
                gl.delete_texture(old);
            }
        }
    }

    pub fn upload_mesh(&mut self, gl: &glow::Context, name: &str, mesh: &MeshData) {
        let mut interleaved = Vec::with_capacity(mesh.vertex_count() * VERTEX_FLOATS);
        for i in 0..mesh.vertex_count() {
            interleaved.extend_from_slice(&mesh.positions[i]);
            interleaved.extend_from_slice(&mesh.normals[i]);
            interleaved.extend_from_slice(&mesh.uvs[i]);
            interleaved.extend_from_slice(&mesh.colors[i]);
        }

        unsafe {
            let vertex_array = gl.create_vertex_array().expect("Cannot create vertex array");
            gl.bind_vertex_array(Some(vertex_array));

            let vertex_buffer = gl.create_buffer().expect("Cannot create vertex buffer");
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vertex_buffer));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                std::slice::from_raw_parts(
                    interleaved.as_ptr() as *const u8,
                    interleaved.len() * std::mem::size_of::<f32>(),
                ),
                glow::STATIC_DRAW,
            );

            let stride = (VERTEX_FLOATS * std::mem::size_of::<f32>()) as i32;
            let attributes: [(u32, i32, i32); 4] = [
                (0, 3, 0),  // position
                (1, 3, 12), // normal
                (2, 2, 24), // uv
                (3, 4, 32), // color
            ];
            for (location, size, offset) in attributes {
                gl.enable_vertex_attrib_array(location);
                gl.vertex_attrib_pointer_f32(location, size, glow::FLOAT, false, stride, offset);
            }

            let index_buffer = gl.create_buffer().expect("Cannot create index buffer");
            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(index_buffer));
            gl.buffer_data_u8_slice(
                glow::ELEMENT_ARRAY_BUFFER,
                std::slice::from_raw_parts(
                    mesh.indices.as_ptr() as *const u8,
                    mesh.indices.len() * std::mem::size_of::<u32>(),
                ),
                glow::STATIC_DRAW,
            );

            gl.bind_vertex_array(None);

            self.meshes.insert(
                name.to_string(),
                GpuMesh {
                    vertex_array,
                    vertex_buffer,
                    index_buffer,
                    index_count: mesh.indices.len() as i32,
                },
            );
        }
    }

    pub fn destroy(&self, gl: &glow::Context) {
        unsafe {
            for program in self.programs.values() {
                gl.delete_program(*program);
            }
            for texture in self.textures.values() {
                gl.delete_texture(*texture);
            }
            for mesh in self.meshes.values() {
                gl.delete_vertex_array(mesh.vertex_array);
                gl.delete_buffer(mesh.vertex_buffer);
                gl.delete_buffer(mesh.index_buffer);
            }
        }
    }
}

/// One frame's draw surface: borrows the GL context and the registries
/// for the duration of a paint callback.
pub struct DrawPass<'a> {
    gl: &'a glow::Context,
    renderer: &'a Renderer,
    current_program: Option<glow::Program>,
}

impl<'a> DrawPass<'a> {
    pub fn new(gl: &'a glow::Context, renderer: &'a Renderer) -> Self {
        Self { gl, renderer, current_program: None }
    }

    fn apply_uniforms(&self, program: glow::Program, bag: &DrawStateBag) -> Result<(), String> {
        let gl = self.gl;
        let mut texture_unit = 0;
        unsafe {
            for (key, value) in bag.iter() {
                let Some(location) = gl.get_uniform_location(program, key) else {
                    // Programs only declare the uniforms they read.
                    continue;
                };
                match value {
                    UniformValue::Float(v) => {
                        gl.uniform_1_f32(Some(&location), *v as f32);
                    }
                    UniformValue::Vec3(v) => {
                        gl.uniform_3_f32(Some(&location), v[0] as f32, v[1] as f32, v[2] as f32);
                    }
                    UniformValue::Mat4(m) => {
                        let mut data = [0.0f32; 16];
                        for (dst, src) in data.iter_mut().zip(m.as_slice()) {
                            *dst = *src as f32;
                        }
                        gl.uniform_matrix_4_f32_slice(Some(&location), false, &data);
                    }
                    UniformValue::Texture(name) => {
                        let texture = self
                            .renderer
                            .textures
                            .get(name)
                            .ok_or_else(|| format!("no texture named '{name}'"))?;
                        gl.active_texture(glow::TEXTURE0 + texture_unit);
                        gl.bind_texture(glow::TEXTURE_2D, Some(*texture));
                        gl.uniform_1_i32(Some(&location), texture_unit as i32);
                        texture_unit += 1;
                    }
                }
            }
        }
        Ok(())
    }
}

impl DrawSurface for DrawPass<'_> {
    fn set_depth(&mut self, test: bool, mask: bool) {
        unsafe {
            if test {
                self.gl.enable(glow::DEPTH_TEST);
            } else {
                self.gl.disable(glow::DEPTH_TEST);
            }
            self.gl.depth_mask(mask);
        }
    }

    fn set_blend(&mut self, on: bool) {
        unsafe {
            if on {
                self.gl.enable(glow::BLEND);
                self.gl.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
            } else {
                self.gl.disable(glow::BLEND);
            }
        }
    }

    fn set_cull(&mut self, on: bool) {
        unsafe {
            if on {
                self.gl.enable(glow::CULL_FACE);
                self.gl.cull_face(glow::BACK);
            } else {
                self.gl.disable(glow::CULL_FACE);
            }
        }
    }

    fn clear(&mut self, color: [f64; 4]) {
        unsafe {
            self.gl.clear_color(
                color[0] as f32,
                color[1] as f32,
                color[2] as f32,
                color[3] as f32,
            );
            self.gl.depth_mask(true);
            self.gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }
    }

    fn use_program(&mut self, name: &str) -> Result<(), String> {
        let program = self
            .renderer
            .programs
            .get(name)
            .ok_or_else(|| format!("no program named '{name}'"))?;
        unsafe {
            self.gl.use_program(Some(*program));
        }
        self.current_program = Some(*program);
        Ok(())
    }

    fn draw_mesh(&mut self, name: &str, bag: &DrawStateBag) -> Result<(), String> {
        let mesh = self
            .renderer
            .meshes
            .get(name)
            .ok_or_else(|| format!("no mesh named '{name}'"))?;
        let program = self
            .current_program
            .ok_or_else(|| format!("no program bound before drawing mesh '{name}'"))?;
        self.apply_uniforms(program, bag)?;
        unsafe {
            self.gl.bind_vertex_array(Some(mesh.vertex_array));
            self.gl
                .draw_elements(glow::TRIANGLES, mesh.index_count, glow::UNSIGNED_INT, 0);
            self.gl.bind_vertex_array(None);
        }
        Ok(())
    }
}
