//! Application context and per-frame control flow.
//!
//! `OrreryApp` owns everything the frame loop touches: the scene graph,
//! the behavior registry, the loader, the renderer handle and the UI
//! state. Each frame polls the loader until the pipeline settles, runs
//! the behaviors at the clock's current instant, fills the draw-state
//! bag with camera matrices, and hands traversal to a glow paint
//! callback.

use chrono::Utc;
use eframe::{egui, egui_glow, glow};
use egui::mutex::Mutex;
use nalgebra::{Matrix4, Perspective3, Vector3};
use std::f64::consts::{FRAC_PI_2, PI};
use std::sync::Arc;

use crate::behavior::BehaviorRegistry;
use crate::config::{CameraMode, CameraPreset, ViewConfig, camera_presets};
use crate::ephemeris::{self, EARTH_RADIUS_KM, MOON_SCALE};
use crate::loader::{LoadStage, Loader};
use crate::mesh;
use crate::renderer::{DrawPass, Renderer};
use crate::satellites::default_constellation;
use crate::scene::{DrawSurface, NodeId, Scene, SceneNode};
use crate::stars;
use crate::time::{SimClock, TIME_PRESETS, TimeMode, gmst_degrees};
use crate::uniforms::{self, DrawStateBag};

const SATELLITE_MARKER_SCALE: f64 = 0.02;
const CLOUD_LAYER_KM: f64 = 40.0;
const ATMOSPHERE_LAYER_KM: f64 = 160.0;
const STARS_DISTANCE: f64 = 210.0;

/// Node ids captured at scene build, so per-frame code never does name
/// lookups.
pub struct SceneHandles {
    pub root: NodeId,
    pub stars: NodeId,
    pub starfield: NodeId,
    pub bright_stars: NodeId,
    pub constellations: NodeId,
    pub sun: NodeId,
    pub world: NodeId,
    pub clouds: NodeId,
    pub atmosphere: NodeId,
    pub moon: NodeId,
    pub satellites: NodeId,
}

pub struct OrreryApp {
    gl: Arc<glow::Context>,
    renderer: Arc<Mutex<Renderer>>,
    scene: Arc<Mutex<Scene>>,
    behaviors: BehaviorRegistry,
    loader: Loader,
    clock: SimClock,
    view: ViewConfig,
    presets: Vec<(&'static str, CameraPreset)>,
    /// Free-orbit drag accumulator: x wraps into (-1, 1], y clamps.
    position: [f64; 2],
    handles: SceneHandles,
}

impl OrreryApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let gl = cc
            .gl
            .clone()
            .expect("eframe was built without a glow context");
        let (scene, handles) = build_scene().expect("scene construction failed");
        let mut behaviors = BehaviorRegistry::new();
        register_behaviors(&mut behaviors, &handles);
        Self {
            gl,
            renderer: Arc::new(Mutex::new(Renderer::new())),
            scene: Arc::new(Mutex::new(scene)),
            behaviors,
            loader: Loader::new(),
            clock: SimClock::new(),
            view: ViewConfig::default(),
            presets: camera_presets(),
            position: [0.0, 0.15],
            handles,
        }
    }

    fn upload_meshes(&mut self) {
        // Catalog data is compiled in; a parse failure is a build defect.
        let catalog = stars::load_catalog().expect("star catalog");
        let star_mesh = stars::build_star_mesh(&catalog).expect("star catalog coordinates");

        let mut renderer = self.renderer.lock();
        renderer.upload_mesh(&self.gl, "ball", &mesh::make_ball(72));
        renderer.upload_mesh(&self.gl, "ball-small", &mesh::make_ball(36));
        renderer.upload_mesh(&self.gl, "sphere2", &mesh::make_sphere2(3));
        renderer.upload_mesh(
            &self.gl,
            "cylinder",
            &mesh::make_revolve(&mesh::CYLINDER_PROFILE, &mesh::CYLINDER_NORMALS, 36),
        );
        renderer.upload_mesh(&self.gl, "bright-stars", &star_mesh);
    }

    fn apply_view_state(&self, scene: &mut Scene) {
        let q = match self.view.camera {
            CameraMode::FreeOrbit => star_visibility(self.view.fov_travel),
            CameraMode::Preset(_) => 1.0,
        };
        let flags = &self.view.flags;
        scene.node_mut(self.handles.stars).enabled = flags.stars;
        scene.node_mut(self.handles.starfield).alpha = q;
        scene.node_mut(self.handles.bright_stars).alpha = q;
        let constellations = scene.node_mut(self.handles.constellations);
        constellations.enabled = flags.constellations;
        constellations.alpha = q * 0.25;
        scene.node_mut(self.handles.clouds).enabled = flags.clouds;
        scene.node_mut(self.handles.atmosphere).enabled = flags.atmosphere;
        scene.node_mut(self.handles.satellites).enabled = flags.satellites;
    }

    fn camera_rig(&self, scene: &Scene, aspect: f64) -> Result<CameraRig, String> {
        match self.view.camera {
            CameraMode::FreeOrbit => Ok(free_orbit_rig(
                self.position,
                self.view.fov_travel,
                self.view.framing,
                aspect,
            )),
            CameraMode::Preset(index) => {
                let (_, preset) = &self.presets[index];
                preset_rig(scene, self.handles.root, preset, aspect)
            }
        }
    }

    fn side_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.add_space(4.0);
                ui.heading("Orrery");
                ui.label(self.loader.status_line());
                for note in &self.loader.notes {
                    ui.colored_label(egui::Color32::YELLOW, note);
                }

                ui.separator();
                ui.label("Time");
                ui.radio_value(&mut self.clock.mode, TimeMode::WallClock, "Now");
                ui.radio_value(&mut self.clock.mode, TimeMode::Paused, "Paused");
                for (i, preset) in TIME_PRESETS.iter().enumerate() {
                    ui.radio_value(&mut self.clock.mode, TimeMode::Preset(i), preset.label);
                }
                ui.horizontal(|ui| {
                    ui.label("Offset:");
                    ui.add(
                        egui::Slider::new(&mut self.clock.offset_days, -366.0..=366.0)
                            .suffix(" d"),
                    );
                });

                ui.separator();
                ui.label("Camera");
                ui.radio_value(&mut self.view.camera, CameraMode::FreeOrbit, "Free orbit");
                for (i, (label, _)) in self.presets.iter().enumerate() {
                    ui.radio_value(&mut self.view.camera, CameraMode::Preset(i), *label);
                }
                if self.view.camera == CameraMode::FreeOrbit {
                    ui.horizontal(|ui| {
                        ui.label("Travel:");
                        ui.add(egui::Slider::new(&mut self.view.fov_travel, 0.0..=100.0));
                    });
                    ui.horizontal(|ui| {
                        ui.label("Framing:");
                        ui.add(egui::Slider::new(&mut self.view.framing, 0.0..=100.0));
                    });
                }

                ui.separator();
                ui.label("Layers");
                let flags = &mut self.view.flags;
                ui.checkbox(&mut flags.stars, "Stars");
                ui.checkbox(&mut flags.constellations, "Constellations");
                ui.checkbox(&mut flags.clouds, "Clouds");
                ui.checkbox(&mut flags.atmosphere, "Atmosphere");
                ui.checkbox(&mut flags.satellites, "Satellites");

                ui.with_layout(egui::Layout::bottom_up(egui::Align::Min), |ui| {
                    ui.label(format!("build {}", env!("GIT_HASH")));
                });
            });
    }

    fn canvas(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let rect = ui.available_rect_before_wrap();
                let response = ui.allocate_rect(rect, egui::Sense::drag());

                let dragging = response.dragged();
                if dragging && self.view.camera == CameraMode::FreeOrbit {
                    let delta = response.drag_delta();
                    self.position[0] =
                        wrap_position(self.position[0] - 2.0 * delta.x as f64 / rect.width() as f64);
                    self.position[1] = (self.position[1]
                        + 2.0 * delta.y as f64 / rect.height() as f64)
                        .clamp(-0.9, 0.9);
                }

                if self.loader.stage() != LoadStage::SceneBuilt {
                    ui.centered_and_justified(|ui| ui.label(self.loader.status_line()));
                    return;
                }

                let time = self.clock.sample(Utc::now(), dragging);
                let mut bag = DrawStateBag::new();
                {
                    let mut scene = self.scene.lock();
                    self.behaviors.update_all(time, &mut scene, &mut bag);
                    self.apply_view_state(&mut scene);
                    let aspect = (rect.width() / rect.height()) as f64;
                    let rig = self
                        .camera_rig(&scene, aspect)
                        .expect("camera preset misconfigured");
                    bag.set_mat4(uniforms::PROJECTION_MATRIX, rig.projection);
                    bag.set_mat4(uniforms::VIEW_MATRIX, rig.view);
                    bag.set_vec3(uniforms::CAMERA_POSITION, rig.camera_position);
                }

                let scene = self.scene.clone();
                let renderer = self.renderer.clone();
                let root = self.handles.root;
                let callback = egui::PaintCallback {
                    rect,
                    callback: Arc::new(egui_glow::CallbackFn::new(move |_info, painter| {
                        let renderer = renderer.lock();
                        let scene = scene.lock();
                        let mut pass = DrawPass::new(painter.gl(), &renderer);
                        let mut bag = bag.clone();
                        if let Err(err) = scene.traverse(root, &mut bag, &mut pass) {
                            eprintln!("frame draw failed: {err}");
                        }
                    })),
                };
                ui.painter().add(callback);
            });
    }
}

impl eframe::App for OrreryApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(egui::Visuals::dark());

        if self.loader.stage() != LoadStage::SceneBuilt {
            {
                let mut renderer = self.renderer.lock();
                self.loader.advance(&self.gl, &mut renderer);
            }
            if self.loader.stage() == LoadStage::TexturesLoaded {
                self.upload_meshes();
                self.loader.mark_scene_built();
            }
        }

        self.side_panel(ctx);
        self.canvas(ctx);

        // The clock advances even with no input.
        ctx.request_repaint();
    }

    fn on_exit(&mut self, gl: Option<&glow::Context>) {
        if let Some(gl) = gl {
            self.renderer.lock().destroy(gl);
        }
    }
}

/// Wrap the free-orbit x coordinate into (-1, 1].
fn wrap_position(x: f64) -> f64 {
    let wrapped = (x + 1.0).rem_euclid(2.0) - 1.0;
    if wrapped == -1.0 { 1.0 } else { wrapped }
}

/// Star fade shared by the fov slider and the camera rig.
fn star_visibility(fov_travel: f64) -> f64 {
    1.0 - (fov_travel / 100.0).powi(2)
}

pub struct CameraRig {
    pub projection: Matrix4<f64>,
    pub view: Matrix4<f64>,
    pub camera_position: [f64; 3],
}

/// Orbit camera around the origin. The fov slider narrows the field of
/// view toward a telescopic 0.5 degrees; the framing slider pulls the
/// hypotenuse so the Earth keeps filling the same screen fraction.
pub fn free_orbit_rig(position: [f64; 2], fov_travel: f64, framing: f64, aspect: f64) -> CameraRig {
    let q = star_visibility(fov_travel);
    let fov = (0.5 + 59.5 * q).to_radians();
    let f = 0.1 + 0.9 * (framing / 100.0);
    let hypotenuse = (1.0 / f) / (fov / 2.0).sin();
    let near = (hypotenuse - 80.0).max(0.1);
    let far = hypotenuse + 211.0;

    let up_angle = position[1] * FRAC_PI_2;
    let view = Matrix4::new_translation(&Vector3::new(
        0.0,
        -hypotenuse * up_angle.sin(),
        -hypotenuse * up_angle.cos(),
    )) * Matrix4::new_rotation(Vector3::x() * up_angle)
        * Matrix4::new_rotation(Vector3::y() * (position[0] * PI));

    let camera_position = view
        .try_inverse()
        .map(|m| [m[(0, 3)], m[(1, 3)], m[(2, 3)]])
        .unwrap_or([0.0, 0.0, 0.0]);

    CameraRig {
        projection: Perspective3::new(aspect, fov, near, far).into_inner(),
        view,
        camera_position,
    }
}

/// Stand at one body, look at another, roll steadied by a third.
pub fn preset_rig(
    scene: &Scene,
    root: NodeId,
    preset: &CameraPreset,
    aspect: f64,
) -> Result<CameraRig, String> {
    let from = scene.lookup(&preset.from)?;
    let to = scene.lookup(&preset.to)?;
    let up = scene.lookup(&preset.up)?;

    let eye = scene.node_origin(from, root)?;
    let target = scene.node_origin(to, root)?;
    let distance = (target - eye).norm();
    let near = (distance - 80.0).max(0.1);
    let far = distance + 211.0;
    let fov = preset.default_fov_deg.to_radians();

    Ok(CameraRig {
        projection: Perspective3::new(aspect, fov, near, far).into_inner(),
        view: scene.camera_view(from, to, up, root)?,
        camera_position: [eye.x, eye.y, eye.z],
    })
}

// ---------------------------------------------------------------------
// Scene assembly

/// Build the production scene graph. Transforms that depend on time are
/// left at identity; behaviors overwrite them before the first draw.
pub fn build_scene() -> Result<(Scene, SceneHandles), String> {
    let mut scene = Scene::new();

    let mut root = SceneNode::new("root");
    root.hook = Some(root_state);
    let root = scene.add_node(root);

    // The star sphere is viewed from inside: negative scale turns it
    // inside out, the rotations put the celestial pole up.
    let mut stars_group = SceneNode::new("stars");
    stars_group.transform = Matrix4::new_scaling(-STARS_DISTANCE)
        * Matrix4::new_rotation(Vector3::y() * PI)
        * Matrix4::new_rotation(Vector3::x() * PI);
    let stars_group = scene.add_node(stars_group);
    scene.add_child(root, stars_group)?;

    let mut starfield = SceneNode::new("starfield");
    starfield.mesh = Some("ball".to_string());
    starfield.hook = Some(starfield_state);
    let starfield = scene.add_node(starfield);
    scene.add_child(stars_group, starfield)?;

    let mut bright_stars = SceneNode::new("bright-stars");
    bright_stars.mesh = Some("bright-stars".to_string());
    bright_stars.hook = Some(bright_stars_state);
    let bright_stars = scene.add_node(bright_stars);
    scene.add_child(stars_group, bright_stars)?;

    let mut constellations = SceneNode::new("constellations");
    constellations.mesh = Some("ball".to_string());
    constellations.hook = Some(constellations_state);
    constellations.alpha = 0.25;
    let constellations = scene.add_node(constellations);
    scene.add_child(stars_group, constellations)?;

    let mut sun = SceneNode::new("sun");
    sun.mesh = Some("sphere2".to_string());
    sun.hook = Some(sun_disk_state);
    let sun = scene.add_node(sun);
    scene.add_child(root, sun)?;

    let mut world = SceneNode::new("world");
    world.hook = Some(world_state);
    let world = scene.add_node(world);
    scene.add_child(root, world)?;

    let mut plate_carree = SceneNode::new("plate-carree");
    plate_carree.mesh = Some("ball".to_string());
    plate_carree.hook = Some(plate_carree_state);
    plate_carree.enabled = false;
    let plate_carree = scene.add_node(plate_carree);
    scene.add_child(world, plate_carree)?;

    let earth_render = scene.add_node(SceneNode::new("earth-render"));
    scene.add_child(world, earth_render)?;

    let mut earth = SceneNode::new("earth");
    earth.mesh = Some("ball".to_string());
    earth.hook = Some(earth_state);
    let earth = scene.add_node(earth);
    scene.add_child(earth_render, earth)?;

    let mut clouds = SceneNode::new("clouds");
    clouds.mesh = Some("ball".to_string());
    clouds.hook = Some(clouds_state);
    clouds.transform =
        Matrix4::new_scaling((EARTH_RADIUS_KM + CLOUD_LAYER_KM) / EARTH_RADIUS_KM);
    clouds.alpha = 0.90;
    let clouds = scene.add_node(clouds);
    scene.add_child(earth_render, clouds)?;

    // The atmosphere shares the cloud layer's name; lookups find the
    // cloud layer, this node stays reachable by id.
    let mut atmosphere = SceneNode::new("clouds");
    atmosphere.mesh = Some("ball".to_string());
    atmosphere.hook = Some(atmosphere_state);
    atmosphere.transform =
        Matrix4::new_scaling((EARTH_RADIUS_KM + ATMOSPHERE_LAYER_KM) / EARTH_RADIUS_KM);
    atmosphere.alpha = 0.5;
    let atmosphere = scene.add_node(atmosphere);
    scene.add_child(earth_render, atmosphere)?;

    let mut moon = SceneNode::new("moon");
    moon.mesh = Some("ball-small".to_string());
    moon.hook = Some(moon_surface_state);
    moon.transform = Matrix4::new_translation(&Vector3::new(
        -ephemeris::MOON_MEAN_DISTANCE_ER,
        0.0,
        0.0,
    )) * Matrix4::new_scaling(MOON_SCALE);
    let moon = scene.add_node(moon);
    scene.add_child(root, moon)?;

    let mut satellites = SceneNode::new("satellites");
    satellites.hook = Some(satellites_state);
    let satellites = scene.add_node(satellites);
    scene.add_child(root, satellites)?;
    for i in 0..default_constellation().total_sats {
        let mut marker = SceneNode::new(&format!("sat-{i}"));
        marker.mesh = Some("cylinder".to_string());
        let marker = scene.add_node(marker);
        scene.add_child(satellites, marker)?;
    }

    let handles = SceneHandles {
        root,
        stars: stars_group,
        starfield,
        bright_stars,
        constellations,
        sun,
        world,
        clouds,
        atmosphere,
        moon,
        satellites,
    };
    Ok((scene, handles))
}

pub fn register_behaviors(registry: &mut BehaviorRegistry, handles: &SceneHandles) {
    registry.register("sun", handles.sun, sun_update);
    registry.register("world", handles.world, world_update);
    registry.register("moon", handles.moon, moon_update);
    registry.register("satellites", handles.satellites, satellites_update);
}

// ---------------------------------------------------------------------
// Behaviors: pure in time and current shared state.

fn sun_update(time: f64, node: NodeId, scene: &mut Scene, bag: &mut DrawStateBag) {
    let sun = ephemeris::sun_state(time);
    scene.node_mut(node).transform = Matrix4::new_translation(&sun.position)
        * Matrix4::new_scaling(sun.apparent_scale);
    bag.set_vec3(
        uniforms::LIGHT_DIRECTION,
        [sun.direction.x, sun.direction.y, sun.direction.z],
    );
}

fn world_update(time: f64, node: NodeId, scene: &mut Scene, _bag: &mut DrawStateBag) {
    let gmst = gmst_degrees(time).to_radians();
    scene.node_mut(node).transform = Matrix4::new_rotation(Vector3::y() * gmst);
}

fn moon_update(time: f64, node: NodeId, scene: &mut Scene, _bag: &mut DrawStateBag) {
    let moon = ephemeris::moon_state(time);
    // Texture seam on the Earth-facing side.
    scene.node_mut(node).transform = Matrix4::new_translation(&moon.position)
        * ephemeris::rotate_x_axis_to(moon.direction)
        * Matrix4::new_scaling(MOON_SCALE);
}

fn satellites_update(time: f64, node: NodeId, scene: &mut Scene, _bag: &mut DrawStateBag) {
    let positions = default_constellation().satellite_positions(time);
    let markers = scene.node(node).children.clone();
    for (marker, position) in markers.into_iter().zip(positions) {
        scene.node_mut(marker).transform = Matrix4::new_translation(&position)
            * Matrix4::new_scaling(SATELLITE_MARKER_SCALE);
    }
}

// ---------------------------------------------------------------------
// State hooks: read node fields, write uniforms and pipeline state.

fn root_state(
    _node: &SceneNode,
    bag: &mut DrawStateBag,
    surface: &mut dyn DrawSurface,
) -> Result<(), String> {
    surface.clear([0.0, 0.0, 0.0, 1.0]);
    surface.set_cull(true);
    surface.set_blend(true);
    surface.set_depth(false, false);
    bag.set_vec3(uniforms::LIGHT_COLOR, [1.0, 1.0, 1.0]);
    bag.set_vec3(uniforms::AMBIENT_LIGHT_COLOR, [0.1, 0.1, 0.1]);
    Ok(())
}

fn starfield_state(
    node: &SceneNode,
    bag: &mut DrawStateBag,
    surface: &mut dyn DrawSurface,
) -> Result<(), String> {
    surface.use_program("texture")?;
    bag.set_texture(uniforms::TEXTURE_SAMPLER, "starfield");
    bag.set_float(uniforms::OUTPUT_ALPHA, node.alpha);
    Ok(())
}

fn bright_stars_state(
    node: &SceneNode,
    bag: &mut DrawStateBag,
    surface: &mut dyn DrawSurface,
) -> Result<(), String> {
    surface.use_program("stars")?;
    bag.set_float(uniforms::OUTPUT_ALPHA, node.alpha);
    Ok(())
}

fn constellations_state(
    node: &SceneNode,
    bag: &mut DrawStateBag,
    surface: &mut dyn DrawSurface,
) -> Result<(), String> {
    surface.use_program("overlay")?;
    bag.set_texture(uniforms::TEXTURE_SAMPLER, "constellations");
    bag.set_float(uniforms::OUTPUT_ALPHA, node.alpha);
    Ok(())
}

fn sun_disk_state(
    node: &SceneNode,
    bag: &mut DrawStateBag,
    surface: &mut dyn DrawSurface,
) -> Result<(), String> {
    surface.use_program("color")?;
    // Warm white, 0-255 scale.
    bag.set_vec3(uniforms::MODEL_COLOR, [255.0, 241.0, 234.0]);
    bag.set_float(uniforms::OUTPUT_ALPHA, node.alpha);
    Ok(())
}

fn world_state(
    _node: &SceneNode,
    _bag: &mut DrawStateBag,
    surface: &mut dyn DrawSurface,
) -> Result<(), String> {
    // Everything under the world occludes normally; the backdrop
    // layers above drew without depth.
    surface.set_depth(true, true);
    Ok(())
}

fn plate_carree_state(
    node: &SceneNode,
    bag: &mut DrawStateBag,
    surface: &mut dyn DrawSurface,
) -> Result<(), String> {
    surface.use_program("hardlight")?;
    bag.set_texture(uniforms::TEXTURE_SAMPLER, "earth-plate-carree");
    bag.set_vec3(uniforms::MODEL_COLOR, [1.0, 1.0, 1.0]);
    bag.set_float(uniforms::AMBIENT_CONTRIBUTION, 0.5);
    bag.set_float(uniforms::DIFFUSE_CONTRIBUTION, 0.5);
    bag.set_float(uniforms::OUTPUT_ALPHA, node.alpha);
    Ok(())
}

fn earth_state(
    node: &SceneNode,
    bag: &mut DrawStateBag,
    surface: &mut dyn DrawSurface,
) -> Result<(), String> {
    surface.use_program("earth")?;
    bag.set_texture(uniforms::DAY_TX_SAMPLER, "earth-day");
    bag.set_texture(uniforms::NIGHT_TX_SAMPLER, "earth-night");
    bag.set_texture(uniforms::SPECULAR_MAP_TX_SAMPLER, "earth-specular-map");
    bag.set_float(uniforms::OUTPUT_ALPHA, node.alpha);
    Ok(())
}

fn clouds_state(
    node: &SceneNode,
    bag: &mut DrawStateBag,
    surface: &mut dyn DrawSurface,
) -> Result<(), String> {
    surface.use_program("clouds")?;
    bag.set_texture(uniforms::TEXTURE_SAMPLER, "clouds");
    bag.set_float(uniforms::OUTPUT_ALPHA, node.alpha);
    Ok(())
}

fn atmosphere_state(
    node: &SceneNode,
    bag: &mut DrawStateBag,
    surface: &mut dyn DrawSurface,
) -> Result<(), String> {
    surface.use_program("atmosphere")?;
    bag.set_float(
        uniforms::ATMOSPHERE_DEPTH,
        ATMOSPHERE_LAYER_KM / EARTH_RADIUS_KM,
    );
    bag.set_float(uniforms::OUTPUT_ALPHA, node.alpha);
    Ok(())
}

fn moon_surface_state(
    node: &SceneNode,
    bag: &mut DrawStateBag,
    surface: &mut dyn DrawSurface,
) -> Result<(), String> {
    surface.use_program("basic-texture")?;
    bag.set_texture(uniforms::TEXTURE_SAMPLER, "moon");
    bag.set_vec3(uniforms::MODEL_COLOR, [1.0, 1.0, 1.0]);
    bag.set_float(uniforms::AMBIENT_CONTRIBUTION, 0.05);
    bag.set_float(uniforms::DIFFUSE_CONTRIBUTION, 1.25);
    bag.set_float(uniforms::SPECULAR_CONTRIBUTION, 0.05);
    bag.set_float(uniforms::SPECULAR_EXPONENT, 8.0);
    bag.set_float(uniforms::OUTPUT_ALPHA, node.alpha);
    Ok(())
}

fn satellites_state(
    node: &SceneNode,
    bag: &mut DrawStateBag,
    surface: &mut dyn DrawSurface,
) -> Result<(), String> {
    surface.use_program("basic")?;
    bag.set_vec3(uniforms::MODEL_COLOR, [0.9, 0.9, 0.95]);
    bag.set_float(uniforms::AMBIENT_CONTRIBUTION, 0.2);
    bag.set_float(uniforms::DIFFUSE_CONTRIBUTION, 1.0);
    bag.set_float(uniforms::OUTPUT_ALPHA, node.alpha);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewFlags;

    #[derive(Default)]
    struct StubSurface {
        programs: Vec<String>,
        draws: Vec<String>,
    }

    impl DrawSurface for StubSurface {
        fn set_depth(&mut self, _test: bool, _mask: bool) {}
        fn set_blend(&mut self, _on: bool) {}
        fn set_cull(&mut self, _on: bool) {}
        fn clear(&mut self, _color: [f64; 4]) {}
        fn use_program(&mut self, name: &str) -> Result<(), String> {
            self.programs.push(name.to_string());
            Ok(())
        }
        fn draw_mesh(&mut self, name: &str, _bag: &DrawStateBag) -> Result<(), String> {
            self.draws.push(name.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_scene_shape() {
        let (scene, handles) = build_scene().unwrap();
        // Lookup finds the cloud layer, not the atmosphere that shares
        // its name.
        assert_eq!(scene.lookup("clouds").unwrap(), handles.clouds);
        assert_ne!(handles.clouds, handles.atmosphere);
        assert_eq!(scene.node(handles.atmosphere).name, "clouds");
        assert!((scene.node(handles.clouds).alpha - 0.90).abs() < 1.0e-12);
        assert!((scene.node(handles.atmosphere).alpha - 0.5).abs() < 1.0e-12);
        assert!(!scene.node(scene.lookup("plate-carree").unwrap()).enabled);
        assert_eq!(
            scene.node(handles.satellites).children.len(),
            default_constellation().total_sats
        );
    }

    #[test]
    fn test_full_frame_draw_sequence() {
        let (mut scene, handles) = build_scene().unwrap();
        let mut behaviors = BehaviorRegistry::new();
        register_behaviors(&mut behaviors, &handles);

        let mut bag = DrawStateBag::new();
        behaviors.update_all(1234.5, &mut scene, &mut bag);
        assert!(bag.vec3(uniforms::LIGHT_DIRECTION).is_some());

        let mut surface = StubSurface::default();
        scene.traverse(handles.root, &mut bag, &mut surface).unwrap();

        // Backdrop, sun, earth stack, moon, then the constellation.
        let expected_head =
            ["ball", "bright-stars", "ball", "sphere2", "ball", "ball", "ball", "ball-small"];
        assert_eq!(&surface.draws[..8], &expected_head);
        assert_eq!(
            surface.draws.len(),
            8 + default_constellation().total_sats
        );
        assert!(surface.draws[8..].iter().all(|m| m == "cylinder"));
        // The disabled plate-carree never selected its program.
        assert!(!surface.programs.iter().any(|p| p == "hardlight"));
    }

    #[test]
    fn test_behaviors_idempotent_on_full_scene() {
        let (mut scene, handles) = build_scene().unwrap();
        let mut behaviors = BehaviorRegistry::new();
        register_behaviors(&mut behaviors, &handles);

        let mut bag = DrawStateBag::new();
        behaviors.update_all(987.123, &mut scene, &mut bag);
        let world_first = scene.node(handles.world).transform;
        let moon_first = scene.node(handles.moon).transform;
        behaviors.update_all(987.123, &mut scene, &mut bag);
        assert_eq!(scene.node(handles.world).transform, world_first);
        assert_eq!(scene.node(handles.moon).transform, moon_first);
    }

    #[test]
    fn test_world_rotation_tracks_gmst() {
        let (mut scene, handles) = build_scene().unwrap();
        let mut bag = DrawStateBag::new();
        let t = 6100.625;
        world_update(t, handles.world, &mut scene, &mut bag);
        let expected = Matrix4::new_rotation(Vector3::y() * gmst_degrees(t).to_radians());
        assert_eq!(scene.node(handles.world).transform, expected);
    }

    #[test]
    fn test_moon_behavior_places_moon_at_series_position() {
        let (mut scene, handles) = build_scene().unwrap();
        let mut bag = DrawStateBag::new();
        let t = 42.0;
        moon_update(t, handles.moon, &mut scene, &mut bag);
        let moon = ephemeris::moon_state(t);
        let m = scene.node(handles.moon).transform;
        assert!((m[(0, 3)] - moon.position.x).abs() < 1.0e-12);
        assert!((m[(1, 3)] - moon.position.y).abs() < 1.0e-12);
        assert!((m[(2, 3)] - moon.position.z).abs() < 1.0e-12);
    }

    #[test]
    fn test_wrap_position() {
        assert_eq!(wrap_position(0.25), 0.25);
        assert_eq!(wrap_position(1.5), -0.5);
        assert_eq!(wrap_position(-1.5), 0.5);
        // The wrap lands on the closed end of (-1, 1].
        assert_eq!(wrap_position(1.0), 1.0);
        assert_eq!(wrap_position(-1.0), 1.0);
        assert_eq!(wrap_position(3.0), 1.0);
    }

    #[test]
    fn test_free_orbit_rig_geometry() {
        // Wide open: 60 degree fov, full star visibility.
        let rig = free_orbit_rig([0.0, 0.0], 0.0, 100.0, 16.0 / 9.0);
        let eye = nalgebra::Point3::new(
            rig.camera_position[0],
            rig.camera_position[1],
            rig.camera_position[2],
        );
        // The eye maps to the view-space origin, the origin sits ahead.
        let mapped = rig.view.transform_point(&eye);
        assert!(mapped.coords.norm() < 1.0e-9);
        let origin = rig.view.transform_point(&nalgebra::Point3::origin());
        assert!(origin.z < 0.0);

        // Zoomed all the way in, the fov collapses and the stars fade.
        assert!(star_visibility(100.0).abs() < 1.0e-12);
        assert!((star_visibility(0.0) - 1.0).abs() < 1.0e-12);
    }

    #[test]
    fn test_preset_rig_resolves_bodies() {
        let (mut scene, handles) = build_scene().unwrap();
        let mut behaviors = BehaviorRegistry::new();
        register_behaviors(&mut behaviors, &handles);
        let mut bag = DrawStateBag::new();
        behaviors.update_all(100.0, &mut scene, &mut bag);

        let preset = CameraPreset::parse("moon;earth;sun;45").unwrap();
        let rig = preset_rig(&scene, handles.root, &preset, 1.6).unwrap();
        // Standing on the moon: the eye is the moon's origin, and the
        // earth (scene origin) sits ahead of the camera.
        let moon = ephemeris::moon_state(100.0);
        assert!((rig.camera_position[0] - moon.position.x).abs() < 1.0e-9);
        let origin = rig.view.transform_point(&nalgebra::Point3::origin());
        assert!(origin.z < 0.0);

        let bad = CameraPreset::parse("moon;earth;nebula;45").unwrap();
        assert!(preset_rig(&scene, handles.root, &bad, 1.6).is_err());
    }

    #[test]
    fn test_view_flags_gate_layers() {
        let (scene, handles) = build_scene().unwrap();
        let mut app_scene = scene;
        // Drive the flag application directly through a fake app state.
        let mut flags = ViewFlags::default();
        flags.satellites = false;
        flags.clouds = false;
        app_scene.node_mut(handles.satellites).enabled = flags.satellites;
        app_scene.node_mut(handles.clouds).enabled = flags.clouds;

        let mut bag = DrawStateBag::new();
        let mut surface = StubSurface::default();
        app_scene
            .traverse(handles.root, &mut bag, &mut surface)
            .unwrap();
        assert!(surface.draws.iter().all(|m| m != "cylinder"));
        assert!(!surface.programs.iter().any(|p| p == "clouds"));
    }
}
