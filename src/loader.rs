//! Staged asset loading pipeline.
//!
//! Loading runs as an explicit state machine instead of nested
//! completion callbacks: shaders are staged, programs linked, textures
//! decoded, and only then is the scene built. `advance` is called once
//! per frame until the pipeline settles; texture files decode on a
//! worker thread and are drained over a channel. A missing or corrupt
//! texture degrades to a built-in placeholder with a status note, so
//! the scene still renders.

use eframe::glow;
use std::collections::HashSet;
use std::sync::mpsc;

use crate::renderer::Renderer;
use crate::shaders;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LoadStage {
    Unloaded,
    ShadersLoaded,
    ProgramsLinked,
    TexturesLoaded,
    SceneBuilt,
}

pub struct DecodedTexture {
    pub width: u32,
    pub height: u32,
    /// RGBA, row-major.
    pub pixels: Vec<u8>,
}

// Body textures get mipmaps; the sphere-interior backdrops do not.
const MIPMAPPED_TEXTURES: [&str; 5] =
    ["clouds", "earth-day", "earth-night", "earth-specular-map", "moon"];
const PLAIN_TEXTURES: [&str; 3] = ["starfield", "constellations", "earth-plate-carree"];

pub struct Loader {
    stage: LoadStage,
    pending: HashSet<String>,
    results: Option<mpsc::Receiver<(String, Result<DecodedTexture, String>)>>,
    /// Degraded-load notes for the status panel.
    pub notes: Vec<String>,
}

impl Loader {
    pub fn new() -> Self {
        Self {
            stage: LoadStage::Unloaded,
            pending: HashSet::new(),
            results: None,
            notes: Vec::new(),
        }
    }

    pub fn stage(&self) -> LoadStage {
        self.stage
    }

    pub fn status_line(&self) -> String {
        match self.stage {
            LoadStage::Unloaded => "staging shaders...".to_string(),
            LoadStage::ShadersLoaded => "linking programs...".to_string(),
            LoadStage::ProgramsLinked => {
                format!("decoding textures ({} outstanding)...", self.pending.len())
            }
            LoadStage::TexturesLoaded => "building scene...".to_string(),
            LoadStage::SceneBuilt => "ready".to_string(),
        }
    }

    /// Advance by at most one stage. Called once per frame until the
    /// pipeline reaches `TexturesLoaded`; the app then builds the scene
    /// and calls [`Loader::mark_scene_built`].
    pub fn advance(&mut self, gl: &glow::Context, renderer: &mut Renderer) {
        match self.stage {
            LoadStage::Unloaded => {
                // Sources are compiled in; staging them is a formality
                // kept so each entry precondition stays explicit.
                assert!(!shaders::PROGRAMS.is_empty());
                self.stage = LoadStage::ShadersLoaded;
            }
            LoadStage::ShadersLoaded => {
                renderer.compile_standard_programs(gl);
                self.stage = LoadStage::ProgramsLinked;
            }
            LoadStage::ProgramsLinked => {
                if self.results.is_none() {
                    self.spawn_decoder();
                }
                self.drain_results(gl, renderer);
                if self.pending.is_empty() {
                    self.results = None;
                    self.stage = LoadStage::TexturesLoaded;
                }
            }
            LoadStage::TexturesLoaded | LoadStage::SceneBuilt => {}
        }
    }

    pub fn mark_scene_built(&mut self) {
        assert_eq!(self.stage, LoadStage::TexturesLoaded);
        self.stage = LoadStage::SceneBuilt;
    }

    fn spawn_decoder(&mut self) {
        let names: Vec<&str> = MIPMAPPED_TEXTURES
            .iter()
            .chain(PLAIN_TEXTURES.iter())
            .copied()
            .collect();
        self.pending = names.iter().map(|n| n.to_string()).collect();

        let (tx, rx) = mpsc::channel();
        self.results = Some(rx);
        std::thread::spawn(move || {
            for name in names {
                let path = asset_path(&format!("assets/textures/{name}.png"));
                let result = decode_texture_file(&path);
                if tx.send((name.to_string(), result)).is_err() {
                    break;
                }
            }
        });
    }

    fn drain_results(&mut self, gl: &glow::Context, renderer: &mut Renderer) {
        let Some(rx) = &self.results else { return };
        loop {
            match rx.try_recv() {
                Ok((name, result)) => {
                    self.pending.remove(&name);
                    let mipmap = MIPMAPPED_TEXTURES.contains(&name.as_str());
                    match result {
                        Ok(tex) => {
                            renderer
                                .upload_texture(gl, &name, tex.width, tex.height, &tex.pixels, mipmap);
                        }
                        Err(message) => {
                            let tex = placeholder_texture();
                            renderer
                                .upload_texture(gl, &name, tex.width, tex.height, &tex.pixels, false);
                            self.notes.push(format!("texture '{name}': {message}"));
                        }
                    }
                }
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    // Worker gone; anything still pending degrades.
                    for name in std::mem::take(&mut self.pending) {
                        let tex = placeholder_texture();
                        renderer
                            .upload_texture(gl, &name, tex.width, tex.height, &tex.pixels, false);
                        self.notes.push(format!("texture '{name}': decoder exited early"));
                    }
                    break;
                }
            }
        }
    }
}

pub(crate) fn asset_path(relative: &str) -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(relative)
}

pub fn decode_texture_file(path: &std::path::Path) -> Result<DecodedTexture, String> {
    let bytes =
        std::fs::read(path).map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    let img = image::load_from_memory(&bytes)
        .map_err(|e| format!("failed to decode {}: {e}", path.display()))?
        .to_rgba8();
    Ok(DecodedTexture {
        width: img.width(),
        height: img.height(),
        pixels: img.into_raw(),
    })
}

/// Neutral gray stand-in for a texture that failed to load.
pub fn placeholder_texture() -> DecodedTexture {
    DecodedTexture {
        width: 2,
        height: 2,
        pixels: vec![128, 128, 128, 255].repeat(4),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_ordering() {
        assert!(LoadStage::Unloaded < LoadStage::ShadersLoaded);
        assert!(LoadStage::ShadersLoaded < LoadStage::ProgramsLinked);
        assert!(LoadStage::ProgramsLinked < LoadStage::TexturesLoaded);
        assert!(LoadStage::TexturesLoaded < LoadStage::SceneBuilt);
    }

    #[test]
    fn test_texture_lists_are_disjoint() {
        for name in MIPMAPPED_TEXTURES {
            assert!(!PLAIN_TEXTURES.contains(&name));
        }
    }

    #[test]
    fn test_missing_file_is_an_error_not_a_panic() {
        let result = decode_texture_file(std::path::Path::new("assets/textures/nope.png"));
        assert!(result.is_err());
    }

    #[test]
    fn test_placeholder_is_rgba() {
        let tex = placeholder_texture();
        assert_eq!(tex.pixels.len(), (tex.width * tex.height * 4) as usize);
    }

    #[test]
    fn test_new_loader_reports_unloaded() {
        let loader = Loader::new();
        assert_eq!(loader.stage(), LoadStage::Unloaded);
        assert!(loader.status_line().contains("shaders"));
    }
}
