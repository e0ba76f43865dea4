//! View configuration: layer toggles, camera presets, slider state.

/// Per-layer visibility toggles from the side panel.
#[derive(Clone, Copy)]
pub struct ViewFlags {
    pub stars: bool,
    pub constellations: bool,
    pub clouds: bool,
    pub atmosphere: bool,
    pub satellites: bool,
}

impl Default for ViewFlags {
    fn default() -> Self {
        Self {
            stars: true,
            constellations: true,
            clouds: true,
            atmosphere: true,
            satellites: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMode {
    FreeOrbit,
    /// Index into [`camera_presets`].
    Preset(usize),
}

/// A fixed viewpoint: stand at one body, look at another, with a third
/// body's direction steadying the roll.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraPreset {
    pub from: String,
    pub to: String,
    pub up: String,
    pub default_fov_deg: f64,
}

impl CameraPreset {
    /// Parse the compact `from;to;up;fov` form the preset table uses.
    pub fn parse(text: &str) -> Result<Self, String> {
        let parts: Vec<&str> = text.split(';').collect();
        let [from, to, up, fov] = parts.as_slice() else {
            return Err(format!("camera preset '{text}' must have four ';' fields"));
        };
        let default_fov_deg: f64 = fov
            .trim()
            .parse()
            .map_err(|_| format!("camera preset '{text}' has a bad field of view"))?;
        if !(0.0..=180.0).contains(&default_fov_deg) {
            return Err(format!("camera preset '{text}' field of view out of range"));
        }
        Ok(Self {
            from: from.trim().to_string(),
            to: to.trim().to_string(),
            up: up.trim().to_string(),
            default_fov_deg,
        })
    }
}

const CAMERA_PRESET_SPECS: [(&str, &str); 3] = [
    ("Moon, looking at Earth", "moon;earth;sun;45"),
    ("Sun, looking at Earth", "sun;earth;moon;1"),
    ("Earth, looking at Moon", "earth;moon;sun;5"),
];

pub fn camera_presets() -> Vec<(&'static str, CameraPreset)> {
    CAMERA_PRESET_SPECS
        .iter()
        .map(|(label, spec)| {
            // The table is compiled in; a parse failure is a build defect.
            let preset = CameraPreset::parse(spec)
                .unwrap_or_else(|e| panic!("bad built-in camera preset: {e}"));
            (*label, preset)
        })
        .collect()
}

/// Everything the side panel edits.
pub struct ViewConfig {
    pub flags: ViewFlags,
    pub camera: CameraMode,
    /// Free-orbit travel slider, 0 (wide) to 100 (zoomed in).
    pub fov_travel: f64,
    /// Preset-camera framing slider, 0 to 100.
    pub framing: f64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            flags: ViewFlags::default(),
            camera: CameraMode::FreeOrbit,
            fov_travel: 0.0,
            framing: 50.0,
        }
    }
}
