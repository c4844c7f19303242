use std::path::PathBuf;

use egui::Color32;
use serde::{Deserialize, Serialize};

use crate::geometry::clamp_unit;

/// Placement of a panel relative to the preview panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Seat {
    Top,
    Left,
    Right,
    Bottom,
}

impl Seat {
    /// True for seats whose strip scrolls vertically.
    pub fn is_vertical(self) -> bool {
        matches!(self, Seat::Left | Seat::Right)
    }
}

/// Interaction mode of the magnifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LensMode {
    /// Hover-tracking mask, magnified view rendered beside the preview.
    Normal,
    /// Magnified view overlays the preview image itself.
    Inside,
    /// Mask is dragged explicitly instead of following the pointer.
    Drag,
}

/// Declared box of one panel. A width/height of 0 means "unset" and lets the
/// layout derive a value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelStyle {
    pub width: f32,
    pub height: f32,
    pub top: f32,
    pub left: f32,
    pub border: f32,
    pub border_color: String,
    pub padding: f32,
}

impl Default for PanelStyle {
    fn default() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            top: 0.0,
            left: 0.0,
            border: 0.0,
            border_color: String::new(),
            padding: 0.0,
        }
    }
}

impl PanelStyle {
    fn sized(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn size(&self) -> egui::Vec2 {
        egui::vec2(self.width, self.height)
    }

    pub fn position(&self) -> egui::Vec2 {
        egui::vec2(self.left, self.top)
    }

    pub fn stroke_color(&self) -> Color32 {
        parse_css_color(&self.border_color).unwrap_or(Color32::from_gray(60))
    }
}

/// Border drawn around the checked thumbnail.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BorderSpec {
    pub width: f32,
    pub color: String,
}

impl Default for BorderSpec {
    fn default() -> Self {
        Self {
            width: 1.0,
            color: "#666".to_string(),
        }
    }
}

/// Decay factors and rest thresholds for the strip's inertia and snap-back
/// animations. Empirically tuned; exposed rather than hard-coded.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct StripTuning {
    pub inertia_decay: f32,
    pub adsorb_decay: f32,
    pub inertia_rest: f32,
    pub adsorb_rest: f32,
}

impl Default for StripTuning {
    fn default() -> Self {
        Self {
            inertia_decay: 0.9,
            adsorb_decay: 0.5,
            inertia_rest: 1.2,
            adsorb_rest: 0.5,
        }
    }
}

/// Full configuration surface of the magnifier widget.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LensOptions {
    /// Link mask and zoom sizing through `zoom_scale`.
    pub correlate: bool,
    /// Mask-to-zoom size ratio basis, in [0, 1]; the effective factor is ×10.
    pub zoom_scale: f32,
    /// When true the zoom box is size-authoritative and the mask follows.
    pub zoom_resize: bool,
    pub zoom_seat: Seat,
    pub pics_seat: Seat,
    pub dot_gap: f32,
    pub dot_size: [f32; 2],
    pub dot_color: String,
    /// Spacing between strip items.
    pub img_gap: f32,
    /// Inertia tick interval basis, in [0, 1]; the tick is ×100 ms.
    pub pics_speed: f32,
    /// Adsorption tick interval basis, in [0, 1]; the tick is ×100 ms.
    pub adsorb_speed: f32,
    pub img_border: BorderSpec,
    pub mode: LensMode,
    pub tuning: StripTuning,
    pub mmoc: PanelStyle,
    pub zoom: PanelStyle,
    pub mask: PanelStyle,
    pub pics: PanelStyle,
}

impl Default for LensOptions {
    fn default() -> Self {
        Self {
            correlate: true,
            zoom_scale: 0.38,
            zoom_resize: false,
            zoom_seat: Seat::Right,
            pics_seat: Seat::Bottom,
            dot_gap: 1.0,
            dot_size: [1.0, 1.0],
            dot_color: "#36c".to_string(),
            img_gap: 10.0,
            pics_speed: 0.2,
            adsorb_speed: 0.2,
            img_border: BorderSpec::default(),
            mode: LensMode::Normal,
            tuning: StripTuning::default(),
            mmoc: PanelStyle {
                border: 1.0,
                border_color: "#222".to_string(),
                ..PanelStyle::sized(300.0, 200.0)
            },
            zoom: PanelStyle::default(),
            mask: PanelStyle::sized(80.0, 80.0),
            pics: PanelStyle::default(),
        }
    }
}

impl LensOptions {
    /// Clamp the ratio-style settings into their legal range. Applied once
    /// when the widget is constructed.
    pub fn normalized(mut self) -> Self {
        self.zoom_scale = clamp_unit(self.zoom_scale);
        self.pics_speed = clamp_unit(self.pics_speed);
        self.adsorb_speed = clamp_unit(self.adsorb_speed);
        self
    }

    pub fn dot_fill(&self) -> Color32 {
        parse_css_color(&self.dot_color).unwrap_or(Color32::from_rgb(0x33, 0x66, 0xcc))
    }

    pub fn border_fill(&self) -> Color32 {
        parse_css_color(&self.img_border.color).unwrap_or(Color32::from_gray(0x66))
    }
}

/// Parse a CSS-style hex color (`#rgb` or `#rrggbb`).
pub fn parse_css_color(s: &str) -> Option<Color32> {
    let hex = s.trim().strip_prefix('#')?;
    let digit = |c: u8| (c as char).to_digit(16).map(|d| d as u8);
    match hex.len() {
        3 => {
            let b = hex.as_bytes();
            let (r, g, b) = (digit(b[0])?, digit(b[1])?, digit(b[2])?);
            Some(Color32::from_rgb(r * 17, g * 17, b * 17))
        }
        6 => {
            let b = hex.as_bytes();
            let pair = |i: usize| Some(digit(b[i])? * 16 + digit(b[i + 1])?);
            Some(Color32::from_rgb(pair(0)?, pair(2)?, pair(4)?))
        }
        _ => None,
    }
}

/// Persisted application settings, including the widget options.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window_width: Option<f32>,
    pub window_height: Option<f32>,
    pub lens: Option<LensOptions>,
}

impl AppConfig {
    /// Returns the user config file path, if a config directory is available.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("loupe").join("config.toml"))
    }

    /// Loads config from disk, falling back to defaults on any error.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        let Ok(contents) = std::fs::read_to_string(&path) else {
            return Self::default();
        };
        toml::from_str(&contents).unwrap_or_default()
    }

    /// Writes config to disk, ignoring filesystem/serialization errors.
    pub fn save(&self) {
        let Some(path) = Self::config_path() else {
            return;
        };
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Ok(s) = toml::to_string_pretty(self) {
            let _ = std::fs::write(&path, s);
        }
    }
}
