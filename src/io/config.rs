use crate::core::rasterizer::CullMode;
use crate::error::AssetError;
use log::warn;
use nalgebra::{Vector2, Vector3};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Everything the game reads from its TOML file. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub light: LightConfig,
    #[serde(default)]
    pub game: GameConfig,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| AssetError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    // --- Output & Quality ---
    #[serde(default = "default_width")]
    pub width: usize,
    #[serde(default = "default_height")]
    pub height: usize,
    #[serde(default = "default_samples")]
    pub samples: usize,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    // --- Run Length ---
    #[serde(default = "default_frames")]
    pub frames: usize,
    /// Save every n-th frame; 0 saves only the last one.
    #[serde(default = "default_capture_every")]
    pub capture_every: usize,

    // --- Pipeline & Debug ---
    #[serde(default = "default_cull_mode")]
    pub cull_mode: String, // "back", "front", "none"
    #[serde(default = "default_clear_color")]
    pub clear_color: [f32; 3],
    #[serde(default = "default_false")]
    pub draw_light: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            samples: default_samples(),
            output_dir: default_output_dir(),
            frames: default_frames(),
            capture_every: default_capture_every(),
            cull_mode: default_cull_mode(),
            clear_color: default_clear_color(),
            draw_light: false,
        }
    }
}

impl RenderConfig {
    pub fn cull_mode(&self) -> CullMode {
        match self.cull_mode.to_ascii_lowercase().as_str() {
            "back" => CullMode::Back,
            "front" => CullMode::Front,
            "none" => CullMode::None,
            other => {
                warn!("unknown cull mode '{}', culling disabled", other);
                CullMode::None
            }
        }
    }

    pub fn clear_color(&self) -> Vector3<f32> {
        Vector3::from(self.clear_color)
    }
}

fn default_width() -> usize {
    800
}
fn default_height() -> usize {
    600
}
fn default_samples() -> usize {
    1
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("frames")
}
fn default_frames() -> usize {
    300
}
fn default_capture_every() -> usize {
    30
}
fn default_cull_mode() -> String {
    "none".to_string()
}
fn default_clear_color() -> [f32; 3] {
    [0.0, 0.0, 0.0]
}
fn default_false() -> bool {
    false
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "default_camera_position")]
    pub position: [f32; 3],
    /// Vertical field of view in degrees.
    #[serde(default = "default_fov")]
    pub fov: f32,
    #[serde(default = "default_near")]
    pub near: f32,
    #[serde(default = "default_far")]
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: default_camera_position(),
            fov: default_fov(),
            near: default_near(),
            far: default_far(),
        }
    }
}

impl CameraConfig {
    pub fn position(&self) -> Vector3<f32> {
        Vector3::from(self.position)
    }
}

fn default_camera_position() -> [f32; 3] {
    [0.0, 4.0, 30.0]
}
fn default_fov() -> f32 {
    45.0
}
fn default_near() -> f32 {
    0.1
}
fn default_far() -> f32 {
    100.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct LightConfig {
    #[serde(default = "default_light_position")]
    pub position: [f32; 3],
    #[serde(default = "default_light_color")]
    pub color: [f32; 3],
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            position: default_light_position(),
            color: default_light_color(),
        }
    }
}

fn default_light_position() -> [f32; 3] {
    [0.0, 10.0, 0.0]
}
fn default_light_color() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameConfig {
    // --- Rules ---
    /// Enemy velocity along x, in units per second.
    #[serde(default = "default_enemy_speed")]
    pub enemy_speed: f32,
    #[serde(default = "default_enemy_start")]
    pub enemy_start: [f32; 3],
    /// The enemy wraps back to `enemy_start` once its x reaches this.
    #[serde(default = "default_enemy_reset_x")]
    pub enemy_reset_x: f32,
    #[serde(default = "default_jump_impulse")]
    pub jump_impulse: f32,
    #[serde(default = "default_gravity")]
    pub gravity: f32,
    /// Simulation step of the headless loop, in seconds.
    #[serde(default = "default_time_step")]
    pub time_step: f32,
    /// Jump automatically when the enemy gets close.
    #[serde(default = "default_false")]
    pub autopilot: bool,

    // --- Assets ---
    pub hero_texture: Option<PathBuf>,
    pub ground_texture: Option<PathBuf>,
    pub enemy_texture: Option<PathBuf>,
    pub font: Option<PathBuf>,

    // --- Score Text ---
    #[serde(default = "default_text_position")]
    pub text_position: [f32; 2],
    #[serde(default = "default_text_size")]
    pub text_size: f32,
    #[serde(default = "default_text_color")]
    pub text_color: [f32; 3],
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            enemy_speed: default_enemy_speed(),
            enemy_start: default_enemy_start(),
            enemy_reset_x: default_enemy_reset_x(),
            jump_impulse: default_jump_impulse(),
            gravity: default_gravity(),
            time_step: default_time_step(),
            autopilot: false,
            hero_texture: None,
            ground_texture: None,
            enemy_texture: None,
            font: None,
            text_position: default_text_position(),
            text_size: default_text_size(),
            text_color: default_text_color(),
        }
    }
}

impl GameConfig {
    pub fn enemy_start(&self) -> Vector3<f32> {
        Vector3::from(self.enemy_start)
    }

    pub fn text_position(&self) -> Vector2<f32> {
        Vector2::from(self.text_position)
    }
}

fn default_enemy_speed() -> f32 {
    -15.0
}
fn default_enemy_start() -> [f32; 3] {
    [18.0, 1.0, 0.0]
}
fn default_enemy_reset_x() -> f32 {
    -18.0
}
fn default_jump_impulse() -> f32 {
    100.0
}
fn default_gravity() -> f32 {
    -9.8
}
fn default_time_step() -> f32 {
    1.0 / 60.0
}
fn default_text_position() -> [f32; 2] {
    [320.0, 500.0]
}
fn default_text_size() -> f32 {
    64.0
}
fn default_text_color() -> [f32; 3] {
    [1.0, 0.0, 0.0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_the_game_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.render.width, 800);
        assert_eq!(config.camera.position, [0.0, 4.0, 30.0]);
        assert_eq!(config.light.position, [0.0, 10.0, 0.0]);
        assert_eq!(config.game.enemy_speed, -15.0);
        assert_eq!(config.render.cull_mode(), CullMode::None);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = Config::parse(
            r#"
            [render]
            width = 320
            cull_mode = "Back"

            [game]
            autopilot = true
            font = "assets/font.ttf"
            "#,
        )
        .unwrap();
        assert_eq!(config.render.width, 320);
        assert_eq!(config.render.height, 600);
        assert_eq!(config.render.cull_mode(), CullMode::Back);
        assert!(config.game.autopilot);
        assert_eq!(config.game.font, Some(PathBuf::from("assets/font.ttf")));
        assert_eq!(config.game.jump_impulse, 100.0);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(Config::parse("[render\nwidth = 1").is_err());
    }
}
