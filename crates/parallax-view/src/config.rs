use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hmd::HmdInfo;
use crate::overlay::{GuiMode, GuiPresets, HudMode, HudPresets};
use crate::{DEFAULT_CONVERGENCE, DEFAULT_WORLD_SCALE, IPD_DEFAULT};

/// How the stereo pair is presented to the viewer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StereoMode {
    Disabled,
    Anaglyph,
    #[default]
    SideBySide,
    OverUnder,
    InterleavedRows,
    DiyRift,
    OculusRift,
    OculusRiftCropped,
}

impl StereoMode {
    /// Head-mounted modes whose projections are re-centered on the physical lens.
    pub fn is_hmd(self) -> bool {
        matches!(
            self,
            StereoMode::DiyRift | StereoMode::OculusRift | StereoMode::OculusRiftCropped
        )
    }

    fn parse(raw: &str) -> Option<Self> {
        Some(match raw {
            "disabled" => Self::Disabled,
            "anaglyph" => Self::Anaglyph,
            "side_by_side" => Self::SideBySide,
            "over_under" => Self::OverUnder,
            "interleaved_rows" => Self::InterleavedRows,
            "diy_rift" => Self::DiyRift,
            "oculus_rift" => Self::OculusRift,
            "oculus_rift_cropped" => Self::OculusRiftCropped,
            _ => return None,
        })
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for env var {0}")]
    InvalidEnv(&'static str),
    #[error("{field} must be finite and positive, got {value}")]
    NotPositive { field: &'static str, value: f32 },
    #[error("convergence bounds are inverted: min {min} > max {max}")]
    InvertedConvergenceBounds { min: f32, max: f32 },
}

/// User-adjustable stereo parameters.
///
/// Loading and persisting this struct is left to the embedding application; it derives serde
/// so any store format works. Missing fields fall back to [`StereoConfig::default`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StereoConfig {
    /// Interpupillary distance in meters.
    pub ipd: f32,
    /// Game units per meter.
    pub world_scale: f32,
    /// Zero-parallax distance in meters.
    pub convergence: f32,
    pub min_convergence: f32,
    pub max_convergence: f32,
    /// Convergence is kept strictly beyond this distance.
    pub near_clip_distance: f32,
    pub roll_enabled: bool,
    pub stereo_mode: StereoMode,
    pub hmd: HmdInfo,
    pub hud_mode: HudMode,
    pub gui_mode: GuiMode,
    pub hud_presets: HudPresets,
    pub gui_presets: GuiPresets,
}

impl Default for StereoConfig {
    fn default() -> Self {
        Self {
            ipd: IPD_DEFAULT,
            world_scale: DEFAULT_WORLD_SCALE,
            convergence: DEFAULT_CONVERGENCE,
            min_convergence: -10.0,
            max_convergence: 10.0,
            near_clip_distance: 1.0,
            roll_enabled: false,
            stereo_mode: StereoMode::default(),
            hmd: HmdInfo::default(),
            hud_mode: HudMode::default(),
            gui_mode: GuiMode::default(),
            hud_presets: HudPresets::default(),
            gui_presets: GuiPresets::default(),
        }
    }
}

impl StereoConfig {
    /// Defaults overridden by `PARALLAX_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`StereoConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let float = |name: &'static str| -> Result<Option<f32>, ConfigError> {
            lookup(name)
                .map(|raw| raw.trim().parse::<f32>().map_err(|_| ConfigError::InvalidEnv(name)))
                .transpose()
        };

        let mut config = Self::default();
        if let Some(ipd) = float("PARALLAX_IPD")? {
            config.ipd = ipd;
        }
        if let Some(scale) = float("PARALLAX_WORLD_SCALE")? {
            config.world_scale = scale;
        }
        if let Some(convergence) = float("PARALLAX_CONVERGENCE")? {
            config.convergence = convergence;
        }
        if let Some(raw) = lookup("PARALLAX_ROLL") {
            config.roll_enabled = match raw.trim() {
                "1" | "true" | "on" => true,
                "0" | "false" | "off" => false,
                _ => return Err(ConfigError::InvalidEnv("PARALLAX_ROLL")),
            };
        }
        if let Some(raw) = lookup("PARALLAX_STEREO_MODE") {
            config.stereo_mode = StereoMode::parse(raw.trim())
                .ok_or(ConfigError::InvalidEnv("PARALLAX_STEREO_MODE"))?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("ipd", self.ipd),
            ("world_scale", self.world_scale),
            ("near_clip_distance", self.near_clip_distance),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NotPositive { field, value });
            }
        }
        if self.min_convergence > self.max_convergence {
            return Err(ConfigError::InvertedConvergenceBounds {
                min: self.min_convergence,
                max: self.max_convergence,
            });
        }
        Ok(())
    }
}
