use glam::{UVec2, Vec2};
use serde::{Deserialize, Serialize};

/// Physical geometry of a head-mounted display.
///
/// Defaults describe a first-generation 7" development kit panel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HmdInfo {
    /// Panel resolution in pixels.
    pub resolution: UVec2,
    /// Panel size in meters.
    pub physical_screen_size: Vec2,
    /// Distance between the two lens centers, in meters.
    pub physical_lens_separation: f32,
    /// Eye-to-panel distance, in meters.
    pub eye_to_screen_distance: f32,
    /// Radial distortion polynomial used by the presenter's warp pass.
    pub distortion_coefficients: [f32; 4],
}

impl Default for HmdInfo {
    fn default() -> Self {
        Self {
            resolution: UVec2::new(1280, 800),
            physical_screen_size: Vec2::new(0.149_76, 0.0935),
            physical_lens_separation: 0.064,
            eye_to_screen_distance: 0.041,
            distortion_coefficients: [1.0, 0.22, 0.24, 0.0],
        }
    }
}

impl HmdInfo {
    pub fn screen_aspect_ratio(&self) -> f32 {
        self.resolution.x as f32 / self.resolution.y as f32
    }

    /// Horizontal offset of each lens center from the center of its half of the panel,
    /// in normalized `[-1, 1]` viewport units of that half.
    pub fn lens_x_center_offset(&self) -> f32 {
        let half_view_center = self.physical_screen_size.x * 0.25;
        let offset = half_view_center - self.physical_lens_separation * 0.5;
        4.0 * offset / self.physical_screen_size.x
    }
}
