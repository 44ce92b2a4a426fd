//! Stereo view math: the per-eye projection, view and overlay matrices derived from a
//! [`StereoConfig`], plus the small contracts (head pose, HUD/GUI presets) that feed it.
//!
//! Matrices use glam's column-vector convention. A D3D-style row-vector product `A * B`
//! ("apply `A`, then `B`") is written `B * A` here, and [`glam::Mat4::to_cols_array`]
//! produces the row-major float layout D3D9 transform and constant calls consume.

#![forbid(unsafe_code)]

mod adjustment;
mod config;
mod eye;
mod head;
mod hmd;
mod overlay;
mod projection;

pub use adjustment::ViewAdjustment;
pub use config::{ConfigError, StereoConfig, StereoMode};
pub use eye::Eye;
pub use head::{HeadPose, HeadTracker, NoHeadTracker};
pub use hmd::HmdInfo;
pub use overlay::{GuiMode, GuiPresets, HudMode, HudPresets};
pub use projection::{perspective_off_center_lh, Frustum};

/// Anatomical default interpupillary distance, in meters.
pub const IPD_DEFAULT: f32 = 0.064;

/// Lower bound applied by [`ViewAdjustment::change_world_scale`].
pub const MIN_WORLD_SCALE: f32 = 0.0001;

/// Upper bound applied by [`ViewAdjustment::change_world_scale`].
pub const MAX_WORLD_SCALE: f32 = 1_000_000.0;

/// Value restored by [`ViewAdjustment::reset_world_scale`].
pub const DEFAULT_WORLD_SCALE: f32 = 3.0;

/// Value restored by [`ViewAdjustment::reset_convergence`].
pub const DEFAULT_CONVERGENCE: f32 = 3.0;
