use glam::{Mat4, Vec3};
use tracing::{debug, warn};

use crate::config::{StereoConfig, StereoMode};
use crate::eye::Eye;
use crate::overlay::{GuiMode, HudMode};
use crate::projection::Frustum;
use crate::{
    DEFAULT_CONVERGENCE, DEFAULT_WORLD_SCALE, IPD_DEFAULT, MAX_WORLD_SCALE, MIN_WORLD_SCALE,
};

/// Assumed physical width of the projection window, in meters.
const PHYSICAL_SCREEN_WIDTH: f32 = 1.0;

/// Minimum gap kept between the convergence plane and the near clip distance.
const CONVERGENCE_EPSILON: f32 = 0.001;

/// HUD distance at which the lens-offset correction of shifted HUD matrices vanishes.
const HUD_LENS_CORRECTION_ORIGIN: f32 = 1.5;

/// Per-eye projection, view and overlay matrices derived from a [`StereoConfig`].
///
/// Edits are two-phase: the `change_*` setters for world scale and convergence only mutate
/// configuration. Call [`ViewAdjustment::update_projection_matrices`] and
/// [`ViewAdjustment::compute_view_transforms`] afterwards to rebuild the matrices, so several
/// edits can be batched into one rebuild.
#[derive(Clone, Debug)]
pub struct ViewAdjustment {
    config: StereoConfig,
    aspect_ratio: f32,

    squash: f32,
    gui_3d_depth: f32,
    hud_distance: f32,
    hud_3d_depth: f32,
    bullet_labyrinth: bool,

    projection: Mat4,
    projection_inverse: Mat4,
    eye_projections: [Mat4; 2],
    lens_shifts: [Mat4; 2],

    roll: Mat4,
    view_transforms: [Mat4; 2],
    adjustments: [Mat4; 2],
    gathered: [Mat4; 2],
    bullet_labyrinth_matrix: Mat4,

    squash_matrix: Mat4,
    hud_distance_matrix: Mat4,
    hud_3d_depth_matrices: [Mat4; 2],
    hud_3d_depth_shifted: [Mat4; 2],
    gui_3d_depth_matrices: [Mat4; 2],
}

impl ViewAdjustment {
    /// Builds the matrix set for `config` at `aspect_ratio` (width / height), applying the
    /// configured HUD and GUI presets.
    pub fn new(config: StereoConfig, aspect_ratio: f32) -> Self {
        let mut view = Self {
            config,
            aspect_ratio,
            squash: 1.0,
            gui_3d_depth: 0.0,
            hud_distance: 0.0,
            hud_3d_depth: 0.0,
            bullet_labyrinth: false,
            projection: Mat4::IDENTITY,
            projection_inverse: Mat4::IDENTITY,
            eye_projections: [Mat4::IDENTITY; 2],
            lens_shifts: [Mat4::IDENTITY; 2],
            roll: Mat4::IDENTITY,
            view_transforms: [Mat4::IDENTITY; 2],
            adjustments: [Mat4::IDENTITY; 2],
            gathered: [Mat4::IDENTITY; 2],
            bullet_labyrinth_matrix: Mat4::IDENTITY,
            squash_matrix: Mat4::IDENTITY,
            hud_distance_matrix: Mat4::IDENTITY,
            hud_3d_depth_matrices: [Mat4::IDENTITY; 2],
            hud_3d_depth_shifted: [Mat4::IDENTITY; 2],
            gui_3d_depth_matrices: [Mat4::IDENTITY; 2],
        };
        let (hud_mode, gui_mode) = (view.config.hud_mode, view.config.gui_mode);
        view.set_hud_mode(hud_mode);
        view.set_gui_mode(gui_mode);
        view.update_projection_matrices(aspect_ratio);
        view.compute_view_transforms();
        view
    }

    pub fn config(&self) -> &StereoConfig {
        &self.config
    }

    /// Replaces the adjustable fields with those of `config`. Matrices are not rebuilt.
    pub fn load_config(&mut self, config: &StereoConfig) {
        self.config = config.clone();
    }

    /// Writes the adjustable fields back into `config` for persistence.
    pub fn save_config(&self, config: &mut StereoConfig) {
        config.roll_enabled = self.config.roll_enabled;
        config.world_scale = self.config.world_scale;
        config.convergence = self.config.convergence;
        config.ipd = self.config.ipd;
        config.stereo_mode = self.config.stereo_mode;
        config.hud_mode = self.config.hud_mode;
        config.gui_mode = self.config.gui_mode;
    }

    /// Rebuilds the base projection, its inverse and both eyes' off-center projections.
    pub fn update_projection_matrices(&mut self, aspect_ratio: f32) {
        let aspect_ratio = if aspect_ratio.is_finite() && aspect_ratio > 0.0 {
            aspect_ratio
        } else {
            warn!(aspect_ratio, "unusable aspect ratio, assuming square");
            1.0
        };
        self.aspect_ratio = aspect_ratio;

        let frustum = Frustum::for_aspect_ratio(aspect_ratio);
        self.projection = frustum.to_matrix();
        self.projection_inverse = self.projection.inverse();

        let near_clip = self.config.near_clip_distance;
        if self.config.convergence <= near_clip {
            debug!(
                convergence = self.config.convergence,
                near_clip, "convergence moved beyond near clip distance"
            );
            self.config.convergence = near_clip + CONVERGENCE_EPSILON;
        }

        // Physical asymmetry at the near plane, then scaled to projection-window units.
        let asymmetry = (self.config.ipd / 2.0 * near_clip) / self.config.convergence;
        let window_per_meter = frustum.width() / PHYSICAL_SCREEN_WIDTH;
        let lens_offset = self.config.hmd.lens_x_center_offset();
        let hmd = self.config.stereo_mode.is_hmd();

        for eye in Eye::BOTH {
            let shift = asymmetry * eye.sign() * window_per_meter;
            let lens_shift = if hmd {
                Mat4::from_translation(Vec3::new(lens_offset * eye.sign(), 0.0, 0.0))
            } else {
                Mat4::IDENTITY
            };
            self.lens_shifts[eye.index()] = lens_shift;
            self.eye_projections[eye.index()] = lens_shift * frustum.shifted(shift).to_matrix();
        }
    }

    /// Rebuilds the per-eye view translations, the combined adjustment matrices and the
    /// HUD/GUI helper matrices. Runs once per frame after head tracking.
    pub fn compute_view_transforms(&mut self) {
        let separation = self.separation_in_world_units();
        for eye in Eye::BOTH {
            let mut transform =
                Mat4::from_translation(Vec3::new(separation * eye.sign(), 0.0, 0.0));
            if self.config.roll_enabled {
                transform *= self.roll;
            }
            self.view_transforms[eye.index()] = transform;
            // Unproject, shift, reproject.
            self.adjustments[eye.index()] =
                self.eye_projections[eye.index()] * transform * self.projection_inverse;
        }

        self.squash_matrix = Mat4::from_scale(Vec3::new(self.squash, self.squash, 1.0));
        self.hud_distance_matrix = Mat4::from_translation(Vec3::new(0.0, 0.0, self.hud_distance));
        self.refresh_hud_depth();
        self.refresh_gui_depth();
    }

    fn refresh_hud_depth(&mut self) {
        let lens_correction =
            (HUD_LENS_CORRECTION_ORIGIN - self.hud_distance) * self.config.hmd.lens_x_center_offset();
        for eye in Eye::BOTH {
            // Overlay offsets run opposite to the eye sign: left moves right, right moves left.
            let side = -eye.sign();
            self.hud_3d_depth_matrices[eye.index()] =
                Mat4::from_translation(Vec3::new(side * self.hud_3d_depth, 0.0, 0.0));
            self.hud_3d_depth_shifted[eye.index()] = Mat4::from_translation(Vec3::new(
                side * (self.hud_3d_depth + lens_correction),
                0.0,
                0.0,
            ));
        }
    }

    fn refresh_gui_depth(&mut self) {
        let depth = self.gui_3d_depth + self.separation_ipd_adjustment();
        for eye in Eye::BOTH {
            self.gui_3d_depth_matrices[eye.index()] =
                Mat4::from_translation(Vec3::new(-eye.sign() * depth, 0.0, 0.0));
        }
    }

    /// Stores the roll rotation applied by the next [`ViewAdjustment::compute_view_transforms`]
    /// when roll is enabled.
    pub fn update_roll(&mut self, roll: f32) {
        self.roll = Mat4::from_rotation_z(roll);
    }

    /// Bullet-labyrinth translation: yaw moves the overlay sideways, pitch moves it vertically.
    pub fn update_pitch_yaw(&mut self, pitch: f32, yaw: f32) {
        self.bullet_labyrinth_matrix = Mat4::from_translation(Vec3::new(-yaw, pitch, 0.0));
    }

    /// Keeps a pair of matrices gathered from shader constants for later modifications.
    pub fn gather_matrix(&mut self, left: Mat4, right: Mat4) {
        self.gathered = [left, right];
    }

    /// Adds `delta` to the world scale, clamped to `[MIN_WORLD_SCALE, MAX_WORLD_SCALE]`.
    pub fn change_world_scale(&mut self, delta: f32) -> f32 {
        let wanted = self.config.world_scale + delta;
        let scale = wanted.clamp(MIN_WORLD_SCALE, MAX_WORLD_SCALE);
        if scale != wanted {
            debug!(wanted, scale, "world scale clamped");
        }
        self.config.world_scale = scale;
        scale
    }

    /// Adds `delta` to the convergence, clamped to the configured bounds.
    ///
    /// Never panics: with inverted bounds the upper bound wins, and a NaN bound is ignored.
    pub fn change_convergence(&mut self, delta: f32) -> f32 {
        let wanted = self.config.convergence + delta;
        let convergence = clamp_lenient(
            wanted,
            self.config.min_convergence,
            self.config.max_convergence,
        );
        if convergence != wanted {
            debug!(wanted, convergence, "convergence clamped");
        }
        self.config.convergence = convergence;
        convergence
    }

    pub fn reset_world_scale(&mut self) {
        self.config.world_scale = DEFAULT_WORLD_SCALE;
    }

    pub fn reset_convergence(&mut self) {
        self.config.convergence = DEFAULT_CONVERGENCE;
    }

    pub fn set_roll_enabled(&mut self, enabled: bool) {
        self.config.roll_enabled = enabled;
    }

    pub fn set_stereo_mode(&mut self, mode: StereoMode) {
        self.config.stereo_mode = mode;
    }

    pub fn change_gui_squash(&mut self, squash: f32) {
        self.squash = squash;
        self.squash_matrix = Mat4::from_scale(Vec3::new(squash, squash, 1.0));
    }

    pub fn change_gui_3d_depth(&mut self, depth: f32) {
        self.gui_3d_depth = depth;
        self.refresh_gui_depth();
    }

    pub fn change_hud_distance(&mut self, distance: f32) {
        self.hud_distance = distance;
        self.hud_distance_matrix = Mat4::from_translation(Vec3::new(0.0, 0.0, distance));
        self.refresh_hud_depth();
    }

    pub fn change_hud_3d_depth(&mut self, depth: f32) {
        self.hud_3d_depth = depth;
        self.refresh_hud_depth();
    }

    /// Pushes the preset values of `mode` into the HUD matrices.
    pub fn set_hud_mode(&mut self, mode: HudMode) {
        self.config.hud_mode = mode;
        let distance = self.config.hud_presets.distance(mode);
        let depth = self.config.hud_presets.depth(mode);
        self.change_hud_distance(distance);
        self.change_hud_3d_depth(depth);
    }

    /// Pushes the preset values of `mode` into the GUI matrices. `GuiMode::Full` also turns on
    /// bullet-labyrinth mode.
    pub fn set_gui_mode(&mut self, mode: GuiMode) {
        self.config.gui_mode = mode;
        let squash = self.config.gui_presets.squash(mode);
        let depth = self.config.gui_presets.depth(mode);
        self.change_gui_squash(squash);
        self.change_gui_3d_depth(depth);
        self.bullet_labyrinth = mode == GuiMode::Full;
    }

    pub fn set_bullet_labyrinth_mode(&mut self, enabled: bool) {
        self.bullet_labyrinth = enabled;
    }

    pub fn ipd(&self) -> f32 {
        self.config.ipd
    }

    pub fn world_scale(&self) -> f32 {
        self.config.world_scale
    }

    pub fn convergence(&self) -> f32 {
        self.config.convergence
    }

    pub fn convergence_in_world_units(&self) -> f32 {
        self.config.convergence * self.config.world_scale
    }

    pub fn roll_enabled(&self) -> bool {
        self.config.roll_enabled
    }

    pub fn stereo_mode(&self) -> StereoMode {
        self.config.stereo_mode
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    /// Half the IPD, in game units.
    pub fn separation_in_world_units(&self) -> f32 {
        (self.config.ipd / 2.0) * self.config.world_scale
    }

    /// Half the deviation of the IPD from [`IPD_DEFAULT`], in game units.
    pub fn separation_ipd_adjustment(&self) -> f32 {
        ((self.config.ipd - IPD_DEFAULT) / 2.0) * self.config.world_scale
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn projection_inverse(&self) -> Mat4 {
        self.projection_inverse
    }

    pub fn eye_projection(&self, eye: Eye) -> Mat4 {
        self.eye_projections[eye.index()]
    }

    /// Lens re-centering translation for HMD modes; identity otherwise.
    pub fn shift_projection(&self, eye: Eye) -> Mat4 {
        self.lens_shifts[eye.index()]
    }

    /// View-space translation (and roll) applied on top of an application view matrix.
    pub fn view_transform(&self, eye: Eye) -> Mat4 {
        self.view_transforms[eye.index()]
    }

    /// `eye_projection * view_transform * projection_inverse`, used by shader constant
    /// modifications to move an application view-projection into `eye`'s space.
    pub fn adjustment_matrix(&self, eye: Eye) -> Mat4 {
        self.adjustments[eye.index()]
    }

    pub fn gathered_matrix(&self, eye: Eye) -> Mat4 {
        self.gathered[eye.index()]
    }

    pub fn roll_matrix(&self) -> Mat4 {
        self.roll
    }

    pub fn bullet_labyrinth_mode(&self) -> bool {
        self.bullet_labyrinth
    }

    pub fn bullet_labyrinth_matrix(&self) -> Mat4 {
        self.bullet_labyrinth_matrix
    }

    pub fn squash_matrix(&self) -> Mat4 {
        self.squash_matrix
    }

    pub fn hud_distance_matrix(&self) -> Mat4 {
        self.hud_distance_matrix
    }

    pub fn hud_3d_depth_matrix(&self, eye: Eye) -> Mat4 {
        self.hud_3d_depth_matrices[eye.index()]
    }

    pub fn hud_3d_depth_shifted_matrix(&self, eye: Eye) -> Mat4 {
        self.hud_3d_depth_shifted[eye.index()]
    }

    pub fn gui_3d_depth_matrix(&self, eye: Eye) -> Mat4 {
        self.gui_3d_depth_matrices[eye.index()]
    }

    pub fn hud_mode(&self) -> HudMode {
        self.config.hud_mode
    }

    pub fn gui_mode(&self) -> GuiMode {
        self.config.gui_mode
    }
}

/// `value` limited to `[min, max]` without `f32::clamp`'s panics on inverted or NaN bounds.
fn clamp_lenient(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}
