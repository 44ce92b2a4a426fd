//! Device lifetime: swap chain setup, reset, scene and present hooks.

use parallax_view::Eye;
use tracing::{debug, error, warn};

use crate::error::{D3dError, D3dResult};
use crate::heuristics::StereoHeuristics;
use crate::native::NativeDevice;
use crate::sink::StateSink;
use crate::state::PresentParameters;

use super::StereoDevice;

impl<D: NativeDevice, H: StereoHeuristics> StereoDevice<D, H> {
    /// Builds the stereo back buffer and default bindings on a fresh or reset device.
    pub(super) fn on_create_or_restore(&mut self) -> D3dResult<()> {
        self.eye = Eye::Left;
        self.first_scene_of_frame = true;

        let swap_chain_surface = self.device.primary_back_buffer().map_err(|err| {
            error!(%err, "failed to get primary swap chain back buffer");
            D3dError::PrimarySwapChainUnavailable(err.to_string())
        })?;
        let desc = self
            .device
            .surface_desc(&swap_chain_surface)
            .map_err(|err| {
                error!(%err, "failed to describe primary swap chain back buffer");
                D3dError::PrimarySwapChainUnavailable(err.to_string())
            })?;

        let back_buffer = self.create_render_target_ex(&desc, false, true)?;
        self.set_render_target(0, Some(&back_buffer))?;
        self.swap_chain_surface = Some(swap_chain_surface);
        self.back_buffer = Some(back_buffer);

        let viewport = self.device.viewport()?;
        let is_default = viewport.covers(&desc);
        self.bindings.record_viewport(viewport, is_default);

        if let Some(auto_depth_stencil) = self.device.auto_depth_stencil()? {
            let desc = self.device.surface_desc(&auto_depth_stencil)?;
            let depth_stencil = self.create_depth_stencil_surface(&desc, false)?;
            self.set_depth_stencil_surface(Some(&depth_stencil))?;
        }

        if let Err(err) = self.presenter.restore(&mut self.device) {
            warn!(%err, "failed to restore presenter resources");
        }

        self.view.update_projection_matrices(viewport.aspect_ratio());
        self.view.compute_view_transforms();
        debug!(
            width = desc.width,
            height = desc.height,
            stereo = self.back_buffer.as_ref().is_some_and(|b| b.is_stereo()),
            "stereo swap chain ready"
        );
        Ok(())
    }

    /// Drops every binding, the back buffer and any in-progress state block recording.
    fn release_everything(&mut self) {
        self.capture = None;
        self.bindings.clear();
        self.back_buffer = None;
        self.swap_chain_surface = None;
        self.eye = Eye::Left;
    }

    /// Releases everything, resets the device and rebuilds the stereo swap chain.
    ///
    /// When the device reset fails the mirror is left with no bindings; the caller must reset
    /// again before drawing.
    pub fn reset(&mut self, params: &PresentParameters) -> D3dResult<()> {
        self.presenter.release();
        self.release_everything();

        if let Err(err) = self.device.reset(params) {
            error!(%err, "device reset failed");
            return Err(err);
        }
        self.on_create_or_restore()
    }

    /// Polls head tracking on the first scene of each frame.
    pub fn begin_scene(&mut self) -> D3dResult<()> {
        if self.first_scene_of_frame {
            self.first_scene_of_frame = false;
            self.update_head_tracking();
        }
        self.device.begin_scene()
    }

    fn update_head_tracking(&mut self) {
        if !self.tracking_enabled || !self.tracker.is_available() {
            return;
        }
        self.tracker.update_orientation();
        let pose = self.tracker.pose();
        if self.view.roll_enabled() {
            self.view.update_roll(pose.roll);
        }
        self.view.update_pitch_yaw(pose.pitch, pose.yaw);
        self.view.compute_view_transforms();
    }

    pub fn end_scene(&mut self) -> D3dResult<()> {
        self.device.end_scene()
    }

    /// Hands the stereo back buffer to the presenter, then presents.
    pub fn present(&mut self) -> D3dResult<()> {
        if let (Some(back_buffer), Some(target)) =
            (self.back_buffer.as_ref(), self.swap_chain_surface.as_ref())
        {
            if let Err(err) = self.presenter.present(&mut self.device, back_buffer, target) {
                warn!(%err, "stereo presenter failed");
            }
        }
        self.first_scene_of_frame = true;
        self.device.present()
    }
}
