//! The stereo state mirror.
//!
//! [`StereoDevice`] sits in front of a [`NativeDevice`]. It owns the active-eye flag, mirrors
//! every binding as a logical (possibly stereo) handle, resolves handles to the active eye's
//! instance when talking to the device, and repeats draws for the second eye whenever the
//! primary render target is stereo.

mod create;
mod draw;
mod eye;
mod frame;
mod setters;
mod state_blocks;

use glam::Mat4;
use parallax_view::{Eye, HeadTracker, NoHeadTracker, StereoConfig, ViewAdjustment};

use crate::binding::BindingTable;
use crate::error::D3dResult;
use crate::heuristics::{DefaultHeuristics, StereoHeuristics};
use crate::native::NativeDevice;
use crate::presenter::{NullPresenter, StereoPresenter};
use crate::resource::StereoSurface;
use crate::sink::{CaptureBuffer, StateSink};
use crate::state::DeviceCaps;
use crate::stats::StereoStats;

pub struct StereoDevice<D: NativeDevice, H: StereoHeuristics = DefaultHeuristics> {
    device: D,
    heuristics: H,
    caps: DeviceCaps,
    view: ViewAdjustment,
    bindings: BindingTable<D>,
    /// Active between `begin_state_block` and `end_state_block`.
    capture: Option<CaptureBuffer<D>>,
    eye: Eye,
    /// The real swap chain back buffer; the application renders into `back_buffer` instead.
    swap_chain_surface: Option<D::Surface>,
    back_buffer: Option<StereoSurface<D>>,
    presenter: Box<dyn StereoPresenter<D>>,
    tracker: Box<dyn HeadTracker>,
    tracking_enabled: bool,
    first_scene_of_frame: bool,
    stats: StereoStats,
}

impl<D: NativeDevice, H: StereoHeuristics> StereoDevice<D, H> {
    /// Wraps `device` with no presenter and no head tracking.
    pub fn new(device: D, heuristics: H, config: StereoConfig) -> D3dResult<Self> {
        Self::with_collaborators(
            device,
            heuristics,
            config,
            Box::new(NullPresenter),
            Box::new(NoHeadTracker),
        )
    }

    /// Wraps `device` and performs the initial swap chain setup.
    ///
    /// Fails with [`crate::D3dError::PrimarySwapChainUnavailable`] when the device has no
    /// usable back buffer.
    pub fn with_collaborators(
        device: D,
        heuristics: H,
        config: StereoConfig,
        presenter: Box<dyn StereoPresenter<D>>,
        tracker: Box<dyn HeadTracker>,
    ) -> D3dResult<Self> {
        let caps = device.caps();
        let bindings = BindingTable::new(
            caps.max_simultaneous_render_targets,
            caps.max_vertex_shader_constants,
            caps.max_pixel_shader_constants(),
        );
        let mut mirror = Self {
            device,
            heuristics,
            caps,
            view: ViewAdjustment::new(config, 1.0),
            bindings,
            capture: None,
            eye: Eye::Left,
            swap_chain_surface: None,
            back_buffer: None,
            presenter,
            tracker,
            tracking_enabled: true,
            first_scene_of_frame: true,
            stats: StereoStats::new(),
        };
        mirror.on_create_or_restore()?;
        Ok(mirror)
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Direct access to the wrapped device. Calls made through it bypass the mirror.
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn caps(&self) -> DeviceCaps {
        self.caps
    }

    pub fn heuristics(&self) -> &H {
        &self.heuristics
    }

    pub fn view(&self) -> &ViewAdjustment {
        &self.view
    }

    /// Calibration entry point. Changes take effect once the caller rebuilds the matrices
    /// with `update_projection_matrices`/`compute_view_transforms`.
    pub fn view_mut(&mut self) -> &mut ViewAdjustment {
        &mut self.view
    }

    pub fn bindings(&self) -> &BindingTable<D> {
        &self.bindings
    }

    pub fn stats(&self) -> &StereoStats {
        &self.stats
    }

    pub fn active_eye(&self) -> Eye {
        self.eye
    }

    /// Adjustment matrix of the active eye, as consumed by constant modifications.
    pub fn current_adjustment_matrix(&self) -> Mat4 {
        self.view.adjustment_matrix(self.eye)
    }

    pub fn is_capturing(&self) -> bool {
        self.capture.is_some()
    }

    pub fn set_tracking_enabled(&mut self, enabled: bool) {
        self.tracking_enabled = enabled;
    }

    /// Where setter bookkeeping goes right now.
    fn sink(&mut self) -> &mut dyn StateSink<D> {
        match self.capture.as_mut() {
            Some(capture) => capture,
            None => &mut self.bindings,
        }
    }
}

#[cfg(test)]
mod tests;
