use parallax_view::Eye;
use tracing::{debug, warn};

use crate::heuristics::StereoHeuristics;
use crate::native::NativeDevice;
use crate::state::TransformState;

use super::StereoDevice;

impl<D: NativeDevice, H: StereoHeuristics> StereoDevice<D, H> {
    /// Makes `target` the active eye and rebinds every stereo binding to its instances.
    ///
    /// Returns false, changing nothing, when `target` is the right eye and render target 0 is
    /// mono. Switching to the already active eye succeeds without touching the device.
    pub fn try_set_active_eye(&mut self, target: Eye) -> bool {
        if target == self.eye {
            return true;
        }
        if target == Eye::Right
            && !self
                .bindings
                .render_target(0)
                .is_some_and(|surface| surface.is_stereo())
        {
            self.stats.inc_rejected_eye_switches();
            return false;
        }

        self.eye = target;
        let eye = target;

        let mut render_target_changed = false;
        for (index, surface) in self.bindings.render_targets() {
            match self.device.set_render_target(index, Some(surface.for_eye(eye))) {
                Ok(()) => render_target_changed = true,
                Err(err) => warn!(index, %eye, %err, "failed to rebind render target"),
            }
        }

        // Binding a render target resets the device viewport to the full surface.
        if render_target_changed && !self.bindings.viewport_is_default() {
            if let Some(viewport) = self.bindings.last_viewport() {
                if let Err(err) = self.device.set_viewport(&viewport) {
                    warn!(%eye, %err, "failed to restore viewport");
                }
            }
        }

        if let Some(depth_stencil) = self.bindings.depth_stencil() {
            if let Err(err) = self
                .device
                .set_depth_stencil_surface(Some(depth_stencil.for_eye(eye)))
            {
                warn!(%eye, %err, "failed to rebind depth stencil");
            }
        }

        for (stage, texture) in self.bindings.textures() {
            let Some(texture) = texture.filter(|t| t.is_stereo()) else {
                continue;
            };
            if let Err(err) = self.device.set_texture(stage, Some(texture.for_eye(eye))) {
                warn!(stage, %eye, %err, "failed to rebind texture");
            }
        }

        for (stream, binding) in self.bindings.streams() {
            let Some(binding) = binding.filter(|b| b.buffer.is_stereo()) else {
                continue;
            };
            if let Err(err) = self.device.set_stream_source(
                stream,
                Some(binding.buffer.for_eye(eye)),
                binding.offset,
                binding.stride,
            ) {
                warn!(stream, %eye, %err, "failed to rebind vertex buffer");
            }
        }

        if let Some(indices) = self.bindings.indices().filter(|b| b.is_stereo()) {
            if let Err(err) = self.device.set_indices(Some(indices.for_eye(eye))) {
                warn!(%eye, %err, "failed to rebind index buffer");
            }
        }

        for (state, transform) in [
            (TransformState::View, *self.bindings.view_transform()),
            (TransformState::Projection, *self.bindings.projection_transform()),
        ] {
            if !transform.is_set {
                continue;
            }
            if let Err(err) = self.device.set_transform(state, transform.for_eye(eye)) {
                warn!(?state, %eye, %err, "failed to reapply transform");
            }
        }

        if let Err(err) = self.bindings.registers_mut().apply_all_stereo_constants(
            eye,
            &self.view,
            &mut self.device,
        ) {
            warn!(%eye, %err, "failed to upload stereo constants");
        }

        self.stats.inc_eye_switches();
        debug!(%eye, "active eye changed");
        true
    }

    /// Flips to the other eye; false when the right eye is not available.
    pub fn switch_drawing_side(&mut self) -> bool {
        self.try_set_active_eye(self.eye.other())
    }
}
