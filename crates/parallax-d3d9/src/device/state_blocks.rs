use tracing::warn;

use crate::error::{D3dError, D3dResult};
use crate::heuristics::StereoHeuristics;
use crate::native::NativeDevice;
use crate::sink::{CaptureBuffer, CapturedState, StateSink};
use crate::state::{StateBlockType, TransformState};
use crate::state_block::StereoStateBlock;

use super::StereoDevice;

impl<D: NativeDevice, H: StereoHeuristics> StereoDevice<D, H> {
    /// Starts recording. Until `end_state_block`, setters still reach the device but their
    /// bookkeeping goes into the recording instead of the live bindings.
    pub fn begin_state_block(&mut self) -> D3dResult<()> {
        if self.capture.is_some() {
            return Err(D3dError::InvalidCall("state block recording already active"));
        }
        self.device.begin_state_block()?;
        self.capture = Some(CaptureBuffer::new());
        Ok(())
    }

    pub fn end_state_block(&mut self) -> D3dResult<StereoStateBlock<D>> {
        let captured = self
            .capture
            .take()
            .ok_or(D3dError::InvalidCall("no state block recording active"))?;
        let actual = self.device.end_state_block()?;
        Ok(StereoStateBlock::new(actual, None, captured))
    }

    /// Snapshots the live bindings a block of type `ty` covers.
    pub fn create_state_block(&mut self, ty: StateBlockType) -> D3dResult<StereoStateBlock<D>> {
        let actual = self.device.create_state_block(ty)?;
        let captured = CaptureBuffer::snapshot(&self.bindings, ty);
        Ok(StereoStateBlock::new(actual, Some(ty), captured))
    }

    /// Applies the device block, then replays every captured binding resolved for the eye that
    /// is active now.
    ///
    /// Every entry is replayed; the first failure is returned.
    pub fn apply_state_block(&mut self, block: &StereoStateBlock<D>) -> D3dResult<()> {
        self.device.apply_state_block(block.actual())?;

        let mut first_error = None;
        for entry in block.entries() {
            if let Err(err) = self.replay(entry) {
                warn!(%err, "failed to replay state block entry");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn replay(&mut self, entry: &CapturedState<D>) -> D3dResult<()> {
        match entry {
            CapturedState::ViewTransform(transform) => {
                self.apply_stereo_transform(TransformState::View, *transform)
            }
            CapturedState::ProjectionTransform(transform) => {
                self.apply_stereo_transform(TransformState::Projection, *transform)
            }
            CapturedState::Viewport {
                viewport,
                is_default,
            } => {
                self.device.set_viewport(viewport)?;
                self.sink().record_viewport(*viewport, *is_default);
                Ok(())
            }
            CapturedState::Texture { stage, texture } => self.apply_texture(*stage, texture.clone()),
            CapturedState::StreamSource { stream, binding } => {
                self.apply_stream_source(*stream, binding.clone())
            }
            CapturedState::Indices(buffer) => self.apply_indices(buffer.clone()),
            CapturedState::VertexDeclaration(declaration) => {
                self.apply_vertex_declaration(declaration.clone())
            }
            CapturedState::VertexShader(shader) => self.apply_vertex_shader(shader.clone()),
            CapturedState::PixelShader(shader) => self.apply_pixel_shader(shader.clone()),
            CapturedState::ShaderConstants { stage, start, data } => {
                self.set_shader_constant_f(*stage, *start, data)
            }
        }
    }

    /// Refreshes every slot the block covers from the live bindings.
    pub fn capture_state_block(&mut self, block: &mut StereoStateBlock<D>) -> D3dResult<()> {
        self.device.capture_state_block(block.actual())?;
        for entry in block.entries_mut() {
            *entry = entry.refreshed_from(&self.bindings);
        }
        Ok(())
    }
}
