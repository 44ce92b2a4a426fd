//! Binding setters and getters.
//!
//! Every setter resolves its handle for the active eye, issues the device call, then hands the
//! logical value to the active [`StateSink`](crate::sink::StateSink). The `apply_*` variants
//! skip validation and the already-bound check; state-block replay goes through them.

use glam::Mat4;
use parallax_view::Eye;
use tracing::warn;

use crate::binding::{StereoTransform, StreamBinding};
use crate::error::{D3dError, D3dResult};
use crate::heuristics::StereoHeuristics;
use crate::native::NativeDevice;
use crate::resource::{
    PixelShaderHandle, StereoIndexBuffer, StereoSurface, StereoTexture, StereoVertexBuffer,
    VertexDeclarationHandle, VertexShaderHandle,
};
use crate::state::{is_valid_sampler, ShaderStage, SurfaceDesc, TransformState, Viewport};

use super::StereoDevice;

impl<D: NativeDevice, H: StereoHeuristics> StereoDevice<D, H> {
    /// Binds `surface` to render target slot `index`, resolved for the active eye.
    ///
    /// The other eye's instance is bound on the next eye switch.
    pub fn set_render_target(
        &mut self,
        index: u32,
        surface: Option<&StereoSurface<D>>,
    ) -> D3dResult<()> {
        let limit = self.bindings.max_render_targets();
        if index >= limit {
            return Err(D3dError::InvalidSlot {
                kind: "render target",
                index,
                limit,
            });
        }
        if index == 0 && surface.is_none() {
            return Err(D3dError::InvalidCall("render target 0 cannot be null"));
        }

        let eye = self.eye;
        self.device
            .set_render_target(index, surface.map(|surface| surface.for_eye(eye)))?;
        self.bindings.set_render_target(index, surface.cloned());
        Ok(())
    }

    pub fn get_render_target(&self, index: u32) -> D3dResult<StereoSurface<D>> {
        let limit = self.bindings.max_render_targets();
        if index >= limit {
            return Err(D3dError::InvalidSlot {
                kind: "render target",
                index,
                limit,
            });
        }
        self.bindings
            .render_target(index)
            .cloned()
            .ok_or(D3dError::NotFound("render target"))
    }

    pub fn set_depth_stencil_surface(&mut self, surface: Option<&StereoSurface<D>>) -> D3dResult<()> {
        let eye = self.eye;
        self.device
            .set_depth_stencil_surface(surface.map(|surface| surface.for_eye(eye)))?;
        self.bindings.set_depth_stencil(surface.cloned());
        Ok(())
    }

    pub fn get_depth_stencil_surface(&self) -> D3dResult<StereoSurface<D>> {
        self.bindings
            .depth_stencil()
            .cloned()
            .ok_or(D3dError::NotFound("depth stencil surface"))
    }

    /// The stereo back buffer the application renders into.
    pub fn get_back_buffer(&self) -> D3dResult<StereoSurface<D>> {
        self.back_buffer
            .clone()
            .ok_or(D3dError::NotFound("back buffer"))
    }

    pub fn set_viewport(&mut self, viewport: &Viewport) -> D3dResult<()> {
        self.device.set_viewport(viewport)?;
        let is_default = self
            .primary_target_desc()
            .is_some_and(|desc| viewport.covers(&desc));
        self.sink().record_viewport(*viewport, is_default);
        Ok(())
    }

    pub fn get_viewport(&self) -> D3dResult<Viewport> {
        self.device.viewport()
    }

    pub(super) fn primary_target_desc(&self) -> Option<SurfaceDesc> {
        let target = self.bindings.render_target(0)?;
        self.device.surface_desc(target.left()).ok()
    }

    /// Sets a transform. View and projection are split into a left/right pair by the current
    /// view adjustment; identity (or `None`) marks them unset. Other transforms pass through.
    pub fn set_transform(&mut self, state: TransformState, matrix: Option<&Mat4>) -> D3dResult<()> {
        let matrix = matrix.copied();
        match state {
            TransformState::View => {
                let transform = match matrix {
                    Some(m) if m != Mat4::IDENTITY => StereoTransform::new(
                        self.view.view_transform(Eye::Left) * m,
                        self.view.view_transform(Eye::Right) * m,
                    ),
                    _ => StereoTransform::UNSET,
                };
                self.apply_stereo_transform(state, transform)
            }
            TransformState::Projection => {
                let transform = match matrix {
                    Some(m) if m != Mat4::IDENTITY => StereoTransform::new(
                        self.view.shift_projection(Eye::Left) * m,
                        self.view.shift_projection(Eye::Right) * m,
                    ),
                    _ => StereoTransform::UNSET,
                };
                self.apply_stereo_transform(state, transform)
            }
            _ => {
                let matrix = matrix.ok_or(D3dError::InvalidCall("transform matrix is null"))?;
                self.device.set_transform(state, &matrix)
            }
        }
    }

    /// Issues the active eye's half of `transform` and records the pair.
    pub(super) fn apply_stereo_transform(
        &mut self,
        state: TransformState,
        transform: StereoTransform,
    ) -> D3dResult<()> {
        let eye = self.eye;
        self.device.set_transform(state, transform.for_eye(eye))?;
        match state {
            TransformState::View => self.sink().record_view_transform(transform),
            TransformState::Projection => self.sink().record_projection_transform(transform),
            _ => {}
        }
        Ok(())
    }

    /// Sets an explicit left/right view pair, bypassing the view adjustment. With `apply`
    /// false only the bookkeeping changes and the device sees the pair on the next eye switch.
    pub fn set_stereo_view_transform(&mut self, left: Mat4, right: Mat4, apply: bool) -> D3dResult<()> {
        self.set_stereo_transform(TransformState::View, StereoTransform::new(left, right), apply)
    }

    pub fn set_stereo_projection_transform(
        &mut self,
        left: Mat4,
        right: Mat4,
        apply: bool,
    ) -> D3dResult<()> {
        self.set_stereo_transform(
            TransformState::Projection,
            StereoTransform::new(left, right),
            apply,
        )
    }

    fn set_stereo_transform(
        &mut self,
        state: TransformState,
        transform: StereoTransform,
        apply: bool,
    ) -> D3dResult<()> {
        if apply {
            return self.apply_stereo_transform(state, transform);
        }
        match state {
            TransformState::View => self.sink().record_view_transform(transform),
            _ => self.sink().record_projection_transform(transform),
        }
        Ok(())
    }

    /// Forwarded unchanged; the stereo split of view/projection does not see the product.
    pub fn multiply_transform(&mut self, state: TransformState, matrix: &Mat4) -> D3dResult<()> {
        if matches!(state, TransformState::View | TransformState::Projection) {
            warn!(?state, "multiply_transform bypasses stereo separation");
        }
        self.device.multiply_transform(state, matrix)
    }

    pub fn set_texture(&mut self, stage: u32, texture: Option<&StereoTexture<D>>) -> D3dResult<()> {
        if !is_valid_sampler(stage) {
            return Err(D3dError::InvalidCall("sampler stage out of range"));
        }
        if !self.is_capturing() && self.bindings.texture(stage) == Some(texture) {
            return Ok(());
        }
        self.apply_texture(stage, texture.cloned())
    }

    pub(super) fn apply_texture(
        &mut self,
        stage: u32,
        texture: Option<StereoTexture<D>>,
    ) -> D3dResult<()> {
        let eye = self.eye;
        self.device
            .set_texture(stage, texture.as_ref().map(|texture| texture.for_eye(eye)))?;
        self.sink().record_texture(stage, texture);
        Ok(())
    }

    /// `Ok(None)` when the stage was explicitly cleared; an error when it was never set.
    pub fn get_texture(&self, stage: u32) -> D3dResult<Option<StereoTexture<D>>> {
        self.bindings
            .texture(stage)
            .map(|texture| texture.cloned())
            .ok_or(D3dError::InvalidCall("texture stage never set"))
    }

    pub fn set_stream_source(
        &mut self,
        stream: u32,
        buffer: Option<&StereoVertexBuffer<D>>,
        offset: u32,
        stride: u32,
    ) -> D3dResult<()> {
        let limit = self.caps.max_streams;
        if stream >= limit {
            return Err(D3dError::InvalidSlot {
                kind: "stream",
                index: stream,
                limit,
            });
        }
        let binding = buffer.map(|buffer| StreamBinding {
            buffer: buffer.clone(),
            offset,
            stride,
        });
        if !self.is_capturing() && self.bindings.stream(stream) == Some(binding.as_ref()) {
            return Ok(());
        }
        self.apply_stream_source(stream, binding)
    }

    pub(super) fn apply_stream_source(
        &mut self,
        stream: u32,
        binding: Option<StreamBinding<D::VertexBuffer>>,
    ) -> D3dResult<()> {
        let eye = self.eye;
        match &binding {
            Some(binding) => self.device.set_stream_source(
                stream,
                Some(binding.buffer.for_eye(eye)),
                binding.offset,
                binding.stride,
            )?,
            None => self.device.set_stream_source(stream, None, 0, 0)?,
        }
        self.sink().record_stream_source(stream, binding);
        Ok(())
    }

    pub fn get_stream_source(&self, stream: u32) -> D3dResult<Option<StreamBinding<D::VertexBuffer>>> {
        self.bindings
            .stream(stream)
            .map(|binding| binding.cloned())
            .ok_or(D3dError::InvalidCall("stream never set"))
    }

    pub fn set_indices(&mut self, buffer: Option<&StereoIndexBuffer<D>>) -> D3dResult<()> {
        if !self.is_capturing() && buffer.is_some() && self.bindings.indices() == buffer {
            return Ok(());
        }
        self.apply_indices(buffer.cloned())
    }

    pub(super) fn apply_indices(&mut self, buffer: Option<StereoIndexBuffer<D>>) -> D3dResult<()> {
        let eye = self.eye;
        self.device
            .set_indices(buffer.as_ref().map(|buffer| buffer.for_eye(eye)))?;
        self.sink().record_indices(buffer);
        Ok(())
    }

    pub fn get_indices(&self) -> Option<StereoIndexBuffer<D>> {
        self.bindings.indices().cloned()
    }

    pub fn set_vertex_declaration(
        &mut self,
        declaration: Option<&VertexDeclarationHandle<D>>,
    ) -> D3dResult<()> {
        self.apply_vertex_declaration(declaration.cloned())
    }

    pub(super) fn apply_vertex_declaration(
        &mut self,
        declaration: Option<VertexDeclarationHandle<D>>,
    ) -> D3dResult<()> {
        self.device
            .set_vertex_declaration(declaration.as_deref())?;
        self.sink().record_vertex_declaration(declaration);
        Ok(())
    }

    pub fn get_vertex_declaration(&self) -> Option<VertexDeclarationHandle<D>> {
        self.bindings.vertex_declaration().cloned()
    }

    /// Binds a vertex shader; its register rules take effect for every later upload.
    pub fn set_vertex_shader(&mut self, shader: Option<&VertexShaderHandle<D>>) -> D3dResult<()> {
        self.apply_vertex_shader(shader.cloned())
    }

    pub(super) fn apply_vertex_shader(
        &mut self,
        shader: Option<VertexShaderHandle<D>>,
    ) -> D3dResult<()> {
        self.device
            .set_vertex_shader(shader.as_ref().map(|shader| shader.actual()))?;
        self.sink().record_vertex_shader(shader);
        Ok(())
    }

    pub fn get_vertex_shader(&self) -> Option<VertexShaderHandle<D>> {
        self.bindings.vertex_shader().cloned()
    }

    pub fn set_pixel_shader(&mut self, shader: Option<&PixelShaderHandle<D>>) -> D3dResult<()> {
        self.apply_pixel_shader(shader.cloned())
    }

    pub(super) fn apply_pixel_shader(
        &mut self,
        shader: Option<PixelShaderHandle<D>>,
    ) -> D3dResult<()> {
        self.device
            .set_pixel_shader(shader.as_ref().map(|shader| shader.actual()))?;
        self.sink().record_pixel_shader(shader);
        Ok(())
    }

    pub fn get_pixel_shader(&self) -> Option<PixelShaderHandle<D>> {
        self.bindings.pixel_shader().cloned()
    }

    /// Stores float constants. Nothing reaches the device until the next draw flushes the
    /// dirty registers for the eye being drawn.
    pub fn set_vertex_shader_constant_f(&mut self, start: u32, data: &[f32]) -> D3dResult<()> {
        self.set_shader_constant_f(ShaderStage::Vertex, start, data)
    }

    pub fn set_pixel_shader_constant_f(&mut self, start: u32, data: &[f32]) -> D3dResult<()> {
        self.set_shader_constant_f(ShaderStage::Pixel, start, data)
    }

    pub(super) fn set_shader_constant_f(
        &mut self,
        stage: ShaderStage,
        start: u32,
        data: &[f32],
    ) -> D3dResult<()> {
        self.bindings
            .registers()
            .validate_constant_f(stage, start, data)?;
        self.sink().record_shader_constants(stage, start, data)
    }

    pub fn get_vertex_shader_constant_f(&self, start: u32, count: u32) -> D3dResult<Vec<f32>> {
        self.bindings
            .registers()
            .get_constant_f(ShaderStage::Vertex, start, count)
    }

    pub fn get_pixel_shader_constant_f(&self, start: u32, count: u32) -> D3dResult<Vec<f32>> {
        self.bindings
            .registers()
            .get_constant_f(ShaderStage::Pixel, start, count)
    }
}
