//! Resource creation.
//!
//! Render targets, depth stencils, textures and cube textures get a right-eye twin when the
//! heuristics ask for one. A failed twin degrades the resource to mono; the call still succeeds.

use std::sync::Arc;

use tracing::warn;

use crate::error::{D3dError, D3dResult};
use crate::heuristics::StereoHeuristics;
use crate::native::NativeDevice;
use crate::resource::{
    DualResource, PixelShaderHandle, ProxyShader, StereoIndexBuffer, StereoSurface,
    StereoTexture, StereoVertexBuffer, VertexDeclarationHandle, VertexShaderHandle,
};
use crate::state::{BufferDesc, ShaderStage, SurfaceDesc, TextureDesc, TextureKind, VertexElement};

use super::StereoDevice;

impl<D: NativeDevice, H: StereoHeuristics> StereoDevice<D, H> {
    fn create_pair<T, F>(
        &mut self,
        kind: &'static str,
        duplicate: bool,
        mut create: F,
    ) -> D3dResult<DualResource<T>>
    where
        F: FnMut(&mut D) -> D3dResult<T>,
    {
        let left = create(&mut self.device)?;
        if !duplicate {
            return Ok(DualResource::mono(left));
        }
        match create(&mut self.device) {
            Ok(right) => Ok(DualResource::stereo(left, right)),
            Err(err) => {
                self.stats.inc_mono_fallbacks();
                warn!(kind, %err, "right eye creation failed, continuing in mono");
                Ok(DualResource::mono(left))
            }
        }
    }

    pub fn create_render_target(
        &mut self,
        desc: &SurfaceDesc,
        lockable: bool,
    ) -> D3dResult<StereoSurface<D>> {
        self.create_render_target_ex(desc, lockable, false)
    }

    /// `is_back_buffer` marks surfaces standing in for a swap chain back buffer.
    pub fn create_render_target_ex(
        &mut self,
        desc: &SurfaceDesc,
        lockable: bool,
        is_back_buffer: bool,
    ) -> D3dResult<StereoSurface<D>> {
        let duplicate = self
            .heuristics
            .should_duplicate_render_target(desc, is_back_buffer);
        self.create_pair("render target", duplicate, |device| {
            device.create_render_target(desc, lockable)
        })
    }

    pub fn create_depth_stencil_surface(
        &mut self,
        desc: &SurfaceDesc,
        discard: bool,
    ) -> D3dResult<StereoSurface<D>> {
        let duplicate = self.heuristics.should_duplicate_depth_stencil(desc);
        self.create_pair("depth stencil", duplicate, |device| {
            device.create_depth_stencil_surface(desc, discard)
        })
    }

    /// Creates any texture kind. Volume textures are always mono.
    pub fn create_texture(&mut self, desc: &TextureDesc) -> D3dResult<StereoTexture<D>> {
        let (kind, duplicate) = match desc.kind {
            TextureKind::Texture2D => ("texture", self.heuristics.should_duplicate_texture(desc)),
            TextureKind::Cube => (
                "cube texture",
                self.heuristics.should_duplicate_cube_texture(desc),
            ),
            TextureKind::Volume { .. } => ("volume texture", false),
        };
        self.create_pair(kind, duplicate, |device| device.create_texture(desc))
    }

    pub fn create_cube_texture(&mut self, desc: &TextureDesc) -> D3dResult<StereoTexture<D>> {
        if desc.kind != TextureKind::Cube {
            return Err(D3dError::InvalidCall("not a cube texture description"));
        }
        self.create_texture(desc)
    }

    pub fn create_offscreen_plain_surface(
        &mut self,
        desc: &SurfaceDesc,
    ) -> D3dResult<StereoSurface<D>> {
        self.device
            .create_offscreen_plain_surface(desc)
            .map(DualResource::mono)
    }

    pub fn create_vertex_buffer(&mut self, desc: &BufferDesc) -> D3dResult<StereoVertexBuffer<D>> {
        self.device.create_vertex_buffer(desc).map(DualResource::mono)
    }

    pub fn create_index_buffer(&mut self, desc: &BufferDesc) -> D3dResult<StereoIndexBuffer<D>> {
        self.device.create_index_buffer(desc).map(DualResource::mono)
    }

    /// Creates a vertex shader carrying the register rules the heuristics pick for it.
    pub fn create_vertex_shader(&mut self, function: &[u32]) -> D3dResult<VertexShaderHandle<D>> {
        let actual = self.device.create_vertex_shader(function)?;
        let rules = self.heuristics.shader_rules(ShaderStage::Vertex, function);
        Ok(ProxyShader::new(actual, rules))
    }

    pub fn create_pixel_shader(&mut self, function: &[u32]) -> D3dResult<PixelShaderHandle<D>> {
        let actual = self.device.create_pixel_shader(function)?;
        let rules = self.heuristics.shader_rules(ShaderStage::Pixel, function);
        Ok(ProxyShader::new(actual, rules))
    }

    pub fn create_vertex_declaration(
        &mut self,
        elements: &[VertexElement],
    ) -> D3dResult<VertexDeclarationHandle<D>> {
        if elements.is_empty() {
            return Err(D3dError::InvalidCall("vertex declaration has no elements"));
        }
        self.device.create_vertex_declaration(elements).map(Arc::new)
    }
}
