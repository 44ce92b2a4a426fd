//! Live binding state of the mirror.

use std::collections::BTreeMap;
use std::sync::Arc;

use glam::Mat4;
use parallax_view::Eye;

use crate::error::D3dResult;
use crate::native::NativeDevice;
use crate::registers::{ShaderRegisterTracker, ShaderRules};
use crate::resource::{
    DualResource, PixelShaderHandle, ProxyShader, StereoIndexBuffer, StereoSurface, StereoTexture,
    VertexDeclarationHandle, VertexShaderHandle,
};
use crate::sink::StateSink;
use crate::state::{ShaderStage, Viewport};

/// A left/right pair derived from one application transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StereoTransform {
    pub left: Mat4,
    pub right: Mat4,
    /// False when the application set identity (or nothing); such transforms are not
    /// re-applied on eye switches.
    pub is_set: bool,
}

impl StereoTransform {
    pub const UNSET: Self = Self {
        left: Mat4::IDENTITY,
        right: Mat4::IDENTITY,
        is_set: false,
    };

    pub fn new(left: Mat4, right: Mat4) -> Self {
        Self {
            left,
            right,
            is_set: true,
        }
    }

    pub fn for_eye(&self, eye: Eye) -> &Mat4 {
        match eye {
            Eye::Left => &self.left,
            Eye::Right => &self.right,
        }
    }
}

impl Default for StereoTransform {
    fn default() -> Self {
        Self::UNSET
    }
}

/// A vertex stream slot.
#[derive(Clone, Debug, PartialEq)]
pub struct StreamBinding<V> {
    pub buffer: DualResource<V>,
    pub offset: u32,
    pub stride: u32,
}

/// Everything bound on the device, tracked as logical (possibly stereo) handles.
///
/// Each slot owns one reference to its resource; replacing or clearing a slot releases it.
pub struct BindingTable<D: NativeDevice> {
    render_targets: Vec<Option<StereoSurface<D>>>,
    depth_stencil: Option<StereoSurface<D>>,
    /// Null entries are kept so state blocks can capture "unbound".
    textures: BTreeMap<u32, Option<StereoTexture<D>>>,
    streams: BTreeMap<u32, Option<StreamBinding<D::VertexBuffer>>>,
    indices: Option<StereoIndexBuffer<D>>,
    vertex_declaration: Option<VertexDeclarationHandle<D>>,
    vertex_shader: Option<VertexShaderHandle<D>>,
    pixel_shader: Option<PixelShaderHandle<D>>,
    last_viewport: Option<Viewport>,
    viewport_is_default: bool,
    view: StereoTransform,
    projection: StereoTransform,
    registers: ShaderRegisterTracker,
}

impl<D: NativeDevice> BindingTable<D> {
    pub fn new(max_render_targets: u32, vertex_registers: u32, pixel_registers: u32) -> Self {
        Self {
            render_targets: (0..max_render_targets).map(|_| None).collect(),
            depth_stencil: None,
            textures: BTreeMap::new(),
            streams: BTreeMap::new(),
            indices: None,
            vertex_declaration: None,
            vertex_shader: None,
            pixel_shader: None,
            last_viewport: None,
            viewport_is_default: true,
            view: StereoTransform::UNSET,
            projection: StereoTransform::UNSET,
            registers: ShaderRegisterTracker::new(vertex_registers, pixel_registers),
        }
    }

    pub fn max_render_targets(&self) -> u32 {
        self.render_targets.len() as u32
    }

    pub fn render_target(&self, index: u32) -> Option<&StereoSurface<D>> {
        self.render_targets.get(index as usize)?.as_ref()
    }

    pub fn render_targets(&self) -> impl Iterator<Item = (u32, &StereoSurface<D>)> {
        self.render_targets
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| Some((index as u32, slot.as_ref()?)))
    }

    /// Replaces a render target slot. Out-of-range indices are ignored; callers validate first.
    pub fn set_render_target(&mut self, index: u32, surface: Option<StereoSurface<D>>) {
        if let Some(slot) = self.render_targets.get_mut(index as usize) {
            *slot = surface;
            self.viewport_is_default = true;
        }
    }

    pub fn depth_stencil(&self) -> Option<&StereoSurface<D>> {
        self.depth_stencil.as_ref()
    }

    pub fn set_depth_stencil(&mut self, surface: Option<StereoSurface<D>>) {
        self.depth_stencil = surface;
    }

    /// `None` when the stage was never touched, `Some(None)` when it was explicitly cleared.
    pub fn texture(&self, stage: u32) -> Option<Option<&StereoTexture<D>>> {
        self.textures.get(&stage).map(Option::as_ref)
    }

    pub fn textures(&self) -> impl Iterator<Item = (u32, Option<&StereoTexture<D>>)> {
        self.textures
            .iter()
            .map(|(stage, texture)| (*stage, texture.as_ref()))
    }

    pub fn stream(&self, stream: u32) -> Option<Option<&StreamBinding<D::VertexBuffer>>> {
        self.streams.get(&stream).map(Option::as_ref)
    }

    pub fn streams(
        &self,
    ) -> impl Iterator<Item = (u32, Option<&StreamBinding<D::VertexBuffer>>)> {
        self.streams
            .iter()
            .map(|(stream, binding)| (*stream, binding.as_ref()))
    }

    pub fn indices(&self) -> Option<&StereoIndexBuffer<D>> {
        self.indices.as_ref()
    }

    pub fn vertex_declaration(&self) -> Option<&VertexDeclarationHandle<D>> {
        self.vertex_declaration.as_ref()
    }

    pub fn vertex_shader(&self) -> Option<&VertexShaderHandle<D>> {
        self.vertex_shader.as_ref()
    }

    pub fn pixel_shader(&self) -> Option<&PixelShaderHandle<D>> {
        self.pixel_shader.as_ref()
    }

    pub fn last_viewport(&self) -> Option<Viewport> {
        self.last_viewport
    }

    pub fn viewport_is_default(&self) -> bool {
        self.viewport_is_default
    }

    pub fn view_transform(&self) -> &StereoTransform {
        &self.view
    }

    pub fn projection_transform(&self) -> &StereoTransform {
        &self.projection
    }

    pub fn registers(&self) -> &ShaderRegisterTracker {
        &self.registers
    }

    pub fn registers_mut(&mut self) -> &mut ShaderRegisterTracker {
        &mut self.registers
    }

    /// Releases every held resource and forgets all state.
    pub fn clear(&mut self) {
        for slot in &mut self.render_targets {
            *slot = None;
        }
        self.depth_stencil = None;
        self.textures.clear();
        self.streams.clear();
        self.indices = None;
        self.vertex_declaration = None;
        self.vertex_shader = None;
        self.pixel_shader = None;
        self.last_viewport = None;
        self.viewport_is_default = true;
        self.view = StereoTransform::UNSET;
        self.projection = StereoTransform::UNSET;
        self.registers.release_resources();
    }
}

fn rules_of<S>(shader: Option<&ProxyShader<S>>) -> Arc<ShaderRules> {
    shader
        .map(|shader| Arc::clone(shader.rules()))
        .unwrap_or_default()
}

impl<D: NativeDevice> StateSink<D> for BindingTable<D> {
    fn record_view_transform(&mut self, transform: StereoTransform) {
        self.view = transform;
    }

    fn record_projection_transform(&mut self, transform: StereoTransform) {
        self.projection = transform;
    }

    fn record_viewport(&mut self, viewport: Viewport, is_default: bool) {
        self.last_viewport = Some(viewport);
        self.viewport_is_default = is_default;
    }

    fn record_texture(&mut self, stage: u32, texture: Option<StereoTexture<D>>) {
        self.textures.insert(stage, texture);
    }

    fn record_stream_source(
        &mut self,
        stream: u32,
        binding: Option<StreamBinding<D::VertexBuffer>>,
    ) {
        self.streams.insert(stream, binding);
    }

    fn record_indices(&mut self, buffer: Option<StereoIndexBuffer<D>>) {
        self.indices = buffer;
    }

    fn record_vertex_declaration(&mut self, declaration: Option<VertexDeclarationHandle<D>>) {
        self.vertex_declaration = declaration;
    }

    fn record_vertex_shader(&mut self, shader: Option<VertexShaderHandle<D>>) {
        self.registers
            .active_vertex_shader_changed(rules_of(shader.as_ref()));
        self.vertex_shader = shader;
    }

    fn record_pixel_shader(&mut self, shader: Option<PixelShaderHandle<D>>) {
        self.registers
            .active_pixel_shader_changed(rules_of(shader.as_ref()));
        self.pixel_shader = shader;
    }

    fn record_shader_constants(
        &mut self,
        stage: ShaderStage,
        start: u32,
        data: &[f32],
    ) -> D3dResult<()> {
        self.registers.set_constant_f(stage, start, data)
    }
}
