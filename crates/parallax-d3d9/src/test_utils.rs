//! A scriptable [`NativeDevice`] for tests.
//!
//! [`RecordingDevice`] hands out numbered handles, logs every state-changing call as a
//! [`Call`], emulates the few device behaviors the mirror depends on (binding render target 0
//! resets the viewport, the primary back buffer and optional auto depth stencil exist from the
//! start) and can be told to fail specific operations.

use std::collections::{HashMap, HashSet};

use glam::Mat4;

use crate::error::{D3dError, D3dResult};
use crate::native::NativeDevice;
use crate::state::{
    BufferDesc, ClearFlags, Color, DeviceCaps, Format, IndexFormat, Point, PresentParameters,
    PrimitiveType, Rect, RectPatchInfo, StateBlockType, SurfaceDesc, TextureDesc, TextureFilter,
    TransformState, TriPatchInfo, Usage, VertexElement, Viewport,
};

macro_rules! handle {
    ($($name:ident),* $(,)?) => {
        $(
            #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub struct $name(pub u32);
        )*
    };
}

handle!(
    SurfaceId,
    TextureId,
    VertexBufferId,
    IndexBufferId,
    VertexShaderId,
    PixelShaderId,
    DeclarationId,
    StateBlockId,
);

/// Handle of the swap chain back buffer.
pub const PRIMARY_BACK_BUFFER: SurfaceId = SurfaceId(0);
/// Handle of the automatic depth stencil, when enabled.
pub const AUTO_DEPTH_STENCIL: SurfaceId = SurfaceId(1);

pub const BACK_BUFFER_WIDTH: u32 = 1280;
pub const BACK_BUFFER_HEIGHT: u32 = 720;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreateKind {
    RenderTarget,
    DepthStencil,
    OffscreenPlain,
    Texture,
    VertexBuffer,
    IndexBuffer,
    VertexShader,
    PixelShader,
    VertexDeclaration,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawKind {
    Primitive,
    IndexedPrimitive,
    PrimitiveUp,
    IndexedPrimitiveUp,
    RectPatch,
    TriPatch,
    ProcessVertices,
    Clear,
    ColorFill,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CopyKind {
    UpdateSurface,
    UpdateTexture,
    GetRenderTargetData,
    StretchRect,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Create { kind: CreateKind, id: u32 },
    SetRenderTarget { index: u32, surface: Option<SurfaceId> },
    SetDepthStencil(Option<SurfaceId>),
    SetViewport(Viewport),
    SetTransform { state: TransformState, matrix: Mat4 },
    MultiplyTransform { state: TransformState, matrix: Mat4 },
    SetTexture { stage: u32, texture: Option<TextureId> },
    SetStreamSource {
        stream: u32,
        buffer: Option<VertexBufferId>,
        offset: u32,
        stride: u32,
    },
    SetIndices(Option<IndexBufferId>),
    SetVertexDeclaration(Option<DeclarationId>),
    SetVertexShader(Option<VertexShaderId>),
    SetPixelShader(Option<PixelShaderId>),
    SetVertexShaderConstantF { start: u32, data: Vec<f32> },
    SetPixelShaderConstantF { start: u32, data: Vec<f32> },
    BeginStateBlock,
    EndStateBlock(StateBlockId),
    CreateStateBlock { ty: StateBlockType, id: StateBlockId },
    ApplyStateBlock(StateBlockId),
    CaptureStateBlock(StateBlockId),
    /// Draws, clears and fills, with render target 0 at the time of the call.
    Draw { kind: DrawKind, target: Option<SurfaceId> },
    Copy { kind: CopyKind, source: u32, destination: u32 },
    Reset,
    BeginScene,
    EndScene,
    Present,
}

pub struct RecordingDevice {
    caps: DeviceCaps,
    next_id: u32,
    surfaces: HashMap<SurfaceId, SurfaceDesc>,
    render_targets: Vec<Option<SurfaceId>>,
    viewport: Viewport,
    auto_depth_stencil: bool,
    calls: Vec<Call>,
    creations: usize,
    failing_creations: HashSet<usize>,
    failing_draw_targets: HashSet<SurfaceId>,
    failing_copy_destinations: HashSet<u32>,
    fail_back_buffer: bool,
    fail_reset: bool,
}

impl Default for RecordingDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingDevice {
    /// A device with a 1280x720 back buffer and no auto depth stencil.
    pub fn new() -> Self {
        let caps = DeviceCaps::default();
        let mut surfaces = HashMap::new();
        surfaces.insert(
            PRIMARY_BACK_BUFFER,
            SurfaceDesc {
                width: BACK_BUFFER_WIDTH,
                height: BACK_BUFFER_HEIGHT,
                format: Format::X8R8G8B8,
                usage: Usage::RENDER_TARGET,
                ..SurfaceDesc::default()
            },
        );
        let mut render_targets = vec![None; caps.max_simultaneous_render_targets as usize];
        render_targets[0] = Some(PRIMARY_BACK_BUFFER);
        Self {
            caps,
            next_id: 2,
            surfaces,
            render_targets,
            viewport: Viewport::full(BACK_BUFFER_WIDTH, BACK_BUFFER_HEIGHT),
            auto_depth_stencil: false,
            calls: Vec::new(),
            creations: 0,
            failing_creations: HashSet::new(),
            failing_draw_targets: HashSet::new(),
            failing_copy_destinations: HashSet::new(),
            fail_back_buffer: false,
            fail_reset: false,
        }
    }

    pub fn with_auto_depth_stencil(mut self) -> Self {
        self.surfaces.insert(
            AUTO_DEPTH_STENCIL,
            SurfaceDesc {
                width: BACK_BUFFER_WIDTH,
                height: BACK_BUFFER_HEIGHT,
                format: Format::D24S8,
                usage: Usage::DEPTH_STENCIL,
                ..SurfaceDesc::default()
            },
        );
        self.auto_depth_stencil = true;
        self
    }

    /// A device whose swap chain cannot be queried.
    pub fn without_back_buffer(mut self) -> Self {
        self.fail_back_buffer = true;
        self
    }

    pub fn with_caps(mut self, caps: DeviceCaps) -> Self {
        self.render_targets
            .resize(caps.max_simultaneous_render_targets as usize, None);
        self.caps = caps;
        self
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn take_calls(&mut self) -> Vec<Call> {
        std::mem::take(&mut self.calls)
    }

    /// Targets of every recorded draw, clear and fill, in order.
    pub fn draw_targets(&self) -> Vec<Option<SurfaceId>> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Draw { target, .. } => Some(*target),
                _ => None,
            })
            .collect()
    }

    /// Makes the creation `skip` calls from now fail. `fail_creation_after(1)` before a stereo
    /// creation fails the right-eye instance.
    pub fn fail_creation_after(&mut self, skip: usize) {
        self.failing_creations.insert(self.creations + skip);
    }

    /// Draws, clears and fills fail while `surface` is render target 0.
    pub fn fail_draws_on(&mut self, surface: SurfaceId) {
        self.failing_draw_targets.insert(surface);
    }

    /// Copies into the surface or texture with raw handle `destination` fail.
    pub fn fail_copies_to(&mut self, destination: u32) {
        self.failing_copy_destinations.insert(destination);
    }

    pub fn fail_resets(&mut self, fail: bool) {
        self.fail_reset = fail;
    }

    pub fn render_target(&self, index: u32) -> Option<SurfaceId> {
        self.render_targets.get(index as usize).copied().flatten()
    }

    fn allocate(&mut self, kind: CreateKind) -> D3dResult<u32> {
        let attempt = self.creations;
        self.creations += 1;
        if self.failing_creations.remove(&attempt) {
            return Err(D3dError::Device(format!("injected {kind:?} creation failure")));
        }
        let id = self.next_id;
        self.next_id += 1;
        self.calls.push(Call::Create { kind, id });
        Ok(id)
    }

    fn create_surface(&mut self, kind: CreateKind, desc: &SurfaceDesc) -> D3dResult<SurfaceId> {
        let id = SurfaceId(self.allocate(kind)?);
        self.surfaces.insert(id, *desc);
        Ok(id)
    }

    fn draw(&mut self, kind: DrawKind) -> D3dResult<()> {
        let target = self.render_target(0);
        self.calls.push(Call::Draw { kind, target });
        match target {
            Some(target) if self.failing_draw_targets.contains(&target) => {
                Err(D3dError::Device(format!("injected {kind:?} failure")))
            }
            _ => Ok(()),
        }
    }

    fn copy(&mut self, kind: CopyKind, source: u32, destination: u32) -> D3dResult<()> {
        self.calls.push(Call::Copy {
            kind,
            source,
            destination,
        });
        if self.failing_copy_destinations.contains(&destination) {
            return Err(D3dError::Device(format!("injected {kind:?} failure")));
        }
        Ok(())
    }
}

impl NativeDevice for RecordingDevice {
    type Surface = SurfaceId;
    type Texture = TextureId;
    type VertexBuffer = VertexBufferId;
    type IndexBuffer = IndexBufferId;
    type VertexShader = VertexShaderId;
    type PixelShader = PixelShaderId;
    type VertexDeclaration = DeclarationId;
    type StateBlock = StateBlockId;

    fn caps(&self) -> DeviceCaps {
        self.caps
    }

    fn create_render_target(&mut self, desc: &SurfaceDesc, _lockable: bool) -> D3dResult<SurfaceId> {
        self.create_surface(CreateKind::RenderTarget, desc)
    }

    fn create_depth_stencil_surface(
        &mut self,
        desc: &SurfaceDesc,
        _discard: bool,
    ) -> D3dResult<SurfaceId> {
        self.create_surface(CreateKind::DepthStencil, desc)
    }

    fn create_offscreen_plain_surface(&mut self, desc: &SurfaceDesc) -> D3dResult<SurfaceId> {
        self.create_surface(CreateKind::OffscreenPlain, desc)
    }

    fn create_texture(&mut self, _desc: &TextureDesc) -> D3dResult<TextureId> {
        self.allocate(CreateKind::Texture).map(TextureId)
    }

    fn create_vertex_buffer(&mut self, _desc: &BufferDesc) -> D3dResult<VertexBufferId> {
        self.allocate(CreateKind::VertexBuffer).map(VertexBufferId)
    }

    fn create_index_buffer(&mut self, _desc: &BufferDesc) -> D3dResult<IndexBufferId> {
        self.allocate(CreateKind::IndexBuffer).map(IndexBufferId)
    }

    fn create_vertex_shader(&mut self, _function: &[u32]) -> D3dResult<VertexShaderId> {
        self.allocate(CreateKind::VertexShader).map(VertexShaderId)
    }

    fn create_pixel_shader(&mut self, _function: &[u32]) -> D3dResult<PixelShaderId> {
        self.allocate(CreateKind::PixelShader).map(PixelShaderId)
    }

    fn create_vertex_declaration(
        &mut self,
        _elements: &[VertexElement],
    ) -> D3dResult<DeclarationId> {
        self.allocate(CreateKind::VertexDeclaration).map(DeclarationId)
    }

    fn surface_desc(&self, surface: &SurfaceId) -> D3dResult<SurfaceDesc> {
        self.surfaces
            .get(surface)
            .copied()
            .ok_or(D3dError::NotFound("surface"))
    }

    fn primary_back_buffer(&mut self) -> D3dResult<SurfaceId> {
        if self.fail_back_buffer {
            return Err(D3dError::Device("no swap chain".into()));
        }
        Ok(PRIMARY_BACK_BUFFER)
    }

    fn auto_depth_stencil(&mut self) -> D3dResult<Option<SurfaceId>> {
        Ok(self.auto_depth_stencil.then_some(AUTO_DEPTH_STENCIL))
    }

    fn viewport(&self) -> D3dResult<Viewport> {
        Ok(self.viewport)
    }

    fn reset(&mut self, _params: &PresentParameters) -> D3dResult<()> {
        self.calls.push(Call::Reset);
        if self.fail_reset {
            return Err(D3dError::Device("injected reset failure".into()));
        }
        for slot in &mut self.render_targets {
            *slot = None;
        }
        self.render_targets[0] = Some(PRIMARY_BACK_BUFFER);
        self.viewport = Viewport::full(BACK_BUFFER_WIDTH, BACK_BUFFER_HEIGHT);
        Ok(())
    }

    fn begin_scene(&mut self) -> D3dResult<()> {
        self.calls.push(Call::BeginScene);
        Ok(())
    }

    fn end_scene(&mut self) -> D3dResult<()> {
        self.calls.push(Call::EndScene);
        Ok(())
    }

    fn present(&mut self) -> D3dResult<()> {
        self.calls.push(Call::Present);
        Ok(())
    }

    fn set_render_target(&mut self, index: u32, surface: Option<&SurfaceId>) -> D3dResult<()> {
        let slot = self
            .render_targets
            .get_mut(index as usize)
            .ok_or(D3dError::InvalidCall("render target index"))?;
        *slot = surface.copied();
        self.calls.push(Call::SetRenderTarget {
            index,
            surface: surface.copied(),
        });
        if index == 0 {
            if let Some(desc) = surface.and_then(|s| self.surfaces.get(s)) {
                self.viewport = Viewport::full(desc.width, desc.height);
            }
        }
        Ok(())
    }

    fn set_depth_stencil_surface(&mut self, surface: Option<&SurfaceId>) -> D3dResult<()> {
        self.calls.push(Call::SetDepthStencil(surface.copied()));
        Ok(())
    }

    fn set_viewport(&mut self, viewport: &Viewport) -> D3dResult<()> {
        self.viewport = *viewport;
        self.calls.push(Call::SetViewport(*viewport));
        Ok(())
    }

    fn set_transform(&mut self, state: TransformState, matrix: &Mat4) -> D3dResult<()> {
        self.calls.push(Call::SetTransform {
            state,
            matrix: *matrix,
        });
        Ok(())
    }

    fn multiply_transform(&mut self, state: TransformState, matrix: &Mat4) -> D3dResult<()> {
        self.calls.push(Call::MultiplyTransform {
            state,
            matrix: *matrix,
        });
        Ok(())
    }

    fn set_texture(&mut self, stage: u32, texture: Option<&TextureId>) -> D3dResult<()> {
        self.calls.push(Call::SetTexture {
            stage,
            texture: texture.copied(),
        });
        Ok(())
    }

    fn set_stream_source(
        &mut self,
        stream: u32,
        buffer: Option<&VertexBufferId>,
        offset: u32,
        stride: u32,
    ) -> D3dResult<()> {
        self.calls.push(Call::SetStreamSource {
            stream,
            buffer: buffer.copied(),
            offset,
            stride,
        });
        Ok(())
    }

    fn set_indices(&mut self, buffer: Option<&IndexBufferId>) -> D3dResult<()> {
        self.calls.push(Call::SetIndices(buffer.copied()));
        Ok(())
    }

    fn set_vertex_declaration(&mut self, declaration: Option<&DeclarationId>) -> D3dResult<()> {
        self.calls
            .push(Call::SetVertexDeclaration(declaration.copied()));
        Ok(())
    }

    fn set_vertex_shader(&mut self, shader: Option<&VertexShaderId>) -> D3dResult<()> {
        self.calls.push(Call::SetVertexShader(shader.copied()));
        Ok(())
    }

    fn set_pixel_shader(&mut self, shader: Option<&PixelShaderId>) -> D3dResult<()> {
        self.calls.push(Call::SetPixelShader(shader.copied()));
        Ok(())
    }

    fn set_vertex_shader_constant_f(&mut self, start: u32, data: &[f32]) -> D3dResult<()> {
        self.calls.push(Call::SetVertexShaderConstantF {
            start,
            data: data.to_vec(),
        });
        Ok(())
    }

    fn set_pixel_shader_constant_f(&mut self, start: u32, data: &[f32]) -> D3dResult<()> {
        self.calls.push(Call::SetPixelShaderConstantF {
            start,
            data: data.to_vec(),
        });
        Ok(())
    }

    fn begin_state_block(&mut self) -> D3dResult<()> {
        self.calls.push(Call::BeginStateBlock);
        Ok(())
    }

    fn end_state_block(&mut self) -> D3dResult<StateBlockId> {
        let id = StateBlockId(self.next_id);
        self.next_id += 1;
        self.calls.push(Call::EndStateBlock(id));
        Ok(id)
    }

    fn create_state_block(&mut self, ty: StateBlockType) -> D3dResult<StateBlockId> {
        let id = StateBlockId(self.next_id);
        self.next_id += 1;
        self.calls.push(Call::CreateStateBlock { ty, id });
        Ok(id)
    }

    fn apply_state_block(&mut self, block: &StateBlockId) -> D3dResult<()> {
        self.calls.push(Call::ApplyStateBlock(*block));
        Ok(())
    }

    fn capture_state_block(&mut self, block: &StateBlockId) -> D3dResult<()> {
        self.calls.push(Call::CaptureStateBlock(*block));
        Ok(())
    }

    fn draw_primitive(
        &mut self,
        _primitive: PrimitiveType,
        _start_vertex: u32,
        _primitive_count: u32,
    ) -> D3dResult<()> {
        self.draw(DrawKind::Primitive)
    }

    fn draw_indexed_primitive(
        &mut self,
        _primitive: PrimitiveType,
        _base_vertex_index: i32,
        _min_vertex_index: u32,
        _num_vertices: u32,
        _start_index: u32,
        _primitive_count: u32,
    ) -> D3dResult<()> {
        self.draw(DrawKind::IndexedPrimitive)
    }

    fn draw_primitive_up(
        &mut self,
        _primitive: PrimitiveType,
        _primitive_count: u32,
        _vertex_data: &[u8],
        _vertex_stride: u32,
    ) -> D3dResult<()> {
        self.draw(DrawKind::PrimitiveUp)
    }

    fn draw_indexed_primitive_up(
        &mut self,
        _primitive: PrimitiveType,
        _min_vertex_index: u32,
        _num_vertices: u32,
        _primitive_count: u32,
        _index_data: &[u8],
        _index_format: IndexFormat,
        _vertex_data: &[u8],
        _vertex_stride: u32,
    ) -> D3dResult<()> {
        self.draw(DrawKind::IndexedPrimitiveUp)
    }

    fn draw_rect_patch(
        &mut self,
        _handle: u32,
        _segments: Option<&[f32; 4]>,
        _info: Option<&RectPatchInfo>,
    ) -> D3dResult<()> {
        self.draw(DrawKind::RectPatch)
    }

    fn draw_tri_patch(
        &mut self,
        _handle: u32,
        _segments: Option<&[f32; 3]>,
        _info: Option<&TriPatchInfo>,
    ) -> D3dResult<()> {
        self.draw(DrawKind::TriPatch)
    }

    fn process_vertices(
        &mut self,
        _src_start_index: u32,
        _dest_index: u32,
        _vertex_count: u32,
        _dest_buffer: &VertexBufferId,
        _declaration: Option<&DeclarationId>,
        _flags: u32,
    ) -> D3dResult<()> {
        self.draw(DrawKind::ProcessVertices)
    }

    fn clear(
        &mut self,
        _rects: &[Rect],
        _flags: ClearFlags,
        _color: Color,
        _z: f32,
        _stencil: u32,
    ) -> D3dResult<()> {
        self.draw(DrawKind::Clear)
    }

    fn color_fill(
        &mut self,
        surface: &SurfaceId,
        _rect: Option<&Rect>,
        _color: Color,
    ) -> D3dResult<()> {
        self.calls.push(Call::Draw {
            kind: DrawKind::ColorFill,
            target: Some(*surface),
        });
        if self.failing_draw_targets.contains(surface) {
            return Err(D3dError::Device("injected ColorFill failure".into()));
        }
        Ok(())
    }

    fn update_surface(
        &mut self,
        source: &SurfaceId,
        _source_rect: Option<&Rect>,
        destination: &SurfaceId,
        _destination_point: Option<&Point>,
    ) -> D3dResult<()> {
        self.copy(CopyKind::UpdateSurface, source.0, destination.0)
    }

    fn update_texture(&mut self, source: &TextureId, destination: &TextureId) -> D3dResult<()> {
        self.copy(CopyKind::UpdateTexture, source.0, destination.0)
    }

    fn get_render_target_data(
        &mut self,
        render_target: &SurfaceId,
        destination: &SurfaceId,
    ) -> D3dResult<()> {
        self.copy(CopyKind::GetRenderTargetData, render_target.0, destination.0)
    }

    fn stretch_rect(
        &mut self,
        source: &SurfaceId,
        _source_rect: Option<&Rect>,
        destination: &SurfaceId,
        _destination_rect: Option<&Rect>,
        _filter: TextureFilter,
    ) -> D3dResult<()> {
        self.copy(CopyKind::StretchRect, source.0, destination.0)
    }
}
