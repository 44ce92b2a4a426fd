//! The device being wrapped.
//!
//! [`NativeDevice`] mirrors the subset of the D3D9 device interface the stereo mirror drives.
//! Handles are opaque associated types; the mirror only clones, compares and passes them back.

use std::fmt::Debug;

use glam::Mat4;

use crate::error::D3dResult;
use crate::state::{
    BufferDesc, ClearFlags, Color, DeviceCaps, IndexFormat, Point, PresentParameters,
    PrimitiveType, Rect, RectPatchInfo, StateBlockType, SurfaceDesc, TextureDesc, TextureFilter,
    TransformState, TriPatchInfo, VertexElement, Viewport,
};

pub trait NativeDevice {
    type Surface: Clone + Debug + PartialEq;
    /// Any base texture: 2D, cube or volume.
    type Texture: Clone + Debug + PartialEq;
    type VertexBuffer: Clone + Debug + PartialEq;
    type IndexBuffer: Clone + Debug + PartialEq;
    type VertexShader: Clone + Debug + PartialEq;
    type PixelShader: Clone + Debug + PartialEq;
    type VertexDeclaration: Clone + Debug + PartialEq;
    type StateBlock: Debug;

    fn caps(&self) -> DeviceCaps;

    // Creation.
    fn create_render_target(&mut self, desc: &SurfaceDesc, lockable: bool)
        -> D3dResult<Self::Surface>;
    fn create_depth_stencil_surface(
        &mut self,
        desc: &SurfaceDesc,
        discard: bool,
    ) -> D3dResult<Self::Surface>;
    fn create_offscreen_plain_surface(&mut self, desc: &SurfaceDesc) -> D3dResult<Self::Surface>;
    fn create_texture(&mut self, desc: &TextureDesc) -> D3dResult<Self::Texture>;
    fn create_vertex_buffer(&mut self, desc: &BufferDesc) -> D3dResult<Self::VertexBuffer>;
    fn create_index_buffer(&mut self, desc: &BufferDesc) -> D3dResult<Self::IndexBuffer>;
    fn create_vertex_shader(&mut self, function: &[u32]) -> D3dResult<Self::VertexShader>;
    fn create_pixel_shader(&mut self, function: &[u32]) -> D3dResult<Self::PixelShader>;
    fn create_vertex_declaration(
        &mut self,
        elements: &[VertexElement],
    ) -> D3dResult<Self::VertexDeclaration>;
    fn surface_desc(&self, surface: &Self::Surface) -> D3dResult<SurfaceDesc>;

    // Swap chain and device lifetime.
    /// Back buffer 0 of implicit swap chain 0.
    fn primary_back_buffer(&mut self) -> D3dResult<Self::Surface>;
    /// The automatic depth stencil, if the device was created with one.
    fn auto_depth_stencil(&mut self) -> D3dResult<Option<Self::Surface>>;
    fn viewport(&self) -> D3dResult<Viewport>;
    fn reset(&mut self, params: &PresentParameters) -> D3dResult<()>;
    fn begin_scene(&mut self) -> D3dResult<()>;
    fn end_scene(&mut self) -> D3dResult<()>;
    fn present(&mut self) -> D3dResult<()>;

    // State.
    fn set_render_target(&mut self, index: u32, surface: Option<&Self::Surface>) -> D3dResult<()>;
    fn set_depth_stencil_surface(&mut self, surface: Option<&Self::Surface>) -> D3dResult<()>;
    fn set_viewport(&mut self, viewport: &Viewport) -> D3dResult<()>;
    fn set_transform(&mut self, state: TransformState, matrix: &Mat4) -> D3dResult<()>;
    fn multiply_transform(&mut self, state: TransformState, matrix: &Mat4) -> D3dResult<()>;
    fn set_texture(&mut self, stage: u32, texture: Option<&Self::Texture>) -> D3dResult<()>;
    fn set_stream_source(
        &mut self,
        stream: u32,
        buffer: Option<&Self::VertexBuffer>,
        offset: u32,
        stride: u32,
    ) -> D3dResult<()>;
    fn set_indices(&mut self, buffer: Option<&Self::IndexBuffer>) -> D3dResult<()>;
    fn set_vertex_declaration(
        &mut self,
        declaration: Option<&Self::VertexDeclaration>,
    ) -> D3dResult<()>;
    fn set_vertex_shader(&mut self, shader: Option<&Self::VertexShader>) -> D3dResult<()>;
    fn set_pixel_shader(&mut self, shader: Option<&Self::PixelShader>) -> D3dResult<()>;
    fn set_vertex_shader_constant_f(&mut self, start: u32, data: &[f32]) -> D3dResult<()>;
    fn set_pixel_shader_constant_f(&mut self, start: u32, data: &[f32]) -> D3dResult<()>;

    // State blocks.
    fn begin_state_block(&mut self) -> D3dResult<()>;
    fn end_state_block(&mut self) -> D3dResult<Self::StateBlock>;
    fn create_state_block(&mut self, ty: StateBlockType) -> D3dResult<Self::StateBlock>;
    fn apply_state_block(&mut self, block: &Self::StateBlock) -> D3dResult<()>;
    fn capture_state_block(&mut self, block: &Self::StateBlock) -> D3dResult<()>;

    // Drawing.
    fn draw_primitive(
        &mut self,
        primitive: PrimitiveType,
        start_vertex: u32,
        primitive_count: u32,
    ) -> D3dResult<()>;
    #[allow(clippy::too_many_arguments)]
    fn draw_indexed_primitive(
        &mut self,
        primitive: PrimitiveType,
        base_vertex_index: i32,
        min_vertex_index: u32,
        num_vertices: u32,
        start_index: u32,
        primitive_count: u32,
    ) -> D3dResult<()>;
    fn draw_primitive_up(
        &mut self,
        primitive: PrimitiveType,
        primitive_count: u32,
        vertex_data: &[u8],
        vertex_stride: u32,
    ) -> D3dResult<()>;
    #[allow(clippy::too_many_arguments)]
    fn draw_indexed_primitive_up(
        &mut self,
        primitive: PrimitiveType,
        min_vertex_index: u32,
        num_vertices: u32,
        primitive_count: u32,
        index_data: &[u8],
        index_format: IndexFormat,
        vertex_data: &[u8],
        vertex_stride: u32,
    ) -> D3dResult<()>;
    fn draw_rect_patch(
        &mut self,
        handle: u32,
        segments: Option<&[f32; 4]>,
        info: Option<&RectPatchInfo>,
    ) -> D3dResult<()>;
    fn draw_tri_patch(
        &mut self,
        handle: u32,
        segments: Option<&[f32; 3]>,
        info: Option<&TriPatchInfo>,
    ) -> D3dResult<()>;
    fn process_vertices(
        &mut self,
        src_start_index: u32,
        dest_index: u32,
        vertex_count: u32,
        dest_buffer: &Self::VertexBuffer,
        declaration: Option<&Self::VertexDeclaration>,
        flags: u32,
    ) -> D3dResult<()>;
    fn clear(
        &mut self,
        rects: &[Rect],
        flags: ClearFlags,
        color: Color,
        z: f32,
        stencil: u32,
    ) -> D3dResult<()>;
    fn color_fill(
        &mut self,
        surface: &Self::Surface,
        rect: Option<&Rect>,
        color: Color,
    ) -> D3dResult<()>;

    // Copies.
    fn update_surface(
        &mut self,
        source: &Self::Surface,
        source_rect: Option<&Rect>,
        destination: &Self::Surface,
        destination_point: Option<&Point>,
    ) -> D3dResult<()>;
    fn update_texture(&mut self, source: &Self::Texture, destination: &Self::Texture)
        -> D3dResult<()>;
    fn get_render_target_data(
        &mut self,
        render_target: &Self::Surface,
        destination: &Self::Surface,
    ) -> D3dResult<()>;
    fn stretch_rect(
        &mut self,
        source: &Self::Surface,
        source_rect: Option<&Rect>,
        destination: &Self::Surface,
        destination_rect: Option<&Rect>,
        filter: TextureFilter,
    ) -> D3dResult<()>;
}
