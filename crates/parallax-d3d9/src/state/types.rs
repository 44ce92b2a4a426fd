use bitflags::bitflags;

/// First sampler index addressing vertex-shader texture fetch (`D3DVERTEXTEXTURESAMPLER0`).
pub const VERTEX_TEXTURE_SAMPLER0: u32 = 257;
pub const MAX_VERTEX_TEXTURE_SAMPLERS: u32 = 4;
pub const MAX_PIXEL_SAMPLERS: u32 = 16;

/// Whether `stage` names a pixel sampler or a vertex texture sampler.
pub fn is_valid_sampler(stage: u32) -> bool {
    stage < MAX_PIXEL_SAMPLERS
        || (VERTEX_TEXTURE_SAMPLER0..VERTEX_TEXTURE_SAMPLER0 + MAX_VERTEX_TEXTURE_SAMPLERS)
            .contains(&stage)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub min_z: f32,
    pub max_z: f32,
}

impl Viewport {
    /// Full-surface viewport for a `width` x `height` target.
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
            min_z: 0.0,
            max_z: 1.0,
        }
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Whether this viewport is what the device would reset to when a `target` is bound.
    pub fn covers(&self, target: &SurfaceDesc) -> bool {
        self.width == target.width
            && self.height == target.height
            && self.min_z <= 0.001
            && self.max_z >= 0.999
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// Packed `D3DCOLOR` (A8R8G8B8).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    pub fn argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self(u32::from_be_bytes([a, r, g, b]))
    }
}

bitflags! {
    /// `D3DCLEAR_*`
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u32 {
        const TARGET = 0x1;
        const ZBUFFER = 0x2;
        const STENCIL = 0x4;
    }
}

bitflags! {
    /// `D3DUSAGE_*` bits relevant to stereo duplication.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Usage: u32 {
        const RENDER_TARGET = 0x1;
        const DEPTH_STENCIL = 0x2;
        const WRITE_ONLY = 0x8;
        const DYNAMIC = 0x200;
        const AUTOGEN_MIPMAP = 0x400;
    }
}

impl Default for Usage {
    fn default() -> Self {
        Usage::empty()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Format {
    #[default]
    Unknown,
    A8R8G8B8,
    X8R8G8B8,
    R5G6B5,
    A16B16G16R16F,
    D16,
    D24S8,
    D24X8,
    D32,
    Index16,
    Index32,
    /// Any other `D3DFORMAT` code, carried through untouched.
    Other(u32),
}

impl Format {
    pub fn is_depth(self) -> bool {
        matches!(self, Format::D16 | Format::D24S8 | Format::D24X8 | Format::D32)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Pool {
    #[default]
    Default,
    Managed,
    SystemMem,
    Scratch,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MultiSample {
    pub samples: u32,
    pub quality: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SurfaceDesc {
    pub width: u32,
    pub height: u32,
    pub format: Format,
    pub usage: Usage,
    pub pool: Pool,
    pub multisample: MultiSample,
}

impl SurfaceDesc {
    pub fn is_square(&self) -> bool {
        self.width == self.height
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Texture2D,
    Cube,
    Volume { depth: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureDesc {
    pub kind: TextureKind,
    /// Edge length for cube textures.
    pub width: u32,
    pub height: u32,
    pub levels: u32,
    pub usage: Usage,
    pub format: Format,
    pub pool: Pool,
}

impl TextureDesc {
    pub fn is_square(&self) -> bool {
        self.width == self.height
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferDesc {
    pub length: u32,
    pub usage: Usage,
    /// Index format for index buffers; `Format::Unknown` for vertex buffers.
    pub format: Format,
    /// Flexible vertex format for vertex buffers.
    pub fvf: u32,
    pub pool: Pool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    U16,
    U32,
}

impl IndexFormat {
    pub fn size(self) -> usize {
        match self {
            IndexFormat::U16 => 2,
            IndexFormat::U32 => 4,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextureFilter {
    #[default]
    None,
    Point,
    Linear,
}

/// `D3DTRANSFORMSTATETYPE`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransformState {
    View,
    Projection,
    Texture(u8),
    World(u8),
}

/// `D3DSTATEBLOCKTYPE`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StateBlockType {
    All,
    PixelState,
    VertexState,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Pixel,
}

impl ShaderStage {
    pub fn name(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Pixel => "pixel",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShaderVersion {
    pub major: u8,
    pub minor: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceCaps {
    pub max_simultaneous_render_targets: u32,
    pub max_streams: u32,
    pub max_vertex_shader_constants: u32,
    pub pixel_shader_version: ShaderVersion,
}

impl DeviceCaps {
    /// Float constant registers available to pixel shaders of the supported model.
    pub fn max_pixel_shader_constants(&self) -> u32 {
        if self.pixel_shader_version.major >= 3 {
            224
        } else {
            32
        }
    }
}

impl Default for DeviceCaps {
    fn default() -> Self {
        Self {
            max_simultaneous_render_targets: 4,
            max_streams: 16,
            max_vertex_shader_constants: 256,
            pixel_shader_version: ShaderVersion { major: 3, minor: 0 },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PresentParameters {
    pub back_buffer_width: u32,
    pub back_buffer_height: u32,
    pub back_buffer_format: Format,
    pub back_buffer_count: u32,
    pub windowed: bool,
    pub auto_depth_stencil_format: Option<Format>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VertexElement {
    pub stream: u16,
    pub offset: u16,
    pub ty: u8,
    pub method: u8,
    pub usage: u8,
    pub usage_index: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RectPatchInfo {
    pub start_vertex_offset_width: u32,
    pub start_vertex_offset_height: u32,
    pub width: u32,
    pub height: u32,
    pub stride: u32,
    pub basis: u32,
    pub degree: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TriPatchInfo {
    pub start_vertex_offset: u32,
    pub num_vertices: u32,
    pub basis: u32,
    pub degree: u32,
}
