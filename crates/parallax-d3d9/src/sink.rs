//! Destination of setter bookkeeping: the live [`BindingTable`] or a state-block
//! [`CaptureBuffer`].
//!
//! Setters on the mirror compute their eye-resolved values once and hand them to whichever
//! sink is active, so recording a state block runs exactly the same code as live rendering.

use crate::binding::{BindingTable, StereoTransform, StreamBinding};
use crate::error::D3dResult;
use crate::native::NativeDevice;
use crate::resource::{
    PixelShaderHandle, StereoIndexBuffer, StereoTexture, VertexDeclarationHandle,
    VertexShaderHandle,
};
use crate::state::{ShaderStage, StateBlockType, Viewport};

pub trait StateSink<D: NativeDevice> {
    fn record_view_transform(&mut self, transform: StereoTransform);
    fn record_projection_transform(&mut self, transform: StereoTransform);
    fn record_viewport(&mut self, viewport: Viewport, is_default: bool);
    fn record_texture(&mut self, stage: u32, texture: Option<StereoTexture<D>>);
    fn record_stream_source(&mut self, stream: u32, binding: Option<StreamBinding<D::VertexBuffer>>);
    fn record_indices(&mut self, buffer: Option<StereoIndexBuffer<D>>);
    fn record_vertex_declaration(&mut self, declaration: Option<VertexDeclarationHandle<D>>);
    fn record_vertex_shader(&mut self, shader: Option<VertexShaderHandle<D>>);
    fn record_pixel_shader(&mut self, shader: Option<PixelShaderHandle<D>>);
    /// Register ranges are validated by the caller against the live register limits.
    fn record_shader_constants(&mut self, stage: ShaderStage, start: u32, data: &[f32])
        -> D3dResult<()>;
}

/// One piece of captured state.
pub enum CapturedState<D: NativeDevice> {
    ViewTransform(StereoTransform),
    ProjectionTransform(StereoTransform),
    Viewport { viewport: Viewport, is_default: bool },
    Texture { stage: u32, texture: Option<StereoTexture<D>> },
    StreamSource { stream: u32, binding: Option<StreamBinding<D::VertexBuffer>> },
    Indices(Option<StereoIndexBuffer<D>>),
    VertexDeclaration(Option<VertexDeclarationHandle<D>>),
    VertexShader(Option<VertexShaderHandle<D>>),
    PixelShader(Option<PixelShaderHandle<D>>),
    ShaderConstants { stage: ShaderStage, start: u32, data: Vec<f32> },
}

/// Slot identity of a [`CapturedState`]; a later capture of the same slot replaces the
/// earlier one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StateKey {
    ViewTransform,
    ProjectionTransform,
    Viewport,
    Texture(u32),
    StreamSource(u32),
    Indices,
    VertexDeclaration,
    VertexShader,
    PixelShader,
}

impl<D: NativeDevice> CapturedState<D> {
    /// `None` for shader constants, which are kept in capture order.
    pub fn key(&self) -> Option<StateKey> {
        Some(match self {
            CapturedState::ViewTransform(_) => StateKey::ViewTransform,
            CapturedState::ProjectionTransform(_) => StateKey::ProjectionTransform,
            CapturedState::Viewport { .. } => StateKey::Viewport,
            CapturedState::Texture { stage, .. } => StateKey::Texture(*stage),
            CapturedState::StreamSource { stream, .. } => StateKey::StreamSource(*stream),
            CapturedState::Indices(_) => StateKey::Indices,
            CapturedState::VertexDeclaration(_) => StateKey::VertexDeclaration,
            CapturedState::VertexShader(_) => StateKey::VertexShader,
            CapturedState::PixelShader(_) => StateKey::PixelShader,
            CapturedState::ShaderConstants { .. } => return None,
        })
    }

    /// The same slot's value in `table`.
    pub fn refreshed_from(&self, table: &BindingTable<D>) -> Self {
        match self {
            CapturedState::ViewTransform(_) => {
                CapturedState::ViewTransform(*table.view_transform())
            }
            CapturedState::ProjectionTransform(_) => {
                CapturedState::ProjectionTransform(*table.projection_transform())
            }
            CapturedState::Viewport { viewport, .. } => CapturedState::Viewport {
                viewport: table.last_viewport().unwrap_or(*viewport),
                is_default: table.viewport_is_default(),
            },
            CapturedState::Texture { stage, .. } => CapturedState::Texture {
                stage: *stage,
                texture: table.texture(*stage).flatten().cloned(),
            },
            CapturedState::StreamSource { stream, .. } => CapturedState::StreamSource {
                stream: *stream,
                binding: table.stream(*stream).flatten().cloned(),
            },
            CapturedState::Indices(_) => CapturedState::Indices(table.indices().cloned()),
            CapturedState::VertexDeclaration(_) => {
                CapturedState::VertexDeclaration(table.vertex_declaration().cloned())
            }
            CapturedState::VertexShader(_) => {
                CapturedState::VertexShader(table.vertex_shader().cloned())
            }
            CapturedState::PixelShader(_) => {
                CapturedState::PixelShader(table.pixel_shader().cloned())
            }
            CapturedState::ShaderConstants { stage, start, data } => {
                let count = (data.len() / 4) as u32;
                let data = table
                    .registers()
                    .get_constant_f(*stage, *start, count)
                    .unwrap_or_else(|_| data.clone());
                CapturedState::ShaderConstants {
                    stage: *stage,
                    start: *start,
                    data,
                }
            }
        }
    }
}

/// State recorded between `begin_state_block` and `end_state_block`, or snapshotted by
/// `create_state_block`.
pub struct CaptureBuffer<D: NativeDevice> {
    entries: Vec<CapturedState<D>>,
}

impl<D: NativeDevice> Default for CaptureBuffer<D> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<D: NativeDevice> CaptureBuffer<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures the parts of `table` that a block of type `ty` covers.
    pub fn snapshot(table: &BindingTable<D>, ty: StateBlockType) -> Self {
        let mut buffer = Self::new();
        let vertex = matches!(ty, StateBlockType::All | StateBlockType::VertexState);
        let pixel = matches!(ty, StateBlockType::All | StateBlockType::PixelState);

        if vertex {
            buffer.push(CapturedState::ViewTransform(*table.view_transform()));
            buffer.push(CapturedState::ProjectionTransform(
                *table.projection_transform(),
            ));
        }
        if ty == StateBlockType::All {
            if let Some(viewport) = table.last_viewport() {
                buffer.push(CapturedState::Viewport {
                    viewport,
                    is_default: table.viewport_is_default(),
                });
            }
        }
        if pixel {
            for (stage, texture) in table.textures() {
                buffer.push(CapturedState::Texture {
                    stage,
                    texture: texture.cloned(),
                });
            }
        }
        if vertex {
            for (stream, binding) in table.streams() {
                buffer.push(CapturedState::StreamSource {
                    stream,
                    binding: binding.cloned(),
                });
            }
            buffer.push(CapturedState::VertexDeclaration(
                table.vertex_declaration().cloned(),
            ));
        }
        if ty == StateBlockType::All {
            buffer.push(CapturedState::Indices(table.indices().cloned()));
        }
        if vertex {
            buffer.push(CapturedState::VertexShader(table.vertex_shader().cloned()));
            buffer.push_constants(table, ShaderStage::Vertex);
        }
        if pixel {
            buffer.push(CapturedState::PixelShader(table.pixel_shader().cloned()));
            buffer.push_constants(table, ShaderStage::Pixel);
        }
        buffer
    }

    fn push_constants(&mut self, table: &BindingTable<D>, stage: ShaderStage) {
        for (start, data) in table.registers().written_blocks(stage) {
            self.push(CapturedState::ShaderConstants { stage, start, data });
        }
    }

    /// Adds `entry`, replacing an earlier capture of the same slot in place.
    pub fn push(&mut self, entry: CapturedState<D>) {
        if let Some(key) = entry.key() {
            if let Some(existing) = self
                .entries
                .iter_mut()
                .find(|existing| existing.key() == Some(key))
            {
                *existing = entry;
                return;
            }
        }
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[CapturedState<D>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<CapturedState<D>> {
        self.entries
    }
}

impl<D: NativeDevice> StateSink<D> for CaptureBuffer<D> {
    fn record_view_transform(&mut self, transform: StereoTransform) {
        self.push(CapturedState::ViewTransform(transform));
    }

    fn record_projection_transform(&mut self, transform: StereoTransform) {
        self.push(CapturedState::ProjectionTransform(transform));
    }

    fn record_viewport(&mut self, viewport: Viewport, is_default: bool) {
        self.push(CapturedState::Viewport {
            viewport,
            is_default,
        });
    }

    fn record_texture(&mut self, stage: u32, texture: Option<StereoTexture<D>>) {
        self.push(CapturedState::Texture { stage, texture });
    }

    fn record_stream_source(
        &mut self,
        stream: u32,
        binding: Option<StreamBinding<D::VertexBuffer>>,
    ) {
        self.push(CapturedState::StreamSource { stream, binding });
    }

    fn record_indices(&mut self, buffer: Option<StereoIndexBuffer<D>>) {
        self.push(CapturedState::Indices(buffer));
    }

    fn record_vertex_declaration(&mut self, declaration: Option<VertexDeclarationHandle<D>>) {
        self.push(CapturedState::VertexDeclaration(declaration));
    }

    fn record_vertex_shader(&mut self, shader: Option<VertexShaderHandle<D>>) {
        self.push(CapturedState::VertexShader(shader));
    }

    fn record_pixel_shader(&mut self, shader: Option<PixelShaderHandle<D>>) {
        self.push(CapturedState::PixelShader(shader));
    }

    fn record_shader_constants(
        &mut self,
        stage: ShaderStage,
        start: u32,
        data: &[f32],
    ) -> D3dResult<()> {
        self.push(CapturedState::ShaderConstants {
            stage,
            start,
            data: data.to_vec(),
        });
        Ok(())
    }
}
