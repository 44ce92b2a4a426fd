//! Draws, clears and copies.
//!
//! Draw-type calls go to the device once per eye, left first. Only the left result is
//! reported; a failing right-eye call is logged and counted. Copies are resolved per eye pair
//! rather than per active eye.

use parallax_view::Eye;
use tracing::warn;

use crate::error::{D3dError, D3dResult};
use crate::heuristics::StereoHeuristics;
use crate::native::NativeDevice;
use crate::resource::{
    DualResource, StereoSurface, StereoTexture, StereoVertexBuffer, VertexDeclarationHandle,
};
use crate::state::{
    ClearFlags, Color, IndexFormat, Point, PrimitiveType, Rect, RectPatchInfo, TextureFilter,
    TriPatchInfo,
};

use super::StereoDevice;

impl<D: NativeDevice, H: StereoHeuristics> StereoDevice<D, H> {
    /// Flushes dirty constants for the left eye, then issues `call` for both eyes.
    fn draw_stereo<F>(&mut self, what: &'static str, call: F) -> D3dResult<()>
    where
        F: FnMut(&mut D) -> D3dResult<()>,
    {
        self.begin_left_pass();
        let eye = self.eye;
        self.bindings
            .registers_mut()
            .apply_all_dirty(eye, &self.view, &mut self.device)?;
        self.issue_twice(what, call)
    }

    /// Returns to the left eye if the previous stereo call left the right eye active.
    ///
    /// A stereo draw therefore costs two full eye switches, each rebinding every stereo slot
    /// and re-uploading the per-eye constants.
    fn begin_left_pass(&mut self) {
        if self.eye == Eye::Right {
            self.try_set_active_eye(Eye::Left);
        }
    }

    /// Issues `call` for the active eye, then again for the other eye if it is available.
    fn issue_twice<F>(&mut self, what: &'static str, mut call: F) -> D3dResult<()>
    where
        F: FnMut(&mut D) -> D3dResult<()>,
    {
        call(&mut self.device)?;
        self.stats.inc_draws();

        if self.switch_drawing_side() {
            match call(&mut self.device) {
                Ok(()) => self.stats.inc_second_eye_draws(),
                Err(err) => {
                    self.stats.inc_second_eye_failures();
                    warn!(what, eye = %self.eye, %err, "second eye call failed");
                }
            }
        }
        Ok(())
    }

    pub fn draw_primitive(
        &mut self,
        primitive: PrimitiveType,
        start_vertex: u32,
        primitive_count: u32,
    ) -> D3dResult<()> {
        self.draw_stereo("draw_primitive", |device| {
            device.draw_primitive(primitive, start_vertex, primitive_count)
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_indexed_primitive(
        &mut self,
        primitive: PrimitiveType,
        base_vertex_index: i32,
        min_vertex_index: u32,
        num_vertices: u32,
        start_index: u32,
        primitive_count: u32,
    ) -> D3dResult<()> {
        self.draw_stereo("draw_indexed_primitive", |device| {
            device.draw_indexed_primitive(
                primitive,
                base_vertex_index,
                min_vertex_index,
                num_vertices,
                start_index,
                primitive_count,
            )
        })
    }

    /// Draws from application memory. `vertex_data` must hold every vertex the primitives use.
    pub fn draw_primitive_up(
        &mut self,
        primitive: PrimitiveType,
        primitive_count: u32,
        vertex_data: &[u8],
        vertex_stride: u32,
    ) -> D3dResult<()> {
        let needed = primitive
            .vertex_count(primitive_count)
            .and_then(|count| byte_len(count, vertex_stride as usize))
            .ok_or(D3dError::InvalidCall("primitive count too large"))?;
        if vertex_data.is_empty() || vertex_data.len() < needed {
            return Err(D3dError::InvalidCall("vertex data too short"));
        }
        self.draw_stereo("draw_primitive_up", |device| {
            device.draw_primitive_up(primitive, primitive_count, vertex_data, vertex_stride)
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_indexed_primitive_up(
        &mut self,
        primitive: PrimitiveType,
        min_vertex_index: u32,
        num_vertices: u32,
        primitive_count: u32,
        index_data: &[u8],
        index_format: IndexFormat,
        vertex_data: &[u8],
        vertex_stride: u32,
    ) -> D3dResult<()> {
        let indices = primitive
            .vertex_count(primitive_count)
            .and_then(|count| byte_len(count, index_format.size()))
            .ok_or(D3dError::InvalidCall("primitive count too large"))?;
        if index_data.is_empty() || index_data.len() < indices {
            return Err(D3dError::InvalidCall("index data too short"));
        }
        let vertices = min_vertex_index
            .checked_add(num_vertices)
            .and_then(|count| byte_len(count, vertex_stride as usize))
            .ok_or(D3dError::InvalidCall("vertex range too large"))?;
        if vertex_data.is_empty() || vertex_data.len() < vertices {
            return Err(D3dError::InvalidCall("vertex data too short"));
        }
        self.draw_stereo("draw_indexed_primitive_up", |device| {
            device.draw_indexed_primitive_up(
                primitive,
                min_vertex_index,
                num_vertices,
                primitive_count,
                index_data,
                index_format,
                vertex_data,
                vertex_stride,
            )
        })
    }

    pub fn draw_rect_patch(
        &mut self,
        handle: u32,
        segments: Option<&[f32; 4]>,
        info: Option<&RectPatchInfo>,
    ) -> D3dResult<()> {
        self.draw_stereo("draw_rect_patch", |device| {
            device.draw_rect_patch(handle, segments, info)
        })
    }

    pub fn draw_tri_patch(
        &mut self,
        handle: u32,
        segments: Option<&[f32; 3]>,
        info: Option<&TriPatchInfo>,
    ) -> D3dResult<()> {
        self.draw_stereo("draw_tri_patch", |device| {
            device.draw_tri_patch(handle, segments, info)
        })
    }

    pub fn process_vertices(
        &mut self,
        src_start_index: u32,
        dest_index: u32,
        vertex_count: u32,
        dest_buffer: Option<&StereoVertexBuffer<D>>,
        declaration: Option<&VertexDeclarationHandle<D>>,
        flags: u32,
    ) -> D3dResult<()> {
        let dest_buffer = dest_buffer.ok_or(D3dError::InvalidCall("destination buffer is null"))?;
        self.draw_stereo("process_vertices", |device| {
            device.process_vertices(
                src_start_index,
                dest_index,
                vertex_count,
                dest_buffer.left(),
                declaration.map(|declaration| &**declaration),
                flags,
            )
        })
    }

    pub fn clear(
        &mut self,
        rects: &[Rect],
        flags: ClearFlags,
        color: Color,
        z: f32,
        stencil: u32,
    ) -> D3dResult<()> {
        self.begin_left_pass();
        self.issue_twice("clear", |device| {
            device.clear(rects, flags, color, z, stencil)
        })
    }

    /// Fills `surface` for the active eye, then the other eye's instance after a switch.
    ///
    /// The right instance of a stereo `surface` is only filled when render target 0 allows
    /// the switch; with a mono render target 0 it keeps its previous contents.
    pub fn color_fill(
        &mut self,
        surface: Option<&StereoSurface<D>>,
        rect: Option<&Rect>,
        color: Color,
    ) -> D3dResult<()> {
        let surface = surface.ok_or(D3dError::InvalidCall("fill target is null"))?;
        self.begin_left_pass();
        self.device.color_fill(surface.left(), rect, color)?;
        self.stats.inc_draws();
        if let Some(right) = surface.right() {
            if self.switch_drawing_side() {
                match self.device.color_fill(right, rect, color) {
                    Ok(()) => self.stats.inc_second_eye_draws(),
                    Err(err) => {
                        self.stats.inc_second_eye_failures();
                        warn!(%err, "right eye color fill failed");
                    }
                }
            }
        }
        Ok(())
    }

    /// Copies left to left, then fills the destination's right side from the source's right
    /// side (or its left side when the source is mono).
    fn copy_pair<T, F>(
        &mut self,
        what: &'static str,
        source: &DualResource<T>,
        destination: &DualResource<T>,
        mut copy: F,
    ) -> D3dResult<()>
    where
        F: FnMut(&mut D, &T, &T) -> D3dResult<()>,
    {
        copy(&mut self.device, source.left(), destination.left())?;
        if let Some(right) = destination.right() {
            let source = source.right().unwrap_or_else(|| source.left());
            if let Err(err) = copy(&mut self.device, source, right) {
                self.stats.inc_second_eye_failures();
                warn!(what, %err, "right side copy failed");
            }
        }
        Ok(())
    }

    pub fn update_surface(
        &mut self,
        source: Option<&StereoSurface<D>>,
        source_rect: Option<&Rect>,
        destination: Option<&StereoSurface<D>>,
        destination_point: Option<&Point>,
    ) -> D3dResult<()> {
        let (source, destination) = copy_endpoints(source, destination)?;
        self.copy_pair("update_surface", source, destination, |device, src, dst| {
            device.update_surface(src, source_rect, dst, destination_point)
        })
    }

    pub fn update_texture(
        &mut self,
        source: Option<&StereoTexture<D>>,
        destination: Option<&StereoTexture<D>>,
    ) -> D3dResult<()> {
        let (source, destination) = copy_endpoints(source, destination)?;
        self.copy_pair("update_texture", source, destination, |device, src, dst| {
            device.update_texture(src, dst)
        })
    }

    pub fn get_render_target_data(
        &mut self,
        render_target: Option<&StereoSurface<D>>,
        destination: Option<&StereoSurface<D>>,
    ) -> D3dResult<()> {
        let (source, destination) = copy_endpoints(render_target, destination)?;
        self.copy_pair(
            "get_render_target_data",
            source,
            destination,
            |device, src, dst| device.get_render_target_data(src, dst),
        )
    }

    pub fn stretch_rect(
        &mut self,
        source: Option<&StereoSurface<D>>,
        source_rect: Option<&Rect>,
        destination: Option<&StereoSurface<D>>,
        destination_rect: Option<&Rect>,
        filter: TextureFilter,
    ) -> D3dResult<()> {
        let (source, destination) = copy_endpoints(source, destination)?;
        self.copy_pair("stretch_rect", source, destination, |device, src, dst| {
            device.stretch_rect(src, source_rect, dst, destination_rect, filter)
        })
    }
}

/// `count` elements of `size` bytes, or `None` on overflow.
fn byte_len(count: u32, size: usize) -> Option<usize> {
    usize::try_from(count).ok()?.checked_mul(size)
}

fn copy_endpoints<'a, T>(
    source: Option<&'a DualResource<T>>,
    destination: Option<&'a DualResource<T>>,
) -> D3dResult<(&'a DualResource<T>, &'a DualResource<T>)> {
    match (source, destination) {
        (Some(source), Some(destination)) => Ok((source, destination)),
        (None, _) => Err(D3dError::InvalidCall("copy source is null")),
        (_, None) => Err(D3dError::InvalidCall("copy destination is null")),
    }
}
