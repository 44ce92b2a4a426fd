use std::fmt;

/// D3D9 primitive types accepted by the draw entry points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    PointList,
    LineList,
    LineStrip,
    TriangleList,
    TriangleStrip,
    TriangleFan,
}

impl PrimitiveType {
    /// Number of vertices (or indices) consumed by `primitive_count` primitives, or `None`
    /// when that does not fit in a `u32`.
    pub fn vertex_count(self, primitive_count: u32) -> Option<u32> {
        if primitive_count == 0 {
            return Some(0);
        }
        match self {
            PrimitiveType::PointList => Some(primitive_count),
            PrimitiveType::LineList => primitive_count.checked_mul(2),
            PrimitiveType::LineStrip => primitive_count.checked_add(1),
            PrimitiveType::TriangleList => primitive_count.checked_mul(3),
            PrimitiveType::TriangleStrip | PrimitiveType::TriangleFan => {
                primitive_count.checked_add(2)
            }
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PrimitiveType::PointList => "point_list",
            PrimitiveType::LineList => "line_list",
            PrimitiveType::LineStrip => "line_strip",
            PrimitiveType::TriangleList => "triangle_list",
            PrimitiveType::TriangleStrip => "triangle_strip",
            PrimitiveType::TriangleFan => "triangle_fan",
        };
        f.write_str(s)
    }
}
