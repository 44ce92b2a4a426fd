use glam::{Mat4, Vec4};

/// Clip-plane extents of a perspective frustum, measured at the near plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frustum {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    pub far: f32,
}

impl Frustum {
    /// Base frustum used for every eye: a unit-wide window at `near = 0.1`, `far = 10`,
    /// with the vertical extent derived from `aspect_ratio` (width / height).
    pub fn for_aspect_ratio(aspect_ratio: f32) -> Self {
        let half_height = 0.5 / aspect_ratio;
        Self {
            left: -0.5,
            right: 0.5,
            bottom: -half_height,
            top: half_height,
            near: 0.1,
            far: 10.0,
        }
    }

    pub fn width(&self) -> f32 {
        self.left.abs() + self.right.abs()
    }

    /// The same frustum with both horizontal clip planes moved by `offset`.
    pub fn shifted(&self, offset: f32) -> Self {
        Self {
            left: self.left + offset,
            right: self.right + offset,
            ..*self
        }
    }

    pub fn to_matrix(&self) -> Mat4 {
        perspective_off_center_lh(
            self.left,
            self.right,
            self.bottom,
            self.top,
            self.near,
            self.far,
        )
    }
}

/// Left-handed off-center perspective projection (D3DX `PerspectiveOffCenterLH` semantics,
/// depth mapped to `[0, 1]`).
pub fn perspective_off_center_lh(
    left: f32,
    right: f32,
    bottom: f32,
    top: f32,
    near: f32,
    far: f32,
) -> Mat4 {
    Mat4::from_cols(
        Vec4::new(2.0 * near / (right - left), 0.0, 0.0, 0.0),
        Vec4::new(0.0, 2.0 * near / (top - bottom), 0.0, 0.0),
        Vec4::new(
            (left + right) / (left - right),
            (top + bottom) / (bottom - top),
            far / (far - near),
            1.0,
        ),
        Vec4::new(0.0, 0.0, near * far / (near - far), 0.0),
    )
}
