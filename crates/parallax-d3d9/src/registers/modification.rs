use std::fmt;
use std::sync::Arc;

use glam::{Mat4, Vec4};
use parallax_view::{Eye, ViewAdjustment};

/// Per-eye rewrite of a block of float4 constant registers.
///
/// Implementations see the application's mono values for the whole block and return the values
/// the device should receive while `eye` renders.
pub trait ConstantModification: fmt::Debug + Send + Sync {
    /// Number of float4 registers the modification reads and writes.
    fn register_count(&self) -> u32;

    fn apply(&self, eye: Eye, view: &ViewAdjustment, input: &[f32]) -> Vec<f32>;

    /// True when both eyes receive the same values.
    fn is_side_independent(&self) -> bool {
        false
    }
}

/// Leaves a 4x4 matrix untouched. Registering it pins the registers as a known matrix without
/// making them per-eye.
#[derive(Clone, Copy, Debug, Default)]
pub struct MatrixDoNothing;

impl ConstantModification for MatrixDoNothing {
    fn register_count(&self) -> u32 {
        4
    }

    fn apply(&self, _eye: Eye, _view: &ViewAdjustment, input: &[f32]) -> Vec<f32> {
        input.to_vec()
    }

    fn is_side_independent(&self) -> bool {
        true
    }
}

/// Moves a view-projection matrix into the eye's space with the view adjustment matrix.
///
/// `transposed` matrices (the common HLSL column-major upload) are transposed before and after
/// the multiply.
#[derive(Clone, Copy, Debug, Default)]
pub struct MatrixSimpleTranslate {
    pub transposed: bool,
}

impl ConstantModification for MatrixSimpleTranslate {
    fn register_count(&self) -> u32 {
        4
    }

    fn apply(&self, eye: Eye, view: &ViewAdjustment, input: &[f32]) -> Vec<f32> {
        let Ok(raw) = <&[f32; 16]>::try_from(input) else {
            return input.to_vec();
        };
        let mut matrix = Mat4::from_cols_array(raw);
        if self.transposed {
            matrix = matrix.transpose();
        }
        let mut out = view.adjustment_matrix(eye) * matrix;
        if self.transposed {
            out = out.transpose();
        }
        out.to_cols_array().to_vec()
    }
}

/// Offsets the x component of a position-like vector by the eye's half separation.
#[derive(Clone, Copy, Debug, Default)]
pub struct Vector4SimpleTranslate;

impl ConstantModification for Vector4SimpleTranslate {
    fn register_count(&self) -> u32 {
        1
    }

    fn apply(&self, eye: Eye, view: &ViewAdjustment, input: &[f32]) -> Vec<f32> {
        let Ok(raw) = <&[f32; 4]>::try_from(input) else {
            return input.to_vec();
        };
        let mut v = Vec4::from_array(*raw);
        v.x += view.separation_in_world_units() * eye.sign();
        v.to_array().to_vec()
    }
}

/// A modification bound to a starting register.
#[derive(Clone, Debug)]
pub struct RegisterRule {
    pub start_register: u32,
    pub modification: Arc<dyn ConstantModification>,
}

impl RegisterRule {
    pub fn end_register(&self) -> u32 {
        self.start_register.saturating_add(self.modification.register_count())
    }

    pub fn covers(&self, register: u32) -> bool {
        (self.start_register..self.end_register()).contains(&register)
    }
}

/// The register rules attached to one shader.
#[derive(Clone, Debug, Default)]
pub struct ShaderRules {
    rules: Vec<RegisterRule>,
}

impl ShaderRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(
        mut self,
        start_register: u32,
        modification: impl ConstantModification + 'static,
    ) -> Self {
        self.push(start_register, Arc::new(modification));
        self
    }

    /// Adds a rule. Registers already claimed by an earlier rule keep that rule.
    pub fn push(&mut self, start_register: u32, modification: Arc<dyn ConstantModification>) {
        self.rules.push(RegisterRule {
            start_register,
            modification,
        });
    }

    pub fn covering(&self, register: u32) -> Option<&RegisterRule> {
        self.rules.iter().find(|rule| rule.covers(register))
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisterRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
