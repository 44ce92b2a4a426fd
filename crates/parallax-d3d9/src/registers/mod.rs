//! Float constant register files with per-eye dirty tracking.
//!
//! The application's mono values are stored as written. Registers covered by a rule of the
//! active shader are rewritten per eye at flush time; everything else is uploaded verbatim.

mod modification;

use std::ops::Range;
use std::sync::Arc;

use parallax_view::{Eye, ViewAdjustment};
use tracing::trace;

use crate::error::{D3dError, D3dResult};
use crate::native::NativeDevice;
use crate::state::ShaderStage;

pub use modification::{
    ConstantModification, MatrixDoNothing, MatrixSimpleTranslate, RegisterRule, ShaderRules,
    Vector4SimpleTranslate,
};

#[derive(Debug)]
struct RegisterFile {
    stage: ShaderStage,
    values: Vec<[f32; 4]>,
    written: Vec<bool>,
    /// Per eye: the device does not hold this eye's value for the register.
    dirty: [Vec<bool>; 2],
    rules: Arc<ShaderRules>,
}

impl RegisterFile {
    fn new(stage: ShaderStage, count: u32) -> Self {
        let count = count as usize;
        Self {
            stage,
            values: vec![[0.0; 4]; count],
            written: vec![false; count],
            dirty: [vec![false; count], vec![false; count]],
            rules: Arc::new(ShaderRules::default()),
        }
    }

    fn limit(&self) -> u32 {
        self.values.len() as u32
    }

    fn check_range(&self, start: u32, count: u32) -> D3dResult<Range<usize>> {
        let end = start.checked_add(count).filter(|&end| end <= self.limit());
        match end {
            Some(end) => Ok(start as usize..end as usize),
            None => Err(D3dError::InvalidRegisterRange {
                stage: self.stage.name(),
                start,
                end: start.saturating_add(count),
                limit: self.limit(),
            }),
        }
    }

    fn check_data(&self, start: u32, data: &[f32]) -> D3dResult<Range<usize>> {
        if data.len() % 4 != 0 {
            return Err(D3dError::InvalidCall(
                "constant data must be a whole number of float4 registers",
            ));
        }
        self.check_range(start, (data.len() / 4) as u32)
    }

    fn set(&mut self, start: u32, data: &[f32]) -> D3dResult<()> {
        let range = self.check_data(start, data)?;
        let vec4s: &[[f32; 4]] = bytemuck::cast_slice(data);
        self.values[range.clone()].copy_from_slice(vec4s);
        for register in range {
            self.written[register] = true;
            self.dirty[0][register] = true;
            self.dirty[1][register] = true;
        }
        Ok(())
    }

    fn get(&self, start: u32, count: u32) -> D3dResult<Vec<f32>> {
        let range = self.check_range(start, count)?;
        Ok(bytemuck::cast_slice(&self.values[range]).to_vec())
    }

    fn rule_range(&self, rule: &RegisterRule) -> Range<usize> {
        let start = (rule.start_register as usize).min(self.values.len());
        let end = (rule.end_register() as usize).min(self.values.len());
        start..end
    }

    fn set_rules(&mut self, rules: Arc<ShaderRules>) {
        // Registers gaining or losing a rule now need different values on the device.
        for rule in self.rules.iter().chain(rules.iter()) {
            for register in self.rule_range(rule) {
                if self.written[register] {
                    self.dirty[0][register] = true;
                    self.dirty[1][register] = true;
                }
            }
        }
        self.rules = rules;
    }

    fn upload<D: NativeDevice + ?Sized>(
        &self,
        device: &mut D,
        start: usize,
        data: &[f32],
    ) -> D3dResult<()> {
        trace!(stage = self.stage.name(), start, len = data.len() / 4, "upload constants");
        match self.stage {
            ShaderStage::Vertex => device.set_vertex_shader_constant_f(start as u32, data),
            ShaderStage::Pixel => device.set_pixel_shader_constant_f(start as u32, data),
        }
    }

    /// Uploads `rule`'s registers for `eye` and updates dirtiness for both eyes.
    fn upload_rule<D: NativeDevice + ?Sized>(
        &mut self,
        rule: &RegisterRule,
        eye: Eye,
        view: &ViewAdjustment,
        device: &mut D,
    ) -> D3dResult<()> {
        let range = self.rule_range(rule);
        let input: &[f32] = bytemuck::cast_slice(&self.values[range.clone()]);
        let mut output = rule.modification.apply(eye, view, input);
        output.truncate(input.len());
        #[cfg(debug_assertions)]
        trace!(
            stage = self.stage.name(),
            start = range.start,
            %eye,
            ?input,
            ?output,
            "modified constants"
        );
        let result = self.upload(device, range.start, &output);

        let side_independent = rule.modification.is_side_independent();
        for register in range {
            self.dirty[eye.index()][register] = false;
            self.dirty[eye.other().index()][register] = !side_independent;
        }
        result
    }

    fn apply_dirty<D: NativeDevice + ?Sized>(
        &mut self,
        eye: Eye,
        view: &ViewAdjustment,
        device: &mut D,
    ) -> D3dResult<()> {
        let rules = Arc::clone(&self.rules);
        let mut result = Ok(());
        let mut register = 0;
        while register < self.values.len() {
            if !self.dirty[eye.index()][register] {
                register += 1;
                continue;
            }

            if let Some(rule) = rules.covering(register as u32) {
                let end = self.rule_range(rule).end;
                result = result.and(self.upload_rule(rule, eye, view, device));
                register = end.max(register + 1);
                continue;
            }

            // Contiguous run of dirty registers without a rule: one verbatim upload.
            let start = register;
            while register < self.values.len()
                && self.dirty[eye.index()][register]
                && rules.covering(register as u32).is_none()
            {
                register += 1;
            }
            let data: &[f32] = bytemuck::cast_slice(&self.values[start..register]);
            result = result.and(self.upload(device, start, data));
            for r in start..register {
                self.dirty[0][r] = false;
                self.dirty[1][r] = false;
            }
        }
        result
    }

    fn apply_stereo<D: NativeDevice + ?Sized>(
        &mut self,
        eye: Eye,
        view: &ViewAdjustment,
        device: &mut D,
    ) -> D3dResult<()> {
        let rules = Arc::clone(&self.rules);
        let mut result = Ok(());
        for rule in rules.iter() {
            if rule.modification.is_side_independent() {
                continue;
            }
            let range = self.rule_range(rule);
            if range.clone().any(|register| self.written[register]) {
                result = result.and(self.upload_rule(rule, eye, view, device));
            }
        }
        result
    }

    fn written_blocks(&self) -> Vec<(u32, Vec<f32>)> {
        let mut blocks = Vec::new();
        let mut register = 0;
        while register < self.values.len() {
            if !self.written[register] {
                register += 1;
                continue;
            }
            let start = register;
            while register < self.values.len() && self.written[register] {
                register += 1;
            }
            let data: &[f32] = bytemuck::cast_slice(&self.values[start..register]);
            blocks.push((start as u32, data.to_vec()));
        }
        blocks
    }

    fn release(&mut self) {
        self.rules = Arc::new(ShaderRules::default());
        for eye in &mut self.dirty {
            eye.fill(false);
        }
        self.written.fill(false);
        self.values.fill([0.0; 4]);
    }

    fn is_dirty(&self, eye: Eye, register: u32) -> bool {
        self.dirty[eye.index()]
            .get(register as usize)
            .copied()
            .unwrap_or(false)
    }
}

/// Vertex and pixel shader float constants, flushed per eye before each draw.
#[derive(Debug)]
pub struct ShaderRegisterTracker {
    vertex: RegisterFile,
    pixel: RegisterFile,
}

impl ShaderRegisterTracker {
    pub fn new(vertex_registers: u32, pixel_registers: u32) -> Self {
        Self {
            vertex: RegisterFile::new(ShaderStage::Vertex, vertex_registers),
            pixel: RegisterFile::new(ShaderStage::Pixel, pixel_registers),
        }
    }

    fn file(&self, stage: ShaderStage) -> &RegisterFile {
        match stage {
            ShaderStage::Vertex => &self.vertex,
            ShaderStage::Pixel => &self.pixel,
        }
    }

    fn file_mut(&mut self, stage: ShaderStage) -> &mut RegisterFile {
        match stage {
            ShaderStage::Vertex => &mut self.vertex,
            ShaderStage::Pixel => &mut self.pixel,
        }
    }

    pub fn register_limit(&self, stage: ShaderStage) -> u32 {
        self.file(stage).limit()
    }

    /// Stores `data` (whole float4 registers) starting at `start` and marks the range dirty for
    /// both eyes. Nothing is stored when any register is out of range.
    pub fn set_constant_f(&mut self, stage: ShaderStage, start: u32, data: &[f32]) -> D3dResult<()> {
        self.file_mut(stage).set(start, data)
    }

    /// Checks that `data` is whole registers and fits from `start`, without storing it.
    pub fn validate_constant_f(&self, stage: ShaderStage, start: u32, data: &[f32]) -> D3dResult<()> {
        self.file(stage).check_data(start, data).map(|_| ())
    }

    /// The application's values for `count` registers from `start`.
    pub fn get_constant_f(&self, stage: ShaderStage, start: u32, count: u32) -> D3dResult<Vec<f32>> {
        self.file(stage).get(start, count)
    }

    pub fn active_vertex_shader_changed(&mut self, rules: Arc<ShaderRules>) {
        self.vertex.set_rules(rules);
    }

    pub fn active_pixel_shader_changed(&mut self, rules: Arc<ShaderRules>) {
        self.pixel.set_rules(rules);
    }

    /// Uploads every register dirty for `eye`, rewriting ruled registers for that eye.
    ///
    /// All uploads are attempted; the first failure is returned.
    pub fn apply_all_dirty<D: NativeDevice + ?Sized>(
        &mut self,
        eye: Eye,
        view: &ViewAdjustment,
        device: &mut D,
    ) -> D3dResult<()> {
        let vertex = self.vertex.apply_dirty(eye, view, device);
        let pixel = self.pixel.apply_dirty(eye, view, device);
        vertex.and(pixel)
    }

    /// Re-uploads every eye-dependent ruled register for `eye`, dirty or not. Used right after
    /// the active eye changes.
    pub fn apply_all_stereo_constants<D: NativeDevice + ?Sized>(
        &mut self,
        eye: Eye,
        view: &ViewAdjustment,
        device: &mut D,
    ) -> D3dResult<()> {
        let vertex = self.vertex.apply_stereo(eye, view, device);
        let pixel = self.pixel.apply_stereo(eye, view, device);
        vertex.and(pixel)
    }

    /// Contiguous blocks of registers the application has written, for state-block snapshots.
    pub fn written_blocks(&self, stage: ShaderStage) -> Vec<(u32, Vec<f32>)> {
        self.file(stage).written_blocks()
    }

    pub fn is_dirty(&self, stage: ShaderStage, eye: Eye, register: u32) -> bool {
        self.file(stage).is_dirty(eye, register)
    }

    /// Drops shader rules and stored values ahead of a device reset.
    pub fn release_resources(&mut self) {
        self.vertex.release();
        self.pixel.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{Call, RecordingDevice};
    use parallax_view::StereoConfig;
    use pretty_assertions::assert_eq;

    fn view() -> ViewAdjustment {
        ViewAdjustment::new(StereoConfig::default(), 1.0)
    }

    fn vs_uploads(device: &RecordingDevice) -> Vec<(u32, Vec<f32>)> {
        device
            .calls()
            .iter()
            .filter_map(|call| match call {
                Call::SetVertexShaderConstantF { start, data } => Some((*start, data.clone())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn out_of_range_set_is_rejected_without_partial_write() {
        let mut tracker = ShaderRegisterTracker::new(8, 8);
        let err = tracker
            .set_constant_f(ShaderStage::Vertex, 7, &[1.0; 8])
            .unwrap_err();
        assert!(matches!(err, D3dError::InvalidRegisterRange { limit: 8, .. }));
        assert_eq!(
            tracker.get_constant_f(ShaderStage::Vertex, 7, 1).unwrap(),
            vec![0.0; 4]
        );
        assert!(!tracker.is_dirty(ShaderStage::Vertex, Eye::Left, 7));

        assert!(matches!(
            tracker.set_constant_f(ShaderStage::Pixel, 0, &[1.0; 3]),
            Err(D3dError::InvalidCall(_))
        ));
    }

    #[test]
    fn plain_registers_upload_once_for_both_eyes() {
        let mut tracker = ShaderRegisterTracker::new(16, 8);
        let mut device = RecordingDevice::new();
        let view = view();

        tracker
            .set_constant_f(ShaderStage::Vertex, 2, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0])
            .unwrap();
        assert!(tracker.is_dirty(ShaderStage::Vertex, Eye::Right, 3));

        tracker.apply_all_dirty(Eye::Left, &view, &mut device).unwrap();
        assert_eq!(
            vs_uploads(&device),
            vec![(2, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0])]
        );
        assert!(!tracker.is_dirty(ShaderStage::Vertex, Eye::Right, 3));

        device.clear_calls();
        tracker.apply_all_dirty(Eye::Right, &view, &mut device).unwrap();
        assert!(device.calls().is_empty());
    }

    #[test]
    fn ruled_registers_stay_dirty_for_the_other_eye() {
        let mut tracker = ShaderRegisterTracker::new(16, 8);
        let mut device = RecordingDevice::new();
        let view = view();
        tracker.active_vertex_shader_changed(Arc::new(
            ShaderRules::new().with_rule(0, MatrixSimpleTranslate::default()),
        ));

        let input = glam::Mat4::IDENTITY.to_cols_array();
        tracker.set_constant_f(ShaderStage::Vertex, 0, &input).unwrap();
        tracker.apply_all_dirty(Eye::Left, &view, &mut device).unwrap();

        assert_eq!(
            vs_uploads(&device),
            vec![(0, view.adjustment_matrix(Eye::Left).to_cols_array().to_vec())]
        );
        assert!(!tracker.is_dirty(ShaderStage::Vertex, Eye::Left, 0));
        assert!(tracker.is_dirty(ShaderStage::Vertex, Eye::Right, 0));

        device.clear_calls();
        tracker
            .apply_all_stereo_constants(Eye::Right, &view, &mut device)
            .unwrap();
        assert_eq!(
            vs_uploads(&device),
            vec![(0, view.adjustment_matrix(Eye::Right).to_cols_array().to_vec())]
        );
        assert!(tracker.is_dirty(ShaderStage::Vertex, Eye::Left, 0));
        assert!(!tracker.is_dirty(ShaderStage::Vertex, Eye::Right, 0));
    }

    #[test]
    fn side_independent_rules_clean_both_eyes() {
        let mut tracker = ShaderRegisterTracker::new(16, 8);
        let mut device = RecordingDevice::new();
        tracker.active_vertex_shader_changed(Arc::new(
            ShaderRules::new().with_rule(4, MatrixDoNothing),
        ));
        tracker.set_constant_f(ShaderStage::Vertex, 4, &[2.0; 16]).unwrap();
        tracker.apply_all_dirty(Eye::Left, &view(), &mut device).unwrap();

        assert!(!tracker.is_dirty(ShaderStage::Vertex, Eye::Left, 4));
        assert!(!tracker.is_dirty(ShaderStage::Vertex, Eye::Right, 4));

        device.clear_calls();
        tracker
            .apply_all_stereo_constants(Eye::Right, &view(), &mut device)
            .unwrap();
        assert!(device.calls().is_empty());
    }

    #[test]
    fn shader_change_redirties_ruled_registers() {
        let mut tracker = ShaderRegisterTracker::new(16, 8);
        let mut device = RecordingDevice::new();
        let view = view();
        tracker.set_constant_f(ShaderStage::Vertex, 0, &[1.0; 16]).unwrap();
        tracker.apply_all_dirty(Eye::Left, &view, &mut device).unwrap();
        assert!(!tracker.is_dirty(ShaderStage::Vertex, Eye::Left, 0));

        tracker.active_vertex_shader_changed(Arc::new(
            ShaderRules::new().with_rule(0, MatrixSimpleTranslate::default()),
        ));
        assert!(tracker.is_dirty(ShaderStage::Vertex, Eye::Left, 0));
        assert!(tracker.is_dirty(ShaderStage::Vertex, Eye::Right, 3));
        assert!(!tracker.is_dirty(ShaderStage::Vertex, Eye::Left, 4));
    }

    #[test]
    fn written_blocks_coalesce_contiguous_registers() {
        let mut tracker = ShaderRegisterTracker::new(16, 8);
        tracker.set_constant_f(ShaderStage::Pixel, 1, &[1.0; 8]).unwrap();
        tracker.set_constant_f(ShaderStage::Pixel, 5, &[2.0; 4]).unwrap();
        assert_eq!(
            tracker.written_blocks(ShaderStage::Pixel),
            vec![(1, vec![1.0; 8]), (5, vec![2.0; 4])]
        );

        tracker.release_resources();
        assert!(tracker.written_blocks(ShaderStage::Pixel).is_empty());
    }
}
