use crate::registers::ShaderRules;
use crate::state::{ShaderStage, SurfaceDesc, TextureDesc, Usage};

/// Per-title decisions about which resources get a right-eye twin and which shader constants
/// are rewritten per eye.
///
/// The defaults treat square render targets as shadow maps and keep them mono.
pub trait StereoHeuristics {
    fn should_duplicate_render_target(
        &self,
        desc: &SurfaceDesc,
        is_swap_chain_back_buffer: bool,
    ) -> bool {
        is_swap_chain_back_buffer || !desc.is_square()
    }

    fn should_duplicate_depth_stencil(&self, desc: &SurfaceDesc) -> bool {
        !desc.is_square()
    }

    fn should_duplicate_texture(&self, desc: &TextureDesc) -> bool {
        desc.usage.contains(Usage::DEPTH_STENCIL)
            || (desc.usage.contains(Usage::RENDER_TARGET) && !desc.is_square())
    }

    fn should_duplicate_cube_texture(&self, desc: &TextureDesc) -> bool {
        desc.usage.contains(Usage::RENDER_TARGET)
    }

    /// Register rules attached to a shader created from `function`.
    fn shader_rules(&self, _stage: ShaderStage, _function: &[u32]) -> ShaderRules {
        ShaderRules::default()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultHeuristics;

impl StereoHeuristics for DefaultHeuristics {}
