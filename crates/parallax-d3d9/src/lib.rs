//! `parallax-d3d9` mirrors D3D9 device state for two eyes.
//!
//! The crate sits between an application and a [`NativeDevice`] and provides:
//! - Mono/stereo resource handles ([`DualResource`]) whose right-eye twin is created on
//!   demand by a [`StereoHeuristics`] policy.
//! - Per-eye shader constant tracking ([`ShaderRegisterTracker`]) with pluggable
//!   [`ConstantModification`] rules.
//! - The state mirror itself ([`StereoDevice`]): eye switching, per-eye draw repetition,
//!   pair-aware copies and state blocks that re-resolve bindings at apply time.

mod binding;
mod device;
mod error;
mod heuristics;
mod native;
mod presenter;
mod resource;
mod sink;
mod state_block;

pub mod registers;
pub mod state;
pub mod stats;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use binding::{BindingTable, StereoTransform, StreamBinding};
pub use device::StereoDevice;
pub use error::{D3dError, D3dResult};
pub use heuristics::{DefaultHeuristics, StereoHeuristics};
pub use native::NativeDevice;
pub use presenter::{NullPresenter, StereoPresenter};
pub use registers::{
    ConstantModification, MatrixDoNothing, MatrixSimpleTranslate, RegisterRule,
    ShaderRegisterTracker, ShaderRules, Vector4SimpleTranslate,
};
pub use resource::{
    DualResource, PixelShaderHandle, ProxyShader, StereoIndexBuffer, StereoSurface,
    StereoTexture, StereoVertexBuffer, Surfaces, VertexDeclarationHandle, VertexShaderHandle,
};
pub use sink::{CaptureBuffer, CapturedState, StateKey, StateSink};
pub use state_block::StereoStateBlock;
pub use stats::{StereoStats, StereoStatsSnapshot};
