//! Plain D3D9 value types shared by the device contract and the stereo mirror.

mod topology;
mod types;

pub use topology::PrimitiveType;
pub use types::*;
