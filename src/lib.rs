//! Stereoscopic 3D driver core.
//!
//! - [`view`]: per-eye projection, view and overlay matrices derived from a [`StereoConfig`].
//! - [`d3d9`]: the dual-eye state mirror an interception layer drives in front of the real
//!   device.
//!
//! The most used types are re-exported at the top level.

#![forbid(unsafe_code)]

pub use parallax_d3d9 as d3d9;
pub use parallax_view as view;

pub use parallax_d3d9::{
    D3dError, D3dResult, DefaultHeuristics, DualResource, NativeDevice, StereoDevice,
    StereoHeuristics, StereoPresenter, StereoStateBlock,
};
pub use parallax_view::{Eye, HeadTracker, StereoConfig, StereoMode, ViewAdjustment};

pub mod logging {
    use tracing_subscriber::EnvFilter;

    /// Installs a `fmt` subscriber filtered by `RUST_LOG`, defaulting to `default_directive`
    /// (for example `"parallax_d3d9=debug"`) when the variable is unset or invalid.
    ///
    /// Does nothing if a global subscriber is already installed.
    ///
    /// ```
    /// parallax::logging::init("parallax_d3d9=debug");
    /// // Later calls keep the first subscriber.
    /// parallax::logging::init("parallax_d3d9=trace");
    /// ```
    pub fn init(default_directive: &str) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive));
        if tracing_subscriber::fmt()
            .with_env_filter(filter)
            .try_init()
            .is_err()
        {
            tracing::debug!("tracing subscriber already installed");
        }
    }
}
