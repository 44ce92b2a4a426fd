use crate::native::NativeDevice;
use crate::sink::{CaptureBuffer, CapturedState};
use crate::state::StateBlockType;

/// A device state block plus the stereo state it covers.
///
/// Applying it re-resolves every captured binding for whichever eye is active at that moment.
pub struct StereoStateBlock<D: NativeDevice> {
    actual: D::StateBlock,
    /// `None` for blocks recorded with `begin_state_block`/`end_state_block`.
    ty: Option<StateBlockType>,
    entries: Vec<CapturedState<D>>,
}

impl<D: NativeDevice> StereoStateBlock<D> {
    pub(crate) fn new(
        actual: D::StateBlock,
        ty: Option<StateBlockType>,
        captured: CaptureBuffer<D>,
    ) -> Self {
        Self {
            actual,
            ty,
            entries: captured.into_entries(),
        }
    }

    pub fn actual(&self) -> &D::StateBlock {
        &self.actual
    }

    pub fn ty(&self) -> Option<StateBlockType> {
        self.ty
    }

    pub fn entries(&self) -> &[CapturedState<D>] {
        &self.entries
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [CapturedState<D>] {
        &mut self.entries
    }
}
