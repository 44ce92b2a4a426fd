use crate::error::D3dResult;
use crate::native::NativeDevice;
use crate::resource::StereoSurface;

/// Turns the finished left/right back buffers into the displayed frame and owns the overlay
/// (HUD font, menu) device resources.
///
/// The mirror releases these resources before a device reset and restores them afterwards.
pub trait StereoPresenter<D: NativeDevice> {
    /// (Re)creates presenter and overlay resources on a fresh or reset device.
    fn restore(&mut self, device: &mut D) -> D3dResult<()>;

    /// Drops every device resource the presenter holds.
    fn release(&mut self);

    /// Composites `back_buffer` onto the real swap chain back buffer.
    fn present(
        &mut self,
        device: &mut D,
        back_buffer: &StereoSurface<D>,
        target: &D::Surface,
    ) -> D3dResult<()>;
}

/// Presenter that composites nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullPresenter;

impl<D: NativeDevice> StereoPresenter<D> for NullPresenter {
    fn restore(&mut self, _device: &mut D) -> D3dResult<()> {
        Ok(())
    }

    fn release(&mut self) {}

    fn present(
        &mut self,
        _device: &mut D,
        _back_buffer: &StereoSurface<D>,
        _target: &D::Surface,
    ) -> D3dResult<()> {
        Ok(())
    }
}
