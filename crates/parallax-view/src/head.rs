/// Head orientation in radians.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HeadPose {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

/// Head-pose source polled once per frame.
///
/// Device acquisition and vendor protocols live behind this trait; the view math only needs
/// the latest orientation and whether it can be trusted.
pub trait HeadTracker {
    /// Whether a tracker is connected and producing poses.
    fn is_available(&self) -> bool;

    /// Pulls the latest orientation from the device.
    fn update_orientation(&mut self);

    fn pose(&self) -> HeadPose;
}

/// Tracker used when no head tracking is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoHeadTracker;

impl HeadTracker for NoHeadTracker {
    fn is_available(&self) -> bool {
        false
    }

    fn update_orientation(&mut self) {}

    fn pose(&self) -> HeadPose {
        HeadPose::default()
    }
}
