use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for the stereo mirror.
///
/// Updated on the render thread; readable from elsewhere without locking.
#[derive(Debug, Default)]
pub struct StereoStats {
    draws: AtomicU64,
    second_eye_draws: AtomicU64,
    second_eye_failures: AtomicU64,
    eye_switches: AtomicU64,
    rejected_eye_switches: AtomicU64,
    mono_fallbacks: AtomicU64,
}

impl StereoStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_draws(&self) {
        self.draws.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_second_eye_draws(&self) {
        self.second_eye_draws.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_second_eye_failures(&self) {
        self.second_eye_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_eye_switches(&self) {
        self.eye_switches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_rejected_eye_switches(&self) {
        self.rejected_eye_switches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_mono_fallbacks(&self) {
        self.mono_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StereoStatsSnapshot {
        StereoStatsSnapshot {
            draws: self.draws.load(Ordering::Relaxed),
            second_eye_draws: self.second_eye_draws.load(Ordering::Relaxed),
            second_eye_failures: self.second_eye_failures.load(Ordering::Relaxed),
            eye_switches: self.eye_switches.load(Ordering::Relaxed),
            rejected_eye_switches: self.rejected_eye_switches.load(Ordering::Relaxed),
            mono_fallbacks: self.mono_fallbacks.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StereoStatsSnapshot {
    /// Draw, clear and fill calls issued for the active eye.
    pub draws: u64,
    /// Repeats issued for the other eye.
    pub second_eye_draws: u64,
    /// Second-eye draws, clears and copies that failed and were swallowed.
    pub second_eye_failures: u64,
    pub eye_switches: u64,
    /// Right-eye activations refused because the primary render target is mono.
    pub rejected_eye_switches: u64,
    /// Stereo resources created mono because the right instance failed.
    pub mono_fallbacks: u64,
}
