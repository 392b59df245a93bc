//! Cooperative cancellation token.
//!
//! Every polling loop in this crate takes a `CancelToken` and checks it once
//! per iteration. The control surface keeps one clone and cancels it to stop
//! whichever worker is running; responsiveness is bounded by the loop's sleep
//! interval.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared stop signal for the calibration and translation loops.
///
/// Cloning yields another handle to the same flag. The writer side uses
/// Release ordering and readers use Acquire so a `cancel()` from the control
/// surface thread is promptly visible to the loop thread.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Safe to call more than once.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Re-arm the token before starting a new worker.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Release);
    }
}
