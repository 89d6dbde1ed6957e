use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::info;

use cal_core::ports::{AudioSelfTestPort, AudioTestHandle};

/// Audio self-test that simply completes after a fixed duration.
pub struct TimedAudioSelfTest {
    duration: Duration,
    next_handle: AtomicU64,
    running: Mutex<Option<(AudioTestHandle, Instant)>>,
}

impl TimedAudioSelfTest {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            next_handle: AtomicU64::new(1),
            running: Mutex::new(None),
        }
    }
}

impl AudioSelfTestPort for TimedAudioSelfTest {
    fn start(&self) -> AudioTestHandle {
        let handle = AudioTestHandle(self.next_handle.fetch_add(1, Ordering::SeqCst));
        let deadline = Instant::now() + self.duration;
        *self.running.lock().unwrap_or_else(PoisonError::into_inner) = Some((handle, deadline));
        info!(
            ?handle,
            duration_ms = self.duration.as_millis() as u64,
            "audio self-test started"
        );
        handle
    }

    /// Only the most recently started test can finish; older handles are
    /// reported finished so a restarted test never blocks on a stale one.
    fn is_finished(&self, handle: AudioTestHandle) -> bool {
        match *self.running.lock().unwrap_or_else(PoisonError::into_inner) {
            Some((current, deadline)) if current == handle => Instant::now() >= deadline,
            _ => true,
        }
    }
}
