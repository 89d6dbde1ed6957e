/// Opaque handle to a running audio self-test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AudioTestHandle(pub u64);

/// Audio self-test collaborator.
pub trait AudioSelfTestPort: Send + Sync {
    /// Start a self-test and return immediately.
    fn start(&self) -> AudioTestHandle;

    /// Whether the given self-test has completed.
    fn is_finished(&self, handle: AudioTestHandle) -> bool;
}
