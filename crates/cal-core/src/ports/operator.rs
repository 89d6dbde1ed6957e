/// Startup override gesture.
pub trait OperatorOverridePort: Send + Sync {
    /// Whether the operator is holding the "force recalibration" override.
    fn is_override_held(&self) -> bool;
}
