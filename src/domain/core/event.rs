// ============================================================================
// Domain Event Trait
// ============================================================================

/// Implemented by every event an aggregate emits.
///
/// The name is used for structured logs and metric labels.
pub trait DomainEvent: Clone + Send + Sync {
    fn event_type(&self) -> &'static str;

    fn event_version(&self) -> i32 {
        1
    }
}
