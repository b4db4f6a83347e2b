use uuid::Uuid;

// ============================================================================
// Aggregate Root Pattern
// ============================================================================
//
// Key Principles:
// 1. Commands are validated against current state before anything changes
// 2. A validated command yields events describing what happened
// 3. State only changes by applying those events
// 4. The version counts applied, persisted changes (optimistic concurrency)
//
// ============================================================================

/// Generic Aggregate trait - all aggregates implement this
///
/// Type Parameters:
/// - `Event`: The domain event type for this aggregate
/// - `Command`: The command type for this aggregate
/// - `Error`: The error type for business rule violations
pub trait Aggregate: Sized + Send + Sync {
    type Event;
    type Command;
    type Error;

    /// Create new aggregate from first event
    fn apply_first_event(aggregate_id: Uuid, event: &Self::Event) -> Result<Self, Self::Error>;

    /// Apply subsequent events to update state
    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error>;

    /// Handle command and emit events (business logic)
    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;

    /// Get aggregate ID
    fn aggregate_id(&self) -> Uuid;

    /// Get current version
    fn version(&self) -> i64;

    /// Replay a command against a copy of the aggregate.
    ///
    /// Returns the new state together with the events that produced it. The
    /// receiver is left untouched, so a rejected command never leaves a
    /// half-applied state behind.
    fn execute(&self, command: &Self::Command) -> Result<(Self, Vec<Self::Event>), Self::Error>
    where
        Self: Clone,
    {
        let events = self.handle_command(command)?;
        let mut next = self.clone();
        for event in &events {
            next.apply_event(event)?;
        }
        Ok((next, events))
    }
}
