// ============================================================================
// Actors Module
// ============================================================================
//
// Structure:
// - core/           - Shared health types (HealthStatus, HealthCheckable)
// - infrastructure/ - Concrete actors (Scanner, HealthMonitor, Coordinator)
//
// Note: Order changes go through OrderCommandHandler, NOT actors.
//       Actors are reserved for scheduling and supervision.
//
// ============================================================================

mod core;
mod infrastructure;

pub use self::core::HealthStatus;
pub use self::infrastructure::{
    CoordinatorActor,
    GetSystemHealth,
    ScanError,
    Shutdown,
    SystemHealth,
    TriggerScan,
};
