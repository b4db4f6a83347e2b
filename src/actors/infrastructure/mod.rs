// ============================================================================
// Infrastructure Actors
// ============================================================================
//
// - Delivery-risk scan scheduling
// - Health monitoring
// - Coordination and supervision
//
// ============================================================================

mod health_monitor;
mod scanner;
mod coordinator;

pub use health_monitor::{HealthMonitorActor, UpdateHealth, GetSystemHealth, SystemHealth};
pub use scanner::{ScannerActor, TriggerScan, ScanError};
pub use coordinator::{CoordinatorActor, Shutdown};
