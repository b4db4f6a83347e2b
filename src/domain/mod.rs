// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Each aggregate has its own subdirectory with:
// - Value objects
// - Events
// - Commands
// - Errors
// - Aggregate implementation
// - Command handler
//
// Persistence and transport live outside this layer (src/store, src/api).
//
// ============================================================================

pub mod core;
pub mod order;
