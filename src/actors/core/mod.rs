// ============================================================================
// Core Actor Abstractions
// ============================================================================
//
// Types shared by the infrastructure actors.
//
// ============================================================================

pub mod health;

pub use health::*;
