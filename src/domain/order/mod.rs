// ============================================================================
// Order Domain - Orders and their confirmation ledger
// ============================================================================
//
// - Value objects (Confirmation, Unit, classification enums)
// - Events (OrderCreated, ConfirmationRecorded, OrderDetailsEdited)
// - Commands (NewOrder, RecordConfirmation, EditDetails)
// - Errors (OrderError)
// - Aggregate (OrderAggregate, the ledger and its derived figures)
// - Query (search, status filter, pagination over stored orders)
// - Command Handler (OrderCommandHandler, load → validate → save)
//
// ============================================================================

pub mod value_objects;
pub mod events;
pub mod commands;
pub mod errors;
pub mod aggregate;
pub mod query;
pub mod command_handler;

#[cfg(test)]
pub(crate) mod fixtures;

// Re-export for convenience
pub use value_objects::*;
pub use events::*;
pub use commands::*;
pub use errors::*;
pub use aggregate::*;
pub use query::*;
pub use command_handler::*;
