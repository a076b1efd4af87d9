//=========================================================================
// Outbox
//=========================================================================
//
// Per-tick notifications from the core to the presentation layer.
//
// Pattern: core publishes during tick N → presenter reads after tick N
//          → outbox cleared at the start of tick N+1
//
//=========================================================================

//=== Module Declarations =================================================

mod message_queue;
mod outbox;

//=== Public API ==========================================================

pub use outbox::{Message, Outbox};
