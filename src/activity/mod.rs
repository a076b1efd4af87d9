//=========================================================================
// Activity Engine
//=========================================================================
//
// Runs traditional-activity sessions.
//
// Modules:
// - session: phases, interaction checks, rewards
// - objects: live interactive objects and step-to-step diffing
// - chain: ordered follow-up work between interactions
//
//=========================================================================

mod chain;
mod objects;
mod session;

pub use chain::{ChainOp, FollowUpChain};
pub use objects::{ObjectSet, PlacedObject, StepDiff};
pub use session::{ActivitySession, SessionPhase};
