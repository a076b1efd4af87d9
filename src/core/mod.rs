//=========================================================================
// Core Runtime
//=========================================================================
//
// Plumbing shared by every part of the game, independent of content.
//
// Modules:
// - error: crate error taxonomy
// - globals: GameContext (shared data) and GameSystems (logic)
// - input: presentation input events
// - message_bus: per-tick outbox for the presentation layer
// - platform_bridge: presentation → core channel and per-tick collection
// - scene: presentation units, director, navigation queue
// - scheduler: scoped, pausable timers
//
// Everything here runs on one logical thread. Ordering, not locking,
// keeps state consistent: input, then timers, then navigation, then
// updates, every tick.
//
//=========================================================================

pub mod error;
pub mod globals;
pub mod input;
pub mod message_bus;
pub mod platform_bridge;
pub mod scene;
pub mod scheduler;

//=== Re-exports ==========================================================

pub use error::{GameError, GameResult};
pub use globals::{GameContext, GameSystems};
pub use scene::{Layer, Scene, SceneDirector, SceneEntry, UnitDescriptor, UnitStatus};
pub use scheduler::{FiredTimer, Scheduler, TimerEvent, TimerScope};
