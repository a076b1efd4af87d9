//=========================================================================
// Global Game State
//=========================================================================
//
// Separates systems (logic components) from context (shared data).
//
// Architecture:
//   GameSystems: SceneDirector (owned by Game, never passed to scenes)
//   GameContext: data, progress, scheduler, navigation queue, outbox,
//                presenter, functions (passed to every scene hook)
//
// Constructed once at startup and handed down explicitly; nothing is
// reachable through a global.
//
//=========================================================================

//=== Module Declarations =================================================

mod game_context;
mod game_systems;

//=== Public API ==========================================================

pub use game_context::GameContext;
pub use game_systems::GameSystems;
