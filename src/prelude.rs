//=========================================================================
// Prelude
//=========================================================================
//
// Convenience module that re-exports commonly used types and traits.
//
// Usage:
//   use sila_valley::prelude::*;
//
//=========================================================================

//=== Public API ==========================================================

// Game facade
pub use crate::config::GameConfig;
pub use crate::engine::{Game, GameBuilder};

// Global systems and context
pub use crate::core::globals::{GameContext, GameSystems};
pub use crate::core::error::{GameError, GameResult};

// Input and platform bridge
pub use crate::core::input::{DragPhase, InputEvent, PointerKind};
pub use crate::core::platform_bridge::{PlatformEvent, TickControl};

// Scene system
pub use crate::core::scene::{NavigationRequest, Scene, SceneDirector, SceneEntry, UnitDescriptor};
pub use crate::core::scheduler::{FiredTimer, TimerEvent, TimerScope};

// Content and progress
pub use crate::data::GameDataStore;
pub use crate::functions::FunctionRegistry;
pub use crate::progress::{FileStorage, MemoryStorage, PlayerProgressStore, ProgressStorage};

// Presentation
pub use crate::presentation::{Point, Presenter, RecordingPresenter, VisualHandle, VisualKind};

// Outbox messages
pub use crate::core::message_bus::Outbox;
pub use crate::events::{NavigationEvent, SessionEvent, UserNotification};
