//=========================================================================
// Game Context
//=========================================================================
//
// Shared data container for scenes.
//
// Contains state that scenes read/write during their hooks:
// - data: read-only content
// - progress: the player's record (write-through)
// - scheduler: scoped timers
// - navigation: queue of navigation requests for the tick boundary
// - outbox: notifications for the presentation layer
// - presenter: the rendering boundary
//
//=========================================================================

//=== External Dependencies ===============================================

use std::rc::Rc;

use chrono::{DateTime, Utc};

//=== Internal Dependencies ===============================================

use crate::config::GameConfig;
use crate::core::error::GameResult;
use crate::core::message_bus::Outbox;
use crate::core::scene::TransitionQueue;
use crate::core::scheduler::Scheduler;
use crate::data::{GameDataStore, LocalizedText};
use crate::functions::{FunctionCall, FunctionOutcome, FunctionRegistry};
use crate::presentation::Presenter;
use crate::progress::PlayerProgressStore;

//=== GameContext =========================================================

/// Shared context handed to every scene hook.
///
/// Scenes receive `&mut GameContext` and never see the director itself;
/// navigation goes through `navigation` and is applied at the tick
/// boundary.
pub struct GameContext {
    pub config: GameConfig,

    /// Static content, validated at load.
    pub data: Rc<GameDataStore>,

    /// Mutable player state.
    pub progress: PlayerProgressStore,

    /// Timers; every timer belongs to a unit, scene or session scope.
    pub scheduler: Scheduler,

    /// Navigation requests for the next tick boundary.
    pub navigation: TransitionQueue,

    /// Per-tick notifications for the presentation layer.
    pub outbox: Outbox,

    /// Rendering boundary.
    pub presenter: Box<dyn Presenter>,

    /// Named operations content may invoke.
    pub functions: Rc<FunctionRegistry>,

    /// Wall clock for vocabulary history.
    pub(crate) clock: fn() -> DateTime<Utc>,
}

impl GameContext {
    /// Creates a context with empty queues.
    pub(crate) fn new(
        config: GameConfig,
        data: Rc<GameDataStore>,
        progress: PlayerProgressStore,
        presenter: Box<dyn Presenter>,
        functions: Rc<FunctionRegistry>,
    ) -> Self {
        Self {
            config,
            data,
            progress,
            scheduler: Scheduler::new(),
            navigation: TransitionQueue::new(),
            outbox: Outbox::new(),
            presenter,
            functions,
            clock: Utc::now,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// The player's display language.
    pub fn language(&self) -> String {
        self.progress.language().to_string()
    }

    /// Text in the player's language.
    pub fn text<'a>(&self, text: &'a LocalizedText) -> &'a str {
        text.resolve(self.progress.language())
    }

    /// Runs a content function call.
    pub fn call(&mut self, call: &FunctionCall) -> GameResult<FunctionOutcome> {
        let functions = Rc::clone(&self.functions);
        functions.invoke(self, call)
    }
}

impl std::fmt::Debug for GameContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameContext")
            .field("progress", &self.progress)
            .field("scheduler", &self.scheduler)
            .field("navigation", &self.navigation)
            .field("outbox", &self.outbox)
            .finish_non_exhaustive()
    }
}
