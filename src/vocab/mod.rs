//=========================================================================
// Vocabulary Minigames
//=========================================================================
//
// Word selection plus the two minigame variants.
//
// Modules:
// - selection: deterministic priority selection of round words
// - wheel: drag-to-match wheel (practice / challenge)
// - spawn: prompt-and-tap selection game
//
//=========================================================================

mod selection;
mod spawn;
mod wheel;

pub use selection::{select_words_priority_queue, WordFilter, MAX_WORDS};
pub use spawn::SpawnGame;
pub use wheel::WheelGame;

use crate::core::error::{GameError, GameResult};
use crate::core::globals::GameContext;
use crate::core::input::InputEvent;
use crate::core::scheduler::{TimerEvent, TimerScope};
use crate::data::GameType;

//=== MinigameSession =====================================================

/// A running minigame of either variant.
#[derive(Debug)]
pub enum MinigameSession {
    Wheel(WheelGame),
    Spawn(SpawnGame),
}

impl MinigameSession {
    pub fn start(
        ctx: &mut GameContext,
        minigame_id: &str,
        scope: TimerScope,
        depth: i32,
    ) -> GameResult<Self> {
        let game = ctx.data.minigame(minigame_id)?.clone();
        match game.game_type {
            GameType::Wheel => WheelGame::start(ctx, &game, scope, depth).map(Self::Wheel),
            GameType::Spawn => SpawnGame::start(ctx, &game, scope, depth).map(Self::Spawn),
        }
    }

    /// Fails when the minigame is unknown or no word fits its filter.
    pub fn check_start(ctx: &GameContext, minigame_id: &str) -> GameResult<()> {
        let game = ctx.data.minigame(minigame_id)?;
        let filter = WordFilter::for_minigame(game);
        if ctx.data.vocabulary().iter().any(|w| filter.matches(w)) {
            Ok(())
        } else {
            Err(GameError::configuration(format!(
                "minigame {} matches no words",
                game.id
            )))
        }
    }

    pub fn is_finished(&self) -> bool {
        match self {
            Self::Wheel(game) => game.is_finished(),
            Self::Spawn(game) => game.is_finished(),
        }
    }

    pub fn on_input(&mut self, ctx: &mut GameContext, event: &InputEvent) -> bool {
        match self {
            Self::Wheel(game) => game.on_input(ctx, event),
            Self::Spawn(game) => game.on_input(ctx, event),
        }
    }

    pub fn on_timer(&mut self, ctx: &mut GameContext, event: &TimerEvent) {
        match self {
            Self::Wheel(game) => game.on_timer(ctx, event),
            Self::Spawn(game) => game.on_timer(ctx, event),
        }
    }

    pub fn refresh(&mut self, ctx: &mut GameContext) {
        match self {
            Self::Wheel(game) => game.refresh(ctx),
            Self::Spawn(game) => game.refresh(ctx),
        }
    }

    pub fn teardown(&mut self, ctx: &mut GameContext) {
        match self {
            Self::Wheel(game) => game.teardown(ctx),
            Self::Spawn(game) => game.teardown(ctx),
        }
    }
}
