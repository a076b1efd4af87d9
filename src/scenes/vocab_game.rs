//=========================================================================
// Vocabulary Game Scene
//=========================================================================
//
// Primary unit hosting one minigame per entry; the entry reference is
// the minigame id.
//
//=========================================================================

use log::debug;

use super::activity::session_scope;
use crate::core::error::{GameError, GameResult};
use crate::core::globals::GameContext;
use crate::core::input::InputEvent;
use crate::core::scene::{Scene, SceneEntry};
use crate::core::scheduler::{FiredTimer, TimerScope};
use crate::vocab::MinigameSession;

#[derive(Debug, Default)]
pub struct VocabGameScene {
    game: Option<(TimerScope, MinigameSession)>,
    started: u64,
}

impl VocabGameScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn game(&self) -> Option<&MinigameSession> {
        self.game.as_ref().map(|(_, game)| game)
    }
}

fn minigame_of(entry: &SceneEntry) -> GameResult<&str> {
    entry
        .reference
        .as_deref()
        .ok_or_else(|| GameError::precondition("vocabulary scene needs a minigame id"))
}

impl Scene for VocabGameScene {
    fn can_enter(&self, ctx: &GameContext, entry: &SceneEntry) -> GameResult<()> {
        session_scope(entry, self.started + 1)?;
        MinigameSession::check_start(ctx, minigame_of(entry)?)
    }

    fn on_enter(&mut self, ctx: &mut GameContext, entry: &SceneEntry) -> GameResult<()> {
        let minigame = minigame_of(entry)?;
        self.started += 1;
        let scope = session_scope(entry, self.started)?;
        let game = MinigameSession::start(ctx, minigame, scope.clone(), entry.depth)?;
        self.game = Some((scope, game));
        Ok(())
    }

    fn on_exit(&mut self, ctx: &mut GameContext) {
        if let Some((_, mut game)) = self.game.take() {
            game.teardown(ctx);
        }
    }

    fn on_input(&mut self, ctx: &mut GameContext, event: &InputEvent) -> bool {
        self.game
            .as_mut()
            .is_some_and(|(_, game)| game.on_input(ctx, event))
    }

    fn on_timer(&mut self, ctx: &mut GameContext, timer: &FiredTimer) {
        match self.game.as_mut() {
            Some((scope, game)) if *scope == timer.scope => game.on_timer(ctx, &timer.event),
            _ => debug!("Vocabulary scene drops {:?}", timer),
        }
    }

    fn on_refresh(&mut self, ctx: &mut GameContext) {
        if let Some((_, game)) = self.game.as_mut() {
            game.refresh(ctx);
        }
    }

    fn update(&mut self, _ctx: &mut GameContext) {}
}
