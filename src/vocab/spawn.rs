//=========================================================================
// Spawn Game
//=========================================================================
//
// Word images appear one by one around the screen while a prompt names
// one of them. Tapping the prompted image is correct and moves on to the
// next prompt; tapping any other image counts as a miss on the prompted
// word. Answering every prompt completes the minigame.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::{debug, info};

//=== Internal Dependencies ===============================================

use super::selection::{select_words_priority_queue, WordFilter};
use crate::core::error::{GameError, GameResult};
use crate::core::globals::GameContext;
use crate::core::input::{InputEvent, PointerKind};
use crate::core::scene::NavigationRequest;
use crate::core::scheduler::{TimerEvent, TimerScope};
use crate::data::{VocabularyMinigame, VocabularyWord};
use crate::events::SessionEvent;
use crate::presentation::{Interaction, Point, VisualHandle, VisualKind, VisualProps};

const PROMPT_POSITION: Point = Point::new(0.5, 0.1);
const CANDIDATE_SIZE: f32 = 10.0;

#[derive(Debug, Clone)]
struct Candidate {
    word: String,
    handle: VisualHandle,
}

//=== SpawnGame ===========================================================

#[derive(Debug)]
pub struct SpawnGame {
    game: VocabularyMinigame,
    scope: TimerScope,
    depth: i32,
    words: Vec<VocabularyWord>,
    candidates: Vec<Candidate>,
    spawned: usize,
    prompt: usize,
    prompt_text: Option<VisualHandle>,
    finished: bool,
    correct: usize,
}

impl SpawnGame {
    pub fn start(
        ctx: &mut GameContext,
        game: &VocabularyMinigame,
        scope: TimerScope,
        depth: i32,
    ) -> GameResult<Self> {
        let bank = ctx.progress.effective_vocabulary(&ctx.data);
        let words = select_words_priority_queue(&bank, &WordFilter::for_minigame(game), ctx.now());
        if words.is_empty() {
            return Err(GameError::configuration(format!(
                "minigame {} matches no words",
                game.id
            )));
        }
        info!("Spawn {} with {} words", game.id, words.len());

        let text = ctx.text(&words[0].words).to_string();
        let prompt_text = ctx.presenter.create_visual(
            VisualKind::Text { text },
            PROMPT_POSITION,
            VisualProps {
                size_percent: 12.0,
                depth: depth + 1,
                alpha: 1.0,
            },
        );

        ctx.scheduler.schedule(scope.clone(), 0, TimerEvent::Spawn);
        ctx.outbox.publish(SessionEvent::Started {
            session: game.id.clone(),
        });

        Ok(Self {
            game: game.clone(),
            scope,
            depth,
            words,
            candidates: Vec::new(),
            spawned: 0,
            prompt: 0,
            prompt_text: Some(prompt_text),
            finished: false,
            correct: 0,
        })
    }

    //--- Queries ----------------------------------------------------------

    pub fn words(&self) -> &[VocabularyWord] {
        &self.words
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn correct_count(&self) -> usize {
        self.correct
    }

    /// Id of the word currently asked for.
    pub fn prompted(&self) -> Option<&str> {
        if self.finished {
            return None;
        }
        self.words.get(self.prompt).map(|w| w.id.as_str())
    }

    /// Handle of a spawned candidate still on screen.
    pub fn candidate_of(&self, word: &str) -> Option<VisualHandle> {
        self.candidates
            .iter()
            .find(|c| c.word == word)
            .map(|c| c.handle)
    }

    pub fn spawned(&self) -> usize {
        self.spawned
    }

    //--- Spawning ---------------------------------------------------------

    fn spawn_next(&mut self, ctx: &mut GameContext) {
        let Some(word) = self.words.get(self.spawned) else {
            return;
        };
        let n = self.words.len();
        let i = self.spawned;
        let position = Point::new(
            (i as f32 + 1.0) / (n as f32 + 1.0),
            if i % 2 == 0 { 0.4 } else { 0.7 },
        );
        let handle = ctx.presenter.create_visual(
            VisualKind::Sprite {
                image: word.images.first().cloned(),
            },
            position,
            VisualProps {
                size_percent: CANDIDATE_SIZE,
                depth: self.depth,
                alpha: 1.0,
            },
        );
        ctx.presenter.listen(handle, Interaction::Tap, true);
        self.candidates.push(Candidate {
            word: word.id.clone(),
            handle,
        });
        self.spawned += 1;

        if self.spawned < n {
            ctx.scheduler.schedule(
                self.scope.clone(),
                ctx.config.reward_stagger_ms,
                TimerEvent::Spawn,
            );
        }
    }

    //--- Input ------------------------------------------------------------

    pub fn on_input(&mut self, ctx: &mut GameContext, event: &InputEvent) -> bool {
        if self.finished {
            return false;
        }
        let InputEvent::Pointer {
            handle,
            kind: PointerKind::Tap,
        } = event
        else {
            return false;
        };
        let Some(index) = self.candidates.iter().position(|c| c.handle == *handle) else {
            return false;
        };
        let Some(prompted) = self.prompted().map(str::to_string) else {
            return false;
        };

        let tapped = self.candidates[index].word.clone();
        let correct = tapped == prompted;
        let now = ctx.now();
        ctx.progress.record_vocab_result(&prompted, correct, now);
        ctx.outbox.publish(SessionEvent::Interaction {
            session: self.game.id.clone(),
            object: tapped,
            correct,
        });

        if correct {
            self.correct += 1;
            let candidate = self.candidates.remove(index);
            ctx.presenter.destroy_visual(candidate.handle);
            self.next_prompt(ctx);
        }
        true
    }

    fn next_prompt(&mut self, ctx: &mut GameContext) {
        self.prompt += 1;
        match self.words.get(self.prompt) {
            Some(word) => {
                let text = ctx.text(&word.words).to_string();
                if let Some(prompt_text) = self.prompt_text {
                    ctx.presenter.set_text(prompt_text, &text);
                }
            }
            None => self.finish(ctx),
        }
    }

    fn finish(&mut self, ctx: &mut GameContext) {
        self.finished = true;
        for candidate in &self.candidates {
            ctx.presenter.listen(candidate.handle, Interaction::Tap, false);
        }
        let first_time = ctx.progress.mark_vocab_game_completed(&self.game.id);
        info!(
            "Spawn {} finished: {}/{} on first try",
            self.game.id,
            self.correct,
            self.words.len()
        );
        ctx.outbox.publish(SessionEvent::Completed {
            session: self.game.id.clone(),
            first_time,
        });
        ctx.scheduler.schedule(
            self.scope.clone(),
            ctx.config.end_hold_ms,
            TimerEvent::SessionEnd,
        );
    }

    //--- Timers & Teardown ------------------------------------------------

    pub fn on_timer(&mut self, ctx: &mut GameContext, event: &TimerEvent) {
        match event {
            TimerEvent::Spawn if !self.finished => self.spawn_next(ctx),
            TimerEvent::SessionEnd if self.finished => {
                ctx.outbox.publish(SessionEvent::Terminated {
                    session: self.game.id.clone(),
                });
                ctx.navigation.push(NavigationRequest::Back);
            }
            other => debug!("Spawn {} ignores {:?}", self.game.id, other),
        }
    }

    pub fn refresh(&mut self, ctx: &mut GameContext) {
        if let (Some(handle), Some(word)) = (self.prompt_text, self.words.get(self.prompt)) {
            let text = ctx.text(&word.words).to_string();
            ctx.presenter.set_text(handle, &text);
        }
    }

    pub fn teardown(&mut self, ctx: &mut GameContext) {
        ctx.scheduler.cancel_scope(&self.scope);
        if !self.finished {
            ctx.outbox.publish(SessionEvent::Abandoned {
                session: self.game.id.clone(),
            });
        }
        for handle in self
            .candidates
            .drain(..)
            .map(|c| c.handle)
            .chain(self.prompt_text.take())
        {
            ctx.presenter.destroy_visual(handle);
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::RecordingPresenter;
    use crate::testing;

    const SCOPE: TimerScope = TimerScope::Session {
        scene: 1,
        session: 1,
    };

    fn started() -> (GameContext, RecordingPresenter, SpawnGame) {
        let (mut ctx, presenter) = testing::context_with_presenter();
        let game = ctx.data.minigame("birds").unwrap().clone();
        let spawn = SpawnGame::start(&mut ctx, &game, SCOPE, 0).unwrap();
        (ctx, presenter, spawn)
    }

    fn spawn_all(ctx: &mut GameContext, spawn: &mut SpawnGame) {
        testing::run_timers(ctx, 1000, |ctx, fired| spawn.on_timer(ctx, &fired.event));
    }

    fn tap(ctx: &mut GameContext, spawn: &mut SpawnGame, word: &str) -> bool {
        let handle = spawn.candidate_of(word).unwrap();
        spawn.on_input(ctx, &InputEvent::tap(handle))
    }

    #[test]
    fn candidates_appear_one_at_a_time() {
        let (mut ctx, presenter, mut spawn) = started();
        assert_eq!(spawn.words().len(), 3);
        assert_eq!(spawn.spawned(), 0);

        testing::run_timers(&mut ctx, 10, |ctx, fired| spawn.on_timer(ctx, &fired.event));
        assert_eq!(spawn.spawned(), 1);

        spawn_all(&mut ctx, &mut spawn);
        assert_eq!(spawn.spawned(), 3);
        // Prompt plus three candidates.
        assert_eq!(presenter.live_count(), 4);
        assert!(presenter.find_text("eagle").is_some());
    }

    #[test]
    fn wrong_tap_counts_against_prompted_word() {
        let (mut ctx, _presenter, mut spawn) = started();
        spawn_all(&mut ctx, &mut spawn);

        assert_eq!(spawn.prompted(), Some("w11"));
        assert!(tap(&mut ctx, &mut spawn, "w12"));
        assert_eq!(ctx.progress.encounter("w11").unwrap().times_incorrect, 1);
        assert!(ctx.progress.encounter("w12").is_none());
        assert_eq!(spawn.prompted(), Some("w11"));
    }

    #[test]
    fn right_tap_advances_prompt() {
        let (mut ctx, presenter, mut spawn) = started();
        spawn_all(&mut ctx, &mut spawn);
        let eagle = spawn.candidate_of("w11").unwrap();

        assert!(tap(&mut ctx, &mut spawn, "w11"));
        assert_eq!(ctx.progress.encounter("w11").unwrap().times_correct, 1);
        assert!(!presenter.is_live(eagle));
        assert_eq!(spawn.prompted(), Some("w12"));
        assert!(presenter.find_text("raven").is_some());
    }

    #[test]
    fn answering_every_prompt_completes_minigame() {
        let (mut ctx, _presenter, mut spawn) = started();
        spawn_all(&mut ctx, &mut spawn);
        for word in ["w11", "w12", "w13"] {
            tap(&mut ctx, &mut spawn, word);
        }

        assert!(spawn.is_finished());
        assert_eq!(spawn.correct_count(), 3);
        assert!(ctx
            .progress
            .snapshot()
            .progress
            .completed_vocab_games
            .contains("birds"));

        testing::run_timers(&mut ctx, 2000, |ctx, fired| spawn.on_timer(ctx, &fired.event));
        assert_eq!(ctx.navigation.take(), vec![NavigationRequest::Back]);
    }

    #[test]
    fn teardown_cancels_pending_spawns() {
        let (mut ctx, presenter, mut spawn) = started();
        spawn.teardown(&mut ctx);
        assert_eq!(ctx.scheduler.pending_in(&SCOPE), 0);
        assert_eq!(presenter.live_count(), 0);
    }
}
