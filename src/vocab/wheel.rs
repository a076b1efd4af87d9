//=========================================================================
// Wheel Game
//=========================================================================
//
// Drag word images onto their labels arranged around a wheel.
//
// Practice: every drop is graded at once against the first overlapping
//           empty label; misses snap back.
// Challenge: any empty label accepts any image; the round is graded when
//            the player submits.
//
// Each graded attempt is recorded against the dragged word. Filling or
// submitting the wheel completes the minigame.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::f32::consts::TAU;

use log::{debug, info};

//=== Internal Dependencies ===============================================

use super::selection::{select_words_priority_queue, WordFilter};
use crate::core::error::{GameError, GameResult};
use crate::core::globals::GameContext;
use crate::core::input::{DragPhase, InputEvent, PointerKind};
use crate::core::scene::NavigationRequest;
use crate::core::scheduler::{TimerEvent, TimerScope};
use crate::data::{VocabularyMinigame, VocabularyWord, WheelMode};
use crate::events::SessionEvent;
use crate::presentation::{
    AnimatedProperty, Interaction, Point, Rect, VisualHandle, VisualKind, VisualProps,
};

const WHEEL_CENTER: Point = Point::new(0.5, 0.45);
const WHEEL_RADIUS: f32 = 0.3;
const LABEL_SIZE: f32 = 14.0;
const SLICE_SIZE: f32 = 8.0;

//=== Pieces ==============================================================

#[derive(Debug, Clone)]
struct Label {
    word: String,
    handle: VisualHandle,
    center: Point,
    filled_by: Option<usize>,
}

#[derive(Debug, Clone)]
struct Slice {
    word: String,
    handle: VisualHandle,
    home: Point,
    placed_on: Option<usize>,
}

//=== WheelGame ===========================================================

#[derive(Debug)]
pub struct WheelGame {
    game: VocabularyMinigame,
    scope: TimerScope,
    words: Vec<VocabularyWord>,
    labels: Vec<Label>,
    slices: Vec<Slice>,
    dragging: Option<usize>,
    submit: Option<VisualHandle>,
    finished: bool,
    correct: usize,
}

impl WheelGame {
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
        info!("Wheel {} ({:?}) with {} words", game.id, game.mode, words.len());

        let mut wheel = Self {
            game: game.clone(),
            scope,
            words,
            labels: Vec::new(),
            slices: Vec::new(),
            dragging: None,
            submit: None,
            finished: false,
            correct: 0,
        };
        wheel.lay_out(ctx, depth);
        ctx.outbox.publish(SessionEvent::Started {
            session: game.id.clone(),
        });
        Ok(wheel)
    }

    fn lay_out(&mut self, ctx: &mut GameContext, depth: i32) {
        let n = self.words.len();
        for (i, word) in self.words.iter().enumerate() {
            let angle = TAU * i as f32 / n as f32;
            let center = Point::new(
                WHEEL_CENTER.x + WHEEL_RADIUS * angle.cos(),
                WHEEL_CENTER.y + WHEEL_RADIUS * angle.sin(),
            );
            let text = ctx.text(&word.words).to_string();
            let handle = ctx.presenter.create_visual(
                VisualKind::Text { text },
                center,
                VisualProps {
                    size_percent: LABEL_SIZE,
                    depth,
                    alpha: 1.0,
                },
            );
            self.labels.push(Label {
                word: word.id.clone(),
                handle,
                center,
                filled_by: None,
            });
        }

        // Images sit on a tray in reverse order so no image starts next
        // to its own label.
        for (slot, word) in self.words.iter().rev().enumerate() {
            let home = Point::new((slot as f32 + 1.0) / (n as f32 + 1.0), 0.92);
            let handle = ctx.presenter.create_visual(
                VisualKind::Sprite {
                    image: word.images.first().cloned(),
                },
                home,
                VisualProps {
                    size_percent: SLICE_SIZE,
                    depth: depth + 1,
                    alpha: 1.0,
                },
            );
            ctx.presenter.listen(handle, Interaction::Drag, true);
            self.slices.push(Slice {
                word: word.id.clone(),
                handle,
                home,
                placed_on: None,
            });
        }

        if self.game.mode == WheelMode::Challenge {
            let submit = ctx.presenter.create_visual(
                VisualKind::Button {
                    label: "submit".to_string(),
                },
                Point::new(0.9, 0.1),
                VisualProps {
                    size_percent: 8.0,
                    depth: depth + 2,
                    alpha: 1.0,
                },
            );
            ctx.presenter.listen(submit, Interaction::Tap, true);
            self.submit = Some(submit);
        }
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

    /// Handle of the draggable image of a word.
    pub fn slice_of(&self, word: &str) -> Option<VisualHandle> {
        self.slices.iter().find(|s| s.word == word).map(|s| s.handle)
    }

    /// Centre of the label of a word.
    pub fn label_center(&self, word: &str) -> Option<Point> {
        self.labels.iter().find(|l| l.word == word).map(|l| l.center)
    }

    //--- Input ------------------------------------------------------------

    pub fn on_input(&mut self, ctx: &mut GameContext, event: &InputEvent) -> bool {
        if self.finished {
            return false;
        }
        match event {
            InputEvent::Pointer {
                handle,
                kind: PointerKind::Tap,
            } if Some(*handle) == self.submit => {
                self.grade_all(ctx);
                true
            }
            InputEvent::Drag {
                handle,
                phase,
                position,
            } => {
                let Some(index) = self.slices.iter().position(|s| s.handle == *handle) else {
                    return false;
                };
                // Practice placements are final.
                if self.game.mode == WheelMode::Practice && self.slices[index].placed_on.is_some() {
                    return false;
                }
                match phase {
                    DragPhase::Start => {
                        self.lift(index);
                        self.dragging = Some(index);
                    }
                    DragPhase::Move if self.dragging == Some(index) => {
                        ctx.presenter
                            .animate_property(*handle, AnimatedProperty::Position(*position), 0);
                    }
                    DragPhase::Move => return false,
                    DragPhase::End => {
                        self.dragging = None;
                        self.drop_slice(ctx, index, *position);
                    }
                }
                true
            }
            _ => false,
        }
    }

    /// Frees the label a placed image was sitting on.
    fn lift(&mut self, index: usize) {
        if let Some(label) = self.slices[index].placed_on.take() {
            self.labels[label].filled_by = None;
        }
    }

    fn drop_slice(&mut self, ctx: &mut GameContext, index: usize, position: Point) {
        let bounds = Rect::centered(position, SLICE_SIZE);
        let hit = self.labels.iter().position(|l| {
            l.filled_by.is_none() && Rect::centered(l.center, LABEL_SIZE).intersects(&bounds)
        });

        let slice = self.slices[index].clone();
        let Some(label) = hit else {
            self.snap_back(ctx, &slice);
            return;
        };

        match self.game.mode {
            WheelMode::Practice => {
                let correct = self.labels[label].word == slice.word;
                self.record(ctx, &slice.word, correct);
                if correct {
                    self.place(ctx, index, label);
                    ctx.presenter.listen(slice.handle, Interaction::Drag, false);
                    self.correct += 1;
                    if self.labels.iter().all(|l| l.filled_by.is_some()) {
                        self.finish(ctx);
                    }
                } else {
                    self.snap_back(ctx, &slice);
                }
            }
            WheelMode::Challenge => self.place(ctx, index, label),
        }
    }

    fn place(&mut self, ctx: &mut GameContext, index: usize, label: usize) {
        self.labels[label].filled_by = Some(index);
        self.slices[index].placed_on = Some(label);
        ctx.presenter.animate_property(
            self.slices[index].handle,
            AnimatedProperty::Position(self.labels[label].center),
            0,
        );
    }

    fn snap_back(&self, ctx: &mut GameContext, slice: &Slice) {
        ctx.presenter.animate_property(
            slice.handle,
            AnimatedProperty::Position(slice.home),
            ctx.config.snap_back_ms,
        );
    }

    /// Challenge grading: an image is right when it sits on its own label.
    fn grade_all(&mut self, ctx: &mut GameContext) {
        let results: Vec<(String, bool)> = self
            .slices
            .iter()
            .map(|s| {
                let correct = s
                    .placed_on
                    .is_some_and(|label| self.labels[label].word == s.word);
                (s.word.clone(), correct)
            })
            .collect();
        for (word, correct) in results {
            self.record(ctx, &word, correct);
            if correct {
                self.correct += 1;
            }
        }
        self.finish(ctx);
    }

    fn record(&mut self, ctx: &mut GameContext, word: &str, correct: bool) {
        let now = ctx.now();
        ctx.progress.record_vocab_result(word, correct, now);
        ctx.outbox.publish(SessionEvent::Interaction {
            session: self.game.id.clone(),
            object: word.to_string(),
            correct,
        });
    }

    fn finish(&mut self, ctx: &mut GameContext) {
        self.finished = true;
        for slice in &self.slices {
            ctx.presenter.listen(slice.handle, Interaction::Drag, false);
        }
        if let Some(submit) = self.submit {
            ctx.presenter.listen(submit, Interaction::Tap, false);
        }
        let first_time = ctx.progress.mark_vocab_game_completed(&self.game.id);
        info!(
            "Wheel {} finished: {}/{} correct",
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
            TimerEvent::SessionEnd if self.finished => {
                ctx.outbox.publish(SessionEvent::Terminated {
                    session: self.game.id.clone(),
                });
                ctx.navigation.push(NavigationRequest::Back);
            }
            other => debug!("Wheel {} ignores {:?}", self.game.id, other),
        }
    }

    pub fn refresh(&mut self, ctx: &mut GameContext) {
        for (label, word) in self.labels.iter().zip(&self.words) {
            let text = ctx.text(&word.words).to_string();
            ctx.presenter.set_text(label.handle, &text);
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
            .labels
            .drain(..)
            .map(|l| l.handle)
            .chain(self.slices.drain(..).map(|s| s.handle))
            .chain(self.submit.take())
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

    fn started(game: &str) -> (GameContext, RecordingPresenter, WheelGame) {
        let (mut ctx, presenter) = testing::context_with_presenter();
        let game = ctx.data.minigame(game).unwrap().clone();
        let wheel = WheelGame::start(&mut ctx, &game, SCOPE, 0).unwrap();
        (ctx, presenter, wheel)
    }

    fn drag_to(ctx: &mut GameContext, wheel: &mut WheelGame, word: &str, to: Point) {
        let handle = wheel.slice_of(word).unwrap();
        wheel.on_input(ctx, &InputEvent::drag(handle, DragPhase::Start, 0.0, 0.0));
        wheel.on_input(ctx, &InputEvent::drag(handle, DragPhase::End, to.x, to.y));
    }

    #[test]
    fn round_uses_at_most_eight_words() {
        let (_ctx, presenter, wheel) = started("animals");
        assert_eq!(wheel.words().len(), 8);
        // Eight labels and eight images.
        assert_eq!(presenter.live_count(), 16);
    }

    #[test]
    fn practice_grades_each_drop() {
        let (mut ctx, presenter, mut wheel) = started("animals");
        let w1 = wheel.slice_of("w1").unwrap();
        let w2_label = wheel.label_center("w2").unwrap();
        let w1_label = wheel.label_center("w1").unwrap();

        drag_to(&mut ctx, &mut wheel, "w1", w2_label);
        assert_eq!(ctx.progress.encounter("w1").unwrap().times_incorrect, 1);
        assert_ne!(presenter.position_of(w1), Some(w2_label));

        drag_to(&mut ctx, &mut wheel, "w1", w1_label);
        assert_eq!(ctx.progress.encounter("w1").unwrap().times_correct, 1);
        assert_eq!(presenter.position_of(w1), Some(w1_label));
        assert!(!presenter.is_listening(w1, Interaction::Drag));
        assert_eq!(wheel.correct_count(), 1);
    }

    #[test]
    fn filling_the_wheel_completes_minigame() {
        let (mut ctx, _presenter, mut wheel) = started("animals");
        let ids: Vec<String> = wheel.words().iter().map(|w| w.id.clone()).collect();
        for id in &ids {
            let center = wheel.label_center(id).unwrap();
            drag_to(&mut ctx, &mut wheel, id, center);
        }

        assert!(wheel.is_finished());
        assert!(ctx
            .progress
            .snapshot()
            .progress
            .completed_vocab_games
            .contains("animals"));

        testing::run_timers(&mut ctx, 2000, |ctx, fired| wheel.on_timer(ctx, &fired.event));
        assert_eq!(ctx.navigation.take(), vec![NavigationRequest::Back]);
    }

    #[test]
    fn challenge_accepts_any_label_and_grades_on_submit() {
        let (mut ctx, presenter, mut wheel) = started("animalsChallenge");
        let w1 = wheel.slice_of("w1").unwrap();
        let w2_label = wheel.label_center("w2").unwrap();
        let w3_label = wheel.label_center("w3").unwrap();

        drag_to(&mut ctx, &mut wheel, "w1", w2_label);
        drag_to(&mut ctx, &mut wheel, "w3", w3_label);
        assert_eq!(presenter.position_of(w1), Some(w2_label));
        assert!(ctx.progress.encounter("w1").is_none());

        let submit = presenter.find_text("submit").unwrap();
        assert!(wheel.on_input(&mut ctx, &InputEvent::tap(submit)));

        assert!(wheel.is_finished());
        assert_eq!(wheel.correct_count(), 1);
        assert_eq!(ctx.progress.encounter("w1").unwrap().times_incorrect, 1);
        assert_eq!(ctx.progress.encounter("w3").unwrap().times_correct, 1);
    }

    #[test]
    fn teardown_releases_everything() {
        let (mut ctx, presenter, mut wheel) = started("animalsChallenge");
        wheel.teardown(&mut ctx);
        assert_eq!(presenter.live_count(), 0);
        assert!(ctx
            .outbox
            .read::<SessionEvent>()
            .contains(&SessionEvent::Abandoned {
                session: "animalsChallenge".into()
            }));
    }
}
