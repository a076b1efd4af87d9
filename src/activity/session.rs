//=========================================================================
// Activity Session
//=========================================================================
//
// One run through a traditional activity's step graph.
//
// Lifecycle:
//   Init ─> ShowingTitle ─> StepActive ─> AwaitingInteraction ⇄ Resolving
//                                                   │
//                         Terminated <── EndSequence┘
//   (any) ─> Failed   when the follow-up chain cannot continue
//
// Inventory:
// - requirements are checked and deducted once, at start
// - step deltas run inside the follow-up chain
// - rewards, completion and unlock recomputation run once, at the end
//
// Every timer lives in the session scope; abandoning the session cancels
// the scope so nothing fires against released visuals.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::rc::Rc;

use log::{debug, error, info, warn};

//=== Internal Dependencies ===============================================

use super::chain::{ChainOp, FollowUpChain};
use super::objects::ObjectSet;
use crate::core::error::{GameError, GameResult};
use crate::core::globals::GameContext;
use crate::core::input::{DragPhase, InputEvent, PointerKind};
use crate::core::scene::NavigationRequest;
use crate::core::scheduler::{TimerEvent, TimerScope};
use crate::data::{ActionType, GameDataStore, Instruction, NextStep, ObjectRole, ResourceMap};
use crate::events::{ActivitiesUnlocked, SessionEvent, UserNotification};
use crate::functions::FunctionOutcome;
use crate::presentation::{
    AnimatedProperty, Interaction, Point, VisualHandle, VisualKind, VisualProps,
};
use crate::progress::PlayerProgress;

//=== Depth Layout ========================================================

// Offsets above the scene's base depth.
const OBJECT_DEPTH: i32 = 10;
const TEXT_DEPTH: i32 = 60;
const REWARD_DEPTH: i32 = 70;
const TITLE_DEPTH: i32 = 80;
const HINT_DEPTH: i32 = 85;
const FAILURE_DEPTH: i32 = 90;

//=== SessionPhase ========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Init,
    ShowingTitle,
    StepActive,
    AwaitingInteraction,
    Resolving,
    EndSequence,
    Terminated,
    /// Unable to continue; the player can only leave.
    Failed,
}

impl SessionPhase {
    pub fn is_finished(&self) -> bool {
        matches!(self, SessionPhase::Terminated | SessionPhase::Failed)
    }
}

//=== Session Visuals =====================================================

#[derive(Debug, Default)]
struct Chrome {
    title: Option<VisualHandle>,
    instruction: Option<VisualHandle>,
    hint_button: Option<VisualHandle>,
    /// (hint number, overlay)
    hint: Option<(u32, VisualHandle)>,
    rewards: Vec<VisualHandle>,
    failure: Vec<VisualHandle>,
    leave: Option<VisualHandle>,
}

//=== ActivitySession =====================================================

#[derive(Debug)]
pub struct ActivitySession {
    activity: String,
    data: Rc<GameDataStore>,
    scope: TimerScope,
    depth: i32,
    phase: SessionPhase,
    step: Option<String>,
    objects: ObjectSet,
    chain: FollowUpChain,
    dragging: Option<VisualHandle>,
    hints_remaining: u32,
    hints_shown: u32,
    chrome: Chrome,
    deducted: ResourceMap,
    rewards: Vec<(String, u32)>,
    completed: bool,
}

impl ActivitySession {
    //--- Construction -----------------------------------------------------

    /// Starts a session: validates the activity, deducts its requirements
    /// and shows the title card.
    ///
    /// Fails without touching the inventory when the activity is unknown
    /// or the inventory cannot cover every requirement.
    pub fn start(
        ctx: &mut GameContext,
        activity_id: &str,
        scope: TimerScope,
        depth: i32,
    ) -> GameResult<Self> {
        Self::check_start(ctx, activity_id)?;
        let data = Rc::clone(&ctx.data);
        let activity = data.activity(activity_id)?;

        let required = activity.required_resources.clone();
        ctx.progress.deduct_resources(&activity.id, &required)?;
        info!("Activity {} started, deducted {:?}", activity.id, required);

        let title = ctx.text(&activity.names).to_string();
        let mut session = Self {
            activity: activity.id.clone(),
            data: Rc::clone(&data),
            scope,
            depth,
            phase: SessionPhase::Init,
            step: None,
            objects: ObjectSet::new(),
            chain: FollowUpChain::new(),
            dragging: None,
            hints_remaining: ctx.config.hint_budget,
            hints_shown: 0,
            chrome: Chrome::default(),
            deducted: required,
            rewards: Vec::new(),
            completed: false,
        };

        ctx.outbox.publish(SessionEvent::Started {
            session: session.activity.clone(),
        });
        session.show_title(ctx, &title);
        Ok(session)
    }

    /// The checks `start` makes before it deducts anything.
    pub fn check_start(ctx: &GameContext, activity_id: &str) -> GameResult<()> {
        let activity = ctx.data.activity(activity_id)?;
        ctx.data.activity_graph(activity_id)?;
        ctx.progress
            .check_available(&activity.id, &activity.required_resources)
    }

    //--- Queries ----------------------------------------------------------

    pub fn activity_id(&self) -> &str {
        &self.activity
    }

    pub fn scope(&self) -> &TimerScope {
        &self.scope
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn current_step(&self) -> Option<&str> {
        self.step.as_deref()
    }

    pub fn hints_remaining(&self) -> u32 {
        self.hints_remaining
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn objects(&self) -> &ObjectSet {
        &self.objects
    }

    fn step_def(&self, id: &str) -> GameResult<Instruction> {
        self.data
            .activity_graph(&self.activity)?
            .step(id)
            .cloned()
            .ok_or_else(|| GameError::not_found("step", id))
    }

    fn current_def(&self) -> GameResult<Instruction> {
        match &self.step {
            Some(id) => self.step_def(id),
            None => Err(GameError::precondition("no step is active")),
        }
    }

    //--- Title Card -------------------------------------------------------

    fn show_title(&mut self, ctx: &mut GameContext, title: &str) {
        self.phase = SessionPhase::ShowingTitle;
        let handle = ctx.presenter.create_visual(
            VisualKind::Text {
                text: title.to_string(),
            },
            Point::new(0.5, 0.4),
            VisualProps {
                size_percent: 60.0,
                depth: self.depth + TITLE_DEPTH,
                alpha: 0.0,
            },
        );
        ctx.presenter
            .animate_property(handle, AnimatedProperty::Alpha(1.0), ctx.config.title_fade_in_ms);
        self.chrome.title = Some(handle);
        ctx.scheduler.schedule(
            self.scope.clone(),
            ctx.config.title_fade_in_ms + ctx.config.title_hold_ms,
            TimerEvent::TitleFadeOut,
        );
    }

    fn fade_title(&mut self, ctx: &mut GameContext) {
        if let Some(title) = self.chrome.title {
            ctx.presenter
                .animate_property(title, AnimatedProperty::Alpha(0.0), ctx.config.title_fade_out_ms);
        }
        ctx.scheduler.schedule(
            self.scope.clone(),
            ctx.config.title_fade_out_ms,
            TimerEvent::TitleDone,
        );
    }

    fn begin_steps(&mut self, ctx: &mut GameContext) -> GameResult<()> {
        if let Some(title) = self.chrome.title.take() {
            ctx.presenter.destroy_visual(title);
        }

        let instruction = ctx.presenter.create_visual(
            VisualKind::Text {
                text: String::new(),
            },
            Point::new(0.5, 0.1),
            VisualProps {
                size_percent: 80.0,
                depth: self.depth + TEXT_DEPTH,
                alpha: 1.0,
            },
        );
        let hint_button = ctx.presenter.create_visual(
            VisualKind::Button {
                label: "hint".to_string(),
            },
            Point::new(0.92, 0.08),
            VisualProps {
                size_percent: 6.0,
                depth: self.depth + TEXT_DEPTH + 1,
                alpha: 1.0,
            },
        );
        ctx.presenter.listen(hint_button, Interaction::Tap, true);
        self.chrome.instruction = Some(instruction);
        self.chrome.hint_button = Some(hint_button);

        let start = self.data.activity_graph(&self.activity)?.start().to_string();
        self.enter_step(ctx, &start)
    }

    //--- Steps ------------------------------------------------------------

    /// Swaps the step's objects in and queues its activation.
    fn enter_step(&mut self, ctx: &mut GameContext, id: &str) -> GameResult<()> {
        let step = self.step_def(id)?;
        debug!("Activity {} entering step {}", self.activity, id);

        self.step = Some(step.id.clone());
        self.phase = SessionPhase::StepActive;
        self.dragging = None;

        self.objects
            .diff(ctx.presenter.as_mut(), &step.objects, self.depth + OBJECT_DEPTH);
        if let Some(instruction) = self.chrome.instruction {
            let text = ctx.text(&step.text).to_string();
            ctx.presenter.set_text(instruction, &text);
        }

        ctx.outbox.publish(SessionEvent::StepEntered {
            session: self.activity.clone(),
            step: step.id.clone(),
        });
        self.chain.queue_activation(&step);
        Ok(())
    }

    /// Enables whatever interaction the step's action type calls for.
    fn activate(&mut self, ctx: &mut GameContext, id: &str) -> GameResult<()> {
        let step = self.step_def(id)?;
        match step.action_type {
            ActionType::Drag => {
                self.objects.listen(ctx.presenter.as_mut(), Interaction::Drag, true, |o| {
                    o.spec.role == ObjectRole::Agent
                });
                self.phase = SessionPhase::AwaitingInteraction;
            }
            ActionType::Select => {
                let choice = step.select_target().map(str::to_string);
                self.objects.listen(ctx.presenter.as_mut(), Interaction::Tap, true, |o| {
                    Some(o.spec.id.as_str()) == choice.as_deref()
                });
                self.phase = SessionPhase::AwaitingInteraction;
            }
            ActionType::Special => {
                let text = ctx
                    .text(step.feedback.as_ref().unwrap_or(&step.text))
                    .to_string();
                if let Some(instruction) = self.chrome.instruction {
                    ctx.presenter.set_text(instruction, &text);
                }
                ctx.outbox.publish(UserNotification::feedback(text));
                self.phase = SessionPhase::Resolving;
                ctx.scheduler.schedule(
                    self.scope.clone(),
                    ctx.config.special_step_delay_ms,
                    TimerEvent::FollowUp,
                );
            }
            ActionType::End => self.end(ctx)?,
            ActionType::Unrecognized => {
                return Err(GameError::configuration(format!(
                    "step {} of {} has an unrecognized action type",
                    step.id, self.activity
                )));
            }
        }
        Ok(())
    }

    /// Records the player's successful interaction and schedules the
    /// follow-up chain.
    fn resolve_interaction(&mut self, ctx: &mut GameContext, object: &str) {
        self.objects
            .listen(ctx.presenter.as_mut(), Interaction::Drag, false, |_| true);
        self.objects
            .listen(ctx.presenter.as_mut(), Interaction::Tap, false, |_| true);
        self.dragging = None;
        self.phase = SessionPhase::Resolving;

        ctx.outbox.publish(SessionEvent::Interaction {
            session: self.activity.clone(),
            object: object.to_string(),
            correct: true,
        });
        ctx.scheduler.schedule(
            self.scope.clone(),
            ctx.config.drag_follow_up_delay_ms,
            TimerEvent::FollowUp,
        );
    }

    //--- Follow-up Chain --------------------------------------------------

    fn run_chain(&mut self, ctx: &mut GameContext) {
        while let Some(op) = self.chain.next() {
            if let Err(e) = self.run_op(ctx, op) {
                self.fail(ctx, &e);
                return;
            }
            if self.phase.is_finished() {
                return;
            }
        }
    }

    fn run_op(&mut self, ctx: &mut GameContext, op: ChainOp) -> GameResult<()> {
        match op {
            ChainOp::ApplyDeltas { remove, add } => {
                ctx.progress.apply_delta(&self.activity, &remove, &add)
            }
            ChainOp::Call(call) => {
                if let FunctionOutcome::Wait(ms) = ctx.call(&call)? {
                    debug!("Chain of {} waits {}ms after {}", self.activity, ms, call);
                    self.chain.suspend();
                    ctx.scheduler
                        .schedule(self.scope.clone(), ms, TimerEvent::ChainResume);
                }
                Ok(())
            }
            ChainOp::Advance { from } => {
                let step = self.step_def(&from)?;
                match successor(&step, ctx.progress.snapshot()) {
                    NextStep::End => self.end(ctx),
                    NextStep::Step(next) => self.enter_step(ctx, &next),
                }
            }
            ChainOp::Activate { step } => self.activate(ctx, &step),
        }
    }

    fn fail(&mut self, ctx: &mut GameContext, err: &GameError) {
        error!("Activity {} cannot continue: {}", self.activity, err);
        self.chain.clear();
        ctx.scheduler.cancel_scope(&self.scope);
        self.objects
            .listen(ctx.presenter.as_mut(), Interaction::Drag, false, |_| true);
        self.objects
            .listen(ctx.presenter.as_mut(), Interaction::Tap, false, |_| true);
        self.dismiss_hint(ctx);
        self.phase = SessionPhase::Failed;

        let reason = err.to_string();
        ctx.outbox.publish(SessionEvent::Failed {
            session: self.activity.clone(),
            reason: reason.clone(),
        });
        ctx.outbox
            .publish(UserNotification::error(format!("Unable to continue: {}", reason)));

        let overlay = ctx.presenter.create_visual(
            VisualKind::Overlay {
                text: "Unable to continue".to_string(),
            },
            Point::new(0.5, 0.5),
            VisualProps {
                size_percent: 70.0,
                depth: self.depth + FAILURE_DEPTH,
                alpha: 1.0,
            },
        );
        let leave = ctx.presenter.create_visual(
            VisualKind::Button {
                label: "leave".to_string(),
            },
            Point::new(0.5, 0.65),
            VisualProps {
                size_percent: 12.0,
                depth: self.depth + FAILURE_DEPTH + 1,
                alpha: 1.0,
            },
        );
        ctx.presenter.listen(leave, Interaction::Tap, true);
        self.chrome.failure.push(overlay);
        self.chrome.leave = Some(leave);
    }

    //--- End Sequence -----------------------------------------------------

    /// Awards, completion and unlock recomputation. Runs at most once per
    /// session; later calls are ignored.
    pub fn end(&mut self, ctx: &mut GameContext) -> GameResult<()> {
        if self.completed {
            debug!("Activity {} already ended", self.activity);
            return Ok(());
        }
        self.completed = true;
        self.phase = SessionPhase::EndSequence;
        self.objects
            .listen(ctx.presenter.as_mut(), Interaction::Drag, false, |_| true);
        self.objects
            .listen(ctx.presenter.as_mut(), Interaction::Tap, false, |_| true);
        self.dismiss_hint(ctx);

        let awarded = self.data.activity(&self.activity)?.awarded_resources.clone();
        ctx.progress.add_resources(&self.activity, &awarded)?;
        let first_time = ctx.progress.mark_activity_completed(&self.activity);
        let unlocked = ctx.progress.recompute_unlocks(&ctx.data);
        if !unlocked.is_empty() {
            ctx.outbox.publish(ActivitiesUnlocked(unlocked));
        }
        info!("Activity {} completed (first time: {})", self.activity, first_time);
        ctx.outbox.publish(SessionEvent::Completed {
            session: self.activity.clone(),
            first_time,
        });

        self.rewards = awarded.into_iter().collect();
        let stagger = ctx.config.reward_stagger_ms;
        for index in 0..self.rewards.len() {
            ctx.scheduler.schedule(
                self.scope.clone(),
                stagger * (index as u64 + 1),
                TimerEvent::RewardShown { index },
            );
        }
        ctx.scheduler.schedule(
            self.scope.clone(),
            stagger * self.rewards.len() as u64 + ctx.config.end_hold_ms,
            TimerEvent::SessionEnd,
        );
        Ok(())
    }

    fn show_reward(&mut self, ctx: &mut GameContext, index: usize) {
        let Some((resource, quantity)) = self.rewards.get(index).cloned() else {
            return;
        };
        let image = self
            .data
            .resource(&resource)
            .ok()
            .and_then(|r| r.image.clone());
        let slot = 0.3 + 0.15 * index as f32;
        let handle = ctx.presenter.create_visual(
            VisualKind::Sprite { image },
            Point::new(slot, 0.9),
            VisualProps {
                size_percent: 8.0,
                depth: self.depth + REWARD_DEPTH,
                alpha: 1.0,
            },
        );
        ctx.presenter.animate_property(
            handle,
            AnimatedProperty::Position(Point::new(slot, 0.5)),
            ctx.config.reward_stagger_ms,
        );
        self.chrome.rewards.push(handle);
        ctx.outbox.publish(SessionEvent::RewardShown {
            session: self.activity.clone(),
            resource,
            quantity,
        });
    }

    fn terminate(&mut self, ctx: &mut GameContext) {
        self.phase = SessionPhase::Terminated;
        self.release(ctx);
        ctx.outbox.publish(SessionEvent::Terminated {
            session: self.activity.clone(),
        });
        ctx.navigation.push(NavigationRequest::Back);
    }

    //--- Hints ------------------------------------------------------------

    /// Spends one hint and shows the step in the hint language.
    pub fn show_hint(&mut self, ctx: &mut GameContext) -> bool {
        if !matches!(
            self.phase,
            SessionPhase::StepActive | SessionPhase::AwaitingInteraction
        ) {
            debug!("Hint ignored in {:?}", self.phase);
            return false;
        }
        if self.hints_remaining == 0 {
            debug!("Hint budget of {} spent", self.activity);
            return false;
        }
        let Ok(step) = self.current_def() else {
            return false;
        };

        self.dismiss_hint(ctx);
        self.hints_remaining -= 1;
        self.hints_shown += 1;

        let text = step
            .hint
            .as_ref()
            .unwrap_or(&step.text)
            .resolve(&ctx.config.hint_language)
            .to_string();
        let overlay = ctx.presenter.create_visual(
            VisualKind::Overlay { text },
            Point::new(0.5, 0.3),
            VisualProps {
                size_percent: 50.0,
                depth: self.depth + HINT_DEPTH,
                alpha: 1.0,
            },
        );
        ctx.presenter.listen(overlay, Interaction::Tap, true);
        self.chrome.hint = Some((self.hints_shown, overlay));
        ctx.scheduler.schedule(
            self.scope.clone(),
            ctx.config.hint_display_ms,
            TimerEvent::HintExpired {
                hint: self.hints_shown,
            },
        );

        if self.hints_remaining == 0 {
            if let Some(button) = self.chrome.hint_button {
                ctx.presenter.listen(button, Interaction::Tap, false);
                ctx.presenter
                    .animate_property(button, AnimatedProperty::Alpha(0.4), 0);
            }
        }

        ctx.outbox.publish(SessionEvent::HintShown {
            session: self.activity.clone(),
            remaining: self.hints_remaining,
        });
        true
    }

    fn dismiss_hint(&mut self, ctx: &mut GameContext) {
        if let Some((_, overlay)) = self.chrome.hint.take() {
            ctx.presenter.destroy_visual(overlay);
        }
    }

    //--- Events -----------------------------------------------------------

    pub fn on_timer(&mut self, ctx: &mut GameContext, event: &TimerEvent) {
        if self.phase.is_finished() {
            debug!("Timer {:?} after {:?}", event, self.phase);
            return;
        }
        match event {
            TimerEvent::TitleFadeOut => self.fade_title(ctx),
            TimerEvent::TitleDone => {
                if let Err(e) = self.begin_steps(ctx) {
                    self.fail(ctx, &e);
                    return;
                }
                self.run_chain(ctx);
            }
            TimerEvent::FollowUp if self.phase == SessionPhase::Resolving => {
                match self.current_def() {
                    Ok(step) => self.chain.queue_resolution(&step),
                    Err(e) => {
                        self.fail(ctx, &e);
                        return;
                    }
                }
                self.run_chain(ctx);
            }
            TimerEvent::ChainResume => {
                self.chain.resume();
                self.run_chain(ctx);
            }
            TimerEvent::HintExpired { hint } => {
                if self.chrome.hint.is_some_and(|(shown, _)| shown == *hint) {
                    self.dismiss_hint(ctx);
                }
            }
            TimerEvent::RewardShown { index } => self.show_reward(ctx, *index),
            TimerEvent::SessionEnd => self.terminate(ctx),
            other => debug!("Activity {} ignores {:?}", self.activity, other),
        }
    }

    /// Offers presentation input. Returns whether it was consumed.
    pub fn on_input(&mut self, ctx: &mut GameContext, event: &InputEvent) -> bool {
        match event {
            InputEvent::Pointer {
                handle,
                kind: PointerKind::Tap,
            } => self.on_tap(ctx, *handle),
            InputEvent::Drag {
                handle,
                phase,
                position,
            } => self.on_drag(ctx, *handle, *phase, *position),
            _ => false,
        }
    }

    fn on_tap(&mut self, ctx: &mut GameContext, handle: VisualHandle) -> bool {
        if self.chrome.leave == Some(handle) {
            ctx.navigation.push(NavigationRequest::Back);
            return true;
        }
        if self.chrome.hint_button == Some(handle) {
            self.show_hint(ctx);
            return true;
        }
        if self.chrome.hint.is_some_and(|(_, overlay)| overlay == handle) {
            self.dismiss_hint(ctx);
            return true;
        }
        if self.phase != SessionPhase::AwaitingInteraction {
            return false;
        }

        let Ok(step) = self.current_def() else {
            return false;
        };
        if step.action_type != ActionType::Select {
            return false;
        }
        let selected = self.objects.by_handle(handle).map(|o| o.spec.id.clone());
        match selected {
            Some(id) if Some(id.as_str()) == step.select_target() => {
                self.resolve_interaction(ctx, &id);
                true
            }
            // Other options are not selectable.
            _ => false,
        }
    }

    fn on_drag(
        &mut self,
        ctx: &mut GameContext,
        handle: VisualHandle,
        phase: DragPhase,
        position: Point,
    ) -> bool {
        if self.phase != SessionPhase::AwaitingInteraction {
            return false;
        }
        let Some(object) = self.objects.by_handle(handle).cloned() else {
            return false;
        };

        match phase {
            DragPhase::Start => {
                self.dragging = Some(handle);
            }
            DragPhase::Move if self.dragging == Some(handle) => {
                ctx.presenter
                    .animate_property(handle, AnimatedProperty::Position(position), 0);
            }
            DragPhase::Move => return false,
            DragPhase::End => {
                self.dragging = None;
                let hit = self
                    .objects
                    .first_target_hit(&object.bounds_at(position))
                    .map(|t| t.spec.id.clone());
                let correct = object.spec.role == ObjectRole::Agent && hit.is_some();

                if correct {
                    debug!("{} dropped on {:?}", object.spec.id, hit);
                    ctx.presenter
                        .animate_property(handle, AnimatedProperty::Position(position), 0);
                    self.objects.settle(handle, position);
                    self.resolve_interaction(ctx, &object.spec.id);
                } else {
                    ctx.presenter.animate_property(
                        handle,
                        AnimatedProperty::Position(object.home),
                        ctx.config.snap_back_ms,
                    );
                    ctx.outbox.publish(SessionEvent::Interaction {
                        session: self.activity.clone(),
                        object: object.spec.id.clone(),
                        correct: false,
                    });
                }
            }
        }
        true
    }

    //--- Teardown ---------------------------------------------------------

    /// Leaves the session wherever it is. Pending timers are cancelled and
    /// every visual released. Requirements are refunded only when the
    /// configuration asks for it and the session never completed.
    pub fn abandon(&mut self, ctx: &mut GameContext) {
        ctx.scheduler.cancel_scope(&self.scope);
        self.chain.clear();

        if self.phase != SessionPhase::Terminated && !self.completed {
            info!("Activity {} abandoned in {:?}", self.activity, self.phase);
            ctx.outbox.publish(SessionEvent::Abandoned {
                session: self.activity.clone(),
            });
            if ctx.config.refund_on_abandon && !self.deducted.is_empty() {
                let refund = std::mem::take(&mut self.deducted);
                if let Err(e) = ctx.progress.add_resources(&self.activity, &refund) {
                    warn!("Refund for {} failed: {}", self.activity, e);
                }
            }
        }

        self.release(ctx);
        self.phase = SessionPhase::Terminated;
    }

    fn release(&mut self, ctx: &mut GameContext) {
        self.objects.clear(ctx.presenter.as_mut());
        self.dismiss_hint(ctx);
        let chrome = std::mem::take(&mut self.chrome);
        for handle in chrome
            .title
            .into_iter()
            .chain(chrome.instruction)
            .chain(chrome.hint_button)
            .chain(chrome.rewards)
            .chain(chrome.failure)
            .chain(chrome.leave)
        {
            ctx.presenter.destroy_visual(handle);
        }
    }

    /// Re-resolves displayed text in the player's language.
    pub fn refresh(&mut self, ctx: &mut GameContext) {
        let (Some(instruction), Ok(step)) = (self.chrome.instruction, self.current_def()) else {
            return;
        };
        let text = ctx.text(&step.text).to_string();
        ctx.presenter.set_text(instruction, &text);
    }
}

/// The first branch whose condition holds, otherwise the default.
fn successor(step: &Instruction, progress: &PlayerProgress) -> NextStep {
    step.branches
        .iter()
        .find(|b| b.condition.evaluate(progress))
        .map(|b| b.next.clone())
        .unwrap_or_else(|| step.next_step.clone())
}

//=========================================================================
// Unit Tests
//=========================================================================
