//=========================================================================
// Dialogue Sequencer
//=========================================================================
//
// Walks the ordered dialogue lines of one primary scene.
//
// State machine:
//   Idle ──(start delay)──> Active ──(last line shown)──> Exhausted
//                                                            │
//                       Closed <────(close delay)────────────┘
//
// Idle → Active is the only transition not driven by the player. Each
// advance shows the next line whose condition holds; lines whose
// condition fails are skipped and never shown. Closing tears the box
// down and rewinds to the first line.
//
// A scene without a dialogue entry gets no sequencer and no box.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::{debug, info, warn};

//=== Internal Dependencies ===============================================

use crate::core::globals::GameContext;
use crate::core::input::{InputEvent, PointerKind};
use crate::core::scene::SceneEntry;
use crate::core::scheduler::{TimerEvent, TimerScope};
use crate::data::{holds, DialogueLine};
use crate::events::DialogueEvent;
use crate::functions::FunctionOutcome;
use crate::presentation::{Interaction, Point, VisualHandle, VisualKind, VisualProps};

/// Depth of the dialogue box above its scene's base depth.
const BOX_DEPTH: i32 = 50;

//=== DialogueState =======================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogueState {
    Idle,
    Active,
    Exhausted,
    Closed,
}

//=== Dialogue Box ========================================================

#[derive(Debug, Clone, Copy)]
struct DialogueBox {
    panel: VisualHandle,
    text: VisualHandle,
    next: Option<VisualHandle>,
}

//=== DialogueSequencer ===================================================

#[derive(Debug)]
pub struct DialogueSequencer {
    scene: String,
    lines: Vec<DialogueLine>,
    index: usize,
    state: DialogueState,
    scope: TimerScope,
    depth: i32,
    /// Index of the line on display.
    shown: Option<usize>,
    visuals: Option<DialogueBox>,
}

impl DialogueSequencer {
    //--- Construction -----------------------------------------------------

    /// Creates the sequencer for a scene entry, or `None` when the scene
    /// has no dialogue.
    pub fn for_scene(ctx: &GameContext, entry: &SceneEntry) -> Option<Self> {
        let lines = ctx.data.dialogue_for(&entry.key)?.lines.clone();
        if lines.is_empty() {
            return None;
        }
        Some(Self {
            scene: entry.key.clone(),
            lines,
            index: 0,
            state: DialogueState::Idle,
            scope: entry.scope.clone(),
            depth: entry.depth + BOX_DEPTH,
            shown: None,
            visuals: None,
        })
    }

    /// Arms the automatic start.
    pub fn begin(&mut self, ctx: &mut GameContext) {
        self.index = 0;
        self.state = DialogueState::Idle;
        ctx.scheduler.schedule(
            self.scope.clone(),
            ctx.config.dialogue_start_delay_ms,
            TimerEvent::DialogueStart,
        );
    }

    //--- Queries ----------------------------------------------------------

    pub fn state(&self) -> DialogueState {
        self.state
    }

    /// Index of the next line to consider.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn shown_line(&self) -> Option<usize> {
        self.shown
    }

    pub fn has_advance(&self) -> bool {
        self.visuals.is_some_and(|v| v.next.is_some())
    }

    //--- Events -----------------------------------------------------------

    /// Handles a timer of the owning scene. Returns whether it was ours.
    pub fn on_timer(&mut self, ctx: &mut GameContext, event: &TimerEvent) -> bool {
        match event {
            TimerEvent::DialogueStart if self.state == DialogueState::Idle => {
                if self.has_eligible_line(ctx) {
                    self.open(ctx);
                } else {
                    debug!("No dialogue line of {} applies, box not opened", self.scene);
                    self.state = DialogueState::Closed;
                }
                true
            }
            TimerEvent::DialogueClose if self.state == DialogueState::Exhausted => {
                self.close(ctx);
                true
            }
            _ => false,
        }
    }

    /// A tap on the advance affordance moves to the next line.
    pub fn on_input(&mut self, ctx: &mut GameContext, event: &InputEvent) -> bool {
        let Some(next) = self.visuals.and_then(|v| v.next) else {
            return false;
        };
        match event {
            InputEvent::Pointer {
                handle,
                kind: PointerKind::Tap,
            } if *handle == next => {
                self.advance(ctx);
                true
            }
            _ => false,
        }
    }

    fn has_eligible_line(&self, ctx: &GameContext) -> bool {
        let progress = ctx.progress.snapshot();
        self.lines[self.index..]
            .iter()
            .any(|line| holds(line.condition.as_ref(), progress))
    }

    //--- Transitions ------------------------------------------------------

    fn open(&mut self, ctx: &mut GameContext) {
        info!("Dialogue opened in {}", self.scene);
        self.state = DialogueState::Active;

        let panel = ctx.presenter.create_visual(
            VisualKind::Sprite {
                image: Some("dialogue_box".to_string()),
            },
            Point::new(0.5, 0.85),
            VisualProps {
                size_percent: 90.0,
                depth: self.depth,
                alpha: 1.0,
            },
        );
        let text = ctx.presenter.create_visual(
            VisualKind::Text {
                text: String::new(),
            },
            Point::new(0.5, 0.85),
            VisualProps {
                size_percent: 80.0,
                depth: self.depth + 1,
                alpha: 1.0,
            },
        );
        let next = ctx.presenter.create_visual(
            VisualKind::Button {
                label: "next".to_string(),
            },
            Point::new(0.92, 0.92),
            VisualProps {
                size_percent: 6.0,
                depth: self.depth + 2,
                alpha: 1.0,
            },
        );
        ctx.presenter.listen(next, Interaction::Tap, true);
        self.visuals = Some(DialogueBox {
            panel,
            text,
            next: Some(next),
        });

        ctx.outbox.publish(DialogueEvent::Opened {
            scene: self.scene.clone(),
        });
        self.advance(ctx);
    }

    /// Shows the next eligible line, or exhausts the dialogue.
    pub fn advance(&mut self, ctx: &mut GameContext) {
        if self.state != DialogueState::Active {
            debug!("Advance ignored in {:?}", self.state);
            return;
        }

        while self.index < self.lines.len() {
            let index = self.index;
            self.index += 1;

            if !holds(self.lines[index].condition.as_ref(), ctx.progress.snapshot()) {
                debug!("Dialogue line {} of {} skipped", index, self.scene);
                ctx.outbox.publish(DialogueEvent::LineSkipped {
                    scene: self.scene.clone(),
                    index,
                });
                continue;
            }

            self.show(ctx, index);
            if self.index >= self.lines.len() {
                self.exhaust(ctx);
            }
            return;
        }

        self.exhaust(ctx);
    }

    fn show(&mut self, ctx: &mut GameContext, index: usize) {
        self.shown = Some(index);
        let line = self.lines[index].clone();
        let text = ctx.text(&line.text).to_string();

        if let Some(visuals) = self.visuals {
            ctx.presenter.set_text(visuals.text, &display(&line, &text));
        }
        ctx.outbox.publish(DialogueEvent::LineShown {
            scene: self.scene.clone(),
            index,
            speaker: line.speaker.clone(),
            text,
        });

        for call in &line.functions {
            match ctx.call(call) {
                Ok(FunctionOutcome::Done) => {}
                Ok(FunctionOutcome::Wait(ms)) => {
                    debug!("Dialogue call {} asked to wait {}ms; lines do not wait", call, ms)
                }
                Err(e) => warn!("Dialogue call {} in {} failed: {}", call, self.scene, e),
            }
        }
    }

    fn exhaust(&mut self, ctx: &mut GameContext) {
        self.state = DialogueState::Exhausted;
        if let Some(visuals) = self.visuals.as_mut() {
            if let Some(next) = visuals.next.take() {
                ctx.presenter.destroy_visual(next);
            }
        }
        ctx.scheduler.schedule(
            self.scope.clone(),
            ctx.config.dialogue_close_delay_ms,
            TimerEvent::DialogueClose,
        );
        ctx.outbox.publish(DialogueEvent::Exhausted {
            scene: self.scene.clone(),
        });
    }

    fn close(&mut self, ctx: &mut GameContext) {
        self.destroy_visuals(ctx);
        self.state = DialogueState::Closed;
        self.index = 0;
        self.shown = None;
        debug!("Dialogue closed in {}", self.scene);
        ctx.outbox.publish(DialogueEvent::Closed {
            scene: self.scene.clone(),
        });
    }

    //--- Teardown & Refresh -----------------------------------------------

    /// Releases the box when the scene stops. Pending timers belong to the
    /// scene scope and are cancelled by the director.
    pub fn teardown(&mut self, ctx: &mut GameContext) {
        self.destroy_visuals(ctx);
        self.shown = None;
    }

    /// Re-resolves the displayed line (language or viewport changed).
    pub fn refresh(&mut self, ctx: &mut GameContext) {
        if let (Some(index), Some(visuals)) = (self.shown, self.visuals) {
            let line = &self.lines[index];
            let text = ctx.text(&line.text).to_string();
            ctx.presenter.set_text(visuals.text, &display(line, &text));
        }
    }

    fn destroy_visuals(&mut self, ctx: &mut GameContext) {
        if let Some(visuals) = self.visuals.take() {
            ctx.presenter.destroy_visual(visuals.panel);
            ctx.presenter.destroy_visual(visuals.text);
            if let Some(next) = visuals.next {
                ctx.presenter.destroy_visual(next);
            }
        }
    }
}

fn display(line: &DialogueLine, text: &str) -> String {
    match &line.speaker {
        Some(speaker) => format!("{}: {}", speaker, text),
        None => text.to_string(),
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
