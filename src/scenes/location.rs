//=========================================================================
// Location Scene
//=========================================================================
//
// A place in the valley: its dialogue plus buttons leading elsewhere.
//
// Exits:
//   biome location → one button per activity of the biome (locked ones
//                    shown dimmed and inert)
//   hub location   → one button per unlocked biome with a scene, one per
//                    vocabulary minigame
//
//=========================================================================

//=== External Dependencies ===============================================

use std::rc::Rc;

use log::debug;

//=== Internal Dependencies ===============================================

use super::{button, tapped, ACTIVITY_SCENE, VOCAB_GAME_SCENE};
use crate::core::error::GameResult;
use crate::core::globals::GameContext;
use crate::core::input::InputEvent;
use crate::core::scene::{NavigationRequest, Scene, SceneEntry};
use crate::core::scheduler::FiredTimer;
use crate::data::{GameDataStore, LocalizedText};
use crate::dialogue::DialogueSequencer;
use crate::presentation::{AnimatedProperty, Interaction, Point, VisualHandle};

#[derive(Debug, Clone)]
struct Exit {
    handle: VisualHandle,
    label: LocalizedText,
    /// `None` for a locked activity.
    request: Option<NavigationRequest>,
}

//=== LocationScene =======================================================

#[derive(Debug, Default)]
pub struct LocationScene {
    dialogue: Option<DialogueSequencer>,
    exits: Vec<Exit>,
}

impl LocationScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dialogue(&self) -> Option<&DialogueSequencer> {
        self.dialogue.as_ref()
    }

    /// Handles of the exit buttons, top to bottom.
    pub fn exits(&self) -> Vec<VisualHandle> {
        self.exits.iter().map(|e| e.handle).collect()
    }

    fn exit_plan(
        ctx: &GameContext,
        data: &GameDataStore,
        entry: &SceneEntry,
    ) -> Vec<(LocalizedText, Option<NavigationRequest>)> {
        let biome = data.scene(&entry.key).and_then(|m| m.biome_id.clone());
        match biome {
            Some(biome) => data
                .activities_in_biome(&biome)
                .map(|a| {
                    let request = ctx
                        .progress
                        .is_activity_unlocked(&a.id)
                        .then(|| NavigationRequest::change(ACTIVITY_SCENE, Some(&a.id)));
                    (a.names.clone(), request)
                })
                .collect(),
            None => {
                let biomes = data
                    .biomes()
                    .filter(|b| ctx.progress.is_biome_unlocked(&b.id))
                    .filter(|b| data.resolve_scene(&b.reference_name, None).is_ok())
                    .map(|b| {
                        (
                            b.names.clone(),
                            Some(NavigationRequest::change(&b.reference_name, None)),
                        )
                    });
                let games = data.minigames().map(|g| {
                    let label = if g.names.is_empty() {
                        LocalizedText::single(&ctx.config.default_language, &g.id)
                    } else {
                        g.names.clone()
                    };
                    (
                        label,
                        Some(NavigationRequest::change(VOCAB_GAME_SCENE, Some(&g.id))),
                    )
                });
                biomes.chain(games).collect()
            }
        }
    }
}

impl Scene for LocationScene {
    fn on_enter(&mut self, ctx: &mut GameContext, entry: &SceneEntry) -> GameResult<()> {
        let data = Rc::clone(&ctx.data);
        for (i, (label, request)) in Self::exit_plan(ctx, &data, entry).into_iter().enumerate() {
            let text = ctx.text(&label).to_string();
            let position = Point::new(0.15, 0.2 + 0.1 * i as f32);
            let handle = button(ctx, &text, position, entry.depth + 10);
            if request.is_none() {
                ctx.presenter.listen(handle, Interaction::Tap, false);
                ctx.presenter
                    .animate_property(handle, AnimatedProperty::Alpha(0.4), 0);
            }
            self.exits.push(Exit {
                handle,
                label,
                request,
            });
        }
        debug!("{} has {} exit(s)", entry.key, self.exits.len());

        self.dialogue = DialogueSequencer::for_scene(ctx, entry);
        if let Some(dialogue) = self.dialogue.as_mut() {
            dialogue.begin(ctx);
        }
        Ok(())
    }

    fn on_exit(&mut self, ctx: &mut GameContext) {
        if let Some(mut dialogue) = self.dialogue.take() {
            dialogue.teardown(ctx);
        }
        for exit in self.exits.drain(..) {
            ctx.presenter.destroy_visual(exit.handle);
        }
    }

    fn on_input(&mut self, ctx: &mut GameContext, event: &InputEvent) -> bool {
        if let Some(dialogue) = self.dialogue.as_mut() {
            if dialogue.on_input(ctx, event) {
                return true;
            }
        }
        let Some(handle) = tapped(event) else {
            return false;
        };
        match self.exits.iter().find(|e| e.handle == handle) {
            Some(Exit {
                request: Some(request),
                ..
            }) => {
                ctx.navigation.push(request.clone());
                true
            }
            _ => false,
        }
    }

    fn on_timer(&mut self, ctx: &mut GameContext, timer: &FiredTimer) {
        if let Some(dialogue) = self.dialogue.as_mut() {
            if !dialogue.on_timer(ctx, &timer.event) {
                debug!("Location ignores {:?}", timer.event);
            }
        }
    }

    fn on_refresh(&mut self, ctx: &mut GameContext) {
        for exit in &self.exits {
            let text = ctx.text(&exit.label).to_string();
            ctx.presenter.set_text(exit.handle, &text);
        }
        if let Some(dialogue) = self.dialogue.as_mut() {
            dialogue.refresh(ctx);
        }
    }

    fn update(&mut self, _ctx: &mut GameContext) {}
}

//=========================================================================
// Unit Tests
//=========================================================================
