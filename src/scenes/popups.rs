//=========================================================================
// Popups
//=========================================================================
//
// Modal layers stacked over the primary scene.
//
// - InventoryPopup: resource counts, rebuilt whenever the inventory
//   changes while it is open
// - SettingsPopup: language toggle
// - MessagePopup: warnings and errors meant for the player, each
//   dismissed by a tap or after a timeout
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::VecDeque;
use std::rc::Rc;

use crossbeam_channel::Receiver;
use log::{debug, info};

//=== Internal Dependencies ===============================================

use super::{button, tapped, INVENTORY_POPUP, MESSAGE_POPUP, SETTINGS_POPUP};
use crate::core::error::GameResult;
use crate::core::globals::GameContext;
use crate::core::input::InputEvent;
use crate::core::scene::{NavigationRequest, Scene, SceneEntry};
use crate::core::scheduler::{FiredTimer, TimerEvent, TimerScope};
use crate::events::{NoticeKind, UserNotification};
use crate::presentation::{
    AnimatedProperty, Interaction, Point, VisualHandle, VisualKind, VisualProps,
};
use crate::progress::ProgressChange;

fn panel(ctx: &mut GameContext, depth: i32) -> VisualHandle {
    ctx.presenter.create_visual(
        VisualKind::Sprite {
            image: Some("popup_panel".to_string()),
        },
        Point::new(0.5, 0.5),
        VisualProps {
            size_percent: 70.0,
            depth,
            alpha: 1.0,
        },
    )
}

fn text(ctx: &mut GameContext, text: String, position: Point, depth: i32) -> VisualHandle {
    ctx.presenter.create_visual(
        VisualKind::Text { text },
        position,
        VisualProps {
            size_percent: 6.0,
            depth,
            alpha: 1.0,
        },
    )
}

//=== InventoryPopup ======================================================

#[derive(Debug, Default)]
pub struct InventoryPopup {
    depth: i32,
    chrome: Vec<VisualHandle>,
    close: Option<VisualHandle>,
    rows: Vec<VisualHandle>,
    changes: Option<Receiver<ProgressChange>>,
}

impl InventoryPopup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of resource rows on display.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn rebuild(&mut self, ctx: &mut GameContext) {
        for row in self.rows.drain(..) {
            ctx.presenter.destroy_visual(row);
        }
        let data = Rc::clone(&ctx.data);
        let held: Vec<String> = data
            .resources()
            .filter_map(|r| {
                let quantity = ctx.progress.quantity(&r.id);
                (quantity > 0).then(|| format!("{} × {}", ctx.text(&r.names), quantity))
            })
            .collect();
        for (i, line) in held.into_iter().enumerate() {
            let position = Point::new(0.5, 0.3 + 0.08 * i as f32);
            self.rows.push(text(ctx, line, position, self.depth + 1));
        }
        debug!("Inventory shows {} resource(s)", self.rows.len());
    }
}

impl Scene for InventoryPopup {
    fn on_enter(&mut self, ctx: &mut GameContext, entry: &SceneEntry) -> GameResult<()> {
        self.depth = entry.depth;
        self.changes = Some(ctx.progress.subscribe());
        self.chrome.push(panel(ctx, entry.depth));
        self.close = Some(button(ctx, "close", Point::new(0.8, 0.2), entry.depth + 2));
        self.rebuild(ctx);
        Ok(())
    }

    fn on_exit(&mut self, ctx: &mut GameContext) {
        self.changes = None;
        for handle in self
            .chrome
            .drain(..)
            .chain(self.rows.drain(..))
            .chain(self.close.take())
        {
            ctx.presenter.destroy_visual(handle);
        }
    }

    fn on_visibility(&mut self, ctx: &mut GameContext, visible: bool) {
        if visible {
            self.rebuild(ctx);
        }
    }

    fn on_input(&mut self, ctx: &mut GameContext, event: &InputEvent) -> bool {
        match tapped(event) {
            Some(handle) if Some(handle) == self.close => {
                ctx.navigation
                    .push(NavigationRequest::HidePopup(INVENTORY_POPUP.to_string()));
                true
            }
            _ => false,
        }
    }

    fn on_refresh(&mut self, ctx: &mut GameContext) {
        self.rebuild(ctx);
    }

    fn update(&mut self, ctx: &mut GameContext) {
        let Some(changes) = &self.changes else {
            return;
        };
        let touched = changes
            .try_iter()
            .fold(false, |acc, c| acc || matches!(c, ProgressChange::Inventory(_)));
        if touched {
            self.rebuild(ctx);
        }
    }
}

//=== SettingsPopup =======================================================

#[derive(Debug, Default)]
pub struct SettingsPopup {
    chrome: Vec<VisualHandle>,
    close: Option<VisualHandle>,
    languages: Vec<(VisualHandle, String)>,
}

impl SettingsPopup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Highlights the button of the active language.
    fn mark_current(&self, ctx: &mut GameContext) {
        let current = ctx.language();
        for (handle, language) in &self.languages {
            let alpha = if *language == current { 1.0 } else { 0.5 };
            ctx.presenter
                .animate_property(*handle, AnimatedProperty::Alpha(alpha), 0);
        }
    }
}

impl Scene for SettingsPopup {
    fn on_enter(&mut self, ctx: &mut GameContext, entry: &SceneEntry) -> GameResult<()> {
        self.chrome.push(panel(ctx, entry.depth));
        self.close = Some(button(ctx, "close", Point::new(0.8, 0.2), entry.depth + 2));

        let languages = ctx.config.languages.clone();
        for (i, language) in languages.into_iter().enumerate() {
            let position = Point::new(0.35 + 0.15 * i as f32, 0.5);
            let handle = button(ctx, &language, position, entry.depth + 1);
            self.languages.push((handle, language));
        }
        self.mark_current(ctx);
        Ok(())
    }

    fn on_exit(&mut self, ctx: &mut GameContext) {
        for handle in self
            .chrome
            .drain(..)
            .chain(self.languages.drain(..).map(|(h, _)| h))
            .chain(self.close.take())
        {
            ctx.presenter.destroy_visual(handle);
        }
    }

    fn on_input(&mut self, ctx: &mut GameContext, event: &InputEvent) -> bool {
        let Some(handle) = tapped(event) else {
            return false;
        };
        if Some(handle) == self.close {
            ctx.navigation
                .push(NavigationRequest::HidePopup(SETTINGS_POPUP.to_string()));
            return true;
        }
        let Some(language) = self
            .languages
            .iter()
            .find(|(h, _)| *h == handle)
            .map(|(_, l)| l.clone())
        else {
            return false;
        };
        info!("Language set to {}", language);
        ctx.progress.set_language(&language);
        self.mark_current(ctx);
        true
    }

    fn update(&mut self, _ctx: &mut GameContext) {}
}

//=== MessagePopup ========================================================

#[derive(Debug, Default)]
pub struct MessagePopup {
    scope: Option<TimerScope>,
    depth: i32,
    /// Notices on display, oldest first.
    notices: VecDeque<VisualHandle>,
}

impl MessagePopup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notice_count(&self) -> usize {
        self.notices.len()
    }

    fn show(&mut self, ctx: &mut GameContext, notice: &UserNotification) {
        let position = Point::new(0.5, 0.4 + 0.1 * self.notices.len() as f32);
        let handle = ctx.presenter.create_visual(
            VisualKind::Overlay {
                text: notice.text.clone(),
            },
            position,
            VisualProps {
                size_percent: 60.0,
                depth: self.depth,
                alpha: 1.0,
            },
        );
        ctx.presenter.listen(handle, Interaction::Tap, true);
        self.notices.push_back(handle);
        if let Some(scope) = &self.scope {
            ctx.scheduler
                .schedule(scope.clone(), ctx.config.hint_display_ms, TimerEvent::Dismiss);
        }
    }

    fn dismiss(&mut self, ctx: &mut GameContext, handle: VisualHandle) {
        self.notices.retain(|h| *h != handle);
        ctx.presenter.destroy_visual(handle);
        if self.notices.is_empty() {
            ctx.navigation
                .push(NavigationRequest::HidePopup(MESSAGE_POPUP.to_string()));
        }
    }
}

impl Scene for MessagePopup {
    fn on_enter(&mut self, _ctx: &mut GameContext, entry: &SceneEntry) -> GameResult<()> {
        self.scope = Some(entry.scope.clone());
        self.depth = entry.depth;
        Ok(())
    }

    fn on_exit(&mut self, ctx: &mut GameContext) {
        for handle in self.notices.drain(..) {
            ctx.presenter.destroy_visual(handle);
        }
    }

    fn on_input(&mut self, ctx: &mut GameContext, event: &InputEvent) -> bool {
        match tapped(event) {
            Some(handle) if self.notices.contains(&handle) => {
                self.dismiss(ctx, handle);
                true
            }
            _ => false,
        }
    }

    fn on_timer(&mut self, ctx: &mut GameContext, timer: &FiredTimer) {
        if timer.event != TimerEvent::Dismiss {
            return;
        }
        if let Some(oldest) = self.notices.front().copied() {
            self.dismiss(ctx, oldest);
        }
    }

    fn update(&mut self, ctx: &mut GameContext) {
        let fresh: Vec<UserNotification> = ctx
            .outbox
            .read::<UserNotification>()
            .iter()
            .filter(|n| n.kind != NoticeKind::Feedback)
            .cloned()
            .collect();
        for notice in &fresh {
            self.show(ctx, notice);
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
