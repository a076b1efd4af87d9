//=========================================================================
// Navigation Bar
//=========================================================================
//
// Companion layer with back, inventory and settings buttons.
//
//=========================================================================

use super::{button, tapped, INVENTORY_POPUP, SETTINGS_POPUP};
use crate::core::error::GameResult;
use crate::core::globals::GameContext;
use crate::core::input::InputEvent;
use crate::core::scene::{NavigationRequest, Scene, SceneEntry};
use crate::presentation::{Point, VisualHandle};

#[derive(Debug, Default)]
pub struct NavigationBar {
    buttons: Vec<(VisualHandle, NavigationRequest)>,
}

impl NavigationBar {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scene for NavigationBar {
    fn on_enter(&mut self, ctx: &mut GameContext, entry: &SceneEntry) -> GameResult<()> {
        let layout = [
            ("back", 0.06, NavigationRequest::Back),
            (
                "inventory",
                0.84,
                NavigationRequest::ShowPopup(INVENTORY_POPUP.to_string()),
            ),
            (
                "settings",
                0.94,
                NavigationRequest::ShowPopup(SETTINGS_POPUP.to_string()),
            ),
        ];
        for (label, x, request) in layout {
            let handle = button(ctx, label, Point::new(x, 0.06), entry.depth);
            self.buttons.push((handle, request));
        }
        Ok(())
    }

    fn on_exit(&mut self, ctx: &mut GameContext) {
        for (handle, _) in self.buttons.drain(..) {
            ctx.presenter.destroy_visual(handle);
        }
    }

    fn on_input(&mut self, ctx: &mut GameContext, event: &InputEvent) -> bool {
        let Some(handle) = tapped(event) else {
            return false;
        };
        match self.buttons.iter().find(|(h, _)| *h == handle) {
            Some((_, request)) => {
                ctx.navigation.push(request.clone());
                true
            }
            None => false,
        }
    }

    fn update(&mut self, _ctx: &mut GameContext) {}
}
