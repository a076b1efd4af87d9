//=========================================================================
// Game Systems
//=========================================================================
//
// Container for game-level systems with logic.
//
// Contains the systems that route input and timers and sequence
// navigation. Systems operate on GameContext data.
//
//=========================================================================

//=== External Dependencies ===============================================

use crossbeam_channel::Receiver;
use log::debug;

//=== Internal Dependencies ===============================================

use super::GameContext;
use crate::core::input::InputEvent;
use crate::core::scene::{NavigationRequest, SceneDirector};
use crate::events::{UserNotification, ViewportResized};
use crate::progress::ProgressChange;
use crate::scenes::MESSAGE_POPUP;

//=== GameSystems =========================================================

/// Container for game-level logic systems.
///
/// # Available Systems
///
/// - `director`: presentation unit lifecycle and navigation
pub struct GameSystems {
    /// Registers units and applies navigation requests from the context.
    pub director: SceneDirector,
    /// Progress changes that affect what units display.
    changes: Receiver<ProgressChange>,
}

impl GameSystems {
    pub(crate) fn new(context: &mut GameContext) -> Self {
        Self {
            director: SceneDirector::new(),
            changes: context.progress.subscribe(),
        }
    }

    //--- Update Loop ------------------------------------------------------

    /// Runs one tick over the context.
    ///
    /// # Processing Pipeline
    ///
    /// 1. **Input Routing**: popups (top first), companion, primary
    /// 2. **Timers**: advance the scheduler, route fired timers to owners
    /// 3. **Refresh**: re-resolve text after a resize or language change
    /// 4. **Notices**: surface persistence failures to the player
    /// 5. **Navigation**: apply queued requests in FIFO order
    /// 6. **Update**: running, visible units
    pub(crate) fn update(
        &mut self,
        context: &mut GameContext,
        inputs: Vec<InputEvent>,
        resized: Option<(u32, u32)>,
        elapsed_ms: u64,
    ) {
        // 1. Route input
        for event in &inputs {
            if !self.director.route_input(context, event) {
                debug!("Unconsumed input {:?}", event);
            }
        }

        // 2. Timers
        for fired in context.scheduler.advance(elapsed_ms) {
            self.director.route_timer(context, &fired);
        }

        // 3. Viewport and language changes
        let language_changed = self
            .changes
            .try_iter()
            .fold(false, |acc, c| acc || matches!(c, ProgressChange::Language(_)));
        if let Some((width, height)) = resized {
            context.outbox.publish(ViewportResized { width, height });
        }
        if resized.is_some() || language_changed {
            self.director.refresh(context);
        }

        // 4. Persistence failures
        let failures = context.progress.take_failures();
        if !failures.is_empty() {
            for failure in failures {
                context.outbox.publish(UserNotification::error(format!(
                    "Progress could not be saved: {}",
                    failure
                )));
            }
            if self.director.is_registered(MESSAGE_POPUP) {
                context
                    .navigation
                    .push(NavigationRequest::ShowPopup(MESSAGE_POPUP.to_string()));
            }
        }

        // 5. Navigation at the tick boundary
        self.director.process_requests(context);

        // 6. Running units
        self.director.update(context);
    }
}
