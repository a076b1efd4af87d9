//=========================================================================
// Scene System
//=========================================================================
//
// Presentation units and the director that sequences them.
//
// Architecture:
//   SceneDirector
//     ├─ units: HashMap<String, Unit { layer, scene, status }>
//     ├─ current primary + history: Vec<SceneRecord>
//     ├─ companion UI key
//     └─ popups (bottom → top) + popup history
//
// Flow:
//   scene code → ctx.navigation.push(NavigationRequest)
//   tick boundary → SceneDirector::process_requests() (FIFO)
//
//=========================================================================

//=== Internal Dependencies ===============================================

use crate::core::error::GameResult;
use crate::core::globals::GameContext;
use crate::core::input::InputEvent;
use crate::core::scheduler::{FiredTimer, TimerScope};

//=== Module Declarations =================================================

mod director;
mod transition_queue;

//=== Public API ==========================================================

pub use director::{SceneDirector, SceneRecord};
pub use transition_queue::{NavigationRequest, TransitionQueue};

//=== Layers ==============================================================

/// Stacking layer of a presentation unit (primary < companion < popup).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    /// Full-screen location or activity; exactly one runs at a time.
    Primary,
    /// Runs alongside the primary scene (navigation buttons, ...).
    Companion,
    /// Modal, stacked above everything else.
    Popup,
}

/// Lifecycle status of a registered unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitStatus {
    Stopped,
    Running { visible: bool },
    /// Receives no input, updates or timers until resumed.
    Paused { visible: bool },
}

impl UnitStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, UnitStatus::Running { .. })
    }

    pub fn is_visible(&self) -> bool {
        matches!(
            self,
            UnitStatus::Running { visible: true } | UnitStatus::Paused { visible: true }
        )
    }
}

//=== SceneEntry ==========================================================

/// What a unit is told when it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneEntry {
    pub key: String,
    /// Content reference (activity id, minigame id, ...).
    pub reference: Option<String>,
    /// Scope for every timer the unit schedules during this entry.
    pub scope: TimerScope,
    pub depth: i32,
}

//=== Scene Trait =========================================================

/// Behavior of a presentation unit.
///
/// Units are registered once with the [`SceneDirector`] and keep their
/// state between activations. Only `update()` is required; lifecycle
/// hooks default to doing nothing.
pub trait Scene {
    /// Checks, without side effects, whether `on_enter` would accept this
    /// entry. The director asks before it stops the current primary scene.
    fn can_enter(&self, _ctx: &GameContext, _entry: &SceneEntry) -> GameResult<()> {
        Ok(())
    }

    /// Called when the unit starts. An error aborts the start.
    fn on_enter(&mut self, _ctx: &mut GameContext, _entry: &SceneEntry) -> GameResult<()> {
        Ok(())
    }

    /// Called when the unit stops. Must release every visual it owns.
    fn on_exit(&mut self, _ctx: &mut GameContext) {}

    /// Called when a running unit is shown or hidden without stopping.
    fn on_visibility(&mut self, _ctx: &mut GameContext, _visible: bool) {}

    /// Offered presentation input. Returns whether the event was consumed.
    fn on_input(&mut self, _ctx: &mut GameContext, _event: &InputEvent) -> bool {
        false
    }

    /// Called for each timer of this unit's scope that fired.
    fn on_timer(&mut self, _ctx: &mut GameContext, _timer: &FiredTimer) {}

    /// Displayed text must be re-resolved (viewport or language changed).
    fn on_refresh(&mut self, _ctx: &mut GameContext) {}

    /// Called every tick while the unit is running and visible.
    fn update(&mut self, ctx: &mut GameContext);

    /// Whether input a popup does not consume may reach lower layers.
    ///
    /// Popups are modal unless they say otherwise.
    fn is_transparent(&self) -> bool {
        false
    }
}

//=== UnitDescriptor ======================================================

/// Registration record for one presentation unit.
pub struct UnitDescriptor {
    pub layer: Layer,
    pub scene: Box<dyn Scene>,
}

impl UnitDescriptor {
    pub fn primary(scene: impl Scene + 'static) -> Self {
        Self {
            layer: Layer::Primary,
            scene: Box::new(scene),
        }
    }

    pub fn companion(scene: impl Scene + 'static) -> Self {
        Self {
            layer: Layer::Companion,
            scene: Box::new(scene),
        }
    }

    pub fn popup(scene: impl Scene + 'static) -> Self {
        Self {
            layer: Layer::Popup,
            scene: Box::new(scene),
        }
    }
}

impl std::fmt::Debug for UnitDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitDescriptor")
            .field("layer", &self.layer)
            .finish_non_exhaustive()
    }
}
