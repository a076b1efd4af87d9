//=========================================================================
// Built-in Scenes
//=========================================================================
//
// Thin presentation units composed from the core services.
//
// Units:
// - LocationScene: hub and biome locations with dialogue and exits
// - ActivityScene: runs one traditional activity (reference = activity id)
// - VocabGameScene: runs one minigame (reference = minigame id)
// - NavigationBar: companion with back, inventory and settings buttons
// - InventoryPopup, SettingsPopup, MessagePopup
//
//=========================================================================

//=== Module Declarations =================================================

mod activity;
mod location;
mod navigation_bar;
mod popups;
mod vocab_game;

//=== Public API ==========================================================

pub use activity::ActivityScene;
pub use location::LocationScene;
pub use navigation_bar::NavigationBar;
pub use popups::{InventoryPopup, MessagePopup, SettingsPopup};
pub use vocab_game::VocabGameScene;

//=== Internal Dependencies ===============================================

use crate::core::globals::GameContext;
use crate::core::input::{InputEvent, PointerKind};
use crate::core::scene::{SceneDirector, UnitDescriptor};
use crate::data::GameDataStore;
use crate::presentation::{Interaction, Point, VisualHandle, VisualKind, VisualProps};

//=== Unit Keys ===========================================================

pub const ACTIVITY_SCENE: &str = "Activity";
pub const VOCAB_GAME_SCENE: &str = "VocabGame";
pub const NAV_BAR: &str = "NavBar";
pub const INVENTORY_POPUP: &str = "Inventory";
pub const SETTINGS_POPUP: &str = "Settings";
pub const MESSAGE_POPUP: &str = "Message";

//=== Registration ========================================================

/// Registers a unit for every scene the content declares, plus the
/// companion bar and the popups.
///
/// A scene's constructor identifier, or else its key, picks the unit
/// type; anything else is a location.
pub fn register_builtin_units(director: &mut SceneDirector, data: &GameDataStore) {
    for meta in data.scenes() {
        let kind = meta.constructor_identifier.as_deref().unwrap_or(meta.key.as_str());
        let descriptor = match kind {
            ACTIVITY_SCENE => UnitDescriptor::primary(ActivityScene::new()),
            VOCAB_GAME_SCENE => UnitDescriptor::primary(VocabGameScene::new()),
            _ => UnitDescriptor::primary(LocationScene::new()),
        };
        director.register(&meta.key, descriptor);
    }
    director.register(NAV_BAR, UnitDescriptor::companion(NavigationBar::new()));
    director.register(INVENTORY_POPUP, UnitDescriptor::popup(InventoryPopup::new()));
    director.register(SETTINGS_POPUP, UnitDescriptor::popup(SettingsPopup::new()));
    director.register(MESSAGE_POPUP, UnitDescriptor::popup(MessagePopup::new()));
}

//=== Helpers =============================================================

/// Creates a tappable button.
fn button(ctx: &mut GameContext, label: &str, position: Point, depth: i32) -> VisualHandle {
    let handle = ctx.presenter.create_visual(
        VisualKind::Button {
            label: label.to_string(),
        },
        position,
        VisualProps {
            size_percent: 8.0,
            depth,
            alpha: 1.0,
        },
    );
    ctx.presenter.listen(handle, Interaction::Tap, true);
    handle
}

/// The visual a tap landed on.
fn tapped(event: &InputEvent) -> Option<VisualHandle> {
    match event {
        InputEvent::Pointer {
            handle,
            kind: PointerKind::Tap,
        } => Some(*handle),
        _ => None,
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
