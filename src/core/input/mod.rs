//=========================================================================
// Input
//
// Pointer/drag notifications coming back from the presentation layer.
//
// The core never polls devices. The presenter reports interactions on
// visuals that were registered with `Presenter::listen`, batched per
// frame through the platform bridge.
//
//=========================================================================

//=== Submodules ==========================================================
pub mod event;

//=== Public API ==========================================================
pub use event::{DragPhase, InputEvent, PointerKind};
