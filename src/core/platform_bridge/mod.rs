//=========================================================================
// Platform Bridge
//=========================================================================
//
// Bridges the presentation layer (sprites, pointer dispatch) with the
// core tick loop.
//
// This module defines the contract between presentation backends and
// core logic, so a backend can be swapped without touching the core.
//
// Components:
// - `interface`: Event types (the contract)
// - `event_collector`: Core-side event collection and coalescing
//
//=========================================================================

//=== Module Declarations =================================================

pub(crate) mod event_collector;
pub(crate) mod interface;

//=== Public API ==========================================================

pub(crate) use event_collector::EventCollector;
pub use event_collector::TickControl;
pub use interface::PlatformEvent;
