//=========================================================================
// Platform Bridge Interface
//=========================================================================
//
// Presentation-to-core interface types.
//
// Defines the contract for communication between the presentation layer
// (sprites, pointer dispatch) and the core tick loop.
//
//=========================================================================

//=== Internal Dependencies ===============================================

use crate::core::input::InputEvent;

//=== PlatformEvent =======================================================

/// Events sent from the presentation layer to the core.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformEvent {
    /// Batched input events for a frame.
    ///
    /// - `discrete`: taps, drag start/end, animation completions (order significant)
    /// - `continuous`: drag movement (coalesced per visual)
    Inputs {
        discrete: Vec<InputEvent>,
        continuous: Vec<InputEvent>,
    },

    /// Viewport changed size (text resolution refresh is the
    /// presentation layer's job; the core only relays it).
    Resized { width: u32, height: u32 },

    /// The host is shutting down.
    Shutdown,
}

impl PlatformEvent {
    /// Wraps a single event into a batch, sorted into the right lane.
    pub fn single(event: InputEvent) -> Self {
        if event.is_continuous() {
            PlatformEvent::Inputs {
                discrete: Vec::new(),
                continuous: vec![event],
            }
        } else {
            PlatformEvent::Inputs {
                discrete: vec![event],
                continuous: Vec::new(),
            }
        }
    }
}
