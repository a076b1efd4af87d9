//=========================================================================
// Input Event Types
//
// Normalized pointer and drag notifications sent by the presentation
// layer for visuals the core asked to listen to.
//
// Responsibilities:
// - Represent taps, drags and animation completions in a portable way
// - Provide event categorization (discrete vs continuous)
// - Allow coalescing of continuous drag movement within one frame
//
//=========================================================================

use crate::presentation::{AnimationId, Point, VisualHandle};

//=== PointerKind =========================================================
// Discrete pointer interaction on a visual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerKind {
    Down,
    Up,
    /// Down and up on the same visual.
    Tap,
}

//=== DragPhase ===========================================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DragPhase {
    Start,
    Move,
    End,
}

//=== InputEvent ==========================================================
// A concrete input event as normalized by the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Pointer {
        handle: VisualHandle,
        kind: PointerKind,
    },

    /// Tap that hit no listening visual (closes popups).
    PointerOutside { position: Point },

    Drag {
        handle: VisualHandle,
        phase: DragPhase,
        position: Point,
    },

    AnimationFinished(AnimationId),
}

impl InputEvent {
    /// Continuous events may be coalesced; discrete ones keep their order.
    pub fn is_continuous(&self) -> bool {
        matches!(
            self,
            InputEvent::Drag {
                phase: DragPhase::Move,
                ..
            }
        )
    }

    /// Whether `later` supersedes `self` when both arrive in one frame.
    ///
    /// Only drag movement of the same visual coalesces; the newest
    /// position wins.
    pub fn coalesces_with(&self, later: &InputEvent) -> bool {
        match (self, later) {
            (
                InputEvent::Drag {
                    handle: a,
                    phase: DragPhase::Move,
                    ..
                },
                InputEvent::Drag {
                    handle: b,
                    phase: DragPhase::Move,
                    ..
                },
            ) => a == b,
            _ => false,
        }
    }

    /// Visual the event targets, if any.
    pub fn handle(&self) -> Option<VisualHandle> {
        match self {
            InputEvent::Pointer { handle, .. } | InputEvent::Drag { handle, .. } => Some(*handle),
            _ => None,
        }
    }

    /// Convenience constructor for a tap.
    pub fn tap(handle: VisualHandle) -> Self {
        InputEvent::Pointer {
            handle,
            kind: PointerKind::Tap,
        }
    }

    /// Convenience constructor for a drag notification.
    pub fn drag(handle: VisualHandle, phase: DragPhase, x: f32, y: f32) -> Self {
        InputEvent::Drag {
            handle,
            phase,
            position: Point::new(x, y),
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
