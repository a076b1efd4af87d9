//=========================================================================
// Presentation Boundary
//=========================================================================
//
// The only surface through which the core talks to the rendering layer.
//
// Architecture:
// ```text
//   Core (director, sequencer, sessions)
//     │  create_visual / destroy_visual / animate_property / listen
//     ▼
//   dyn Presenter  ──(sprites, tweens, masks: not our concern)
//     │
//     └─ pointer/drag notifications ──► PlatformEvent channel ──► Core
// ```
//
// Positions are normalized (0..1 on both axes). The presenter maps them
// to pixels; the core never sees pixel or graphics APIs.
//
//=========================================================================

//=== Module Declarations =================================================

mod recording;

//=== External Dependencies ===============================================

use serde::{Deserialize, Serialize};

//=== Public API ==========================================================

pub use recording::{PresenterCall, RecordingPresenter};

//=== Geometry ============================================================

/// A point in normalized screen space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in normalized screen space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Point,
    pub max: Point,
}

impl Rect {
    /// Square box centred on `center` whose side is `size_percent` of the
    /// screen width.
    pub fn centered(center: Point, size_percent: f32) -> Self {
        let half = size_percent / 200.0;
        Self {
            min: Point::new(center.x - half, center.y - half),
            max: Point::new(center.x + half, center.y + half),
        }
    }

    /// Bounding-box intersection. Touching edges do not count.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }
}

//=== Visuals =============================================================

/// Opaque handle to a visual owned by the presenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisualHandle(pub u64);

/// What kind of visual to create.
#[derive(Debug, Clone, PartialEq)]
pub enum VisualKind {
    /// Image-backed sprite (interactive objects, slices, icons).
    Sprite { image: Option<String> },
    /// Text block (instructions, dialogue lines, feedback).
    Text { text: String },
    /// Tappable button.
    Button { label: String },
    /// Dismissible overlay panel (hints, notifications).
    Overlay { text: String },
}

/// Creation-time properties.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualProps {
    pub size_percent: f32,
    pub depth: i32,
    pub alpha: f32,
}

impl Default for VisualProps {
    fn default() -> Self {
        Self {
            size_percent: 10.0,
            depth: 0,
            alpha: 1.0,
        }
    }
}

/// Property a tween can animate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimatedProperty {
    Position(Point),
    Alpha(f32),
    Size(f32),
    Depth(i32),
}

/// Identifier of a running animation; its completion arrives as
/// [`crate::core::input::InputEvent::AnimationFinished`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnimationId(pub u64);

/// Input a visual should report back to the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interaction {
    Tap,
    Drag,
}

//=== Presenter Trait =====================================================

/// Capability interface implemented by the rendering layer.
///
/// Pointer and drag notifications for visuals registered with
/// [`Presenter::listen`] come back through the platform event channel.
pub trait Presenter {
    fn create_visual(&mut self, kind: VisualKind, position: Point, props: VisualProps)
        -> VisualHandle;

    fn destroy_visual(&mut self, handle: VisualHandle);

    /// Starts a tween and returns its id.
    fn animate_property(
        &mut self,
        handle: VisualHandle,
        property: AnimatedProperty,
        duration_ms: u64,
    ) -> AnimationId;

    /// Enables (or disables) reporting of an interaction on a visual.
    fn listen(&mut self, handle: VisualHandle, interaction: Interaction, enabled: bool);

    /// Replaces the text of a text-bearing visual.
    fn set_text(&mut self, handle: VisualHandle, text: &str);

    /// Shows, hides or re-layers a whole presentation unit.
    fn present_unit(&mut self, _unit: &str, _visible: bool, _depth: i32) {}
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_boxes_intersect() {
        let a = Rect::centered(Point::new(0.5, 0.5), 10.0);
        let b = Rect::centered(Point::new(0.55, 0.52), 10.0);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn distant_boxes_do_not_intersect() {
        let a = Rect::centered(Point::new(0.1, 0.1), 10.0);
        let b = Rect::centered(Point::new(0.8, 0.8), 10.0);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn touching_edges_do_not_intersect() {
        let a = Rect::centered(Point::new(0.25, 0.5), 50.0);
        let b = Rect::centered(Point::new(0.75, 0.5), 50.0);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn contains_checks_bounds() {
        let r = Rect::centered(Point::new(0.5, 0.5), 20.0);
        assert!(r.contains(Point::new(0.59, 0.41)));
        assert!(!r.contains(Point::new(0.65, 0.5)));
    }
}
