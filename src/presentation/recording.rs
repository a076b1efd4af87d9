//=========================================================================
// Recording Presenter
//=========================================================================
//
// Headless presenter that keeps a log of every call and the live state
// of every visual. Clones share the same state, so a caller can keep a
// copy for inspection after handing one to the game.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;

//=== Internal Dependencies ===============================================

use super::{
    AnimatedProperty, AnimationId, Interaction, Point, Presenter, VisualHandle, VisualKind,
    VisualProps,
};

//=== PresenterCall =======================================================

/// One recorded presenter call.
#[derive(Debug, Clone, PartialEq)]
pub enum PresenterCall {
    Create(VisualHandle, VisualKind, Point),
    Destroy(VisualHandle),
    Animate(VisualHandle, AnimatedProperty, u64),
    Listen(VisualHandle, Interaction, bool),
    SetText(VisualHandle, String),
    PresentUnit(String, bool, i32),
}

//=== Internal State ======================================================

#[derive(Debug, Clone)]
struct LiveVisual {
    kind: VisualKind,
    position: Point,
    props: VisualProps,
    text: Option<String>,
}

#[derive(Debug, Default)]
struct State {
    next_handle: u64,
    next_animation: u64,
    live: BTreeMap<VisualHandle, LiveVisual>,
    listening: HashSet<(VisualHandle, Interaction)>,
    units: HashMap<String, (bool, i32)>,
    calls: Vec<PresenterCall>,
}

//=== RecordingPresenter ==================================================

/// Presenter that records instead of rendering.
#[derive(Debug, Clone, Default)]
pub struct RecordingPresenter {
    state: Rc<RefCell<State>>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    //--- Queries ----------------------------------------------------------

    /// Every call in order.
    pub fn calls(&self) -> Vec<PresenterCall> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn live_count(&self) -> usize {
        self.state.borrow().live.len()
    }

    pub fn is_live(&self, handle: VisualHandle) -> bool {
        self.state.borrow().live.contains_key(&handle)
    }

    /// Current text of a text-bearing visual.
    pub fn text_of(&self, handle: VisualHandle) -> Option<String> {
        self.state
            .borrow()
            .live
            .get(&handle)
            .and_then(|v| v.text.clone())
    }

    /// First live visual whose text contains `needle`.
    pub fn find_text(&self, needle: &str) -> Option<VisualHandle> {
        self.state
            .borrow()
            .live
            .iter()
            .find(|(_, v)| v.text.as_deref().is_some_and(|t| t.contains(needle)))
            .map(|(h, _)| *h)
    }

    /// First live sprite showing `image`.
    pub fn find_image(&self, image: &str) -> Option<VisualHandle> {
        self.state
            .borrow()
            .live
            .iter()
            .find(|(_, v)| {
                matches!(&v.kind, VisualKind::Sprite { image: Some(i) } if i == image)
            })
            .map(|(h, _)| *h)
    }

    pub fn position_of(&self, handle: VisualHandle) -> Option<Point> {
        self.state.borrow().live.get(&handle).map(|v| v.position)
    }

    pub fn depth_of(&self, handle: VisualHandle) -> Option<i32> {
        self.state.borrow().live.get(&handle).map(|v| v.props.depth)
    }

    pub fn is_listening(&self, handle: VisualHandle, interaction: Interaction) -> bool {
        self.state.borrow().listening.contains(&(handle, interaction))
    }

    /// Last `(visible, depth)` reported for a unit.
    pub fn unit_state(&self, unit: &str) -> Option<(bool, i32)> {
        self.state.borrow().units.get(unit).copied()
    }
}

//=== Presenter Implementation ============================================

impl Presenter for RecordingPresenter {
    fn create_visual(
        &mut self,
        kind: VisualKind,
        position: Point,
        props: VisualProps,
    ) -> VisualHandle {
        let mut state = self.state.borrow_mut();
        state.next_handle += 1;
        let handle = VisualHandle(state.next_handle);

        let text = match &kind {
            VisualKind::Text { text } | VisualKind::Overlay { text } => Some(text.clone()),
            VisualKind::Button { label } => Some(label.clone()),
            VisualKind::Sprite { .. } => None,
        };

        state
            .calls
            .push(PresenterCall::Create(handle, kind.clone(), position));
        state.live.insert(
            handle,
            LiveVisual {
                kind,
                position,
                props,
                text,
            },
        );
        handle
    }

    fn destroy_visual(&mut self, handle: VisualHandle) {
        let mut state = self.state.borrow_mut();
        state.calls.push(PresenterCall::Destroy(handle));
        state.live.remove(&handle);
        state.listening.retain(|(h, _)| *h != handle);
    }

    fn animate_property(
        &mut self,
        handle: VisualHandle,
        property: AnimatedProperty,
        duration_ms: u64,
    ) -> AnimationId {
        let mut state = self.state.borrow_mut();
        state
            .calls
            .push(PresenterCall::Animate(handle, property, duration_ms));

        // Recorded tweens land instantly.
        if let Some(visual) = state.live.get_mut(&handle) {
            match property {
                AnimatedProperty::Position(p) => visual.position = p,
                AnimatedProperty::Alpha(a) => visual.props.alpha = a,
                AnimatedProperty::Size(s) => visual.props.size_percent = s,
                AnimatedProperty::Depth(d) => visual.props.depth = d,
            }
        }

        state.next_animation += 1;
        AnimationId(state.next_animation)
    }

    fn listen(&mut self, handle: VisualHandle, interaction: Interaction, enabled: bool) {
        let mut state = self.state.borrow_mut();
        state
            .calls
            .push(PresenterCall::Listen(handle, interaction, enabled));
        if enabled {
            state.listening.insert((handle, interaction));
        } else {
            state.listening.remove(&(handle, interaction));
        }
    }

    fn set_text(&mut self, handle: VisualHandle, text: &str) {
        let mut state = self.state.borrow_mut();
        state
            .calls
            .push(PresenterCall::SetText(handle, text.to_string()));
        if let Some(visual) = state.live.get_mut(&handle) {
            visual.text = Some(text.to_string());
        }
    }

    fn present_unit(&mut self, unit: &str, visible: bool, depth: i32) {
        let mut state = self.state.borrow_mut();
        state
            .calls
            .push(PresenterCall::PresentUnit(unit.to_string(), visible, depth));
        state.units.insert(unit.to_string(), (visible, depth));
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let presenter = RecordingPresenter::new();
        let mut handle_side = presenter.clone();

        let h = handle_side.create_visual(
            VisualKind::Text {
                text: "hello".into(),
            },
            Point::new(0.5, 0.5),
            VisualProps::default(),
        );

        assert!(presenter.is_live(h));
        assert_eq!(presenter.text_of(h).as_deref(), Some("hello"));
        assert_eq!(presenter.find_text("ell"), Some(h));
    }

    #[test]
    fn destroy_drops_visual_and_listeners() {
        let mut presenter = RecordingPresenter::new();
        let h = presenter.create_visual(
            VisualKind::Sprite { image: None },
            Point::default(),
            VisualProps::default(),
        );
        presenter.listen(h, Interaction::Drag, true);
        assert!(presenter.is_listening(h, Interaction::Drag));

        presenter.destroy_visual(h);
        assert!(!presenter.is_live(h));
        assert!(!presenter.is_listening(h, Interaction::Drag));
        assert_eq!(presenter.live_count(), 0);
    }

    #[test]
    fn position_tween_lands_immediately() {
        let mut presenter = RecordingPresenter::new();
        let h = presenter.create_visual(
            VisualKind::Sprite { image: None },
            Point::new(0.1, 0.1),
            VisualProps::default(),
        );
        presenter.animate_property(h, AnimatedProperty::Position(Point::new(0.9, 0.9)), 300);
        assert_eq!(presenter.position_of(h), Some(Point::new(0.9, 0.9)));
    }
}
