//=========================================================================
// Transition Queue
//=========================================================================
//
// Navigation requests raised while a unit is running (input handlers,
// timers, function calls). The director applies them at the tick
// boundary, in the order they were queued, so no unit is torn down while
// one of its own callbacks is still on the stack.
//
//=========================================================================

//=== NavigationRequest ===================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationRequest {
    ChangeScene {
        target: String,
        reference: Option<String>,
    },
    Back,
    ShowPopup(String),
    HidePopup(String),
    CompanionUi(Option<String>),
    Pause(String),
    Resume(String),
}

impl NavigationRequest {
    pub fn change(target: &str, reference: Option<&str>) -> Self {
        Self::ChangeScene {
            target: target.to_string(),
            reference: reference.map(str::to_string),
        }
    }
}

//=== TransitionQueue =====================================================

/// FIFO of pending navigation requests.
#[derive(Debug, Default)]
pub struct TransitionQueue {
    queue: Vec<NavigationRequest>,
}

impl TransitionQueue {
    pub fn new() -> Self {
        Self { queue: Vec::new() }
    }

    /// Queues a request for the next tick boundary.
    pub fn push(&mut self, request: NavigationRequest) {
        self.queue.push(request);
    }

    pub fn iter(&self) -> impl Iterator<Item = &NavigationRequest> {
        self.queue.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn clear(&mut self) {
        self.queue.clear()
    }

    /// Takes every queued request, leaving the queue empty.
    pub fn take(&mut self) -> Vec<NavigationRequest> {
        std::mem::take(&mut self.queue)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_preserves_fifo_order_and_empties() {
        let mut queue = TransitionQueue::new();
        queue.push(NavigationRequest::change("Village", None));
        queue.push(NavigationRequest::Back);
        queue.push(NavigationRequest::ShowPopup("Inventory".into()));
        assert_eq!(queue.len(), 3);

        let taken = queue.take();
        assert!(queue.is_empty());
        assert_eq!(taken[0], NavigationRequest::change("Village", None));
        assert_eq!(taken[1], NavigationRequest::Back);
        assert_eq!(taken[2], NavigationRequest::ShowPopup("Inventory".into()));
    }

    #[test]
    fn change_helper_owns_arguments() {
        assert_eq!(
            NavigationRequest::change("Activity", Some("weaving")),
            NavigationRequest::ChangeScene {
                target: "Activity".into(),
                reference: Some("weaving".into()),
            }
        );
    }
}
