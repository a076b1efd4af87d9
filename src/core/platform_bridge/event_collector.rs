//=========================================================================
// Event Collector
//=========================================================================
//
// Presentation event collector with bounded polling and shutdown detection.
//
// Architecture:
//   Receiver<PlatformEvent> → collect_frame() → frame events → TickControl
//
// Bounded polling prevents starvation. Continuous drag movement is
// coalesced so a frame carries at most one position per dragged visual.
//
//=========================================================================

//=== External Dependencies ===============================================

use crossbeam_channel::{Receiver, TryRecvError};
use log::warn;

//=== Internal Dependencies ===============================================

use super::PlatformEvent;
use crate::core::input::InputEvent;

//=== TickControl =========================================================

/// Update loop control signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickControl {
    Continue,
    Exit,
}

//=== EventCollector ======================================================

/// Collects presentation events with bounded polling.
pub(crate) struct EventCollector {
    receiver: Receiver<PlatformEvent>,
    frame_events: Vec<InputEvent>,
    resized: Option<(u32, u32)>,
}

impl EventCollector {
    pub(crate) fn new(receiver: Receiver<PlatformEvent>) -> Self {
        Self {
            receiver,
            frame_events: Vec::with_capacity(16),
            resized: None,
        }
    }

    /// Collects pending events (bounded to prevent starvation).
    pub(crate) fn collect_frame(&mut self) -> TickControl {
        const MAX_EVENTS_PER_FRAME: usize = 100;

        self.frame_events.clear();
        self.resized = None;
        let mut drained = 0;

        while drained < MAX_EVENTS_PER_FRAME {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.handle_event(event) == TickControl::Exit {
                        return TickControl::Exit;
                    }
                    drained += 1;
                }
                Err(TryRecvError::Disconnected) => return TickControl::Exit,
                Err(TryRecvError::Empty) => break,
            }
        }

        if drained >= MAX_EVENTS_PER_FRAME {
            warn!("Event queue backlog: drained {} events this frame", drained);
        }

        TickControl::Continue
    }

    /// Events collected for this frame, in delivery order.
    #[cfg(test)]
    pub(crate) fn events(&self) -> &[InputEvent] {
        &self.frame_events
    }

    /// Takes the collected events, leaving an empty buffer.
    pub(crate) fn take_events(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.frame_events)
    }

    /// Latest viewport size reported this frame.
    pub(crate) fn resized(&self) -> Option<(u32, u32)> {
        self.resized
    }

    fn handle_event(&mut self, event: PlatformEvent) -> TickControl {
        match event {
            PlatformEvent::Inputs {
                discrete,
                continuous,
            } => {
                self.frame_events.extend(discrete);
                for event in continuous {
                    self.push_continuous(event);
                }
                TickControl::Continue
            }
            PlatformEvent::Resized { width, height } => {
                self.resized = Some((width, height));
                TickControl::Continue
            }
            PlatformEvent::Shutdown => TickControl::Exit,
        }
    }

    fn push_continuous(&mut self, event: InputEvent) {
        if let Some(existing) = self
            .frame_events
            .iter_mut()
            .find(|e| e.coalesces_with(&event))
        {
            *existing = event;
        } else {
            self.frame_events.push(event);
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::input::DragPhase;
    use crate::presentation::{Point, VisualHandle};
    use crossbeam_channel::unbounded;

    #[test]
    fn collect_handles_empty_queue() {
        let (_tx, rx) = unbounded::<PlatformEvent>();
        let mut collector = EventCollector::new(rx);

        let result = collector.collect_frame();

        assert_eq!(result, TickControl::Continue);
        assert!(collector.events().is_empty());
    }

    #[test]
    fn collect_keeps_discrete_order() {
        let (tx, rx) = unbounded();
        let mut collector = EventCollector::new(rx);

        tx.send(PlatformEvent::single(InputEvent::tap(VisualHandle(1))))
            .unwrap();
        tx.send(PlatformEvent::single(InputEvent::tap(VisualHandle(2))))
            .unwrap();

        collector.collect_frame();

        assert_eq!(
            collector.events(),
            &[
                InputEvent::tap(VisualHandle(1)),
                InputEvent::tap(VisualHandle(2))
            ]
        );
    }

    #[test]
    fn collect_coalesces_drag_movement() {
        let (tx, rx) = unbounded();
        let mut collector = EventCollector::new(rx);

        tx.send(PlatformEvent::single(InputEvent::drag(
            VisualHandle(3),
            DragPhase::Move,
            0.1,
            0.1,
        )))
        .unwrap();
        tx.send(PlatformEvent::single(InputEvent::drag(
            VisualHandle(3),
            DragPhase::Move,
            0.4,
            0.5,
        )))
        .unwrap();

        collector.collect_frame();

        assert_eq!(collector.events().len(), 1);
        match &collector.events()[0] {
            InputEvent::Drag { position, .. } => assert_eq!(*position, Point::new(0.4, 0.5)),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn collect_records_latest_resize() {
        let (tx, rx) = unbounded();
        let mut collector = EventCollector::new(rx);

        tx.send(PlatformEvent::Resized {
            width: 800,
            height: 600,
        })
        .unwrap();
        tx.send(PlatformEvent::Resized {
            width: 1024,
            height: 768,
        })
        .unwrap();

        collector.collect_frame();
        assert_eq!(collector.resized(), Some((1024, 768)));

        collector.collect_frame();
        assert_eq!(collector.resized(), None);
    }

    #[test]
    fn collect_returns_exit_on_shutdown() {
        let (tx, rx) = unbounded();
        let mut collector = EventCollector::new(rx);

        tx.send(PlatformEvent::Shutdown).unwrap();

        assert_eq!(collector.collect_frame(), TickControl::Exit);
    }

    #[test]
    fn collect_returns_exit_on_disconnect() {
        let (tx, rx) = unbounded::<PlatformEvent>();
        let mut collector = EventCollector::new(rx);

        drop(tx);

        assert_eq!(collector.collect_frame(), TickControl::Exit);
    }

    #[test]
    fn take_events_empties_buffer() {
        let (tx, rx) = unbounded();
        let mut collector = EventCollector::new(rx);

        tx.send(PlatformEvent::single(InputEvent::tap(VisualHandle(1))))
            .unwrap();
        collector.collect_frame();

        assert_eq!(collector.take_events().len(), 1);
        assert!(collector.events().is_empty());
    }
}
