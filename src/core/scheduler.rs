//=========================================================================
// Scheduler
//=========================================================================
//
// Cooperative timer wheel driven by the tick loop.
//
// Architecture:
//   schedule(scope, delay, event) → pending timers (due_at, seq)
//   advance(elapsed)              → fired timers, oldest first
//   cancel_*(scope)               → drop timers tied to torn-down state
//
// Every timer belongs to a scope. Tearing down a scene or an activity
// session cancels its scope, so no callback can fire against state that
// no longer exists. Paused scopes keep their remaining time frozen.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::debug;

//=== TimerScope ==========================================================

/// Ownership group of a timer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TimerScope {
    /// Not tied to any unit.
    Global,
    /// One entry of a primary scene (the generation is bumped per entry).
    Scene(u64),
    /// One activity/minigame session inside a primary scene entry.
    Session { scene: u64, session: u64 },
    /// A companion UI layer or popup.
    Unit(String),
}

impl TimerScope {
    /// Whether this scope lives inside the given primary scene entry.
    pub fn within_scene(&self, generation: u64) -> bool {
        match self {
            TimerScope::Scene(g) => *g == generation,
            TimerScope::Session { scene, .. } => *scene == generation,
            _ => false,
        }
    }
}

//=== TimerEvent ==========================================================

/// What a timer means when it fires; routed to the owner of its scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// Dialogue box appears after the scene has settled.
    DialogueStart,
    /// Dialogue box closes after the final line.
    DialogueClose,
    /// Title card finished fading in and holding; begin fading out.
    TitleFadeOut,
    /// Title card gone; the start step begins.
    TitleDone,
    /// Post-interaction delay elapsed; run the follow-up chain.
    FollowUp,
    /// An awaited function call completed; resume the chain.
    ChainResume,
    /// Hint overlay reached its display time.
    HintExpired { hint: u32 },
    /// Announce one awarded resource.
    RewardShown { index: usize },
    /// End-of-session hold elapsed.
    SessionEnd,
    /// Next spawn in a spawning minigame.
    Spawn,
    /// Notification popup timeout.
    Dismiss,
}

/// Identifier returned by [`Scheduler::schedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// A timer that came due during [`Scheduler::advance`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiredTimer {
    pub id: TimerId,
    pub scope: TimerScope,
    pub event: TimerEvent,
}

//=== Internal Timer ======================================================

#[derive(Debug, Clone)]
struct Timer {
    id: TimerId,
    scope: TimerScope,
    event: TimerEvent,
    due_at: u64,
    /// Remaining time while paused.
    paused: Option<u64>,
}

//=== Scheduler ===========================================================

/// Single-threaded timer queue with scope-based cancellation.
#[derive(Debug, Default)]
pub struct Scheduler {
    now_ms: u64,
    next_id: u64,
    timers: Vec<Timer>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scheduler clock in milliseconds since creation.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    pub fn pending_in(&self, scope: &TimerScope) -> usize {
        self.timers.iter().filter(|t| &t.scope == scope).count()
    }

    //--- Scheduling -------------------------------------------------------

    /// Schedules `event` to fire `delay_ms` from now.
    pub fn schedule(&mut self, scope: TimerScope, delay_ms: u64, event: TimerEvent) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        debug!("Timer {:?} scheduled in {}ms for {:?}: {:?}", id, delay_ms, scope, event);

        self.timers.push(Timer {
            id,
            scope,
            event,
            due_at: self.now_ms + delay_ms,
            paused: None,
        });
        id
    }

    /// Cancels a single timer. Returns whether it was pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        before != self.timers.len()
    }

    /// Cancels every timer in exactly this scope.
    pub fn cancel_scope(&mut self, scope: &TimerScope) -> usize {
        self.cancel_where(|s| s == scope)
    }

    /// Cancels every timer of a primary scene entry, sessions included.
    pub fn cancel_scene(&mut self, generation: u64) -> usize {
        self.cancel_where(|s| s.within_scene(generation))
    }

    fn cancel_where(&mut self, predicate: impl Fn(&TimerScope) -> bool) -> usize {
        let before = self.timers.len();
        self.timers.retain(|t| !predicate(&t.scope));
        let cancelled = before - self.timers.len();
        if cancelled > 0 {
            debug!("Cancelled {} timer(s)", cancelled);
        }
        cancelled
    }

    //--- Pausing ----------------------------------------------------------

    /// Freezes every timer whose scope matches.
    pub fn pause_where(&mut self, predicate: impl Fn(&TimerScope) -> bool) {
        let now = self.now_ms;
        for timer in self.timers.iter_mut().filter(|t| predicate(&t.scope)) {
            if timer.paused.is_none() {
                timer.paused = Some(timer.due_at.saturating_sub(now));
            }
        }
    }

    /// Unfreezes every paused timer whose scope matches.
    pub fn resume_where(&mut self, predicate: impl Fn(&TimerScope) -> bool) {
        let now = self.now_ms;
        for timer in self.timers.iter_mut().filter(|t| predicate(&t.scope)) {
            if let Some(remaining) = timer.paused.take() {
                timer.due_at = now + remaining;
            }
        }
    }

    //--- Advancing --------------------------------------------------------

    /// Moves the clock forward and returns every timer that came due,
    /// ordered by due time, then by scheduling order.
    pub fn advance(&mut self, elapsed_ms: u64) -> Vec<FiredTimer> {
        self.now_ms += elapsed_ms;
        let now = self.now_ms;

        let mut due: Vec<Timer> = Vec::new();
        let mut keep: Vec<Timer> = Vec::with_capacity(self.timers.len());
        for timer in self.timers.drain(..) {
            if timer.paused.is_none() && timer.due_at <= now {
                due.push(timer);
            } else {
                keep.push(timer);
            }
        }
        self.timers = keep;

        due.sort_by_key(|t| (t.due_at, t.id));
        due.into_iter()
            .map(|t| FiredTimer {
                id: t.id,
                scope: t.scope,
                event: t.event,
            })
            .collect()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_fires_once_when_due() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(TimerScope::Scene(1), 2000, TimerEvent::DialogueStart);

        assert!(scheduler.advance(1999).is_empty());
        let fired = scheduler.advance(1);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].event, TimerEvent::DialogueStart);
        assert!(scheduler.advance(5000).is_empty());
    }

    #[test]
    fn fired_order_is_due_time_then_schedule_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(TimerScope::Global, 300, TimerEvent::SessionEnd);
        scheduler.schedule(TimerScope::Global, 100, TimerEvent::RewardShown { index: 0 });
        scheduler.schedule(TimerScope::Global, 100, TimerEvent::RewardShown { index: 1 });

        let events: Vec<_> = scheduler
            .advance(1000)
            .into_iter()
            .map(|f| f.event)
            .collect();
        assert_eq!(
            events,
            vec![
                TimerEvent::RewardShown { index: 0 },
                TimerEvent::RewardShown { index: 1 },
                TimerEvent::SessionEnd,
            ]
        );
    }

    #[test]
    fn cancel_scene_removes_sessions_of_that_scene_only() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(TimerScope::Scene(1), 10, TimerEvent::DialogueStart);
        scheduler.schedule(
            TimerScope::Session {
                scene: 1,
                session: 4,
            },
            10,
            TimerEvent::FollowUp,
        );
        scheduler.schedule(TimerScope::Scene(2), 10, TimerEvent::DialogueStart);
        scheduler.schedule(TimerScope::Unit("inventory".into()), 10, TimerEvent::Dismiss);

        assert_eq!(scheduler.cancel_scene(1), 2);

        let scopes: Vec<_> = scheduler.advance(10).into_iter().map(|f| f.scope).collect();
        assert_eq!(
            scopes,
            vec![TimerScope::Scene(2), TimerScope::Unit("inventory".into())]
        );
    }

    #[test]
    fn cancel_single_timer() {
        let mut scheduler = Scheduler::new();
        let id = scheduler.schedule(TimerScope::Global, 10, TimerEvent::Dismiss);
        assert!(scheduler.cancel(id));
        assert!(!scheduler.cancel(id));
        assert!(scheduler.advance(100).is_empty());
    }

    #[test]
    fn paused_timers_keep_remaining_time() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(TimerScope::Scene(1), 1000, TimerEvent::DialogueClose);

        scheduler.advance(400);
        scheduler.pause_where(|s| s.within_scene(1));
        assert!(scheduler.advance(5000).is_empty());

        scheduler.resume_where(|s| s.within_scene(1));
        assert!(scheduler.advance(599).is_empty());
        assert_eq!(scheduler.advance(1).len(), 1);
    }

    #[test]
    fn pending_in_counts_exact_scope() {
        let mut scheduler = Scheduler::new();
        let scope = TimerScope::Session {
            scene: 3,
            session: 1,
        };
        scheduler.schedule(scope.clone(), 10, TimerEvent::FollowUp);
        scheduler.schedule(TimerScope::Scene(3), 10, TimerEvent::DialogueStart);

        assert_eq!(scheduler.pending_in(&scope), 1);
        assert_eq!(scheduler.cancel_scope(&scope), 1);
        assert_eq!(scheduler.pending(), 1);
    }
}
