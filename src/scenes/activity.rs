//=========================================================================
// Activity Scene
//=========================================================================
//
// Primary unit hosting one ActivitySession per entry. The entry
// reference names the activity. A session that cannot start (unknown
// activity, missing resources) fails the entry, so the director stays
// where it was.
//
//=========================================================================

//=== External Dependencies ===============================================

use log::debug;

//=== Internal Dependencies ===============================================

use crate::activity::ActivitySession;
use crate::core::error::{GameError, GameResult};
use crate::core::globals::GameContext;
use crate::core::input::InputEvent;
use crate::core::scene::{Scene, SceneEntry};
use crate::core::scheduler::{FiredTimer, TimerScope};

//=== ActivityScene =======================================================

#[derive(Debug, Default)]
pub struct ActivityScene {
    session: Option<ActivitySession>,
    /// Sessions started so far; part of each session's timer scope.
    started: u64,
}

impl ActivityScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> Option<&ActivitySession> {
        self.session.as_ref()
    }
}

/// Session scope nested in the entry's scene scope.
pub(crate) fn session_scope(entry: &SceneEntry, session: u64) -> GameResult<TimerScope> {
    match entry.scope {
        TimerScope::Scene(scene) => Ok(TimerScope::Session { scene, session }),
        ref other => Err(GameError::precondition(format!(
            "{} entered outside a scene scope ({:?})",
            entry.key, other
        ))),
    }
}

fn activity_of(entry: &SceneEntry) -> GameResult<&str> {
    entry
        .reference
        .as_deref()
        .ok_or_else(|| GameError::precondition("activity scene needs an activity id"))
}

impl Scene for ActivityScene {
    fn can_enter(&self, ctx: &GameContext, entry: &SceneEntry) -> GameResult<()> {
        session_scope(entry, self.started + 1)?;
        ActivitySession::check_start(ctx, activity_of(entry)?)
    }

    fn on_enter(&mut self, ctx: &mut GameContext, entry: &SceneEntry) -> GameResult<()> {
        let activity = activity_of(entry)?;
        self.started += 1;
        let scope = session_scope(entry, self.started)?;
        self.session = Some(ActivitySession::start(ctx, activity, scope, entry.depth)?);
        Ok(())
    }

    fn on_exit(&mut self, ctx: &mut GameContext) {
        if let Some(mut session) = self.session.take() {
            session.abandon(ctx);
        }
    }

    fn on_input(&mut self, ctx: &mut GameContext, event: &InputEvent) -> bool {
        self.session
            .as_mut()
            .is_some_and(|session| session.on_input(ctx, event))
    }

    fn on_timer(&mut self, ctx: &mut GameContext, timer: &FiredTimer) {
        match self.session.as_mut() {
            Some(session) if session.scope() == &timer.scope => session.on_timer(ctx, &timer.event),
            _ => debug!("Activity scene drops {:?}", timer),
        }
    }

    fn on_refresh(&mut self, ctx: &mut GameContext) {
        if let Some(session) = self.session.as_mut() {
            session.refresh(ctx);
        }
    }

    fn update(&mut self, _ctx: &mut GameContext) {}
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::SessionPhase;
    use crate::core::scene::SceneDirector;
    use crate::scenes::register_builtin_units;
    use crate::testing;

    fn entry(reference: Option<&str>) -> SceneEntry {
        SceneEntry {
            key: "Activity".to_string(),
            reference: reference.map(str::to_string),
            scope: TimerScope::Scene(3),
            depth: 0,
        }
    }

    #[test]
    fn session_scope_nests_in_scene_entry() {
        let mut ctx = testing::context();
        testing::stock(&mut ctx, &[("r1", 5)]);
        let mut scene = ActivityScene::new();
        scene.on_enter(&mut ctx, &entry(Some("weaving"))).unwrap();

        let session = scene.session().unwrap();
        assert_eq!(
            session.scope(),
            &TimerScope::Session {
                scene: 3,
                session: 1
            }
        );
        assert_eq!(ctx.progress.quantity("r1"), 2);
    }

    #[test]
    fn missing_resources_fail_the_entry() {
        let mut ctx = testing::context();
        let mut scene = ActivityScene::new();
        let err = scene.on_enter(&mut ctx, &entry(Some("weaving"))).unwrap_err();
        assert!(matches!(err, GameError::InsufficientResources { .. }));
        assert!(scene.session().is_none());
    }

    #[test]
    fn entry_without_reference_is_rejected() {
        let mut ctx = testing::context();
        let mut scene = ActivityScene::new();
        assert!(scene.on_enter(&mut ctx, &entry(None)).is_err());
    }

    #[test]
    fn timers_reach_only_the_current_session() {
        let mut ctx = testing::context();
        testing::stock(&mut ctx, &[("r1", 5)]);
        let mut scene = ActivityScene::new();
        scene.on_enter(&mut ctx, &entry(Some("weaving"))).unwrap();

        let stale = FiredTimer {
            id: crate::core::scheduler::TimerId(999),
            scope: TimerScope::Session {
                scene: 3,
                session: 7,
            },
            event: crate::core::scheduler::TimerEvent::TitleDone,
        };
        scene.on_timer(&mut ctx, &stale);
        assert_eq!(scene.session().unwrap().phase(), SessionPhase::ShowingTitle);

        testing::run_timers(&mut ctx, 2600, |ctx, fired| scene.on_timer(ctx, fired));
        assert_eq!(scene.session().unwrap().phase(), SessionPhase::AwaitingInteraction);
    }

    #[test]
    fn refused_change_keeps_the_running_session() {
        let mut ctx = testing::context();
        let mut director = SceneDirector::new();
        register_builtin_units(&mut director, &ctx.data);
        testing::stock(&mut ctx, &[("r1", 6)]);
        director.start(&mut ctx, "Village", None).unwrap();
        director
            .change_scene(&mut ctx, "Activity", Some("weaving"))
            .unwrap();
        assert_eq!(ctx.progress.quantity("r1"), 3);
        let generation = director.generation();

        let err = director
            .change_scene(&mut ctx, "Activity", Some("carving"))
            .unwrap_err();
        assert!(matches!(err, GameError::InsufficientResources { .. }));

        // Deducted once; the weaving session was never re-entered.
        assert_eq!(ctx.progress.quantity("r1"), 3);
        assert_eq!(director.generation(), generation);
        let current = director.current().unwrap();
        assert_eq!(current.scene_key, "Activity");
        assert_eq!(current.reference.as_deref(), Some("weaving"));
        assert_eq!(director.history().len(), 1);
        let session = TimerScope::Session {
            scene: generation,
            session: 1,
        };
        assert_eq!(ctx.scheduler.pending_in(&session), 1);
    }

    #[test]
    fn can_enter_reports_without_deducting() {
        let mut ctx = testing::context();
        let scene = ActivityScene::new();
        assert!(scene.can_enter(&ctx, &entry(Some("weaving"))).is_err());

        testing::stock(&mut ctx, &[("r1", 3)]);
        scene.can_enter(&ctx, &entry(Some("weaving"))).unwrap();
        assert_eq!(ctx.progress.quantity("r1"), 3);
        assert!(scene.can_enter(&ctx, &entry(None)).is_err());
    }

    #[test]
    fn leaving_abandons_the_session() {
        let (mut ctx, presenter) = testing::context_with_presenter();
        testing::stock(&mut ctx, &[("r1", 5)]);
        let mut scene = ActivityScene::new();
        scene.on_enter(&mut ctx, &entry(Some("weaving"))).unwrap();
        scene.on_exit(&mut ctx);
        assert!(scene.session().is_none());
        assert_eq!(presenter.live_count(), 0);
    }
}
