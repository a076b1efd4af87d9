//=========================================================================
// Game Facade
//
// Main entry point and coordinator for the game core.
//
// Architecture:
// ```text
//     GameBuilder  ──build()──>  Game  ──tick()/run()──>  [Tick Loop]
//         │                        │
//         ├─ with_config()         ├─ start(scene)
//         ├─ with_tps()            ├─ input_sender() → presentation layer
//         ├─ with_storage()        └─ context()/systems()
//         └─ with_presenter()
// ```
//
//=========================================================================

//=== External Dependencies ===============================================

use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Sender};
use log::info;

//=== Internal Dependencies ===============================================

use crate::config::GameConfig;
use crate::core::error::GameResult;
use crate::core::globals::{GameContext, GameSystems};
use crate::core::platform_bridge::{EventCollector, PlatformEvent, TickControl};
use crate::data::GameDataStore;
use crate::functions::FunctionRegistry;
use crate::presentation::{Presenter, RecordingPresenter};
use crate::progress::{MemoryStorage, PlayerProgressStore, ProgressStorage};
use crate::scenes;

//=== GameBuilder =========================================================

/// Builder for configuring and constructing a [`Game`].
///
/// # Default Values
///
/// - **Config**: [`GameConfig::default`] (60 TPS, 128-event channel)
/// - **Storage**: in-memory, nothing persisted across runs
/// - **Presenter**: headless [`RecordingPresenter`]
/// - **Functions**: the built-in registry
///
/// # Examples
///
/// ```no_run
/// use sila_valley::{FileStorage, FunctionRegistry, GameBuilder, GameDataStore};
///
/// let functions = FunctionRegistry::with_builtins();
/// let data = GameDataStore::load_dir("content", &functions).unwrap();
///
/// let mut game = GameBuilder::new(data)
///     .with_tps(30.0)
///     .with_storage(FileStorage::new("save", "playerData"))
///     .build()
///     .unwrap();
/// game.start("Village", None).unwrap();
/// game.run();
/// ```
pub struct GameBuilder {
    config: GameConfig,
    data: GameDataStore,
    storage: Box<dyn ProgressStorage>,
    presenter: Box<dyn Presenter>,
    functions: FunctionRegistry,
}

impl GameBuilder {
    /// Creates a builder over validated content.
    pub fn new(data: GameDataStore) -> Self {
        Self {
            config: GameConfig::default(),
            data,
            storage: Box::new(MemoryStorage::new()),
            presenter: Box::new(RecordingPresenter::new()),
            functions: FunctionRegistry::with_builtins(),
        }
    }

    /// Replaces the whole configuration. `build` validates it.
    pub fn with_config(mut self, config: GameConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the target ticks per second for [`Game::run`].
    ///
    /// # Panics
    ///
    /// Panics if `tps <= 0.0`.
    pub fn with_tps(mut self, tps: f64) -> Self {
        assert!(tps > 0.0, "TPS must be positive, got {}", tps);
        self.config.tps = tps;
        self
    }

    /// Sets the capacity of the presentation → core channel.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        assert!(capacity > 0, "Channel capacity must be positive");
        self.config.channel_capacity = capacity;
        self
    }

    /// Sets how many hints each activity session offers.
    pub fn with_hint_budget(mut self, hints: u32) -> Self {
        self.config.hint_budget = hints;
        self
    }

    pub fn with_storage(mut self, storage: impl ProgressStorage + 'static) -> Self {
        self.storage = Box::new(storage);
        self
    }

    pub fn with_presenter(mut self, presenter: impl Presenter + 'static) -> Self {
        self.presenter = Box::new(presenter);
        self
    }

    /// Function registry used at runtime. Must be the registry the content
    /// was validated against.
    pub fn with_functions(mut self, functions: FunctionRegistry) -> Self {
        self.functions = functions;
        self
    }

    /// Loads the player record, reconciles it with the content and
    /// registers the built-in units.
    ///
    /// # Errors
    ///
    /// Fails when the configuration cannot drive the tick loop (see
    /// [`GameConfig::validate`]) or the stored player record cannot be
    /// read.
    pub fn build(self) -> GameResult<Game> {
        self.config.validate()?;
        info!(
            "Building game (TPS: {}, channel: {})",
            self.config.tps, self.config.channel_capacity
        );

        let data = Rc::new(self.data);
        let mut progress =
            PlayerProgressStore::load_or_default(self.storage, &self.config.default_language)?;
        let unlocked = progress.reconcile(&data);
        if !unlocked.is_empty() {
            info!("Unlocked at boot: {:?}", unlocked);
        }

        let (sender, receiver) = bounded(self.config.channel_capacity);
        let tps = self.config.tps;
        let mut context = GameContext::new(
            self.config,
            Rc::clone(&data),
            progress,
            self.presenter,
            Rc::new(self.functions),
        );
        let mut systems = GameSystems::new(&mut context);
        scenes::register_builtin_units(&mut systems.director, &data);

        Ok(Game {
            context,
            systems,
            collector: EventCollector::new(receiver),
            sender: Some(sender),
            tps,
        })
    }
}

//=== Game ================================================================

/// The running game core.
///
/// All logic runs on the thread that owns the `Game`. The presentation
/// layer talks to it through [`Game::input_sender`] and reads the outbox
/// after each tick.
///
/// # Tick
///
/// ```text
/// tick(elapsed)
///   ├─ clear outbox
///   ├─ collect presentation events (bounded, coalesced)
///   └─ GameSystems::update: input → timers → refresh → notices
///                           → navigation → unit updates
/// ```
pub struct Game {
    context: GameContext,
    systems: GameSystems,
    collector: EventCollector,
    /// Handed out to the presentation layer; dropped by `run`.
    sender: Option<Sender<PlatformEvent>>,
    tps: f64,
}

impl Game {
    //--- Initialization ---------------------------------------------------

    /// Gives access to systems and context before the first tick, e.g. to
    /// register extra units.
    pub fn init<F>(mut self, init_fn: F) -> Self
    where
        F: FnOnce(&mut GameSystems, &mut GameContext),
    {
        init_fn(&mut self.systems, &mut self.context);
        self
    }

    /// Enters the first primary scene.
    pub fn start(&mut self, scene: &str, reference: Option<&str>) -> GameResult<()> {
        self.systems
            .director
            .start(&mut self.context, scene, reference)
    }

    //--- Access -----------------------------------------------------------

    /// Channel for presentation events.
    pub fn input_sender(&self) -> Option<Sender<PlatformEvent>> {
        self.sender.clone()
    }

    pub fn context(&self) -> &GameContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut GameContext {
        &mut self.context
    }

    pub fn systems(&self) -> &GameSystems {
        &self.systems
    }

    pub fn systems_mut(&mut self) -> &mut GameSystems {
        &mut self.systems
    }

    //--- Execution --------------------------------------------------------

    /// Runs one cooperative step covering `elapsed_ms` of game time.
    pub fn tick(&mut self, elapsed_ms: u64) -> TickControl {
        self.context.outbox.clear_all();

        if self.collector.collect_frame() == TickControl::Exit {
            return TickControl::Exit;
        }
        let inputs = self.collector.take_events();
        let resized = self.collector.resized();

        self.systems
            .update(&mut self.context, inputs, resized, elapsed_ms);
        TickControl::Continue
    }

    /// Ticks at the configured rate on the calling thread until the
    /// presentation layer shuts down or drops every sender.
    pub fn run(mut self) {
        let frame_duration = Duration::from_secs_f64(1.0 / self.tps);
        info!("Starting tick loop (TPS: {})", self.tps);
        self.sender = None;

        let mut last = Instant::now();
        loop {
            let frame_start = Instant::now();

            let elapsed = frame_start.duration_since(last).as_millis() as u64;
            last += Duration::from_millis(elapsed);

            if self.tick(elapsed) == TickControl::Exit {
                info!("Tick loop exiting");
                break;
            }

            let spent = frame_start.elapsed();
            if spent < frame_duration {
                thread::sleep(frame_duration - spent);
            }
        }

        info!("Game shutdown complete");
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::GameError;
    use crate::core::input::{DragPhase, InputEvent};
    use crate::events::{NavigationEvent, SessionEvent, UserNotification};
    use crate::presentation::VisualHandle;
    use crate::scenes::{INVENTORY_POPUP, MESSAGE_POPUP, NAV_BAR};
    use crate::testing;

    fn game() -> (Game, RecordingPresenter, MemoryStorage) {
        let presenter = RecordingPresenter::new();
        let storage = MemoryStorage::new();
        let game = GameBuilder::new(testing::data_store())
            .with_presenter(presenter.clone())
            .with_storage(storage.clone())
            .build()
            .unwrap();
        (game, presenter, storage)
    }

    fn send(game: &Game, event: InputEvent) {
        game.input_sender()
            .unwrap()
            .send(PlatformEvent::single(event))
            .unwrap();
    }

    /// Ticks in 50ms steps.
    fn advance(game: &mut Game, ms: u64) {
        for _ in 0..ms / 50 {
            game.tick(50);
        }
    }

    fn current(game: &Game) -> String {
        game.systems()
            .director
            .current()
            .map(|r| r.scene_key.clone())
            .unwrap_or_default()
    }

    //--- Builder ----------------------------------------------------------

    #[test]
    fn builder_defaults() {
        let builder = GameBuilder::new(testing::data_store());
        assert_eq!(builder.config.tps, 60.0);
        assert_eq!(builder.config.channel_capacity, 128);
    }

    #[test]
    #[should_panic(expected = "TPS must be positive")]
    fn builder_with_tps_panics_on_zero() {
        GameBuilder::new(testing::data_store()).with_tps(0.0);
    }

    #[test]
    #[should_panic(expected = "Channel capacity must be positive")]
    fn builder_with_channel_capacity_panics_on_zero() {
        GameBuilder::new(testing::data_store()).with_channel_capacity(0);
    }

    #[test]
    fn builder_fluent_api_chaining() {
        let game = GameBuilder::new(testing::data_store())
            .with_tps(120.0)
            .with_channel_capacity(256)
            .with_hint_budget(5)
            .build()
            .unwrap();
        assert_eq!(game.tps, 120.0);
        assert_eq!(game.context().config.channel_capacity, 256);
        assert_eq!(game.context().config.hint_budget, 5);
    }

    #[test]
    fn build_rejects_unrunnable_config() {
        let config = GameConfig {
            tps: 0.0,
            ..GameConfig::default()
        };
        let result = GameBuilder::new(testing::data_store())
            .with_config(config)
            .build();
        assert!(matches!(result, Err(GameError::Configuration(_))));

        let config = GameConfig {
            channel_capacity: 0,
            ..GameConfig::default()
        };
        let result = GameBuilder::new(testing::data_store())
            .with_config(config)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn build_reconciles_boot_unlocks() {
        let (game, _, _) = game();
        assert!(game.context().progress.is_biome_unlocked("river"));
    }

    //--- Ticking ----------------------------------------------------------

    #[test]
    fn start_shows_companion_and_clears_outbox_each_tick() {
        let (mut game, presenter, _) = game();
        game.start("Village", None).unwrap();
        assert_eq!(game.systems().director.companion(), Some(NAV_BAR));
        assert_eq!(presenter.unit_state(NAV_BAR), Some((true, 100)));

        game.tick(16);
        assert!(game.context().outbox.read::<NavigationEvent>().is_empty());
    }

    #[test]
    fn shutdown_event_stops_ticking() {
        let (mut game, _, _) = game();
        game.input_sender()
            .unwrap()
            .send(PlatformEvent::Shutdown)
            .unwrap();
        assert_eq!(game.tick(16), TickControl::Exit);
    }

    #[test]
    fn persistence_failure_surfaces_message_popup() {
        let (mut game, presenter, storage) = game();
        game.start("Village", None).unwrap();

        storage.fail_next_writes(2);
        testing::stock(game.context_mut(), &[("r1", 1)]);
        game.tick(16);

        assert!(game
            .context()
            .outbox
            .read::<UserNotification>()
            .iter()
            .any(|n| n.text.contains("could not be saved")));
        assert_eq!(
            game.systems().director.active_popups(),
            &[MESSAGE_POPUP.to_string()]
        );
        assert!(presenter.find_text("could not be saved").is_some());
        // Memory stays authoritative.
        assert_eq!(game.context().progress.quantity("r1"), 1);
    }

    #[test]
    fn navigation_bar_opens_inventory_popup() {
        let (mut game, presenter, _) = game();
        game.start("Village", None).unwrap();

        let inventory = presenter.find_text("inventory").unwrap();
        send(&game, InputEvent::tap(inventory));
        game.tick(16);
        assert_eq!(
            game.systems().director.active_popups(),
            &[INVENTORY_POPUP.to_string()]
        );

        // The popup is modal: an outside press closes it.
        send(
            &game,
            InputEvent::PointerOutside {
                position: crate::presentation::Point::new(0.1, 0.9),
            },
        );
        game.tick(16);
        assert!(game.systems().director.active_popups().is_empty());
    }

    #[test]
    fn full_activity_round_trip() {
        let (mut game, presenter, storage) = game();
        {
            let ctx = game.context_mut();
            testing::stock(ctx, &[("r1", 5)]);
            let data = Rc::clone(&ctx.data);
            ctx.progress.recompute_unlocks(&data);
        }
        game.start("Village", None).unwrap();

        let river = presenter.find_text("River").unwrap();
        send(&game, InputEvent::tap(river));
        game.tick(16);
        assert_eq!(current(&game), "RiverBiome");

        let weaving = presenter.find_text("Weaving").unwrap();
        send(&game, InputEvent::tap(weaving));
        game.tick(16);
        assert_eq!(current(&game), "Activity");
        assert_eq!(game.context().progress.quantity("r1"), 2);

        advance(&mut game, 3000);
        let wool: VisualHandle = presenter.find_image("wool.png").unwrap();
        send(&game, InputEvent::drag(wool, DragPhase::Start, 0.2, 0.5));
        send(&game, InputEvent::drag(wool, DragPhase::End, 0.8, 0.5));
        game.tick(16);
        assert!(game
            .context()
            .outbox
            .read::<SessionEvent>()
            .iter()
            .any(|e| matches!(e, SessionEvent::Interaction { correct: true, .. })));

        // Follow-up, end step, staggered reward, end hold, back.
        advance(&mut game, 4000);
        assert_eq!(current(&game), "RiverBiome");
        assert_eq!(game.context().progress.quantity("r2"), 2);
        assert!(game.context().progress.is_activity_completed("weaving"));
        assert_eq!(storage.stored().unwrap().inventory.get("r2"), Some(&2));
    }

    #[test]
    fn activity_without_resources_stays_put() {
        let (mut game, presenter, _) = game();
        game.context_mut().progress.unlock_activity("weaving");
        game.start("RiverBiome", None).unwrap();

        let weaving = presenter.find_text("Weaving").unwrap();
        send(&game, InputEvent::tap(weaving));
        game.tick(16);

        assert_eq!(current(&game), "RiverBiome");
        assert_eq!(game.context().progress.quantity("r1"), 0);
        assert!(!game
            .context()
            .outbox
            .read::<SessionEvent>()
            .iter()
            .any(|e| matches!(e, SessionEvent::Started { .. })));
    }
}
