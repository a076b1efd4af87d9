//=========================================================================
// Test Fixtures
//=========================================================================
//
// Shared content, contexts and probe scenes for unit tests.
//
//=========================================================================

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use chrono::{DateTime, TimeZone, Utc};

use crate::config::GameConfig;
use crate::core::error::{GameError, GameResult};
use crate::core::globals::GameContext;
use crate::core::input::InputEvent;
use crate::core::scene::{Scene, SceneEntry};
use crate::core::scheduler::FiredTimer;
use crate::data::{GameDataStore, ResourceMap};
use crate::functions::FunctionRegistry;
use crate::presentation::RecordingPresenter;
use crate::progress::{MemoryStorage, PlayerProgressStore};

//=== Content =============================================================

pub const CONTENT: &str = r#"{
  "scenes": [
    { "key": "Village", "companionUi": "NavBar" },
    { "key": "RiverBiome", "referenceName": "river", "biomeId": "river", "companionUi": "NavBar" },
    { "key": "Activity" },
    { "key": "VocabGame" }
  ],
  "dialogue": [
    { "sceneKey": "Village", "lines": [
      { "text": { "en": "Welcome to the valley.", "hur": "ʔəstəɬ" } },
      { "speaker": "Elder", "text": { "en": "You found cedar!" },
        "condition": { "type": "hasResource", "resource": "r1", "atLeast": 1 },
        "functions": [ { "function": "giveResource", "args": ["r1"] } ] },
      { "text": { "en": "Come back any time." } }
    ] }
  ],
  "biomes": [
    { "id": "river", "referenceName": "river", "names": { "en": "River" }, "unlocked": true },
    { "id": "forest", "referenceName": "forest", "names": { "en": "Forest" } }
  ],
  "resources": [
    { "id": "r1", "names": { "en": "Cedar" }, "image": "cedar.png" },
    { "id": "r2", "names": { "en": "Wool" }, "image": "wool.png" }
  ],
  "traditionalActivities": [
    {
      "id": "weaving", "biomeId": "river", "names": { "en": "Weaving" },
      "requiredResources": { "r1": 3 }, "awardedResources": { "r2": 2 },
      "instructions": [
        { "id": "step1", "actionType": "drag", "nextStepId": "step2",
          "text": { "en": "Drag the wool to the loom.", "hur": "q̓ʷəl" },
          "hint": { "en": "The loom is on the right." },
          "objects": [
            { "id": "wool", "role": "agent", "position": { "x": 0.2, "y": 0.5 }, "sizePercent": 10.0, "image": "wool.png" },
            { "id": "loom", "role": "target", "position": { "x": 0.8, "y": 0.5 }, "sizePercent": 20.0, "image": "loom.png" },
            { "id": "stone", "role": "decoy", "position": { "x": 0.2, "y": 0.8 }, "sizePercent": 10.0, "image": "stone.png" }
          ] },
        { "id": "step2", "actionType": "end", "text": { "en": "The blanket is done." },
          "objects": [
            { "id": "loom", "role": "target", "position": { "x": 0.5, "y": 0.5 }, "sizePercent": 30.0, "image": "loom.png" }
          ] }
      ]
    },
    {
      "id": "carving", "biomeId": "forest", "names": { "en": "Carving" },
      "requiredResources": { "r2": 2 }, "awardedResources": { "r1": 1 },
      "startStepId": "watch",
      "instructions": [
        { "id": "watch", "actionType": "special", "nextStepId": "choose",
          "text": { "en": "Watch the carver." },
          "feedback": { "en": "The carver splits the cedar." },
          "removeItems": { "r1": 1 },
          "functions": [ { "function": "wait", "args": ["500"] } ] },
        { "id": "choose", "actionType": "select", "nextStepId": "end",
          "text": { "en": "Pick the adze." },
          "correctChoice": "adze",
          "branches": [ { "condition": { "type": "activityCompleted", "activity": "weaving" }, "next": "bonus" } ],
          "objects": [
            { "id": "adze", "role": "target", "position": { "x": 0.3, "y": 0.5 }, "sizePercent": 10.0, "image": "adze.png" },
            { "id": "rock", "role": "decoy", "position": { "x": 0.7, "y": 0.5 }, "sizePercent": 10.0, "image": "rock.png" }
          ] },
        { "id": "bonus", "actionType": "end", "text": { "en": "You remembered the weaving." } }
      ]
    }
  ],
  "vocabularyMinigames": [
    { "id": "animals", "referenceName": "animalWheel", "gameType": "wheel", "mode": "practice",
      "morphologicalCategory": "noun", "semanticCategory": "animal" },
    { "id": "animalsChallenge", "gameType": "wheel", "mode": "challenge",
      "morphologicalCategory": "noun", "semanticCategory": "animal" },
    { "id": "birds", "gameType": "spawn", "morphologicalCategory": "noun", "semanticCategory": "bird" }
  ],
  "vocabulary": [
    { "id": "w1", "morphologicalCategory": "noun", "semanticCategories": ["animal"], "minigames": ["wheel"], "words": { "en": "bear" } },
    { "id": "w2", "morphologicalCategory": "noun", "semanticCategories": ["animal"], "minigames": ["wheel"], "words": { "en": "deer" } },
    { "id": "w3", "morphologicalCategory": "noun", "semanticCategories": ["animal"], "minigames": ["wheel"], "words": { "en": "salmon" } },
    { "id": "w4", "morphologicalCategory": "noun", "semanticCategories": ["animal"], "minigames": ["wheel"], "words": { "en": "wolf" } },
    { "id": "w5", "morphologicalCategory": "noun", "semanticCategories": ["animal"], "minigames": ["wheel"], "words": { "en": "seal" } },
    { "id": "w6", "morphologicalCategory": "noun", "semanticCategories": ["animal"], "minigames": ["wheel"], "words": { "en": "otter" } },
    { "id": "w7", "morphologicalCategory": "noun", "semanticCategories": ["animal"], "minigames": ["wheel"], "words": { "en": "elk" } },
    { "id": "w8", "morphologicalCategory": "noun", "semanticCategories": ["animal"], "minigames": ["wheel"], "words": { "en": "mink" } },
    { "id": "w9", "morphologicalCategory": "noun", "semanticCategories": ["animal"], "minigames": ["wheel"], "words": { "en": "beaver" } },
    { "id": "w10", "morphologicalCategory": "noun", "semanticCategories": ["animal"], "minigames": ["wheel"], "words": { "en": "cougar" } },
    { "id": "w11", "morphologicalCategory": "noun", "semanticCategories": ["bird"], "minigames": ["spawn"], "words": { "en": "eagle" } },
    { "id": "w12", "morphologicalCategory": "noun", "semanticCategories": ["bird"], "minigames": ["spawn"], "words": { "en": "raven" } },
    { "id": "w13", "morphologicalCategory": "noun", "semanticCategories": ["bird"], "minigames": ["spawn"], "words": { "en": "heron" } },
    { "id": "w14", "morphologicalCategory": "verb", "semanticCategories": ["animal"], "minigames": ["wheel"], "words": { "en": "run" } }
  ]
}"#;

/// Validated fixture content.
pub fn data_store() -> GameDataStore {
    GameDataStore::from_json_str(CONTENT, &FunctionRegistry::with_builtins())
        .expect("fixture content is valid")
}

/// The instant every fixture context reports as "now".
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap()
}

//=== Contexts ============================================================

/// Context over fixture content with a fresh in-memory player.
pub fn context() -> GameContext {
    context_with_presenter().0
}

/// Context plus a handle onto its recording presenter.
pub fn context_with_presenter() -> (GameContext, RecordingPresenter) {
    let data = Rc::new(data_store());
    let mut progress = PlayerProgressStore::load_or_default(MemoryStorage::new(), "en")
        .expect("memory storage loads");
    progress.reconcile(&data);

    let presenter = RecordingPresenter::new();
    let mut ctx = GameContext::new(
        GameConfig::default(),
        data,
        progress,
        Box::new(presenter.clone()),
        Rc::new(FunctionRegistry::with_builtins()),
    );
    ctx.clock = fixed_now;
    (ctx, presenter)
}

/// Puts resources into the player's inventory.
pub fn stock(ctx: &mut GameContext, items: &[(&str, u32)]) {
    let items: ResourceMap = items.iter().map(|(r, q)| (r.to_string(), *q)).collect();
    ctx.progress
        .add_resources("fixture", &items)
        .expect("additions never fail");
}

//=== Probe ===============================================================

#[derive(Debug, Default)]
struct ProbeState {
    log: Vec<String>,
    failing: HashSet<String>,
}

/// Records the lifecycle of every unit created from it.
#[derive(Debug, Clone, Default)]
pub struct Probe {
    state: Rc<RefCell<ProbeState>>,
}

impl Probe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unit(&self, key: &str) -> ProbeScene {
        ProbeScene {
            key: key.to_string(),
            state: Rc::clone(&self.state),
        }
    }

    pub fn log(&self) -> Vec<String> {
        self.state.borrow().log.clone()
    }

    pub fn clear(&self) {
        self.state.borrow_mut().log.clear();
    }

    /// Makes the unit's next entries fail.
    pub fn fail_enter(&self, key: &str) {
        self.state.borrow_mut().failing.insert(key.to_string());
    }
}

/// Scene that only reports what happens to it.
#[derive(Debug)]
pub struct ProbeScene {
    key: String,
    state: Rc<RefCell<ProbeState>>,
}

impl ProbeScene {
    fn record(&self, what: String) {
        self.state.borrow_mut().log.push(format!("{}:{}", self.key, what));
    }
}

impl Scene for ProbeScene {
    fn on_enter(&mut self, _ctx: &mut GameContext, entry: &SceneEntry) -> GameResult<()> {
        match &entry.reference {
            Some(reference) => self.record(format!("enter({})", reference)),
            None => self.record("enter".to_string()),
        }
        if self.state.borrow().failing.contains(&self.key) {
            return Err(GameError::configuration(format!("{} refuses to start", self.key)));
        }
        Ok(())
    }

    fn on_exit(&mut self, _ctx: &mut GameContext) {
        self.record("exit".to_string());
    }

    fn on_visibility(&mut self, _ctx: &mut GameContext, visible: bool) {
        self.record(if visible { "shown" } else { "hidden" }.to_string());
    }

    fn on_input(&mut self, _ctx: &mut GameContext, _event: &InputEvent) -> bool {
        self.record("input".to_string());
        false
    }

    fn on_timer(&mut self, _ctx: &mut GameContext, _timer: &FiredTimer) {
        self.record("timer".to_string());
    }

    fn update(&mut self, _ctx: &mut GameContext) {}
}

//=== Time ================================================================

/// Advances the scheduler in 10ms slices, handing every fired timer to
/// `on_fire`, so timers scheduled by a handler start from the slice in
/// which their parent fired.
pub fn run_timers(
    ctx: &mut GameContext,
    ms: u64,
    mut on_fire: impl FnMut(&mut GameContext, &FiredTimer),
) {
    let mut left = ms;
    while left > 0 {
        let slice = left.min(10);
        left -= slice;
        for fired in ctx.scheduler.advance(slice) {
            on_fire(ctx, &fired);
        }
    }
}
