//=========================================================================
// Static Game Data
//=========================================================================
//
// Content model, conditions, step graphs and the read-only store.
//
//=========================================================================

//=== Module Declarations =================================================

mod condition;
mod graph;
mod model;
mod store;

//=== Public API ==========================================================

pub use condition::{holds, Condition};
pub use graph::StepGraph;
pub use model::{
    ActionType, Biome, Branch, ContentBundle, DialogueEntry, DialogueLine, GameType, Instruction,
    InteractiveObjectSpec, LocalizedText, NextStep, ObjectRole, Resource, ResourceMap, SceneMeta,
    TraditionalActivity, VocabularyMinigame, VocabularyWord, WheelMode,
};
pub use store::{GameDataStore, ResolvedScene};
