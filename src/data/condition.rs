//=========================================================================
// Conditions
//=========================================================================
//
// Closed predicate language over player progress, used to gate dialogue
// lines and to pick conditional branches in activity step graphs.
//
// Content form (JSON):
//   { "type": "hasResource", "resource": "cedar", "atLeast": 2 }
//   { "type": "all", "conditions": [ ... ] }
//
//=========================================================================

//=== External Dependencies ===============================================

use serde::{Deserialize, Serialize};

//=== Internal Dependencies ===============================================

use crate::progress::PlayerProgress;

//=== Condition ===========================================================

/// Predicate evaluated against a player's progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Condition {
    Always,
    HasResource { resource: String, at_least: u32 },
    ActivityUnlocked { activity: String },
    ActivityCompleted { activity: String },
    BiomeUnlocked { biome: String },
    VocabGameCompleted { game: String },
    Language { language: String },
    All { conditions: Vec<Condition> },
    Any { conditions: Vec<Condition> },
    Not { condition: Box<Condition> },
}

impl Condition {
    pub fn evaluate(&self, progress: &PlayerProgress) -> bool {
        match self {
            Condition::Always => true,
            Condition::HasResource {
                resource,
                at_least,
            } => progress.quantity(resource) >= *at_least,
            Condition::ActivityUnlocked { activity } => progress
                .unlocked_traditional_activities
                .contains(activity),
            Condition::ActivityCompleted { activity } => progress
                .progress
                .completed_traditional_activities
                .contains(activity),
            Condition::BiomeUnlocked { biome } => progress.unlocked_biomes.contains(biome),
            Condition::VocabGameCompleted { game } => {
                progress.progress.completed_vocab_games.contains(game)
            }
            Condition::Language { language } => &progress.settings.language == language,
            Condition::All { conditions } => conditions.iter().all(|c| c.evaluate(progress)),
            Condition::Any { conditions } => conditions.iter().any(|c| c.evaluate(progress)),
            Condition::Not { condition } => !condition.evaluate(progress),
        }
    }

    /// Content ids this condition refers to, as `(kind, id)` pairs.
    pub fn references(&self) -> Vec<(&'static str, &str)> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<(&'static str, &'a str)>) {
        match self {
            Condition::HasResource { resource, .. } => out.push(("resource", resource.as_str())),
            Condition::ActivityUnlocked { activity } | Condition::ActivityCompleted { activity } => {
                out.push(("activity", activity.as_str()))
            }
            Condition::BiomeUnlocked { biome } => out.push(("biome", biome.as_str())),
            Condition::VocabGameCompleted { game } => out.push(("minigame", game.as_str())),
            Condition::All { conditions } | Condition::Any { conditions } => {
                for c in conditions {
                    c.collect_references(out);
                }
            }
            Condition::Not { condition } => condition.collect_references(out),
            Condition::Always | Condition::Language { .. } => {}
        }
    }
}

/// Evaluates an optional condition; absence means "always".
pub fn holds(condition: Option<&Condition>, progress: &PlayerProgress) -> bool {
    condition.map_or(true, |c| c.evaluate(progress))
}

//=========================================================================
// Unit Tests
//=========================================================================
