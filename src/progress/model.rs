//=========================================================================
// Player Progress Record
//=========================================================================
//
// The single persisted record per player. Serialized as one JSON object
// and overwritten in full on every mutation.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

//=== Settings ============================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Language code used for displayed text.
    pub language: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
        }
    }
}

//=== Completion Counters =================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Completion {
    pub completed_vocab_games: BTreeSet<String>,
    pub completed_traditional_activities: BTreeSet<String>,
}

//=== Vocabulary Encounters ===============================================

/// Per-word history used to prioritize repetition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabEncounter {
    pub vocab_id: String,
    pub times_encountered: u32,
    pub times_correct: u32,
    #[serde(default)]
    pub times_incorrect: u32,
    #[serde(default)]
    pub last_date_incorrect: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_date_encountered: Option<DateTime<Utc>>,
}

impl VocabEncounter {
    pub fn new(vocab_id: impl Into<String>) -> Self {
        Self {
            vocab_id: vocab_id.into(),
            times_encountered: 0,
            times_correct: 0,
            times_incorrect: 0,
            last_date_incorrect: None,
            last_date_encountered: None,
        }
    }

    /// Folds one graded encounter into the history.
    pub fn record(&mut self, correct: bool, now: DateTime<Utc>) {
        self.times_encountered += 1;
        self.last_date_encountered = Some(now);
        if correct {
            self.times_correct += 1;
        } else {
            self.times_incorrect += 1;
            self.last_date_incorrect = Some(now);
        }
    }
}

//=== PlayerProgress ======================================================

/// Everything about a player that must survive navigation and restarts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayerProgress {
    pub settings: Settings,
    /// resource id → quantity (never negative by construction).
    pub inventory: BTreeMap<String, u32>,
    pub unlocked_biomes: BTreeSet<String>,
    pub unlocked_traditional_activities: BTreeSet<String>,
    pub progress: Completion,
    pub vocab_encounters: Vec<VocabEncounter>,
}

impl PlayerProgress {
    pub fn quantity(&self, resource: &str) -> u32 {
        self.inventory.get(resource).copied().unwrap_or(0)
    }

    pub fn encounter(&self, vocab_id: &str) -> Option<&VocabEncounter> {
        self.vocab_encounters.iter().find(|e| e.vocab_id == vocab_id)
    }

    pub(crate) fn encounter_mut(&mut self, vocab_id: &str) -> &mut VocabEncounter {
        let pos = match self
            .vocab_encounters
            .iter()
            .position(|e| e.vocab_id == vocab_id)
        {
            Some(pos) => pos,
            None => {
                self.vocab_encounters.push(VocabEncounter::new(vocab_id));
                self.vocab_encounters.len() - 1
            }
        };
        &mut self.vocab_encounters[pos]
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn serializes_with_persisted_field_names() {
        let mut progress = PlayerProgress::default();
        progress.inventory.insert("cedar".into(), 2);
        progress
            .unlocked_traditional_activities
            .insert("weaving".into());

        let json = serde_json::to_value(&progress).unwrap();
        assert_eq!(json["settings"]["language"], "en");
        assert_eq!(json["inventory"]["cedar"], 2);
        assert_eq!(json["unlockedTraditionalActivities"][0], "weaving");
        assert!(json["progress"]["completedVocabGames"].is_array());
        assert!(json["vocabEncounters"].is_array());
    }

    #[test]
    fn missing_fields_default_on_load() {
        let progress: PlayerProgress =
            serde_json::from_str(r#"{ "inventory": { "cedar": 1 } }"#).unwrap();
        assert_eq!(progress.quantity("cedar"), 1);
        assert_eq!(progress.quantity("salmon"), 0);
        assert_eq!(progress.settings.language, "en");
    }

    #[test]
    fn record_tracks_incorrect_dates() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let mut encounter = VocabEncounter::new("salmon");
        encounter.record(false, now);
        encounter.record(true, now);

        assert_eq!(encounter.times_encountered, 2);
        assert_eq!(encounter.times_correct, 1);
        assert_eq!(encounter.times_incorrect, 1);
        assert_eq!(encounter.last_date_incorrect, Some(now));
        assert_eq!(encounter.last_date_encountered, Some(now));
    }

    #[test]
    fn encounter_mut_creates_once() {
        let mut progress = PlayerProgress::default();
        progress.encounter_mut("salmon").times_correct += 1;
        progress.encounter_mut("salmon").times_correct += 1;
        assert_eq!(progress.vocab_encounters.len(), 1);
        assert_eq!(progress.encounter("salmon").unwrap().times_correct, 2);
    }
}
