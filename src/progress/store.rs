//=========================================================================
// Player Progress Store
//=========================================================================
//
// Single source of truth for mutable player state.
//
// Architecture:
//   mutation ──> PlayerProgress (memory) ──> persist() ──> ProgressStorage
//                        │                      │ (retry once)
//                        │                      └─ failure → PersistFailed
//                        └──> ProgressChange ──> crossbeam subscribers
//
// Every mutation overwrites the stored record in full (write-through).
// A failed write never rolls back memory; the in-memory record stays
// authoritative and the next successful write catches storage up.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, error, info, warn};

//=== Internal Dependencies ===============================================

use super::model::{PlayerProgress, VocabEncounter};
use super::storage::ProgressStorage;
use crate::core::error::{GameError, GameResult};
use crate::data::{GameDataStore, ResourceMap, VocabularyWord};

//=== ProgressChange ======================================================

/// Notification sent to subscribers after a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressChange {
    /// resource id → new quantity, for every touched resource.
    Inventory(BTreeMap<String, u32>),
    Language(String),
    ActivitiesUnlocked(Vec<String>),
    BiomeUnlocked(String),
    ActivityCompleted(String),
    VocabGameCompleted(String),
    VocabRecorded { vocab_id: String, correct: bool },
    /// Both the write and its retry failed.
    PersistFailed(String),
}

//=== PlayerProgressStore =================================================

pub struct PlayerProgressStore {
    record: PlayerProgress,
    storage: Box<dyn ProgressStorage>,
    subscribers: Vec<Sender<ProgressChange>>,
    /// Persistence failures not yet surfaced to the player.
    failures: Vec<String>,
}

impl std::fmt::Debug for PlayerProgressStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerProgressStore")
            .field("record", &self.record)
            .field("subscribers", &self.subscribers.len())
            .field("failures", &self.failures)
            .finish()
    }
}

impl PlayerProgressStore {
    //--- Construction -----------------------------------------------------

    /// Loads the stored record, or starts a fresh one in `default_language`.
    pub fn load_or_default(
        storage: impl ProgressStorage + 'static,
        default_language: &str,
    ) -> GameResult<Self> {
        let record = match storage.load()? {
            Some(record) => {
                info!("Loaded player record");
                record
            }
            None => {
                info!("No player record found, starting fresh");
                let mut record = PlayerProgress::default();
                record.settings.language = default_language.to_string();
                record
            }
        };

        Ok(Self {
            record,
            storage: Box::new(storage),
            subscribers: Vec::new(),
            failures: Vec::new(),
        })
    }

    /// Boot-time reconciliation with static content: biomes and activities
    /// flagged unlocked in content, then the resource-based unlock check.
    pub fn reconcile(&mut self, data: &GameDataStore) -> Vec<String> {
        let mut changed = false;
        for biome in data.biomes().filter(|b| b.unlocked) {
            changed |= self.record.unlocked_biomes.insert(biome.id.clone());
        }
        for activity in data.activities().filter(|a| a.unlocked) {
            changed |= self
                .record
                .unlocked_traditional_activities
                .insert(activity.id.clone());
        }

        let unlocked = self.recompute_unlocks(data);
        if changed && unlocked.is_empty() {
            self.persist();
        }
        unlocked
    }

    //--- Observation ------------------------------------------------------

    pub fn snapshot(&self) -> &PlayerProgress {
        &self.record
    }

    /// Registers a new change listener.
    pub fn subscribe(&mut self) -> Receiver<ProgressChange> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Drains persistence failures awaiting a user notification.
    pub fn take_failures(&mut self) -> Vec<String> {
        std::mem::take(&mut self.failures)
    }

    //--- Settings ---------------------------------------------------------

    pub fn language(&self) -> &str {
        &self.record.settings.language
    }

    pub fn set_language(&mut self, language: &str) {
        if self.record.settings.language == language {
            return;
        }
        self.record.settings.language = language.to_string();
        self.commit(ProgressChange::Language(language.to_string()));
    }

    //--- Inventory --------------------------------------------------------

    pub fn quantity(&self, resource: &str) -> u32 {
        self.record.quantity(resource)
    }

    pub fn has_resources(&self, required: &ResourceMap) -> bool {
        required
            .iter()
            .all(|(resource, qty)| self.quantity(resource) >= *qty)
    }

    /// Applies removals then additions as one transaction. Every removal
    /// is checked before anything changes.
    pub fn apply_delta(
        &mut self,
        context: &str,
        remove: &ResourceMap,
        add: &ResourceMap,
    ) -> GameResult<()> {
        if remove.is_empty() && add.is_empty() {
            return Ok(());
        }
        self.check_available(context, remove)?;

        let mut touched = BTreeMap::new();
        for (resource, qty) in remove {
            let entry = self.record.inventory.entry(resource.clone()).or_insert(0);
            *entry -= *qty;
            touched.insert(resource.clone(), *entry);
        }
        for (resource, qty) in add {
            let entry = self.record.inventory.entry(resource.clone()).or_insert(0);
            *entry = entry.saturating_add(*qty);
            touched.insert(resource.clone(), *entry);
        }

        debug!("Inventory delta for {}: -{:?} +{:?}", context, remove, add);
        self.commit(ProgressChange::Inventory(touched));
        Ok(())
    }

    pub fn add_resources(&mut self, context: &str, add: &ResourceMap) -> GameResult<()> {
        self.apply_delta(context, &ResourceMap::new(), add)
    }

    /// Removes resources; rejects the whole removal if any is short.
    pub fn deduct_resources(&mut self, context: &str, remove: &ResourceMap) -> GameResult<()> {
        self.apply_delta(context, remove, &ResourceMap::new())
    }

    /// Fails with `InsufficientResources` for the first entry of `remove`
    /// the inventory cannot cover.
    pub fn check_available(&self, context: &str, remove: &ResourceMap) -> GameResult<()> {
        for (resource, qty) in remove {
            let available = self.quantity(resource);
            if available < *qty {
                warn!(
                    "{} needs {} x{} but inventory holds {}",
                    context, resource, qty, available
                );
                return Err(GameError::InsufficientResources {
                    activity: context.to_string(),
                    resource: resource.clone(),
                    required: *qty,
                    available,
                });
            }
        }
        Ok(())
    }

    //--- Unlocks ----------------------------------------------------------

    pub fn is_activity_unlocked(&self, activity: &str) -> bool {
        self.record.unlocked_traditional_activities.contains(activity)
    }

    pub fn is_biome_unlocked(&self, biome: &str) -> bool {
        self.record.unlocked_biomes.contains(biome)
    }

    /// Returns whether the activity was newly unlocked.
    pub fn unlock_activity(&mut self, activity: &str) -> bool {
        if !self
            .record
            .unlocked_traditional_activities
            .insert(activity.to_string())
        {
            return false;
        }
        self.commit(ProgressChange::ActivitiesUnlocked(vec![activity.to_string()]));
        true
    }

    pub fn unlock_biome(&mut self, biome: &str) -> bool {
        if !self.record.unlocked_biomes.insert(biome.to_string()) {
            return false;
        }
        self.commit(ProgressChange::BiomeUnlocked(biome.to_string()));
        true
    }

    /// Unlocks every locked activity whose requirements the inventory now
    /// covers. Never re-locks; returns the newly unlocked ids in content
    /// order.
    pub fn recompute_unlocks(&mut self, data: &GameDataStore) -> Vec<String> {
        let newly: Vec<String> = data
            .activities()
            .filter(|a| !self.is_activity_unlocked(&a.id))
            .filter(|a| self.has_resources(&a.required_resources))
            .map(|a| a.id.clone())
            .collect();

        if newly.is_empty() {
            return newly;
        }

        info!("Activities unlocked: {:?}", newly);
        self.record
            .unlocked_traditional_activities
            .extend(newly.iter().cloned());
        self.commit(ProgressChange::ActivitiesUnlocked(newly.clone()));
        newly
    }

    //--- Completion -------------------------------------------------------

    pub fn is_activity_completed(&self, activity: &str) -> bool {
        self.record
            .progress
            .completed_traditional_activities
            .contains(activity)
    }

    /// Returns whether this call newly completed the activity.
    pub fn mark_activity_completed(&mut self, activity: &str) -> bool {
        if !self
            .record
            .progress
            .completed_traditional_activities
            .insert(activity.to_string())
        {
            debug!("Activity {} already completed", activity);
            return false;
        }
        self.commit(ProgressChange::ActivityCompleted(activity.to_string()));
        true
    }

    pub fn mark_vocab_game_completed(&mut self, game: &str) -> bool {
        if !self
            .record
            .progress
            .completed_vocab_games
            .insert(game.to_string())
        {
            return false;
        }
        self.commit(ProgressChange::VocabGameCompleted(game.to_string()));
        true
    }

    //--- Vocabulary -------------------------------------------------------

    pub fn encounter(&self, vocab_id: &str) -> Option<&VocabEncounter> {
        self.record.encounter(vocab_id)
    }

    pub fn record_vocab_result(&mut self, vocab_id: &str, correct: bool, now: DateTime<Utc>) {
        self.record.encounter_mut(vocab_id).record(correct, now);
        self.commit(ProgressChange::VocabRecorded {
            vocab_id: vocab_id.to_string(),
            correct,
        });
    }

    /// Static vocabulary with the player's history folded in.
    pub fn effective_vocabulary(&self, data: &GameDataStore) -> Vec<VocabularyWord> {
        data.vocabulary()
            .iter()
            .map(|word| {
                let mut word = word.clone();
                if let Some(history) = self.record.encounter(&word.id) {
                    word.num_times_incorrect += history.times_incorrect;
                    word.last_date_incorrect =
                        latest(word.last_date_incorrect, history.last_date_incorrect);
                    word.last_date_encountered =
                        latest(word.last_date_encountered, history.last_date_encountered);
                }
                word
            })
            .collect()
    }

    //--- Persistence ------------------------------------------------------

    fn commit(&mut self, change: ProgressChange) {
        self.persist();
        self.notify(change);
    }

    fn persist(&mut self) {
        let first = match self.storage.save(&self.record) {
            Ok(()) => return,
            Err(e) => e,
        };
        warn!("Player record write failed, retrying: {}", first);

        if let Err(second) = self.storage.save(&self.record) {
            error!("Player record write failed twice: {}", second);
            let message = second.to_string();
            self.failures.push(message.clone());
            self.notify(ProgressChange::PersistFailed(message));
        }
    }

    fn notify(&mut self, change: ProgressChange) {
        self.subscribers
            .retain(|tx| tx.send(change.clone()).is_ok());
    }
}

fn latest(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::MemoryStorage;
    use crate::testing;
    use chrono::TimeZone;

    fn map(entries: &[(&str, u32)]) -> ResourceMap {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect()
    }

    fn store_with(inventory: &[(&str, u32)]) -> (PlayerProgressStore, MemoryStorage) {
        let mut record = PlayerProgress::default();
        record.inventory = map(inventory);
        let storage = MemoryStorage::with_record(&record).unwrap();
        let store = PlayerProgressStore::load_or_default(storage.clone(), "en").unwrap();
        (store, storage)
    }

    #[test]
    fn fresh_store_uses_default_language() {
        let store = PlayerProgressStore::load_or_default(MemoryStorage::new(), "hur").unwrap();
        assert_eq!(store.language(), "hur");
    }

    #[test]
    fn deduct_rejects_shortfall_without_change() {
        let (mut store, storage) = store_with(&[("r1", 2), ("r2", 9)]);
        let err = store
            .deduct_resources("weaving", &map(&[("r2", 1), ("r1", 3)]))
            .unwrap_err();

        assert!(matches!(
            err,
            GameError::InsufficientResources { required: 3, available: 2, .. }
        ));
        assert_eq!(store.quantity("r1"), 2);
        assert_eq!(store.quantity("r2"), 9);
        assert_eq!(storage.writes(), 0);
    }

    #[test]
    fn delta_is_write_through() {
        let (mut store, storage) = store_with(&[("r1", 5)]);
        store
            .apply_delta("step", &map(&[("r1", 3)]), &map(&[("r2", 2)]))
            .unwrap();

        assert_eq!(store.quantity("r1"), 2);
        assert_eq!(store.quantity("r2"), 2);
        assert_eq!(storage.writes(), 1);
        assert_eq!(storage.stored().unwrap().quantity("r2"), 2);
    }

    #[test]
    fn subscribers_receive_changes() {
        let (mut store, _) = store_with(&[]);
        let rx = store.subscribe();
        store.add_resources("gift", &map(&[("cedar", 1)])).unwrap();
        store.set_language("hur");

        assert_eq!(
            rx.try_recv().unwrap(),
            ProgressChange::Inventory(map(&[("cedar", 1)]))
        );
        assert_eq!(rx.try_recv().unwrap(), ProgressChange::Language("hur".into()));
    }

    #[test]
    fn dropped_subscriber_is_pruned() {
        let (mut store, _) = store_with(&[]);
        drop(store.subscribe());
        store.set_language("hur");
        assert!(store.subscribers.is_empty());
    }

    #[test]
    fn single_write_failure_is_retried() {
        let (mut store, storage) = store_with(&[]);
        let rx = store.subscribe();
        storage.fail_next_writes(1);

        store.set_language("hur");
        assert_eq!(storage.writes(), 1);
        assert!(store.take_failures().is_empty());
        assert_eq!(rx.try_recv().unwrap(), ProgressChange::Language("hur".into()));
    }

    #[test]
    fn double_write_failure_is_surfaced() {
        let (mut store, storage) = store_with(&[]);
        let rx = store.subscribe();
        storage.fail_next_writes(2);

        store.set_language("hur");
        assert_eq!(store.language(), "hur");
        assert!(matches!(rx.try_recv().unwrap(), ProgressChange::PersistFailed(_)));
        assert_eq!(store.take_failures().len(), 1);
        assert!(store.take_failures().is_empty());
    }

    #[test]
    fn completion_is_idempotent() {
        let (mut store, storage) = store_with(&[]);
        assert!(store.mark_activity_completed("weaving"));
        assert!(!store.mark_activity_completed("weaving"));
        assert_eq!(storage.writes(), 1);
    }

    #[test]
    fn recompute_unlocks_is_monotonic() {
        let data = testing::data_store();
        let (mut store, _) = store_with(&[("r1", 3)]);

        assert_eq!(store.recompute_unlocks(&data), vec!["weaving".to_string()]);
        store
            .deduct_resources("spend", &map(&[("r1", 3)]))
            .unwrap();
        assert!(store.recompute_unlocks(&data).is_empty());
        assert!(store.is_activity_unlocked("weaving"));
    }

    #[test]
    fn reconcile_applies_content_flags() {
        let data = testing::data_store();
        let (mut store, _) = store_with(&[]);
        store.reconcile(&data);
        assert!(store.is_biome_unlocked("river"));
        assert!(!store.is_activity_unlocked("weaving"));
    }

    #[test]
    fn vocab_history_overlays_static_words() {
        let data = testing::data_store();
        let (mut store, _) = store_with(&[]);
        let now = Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap();

        store.record_vocab_result("w2", false, now);
        let words = store.effective_vocabulary(&data);
        let w2 = words.iter().find(|w| w.id == "w2").unwrap();
        assert_eq!(w2.num_times_incorrect, 1);
        assert_eq!(w2.last_date_incorrect, Some(now));
        assert_eq!(store.encounter("w2").unwrap().times_encountered, 1);
    }
}
