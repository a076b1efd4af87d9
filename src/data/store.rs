//=========================================================================
// Game Data Store
//=========================================================================
//
// Read-only reference data, loaded and validated once at boot.
//
// Architecture:
//   ContentBundle (JSON) ──validate()──> GameDataStore
//                              │             ├─ collections (content order)
//                              │             └─ graphs: activity id → StepGraph
//                              └─ ContentError::Invalid(all problems)
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use log::{debug, info};
use serde::de::DeserializeOwned;

//=== Internal Dependencies ===============================================

use super::condition::Condition;
use super::graph::StepGraph;
use super::model::{
    Biome, ContentBundle, DialogueEntry, Resource, SceneMeta, TraditionalActivity,
    VocabularyMinigame, VocabularyWord,
};
use crate::core::error::{ContentError, GameError, GameResult};
use crate::functions::{FunctionCall, FunctionRegistry};

//=== ResolvedScene =======================================================

/// Outcome of scene resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedScene<'a> {
    pub meta: &'a SceneMeta,
    pub reference: Option<String>,
}

//=== GameDataStore =======================================================

#[derive(Debug, Clone, Default)]
pub struct GameDataStore {
    scenes: Vec<SceneMeta>,
    dialogue: Vec<DialogueEntry>,
    biomes: Vec<Biome>,
    resources: Vec<Resource>,
    activities: Vec<TraditionalActivity>,
    graphs: HashMap<String, StepGraph>,
    minigames: Vec<VocabularyMinigame>,
    vocabulary: Vec<VocabularyWord>,
}

impl GameDataStore {
    //--- Loading ----------------------------------------------------------

    /// Validates a bundle against the function registry.
    pub fn from_bundle(
        bundle: ContentBundle,
        functions: &FunctionRegistry,
    ) -> Result<Self, ContentError> {
        let mut problems = Vec::new();
        let mut graphs = HashMap::new();

        for activity in &bundle.traditional_activities {
            match StepGraph::build(activity) {
                Ok(graph) => {
                    graphs.insert(activity.id.clone(), graph);
                }
                Err(mut errs) => problems.append(&mut errs),
            }
        }

        let store = Self {
            scenes: bundle.scenes,
            dialogue: bundle.dialogue,
            biomes: bundle.biomes,
            resources: bundle.resources,
            activities: bundle.traditional_activities,
            graphs,
            minigames: bundle.vocabulary_minigames,
            vocabulary: bundle.vocabulary,
        };
        store.validate(functions, &mut problems);

        if !problems.is_empty() {
            return Err(ContentError::Invalid(problems));
        }

        info!(
            "Content loaded: {} scenes, {} activities, {} minigames, {} words",
            store.scenes.len(),
            store.activities.len(),
            store.minigames.len(),
            store.vocabulary.len()
        );
        Ok(store)
    }

    /// Loads a single bundle document.
    pub fn from_json_str(json: &str, functions: &FunctionRegistry) -> Result<Self, ContentError> {
        let bundle: ContentBundle =
            serde_json::from_str(json).map_err(|source| ContentError::Parse {
                path: "<bundle>".into(),
                source,
            })?;
        Self::from_bundle(bundle, functions)
    }

    /// Loads one `<collection>.json` array per collection from `dir`.
    /// Missing files are empty collections.
    pub fn load_dir(dir: impl AsRef<Path>, functions: &FunctionRegistry) -> Result<Self, ContentError> {
        let dir = dir.as_ref();
        let bundle = ContentBundle {
            scenes: read_collection(dir, "scenes")?,
            dialogue: read_collection(dir, "dialogue")?,
            biomes: read_collection(dir, "biomes")?,
            resources: read_collection(dir, "resources")?,
            traditional_activities: read_collection(dir, "traditionalActivities")?,
            vocabulary_minigames: read_collection(dir, "vocabularyMinigames")?,
            vocabulary: read_collection(dir, "vocabulary")?,
        };
        Self::from_bundle(bundle, functions)
    }

    //--- Scenes -----------------------------------------------------------

    pub fn scenes(&self) -> impl Iterator<Item = &SceneMeta> {
        self.scenes.iter()
    }

    pub fn scene(&self, key: &str) -> Option<&SceneMeta> {
        self.scenes.iter().find(|s| s.key == key)
    }

    /// Exact key first, then reference name or constructor identifier,
    /// matched against the target and then the reference.
    pub fn resolve_scene(&self, target: &str, reference: Option<&str>) -> GameResult<ResolvedScene<'_>> {
        if let Some(meta) = self.scene(target) {
            return Ok(ResolvedScene {
                meta,
                reference: reference.map(str::to_string),
            });
        }

        let by_alias = |name: &str| {
            self.scenes.iter().find(|s| {
                s.reference_name.as_deref() == Some(name)
                    || s.constructor_identifier.as_deref() == Some(name)
            })
        };

        let found = by_alias(target).or_else(|| reference.and_then(by_alias));
        match found {
            Some(meta) => {
                debug!("Scene {} resolved by alias to {}", target, meta.key);
                Ok(ResolvedScene {
                    meta,
                    reference: reference.map(str::to_string),
                })
            }
            None => Err(GameError::SceneNotFound {
                target: target.to_string(),
                reference: reference.map(str::to_string),
            }),
        }
    }

    //--- Dialogue ---------------------------------------------------------

    pub fn dialogue_for(&self, scene_key: &str) -> Option<&DialogueEntry> {
        self.dialogue.iter().find(|d| d.scene_key == scene_key)
    }

    //--- Biomes & Resources -----------------------------------------------

    pub fn biomes(&self) -> impl Iterator<Item = &Biome> {
        self.biomes.iter()
    }

    pub fn biome(&self, id: &str) -> GameResult<&Biome> {
        self.biomes
            .iter()
            .find(|b| b.id == id || b.reference_name == id)
            .ok_or_else(|| GameError::not_found("biome", id))
    }

    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter()
    }

    pub fn resource(&self, id: &str) -> GameResult<&Resource> {
        self.resources
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| GameError::not_found("resource", id))
    }

    //--- Activities -------------------------------------------------------

    pub fn activities(&self) -> impl Iterator<Item = &TraditionalActivity> {
        self.activities.iter()
    }

    pub fn activity(&self, id: &str) -> GameResult<&TraditionalActivity> {
        self.activities
            .iter()
            .find(|a| a.id == id)
            .ok_or_else(|| GameError::not_found("activity", id))
    }

    pub fn activity_graph(&self, id: &str) -> GameResult<&StepGraph> {
        self.graphs
            .get(id)
            .ok_or_else(|| GameError::not_found("activity", id))
    }

    pub fn activities_in_biome<'a>(&'a self, biome: &'a str) -> impl Iterator<Item = &'a TraditionalActivity> {
        self.activities.iter().filter(move |a| a.biome_id == biome)
    }

    //--- Vocabulary -------------------------------------------------------

    pub fn minigames(&self) -> impl Iterator<Item = &VocabularyMinigame> {
        self.minigames.iter()
    }

    pub fn minigame(&self, id: &str) -> GameResult<&VocabularyMinigame> {
        self.minigames
            .iter()
            .find(|m| m.id == id || m.reference_name.as_deref() == Some(id))
            .ok_or_else(|| GameError::not_found("minigame", id))
    }

    pub fn vocabulary(&self) -> &[VocabularyWord] {
        &self.vocabulary
    }

    pub fn word(&self, id: &str) -> Option<&VocabularyWord> {
        self.vocabulary.iter().find(|w| w.id == id)
    }

    //--- Validation -------------------------------------------------------

    fn validate(&self, functions: &FunctionRegistry, problems: &mut Vec<String>) {
        duplicates("scene", self.scenes.iter().map(|s| s.key.as_str()), problems);
        duplicates("biome", self.biomes.iter().map(|b| b.id.as_str()), problems);
        duplicates("resource", self.resources.iter().map(|r| r.id.as_str()), problems);
        duplicates("activity", self.activities.iter().map(|a| a.id.as_str()), problems);
        duplicates("minigame", self.minigames.iter().map(|m| m.id.as_str()), problems);
        duplicates("word", self.vocabulary.iter().map(|w| w.id.as_str()), problems);

        let biome_ids: HashSet<&str> = self.biomes.iter().map(|b| b.id.as_str()).collect();
        let resource_ids: HashSet<&str> = self.resources.iter().map(|r| r.id.as_str()).collect();

        for scene in &self.scenes {
            if let Some(biome) = &scene.biome_id {
                if !biome_ids.contains(biome.as_str()) {
                    problems.push(format!("scene {}: unknown biome {}", scene.key, biome));
                }
            }
        }

        for entry in &self.dialogue {
            if self.scene(&entry.scene_key).is_none() {
                problems.push(format!("dialogue: unknown scene {}", entry.scene_key));
            }
            for line in &entry.lines {
                let context = format!("dialogue {}", entry.scene_key);
                self.check_calls(&context, &line.functions, functions, problems);
                if let Some(condition) = &line.condition {
                    self.check_condition(&context, condition, problems);
                }
            }
        }

        for activity in &self.activities {
            let context = format!("activity {}", activity.id);
            if !biome_ids.contains(activity.biome_id.as_str()) {
                problems.push(format!("{}: unknown biome {}", context, activity.biome_id));
            }

            let mut referenced: Vec<&str> = activity
                .required_resources
                .keys()
                .chain(activity.awarded_resources.keys())
                .map(String::as_str)
                .collect();
            for step in &activity.instructions {
                referenced.extend(step.add_items.keys().map(String::as_str));
                referenced.extend(step.remove_items.keys().map(String::as_str));

                let step_context = format!("{} step {}", context, step.id);
                self.check_calls(&step_context, &step.functions, functions, problems);
                for branch in &step.branches {
                    self.check_condition(&step_context, &branch.condition, problems);
                }
            }
            for resource in referenced {
                if !resource_ids.contains(resource) {
                    problems.push(format!("{}: unknown resource {}", context, resource));
                }
            }
        }
    }

    fn check_calls(
        &self,
        context: &str,
        calls: &[FunctionCall],
        functions: &FunctionRegistry,
        problems: &mut Vec<String>,
    ) {
        for call in calls {
            if let Err(e) = functions.validate(call) {
                problems.push(format!("{}: {}", context, e));
            }
        }
    }

    fn check_condition(&self, context: &str, condition: &Condition, problems: &mut Vec<String>) {
        for (kind, id) in condition.references() {
            let known = match kind {
                "resource" => self.resources.iter().any(|r| r.id == id),
                "activity" => self.activities.iter().any(|a| a.id == id),
                "biome" => self.biomes.iter().any(|b| b.id == id),
                "minigame" => self.minigames.iter().any(|m| m.id == id),
                _ => true,
            };
            if !known {
                problems.push(format!("{}: condition names unknown {} {}", context, kind, id));
            }
        }
    }
}

//=== Helpers =============================================================

fn duplicates<'a>(kind: &str, ids: impl Iterator<Item = &'a str>, problems: &mut Vec<String>) {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            problems.push(format!("duplicate {} id {}", kind, id));
        }
    }
}

fn read_collection<T: DeserializeOwned>(dir: &Path, name: &str) -> Result<Vec<T>, ContentError> {
    let path = dir.join(format!("{}.json", name));
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No {} collection at {}", name, path.display());
            return Ok(Vec::new());
        }
        Err(source) => return Err(ContentError::Io { path, source }),
    };
    serde_json::from_str(&text).map_err(|source| ContentError::Parse { path, source })
}

//=========================================================================
// Unit Tests
//=========================================================================
