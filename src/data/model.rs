//=========================================================================
// Content Model
//=========================================================================
//
// Static, read-only records loaded once at boot. Field names follow the
// camelCase content files; only the shape needed to drive state
// transitions is modeled.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

//=== Internal Dependencies ===============================================

use super::condition::Condition;
use crate::functions::FunctionCall;
use crate::presentation::Point;

/// resource id → quantity.
pub type ResourceMap = BTreeMap<String, u32>;

//=== LocalizedText =======================================================

/// Text keyed by language code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalizedText(pub BTreeMap<String, String>);

impl LocalizedText {
    pub fn single(language: &str, text: &str) -> Self {
        let mut map = BTreeMap::new();
        map.insert(language.to_string(), text.to_string());
        Self(map)
    }

    pub fn get(&self, language: &str) -> Option<&str> {
        self.0.get(language).map(String::as_str)
    }

    /// Text in `language`, falling back to English, then to any language.
    pub fn resolve(&self, language: &str) -> &str {
        self.get(language)
            .or_else(|| self.get("en"))
            .or_else(|| self.0.values().next().map(String::as_str))
            .unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

//=== Scenes ==============================================================

/// Metadata for a primary scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneMeta {
    /// Key of the presentation unit that runs this scene.
    pub key: String,
    #[serde(default)]
    pub reference_name: Option<String>,
    #[serde(default)]
    pub constructor_identifier: Option<String>,
    /// Entering this scene makes the biome current.
    #[serde(default)]
    pub biome_id: Option<String>,
    /// Companion UI layer shown alongside this scene.
    #[serde(default)]
    pub companion_ui: Option<String>,
}

//=== Dialogue ============================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueLine {
    #[serde(default)]
    pub speaker: Option<String>,
    pub text: LocalizedText,
    #[serde(default)]
    pub condition: Option<Condition>,
    /// Run when the line is displayed.
    #[serde(default)]
    pub functions: Vec<FunctionCall>,
}

/// Ordered lines attached to one scene key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueEntry {
    pub scene_key: String,
    pub lines: Vec<DialogueLine>,
}

//=== Biomes & Resources ==================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Biome {
    pub id: String,
    pub reference_name: String,
    #[serde(default)]
    pub names: LocalizedText,
    #[serde(default)]
    pub unlocked: bool,
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: String,
    #[serde(default)]
    pub names: LocalizedText,
    #[serde(default)]
    pub image: Option<String>,
}

//=== Activities ==========================================================

/// Role of an interactive object in a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectRole {
    Agent,
    Target,
    Decoy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractiveObjectSpec {
    pub id: String,
    pub role: ObjectRole,
    pub position: Point,
    pub size_percent: f32,
    #[serde(default)]
    pub depth: i32,
    #[serde(default)]
    pub image: Option<String>,
}

/// How the player interacts with a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Drag,
    Select,
    Special,
    End,
    #[serde(other)]
    Unrecognized,
}

/// Successor of a step: another step id or the literal `"end"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NextStep {
    #[default]
    End,
    Step(String),
}

impl From<String> for NextStep {
    fn from(value: String) -> Self {
        if value == "end" {
            NextStep::End
        } else {
            NextStep::Step(value)
        }
    }
}

impl From<NextStep> for String {
    fn from(value: NextStep) -> Self {
        match value {
            NextStep::End => "end".to_string(),
            NextStep::Step(id) => id,
        }
    }
}

impl fmt::Display for NextStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NextStep::End => f.write_str("end"),
            NextStep::Step(id) => f.write_str(id),
        }
    }
}

/// Conditional successor; the first branch whose condition holds wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub condition: Condition,
    pub next: NextStep,
}

/// One step of an activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instruction {
    pub id: String,
    pub text: LocalizedText,
    #[serde(default)]
    pub hint: Option<LocalizedText>,
    pub action_type: ActionType,
    #[serde(default)]
    pub objects: Vec<InteractiveObjectSpec>,
    #[serde(default, rename = "nextStepId")]
    pub next_step: NextStep,
    #[serde(default)]
    pub branches: Vec<Branch>,
    #[serde(default)]
    pub add_items: ResourceMap,
    #[serde(default)]
    pub remove_items: ResourceMap,
    #[serde(default)]
    pub functions: Vec<FunctionCall>,
    /// Object id of the correct choice for `select` steps.
    #[serde(default)]
    pub correct_choice: Option<String>,
    /// Text shown for `special` steps.
    #[serde(default)]
    pub feedback: Option<LocalizedText>,
}

impl Instruction {
    /// Every successor this step can lead to.
    pub fn successors(&self) -> impl Iterator<Item = &NextStep> {
        self.branches
            .iter()
            .map(|b| &b.next)
            .chain(std::iter::once(&self.next_step))
    }

    /// The object id the player must select on a `select` step.
    pub fn select_target(&self) -> Option<&str> {
        self.correct_choice.as_deref().or_else(|| {
            self.objects
                .iter()
                .find(|o| o.role == ObjectRole::Target)
                .map(|o| o.id.as_str())
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraditionalActivity {
    pub id: String,
    pub biome_id: String,
    #[serde(default)]
    pub names: LocalizedText,
    #[serde(default)]
    pub required_resources: ResourceMap,
    #[serde(default)]
    pub awarded_resources: ResourceMap,
    /// Playable from the start regardless of inventory.
    #[serde(default)]
    pub unlocked: bool,
    /// Entry step; defaults to the first instruction.
    #[serde(default)]
    pub start_step_id: Option<String>,
    pub instructions: Vec<Instruction>,
}

//=== Vocabulary ==========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameType {
    Wheel,
    Spawn,
}

impl GameType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameType::Wheel => "wheel",
            GameType::Spawn => "spawn",
        }
    }
}

/// Grading rule of the wheel game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WheelMode {
    /// Each drop is graded immediately.
    #[default]
    Practice,
    /// Any slot accepts any slice; graded on submit.
    Challenge,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyMinigame {
    pub id: String,
    #[serde(default)]
    pub reference_name: Option<String>,
    #[serde(default)]
    pub names: LocalizedText,
    pub game_type: GameType,
    #[serde(default)]
    pub mode: WheelMode,
    #[serde(default)]
    pub morphological_category: Option<String>,
    #[serde(default)]
    pub semantic_category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyWord {
    pub id: String,
    pub morphological_category: String,
    #[serde(default)]
    pub semantic_categories: BTreeSet<String>,
    /// Game types this word may appear in.
    #[serde(default)]
    pub minigames: BTreeSet<String>,
    #[serde(default)]
    pub num_times_incorrect: u32,
    #[serde(default)]
    pub last_date_incorrect: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_date_encountered: Option<DateTime<Utc>>,
    pub words: LocalizedText,
    #[serde(default)]
    pub images: Vec<String>,
}

//=== Content Bundle ======================================================

/// Every static content collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContentBundle {
    pub scenes: Vec<SceneMeta>,
    pub dialogue: Vec<DialogueEntry>,
    pub biomes: Vec<Biome>,
    pub resources: Vec<Resource>,
    pub traditional_activities: Vec<TraditionalActivity>,
    pub vocabulary_minigames: Vec<VocabularyMinigame>,
    pub vocabulary: Vec<VocabularyWord>,
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn localized_text_falls_back_to_english() {
        let mut text = LocalizedText::single("en", "Cedar bark");
        assert_eq!(text.resolve("hur"), "Cedar bark");
        text.0.insert("hur".into(), "sləx̌əls".into());
        assert_eq!(text.resolve("hur"), "sləx̌əls");
        assert_eq!(LocalizedText::default().resolve("en"), "");
    }

    #[test]
    fn next_step_parses_end_literal() {
        let end: NextStep = serde_json::from_str(r#""end""#).unwrap();
        let step: NextStep = serde_json::from_str(r#""step2""#).unwrap();
        assert_eq!(end, NextStep::End);
        assert_eq!(step, NextStep::Step("step2".into()));
        assert_eq!(serde_json::to_string(&end).unwrap(), r#""end""#);
    }

    #[test]
    fn unknown_action_type_is_kept_for_validation() {
        let json = r#"{ "id": "s1", "text": { "en": "Do it" }, "actionType": "juggle" }"#;
        let instruction: Instruction = serde_json::from_str(json).unwrap();
        assert_eq!(instruction.action_type, ActionType::Unrecognized);
        assert_eq!(instruction.next_step, NextStep::End);
    }

    #[test]
    fn instruction_parses_full_shape() {
        let json = r#"{
            "id": "strip",
            "text": { "en": "Strip the bark" },
            "actionType": "drag",
            "objects": [
                { "id": "knife", "role": "agent", "position": { "x": 0.2, "y": 0.5 }, "sizePercent": 10 },
                { "id": "tree", "role": "target", "position": { "x": 0.7, "y": 0.5 }, "sizePercent": 30, "depth": 1 }
            ],
            "nextStepId": "dry",
            "addItems": { "bark": 1 },
            "functions": [ { "function": "wait", "args": ["500"] } ]
        }"#;
        let instruction: Instruction = serde_json::from_str(json).unwrap();
        assert_eq!(instruction.objects.len(), 2);
        assert_eq!(instruction.objects[0].role, ObjectRole::Agent);
        assert_eq!(instruction.next_step, NextStep::Step("dry".into()));
        assert_eq!(instruction.add_items.get("bark"), Some(&1));
        assert_eq!(instruction.functions[0].function, "wait");
    }

    #[test]
    fn successors_list_branches_then_default() {
        let json = r#"{
            "id": "fork", "text": {}, "actionType": "special",
            "branches": [ { "condition": { "type": "always" }, "next": "a" } ],
            "nextStepId": "b"
        }"#;
        let instruction: Instruction = serde_json::from_str(json).unwrap();
        let next: Vec<String> = instruction.successors().map(|n| n.to_string()).collect();
        assert_eq!(next, vec!["a", "b"]);
    }

    #[test]
    fn select_target_prefers_explicit_choice() {
        let json = r#"{
            "id": "pick", "text": {}, "actionType": "select",
            "objects": [
                { "id": "a", "role": "target", "position": { "x": 0.1, "y": 0.1 }, "sizePercent": 5 },
                { "id": "b", "role": "decoy", "position": { "x": 0.3, "y": 0.1 }, "sizePercent": 5 }
            ]
        }"#;
        let mut instruction: Instruction = serde_json::from_str(json).unwrap();
        assert_eq!(instruction.select_target(), Some("a"));
        instruction.correct_choice = Some("b".into());
        assert_eq!(instruction.select_target(), Some("b"));
    }
}
