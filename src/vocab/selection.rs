//=========================================================================
// Word Selection
//=========================================================================
//
// Deterministic priority selection of the words a minigame round uses.
//
// 1. Filter the bank by morphological category, semantic category and
//    game type.
// 2. Rank words the player has history with: more mistakes first, then
//    the most recent mistake, then the most recent encounter, then bank
//    order.
// 3. Pad with the words that have no history, in bank order.
// 4. Stop at MAX_WORDS.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cmp::Reverse;

use chrono::{DateTime, Utc};

//=== Internal Dependencies ===============================================

use crate::data::{GameType, VocabularyMinigame, VocabularyWord};

/// Words per round.
pub const MAX_WORDS: usize = 8;

//=== WordFilter ==========================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordFilter {
    pub morphological_category: Option<String>,
    pub semantic_category: Option<String>,
    pub game_type: GameType,
}

impl WordFilter {
    pub fn for_minigame(game: &VocabularyMinigame) -> Self {
        Self {
            morphological_category: game.morphological_category.clone(),
            semantic_category: game.semantic_category.clone(),
            game_type: game.game_type,
        }
    }

    /// Absent categories match every word.
    pub fn matches(&self, word: &VocabularyWord) -> bool {
        self.morphological_category
            .as_ref()
            .map_or(true, |m| &word.morphological_category == m)
            && self
                .semantic_category
                .as_ref()
                .map_or(true, |s| word.semantic_categories.contains(s))
            && word.minigames.contains(self.game_type.as_str())
    }
}

//=== Selection ===========================================================

fn has_history(word: &VocabularyWord) -> bool {
    word.num_times_incorrect > 0
        || word.last_date_incorrect.is_some()
        || word.last_date_encountered.is_some()
}

/// Milliseconds since `then`; never-seen sorts last.
fn age_ms(then: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i64 {
    match then {
        Some(then) => (now - then).num_milliseconds().max(0),
        None => i64::MAX,
    }
}

/// Picks up to [`MAX_WORDS`] words for a round. Same bank, filter and
/// `now` always give the same ordered result.
pub fn select_words_priority_queue(
    bank: &[VocabularyWord],
    filter: &WordFilter,
    now: DateTime<Utc>,
) -> Vec<VocabularyWord> {
    let filtered: Vec<(usize, &VocabularyWord)> = bank
        .iter()
        .enumerate()
        .filter(|(_, w)| filter.matches(w))
        .collect();

    let mut ranked: Vec<&(usize, &VocabularyWord)> =
        filtered.iter().filter(|(_, w)| has_history(w)).collect();
    ranked.sort_by_key(|(index, w)| {
        (
            Reverse(w.num_times_incorrect),
            age_ms(w.last_date_incorrect, now),
            age_ms(w.last_date_encountered, now),
            *index,
        )
    });

    ranked
        .into_iter()
        .chain(filtered.iter().filter(|(_, w)| !has_history(w)))
        .take(MAX_WORDS)
        .map(|(_, w)| (*w).clone())
        .collect()
}

//=========================================================================
// Unit Tests
//=========================================================================
