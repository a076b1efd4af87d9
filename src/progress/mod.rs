//=========================================================================
// Player Progress
//=========================================================================
//
// Mutable per-player state and its persistence.
//
// Architecture:
//   PlayerProgressStore
//     ├─ record: PlayerProgress      (inventory, unlocks, settings, vocab)
//     ├─ storage: dyn ProgressStorage (FileStorage | MemoryStorage)
//     └─ subscribers: crossbeam Senders of ProgressChange
//
//=========================================================================

//=== Module Declarations =================================================

mod model;
mod storage;
mod store;

//=== Public API ==========================================================

pub use model::{Completion, PlayerProgress, Settings, VocabEncounter};
pub use storage::{FileStorage, MemoryStorage, ProgressStorage};
pub use store::{PlayerProgressStore, ProgressChange};
