//=========================================================================
// Sil̕ə's Valley Library Root
//
// Scene orchestration core for a language-learning game. The crate owns
// content, player progress, scene navigation, dialogue, activities and
// vocabulary minigames. A presentation layer plugs in through the
// `Presenter` trait and a channel of `PlatformEvent`s.
//
// Typical usage:
// ```no_run
// use sila_valley::{FunctionRegistry, GameBuilder, GameDataStore};
//
// fn main() {
//     let functions = FunctionRegistry::with_builtins();
//     let data = GameDataStore::load_dir("content", &functions).unwrap();
//     let mut game = GameBuilder::new(data).build().unwrap();
//     game.start("Village", None).unwrap();
//     game.run();
// }
// ```
//
//=========================================================================

//--- Public Modules ------------------------------------------------------
//
// `core` holds the runtime machinery (director, scheduler, input routing,
// outbox). The remaining modules are the game domain built on top of it.
//
pub mod activity;
pub mod config;
pub mod core;
pub mod data;
pub mod dialogue;
pub mod events;
pub mod functions;
pub mod prelude;
pub mod presentation;
pub mod progress;
pub mod scenes;
pub mod vocab;

//--- Internal Modules ----------------------------------------------------
//
// `engine` defines the builder and the tick loop.
//
mod engine;

#[cfg(test)]
mod testing;

//--- Public Exports ------------------------------------------------------

pub use crate::config::GameConfig;
pub use crate::core::error::{GameError, GameResult};
pub use crate::data::GameDataStore;
pub use crate::engine::{Game, GameBuilder};
pub use crate::functions::FunctionRegistry;
pub use crate::progress::{FileStorage, MemoryStorage, PlayerProgressStore};
