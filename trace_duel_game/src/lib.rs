// trace_duel_game: game logic for the Trace Duel minigame.
//
// Two players race to trace a reference outline on a shared canvas before a
// countdown runs out. When the clock hits zero each trace is scored by how
// much of the outline it covers, and the higher score wins. This crate holds
// the authoritative state for that exchange. It does no networking and no
// rendering; the relay crate (`trace_duel_relay`) feeds it commands and clock
// ticks and broadcasts the resulting `AreaUpdate`s.
//
// Module overview:
// - `types.rs`:    Value types: `Pixel`, `PlayerId`, `AreaId`, `GameId`,
//                  `PlayerSlot`.
// - `prng.rs`:     `GameRng`, a small seedable generator for session ids and
//                  shape picks. Seeded per area so tests are reproducible.
// - `shape.rs`:    `Shape`, `ShapeTitle`, `Difficulty`, the `ShapeProvider`
//                  trait, and `DifficultySelector` (tier -> random title).
// - `catalog.rs`:  `OutlineCatalog`, the built-in deterministic provider.
// - `scoring.rs`:  Coverage accuracy of a trace against a reference.
// - `session.rs`:  `GameSession`, the per-round state machine
//                  (WaitingToStart -> InProgress -> GameStarted -> Over).
// - `area.rs`:     `GameArea`, which owns the live session, routes
//                  `AreaCommand`s, records match history, and publishes
//                  change notifications.
// - `config.rs`:   `GameConfig` (round length, tolerance, canvas size),
//                  loadable from JSON.
// - `error.rs`:    `GameError` (rejected commands) and `ConfigError`.
//
// Concurrency: nothing here is shared. Each `GameArea` is owned by exactly one
// thread, which applies commands and ticks in arrival order.

pub mod area;
pub mod catalog;
pub mod config;
pub mod error;
pub mod prng;
pub mod scoring;
pub mod session;
pub mod shape;
pub mod types;

pub use area::{AreaCommand, AreaUpdate, CommandResponse, GameArea, MatchResult, PixelMove};
pub use catalog::OutlineCatalog;
pub use config::GameConfig;
pub use error::{ConfigError, GameError};
pub use prng::GameRng;
pub use scoring::{PROXIMITY_TOLERANCE, accuracy, accuracy_within};
pub use session::{GameSession, GameSnapshot, GameStatus};
pub use shape::{
    Difficulty, DifficultySelector, FixedShapes, Shape, ShapeProvider, ShapeTitle,
    SharedShapeProvider,
};
pub use types::{AreaId, GameId, Pixel, PlayerId, PlayerSlot};
