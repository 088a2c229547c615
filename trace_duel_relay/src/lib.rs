// trace_duel_relay: TCP relay hosting Trace Duel game areas.
//
// Unlike a pure message broker, this relay is authoritative: it owns every
// `GameArea`, applies player commands to them, runs the round clock, and
// broadcasts the resulting state. Clients only send input and render what
// they are told.
//
// Module overview:
// - `hub.rs`:     Connected players and hosted areas. Routes commands,
//                 replies to the sender, fans area updates out to everyone.
//                 The core data structure that `server.rs` drives.
// - `server.rs`:  TCP listener, one reader thread per client, and the main
//                 event loop that owns the `Hub` and ticks the round clock.
// - `client.rs`:  `NetClient`, a blocking client with a background reader
//                 thread. Used by the integration tests and by tools.
//
// Dependencies: `trace_duel_protocol` for messages and framing,
// `trace_duel_game` for the game itself, `tracing` for logs. The binary in
// `main.rs` installs the `tracing-subscriber` output.

pub mod client;
pub mod hub;
pub mod server;

pub use server::{RelayConfig, RelayHandle, start_relay};
