// trace_duel_protocol: wire protocol between trace clients and the relay.
//
// Shared by the relay (`trace_duel_relay`) and anything that talks to it.
// Depends on `trace_duel_game` only for the serde types that ride inside
// messages; it contains no game logic.
//
// Module overview:
// - `types.rs`:    `RequestId`, the client-chosen command correlation tag.
// - `message.rs`:  `ClientMessage` / `ServerMessage`, `PlayerInfo`, and
//                  `PROTOCOL_VERSION`.
// - `framing.rs`:  4-byte big-endian length prefix + JSON payload over any
//                  `Read` / `Write`, capped at `MAX_MESSAGE_SIZE`.
//
// Blocking `std::io` only. The relay is thread-per-reader and has no use for
// an async runtime.

pub mod framing;
pub mod message;
pub mod types;

pub use framing::{MAX_MESSAGE_SIZE, read_message, write_message};
pub use message::{ClientMessage, PROTOCOL_VERSION, PlayerInfo, ServerMessage};
pub use types::RequestId;
