// Protocol messages between trace clients and the relay.
//
// - `ClientMessage`: client -> relay. After `Hello`, a client enters areas and
//   sends `AreaCommand`s to them, each tagged with a `RequestId`.
// - `ServerMessage`: relay -> client. Every command gets exactly one
//   `CommandOk` or `CommandFailed` reply, sent only to the client that issued
//   it. State changes are broadcast as `AreaChanged` to every connected
//   client, after the reply.
//
// Game payloads (`AreaCommand`, `CommandResponse`, `AreaUpdate`, `GameError`)
// are the game crate's own serde types, embedded as-is.

use serde::{Deserialize, Serialize};
use trace_duel_game::{AreaCommand, AreaId, AreaUpdate, CommandResponse, GameError, PlayerId};

use crate::types::RequestId;

/// Version a client must announce in `Hello`.
pub const PROTOCOL_VERSION: u32 = 1;

/// Messages sent by a client to the relay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ClientMessage {
    /// Handshake. Must be the first message on a connection.
    Hello {
        protocol_version: u32,
        player_name: String,
    },
    /// Step into an area: become an occupant, visible by name.
    EnterArea { area_id: AreaId },
    /// Step out of an area. Forfeits any live game held there.
    ExitArea { area_id: AreaId },
    /// A game command for one area.
    Command {
        request_id: RequestId,
        area_id: AreaId,
        command: AreaCommand,
    },
    /// Closing the connection.
    Goodbye,
}

/// Messages sent by the relay to a client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ServerMessage {
    /// Handshake accepted.
    Welcome {
        player_id: PlayerId,
        players: Vec<PlayerInfo>,
        /// Current state of every hosted area.
        areas: Vec<AreaUpdate>,
    },
    /// Handshake refused; the connection is closed after this.
    Rejected { reason: String },
    /// Another player connected.
    PlayerJoined { player: PlayerInfo },
    /// A player disconnected.
    PlayerLeft { player_id: PlayerId, name: String },
    /// The command with `request_id` succeeded.
    CommandOk {
        request_id: RequestId,
        response: CommandResponse,
    },
    /// The command with `request_id` was rejected; nothing changed.
    CommandFailed {
        request_id: RequestId,
        error: GameError,
    },
    /// An area's state changed.
    AreaChanged { update: Box<AreaUpdate> },
}

/// Public identity of a connected player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub name: String,
}
