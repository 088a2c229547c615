// Protocol-level identifiers.
//
// Player, area, and game ids live in `trace_duel_game::types` because the game
// logic keys on them too. Only ids that exist purely for the wire are defined
// here.

use serde::{Deserialize, Serialize};

/// Client-chosen tag echoed back in the `CommandOk` / `CommandFailed` reply,
/// so a client with several commands in flight can match answers to
/// requests. The relay never interprets it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u64);

impl RequestId {
    /// The id following this one.
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}
