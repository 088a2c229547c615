// Core value types shared by the session, the area, and the wire protocol.
//
// `Pixel` is a canvas coordinate, `PlayerId` is the host application's opaque
// player identifier, `GameId` names one session (one round between two
// players), and `PlayerSlot` is one of the two fixed seats. All types derive
// or implement serde so they can travel inside protocol messages unchanged.

use crate::prng::GameRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A single canvas coordinate. Raw mouse positions are scaled to canvas
/// space by the client, so components are fractional.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pixel {
    pub x: f64,
    pub y: f64,
}

impl Pixel {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to `other`.
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// True if both components are finite and inside `[0, width] x [0, height]`.
    pub fn within_canvas(self, width: f64, height: f64) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && (0.0..=width).contains(&self.x)
            && (0.0..=height).contains(&self.y)
    }
}

/// Opaque identifier the hosting application assigns to a player.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of an interactable area hosting at most one live game.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AreaId(pub String);

impl AreaId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for AreaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Game ids
// ---------------------------------------------------------------------------

/// Identifier of one game session, drawn from the area's `GameRng`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GameId(u64);

impl GameId {
    pub fn new(rng: &mut GameRng) -> Self {
        Self(rng.next_u64())
    }

    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Parse the 16-digit hex form produced by `Display`.
    pub fn parse(s: &str) -> Option<Self> {
        if s.len() != 16 {
            return None;
        }
        u64::from_str_radix(s, 16).ok().map(Self)
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl fmt::Debug for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GameId({self})")
    }
}

// Serialized as the hex string: browser clients cannot hold a full u64 in a
// JSON number without losing precision.
impl Serialize for GameId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for GameId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        GameId::parse(&s).ok_or_else(|| serde::de::Error::custom("invalid game id"))
    }
}

// ---------------------------------------------------------------------------
// Player slots
// ---------------------------------------------------------------------------

/// One of the two fixed seats in a session. On the wire it is the number
/// `1` or `2`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PlayerSlot {
    One,
    Two,
}

impl PlayerSlot {
    pub fn number(self) -> u8 {
        match self {
            PlayerSlot::One => 1,
            PlayerSlot::Two => 2,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(PlayerSlot::One),
            2 => Some(PlayerSlot::Two),
            _ => None,
        }
    }

    pub fn other(self) -> Self {
        match self {
            PlayerSlot::One => PlayerSlot::Two,
            PlayerSlot::Two => PlayerSlot::One,
        }
    }
}

impl Serialize for PlayerSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.number())
    }
}

impl<'de> Deserialize<'de> for PlayerSlot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let n = u8::deserialize(deserializer)?;
        PlayerSlot::from_number(n)
            .ok_or_else(|| serde::de::Error::custom(format!("player slot must be 1 or 2, got {n}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_id_string_roundtrip() {
        let mut rng = GameRng::new(5);
        let id = GameId::new(&mut rng);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let back: GameId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn game_id_rejects_garbage() {
        assert!(serde_json::from_str::<GameId>("\"not-a-game\"").is_err());
        assert!(GameId::parse("abc").is_none());
    }

    #[test]
    fn player_slot_is_a_number_on_the_wire() {
        assert_eq!(serde_json::to_string(&PlayerSlot::Two).unwrap(), "2");
        assert_eq!(serde_json::from_str::<PlayerSlot>("1").unwrap(), PlayerSlot::One);
        assert!(serde_json::from_str::<PlayerSlot>("3").is_err());
    }

    #[test]
    fn pixel_canvas_bounds() {
        assert!(Pixel::new(0.0, 400.0).within_canvas(400.0, 400.0));
        assert!(!Pixel::new(-0.5, 10.0).within_canvas(400.0, 400.0));
        assert!(!Pixel::new(10.0, f64::NAN).within_canvas(400.0, 400.0));
        assert!(!Pixel::new(f64::INFINITY, 1.0).within_canvas(400.0, 400.0));
    }
}
