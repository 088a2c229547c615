// One game session: the state machine for a single round between two players.
//
// Status only moves forward:
//
//   WaitingToStart --(second player joins)--> InProgress
//   InProgress     --(start)----------------> GameStarted
//   GameStarted    --(timer reaches zero)----> Over      (both traces scored)
//   InProgress / GameStarted --(a seated player leaves)--> Over (forfeit)
//
// An `Over` session is never reopened; the owning `GameArea` replaces it with
// a fresh one on the next join.
//
// Each of the two seats holds a player id, that player's live pixel trace,
// and (once the round is scored) their accuracy. A move replaces the seat's
// whole trace. Clients resend their full trace on a short interval, so the
// last write to arrive wins and stale or duplicate resends are harmless.
//
// Every operation either succeeds or returns a `GameError` with the session
// untouched. Precondition checks therefore all run before the first mutation.
//
// See also: `area.rs`, which routes commands here and records results;
// `scoring.rs` for accuracy; `shape.rs` for `DifficultySelector`.

use crate::config::GameConfig;
use crate::error::GameError;
use crate::prng::GameRng;
use crate::scoring::accuracy_within;
use crate::shape::{Difficulty, DifficultySelector, Shape};
use crate::types::{GameId, Pixel, PlayerId, PlayerSlot};
use serde::{Deserialize, Serialize};

/// Lifecycle of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    /// Fewer than two players seated.
    WaitingToStart,
    /// Both seats filled; players pick a difficulty and start.
    InProgress,
    /// Round running; moves accepted, timer counting down.
    GameStarted,
    /// Round finished or forfeited. Terminal.
    Over,
}

#[derive(Clone, Debug, Default)]
struct Seat {
    player: Option<PlayerId>,
    pixels: Vec<Pixel>,
    accuracy: Option<f64>,
}

#[derive(Clone, Debug)]
pub struct GameSession {
    id: GameId,
    status: GameStatus,
    seats: [Seat; 2],
    difficulty: Difficulty,
    trace_shape: Option<Shape>,
    /// Seconds left in the round. Zero outside `GameStarted`.
    timer: f64,
    winner: Option<PlayerId>,
    config: GameConfig,
}

/// Owned, read-only copy of a session's state for broadcasting.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub id: GameId,
    pub status: GameStatus,
    pub player_one: Option<PlayerId>,
    pub player_two: Option<PlayerId>,
    pub difficulty: Difficulty,
    pub trace_shape: Option<Shape>,
    pub timer: f64,
    pub player_one_pixels: Vec<Pixel>,
    pub player_two_pixels: Vec<Pixel>,
    pub player_one_accuracy: Option<f64>,
    pub player_two_accuracy: Option<f64>,
    pub winner: Option<PlayerId>,
}

fn index(slot: PlayerSlot) -> usize {
    match slot {
        PlayerSlot::One => 0,
        PlayerSlot::Two => 1,
    }
}

impl GameSession {
    pub fn new(id: GameId, config: GameConfig) -> Self {
        Self {
            id,
            status: GameStatus::WaitingToStart,
            seats: Default::default(),
            difficulty: Difficulty::default(),
            trace_shape: None,
            timer: 0.0,
            winner: None,
            config,
        }
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn trace_shape(&self) -> Option<&Shape> {
        self.trace_shape.as_ref()
    }

    pub fn timer(&self) -> f64 {
        self.timer
    }

    pub fn winner(&self) -> Option<&PlayerId> {
        self.winner.as_ref()
    }

    pub fn player(&self, slot: PlayerSlot) -> Option<&PlayerId> {
        self.seats[index(slot)].player.as_ref()
    }

    pub fn pixels(&self, slot: PlayerSlot) -> &[Pixel] {
        &self.seats[index(slot)].pixels
    }

    pub fn accuracy(&self, slot: PlayerSlot) -> Option<f64> {
        self.seats[index(slot)].accuracy
    }

    /// The seat `player` occupies, if any.
    pub fn slot_of(&self, player: &PlayerId) -> Option<PlayerSlot> {
        [PlayerSlot::One, PlayerSlot::Two]
            .into_iter()
            .find(|slot| self.player(*slot) == Some(player))
    }

    fn is_full(&self) -> bool {
        self.seats.iter().all(|s| s.player.is_some())
    }

    fn clear_traces(&mut self) {
        for seat in &mut self.seats {
            seat.pixels.clear();
        }
    }

    /// Seat `player` in the first open slot. Joining again while seated is a
    /// no-op. The second player to sit moves the session to `InProgress`.
    pub fn join(&mut self, player: &PlayerId) -> Result<(), GameError> {
        if self.slot_of(player).is_some() {
            return Ok(());
        }
        if self.status == GameStatus::Over {
            return Err(GameError::IllegalState("game is over".into()));
        }
        let Some(seat) = self.seats.iter_mut().find(|s| s.player.is_none()) else {
            return Err(GameError::IllegalState("game is full".into()));
        };
        seat.player = Some(player.clone());
        tracing::debug!(game = %self.id, %player, "player seated");

        if self.status == GameStatus::WaitingToStart && self.is_full() {
            self.status = GameStatus::InProgress;
        }
        Ok(())
    }

    /// Record a new difficulty. While `InProgress` this also draws a fresh
    /// shape from `selector` and clears both traces; in any other status
    /// only the stored difficulty changes. An unrecognized difficulty
    /// changes nothing.
    pub fn pick_difficulty(
        &mut self,
        difficulty: Difficulty,
        selector: &DifficultySelector,
        rng: &mut GameRng,
    ) {
        if difficulty == Difficulty::Unknown {
            tracing::debug!(game = %self.id, "ignoring unrecognized difficulty");
            return;
        }
        self.difficulty = difficulty;
        if self.status != GameStatus::InProgress {
            return;
        }
        if let Some(shape) = selector.select_shape(difficulty, rng) {
            tracing::debug!(game = %self.id, title = %shape.title(), "trace shape picked");
            self.trace_shape = Some(shape);
            self.clear_traces();
        }
    }

    /// Begin the round: requires both seats filled and a shape picked.
    pub fn start(&mut self) -> Result<(), GameError> {
        if self.status != GameStatus::InProgress {
            return Err(GameError::IllegalState(format!(
                "cannot start a game that is {:?}",
                self.status
            )));
        }
        if !self.is_full() {
            return Err(GameError::IllegalState("two players are required".into()));
        }
        if self.trace_shape.is_none() {
            return Err(GameError::IllegalState("no shape has been picked".into()));
        }
        self.status = GameStatus::GameStarted;
        self.timer = self.config.round_duration_secs;
        self.clear_traces();
        tracing::info!(game = %self.id, timer = self.timer, "round started");
        Ok(())
    }

    /// Replace `slot`'s whole trace with `pixels`. The slot must belong to
    /// `player`, the round must be running, and the trace must stay within
    /// `max_trace_pixels`.
    pub fn apply_move(
        &mut self,
        player: &PlayerId,
        slot: PlayerSlot,
        pixels: Vec<Pixel>,
    ) -> Result<(), GameError> {
        if self.status != GameStatus::GameStarted {
            return Err(GameError::InvalidMove("the round is not running".into()));
        }
        match self.player(slot) {
            None => {
                return Err(GameError::InvalidMove(format!(
                    "slot {} is empty",
                    slot.number()
                )));
            }
            Some(holder) if holder != player => {
                return Err(GameError::InvalidMove(format!(
                    "slot {} belongs to another player",
                    slot.number()
                )));
            }
            Some(_) => {}
        }
        let limit = self.config.max_trace_pixels;
        if pixels.len() > limit {
            return Err(GameError::InvalidMove(format!(
                "trace has {} pixels; at most {limit} are allowed",
                pixels.len()
            )));
        }
        let (width, height) = (self.config.canvas_width, self.config.canvas_height);
        if let Some(bad) = pixels.iter().find(|p| !p.within_canvas(width, height)) {
            return Err(GameError::InvalidMove(format!(
                "pixel ({}, {}) is off the canvas",
                bad.x, bad.y
            )));
        }
        self.seats[index(slot)].pixels = pixels;
        Ok(())
    }

    /// Advance the round clock by `delta_secs`. Returns true if anything
    /// changed. When the clock runs out the session ends and both traces are
    /// scored; equal accuracy is a draw with no winner.
    pub fn tick(&mut self, delta_secs: f64) -> bool {
        if self.status != GameStatus::GameStarted || delta_secs.is_nan() || delta_secs <= 0.0 {
            return false;
        }
        self.timer -= delta_secs;
        if self.timer <= 0.0 {
            self.timer = 0.0;
            self.finish_round();
        }
        true
    }

    fn finish_round(&mut self) {
        let reference = self.trace_shape.as_ref().map(Shape::pixels).unwrap_or(&[]);
        let tolerance = self.config.proximity_tolerance;
        let scores: Vec<f64> = self
            .seats
            .iter()
            .map(|seat| accuracy_within(&seat.pixels, reference, tolerance))
            .collect();
        for (seat, score) in self.seats.iter_mut().zip(&scores) {
            seat.accuracy = Some(*score);
        }

        self.winner = if scores[0] > scores[1] {
            self.seats[0].player.clone()
        } else if scores[1] > scores[0] {
            self.seats[1].player.clone()
        } else {
            None
        };
        self.status = GameStatus::Over;
        tracing::info!(
            game = %self.id,
            player_one_accuracy = scores[0],
            player_two_accuracy = scores[1],
            winner = ?self.winner,
            "round over"
        );
    }

    /// Remove `player` from the session. A seated player leaving a live game
    /// forfeits it to the other seat; before the game fills up the seat is
    /// simply vacated. Leaving a finished game does nothing.
    pub fn leave(&mut self, player: &PlayerId) -> Result<(), GameError> {
        if self.status == GameStatus::Over {
            return Ok(());
        }
        let Some(slot) = self.slot_of(player) else {
            return Err(GameError::IllegalState(format!(
                "{player} is not in this game"
            )));
        };
        match self.status {
            GameStatus::WaitingToStart => {
                self.seats[index(slot)] = Seat::default();
            }
            GameStatus::InProgress | GameStatus::GameStarted => {
                self.winner = self.player(slot.other()).cloned();
                self.status = GameStatus::Over;
                self.timer = 0.0;
                tracing::info!(game = %self.id, %player, winner = ?self.winner, "game forfeited");
            }
            GameStatus::Over => {}
        }
        Ok(())
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let [one, two] = &self.seats;
        GameSnapshot {
            id: self.id,
            status: self.status,
            player_one: one.player.clone(),
            player_two: two.player.clone(),
            difficulty: self.difficulty,
            trace_shape: self.trace_shape.clone(),
            timer: self.timer,
            player_one_pixels: one.pixels.clone(),
            player_two_pixels: two.pixels.clone(),
            player_one_accuracy: one.accuracy,
            player_two_accuracy: two.accuracy,
            winner: self.winner.clone(),
        }
    }
}
