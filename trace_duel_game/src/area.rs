// Game area: the per-interactable registry and command router.
//
// A `GameArea` owns at most one live `GameSession`, the roster of occupants
// standing in the area (used to turn player ids into display names), and the
// append-only match history shown on the leaderboard.
//
// Command routing (`handle_command`):
// - `JoinGame` reuses the current session, or creates a fresh one when there
//   is none or the current one is `Over`, then seats the caller.
// - Every other command names a `game_id`. No session at all is
//   `GameNotInProgress`; a different id is `GameIdMismatch`.
// - `Unknown` (an unrecognized `type` tag on the wire) is `InvalidCommand`.
//
// After every successful command, timer tick, or roster change the area
// publishes one `AreaUpdate` to every subscriber. Subscribers are plain
// `mpsc` receivers; a dropped receiver is pruned on the next publish. A
// rejected command publishes nothing and leaves the session untouched.
//
// History: the first time the area observes its session in `Over`, it
// appends one `MatchResult` keyed by the session id. Later observations of the
// same finished session find the id already present and record nothing.
//
// Single writer: every method takes `&mut self`, and the relay drives all
// areas from one thread. Commands and ticks are therefore applied one at a
// time and never interleave inside a transition.

use crate::config::GameConfig;
use crate::error::GameError;
use crate::prng::GameRng;
use crate::session::{GameSession, GameSnapshot, GameStatus};
use crate::shape::{Difficulty, DifficultySelector, SharedShapeProvider};
use crate::types::{AreaId, GameId, Pixel, PlayerId, PlayerSlot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::mpsc::{self, Receiver, Sender};

/// Commands a player can send to an area. Tagged by `type` on the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AreaCommand {
    JoinGame,
    StartGame {
        #[serde(rename = "gameID")]
        game_id: GameId,
    },
    PickDifficulty {
        #[serde(rename = "gameID")]
        game_id: GameId,
        #[serde(rename = "gameDifficulty")]
        game_difficulty: Difficulty,
    },
    GameMove {
        #[serde(rename = "gameID")]
        game_id: GameId,
        #[serde(rename = "move")]
        game_move: PixelMove,
    },
    LeaveGame {
        #[serde(rename = "gameID")]
        game_id: GameId,
    },
    #[serde(other)]
    Unknown,
}

/// A player's full current trace for one slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PixelMove {
    pub player_slot: PlayerSlot,
    pub pixels: Vec<Pixel>,
}

/// Result of a successful command.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandResponse {
    /// `JoinGame`: the session the caller is now part of.
    GameJoined {
        #[serde(rename = "gameID")]
        game_id: GameId,
    },
    /// Every other command.
    Done {},
}

/// Outcome of one finished session, keyed by display name. The winner
/// scores 1; the loser, and both players in a draw, score 0.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    #[serde(rename = "gameID")]
    pub game_id: GameId,
    pub scores: BTreeMap<String, u8>,
}

/// Change notification: everything a client needs to redraw the area.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AreaUpdate {
    pub area_id: AreaId,
    pub game: Option<GameSnapshot>,
    /// Display names of occupants not seated in the current game.
    pub observers: Vec<String>,
    pub history: Vec<MatchResult>,
}

pub struct GameArea {
    id: AreaId,
    config: GameConfig,
    selector: DifficultySelector,
    rng: GameRng,
    game: Option<GameSession>,
    occupants: BTreeMap<PlayerId, String>,
    history: Vec<MatchResult>,
    subscribers: Vec<Sender<AreaUpdate>>,
}

/// The live session, provided `game_id` names it.
fn matching_game(
    game: &mut Option<GameSession>,
    game_id: GameId,
) -> Result<&mut GameSession, GameError> {
    let game = game.as_mut().ok_or(GameError::GameNotInProgress)?;
    if game.id() != game_id {
        return Err(GameError::GameIdMismatch);
    }
    Ok(game)
}

impl GameArea {
    pub fn new(id: AreaId, config: GameConfig, provider: SharedShapeProvider, seed: u64) -> Self {
        Self {
            id,
            config,
            selector: DifficultySelector::new(provider),
            rng: GameRng::new(seed),
            game: None,
            occupants: BTreeMap::new(),
            history: Vec::new(),
            subscribers: Vec::new(),
        }
    }

    pub fn id(&self) -> &AreaId {
        &self.id
    }

    pub fn game(&self) -> Option<&GameSession> {
        self.game.as_ref()
    }

    /// Finished matches, oldest first.
    pub fn history(&self) -> &[MatchResult] {
        &self.history
    }

    /// Receive an `AreaUpdate` after every change from now on.
    pub fn subscribe(&mut self) -> Receiver<AreaUpdate> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    /// Apply `command` on behalf of `player`.
    pub fn handle_command(
        &mut self,
        player: &PlayerId,
        command: AreaCommand,
    ) -> Result<CommandResponse, GameError> {
        tracing::debug!(area = %self.id, %player, ?command, "command");
        let response = match command {
            AreaCommand::JoinGame => {
                let reuse = self
                    .game
                    .as_ref()
                    .is_some_and(|g| g.status() != GameStatus::Over);
                if !reuse {
                    let id = GameId::new(&mut self.rng);
                    tracing::info!(area = %self.id, game = %id, "new game session");
                    self.game = Some(GameSession::new(id, self.config.clone()));
                }
                let game = self.game.as_mut().ok_or(GameError::GameNotInProgress)?;
                game.join(player)?;
                CommandResponse::GameJoined { game_id: game.id() }
            }
            AreaCommand::StartGame { game_id } => {
                matching_game(&mut self.game, game_id)?.start()?;
                CommandResponse::Done {}
            }
            AreaCommand::PickDifficulty {
                game_id,
                game_difficulty,
            } => {
                let game = matching_game(&mut self.game, game_id)?;
                game.pick_difficulty(game_difficulty, &self.selector, &mut self.rng);
                CommandResponse::Done {}
            }
            AreaCommand::GameMove { game_id, game_move } => {
                let game = matching_game(&mut self.game, game_id)?;
                game.apply_move(player, game_move.player_slot, game_move.pixels)?;
                CommandResponse::Done {}
            }
            AreaCommand::LeaveGame { game_id } => {
                matching_game(&mut self.game, game_id)?.leave(player)?;
                CommandResponse::Done {}
            }
            AreaCommand::Unknown => return Err(GameError::InvalidCommand),
        };
        self.state_updated();
        Ok(response)
    }

    /// Advance the round clock. Publishes and returns true if the session
    /// changed.
    pub fn tick(&mut self, delta_secs: f64) -> bool {
        let changed = self.game.as_mut().is_some_and(|g| g.tick(delta_secs));
        if changed {
            self.state_updated();
        }
        changed
    }

    /// A player entered the area.
    pub fn add_occupant(&mut self, player: PlayerId, name: impl Into<String>) {
        self.occupants.insert(player, name.into());
        self.state_updated();
    }

    /// A player left the area. If they were seated in a live game they leave
    /// it first, which forfeits a game that had already filled up.
    pub fn remove_occupant(&mut self, player: &PlayerId) {
        let seated = self
            .game
            .as_mut()
            .filter(|g| g.slot_of(player).is_some());
        if let Some(game) = seated {
            // Only a non-player can fail to leave.
            let _ = game.leave(player);
        }
        // Record while the departing player's name still resolves.
        self.record_result();
        self.occupants.remove(player);
        self.state_updated();
    }

    /// True when the area holds nothing worth keeping: no occupants, no
    /// seated player, and no recorded matches.
    pub fn is_idle(&self) -> bool {
        self.occupants.is_empty()
            && self.history.is_empty()
            && self.game.as_ref().is_none_or(|g| {
                g.player(PlayerSlot::One).is_none() && g.player(PlayerSlot::Two).is_none()
            })
    }

    /// Display name for `player`, if they are still in the area.
    pub fn resolve_name(&self, player: &PlayerId) -> Option<&str> {
        self.occupants.get(player).map(String::as_str)
    }

    fn display_name(&self, player: &PlayerId) -> String {
        self.resolve_name(player)
            .map(str::to_owned)
            .unwrap_or_else(|| player.to_string())
    }

    /// Current state as a change notification.
    pub fn update(&self) -> AreaUpdate {
        let observers = self
            .occupants
            .iter()
            .filter(|(id, _)| {
                self.game
                    .as_ref()
                    .is_none_or(|g| g.slot_of(id).is_none())
            })
            .map(|(_, name)| name.clone())
            .collect();
        AreaUpdate {
            area_id: self.id.clone(),
            game: self.game.as_ref().map(GameSession::snapshot),
            observers,
            history: self.history.clone(),
        }
    }

    fn state_updated(&mut self) {
        self.record_result();
        self.publish();
    }

    /// Append the current session's result if it is `Over` and not yet in
    /// the history.
    fn record_result(&mut self) {
        let Some(game) = self.game.as_ref() else {
            return;
        };
        if game.status() != GameStatus::Over
            || self.history.iter().any(|r| r.game_id == game.id())
        {
            return;
        }
        let (Some(one), Some(two)) = (game.player(PlayerSlot::One), game.player(PlayerSlot::Two))
        else {
            return;
        };
        let winner = game.winner();
        let mut scores = BTreeMap::new();
        for player in [one, two] {
            let score = u8::from(winner == Some(player));
            scores.insert(self.display_name(player), score);
        }
        tracing::info!(area = %self.id, game = %game.id(), ?scores, "match recorded");
        self.history.push(MatchResult {
            game_id: game.id(),
            scores,
        });
    }

    fn publish(&mut self) {
        if self.subscribers.is_empty() {
            return;
        }
        let update = self.update();
        self.subscribers.retain(|tx| tx.send(update.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{FixedShapes, ShapeTitle};
    use std::sync::Arc;

    fn reference() -> Vec<Pixel> {
        (0..30)
            .map(|i| Pixel::new(50.0 + f64::from(i), 80.0))
            .collect()
    }

    fn area() -> GameArea {
        let mut shapes = FixedShapes::new();
        for title in ShapeTitle::ALL {
            shapes = shapes.with(title, reference());
        }
        GameArea::new(
            AreaId::new("duel-1"),
            GameConfig::default(),
            Arc::new(shapes),
            17,
        )
    }

    fn p(id: &str) -> PlayerId {
        PlayerId::new(id)
    }

    fn join(area: &mut GameArea, player: &str) -> GameId {
        match area.handle_command(&p(player), AreaCommand::JoinGame) {
            Ok(CommandResponse::GameJoined { game_id }) => game_id,
            other => panic!("expected GameJoined, got {other:?}"),
        }
    }

    fn ready(area: &mut GameArea) -> GameId {
        let id = join(area, "alice");
        assert_eq!(join(area, "bob"), id);
        area.handle_command(
            &p("alice"),
            AreaCommand::PickDifficulty {
                game_id: id,
                game_difficulty: Difficulty::Easy,
            },
        )
        .unwrap();
        area.handle_command(&p("alice"), AreaCommand::StartGame { game_id: id })
            .unwrap();
        id
    }

    #[test]
    fn commands_without_a_session_are_rejected() {
        let mut area = area();
        let err = area
            .handle_command(
                &p("alice"),
                AreaCommand::LeaveGame {
                    game_id: GameId::from_raw(1),
                },
            )
            .unwrap_err();
        assert_eq!(err, GameError::GameNotInProgress);
    }

    #[test]
    fn wrong_game_id_is_rejected() {
        let mut area = area();
        let id = join(&mut area, "alice");
        let wrong = GameId::from_raw(u64::MAX);
        assert_ne!(id, wrong);
        let err = area
            .handle_command(&p("alice"), AreaCommand::LeaveGame { game_id: wrong })
            .unwrap_err();
        assert_eq!(err, GameError::GameIdMismatch);
        assert_eq!(area.game().unwrap().slot_of(&p("alice")), Some(PlayerSlot::One));
    }

    #[test]
    fn unknown_command_is_invalid() {
        let mut area = area();
        let err = area
            .handle_command(&p("alice"), AreaCommand::Unknown)
            .unwrap_err();
        assert_eq!(err, GameError::InvalidCommand);
    }

    #[test]
    fn join_reuses_a_live_session() {
        let mut area = area();
        let a = join(&mut area, "alice");
        let b = join(&mut area, "bob");
        assert_eq!(a, b);
        assert_eq!(area.game().unwrap().status(), GameStatus::InProgress);
    }

    #[test]
    fn join_after_over_starts_a_new_session() {
        let mut area = area();
        let first = ready(&mut area);
        area.tick(1_000.0);
        let second = join(&mut area, "carol");
        assert_ne!(first, second);
        let game = area.game().unwrap();
        assert_eq!(game.status(), GameStatus::WaitingToStart);
        assert_eq!(game.player(PlayerSlot::One), Some(&p("carol")));
    }

    #[test]
    fn third_join_fails_and_publishes_nothing() {
        let mut area = area();
        join(&mut area, "alice");
        join(&mut area, "bob");
        let rx = area.subscribe();
        let err = area
            .handle_command(&p("carol"), AreaCommand::JoinGame)
            .unwrap_err();
        assert!(matches!(err, GameError::IllegalState(_)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn every_successful_command_publishes_once() {
        let mut area = area();
        let rx = area.subscribe();
        let id = join(&mut area, "alice");
        join(&mut area, "bob");
        area.handle_command(&p("bob"), AreaCommand::LeaveGame { game_id: id })
            .unwrap();
        let updates: Vec<AreaUpdate> = rx.try_iter().collect();
        assert_eq!(updates.len(), 3);
        let last = updates.last().unwrap().game.as_ref().unwrap();
        assert_eq!(last.status, GameStatus::Over);
        assert_eq!(last.winner, Some(p("alice")));
    }

    #[test]
    fn tick_publishes_only_while_running() {
        let mut area = area();
        let rx = area.subscribe();
        assert!(!area.tick(1.0));
        assert!(rx.try_recv().is_err());

        ready(&mut area);
        let _ = rx.try_iter().count();
        assert!(area.tick(1.0));
        let update = rx.try_recv().unwrap();
        let timer = update.game.unwrap().timer;
        assert_eq!(timer, GameConfig::default().round_duration_secs - 1.0);
    }

    #[test]
    fn history_names_players_and_falls_back_to_ids() {
        let mut area = area();
        area.add_occupant(p("alice"), "Alice");
        let id = ready(&mut area);
        area.handle_command(
            &p("alice"),
            AreaCommand::GameMove {
                game_id: id,
                game_move: PixelMove {
                    player_slot: PlayerSlot::One,
                    pixels: reference(),
                },
            },
        )
        .unwrap();
        area.tick(1_000.0);

        assert_eq!(area.history().len(), 1);
        let result = &area.history()[0];
        assert_eq!(result.game_id, id);
        assert_eq!(result.scores.get("Alice"), Some(&1));
        assert_eq!(result.scores.get("bob"), Some(&0));
    }

    #[test]
    fn history_is_not_duplicated() {
        let mut area = area();
        let id = ready(&mut area);
        area.tick(1_000.0);
        // Further observations of the same finished session.
        area.handle_command(&p("alice"), AreaCommand::LeaveGame { game_id: id })
            .unwrap();
        area.handle_command(
            &p("bob"),
            AreaCommand::PickDifficulty {
                game_id: id,
                game_difficulty: Difficulty::Hard,
            },
        )
        .unwrap();
        area.add_occupant(p("dave"), "Dave");
        assert_eq!(area.history().len(), 1);
        // A draw: nobody scores.
        assert!(area.history()[0].scores.values().all(|s| *s == 0));
    }

    #[test]
    fn each_finished_session_gets_its_own_entry() {
        let mut area = area();
        let first = ready(&mut area);
        area.tick(1_000.0);
        let second = ready(&mut area);
        area.tick(1_000.0);
        let ids: Vec<GameId> = area.history().iter().map(|r| r.game_id).collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[test]
    fn removing_a_seated_occupant_forfeits() {
        let mut area = area();
        area.add_occupant(p("alice"), "Alice");
        area.add_occupant(p("bob"), "Bob");
        ready(&mut area);
        area.remove_occupant(&p("bob"));

        let game = area.game().unwrap();
        assert_eq!(game.status(), GameStatus::Over);
        assert_eq!(game.winner(), Some(&p("alice")));
        let scores = &area.history()[0].scores;
        assert_eq!(scores.get("Alice"), Some(&1));
        assert_eq!(scores.get("Bob"), Some(&0));
        assert_eq!(area.resolve_name(&p("bob")), None);
    }

    #[test]
    fn observers_are_unseated_occupants() {
        let mut area = area();
        area.add_occupant(p("alice"), "Alice");
        area.add_occupant(p("zed"), "Zed");
        assert_eq!(area.update().observers, vec!["Alice", "Zed"]);
        join(&mut area, "alice");
        assert_eq!(area.update().observers, vec!["Zed"]);
    }

    #[test]
    fn idle_until_someone_is_seated_or_present() {
        let mut area = area();
        assert!(area.is_idle());
        let id = join(&mut area, "alice");
        assert!(!area.is_idle());
        area.handle_command(&p("alice"), AreaCommand::LeaveGame { game_id: id })
            .unwrap();
        assert!(area.is_idle());

        area.add_occupant(p("zed"), "Zed");
        assert!(!area.is_idle());
        area.remove_occupant(&p("zed"));
        assert!(area.is_idle());
    }

    #[test]
    fn finished_matches_keep_the_area_alive() {
        let mut area = area();
        ready(&mut area);
        area.tick(1_000.0);
        assert_eq!(area.history().len(), 1);
        assert!(!area.is_idle());
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let mut area = area();
        let rx = area.subscribe();
        drop(rx);
        join(&mut area, "alice");
        assert!(area.subscribers.is_empty());
    }

    #[test]
    fn command_wire_format() {
        let id = GameId::from_raw(0xabc);
        let json = format!(
            r#"{{"type":"GameMove","gameID":"{id}","move":{{"playerSlot":2,"pixels":[{{"x":1.5,"y":2.0}}]}}}}"#
        );
        let cmd: AreaCommand = serde_json::from_str(&json).unwrap();
        assert_eq!(
            cmd,
            AreaCommand::GameMove {
                game_id: id,
                game_move: PixelMove {
                    player_slot: PlayerSlot::Two,
                    pixels: vec![Pixel::new(1.5, 2.0)],
                },
            }
        );

        let cmd: AreaCommand = serde_json::from_str(r#"{"type":"JoinGame"}"#).unwrap();
        assert_eq!(cmd, AreaCommand::JoinGame);
        let cmd: AreaCommand = serde_json::from_str(r#"{"type":"Dance"}"#).unwrap();
        assert_eq!(cmd, AreaCommand::Unknown);
    }

    #[test]
    fn response_wire_format() {
        let id = GameId::from_raw(0xabc);
        let joined = serde_json::to_string(&CommandResponse::GameJoined { game_id: id }).unwrap();
        assert_eq!(joined, format!(r#"{{"gameID":"{id}"}}"#));
        assert_eq!(serde_json::to_string(&CommandResponse::Done {}).unwrap(), "{}");
    }
}
