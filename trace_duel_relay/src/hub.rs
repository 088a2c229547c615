// Relay state: connected players and the game areas they play in.
//
// `Hub` is the single-threaded core that `server.rs` drives. It owns every
// `GameArea`, so area commands and clock ticks are applied one at a time from
// the server's main loop with no locking.
//
// Key responsibilities:
// - Player management: handshake checks, relay-assigned `PlayerId`s,
//   `PlayerJoined` / `PlayerLeft` announcements.
// - Area hosting: an area is created by `EnterArea` or `JoinGame`, each seeded
//   from the relay's `GameRng`, up to `max_areas` at once. Other commands on
//   an unhosted area fail without creating it. An area that goes idle (no
//   occupants, nobody seated, no history) is dropped. Entering an area makes
//   the player an occupant; disconnecting exits every area the player is in
//   or seated in, which forfeits any live game.
// - Command routing: each `ClientMessage::Command` is applied to its area and
//   answered with `CommandOk` / `CommandFailed`, to the sender only.
// - Change fan-out: each hosted area is subscribed once; after every
//   mutation the hub drains those subscriptions and broadcasts each update
//   as `AreaChanged` to every connected player. The command reply always goes
//   out before the updates it caused.
//
// Writes go through cloned `TcpStream` write halves in `BufWriter`s. A failed
// write is logged and otherwise ignored; the client's reader thread sees the
// broken connection and reports the disconnect.

use std::collections::BTreeMap;
use std::io::BufWriter;
use std::net::TcpStream;
use std::sync::mpsc::Receiver;

use trace_duel_game::{
    AreaCommand, AreaId, AreaUpdate, GameArea, GameConfig, GameError, GameRng, PlayerId,
    SharedShapeProvider,
};
use trace_duel_protocol::framing::write_message;
use trace_duel_protocol::message::{PROTOCOL_VERSION, PlayerInfo, ServerMessage};
use trace_duel_protocol::types::RequestId;

/// A hosted area plus the receiving end of its change subscription.
struct HostedArea {
    area: GameArea,
    updates: Receiver<AreaUpdate>,
}

struct PlayerState {
    name: String,
    writer: BufWriter<TcpStream>,
}

pub struct Hub {
    players: BTreeMap<PlayerId, PlayerState>,
    next_player: u64,
    max_players: u32,
    areas: BTreeMap<AreaId, HostedArea>,
    max_areas: usize,
    game_config: GameConfig,
    provider: SharedShapeProvider,
    rng: GameRng,
}

impl Hub {
    pub fn new(
        game_config: GameConfig,
        provider: SharedShapeProvider,
        seed: u64,
        max_players: u32,
        max_areas: usize,
    ) -> Self {
        Self {
            players: BTreeMap::new(),
            next_player: 0,
            max_players,
            areas: BTreeMap::new(),
            max_areas,
            game_config,
            provider,
            rng: GameRng::new(seed),
        }
    }

    /// Validate a handshake and register the player. On success the new
    /// player gets `Welcome` and everyone else gets `PlayerJoined`. On
    /// failure returns the reason to put in `Rejected`.
    pub fn add_player(
        &mut self,
        protocol_version: u32,
        player_name: String,
        stream: TcpStream,
    ) -> Result<PlayerId, String> {
        if protocol_version != PROTOCOL_VERSION {
            return Err(format!(
                "protocol version mismatch: relay speaks {PROTOCOL_VERSION}, client sent {protocol_version}"
            ));
        }
        let name = player_name.trim().to_owned();
        if name.is_empty() {
            return Err("player name is required".into());
        }
        if self.players.len() >= self.max_players as usize {
            return Err("relay is full".into());
        }

        let id = PlayerId::new(format!("p{}", self.next_player));
        self.next_player = self.next_player.wrapping_add(1);

        self.broadcast(&ServerMessage::PlayerJoined {
            player: PlayerInfo {
                id: id.clone(),
                name: name.clone(),
            },
        });
        self.players.insert(
            id.clone(),
            PlayerState {
                name: name.clone(),
                writer: BufWriter::new(stream),
            },
        );

        let welcome = ServerMessage::Welcome {
            player_id: id.clone(),
            players: self.player_list(),
            areas: self.areas.values().map(|h| h.area.update()).collect(),
        };
        self.send_to(&id, &welcome);
        tracing::info!(player = %id, %name, "player connected");
        Ok(id)
    }

    /// Drop a player: exit every area they occupy or hold a seat in, then
    /// announce it.
    pub fn remove_player(&mut self, player_id: &PlayerId) {
        let Some(state) = self.players.remove(player_id) else {
            return;
        };
        for hosted in self.areas.values_mut() {
            let area = &mut hosted.area;
            let seated = area.game().is_some_and(|g| g.slot_of(player_id).is_some());
            if seated || area.resolve_name(player_id).is_some() {
                area.remove_occupant(player_id);
            }
        }
        tracing::info!(player = %player_id, name = %state.name, "player disconnected");
        self.broadcast(&ServerMessage::PlayerLeft {
            player_id: player_id.clone(),
            name: state.name,
        });
        self.flush_updates();
    }

    pub fn enter_area(&mut self, player_id: &PlayerId, area_id: &AreaId) {
        let Some(name) = self.players.get(player_id).map(|p| p.name.clone()) else {
            return;
        };
        match self.host_area(area_id) {
            Some(area) => area.add_occupant(player_id.clone(), name),
            None => {
                tracing::warn!(player = %player_id, area = %area_id, "area limit reached");
                return;
            }
        }
        self.flush_updates();
    }

    pub fn exit_area(&mut self, player_id: &PlayerId, area_id: &AreaId) {
        let occupied = self
            .areas
            .get_mut(area_id)
            .filter(|h| h.area.resolve_name(player_id).is_some());
        if let Some(hosted) = occupied {
            hosted.area.remove_occupant(player_id);
        }
        self.flush_updates();
    }

    /// Apply `command` to its area and answer the sender. Only `JoinGame`
    /// may bring a new area into being.
    pub fn handle_command(
        &mut self,
        player_id: &PlayerId,
        request_id: RequestId,
        area_id: &AreaId,
        command: AreaCommand,
    ) {
        let result = if matches!(command, AreaCommand::JoinGame) {
            match self.host_area(area_id) {
                Some(area) => area.handle_command(player_id, command),
                None => Err(GameError::IllegalState(
                    "the relay cannot host another area".into(),
                )),
            }
        } else {
            match self.areas.get_mut(area_id) {
                Some(hosted) => hosted.area.handle_command(player_id, command),
                None if matches!(command, AreaCommand::Unknown) => {
                    Err(GameError::InvalidCommand)
                }
                None => Err(GameError::GameNotInProgress),
            }
        };
        let reply = match result {
            Ok(response) => ServerMessage::CommandOk {
                request_id,
                response,
            },
            Err(error) => {
                tracing::warn!(player = %player_id, area = %area_id, %error, "command rejected");
                ServerMessage::CommandFailed { request_id, error }
            }
        };
        self.send_to(player_id, &reply);
        self.flush_updates();
    }

    /// Advance every area's round clock.
    pub fn tick(&mut self, delta_secs: f64) {
        for hosted in self.areas.values_mut() {
            hosted.area.tick(delta_secs);
        }
        self.flush_updates();
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn player_list(&self) -> Vec<PlayerInfo> {
        self.players
            .iter()
            .map(|(id, state)| PlayerInfo {
                id: id.clone(),
                name: state.name.clone(),
            })
            .collect()
    }

    pub fn area(&self, area_id: &AreaId) -> Option<&GameArea> {
        self.areas.get(area_id).map(|h| &h.area)
    }

    pub fn area_count(&self) -> usize {
        self.areas.len()
    }

    /// The area with `area_id`, created if there is room for it.
    fn host_area(&mut self, area_id: &AreaId) -> Option<&mut GameArea> {
        if !self.areas.contains_key(area_id) && self.areas.len() >= self.max_areas {
            return None;
        }
        let Self {
            areas,
            rng,
            game_config,
            provider,
            ..
        } = self;
        let hosted = areas.entry(area_id.clone()).or_insert_with(|| {
            tracing::info!(area = %area_id, "hosting new area");
            let mut area = GameArea::new(
                area_id.clone(),
                game_config.clone(),
                provider.clone(),
                rng.next_u64(),
            );
            let updates = area.subscribe();
            HostedArea { area, updates }
        });
        Some(&mut hosted.area)
    }

    /// Broadcast every pending area update, oldest first per area, then drop
    /// areas that went idle.
    fn flush_updates(&mut self) {
        let pending: Vec<AreaUpdate> = self
            .areas
            .values()
            .flat_map(|h| h.updates.try_iter())
            .collect();
        for update in pending {
            self.broadcast(&ServerMessage::AreaChanged {
                update: Box::new(update),
            });
        }
        self.areas.retain(|area_id, hosted| {
            let idle = hosted.area.is_idle();
            if idle {
                tracing::info!(area = %area_id, "dropping idle area");
            }
            !idle
        });
    }

    fn send_to(&mut self, player_id: &PlayerId, msg: &ServerMessage) {
        let Some(state) = self.players.get_mut(player_id) else {
            return;
        };
        if let Err(e) = send_message(&mut state.writer, msg) {
            tracing::warn!(player = %player_id, error = %e, "write failed");
        }
    }

    fn broadcast(&mut self, msg: &ServerMessage) {
        let ids: Vec<PlayerId> = self.players.keys().cloned().collect();
        for id in &ids {
            self.send_to(id, msg);
        }
    }
}

/// Serialize and frame one `ServerMessage`.
fn send_message(
    writer: &mut BufWriter<TcpStream>,
    msg: &ServerMessage,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_vec(msg)?;
    write_message(writer, &json)?;
    Ok(())
}
