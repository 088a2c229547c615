// TCP client for talking to a trace relay.
//
// - `connect()` does the TCP connect and the Hello handshake on the calling
//   thread, then spawns a reader thread.
// - The reader thread decodes each framed `ServerMessage` and pushes it into
//   an `mpsc` inbox.
// - The caller keeps the `BufWriter<TcpStream>` and sends synchronously;
//   messages are small.
// - `poll()` drains the inbox without blocking; `recv_timeout()` waits for
//   one message.
//
// Commands are tagged with increasing `RequestId`s starting at 0, so replies
// can be matched to requests. A browser or game client would also resend its
// whole trace every half second while drawing; this client leaves that
// cadence to the caller.

use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use trace_duel_game::{AreaCommand, AreaId, AreaUpdate, PlayerId};
use trace_duel_protocol::framing::{read_message, write_message};
use trace_duel_protocol::message::{ClientMessage, PROTOCOL_VERSION, PlayerInfo, ServerMessage};
use trace_duel_protocol::types::RequestId;

/// What a successful handshake returns.
pub struct WelcomeInfo {
    pub player_id: PlayerId,
    pub players: Vec<PlayerInfo>,
    pub areas: Vec<AreaUpdate>,
}

pub struct NetClient {
    writer: BufWriter<TcpStream>,
    inbox: Receiver<ServerMessage>,
    _reader_thread: Option<JoinHandle<()>>,
    player_id: PlayerId,
    next_request: RequestId,
}

impl NetClient {
    /// Connect, handshake, and start the reader thread.
    pub fn connect(
        addr: impl ToSocketAddrs,
        player_name: &str,
    ) -> Result<(Self, WelcomeInfo), String> {
        let stream = TcpStream::connect(addr).map_err(|e| format!("connect failed: {e}"))?;
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .ok();

        let reader_stream = stream
            .try_clone()
            .map_err(|e| format!("clone failed: {e}"))?;
        let mut writer = BufWriter::new(stream);

        let hello = ClientMessage::Hello {
            protocol_version: PROTOCOL_VERSION,
            player_name: player_name.into(),
        };
        send_msg(&mut writer, &hello).map_err(|e| format!("send Hello failed: {e}"))?;

        let mut reader = BufReader::new(reader_stream);
        let bytes = read_message(&mut reader).map_err(|e| format!("read Welcome failed: {e}"))?;
        let response: ServerMessage =
            serde_json::from_slice(&bytes).map_err(|e| format!("parse Welcome failed: {e}"))?;

        let welcome = match response {
            ServerMessage::Welcome {
                player_id,
                players,
                areas,
            } => WelcomeInfo {
                player_id,
                players,
                areas,
            },
            ServerMessage::Rejected { reason } => return Err(format!("rejected: {reason}")),
            other => return Err(format!("unexpected response: {other:?}")),
        };

        reader.get_ref().set_read_timeout(None).ok();

        let (tx, rx) = mpsc::channel();
        let reader_thread = thread::spawn(move || reader_loop(reader, tx));

        Ok((
            Self {
                writer,
                inbox: rx,
                _reader_thread: Some(reader_thread),
                player_id: welcome.player_id.clone(),
                next_request: RequestId(0),
            },
            welcome,
        ))
    }

    pub fn player_id(&self) -> &PlayerId {
        &self.player_id
    }

    pub fn enter_area(&mut self, area_id: &AreaId) -> Result<(), String> {
        let msg = ClientMessage::EnterArea {
            area_id: area_id.clone(),
        };
        send_msg(&mut self.writer, &msg).map_err(|e| format!("send EnterArea failed: {e}"))
    }

    pub fn exit_area(&mut self, area_id: &AreaId) -> Result<(), String> {
        let msg = ClientMessage::ExitArea {
            area_id: area_id.clone(),
        };
        send_msg(&mut self.writer, &msg).map_err(|e| format!("send ExitArea failed: {e}"))
    }

    /// Send a command to an area. Returns the request id its reply will carry.
    pub fn send_command(
        &mut self,
        area_id: &AreaId,
        command: AreaCommand,
    ) -> Result<RequestId, String> {
        let request_id = self.next_request;
        self.next_request = request_id.next();
        let msg = ClientMessage::Command {
            request_id,
            area_id: area_id.clone(),
            command,
        };
        send_msg(&mut self.writer, &msg).map_err(|e| format!("send Command failed: {e}"))?;
        Ok(request_id)
    }

    /// Send Goodbye. The relay treats it like a disconnect.
    pub fn disconnect(&mut self) {
        let _ = send_msg(&mut self.writer, &ClientMessage::Goodbye);
    }

    /// Drain all queued server messages without blocking.
    pub fn poll(&self) -> Vec<ServerMessage> {
        self.inbox.try_iter().collect()
    }

    /// Wait up to `timeout` for the next server message.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<ServerMessage> {
        self.inbox.recv_timeout(timeout).ok()
    }
}

fn send_msg(writer: &mut BufWriter<TcpStream>, msg: &ClientMessage) -> Result<(), String> {
    let json = serde_json::to_vec(msg).map_err(|e| e.to_string())?;
    write_message(writer, &json).map_err(|e| e.to_string())
}

fn reader_loop(mut reader: BufReader<TcpStream>, tx: mpsc::Sender<ServerMessage>) {
    while let Ok(bytes) = read_message(&mut reader) {
        let Ok(msg) = serde_json::from_slice::<ServerMessage>(&bytes) else {
            break;
        };
        if tx.send(msg).is_err() {
            break;
        }
    }
}
