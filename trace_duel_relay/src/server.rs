// TCP server and main event loop for the trace relay.
//
// Architecture: thread-per-reader with a central `mpsc` channel.
//
// - **Listener thread**: non-blocking `accept()` loop that hands each new
//   stream to a handshake thread.
// - **Handshake threads** (one per pending connection): read `Hello` under
//   `HANDSHAKE_TIMEOUT` and forward it with the stream as
//   `InternalEvent::Hello`. A silent or malformed peer only ties up its own
//   thread, never the main loop.
// - **Reader threads** (one per client): `read_message()` in a loop, decode a
//   `ClientMessage`, forward it as `InternalEvent::MessageFrom`. EOF, a read
//   error, a malformed frame, or `Goodbye` ends the loop with
//   `InternalEvent::Disconnected`.
// - **Main thread**: owns the `Hub` and with it every `GameArea`. It waits on
//   the channel with `recv_timeout` set to the time left until the next clock
//   tick, so the round clock runs without a separate timer thread. Each tick
//   passes the real elapsed time to `Hub::tick`.
//
// The main thread is the only writer to client streams and the only thread
// that touches game state, so commands and ticks are applied strictly one at
// a time.
//
// Shutdown: `RelayHandle::stop` clears `keep_running`; the main loop notices
// within one tick interval and exits.

use std::io::{BufReader, BufWriter};
use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use trace_duel_game::{GameConfig, OutlineCatalog, PlayerId, SharedShapeProvider};
use trace_duel_protocol::framing::{read_message, write_message};
use trace_duel_protocol::message::{ClientMessage, ServerMessage};

use crate::hub::Hub;

/// How long a new connection has to send `Hello`.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Events sent from listener/reader threads to the main thread.
enum InternalEvent {
    Hello {
        reader: BufReader<TcpStream>,
        stream: TcpStream,
        protocol_version: u32,
        player_name: String,
    },
    MessageFrom {
        player_id: PlayerId,
        message: ClientMessage,
    },
    Disconnected {
        player_id: PlayerId,
    },
}

/// Handle returned by `start_relay` to control the running server.
pub struct RelayHandle {
    keep_running: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl RelayHandle {
    /// Signal the relay to stop and wait for it to shut down.
    pub fn stop(mut self) {
        self.keep_running.store(false, Ordering::SeqCst);
        self.join();
    }

    /// Block until the relay exits on its own.
    pub fn wait(mut self) {
        self.join();
    }

    fn join(&mut self) {
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

/// Configuration for starting a relay server.
pub struct RelayConfig {
    pub bind: IpAddr,
    pub port: u16,
    /// Round clock period. Each tick advances every live round by the real
    /// time elapsed since the previous one.
    pub tick_interval: Duration,
    /// Seed for the relay's generator, which in turn seeds each area.
    pub seed: u64,
    pub max_players: u32,
    /// Most areas hosted at once. Idle areas are dropped and do not count.
    pub max_areas: usize,
    pub game: GameConfig,
    pub shapes: SharedShapeProvider,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 7979,
            tick_interval: Duration::from_secs(1),
            seed: 0x5eed,
            max_players: 64,
            max_areas: 256,
            game: GameConfig::default(),
            shapes: Arc::new(OutlineCatalog),
        }
    }
}

/// Start the relay on a background thread. Returns a handle for stopping it
/// and the bound address (port 0 lets the OS pick).
pub fn start_relay(config: RelayConfig) -> std::io::Result<(RelayHandle, SocketAddr)> {
    let listener = TcpListener::bind((config.bind, config.port))?;
    let addr = listener.local_addr()?;
    let keep_running = Arc::new(AtomicBool::new(true));
    let keep_running_clone = keep_running.clone();

    let thread = thread::spawn(move || {
        run_relay(listener, config, keep_running_clone);
    });
    tracing::info!(%addr, "relay listening");

    Ok((
        RelayHandle {
            keep_running,
            thread: Some(thread),
        },
        addr,
    ))
}

/// Main relay loop. Runs until `keep_running` is cleared.
fn run_relay(listener: TcpListener, config: RelayConfig, keep_running: Arc<AtomicBool>) {
    let mut hub = Hub::new(
        config.game,
        config.shapes,
        config.seed,
        config.max_players,
        config.max_areas,
    );
    let (tx, rx): (Sender<InternalEvent>, Receiver<InternalEvent>) = mpsc::channel();

    if let Err(e) = listener.set_nonblocking(true) {
        tracing::error!(error = %e, "could not make listener non-blocking");
        return;
    }

    let keep_running_listener = keep_running.clone();
    let tx_listener = tx.clone();
    thread::spawn(move || {
        while keep_running_listener.load(Ordering::SeqCst) {
            match listener.accept() {
                Ok((stream, peer)) => {
                    tracing::debug!(%peer, "accepted connection");
                    stream.set_nonblocking(false).ok();
                    let tx_handshake = tx_listener.clone();
                    thread::spawn(move || read_hello(stream, tx_handshake));
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(50));
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed; listener stopped");
                    break;
                }
            }
        }
    });

    let tick_interval = config.tick_interval.max(Duration::from_millis(1));
    let mut last_tick = Instant::now();

    while keep_running.load(Ordering::SeqCst) {
        let wait = tick_interval.saturating_sub(last_tick.elapsed());
        match rx.recv_timeout(wait) {
            Ok(event) => {
                handle_event(&mut hub, event, &tx, &keep_running);
                while let Ok(event) = rx.try_recv() {
                    handle_event(&mut hub, event, &tx, &keep_running);
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }

        let now = Instant::now();
        let elapsed = now.duration_since(last_tick);
        if elapsed >= tick_interval {
            hub.tick(elapsed.as_secs_f64());
            last_tick = now;
        }
    }
    tracing::info!("relay stopped");
}

fn handle_event(
    hub: &mut Hub,
    event: InternalEvent,
    tx: &Sender<InternalEvent>,
    keep_running: &Arc<AtomicBool>,
) {
    match event {
        InternalEvent::Hello {
            reader,
            stream,
            protocol_version,
            player_name,
        } => {
            register_player(
                hub,
                reader,
                stream,
                protocol_version,
                player_name,
                tx,
                keep_running,
            );
        }
        InternalEvent::MessageFrom { player_id, message } => {
            handle_message(hub, &player_id, message);
        }
        InternalEvent::Disconnected { player_id } => {
            hub.remove_player(&player_id);
        }
    }
}

/// Read the `Hello` handshake on its own thread and pass it to the main
/// loop. Anything other than a well-formed `Hello` drops the connection.
fn read_hello(stream: TcpStream, tx: Sender<InternalEvent>) {
    stream.set_read_timeout(Some(HANDSHAKE_TIMEOUT)).ok();

    let mut reader = match stream.try_clone() {
        Ok(s) => BufReader::new(s),
        Err(e) => {
            tracing::warn!(error = %e, "could not clone stream");
            return;
        }
    };

    let hello = read_message(&mut reader)
        .map_err(|e| e.to_string())
        .and_then(|bytes| {
            serde_json::from_slice::<ClientMessage>(&bytes).map_err(|e| e.to_string())
        });
    match hello {
        Ok(ClientMessage::Hello {
            protocol_version,
            player_name,
        }) => {
            let _ = tx.send(InternalEvent::Hello {
                reader,
                stream,
                protocol_version,
                player_name,
            });
        }
        Ok(other) => {
            tracing::warn!(message = ?other, "expected Hello; dropping connection");
        }
        Err(e) => {
            tracing::warn!(error = %e, "handshake failed");
        }
    }
}

/// Register a player whose `Hello` arrived, then spawn their reader thread.
/// A rejected handshake gets `Rejected` and the connection is dropped.
fn register_player(
    hub: &mut Hub,
    reader: BufReader<TcpStream>,
    stream: TcpStream,
    protocol_version: u32,
    player_name: String,
    tx: &Sender<InternalEvent>,
    keep_running: &Arc<AtomicBool>,
) {
    let write_stream = match stream.try_clone() {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, "could not clone stream");
            return;
        }
    };

    match hub.add_player(protocol_version, player_name, write_stream) {
        Ok(player_id) => {
            stream.set_read_timeout(None).ok();
            let tx_reader = tx.clone();
            let keep_running_reader = keep_running.clone();
            thread::spawn(move || {
                reader_loop(reader, player_id, tx_reader, keep_running_reader);
            });
        }
        Err(reason) => {
            tracing::warn!(%reason, "handshake rejected");
            let rejected = ServerMessage::Rejected { reason };
            if let Ok(json) = serde_json::to_vec(&rejected) {
                let mut writer = BufWriter::new(stream);
                let _ = write_message(&mut writer, &json);
            }
        }
    }
}

/// Reader loop for one client. Runs in its own thread.
fn reader_loop(
    mut reader: BufReader<TcpStream>,
    player_id: PlayerId,
    tx: Sender<InternalEvent>,
    keep_running: Arc<AtomicBool>,
) {
    while keep_running.load(Ordering::SeqCst) {
        let message = match read_message(&mut reader) {
            Ok(bytes) => serde_json::from_slice::<ClientMessage>(&bytes),
            Err(e) => {
                tracing::debug!(player = %player_id, error = %e, "connection closed");
                break;
            }
        };
        match message {
            Ok(ClientMessage::Goodbye) => break,
            Ok(message) => {
                let event = InternalEvent::MessageFrom {
                    player_id: player_id.clone(),
                    message,
                };
                if tx.send(event).is_err() {
                    return;
                }
            }
            Err(e) => {
                tracing::warn!(player = %player_id, error = %e, "malformed message");
                break;
            }
        }
    }
    let _ = tx.send(InternalEvent::Disconnected { player_id });
}

/// Dispatch a post-handshake client message.
fn handle_message(hub: &mut Hub, player_id: &PlayerId, message: ClientMessage) {
    match message {
        ClientMessage::EnterArea { area_id } => hub.enter_area(player_id, &area_id),
        ClientMessage::ExitArea { area_id } => hub.exit_area(player_id, &area_id),
        ClientMessage::Command {
            request_id,
            area_id,
            command,
        } => hub.handle_command(player_id, request_id, &area_id, command),
        ClientMessage::Hello { .. } => {
            tracing::warn!(player = %player_id, "ignoring repeated Hello");
        }
        // Handled in the reader loop.
        ClientMessage::Goodbye => {}
    }
}
