// CLI entry point for the Trace Duel relay.
//
// Starts a standalone relay that trace clients connect to. See `server.rs`
// for the networking architecture and `hub.rs` for area hosting.
//
// Usage:
//   relay [OPTIONS]
//     --bind <ADDR>        Listen address (default: 127.0.0.1)
//     --port <PORT>        Listen port (default: 7979)
//     --tick-ms <MS>       Round clock period in milliseconds (default: 1000)
//     --seed <N>           RNG seed for game ids and shape picks
//                          (default: derived from the clock)
//     --max-players <N>    Max connected players (default: 64)
//     --max-areas <N>      Max areas hosted at once (default: 256)
//     --config <PATH>      GameConfig JSON (round length, tolerance, canvas)
//
// Logging goes to stderr through `tracing-subscriber`; set `RUST_LOG` to
// override the default `trace_duel=info` filter.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use trace_duel_game::GameConfig;
use trace_duel_relay::server::{RelayConfig, start_relay};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trace_duel=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = parse_args();
    tracing::info!(
        seed = config.seed,
        tick_ms = config.tick_interval.as_millis(),
        round_secs = config.game.round_duration_secs,
        "starting relay"
    );

    let (handle, addr) = match start_relay(config) {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(error = %e, "failed to start relay");
            std::process::exit(1);
        }
    };
    println!("Relay listening on {addr}");

    // Runs until the process is killed.
    handle.wait();
}

fn fail(message: &str) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}

/// Parse command-line arguments into a `RelayConfig`. Plain
/// `std::env::args()` matching.
fn parse_args() -> RelayConfig {
    let mut config = RelayConfig {
        seed: clock_seed(),
        ..RelayConfig::default()
    };
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--bind" => {
                i += 1;
                config.bind = args
                    .get(i)
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(|| fail("--bind requires an IP address"));
            }
            "--port" => {
                i += 1;
                config.port = args
                    .get(i)
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(|| fail("--port requires a valid port number"));
            }
            "--tick-ms" => {
                i += 1;
                let ms: u64 = args
                    .get(i)
                    .and_then(|s| s.parse().ok())
                    .filter(|ms| *ms > 0)
                    .unwrap_or_else(|| fail("--tick-ms requires a positive number"));
                config.tick_interval = Duration::from_millis(ms);
            }
            "--seed" => {
                i += 1;
                config.seed = args
                    .get(i)
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(|| fail("--seed requires a number"));
            }
            "--max-players" => {
                i += 1;
                config.max_players = args
                    .get(i)
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(|| fail("--max-players requires a valid number"));
            }
            "--max-areas" => {
                i += 1;
                config.max_areas = args
                    .get(i)
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(|| fail("--max-areas requires a valid number"));
            }
            "--config" => {
                i += 1;
                let path = args
                    .get(i)
                    .unwrap_or_else(|| fail("--config requires a path"));
                config.game = GameConfig::from_file(path)
                    .unwrap_or_else(|e| fail(&format!("{path}: {e}")));
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    config
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}

fn print_usage() {
    println!("Usage: relay [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --bind <ADDR>        Listen address (default: 127.0.0.1)");
    println!("  --port <PORT>        Listen port (default: 7979)");
    println!("  --tick-ms <MS>       Round clock period in milliseconds (default: 1000)");
    println!("  --seed <N>           RNG seed (default: derived from the clock)");
    println!("  --max-players <N>    Max connected players (default: 64)");
    println!("  --max-areas <N>      Max areas hosted at once (default: 256)");
    println!("  --config <PATH>      GameConfig JSON file");
    println!("  --help, -h           Show this help");
}
