//! Terminal battle client for Royaka.
//!
//! Drives the full flow against a running game server: sign in (or
//! register), queue for a match, then play from stdin while server
//! pushes stream in:
//!
//! ```text
//! battle-cli <username> <password> [simple|enhanced]
//!
//! in battle:
//!   select <troop>
//!   attack <troop> <target>
//!   heal <troop>
//!   skip
//!   again        (after game over)
//!   quit
//! ```
//!
//! Endpoint comes from `ROYAKA_WS_URL` (default `ws://localhost:8080/ws`),
//! the session file from `ROYAKA_SESSION_FILE`.

use std::time::Duration;

use royaka::prelude::*;
use royaka_protocol::{
    AttackRequest, FindMatchRequest, GameRequest, HealRequest,
    LeaveGameRequest, LoginData, PlayAgainRequest, RegisterRequest,
    SelectTroopRequest, SkipTurnRequest, UserRequest,
};
use royaka_session::SessionStore;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

fn session_path() -> std::path::PathBuf {
    std::env::var("ROYAKA_SESSION_FILE")
        .unwrap_or_else(|_| "royaka-session.json".to_string())
        .into()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(username), Some(password)) = (args.next(), args.next())
    else {
        eprintln!("usage: battle-cli <username> <password> [simple|enhanced]");
        std::process::exit(2);
    };
    let mode = match args.next().as_deref() {
        Some("enhanced") => MatchMode::Enhanced,
        _ => MatchMode::Simple,
    };

    let client = Client::builder()
        .config(ClientConfig::from_env())
        .start();
    println!("connecting...");
    client.wait_until_connected().await;
    println!("connected");

    let mut session = SessionStore::load(session_path())?;
    if restore_session(&client, &session, &username).await {
        println!("restored session for {username}");
    } else {
        sign_in(&client, &mut session, &username, &password).await?;
    }
    session.save(session_path())?;

    run_battle(&client, &mut session, mode).await?;

    client.stop();
    Ok(())
}

/// Checks whether a stored session is still valid server-side.
async fn restore_session(
    client: &Client,
    session: &SessionStore,
    username: &str,
) -> bool {
    if session.username() != Some(username) {
        return false;
    }
    let Some(session_id) = session.session_id() else {
        return false;
    };
    let envelope = Envelope::request(
        kind::GET_USER,
        &UserRequest {
            session_id: session_id.to_string(),
        },
    )
    .expect("user payload is serializable");
    match client.request(envelope, REQUEST_TIMEOUT).await {
        Ok(reply) => reply.is_ok(),
        Err(_) => false,
    }
}

async fn login_once(
    client: &Client,
    username: &str,
    password: &str,
) -> Result<Envelope, Box<dyn std::error::Error>> {
    let envelope = Envelope::request(
        kind::LOGIN,
        &LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        },
    )?;
    Ok(client.request(envelope, REQUEST_TIMEOUT).await?)
}

/// Logs in, registering first if the account doesn't exist yet.
async fn sign_in(
    client: &Client,
    session: &mut SessionStore,
    username: &str,
    password: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut reply = login_once(client, username, password).await?;

    if !reply.is_ok() {
        println!(
            "login failed ({}), trying to register...",
            reply.failure_reason().unwrap_or("no reason given")
        );
        let registered = client
            .request(
                Envelope::request(
                    kind::REGISTER,
                    &RegisterRequest {
                        username: username.to_string(),
                        password: password.to_string(),
                    },
                )?,
                REQUEST_TIMEOUT,
            )
            .await?;
        if !registered.is_ok() {
            return Err(format!(
                "registration failed: {}",
                registered.failure_reason().unwrap_or("unknown")
            )
            .into());
        }
        reply = login_once(client, username, password).await?;
    }

    if !reply.is_ok() {
        return Err(format!(
            "login failed: {}",
            reply.failure_reason().unwrap_or("unknown")
        )
        .into());
    }
    let data: LoginData = reply.data_as()?;
    session.begin(data.session_id, username);
    println!("signed in as {username}");
    Ok(())
}

fn queue_for_match(client: &Client, session: &SessionStore, mode: MatchMode) {
    let username = session.username().unwrap_or_default().to_string();
    client.send_message(
        Envelope::request(
            kind::FIND_MATCH,
            &FindMatchRequest { username, mode },
        )
        .expect("find_match payload is serializable"),
    );
    println!("looking for a {mode:?} match...");
}

/// The battle loop: server pushes on one side, stdin commands on the
/// other.
async fn run_battle(
    client: &Client,
    session: &mut SessionStore,
    mode: MatchMode,
) -> Result<(), Box<dyn std::error::Error>> {
    let (events_tx, mut events) = mpsc::unbounded_channel();
    let _sub = client.subscribe(move |envelope| {
        let _ = events_tx.send(envelope.clone());
    });
    // Queue only after the subscription exists so a fast match_found
    // can't arrive with no listener registered.
    queue_for_match(client, session, mode);

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(envelope) = event else { break };
                handle_event(client, session, &envelope)?;
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !handle_command(client, session, mode, line.trim()) {
                    break;
                }
            }
        }
    }
    Ok(())
}

/// Reacts to one server push. Errors only on session-file problems.
fn handle_event(
    client: &Client,
    session: &mut SessionStore,
    envelope: &Envelope,
) -> Result<(), Box<dyn std::error::Error>> {
    match envelope.kind.as_str() {
        kind::MATCH_FOUND => {
            let data: royaka_protocol::MatchFoundData =
                envelope.data_as()?;
            println!("match found, room {}", data.room_id);
            session.enter_room(data.room_id);
            session.save(session_path())?;
            if let Some(request) = room_request(session) {
                client.send_message(Envelope::request(
                    kind::GET_GAME,
                    &request,
                )?);
            }
        }
        kind::MATCH_TIMEOUT => {
            println!("matchmaking timed out; still queued...");
        }
        kind::GAME_RESPONSE | kind::GAME_STATE => {
            if let Some(data) = &envelope.data {
                println!("-- state --\n{}", summary(data));
            }
        }
        kind::MANA_UPDATE => {
            if let Some(data) = &envelope.data {
                println!("mana: {data}");
            }
        }
        kind::ATTACK_RESPONSE
        | kind::HEAL_RESPONSE
        | kind::SKIP_TURN_RESPONSE
        | kind::TROOP_RESPONSE => {
            if envelope.is_ok() {
                if let Some(message) = &envelope.message {
                    println!("{message}");
                }
            } else {
                println!(
                    "rejected: {}",
                    envelope.failure_reason().unwrap_or("unknown")
                );
            }
        }
        kind::GAME_OVER_RESPONSE => {
            println!(
                "game over: {}",
                envelope.message.as_deref().unwrap_or("")
            );
            session.leave_room();
            session.save(session_path())?;
            println!("type 'again' for a rematch or 'quit' to leave");
        }
        _ => {
            tracing::debug!(kind = %envelope.kind, "unhandled push");
        }
    }
    Ok(())
}

/// Executes one stdin command. Returns `false` to quit.
fn handle_command(
    client: &Client,
    session: &SessionStore,
    mode: MatchMode,
    line: &str,
) -> bool {
    let mut parts = line.split_whitespace();
    match parts.next() {
        Some("attack") => {
            let (Some(troop), Some(target)) =
                (parts.next(), parts.next())
            else {
                println!("usage: attack <troop> <target>");
                return true;
            };
            let Some(base) = room_request(session) else {
                println!("not in a match");
                return true;
            };
            send(client, kind::ATTACK, &AttackRequest {
                room_id: base.room_id,
                username: base.username,
                troop: troop.to_string(),
                target: target.to_string(),
            });
        }
        Some("heal") => {
            let Some(troop) = parts.next() else {
                println!("usage: heal <troop>");
                return true;
            };
            let Some(base) = room_request(session) else {
                println!("not in a match");
                return true;
            };
            send(client, kind::HEAL, &HealRequest {
                room_id: base.room_id,
                username: base.username,
                troop: troop.to_string(),
            });
        }
        Some("select") => {
            let Some(troop) = parts.next() else {
                println!("usage: select <troop>");
                return true;
            };
            let Some(base) = room_request(session) else {
                println!("not in a match");
                return true;
            };
            send(client, kind::SELECT_TROOP, &SelectTroopRequest {
                room_id: base.room_id,
                username: base.username,
                troop: troop.to_string(),
            });
        }
        Some("skip") => {
            let Some(base) = room_request(session) else {
                println!("not in a match");
                return true;
            };
            send(client, kind::SKIP_TURN, &SkipTurnRequest {
                room_id: base.room_id,
                username: base.username,
            });
        }
        Some("again") => {
            if let Some(session_id) = session.session_id() {
                send(client, kind::PLAY_AGAIN, &PlayAgainRequest {
                    session_id: session_id.to_string(),
                });
            }
            queue_for_match(client, session, mode);
        }
        Some("quit") => {
            if let Some(base) = room_request(session) {
                send(client, kind::LEAVE_GAME, &LeaveGameRequest {
                    room_id: base.room_id,
                    username: base.username,
                });
            }
            return false;
        }
        Some(other) => println!("unknown command: {other}"),
        None => {}
    }
    true
}

/// Builds the `{room_id, username}` payload for room-scoped requests.
fn room_request(session: &SessionStore) -> Option<GameRequest> {
    Some(GameRequest {
        room_id: session.room_id()?.to_string(),
        username: session.username()?.to_string(),
    })
}

fn send<T: serde::Serialize>(client: &Client, request_kind: &str, payload: &T) {
    if !client.is_connected() {
        println!("not connected to server");
        return;
    }
    match Envelope::request(request_kind, payload) {
        Ok(envelope) => client.send_message(envelope),
        Err(e) => tracing::error!(error = %e, "bad payload"),
    }
}

/// One-line-per-key rendering of a state payload.
fn summary(data: &serde_json::Value) -> String {
    match data.as_object() {
        Some(map) => map
            .iter()
            .map(|(key, value)| format!("  {key}: {value}"))
            .collect::<Vec<_>>()
            .join("\n"),
        None => format!("  {data}"),
    }
}
