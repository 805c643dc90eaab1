use crate::domain::PlayerId;
use crate::interface_adapters::protocol::{ClientMessage, ServerMessage, facing_from_wire, wire_id};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::ids::next_connection_id;
use crate::use_cases::{ArenaHandle, Dispatch, GameEvent, Outbound};

use axum::{
    Error,
    extract::{
        State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures::SinkExt;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{broadcast, mpsc};
use tracing::{Instrument, debug, error, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Serialization(serde_json::Error),
    InputClosed,
    OutboundClosed,
}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

pub async fn outbound_serializer(
    mut outbound_rx: broadcast::Receiver<Outbound>,
    dispatch_tx: broadcast::Sender<Dispatch>,
    input_tx: mpsc::Sender<GameEvent>,
) {
    // Serialize each outbound event once and broadcast the shared bytes.
    loop {
        match outbound_rx.recv().await {
            Ok(out) => {
                let msg = ServerMessage::from(out.event);
                let txt = match serde_json::to_string(&msg) {
                    Ok(txt) => txt,
                    Err(e) => {
                        error!(error = ?e, "failed to serialize outbound event");
                        continue;
                    }
                };

                let _ = dispatch_tx.send(Dispatch {
                    recipients: out.recipients,
                    bytes: Utf8Bytes::from(txt),
                });
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                // The gap is invisible to connections, so every active player needs a snapshot.
                warn!(missed = n, "outbound serializer lagged; requesting resync for all");
                if let Err(mpsc::error::TrySendError::Closed(_)) =
                    input_tx.try_send(GameEvent::ResyncAll)
                {
                    warn!("input channel closed; serializer exiting");
                    break;
                }
            }
            Err(broadcast::error::RecvError::Closed) => {
                warn!("outbound channel closed; serializer exiting");
                break;
            }
        }
    }
}

pub fn spawn_arena_serializer(arena: &ArenaHandle) {
    // Subscribe before spawning so no event emitted after this call is missed.
    tokio::spawn(outbound_serializer(
        arena.outbound_tx.subscribe(),
        arena.dispatch_tx.clone(),
        arena.input_tx.clone(),
    ));
}

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let arena = state.arena.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, arena))
}

async fn handle_socket(socket: WebSocket, arena: ArenaHandle) {
    // The connection id doubles as the player id for the lifetime of the socket.
    let player_id = next_connection_id();
    serve_connection(socket, arena, player_id)
        .instrument(info_span!("conn", player_id))
        .await;
}

async fn serve_connection(mut socket: WebSocket, arena: ArenaHandle, player_id: PlayerId) {
    let mut ctx = match bootstrap_connection(&mut socket, &arena, player_id).await {
        Ok(ctx) => ctx,
        Err(e) => {
            error!(error = ?e, "failed to bootstrap connection");
            let _ = socket
                .send(Message::Close(Some(CloseFrame {
                    code: close_code::ERROR,
                    reason: "bootstrap failed".into(),
                })))
                .await;
            let _ = socket.close().await;
            return;
        }
    };

    info!("client connected");

    // Main Client Loop
    if let Err(e) = run_client_loop(&mut socket, &mut ctx).await {
        warn!(error = ?e, "client loop exited with error");
    }
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<usize, NetError> {
    // Serialize message safely; log JSON errors instead of panicking
    let txt = serde_json::to_string(msg).map_err(NetError::Serialization)?;
    let bytes = txt.len();
    socket
        .send(Message::Text(txt.into()))
        .await
        .map_err(NetError::Ws)?;
    Ok(bytes)
}

struct ConnCtx {
    pub player_id: PlayerId,
    pub input_tx: mpsc::Sender<GameEvent>,
    pub dispatch_rx: broadcast::Receiver<Dispatch>,
    // Count resync snapshots requested for this client.
    pub resync_count: u64,

    pub msgs_in: u64,
    pub msgs_out: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,

    pub invalid_msgs: u32,

    pub last_input_full_log: Instant,
    pub last_lag_log: Instant,
    pub last_invalid_input_log: Instant,

    pub close_frame: Option<CloseFrame>,
}

async fn bootstrap_connection(
    socket: &mut WebSocket,
    arena: &ArenaHandle,
    player_id: PlayerId,
) -> Result<ConnCtx, NetError> {
    // Subscribe to outbound events *before* registering, so nothing addressed to this
    // player can be emitted ahead of the subscription.
    let dispatch_rx = arena.dispatch_tx.subscribe();

    // Send Identity Packet
    // Tell the client "This is who you are".
    let identity_msg = ServerMessage::Identity {
        player_id: wire_id(player_id),
    };
    let bytes_out = send_message(socket, &identity_msg).await?;

    // The player exists from here on, but stays invisible until it sets a username.
    arena
        .input_tx
        .send(GameEvent::Connect { player_id })
        .await
        .map_err(|_| NetError::InputClosed)?;

    let now = Instant::now()
        .checked_sub(LOG_THROTTLE)
        .unwrap_or_else(Instant::now);
    Ok(ConnCtx {
        player_id,
        input_tx: arena.input_tx.clone(),
        dispatch_rx,
        resync_count: 0,

        msgs_in: 0,
        msgs_out: 1,
        bytes_in: 0,
        bytes_out: bytes_out as u64,

        invalid_msgs: 0,

        last_input_full_log: now,
        last_lag_log: now,
        last_invalid_input_log: now,

        close_frame: None,
    })
}

enum LoopControl {
    Continue,
    Disconnect,
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_MSGS: u32 = 10;

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

// Maps a parsed client message to a world event; `None` means the payload failed validation.
fn to_game_event(player_id: PlayerId, msg: ClientMessage) -> Option<GameEvent> {
    let event = match msg {
        ClientMessage::SetUsername(name) => GameEvent::SetUsername { player_id, name },
        ClientMessage::Move(mv) => GameEvent::Move {
            player_id,
            movement: mv.into_movement()?,
        },
        ClientMessage::AreaAttack(attack) | ClientMessage::MobileCollisionAttack(attack) => {
            GameEvent::Attack {
                player_id,
                facing: facing_from_wire(attack.direction)?,
            }
        }
        ClientMessage::AttackAnimation(payload) => GameEvent::AttackAnimation { player_id, payload },
        ClientMessage::Respawn => GameEvent::Respawn { player_id },
    };
    Some(event)
}

// Animation frames are cosmetic and may be shed under load. Everything else, moves
// included, feeds combat and must reach the world task in delivery order.
async fn forward_event(
    input_tx: &mpsc::Sender<GameEvent>,
    event: GameEvent,
    last_input_full_log: &mut Instant,
) -> Result<LoopControl, NetError> {
    let sheddable = match &event {
        GameEvent::AttackAnimation { player_id, .. } => Some(*player_id),
        _ => None,
    };
    let Some(player_id) = sheddable else {
        input_tx
            .send(event)
            .await
            .map_err(|_| NetError::InputClosed)?;
        return Ok(LoopControl::Continue);
    };

    match input_tx.try_send(event) {
        Ok(()) => Ok(LoopControl::Continue),
        Err(mpsc::error::TrySendError::Full(_evt)) => {
            if should_log(last_input_full_log) {
                warn!(player_id, "input channel full; dropping animation");
            }
            Ok(LoopControl::Continue)
        }
        Err(mpsc::error::TrySendError::Closed(_evt)) => Err(NetError::InputClosed),
    }
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<(), NetError> {
    let player_id = ctx.player_id;

    // Split borrows so `tokio::select!` can hold them concurrently.
    let ConnCtx {
        input_tx,
        dispatch_rx,
        resync_count,
        msgs_in,
        msgs_out,
        bytes_in,
        bytes_out,
        invalid_msgs,
        last_input_full_log,
        last_lag_log,
        last_invalid_input_log,
        close_frame,
        ..
    } = ctx;

    let mut fatal: Option<NetError> = None;

    loop {
        // disconnect becomes true on error
        let disconnect: bool = tokio::select! {
            // Incoming Message from Client
            incoming = socket.recv() => {
                match handle_incoming_ws(
                    incoming,
                    player_id,
                    input_tx,
                    msgs_in,
                    bytes_in,
                    invalid_msgs,
                    last_input_full_log,
                    last_invalid_input_log,
                    close_frame,
                ).await {
                    Ok(LoopControl::Continue) => false,
                    Ok(LoopControl::Disconnect) => true,
                    Err(e) => {
                        fatal = Some(e);
                        true
                    }
                }
            }

            // Outgoing events addressed to this player
            dispatch = dispatch_rx.recv() => {
                match dispatch {
                    Ok(dispatch) if dispatch.recipients.includes(player_id) => {
                        match forward_bytes(dispatch.bytes, socket, msgs_out, bytes_out).await {
                            LoopControl::Continue => false,
                            LoopControl::Disconnect => true,
                        }
                    }
                    Ok(_) => false,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        if should_log(last_lag_log) {
                            warn!(missed = n, "outbound events lagged; requesting snapshot");
                        }

                        // Resync strategy: ask the world task for a fresh snapshot.
                        *resync_count += 1;
                        match input_tx.try_send(GameEvent::Resync { player_id }) {
                            Ok(()) => {
                                debug!(player_id, count = *resync_count, "requested resync snapshot");
                                false
                            }
                            Err(mpsc::error::TrySendError::Full(_)) => {
                                // A later lag will retry; the snapshot is idempotent.
                                false
                            }
                            Err(mpsc::error::TrySendError::Closed(_)) => {
                                fatal = Some(NetError::InputClosed);
                                true
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        fatal = Some(NetError::OutboundClosed);
                        true
                    }
                }
            }
        };

        if disconnect {
            if let Some(frame) = close_frame.take() {
                let _ = socket.send(Message::Close(Some(frame))).await;
            }
            if let Err(err) = socket.close().await.map_err(NetError::Ws) {
                debug!(error = ?err, "socket close error");
            }
            break;
        }
    }

    if let Err(e) = disconnect_cleanup(
        player_id,
        input_tx,
        *msgs_in,
        *msgs_out,
        *bytes_in,
        *bytes_out,
        *invalid_msgs,
        *resync_count,
    )
    .await
    {
        warn!(error = ?e, "error during disconnect cleanup");
        if fatal.is_none() {
            fatal = Some(e);
        }
    }

    if let Some(err) = fatal {
        Err(err)
    } else {
        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
async fn handle_incoming_ws(
    incoming: Option<Result<Message, Error>>,
    player_id: PlayerId,
    input_tx: &mpsc::Sender<GameEvent>,
    msgs_in: &mut u64,
    bytes_in: &mut u64,
    invalid_msgs: &mut u32,
    last_input_full_log: &mut Instant,
    last_invalid_input_log: &mut Instant,
    close_frame: &mut Option<CloseFrame>,
) -> Result<LoopControl, NetError> {
    match incoming {
        Some(Ok(msg)) => match msg {
            Message::Text(text) => {
                *msgs_in += 1;
                *bytes_in += text.len() as u64;

                let parsed = serde_json::from_str::<ClientMessage>(&text)
                    .map_err(|e| e.to_string())
                    .and_then(|msg| {
                        to_game_event(player_id, msg).ok_or_else(|| "invalid direction".to_string())
                    });

                match parsed {
                    Ok(event) => {
                        // Only an unbroken run of invalid messages closes the socket.
                        *invalid_msgs = 0;
                        forward_event(input_tx, event, last_input_full_log).await
                    }
                    Err(reason) => {
                        // Malformed events are a no-op for the arena.
                        *invalid_msgs += 1;
                        if should_log(last_invalid_input_log) {
                            warn!(
                                player_id,
                                bytes = text.len(),
                                error = %reason,
                                "failed to parse client message"
                            );
                        }

                        if *invalid_msgs > MAX_INVALID_MSGS {
                            *close_frame = Some(CloseFrame {
                                code: close_code::POLICY,
                                reason: "too many invalid messages".into(),
                            });
                            return Ok(LoopControl::Disconnect);
                        }

                        Ok(LoopControl::Continue)
                    }
                }
            }
            Message::Binary(_) => {
                *close_frame = Some(CloseFrame {
                    code: close_code::UNSUPPORTED,
                    reason: "binary messages not supported".into(),
                });
                Ok(LoopControl::Disconnect)
            }
            Message::Ping(_) | Message::Pong(_) => Ok(LoopControl::Continue),
            Message::Close(_) => Ok(LoopControl::Disconnect),
        },
        Some(Err(e)) => {
            warn!(player_id, error = %e, "websocket recv error");
            Ok(LoopControl::Disconnect)
        }
        None => {
            info!(player_id, "websocket closed");
            Ok(LoopControl::Disconnect)
        }
    }
}

async fn forward_bytes(
    bytes: Utf8Bytes,
    socket: &mut WebSocket,
    msgs_out: &mut u64,
    bytes_out: &mut u64,
) -> LoopControl {
    let bytes_len = bytes.len();
    match socket
        .send(Message::Text(bytes))
        .await
        .map_err(NetError::Ws)
    {
        Ok(()) => {
            *msgs_out += 1;
            *bytes_out += bytes_len as u64;
            LoopControl::Continue
        }
        Err(err) => {
            // Only this connection is affected; disconnect will follow immediately.
            warn!(error = ?err, "failed to send outbound event");
            LoopControl::Disconnect
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn disconnect_cleanup(
    player_id: PlayerId,
    input_tx: &mpsc::Sender<GameEvent>,
    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,
    invalid_msgs: u32,
    resync_count: u64,
) -> Result<(), NetError> {
    // Despawn and announce the departure to everyone still connected.
    input_tx
        .send(GameEvent::Disconnect { player_id })
        .await
        .map_err(|_| NetError::InputClosed)?;

    debug!(
        player_id,
        msgs_in,
        msgs_out,
        bytes_in,
        bytes_out,
        invalid_msgs,
        resync_count,
        "connection stats"
    );
    info!(player_id, "client disconnected");
    Ok(())
}
