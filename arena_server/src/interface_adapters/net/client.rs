use crate::domain::{EntityId, PlayerInput};
use crate::interface_adapters::protocol::{
    ChatMessageDto, ClientMessage, RoomSummaryDto, ServerMessage,
};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::rng::next_conn_id;
use crate::use_cases::{RoomCommand, RoomHandle, RoomRegistry, RoomUpdate};

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
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{Instrument, Span, debug, error, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Serialization(serde_json::Error),
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;
// Client dt is informational; the room steps with its own fixed dt.
const MAX_CLIENT_DT: f32 = 0.25;
const NOT_IN_ROOM: &str = "not in a room";

/// Serializes each room update once and broadcasts the shared bytes to every member.
pub async fn room_update_serializer(
    mut update_rx: broadcast::Receiver<RoomUpdate>,
    update_bytes_tx: broadcast::Sender<Utf8Bytes>,
    latest_state_tx: watch::Sender<Utf8Bytes>,
) {
    loop {
        match update_rx.recv().await {
            Ok(update) => {
                let is_state = matches!(update, RoomUpdate::Snapshot(_));
                let msg = ServerMessage::from(&update);
                let txt = match serde_json::to_string(&msg) {
                    Ok(txt) => txt,
                    Err(e) => {
                        error!(error = ?e, "failed to serialize room update");
                        continue;
                    }
                };

                let bytes = Utf8Bytes::from(txt);
                // Only full states are useful for lag recovery.
                if is_state {
                    let _ = latest_state_tx.send(bytes.clone());
                }
                let _ = update_bytes_tx.send(bytes);
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(
                    missed = n,
                    "room serializer lagged; skipping to latest update"
                );
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!("room updates channel closed; serializer exiting");
                break;
            }
        }
    }
}

pub fn spawn_room_serializer(room: &RoomHandle) {
    tokio::spawn(room_update_serializer(
        room.update_tx.subscribe(),
        room.update_bytes_tx.clone(),
        room.latest_state_tx.clone(),
    ));
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let room_registry = state.room_registry.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, room_registry))
}

async fn handle_socket(mut socket: WebSocket, room_registry: Arc<RoomRegistry>) {
    // Separate connection id for correlating logs before/after a room is joined.
    let conn_id = next_conn_id();
    let span = info_span!(
        "conn",
        conn_id,
        room_id = tracing::field::Empty,
        player_id = tracing::field::Empty
    );

    async move {
        info!("client connected");
        let mut ctx = ConnCtx::new();
        run_client_loop(&mut socket, &room_registry, &mut ctx).await;
        disconnect_cleanup(&mut ctx).await;
    }
    .instrument(span)
    .await
}

/// Membership of a connection in one room.
struct RoomSession {
    handle: RoomHandle,
    player_id: EntityId,
    update_bytes_rx: broadcast::Receiver<Utf8Bytes>,
    latest_state_rx: watch::Receiver<Utf8Bytes>,
}

struct ConnCtx {
    // None while the client browses the directory.
    room: Option<RoomSession>,
    // Count lag recovery snapshots sent to this client.
    lag_recovery_count: u64,

    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,

    invalid_json: u32,

    last_input_full_log: Instant,
    last_room_lag_log: Instant,
    last_invalid_input_log: Instant,

    close_frame: Option<CloseFrame>,
}

impl ConnCtx {
    fn new() -> Self {
        let now = Instant::now() - LOG_THROTTLE;
        Self {
            room: None,
            lag_recovery_count: 0,
            msgs_in: 0,
            msgs_out: 0,
            bytes_in: 0,
            bytes_out: 0,
            invalid_json: 0,
            last_input_full_log: now,
            last_room_lag_log: now,
            last_invalid_input_log: now,
            close_frame: None,
        }
    }
}

enum LoopControl {
    Continue,
    Disconnect,
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<usize, NetError> {
    let txt = serde_json::to_string(msg).map_err(NetError::Serialization)?;
    let bytes = txt.len();
    socket
        .send(Message::Text(txt.into()))
        .await
        .map_err(NetError::Ws)?;
    Ok(bytes)
}

async fn reply(socket: &mut WebSocket, ctx: &mut ConnCtx, msg: &ServerMessage) -> LoopControl {
    match send_message(socket, msg).await {
        Ok(bytes) => {
            ctx.msgs_out += 1;
            ctx.bytes_out += bytes as u64;
            LoopControl::Continue
        }
        Err(err) => {
            warn!(error = ?err, "failed to send reply");
            LoopControl::Disconnect
        }
    }
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

fn sanitize_input(mut input: PlayerInput) -> Option<PlayerInput> {
    if !input.aim.x.is_finite() || !input.aim.y.is_finite() || !input.dt.is_finite() {
        return None;
    }

    input.dt = input.dt.clamp(0.0, MAX_CLIENT_DT);

    Some(input)
}

fn process_input_message(ctx: &mut ConnCtx, input: PlayerInput) {
    let Some(session) = ctx.room.as_ref() else {
        if should_log(&mut ctx.last_invalid_input_log) {
            debug!("input outside a room ignored");
        }
        return;
    };
    let player_id = session.player_id;

    let Some(input) = sanitize_input(input) else {
        if should_log(&mut ctx.last_invalid_input_log) {
            warn!(player_id, "invalid input values (NaN/inf); dropping");
        }
        return;
    };

    match session
        .handle
        .command_tx
        .try_send(RoomCommand::Input { player_id, input })
    {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(_cmd)) => {
            if should_log(&mut ctx.last_input_full_log) {
                warn!(player_id, "room command channel full; dropping input");
            }
        }
        Err(mpsc::error::TrySendError::Closed(_cmd)) => {
            debug!(player_id, "room closed; detaching");
            ctx.room = None;
        }
    }
}

/// Sends a command that needs the caller to be a room member.
async fn room_command<F>(socket: &mut WebSocket, ctx: &mut ConnCtx, build: F) -> LoopControl
where
    F: FnOnce(EntityId) -> RoomCommand,
{
    let Some(session) = ctx.room.as_ref() else {
        let msg = ServerMessage::Error {
            message: NOT_IN_ROOM.to_string(),
        };
        return reply(socket, ctx, &msg).await;
    };

    let command = build(session.player_id);
    if session.handle.command_tx.send(command).await.is_err() {
        debug!("room closed; detaching");
        ctx.room = None;
        let msg = ServerMessage::Error {
            message: "room is closed".to_string(),
        };
        return reply(socket, ctx, &msg).await;
    }
    LoopControl::Continue
}

async fn join_room(
    socket: &mut WebSocket,
    room_registry: &RoomRegistry,
    ctx: &mut ConnCtx,
    room_id: &str,
    player_name: String,
) -> LoopControl {
    let (handle, accepted) = match room_registry.join_room(room_id, player_name).await {
        Ok(joined) => joined,
        Err(err) => {
            debug!(room_id, error = %err, "join rejected");
            let msg = ServerMessage::Error {
                message: err.to_string(),
            };
            return reply(socket, ctx, &msg).await;
        }
    };

    let span = Span::current();
    span.record("room_id", &*handle.room_id);
    span.record("player_id", accepted.player_id);
    info!(room_id = %handle.room_id, player_id = accepted.player_id, "joined room");

    let joined = ServerMessage::RoomJoined {
        room_id: handle.room_id.to_string(),
        player_id: accepted.player_id,
    };
    ctx.room = Some(RoomSession {
        update_bytes_rx: handle.update_bytes_tx.subscribe(),
        latest_state_rx: handle.latest_state_tx.subscribe(),
        player_id: accepted.player_id,
        handle,
    });

    if let LoopControl::Disconnect = reply(socket, ctx, &joined).await {
        return LoopControl::Disconnect;
    }
    let history = ServerMessage::ChatHistory(
        accepted
            .chat_history
            .iter()
            .map(ChatMessageDto::from)
            .collect(),
    );
    reply(socket, ctx, &history).await
}

/// Drops the current membership, if any, and tells the room the player is gone.
async fn leave_room(ctx: &mut ConnCtx) -> Option<Arc<str>> {
    let session = ctx.room.take()?;
    let player_id = session.player_id;
    if session
        .handle
        .command_tx
        .send(RoomCommand::Leave { player_id })
        .await
        .is_err()
    {
        debug!(player_id, "room already closed on leave");
    }
    info!(room_id = %session.handle.room_id, player_id, "left room");
    Some(session.handle.room_id)
}

async fn leave_and_notify(socket: &mut WebSocket, ctx: &mut ConnCtx) -> LoopControl {
    match leave_room(ctx).await {
        Some(room_id) => {
            let msg = ServerMessage::RoomLeft {
                room_id: room_id.to_string(),
            };
            reply(socket, ctx, &msg).await
        }
        None => LoopControl::Continue,
    }
}

async fn handle_client_message(
    socket: &mut WebSocket,
    room_registry: &Arc<RoomRegistry>,
    ctx: &mut ConnCtx,
    msg: ClientMessage,
) -> LoopControl {
    match msg {
        ClientMessage::Ping(ping) => reply(socket, ctx, &ServerMessage::Pong { t: ping.t }).await,
        ClientMessage::ListRooms => {
            let rooms = room_registry
                .list_rooms()
                .await
                .into_iter()
                .map(RoomSummaryDto::from)
                .collect();
            reply(socket, ctx, &ServerMessage::RoomList(rooms)).await
        }
        ClientMessage::CreateRoom(payload) => {
            if let LoopControl::Disconnect = leave_and_notify(socket, ctx).await {
                return LoopControl::Disconnect;
            }
            let room = room_registry.create_room(payload.settings()).await;
            spawn_room_serializer(&room);

            let created = ServerMessage::RoomCreated {
                room_id: room.room_id.to_string(),
            };
            if let LoopControl::Disconnect = reply(socket, ctx, &created).await {
                return LoopControl::Disconnect;
            }
            join_room(
                socket,
                room_registry,
                ctx,
                &room.room_id,
                payload.player_name,
            )
            .await
        }
        ClientMessage::JoinRoom(payload) => {
            if let LoopControl::Disconnect = leave_and_notify(socket, ctx).await {
                return LoopControl::Disconnect;
            }
            join_room(
                socket,
                room_registry,
                ctx,
                &payload.room_id,
                payload.player_name,
            )
            .await
        }
        ClientMessage::LeaveRoom => leave_and_notify(socket, ctx).await,
        ClientMessage::Input(input) => {
            process_input_message(ctx, input.into());
            LoopControl::Continue
        }
        ClientMessage::StrikeConfirm(p) => {
            room_command(socket, ctx, |player_id| RoomCommand::StrikeConfirm {
                player_id,
                x: p.x,
                y: p.y,
            })
            .await
        }
        ClientMessage::PortalPlaceB(p) => {
            room_command(socket, ctx, |player_id| RoomCommand::PortalPlaceB {
                player_id,
                x: p.x,
                y: p.y,
            })
            .await
        }
        ClientMessage::MatchConfigure(payload) => {
            room_command(socket, ctx, |player_id| RoomCommand::MatchConfigure {
                player_id,
                duration_sec: payload.duration_sec,
            })
            .await
        }
        ClientMessage::MatchStart => {
            room_command(socket, ctx, |player_id| RoomCommand::MatchStart { player_id }).await
        }
        ClientMessage::MatchRestart => {
            room_command(socket, ctx, |player_id| RoomCommand::MatchRestart {
                player_id,
            })
            .await
        }
        ClientMessage::ChatSend(payload) => {
            room_command(socket, ctx, |player_id| RoomCommand::Chat {
                player_id,
                text: payload.text,
            })
            .await
        }
    }
}

async fn next_room_bytes(
    room: &mut Option<RoomSession>,
) -> Result<Utf8Bytes, broadcast::error::RecvError> {
    match room {
        Some(session) => session.update_bytes_rx.recv().await,
        // Directory-only connections have no room stream.
        None => std::future::pending().await,
    }
}

async fn run_client_loop(
    socket: &mut WebSocket,
    room_registry: &Arc<RoomRegistry>,
    ctx: &mut ConnCtx,
) {
    loop {
        let control = tokio::select! {
            // Incoming Message from Client
            incoming = socket.recv() => {
                handle_incoming_ws(socket, incoming, room_registry, ctx).await
            }

            // Outgoing Room Update
            room_msg = next_room_bytes(&mut ctx.room) => {
                forward_room_update(socket, room_msg, ctx).await
            }
        };

        if let LoopControl::Disconnect = control {
            if let Some(frame) = ctx.close_frame.take() {
                let _ = socket.send(Message::Close(Some(frame))).await;
            }
            if let Err(err) = socket.close().await.map_err(NetError::Ws) {
                debug!(error = ?err, "socket close error");
            }
            return;
        }
    }
}

async fn handle_incoming_ws(
    socket: &mut WebSocket,
    incoming: Option<Result<Message, Error>>,
    room_registry: &Arc<RoomRegistry>,
    ctx: &mut ConnCtx,
) -> LoopControl {
    match incoming {
        Some(Ok(msg)) => match msg {
            Message::Text(text) => {
                ctx.msgs_in += 1;
                ctx.bytes_in += text.len() as u64;

                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(msg) => handle_client_message(socket, room_registry, ctx, msg).await,
                    Err(parse_err) => {
                        ctx.invalid_json += 1;
                        if should_log(&mut ctx.last_invalid_input_log) {
                            warn!(
                                bytes = text.len(),
                                error = %parse_err,
                                "failed to parse client message"
                            );
                        }

                        if ctx.invalid_json > MAX_INVALID_JSON {
                            ctx.close_frame = Some(CloseFrame {
                                code: close_code::POLICY,
                                reason: "too many invalid messages".into(),
                            });
                            return LoopControl::Disconnect;
                        }

                        LoopControl::Continue
                    }
                }
            }
            Message::Binary(_) => {
                ctx.close_frame = Some(CloseFrame {
                    code: close_code::UNSUPPORTED,
                    reason: "binary messages not supported".into(),
                });
                LoopControl::Disconnect
            }
            Message::Ping(_) | Message::Pong(_) => LoopControl::Continue,
            Message::Close(_) => LoopControl::Disconnect,
        },
        Some(Err(e)) => {
            warn!(error = %e, "websocket recv error");
            LoopControl::Disconnect
        }
        None => {
            info!("websocket closed");
            LoopControl::Disconnect
        }
    }
}

async fn forward_room_update(
    socket: &mut WebSocket,
    room_msg: Result<Utf8Bytes, broadcast::error::RecvError>,
    ctx: &mut ConnCtx,
) -> LoopControl {
    match room_msg {
        Ok(bytes) => forward_bytes(bytes, socket, ctx).await,
        Err(broadcast::error::RecvError::Lagged(n)) => {
            if should_log(&mut ctx.last_room_lag_log) {
                warn!(missed = n, "room updates lagged; sending latest state");
            }

            // Resync strategy: send the latest full state.
            let latest = match ctx.room.as_ref() {
                Some(session) => session.latest_state_rx.borrow().clone(),
                None => return LoopControl::Continue,
            };
            if latest.is_empty() {
                return LoopControl::Continue;
            }

            let bytes_len = latest.len();
            ctx.lag_recovery_count += 1;
            let outcome = forward_bytes(latest, socket, ctx).await;
            if should_log(&mut ctx.last_room_lag_log) {
                debug!(
                    bytes = bytes_len,
                    count = ctx.lag_recovery_count,
                    "sent lag recovery state"
                );
            }
            outcome
        }
        Err(broadcast::error::RecvError::Closed) => {
            debug!("room update stream closed; detaching");
            ctx.room = None;
            LoopControl::Continue
        }
    }
}

async fn forward_bytes(bytes: Utf8Bytes, socket: &mut WebSocket, ctx: &mut ConnCtx) -> LoopControl {
    let bytes_len = bytes.len();
    match socket.send(Message::Text(bytes)).await.map_err(NetError::Ws) {
        Ok(()) => {
            ctx.msgs_out += 1;
            ctx.bytes_out += bytes_len as u64;
            LoopControl::Continue
        }
        Err(err) => {
            // Disconnect follows immediately.
            warn!(error = ?err, "failed to send room update");
            LoopControl::Disconnect
        }
    }
}

async fn disconnect_cleanup(ctx: &mut ConnCtx) {
    leave_room(ctx).await;

    debug!(
        msgs_in = ctx.msgs_in,
        msgs_out = ctx.msgs_out,
        bytes_in = ctx.bytes_in,
        bytes_out = ctx.bytes_out,
        invalid_json = ctx.invalid_json,
        lag_recovery_count = ctx.lag_recovery_count,
        "connection stats"
    );
    info!("client disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Vec2;

    #[test]
    fn when_aim_is_not_finite_then_input_is_dropped() {
        let input = PlayerInput {
            aim: Vec2::new(f32::INFINITY, 0.0),
            ..PlayerInput::default()
        };
        assert!(sanitize_input(input).is_none());
    }

    #[test]
    fn when_dt_is_out_of_range_then_it_is_clamped() {
        let input = PlayerInput {
            dt: 5.0,
            ..PlayerInput::default()
        };
        let sanitized = sanitize_input(input).expect("finite input");
        assert_eq!(sanitized.dt, MAX_CLIENT_DT);

        let input = PlayerInput {
            dt: -1.0,
            ..PlayerInput::default()
        };
        assert_eq!(sanitize_input(input).expect("finite input").dt, 0.0);
    }

    #[test]
    fn when_logged_recently_then_should_log_throttles() {
        let mut last = Instant::now() - LOG_THROTTLE;
        assert!(should_log(&mut last));
        assert!(!should_log(&mut last));
    }
}
