use super::room::{Room, RoomNotice};
use super::types::{JoinAccepted, RoomCommand, RoomSummary, RoomUpdate};
use crate::domain::ports::Clock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Ticks a room that never got its first human are closed after this long.
const EMPTY_ROOM_GRACE: Duration = Duration::from_secs(10);

/// Drives one room at a fixed tick until its last human leaves.
///
/// Commands are drained at tick boundaries, so a burst of inputs inside one tick window
/// collapses into the last one written.
pub async fn room_task(
    mut room: Room,
    mut command_rx: mpsc::Receiver<RoomCommand>,
    update_tx: broadcast::Sender<RoomUpdate>,
    summary_tx: watch::Sender<RoomSummary>,
    tick_interval: Duration,
    clock: Arc<dyn Clock>,
) {
    let room_id = room.id().clone();
    let mut interval = tokio::time::interval(tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let grace_ticks = (EMPTY_ROOM_GRACE.as_millis() / tick_interval.as_millis().max(1)) as u64;
    let mut ticks: u64 = 0;
    let mut had_humans = false;

    info!(room_id = %room_id, "room opened");

    'run: loop {
        interval.tick().await;
        ticks += 1;
        let now_ms = clock.now_ms();

        loop {
            match command_rx.try_recv() {
                Ok(RoomCommand::Shutdown) => break 'run,
                Ok(cmd) => handle_command(&mut room, cmd, now_ms),
                Err(mpsc::error::TryRecvError::Empty) => break,
                // Every handle is gone; nobody can reach this room any more.
                Err(mpsc::error::TryRecvError::Disconnected) => break 'run,
            }
        }

        let humans = room.human_count();
        if humans > 0 {
            had_humans = true;
        } else if had_humans || ticks > grace_ticks {
            break;
        }

        let snapshot = room.tick(now_ms);
        // Send errors only mean nobody is subscribed right now.
        let _ = update_tx.send(RoomUpdate::Snapshot(Arc::new(snapshot)));
        for notice in room.drain_notices() {
            let update = match notice {
                RoomNotice::Chat(msg) => RoomUpdate::Chat(msg),
                RoomNotice::Toast(text) => RoomUpdate::Toast(text),
            };
            let _ = update_tx.send(update);
        }

        let summary = room.summary();
        summary_tx.send_if_modified(|current| {
            if *current == summary {
                return false;
            }
            *current = summary;
            true
        });
    }

    info!(room_id = %room_id, ticks, "room closed");
}

fn handle_command(room: &mut Room, cmd: RoomCommand, now_ms: u64) {
    match cmd {
        RoomCommand::Join { name, reply } => {
            let result = room.join(&name).map(|player_id| JoinAccepted {
                player_id,
                chat_history: room.chat_history(),
            });
            let joined = result.as_ref().ok().map(|a| a.player_id);
            // The caller may have given up waiting; undo the join so no ghost stays behind.
            if reply.send(result).is_err() {
                if let Some(player_id) = joined {
                    room.leave(player_id);
                }
            }
        }
        RoomCommand::Leave { player_id } => room.leave(player_id),
        RoomCommand::Input { player_id, input } => room.handle_input(player_id, input),
        RoomCommand::StrikeConfirm { player_id, x, y } => {
            if !room.confirm_strike(player_id, x, y, now_ms) {
                debug!(room_id = %room.id(), player_id, "strike confirm ignored");
            }
        }
        RoomCommand::PortalPlaceB { player_id, x, y } => {
            if !room.place_portal_b(player_id, x, y, now_ms) {
                debug!(room_id = %room.id(), player_id, "portal placement ignored");
            }
        }
        RoomCommand::MatchConfigure {
            player_id,
            duration_sec,
        } => {
            room.configure_match(player_id, duration_sec);
        }
        RoomCommand::MatchStart { player_id } => {
            room.start_match(player_id, now_ms);
        }
        RoomCommand::MatchRestart { player_id } => {
            room.restart_match(player_id);
        }
        RoomCommand::Chat { player_id, text } => {
            room.send_chat(player_id, &text, now_ms);
        }
        // Handled by the loop itself.
        RoomCommand::Shutdown => {}
    }
}
