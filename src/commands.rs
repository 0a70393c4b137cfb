//! Chat command surface
//!
//! A handful of literal tokens the operator can speak in chat. Disabled by
//! default; when enabled, optionally restricted to one authorized sender.
//! Forced tasks jump the day-parity gate but never the sleeping gate.

use crate::routine::TickAction;
use crate::session::SessionState;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Recognized command tokens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Pause the routine scheduler.
    Stop,
    /// Resume the routine scheduler.
    Start,
    Farm,
    Roam,
    Sleep,
    /// Walk to the sender.
    Come,
    /// Reply in chat with the current routine state.
    Status,
}

/// Parse one chat line into a command, if it is one.
pub fn parse(text: &str) -> Option<Command> {
    match text.trim().to_lowercase().as_str() {
        "stop" => Some(Command::Stop),
        "start" => Some(Command::Start),
        "farm" => Some(Command::Farm),
        "roam" => Some(Command::Roam),
        "sleep" => Some(Command::Sleep),
        "come" => Some(Command::Come),
        "status" => Some(Command::Status),
        _ => None,
    }
}

/// Handle one inbound chat line from a player.
pub async fn handle_chat(sess: &Arc<SessionState>, sender: &str, text: &str) {
    if !sess.config.chat.commands_enabled {
        return;
    }
    if let Some(authorized) = &sess.config.chat.authorized_sender {
        if sender != authorized {
            debug!(sender, "ignoring command from unauthorized sender");
            return;
        }
    }
    let Some(command) = parse(text) else {
        return;
    };
    info!(sender, ?command, "chat command");
    apply(sess, sender, command).await;
}

async fn apply(sess: &Arc<SessionState>, sender: &str, command: Command) {
    match command {
        Command::Stop => {
            sess.with_routine(|state| state.paused = true);
            sess.journal.record("routine paused by command");
            reply(sess, "Paused.").await;
        }
        Command::Start => {
            sess.with_routine(|state| state.paused = false);
            sess.tick_nudge.notify_one();
            sess.journal.record("routine resumed by command");
            reply(sess, "Resuming.").await;
        }
        Command::Farm => sess.push_forced(TickAction::Farm),
        Command::Roam => sess.push_forced(TickAction::Roam),
        Command::Sleep => sess.push_forced(TickAction::Sleep),
        Command::Come => {
            let sess = sess.clone();
            let sender = sender.to_string();
            let task = {
                let sess = sess.clone();
                async move {
                    match sess.services.world.player_position(&sender).await {
                        Ok(Some(pos)) => {
                            if let Err(e) = sess.navigate(pos).await {
                                warn!(error = %e, "come failed");
                            }
                        }
                        Ok(None) => debug!(sender, "come: sender not visible"),
                        Err(e) => warn!(error = %e, "come: player lookup failed"),
                    }
                }
            };
            sess.spawn_scoped(task);
        }
        Command::Status => {
            let state = sess.routine_state();
            let text = format!(
                "task={:?} day={} paused={} sleeping={}",
                state.active_task, state.last_processed_day, state.paused, state.sleeping
            );
            reply(sess, &text).await;
        }
    }
}

async fn reply(sess: &SessionState, text: &str) {
    if let Err(e) = sess.services.actions.send_chat(text).await {
        warn!(error = %e, "chat reply failed");
    }
}
