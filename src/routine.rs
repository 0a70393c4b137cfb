//! Routine scheduler
//!
//! The daily brain of the bot: a fixed-interval poll that reads the world
//! clock and dispatches at most one task per tick. Nights always win over
//! the day-parity routing, and each day's task fires at most once, tracked
//! by `last_processed_day`.
//!
//! Handler failures are caught at the tick boundary; nothing a handler does
//! can stop the loop. The only re-entry besides the poll timer is the wake
//! notification after a night's sleep, delivered through the session's tick
//! nudge.

use crate::config::RoutineConfig;
use crate::farming;
use crate::rest;
use crate::services::WorldClock;
use crate::session::SessionState;
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Value of `last_processed_day` before any day has been handled.
pub const DAY_SENTINEL: i64 = -1;

/// What the scheduler is currently doing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ActiveTask {
    #[default]
    Idle,
    Sleeping,
    Farming,
    Roaming,
}

/// A task dispatch chosen by [`decide`] or forced by a chat command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickAction {
    Sleep,
    Farm,
    Roam,
}

/// The scheduler's working state. Created fresh at session ready and
/// dropped whole on disconnect; nothing in here survives a reconnect.
#[derive(Clone, Debug)]
pub struct RoutineState {
    /// True from a successful rest until the wake notification.
    pub sleeping: bool,
    /// Set by the `stop` chat command; cleared by `start`.
    pub paused: bool,
    /// Day index of the last daily dispatch, [`DAY_SENTINEL`] before the
    /// first.
    pub last_processed_day: i64,
    pub active_task: ActiveTask,
    /// Cursor into the patrol route, wrapping.
    pub patrol_index: usize,
}

impl RoutineState {
    pub fn new() -> Self {
        Self {
            sleeping: false,
            paused: false,
            last_processed_day: DAY_SENTINEL,
            active_task: ActiveTask::Idle,
            patrol_index: 0,
        }
    }
}

impl Default for RoutineState {
    fn default() -> Self {
        Self::new()
    }
}

/// The transition function, evaluated once per tick.
///
/// Rules, in priority order:
/// 1. `sleeping`: no dispatch, no mutation.
/// 2. Night window: dispatch Sleep *without* touching
///    `last_processed_day`, so the skipped day's task still runs if the
///    bot wakes before the day rolls over.
/// 3. A day index not seen before: record it, then Farm on odd days and
///    Roam on even days.
/// 4. Otherwise nothing.
pub fn decide(
    state: &mut RoutineState,
    clock: &WorldClock,
    routine: &RoutineConfig,
) -> Option<TickAction> {
    if state.sleeping {
        return None;
    }
    if routine.is_night(clock.time_of_day) {
        return Some(TickAction::Sleep);
    }
    let day = clock.day();
    if day != state.last_processed_day {
        state.last_processed_day = day;
        if day % 2 == 1 {
            return Some(TickAction::Farm);
        }
        return Some(TickAction::Roam);
    }
    None
}

/// Run the scheduler until the session is torn down.
pub async fn run(sess: Arc<SessionState>) {
    let mut interval = tokio::time::interval(sess.config.timing.tick_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = sess.cancel.cancelled() => break,
            _ = interval.tick() => {}
            _ = sess.tick_nudge.notified() => {}
        }
        tick_once(&sess).await;
    }
    debug!("routine scheduler stopped");
}

/// One scheduler tick: drain any forced command, consult [`decide`], run
/// the chosen handler, and contain its failure.
pub async fn tick_once(sess: &Arc<SessionState>) {
    if sess.routine_state().sleeping {
        return;
    }

    let forced = sess.take_forced();
    let action = match forced {
        Some(action) => Some(action),
        None => {
            if sess.routine_state().paused {
                None
            } else {
                match sess.services.world.clock().await {
                    Ok(clock) => {
                        let mut state = sess.routine.lock().unwrap_or_else(|p| p.into_inner());
                        decide(&mut state, &clock, &sess.config.routine)
                    }
                    Err(e) => {
                        warn!(error = %e, "clock read failed; skipping tick");
                        None
                    }
                }
            }
        }
    };

    // A roam in progress keeps stepping on otherwise idle ticks.
    let action = action.or_else(|| {
        let state = sess.routine_state();
        if state.active_task == ActiveTask::Roaming && !state.paused {
            Some(TickAction::Roam)
        } else {
            None
        }
    });

    let result = match action {
        Some(TickAction::Sleep) => rest::go_to_bed(sess).await,
        Some(TickAction::Farm) => farming::run_farm_day(sess).await,
        Some(TickAction::Roam) => rest::roam_step(sess).await,
        None => Ok(()),
    };

    if let Err(e) = result {
        warn!(error = %e, ?action, "task handler failed");
        sess.journal.record(&format!("task failed: {}", e));
    }
}
