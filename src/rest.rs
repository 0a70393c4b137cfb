//! Sleep and roam handlers
//!
//! Sleep runs when the scheduler sees night: find a bed, walk over, lie
//! down, and hold the `sleeping` flag until the server's wake notification.
//! Roam is the even-day task: step around the patrol route one waypoint per
//! tick until night puts the bot to bed.

use crate::block::{BlockPos, BlockTarget};
use crate::config::PatrolConfig;
use crate::error::StewardError;
use crate::routine::ActiveTask;
use crate::session::SessionState;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Open the configured door if it reports itself closed. Failures are
/// logged and ignored; a stuck door just means a longer walk.
pub async fn open_door(sess: &SessionState) {
    let Some(door) = sess.config.places.door else {
        return;
    };
    match sess.services.world.block_at(door).await {
        Ok(Some(block)) if block.is_closed_door() => {
            match sess.services.actions.activate(door).await {
                Ok(()) => debug!(%door, "opened door"),
                Err(e) => warn!(%door, error = %e, "failed to open door"),
            }
        }
        Ok(_) => {}
        Err(e) => warn!(%door, error = %e, "door lookup failed"),
    }
}

/// Locate a bed and sleep in it.
///
/// No bed within range is a quiet no-op; the next tick looks again. On
/// success the `sleeping` flag goes up and a watcher task waits for the
/// wake signal, which drops the flag and immediately re-runs the scheduler.
pub async fn go_to_bed(sess: &Arc<SessionState>) -> Result<(), StewardError> {
    if sess.routine_state().sleeping {
        return Ok(());
    }

    let places = &sess.config.places;
    let bed = sess
        .services
        .world
        .find_nearest(
            BlockTarget::Bed,
            places.bed_search_center,
            sess.config.tunables.search_radius,
        )
        .await?;
    let Some(bed) = bed else {
        debug!("no bed found");
        return Ok(());
    };
    if let Some(area) = &places.bed_area {
        if !area.contains(bed.pos) {
            debug!(pos = %bed.pos, "bed outside configured area");
            return Ok(());
        }
    }

    open_door(sess).await;
    sess.navigate(bed.pos).await?;
    let wake = sess.services.actions.rest(bed.pos).await?;

    sess.with_routine(|state| {
        state.sleeping = true;
        state.active_task = ActiveTask::Sleeping;
    });
    info!(pos = %bed.pos, "sleeping");
    sess.journal.record("sleeping");

    let watcher = sess.clone();
    sess.spawn_scoped(async move {
        let _ = wake.await;
        watcher.with_routine(|state| {
            state.sleeping = false;
            state.active_task = ActiveTask::Idle;
        });
        info!("woke up");
        watcher.journal.record("woke up");
        watcher.tick_nudge.notify_one();
    });

    Ok(())
}

/// The next patrol goal: either the wrapping four-point route or a random
/// offset from the center, per configuration.
pub fn next_waypoint(patrol: &PatrolConfig, cursor: &mut usize) -> BlockPos {
    // A misconfigured negative radius collapses to patrolling in place.
    let r = patrol.radius.max(0);
    if patrol.randomized {
        let mut rng = rand::thread_rng();
        let dx = rng.gen_range(-r..=r);
        let dz = rng.gen_range(-r..=r);
        return patrol.center.offset(dx, 0, dz);
    }
    let route = [
        patrol.center.offset(-r, 0, 0),
        patrol.center.offset(r, 0, 0),
        patrol.center.offset(0, 0, -r),
        patrol.center.offset(0, 0, r),
    ];
    let goal = route[*cursor % route.len()];
    *cursor = (*cursor + 1) % route.len();
    goal
}

/// One roam step: mark the task active, advance the cursor, walk to the
/// waypoint. The scheduler keeps calling this on idle ticks until night.
pub async fn roam_step(sess: &Arc<SessionState>) -> Result<(), StewardError> {
    let goal = sess.with_routine(|state| {
        state.active_task = ActiveTask::Roaming;
        next_waypoint(&sess.config.patrol, &mut state.patrol_index)
    });
    debug!(%goal, "roaming");
    open_door(sess).await;
    sess.navigate(goal).await?;
    Ok(())
}
