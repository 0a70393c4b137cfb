//! Vital maintenance: eat when hungry
//!
//! Runs on its own timer, independent of the daily routine. A reentrancy
//! latch keeps overlapping checks from double-consuming; the latch is
//! cleared on every path out.

use crate::error::StewardError;
use crate::item;
use crate::session::SessionState;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// One hunger check. Returns whether anything was eaten.
pub async fn eat_if_hungry(sess: &Arc<SessionState>) -> Result<bool, StewardError> {
    if sess.is_eating.swap(true, Ordering::SeqCst) {
        // Another check is mid-bite.
        return Ok(false);
    }
    let result = eat_inner(sess).await;
    sess.is_eating.store(false, Ordering::SeqCst);
    result
}

async fn eat_inner(sess: &Arc<SessionState>) -> Result<bool, StewardError> {
    let satiation = sess.services.world.satiation().await?;
    if satiation >= sess.config.tunables.eat_threshold {
        return Ok(false);
    }

    let _lease = sess.inventory_lease.lock().await;
    let held = sess.services.holdings.held_items().await?;
    let Some(food) = held.iter().find(|stack| item::is_edible(&stack.name)) else {
        debug!(satiation, "hungry but nothing edible held");
        return Ok(false);
    };

    sess.services.holdings.equip(&food.name).await?;
    sess.services.actions.consume_equipped().await?;
    debug!(item = %food.name, satiation, "ate");
    Ok(true)
}

/// The vitals timer loop, torn down with the session.
pub async fn run(sess: Arc<SessionState>) {
    let mut interval = tokio::time::interval(sess.config.timing.vitals_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = sess.cancel.cancelled() => break,
            _ = interval.tick() => {}
        }
        if let Err(e) = eat_if_hungry(&sess).await {
            warn!(error = %e, "hunger check failed");
        }
    }
    debug!("vitals timer stopped");
}
