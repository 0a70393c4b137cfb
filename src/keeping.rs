//! Chest and furnace keeping: store, retrieve, smelt
//!
//! Container discipline is the invariant here: every open window is closed
//! on every exit path, including after a failed transfer. A window left
//! open across ticks wedges the session.

use crate::error::StewardError;
use crate::item::{self, ItemStack};
use crate::rest;
use crate::services::FurnaceSlot;
use crate::session::SessionState;
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Deposit every held stack not on the keep-list into the home chest.
pub async fn store_surplus(sess: &Arc<SessionState>) -> Result<(), StewardError> {
    let chest_pos = sess.config.places.chest;
    let _lease = sess.inventory_lease.lock().await;

    rest::open_door(sess).await;
    sess.navigate(chest_pos).await?;

    let held = sess.services.holdings.held_items().await?;
    let mut chest = sess.services.holdings.open_container(chest_pos).await?;

    let mut stored = 0u32;
    let mut result = Ok(());
    for stack in held {
        if item::on_keep_list(&stack.name, &sess.config.keep_items) {
            continue;
        }
        match chest.deposit(&stack.name, stack.count, None).await {
            Ok(()) => stored += stack.count,
            Err(e) => {
                result = Err(e);
                break;
            }
        }
    }
    chest.close().await;

    if stored > 0 {
        info!(stored, "stored surplus");
        sess.journal.record(&format!("stored {} items", stored));
    }
    result
}

/// Fetch up to `amount` of a named item from the home chest into holdings.
/// Returns `false`, without error, when the chest has none.
///
/// Callers hold the inventory lease; this does not take it again.
pub async fn retrieve_item(
    sess: &Arc<SessionState>,
    name: &str,
    amount: u32,
) -> Result<bool, StewardError> {
    let chest_pos = sess.config.places.chest;
    rest::open_door(sess).await;
    sess.navigate(chest_pos).await?;

    let mut chest = sess.services.holdings.open_container(chest_pos).await?;
    let result = chest.withdraw(name, amount).await;
    chest.close().await;

    match &result {
        Ok(true) => debug!(name, amount, "restocked from chest"),
        Ok(false) => debug!(name, "chest has none"),
        Err(_) => {}
    }
    result
}

/// One smelt pass: top up the furnace's empty slots from holdings, one item
/// each. Deposit-only; combustion is the server's business.
pub async fn smelt_once(sess: &Arc<SessionState>) -> Result<(), StewardError> {
    let furnace_pos = sess.config.places.furnace;
    let _lease = sess.inventory_lease.lock().await;

    let held = sess.services.holdings.held_items().await?;
    let fuel = held.iter().find(|stack| item::is_fuel(&stack.name));
    let input = held.iter().find(|stack| item::is_smeltable(&stack.name));
    if fuel.is_none() && input.is_none() {
        return Ok(());
    }

    rest::open_door(sess).await;
    sess.navigate(furnace_pos).await?;

    let mut furnace = sess.services.holdings.open_container(furnace_pos).await?;
    let result = feed_furnace(&mut *furnace, fuel, input).await;
    furnace.close().await;
    result
}

async fn feed_furnace(
    furnace: &mut dyn crate::services::ContainerHandle,
    fuel: Option<&ItemStack>,
    input: Option<&ItemStack>,
) -> Result<(), StewardError> {
    if let Some(fuel) = fuel {
        if furnace.slot_empty(FurnaceSlot::Fuel).await? {
            furnace
                .deposit(&fuel.name, 1, Some(FurnaceSlot::Fuel))
                .await?;
            debug!(item = %fuel.name, "fed furnace fuel");
        }
    }
    if let Some(input) = input {
        if furnace.slot_empty(FurnaceSlot::Input).await? {
            furnace
                .deposit(&input.name, 1, Some(FurnaceSlot::Input))
                .await?;
            debug!(item = %input.name, "fed furnace input");
        }
    }
    Ok(())
}

/// The smelt timer: an independent fixed-interval loop, decoupled from the
/// daily scheduler, torn down with the session.
pub async fn run_smelt_timer(sess: Arc<SessionState>) {
    let mut interval = tokio::time::interval(sess.config.timing.smelt_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = sess.cancel.cancelled() => break,
            _ = interval.tick() => {}
        }
        if let Err(e) = smelt_once(&sess).await {
            warn!(error = %e, "smelt pass failed");
        }
    }
    debug!("smelt timer stopped");
}
