//! Farming day: crop scan, replanting, and bread crafting
//!
//! Odd days walk the bot out to the plot, harvest every fully-grown crop,
//! replant from holdings (restocking seeds from the chest when empty),
//! bake the wheat down to bread, and stash the surplus. Each cell of the
//! scan fails independently; a bad block never aborts the rest of the plot.

use crate::block::{BlockPos, CropKind};
use crate::error::StewardError;
use crate::keeping;
use crate::rest;
use crate::routine::ActiveTask;
use crate::session::SessionState;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The whole odd-day sequence: walk to the plot center, announce, farm,
/// craft, store. Runs with `active_task = Farming`; an error in any step
/// after the walk ends the day early, exactly like the source's single
/// try/catch around the routine.
pub async fn run_farm_day(sess: &Arc<SessionState>) -> Result<(), StewardError> {
    sess.with_routine(|state| state.active_task = ActiveTask::Farming);
    let result = farm_day_inner(sess).await;
    sess.with_routine(|state| {
        if state.active_task == ActiveTask::Farming {
            state.active_task = ActiveTask::Idle;
        }
    });
    result
}

async fn farm_day_inner(sess: &Arc<SessionState>) -> Result<(), StewardError> {
    rest::open_door(sess).await;
    sess.navigate(sess.config.patrol.center).await?;

    if sess.config.chat.announcements {
        let message = sess.config.chat.farming_message.clone();
        if let Err(e) = sess.services.actions.send_chat(&message).await {
            warn!(error = %e, "farming announcement failed");
        }
    }

    sess.journal.record("farming day started");
    farm_plot(sess).await?;
    craft_bread(sess).await?;
    keeping::store_surplus(sess).await?;
    sess.journal.record("farming day finished");
    Ok(())
}

/// Scan every (x, z) cell of the configured plot at soil level. Mature
/// crops are harvested and replanted; every cell's failure is contained.
pub async fn farm_plot(sess: &Arc<SessionState>) -> Result<(), StewardError> {
    let places = &sess.config.places;
    let (min, max) = (places.farm_min, places.farm_max);
    let mut harvested = 0u32;

    for x in min.x..=max.x {
        for z in min.z..=max.z {
            let soil_pos = BlockPos::new(x, min.y, z);
            match tend_cell(sess, soil_pos).await {
                Ok(true) => harvested += 1,
                Ok(false) => {}
                Err(e) => warn!(pos = %soil_pos, error = %e, "farm cell failed"),
            }
        }
    }

    if harvested > 0 {
        info!(harvested, "harvest complete");
        sess.journal
            .record(&format!("harvested {} crops", harvested));
    }
    Ok(())
}

/// Harvest-and-replant for one cell. Returns whether a crop was taken.
async fn tend_cell(sess: &Arc<SessionState>, soil_pos: BlockPos) -> Result<bool, StewardError> {
    let world = &sess.services.world;

    let Some(soil) = world.block_at(soil_pos).await? else {
        return Ok(false);
    };
    if soil.soil().is_none() {
        return Ok(false);
    }
    let Some(block) = world.block_at(soil_pos.above()).await? else {
        return Ok(false);
    };
    let Some(crop) = block.crop() else {
        return Ok(false);
    };

    let mature = match world.crop_mature_age(crop).await {
        Some(age) => age,
        None => sess.config.mature_age(crop),
    };
    if block.growth_stage.unwrap_or(0) < mature {
        return Ok(false);
    }

    sess.services.actions.dig(block.pos).await?;
    replant(sess, soil_pos, crop).await?;
    Ok(true)
}

/// Put a new seed in the ground. Missing seeds are restocked from the
/// chest; if the chest has none either, the cell is left bare for the next
/// farming day.
async fn replant(
    sess: &Arc<SessionState>,
    soil_pos: BlockPos,
    crop: CropKind,
) -> Result<(), StewardError> {
    let seed = crop.seed_item();
    let _lease = sess.inventory_lease.lock().await;

    let mut held = sess.services.holdings.held_count(seed).await?;
    if held == 0 {
        let restock = sess.config.tunables.seed_restock;
        if keeping::retrieve_item(sess, seed, restock).await? {
            held = sess.services.holdings.held_count(seed).await?;
        }
    }
    if held == 0 {
        debug!(seed, "no seed to replant with");
        return Ok(());
    }

    sess.services.holdings.equip(seed).await?;
    sess.services.actions.place_above(soil_pos).await?;
    Ok(())
}

/// Bake held wheat into bread at the crafting table: one loaf per three
/// wheat, no-op below the threshold.
pub async fn craft_bread(sess: &Arc<SessionState>) -> Result<(), StewardError> {
    let per_loaf = sess.config.tunables.wheat_per_bread;
    let _lease = sess.inventory_lease.lock().await;

    let wheat = sess.services.holdings.held_count("wheat").await?;
    if wheat < per_loaf {
        debug!(wheat, "not enough wheat for bread");
        return Ok(());
    }

    let table = sess.config.places.crafting_table;
    rest::open_door(sess).await;
    sess.navigate(table).await?;

    let times = wheat / per_loaf;
    sess.services.actions.craft("bread", times, table).await?;
    info!(times, "baked bread");
    sess.journal.record(&format!("baked {} bread", times));
    Ok(())
}
