//! In-process simulated server
//!
//! A small deterministic world behind the service contracts, used by the
//! binary as a dry run: the full supervisor, scheduler, and handlers run
//! against it without a real server. Time runs at 20 ticks per wall-clock
//! second; walks take 50ms per block of distance.

use crate::block::{BlockDescriptor, BlockPos, BlockTarget, CropKind};
use crate::config::BotConfig;
use crate::connection::{Connector, SessionEvent};
use crate::error::StewardError;
use crate::item::ItemStack;
use crate::services::{
    Actions, ContainerHandle, FurnaceSlot, Holdings, Navigator, Services, WakeSignal, WorldClock,
    WorldQuery,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

const TICKS_PER_SECOND: u64 = 20;
const WALK_MS_PER_BLOCK: u64 = 50;
const CROP_GROWTH_SECS: u64 = 30;
const SLEEP_SECS: u64 = 10;

/// A crop cell tracks when it was planted; its stage is derived from
/// elapsed time.
#[derive(Clone)]
struct SimCrop {
    kind: CropKind,
    planted_at: Instant,
}

impl SimCrop {
    fn stage(&self) -> u8 {
        let grown = self.planted_at.elapsed().as_secs() / CROP_GROWTH_SECS;
        (grown as u8).min(7)
    }
}

struct SimState {
    crops: HashMap<BlockPos, SimCrop>,
    held: BTreeMap<String, u32>,
    equipped: Option<String>,
    chest: BTreeMap<String, u32>,
    furnace_fuel: Option<String>,
    furnace_input: Option<String>,
    position: BlockPos,
    satiation: u8,
}

/// The simulated world shared by every service handle of one session.
pub struct SimWorld {
    config: Arc<BotConfig>,
    epoch: Instant,
    state: Arc<Mutex<SimState>>,
}

impl SimWorld {
    /// Seed the world from the configured places: a bed, the three
    /// stations, and a fully-grown wheat plot with seeds in the chest.
    fn new(config: Arc<BotConfig>) -> Self {
        let planted = Instant::now() - Duration::from_secs(CROP_GROWTH_SECS * 7);
        let mut crops = HashMap::new();
        let places = &config.places;
        for x in places.farm_min.x..=places.farm_max.x {
            for z in places.farm_min.z..=places.farm_max.z {
                crops.insert(
                    BlockPos::new(x, places.farm_min.y + 1, z),
                    SimCrop {
                        kind: CropKind::Wheat,
                        planted_at: planted,
                    },
                );
            }
        }
        let mut chest = BTreeMap::new();
        chest.insert("wheat_seeds".to_string(), 64);
        chest.insert("bread".to_string(), 8);
        let mut held = BTreeMap::new();
        held.insert("wheat_seeds".to_string(), 16);
        let position = places.bed_search_center;
        Self {
            config,
            epoch: Instant::now(),
            state: Arc::new(Mutex::new(SimState {
                crops,
                held,
                equipped: None,
                chest,
                furnace_fuel: None,
                furnace_input: None,
                position,
                satiation: 20,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn bed_pos(&self) -> BlockPos {
        self.config.places.bed_search_center.offset(1, 0, 1)
    }

    fn station_at(&self, pos: BlockPos) -> Option<&'static str> {
        let places = &self.config.places;
        if pos == places.chest {
            Some("chest")
        } else if pos == places.furnace {
            Some("furnace")
        } else if pos == places.crafting_table {
            Some("crafting_table")
        } else if pos == self.bed_pos() {
            Some("white_bed")
        } else {
            None
        }
    }

    fn describe(&self, pos: BlockPos) -> Option<BlockDescriptor> {
        if let Some(name) = self.station_at(pos) {
            return Some(BlockDescriptor {
                name: name.to_string(),
                pos,
                growth_stage: None,
                open: None,
            });
        }
        if let Some(crop) = self.lock().crops.get(&pos) {
            return Some(BlockDescriptor {
                name: crop.kind.block_name().to_string(),
                pos,
                growth_stage: Some(crop.stage()),
                open: None,
            });
        }
        let places = &self.config.places;
        let soil = pos.y == places.farm_min.y
            && pos.x >= places.farm_min.x
            && pos.x <= places.farm_max.x
            && pos.z >= places.farm_min.z
            && pos.z <= places.farm_max.z;
        if soil {
            return Some(BlockDescriptor {
                name: "farmland".to_string(),
                pos,
                growth_stage: None,
                open: None,
            });
        }
        None
    }
}

#[async_trait]
impl WorldQuery for SimWorld {
    async fn block_at(&self, pos: BlockPos) -> Result<Option<BlockDescriptor>, StewardError> {
        Ok(self.describe(pos))
    }

    async fn find_nearest(
        &self,
        target: BlockTarget,
        origin: BlockPos,
        max_distance: u32,
    ) -> Result<Option<BlockDescriptor>, StewardError> {
        let candidates = [
            self.bed_pos(),
            self.config.places.chest,
            self.config.places.furnace,
            self.config.places.crafting_table,
        ];
        Ok(candidates
            .iter()
            .filter_map(|&pos| self.describe(pos))
            .filter(|block| target.matches(&block.name))
            .filter(|block| block.pos.distance_to(&origin) <= max_distance)
            .min_by_key(|block| block.pos.distance_to(&origin)))
    }

    async fn clock(&self) -> Result<WorldClock, StewardError> {
        let age_ticks = self.epoch.elapsed().as_secs() * TICKS_PER_SECOND;
        Ok(WorldClock {
            time_of_day: (age_ticks % 24_000) as u32,
            age_ticks,
        })
    }

    async fn crop_mature_age(&self, _crop: CropKind) -> Option<u8> {
        None
    }

    async fn player_position(&self, _name: &str) -> Result<Option<BlockPos>, StewardError> {
        Ok(None)
    }

    async fn satiation(&self) -> Result<u8, StewardError> {
        Ok(self.lock().satiation)
    }
}

#[async_trait]
impl Navigator for SimWorld {
    async fn go_to(&self, pos: BlockPos) -> Result<(), StewardError> {
        let distance = self.lock().position.distance_to(&pos);
        tokio::time::sleep(Duration::from_millis(
            u64::from(distance) * WALK_MS_PER_BLOCK,
        ))
        .await;
        self.lock().position = pos;
        debug!(%pos, "arrived");
        Ok(())
    }
}

#[async_trait]
impl Holdings for SimWorld {
    async fn held_items(&self) -> Result<Vec<ItemStack>, StewardError> {
        Ok(self
            .lock()
            .held
            .iter()
            .map(|(name, count)| ItemStack::new(name.clone(), *count))
            .collect())
    }

    async fn held_count(&self, name: &str) -> Result<u32, StewardError> {
        Ok(self.lock().held.get(name).copied().unwrap_or(0))
    }

    async fn equip(&self, name: &str) -> Result<(), StewardError> {
        let mut state = self.lock();
        if state.held.get(name).copied().unwrap_or(0) == 0 {
            return Err(StewardError::Action(format!("{} not held", name)));
        }
        state.equipped = Some(name.to_string());
        Ok(())
    }

    async fn open_container(
        &self,
        pos: BlockPos,
    ) -> Result<Box<dyn ContainerHandle>, StewardError> {
        match self.station_at(pos) {
            Some("chest") | Some("furnace") => {}
            _ => return Err(StewardError::Container(format!("no container at {}", pos))),
        }
        Ok(Box::new(SimContainer {
            state: self.state.clone(),
            is_furnace: pos == self.config.places.furnace,
        }))
    }
}

struct SimContainer {
    state: Arc<Mutex<SimState>>,
    is_furnace: bool,
}

impl SimContainer {
    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[async_trait]
impl ContainerHandle for SimContainer {
    async fn slot_empty(&mut self, slot: FurnaceSlot) -> Result<bool, StewardError> {
        let state = self.lock();
        Ok(match slot {
            FurnaceSlot::Fuel => state.furnace_fuel.is_none(),
            FurnaceSlot::Input => state.furnace_input.is_none(),
        })
    }

    async fn deposit(
        &mut self,
        name: &str,
        count: u32,
        slot: Option<FurnaceSlot>,
    ) -> Result<(), StewardError> {
        let mut state = self.lock();
        if let Some(have) = state.held.get_mut(name) {
            *have = have.saturating_sub(count);
            if *have == 0 {
                state.held.remove(name);
            }
        }
        if self.is_furnace {
            match slot {
                Some(FurnaceSlot::Fuel) => state.furnace_fuel = Some(name.to_string()),
                Some(FurnaceSlot::Input) => state.furnace_input = Some(name.to_string()),
                None => {}
            }
        } else {
            *state.chest.entry(name.to_string()).or_insert(0) += count;
        }
        Ok(())
    }

    async fn withdraw(&mut self, name: &str, count: u32) -> Result<bool, StewardError> {
        let mut state = self.lock();
        let Some(have) = state.chest.get_mut(name) else {
            return Ok(false);
        };
        let taken = count.min(*have);
        *have -= taken;
        if *have == 0 {
            state.chest.remove(name);
        }
        *state.held.entry(name.to_string()).or_insert(0) += taken;
        Ok(true)
    }

    async fn close(&mut self) {}
}

#[async_trait]
impl Actions for SimWorld {
    async fn dig(&self, pos: BlockPos) -> Result<(), StewardError> {
        let mut state = self.lock();
        if let Some(crop) = state.crops.remove(&pos) {
            let yield_item = match crop.kind {
                CropKind::Wheat => "wheat",
                CropKind::Carrots => "carrot",
                CropKind::Potatoes => "potato",
                CropKind::Beetroots => "beetroot",
            };
            *state.held.entry(yield_item.to_string()).or_insert(0) += 1;
            if crop.kind == CropKind::Wheat {
                *state.held.entry("wheat_seeds".to_string()).or_insert(0) += 1;
            }
        }
        Ok(())
    }

    async fn place_above(&self, soil: BlockPos) -> Result<(), StewardError> {
        let mut state = self.lock();
        let seed = state
            .equipped
            .clone()
            .ok_or_else(|| StewardError::Action("nothing equipped".to_string()))?;
        let crop = CropKind::from_seed_item(&seed)
            .ok_or_else(|| StewardError::Action(format!("{} is not plantable", seed)))?;
        if let Some(have) = state.held.get_mut(&seed) {
            *have = have.saturating_sub(1);
            if *have == 0 {
                state.held.remove(&seed);
            }
        }
        state.crops.insert(
            soil.above(),
            SimCrop {
                kind: crop,
                planted_at: Instant::now(),
            },
        );
        Ok(())
    }

    async fn consume_equipped(&self) -> Result<(), StewardError> {
        let mut state = self.lock();
        let Some(food) = state.equipped.clone() else {
            return Err(StewardError::Action("nothing equipped".to_string()));
        };
        if let Some(have) = state.held.get_mut(&food) {
            *have = have.saturating_sub(1);
            if *have == 0 {
                state.held.remove(&food);
            }
        }
        state.satiation = 20;
        Ok(())
    }

    async fn rest(&self, pos: BlockPos) -> Result<WakeSignal, StewardError> {
        info!(%pos, "resting");
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(SLEEP_SECS)).await;
            let _ = tx.send(());
        });
        Ok(rx)
    }

    async fn activate(&self, pos: BlockPos) -> Result<(), StewardError> {
        debug!(%pos, "activated block");
        Ok(())
    }

    async fn craft(
        &self,
        product: &str,
        times: u32,
        _station: BlockPos,
    ) -> Result<(), StewardError> {
        let mut state = self.lock();
        if product == "bread" {
            let wheat = self.config.tunables.wheat_per_bread * times;
            if let Some(have) = state.held.get_mut("wheat") {
                *have = have.saturating_sub(wheat);
                if *have == 0 {
                    state.held.remove("wheat");
                }
            }
        }
        *state.held.entry(product.to_string()).or_insert(0) += times;
        Ok(())
    }

    async fn send_chat(&self, text: &str) -> Result<(), StewardError> {
        info!(text, "[chat]");
        Ok(())
    }
}

/// Connector that serves the simulated world. The session stays open until
/// the process exits.
pub struct SimConnector;

#[async_trait]
impl Connector for SimConnector {
    async fn connect(
        &self,
        config: &BotConfig,
    ) -> Result<(Services, mpsc::Receiver<SessionEvent>), StewardError> {
        let world = Arc::new(SimWorld::new(Arc::new(config.clone())));
        let services = Services {
            world: world.clone(),
            nav: world.clone(),
            holdings: world.clone(),
            actions: world,
        };
        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(async move {
            let _ = tx.send(SessionEvent::Ready).await;
            // Keep the sender alive so the session never sees a close.
            std::future::pending::<()>().await;
        });
        Ok((services, rx))
    }
}
