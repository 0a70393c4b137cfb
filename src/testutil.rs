//! In-process fakes for the service contracts, shared by the unit tests.
//!
//! The fakes are deliberately literal: a block map, a seed-aware planting
//! action, two containers wired to the configured chest and furnace
//! positions. Failure injection is one-shot (`fail_next_*`) so a test can
//! break exactly one call.

use crate::block::{BlockDescriptor, BlockPos, BlockTarget, CropKind};
use crate::config::BotConfig;
use crate::error::StewardError;
use crate::item::ItemStack;
use crate::journal::Journal;
use crate::services::{
    Actions, ContainerHandle, FurnaceSlot, Holdings, Navigator, Services, WakeSignal, WorldClock,
    WorldQuery,
};
use crate::session::SessionState;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{oneshot, Notify};

type Held = Arc<Mutex<BTreeMap<String, u32>>>;

/// Build a fresh session wired to a full set of fakes.
pub fn test_session(config: BotConfig) -> (Arc<SessionState>, TestHarness) {
    let harness = TestHarness::new(&config);
    let sess = Arc::new(SessionState::new(
        Arc::new(config),
        harness.services(),
        Journal::disabled(),
    ));
    (sess, harness)
}

/// Handles to every fake, for seeding state and asserting on calls.
#[derive(Clone)]
pub struct TestHarness {
    pub world: Arc<TestWorld>,
    pub nav: Arc<TestNav>,
    pub holdings: Arc<TestHoldings>,
    pub actions: Arc<TestActions>,
    pub chest: Arc<TestContainer>,
    pub furnace: Arc<TestContainer>,
}

impl TestHarness {
    pub fn new(config: &BotConfig) -> Self {
        let world = Arc::new(TestWorld::new());
        let chest = Arc::new(TestContainer::new());
        let furnace = Arc::new(TestContainer::new());
        let held: Held = Arc::new(Mutex::new(BTreeMap::new()));
        let equipped = Arc::new(Mutex::new(None));
        let holdings = Arc::new(TestHoldings {
            held: held.clone(),
            equipped: equipped.clone(),
            chest: chest.clone(),
            furnace: furnace.clone(),
            chest_pos: config.places.chest,
            furnace_pos: config.places.furnace,
        });
        let actions = Arc::new(TestActions {
            world: world.clone(),
            held,
            equipped,
            dug: Mutex::new(Vec::new()),
            placed: Mutex::new(Vec::new()),
            activated: Mutex::new(Vec::new()),
            chats: Mutex::new(Vec::new()),
            crafted: Mutex::new(Vec::new()),
            consumed: AtomicUsize::new(0),
            wake_tx: Mutex::new(None),
            consume_gated: AtomicBool::new(false),
            consume_gate: Notify::new(),
            fail_dig: AtomicBool::new(false),
            fail_consume: AtomicBool::new(false),
        });
        Self {
            world,
            nav: Arc::new(TestNav::new()),
            holdings,
            actions,
            chest,
            furnace,
        }
    }

    pub fn services(&self) -> Services {
        Services {
            world: self.world.clone(),
            nav: self.nav.clone(),
            holdings: self.holdings.clone(),
            actions: self.actions.clone(),
        }
    }
}

/// Block map plus clock, players, and the bot's own satiation.
pub struct TestWorld {
    blocks: Mutex<HashMap<BlockPos, BlockDescriptor>>,
    clock: Mutex<WorldClock>,
    satiation: AtomicU8,
    players: Mutex<HashMap<String, BlockPos>>,
    mature_ages: Mutex<HashMap<CropKind, u8>>,
}

impl TestWorld {
    fn new() -> Self {
        Self {
            blocks: Mutex::new(HashMap::new()),
            clock: Mutex::new(WorldClock {
                time_of_day: 1_000,
                age_ticks: 1_000,
            }),
            satiation: AtomicU8::new(20),
            players: Mutex::new(HashMap::new()),
            mature_ages: Mutex::new(HashMap::new()),
        }
    }

    pub fn put_block(&self, block: BlockDescriptor) {
        self.blocks.lock().unwrap().insert(block.pos, block);
    }

    pub fn block(&self, pos: BlockPos) -> Option<BlockDescriptor> {
        self.blocks.lock().unwrap().get(&pos).cloned()
    }

    pub fn set_clock(&self, time_of_day: u32, day: u64) {
        *self.clock.lock().unwrap() = WorldClock {
            time_of_day,
            age_ticks: day * 24_000 + u64::from(time_of_day),
        };
    }

    pub fn set_satiation(&self, value: u8) {
        self.satiation.store(value, Ordering::SeqCst);
    }

    pub fn put_player(&self, name: &str, pos: BlockPos) {
        self.players.lock().unwrap().insert(name.to_string(), pos);
    }

    pub fn set_mature_age(&self, crop: CropKind, age: u8) {
        self.mature_ages.lock().unwrap().insert(crop, age);
    }
}

#[async_trait]
impl WorldQuery for TestWorld {
    async fn block_at(&self, pos: BlockPos) -> Result<Option<BlockDescriptor>, StewardError> {
        Ok(self.block(pos))
    }

    async fn find_nearest(
        &self,
        target: BlockTarget,
        origin: BlockPos,
        max_distance: u32,
    ) -> Result<Option<BlockDescriptor>, StewardError> {
        let blocks = self.blocks.lock().unwrap();
        Ok(blocks
            .values()
            .filter(|block| target.matches(&block.name))
            .filter(|block| block.pos.distance_to(&origin) <= max_distance)
            .min_by_key(|block| block.pos.distance_to(&origin))
            .cloned())
    }

    async fn clock(&self) -> Result<WorldClock, StewardError> {
        Ok(*self.clock.lock().unwrap())
    }

    async fn crop_mature_age(&self, crop: CropKind) -> Option<u8> {
        self.mature_ages.lock().unwrap().get(&crop).copied()
    }

    async fn player_position(&self, name: &str) -> Result<Option<BlockPos>, StewardError> {
        Ok(self.players.lock().unwrap().get(name).copied())
    }

    async fn satiation(&self) -> Result<u8, StewardError> {
        Ok(self.satiation.load(Ordering::SeqCst))
    }
}

/// Records every goal; can fail or hang the next call.
pub struct TestNav {
    visited: Mutex<Vec<BlockPos>>,
    fail_next: AtomicBool,
    hanging: AtomicBool,
}

impl TestNav {
    fn new() -> Self {
        Self {
            visited: Mutex::new(Vec::new()),
            fail_next: AtomicBool::new(false),
            hanging: AtomicBool::new(false),
        }
    }

    pub fn visited(&self) -> Vec<BlockPos> {
        self.visited.lock().unwrap().clone()
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Make every subsequent call block forever (timeout tests).
    pub fn hang(&self) {
        self.hanging.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Navigator for TestNav {
    async fn go_to(&self, pos: BlockPos) -> Result<(), StewardError> {
        if self.hanging.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(StewardError::NoPath(pos));
        }
        self.visited.lock().unwrap().push(pos);
        Ok(())
    }
}

/// Held items plus two containers at the configured positions.
pub struct TestHoldings {
    held: Held,
    equipped: Arc<Mutex<Option<String>>>,
    chest: Arc<TestContainer>,
    furnace: Arc<TestContainer>,
    chest_pos: BlockPos,
    furnace_pos: BlockPos,
}

impl TestHoldings {
    pub fn give(&self, name: &str, count: u32) {
        *self.held.lock().unwrap().entry(name.to_string()).or_insert(0) += count;
    }

    pub fn count(&self, name: &str) -> u32 {
        self.held.lock().unwrap().get(name).copied().unwrap_or(0)
    }

    pub fn equipped(&self) -> Option<String> {
        self.equipped.lock().unwrap().clone()
    }
}

#[async_trait]
impl Holdings for TestHoldings {
    async fn held_items(&self) -> Result<Vec<ItemStack>, StewardError> {
        Ok(self
            .held
            .lock()
            .unwrap()
            .iter()
            .map(|(name, count)| ItemStack::new(name.clone(), *count))
            .collect())
    }

    async fn held_count(&self, name: &str) -> Result<u32, StewardError> {
        Ok(self.count(name))
    }

    async fn equip(&self, name: &str) -> Result<(), StewardError> {
        if self.count(name) == 0 {
            return Err(StewardError::Action(format!("{} not held", name)));
        }
        *self.equipped.lock().unwrap() = Some(name.to_string());
        Ok(())
    }

    async fn open_container(
        &self,
        pos: BlockPos,
    ) -> Result<Box<dyn ContainerHandle>, StewardError> {
        let container = if pos == self.furnace_pos {
            self.furnace.clone()
        } else if pos == self.chest_pos {
            self.chest.clone()
        } else {
            return Err(StewardError::Container(format!("no container at {}", pos)));
        };
        Ok(Box::new(TestContainerHandle {
            container,
            held: self.held.clone(),
        }))
    }
}

/// Backing state for one container, shared across opens.
pub struct TestContainer {
    contents: Mutex<BTreeMap<String, u32>>,
    fuel_slot: Mutex<Option<String>>,
    input_slot: Mutex<Option<String>>,
    deposits: Mutex<Vec<(String, u32, Option<FurnaceSlot>)>>,
    closes: AtomicUsize,
    fail_next_deposit: AtomicBool,
}

impl TestContainer {
    fn new() -> Self {
        Self {
            contents: Mutex::new(BTreeMap::new()),
            fuel_slot: Mutex::new(None),
            input_slot: Mutex::new(None),
            deposits: Mutex::new(Vec::new()),
            closes: AtomicUsize::new(0),
            fail_next_deposit: AtomicBool::new(false),
        }
    }

    pub fn stock(&self, name: &str, count: u32) {
        *self
            .contents
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_insert(0) += count;
    }

    pub fn deposits(&self) -> Vec<(String, u32, Option<FurnaceSlot>)> {
        self.deposits.lock().unwrap().clone()
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn fail_next_deposit(&self) {
        self.fail_next_deposit.store(true, Ordering::SeqCst);
    }

    pub fn fill_slot(&self, slot: FurnaceSlot, name: &str) {
        let guard = match slot {
            FurnaceSlot::Fuel => &self.fuel_slot,
            FurnaceSlot::Input => &self.input_slot,
        };
        *guard.lock().unwrap() = Some(name.to_string());
    }
}

struct TestContainerHandle {
    container: Arc<TestContainer>,
    held: Held,
}

#[async_trait]
impl ContainerHandle for TestContainerHandle {
    async fn slot_empty(&mut self, slot: FurnaceSlot) -> Result<bool, StewardError> {
        let guard = match slot {
            FurnaceSlot::Fuel => &self.container.fuel_slot,
            FurnaceSlot::Input => &self.container.input_slot,
        };
        Ok(guard.lock().unwrap().is_none())
    }

    async fn deposit(
        &mut self,
        name: &str,
        count: u32,
        slot: Option<FurnaceSlot>,
    ) -> Result<(), StewardError> {
        if self.container.fail_next_deposit.swap(false, Ordering::SeqCst) {
            return Err(StewardError::Container("deposit rejected".to_string()));
        }
        {
            let mut held = self.held.lock().unwrap();
            if let Some(have) = held.get_mut(name) {
                *have = have.saturating_sub(count);
                if *have == 0 {
                    held.remove(name);
                }
            }
        }
        *self
            .container
            .contents
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_insert(0) += count;
        if let Some(slot) = slot {
            self.container.fill_slot(slot, name);
        }
        self.container
            .deposits
            .lock()
            .unwrap()
            .push((name.to_string(), count, slot));
        Ok(())
    }

    async fn withdraw(&mut self, name: &str, count: u32) -> Result<bool, StewardError> {
        let taken = {
            let mut contents = self.container.contents.lock().unwrap();
            match contents.get_mut(name) {
                None => return Ok(false),
                Some(have) => {
                    let taken = count.min(*have);
                    *have -= taken;
                    if *have == 0 {
                        contents.remove(name);
                    }
                    taken
                }
            }
        };
        *self.held.lock().unwrap().entry(name.to_string()).or_insert(0) += taken;
        Ok(true)
    }

    async fn close(&mut self) {
        self.container.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// World actions with enough behavior for round-trip tests: digging removes
/// the block, planting grows a stage-0 crop from the equipped seed.
pub struct TestActions {
    world: Arc<TestWorld>,
    held: Held,
    equipped: Arc<Mutex<Option<String>>>,
    dug: Mutex<Vec<BlockPos>>,
    placed: Mutex<Vec<BlockPos>>,
    activated: Mutex<Vec<BlockPos>>,
    chats: Mutex<Vec<String>>,
    crafted: Mutex<Vec<(String, u32)>>,
    consumed: AtomicUsize,
    wake_tx: Mutex<Option<oneshot::Sender<()>>>,
    consume_gated: AtomicBool,
    consume_gate: Notify,
    fail_dig: AtomicBool,
    fail_consume: AtomicBool,
}

impl TestActions {
    pub fn dug(&self) -> Vec<BlockPos> {
        self.dug.lock().unwrap().clone()
    }

    pub fn placed(&self) -> Vec<BlockPos> {
        self.placed.lock().unwrap().clone()
    }

    pub fn activated(&self) -> Vec<BlockPos> {
        self.activated.lock().unwrap().clone()
    }

    pub fn chats(&self) -> Vec<String> {
        self.chats.lock().unwrap().clone()
    }

    pub fn crafted(&self) -> Vec<(String, u32)> {
        self.crafted.lock().unwrap().clone()
    }

    pub fn consumed(&self) -> usize {
        self.consumed.load(Ordering::SeqCst)
    }

    /// Fire the wake signal from the most recent rest.
    pub fn wake(&self) {
        if let Some(tx) = self.wake_tx.lock().unwrap().take() {
            let _ = tx.send(());
        }
    }

    /// Make consume calls park until [`TestActions::open_gate`].
    pub fn gate_consume(&self) {
        self.consume_gated.store(true, Ordering::SeqCst);
    }

    pub fn open_gate(&self) {
        self.consume_gated.store(false, Ordering::SeqCst);
        self.consume_gate.notify_one();
    }

    pub fn fail_next_dig(&self) {
        self.fail_dig.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_consume(&self) {
        self.fail_consume.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Actions for TestActions {
    async fn dig(&self, pos: BlockPos) -> Result<(), StewardError> {
        if self.fail_dig.swap(false, Ordering::SeqCst) {
            return Err(StewardError::Action("dig refused".to_string()));
        }
        self.world.blocks.lock().unwrap().remove(&pos);
        self.dug.lock().unwrap().push(pos);
        Ok(())
    }

    async fn place_above(&self, soil: BlockPos) -> Result<(), StewardError> {
        let seed = self
            .equipped
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| StewardError::Action("nothing equipped".to_string()))?;
        let crop = CropKind::from_seed_item(&seed)
            .ok_or_else(|| StewardError::Action(format!("{} is not plantable", seed)))?;
        {
            let mut held = self.held.lock().unwrap();
            if let Some(have) = held.get_mut(&seed) {
                *have = have.saturating_sub(1);
                if *have == 0 {
                    held.remove(&seed);
                }
            }
        }
        self.world.put_block(BlockDescriptor {
            name: crop.block_name().to_string(),
            pos: soil.above(),
            growth_stage: Some(0),
            open: None,
        });
        self.placed.lock().unwrap().push(soil.above());
        Ok(())
    }

    async fn consume_equipped(&self) -> Result<(), StewardError> {
        if self.consume_gated.load(Ordering::SeqCst) {
            self.consume_gate.notified().await;
        }
        if self.fail_consume.swap(false, Ordering::SeqCst) {
            return Err(StewardError::Action("consume failed".to_string()));
        }
        self.consumed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rest(&self, _pos: BlockPos) -> Result<WakeSignal, StewardError> {
        let (tx, rx) = oneshot::channel();
        *self.wake_tx.lock().unwrap() = Some(tx);
        Ok(rx)
    }

    async fn activate(&self, pos: BlockPos) -> Result<(), StewardError> {
        self.activated.lock().unwrap().push(pos);
        Ok(())
    }

    async fn craft(
        &self,
        product: &str,
        times: u32,
        _station: BlockPos,
    ) -> Result<(), StewardError> {
        self.crafted.lock().unwrap().push((product.to_string(), times));
        Ok(())
    }

    async fn send_chat(&self, text: &str) -> Result<(), StewardError> {
        self.chats.lock().unwrap().push(text.to_string());
        Ok(())
    }
}
