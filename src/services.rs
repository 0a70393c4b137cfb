//! Contracts for the external collaborators the bot drives.
//!
//! The game-protocol client, pathfinder, and inventory plumbing live behind
//! these traits. The routine layer only ever talks to them, which keeps every
//! handler testable against in-process fakes.

use crate::block::{BlockDescriptor, BlockPos, BlockTarget, CropKind};
use crate::error::StewardError;
use crate::item::ItemStack;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::oneshot;

/// World clock reading: time of day on the 0-24000 scale plus the total
/// world age in ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorldClock {
    pub time_of_day: u32,
    pub age_ticks: u64,
}

impl WorldClock {
    /// Current day index, one day per 24000 age ticks.
    pub fn day(&self) -> i64 {
        (self.age_ticks / 24_000) as i64
    }
}

/// Named furnace slots. Implementations map these to whatever wire slot
/// indices apply; the handlers never guess raw indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FurnaceSlot {
    Fuel,
    Input,
}

/// Resolved when the bot is woken out of bed by the server.
pub type WakeSignal = oneshot::Receiver<()>;

/// Read-only queries against the connected world.
#[async_trait]
pub trait WorldQuery: Send + Sync {
    /// The block at a position, or `None` if unloaded.
    async fn block_at(&self, pos: BlockPos) -> Result<Option<BlockDescriptor>, StewardError>;

    /// Nearest block matching the target kind within `max_distance` of
    /// `origin`.
    async fn find_nearest(
        &self,
        target: BlockTarget,
        origin: BlockPos,
        max_distance: u32,
    ) -> Result<Option<BlockDescriptor>, StewardError>;

    async fn clock(&self) -> Result<WorldClock, StewardError>;

    /// Server-reported mature growth stage for a crop, when the registry
    /// exposes one. Callers fall back to the configured table.
    async fn crop_mature_age(&self, crop: CropKind) -> Option<u8>;

    /// Position of a named player, if visible.
    async fn player_position(&self, name: &str) -> Result<Option<BlockPos>, StewardError>;

    /// The bot's own satiation level, 0-20.
    async fn satiation(&self) -> Result<u8, StewardError>;
}

/// Pathfinding and movement.
#[async_trait]
pub trait Navigator: Send + Sync {
    /// Walk to the goal. Resolves when the bot arrives; fails with
    /// [`StewardError::NoPath`] or a generic error. Callers are expected to
    /// wrap this with the configured navigation timeout.
    async fn go_to(&self, pos: BlockPos) -> Result<(), StewardError>;
}

/// The bot's own held items and container access.
#[async_trait]
pub trait Holdings: Send + Sync {
    async fn held_items(&self) -> Result<Vec<ItemStack>, StewardError>;

    /// Total held count of an exactly-named item.
    async fn held_count(&self, name: &str) -> Result<u32, StewardError>;

    /// Move the named item into the active hand.
    async fn equip(&self, name: &str) -> Result<(), StewardError>;

    /// Open a chest or furnace at the given position.
    async fn open_container(
        &self,
        pos: BlockPos,
    ) -> Result<Box<dyn ContainerHandle>, StewardError>;
}

/// An open container window. `close` must be called on every exit path;
/// leaving a window open across ticks wedges the session.
#[async_trait]
pub trait ContainerHandle: Send {
    /// Whether a named furnace slot currently holds nothing.
    async fn slot_empty(&mut self, slot: FurnaceSlot) -> Result<bool, StewardError>;

    /// Move items from the bot's holdings into the container, optionally
    /// into a named furnace slot.
    async fn deposit(
        &mut self,
        name: &str,
        count: u32,
        slot: Option<FurnaceSlot>,
    ) -> Result<(), StewardError>;

    /// Move up to `count` of a named item from the container into the bot's
    /// holdings. Returns `false`, without error, when the item is absent.
    async fn withdraw(&mut self, name: &str, count: u32) -> Result<bool, StewardError>;

    async fn close(&mut self);
}

/// Actions performed in the world.
#[async_trait]
pub trait Actions: Send + Sync {
    /// Break the block at a position.
    async fn dig(&self, pos: BlockPos) -> Result<(), StewardError>;

    /// Place the equipped item on top of the block at `soil`.
    async fn place_above(&self, soil: BlockPos) -> Result<(), StewardError>;

    /// Eat whatever is equipped.
    async fn consume_equipped(&self) -> Result<(), StewardError>;

    /// Lie down in the bed at `pos`. Resolves once the bot is asleep; the
    /// returned signal fires when the server wakes it.
    async fn rest(&self, pos: BlockPos) -> Result<WakeSignal, StewardError>;

    /// Use/activate the block at a position (doors, levers).
    async fn activate(&self, pos: BlockPos) -> Result<(), StewardError>;

    /// Craft `times` batches of the named product at a crafting station.
    async fn craft(&self, product: &str, times: u32, station: BlockPos)
        -> Result<(), StewardError>;

    async fn send_chat(&self, text: &str) -> Result<(), StewardError>;
}

/// The full set of collaborator handles for one session.
#[derive(Clone)]
pub struct Services {
    pub world: Arc<dyn WorldQuery>,
    pub nav: Arc<dyn Navigator>,
    pub holdings: Arc<dyn Holdings>,
    pub actions: Arc<dyn Actions>,
}
