//! World vocabulary: positions, block descriptors, and the closed set of
//! block classifications the bot cares about.
//!
//! Raw block names from the world-query service are resolved into these tags
//! exactly once at the service boundary; everything above dispatches on the
//! enums, never on substrings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An absolute block coordinate in the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Offset this position by the given deltas.
    pub fn offset(&self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// The position directly above this one.
    pub fn above(&self) -> Self {
        self.offset(0, 1, 0)
    }

    /// Manhattan distance to another position.
    pub fn distance_to(&self, other: &BlockPos) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y) + self.z.abs_diff(other.z)
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// An axis-aligned rectangular region between two corner positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    pub min: BlockPos,
    pub max: BlockPos,
}

impl Area {
    pub fn new(min: BlockPos, max: BlockPos) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, pos: BlockPos) -> bool {
        pos.x >= self.min.x
            && pos.x <= self.max.x
            && pos.y >= self.min.y
            && pos.y <= self.max.y
            && pos.z >= self.min.z
            && pos.z <= self.max.z
    }
}

/// Soil types the farm scan recognizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoilKind {
    Farmland,
}

impl SoilKind {
    pub fn from_block_name(name: &str) -> Option<SoilKind> {
        match name {
            "farmland" => Some(SoilKind::Farmland),
            _ => None,
        }
    }
}

/// Crops the bot harvests and replants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CropKind {
    Wheat,
    Carrots,
    Potatoes,
    Beetroots,
}

impl CropKind {
    pub fn from_block_name(name: &str) -> Option<CropKind> {
        match name {
            "wheat" => Some(CropKind::Wheat),
            "carrots" => Some(CropKind::Carrots),
            "potatoes" => Some(CropKind::Potatoes),
            "beetroots" => Some(CropKind::Beetroots),
            _ => None,
        }
    }

    /// The item planted to regrow this crop.
    pub fn seed_item(&self) -> &'static str {
        match self {
            CropKind::Wheat => "wheat_seeds",
            CropKind::Carrots => "carrot",
            CropKind::Potatoes => "potato",
            CropKind::Beetroots => "beetroot_seeds",
        }
    }

    /// Inverse of [`CropKind::seed_item`].
    pub fn from_seed_item(name: &str) -> Option<CropKind> {
        match name {
            "wheat_seeds" => Some(CropKind::Wheat),
            "carrot" => Some(CropKind::Carrots),
            "potato" => Some(CropKind::Potatoes),
            "beetroot_seeds" => Some(CropKind::Beetroots),
            _ => None,
        }
    }

    /// The growth stage at which this crop is fully grown, used when the
    /// world-query service exposes no per-crop metadata.
    pub fn default_mature_age(&self) -> u8 {
        match self {
            CropKind::Wheat | CropKind::Carrots | CropKind::Potatoes => 7,
            CropKind::Beetroots => 3,
        }
    }

    pub fn block_name(&self) -> &'static str {
        match self {
            CropKind::Wheat => "wheat",
            CropKind::Carrots => "carrots",
            CropKind::Potatoes => "potatoes",
            CropKind::Beetroots => "beetroots",
        }
    }
}

/// Block kinds the bot searches for by proximity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockTarget {
    Bed,
    Chest,
    Furnace,
    CraftingTable,
}

impl BlockTarget {
    /// Whether a raw block name qualifies as this target.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            BlockTarget::Bed => name.ends_with("_bed") || name == "bed",
            BlockTarget::Chest => name == "chest",
            BlockTarget::Furnace => name == "furnace",
            BlockTarget::CraftingTable => name == "crafting_table",
        }
    }
}

/// A block as reported by the world-query service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDescriptor {
    /// Raw block name from the server's registry.
    pub name: String,
    pub pos: BlockPos,
    /// Growth stage for crop blocks.
    pub growth_stage: Option<u8>,
    /// Open/closed state for doors and gates.
    pub open: Option<bool>,
}

impl BlockDescriptor {
    pub fn soil(&self) -> Option<SoilKind> {
        SoilKind::from_block_name(&self.name)
    }

    pub fn crop(&self) -> Option<CropKind> {
        CropKind::from_block_name(&self.name)
    }

    pub fn is_door(&self) -> bool {
        self.name.ends_with("_door") || self.name == "door"
    }

    /// A door that reports itself closed.
    pub fn is_closed_door(&self) -> bool {
        self.is_door() && self.open == Some(false)
    }
}
