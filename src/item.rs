//! Inventory vocabulary: item stacks and the closed stem sets used to
//! classify held items as food, fuel, or smelter input.

use serde::{Deserialize, Serialize};

/// A stack of identical items in the bot's holdings or a container.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    /// Raw item name from the server's registry.
    pub name: String,
    pub count: u32,
}

impl ItemStack {
    pub fn new(name: impl Into<String>, count: u32) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

/// Name stems that qualify an item as furnace fuel.
const FUEL_STEMS: &[&str] = &["coal", "charcoal", "log", "planks"];

/// Name stems that qualify an item as smelter input.
const SMELTABLE_STEMS: &[&str] = &["raw_", "ore"];

/// Items the bot will equip and consume when hungry.
const EDIBLE_ITEMS: &[&str] = &[
    "bread",
    "apple",
    "carrot",
    "potato",
    "baked_potato",
    "beetroot",
    "melon_slice",
    "cooked_beef",
    "cooked_porkchop",
    "cooked_chicken",
    "cooked_mutton",
];

pub fn is_fuel(name: &str) -> bool {
    FUEL_STEMS.iter().any(|stem| name.contains(stem))
}

pub fn is_smeltable(name: &str) -> bool {
    SMELTABLE_STEMS.iter().any(|stem| name.contains(stem))
}

pub fn is_edible(name: &str) -> bool {
    EDIBLE_ITEMS.contains(&name)
}

/// Whether an item name matches any stem on the configured keep-list.
///
/// The keep-list deliberately uses stem matching so one entry like `"hoe"`
/// covers every tool tier.
pub fn on_keep_list(name: &str, keep: &[String]) -> bool {
    keep.iter().any(|stem| name.contains(stem.as_str()))
}
