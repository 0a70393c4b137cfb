//! Bot configuration
//!
//! Loaded once at startup from a TOML or YAML file and never mutated at
//! runtime. Every numeric constant observed in the field (night window,
//! thresholds, intervals) lives here with its observed default, so the
//! handlers hold no magic numbers.

use crate::block::{Area, BlockPos, CropKind};
use crate::error::StewardError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration for one bot instance.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub server: ServerConfig,
    pub places: PlacesConfig,
    pub patrol: PatrolConfig,
    pub timing: TimingConfig,
    pub routine: RoutineConfig,
    pub tunables: Tunables,
    pub chat: ChatConfig,
    pub auth: AuthConfig,

    /// Item name stems never deposited by the store handler.
    pub keep_items: Vec<String>,

    /// Fallback mature growth stage per crop, used when the world-query
    /// service reports no per-crop metadata.
    pub crop_mature_ages: HashMap<CropKind, u8>,

    /// Append-only plain-text journal file.
    pub journal_path: PathBuf,
}

/// Server address and identity.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    /// Secret submitted to the chat-based login plugin.
    pub auth_secret: String,
}

/// Named coordinates the handlers navigate to.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacesConfig {
    /// Center of the bed search.
    pub bed_search_center: BlockPos,
    /// Optional bounding area a found bed must fall inside.
    pub bed_area: Option<Area>,
    /// Farm plot corners; `farm_min.y` is the soil level.
    pub farm_min: BlockPos,
    pub farm_max: BlockPos,
    pub chest: BlockPos,
    pub furnace: BlockPos,
    pub crafting_table: BlockPos,
    /// Door opened before travel, when present.
    pub door: Option<BlockPos>,
}

/// Patrol route for the roam task.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PatrolConfig {
    /// Center point; also the walk target at the start of a farming day.
    pub center: BlockPos,
    /// Offset of the four cardinal waypoints (default: 5).
    pub radius: i32,
    /// Pick a random offset within the radius instead of the fixed
    /// four-point route.
    pub randomized: bool,
}

/// Timer intervals and timeouts, in seconds.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Routine scheduler poll interval (default: 5).
    pub tick_secs: u64,
    /// Furnace-feeding interval (default: 60).
    pub smelt_secs: u64,
    /// Hunger check interval (default: 5).
    pub vitals_secs: u64,
    /// Fixed delay before reconnecting (default: 5).
    pub reconnect_secs: u64,
    /// Deadline for any single navigation call (default: 30).
    pub navigation_timeout_secs: u64,
}

impl TimingConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_secs)
    }

    pub fn smelt_interval(&self) -> Duration {
        Duration::from_secs(self.smelt_secs)
    }

    pub fn vitals_interval(&self) -> Duration {
        Duration::from_secs(self.vitals_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_secs)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }
}

/// Day/night routing for the scheduler.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutineConfig {
    /// First time-of-day tick counted as night (default: 13000).
    pub night_start: u32,
    /// Last time-of-day tick counted as night, inclusive (default: 23458).
    pub night_end: u32,
}

impl RoutineConfig {
    /// Whether a time-of-day value falls in the night window. Both bounds
    /// are inclusive.
    pub fn is_night(&self, time_of_day: u32) -> bool {
        time_of_day >= self.night_start && time_of_day <= self.night_end
    }
}

/// Numeric thresholds for the task handlers.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Tunables {
    /// Search radius for beds, chests, and stations (default: 16).
    pub search_radius: u32,
    /// Eat when satiation drops below this, out of a max of 20 (default: 18).
    pub eat_threshold: u8,
    /// Wheat consumed per loaf (default: 3).
    pub wheat_per_bread: u32,
    /// Seeds fetched from the chest when replanting runs dry (default: 3).
    pub seed_restock: u32,
}

/// In-game chat behavior.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Announce the start of a farming day in chat.
    pub announcements: bool,
    pub farming_message: String,
    /// Accept the chat command surface (`stop`, `start`, `farm`, ...).
    pub commands_enabled: bool,
    /// Only this sender may issue commands; `None` accepts anyone.
    pub authorized_sender: Option<String>,
}

/// Patterns recognized by the authentication responder. Matching is
/// case-insensitive substring matching against inbound server text.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub register_prompts: Vec<String>,
    pub login_prompts: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 25565,
            username: "Steward".to_string(),
            auth_secret: String::new(),
        }
    }
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            bed_search_center: BlockPos::new(0, 64, 0),
            bed_area: None,
            farm_min: BlockPos::new(-8, 63, -8),
            farm_max: BlockPos::new(8, 63, 8),
            chest: BlockPos::new(2, 64, 2),
            furnace: BlockPos::new(3, 64, 2),
            crafting_table: BlockPos::new(4, 64, 2),
            door: None,
        }
    }
}

impl Default for PatrolConfig {
    fn default() -> Self {
        Self {
            center: BlockPos::new(0, 64, 0),
            radius: 5,
            randomized: false,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_secs: 5,
            smelt_secs: 60,
            vitals_secs: 5,
            reconnect_secs: 5,
            navigation_timeout_secs: 30,
        }
    }
}

impl Default for RoutineConfig {
    fn default() -> Self {
        Self {
            night_start: 13_000,
            night_end: 23_458,
        }
    }
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            search_radius: 16,
            eat_threshold: 18,
            wheat_per_bread: 3,
            seed_restock: 3,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            announcements: false,
            farming_message: "Farming now!".to_string(),
            commands_enabled: false,
            authorized_sender: None,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            register_prompts: vec!["not registered".to_string(), "/register".to_string()],
            login_prompts: vec![
                "please login".to_string(),
                "logged out".to_string(),
                "/login".to_string(),
            ],
        }
    }
}

impl BotConfig {
    /// Load configuration from a TOML or YAML file, chosen by extension.
    pub fn load(path: &Path) -> Result<BotConfig, StewardError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| StewardError::Config(format!("read {}: {}", path.display(), e)))?;
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let mut config: BotConfig = if is_yaml {
            serde_yaml::from_str(&raw)
                .map_err(|e| StewardError::Config(format!("parse {}: {}", path.display(), e)))?
        } else {
            toml::from_str(&raw)
                .map_err(|e| StewardError::Config(format!("parse {}: {}", path.display(), e)))?
        };
        config.fill_defaults();
        Ok(config)
    }

    /// Populate the list/map fields that serde's empty defaults would
    /// otherwise leave blank.
    fn fill_defaults(&mut self) {
        if self.keep_items.is_empty() {
            self.keep_items = Self::default_keep_items();
        }
        if self.crop_mature_ages.is_empty() {
            self.crop_mature_ages = Self::default_crop_ages();
        }
        if self.journal_path.as_os_str().is_empty() {
            self.journal_path = PathBuf::from("steward.log");
        }
    }

    fn default_keep_items() -> Vec<String> {
        ["bread", "seeds", "potato", "carrot", "hoe"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn default_crop_ages() -> HashMap<CropKind, u8> {
        let mut ages = HashMap::new();
        for crop in [
            CropKind::Wheat,
            CropKind::Carrots,
            CropKind::Potatoes,
            CropKind::Beetroots,
        ] {
            ages.insert(crop, crop.default_mature_age());
        }
        ages
    }

    /// A fully-populated default configuration, as `load` would produce for
    /// an empty file.
    pub fn standard() -> BotConfig {
        let mut config = BotConfig::default();
        config.fill_defaults();
        config
    }

    /// Fallback mature age for a crop from the config table.
    pub fn mature_age(&self, crop: CropKind) -> u8 {
        self.crop_mature_ages
            .get(&crop)
            .copied()
            .unwrap_or_else(|| crop.default_mature_age())
    }
}
