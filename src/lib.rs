//! Steward - an autonomous caretaker bot for chat-login survival servers
//!
//! The bot connects, answers the server's login prompts, and then runs a
//! daily routine off the world clock: sleep at night, farm the plot on odd
//! days, patrol on even days. Independent timers keep the furnace fed and
//! the bot eating. Everything session-scoped is rebuilt from scratch on
//! every reconnect.
//!
//! ## Modules
//!
//! - [`connection`] - Connect/serve/reconnect supervisor
//! - [`routine`] - The day/night scheduler
//! - [`farming`], [`rest`], [`keeping`], [`vitals`] - Task handlers
//! - [`services`] - Trait seams over the protocol client
//! - [`simworld`] - In-process simulated server for dry runs

pub mod auth;
pub mod block;
pub mod commands;
pub mod config;
pub mod connection;
pub mod error;
pub mod farming;
pub mod item;
pub mod journal;
pub mod keeping;
pub mod rest;
pub mod routine;
pub mod services;
pub mod session;
pub mod simworld;
pub mod vitals;

#[cfg(test)]
mod testutil;

// Core types
pub use block::{Area, BlockDescriptor, BlockPos, BlockTarget, CropKind};
pub use config::BotConfig;
pub use error::StewardError;
pub use item::ItemStack;

// Session plumbing
pub use connection::{Connector, SessionEvent, Supervisor};
pub use journal::Journal;
pub use services::{Actions, Holdings, Navigator, Services, WorldClock, WorldQuery};
pub use session::SessionState;

// Scheduler state
pub use routine::{ActiveTask, RoutineState, TickAction};

// Dry-run harness
pub use simworld::SimConnector;
