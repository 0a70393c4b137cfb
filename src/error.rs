//! Error taxonomy for the bot

use crate::block::BlockPos;
use thiserror::Error;

/// Errors surfaced by the service layer and task handlers.
///
/// Only connectivity failures ([`StewardError::SessionEnded`]) are allowed to
/// cross the task-handler boundary; everything else is caught at the tick
/// boundary, logged, and retried on the next natural invocation.
#[derive(Debug, Error)]
pub enum StewardError {
    /// The navigation service could not find a route to the goal.
    #[error("no path to {0}")]
    NoPath(BlockPos),

    /// A navigation call did not complete within the configured timeout.
    #[error("navigation to {0} timed out")]
    NavigationTimeout(BlockPos),

    /// A world query (block lookup, clock read, player lookup) failed.
    #[error("world query failed: {0}")]
    World(String),

    /// An action (dig, place, equip, consume, craft, chat) failed.
    #[error("action failed: {0}")]
    Action(String),

    /// Container I/O (open, deposit, withdraw) failed.
    #[error("container i/o failed: {0}")]
    Container(String),

    /// The underlying session is gone; the supervisor will reconnect.
    #[error("session ended")]
    SessionEnded,

    /// Configuration could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),
}
