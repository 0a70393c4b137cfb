//! Per-session state
//!
//! Everything that must not survive a reconnect lives in one
//! [`SessionState`], built at session ready and dropped whole when the
//! session ends. Reconnect-reset is therefore "construct a new one";
//! there is no field-by-field clearing anywhere.

use crate::auth::AuthResponder;
use crate::block::BlockPos;
use crate::config::BotConfig;
use crate::error::StewardError;
use crate::journal::Journal;
use crate::routine::{RoutineState, TickAction};
use crate::services::Services;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// State owned by one connected session.
pub struct SessionState {
    /// Identifier carried in log events, new per connect.
    pub id: Uuid,
    pub config: Arc<BotConfig>,
    pub services: Services,
    pub journal: Journal,

    /// Scheduler working state.
    pub routine: Mutex<RoutineState>,
    /// Login-prompt responder; its latch dies with the session.
    pub auth: Mutex<AuthResponder>,
    /// Tasks forced by chat commands, drained one per tick.
    forced: Mutex<VecDeque<TickAction>>,

    /// Reentrancy latch for the eat check.
    pub is_eating: AtomicBool,
    /// Serializes held-item mutation across the routine, smelt, and vitals
    /// timers. The timers themselves stay independent; only their
    /// equip/consume/deposit critical sections take this.
    pub inventory_lease: tokio::sync::Mutex<()>,

    /// Wakes the scheduler loop out of its poll interval (used by the wake
    /// notification and by chat commands).
    pub tick_nudge: Notify,
    /// Cancelled exactly once, at session end; every per-session task
    /// selects on it.
    pub cancel: CancellationToken,
}

impl SessionState {
    pub fn new(config: Arc<BotConfig>, services: Services, journal: Journal) -> Self {
        let auth = AuthResponder::new(config.auth.clone(), config.server.auth_secret.clone());
        Self {
            id: Uuid::new_v4(),
            config,
            services,
            journal,
            routine: Mutex::new(RoutineState::new()),
            auth: Mutex::new(auth),
            forced: Mutex::new(VecDeque::new()),
            is_eating: AtomicBool::new(false),
            inventory_lease: tokio::sync::Mutex::new(()),
            tick_nudge: Notify::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Snapshot of the routine state.
    pub fn routine_state(&self) -> RoutineState {
        self.routine
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Mutate the routine state under the lock.
    pub fn with_routine<R>(&self, f: impl FnOnce(&mut RoutineState) -> R) -> R {
        let mut guard = self
            .routine
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }

    /// Queue a task forced by a chat command and nudge the scheduler.
    pub fn push_forced(&self, action: TickAction) {
        self.forced
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(action);
        self.tick_nudge.notify_one();
    }

    pub fn take_forced(&self) -> Option<TickAction> {
        self.forced
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
    }

    /// Navigate with the configured timeout. A call that never completes
    /// surfaces as [`StewardError::NavigationTimeout`] instead of hanging
    /// the handler forever.
    pub async fn navigate(&self, pos: BlockPos) -> Result<(), StewardError> {
        match tokio::time::timeout(
            self.config.timing.navigation_timeout(),
            self.services.nav.go_to(pos),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(StewardError::NavigationTimeout(pos)),
        }
    }

    /// Spawn a task that dies with the session.
    pub fn spawn_scoped<F>(self: &Arc<Self>, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = future => {}
            }
        });
    }
}
