//! Connection management
//!
//! Owns the lifecycle of the single session to the server: connect, build
//! fresh per-session state, spawn the timer loops, and tear the whole lot
//! down when the session ends for any reason. Reconnection is an infinite
//! loop with a fixed delay; the domain expects the server to come back
//! eventually, so there is no backoff and no retry cap.

use crate::commands;
use crate::config::BotConfig;
use crate::error::StewardError;
use crate::journal::Journal;
use crate::keeping;
use crate::routine;
use crate::services::Services;
use crate::session::SessionState;
use crate::vitals;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Lifecycle and text events emitted by the session service.
#[derive(Debug)]
pub enum SessionEvent {
    /// The bot has spawned and the world is usable.
    Ready,
    /// A player spoke in chat.
    Chat { sender: String, text: String },
    /// Free-text server notification (login prompts arrive here).
    SystemMessage { text: String },
    /// The session closed: graceful close, kick, or timeout.
    Ended { reason: String },
    /// The protocol layer gave up on the session.
    ProtocolError { message: String },
}

/// Produces connected sessions. The real implementation wraps the game
/// protocol client; tests and dry runs script their own.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        config: &BotConfig,
    ) -> Result<(Services, mpsc::Receiver<SessionEvent>), StewardError>;
}

/// Drives connect/run/teardown forever.
pub struct Supervisor {
    connector: Arc<dyn Connector>,
    config: Arc<BotConfig>,
    journal: Journal,
}

impl Supervisor {
    pub fn new(connector: Arc<dyn Connector>, config: Arc<BotConfig>, journal: Journal) -> Self {
        Self {
            connector,
            config,
            journal,
        }
    }

    /// Run sessions until the process dies. Each pass of the loop is one
    /// session (or one failed connect), followed by the fixed delay.
    pub async fn run(&self) {
        loop {
            self.run_once().await;
            let delay = self.config.timing.reconnect_delay();
            info!(?delay, "reconnecting");
            self.journal.record("reconnecting");
            tokio::time::sleep(delay).await;
        }
    }

    /// One connect/serve cycle. Returns when the session ends or the
    /// connect fails; per-session state never outlives this call.
    pub async fn run_once(&self) {
        let (services, mut events) = match self.connector.connect(&self.config).await {
            Ok(connected) => connected,
            Err(e) => {
                warn!(error = %e, "connect failed");
                self.journal.record(&format!("connect failed: {}", e));
                return;
            }
        };

        // Wait for the world to be usable before building any state.
        loop {
            match events.recv().await {
                Some(SessionEvent::Ready) => break,
                Some(SessionEvent::Ended { reason }) => {
                    info!(%reason, "session ended before ready");
                    return;
                }
                Some(SessionEvent::ProtocolError { message }) => {
                    warn!(%message, "protocol error before ready");
                    return;
                }
                Some(event) => debug!(?event, "pre-ready event"),
                None => return,
            }
        }

        let sess = Arc::new(SessionState::new(
            self.config.clone(),
            services,
            self.journal.clone(),
        ));
        info!(session = %sess.id, "session ready");
        self.journal.record("session ready");

        // The three independent timers, all torn down by one token.
        tokio::spawn(routine::run(sess.clone()));
        tokio::spawn(keeping::run_smelt_timer(sess.clone()));
        tokio::spawn(vitals::run(sess.clone()));

        while let Some(event) = events.recv().await {
            match event {
                SessionEvent::Chat { sender, text } => {
                    self.respond_to_prompts(&sess, &text).await;
                    commands::handle_chat(&sess, &sender, &text).await;
                }
                SessionEvent::SystemMessage { text } => {
                    self.respond_to_prompts(&sess, &text).await;
                }
                SessionEvent::Ended { reason } => {
                    info!(%reason, "session ended");
                    self.journal.record(&format!("session ended: {}", reason));
                    break;
                }
                SessionEvent::ProtocolError { message } => {
                    warn!(%message, "protocol error");
                    self.journal
                        .record(&format!("protocol error: {}", message));
                    break;
                }
                SessionEvent::Ready => {}
            }
        }

        // Cancels the timers and any in-flight handler continuations; the
        // state itself drops with `sess`.
        sess.cancel.cancel();
    }

    /// Feed server text to the login responder and send its answer, if any.
    async fn respond_to_prompts(&self, sess: &Arc<SessionState>, text: &str) {
        let response = {
            let mut auth = sess.auth.lock().unwrap_or_else(|p| p.into_inner());
            auth.observe(text)
        };
        if let Some(command) = response {
            info!("answering login prompt");
            self.journal.record("answered login prompt");
            if let Err(e) = sess.services.actions.send_chat(&command).await {
                warn!(error = %e, "login response failed");
            }
        }
    }
}
