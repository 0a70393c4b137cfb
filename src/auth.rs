//! Chat-based login responder
//!
//! Login plugins prompt over chat ("please register", "please login"). This
//! responder watches inbound server text and answers with the configured
//! secret, exactly once per session. A single latch is all the state needed:
//! once either response has been sent, further prompts are ignored until the
//! next reconnect builds a fresh responder.

use crate::config::AuthConfig;

/// Latched pattern-matcher over inbound server text.
#[derive(Debug)]
pub struct AuthResponder {
    config: AuthConfig,
    secret: String,
    latched: bool,
}

impl AuthResponder {
    pub fn new(config: AuthConfig, secret: String) -> Self {
        Self {
            config,
            secret,
            latched: false,
        }
    }

    /// Feed one line of inbound server text. Returns the chat command to
    /// send back, if this line warrants one.
    pub fn observe(&mut self, text: &str) -> Option<String> {
        if self.latched || self.secret.is_empty() {
            return None;
        }
        let lowered = text.to_lowercase();
        if matches_any(&lowered, &self.config.register_prompts) {
            self.latched = true;
            return Some(format!("/register {} {}", self.secret, self.secret));
        }
        if matches_any(&lowered, &self.config.login_prompts) {
            self.latched = true;
            return Some(format!("/login {}", self.secret));
        }
        None
    }

    /// Whether a response has already been issued this session.
    pub fn latched(&self) -> bool {
        self.latched
    }
}

fn matches_any(lowered: &str, prompts: &[String]) -> bool {
    prompts
        .iter()
        .any(|prompt| lowered.contains(&prompt.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn responder() -> AuthResponder {
        AuthResponder::new(AuthConfig::default(), "sekrit".to_string())
    }

    #[test]
    fn test_register_prompt_answered_once() {
        let mut auth = responder();
        let reply = auth.observe("You are not registered! Use /register.");
        assert_eq!(reply.as_deref(), Some("/register sekrit sekrit"));
        assert!(auth.latched());

        // Repeated prompts within the session are ignored.
        assert_eq!(auth.observe("You are not registered!"), None);
        assert_eq!(auth.observe("Please login with /login"), None);
    }

    #[test]
    fn test_login_prompt_answered_while_unlatched() {
        let mut auth = responder();
        let reply = auth.observe("Please LOGIN with /login <password>");
        assert_eq!(reply.as_deref(), Some("/login sekrit"));
        assert_eq!(auth.observe("please login"), None);
    }

    #[test]
    fn test_unrelated_chatter_ignored() {
        let mut auth = responder();
        assert_eq!(auth.observe("Welcome to the server!"), None);
        assert_eq!(auth.observe("<Alice> hello"), None);
        assert!(!auth.latched());
    }

    #[test]
    fn test_no_secret_means_no_response() {
        let mut auth = AuthResponder::new(AuthConfig::default(), String::new());
        assert_eq!(auth.observe("please login"), None);
        assert!(!auth.latched());
    }

    #[test]
    fn test_fresh_responder_per_session_resets_latch() {
        let mut auth = responder();
        auth.observe("please login");
        assert!(auth.latched());

        // Reconnect builds a new responder; the latch starts clear.
        let fresh = responder();
        assert!(!fresh.latched());
    }
}
