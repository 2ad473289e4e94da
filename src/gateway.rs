use std::time::SystemTime;

use foxnavy_protocol::{
    AuthError, GameMode, LoginRequest, PlayerId, PlayerIdentity, SessionSecret, SessionToken,
    TokenCodec, UnknownGameMode,
};

use crate::config::SessionPolicy;
#[cfg(any(test, feature = "test-control"))]
use crate::test_control::TestControl;

/// Cookie carrying the session token
pub const SESSION_COOKIE: &str = "session";

/// Longest accepted display name, in characters
pub const MAX_NAME_CHARS: usize = 32;

/// Bad login input. Shown to the player so they can try again.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("name must be at most {} characters", MAX_NAME_CHARS)]
    NameTooLong,
    #[error(transparent)]
    UnknownMode(#[from] UnknownGameMode),
}

/// Turns login submissions into session tokens and cookies back into
/// identities. Shared between all request handlers; never mutated.
pub struct SessionGateway {
    codec: TokenCodec,
    policy: SessionPolicy,
    #[cfg(any(test, feature = "test-control"))]
    test_control: Option<TestControl>,
}

impl SessionGateway {
    pub fn new(secret: SessionSecret, policy: SessionPolicy) -> Self {
        Self {
            codec: TokenCodec::new(secret),
            policy,
            #[cfg(any(test, feature = "test-control"))]
            test_control: None,
        }
    }

    #[cfg(any(test, feature = "test-control"))]
    pub fn with_test_control(mut self, control: TestControl) -> Self {
        self.test_control = Some(control);
        self
    }

    pub fn policy(&self) -> SessionPolicy {
        self.policy
    }

    /// Validate a raw login form and start a session
    pub fn login(
        &self,
        request: &LoginRequest,
    ) -> Result<(PlayerIdentity, SessionToken), ValidationError> {
        let mode: GameMode = request.mode.parse()?;
        self.begin_session(&request.name, mode)
    }

    pub fn begin_session(
        &self,
        name: &str,
        mode: GameMode,
    ) -> Result<(PlayerIdentity, SessionToken), ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if name.chars().count() > MAX_NAME_CHARS {
            return Err(ValidationError::NameTooLong);
        }

        let identity = PlayerIdentity {
            player_id: PlayerId::new(),
            player_name: name.to_owned(),
            game_mode: mode,
        };
        let token = self.codec.mint_now(&identity);
        log::info!(
            "New {} session for {:?} ({})",
            mode,
            identity.player_name,
            identity.player_id
        );
        Ok((identity, token))
    }

    pub fn authenticate(&self, cookie: Option<&str>) -> Result<PlayerIdentity, AuthError> {
        self.authenticate_at(cookie, SystemTime::now())
    }

    pub fn authenticate_at(
        &self,
        cookie: Option<&str>,
        now: SystemTime,
    ) -> Result<PlayerIdentity, AuthError> {
        let token = cookie.ok_or(AuthError::Missing)?;
        self.codec
            .decode(token, now, self.policy.max_age)
            .map_err(|error| {
                log::debug!("Rejected session cookie: {}", error);
                error
            })
    }

    /// `Set-Cookie` value for a freshly minted token.
    /// The cookie lives exactly as long as the token is accepted.
    pub fn session_cookie(&self, token: &SessionToken) -> String {
        self.cookie(token.as_str(), self.policy.max_age.as_secs())
    }

    /// `Set-Cookie` value that makes the browser drop the session
    pub fn clear_cookie(&self) -> String {
        self.cookie("", 0)
    }

    fn cookie(&self, value: &str, max_age_secs: u64) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
            SESSION_COOKIE, value, max_age_secs
        );
        if self.policy.secure_cookies {
            cookie.push_str("; Secure");
        }
        cookie
    }

    #[cfg(any(test, feature = "test-control"))]
    pub fn test_control_enabled(&self) -> bool {
        self.test_control.is_some()
    }

    /// Wipe lobby state between end-to-end test cases.
    /// Returns `false` when this gateway was built without the capability.
    #[cfg(any(test, feature = "test-control"))]
    pub fn reset_test_state(&self) -> bool {
        match &self.test_control {
            Some(control) => {
                control.reset_all();
                true
            }
            None => false,
        }
    }
}
