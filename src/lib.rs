#![deny(unused_must_use)]

use std::sync::Arc;

use warp::filters::BoxedFilter;
use warp::reply::Response;

pub mod config;
mod gateway;
pub mod lobby;
mod routes;
pub mod test_control;

pub use self::config::{Config, ConfigError, SessionPolicy};
pub use self::gateway::{SessionGateway, ValidationError, MAX_NAME_CHARS, SESSION_COOKIE};
pub use foxnavy_protocol as protocol;
pub use foxnavy_protocol::{AuthError, GameMode, PlayerId, PlayerIdentity, SessionSecret};

use self::lobby::Roster;

/// Assembles the session gateway, the lobby roster and the HTTP routes
pub struct Builder {
    secret: SessionSecret,
    policy: SessionPolicy,
    #[cfg(any(test, feature = "test-control"))]
    test_control: bool,
}

impl Builder {
    pub fn new(secret: SessionSecret) -> Self {
        Self {
            secret,
            policy: SessionPolicy::default(),
            #[cfg(any(test, feature = "test-control"))]
            test_control: false,
        }
    }

    pub fn from_config(config: Config) -> Self {
        Self::new(config.secret).policy(config.policy)
    }

    pub fn policy(mut self, policy: SessionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Mount `POST /test/reset`, which wipes the lobby roster
    #[cfg(any(test, feature = "test-control"))]
    pub fn with_test_control(mut self) -> Self {
        self.test_control = true;
        self
    }

    pub fn build(self) -> BoxedFilter<(Response,)> {
        let gateway = SessionGateway::new(self.secret, self.policy);
        // Lobby entries last exactly as long as the session that created them
        let roster = Arc::new(Roster::new(gateway.policy().max_age));

        #[cfg(any(test, feature = "test-control"))]
        let gateway = if self.test_control {
            gateway.with_test_control(
                test_control::TestControl::new().register(roster.clone()),
            )
        } else {
            gateway
        };

        routes::routes(Arc::new(gateway), roster)
    }
}
