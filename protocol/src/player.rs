use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Player, independent of browser session
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize, Serialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub(crate) Uuid);
impl PlayerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The all-zero id never belongs to a real player.
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Chosen on the login form, fixed for the lifetime of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Solo game against the computer
    Computer,
    Multiplayer,
}

impl GameMode {
    pub const ALL: [GameMode; 2] = [GameMode::Computer, GameMode::Multiplayer];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Computer => "computer",
            GameMode::Multiplayer => "multiplayer",
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown game mode {0:?}")]
pub struct UnknownGameMode(pub String);

impl FromStr for GameMode {
    type Err = UnknownGameMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownGameMode(s.to_owned()))
    }
}

/// The authenticated subject of a session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct PlayerIdentity {
    pub player_id: PlayerId,
    pub player_name: String,
    pub game_mode: GameMode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_mode_parses_form_values() {
        assert_eq!("computer".parse::<GameMode>(), Ok(GameMode::Computer));
        assert_eq!(" Multiplayer ".parse::<GameMode>(), Ok(GameMode::Multiplayer));
        assert_eq!(
            "solo".parse::<GameMode>(),
            Err(UnknownGameMode("solo".to_owned()))
        );
        assert!("".parse::<GameMode>().is_err());
    }

    #[test]
    fn fresh_player_ids_are_distinct_and_not_nil() {
        let a = PlayerId::new();
        let b = PlayerId::new();
        assert_ne!(a, b);
        assert!(!a.is_nil());
        assert!(PlayerId::default().is_nil());
    }
}
