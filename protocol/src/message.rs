use serde::{Deserialize, Serialize};

use crate::player::{GameMode, PlayerId, PlayerIdentity};

/// Login form submission.
/// The mode is kept as free text so that unknown values can be reported as
/// a validation error instead of a generic form rejection.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoginRequest {
    pub name: String,
    pub mode: String,
}

/// Who the current cookie belongs to
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SessionInfo {
    pub player_id: PlayerId,
    pub player_name: String,
    pub game_mode: GameMode,
}
impl From<PlayerIdentity> for SessionInfo {
    fn from(identity: PlayerIdentity) -> Self {
        let PlayerIdentity {
            player_id,
            player_name,
            game_mode,
        } = identity;
        Self {
            player_id,
            player_name,
            game_mode,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LobbyInfo {
    pub you: SessionInfo,
    /// Names of everyone signed in with the same game mode, sorted
    pub players: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub enum ErrorReply {
    /// No valid session cookie. Deliberately carries no reason.
    NotSignedIn,
    InvalidLogin { message: String },
}
