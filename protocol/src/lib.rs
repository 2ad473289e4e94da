//! Types shared by the server and the browser client, including the wire
//! format of the session cookie.

mod message;
mod player;
pub mod token;

pub use self::message::{ErrorReply, LobbyInfo, LoginRequest, SessionInfo};
pub use self::player::{GameMode, PlayerId, PlayerIdentity, UnknownGameMode};
pub use self::token::{AuthError, SecretError, SessionSecret, SessionToken, TokenCodec};
