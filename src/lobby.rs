use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime};

use foxnavy_protocol::{GameMode, PlayerId, PlayerIdentity};

use crate::test_control::Resettable;

#[derive(Debug)]
struct Entry {
    identity: PlayerIdentity,
    joined_at: SystemTime,
}

/// Players that have signed in, grouped by game mode.
///
/// Keyed by player id. Tokens are never stored here: a player whose cookie
/// is still valid stays signed in even after the roster forgets them.
/// Entries are dropped once they are older than the session max-age, since
/// the cookie that put them here has expired by then.
#[derive(Debug)]
pub struct Roster {
    max_age: Duration,
    players: Mutex<HashMap<PlayerId, Entry>>,
}

impl Roster {
    pub fn new(max_age: Duration) -> Self {
        Self {
            max_age,
            players: Mutex::new(HashMap::new()),
        }
    }

    fn players(&self) -> MutexGuard<'_, HashMap<PlayerId, Entry>> {
        // Entries are replaced whole, so a poisoned map is still consistent
        self.players.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Locks the map with every expired entry removed
    fn live_players(&self, now: SystemTime) -> MutexGuard<'_, HashMap<PlayerId, Entry>> {
        let max_age = self.max_age;
        let mut players = self.players();
        players.retain(|_, entry| {
            now.duration_since(entry.joined_at)
                .map_or(true, |age| age <= max_age)
        });
        players
    }

    /// Add or refresh a player
    pub fn join(&self, identity: &PlayerIdentity) {
        self.join_at(identity, SystemTime::now());
    }

    pub fn join_at(&self, identity: &PlayerIdentity, now: SystemTime) {
        let entry = Entry {
            identity: identity.clone(),
            joined_at: now,
        };
        self.live_players(now).insert(identity.player_id, entry);
    }

    pub fn leave(&self, player_id: PlayerId) -> bool {
        self.players().remove(&player_id).is_some()
    }

    /// Display names of everyone in `mode` whose session is still live, sorted
    pub fn names_in(&self, mode: GameMode) -> Vec<String> {
        self.names_in_at(mode, SystemTime::now())
    }

    pub fn names_in_at(&self, mode: GameMode, now: SystemTime) -> Vec<String> {
        let mut names: Vec<String> = self
            .live_players(now)
            .values()
            .filter(|entry| entry.identity.game_mode == mode)
            .map(|entry| entry.identity.player_name.clone())
            .collect();
        names.sort();
        names
    }

    /// Number of entries, including any not yet pruned
    pub fn len(&self) -> usize {
        self.players().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Resettable for Roster {
    fn reset(&self) {
        self.players().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(60 * 60);

    fn player(name: &str, mode: GameMode) -> PlayerIdentity {
        PlayerIdentity {
            player_id: PlayerId::new(),
            player_name: name.to_owned(),
            game_mode: mode,
        }
    }

    #[test]
    fn groups_names_by_mode() {
        let roster = Roster::new(HOUR);
        roster.join(&player("Zed", GameMode::Multiplayer));
        roster.join(&player("Ada", GameMode::Multiplayer));
        roster.join(&player("Solo", GameMode::Computer));

        assert_eq!(roster.names_in(GameMode::Multiplayer), ["Ada", "Zed"]);
        assert_eq!(roster.names_in(GameMode::Computer), ["Solo"]);
        assert_eq!(roster.len(), 3);
    }

    #[test]
    fn rejoining_does_not_duplicate() {
        let roster = Roster::new(HOUR);
        let ada = player("Ada", GameMode::Multiplayer);
        roster.join(&ada);
        roster.join(&ada);
        assert_eq!(roster.len(), 1);

        assert!(roster.leave(ada.player_id));
        assert!(!roster.leave(ada.player_id));
        assert!(roster.is_empty());
    }

    #[test]
    fn reset_clears_everyone() {
        let roster = Roster::new(HOUR);
        roster.join(&player("Ada", GameMode::Multiplayer));
        roster.join(&player("Solo", GameMode::Computer));
        roster.reset();
        assert!(roster.is_empty());
    }

    #[test]
    fn expired_players_drop_out() {
        let roster = Roster::new(HOUR);
        let t0 = SystemTime::now();
        roster.join_at(&player("Ada", GameMode::Multiplayer), t0);
        roster.join_at(&player("Bob", GameMode::Multiplayer), t0 + HOUR / 2);

        assert_eq!(
            roster.names_in_at(GameMode::Multiplayer, t0 + HOUR),
            ["Ada", "Bob"]
        );
        assert_eq!(
            roster.names_in_at(GameMode::Multiplayer, t0 + HOUR + Duration::from_secs(1)),
            ["Bob"]
        );
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn joining_prunes_expired_entries() {
        let roster = Roster::new(HOUR);
        let t0 = SystemTime::now();
        for i in 0..100 {
            roster.join_at(&player(&format!("p{i}"), GameMode::Computer), t0);
        }
        assert_eq!(roster.len(), 100);

        roster.join_at(&player("Late", GameMode::Computer), t0 + 2 * HOUR);
        assert_eq!(roster.len(), 1);
        assert_eq!(
            roster.names_in_at(GameMode::Computer, t0 + 2 * HOUR),
            ["Late"]
        );
    }
}
