//! Player identity and roster management
//!
//! The roster is the ordered set of participants in one quiz session. It
//! is built during the join window: the command issuer is always the first
//! player, everyone who speaks up in the channel before the window closes
//! is appended once, in first-response order.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants;

/// A stable participant identity, opaque to the engine
///
/// The chat platform assigns these; the engine only compares them.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::From,
    derive_more::Display,
)]
pub struct Id(u64);

/// One quiz participant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    id: Id,
    name: String,
}

impl Player {
    /// Creates a player from a participant identity and display name
    pub fn new(id: Id, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// The participant identity
    pub fn id(&self) -> Id {
        self.id
    }

    /// The display name used in announcements and the scoreboard
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Errors produced while building a roster
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The session already holds the maximum number of players
    #[error("maximum number of players reached")]
    RosterFull,
}

/// The ordered players of one quiz session
///
/// The issuer occupies index zero for the whole session; joining order is
/// preserved for everyone else. Scores live in the
/// [`crate::scoreboard::Scoreboard`], not here.
#[derive(Debug, Clone)]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    /// Creates a roster containing only the command issuer
    pub fn new(issuer: Player) -> Self {
        Self {
            players: vec![issuer],
        }
    }

    /// Appends a player unless they already joined
    ///
    /// Returns `Ok(true)` when the player was added and `Ok(false)` when
    /// they were already on the roster.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RosterFull`] once the player cap is reached.
    pub fn add(&mut self, player: Player) -> Result<bool, Error> {
        if self.contains(player.id) {
            return Ok(false);
        }
        if self.players.len() >= constants::quiz::MAX_PLAYER_COUNT {
            return Err(Error::RosterFull);
        }
        self.players.push(player);
        Ok(true)
    }

    /// Whether a participant is on the roster
    pub fn contains(&self, id: Id) -> bool {
        self.players.iter().any(|player| player.id == id)
    }

    /// Looks up a player by identity
    pub fn get(&self, id: Id) -> Option<&Player> {
        self.players.iter().find(|player| player.id == id)
    }

    /// Iterates players in join order, issuer first
    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    /// The number of players on the roster, always at least one
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether the roster is empty (never, the issuer is always present)
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn player(id: u64, name: &str) -> Player {
        Player::new(Id::from(id), name)
    }

    #[test]
    fn test_issuer_is_first() {
        let mut roster = Roster::new(player(7, "Issuer"));
        roster.add(player(1, "Second")).unwrap();
        roster.add(player(2, "Third")).unwrap();

        let names = roster.iter().map(Player::name).collect::<Vec<_>>();
        assert_eq!(names, ["Issuer", "Second", "Third"]);
    }

    #[test]
    fn test_duplicate_responders_join_once() {
        let mut roster = Roster::new(player(7, "Issuer"));
        assert_eq!(roster.add(player(1, "Echo")), Ok(true));
        assert_eq!(roster.add(player(1, "Echo")), Ok(false));
        assert_eq!(roster.add(player(7, "Issuer")), Ok(false));
        assert_eq!(roster.len(), 2);
    }

    #[test]
    fn test_roster_capacity() {
        let mut roster = Roster::new(player(0, "Issuer"));
        for id in 1..constants::quiz::MAX_PLAYER_COUNT as u64 {
            roster.add(player(id, "P")).unwrap();
        }
        assert_eq!(roster.add(player(9_999, "Late")), Err(Error::RosterFull));
        assert_eq!(roster.len(), constants::quiz::MAX_PLAYER_COUNT);
    }

    #[test]
    fn test_lookup() {
        let roster = Roster::new(player(7, "Issuer"));
        assert!(roster.contains(Id::from(7)));
        assert!(!roster.contains(Id::from(8)));
        assert_eq!(roster.get(Id::from(7)).map(Player::name), Some("Issuer"));
        assert!(!roster.is_empty());
    }
}
