//! Cumulative scoring and the end-of-quiz summary
//!
//! Points only ever enter the scoreboard when a round closes, so there is a
//! single writer per session and no partial-round state to reconcile after
//! a pause or an early end.

use std::{cmp::Reverse, collections::HashMap};

use itertools::Itertools;

use crate::roster::{Id, Player, Roster};

/// Accumulated points for one quiz session
#[derive(Debug, Clone, Default)]
pub struct Scoreboard {
    points: HashMap<Id, u64>,
}

impl Scoreboard {
    /// Creates an empty scoreboard
    pub fn new() -> Self {
        Self::default()
    }

    /// Awards one point to a player
    pub fn record_point(&mut self, id: Id) {
        *self.points.entry(id).or_default() += 1;
    }

    /// A player's current score, zero when they never answered correctly
    pub fn score(&self, id: Id) -> u64 {
        self.points.get(&id).copied().unwrap_or_default()
    }

    /// All players ranked by score, best first
    ///
    /// The sort is stable over roster order, so tied players appear in
    /// join order.
    pub fn standings<'a>(&self, roster: &'a Roster) -> Vec<(&'a Player, u64)> {
        roster
            .iter()
            .map(|player| (player, self.score(player.id())))
            .sorted_by_key(|(_, score)| Reverse(*score))
            .collect()
    }

    /// Renders the end-of-quiz announcement
    ///
    /// A single player gets a short final-score line; a group gets the
    /// best scorer called out followed by the full scoreboard.
    pub fn summarize(&self, roster: &Roster, max_score: u64) -> String {
        let standings = self.standings(roster);
        if let [(_, score)] = standings[..] {
            return format!("The Quiz is over!\nFinal score: {score}/{max_score}.");
        }

        let mut summary = String::from("The Quiz is over!\n");
        if let Some((best, best_score)) = standings.first() {
            summary.push_str(&format!(
                "{} had the best score with {best_score}/{max_score}\n",
                best.name()
            ));
        }
        summary.push_str("\nScoreboard:");
        for (player, score) in &standings {
            summary.push_str(&format!("\n{}: {score}/{max_score}", player.name()));
        }
        summary
    }
}
