//! Per-question answer collection and grading
//!
//! A round is the transient state of one timed collection window: which
//! players have used their single attempt, and what each attempt was
//! graded as. Grading is a named policy so the permissive substring check
//! inherited from the original bot can be swapped for exact matching
//! without touching the session loop.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use web_time::SystemTime;

use crate::{
    roster::{Id, Roster},
    session::{Chat, ChatMessage},
};

/// The visible marker attached to a graded answer message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The answer contained the call-out
    Correct,
    /// The answer did not contain the call-out
    Incorrect,
}

impl Verdict {
    /// The reaction symbol the chat layer should attach
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Correct => "✅",
            Self::Incorrect => "❌",
        }
    }
}

/// How a candidate answer is compared against the call-out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GradingPolicy {
    /// Correct iff the message text contains the call-out as a substring
    ///
    /// This is deliberately permissive ("not alpha" grades correct for
    /// the call-out "alpha"), matching the original bot.
    #[default]
    Containment,
    /// Correct iff the trimmed message text equals the call-out
    Exact,
}

impl GradingPolicy {
    /// Grades a candidate answer against the round's call-out
    ///
    /// Both checks are case-sensitive; call-outs are lowercase by
    /// construction, so lowercase answers are what players must send.
    pub fn grade(self, call_out: &str, text: &str) -> bool {
        match self {
            Self::Containment => text.contains(call_out),
            Self::Exact => text.trim() == call_out,
        }
    }
}

/// The outcome of one finished round
#[derive(Debug, Clone)]
pub struct RoundResult {
    reactions: Vec<(Id, bool)>,
}

impl RoundResult {
    /// Every graded attempt in arrival order: (player, was correct)
    pub fn reactions(&self) -> &[(Id, bool)] {
        &self.reactions
    }

    /// The set of players whose attempt was graded this round
    pub fn scored_players(&self) -> HashSet<Id> {
        self.reactions.iter().map(|(id, _)| *id).collect()
    }

    /// Iterates the players who answered correctly
    pub fn correct_players(&self) -> impl Iterator<Item = Id> + '_ {
        self.reactions
            .iter()
            .filter(|(_, correct)| *correct)
            .map(|(id, _)| *id)
    }
}

/// Collection state for a single question's answer window
#[derive(Debug)]
pub struct Round {
    call_out: String,
    policy: GradingPolicy,
    answered: HashSet<Id>,
    reactions: Vec<(Id, bool)>,
    opened_at: SystemTime,
}

impl Round {
    /// Opens a round for the given call-out
    pub fn new(call_out: &str, policy: GradingPolicy) -> Self {
        Self {
            call_out: call_out.to_owned(),
            policy,
            answered: HashSet::new(),
            reactions: Vec::new(),
            opened_at: SystemTime::now(),
        }
    }

    /// The answer this round is about
    pub fn call_out(&self) -> &str {
        &self.call_out
    }

    /// Time since the round opened
    pub fn elapsed(&self) -> Duration {
        self.opened_at.elapsed().unwrap_or_default()
    }

    /// Considers an in-channel message as an answer candidate
    ///
    /// Messages from non-players are ignored entirely. Each player gets
    /// exactly one graded attempt per round; later messages from the same
    /// player are ignored. A graded attempt is immediately marked with a
    /// correct/incorrect reaction (best effort, failures logged).
    ///
    /// Returns the grade of the attempt, or `None` when the message was
    /// not graded.
    pub fn accept<C: Chat>(
        &mut self,
        message: &ChatMessage,
        roster: &Roster,
        chat: &C,
    ) -> Option<bool> {
        if !roster.contains(message.author) {
            return None;
        }
        if !self.answered.insert(message.author) {
            return None;
        }

        let correct = self.policy.grade(&self.call_out, &message.text);
        let verdict = if correct {
            Verdict::Correct
        } else {
            Verdict::Incorrect
        };
        if let Err(error) = chat.react(message.id, verdict) {
            log::warn!("could not mark answer {}: {error}", message.id);
        }

        self.reactions.push((message.author, correct));
        Some(correct)
    }

    /// Closes the round and yields its result
    pub fn finish(self) -> RoundResult {
        log::debug!(
            "collected {} answers for \"{}\" in {:?}",
            self.reactions.len(),
            self.call_out,
            self.elapsed()
        );
        RoundResult {
            reactions: self.reactions,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::cell::RefCell;
    use std::path::Path;

    use super::*;
    use crate::roster::Player;
    use crate::session::{DeliveryError, MessageId};

    #[derive(Default)]
    struct TestChat {
        reactions: RefCell<Vec<(MessageId, Verdict)>>,
    }

    impl Chat for TestChat {
        fn send_text(&self, _text: &str) -> Result<(), DeliveryError> {
            Ok(())
        }

        fn send_image(&self, _image: &Path) -> Result<(), DeliveryError> {
            Ok(())
        }

        fn react(&self, message: MessageId, verdict: Verdict) -> Result<(), DeliveryError> {
            self.reactions.borrow_mut().push((message, verdict));
            Ok(())
        }
    }

    fn message(id: u64, author: u64, text: &str) -> ChatMessage {
        ChatMessage {
            id: MessageId::from(id),
            author: Id::from(author),
            author_name: format!("player-{author}"),
            text: text.to_owned(),
        }
    }

    fn two_player_roster() -> Roster {
        let mut roster = Roster::new(Player::new(Id::from(1), "Alice"));
        roster.add(Player::new(Id::from(2), "Bob")).unwrap();
        roster
    }

    #[test]
    fn test_containment_grading_is_a_substring_check() {
        let policy = GradingPolicy::Containment;
        assert!(policy.grade("gamma", "I think it's gamma maybe"));
        assert!(policy.grade("alpha", "alpha"));
        assert!(!policy.grade("alpha", "beta"));
        // Permissive by design: negations still contain the call-out.
        assert!(policy.grade("alpha", "not alpha"));
        // Case sensitive containment.
        assert!(!policy.grade("alpha", "Alpha"));
    }

    #[test]
    fn test_exact_grading() {
        let policy = GradingPolicy::Exact;
        assert!(policy.grade("alpha", "alpha"));
        assert!(policy.grade("alpha", "  alpha  "));
        assert!(!policy.grade("alpha", "not alpha"));
    }

    #[test]
    fn test_first_attempt_per_player_is_graded() {
        let chat = TestChat::default();
        let roster = two_player_roster();
        let mut round = Round::new("alpha", GradingPolicy::Containment);

        assert_eq!(round.accept(&message(10, 1, "beta"), &roster, &chat), Some(false));
        // Second attempt from the same player is ignored even if correct.
        assert_eq!(round.accept(&message(11, 1, "alpha"), &roster, &chat), None);
        assert_eq!(round.accept(&message(12, 2, "alpha"), &roster, &chat), Some(true));

        let result = round.finish();
        assert_eq!(
            result.reactions(),
            [(Id::from(1), false), (Id::from(2), true)]
        );
        assert_eq!(result.correct_players().collect::<Vec<_>>(), [Id::from(2)]);
        assert_eq!(result.scored_players().len(), 2);
    }

    #[test]
    fn test_non_players_are_never_graded() {
        let chat = TestChat::default();
        let roster = two_player_roster();
        let mut round = Round::new("alpha", GradingPolicy::Containment);

        assert_eq!(round.accept(&message(10, 99, "alpha"), &roster, &chat), None);
        assert!(chat.reactions.borrow().is_empty());
        assert!(round.finish().reactions().is_empty());
    }

    #[test]
    fn test_graded_attempts_are_marked() {
        let chat = TestChat::default();
        let roster = two_player_roster();
        let mut round = Round::new("alpha", GradingPolicy::Containment);

        round.accept(&message(10, 1, "alpha"), &roster, &chat);
        round.accept(&message(11, 2, "nope"), &roster, &chat);

        assert_eq!(
            *chat.reactions.borrow(),
            [
                (MessageId::from(10), Verdict::Correct),
                (MessageId::from(11), Verdict::Incorrect),
            ]
        );
    }

    #[test]
    fn test_reaction_failure_does_not_lose_the_attempt() {
        struct FailingChat;

        impl Chat for FailingChat {
            fn send_text(&self, _text: &str) -> Result<(), DeliveryError> {
                Ok(())
            }

            fn send_image(&self, _image: &Path) -> Result<(), DeliveryError> {
                Ok(())
            }

            fn react(&self, _message: MessageId, _verdict: Verdict) -> Result<(), DeliveryError> {
                Err(DeliveryError("reaction refused".to_owned()))
            }
        }

        let roster = two_player_roster();
        let mut round = Round::new("alpha", GradingPolicy::Containment);
        assert_eq!(
            round.accept(&message(10, 1, "alpha"), &roster, &FailingChat),
            Some(true)
        );
        assert_eq!(round.finish().reactions(), [(Id::from(1), true)]);
    }

    #[test]
    fn test_verdict_symbols() {
        assert_eq!(Verdict::Correct.symbol(), "✅");
        assert_eq!(Verdict::Incorrect.symbol(), "❌");
    }
}
