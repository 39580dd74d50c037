//! Configuration constants for the call-out quiz engine
//!
//! This module contains the collection-window durations, session limits,
//! and chat command words used throughout the engine. The windows mirror
//! the timing of the original bot and act as defaults for
//! [`crate::quiz::Options`].

/// Quiz session limits
pub mod quiz {
    /// Maximum number of players allowed in a single quiz session
    pub const MAX_PLAYER_COUNT: usize = 100;
    /// Offset added to the question count to form the score denominator
    ///
    /// The original bot reported scores out of `question_count + 1`; the
    /// denominator is kept as-is so reported scores stay comparable.
    pub const MAX_SCORE_OFFSET: usize = 1;
}

/// Collection-window durations
pub mod windows {
    use std::time::Duration;

    /// How long participants can respond to the join invitation
    pub const JOIN_WINDOW: Duration = Duration::from_millis(5_000);
    /// How long answers to a single question are collected
    pub const ROUND_WINDOW: Duration = Duration::from_millis(5_000);
    /// How long an answer-key reveal stays on screen before the next question
    pub const REVEAL_WINDOW: Duration = Duration::from_millis(5_000);
    /// Settle time between publishing the correct answer and the next question
    pub const SETTLE_WINDOW: Duration = Duration::from_millis(2_000);
    /// How long a paused session waits for a resume before ending
    pub const PAUSE_WINDOW: Duration = Duration::from_millis(300_000);
}

/// Chat command words recognized during a game
pub mod command {
    /// Prefix that marks a chat message as a bot command
    pub const DELIMITER: &str = "/bb";
    /// Command word that pauses a running quiz
    pub const PAUSE: &str = "pause";
    /// Command word that resumes a paused quiz
    pub const RESUME: &str = "resume";
    /// Command word that ends a quiz immediately
    pub const END_QUIZ: &str = "endquiz";
    /// Command word referenced in user-facing help hints
    pub const HELP: &str = "help";
}
