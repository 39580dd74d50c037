//! In-game control command parsing
//!
//! Only the commands that are meaningful inside a running quiz live here;
//! the rest of the bot's command surface (help, scouting, channel
//! whitelisting) is dispatched by the embedding bot before the engine ever
//! sees a message.

use crate::constants::command::{DELIMITER, END_QUIZ, PAUSE, RESUME};

/// A control command recognized during a running quiz
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Suspend the session until a resume or the pause timeout
    Pause,
    /// Return a paused session to answer collection
    Resume,
    /// End the session immediately and publish the scoreboard
    EndQuiz,
}

/// Parses an in-game control command from raw message text
///
/// The command must be the start of the message: the delimiter token
/// followed by the command word. Anything else, including other bot
/// commands, returns `None` and is treated as an ordinary message.
pub fn parse(text: &str) -> Option<Command> {
    let mut tokens = text.split_whitespace();
    if tokens.next()? != DELIMITER {
        return None;
    }
    match tokens.next()? {
        PAUSE => Some(Command::Pause),
        RESUME => Some(Command::Resume),
        END_QUIZ => Some(Command::EndQuiz),
        _ => None,
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_commands() {
        assert_eq!(parse("/bb pause"), Some(Command::Pause));
        assert_eq!(parse("/bb resume"), Some(Command::Resume));
        assert_eq!(parse("/bb endquiz"), Some(Command::EndQuiz));
    }

    #[test]
    fn test_parse_tolerates_extra_whitespace() {
        assert_eq!(parse("  /bb   pause  "), Some(Command::Pause));
    }

    #[test]
    fn test_parse_rejects_plain_answers() {
        assert_eq!(parse("pause"), None);
        assert_eq!(parse("left pillar"), None);
        assert_eq!(parse(""), None);
    }

    #[test]
    fn test_parse_rejects_other_bot_commands() {
        assert_eq!(parse("/bb help"), None);
        assert_eq!(parse("/bb scout someone#1234"), None);
    }

    #[test]
    fn test_parse_requires_leading_delimiter() {
        assert_eq!(parse("I said /bb pause"), None);
    }
}
