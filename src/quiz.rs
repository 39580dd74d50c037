//! The quiz session state machine
//!
//! A session is a pure state machine: chat messages come in through
//! [`QuizSession::receive_message`], timing comes in through
//! [`QuizSession::receive_alarm`], and everything outbound goes through a
//! [`Chat`] implementation plus a caller-supplied alarm scheduler. The
//! embedding bot owns the clock; the engine only asks for alarms and
//! reacts when they are delivered back.
//!
//! Every scheduled alarm is stamped with the session's current serial
//! number, and each schedule bumps the serial. An alarm whose serial no
//! longer matches belongs to a superseded window (a round interrupted by a
//! pause, a pause cancelled by a resume) and is discarded on arrival.

use std::time::Duration;

use garde::Validate;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::{
    catalog::Map,
    command::{self, Command},
    constants,
    round::{GradingPolicy, Round},
    roster::{Player, Roster},
    scoreboard::Scoreboard,
    session::{Chat, ChatMessage},
};

/// A timer the session asked for, delivered back when it expires
///
/// Alarms are plain data so the embedding bot can queue or persist them;
/// the `serial` ties each alarm to the window that scheduled it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// The join window elapsed; the roster is final
    JoinWindowClosed {
        /// Scheduling serial of this alarm
        serial: u64,
    },
    /// The answer-sheet display time elapsed; ask the next question
    RevealFinished {
        /// Question to ask next
        index: usize,
        /// Scheduling serial of this alarm
        serial: u64,
    },
    /// The answer window of a question elapsed; grade and score it
    RoundClosed {
        /// Question whose window closed
        index: usize,
        /// Scheduling serial of this alarm
        serial: u64,
    },
    /// The settle time after an answer announcement elapsed
    SettleFinished {
        /// Question that was just announced
        index: usize,
        /// Scheduling serial of this alarm
        serial: u64,
    },
    /// A paused session was never resumed
    PauseExpired {
        /// Scheduling serial of this alarm
        serial: u64,
    },
}

impl AlarmMessage {
    fn serial(&self) -> u64 {
        match self {
            Self::JoinWindowClosed { serial }
            | Self::RevealFinished { serial, .. }
            | Self::RoundClosed { serial, .. }
            | Self::SettleFinished { serial, .. }
            | Self::PauseExpired { serial } => *serial,
        }
    }
}

fn validate_window<const MIN_SECONDS: u64, const MAX_SECONDS: u64>(
    field: &Duration,
    _context: &(),
) -> garde::Result {
    if (MIN_SECONDS..=MAX_SECONDS).contains(&field.as_secs()) {
        Ok(())
    } else {
        Err(garde::Error::new(format!(
            "outside of the bounds [{MIN_SECONDS},{MAX_SECONDS}] seconds"
        )))
    }
}

/// Tunable timing and grading settings of a session
///
/// All fields default to the original bot's timing; deserialization
/// accepts durations in milliseconds.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Options {
    /// How long participants may respond to the join invitation
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    #[garde(custom(validate_window::<1, 600>))]
    pub join_window: Duration,
    /// How long answers are collected for each question
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    #[garde(custom(validate_window::<1, 600>))]
    pub round_window: Duration,
    /// How long an answer sheet stays on screen between areas
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    #[garde(custom(validate_window::<1, 600>))]
    pub reveal_window: Duration,
    /// Settle time between an answer announcement and the next question
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    #[garde(custom(validate_window::<1, 600>))]
    pub settle_window: Duration,
    /// How long a paused session waits for a resume before ending
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    #[garde(custom(validate_window::<1, 86_400>))]
    pub pause_window: Duration,
    /// How candidate answers are compared against the call-out
    #[garde(skip)]
    pub grading: GradingPolicy,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            join_window: constants::windows::JOIN_WINDOW,
            round_window: constants::windows::ROUND_WINDOW,
            reveal_window: constants::windows::REVEAL_WINDOW,
            settle_window: constants::windows::SETTLE_WINDOW,
            pause_window: constants::windows::PAUSE_WINDOW,
            grading: GradingPolicy::default(),
        }
    }
}

/// Where a session currently is in its lifecycle
#[derive(Debug)]
enum State {
    /// Collecting the roster during the join window
    Joining,
    /// Showing an area answer sheet before asking question `next`
    Revealing { next: usize },
    /// Collecting answers for question `index`
    Collecting { index: usize, round: Round },
    /// Waiting out the settle time after announcing answer `index`
    Settling { index: usize },
    /// Suspended mid-quiz; `index` is the question to re-ask on resume
    Paused { index: usize },
    /// Finished; the scoreboard has been published
    Done,
}

/// Deferred state transition computed while the state is borrowed
enum Action {
    Pause,
    Resume { index: usize },
    End,
}

/// One running quiz over one map in one channel
pub struct QuizSession {
    map: Map,
    roster: Roster,
    scoreboard: Scoreboard,
    options: Options,
    state: State,
    previous_area: Option<u32>,
    serial: u64,
}

impl QuizSession {
    /// Creates a session for a loaded map, with the issuer as first player
    pub fn new(map: Map, issuer: Player, options: Options) -> Self {
        Self {
            map,
            roster: Roster::new(issuer),
            scoreboard: Scoreboard::new(),
            options,
            state: State::Joining,
            previous_area: None,
            serial: 0,
        }
    }

    /// Whether the session has finished and can be discarded
    pub fn is_done(&self) -> bool {
        matches!(self.state, State::Done)
    }

    /// The score denominator every announcement uses
    pub fn max_score(&self) -> u64 {
        (self.map.len() + constants::quiz::MAX_SCORE_OFFSET) as u64
    }

    fn next_serial(&mut self) -> u64 {
        self.serial = self.serial.wrapping_add(1);
        self.serial
    }

    /// Publishes the join invitation and opens the join window
    pub fn open<C: Chat, S: FnMut(AlarmMessage, Duration)>(
        &mut self,
        chat: &C,
        mut schedule_message: S,
    ) {
        say(
            chat,
            &format!(
                "Say something within {} seconds of this message to be part of the quiz!",
                self.options.join_window.as_secs()
            ),
        );
        let serial = self.next_serial();
        schedule_message(AlarmMessage::JoinWindowClosed { serial }, self.options.join_window);
    }

    /// Feeds one in-channel chat message to the session
    ///
    /// What the message means depends on the state: a join request while
    /// the join window is open, an answer candidate while a round is
    /// collecting, or a control command.
    pub fn receive_message<C: Chat, S: FnMut(AlarmMessage, Duration)>(
        &mut self,
        message: &ChatMessage,
        chat: &C,
        mut schedule_message: S,
    ) {
        let is_player = self.roster.contains(message.author);
        let action = match (&mut self.state, command::parse(&message.text)) {
            (State::Done, _) => None,
            // Control is restricted to players; bystanders cannot touch a
            // live quiz.
            (_, Some(command)) if !is_player => {
                log::debug!("ignoring {command:?} from non-player {}", message.author_name);
                None
            }
            (_, Some(Command::EndQuiz)) => Some(Action::End),
            (State::Collecting { .. }, Some(Command::Pause)) => Some(Action::Pause),
            (State::Paused { index }, Some(Command::Resume)) => {
                Some(Action::Resume { index: *index })
            }
            (State::Joining, None) => {
                match self
                    .roster
                    .add(Player::new(message.author, message.author_name.clone()))
                {
                    Ok(true) => log::info!("{} joined the quiz", message.author_name),
                    Ok(false) => {}
                    Err(error) => {
                        log::warn!("{} could not join: {error}", message.author_name);
                    }
                }
                None
            }
            (State::Collecting { round, .. }, None) => {
                round.accept(message, &self.roster, chat);
                None
            }
            _ => None,
        };

        match action {
            Some(Action::Pause) => self.pause(chat, &mut schedule_message),
            Some(Action::Resume { index }) => self.resume(index, chat, &mut schedule_message),
            Some(Action::End) => {
                say(chat, "Game ending...");
                self.end(chat);
            }
            None => {}
        }
    }

    /// Feeds an expired alarm back to the session
    ///
    /// Alarms from superseded windows are identified by their serial and
    /// ignored.
    pub fn receive_alarm<C: Chat, S: FnMut(AlarmMessage, Duration)>(
        &mut self,
        alarm: &AlarmMessage,
        chat: &C,
        mut schedule_message: S,
    ) {
        if alarm.serial() != self.serial {
            log::debug!("discarding stale alarm {alarm:?}");
            return;
        }

        match (alarm, &self.state) {
            (AlarmMessage::JoinWindowClosed { .. }, State::Joining) => {
                self.announce_start(chat);
                self.advance_to(0, chat, &mut schedule_message);
            }
            (AlarmMessage::RevealFinished { index, .. }, State::Revealing { next })
                if index == next =>
            {
                self.ask(*index, chat, &mut schedule_message);
            }
            (AlarmMessage::RoundClosed { index, .. }, State::Collecting { index: current, .. })
                if index == current =>
            {
                self.close_round(*index, chat, &mut schedule_message);
            }
            (AlarmMessage::SettleFinished { index, .. }, State::Settling { index: current })
                if index == current =>
            {
                self.advance_to(index + 1, chat, &mut schedule_message);
            }
            (AlarmMessage::PauseExpired { .. }, State::Paused { .. }) => {
                say(chat, "Game pause timeout reached. Game ending...");
                self.end(chat);
            }
            _ => log::debug!("ignoring alarm {alarm:?} in an unrelated state"),
        }
    }

    fn announce_start<C: Chat>(&self, chat: &C) {
        say(
            chat,
            &format!(
                "Starting a quiz for {} for the map {}!",
                name_list(&self.roster),
                self.map.display_name()
            ),
        );
    }

    /// Moves to question `index`, revealing the previous area's answer
    /// sheet first when the area changes, or ends the quiz when the map is
    /// exhausted.
    fn advance_to<C: Chat, S: FnMut(AlarmMessage, Duration)>(
        &mut self,
        index: usize,
        chat: &C,
        schedule_message: &mut S,
    ) {
        if index >= self.map.len() {
            self.end(chat);
            return;
        }

        let area = self.map.questions()[index].area();
        if let Some(previous) = self.previous_area.filter(|previous| *previous != area) {
            if let Some(key) = self.map.answer_key_for_area(previous) {
                say(chat, "Answers:");
                if let Err(error) = chat.send_image(key.path()) {
                    log::warn!("could not show the answer sheet for area {previous}: {error}");
                }
                let serial = self.next_serial();
                schedule_message(
                    AlarmMessage::RevealFinished { index, serial },
                    self.options.reveal_window,
                );
                self.state = State::Revealing { next: index };
                return;
            }
            log::warn!("map \"{}\" has no answer sheet for area {previous}", self.map.name());
        }

        self.ask(index, chat, schedule_message);
    }

    /// Publishes question `index` and opens its answer window
    ///
    /// Publishing the question image is the one mandatory delivery: if it
    /// fails there is nothing to answer, so the session ends.
    fn ask<C: Chat, S: FnMut(AlarmMessage, Duration)>(
        &mut self,
        index: usize,
        chat: &C,
        schedule_message: &mut S,
    ) {
        let question = self.map.questions()[index].clone();
        if let Err(error) = chat.send_image(question.path()) {
            log::error!("could not publish question {index}: {error}");
            self.end(chat);
            return;
        }
        self.previous_area = Some(question.area());

        let round = Round::new(question.call_out(), self.options.grading);
        let serial = self.next_serial();
        schedule_message(
            AlarmMessage::RoundClosed { index, serial },
            self.options.round_window,
        );
        self.state = State::Collecting { index, round };
    }

    /// Closes the answer window of question `index`: scores the correct
    /// answers, announces the call-out, and starts the settle timer.
    fn close_round<C: Chat, S: FnMut(AlarmMessage, Duration)>(
        &mut self,
        index: usize,
        chat: &C,
        schedule_message: &mut S,
    ) {
        let state = std::mem::replace(&mut self.state, State::Settling { index });
        let State::Collecting { round, .. } = state else {
            return;
        };

        let result = round.finish();
        for id in result.correct_players() {
            self.scoreboard.record_point(id);
            if let Some(player) = self.roster.get(id) {
                log::debug!(
                    "{} is at {}/{}",
                    player.name(),
                    self.scoreboard.score(id),
                    self.max_score()
                );
            }
        }

        say(
            chat,
            &format!("The answer was {}", self.map.questions()[index].call_out()),
        );
        let serial = self.next_serial();
        schedule_message(
            AlarmMessage::SettleFinished { index, serial },
            self.options.settle_window,
        );
    }

    /// Suspends the current round and starts the pause timeout
    ///
    /// The interrupted round is discarded; it restarts from scratch on
    /// resume, so no partial answers carry over.
    fn pause<C: Chat, S: FnMut(AlarmMessage, Duration)>(
        &mut self,
        chat: &C,
        schedule_message: &mut S,
    ) {
        let State::Collecting { index, .. } = &self.state else {
            return;
        };
        let index = *index;
        self.state = State::Paused { index };
        let serial = self.next_serial();
        schedule_message(AlarmMessage::PauseExpired { serial }, self.options.pause_window);
        say(
            chat,
            &format!(
                "Game paused for {} minutes. Type '{} {}' to continue the quiz.",
                self.options.pause_window.as_secs() / 60,
                constants::command::DELIMITER,
                constants::command::RESUME,
            ),
        );
    }

    /// Returns a paused session to collection by re-asking question `index`
    fn resume<C: Chat, S: FnMut(AlarmMessage, Duration)>(
        &mut self,
        index: usize,
        chat: &C,
        schedule_message: &mut S,
    ) {
        say(chat, "Game resuming...");
        self.ask(index, chat, schedule_message);
    }

    /// Ends the session and publishes the scoreboard, exactly once
    pub fn end<C: Chat>(&mut self, chat: &C) {
        if self.is_done() {
            return;
        }
        self.state = State::Done;
        // Invalidate whatever alarm is still in flight.
        self.serial = self.serial.wrapping_add(1);
        say(chat, &self.scoreboard.summarize(&self.roster, self.max_score()));
    }
}

/// Joins player names the way the announcements spell them out
fn name_list(roster: &Roster) -> String {
    let names: Vec<&str> = roster.iter().map(Player::name).collect();
    match names.as_slice() {
        [] => String::new(),
        [only] => (*only).to_owned(),
        [rest @ .., last] => format!("{}, and {last}", rest.join(", ")),
    }
}

fn say<C: Chat>(chat: &C, text: &str) {
    if let Err(error) = chat.send_text(text) {
        log::warn!("could not deliver \"{text}\": {error}");
    }
}
