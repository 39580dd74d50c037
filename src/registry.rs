//! Per-channel session registry
//!
//! The embedding bot holds one [`Registry`] and forwards every in-channel
//! message and expired alarm to it. The registry enforces the one quiz per
//! channel rule, resolves map names against the [`Catalog`], and drops
//! sessions once they finish.

use std::{collections::HashMap, time::Duration};

use crate::{
    catalog::{Catalog, Error as CatalogError},
    constants,
    quiz::{AlarmMessage, Options, QuizSession},
    roster::Player,
    session::{Chat, ChannelId, ChatMessage},
};

/// Routes chat traffic to the quiz sessions of their channels
pub struct Registry {
    catalog: Catalog,
    options: Options,
    sessions: HashMap<ChannelId, QuizSession>,
}

impl Registry {
    /// Creates a registry over a map catalog with session defaults
    pub fn new(catalog: Catalog, options: Options) -> Self {
        Self {
            catalog,
            options,
            sessions: HashMap::new(),
        }
    }

    /// Whether a quiz is currently live in the channel
    pub fn is_active(&self, channel: ChannelId) -> bool {
        self.sessions
            .get(&channel)
            .is_some_and(|session| !session.is_done())
    }

    /// Starts a quiz in a channel, refusing when one is already live
    ///
    /// `map_name` is matched case-insensitively against the catalog; when
    /// absent a random installed map is used. An unknown map name is
    /// reported to the channel, not to the caller.
    pub fn start_quiz<C: Chat, S: FnMut(AlarmMessage, Duration)>(
        &mut self,
        channel: ChannelId,
        issuer: Player,
        map_name: Option<&str>,
        chat: &C,
        schedule_message: S,
    ) {
        if self.is_active(channel) {
            say(chat, "A quiz is already running in this channel.");
            return;
        }

        let name = match map_name {
            Some(name) => name.to_lowercase(),
            None => match self.catalog.random_map() {
                Ok(name) => name,
                Err(error) => {
                    log::error!("could not pick a random map: {error}");
                    say(chat, "No maps are available right now.");
                    return;
                }
            },
        };

        let map = match self.catalog.load_map(&name) {
            Ok(map) => map,
            Err(CatalogError::MapNotFound(name)) => {
                say(chat, &map_not_found(&name));
                return;
            }
            Err(error) => {
                log::error!("could not load map \"{name}\": {error}");
                return;
            }
        };

        log::info!("starting a quiz on \"{name}\" in channel {channel}");
        let mut session = QuizSession::new(map, issuer, self.options);
        session.open(chat, schedule_message);
        self.sessions.insert(channel, session);
    }

    /// Forwards an in-channel message to the channel's session, if any
    pub fn receive_message<C: Chat, S: FnMut(AlarmMessage, Duration)>(
        &mut self,
        channel: ChannelId,
        message: &ChatMessage,
        chat: &C,
        schedule_message: S,
    ) {
        if let Some(session) = self.sessions.get_mut(&channel) {
            session.receive_message(message, chat, schedule_message);
        }
        self.reap(channel);
    }

    /// Forwards an expired alarm to the channel's session, if any
    pub fn receive_alarm<C: Chat, S: FnMut(AlarmMessage, Duration)>(
        &mut self,
        channel: ChannelId,
        alarm: &AlarmMessage,
        chat: &C,
        schedule_message: S,
    ) {
        if let Some(session) = self.sessions.get_mut(&channel) {
            session.receive_alarm(alarm, chat, schedule_message);
        }
        self.reap(channel);
    }

    /// Ends the channel's session immediately, publishing its scoreboard
    ///
    /// Used when the embedding bot shuts down; mid-game players asked for
    /// an end via the in-chat command instead.
    pub fn end_quiz<C: Chat>(&mut self, channel: ChannelId, chat: &C) {
        if let Some(mut session) = self.sessions.remove(&channel) {
            session.end(chat);
        }
    }

    /// Posts every answer sheet of a map for studying outside a quiz
    pub fn learn<C: Chat>(&self, map_name: &str, chat: &C) {
        let name = map_name.to_lowercase();
        let map = match self.catalog.load_map(&name) {
            Ok(map) => map,
            Err(CatalogError::MapNotFound(name)) => {
                say(chat, &map_not_found(&name));
                return;
            }
            Err(error) => {
                log::error!("could not load map \"{name}\": {error}");
                return;
            }
        };

        say(chat, &format!("Answer sheets for {}:", map.display_name()));
        for key in map.answer_keys() {
            if let Err(error) = chat.send_image(key.path()) {
                log::warn!("could not post an answer sheet of \"{name}\": {error}");
            }
        }
    }

    fn reap(&mut self, channel: ChannelId) {
        if self
            .sessions
            .get(&channel)
            .is_some_and(QuizSession::is_done)
        {
            self.sessions.remove(&channel);
        }
    }
}

fn map_not_found(name: &str) -> String {
    format!(
        "Map name \"{name}\" not found. Type '{} {}' for a list of supported maps.",
        constants::command::DELIMITER,
        constants::command::HELP,
    )
}

fn say<C: Chat>(chat: &C, text: &str) {
    if let Err(error) = chat.send_text(text) {
        log::warn!("could not deliver \"{text}\": {error}");
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::{
        cell::RefCell,
        collections::VecDeque,
        fs,
        path::{Path, PathBuf},
    };

    use super::*;
    use crate::{
        round::Verdict,
        roster::Id,
        session::{DeliveryError, MessageId},
    };

    #[derive(Default)]
    struct TestChat {
        texts: RefCell<Vec<String>>,
        images: RefCell<Vec<PathBuf>>,
    }

    impl Chat for TestChat {
        fn send_text(&self, text: &str) -> Result<(), DeliveryError> {
            self.texts.borrow_mut().push(text.to_owned());
            Ok(())
        }

        fn send_image(&self, image: &Path) -> Result<(), DeliveryError> {
            self.images.borrow_mut().push(image.to_owned());
            Ok(())
        }

        fn react(&self, _message: MessageId, _verdict: Verdict) -> Result<(), DeliveryError> {
            Ok(())
        }
    }

    type Alarms = VecDeque<(AlarmMessage, Duration)>;

    /// Lays out a one-map catalog in a temporary directory
    fn test_catalog() -> (tempfile::TempDir, Catalog) {
        let dir = tempfile::tempdir().unwrap();
        let map = dir.path().join("testmap");
        fs::create_dir_all(map.join("questions")).unwrap();
        fs::create_dir_all(map.join("answers")).unwrap();
        for name in ["1-alpha.png", "2-beta.png"] {
            fs::write(map.join("questions").join(name), []).unwrap();
        }
        for name in ["1-answers.png", "2-answers.png"] {
            fs::write(map.join("answers").join(name), []).unwrap();
        }
        let catalog = Catalog::new(dir.path());
        (dir, catalog)
    }

    fn issuer() -> Player {
        Player::new(Id::from(1), "Alice")
    }

    fn channel() -> ChannelId {
        ChannelId::from(7)
    }

    #[test]
    fn test_start_quiz_opens_a_session() {
        let (_dir, catalog) = test_catalog();
        let mut registry = Registry::new(catalog, Options::default());
        let chat = TestChat::default();
        let mut alarms = Alarms::new();

        registry.start_quiz(channel(), issuer(), Some("TestMap"), &chat, |alarm, after| {
            alarms.push_back((alarm, after));
        });

        assert!(registry.is_active(channel()));
        assert_eq!(alarms.len(), 1);
        assert!(chat.texts.borrow()[0].starts_with("Say something within"));
    }

    #[test]
    fn test_one_quiz_per_channel() {
        let (_dir, catalog) = test_catalog();
        let mut registry = Registry::new(catalog, Options::default());
        let chat = TestChat::default();
        let mut alarms = Alarms::new();

        registry.start_quiz(channel(), issuer(), Some("testmap"), &chat, |alarm, after| {
            alarms.push_back((alarm, after));
        });
        registry.start_quiz(channel(), issuer(), Some("testmap"), &chat, |alarm, after| {
            alarms.push_back((alarm, after));
        });

        assert_eq!(
            chat.texts.borrow().last(),
            Some(&"A quiz is already running in this channel.".to_owned())
        );
        assert_eq!(alarms.len(), 1);

        // A different channel is unaffected.
        registry.start_quiz(
            ChannelId::from(8),
            issuer(),
            Some("testmap"),
            &chat,
            |alarm, after| alarms.push_back((alarm, after)),
        );
        assert!(registry.is_active(ChannelId::from(8)));
    }

    #[test]
    fn test_unknown_map_is_reported_in_channel() {
        let (_dir, catalog) = test_catalog();
        let mut registry = Registry::new(catalog, Options::default());
        let chat = TestChat::default();

        registry.start_quiz(channel(), issuer(), Some("atlantis"), &chat, |_, _| {});

        assert!(!registry.is_active(channel()));
        assert_eq!(
            chat.texts.borrow().last(),
            Some(
                &"Map name \"atlantis\" not found. Type '/bb help' for a list of supported maps."
                    .to_owned()
            )
        );
    }

    #[test]
    fn test_finished_sessions_are_dropped() {
        let (_dir, catalog) = test_catalog();
        let mut registry = Registry::new(catalog, Options::default());
        let chat = TestChat::default();
        let mut alarms = Alarms::new();

        registry.start_quiz(channel(), issuer(), Some("testmap"), &chat, |alarm, after| {
            alarms.push_back((alarm, after));
        });
        let message = ChatMessage {
            id: MessageId::from(10),
            author: Id::from(1),
            author_name: "Alice".to_owned(),
            text: "/bb endquiz".to_owned(),
        };
        registry.receive_message(channel(), &message, &chat, |alarm, after| {
            alarms.push_back((alarm, after));
        });

        assert!(!registry.is_active(channel()));
        // The channel is free for a fresh quiz.
        registry.start_quiz(channel(), issuer(), Some("testmap"), &chat, |alarm, after| {
            alarms.push_back((alarm, after));
        });
        assert!(registry.is_active(channel()));
    }

    #[test]
    fn test_end_quiz_publishes_the_scoreboard() {
        let (_dir, catalog) = test_catalog();
        let mut registry = Registry::new(catalog, Options::default());
        let chat = TestChat::default();

        registry.start_quiz(channel(), issuer(), Some("testmap"), &chat, |_, _| {});
        registry.end_quiz(channel(), &chat);

        assert!(!registry.is_active(channel()));
        assert!(chat
            .texts
            .borrow()
            .last()
            .unwrap()
            .starts_with("The Quiz is over!"));
    }

    #[test]
    fn test_learn_posts_every_answer_sheet() {
        let (_dir, catalog) = test_catalog();
        let registry = Registry::new(catalog, Options::default());
        let chat = TestChat::default();

        registry.learn("TestMap", &chat);

        assert_eq!(
            chat.texts.borrow().last(),
            Some(&"Answer sheets for Testmap:".to_owned())
        );
        let images = chat.images.borrow();
        assert_eq!(images.len(), 2);
        assert!(images[0].ends_with("1-answers.png"));
        assert!(images[1].ends_with("2-answers.png"));
    }

    #[test]
    fn test_random_map_start_with_empty_catalog_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::new(dir.path());
        let mut registry = Registry::new(catalog, Options::default());
        let chat = TestChat::default();

        registry.start_quiz(channel(), issuer(), None, &chat, |_, _| {});

        assert!(!registry.is_active(channel()));
        assert_eq!(
            chat.texts.borrow().last(),
            Some(&"No maps are available right now.".to_owned())
        );
    }

    #[test]
    fn test_random_map_start_with_single_map() {
        let (_dir, catalog) = test_catalog();
        let mut registry = Registry::new(catalog, Options::default());
        let chat = TestChat::default();
        let mut alarms = Alarms::new();

        registry.start_quiz(channel(), issuer(), None, &chat, |alarm, after| {
            alarms.push_back((alarm, after));
        });
        assert!(registry.is_active(channel()));
    }
}
