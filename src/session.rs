//! Chat communication boundary
//!
//! This module defines the trait through which the quiz engine talks to the
//! chat platform, along with the identifier newtypes and the incoming
//! message type delivered by the embedding bot. The abstraction keeps the
//! engine independent of any specific chat SDK: implementations might wrap
//! a Discord client, a Matrix room, or an in-memory recorder in tests.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{roster::Id, round::Verdict};

/// A chat channel identifier, opaque to the engine
///
/// One quiz session exists per channel at most; the [`crate::registry`]
/// keys sessions by this value.
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
pub struct ChannelId(u64);

/// A chat message identifier, used to attach reactions to a message
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::From,
    derive_more::Display,
)]
pub struct MessageId(u64);

/// A chat message observed in the session's channel
///
/// The embedding bot forwards every in-channel message to the engine while
/// a session is live; the engine decides per state whether the message is
/// a join request, an answer candidate, or a control command.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    /// Identifier of the message itself, for reactions
    pub id: MessageId,
    /// Stable identity of the author
    pub author: Id,
    /// Display name of the author at the time of sending
    pub author_name: String,
    /// Raw text content
    pub text: String,
}

/// Failure to deliver a message, image, or reaction to the chat platform
///
/// Delivery is best-effort for everything except question publishing;
/// callers log and continue unless the failed step is mandatory.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("delivery failed: {0}")]
pub struct DeliveryError(pub String);

/// Outbound side of the chat platform
///
/// One implementation instance corresponds to one channel; the engine
/// never addresses a channel explicitly.
pub trait Chat {
    /// Sends a plain text message to the channel
    ///
    /// # Errors
    ///
    /// Returns a [`DeliveryError`] if the platform rejects the message.
    fn send_text(&self, text: &str) -> Result<(), DeliveryError>;

    /// Sends an image by asset path to the channel
    ///
    /// # Errors
    ///
    /// Returns a [`DeliveryError`] if the upload or send fails.
    fn send_image(&self, image: &Path) -> Result<(), DeliveryError>;

    /// Attaches a correct/incorrect marker to a previously seen message
    ///
    /// # Errors
    ///
    /// Returns a [`DeliveryError`] if the reaction cannot be attached.
    fn react(&self, message: MessageId, verdict: Verdict) -> Result<(), DeliveryError>;
}
