//! # Call-Out Quiz Library
//!
//! This library provides the game logic for a chat-hosted call-out quiz:
//! image questions are posted into a channel, players race to name the
//! pictured location within a timed window, and a scoreboard is published
//! when the map is exhausted. The engine is platform agnostic; the
//! embedding bot supplies a [`session::Chat`] implementation for its chat
//! platform and a timer that delivers [`quiz::AlarmMessage`]s back when
//! they expire.

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::similar_names)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::ignored_unit_patterns)]
#![allow(clippy::struct_field_names)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::wildcard_imports)]

pub mod constants;

pub mod catalog;
pub mod command;
pub mod quiz;
pub mod registry;
pub mod roster;
pub mod round;
pub mod scoreboard;
pub mod session;
