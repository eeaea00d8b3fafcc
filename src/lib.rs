//! QuestBox core: quests, XP, streaks, rewards and their persistence.
//!
//! The library is deterministic given a [`clock::Clock`] and a
//! [`store::KeyValueStore`]; the `qb` binary wires both to the real machine.
//!
//! - [`policy`] computes the XP a completion earns and the next `Progress`.
//! - [`quests`] and [`limits`] decide what can be completed or bought today.
//! - [`store`] and [`schema`] keep persisted progress valid across versions.
//! - [`catalog`] merges the configured quests and rewards with runtime additions.

pub mod catalog;
pub mod cli;
pub mod clock;
pub mod cmd;
pub mod config;
pub mod error;
pub mod fields;
pub mod hud;
pub mod limits;
pub mod policy;
pub mod profile;
pub mod progress;
pub mod quests;
pub mod reward;
pub mod schema;
pub mod shop;
pub mod store;
pub mod task;
pub mod timer;
