//! # DataStore Module
//!
//! This module provides functionality for interacting with a Postgres database
//! holding the users, channels, videos and subscriptions of the video digest
//! bot.
//!
//! The module uses sqlx for database operations and provides an abstraction
//! layer for CRUD operations plus the poller's due-channel query.

mod datastore;
mod domain;

pub use datastore::postgres::PgDataStore;
pub use datastore::DataStore;
pub use domain::{
    ChatAccount, Channel, NewChannel, NewVideo, Platform, Subscription, UnknownPlatform, User,
    Video, DEFAULT_LANGUAGE,
};
