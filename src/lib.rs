//! # Campus Relay
//!
//! `campus-relay` is the real-time relay of a campus transport system. Drivers
//! stream bus positions and raise emergency alerts; students, parents,
//! teachers and administrators receive them over WebSockets, along with
//! audience-scoped notices.
//!
//! ## Core Modules
//!
//! - `broker`: the topic registry and the outbound event types.
//! - `client`: sessions, their join attributes and their teardown.
//! - `dispatch`: location fan-out, emergency alerts, notices and the bounded
//!   background runner for their side effects.
//! - `persistence`: last-location cache, broadcast records and alert archive (sled).
//! - `directory`: resolves an audience to email addresses.
//! - `notifier`: email delivery through an HTTP mail webhook.
//! - `relay`: wires the above together from `config`.
//! - `transport`: the WebSocket server and socket protocol.
//! - `utils`: error types and logging setup.

pub mod broker;
pub mod client;
pub mod config;
pub mod directory;
pub mod dispatch;
pub mod model;
pub mod notifier;
pub mod persistence;
pub mod relay;
pub mod transport;
pub mod utils;

#[cfg(test)]
mod testutil;
