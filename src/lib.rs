//! # crabbot
//!
//! A single-connection IRC command bot.
//!
//! The binary wires these pieces together: [`config`] is loaded, a transport
//! is opened with [`irc::connection::open`], and [`app::bot::Bot`] runs the
//! receive-and-dispatch loop. Chat commands are plain functions registered in
//! an [`irc::commands::CommandRegistry`]; they queue outbound
//! [`app::action::Action`]s on the context they are given.

pub mod app;
pub mod config;
pub mod error;
pub mod irc;
pub mod logging;
pub mod plugins;
