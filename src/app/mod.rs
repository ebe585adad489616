//! Bot core: dispatcher state, line handling and the run loop.

pub mod action;
pub mod bot;
pub mod handler;
pub mod membership;
pub mod state;
