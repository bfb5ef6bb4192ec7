//! Core logic for hellobot: the error taxonomy and its reporters, plus the
//! small tools the CLI and the Telegram bot expose.
//!
//! This crate does not know about Telegram. The bot talks to it through the
//! [`messaging::ReplyChannel`] port.

pub mod classify;
pub mod config;
pub mod domain;
pub mod errors;
pub mod event_log;
pub mod failure;
pub mod logging;
pub mod math;
pub mod messaging;
pub mod report;
pub mod rules;
pub mod timeconv;

pub use classify::{classify, ErrorRecord};
pub use errors::{Error, Result};
pub use failure::{AppError, ErrorKind, Failure, Interrupted};
