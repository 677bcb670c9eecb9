//! parley - a chat client with local conversation history.
//!
//! Conversations live on the user's machine; each message is forwarded to a
//! generative-language service and the reply is appended to the history.

pub mod cli;
pub mod completion;
pub mod config;
pub mod core;
pub mod error;
pub mod storage;

pub use config::Config;
pub use error::{Error, Result};
