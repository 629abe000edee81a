//! mira-llm: reactions from a local chat-completion endpoint

pub mod client;
pub mod config;
pub mod error;
pub mod generator;


pub use client::ChatCompletionClient;
pub use config::*;
pub use error::*;
pub use generator::{build_messages, ReactionGenerator};
