use crate::config::{Message, ReactionConfig};
use crate::error::Result;
use async_trait::async_trait;
use mira_core::Situation;

/// Produces the short text MIRA shows for a situation
#[async_trait]
pub trait ReactionGenerator: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Ask for a reaction. Errors leave the caller's text untouched.
    async fn react(&self, situation: &Situation) -> Result<String>;
}

/// System prompt picked by tone, then the situation summary
pub fn build_messages(config: &ReactionConfig, situation: &Situation) -> Vec<Message> {
    vec![
        Message::system(config.system_prompt(situation.tone())),
        Message::user(situation.describe()),
    ]
}
