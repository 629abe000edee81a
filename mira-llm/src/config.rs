use mira_core::{Mode, Tone};
use serde::{Deserialize, Serialize};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:1234/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "cognitivecomputations_dolphin-mistral-24b-venice-edition";

const COMMENTARY_PERSONA: &str = "You are MIRA. You are sarcastic and brief.";
const SECURITY_PERSONA: &str =
    "You are MIRA, a home security assistant. Describe what you see in one short sentence.";
const ALERT_PERSONA: &str =
    "You are MIRA, a security system. A dangerous object is in view. Reply with one short, firm ALERT.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactionConfig {
    /// OpenAI-compatible chat-completions URL
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// Per-request deadline
    pub timeout_secs: u64,
    /// System prompt for commentary
    pub persona: String,
    /// System prompt when a threat is in view
    pub alert_persona: String,
}

impl Default for ReactionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: None,
            timeout_secs: 5,
            persona: COMMENTARY_PERSONA.to_string(),
            alert_persona: ALERT_PERSONA.to_string(),
        }
    }
}

impl ReactionConfig {
    /// Defaults with the persona matching `mode`
    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Commentary => Self::default(),
            Mode::Security => Self {
                persona: SECURITY_PERSONA.to_string(),
                ..Self::default()
            },
        }
    }

    pub fn system_prompt(&self, tone: Tone) -> &str {
        match tone {
            Tone::Commentary => &self.persona,
            Tone::Alert => &self.alert_persona,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        let url = reqwest::Url::parse(&self.endpoint)
            .map_err(|e| format!("Invalid endpoint {:?}: {}", self.endpoint, e))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(format!("Endpoint must be http or https, got {}", url.scheme()));
        }

        if self.model.trim().is_empty() || self.model.len() > 256 {
            return Err("Model name must be 1 to 256 characters".to_string());
        }

        if !self.temperature.is_finite() || !(0.0..=2.0).contains(&self.temperature) {
            return Err("Temperature must be between 0.0 and 2.0".to_string());
        }

        if self.timeout_secs == 0 || self.timeout_secs > 300 {
            return Err("Timeout must be between 1 and 300 seconds".to_string());
        }

        if self.persona.trim().is_empty() || self.alert_persona.trim().is_empty() {
            return Err("System prompts cannot be empty".to_string());
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// Body of `POST /v1/chat/completions`
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub stream: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reaction_config_default() {
        let config = ReactionConfig::default();
        assert_eq!(config.endpoint, "http://localhost:1234/v1/chat/completions");
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.timeout_secs, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_for_mode_changes_persona() {
        let commentary = ReactionConfig::for_mode(Mode::Commentary);
        let security = ReactionConfig::for_mode(Mode::Security);
        assert_ne!(commentary.persona, security.persona);
        assert_eq!(commentary.alert_persona, security.alert_persona);
    }

    #[test]
    fn test_system_prompt_by_tone() {
        let config = ReactionConfig::default();
        assert!(config.system_prompt(Tone::Commentary).contains("sarcastic"));
        assert!(config.system_prompt(Tone::Alert).contains("ALERT"));
    }

    #[test]
    fn test_validation() {
        let mut config = ReactionConfig::default();
        config.endpoint = "not a url".to_string();
        assert!(config.validate().is_err());

        config.endpoint = "ftp://localhost/chat".to_string();
        assert!(config.validate().is_err());

        config = ReactionConfig::default();
        config.temperature = 2.5;
        assert!(config.validate().is_err());

        config = ReactionConfig::default();
        config.timeout_secs = 0;
        assert!(config.validate().is_err());

        config = ReactionConfig::default();
        config.model = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_message_role_serializes_lowercase() {
        let json = serde_json::to_value(Message::system("hi")).unwrap();
        assert_eq!(json["role"], "system");
        assert_eq!(json["content"], "hi");
    }

    #[test]
    fn test_chat_request_body_shape() {
        let request = ChatRequest {
            model: "m".to_string(),
            messages: vec![Message::system("s"), Message::user("u")],
            temperature: 0.7,
            max_tokens: None,
            stream: false,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][1]["role"], "user");
        assert!(json.get("max_tokens").is_none());
    }
}
