//! Layered configuration: defaults, TOML file, `MIRA_` environment, flags

use crate::cli::Cli;
use anyhow::{Context, Result};
use mira_core::{Mode, SamplerConfig};
use mira_eye::{HudConfig, VisionConfig};
use mira_llm::ReactionConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefix of the environment overrides, e.g. `MIRA_SAMPLER__COOLDOWN_SECS`
pub const ENV_PREFIX: &str = "MIRA";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MiraConfig {
    pub mode: Mode,
    pub sampler: SamplerConfig,
    pub vision: VisionConfig,
    pub hud: HudConfig,
    pub reaction: ReactionConfig,
}

impl MiraConfig {
    /// Read the optional file and the environment
    pub fn from_sources(file: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = file {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(true),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let loaded: MiraConfig = builder
            .build()
            .context("Failed to read configuration sources")?
            .try_deserialize()
            .context("Invalid configuration")?;

        Ok(loaded.with_mode_persona())
    }

    /// Sources, then command line flags on top, then validation
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut config = Self::from_sources(cli.config.as_deref())?;
        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Command line flags win over every other source
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(mode) = cli.mode {
            self.mode = mode;
            *self = std::mem::take(self).with_mode_persona();
        }
        if cli.fast {
            self.sampler.cooldown_secs = SamplerConfig::fast().cooldown_secs;
        }
        if let Some(cooldown) = cli.cooldown {
            self.sampler.cooldown_secs = cooldown;
        }
        if let Some(camera) = cli.camera {
            self.vision.camera_id = camera;
        }
        if let Some(dir) = &cli.model_dir {
            self.vision.model_path = dir.clone();
        }
        if let Some(endpoint) = &cli.endpoint {
            self.reaction.endpoint = endpoint.clone();
        }
        if let Some(model) = &cli.model {
            self.reaction.model = model.clone();
        }
    }

    /// Swap in the security persona when the commentary default is still set
    fn with_mode_persona(mut self) -> Self {
        let commentary = ReactionConfig::for_mode(Mode::Commentary).persona;
        let security = ReactionConfig::for_mode(Mode::Security).persona;
        let is_default = self.reaction.persona == commentary || self.reaction.persona == security;
        if is_default {
            self.reaction.persona = ReactionConfig::for_mode(self.mode).persona;
        }
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.sampler.validate().context("Invalid [sampler] section")?;
        self.vision
            .validate()
            .map_err(anyhow::Error::msg)
            .context("Invalid [vision] section")?;
        self.hud
            .validate()
            .map_err(anyhow::Error::msg)
            .context("Invalid [hud] section")?;
        self.reaction
            .validate()
            .map_err(anyhow::Error::msg)
            .context("Invalid [reaction] section")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn toml_file(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = MiraConfig::default();
        assert_eq!(config.mode, Mode::Commentary);
        assert_eq!(config.sampler.cooldown_secs, 15.0);
        assert_eq!(config.hud.wrap_width, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let file = toml_file(
            r#"
mode = "security"

[sampler]
cooldown_secs = 20.0

[vision]
camera_id = 1

[reaction]
endpoint = "http://127.0.0.1:8080/v1/chat/completions"
"#,
        );

        let config = MiraConfig::from_sources(Some(file.path())).unwrap();
        assert_eq!(config.mode, Mode::Security);
        assert_eq!(config.sampler.cooldown_secs, 20.0);
        assert_eq!(config.sampler.emergency_cooldown_secs, 5.0);
        assert_eq!(config.vision.camera_id, 1);
        assert_eq!(config.vision.frame_rate, 30);
        assert_eq!(config.reaction.endpoint, "http://127.0.0.1:8080/v1/chat/completions");
        // Security persona follows the mode
        assert_eq!(config.reaction.persona, ReactionConfig::for_mode(Mode::Security).persona);
    }

    #[test]
    fn test_custom_persona_is_kept() {
        let file = toml_file("mode = \"security\"\n[reaction]\npersona = \"Be a pirate.\"\n");
        let config = MiraConfig::from_sources(Some(file.path())).unwrap();
        assert_eq!(config.reaction.persona, "Be a pirate.");
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(MiraConfig::from_sources(Some(Path::new("/nonexistent/mira.toml"))).is_err());
    }

    #[test]
    fn test_cli_wins_over_file() {
        let file = toml_file("[sampler]\ncooldown_secs = 20.0\n[reaction]\nmodel = \"from-file\"\n");
        let cli = Cli {
            config: Some(file.path().to_path_buf()),
            mode: Some(Mode::Security),
            cooldown: Some(9.0),
            model: Some("from-cli".to_string()),
            camera: Some(3),
            ..Cli::default()
        };

        let config = MiraConfig::load(&cli).unwrap();
        assert_eq!(config.mode, Mode::Security);
        assert_eq!(config.sampler.cooldown_secs, 9.0);
        assert_eq!(config.reaction.model, "from-cli");
        assert_eq!(config.vision.camera_id, 3);
        assert_eq!(config.reaction.persona, ReactionConfig::for_mode(Mode::Security).persona);
    }

    #[test]
    fn test_fast_preset_and_explicit_cooldown() {
        let mut config = MiraConfig::default();
        config.apply_cli(&Cli {
            fast: true,
            ..Cli::default()
        });
        assert_eq!(config.sampler.cooldown_secs, 4.0);

        config.apply_cli(&Cli {
            fast: true,
            cooldown: Some(2.0),
            ..Cli::default()
        });
        assert_eq!(config.sampler.cooldown_secs, 2.0);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let cli = Cli {
            cooldown: Some(-1.0),
            ..Cli::default()
        };
        assert!(MiraConfig::load(&cli).is_err());

        let mut config = MiraConfig::default();
        config.reaction.endpoint = "not a url".to_string();
        assert!(config.validate().is_err());
    }
}
