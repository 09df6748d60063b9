use crate::defaults;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub engines: EngineConfig,
    pub session: SessionConfig,
}

/// Audio capture and chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub device: Option<String>,
    pub sample_rate: u32,
    pub chunk_secs: u32,
}

/// Engine selection for the two passes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub fast_model: String,
    pub refine_model: String,
    pub language: String,
}

/// Session persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    pub dir: Option<PathBuf>,
    pub snapshot_secs: u64,
    pub min_sentence_chars: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: None,
            sample_rate: defaults::SAMPLE_RATE,
            chunk_secs: defaults::CHUNK_SECS,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fast_model: defaults::FAST_MODEL.to_string(),
            refine_model: defaults::REFINE_MODEL.to_string(),
            language: defaults::DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dir: None,
            snapshot_secs: defaults::SNAPSHOT_SECS,
            min_sentence_chars: defaults::MIN_SENTENCE_CHARS,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing; invalid TOML is an error.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Ok(Self::default())
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Reject out-of-range values that would misbehave deep in the pipeline.
    fn validate(&self) -> anyhow::Result<()> {
        let secs = self.audio.chunk_secs;
        if !(defaults::MIN_CHUNK_SECS..=defaults::MAX_CHUNK_SECS).contains(&secs) {
            anyhow::bail!(
                "audio.chunk_secs must be between {} and {}, got {}",
                defaults::MIN_CHUNK_SECS,
                defaults::MAX_CHUNK_SECS,
                secs
            );
        }
        if self.audio.sample_rate == 0 {
            anyhow::bail!("audio.sample_rate must be positive");
        }
        Ok(())
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - REFRAIN_FAST_MODEL → engines.fast_model
    /// - REFRAIN_REFINE_MODEL → engines.refine_model
    /// - REFRAIN_LANGUAGE → engines.language
    /// - REFRAIN_AUDIO_DEVICE → audio.device
    /// - REFRAIN_SESSION_DIR → session.dir
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(model) = std::env::var("REFRAIN_FAST_MODEL")
            && !model.is_empty()
        {
            self.engines.fast_model = model;
        }

        if let Ok(model) = std::env::var("REFRAIN_REFINE_MODEL")
            && !model.is_empty()
        {
            self.engines.refine_model = model;
        }

        if let Ok(language) = std::env::var("REFRAIN_LANGUAGE")
            && !language.is_empty()
        {
            self.engines.language = language;
        }

        if let Ok(device) = std::env::var("REFRAIN_AUDIO_DEVICE")
            && !device.is_empty()
        {
            self.audio.device = Some(device);
        }

        if let Ok(dir) = std::env::var("REFRAIN_SESSION_DIR")
            && !dir.is_empty()
        {
            self.session.dir = Some(PathBuf::from(dir));
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/refrain/config.toml on Linux
    #[cfg(feature = "cli")]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("refrain")
            .join("config.toml")
    }

    /// Resolve the directory where session transcripts are stored.
    ///
    /// Explicit config wins; otherwise ~/.local/share/refrain/sessions,
    /// falling back to ./sessions when no home directory is known.
    #[cfg(feature = "cli")]
    pub fn session_dir(&self) -> PathBuf {
        if let Some(ref dir) = self.session.dir {
            return dir.clone();
        }
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("refrain")
            .join("sessions")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert_eq!(config.audio.sample_rate, 16000);
        assert_eq!(config.audio.chunk_secs, 5);
        assert!(config.audio.device.is_none());
        assert_eq!(config.engines.fast_model, "tiny.en");
        assert_eq!(config.engines.refine_model, "base.en");
        assert_eq!(config.engines.language, "auto");
        assert_eq!(config.session.snapshot_secs, 30);
        assert_eq!(config.session.min_sentence_chars, 10);
    }

    #[test]
    fn load_parses_full_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[audio]
device = "pipewire"
sample_rate = 16000
chunk_secs = 10

[engines]
fast_model = "tiny"
refine_model = "small"
language = "de"

[session]
snapshot_secs = 60
min_sentence_chars = 5
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.audio.device.as_deref(), Some("pipewire"));
        assert_eq!(config.audio.chunk_secs, 10);
        assert_eq!(config.engines.fast_model, "tiny");
        assert_eq!(config.engines.refine_model, "small");
        assert_eq!(config.engines.language, "de");
        assert_eq!(config.session.snapshot_secs, 60);
        assert_eq!(config.session.min_sentence_chars, 5);
    }

    #[test]
    fn load_fills_missing_fields_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[engines]
fast_model = "tiny"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.engines.fast_model, "tiny");
        assert_eq!(config.engines.refine_model, "base.en");
        assert_eq!(config.audio.chunk_secs, 5);
    }

    #[test]
    fn load_rejects_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "this is not = valid [ toml").unwrap();

        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn load_rejects_out_of_range_chunk_secs() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[audio]
chunk_secs = 0
"#
        )
        .unwrap();

        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn load_or_default_returns_defaults_for_missing_file() {
        let config = Config::load_or_default(Path::new("/nonexistent/refrain.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn load_or_default_propagates_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "broken = [").unwrap();

        assert!(Config::load_or_default(file.path()).is_err());
    }

    #[test]
    fn config_roundtrips_through_toml() {
        let config = Config {
            audio: AudioConfig {
                device: Some("hw:1".to_string()),
                sample_rate: 16000,
                chunk_secs: 3,
            },
            ..Default::default()
        };

        let serialized = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed, config);
    }
}
