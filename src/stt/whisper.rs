//! Whisper-based speech-to-text engines.
//!
//! One `WhisperEngine` type serves both passes: the fast pass loads a small
//! model with greedy sampling, the refine pass loads a larger model with
//! beam search and feeds the streaming draft as the initial prompt.
//!
//! # Feature Gate
//!
//! Requires the `whisper` feature (and cmake). Without it a stub is
//! compiled that fails at construction time.

use crate::defaults;
use crate::error::{RefrainError, Result};
use crate::stt::engine::SpeechEngine;
use std::path::PathBuf;

#[cfg(feature = "whisper")]
use std::sync::{Mutex, Once};
#[cfg(feature = "whisper")]
use whisper_rs::{
    FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters, install_logging_hooks,
};

#[cfg(feature = "whisper")]
static LOGGING_HOOKS_INSTALLED: Once = Once::new();

/// Sampling profile for a Whisper engine.
///
/// `Fast` uses greedy decoding for latency; `Refine` uses beam search and
/// accepts the draft hint as an initial prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingProfile {
    Fast,
    Refine,
}

/// Configuration for a Whisper engine.
#[derive(Debug, Clone)]
pub struct WhisperConfig {
    /// Path to the Whisper model file
    pub model_path: PathBuf,
    /// Language code (e.g., "en", "de"), or "auto"
    pub language: String,
    /// Number of threads for inference (None = auto-detect)
    pub threads: Option<usize>,
    /// Sampling profile for this pass
    pub profile: SamplingProfile,
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/ggml-tiny.en.bin"),
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            threads: None,
            profile: SamplingProfile::Fast,
        }
    }
}

impl WhisperConfig {
    /// Fast-pass profile for the given model path.
    pub fn fast(model_path: PathBuf, language: &str) -> Self {
        Self {
            model_path,
            language: language.to_string(),
            threads: None,
            profile: SamplingProfile::Fast,
        }
    }

    /// Refine-pass profile for the given model path.
    pub fn refine(model_path: PathBuf, language: &str) -> Self {
        Self {
            model_path,
            language: language.to_string(),
            threads: None,
            profile: SamplingProfile::Refine,
        }
    }
}

/// Whisper-backed engine implementation.
///
/// The WhisperContext is wrapped in a Mutex; each transcribe call creates
/// its own inference state, so one engine instance serves one pass thread.
#[cfg(feature = "whisper")]
pub struct WhisperEngine {
    context: Mutex<WhisperContext>,
    config: WhisperConfig,
    model_name: String,
}

#[cfg(feature = "whisper")]
impl std::fmt::Debug for WhisperEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperEngine")
            .field("config", &self.config)
            .field("model_name", &self.model_name)
            .field("context", &"<WhisperContext>")
            .finish()
    }
}

/// Whisper engine placeholder (without the whisper feature).
#[cfg(not(feature = "whisper"))]
#[derive(Debug)]
pub struct WhisperEngine {}

#[cfg(any(feature = "whisper", test))]
fn model_name_of(path: &std::path::Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(feature = "whisper")]
impl WhisperEngine {
    /// Load a Whisper model.
    ///
    /// # Errors
    /// Returns `RefrainError::ModelNotFound` if the model file doesn't exist
    /// and `RefrainError::InferenceFailed` if loading fails.
    pub fn new(config: WhisperConfig) -> Result<Self> {
        // Install logging hooks to suppress whisper.cpp output (only once)
        LOGGING_HOOKS_INSTALLED.call_once(|| {
            install_logging_hooks();
        });

        if !config.model_path.exists() {
            return Err(RefrainError::ModelNotFound {
                path: config.model_path.to_string_lossy().to_string(),
            });
        }

        let model_name = model_name_of(&config.model_path);

        let mut context_params = WhisperContextParameters::default();
        context_params.flash_attn(true);
        let context = WhisperContext::new_with_params(
            config
                .model_path
                .to_str()
                .ok_or_else(|| RefrainError::InferenceFailed {
                    message: "Invalid UTF-8 in model path".to_string(),
                })?,
            context_params,
        )
        .map_err(|e| RefrainError::InferenceFailed {
            message: format!("Failed to load Whisper model: {}", e),
        })?;

        Ok(Self {
            context: Mutex::new(context),
            config,
            model_name,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &WhisperConfig {
        &self.config
    }
}

#[cfg(not(feature = "whisper"))]
impl WhisperEngine {
    /// Stub constructor: always reports that the feature is missing.
    pub fn new(_config: WhisperConfig) -> Result<Self> {
        Err(RefrainError::InferenceFailed {
            message: "refrain was built without the 'whisper' feature".to_string(),
        })
    }
}

#[cfg(not(feature = "whisper"))]
impl SpeechEngine for WhisperEngine {
    fn transcribe(&self, _samples: &[f32], _hint: Option<&str>) -> Result<String> {
        Err(RefrainError::InferenceFailed {
            message: "refrain was built without the 'whisper' feature".to_string(),
        })
    }

    fn name(&self) -> &str {
        "unavailable"
    }

    fn is_ready(&self) -> bool {
        false
    }
}

#[cfg(feature = "whisper")]
impl SpeechEngine for WhisperEngine {
    fn transcribe(&self, samples: &[f32], hint: Option<&str>) -> Result<String> {
        let context = self
            .context
            .lock()
            .map_err(|e| RefrainError::InferenceFailed {
                message: format!("Failed to acquire context lock: {}", e),
            })?;

        let mut state = context
            .create_state()
            .map_err(|e| RefrainError::InferenceFailed {
                message: format!("Failed to create Whisper state: {}", e),
            })?;

        let mut params = match self.config.profile {
            SamplingProfile::Fast => FullParams::new(SamplingStrategy::Greedy { best_of: 1 }),
            SamplingProfile::Refine => FullParams::new(SamplingStrategy::BeamSearch {
                beam_size: 5,
                patience: -1.0,
            }),
        };

        if self.config.language == defaults::AUTO_LANGUAGE {
            params.set_language(None);
        } else {
            params.set_language(Some(&self.config.language));
        }

        if let Some(threads) = self.config.threads {
            params.set_n_threads(threads as i32);
        }

        // The streaming draft steers token selection toward what the fast
        // pass already heard
        if let Some(draft) = hint
            && !draft.is_empty()
        {
            params.set_initial_prompt(draft);
        }

        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        state
            .full(params, samples)
            .map_err(|e| RefrainError::InferenceFailed {
                message: format!("Whisper inference failed: {}", e),
            })?;

        let mut transcription = String::new();
        for segment in state.as_iter() {
            transcription.push_str(&segment.to_string());
        }

        Ok(transcription.trim().to_string())
    }

    fn name(&self) -> &str {
        &self.model_name
    }

    fn is_ready(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WhisperConfig::default();
        assert_eq!(config.language, "auto");
        assert_eq!(config.profile, SamplingProfile::Fast);
        assert!(config.threads.is_none());
    }

    #[test]
    fn test_fast_and_refine_constructors() {
        let fast = WhisperConfig::fast(PathBuf::from("a.bin"), "en");
        assert_eq!(fast.profile, SamplingProfile::Fast);
        assert_eq!(fast.language, "en");

        let refine = WhisperConfig::refine(PathBuf::from("b.bin"), "de");
        assert_eq!(refine.profile, SamplingProfile::Refine);
        assert_eq!(refine.model_path, PathBuf::from("b.bin"));
    }

    #[test]
    fn test_model_name_from_path() {
        assert_eq!(
            model_name_of(std::path::Path::new("/models/ggml-tiny.en.bin")),
            "ggml-tiny.en"
        );
        assert_eq!(model_name_of(std::path::Path::new("")), "unknown");
    }

    #[cfg(feature = "whisper")]
    #[test]
    fn test_missing_model_file_is_rejected() {
        let config = WhisperConfig::fast(PathBuf::from("/nonexistent/model.bin"), "en");
        let result = WhisperEngine::new(config);
        assert!(matches!(result, Err(RefrainError::ModelNotFound { .. })));
    }
}
