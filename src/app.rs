//! Live transcription entry point.
//!
//! Orchestrates the complete flow: resolve session → load engines → open
//! audio source → run the two-pass pipeline until the source drains or the
//! user interrupts → drain, persist, print the transcript.

use crate::audio::source::AudioSource;
use crate::audio::wav::WavAudioSource;
use crate::config::Config;
use crate::defaults;
use crate::error::{RefrainError, Result};
use crate::output::{ConsoleObserver, print_transcript};
use crate::pipeline::observer::TranscriptObserver;
use crate::pipeline::orchestrator::{Pipeline, PipelineConfig, PipelineState};
use crate::session::SessionStore;
use crate::stt::engine::SpeechEngine;
use crate::stt::whisper::{SamplingProfile, WhisperConfig, WhisperEngine};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "cpal-audio")]
use crate::audio::capture::{CpalAudioSource, suppress_audio_warnings};

/// CLI overrides applied on top of the config file.
#[derive(Debug, Default)]
pub struct LiveOptions {
    pub input: Option<PathBuf>,
    pub device: Option<String>,
    pub session: Option<String>,
    pub resume: bool,
    pub fast_model: Option<String>,
    pub refine_model: Option<String>,
    pub language: Option<String>,
    pub chunk_secs: Option<u64>,
    pub snapshot_secs: Option<u64>,
    pub quiet: bool,
}

/// Run live two-pass transcription until the source ends or Ctrl-C.
pub async fn run_live_command(mut config: Config, options: LiveOptions) -> Result<()> {
    #[cfg(feature = "cpal-audio")]
    suppress_audio_warnings();

    // Apply CLI overrides
    if let Some(d) = options.device {
        config.audio.device = Some(d);
    }
    if let Some(m) = options.fast_model {
        config.engines.fast_model = m;
    }
    if let Some(m) = options.refine_model {
        config.engines.refine_model = m;
    }
    if let Some(l) = options.language {
        config.engines.language = l;
    }
    if let Some(secs) = options.chunk_secs {
        config.audio.chunk_secs = secs as u32;
    }
    if let Some(secs) = options.snapshot_secs {
        config.session.snapshot_secs = secs;
    }

    let observer: Arc<dyn TranscriptObserver> = Arc::new(ConsoleObserver::new(options.quiet));

    // Resolve the session identity before anything slow
    let session_name = options
        .session
        .clone()
        .unwrap_or_else(|| default_session_name(options.input.as_deref()));
    let session_dir = config.session_dir();

    let store = if options.resume {
        let store = SessionStore::open(&session_name, &session_dir)?;
        observer.on_status(&format!(
            "Resumed session '{}' with {} entries.",
            session_name,
            store.len()
        ));
        Arc::new(store)
    } else {
        Arc::new(SessionStore::create(&session_name, &session_dir)?)
    };

    // Load models (the slow part) before touching the audio device
    observer.on_status(&format!(
        "Loading fast model '{}'...",
        config.engines.fast_model
    ));
    let fast_engine = create_engine(
        &config.engines.fast_model,
        &config.engines.language,
        SamplingProfile::Fast,
    )?;
    observer.on_status(&format!(
        "Loading refine model '{}'...",
        config.engines.refine_model
    ));
    let refine_engine = create_engine(
        &config.engines.refine_model,
        &config.engines.language,
        SamplingProfile::Refine,
    )?;
    observer.on_status(&format!(
        "Engines ready ({} backend).",
        defaults::gpu_backend()
    ));

    let audio_source = open_audio_source(&config, options.input.as_deref())?;

    let pipeline_config = PipelineConfig {
        sample_rate: config.audio.sample_rate,
        chunk_secs: config.audio.chunk_secs,
        min_sentence_chars: config.session.min_sentence_chars,
        snapshot_interval: Duration::from_secs(config.session.snapshot_secs),
        ..Default::default()
    };

    let pipeline = Pipeline::new(pipeline_config).with_observer(Arc::clone(&observer));
    let handle = pipeline.start(audio_source, fast_engine, refine_engine, Arc::clone(&store))?;

    observer.on_status("Listening. Press Ctrl-C to stop.");

    // The host translates OS signals into a stop call; the pipeline itself
    // never installs handlers.
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                observer.on_status("Interrupted; draining the refine backlog...");
                break;
            }
            _ = tokio::time::sleep(Duration::from_millis(200)) => {
                if handle.state() == PipelineState::Stopping || handle.workers_finished() {
                    break;
                }
            }
        }
    }

    let backing_path = store.backing_path().to_path_buf();
    let stop_result = tokio::task::spawn_blocking(move || handle.stop())
        .await
        .map_err(|e| RefrainError::Other(format!("shutdown task failed: {e}")))?;
    if let Err(e) = stop_result {
        // Transcript is intact in memory; the snapshot failure was logged
        observer.on_status(&format!("Final snapshot failed: {e}"));
    } else {
        observer.on_status(&format!("Session saved to {}.", backing_path.display()));
    }

    print_transcript(&store.entries());
    Ok(())
}

/// List saved sessions to stdout.
pub fn run_sessions_command(config: &Config) -> Result<()> {
    let dir = config.session_dir();
    let names = SessionStore::list(&dir)?;
    if names.is_empty() {
        println!("No saved sessions in {}.", dir.display());
    } else {
        for name in names {
            println!("{}", name);
        }
    }
    Ok(())
}

/// Derive a session name from the input file, or timestamp a mic session.
fn default_session_name(input: Option<&Path>) -> String {
    match input.and_then(|p| p.file_stem()).and_then(|s| s.to_str()) {
        Some(stem) => stem.to_string(),
        None => {
            let stamp = humantime::format_rfc3339_seconds(std::time::SystemTime::now());
            format!("mic-{}", stamp.to_string().replace(':', "-"))
        }
    }
}

/// Open the WAV file source, or the microphone when no input is given.
fn open_audio_source(config: &Config, input: Option<&Path>) -> Result<Box<dyn AudioSource>> {
    match input {
        Some(path) => Ok(Box::new(WavAudioSource::from_path(path)?)),
        None => {
            #[cfg(feature = "cpal-audio")]
            {
                Ok(Box::new(CpalAudioSource::new(
                    config.audio.device.as_deref(),
                )?))
            }
            #[cfg(not(feature = "cpal-audio"))]
            {
                let _ = config;
                Err(RefrainError::AudioCapture {
                    message: "refrain was built without microphone support; use --input FILE"
                        .to_string(),
                })
            }
        }
    }
}

/// Build an engine for one pass from a model name or path.
fn create_engine(
    model: &str,
    language: &str,
    profile: SamplingProfile,
) -> Result<Arc<dyn SpeechEngine>> {
    let model_path = resolve_model_path(model);
    if !model_path.exists() {
        return Err(RefrainError::ModelNotFound {
            path: format!(
                "{} (place a ggml model there, or pass a path with --fast-model/--refine-model)",
                model_path.display()
            ),
        });
    }

    let whisper_config = match profile {
        SamplingProfile::Fast => WhisperConfig::fast(model_path, language),
        SamplingProfile::Refine => WhisperConfig::refine(model_path, language),
    };
    Ok(Arc::new(WhisperEngine::new(whisper_config)?))
}

/// Resolve a model value: an explicit path is used as-is, a short name maps
/// into the model cache directory (`~/.cache/refrain/models/ggml-<name>.bin`).
fn resolve_model_path(model: &str) -> PathBuf {
    let as_path = PathBuf::from(model);
    if model.contains('/') || model.ends_with(".bin") || as_path.exists() {
        return as_path;
    }

    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("refrain")
        .join("models")
        .join(format!("ggml-{}.bin", model))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_session_name_from_input_stem() {
        assert_eq!(
            default_session_name(Some(Path::new("/audio/lecture-12.wav"))),
            "lecture-12"
        );
    }

    #[test]
    fn test_default_session_name_for_mic() {
        let name = default_session_name(None);
        assert!(name.starts_with("mic-"), "got: {}", name);
        assert!(!name.contains(':'), "colons break filenames: {}", name);
    }

    #[test]
    fn test_resolve_model_path_passthrough() {
        assert_eq!(
            resolve_model_path("/models/ggml-base.bin"),
            PathBuf::from("/models/ggml-base.bin")
        );
        assert_eq!(
            resolve_model_path("local-model.bin"),
            PathBuf::from("local-model.bin")
        );
    }

    #[test]
    fn test_resolve_model_path_short_name() {
        let path = resolve_model_path("tiny.en");
        let rendered = path.to_string_lossy();
        assert!(rendered.ends_with("models/ggml-tiny.en.bin"), "got: {}", rendered);
    }

    #[test]
    fn test_missing_model_is_reported() {
        let result = create_engine("/nonexistent/model.bin", "en", SamplingProfile::Fast);
        assert!(matches!(result, Err(RefrainError::ModelNotFound { .. })));
    }
}
