use crate::error::{RefrainError, Result};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

/// Trait for speech-to-text engines.
///
/// Both passes consume this interface: the fast pass calls it without a
/// hint, the refine pass passes the streaming draft as context. A call is
/// synchronous and may take seconds; each pass runs on its own thread so a
/// slow call only delays that pass.
pub trait SpeechEngine: Send + Sync {
    /// Transcribe audio samples to text.
    ///
    /// # Arguments
    /// * `samples` - mono f32 audio at 16kHz, normalized to [-1.0, 1.0]
    /// * `hint` - optional draft text the engine may use as context
    ///
    /// # Returns
    /// Transcribed text or error
    fn transcribe(&self, samples: &[f32], hint: Option<&str>) -> Result<String>;

    /// Get the name of the loaded model
    fn name(&self) -> &str;

    /// Check if the engine is ready
    fn is_ready(&self) -> bool;
}

/// Implement SpeechEngine for Arc<T> to allow sharing across threads.
impl<T: SpeechEngine> SpeechEngine for Arc<T> {
    fn transcribe(&self, samples: &[f32], hint: Option<&str>) -> Result<String> {
        (**self).transcribe(samples, hint)
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }
}

/// Mock engine for testing.
///
/// Plays back scripted responses in order (repeating the last one when the
/// script runs out), optionally uppercasing, echoing the hint, delaying, or
/// failing.
pub struct MockEngine {
    name: String,
    responses: Mutex<VecDeque<String>>,
    last_response: Mutex<String>,
    hints: Mutex<Vec<Option<String>>>,
    uppercase: bool,
    should_fail: bool,
    delay: Option<Duration>,
}

impl MockEngine {
    /// Create a new mock engine with a single default response.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            responses: Mutex::new(VecDeque::new()),
            last_response: Mutex::new("mock transcription".to_string()),
            hints: Mutex::new(Vec::new()),
            uppercase: false,
            should_fail: false,
            delay: None,
        }
    }

    /// Configure a single fixed response.
    pub fn with_response(self, response: &str) -> Self {
        *self.last_response.lock().unwrap_or_else(|p| p.into_inner()) = response.to_string();
        self
    }

    /// Configure a script of responses, returned one per call.
    pub fn with_responses(self, responses: &[&str]) -> Self {
        {
            let mut queue = self.responses.lock().unwrap_or_else(|p| p.into_inner());
            queue.extend(responses.iter().map(|r| r.to_string()));
        }
        self
    }

    /// Uppercase whatever would have been returned (stands in for a
    /// higher-accuracy second pass in tests).
    pub fn with_uppercase(mut self) -> Self {
        self.uppercase = true;
        self
    }

    /// Configure the mock to fail on transcribe.
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Sleep this long inside each transcribe call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Hints observed so far, in call order.
    pub fn seen_hints(&self) -> Vec<Option<String>> {
        self.hints.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

impl SpeechEngine for MockEngine {
    fn transcribe(&self, _samples: &[f32], hint: Option<&str>) -> Result<String> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        self.hints.lock().unwrap_or_else(|p| p.into_inner()).push(hint.map(String::from));

        if self.should_fail {
            return Err(RefrainError::Transcription {
                message: "mock transcription failure".to_string(),
            });
        }

        let response = {
            let mut queue = self.responses.lock().unwrap_or_else(|p| p.into_inner());
            match queue.pop_front() {
                Some(next) => {
                    *self.last_response.lock().unwrap_or_else(|p| p.into_inner()) = next.clone();
                    next
                }
                None => self.last_response.lock().unwrap_or_else(|p| p.into_inner()).clone(),
            }
        };

        if self.uppercase {
            Ok(response.to_uppercase())
        } else {
            Ok(response)
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_ready(&self) -> bool {
        !self.should_fail
    }
}

/// A refine-style mock that uppercases the hint it was given, falling back
/// to its scripted response when no hint is present.
pub struct EchoRefineEngine {
    name: String,
}

impl EchoRefineEngine {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl SpeechEngine for EchoRefineEngine {
    fn transcribe(&self, _samples: &[f32], hint: Option<&str>) -> Result<String> {
        match hint {
            Some(draft) if !draft.is_empty() => Ok(draft.to_uppercase()),
            _ => Ok(String::new()),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_ready(&self) -> bool {
        true
    }
}
