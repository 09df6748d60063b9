use crate::error::{RefrainError, Result};

/// Trait for audio source devices.
///
/// Pull-based: the capture thread polls `read_samples` instead of receiving
/// driver callbacks, which keeps synthetic sources trivial to write for
/// tests. Implementations return mono f32 samples at the pipeline sample
/// rate, normalized to [-1.0, 1.0].
pub trait AudioSource: Send {
    /// Start capturing audio from the source.
    fn start(&mut self) -> Result<()>;

    /// Stop capturing audio from the source.
    fn stop(&mut self) -> Result<()>;

    /// Read whatever samples have accumulated since the last call.
    ///
    /// An empty vector means "nothing available right now" for live sources
    /// and "end of stream" for finite ones.
    fn read_samples(&mut self) -> Result<Vec<f32>>;

    /// Whether this source ends on its own (file/pipe) or runs until
    /// stopped (microphone).
    fn is_finite(&self) -> bool {
        false
    }
}

/// A phase of frames for `MockAudioSource`: the same samples, `count` times.
#[derive(Debug, Clone)]
pub struct FramePhase {
    pub samples: Vec<f32>,
    pub count: u32,
}

/// Mock audio source for testing
#[derive(Debug, Clone)]
pub struct MockAudioSource {
    is_started: bool,
    phases: Vec<FramePhase>,
    phase_index: usize,
    frames_in_phase: u32,
    finite: bool,
    should_fail_start: bool,
    should_fail_read: bool,
    error_message: String,
}

impl MockAudioSource {
    /// Create a new mock audio source with no frames queued.
    pub fn new() -> Self {
        Self {
            is_started: false,
            phases: Vec::new(),
            phase_index: 0,
            frames_in_phase: 0,
            finite: true,
            should_fail_start: false,
            should_fail_read: false,
            error_message: "mock audio error".to_string(),
        }
    }

    /// Queue a sequence of frame phases, played back in order.
    pub fn with_frame_sequence(mut self, phases: Vec<FramePhase>) -> Self {
        self.phases = phases;
        self
    }

    /// Queue the same samples for every read (single endless phase).
    pub fn with_samples(self, samples: Vec<f32>) -> Self {
        self.with_frame_sequence(vec![FramePhase {
            samples,
            count: u32::MAX,
        }])
    }

    /// Treat this mock as a live source: exhausted frames read as empty
    /// instead of signaling end-of-stream.
    pub fn as_live_source(mut self) -> Self {
        self.finite = false;
        self
    }

    /// Configure the mock to fail on start
    pub fn with_start_failure(mut self) -> Self {
        self.should_fail_start = true;
        self
    }

    /// Configure the mock to fail on read
    pub fn with_read_failure(mut self) -> Self {
        self.should_fail_read = true;
        self
    }

    /// Configure the error message for failures
    pub fn with_error_message(mut self, message: &str) -> Self {
        self.error_message = message.to_string();
        self
    }

    /// Check if the audio source is started
    pub fn is_started(&self) -> bool {
        self.is_started
    }
}

impl Default for MockAudioSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSource for MockAudioSource {
    fn start(&mut self) -> Result<()> {
        if self.should_fail_start {
            Err(RefrainError::AudioCapture {
                message: self.error_message.clone(),
            })
        } else {
            self.is_started = true;
            Ok(())
        }
    }

    fn stop(&mut self) -> Result<()> {
        self.is_started = false;
        Ok(())
    }

    fn read_samples(&mut self) -> Result<Vec<f32>> {
        if self.should_fail_read {
            return Err(RefrainError::AudioCapture {
                message: self.error_message.clone(),
            });
        }

        while let Some(phase) = self.phases.get(self.phase_index) {
            if self.frames_in_phase < phase.count {
                self.frames_in_phase += 1;
                return Ok(phase.samples.clone());
            }
            self.phase_index += 1;
            self.frames_in_phase = 0;
        }

        // All phases exhausted
        Ok(Vec::new())
    }

    fn is_finite(&self) -> bool {
        self.finite
    }
}
