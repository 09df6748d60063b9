//! Pipeline controller: lifecycle, thread supervision, orderly shutdown.
//!
//! Owns the capture thread, both pass stations, and the snapshot timer.
//! Shutdown is a drain, not an abort: capture stops cutting chunks and
//! closes its queue, the fast pass finishes its backlog and closes the
//! refine queue, the refine pass finishes what it can, then the segmenter
//! residue is flushed and a terminal snapshot written. Workers that exceed
//! the join deadline are detached rather than hanging the controller.

use crate::audio::chunker::{AudioChunker, ChunkerConfig};
use crate::audio::source::AudioSource;
use crate::defaults;
use crate::error::Result;
use crate::pipeline::error::{ErrorReporter, LogReporter};
use crate::pipeline::fast_pass::FastPassStation;
use crate::pipeline::observer::{NullObserver, TranscriptObserver};
use crate::pipeline::queue::{ChunkQueue, PushOutcome};
use crate::pipeline::refine_pass::RefinePassStation;
use crate::pipeline::segmenter::SentenceSegmenter;
use crate::pipeline::station::StationRunner;
use crate::pipeline::types::AudioChunk;
use crate::session::SessionStore;
use crate::stt::engine::SpeechEngine;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Lifecycle of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PipelineState {
    Idle = 0,
    Running = 1,
    Stopping = 2,
    Stopped = 3,
}

impl PipelineState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => PipelineState::Idle,
            1 => PipelineState::Running,
            2 => PipelineState::Stopping,
            _ => PipelineState::Stopped,
        }
    }
}

/// Configuration for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Sample rate of the audio stream
    pub sample_rate: u32,
    /// Chunk duration in seconds
    pub chunk_secs: u32,
    /// Minimum sentence length kept by the segmenter
    pub min_sentence_chars: usize,
    /// Capture → fast-pass queue capacity
    pub capture_queue_capacity: usize,
    /// Fast-pass → refine-pass queue capacity
    pub refine_queue_capacity: usize,
    /// Interval between periodic snapshots
    pub snapshot_interval: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_rate: defaults::SAMPLE_RATE,
            chunk_secs: defaults::CHUNK_SECS,
            min_sentence_chars: defaults::MIN_SENTENCE_CHARS,
            capture_queue_capacity: defaults::CAPTURE_QUEUE_CAPACITY,
            refine_queue_capacity: defaults::REFINE_QUEUE_CAPACITY,
            snapshot_interval: Duration::from_secs(defaults::SNAPSHOT_SECS),
        }
    }
}

/// Handle to a running pipeline.
pub struct PipelineHandle {
    running: Arc<AtomicBool>,
    state: Arc<AtomicU8>,
    capture_queue: ChunkQueue<AudioChunk>,
    threads: Vec<JoinHandle<()>>,
    store: Arc<SessionStore>,
}

impl PipelineHandle {
    /// Current lifecycle state.
    pub fn state(&self) -> PipelineState {
        PipelineState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Whether the pipeline has been asked to keep going.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Whether every worker thread has exited.
    pub fn workers_finished(&self) -> bool {
        self.threads.iter().all(|t| t.is_finished())
    }

    /// Stops the pipeline: drain, flush, persist.
    ///
    /// Signals shutdown, waits a bounded time for workers to finish their
    /// backlog (detaching any that exceed the deadline), then writes the
    /// terminal snapshot. Returns the snapshot result; the in-memory
    /// transcript was complete either way.
    pub fn stop(mut self) -> Result<()> {
        self.state
            .store(PipelineState::Stopping as u8, Ordering::SeqCst);
        self.running.store(false, Ordering::SeqCst);
        // No new chunks are accepted; workers drain what is queued
        self.capture_queue.close();

        // Join deadline: twice the worker poll timeout, plus margin for an
        // in-flight engine call.
        let deadline = Instant::now() + defaults::POLL_TIMEOUT * 2 + Duration::from_secs(1);
        let poll_interval = Duration::from_millis(50);

        loop {
            let mut remaining = Vec::new();
            for handle in self.threads.drain(..) {
                if handle.is_finished() {
                    if let Err(panic_info) = handle.join() {
                        let msg = panic_info
                            .downcast_ref::<&str>()
                            .copied()
                            .or_else(|| panic_info.downcast_ref::<String>().map(|s| s.as_str()))
                            .unwrap_or("unknown panic");
                        eprintln!("refrain: pipeline thread panicked: {msg}");
                    }
                } else {
                    remaining.push(handle);
                }
            }
            self.threads = remaining;

            if self.threads.is_empty() {
                break;
            }

            if Instant::now() >= deadline {
                eprintln!(
                    "refrain: shutdown timeout — {} thread(s) still running, detaching",
                    self.threads.len()
                );
                // Dropping JoinHandles detaches threads; they die with the process.
                break;
            }

            thread::sleep(poll_interval);
        }

        let snapshot_result = self.store.snapshot();
        if let Err(ref e) = snapshot_result {
            eprintln!("refrain: terminal snapshot failed: {e}");
        }

        self.state
            .store(PipelineState::Stopped as u8, Ordering::SeqCst);
        snapshot_result
    }
}

/// Two-pass pipeline: AudioSource → chunker → fast pass → refine pass.
pub struct Pipeline {
    config: PipelineConfig,
    error_reporter: Arc<dyn ErrorReporter>,
    observer: Arc<dyn TranscriptObserver>,
}

impl Pipeline {
    /// Creates a pipeline with default error reporter and no observer.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            error_reporter: Arc::new(LogReporter),
            observer: Arc::new(NullObserver),
        }
    }

    /// Sets a custom error reporter.
    pub fn with_error_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.error_reporter = reporter;
        self
    }

    /// Sets the observer notified of status and transcript events.
    pub fn with_observer(mut self, observer: Arc<dyn TranscriptObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Starts the pipeline.
    ///
    /// # Arguments
    /// * `audio_source` - Audio capture source
    /// * `fast_engine` - Low-latency engine for the streaming pass
    /// * `refine_engine` - High-accuracy engine for the refine pass
    /// * `store` - Session transcript, fresh or resumed
    ///
    /// # Returns
    /// Handle to control and stop the pipeline
    pub fn start(
        self,
        mut audio_source: Box<dyn AudioSource>,
        fast_engine: Arc<dyn SpeechEngine>,
        refine_engine: Arc<dyn SpeechEngine>,
        store: Arc<SessionStore>,
    ) -> Result<PipelineHandle> {
        let running = Arc::new(AtomicBool::new(true));
        let state = Arc::new(AtomicU8::new(PipelineState::Running as u8));

        let capture_queue: ChunkQueue<AudioChunk> =
            ChunkQueue::new("capture", self.config.capture_queue_capacity);
        let refine_queue = ChunkQueue::new("refine", self.config.refine_queue_capacity);

        let fast_station = FastPassStation::new(
            fast_engine,
            Arc::clone(&store),
            Arc::clone(&self.observer),
            SentenceSegmenter::with_min_chars(self.config.min_sentence_chars),
        );
        let refine_station =
            RefinePassStation::new(refine_engine, Arc::clone(&store), Arc::clone(&self.observer));

        let fast_runner = StationRunner::spawn(
            fast_station,
            capture_queue.clone(),
            Some(refine_queue.clone()),
            Arc::clone(&running),
            Arc::clone(&self.error_reporter),
        );
        let refine_runner = StationRunner::spawn(
            refine_station,
            refine_queue.clone(),
            None,
            Arc::clone(&running),
            Arc::clone(&self.error_reporter),
        );

        // Start audio capture before spawning the polling thread
        audio_source.start()?;
        let source_is_finite = audio_source.is_finite();

        let capture_handle = self.spawn_capture_thread(
            audio_source,
            source_is_finite,
            capture_queue.clone(),
            Arc::clone(&running),
            Arc::clone(&state),
        );

        let snapshot_handle = self.spawn_snapshot_thread(Arc::clone(&store), Arc::clone(&running));

        let mut threads = vec![capture_handle, snapshot_handle];

        // Chain the drains: when the fast pass exits, the refine queue
        // closes so the refine pass can finish its backlog and exit too.
        let refine_queue_for_close = refine_queue.clone();
        threads.push(thread::spawn(move || {
            if let Err(msg) = fast_runner.join() {
                eprintln!("refrain: {msg}");
            }
            refine_queue_for_close.close();
        }));
        threads.push(thread::spawn(move || {
            if let Err(msg) = refine_runner.join() {
                eprintln!("refrain: {msg}");
            }
        }));

        Ok(PipelineHandle {
            running,
            state,
            capture_queue,
            threads,
            store,
        })
    }

    /// Spawn the audio polling thread: read samples, cut chunks, enqueue.
    fn spawn_capture_thread(
        &self,
        mut audio_source: Box<dyn AudioSource>,
        source_is_finite: bool,
        capture_queue: ChunkQueue<AudioChunk>,
        running: Arc<AtomicBool>,
        state: Arc<AtomicU8>,
    ) -> JoinHandle<()> {
        let observer = Arc::clone(&self.observer);
        let chunker_config = ChunkerConfig {
            chunk_secs: self.config.chunk_secs,
            sample_rate: self.config.sample_rate,
        };

        thread::spawn(move || {
            // Poll at ~60Hz; the source buffers between reads
            let poll_interval = Duration::from_millis(16);
            let mut chunker = AudioChunker::with_config(chunker_config);
            let mut consecutive_errors: u32 = 0;

            while running.load(Ordering::SeqCst) {
                let samples = match audio_source.read_samples() {
                    Ok(s) => {
                        consecutive_errors = 0;
                        s
                    }
                    Err(e) => {
                        consecutive_errors += 1;
                        if consecutive_errors >= defaults::MAX_CAPTURE_ERRORS {
                            eprintln!(
                                "refrain: audio capture failed {consecutive_errors} times in a row: {e}"
                            );
                            observer.on_status(
                                "Audio source failed; finishing the transcript with what was heard.",
                            );
                            state.store(PipelineState::Stopping as u8, Ordering::SeqCst);
                            break;
                        }
                        // Back off a little harder each retry
                        thread::sleep(poll_interval * consecutive_errors);
                        continue;
                    }
                };

                if samples.is_empty() {
                    if source_is_finite {
                        observer.on_status("Audio source drained; refining the backlog.");
                        state.store(PipelineState::Stopping as u8, Ordering::SeqCst);
                        break;
                    }
                    // Live source: empty reads are normal while the device
                    // spins up. Keep polling.
                    thread::sleep(poll_interval);
                    continue;
                }

                chunker.push(&samples);
                while let Some(chunk) = chunker.try_cut() {
                    if capture_queue.push(chunk) == PushOutcome::Closed {
                        break;
                    }
                }

                thread::sleep(poll_interval);
            }

            chunker.discard_remainder();
            // Ends the drain chain: fast pass finishes its backlog and
            // closes the refine queue behind itself
            capture_queue.close();

            if let Err(e) = audio_source.stop() {
                eprintln!("refrain: failed to stop audio capture: {e}");
            }
        })
    }

    /// Spawn the periodic snapshot thread.
    fn spawn_snapshot_thread(
        &self,
        store: Arc<SessionStore>,
        running: Arc<AtomicBool>,
    ) -> JoinHandle<()> {
        let interval = self.config.snapshot_interval;
        let observer = Arc::clone(&self.observer);

        thread::spawn(move || {
            let poll = Duration::from_millis(200);
            let mut last_snapshot = Instant::now();

            while running.load(Ordering::SeqCst) {
                thread::sleep(poll);
                if last_snapshot.elapsed() >= interval {
                    // A failed write leaves the previous snapshot on disk;
                    // the in-memory session is intact for the next attempt
                    if let Err(e) = store.snapshot() {
                        eprintln!("refrain: periodic snapshot failed: {e}");
                        observer.on_status("Periodic snapshot failed; will retry.");
                    }
                    last_snapshot = Instant::now();
                }
            }
        })
    }
}
