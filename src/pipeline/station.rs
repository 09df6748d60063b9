//! Core station abstraction and runner for the pipeline.
//!
//! Each station receives input from a bounded queue, processes it, and may
//! produce output for the next queue. Stations run in dedicated threads and
//! poll with a short timeout so the shared running flag is observed
//! promptly without busy-spinning.

use crate::defaults;
use crate::pipeline::error::{ErrorReporter, StationError};
use crate::pipeline::queue::{ChunkQueue, PopError, PushOutcome};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

/// A processing station in the pipeline.
pub trait Station: Send + 'static {
    /// The input type this station receives.
    type Input: Send + 'static;
    /// The output type this station produces.
    type Output: Send + 'static;

    /// Processes a single input item.
    ///
    /// Returns:
    /// - `Ok(Some(output))` - Successfully processed and produced output
    /// - `Ok(None)` - Successfully processed but no output
    /// - `Err(StationError)` - Processing failed
    fn process(&mut self, input: Self::Input) -> Result<Option<Self::Output>, StationError>;

    /// Returns the name of this station for logging and error reporting.
    fn name(&self) -> &'static str;

    /// Called once when the station is shutting down, after its input is
    /// fully drained. Override to flush buffered state.
    fn shutdown(&mut self) {}
}

/// Runs a station in a dedicated thread.
pub struct StationRunner {
    handle: Option<JoinHandle<()>>,
    station_name: &'static str,
}

impl StationRunner {
    /// Spawns a station thread.
    ///
    /// The loop pops with a bounded timeout; it exits when the input queue
    /// is closed and drained, or when the running flag clears and no input
    /// remains. Recoverable errors are reported and skipped; a fatal error
    /// ends the loop.
    pub fn spawn<S: Station>(
        mut station: S,
        input: ChunkQueue<S::Input>,
        output: Option<ChunkQueue<S::Output>>,
        running: Arc<AtomicBool>,
        error_reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        let station_name = station.name();

        let handle = thread::spawn(move || {
            loop {
                match input.pop_timeout(defaults::POLL_TIMEOUT) {
                    Ok(item) => match station.process(item) {
                        Ok(Some(out)) => {
                            if let Some(ref out_queue) = output
                                && out_queue.push(out) == PushOutcome::Closed
                            {
                                // Downstream is gone, nothing left to feed
                                break;
                            }
                        }
                        Ok(None) => {}
                        Err(StationError::Recoverable(msg)) => {
                            error_reporter.report(station_name, &StationError::Recoverable(msg));
                        }
                        Err(StationError::Fatal(msg)) => {
                            error_reporter.report(station_name, &StationError::Fatal(msg));
                            break;
                        }
                    },
                    Err(PopError::Closed) => break,
                    Err(PopError::Timeout) => {
                        // Idle; exit once asked to stop and the backlog is gone
                        if !running.load(Ordering::SeqCst) && input.is_empty() {
                            break;
                        }
                    }
                }
            }

            station.shutdown();
        });

        Self {
            handle: Some(handle),
            station_name,
        }
    }

    /// Waits for the station thread to complete.
    pub fn join(mut self) -> Result<(), String> {
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| format!("Station '{}' thread panicked", self.station_name))
        } else {
            Ok(())
        }
    }

    /// Returns the name of the station.
    pub fn name(&self) -> &'static str {
        self.station_name
    }
}
