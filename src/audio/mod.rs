//! Audio input: pull-based sources and the stream chunker.

#[cfg(feature = "cpal-audio")]
pub mod capture;
pub mod chunker;
pub mod source;
pub mod wav;

#[cfg(feature = "cpal-audio")]
pub use capture::CpalAudioSource;
pub use chunker::AudioChunker;
pub use source::{AudioSource, MockAudioSource};
pub use wav::WavAudioSource;
