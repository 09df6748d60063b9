//! WAV file audio source for file-fed transcription.

use crate::audio::source::AudioSource;
use crate::defaults::SAMPLE_RATE;
use crate::error::{RefrainError, Result};
use std::io::Read;
use std::path::Path;

/// Audio source that replays WAV file data through the pipeline.
/// Supports arbitrary sample rates and channels, resampling to 16kHz mono.
pub struct WavAudioSource {
    samples: Vec<f32>,
    position: usize,
    chunk_size: usize,
}

impl WavAudioSource {
    /// Create from any reader (for testing/flexibility).
    pub fn from_reader(reader: Box<dyn Read + Send>) -> Result<Self> {
        let mut wav_reader =
            hound::WavReader::new(reader).map_err(|e| RefrainError::AudioCapture {
                message: format!("Failed to parse WAV file: {}", e),
            })?;

        let spec = wav_reader.spec();
        let source_rate = spec.sample_rate;
        let source_channels = spec.channels;

        // Read all samples, normalizing to f32 in [-1.0, 1.0]
        let raw_samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Int => wav_reader
                .samples::<i16>()
                .map(|s| s.map(|v| v as f32 / 32768.0))
                .collect::<std::result::Result<Vec<_>, _>>(),
            hound::SampleFormat::Float => wav_reader
                .samples::<f32>()
                .collect::<std::result::Result<Vec<_>, _>>(),
        }
        .map_err(|e| RefrainError::AudioCapture {
            message: format!("Failed to read WAV samples: {}", e),
        })?;

        // Mix down to mono by averaging channels
        let mono_samples = if source_channels > 1 {
            raw_samples
                .chunks_exact(source_channels as usize)
                .map(|frame| frame.iter().sum::<f32>() / source_channels as f32)
                .collect()
        } else {
            raw_samples
        };

        // Resample to 16kHz if needed
        let samples = if source_rate != SAMPLE_RATE {
            resample(&mono_samples, source_rate, SAMPLE_RATE)
        } else {
            mono_samples
        };

        // 100ms chunks at 16kHz
        let chunk_size = (SAMPLE_RATE / 10) as usize;

        Ok(Self {
            samples,
            position: 0,
            chunk_size,
        })
    }

    /// Open a WAV file from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| RefrainError::AudioCapture {
            message: format!("Failed to open {}: {}", path.display(), e),
        })?;
        Self::from_reader(Box::new(std::io::BufReader::new(file)))
    }

    /// Total duration of the loaded audio in seconds.
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / SAMPLE_RATE as f32
    }
}

impl AudioSource for WavAudioSource {
    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_samples(&mut self) -> Result<Vec<f32>> {
        if self.position >= self.samples.len() {
            return Ok(Vec::new());
        }

        let end = std::cmp::min(self.position + self.chunk_size, self.samples.len());
        let chunk = self.samples[self.position..end].to_vec();
        self.position = end;

        Ok(chunk)
    }

    fn is_finite(&self) -> bool {
        true
    }
}

/// Simple linear interpolation resampling.
pub(crate) fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = source_pos.floor() as usize;
            let fraction = (source_pos - source_idx as f64) as f32;

            if source_idx + 1 >= samples.len() {
                samples[source_idx]
            } else {
                let left = samples[source_idx];
                let right = samples[source_idx + 1];
                left + (right - left) * fraction
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn make_wav_data(sample_rate: u32, channels: u16, samples: &[i16]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
        cursor.into_inner()
    }

    #[test]
    fn from_reader_16khz_mono_normalizes_to_f32() {
        let wav_data = make_wav_data(16000, 1, &[16384i16, -16384, 0]);

        let source = WavAudioSource::from_reader(Box::new(Cursor::new(wav_data))).unwrap();

        assert_eq!(source.samples.len(), 3);
        assert!((source.samples[0] - 0.5).abs() < 1e-4);
        assert!((source.samples[1] + 0.5).abs() < 1e-4);
        assert_eq!(source.samples[2], 0.0);
    }

    #[test]
    fn from_reader_stereo_downmixes_to_mono() {
        // Stereo pairs: (0.25, 0.75), (-0.5, 0.5)
        let wav_data = make_wav_data(16000, 2, &[8192i16, 24576, -16384, 16384]);

        let source = WavAudioSource::from_reader(Box::new(Cursor::new(wav_data))).unwrap();

        assert_eq!(source.samples.len(), 2);
        assert!((source.samples[0] - 0.5).abs() < 1e-4);
        assert!(source.samples[1].abs() < 1e-4);
    }

    #[test]
    fn from_reader_48khz_resamples_to_16khz() {
        let input_samples = vec![0i16; 48000]; // 1 second at 48kHz
        let wav_data = make_wav_data(48000, 1, &input_samples);

        let source = WavAudioSource::from_reader(Box::new(Cursor::new(wav_data))).unwrap();

        assert!(source.samples.len() >= 15900 && source.samples.len() <= 16100);
        assert!((source.duration_secs() - 1.0).abs() < 0.05);
    }

    #[test]
    fn read_samples_returns_100ms_chunks() {
        let input_samples = vec![1i16; 5000];
        let wav_data = make_wav_data(16000, 1, &input_samples);

        let mut source = WavAudioSource::from_reader(Box::new(Cursor::new(wav_data))).unwrap();

        assert_eq!(source.read_samples().unwrap().len(), 1600);
        assert_eq!(source.read_samples().unwrap().len(), 1600);
        assert_eq!(source.read_samples().unwrap().len(), 1600);
        // 5000 - 3*1600 = 200 trailing samples
        assert_eq!(source.read_samples().unwrap().len(), 200);
    }

    #[test]
    fn read_samples_returns_empty_at_eof() {
        let wav_data = make_wav_data(16000, 1, &[1i16; 100]);

        let mut source = WavAudioSource::from_reader(Box::new(Cursor::new(wav_data))).unwrap();

        assert_eq!(source.read_samples().unwrap().len(), 100);
        assert!(source.read_samples().unwrap().is_empty());
        assert!(source.read_samples().unwrap().is_empty());
    }

    #[test]
    fn wav_source_is_finite() {
        let wav_data = make_wav_data(16000, 1, &[1i16; 10]);
        let source = WavAudioSource::from_reader(Box::new(Cursor::new(wav_data))).unwrap();
        assert!(source.is_finite());
    }

    #[test]
    fn invalid_wav_data_returns_error() {
        let invalid_data = vec![0u8, 1, 2, 3, 4, 5];

        let result = WavAudioSource::from_reader(Box::new(Cursor::new(invalid_data)));

        match result {
            Err(RefrainError::AudioCapture { message }) => {
                assert!(message.contains("Failed to parse WAV file"));
            }
            _ => panic!("Expected AudioCapture error"),
        }
    }

    #[test]
    fn empty_wav_data_returns_error() {
        let result = WavAudioSource::from_reader(Box::new(Cursor::new(Vec::new())));
        assert!(result.is_err());
    }

    #[test]
    fn from_path_missing_file_returns_error() {
        let result = WavAudioSource::from_path(Path::new("/nonexistent/audio.wav"));
        assert!(matches!(result, Err(RefrainError::AudioCapture { .. })));
    }

    #[test]
    fn resample_identity_same_rate() {
        let samples = vec![0.1f32, 0.2, 0.3];
        assert_eq!(resample(&samples, 16000, 16000), samples);
    }

    #[test]
    fn resample_upsample_interpolates() {
        let samples = vec![0.0f32, 1.0, 2.0];
        let resampled = resample(&samples, 8000, 16000);

        assert_eq!(resampled.len(), 6);
        assert_eq!(resampled[0], 0.0);
        assert!(resampled[1] > 0.0 && resampled[1] < 1.0);
        assert_eq!(resampled[2], 1.0);
    }

    #[test]
    fn resample_downsample_halves_length() {
        let samples = vec![0.0f32; 3200];
        let resampled = resample(&samples, 16000, 8000);
        assert_eq!(resampled.len(), 1600);
    }

    #[test]
    fn resample_handles_edge_cases() {
        assert!(resample(&[], 16000, 8000).is_empty());

        let single = resample(&[0.5f32], 16000, 8000);
        assert_eq!(single, vec![0.5f32]);
    }

    #[test]
    fn resample_preserves_amplitude() {
        let samples = vec![0.8f32; 100];
        let resampled = resample(&samples, 16000, 8000);
        assert!(resampled.iter().all(|&s| (s - 0.8).abs() < 1e-4));
    }

    #[test]
    fn malformed_wav_garbage_rejected() {
        let mut garbage = Vec::new();
        for i in 0..500 {
            garbage.push(((i * 17 + 42) % 256) as u8);
        }

        let result = WavAudioSource::from_reader(Box::new(Cursor::new(garbage)));
        assert!(result.is_err(), "Should reject random garbage as WAV");
    }

    #[test]
    fn malformed_wav_truncated_header_rejected() {
        let truncated = b"RIFF\x00\x00";
        let result = WavAudioSource::from_reader(Box::new(Cursor::new(truncated.to_vec())));
        assert!(result.is_err(), "Should reject truncated WAV header");
    }
}
