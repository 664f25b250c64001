//! Audio chunks fed to a [`crate::Controller`].
//!
//! A chunk is a buffer of mono 16-bit PCM samples at the engine's sample rate. Chunks are
//! produced by the caller (a capture device, a file reader) and only borrowed by the
//! controller for the duration of one feed.

use std::io::{Read, Seek};

use hound::{SampleFormat, WavReader};

use crate::{Error, Result};

/// Sample rate (Hz) the decoding engine expects.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// A buffer of mono 16-bit PCM samples.
///
/// `AudioChunk::default()` is the *unset* chunk: it exists but was never filled by a producer,
/// and feeding it is an [`Error::InvalidInput`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioChunk {
    samples: Vec<i16>,
}

impl AudioChunk {
    pub fn new(samples: Vec<i16>) -> Self {
        Self { samples }
    }

    /// Build a chunk from normalized `f32` samples in `[-1.0, 1.0]`.
    ///
    /// Out-of-range values are clamped.
    pub fn from_f32(samples: &[f32]) -> Self {
        let samples = samples
            .iter()
            .map(|s| (s.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16)
            .collect();
        Self { samples }
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Check that the chunk was filled by its producer.
    pub fn validate(&self) -> Result<()> {
        if self.samples.is_empty() {
            return Err(Error::invalid_input(
                "audio chunk is not set up; it holds no samples",
            ));
        }
        Ok(())
    }
}

impl From<Vec<i16>> for AudioChunk {
    fn from(samples: Vec<i16>) -> Self {
        Self::new(samples)
    }
}

/// Read WAV audio and split it into consecutive chunks of `frames_per_chunk` samples.
///
/// Format requirements:
/// - Mono (1 channel)
/// - [`TARGET_SAMPLE_RATE`]
/// - 16-bit integer PCM
///
/// The final chunk may be shorter than `frames_per_chunk`.
pub fn read_wav_chunks<R>(reader: R, frames_per_chunk: usize) -> Result<Vec<AudioChunk>>
where
    R: Read + Seek,
{
    if frames_per_chunk == 0 {
        return Err(Error::invalid_input("chunk size must be at least one frame"));
    }

    let mut reader = WavReader::new(reader)?;
    let spec = reader.spec();

    if spec.channels != 1 {
        return Err(Error::invalid_input(format!(
            "expected mono WAV (1 channel), got {} channels",
            spec.channels
        )));
    }

    if spec.sample_rate != TARGET_SAMPLE_RATE {
        return Err(Error::invalid_input(format!(
            "expected {} Hz sample rate, got {} Hz",
            TARGET_SAMPLE_RATE, spec.sample_rate
        )));
    }

    if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(Error::invalid_input(format!(
            "expected 16-bit integer PCM, got {}-bit {:?}",
            spec.bits_per_sample, spec.sample_format
        )));
    }

    let mut chunks = Vec::new();
    let mut current = Vec::with_capacity(frames_per_chunk);
    for sample in reader.samples::<i16>() {
        current.push(sample?);
        if current.len() == frames_per_chunk {
            chunks.push(AudioChunk::new(std::mem::replace(
                &mut current,
                Vec::with_capacity(frames_per_chunk),
            )));
        }
    }

    if !current.is_empty() {
        chunks.push(AudioChunk::new(current));
    }

    Ok(chunks)
}
