//! Conversion between base64 text, raw 16-bit PCM and WAV containers.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

/// Sample rate of the PCM audio returned by the Gemini speech models.
pub const GEMINI_SAMPLE_RATE: u32 = 24_000;

/// Channel count of the PCM audio returned by the Gemini speech models.
pub const GEMINI_CHANNELS: u16 = 1;

const BYTES_PER_SAMPLE: usize = 2;
const BITS_PER_SAMPLE: u16 = 16;
const PCM_SCALE: f32 = 32768.0;

/// Size of the RIFF/fmt/data header written by [`encode_wav`].
pub const WAV_HEADER_LEN: usize = 44;

// WAVE_FORMAT_PCM
const PCM_FORMAT_CODE: u16 = 1;

/// Errors that can occur while decoding or encoding audio.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Invalid base64 audio payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Invalid audio format: {0}")]
    InvalidFormat(String),
}

/// Decoded, de-interleaved audio samples normalized to `[-1.0, 1.0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl SampleBuffer {
    /// Build a buffer from per-channel sample sequences.
    ///
    /// Every channel must hold the same number of frames.
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self, DecodeError> {
        check_format(sample_rate, channels.len())?;

        let frames = channels[0].len();
        if channels.iter().any(|c| c.len() != frames) {
            return Err(DecodeError::InvalidFormat(
                "Channels have different lengths".to_string(),
            ));
        }

        Ok(Self {
            sample_rate,
            channels,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of channels.
    pub fn channels(&self) -> u16 {
        // bounded by check_format
        self.channels.len() as u16
    }

    /// Number of samples per channel.
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Samples of a single channel.
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// Playback length in seconds.
    pub fn duration_secs(&self) -> f32 {
        self.frames() as f32 / self.sample_rate as f32
    }
}

fn check_format(sample_rate: u32, channels: usize) -> Result<(), DecodeError> {
    if sample_rate == 0 {
        return Err(DecodeError::InvalidFormat(
            "Sample rate must be positive".to_string(),
        ));
    }

    if channels == 0 || channels > usize::from(u16::MAX) {
        return Err(DecodeError::InvalidFormat(format!(
            "Unsupported channel count: {channels}"
        )));
    }

    Ok(())
}

/// Decode standard (padded) base64 text into raw bytes.
pub fn decode_base64(text: &str) -> Result<Vec<u8>, DecodeError> {
    Ok(STANDARD.decode(text)?)
}

/// Interpret `bytes` as interleaved signed 16-bit little-endian PCM.
///
/// Each channel receives `len / 2 / channels` samples; trailing bytes that do
/// not complete a frame are dropped. No resampling happens, `sample_rate` is
/// only recorded on the result.
pub fn decode_pcm(bytes: &[u8], sample_rate: u32, channels: u16) -> Result<SampleBuffer, DecodeError> {
    let channel_count = usize::from(channels);
    check_format(sample_rate, channel_count)?;

    let frame_len = channel_count * BYTES_PER_SAMPLE;
    let frames = bytes.len() / frame_len;
    let mut data = vec![Vec::with_capacity(frames); channel_count];

    for frame in bytes.chunks_exact(frame_len) {
        for (channel, sample) in data.iter_mut().zip(frame.chunks_exact(BYTES_PER_SAMPLE)) {
            let value = i16::from_le_bytes([sample[0], sample[1]]);
            channel.push(f32::from(value) / PCM_SCALE);
        }
    }

    Ok(SampleBuffer {
        sample_rate,
        channels: data,
    })
}

/// Serialize a sample buffer as an uncompressed 16-bit PCM WAV file.
///
/// The header is always the plain 44-byte `RIFF`/`fmt `/`data` layout with
/// format code 1, whatever the channel count.
pub fn encode_wav(buffer: &SampleBuffer) -> Result<Vec<u8>, DecodeError> {
    let channels = buffer.channels();
    let block_align = channels
        .checked_mul(BYTES_PER_SAMPLE as u16)
        .ok_or_else(|| too_large("block align"))?;
    let byte_rate = buffer
        .sample_rate
        .checked_mul(u32::from(block_align))
        .ok_or_else(|| too_large("byte rate"))?;
    let data_len = u32::try_from(buffer.frames() as u64 * u64::from(block_align))
        .ok()
        .filter(|len| *len <= u32::MAX - (WAV_HEADER_LEN as u32 - 8))
        .ok_or_else(|| too_large("data chunk"))?;

    let mut wav = Vec::with_capacity(WAV_HEADER_LEN + data_len as usize);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(WAV_HEADER_LEN as u32 - 8 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&PCM_FORMAT_CODE.to_le_bytes());
    wav.extend_from_slice(&channels.to_le_bytes());
    wav.extend_from_slice(&buffer.sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    for frame in 0..buffer.frames() {
        for channel in &buffer.channels {
            wav.extend_from_slice(&to_pcm16(channel[frame]).to_le_bytes());
        }
    }

    Ok(wav)
}

fn too_large(field: &str) -> DecodeError {
    DecodeError::InvalidFormat(format!("Audio too large for a WAV {field}"))
}

fn to_pcm16(sample: f32) -> i16 {
    (sample * PCM_SCALE)
        .round()
        .clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16
}
