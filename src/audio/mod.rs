//! Audio codec utilities.
//!
//! Converts the base64 PCM payloads returned by the speech API into
//! sample buffers and playable WAV files. Everything here is pure and
//! synchronous.

mod codec;

pub use codec::{
    DecodeError, GEMINI_CHANNELS, GEMINI_SAMPLE_RATE, SampleBuffer, WAV_HEADER_LEN,
    decode_base64, decode_pcm, encode_wav,
};
