//! Text-to-speech: synthesizer backends, WAV assembly and stream framing.
//!
//! ```text
//! sentence ──▶ SpeechSynthesizer ──▶ raw PCM ──▶ pcm_to_wav ──▶ WAV
//!                                                    │
//!                                   chat_stream ─────┴──▶ encode_chunk
//! ```

pub mod engine;
pub mod framing;
pub mod wav;

pub use engine::{ApiSynthesizer, SpeechSynthesizer, TtsError};
pub use framing::{decode_stream, encode_chunk, end_marker, frame_payload, END_MARKER};
pub use wav::{pcm_to_wav, AudioError};

#[cfg(test)]
pub use engine::MockSynthesizer;
