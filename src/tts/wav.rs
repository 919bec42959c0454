//! WAV assembly of raw synthesizer output.
//!
//! Synthesizers return headerless 16-bit little-endian mono PCM.  Clients
//! expect self-describing audio, so every chunk (or the concatenation of a
//! whole reply) is wrapped in a WAV container with `hound`.

use std::io::Cursor;

use thiserror::Error;

/// Errors from WAV encoding.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("failed to encode wav: {0}")]
    Wav(#[from] hound::Error),
}

/// Wrap PCM chunks in one 16-bit mono WAV file at `sample_rate`.
///
/// Chunks are concatenated in order.  A dangling odd byte at the very end is
/// dropped; an empty input yields a valid, empty WAV.
pub fn pcm_to_wav<C>(chunks: &[C], sample_rate: u32) -> Result<Vec<u8>, AudioError>
where
    C: AsRef<[u8]>,
{
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let total: usize = chunks.iter().map(|c| c.as_ref().len()).sum();
    let mut out = Vec::with_capacity(total + 44);
    {
        let mut writer = hound::WavWriter::new(Cursor::new(&mut out), spec)?;
        let mut carry: Option<u8> = None;

        for chunk in chunks {
            let mut bytes = chunk.as_ref();
            if let Some(low) = carry.take() {
                if let Some((&high, rest)) = bytes.split_first() {
                    writer.write_sample(i16::from_le_bytes([low, high]))?;
                    bytes = rest;
                } else {
                    carry = Some(low);
                    continue;
                }
            }
            let mut pairs = bytes.chunks_exact(2);
            for pair in &mut pairs {
                writer.write_sample(i16::from_le_bytes([pair[0], pair[1]]))?;
            }
            carry = pairs.remainder().first().copied();
        }

        if carry.is_some() {
            log::debug!("wav: dropping trailing odd PCM byte");
        }
        writer.finalize()?;
    }
    Ok(out)
}
