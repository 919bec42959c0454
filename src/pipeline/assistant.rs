//! Conversational assistant: speech in, synthesized speech out.
//!
//! The reply is generated as a token stream, cut into sentences by
//! [`SentenceSegmenter`] and each sentence is synthesized while the model is
//! still producing the next one.
//!
//! * [`chat`](AssistantPipeline::chat) — one WAV with the whole reply.
//! * [`chat_stream`](AssistantPipeline::chat_stream) — one framed WAV per
//!   sentence over a channel, then the end marker.
//! * [`chat_text`](AssistantPipeline::chat_text) — text only.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::sync::mpsc;

use crate::llm::{ConversationHistory, GenerationEngine, SentenceSegmenter};
use crate::stt::SpeechRecognizer;
use crate::tts::{encode_chunk, end_marker, pcm_to_wav, SpeechSynthesizer};

use super::gate::EngineGate;
use super::runner::{round_secs, transcribe, PipelineError};

/// Frames buffered ahead of a slow consumer.
const STREAM_BUFFER: usize = 4;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChatTiming {
    pub asr_seconds: f64,
    pub llm_tts_seconds: f64,
    pub total_seconds: f64,
}

/// Spoken reply assembled into a single WAV.
#[derive(Debug, Clone)]
pub struct ChatAudio {
    pub transcription: String,
    pub response_text: String,
    /// 16-bit mono WAV at the voice's sample rate.
    pub wav: Vec<u8>,
    pub timing: ChatTiming,
}

/// Text-only reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatText {
    pub transcription: String,
    pub response: String,
}

/// Streamed reply: framed WAV chunks, terminated by the end marker.
///
/// Dropping `chunks` abandons the stream; generation stops at the next
/// sentence.
pub struct ChatStream {
    pub transcription: String,
    pub chunks: mpsc::Receiver<Vec<u8>>,
}

// ---------------------------------------------------------------------------
// AssistantPipeline
// ---------------------------------------------------------------------------

pub struct AssistantPipeline {
    stt: Arc<dyn SpeechRecognizer>,
    llm: Arc<dyn GenerationEngine>,
    tts: Arc<dyn SpeechSynthesizer>,
    gate: EngineGate,
    history: Arc<ConversationHistory>,
}

impl AssistantPipeline {
    pub fn new(
        stt: Arc<dyn SpeechRecognizer>,
        llm: Arc<dyn GenerationEngine>,
        tts: Arc<dyn SpeechSynthesizer>,
        gate: EngineGate,
        history: Arc<ConversationHistory>,
    ) -> Self {
        Self {
            stt,
            llm,
            tts,
            gate,
            history,
        }
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Transcribe `wav`, then speak the reply as one WAV.
    pub async fn chat(&self, wav: Vec<u8>) -> Result<ChatAudio, PipelineError> {
        let started = Instant::now();
        let text = transcribe(&self.stt, wav).await?;
        let asr_secs = started.elapsed().as_secs_f64();
        log::info!("[assistant] ASR ({asr_secs:.2}s): {text}");

        let messages = self.history.get_messages(&text);
        let llm = Arc::clone(&self.llm);
        let tts = Arc::clone(&self.tts);
        let generation_started = Instant::now();

        let (pcm_chunks, response_text) = self
            .gate
            .run_blocking(move || -> Result<(Vec<Vec<u8>>, String), PipelineError> {
                let tokens = llm.generate_stream(&messages)?;
                let mut pcm_chunks = Vec::new();
                let mut parts = Vec::new();
                for sentence in SentenceSegmenter::new(tokens) {
                    log::debug!("[assistant] sentence: {sentence}");
                    pcm_chunks.push(tts.synthesize(&sentence)?);
                    parts.push(sentence);
                }
                Ok((pcm_chunks, parts.join(" ")))
            })
            .await??;
        let llm_tts_secs = generation_started.elapsed().as_secs_f64();

        log::info!(
            "[assistant] LLM+TTS ({llm_tts_secs:.2}s): {}",
            response_text.chars().take(120).collect::<String>()
        );
        self.history.add_exchange(&text, &response_text);

        let wav = pcm_to_wav(&pcm_chunks, self.tts.sample_rate())?;
        let total_secs = started.elapsed().as_secs_f64();
        log::info!("[assistant] total: {total_secs:.2}s");

        Ok(ChatAudio {
            transcription: text,
            response_text,
            wav,
            timing: ChatTiming {
                asr_seconds: round_secs(asr_secs, 2),
                llm_tts_seconds: round_secs(llm_tts_secs, 2),
                total_seconds: round_secs(total_secs, 2),
            },
        })
    }

    /// Transcribe `wav`, then stream the reply sentence by sentence.
    ///
    /// Transcription errors are returned directly.  Once the stream has
    /// started, a failure ends it without the end marker; the history is
    /// only updated after the end marker was delivered.
    pub async fn chat_stream(&self, wav: Vec<u8>) -> Result<ChatStream, PipelineError> {
        let text = transcribe(&self.stt, wav).await?;
        log::info!("[stream] ASR: {text}");

        let messages = self.history.get_messages(&text);
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);

        let gate = self.gate.clone();
        let llm = Arc::clone(&self.llm);
        let tts = Arc::clone(&self.tts);
        let history = Arc::clone(&self.history);
        let user_text = text.clone();

        tokio::spawn(async move {
            let guard = gate.acquire().await;
            let job = tokio::task::spawn_blocking(move || {
                let _guard = guard;
                stream_reply(&*llm, &*tts, &messages, &tx).map(|reply| {
                    if let Some(reply) = reply {
                        history.add_exchange(&user_text, &reply);
                    }
                })
            });
            match job.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => log::error!("[stream] generation failed: {e}"),
                Err(e) => log::error!("[stream] generation task failed: {e}"),
            }
        });

        Ok(ChatStream {
            transcription: text,
            chunks: rx,
        })
    }

    /// Transcribe `wav` and return the reply as text.
    pub async fn chat_text(&self, wav: Vec<u8>) -> Result<ChatText, PipelineError> {
        let text = transcribe(&self.stt, wav).await?;
        let response = self.reply(&text).await?;
        Ok(ChatText {
            transcription: text,
            response,
        })
    }

    /// Generate a text reply to an already transcribed utterance.
    pub async fn reply(&self, text: &str) -> Result<String, PipelineError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(PipelineError::NoSpeech);
        }

        let messages = self.history.get_messages(text);
        let llm = Arc::clone(&self.llm);
        let response = self
            .gate
            .run_blocking(move || llm.generate_blocking(&messages, false))
            .await??;

        self.history.add_exchange(text, &response);
        Ok(response)
    }

    /// Clear this pipeline's conversation history.
    pub fn reset(&self) {
        self.history.clear();
        log::info!("[assistant] history cleared");
    }
}

/// Generate, segment, synthesize and send framed WAV chunks.
///
/// Returns the full reply text once the end marker is sent, or `None` when
/// the receiver went away first.
fn stream_reply(
    llm: &dyn GenerationEngine,
    tts: &dyn SpeechSynthesizer,
    messages: &[crate::llm::ChatMessage],
    tx: &mpsc::Sender<Vec<u8>>,
) -> Result<Option<String>, PipelineError> {
    let tokens = llm.generate_stream(messages)?;
    let mut parts = Vec::new();

    for sentence in SentenceSegmenter::new(tokens) {
        let pcm = tts.synthesize(&sentence)?;
        let wav = pcm_to_wav(&[pcm], tts.sample_rate())?;
        if tx.blocking_send(encode_chunk(&wav)).is_err() {
            log::info!("[stream] client went away, stopping generation");
            return Ok(None);
        }
        log::debug!("[stream] sent sentence: {sentence}");
        parts.push(sentence);
    }

    if tx.blocking_send(end_marker()).is_err() {
        return Ok(None);
    }
    Ok(Some(parts.join(" ")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
