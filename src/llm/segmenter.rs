//! Incremental sentence segmentation of a token stream.
//!
//! [`SentenceSegmenter`] wraps any token iterator and yields complete,
//! trimmed sentences as soon as a boundary (`. ! ? ;`, their full-width
//! forms, or a newline) shows up in its buffer.  Reasoning blocks
//! (`<think>…</think>`) are held back until closed and then discarded; an
//! unclosed block at the end of the stream is dropped.
//!
//! Iteration is pull-based: dropping the segmenter stops consuming tokens.

use std::collections::VecDeque;
use std::sync::LazyLock;

use regex::Regex;

/// Opening delimiter of a reasoning block.
pub const THINK_OPEN: &str = "<think>";
/// Closing delimiter of a reasoning block.
pub const THINK_CLOSE: &str = "</think>";

static THINK_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("static regex"));

static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?;。！？；]\s*|\n").expect("static regex"));

/// Remove every complete reasoning block from `text` and trim the result.
pub fn strip_reasoning(text: &str) -> String {
    THINK_BLOCK.replace_all(text, "").trim().to_string()
}

// ---------------------------------------------------------------------------
// SentenceSegmenter
// ---------------------------------------------------------------------------

/// Lazy sentence iterator over a generation token stream.
///
/// # Example
/// ```rust
/// use robot_voice::llm::SentenceSegmenter;
///
/// let tokens = ["<think>", "hmm", "</think>", "Hola", ".", " Adiós"];
/// let sentences: Vec<String> = SentenceSegmenter::new(tokens).collect();
/// assert_eq!(sentences, vec!["Hola.", "Adiós"]);
/// ```
pub struct SentenceSegmenter<I> {
    tokens: I,
    buffer: String,
    ready: VecDeque<String>,
    suppressed: bool,
    finished: bool,
}

impl<I, S> SentenceSegmenter<I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    pub fn new(tokens: impl IntoIterator<IntoIter = I, Item = S>) -> Self {
        Self {
            tokens: tokens.into_iter(),
            buffer: String::new(),
            ready: VecDeque::new(),
            suppressed: false,
            finished: false,
        }
    }

    fn push_token(&mut self, token: &str) {
        self.buffer.push_str(token);

        if self.suppressed || self.buffer.contains(THINK_OPEN) {
            if self.buffer.contains(THINK_CLOSE) {
                self.buffer = THINK_BLOCK.replace_all(&self.buffer, "").into_owned();
            }
            match self.buffer.find(THINK_OPEN) {
                // Text ahead of an open block is still speakable.
                Some(open) => {
                    let held = self.buffer.split_off(open);
                    self.drain_sentences();
                    self.buffer.push_str(&held);
                    self.suppressed = true;
                    return;
                }
                None => self.suppressed = false,
            }
        }

        self.drain_sentences();
    }

    fn drain_sentences(&mut self) {
        while let Some(boundary) = SENTENCE_END.find(&self.buffer) {
            let end = boundary.end();
            let sentence = self.buffer[..end].trim().to_string();
            self.buffer.drain(..end);
            if !sentence.is_empty() {
                self.ready.push_back(sentence);
            }
        }
    }

    fn finish(&mut self) {
        self.finished = true;
        if self.suppressed {
            log::debug!(
                "segmenter: stream ended inside a reasoning block, dropping {} bytes",
                self.buffer.len()
            );
            self.buffer.clear();
            return;
        }
        let rest = self.buffer.trim();
        if !rest.is_empty() {
            self.ready.push_back(rest.to_string());
        }
        self.buffer.clear();
    }
}

impl<I, S> Iterator for SentenceSegmenter<I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            if let Some(sentence) = self.ready.pop_front() {
                return Some(sentence);
            }
            if self.finished {
                return None;
            }
            match self.tokens.next() {
                Some(token) => {
                    let token = token.as_ref();
                    if !token.is_empty() {
                        self.push_token(token);
                    }
                }
                None => self.finish(),
            }
        }
    }
}

/// Shorthand for [`SentenceSegmenter::new`].
pub fn segment<T, S>(tokens: T) -> SentenceSegmenter<T::IntoIter>
where
    T: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    SentenceSegmenter::new(tokens)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(tokens: &[&str]) -> Vec<String> {
        super::segment(tokens.iter().copied()).collect()
    }

    /// Split a string into single-character tokens.
    fn chars(text: &str) -> Vec<String> {
        text.chars().map(|c| c.to_string()).collect()
    }

    #[test]
    fn two_sentences_in_order() {
        assert_eq!(segment(&["Ho", "la", ".", " Adi", "ós"]), vec!["Hola.", "Adiós"]);
    }

    #[test]
    fn char_by_char_feed() {
        let out: Vec<String> = SentenceSegmenter::new(chars("Hola. Adiós")).collect();
        assert_eq!(out, vec!["Hola.", "Adiós"]);
    }

    #[test]
    fn reasoning_block_is_removed() {
        let out: Vec<String> =
            SentenceSegmenter::new(chars("<think>ignore this</think>Hola.")).collect();
        assert_eq!(out, vec!["Hola."]);
    }

    #[test]
    fn reasoning_with_punctuation_never_leaks() {
        let out = segment(&["<think>", "Paso uno. Paso dos!", "\n", "</think>", "Vale."]);
        assert_eq!(out, vec!["Vale."]);
    }

    #[test]
    fn reasoning_only_stream_yields_nothing() {
        assert!(segment(&["<think>", "solo pienso.", "</think>"]).is_empty());
        assert!(segment(&["<think>", "sin cerrar. nunca"]).is_empty());
    }

    #[test]
    fn unterminated_block_after_text_drops_only_the_block() {
        assert_eq!(segment(&["Hola. ", "<think>", "a medias"]), vec!["Hola."]);
    }

    #[test]
    fn text_between_blocks_survives_an_unclosed_second_block() {
        assert_eq!(segment(&["<think>a</think>Hola.<think>b"]), vec!["Hola."]);
        assert_eq!(segment(&["Hola.<think>b", "</think> Adiós."]), vec!["Hola.", "Adiós."]);
    }

    #[test]
    fn stream_without_boundary_flushes_trimmed_text() {
        assert_eq!(segment(&["  Hola", " amigo  "]), vec!["Hola amigo"]);
    }

    #[test]
    fn newline_and_semicolon_are_boundaries() {
        assert_eq!(
            segment(&["uno\ndos; tres"]),
            vec!["uno", "dos;", "tres"]
        );
    }

    #[test]
    fn full_width_marks_are_boundaries() {
        assert_eq!(segment(&["一。", "二！"]), vec!["一。", "二！"]);
    }

    #[test]
    fn empty_tokens_and_blank_lines_are_skipped() {
        assert_eq!(segment(&["", "\n", "\n", "Hola", "", "?"]), vec!["Hola?"]);
    }

    #[test]
    fn one_token_holding_several_sentences() {
        assert_eq!(
            segment(&["Uno. Dos! Tres"]),
            vec!["Uno.", "Dos!", "Tres"]
        );
    }

    #[test]
    fn stops_pulling_when_dropped() {
        let mut pulled = 0;
        let tokens = ["A.", " B.", " C."].into_iter().inspect(|_| pulled += 1);
        let first: Vec<String> = SentenceSegmenter::new(tokens).take(1).collect();
        assert_eq!(first, vec!["A."]);
        assert_eq!(pulled, 1);
    }

    #[test]
    fn strip_reasoning_removes_blocks() {
        assert_eq!(
            strip_reasoning("<think>\nplan\n</think>\n{\"actions\": []}"),
            "{\"actions\": []}"
        );
    }
}
