//! Capability seam for speech-to-text input.
//!
//! Dictation is platform-specific and optional, so the core only sees this
//! trait: a capability check plus a finite stream of transcript strings for
//! one utterance. A `listen` stream is not restartable mid-utterance; start
//! a new one per utterance.

use futures_util::stream::{self, BoxStream, StreamExt};

pub trait SpeechRecognizer: Send {
    fn available(&self) -> bool;

    fn listen(&mut self) -> BoxStream<'static, String>;
}

/// The default on platforms without a dictation backend.
#[derive(Debug, Default)]
pub struct UnavailableRecognizer;

impl SpeechRecognizer for UnavailableRecognizer {
    fn available(&self) -> bool {
        false
    }

    fn listen(&mut self) -> BoxStream<'static, String> {
        stream::empty().boxed()
    }
}
