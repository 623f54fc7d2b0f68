//! Speech synthesis gateway for the `james-voice` sidecar.
//!
//! Two voices, each backed by one [`SpeechModel`] loaded at startup. A
//! request names a voice by selector; unknown selectors fall back to James.
//! Output is always 16-bit PCM WAV at the model's native sample rate.

mod gateway;
mod model;
pub mod sidecar;
mod wav;

pub use gateway::{SpeechRequest, VoiceGateway, Voices};
pub use model::{Audio, HttpSpeech, SpeechModel, ToneSpeech};
pub use wav::{decode_wav, encode_wav};

use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VoiceError {
    /// Models failed to load at startup; every request gets this.
    #[error("speech models unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("cannot load {voice} model: {detail}")]
    Load { voice: Voice, detail: String },

    #[error("synthesis failed: {0}")]
    Synthesis(String),

    #[error("wav encoding failed: {0}")]
    Encode(#[from] hound::Error),
}

/// The two voices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Voice {
    #[default]
    James,
    Julia,
}

impl Voice {
    pub const ALL: [Voice; 2] = [Voice::James, Voice::Julia];

    /// Case-insensitive selector. Anything other than `julia`, including
    /// `None`, selects James.
    pub fn parse(selector: Option<&str>) -> Self {
        match selector.map(|s| s.trim().to_ascii_lowercase()) {
            Some(s) if s == "julia" => Voice::Julia,
            _ => Voice::James,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Voice::James => "james",
            Voice::Julia => "julia",
        }
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
