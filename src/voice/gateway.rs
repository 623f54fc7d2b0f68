use std::sync::Arc;

use serde::Deserialize;
use tracing::{error, info};

use crate::config::VoiceConfig;

use super::{SpeechModel, Voice, VoiceError, encode_wav};

/// Body of `POST /tts`.
#[derive(Debug, Clone, Deserialize)]
pub struct SpeechRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub speaker: Option<String>,
    #[serde(default)]
    pub speaker_id: Option<String>,
}

/// Both loaded models.
#[derive(Debug, Clone)]
pub struct Voices {
    james: SpeechModel,
    julia: SpeechModel,
}

impl Voices {
    pub fn new(james: SpeechModel, julia: SpeechModel) -> Self {
        Self { james, julia }
    }

    pub async fn load(config: &VoiceConfig) -> Result<Self, VoiceError> {
        let james = SpeechModel::load(Voice::James, &config.james).await?;
        let julia = SpeechModel::load(Voice::Julia, &config.julia).await?;
        Ok(Self { james, julia })
    }

    pub fn get(&self, voice: Voice) -> &SpeechModel {
        match voice {
            Voice::James => &self.james,
            Voice::Julia => &self.julia,
        }
    }
}

/// Synthesis entry point shared by the sidecar handlers.
///
/// Holds either the loaded models or the reason they failed to load; in the
/// latter case every request is answered with `ServiceUnavailable`.
#[derive(Debug, Clone)]
pub struct VoiceGateway {
    voices: Arc<Result<Voices, String>>,
}

impl VoiceGateway {
    pub fn ready(voices: Voices) -> Self {
        Self { voices: Arc::new(Ok(voices)) }
    }

    pub fn unavailable(detail: impl Into<String>) -> Self {
        Self { voices: Arc::new(Err(detail.into())) }
    }

    /// Load both models; a failure is kept and reported per request.
    pub async fn load(config: &VoiceConfig) -> Self {
        match Voices::load(config).await {
            Ok(voices) => {
                info!("speech models ready");
                Self::ready(voices)
            }
            Err(e) => {
                error!(error = %e, "speech models failed to load");
                Self::unavailable(e.to_string())
            }
        }
    }

    fn voices(&self) -> Result<&Voices, VoiceError> {
        match &*self.voices {
            Ok(voices) => Ok(voices),
            Err(detail) => Err(VoiceError::ServiceUnavailable(detail.clone())),
        }
    }

    pub fn status(&self) -> Result<(), VoiceError> {
        self.voices().map(|_| ())
    }

    /// Synthesize the request and return a WAV body.
    pub async fn synthesize(&self, req: &SpeechRequest) -> Result<Vec<u8>, VoiceError> {
        let voices = self.voices()?;
        let text = req.text.trim();
        if text.is_empty() {
            return Err(VoiceError::Synthesis("text is empty".into()));
        }

        let voice = Voice::parse(req.speaker.as_deref());
        // Only James is a multi-speaker model.
        let speaker_id = match voice {
            Voice::James => req.speaker_id.as_deref().filter(|s| !s.trim().is_empty()),
            Voice::Julia => None,
        };

        let audio = voices.get(voice).synthesize(text, speaker_id).await?;
        info!(%voice, samples = audio.samples.len(), sample_rate = audio.sample_rate, "synthesized");
        encode_wav(&audio)
    }
}
