use std::f32::consts::TAU;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info};

use crate::config::{VoiceBackendConfig, VoiceModelConfig};

use super::{Voice, VoiceError, decode_wav};

const HTTP_TIMEOUT: Duration = Duration::from_secs(60);
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Mono samples in `[-1.0, 1.0]` at a fixed rate.
#[derive(Debug, Clone, PartialEq)]
pub struct Audio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// A loaded speech model.
#[derive(Debug, Clone)]
pub enum SpeechModel {
    Http(HttpSpeech),
    Tone(ToneSpeech),
}

impl SpeechModel {
    /// Load the model configured for `voice`. HTTP backends are probed once.
    pub async fn load(voice: Voice, config: &VoiceModelConfig) -> Result<Self, VoiceError> {
        let model = match &config.backend {
            VoiceBackendConfig::Http { url } => {
                let speech = HttpSpeech::new(url.clone(), config.speaker_id.clone())
                    .map_err(|detail| VoiceError::Load { voice, detail })?;
                speech
                    .probe()
                    .await
                    .map_err(|detail| VoiceError::Load { voice, detail })?;
                SpeechModel::Http(speech)
            }
            VoiceBackendConfig::Tone { sample_rate } => {
                SpeechModel::Tone(ToneSpeech::new(voice, *sample_rate))
            }
        };
        info!(%voice, backend = model.backend_name(), "speech model loaded");
        Ok(model)
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            SpeechModel::Http(_) => "http",
            SpeechModel::Tone(_) => "tone",
        }
    }

    /// Synthesize `text`. `speaker_id` overrides the configured default on
    /// multi-speaker models and is ignored otherwise.
    pub async fn synthesize(&self, text: &str, speaker_id: Option<&str>) -> Result<Audio, VoiceError> {
        match self {
            SpeechModel::Http(m) => m.synthesize(text, speaker_id).await,
            SpeechModel::Tone(m) => Ok(m.synthesize(text)),
        }
    }
}

// ── HTTP backend ──────────────────────────────────────────────────────────────

/// Coqui-compatible TTS server: `GET {url}/api/tts?text=..&speaker_id=..`
/// answers with a WAV body.
#[derive(Debug, Clone)]
pub struct HttpSpeech {
    client: Client,
    url: String,
    speaker_id: Option<String>,
}

impl HttpSpeech {
    pub fn new(url: String, speaker_id: Option<String>) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| format!("failed to build HTTP client: {e}"))?;
        Ok(Self { client, url: url.trim_end_matches('/').to_string(), speaker_id })
    }

    async fn probe(&self) -> Result<(), String> {
        self.client
            .get(&self.url)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
            .map(|_| ())
            .map_err(|e| format!("{} unreachable: {e}", self.url))
    }

    async fn synthesize(&self, text: &str, speaker_id: Option<&str>) -> Result<Audio, VoiceError> {
        let mut query = vec![("text", text)];
        if let Some(id) = speaker_id.or(self.speaker_id.as_deref()) {
            query.push(("speaker_id", id));
        }
        debug!(url = %self.url, chars = text.len(), "requesting speech");

        let response = self
            .client
            .get(format!("{}/api/tts", self.url))
            .query(&query)
            .send()
            .await
            .map_err(|e| VoiceError::Synthesis(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VoiceError::Synthesis(format!("HTTP {status}: {body}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| VoiceError::Synthesis(e.to_string()))?;
        decode_wav(&bytes).map_err(|e| VoiceError::Synthesis(e.to_string()))
    }
}

// ── Offline tone backend ──────────────────────────────────────────────────────

const MILLIS_PER_CHAR: usize = 60;
const MAX_SECONDS: usize = 30;
const AMPLITUDE: f32 = 0.3;

/// Offline stand-in: one short tone per character, pitched per voice.
#[derive(Debug, Clone)]
pub struct ToneSpeech {
    sample_rate: u32,
    pitch_hz: f32,
}

impl ToneSpeech {
    pub fn new(voice: Voice, sample_rate: u32) -> Self {
        let pitch_hz = match voice {
            Voice::James => 110.0,
            Voice::Julia => 220.0,
        };
        Self { sample_rate, pitch_hz }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn synthesize(&self, text: &str) -> Audio {
        let rate = self.sample_rate as f32;
        let per_char = (self.sample_rate as usize * MILLIS_PER_CHAR / 1000).max(1);
        let max_samples = MAX_SECONDS * self.sample_rate as usize;

        let mut samples = Vec::new();
        for c in text.chars() {
            if samples.len() >= max_samples {
                break;
            }
            if c.is_whitespace() {
                samples.extend(std::iter::repeat_n(0.0, per_char));
                continue;
            }
            // Vary pitch a little per character so words are audible.
            let freq = self.pitch_hz * (1.0 + (u32::from(c) % 12) as f32 / 24.0);
            samples.extend((0..per_char).map(|i| AMPLITUDE * (TAU * freq * i as f32 / rate).sin()));
        }
        samples.truncate(max_samples);
        Audio { samples, sample_rate: self.sample_rate }
    }
}
