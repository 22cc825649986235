use serde::Serialize;
use tracing::{debug, error};

use crate::error::SynthesisError;
use crate::session::{SynthesisParameters, Voice};

pub const DEFAULT_SERVER: &str = "http://127.0.0.1:50032";

/// Turns one utterance into encoded audio bytes.
#[allow(async_fn_in_trait)]
pub trait Synthesizer {
    async fn synthesize(
        &self,
        text: &str,
        voice: &Voice,
        params: &SynthesisParameters,
    ) -> Result<Vec<u8>, SynthesisError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesisRequest<'a> {
    speaker_uuid: &'a str,
    style_id: i64,
    text: &'a str,
    #[serde(flatten)]
    params: &'a SynthesisParameters,
}

/// HTTP client for a COEIROINK-compatible synthesis server.
#[derive(Debug, Clone)]
pub struct TtsClient {
    client: reqwest::Client,
    server: String,
}

impl TtsClient {
    pub fn new(server: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            server: server.trim_end_matches('/').to_string(),
        }
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.client
    }
}

impl Synthesizer for TtsClient {
    async fn synthesize(
        &self,
        text: &str,
        voice: &Voice,
        params: &SynthesisParameters,
    ) -> Result<Vec<u8>, SynthesisError> {
        let url = format!("{}/v1/synthesis", self.server);
        let body = SynthesisRequest {
            speaker_uuid: &voice.speaker_uuid,
            style_id: voice.style_id,
            text,
            params,
        };
        debug!(
            "POST {} speaker={} style={} ({} chars)",
            url,
            voice.speaker_uuid,
            voice.style_id,
            text.chars().count()
        );

        let res = self.client.post(&url).json(&body).send().await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            error!("Synthesis failed with {}: {}", status, body);
            return Err(SynthesisError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let audio = res.bytes().await?;
        debug!("Received {} bytes of audio", audio.len());
        Ok(audio.to_vec())
    }
}
