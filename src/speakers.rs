use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use tracing::info;

use crate::tts::TtsClient;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Speaker {
    pub speaker_name: String,
    pub speaker_uuid: String,
    pub styles: Vec<Style>,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    pub style_name: String,
    pub style_id: i64,
}

/// Fetches the speaker catalog, keeping only the fields needed to write scenarios.
pub async fn fetch_speakers(client: &TtsClient) -> anyhow::Result<Vec<Speaker>> {
    let url = format!("{}/v1/speakers", client.server());
    let res = client
        .http()
        .get(&url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let speakers: Vec<Speaker> = serde_json::from_str(&res)?;
    info!("Fetched {} speakers from {}", speakers.len(), url);
    Ok(speakers)
}

/// Writes the catalog as 4-space indented JSON with non-ASCII names kept as-is.
pub fn save_speakers(path: &Path, speakers: &[Speaker]) -> anyhow::Result<()> {
    let mut data = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut data, formatter);
    speakers.serialize(&mut ser)?;
    fs::write(path, data)?;
    info!("Wrote speaker catalog to {}", path.display());
    Ok(())
}
