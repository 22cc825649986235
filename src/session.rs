use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::debug;

use crate::error::DirectiveError;

/// Where a synthesized utterance sits in the stereo field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StereoPosition {
    Left,
    #[default]
    Center,
    Right,
}

impl StereoPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            StereoPosition::Left => "left",
            StereoPosition::Center => "center",
            StereoPosition::Right => "right",
        }
    }

    /// (left, right) gains applied to the source's first channel.
    pub fn gains(&self) -> (f64, f64) {
        match self {
            StereoPosition::Left => (2.0, 0.0),
            StereoPosition::Center => (1.0, 1.0),
            StereoPosition::Right => (0.0, 2.0),
        }
    }
}

impl fmt::Display for StereoPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StereoPosition {
    type Err = DirectiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(StereoPosition::Left),
            "center" => Ok(StereoPosition::Center),
            "right" => Ok(StereoPosition::Right),
            other => Err(DirectiveError::UnknownPosition(other.to_string())),
        }
    }
}

/// The controls a `<<scale ...>>` directive may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleControl {
    Speed,
    Volume,
    Pitch,
    Intonation,
}

impl FromStr for ScaleControl {
    type Err = DirectiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "speed" => Ok(ScaleControl::Speed),
            "volume" => Ok(ScaleControl::Volume),
            "pitch" => Ok(ScaleControl::Pitch),
            "intonation" => Ok(ScaleControl::Intonation),
            other => Err(DirectiveError::UnknownScale(other.to_string())),
        }
    }
}

/// Voice controls sent with every synthesis request.
///
/// Field names serialize to the service's camelCase keys
/// (`speedScale`, `prePhonemeLength`, ...).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisParameters {
    pub speed_scale: f64,
    pub volume_scale: f64,
    pub prosody_detail: Vec<serde_json::Value>,
    pub pitch_scale: f64,
    pub intonation_scale: f64,
    pub pre_phoneme_length: f64,
    pub post_phoneme_length: f64,
    pub output_sampling_rate: u32,
}

impl Default for SynthesisParameters {
    fn default() -> Self {
        Self {
            speed_scale: 1.0,
            volume_scale: 1.0,
            prosody_detail: Vec::new(),
            pitch_scale: 0.0,
            intonation_scale: 1.0,
            pre_phoneme_length: 0.1,
            post_phoneme_length: 0.5,
            output_sampling_rate: 24000,
        }
    }
}

impl SynthesisParameters {
    pub fn scale_mut(&mut self, control: ScaleControl) -> &mut f64 {
        match control {
            ScaleControl::Speed => &mut self.speed_scale,
            ScaleControl::Volume => &mut self.volume_scale,
            ScaleControl::Pitch => &mut self.pitch_scale,
            ScaleControl::Intonation => &mut self.intonation_scale,
        }
    }
}

/// Speaker identity and style, passed through to the service as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub speaker_uuid: String,
    pub style_id: i64,
}

/// Values a run starts with; `reset` returns here.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionDefaults {
    pub voice: Voice,
    pub position: StereoPosition,
}

/// Mutable synthesis context that every spoken line is generated under.
#[derive(Debug, Clone)]
pub struct SessionState {
    defaults: SessionDefaults,
    voice: Voice,
    position: StereoPosition,
    params: SynthesisParameters,
}

impl SessionState {
    pub fn new(defaults: SessionDefaults) -> Self {
        Self {
            voice: defaults.voice.clone(),
            position: defaults.position,
            params: SynthesisParameters::default(),
            defaults,
        }
    }

    pub fn voice(&self) -> &Voice {
        &self.voice
    }

    pub fn position(&self) -> StereoPosition {
        self.position
    }

    pub fn params(&self) -> &SynthesisParameters {
        &self.params
    }

    pub fn apply_speed(&mut self, speed: f64) {
        debug!("speedScale -> {}", speed);
        self.params.speed_scale = speed;
    }

    pub fn apply_scales(&mut self, pairs: &[(ScaleControl, f64)]) {
        for &(control, value) in pairs {
            debug!("{:?} scale -> {}", control, value);
            *self.params.scale_mut(control) = value;
        }
    }

    pub fn set_speaker(&mut self, speaker_uuid: &str) {
        debug!("speaker -> {}", speaker_uuid);
        self.voice.speaker_uuid = speaker_uuid.to_string();
    }

    pub fn set_style(&mut self, style_id: i64) {
        debug!("style -> {}", style_id);
        self.voice.style_id = style_id;
    }

    pub fn set_position(&mut self, position: StereoPosition) {
        debug!("position -> {}", position);
        self.position = position;
    }

    /// Parameters go back to their built-in defaults; voice and position go
    /// back to what this run was started with.
    pub fn reset(&mut self) {
        debug!("session reset");
        self.params = SynthesisParameters::default();
        self.voice = self.defaults.voice.clone();
        self.position = self.defaults.position;
    }
}
