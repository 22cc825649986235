use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::audio::{self, AudioTool};
use crate::directive::{Directive, parse_line};
use crate::error::{AudioError, ScenarioError};
use crate::session::SessionState;
use crate::tts::Synthesizer;

pub const DEFAULT_SILENCE_ASSET: &str = "assets/silent.wav";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Ended,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub lines_read: usize,
    pub segments: usize,
    pub synthesized: usize,
    pub output_written: bool,
}

/// Interprets a scenario script line by line, growing a single output file.
pub struct ScenarioDriver<'a, S, A> {
    synth: &'a S,
    tool: &'a A,
    session: SessionState,
    output: PathBuf,
    silence: PathBuf,
    state: RunState,
    output_ready: bool,
    summary: RunSummary,
}

impl<'a, S: Synthesizer, A: AudioTool> ScenarioDriver<'a, S, A> {
    pub fn new(
        synth: &'a S,
        tool: &'a A,
        session: SessionState,
        output: impl Into<PathBuf>,
        silence: impl Into<PathBuf>,
    ) -> Self {
        Self {
            synth,
            tool,
            session,
            output: output.into(),
            silence: silence.into(),
            state: RunState::Running,
            output_ready: false,
            summary: RunSummary::default(),
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Runs the script to `<<end>>` or end of input.
    pub async fn run<R: BufRead>(&mut self, reader: R) -> Result<RunSummary, ScenarioError> {
        for (idx, line) in reader.lines().enumerate() {
            if self.state == RunState::Ended {
                break;
            }
            let line = line?;
            self.step(idx + 1, &line).await?;
        }
        self.state = RunState::Ended;

        if !self.output_ready {
            warn!("Scenario produced no audio; {} was not written", self.output.display());
        }
        Ok(self.summary.clone())
    }

    /// Parses and dispatches a single line. A no-op once the run has ended.
    pub async fn step(&mut self, line_no: usize, line: &str) -> Result<(), ScenarioError> {
        if self.state == RunState::Ended {
            return Ok(());
        }
        self.summary.lines_read += 1;

        let directive = parse_line(line).map_err(|source| ScenarioError::Malformed {
            line_no,
            line: line.to_string(),
            source,
        })?;
        debug!("line {}: {:?}", line_no, directive);

        let produces_audio = directive.produces_audio();
        let audio_err = |source| ScenarioError::Audio { line_no, source };
        match directive {
            Directive::End => {
                info!("Reached <<end>> at line {}", line_no);
                self.state = RunState::Ended;
            }
            Directive::Comment => {}
            Directive::InsertSilence => {
                let silence = self.silence.clone();
                self.insert_file(&silence).map_err(audio_err)?;
            }
            Directive::InsertAudio(path) => {
                self.insert_file(&path).map_err(audio_err)?;
            }
            Directive::SetSpeed(v) => self.session.apply_speed(v),
            Directive::SetScales(pairs) => self.session.apply_scales(&pairs),
            Directive::SetSpeaker(id) => self.session.set_speaker(&id),
            Directive::SetStyle(id) => self.session.set_style(id),
            Directive::SetPosition(p) => self.session.set_position(p),
            Directive::Reset => self.session.reset(),
            Directive::Speak(text) => self.speak(line_no, &text).await?,
        }
        if produces_audio {
            self.summary.segments += 1;
        }
        Ok(())
    }

    async fn speak(&mut self, line_no: usize, text: &str) -> Result<(), ScenarioError> {
        info!(
            "Synthesizing line {} as {}/{} ({})",
            line_no,
            self.session.voice().speaker_uuid,
            self.session.voice().style_id,
            self.session.position()
        );
        let bytes = self
            .synth
            .synthesize(text, self.session.voice(), self.session.params())
            .await
            .map_err(|source| ScenarioError::Synthesis { line_no, source })?;
        self.summary.synthesized += 1;

        let audio_err = |source| ScenarioError::Audio { line_no, source };
        let mut segment = audio::staging_file(&self.output)
            .map_err(|e| audio_err(AudioError::Io(e)))?;
        segment
            .write_all(&bytes)
            .and_then(|_| segment.flush())
            .map_err(|e| audio_err(AudioError::Io(e)))?;

        audio::apply_position(self.tool, segment.path(), self.session.position())
            .map_err(audio_err)?;
        log_segment(segment.path());

        if self.output_ready {
            audio::append_audio(self.tool, &self.output, segment.path()).map_err(audio_err)?;
        } else {
            segment
                .persist(&self.output)
                .map_err(|e| audio_err(AudioError::Io(e.error)))?;
            self.output_ready = true;
            self.summary.output_written = true;
        }
        Ok(())
    }

    fn insert_file(&mut self, path: &Path) -> Result<(), AudioError> {
        if !path.exists() {
            return Err(AudioError::MissingAsset(path.to_path_buf()));
        }
        log_segment(path);
        if self.output_ready {
            audio::append_audio(self.tool, &self.output, path)?;
        } else {
            let staged = audio::staging_file(&self.output)?;
            fs::copy(path, staged.path())?;
            staged.persist(&self.output).map_err(|e| AudioError::Io(e.error))?;
            self.output_ready = true;
            self.summary.output_written = true;
        }
        Ok(())
    }
}

fn log_segment(path: &Path) {
    match audio::wav_duration_seconds(path) {
        Ok(dur) => info!("Segment {}: {:.2} seconds", path.display(), dur),
        Err(_) => debug!("Segment {} is not a readable wav", path.display()),
    }
}
