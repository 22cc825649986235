use std::fs::File;
use std::io::{BufWriter, Read};
use std::path::Path;
use std::process::{Command, Stdio};

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tempfile::NamedTempFile;
use tracing::{debug, error};

use crate::error::AudioError;
use crate::session::StereoPosition;

/// The external audio-processing collaborator.
///
/// Both operations write a complete file at `output` and never touch their inputs.
pub trait AudioTool {
    fn concat(&self, first: &Path, second: &Path, output: &Path) -> Result<(), AudioError>;
    fn pan(&self, input: &Path, output: &Path, position: StereoPosition) -> Result<(), AudioError>;
}

/// Shells out to ffmpeg.
#[derive(Debug, Clone)]
pub struct FfmpegTool {
    program: String,
}

impl Default for FfmpegTool {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FfmpegTool {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }

    fn run(&self, operation: &'static str, command: &mut Command) -> Result<(), AudioError> {
        debug!("Running {:?}", command);
        let status = command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| AudioError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        if !status.success() {
            error!("{} {} failed with {}", self.program, operation, status);
            return Err(AudioError::ToolFailed {
                program: self.program.clone(),
                operation,
                status,
            });
        }
        Ok(())
    }
}

pub fn pan_filter(position: StereoPosition) -> String {
    let (left, right) = position.gains();
    format!("pan=stereo|c0={}*c0|c1={}*c0", left, right)
}

impl AudioTool for FfmpegTool {
    fn concat(&self, first: &Path, second: &Path, output: &Path) -> Result<(), AudioError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-y", "-loglevel", "error", "-i"])
            .arg(first)
            .arg("-i")
            .arg(second)
            .args([
                "-filter_complex",
                "[0:a][1:a]concat=n=2:v=0:a=1[out]",
                "-map",
                "[out]",
            ])
            .arg(output);
        self.run("concat", &mut cmd)
    }

    fn pan(&self, input: &Path, output: &Path, position: StereoPosition) -> Result<(), AudioError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-y", "-loglevel", "error", "-i"])
            .arg(input)
            .arg("-af")
            .arg(pan_filter(position))
            .arg(output);
        self.run("pan", &mut cmd)
    }
}

/// In-process WAV implementation of the same two operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeTool;

impl AudioTool for NativeTool {
    fn concat(&self, first: &Path, second: &Path, output: &Path) -> Result<(), AudioError> {
        let a = WavReader::open(first)?;
        let b = WavReader::open(second)?;
        let spec = a.spec();
        if spec != b.spec() {
            return Err(AudioError::IncompatibleFormat {
                first: first.to_path_buf(),
                second: second.to_path_buf(),
            });
        }

        let mut writer = WavWriter::create(output, spec)?;
        match spec.sample_format {
            SampleFormat::Float => {
                copy_samples::<f32, _>(a, &mut writer)?;
                copy_samples::<f32, _>(b, &mut writer)?;
            }
            SampleFormat::Int => {
                copy_samples::<i32, _>(a, &mut writer)?;
                copy_samples::<i32, _>(b, &mut writer)?;
            }
        }
        writer.finalize()?;
        Ok(())
    }

    fn pan(&self, input: &Path, output: &Path, position: StereoPosition) -> Result<(), AudioError> {
        let mut reader = WavReader::open(input)?;
        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;
        let (left, right) = position.gains();
        let mut writer = WavWriter::create(output, WavSpec { channels: 2, ..spec })?;

        match spec.sample_format {
            SampleFormat::Float => {
                for (i, sample) in reader.samples::<f32>().enumerate() {
                    let sample = sample? as f64;
                    if i % channels != 0 {
                        continue;
                    }
                    writer.write_sample((sample * left).clamp(-1.0, 1.0) as f32)?;
                    writer.write_sample((sample * right).clamp(-1.0, 1.0) as f32)?;
                }
            }
            SampleFormat::Int => {
                let max = ((1i64 << (spec.bits_per_sample - 1)) - 1) as f64;
                let min = -max - 1.0;
                for (i, sample) in reader.samples::<i32>().enumerate() {
                    let sample = sample? as f64;
                    if i % channels != 0 {
                        continue;
                    }
                    writer.write_sample((sample * left).round().clamp(min, max) as i32)?;
                    writer.write_sample((sample * right).round().clamp(min, max) as i32)?;
                }
            }
        }
        writer.finalize()?;
        Ok(())
    }
}

fn copy_samples<S: hound::Sample, R: Read>(
    mut reader: WavReader<R>,
    writer: &mut WavWriter<BufWriter<File>>,
) -> Result<(), AudioError> {
    for sample in reader.samples::<S>() {
        writer.write_sample(sample?)?;
    }
    Ok(())
}

/// A transient `.wav` next to `target`, removed on drop unless persisted.
///
/// Created with the same mode a plain `File::create` would get, since it may
/// be persisted as the final output.
pub fn staging_file(target: &Path) -> std::io::Result<NamedTempFile> {
    let dir = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut builder = tempfile::Builder::new();
    builder.prefix(".segment-").suffix(".wav");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // umask still applies
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(dir)
}

/// Rewrites `path` in place so its stereo balance reflects `position`.
pub fn apply_position<A: AudioTool>(
    tool: &A,
    path: &Path,
    position: StereoPosition,
) -> Result<(), AudioError> {
    if !path.exists() {
        return Err(AudioError::MissingAsset(path.to_path_buf()));
    }
    let staged = staging_file(path)?;
    tool.pan(path, staged.path(), position)?;
    staged.persist(path).map_err(|e| AudioError::Io(e.error))?;
    debug!("Applied {} position to {}", position, path.display());
    Ok(())
}

/// Replaces `base` with `base` followed by `next`. `next` is left untouched.
pub fn append_audio<A: AudioTool>(tool: &A, base: &Path, next: &Path) -> Result<(), AudioError> {
    for p in [base, next] {
        if !p.exists() {
            return Err(AudioError::MissingAsset(p.to_path_buf()));
        }
    }
    let staged = staging_file(base)?;
    tool.concat(base, next, staged.path())?;
    staged.persist(base).map_err(|e| AudioError::Io(e.error))?;
    debug!("Appended {} to {}", next.display(), base.display());
    Ok(())
}

pub fn wav_duration_seconds(path: &Path) -> anyhow::Result<f64> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let samples = reader.len();
    let frames = samples as f64 / spec.channels as f64;
    let duration = frames / spec.sample_rate as f64;
    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_wav(path: &Path, channels: u16, samples: &[i16]) {
        let spec = WavSpec {
            channels,
            sample_rate: 24000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn read_wav(path: &Path) -> (u16, Vec<i16>) {
        let mut reader = WavReader::open(path).unwrap();
        let channels = reader.spec().channels;
        let samples = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        (channels, samples)
    }

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_pan_filter_strings() {
        assert_eq!(pan_filter(StereoPosition::Left), "pan=stereo|c0=2*c0|c1=0*c0");
        assert_eq!(pan_filter(StereoPosition::Center), "pan=stereo|c0=1*c0|c1=1*c0");
        assert_eq!(pan_filter(StereoPosition::Right), "pan=stereo|c0=0*c0|c1=2*c0");
    }

    #[test]
    fn test_native_pan_left_right_center() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("mono.wav");
        write_wav(&src, 1, &[100, -200, 20000]);

        let left = dir.path().join("left.wav");
        NativeTool.pan(&src, &left, StereoPosition::Left).unwrap();
        assert_eq!(read_wav(&left), (2, vec![200, 0, -400, 0, 32767, 0]));

        let right = dir.path().join("right.wav");
        NativeTool.pan(&src, &right, StereoPosition::Right).unwrap();
        assert_eq!(read_wav(&right), (2, vec![0, 200, 0, -400, 0, 32767]));

        let center = dir.path().join("center.wav");
        NativeTool.pan(&src, &center, StereoPosition::Center).unwrap();
        assert_eq!(read_wav(&center), (2, vec![100, 100, -200, -200, 20000, 20000]));
    }

    #[test]
    fn test_center_position_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("speech.wav");
        write_wav(&path, 1, &[1, 2, 3, -4]);

        apply_position(&NativeTool, &path, StereoPosition::Center).unwrap();
        let once = read_wav(&path);
        apply_position(&NativeTool, &path, StereoPosition::Center).unwrap();
        let twice = read_wav(&path);

        assert_eq!(once, twice);
        assert_eq!(dir_entries(dir.path()), vec!["speech.wav"]);
    }

    #[test]
    fn test_append_preserves_order_and_source() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("out.wav");
        let b = dir.path().join("b.wav");
        let c = dir.path().join("c.wav");
        write_wav(&base, 1, &[1, 1]);
        write_wav(&b, 1, &[2]);
        write_wav(&c, 1, &[3, 3, 3]);

        append_audio(&NativeTool, &base, &b).unwrap();
        append_audio(&NativeTool, &base, &c).unwrap();

        assert_eq!(read_wav(&base), (1, vec![1, 1, 2, 3, 3, 3]));
        assert_eq!(read_wav(&b), (1, vec![2]));
        assert_eq!(dir_entries(dir.path()), vec!["b.wav", "c.wav", "out.wav"]);
    }

    #[test]
    fn test_append_missing_base() {
        let dir = tempfile::tempdir().unwrap();
        let next = dir.path().join("next.wav");
        write_wav(&next, 1, &[1]);
        let err = append_audio(&NativeTool, &dir.path().join("nope.wav"), &next).unwrap_err();
        assert!(matches!(err, AudioError::MissingAsset(_)));
    }

    #[test]
    fn test_append_incompatible_leaves_base_intact() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("out.wav");
        let stereo = dir.path().join("stereo.wav");
        write_wav(&base, 1, &[5, 6]);
        write_wav(&stereo, 2, &[1, 1]);

        let err = append_audio(&NativeTool, &base, &stereo).unwrap_err();
        assert!(matches!(err, AudioError::IncompatibleFormat { .. }));
        assert_eq!(read_wav(&base), (1, vec![5, 6]));
        assert_eq!(dir_entries(dir.path()), vec!["out.wav", "stereo.wav"]);
    }

    #[test]
    fn test_failed_pan_leaves_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.wav");
        fs::write(&path, b"not a wav file").unwrap();

        let err = apply_position(&NativeTool, &path, StereoPosition::Left).unwrap_err();
        assert!(matches!(err, AudioError::Wav(_)));
        assert_eq!(fs::read(&path).unwrap(), b"not a wav file");
        assert_eq!(dir_entries(dir.path()), vec!["broken.wav"]);
    }

    #[test]
    fn test_ffmpeg_missing_program() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.wav");
        write_wav(&src, 1, &[0]);
        let tool = FfmpegTool::new("definitely-not-an-installed-ffmpeg");
        let err = tool
            .pan(&src, &dir.path().join("b.wav"), StereoPosition::Center)
            .unwrap_err();
        assert!(matches!(err, AudioError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_ffmpeg_nonzero_exit_is_tool_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("speech.wav");
        write_wav(&path, 1, &[1, 2]);
        let tool = FfmpegTool::new("false");

        let err = apply_position(&tool, &path, StereoPosition::Left).unwrap_err();
        match err {
            AudioError::ToolFailed {
                program,
                operation,
                status,
            } => {
                assert_eq!(program, "false");
                assert_eq!(operation, "pan");
                assert!(!status.success());
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(read_wav(&path), (1, vec![1, 2]));
        assert_eq!(dir_entries(dir.path()), vec!["speech.wav"]);

        let next = dir.path().join("next.wav");
        write_wav(&next, 1, &[3]);
        let err = append_audio(&tool, &path, &next).unwrap_err();
        assert!(matches!(err, AudioError::ToolFailed { operation: "concat", .. }));
        assert_eq!(dir_entries(dir.path()), vec!["next.wav", "speech.wav"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_persisted_files_use_default_create_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let reference = dir.path().join("reference");
        File::create(&reference).unwrap();
        let expected = fs::metadata(&reference).unwrap().permissions().mode() & 0o777;

        let base = dir.path().join("out.wav");
        let next = dir.path().join("next.wav");
        write_wav(&base, 1, &[1]);
        write_wav(&next, 1, &[2]);

        apply_position(&NativeTool, &next, StereoPosition::Center).unwrap();
        let mode = fs::metadata(&next).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, expected);

        fs::remove_file(&base).unwrap();
        write_wav(&base, 2, &[1, 1]);
        append_audio(&NativeTool, &base, &next).unwrap();
        let mode = fs::metadata(&base).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, expected);
    }

    #[test]
    fn test_wav_duration_seconds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("half.wav");
        write_wav(&path, 2, &vec![0; 24000]);
        let dur = wav_duration_seconds(&path).unwrap();
        assert!((dur - 0.5).abs() < 1e-9);
    }
}
