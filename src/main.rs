mod args;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::process::Command;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use args::{Args, Backend, Command as Cmd, GenerateArgs};
use voice_scenario::audio::{self, AudioTool, FfmpegTool, NativeTool};
use voice_scenario::speakers::{fetch_speakers, save_speakers};
use voice_scenario::{ScenarioDriver, SessionDefaults, SessionState, TtsClient, Voice};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let client = TtsClient::new(&args.server);

    match args.command {
        Cmd::Speakers { output } => {
            info!("Fetching speakers from {}", client.server());
            let speakers = fetch_speakers(&client).await?;
            save_speakers(&output, &speakers)?;
        }
        Cmd::Generate(gen_args) => match gen_args.backend {
            Backend::Ffmpeg => {
                let tool = FfmpegTool::new(&gen_args.ffmpeg);
                generate(&client, &tool, &gen_args).await?;
            }
            Backend::Native => generate(&client, &NativeTool, &gen_args).await?,
        },
    }
    Ok(())
}

async fn generate<A: AudioTool>(
    client: &TtsClient,
    tool: &A,
    args: &GenerateArgs,
) -> anyhow::Result<()> {
    let file = File::open(&args.input)
        .with_context(|| format!("Failed to open scenario {}", args.input.display()))?;
    info!(
        "Generating {} from {} via {}",
        args.output.display(),
        args.input.display(),
        client.server()
    );

    let session = SessionState::new(SessionDefaults {
        voice: Voice {
            speaker_uuid: args.speaker_uuid.clone(),
            style_id: args.style_id,
        },
        position: args.position,
    });
    let mut driver = ScenarioDriver::new(client, tool, session, &args.output, &args.silence);

    let summary = match driver.run(BufReader::new(file)).await {
        Ok(summary) => summary,
        Err(e) => {
            error!("Scenario aborted: {}", e);
            return Err(e).with_context(|| format!("Failed to process {}", args.input.display()));
        }
    };
    info!(
        "Processed {} lines: {} segments, {} synthesized",
        summary.lines_read, summary.segments, summary.synthesized
    );

    if !summary.output_written {
        return Ok(());
    }
    if let Ok(dur) = audio::wav_duration_seconds(&args.output) {
        info!("Output {} is {:.2} seconds", args.output.display(), dur);
    }

    if args.play {
        play(&args.output)?;
    }
    Ok(())
}

fn play(path: &Path) -> anyhow::Result<()> {
    info!("Playing {}", path.display());
    let status = Command::new("ffplay")
        .args(["-autoexit", "-nodisp", "-loglevel", "error"])
        .arg(path)
        .status()
        .context("Failed to start ffplay")?;
    if !status.success() {
        error!("ffplay exited with {}", status);
        anyhow::bail!("ffplay failed to play {}", path.display());
    }
    Ok(())
}
