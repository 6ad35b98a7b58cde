#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that drives the Deckviz pipeline.
//!
//! The binary reads one execution log, replays it into frames, renders the
//! frames as PNG artifacts, and assembles the looping GIF animation. All
//! configuration flows in through arguments and the optional style manifest;
//! nothing runs at load time.

mod pipeline;

use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use clap::{Parser, ValueEnum};
use deckviz_core::FillPolicy;
use deckviz_rendering::AnimationSettings;
use deckviz_rendering_raster::GifAssembler;

use crate::pipeline::PipelineOptions;

/// Reconstructs and animates a liquid-handling run from its execution log.
#[derive(Debug, Parser)]
#[command(name = "deckviz")]
struct Cli {
    /// Path to the execution log produced by the liquid-handling runtime.
    log: PathBuf,

    /// Directory that receives one PNG artifact per frame.
    #[arg(long, default_value = "frames")]
    frames_dir: PathBuf,

    /// Path of the assembled looping animation.
    #[arg(long, default_value = GifAssembler::DEFAULT_FILE_NAME)]
    output: PathBuf,

    /// State-transition policy applied when replaying plate events.
    #[arg(long, value_enum, default_value = "toggle")]
    policy: PolicyArg,

    /// Optional TOML style manifest overriding the default sizing and palette.
    #[arg(long)]
    style: Option<PathBuf>,

    /// How long each frame stays on screen, in milliseconds.
    #[arg(long, default_value_t = 2000)]
    frame_duration_ms: u64,

    /// Assembles a single-pass animation instead of a looping one.
    #[arg(long)]
    no_loop: bool,
}

/// Command-line face of the replay fill policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum PolicyArg {
    /// Dispense fills a column; aspirate clears it again.
    Toggle,
    /// Every plate event marks its column filled; nothing clears a column.
    Accumulate,
}

impl From<PolicyArg> for FillPolicy {
    fn from(policy: PolicyArg) -> Self {
        match policy {
            PolicyArg::Toggle => Self::Toggle,
            PolicyArg::Accumulate => Self::Accumulate,
        }
    }
}

impl Cli {
    fn into_options(self) -> PipelineOptions {
        PipelineOptions {
            log_path: self.log,
            frames_dir: self.frames_dir,
            animation_path: self.output,
            policy: self.policy.into(),
            style_manifest: self.style,
            settings: AnimationSettings {
                frame_duration: Duration::from_millis(self.frame_duration_ms),
                looping: !self.no_loop,
            },
        }
    }
}

/// Entry point for the Deckviz command-line interface.
fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let summary = pipeline::run(&cli.into_options())?;

    println!(
        "{} events replayed into {} frames; animation written to {}",
        summary.event_count,
        summary.frame_count,
        summary.animation_path.display()
    );
    Ok(())
}
