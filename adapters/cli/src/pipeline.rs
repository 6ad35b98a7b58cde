//! Orchestration of the parse → replay → render → assemble pipeline.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use deckviz_core::{DeckLayout, FillPolicy};
use deckviz_deck::replay;
use deckviz_rendering::{
    compose, AnimationAssembler, AnimationSettings, DeckLabware, DeckStyle, FrameRenderer,
};
use deckviz_rendering_raster::{GifAssembler, RasterRenderer};
use deckviz_system_log_parser::LogParser;
use log::{debug, info};
use serde::Deserialize;

const SUPPORTED_MANIFEST_VERSION: u32 = 1;

/// Inputs controlling one pipeline run.
#[derive(Clone, Debug)]
pub(crate) struct PipelineOptions {
    /// Execution log to reconstruct.
    pub(crate) log_path: PathBuf,
    /// Directory that receives the per-frame PNG artifacts.
    pub(crate) frames_dir: PathBuf,
    /// Path of the assembled animation artifact.
    pub(crate) animation_path: PathBuf,
    /// State-transition policy applied during replay.
    pub(crate) policy: FillPolicy,
    /// Optional TOML style manifest.
    pub(crate) style_manifest: Option<PathBuf>,
    /// Per-frame duration and looping behavior.
    pub(crate) settings: AnimationSettings,
}

/// Outcome reported after a successful run.
#[derive(Clone, Debug)]
pub(crate) struct RunSummary {
    /// Number of plate events recovered from the log.
    pub(crate) event_count: usize,
    /// Number of frames rendered, including the baseline.
    pub(crate) frame_count: usize,
    /// Location of the assembled animation.
    pub(crate) animation_path: PathBuf,
}

/// Runs the whole pipeline: parse, replay, render every frame, assemble.
///
/// Stages run strictly in order; a failure anywhere aborts the run and leaves
/// whatever frame artifacts were already written on disk without reporting an
/// animation.
pub(crate) fn run(options: &PipelineOptions) -> Result<RunSummary> {
    let text = fs::read_to_string(&options.log_path).with_context(|| {
        format!(
            "failed to read execution log {}",
            options.log_path.display()
        )
    })?;

    let style = match &options.style_manifest {
        Some(path) => load_style(path)?,
        None => DeckStyle::default(),
    };
    style.validate().context("style manifest failed validation")?;

    let parser = LogParser::new().context("failed to compile the event grammar")?;
    let outcome = parser
        .parse(&text)
        .context("failed to parse the execution log")?;
    info!(
        "parsed {} events from {}",
        outcome.events.len(),
        options.log_path.display()
    );

    let frames = replay(&outcome.events, &outcome.facts, options.policy);
    info!("replayed {} frames", frames.len());

    let layout = DeckLayout::ot2();
    let labware = DeckLabware::default();
    let renderer = RasterRenderer::new(&options.frames_dir);
    for frame in &frames {
        let scene = compose(frame, &layout, &labware, &style);
        let path = renderer.render_frame(&scene, frame.index)?;
        debug!("rendered {}", path.display());
    }
    info!(
        "rendered {} frame artifacts into {}",
        frames.len(),
        options.frames_dir.display()
    );

    let assembler = GifAssembler::new(&options.animation_path);
    let animation_path =
        assembler.assemble(&options.frames_dir, frames.len() as u32, &options.settings)?;
    info!("assembled animation at {}", animation_path.display());

    Ok(RunSummary {
        event_count: outcome.events.len(),
        frame_count: frames.len(),
        animation_path,
    })
}

#[derive(Debug, Deserialize)]
struct StyleManifest {
    version: u32,
    #[serde(default)]
    style: DeckStyle,
}

/// Loads a versioned style manifest and returns the style it describes.
fn load_style(path: &Path) -> Result<DeckStyle> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read style manifest {}", path.display()))?;
    let manifest: StyleManifest =
        toml::from_str(&contents).context("failed to parse style manifest toml contents")?;
    if manifest.version != SUPPORTED_MANIFEST_VERSION {
        bail!(
            "unsupported style manifest version {}; expected {}",
            manifest.version,
            SUPPORTED_MANIFEST_VERSION
        );
    }
    Ok(manifest.style)
}

#[cfg(test)]
mod tests {
    use super::{load_style, run, PipelineOptions};
    use deckviz_core::FillPolicy;
    use deckviz_rendering::AnimationSettings;
    use std::fs;

    const SAMPLE_LOG: &str = include_str!("../tests/data/sample_log.txt");

    fn options_in(workspace: &std::path::Path) -> PipelineOptions {
        let log_path = workspace.join("run_log.txt");
        fs::write(&log_path, SAMPLE_LOG).expect("sample log writable");

        PipelineOptions {
            log_path,
            frames_dir: workspace.join("frames"),
            animation_path: workspace.join("animation.gif"),
            policy: FillPolicy::Toggle,
            style_manifest: None,
            settings: AnimationSettings::default(),
        }
    }

    #[test]
    fn sample_log_runs_end_to_end() {
        let workspace = tempfile::tempdir().expect("temporary directory");
        let options = options_in(workspace.path());

        let summary = run(&options).expect("pipeline completes");

        // 13 dispenses and 11 plate-side aspirations, plus the baseline.
        assert_eq!(summary.event_count, 24);
        assert_eq!(summary.frame_count, 25);
        assert!(options.animation_path.exists());
        assert!(options.frames_dir.join("frame_0.png").exists());
        assert!(options.frames_dir.join("frame_24.png").exists());
        assert!(!options.frames_dir.join("frame_25.png").exists());
    }

    #[test]
    fn missing_log_file_is_reported_with_its_path() {
        let workspace = tempfile::tempdir().expect("temporary directory");
        let mut options = options_in(workspace.path());
        options.log_path = workspace.path().join("absent.txt");

        let error = run(&options).expect_err("missing log must fail");
        assert!(format!("{error:#}").contains("absent.txt"));
    }

    #[test]
    fn style_manifest_overrides_default_sizing() {
        let workspace = tempfile::tempdir().expect("temporary directory");
        let manifest_path = workspace.path().join("style.toml");
        fs::write(
            &manifest_path,
            "version = 1\n\n[style]\nslot_width = 120.0\nslot_height = 90.0\n",
        )
        .expect("manifest writable");

        let style = load_style(&manifest_path).expect("manifest loads");
        assert!((style.slot_width - 120.0).abs() < f32::EPSILON);
        assert!((style.slot_height - 90.0).abs() < f32::EPSILON);
        // Untouched fields keep their defaults.
        assert!((style.well_radius - 7.0).abs() < f32::EPSILON);
    }

    #[test]
    fn unsupported_manifest_versions_are_rejected() {
        let workspace = tempfile::tempdir().expect("temporary directory");
        let manifest_path = workspace.path().join("style.toml");
        fs::write(&manifest_path, "version = 2\n").expect("manifest writable");

        let error = load_style(&manifest_path).expect_err("version 2 must be rejected");
        assert!(format!("{error}").contains("unsupported style manifest version 2"));
    }
}
