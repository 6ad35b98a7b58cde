//! GIF assembly for rendered frame artifacts.

use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result as AnyResult};
use deckviz_core::FrameIndex;
use deckviz_rendering::{AnimationAssembler, AnimationSettings};
use image::codecs::gif::{GifEncoder, Repeat};
use thiserror::Error;

use crate::frame_file_name;

/// Assembler that encodes frame artifacts into one looping GIF.
#[derive(Clone, Debug)]
pub struct GifAssembler {
    output_path: PathBuf,
}

impl GifAssembler {
    /// Default file name of the assembled animation artifact.
    pub const DEFAULT_FILE_NAME: &'static str = "deck_animation.gif";

    /// Creates an assembler writing the animation to the provided path.
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
        }
    }

    /// Path the assembled animation is written to.
    #[must_use]
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }
}

impl AnimationAssembler for GifAssembler {
    fn assemble(
        &self,
        frames_dir: &Path,
        frame_count: u32,
        settings: &AnimationSettings,
    ) -> AnyResult<PathBuf> {
        if let Some(parent) = self
            .output_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
        {
            fs::create_dir_all(parent).with_context(|| {
                format!(
                    "failed to create animation output directory {}",
                    parent.display()
                )
            })?;
        }

        let file = File::create(&self.output_path).with_context(|| {
            format!(
                "failed to create animation artifact {}",
                self.output_path.display()
            )
        })?;
        let mut encoder = GifEncoder::new(file);
        if settings.looping {
            encoder
                .set_repeat(Repeat::Infinite)
                .context("failed to mark the animation as looping")?;
        }

        for value in 0..frame_count {
            let index = FrameIndex::new(value);
            let path = frames_dir.join(frame_file_name(index));
            if !path.exists() {
                return Err(AssemblyError::MissingFrame {
                    index,
                    directory: frames_dir.to_path_buf(),
                }
                .into());
            }

            let buffer = image::open(&path)
                .with_context(|| format!("failed to load frame artifact {}", path.display()))?
                .to_rgba8();
            let delay = image::Delay::from_saturating_duration(settings.frame_duration);
            let frame = image::Frame::from_parts(buffer, 0, 0, delay);
            encoder
                .encode_frame(frame)
                .with_context(|| format!("failed to encode frame {index} into the animation"))?;
        }

        Ok(self.output_path.clone())
    }
}

/// Errors produced while assembling the animation artifact.
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// A frame index has no artifact on disk; the animation cannot be
    /// assembled without reordering or dropping frames.
    #[error("frame artifact for index {index} is missing from {}", .directory.display())]
    MissingFrame {
        /// Index whose artifact was not found.
        index: FrameIndex,
        /// Directory that was searched.
        directory: PathBuf,
    },
}
