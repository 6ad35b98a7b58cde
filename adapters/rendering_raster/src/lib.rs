#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Raster rendering backend for Deckviz.
//!
//! Scenes composed by `deckviz-rendering` are rasterized into RGBA images
//! with the `image` crate and written as one PNG artifact per frame. The
//! companion [`GifAssembler`] loads those artifacts back in strict index
//! order and encodes the final looping animation.

mod animation;
mod glyphs;

pub use animation::{AssemblyError, GifAssembler};

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result as AnyResult};
use deckviz_core::FrameIndex;
use deckviz_rendering::{Color, FrameRenderer, Scene, SlotCellPresentation};
use glam::Vec2;
use image::{Rgba, RgbaImage};

/// Pixel scale applied to slot number labels.
const LABEL_SCALE: u32 = 2;

/// Returns the deterministic artifact name for a frame index.
#[must_use]
pub fn frame_file_name(index: FrameIndex) -> String {
    format!("frame_{index}.png")
}

/// Renderer that rasterizes scenes into PNG artifacts inside one directory.
#[derive(Clone, Debug)]
pub struct RasterRenderer {
    output_dir: PathBuf,
}

impl RasterRenderer {
    /// Creates a renderer writing artifacts into the provided directory.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Directory the renderer writes frame artifacts into.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Rasterizes a scene into an RGBA image without touching the filesystem.
    #[must_use]
    pub fn rasterize(&self, scene: &Scene) -> RgbaImage {
        let width = scene.canvas.width.max(1);
        let height = scene.canvas.height.max(1);
        let mut image = RgbaImage::from_pixel(width, height, to_rgba(scene.background));

        for cell in &scene.slots {
            draw_slot_cell(&mut image, cell);
        }

        if let Some(plate) = &scene.plate {
            for well in &plate.wells {
                fill_circle(&mut image, well.center, well.radius, to_rgba(well.outline));
                fill_circle(
                    &mut image,
                    well.center,
                    (well.radius - 1.0).max(1.0),
                    to_rgba(well.fill),
                );
            }
        }

        if let Some(reservoir) = &scene.reservoir {
            for cell in &reservoir.cells {
                fill_rect(&mut image, cell.origin, cell.size, to_rgba(cell.outline));
                fill_rect(
                    &mut image,
                    cell.origin + Vec2::splat(1.0),
                    cell.size - Vec2::splat(2.0),
                    to_rgba(cell.fill),
                );
            }
        }

        image
    }
}

impl FrameRenderer for RasterRenderer {
    fn render_frame(&self, scene: &Scene, index: FrameIndex) -> AnyResult<PathBuf> {
        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!(
                "failed to create frame output directory {}",
                self.output_dir.display()
            )
        })?;

        let path = self.output_dir.join(frame_file_name(index));
        let image = self.rasterize(scene);
        image
            .save(&path)
            .with_context(|| format!("failed to write frame artifact {}", path.display()))?;
        Ok(path)
    }
}

fn draw_slot_cell(image: &mut RgbaImage, cell: &SlotCellPresentation) {
    fill_rect(image, cell.origin, cell.size, to_rgba(cell.border));
    let border = Vec2::splat(cell.border_width);
    fill_rect(
        image,
        cell.origin + border,
        cell.size - 2.0 * border,
        to_rgba(cell.fill),
    );

    let center = cell.origin + cell.size / 2.0;
    glyphs::draw_number(
        image,
        cell.slot.number(),
        center,
        LABEL_SCALE,
        to_rgba(cell.label_color),
    );
}

fn to_rgba(color: Color) -> Rgba<u8> {
    Rgba(color.to_rgba_u8())
}

fn fill_rect(image: &mut RgbaImage, origin: Vec2, size: Vec2, color: Rgba<u8>) {
    if size.x <= 0.0 || size.y <= 0.0 {
        return;
    }

    let left = origin.x.max(0.0) as u32;
    let top = origin.y.max(0.0) as u32;
    let right = ((origin.x + size.x).max(0.0) as u32).min(image.width());
    let bottom = ((origin.y + size.y).max(0.0) as u32).min(image.height());

    for y in top..bottom {
        for x in left..right {
            image.put_pixel(x, y, color);
        }
    }
}

fn fill_circle(image: &mut RgbaImage, center: Vec2, radius: f32, color: Rgba<u8>) {
    if radius <= 0.0 {
        return;
    }

    let left = (center.x - radius).floor().max(0.0) as u32;
    let top = (center.y - radius).floor().max(0.0) as u32;
    let right = ((center.x + radius).ceil().max(0.0) as u32 + 1).min(image.width());
    let bottom = ((center.y + radius).ceil().max(0.0) as u32 + 1).min(image.height());
    let radius_squared = radius * radius;

    for y in top..bottom {
        for x in left..right {
            let offset = Vec2::new(x as f32 + 0.5, y as f32 + 0.5) - center;
            if offset.length_squared() <= radius_squared {
                image.put_pixel(x, y, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{frame_file_name, RasterRenderer};
    use deckviz_core::{DeckLayout, DeckSnapshot, Frame, FrameIndex, SlotId, WellColumn};
    use deckviz_rendering::{compose, DeckLabware, DeckStyle, FrameRenderer};

    fn slot(number: u8) -> SlotId {
        SlotId::from_number(number).expect("slot number within deck range")
    }

    fn column(index: u8) -> WellColumn {
        WellColumn::from_index(index).expect("column index within labware range")
    }

    fn scene_for(state: DeckSnapshot) -> deckviz_rendering::Scene {
        compose(
            &Frame::new(FrameIndex::new(0), state),
            &DeckLayout::ot2(),
            &DeckLabware::default(),
            &DeckStyle::default(),
        )
    }

    #[test]
    fn frame_artifacts_are_named_by_index() {
        assert_eq!(frame_file_name(FrameIndex::new(0)), "frame_0.png");
        assert_eq!(frame_file_name(FrameIndex::new(17)), "frame_17.png");
    }

    #[test]
    fn rasterized_canvas_matches_scene_dimensions() {
        let scene = scene_for(DeckSnapshot::default());
        let image = RasterRenderer::new("frames").rasterize(&scene);

        assert_eq!(image.width(), scene.canvas.width);
        assert_eq!(image.height(), scene.canvas.height);
    }

    #[test]
    fn slot_cells_and_vacant_cells_are_distinguishable() {
        let style = DeckStyle::default();
        let scene = scene_for(DeckSnapshot::default());
        let image = RasterRenderer::new("frames").rasterize(&scene);

        // Interior of slot 1 (front-left, drawn at the bottom of the canvas).
        let inside = image.get_pixel(10, 3 * style.slot_height as u32 + 10);
        assert_eq!(inside.0, style.slot_fill.to_rgba_u8());

        // The back-right grid cell carries no slot and stays background.
        let vacant = image.get_pixel(2 * style.slot_width as u32 + 10, 10);
        assert_eq!(vacant.0, style.background.to_rgba_u8());
    }

    #[test]
    fn filled_leading_row_wells_are_painted_with_the_fill_color() {
        let style = DeckStyle::default();
        let state = DeckSnapshot {
            plate_slot: Some(slot(3)),
            filled_columns: [column(0)].into_iter().collect(),
            ..DeckSnapshot::default()
        };
        let scene = scene_for(state);
        let plate = scene.plate.clone().expect("plate composed");
        let image = RasterRenderer::new("frames").rasterize(&scene);

        let filled = plate.wells[0].center;
        assert_eq!(
            image.get_pixel(filled.x as u32, filled.y as u32).0,
            style.well_filled.to_rgba_u8()
        );

        let structural = plate.wells[12].center;
        assert_eq!(
            image.get_pixel(structural.x as u32, structural.y as u32).0,
            style.well_empty.to_rgba_u8()
        );
    }

    #[test]
    fn used_reservoir_cells_are_highlighted() {
        let style = DeckStyle::default();
        let state = DeckSnapshot {
            reservoir_slot: Some(slot(2)),
            reservoir_filled_columns: [column(1)].into_iter().collect(),
            ..DeckSnapshot::default()
        };
        let scene = scene_for(state);
        let reservoir = scene.reservoir.clone().expect("reservoir composed");
        let image = RasterRenderer::new("frames").rasterize(&scene);

        let highlighted = reservoir.cells[1];
        let center = highlighted.origin + highlighted.size / 2.0;
        assert_eq!(
            image.get_pixel(center.x as u32, center.y as u32).0,
            style.reservoir_highlight.to_rgba_u8()
        );

        let untouched = reservoir.cells[5];
        let center = untouched.origin + untouched.size / 2.0;
        assert_eq!(
            image.get_pixel(center.x as u32, center.y as u32).0,
            style.reservoir_default.to_rgba_u8()
        );
    }

    #[test]
    fn render_frame_writes_the_artifact_into_the_output_directory() {
        let workspace = tempfile::tempdir().expect("temporary directory");
        let renderer = RasterRenderer::new(workspace.path().join("frames"));
        let scene = scene_for(DeckSnapshot::default());

        let path = renderer
            .render_frame(&scene, FrameIndex::new(4))
            .expect("frame renders");

        assert!(path.ends_with("frames/frame_4.png"));
        assert!(path.exists());
    }
}
