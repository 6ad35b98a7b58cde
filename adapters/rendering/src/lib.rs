#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Deckviz backends.
//!
//! This crate turns one immutable [`Frame`] plus the deck layout into a
//! backend-agnostic [`Scene`]: a flat description of colored rectangles,
//! circle markers, and slot labels positioned in y-down screen space. All
//! sizing and palette decisions live in an explicit [`DeckStyle`] value that
//! callers pass into [`compose`]; nothing in here reads ambient constants.
//! Concrete backends implement [`FrameRenderer`] and [`AnimationAssembler`].

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Result as AnyResult;
use deckviz_core::{DeckLayout, Frame, FrameIndex, GridPosition, LabwareGeometry, SlotId};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Converts the color to byte RGBA channels.
    #[must_use]
    pub fn to_rgba_u8(self) -> [u8; 4] {
        [
            channel_to_u8(self.red),
            channel_to_u8(self.green),
            channel_to_u8(self.blue),
            channel_to_u8(self.alpha),
        ]
    }
}

fn channel_to_u8(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Labware geometries rendered onto the deck.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckLabware {
    /// Geometry of the tracked well plate.
    pub plate: LabwareGeometry,
    /// Geometry of the bulk liquid reservoir.
    pub reservoir: LabwareGeometry,
}

impl Default for DeckLabware {
    fn default() -> Self {
        Self {
            plate: LabwareGeometry::plate_96(),
            reservoir: LabwareGeometry::reservoir_12(),
        }
    }
}

/// Sizing and palette applied when composing scenes.
///
/// The defaults reproduce the historical visualization: light gray slot cells
/// with white borders, blue filled wells, and a light blue reservoir
/// highlight. Every field can be overridden from a style manifest.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckStyle {
    /// Width of one slot cell in pixels.
    pub slot_width: f32,
    /// Height of one slot cell in pixels.
    pub slot_height: f32,
    /// Thickness of the border drawn around each slot cell, in pixels.
    pub slot_border: f32,
    /// Fraction of a slot cell covered by labware grids, per axis.
    pub labware_span: f32,
    /// Fraction of a slot cell's height covered by reservoir cells.
    pub reservoir_depth: f32,
    /// Radius of one well marker in pixels.
    pub well_radius: f32,
    /// Canvas clear color.
    pub background: Color,
    /// Fill color of slot cells.
    pub slot_fill: Color,
    /// Border color of slot cells.
    pub slot_border_color: Color,
    /// Color of slot number labels.
    pub slot_label_color: Color,
    /// Outline color of well markers.
    pub well_outline: Color,
    /// Fill color of empty well markers.
    pub well_empty: Color,
    /// Fill color of filled leading-row well markers.
    pub well_filled: Color,
    /// Outline color of reservoir cells.
    pub reservoir_outline: Color,
    /// Fill color of unused reservoir cells.
    pub reservoir_default: Color,
    /// Fill color of reservoir cells liquid was drawn from.
    pub reservoir_highlight: Color,
}

impl Default for DeckStyle {
    fn default() -> Self {
        Self {
            slot_width: 240.0,
            slot_height: 180.0,
            slot_border: 5.0,
            labware_span: 0.9,
            reservoir_depth: 0.8,
            well_radius: 7.0,
            background: Color::from_rgb_u8(255, 255, 255),
            slot_fill: Color::from_rgb_u8(211, 211, 211),
            slot_border_color: Color::from_rgb_u8(255, 255, 255),
            slot_label_color: Color::from_rgb_u8(128, 128, 128),
            well_outline: Color::from_rgb_u8(0, 0, 0),
            well_empty: Color::from_rgb_u8(255, 255, 255),
            well_filled: Color::from_rgb_u8(0, 0, 255),
            reservoir_outline: Color::from_rgb_u8(0, 0, 0),
            reservoir_default: Color::from_rgb_u8(255, 255, 255),
            reservoir_highlight: Color::from_rgb_u8(173, 216, 230),
        }
    }
}

impl DeckStyle {
    /// Validates the style's sizing constraints.
    ///
    /// Slot dimensions and the well radius must be positive, and the span
    /// fractions must lie in `0.0..=1.0` so labware stays inside its slot.
    pub fn validate(&self) -> Result<(), StyleError> {
        if self.slot_width <= 0.0 || self.slot_height <= 0.0 {
            return Err(StyleError::NonPositiveSlotSize {
                width: self.slot_width,
                height: self.slot_height,
            });
        }
        if self.well_radius <= 0.0 {
            return Err(StyleError::NonPositiveWellRadius {
                radius: self.well_radius,
            });
        }
        for (name, value) in [
            ("labware_span", self.labware_span),
            ("reservoir_depth", self.reservoir_depth),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(StyleError::FractionOutOfRange { name, value });
            }
        }
        Ok(())
    }
}

/// Errors produced when validating a [`DeckStyle`].
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum StyleError {
    /// Slot cells must have a positive pixel area.
    #[error("slot cells must have positive dimensions (received {width}x{height})")]
    NonPositiveSlotSize {
        /// Configured slot width.
        width: f32,
        /// Configured slot height.
        height: f32,
    },
    /// Well markers must have a positive radius.
    #[error("well markers must have a positive radius (received {radius})")]
    NonPositiveWellRadius {
        /// Configured marker radius.
        radius: f32,
    },
    /// Span fractions must keep labware inside its slot cell.
    #[error("{name} must lie in 0.0..=1.0 (received {value})")]
    FractionOutOfRange {
        /// Name of the offending style field.
        name: &'static str,
        /// Configured fraction.
        value: f32,
    },
}

/// Pixel dimensions of a composed frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CanvasSize {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
}

/// Labeled background cell marking one usable deck slot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlotCellPresentation {
    /// Slot the cell represents; backends draw its number as the label.
    pub slot: SlotId,
    /// Top-left corner of the cell in screen space.
    pub origin: Vec2,
    /// Size of the cell in pixels.
    pub size: Vec2,
    /// Interior fill color.
    pub fill: Color,
    /// Border color.
    pub border: Color,
    /// Border thickness in pixels.
    pub border_width: f32,
    /// Color of the slot number label.
    pub label_color: Color,
}

/// Single well marker within the plate grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WellMarker {
    /// Center of the marker in screen space.
    pub center: Vec2,
    /// Radius of the marker in pixels.
    pub radius: f32,
    /// Interior fill color.
    pub fill: Color,
    /// Outline color.
    pub outline: Color,
}

/// Well plate drawn at its observed deck slot.
///
/// Markers are stored row-major with the leading row first, so the first
/// `columns` entries are the markers that carry fill state; every later row
/// is structural only.
#[derive(Clone, Debug, PartialEq)]
pub struct PlateGridPresentation {
    /// Slot the plate occupies.
    pub slot: SlotId,
    /// Well markers in row-major order.
    pub wells: Vec<WellMarker>,
}

/// Single reservoir cell within the reservoir strip.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReservoirCellPresentation {
    /// Top-left corner of the cell in screen space.
    pub origin: Vec2,
    /// Size of the cell in pixels.
    pub size: Vec2,
    /// Interior fill color.
    pub fill: Color,
    /// Outline color.
    pub outline: Color,
}

/// Reservoir strip drawn at its observed deck slot.
#[derive(Clone, Debug, PartialEq)]
pub struct ReservoirPresentation {
    /// Slot the reservoir occupies.
    pub slot: SlotId,
    /// Reservoir cells in ascending column order.
    pub cells: Vec<ReservoirCellPresentation>,
}

/// Scene description consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Pixel dimensions of the frame canvas.
    pub canvas: CanvasSize,
    /// Solid color used to clear the canvas.
    pub background: Color,
    /// Background cells for every usable deck slot.
    pub slots: Vec<SlotCellPresentation>,
    /// Plate grid, present only when the plate slot is known and mapped.
    pub plate: Option<PlateGridPresentation>,
    /// Reservoir strip, present only when the reservoir slot is known and mapped.
    pub reservoir: Option<ReservoirPresentation>,
}

/// Composes one frame into a backend-agnostic scene.
///
/// Grid rows count upward from the deck front, so the composition flips them
/// into y-down screen space: slot 1 lands at the bottom-left of the canvas.
/// Labware whose slot was never observed, or whose slot the layout does not
/// map, is omitted from the scene rather than reported as an error.
#[must_use]
pub fn compose(
    frame: &Frame,
    layout: &DeckLayout,
    labware: &DeckLabware,
    style: &DeckStyle,
) -> Scene {
    let canvas = CanvasSize {
        width: (f32::from(layout.columns()) * style.slot_width).round() as u32,
        height: (f32::from(layout.rows()) * style.slot_height).round() as u32,
    };

    let slots = layout
        .slots()
        .map(|(slot, position)| SlotCellPresentation {
            slot,
            origin: slot_origin(layout, position, style),
            size: Vec2::new(style.slot_width, style.slot_height),
            fill: style.slot_fill,
            border: style.slot_border_color,
            border_width: style.slot_border,
            label_color: style.slot_label_color,
        })
        .collect();

    let plate = frame
        .state
        .plate_slot
        .and_then(|slot| Some((slot, layout.position(slot)?)))
        .map(|(slot, position)| {
            compose_plate(frame, slot, slot_origin(layout, position, style), labware, style)
        });

    let reservoir = frame
        .state
        .reservoir_slot
        .and_then(|slot| Some((slot, layout.position(slot)?)))
        .map(|(slot, position)| {
            compose_reservoir(frame, slot, slot_origin(layout, position, style), labware, style)
        });

    Scene {
        canvas,
        background: style.background,
        slots,
        plate,
        reservoir,
    }
}

fn slot_origin(layout: &DeckLayout, position: GridPosition, style: &DeckStyle) -> Vec2 {
    let flipped_row = layout.rows() - 1 - position.row();
    Vec2::new(
        f32::from(position.column()) * style.slot_width,
        f32::from(flipped_row) * style.slot_height,
    )
}

fn compose_plate(
    frame: &Frame,
    slot: SlotId,
    origin: Vec2,
    labware: &DeckLabware,
    style: &DeckStyle,
) -> PlateGridPresentation {
    let rows = labware.plate.rows();
    let columns = labware.plate.columns();
    let span = Vec2::new(
        style.labware_span * style.slot_width,
        style.labware_span * style.slot_height,
    );
    let inset = Vec2::new(
        (style.slot_width - span.x) / 2.0,
        (style.slot_height - span.y) / 2.0,
    );
    let pitch = Vec2::new(span.x / f32::from(columns), span.y / f32::from(rows));

    let mut wells = Vec::with_capacity(usize::from(rows) * usize::from(columns));
    for row in 0..rows {
        for column in 0..columns {
            let center = origin
                + inset
                + Vec2::new(
                    (f32::from(column) + 0.5) * pitch.x,
                    (f32::from(row) + 0.5) * pitch.y,
                );
            let filled = row == 0
                && frame
                    .state
                    .filled_columns
                    .iter()
                    .any(|candidate| candidate.index() == column);
            wells.push(WellMarker {
                center,
                radius: style.well_radius,
                fill: if filled {
                    style.well_filled
                } else {
                    style.well_empty
                },
                outline: style.well_outline,
            });
        }
    }

    PlateGridPresentation { slot, wells }
}

fn compose_reservoir(
    frame: &Frame,
    slot: SlotId,
    origin: Vec2,
    labware: &DeckLabware,
    style: &DeckStyle,
) -> ReservoirPresentation {
    let columns = labware.reservoir.columns();
    let span_x = style.labware_span * style.slot_width;
    let inset_x = (style.slot_width - span_x) / 2.0;
    let cell = Vec2::new(
        span_x / f32::from(columns),
        style.reservoir_depth * style.slot_height,
    );
    let top = origin.y + (style.slot_height - cell.y) / 2.0;

    let cells = (0..columns)
        .map(|column| {
            let highlighted = frame
                .state
                .reservoir_filled_columns
                .iter()
                .any(|candidate| candidate.index() == column);
            ReservoirCellPresentation {
                origin: Vec2::new(origin.x + inset_x + f32::from(column) * cell.x, top),
                size: cell,
                fill: if highlighted {
                    style.reservoir_highlight
                } else {
                    style.reservoir_default
                },
                outline: style.reservoir_outline,
            }
        })
        .collect();

    ReservoirPresentation { slot, cells }
}

/// Per-frame display duration and looping behavior of the animation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnimationSettings {
    /// How long each frame stays on screen.
    pub frame_duration: Duration,
    /// Whether the assembled animation repeats indefinitely.
    pub looping: bool,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            frame_duration: Duration::from_secs(2),
            looping: true,
        }
    }
}

/// Rendering backend that turns composed scenes into frame artifacts.
///
/// Every scene is self-contained, so implementations may render frames in any
/// order, including concurrently; the returned path identifies the artifact
/// for the given index.
pub trait FrameRenderer {
    /// Renders one scene into the frame artifact for `index`.
    fn render_frame(&self, scene: &Scene, index: FrameIndex) -> AnyResult<PathBuf>;
}

/// Backend that concatenates frame artifacts into one animation artifact.
pub trait AnimationAssembler {
    /// Loads `frame_count` artifacts from `frames_dir` in ascending index
    /// order and encodes the looping animation.
    ///
    /// A missing artifact at any index is fatal; implementations must abort
    /// and report the gap rather than emit a shorter or misordered animation.
    fn assemble(
        &self,
        frames_dir: &Path,
        frame_count: u32,
        settings: &AnimationSettings,
    ) -> AnyResult<PathBuf>;
}
