#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Deckviz pipeline.
//!
//! This crate defines the types that connect the log parser, the deck state
//! machine, and the rendering adapters. The parser emits [`Event`] values and
//! [`PlacementFacts`], the deck replays events into immutable
//! [`DeckSnapshot`] values wrapped in ordered [`Frame`] records, and the
//! renderers consume frames together with an immutable [`DeckLayout`]. No
//! stage ever observes mutable state owned by another stage.

use std::{collections::BTreeSet, fmt};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Numbered physical position on the instrument deck that can hold labware.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId(u8);

impl SlotId {
    /// Lowest slot number present on the deck.
    pub const FIRST: u8 = 1;

    /// Highest slot number present on the deck.
    pub const LAST: u8 = 11;

    /// Creates a slot identifier from a deck slot number.
    ///
    /// Returns `None` when the number lies outside the usable
    /// [`FIRST`](Self::FIRST)..=[`LAST`](Self::LAST) range.
    #[must_use]
    pub const fn from_number(number: u8) -> Option<Self> {
        if number >= Self::FIRST && number <= Self::LAST {
            Some(Self(number))
        } else {
            None
        }
    }

    /// Retrieves the one-based deck slot number.
    #[must_use]
    pub const fn number(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Zero-based column index shared by plates and reservoirs.
///
/// Columns are the atomic unit of liquid state: the modeled hardware moves
/// liquid into or out of an entire 8-well column at once, so no per-row fill
/// state exists anywhere in the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WellColumn(u8);

impl WellColumn {
    /// Number of columns on the labware modeled here.
    pub const COUNT: u8 = 12;

    /// Creates a column from the one-based number used in well labels.
    ///
    /// `A1` carries label number 1 and maps to index 0. Returns `None` when
    /// the label number lies outside `1..=`[`COUNT`](Self::COUNT).
    #[must_use]
    pub const fn from_label_number(label: u8) -> Option<Self> {
        if label >= 1 && label <= Self::COUNT {
            Some(Self(label - 1))
        } else {
            None
        }
    }

    /// Creates a column directly from a zero-based index.
    ///
    /// Returns `None` when the index is [`COUNT`](Self::COUNT) or larger.
    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        if index < Self::COUNT {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Zero-based column index.
    #[must_use]
    pub const fn index(&self) -> u8 {
        self.0
    }

    /// One-based column number as printed in well labels.
    #[must_use]
    pub const fn label_number(&self) -> u8 {
        self.0 + 1
    }
}

/// Location of a deck slot expressed as grid column and row coordinates.
///
/// Row zero is the front row of the instrument; renderers are responsible for
/// flipping rows into whatever screen convention they use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPosition {
    column: u8,
    row: u8,
}

impl GridPosition {
    /// Creates a new grid position.
    #[must_use]
    pub const fn new(column: u8, row: u8) -> Self {
        Self { column, row }
    }

    /// Zero-based grid column of the slot.
    #[must_use]
    pub const fn column(&self) -> u8 {
        self.column
    }

    /// Zero-based grid row of the slot, counted from the deck front.
    #[must_use]
    pub const fn row(&self) -> u8 {
        self.row
    }
}

/// Immutable mapping from deck slots to physical grid positions.
///
/// The standard deck is a 4-row by 3-column grid whose last cell carries no
/// slot number. Lookups for slots the layout does not know return `None`, so
/// renderers can simply omit labware whose placement was never observed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckLayout {
    columns: u8,
    rows: u8,
    positions: Vec<(SlotId, GridPosition)>,
}

impl DeckLayout {
    /// Number of grid columns on the standard deck.
    pub const STANDARD_COLUMNS: u8 = 3;

    /// Number of grid rows on the standard deck.
    pub const STANDARD_ROWS: u8 = 4;

    /// Creates a layout from explicit slot/position pairs.
    ///
    /// Positions must lie inside the `columns` by `rows` grid, and neither a
    /// slot nor a grid cell may appear twice.
    pub fn new(
        columns: u8,
        rows: u8,
        mut positions: Vec<(SlotId, GridPosition)>,
    ) -> Result<Self, LayoutError> {
        positions.sort_by_key(|(slot, _)| *slot);

        for (index, (slot, position)) in positions.iter().enumerate() {
            if position.column() >= columns || position.row() >= rows {
                return Err(LayoutError::PositionOutOfBounds {
                    slot: *slot,
                    position: *position,
                    columns,
                    rows,
                });
            }
            for (other_slot, other_position) in positions.iter().skip(index + 1) {
                if slot == other_slot {
                    return Err(LayoutError::DuplicateSlot { slot: *slot });
                }
                if position == other_position {
                    return Err(LayoutError::DuplicateCell {
                        position: *position,
                    });
                }
            }
        }

        Ok(Self {
            columns,
            rows,
            positions,
        })
    }

    /// Returns the standard OT-2 deck arrangement.
    ///
    /// Slots run 1..=11 left to right, front to back, leaving the back-right
    /// grid cell unoccupied.
    #[must_use]
    pub fn ot2() -> Self {
        let positions = (SlotId::FIRST..=SlotId::LAST)
            .filter_map(|number| {
                let slot = SlotId::from_number(number)?;
                let position = GridPosition::new(
                    (number - 1) % Self::STANDARD_COLUMNS,
                    (number - 1) / Self::STANDARD_COLUMNS,
                );
                Some((slot, position))
            })
            .collect();

        Self {
            columns: Self::STANDARD_COLUMNS,
            rows: Self::STANDARD_ROWS,
            positions,
        }
    }

    /// Number of grid columns in the layout.
    #[must_use]
    pub const fn columns(&self) -> u8 {
        self.columns
    }

    /// Number of grid rows in the layout.
    #[must_use]
    pub const fn rows(&self) -> u8 {
        self.rows
    }

    /// Number of usable slots the layout knows about.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.positions.len()
    }

    /// Returns the grid position of the provided slot, if the layout maps it.
    #[must_use]
    pub fn position(&self, slot: SlotId) -> Option<GridPosition> {
        self.positions
            .binary_search_by_key(&slot, |(candidate, _)| *candidate)
            .ok()
            .map(|index| self.positions[index].1)
    }

    /// Iterator over all mapped slots in ascending slot order.
    pub fn slots(&self) -> impl Iterator<Item = (SlotId, GridPosition)> + '_ {
        self.positions.iter().copied()
    }
}

/// Errors produced when constructing a [`DeckLayout`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// A slot identifier was assigned to more than one grid cell.
    #[error("slot {slot} appears more than once in the layout")]
    DuplicateSlot {
        /// Slot that appeared twice.
        slot: SlotId,
    },
    /// A grid cell was assigned to more than one slot.
    #[error(
        "grid cell ({}, {}) is assigned to more than one slot",
        .position.column(),
        .position.row()
    )]
    DuplicateCell {
        /// Cell that appeared twice.
        position: GridPosition,
    },
    /// A slot was placed outside the configured grid bounds.
    #[error(
        "slot {slot} at grid cell ({}, {}) lies outside the {columns}x{rows} grid",
        .position.column(),
        .position.row()
    )]
    PositionOutOfBounds {
        /// Slot whose position failed validation.
        slot: SlotId,
        /// Offending grid cell.
        position: GridPosition,
        /// Number of grid columns in the layout under construction.
        columns: u8,
        /// Number of grid rows in the layout under construction.
        rows: u8,
    },
}

/// Row and column extent of a piece of labware.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LabwareGeometry {
    rows: u8,
    columns: u8,
}

impl LabwareGeometry {
    /// Creates a geometry descriptor with explicit dimensions.
    #[must_use]
    pub const fn new(rows: u8, columns: u8) -> Self {
        Self { rows, columns }
    }

    /// Geometry of a 96-well plate: 8 rows (A..H) by 12 columns.
    #[must_use]
    pub const fn plate_96() -> Self {
        Self::new(8, 12)
    }

    /// Geometry of a 12-well reservoir: a single row of 12 columns.
    #[must_use]
    pub const fn reservoir_12() -> Self {
        Self::new(1, 12)
    }

    /// Number of well rows.
    #[must_use]
    pub const fn rows(&self) -> u8 {
        self.rows
    }

    /// Number of well columns.
    #[must_use]
    pub const fn columns(&self) -> u8 {
        self.columns
    }

    /// Total number of wells on the labware.
    #[must_use]
    pub const fn well_count(&self) -> u16 {
        self.rows as u16 * self.columns as u16
    }
}

/// Plate-side pipetting action recovered from one log line.
///
/// Reservoir-side aspirations never become events; the parser folds them into
/// [`PlacementFacts`] instead, because reservoir usage is contextual rather
/// than animated step by step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Event {
    /// Liquid was drawn out of a plate column.
    Aspirate {
        /// Column the liquid was drawn from.
        column: WellColumn,
        /// Deck slot holding the plate on this line.
        slot: SlotId,
    },
    /// Liquid was deposited into a plate column.
    Dispense {
        /// Column the liquid was deposited into.
        column: WellColumn,
        /// Deck slot holding the plate on this line.
        slot: SlotId,
    },
}

impl Event {
    /// Column the event acts on.
    #[must_use]
    pub const fn column(&self) -> WellColumn {
        match self {
            Self::Aspirate { column, .. } | Self::Dispense { column, .. } => *column,
        }
    }

    /// Deck slot observed on the event's originating line.
    #[must_use]
    pub const fn slot(&self) -> SlotId {
        match self {
            Self::Aspirate { slot, .. } | Self::Dispense { slot, .. } => *slot,
        }
    }
}

/// Named state-transition policy applied when replaying plate events.
///
/// The two variants preserve the two historical interpretations of the log:
/// [`Toggle`](Self::Toggle) models physical liquid movement, while
/// [`Accumulate`](Self::Accumulate) only ever marks columns as touched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillPolicy {
    /// Dispense fills a column; aspirate clears it again.
    #[default]
    Toggle,
    /// Every plate event marks its column filled; nothing clears a column.
    Accumulate,
}

/// Labware placement and reservoir usage recovered from a full log scan.
///
/// These facts are known before replay starts, so the baseline frame can show
/// labware that the log only references later. Slots are single-valued for a
/// run; when the log mentions several, the last observation wins.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementFacts {
    /// Slot that holds the well plate, if any plate line was observed.
    pub plate_slot: Option<SlotId>,
    /// Slot that holds the reservoir, if any reservoir line was observed.
    pub reservoir_slot: Option<SlotId>,
    /// Reservoir columns that liquid was drawn from at any point in the run.
    pub reservoir_filled_columns: BTreeSet<WellColumn>,
}

/// Immutable snapshot of deck state captured after a simulated step.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeckSnapshot {
    /// Slot that holds the well plate, if known at this step.
    pub plate_slot: Option<SlotId>,
    /// Slot that holds the reservoir, if known at this step.
    pub reservoir_slot: Option<SlotId>,
    /// Plate columns currently holding liquid.
    pub filled_columns: BTreeSet<WellColumn>,
    /// Reservoir columns used so far; never shrinks within a run.
    pub reservoir_filled_columns: BTreeSet<WellColumn>,
}

/// Ordinal position of a frame within the animation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FrameIndex(u32);

impl FrameIndex {
    /// Creates a frame index with the provided ordinal value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric ordinal of the frame.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for FrameIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One immutable deck-state snapshot tagged with its ordinal index.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Frame {
    /// Position of the frame within the animation.
    pub index: FrameIndex,
    /// Deck state captured when the frame was emitted.
    pub state: DeckSnapshot,
}

impl Frame {
    /// Creates a frame from an index and a captured snapshot.
    #[must_use]
    pub const fn new(index: FrameIndex, state: DeckSnapshot) -> Self {
        Self { index, state }
    }
}
