#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Execution-log grammar for Deckviz.
//!
//! The parser converts the raw multi-line log emitted by the liquid-handling
//! runtime into the ordered [`Event`] list and the persistent
//! [`PlacementFacts`] the deck state machine replays. Parsing is a pure
//! function of the input text: the same log always yields the same outcome,
//! and nothing outside the returned structures is touched.
//!
//! Each line is matched against one of two patterns:
//!
//! ```text
//! Aspirating <volume> <unit> from <WellRef> of <Labware> ... on slot <N> ...
//! Dispensing <volume> <unit> into <WellRef> of <Labware> ... on slot <N> ...
//! ```
//!
//! Lines matching neither pattern are ignored; so are matched lines whose
//! labware phrase names neither a 96-well plate nor a 12-well reservoir.
//! Matched, classifiable lines are validated strictly: a well reference or
//! slot outside the labware's bounds aborts parsing with a typed error
//! instead of silently mis-indexing downstream state.

use deckviz_core::{Event, LabwareGeometry, PlacementFacts, SlotId, WellColumn};
use regex::{Captures, Regex};
use thiserror::Error;

/// Substring that identifies 96-well plate labware, as emitted by the runtime.
const PLATE_MARKER: &str = "96 Well Plate";

/// Substring that identifies 12-well reservoir labware.
const RESERVOIR_MARKER: &str = "12 Well Reservoir";

const ASPIRATE_PATTERN: &str = r"^Aspirating\s+\S+\s+\S+\s+from\s+(?P<row>[A-Z])(?P<column>\d{1,2})\s+of\s+(?P<labware>.+?)\s+on\s+slot\s+(?P<slot>\d+)";

const DISPENSE_PATTERN: &str = r"^Dispensing\s+\S+\s+\S+\s+into\s+(?P<row>[A-Z])(?P<column>\d{1,2})\s+of\s+(?P<labware>.+?)\s+on\s+slot\s+(?P<slot>\d+)";

/// Parser owning the compiled event grammar.
#[derive(Clone, Debug)]
pub struct LogParser {
    aspirate: Regex,
    dispense: Regex,
}

impl LogParser {
    /// Compiles the event grammar.
    pub fn new() -> Result<Self, ParseError> {
        Ok(Self {
            aspirate: Regex::new(ASPIRATE_PATTERN)?,
            dispense: Regex::new(DISPENSE_PATTERN)?,
        })
    }

    /// Parses a full execution log into events and placement facts.
    ///
    /// Events appear in the order their originating lines appear in the text.
    /// Reservoir-side aspirations update the facts and contribute no event;
    /// plate-side lines contribute one event each and record the plate slot.
    pub fn parse(&self, text: &str) -> Result<ParseOutcome, ParseError> {
        let mut events = Vec::new();
        let mut facts = PlacementFacts::default();

        for (offset, raw_line) in text.lines().enumerate() {
            let line_number = offset + 1;
            let line = raw_line.trim();

            let matched = if let Some(captures) = self.dispense.captures(line) {
                Some((Action::Dispense, captures))
            } else {
                self.aspirate
                    .captures(line)
                    .map(|captures| (Action::Aspirate, captures))
            };
            let Some((action, captures)) = matched else {
                continue;
            };
            let Some(labware) = LabwareKind::classify(&captures["labware"]) else {
                continue;
            };

            match (action, labware) {
                (Action::Aspirate, LabwareKind::Reservoir) => {
                    let column = well_column(&captures, labware.geometry(), line_number)?;
                    let slot = deck_slot(&captures, line_number)?;
                    let _ = facts.reservoir_filled_columns.insert(column);
                    facts.reservoir_slot = Some(slot);
                }
                (action, LabwareKind::Plate) => {
                    let column = well_column(&captures, labware.geometry(), line_number)?;
                    let slot = deck_slot(&captures, line_number)?;
                    facts.plate_slot = Some(slot);
                    events.push(match action {
                        Action::Aspirate => Event::Aspirate { column, slot },
                        Action::Dispense => Event::Dispense { column, slot },
                    });
                }
                // Dispensing into the reservoir has no routing rule; the
                // reservoir only ever acts as a liquid source here.
                (Action::Dispense, LabwareKind::Reservoir) => {}
            }
        }

        Ok(ParseOutcome { events, facts })
    }
}

/// Ordered events plus the placement facts recovered from one log.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParseOutcome {
    /// Plate-side events in original line order.
    pub events: Vec<Event>,
    /// Labware placements and cumulative reservoir usage.
    pub facts: PlacementFacts,
}

/// Errors produced while parsing an execution log.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The event grammar itself failed to compile.
    #[error("invalid event grammar")]
    Grammar(#[from] regex::Error),
    /// A well row letter lies outside the labware's row span.
    #[error("line {line}: well row '{row}' lies outside the labware rows A..={last_row}")]
    RowOutOfRange {
        /// One-based line number of the offending line.
        line: usize,
        /// Row letter observed in the well reference.
        row: char,
        /// Highest row letter the labware supports.
        last_row: char,
    },
    /// A well column number lies outside the labware's column span.
    #[error("line {line}: well column {label} lies outside the labware columns 1..={columns}")]
    ColumnOutOfRange {
        /// One-based line number of the offending line.
        line: usize,
        /// Column label observed in the well reference.
        label: String,
        /// Number of columns the labware supports.
        columns: u8,
    },
    /// A slot number lies outside the deck's usable slot range.
    #[error(
        "line {line}: slot {number} lies outside the deck slots {first}..={last}",
        first = SlotId::FIRST,
        last = SlotId::LAST
    )]
    SlotOutOfRange {
        /// One-based line number of the offending line.
        line: usize,
        /// Slot number observed on the line.
        number: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Action {
    Aspirate,
    Dispense,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LabwareKind {
    Plate,
    Reservoir,
}

impl LabwareKind {
    /// Classifies a labware phrase by substring, case sensitively.
    fn classify(phrase: &str) -> Option<Self> {
        if phrase.contains(PLATE_MARKER) {
            Some(Self::Plate)
        } else if phrase.contains(RESERVOIR_MARKER) {
            Some(Self::Reservoir)
        } else {
            None
        }
    }

    fn geometry(self) -> LabwareGeometry {
        match self {
            Self::Plate => LabwareGeometry::plate_96(),
            Self::Reservoir => LabwareGeometry::reservoir_12(),
        }
    }
}

fn well_column(
    captures: &Captures<'_>,
    geometry: LabwareGeometry,
    line: usize,
) -> Result<WellColumn, ParseError> {
    let row_text = &captures["row"];
    let Some(row) = row_text.chars().next() else {
        // The pattern admits exactly one letter; an empty capture cannot occur.
        return Err(ParseError::RowOutOfRange {
            line,
            row: '?',
            last_row: last_row_letter(geometry),
        });
    };
    if row as u8 > b'A' + geometry.rows() - 1 {
        return Err(ParseError::RowOutOfRange {
            line,
            row,
            last_row: last_row_letter(geometry),
        });
    }

    let label = &captures["column"];
    label
        .parse::<u8>()
        .ok()
        .and_then(WellColumn::from_label_number)
        .ok_or_else(|| ParseError::ColumnOutOfRange {
            line,
            label: label.to_owned(),
            columns: geometry.columns(),
        })
}

fn deck_slot(captures: &Captures<'_>, line: usize) -> Result<SlotId, ParseError> {
    let number = &captures["slot"];
    number
        .parse::<u8>()
        .ok()
        .and_then(SlotId::from_number)
        .ok_or_else(|| ParseError::SlotOutOfRange {
            line,
            number: number.to_owned(),
        })
}

fn last_row_letter(geometry: LabwareGeometry) -> char {
    (b'A' + geometry.rows() - 1) as char
}
