use deckviz_core::{Event, FillPolicy, SlotId, WellColumn};
use deckviz_deck::replay;
use deckviz_system_log_parser::LogParser;

fn slot(number: u8) -> SlotId {
    SlotId::from_number(number).expect("slot number within deck range")
}

fn column(index: u8) -> WellColumn {
    WellColumn::from_index(index).expect("column index within labware range")
}

#[test]
fn single_dispense_line_replays_into_two_frames() {
    let text =
        "Dispensing 100.0 uL into A1 of NEST 96 Well Plate 200 µL Flat on slot 3 at 94.0 uL/sec";
    let outcome = LogParser::new()
        .expect("grammar compiles")
        .parse(text)
        .expect("line parses");

    assert_eq!(
        outcome.events,
        vec![Event::Dispense {
            column: column(0),
            slot: slot(3),
        }]
    );

    let frames = replay(&outcome.events, &outcome.facts, FillPolicy::Toggle);
    assert_eq!(frames.len(), 2);
    assert!(frames[0].state.filled_columns.is_empty());
    assert!(frames[1].state.filled_columns.contains(&column(0)));
    assert_eq!(frames[1].state.plate_slot, Some(slot(3)));
}

#[test]
fn dispense_then_aspirate_returns_the_plate_to_empty() {
    let text = "\
        Dispensing 100.0 uL into A1 of NEST 96 Well Plate 200 µL Flat on slot 3 at 94.0 uL/sec\n\
        Aspirating 100.0 uL from A1 of NEST 96 Well Plate 200 µL Flat on slot 3 at 94.0 uL/sec\n";
    let outcome = LogParser::new()
        .expect("grammar compiles")
        .parse(text)
        .expect("lines parse");

    let frames = replay(&outcome.events, &outcome.facts, FillPolicy::Toggle);
    assert_eq!(frames.len(), 3);
    assert!(frames[2].state.filled_columns.is_empty());
}

#[test]
fn reservoir_aspirations_shape_the_baseline_frame_only() {
    let text =
        "Aspirating 100.0 uL from A2 of NEST 12 Well Reservoir 15 mL on slot 2 at 94.0 uL/sec";
    let outcome = LogParser::new()
        .expect("grammar compiles")
        .parse(text)
        .expect("line parses");

    let frames = replay(&outcome.events, &outcome.facts, FillPolicy::Toggle);
    assert_eq!(frames.len(), 1, "reservoir lines contribute no events");

    let baseline = &frames[0].state;
    assert_eq!(baseline.reservoir_slot, Some(slot(2)));
    assert!(baseline.reservoir_filled_columns.contains(&column(1)));
    assert!(baseline.filled_columns.is_empty());
    assert_eq!(baseline.plate_slot, None);
}
