#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative deck state management for Deckviz.
//!
//! The [`Deck`] owns the only mutable state in the pipeline. Events recovered
//! by the log parser are executed through the [`apply`] entry point, and every
//! downstream consumer observes the deck exclusively through immutable
//! snapshots captured by [`query::snapshot`]. The [`replay`]
//! driver threads a whole event list through the deck and emits the ordered
//! frame sequence the renderers consume.

use std::collections::BTreeSet;

use deckviz_core::{Event, FillPolicy, Frame, FrameIndex, PlacementFacts, SlotId, WellColumn};

/// Authoritative deck state evolved by replaying plate events.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Deck {
    policy: FillPolicy,
    plate_slot: Option<SlotId>,
    reservoir_slot: Option<SlotId>,
    filled_columns: BTreeSet<WellColumn>,
    reservoir_filled_columns: BTreeSet<WellColumn>,
}

impl Deck {
    /// Creates a deck seeded with the placement facts recovered from parsing.
    ///
    /// `filled_columns` always starts empty; the facts only contribute the
    /// labware slots and the cumulative reservoir usage, which is fixed for
    /// the whole run before replay begins.
    #[must_use]
    pub fn new(policy: FillPolicy, facts: &PlacementFacts) -> Self {
        Self {
            policy,
            plate_slot: facts.plate_slot,
            reservoir_slot: facts.reservoir_slot,
            filled_columns: BTreeSet::new(),
            reservoir_filled_columns: facts.reservoir_filled_columns.clone(),
        }
    }

    /// Policy governing how plate events change column fill state.
    #[must_use]
    pub const fn policy(&self) -> FillPolicy {
        self.policy
    }
}

/// Executes a single event against the deck.
///
/// The event's slot becomes the current plate slot regardless of policy; the
/// set transition is idempotent, so aspirating an absent column or dispensing
/// into a present one leaves `filled_columns` unchanged.
pub fn apply(deck: &mut Deck, event: Event) {
    deck.plate_slot = Some(event.slot());

    match (deck.policy, event) {
        (FillPolicy::Toggle, Event::Dispense { column, .. }) => {
            let _ = deck.filled_columns.insert(column);
        }
        (FillPolicy::Toggle, Event::Aspirate { column, .. }) => {
            let _ = deck.filled_columns.remove(&column);
        }
        (FillPolicy::Accumulate, Event::Dispense { column, .. })
        | (FillPolicy::Accumulate, Event::Aspirate { column, .. }) => {
            let _ = deck.filled_columns.insert(column);
        }
    }
}

/// Read-only access to deck state.
pub mod query {
    use super::Deck;
    use deckviz_core::DeckSnapshot;

    /// Captures an immutable snapshot of the deck's current state.
    #[must_use]
    pub fn snapshot(deck: &Deck) -> DeckSnapshot {
        DeckSnapshot {
            plate_slot: deck.plate_slot,
            reservoir_slot: deck.reservoir_slot,
            filled_columns: deck.filled_columns.clone(),
            reservoir_filled_columns: deck.reservoir_filled_columns.clone(),
        }
    }
}

/// Replays an ordered event list into the frame sequence it describes.
///
/// Emits a baseline frame before any event is applied, then one frame per
/// event in original order, for a total of `events.len() + 1` frames. Replay
/// is deterministic and side-effect free: the same events, facts, and policy
/// always yield the same frames.
#[must_use]
pub fn replay(events: &[Event], facts: &PlacementFacts, policy: FillPolicy) -> Vec<Frame> {
    let mut deck = Deck::new(policy, facts);
    let mut frames = Vec::with_capacity(events.len() + 1);
    frames.push(Frame::new(FrameIndex::new(0), query::snapshot(&deck)));

    for (offset, event) in events.iter().enumerate() {
        apply(&mut deck, *event);
        let index = FrameIndex::new(offset as u32 + 1);
        frames.push(Frame::new(index, query::snapshot(&deck)));
    }

    frames
}

#[cfg(test)]
mod tests {
    use super::{apply, query, replay, Deck};
    use deckviz_core::{Event, FillPolicy, PlacementFacts, SlotId, WellColumn};

    fn slot(number: u8) -> SlotId {
        SlotId::from_number(number).expect("slot number within deck range")
    }

    fn column(index: u8) -> WellColumn {
        WellColumn::from_index(index).expect("column index within labware range")
    }

    fn dispense(index: u8) -> Event {
        Event::Dispense {
            column: column(index),
            slot: slot(3),
        }
    }

    fn aspirate(index: u8) -> Event {
        Event::Aspirate {
            column: column(index),
            slot: slot(3),
        }
    }

    #[test]
    fn replay_emits_baseline_plus_one_frame_per_event() {
        let events = vec![dispense(0), aspirate(0), dispense(1)];
        let frames = replay(&events, &PlacementFacts::default(), FillPolicy::Toggle);

        assert_eq!(frames.len(), events.len() + 1);
        for (position, frame) in frames.iter().enumerate() {
            assert_eq!(frame.index.get() as usize, position);
        }
    }

    #[test]
    fn baseline_frame_reflects_placement_facts_with_empty_plate() {
        let facts = PlacementFacts {
            plate_slot: Some(slot(3)),
            reservoir_slot: Some(slot(2)),
            reservoir_filled_columns: [column(1)].into_iter().collect(),
        };
        let frames = replay(&[], &facts, FillPolicy::Toggle);

        assert_eq!(frames.len(), 1);
        let baseline = &frames[0].state;
        assert_eq!(baseline.plate_slot, Some(slot(3)));
        assert_eq!(baseline.reservoir_slot, Some(slot(2)));
        assert!(baseline.filled_columns.is_empty());
        assert!(baseline.reservoir_filled_columns.contains(&column(1)));
    }

    #[test]
    fn dispensing_twice_is_idempotent() {
        let once = replay(&[dispense(4)], &PlacementFacts::default(), FillPolicy::Toggle);
        let twice = replay(
            &[dispense(4), dispense(4)],
            &PlacementFacts::default(),
            FillPolicy::Toggle,
        );

        assert_eq!(
            once.last().expect("frames present").state.filled_columns,
            twice.last().expect("frames present").state.filled_columns,
        );
    }

    #[test]
    fn aspirating_an_empty_column_leaves_state_unchanged() {
        let mut deck = Deck::new(FillPolicy::Toggle, &PlacementFacts::default());
        let before = query::snapshot(&deck);

        apply(&mut deck, aspirate(6));
        let after = query::snapshot(&deck);

        assert_eq!(after.filled_columns, before.filled_columns);
        assert_eq!(after.plate_slot, Some(slot(3)));
    }

    #[test]
    fn dispense_then_aspirate_restores_prior_fill_state() {
        let events = vec![dispense(0), dispense(2), aspirate(2)];
        let frames = replay(&events, &PlacementFacts::default(), FillPolicy::Toggle);

        assert_eq!(
            frames[1].state.filled_columns,
            frames[3].state.filled_columns,
        );
    }

    #[test]
    fn accumulate_policy_never_clears_columns() {
        let events = vec![dispense(0), aspirate(0), aspirate(5)];
        let frames = replay(&events, &PlacementFacts::default(), FillPolicy::Accumulate);

        let last = &frames.last().expect("frames present").state;
        assert!(last.filled_columns.contains(&column(0)));
        assert!(last.filled_columns.contains(&column(5)));
    }

    #[test]
    fn event_slot_overrides_plate_placement() {
        let events = vec![
            Event::Dispense {
                column: column(0),
                slot: slot(3),
            },
            Event::Dispense {
                column: column(1),
                slot: slot(6),
            },
        ];
        let facts = PlacementFacts {
            plate_slot: Some(slot(1)),
            ..PlacementFacts::default()
        };
        let frames = replay(&events, &facts, FillPolicy::Toggle);

        assert_eq!(frames[0].state.plate_slot, Some(slot(1)));
        assert_eq!(frames[1].state.plate_slot, Some(slot(3)));
        assert_eq!(frames[2].state.plate_slot, Some(slot(6)));
    }

    #[test]
    fn reservoir_usage_is_carried_through_every_frame() {
        let facts = PlacementFacts {
            reservoir_slot: Some(slot(2)),
            reservoir_filled_columns: [column(0), column(1)].into_iter().collect(),
            ..PlacementFacts::default()
        };
        let frames = replay(&[dispense(0)], &facts, FillPolicy::Toggle);

        for frame in &frames {
            assert_eq!(frame.state.reservoir_filled_columns.len(), 2);
            assert_eq!(frame.state.reservoir_slot, Some(slot(2)));
        }
    }
}
