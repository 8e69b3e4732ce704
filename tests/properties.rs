#![allow(non_snake_case)]

use proptest::prelude::*;
use taixiu_bot::{
    dice::{
        RollOutcome,
        classify,
    },
    history::{
        HISTORY_CAPACITY,
        HistoryRing,
        Outcome,
    },
    wager::winnings_for,
};

proptest! {
    #[test]
    fn winnings_for__is_exactly_nineteen_tenths_floored(amount in 0u64..=u64::MAX / 2) {
        let expected = (u128::from(amount) * 19 / 10) as u64;
        prop_assert_eq!(winnings_for(amount), expected);
    }

    #[test]
    fn winnings_for__never_pays_less_than_the_stake(amount in 1u64..=u64::MAX / 2) {
        prop_assert!(winnings_for(amount) >= amount);
    }

    #[test]
    fn history_ring__never_exceeds_capacity(entries in prop::collection::vec(
        prop_oneof![Just(Outcome::High), Just(Outcome::Low)],
        0..100,
    )) {
        let mut ring = HistoryRing::new();
        for entry in &entries {
            ring.push(*entry);
        }
        let kept: Vec<Outcome> = ring.entries().collect();
        prop_assert!(kept.len() <= HISTORY_CAPACITY);

        // the ring keeps the newest entries in arrival order
        let start = entries.len().saturating_sub(HISTORY_CAPACITY);
        prop_assert_eq!(kept, &entries[start..]);
    }
}

#[test]
fn classify__matches_the_threshold_for_every_three_die_combination() {
    for r1 in 1u8..=6 {
        for r2 in 1u8..=6 {
            for r3 in 1u8..=6 {
                let resolved = RollOutcome::from_rolls([r1, r2, r3]);
                let expected = if resolved.total >= 10 {
                    Outcome::High
                } else {
                    Outcome::Low
                };
                assert_eq!(resolved.outcome, expected, "rolls {r1},{r2},{r3}");
            }
        }
    }
}

#[test]
fn classify__boundary_sits_between_nine_and_ten() {
    assert_eq!(classify(9), Outcome::Low);
    assert_eq!(classify(10), Outcome::High);
    assert_eq!(classify(3), Outcome::Low);
    assert_eq!(classify(18), Outcome::High);
}
