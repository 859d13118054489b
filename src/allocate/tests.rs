#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::convert::*;
use super::*;
use crate::models::{Category, CategorySet, Edit};

fn make_set(percentages: &[f64]) -> CategorySet {
    CategorySet::new(
        percentages
            .iter()
            .enumerate()
            .map(|(i, p)| Category::new(format!("Cat {i}"), *p))
            .collect(),
    )
    .unwrap()
}

fn assert_percentages(set: &CategorySet, expected: &[f64]) {
    let actual = set.percentages();
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(expected) {
        assert!(
            (a - e).abs() < 1e-9,
            "expected {expected:?}, got {actual:?}"
        );
    }
}

// ── set_percentage ────────────────────────────────────────────

#[test]
fn test_slider_increase_spreads_over_others() {
    let mut set = make_set(&[40.0, 15.0, 25.0, 15.0, 5.0]);
    Allocator::default().set_percentage(&mut set, 0, 60.0).unwrap();
    assert_percentages(&set, &[60.0, 10.0, 15.0, 10.0, 5.0]);
    assert!((set.total_percentage() - 100.0).abs() < 1e-9);
}

#[test]
fn test_slider_decrease_trims_overflow_in_order() {
    let mut set = make_set(&[60.0, 10.0, 15.0, 10.0, 5.0]);
    Allocator::default().set_percentage(&mut set, 0, 40.0).unwrap();
    // Step rounding hands out 25 for a 20 drop; the extra 5 comes off the
    // first other category.
    assert_percentages(&set, &[40.0, 10.0, 25.0, 15.0, 10.0]);
}

#[test]
fn test_small_increase_overshoot_is_refilled() {
    let mut set = make_set(&[60.0, 10.0, 15.0, 10.0, 5.0]);
    Allocator::default().set_percentage(&mut set, 4, 7.0).unwrap();
    assert_percentages(&set, &[58.0, 10.0, 15.0, 10.0, 7.0]);
}

#[test]
fn test_custom_step() {
    let mut set = make_set(&[40.0, 15.0, 25.0, 15.0, 5.0]);
    Allocator::new(1.0)
        .unwrap()
        .set_percentage(&mut set, 0, 60.0)
        .unwrap();
    assert_percentages(&set, &[60.0, 10.0, 17.0, 10.0, 3.0]);
}

#[test]
fn test_no_op_edit_changes_nothing() {
    let mut set = make_set(&[40.0, 15.0, 25.0, 15.0, 5.0]);
    Allocator::default().set_percentage(&mut set, 2, 25.0).unwrap();
    assert_percentages(&set, &[40.0, 15.0, 25.0, 15.0, 5.0]);
}

#[test]
fn test_others_empty_skips_redistribution_then_fills() {
    let mut set = make_set(&[100.0, 0.0, 0.0]);
    Allocator::default().set_percentage(&mut set, 0, 40.0).unwrap();
    assert_percentages(&set, &[40.0, 60.0, 0.0]);
}

#[test]
fn test_single_category_stays_full() {
    let mut set = make_set(&[100.0]);
    Allocator::default().set_percentage(&mut set, 0, 30.0).unwrap();
    assert_percentages(&set, &[100.0]);
}

#[test]
fn test_slider_keeps_amount_shortfall_unallocated() {
    let alloc = Allocator::default();
    let mut set = make_set(&[40.0, 15.0, 25.0, 15.0, 5.0]);
    alloc
        .set_amount(&mut set, 0, dec!(100000), dec!(1000000))
        .unwrap();
    assert_percentages(&set, &[10.0, 15.0, 25.0, 15.0, 5.0]);

    // Transport is already at 15
    alloc.set_percentage(&mut set, 1, 15.0).unwrap();
    assert_percentages(&set, &[10.0, 15.0, 25.0, 15.0, 5.0]);
}

#[test]
fn test_slider_on_short_set_does_not_fill_to_hundred() {
    let mut set = make_set(&[10.0, 20.0, 20.0, 20.0, 0.0]);
    Allocator::default().set_percentage(&mut set, 0, 40.0).unwrap();
    assert_percentages(&set, &[40.0, 10.0, 10.0, 10.0, 0.0]);
    assert!((set.total_percentage() - 70.0).abs() < 1e-9);
}

#[test]
fn test_value_above_range_is_clamped() {
    let mut set = make_set(&[40.0, 15.0, 25.0, 15.0, 5.0]);
    Allocator::default().set_percentage(&mut set, 0, 150.0).unwrap();
    assert_percentages(&set, &[100.0, 0.0, 0.0, 0.0, 0.0]);
}

#[test]
fn test_value_below_range_is_clamped() {
    let mut set = make_set(&[40.0, 15.0, 25.0, 15.0, 5.0]);
    Allocator::default().set_percentage(&mut set, 4, -10.0).unwrap();
    assert_percentages(&set, &[45.0, 15.0, 25.0, 15.0, 0.0]);
}

#[test]
fn test_slider_rejects_bad_input() {
    let alloc = Allocator::default();
    let mut set = make_set(&[50.0, 50.0]);
    assert_eq!(
        alloc.set_percentage(&mut set, 2, 10.0),
        Err(AllocError::IndexOutOfBounds { index: 2, len: 2 })
    );
    assert!(matches!(
        alloc.set_percentage(&mut set, 0, f64::NAN),
        Err(AllocError::NotFinite(_))
    ));

    let mut empty = CategorySet::default();
    assert_eq!(
        alloc.set_percentage(&mut empty, 0, 10.0),
        Err(AllocError::EmptySet)
    );
    // Rejected calls leave the set alone
    assert_percentages(&set, &[50.0, 50.0]);
}

#[test]
fn test_invalid_step() {
    assert_eq!(Allocator::new(0.0), Err(AllocError::InvalidStep(0.0)));
    assert_eq!(Allocator::new(-5.0), Err(AllocError::InvalidStep(-5.0)));
    assert!(Allocator::new(f64::INFINITY).is_err());
    assert_eq!(Allocator::new(2.5).unwrap().step(), 2.5);
}

// ── set_amount ────────────────────────────────────────────────

#[test]
fn test_amount_overflow_reduces_others_continuously() {
    let mut set = make_set(&[100.0, 0.0, 0.0]);
    Allocator::default()
        .set_amount(&mut set, 1, dec!(500000), dec!(1000000))
        .unwrap();
    assert_percentages(&set, &[50.0, 50.0, 0.0]);
}

#[test]
fn test_amount_overflow_is_proportional() {
    let mut set = make_set(&[40.0, 15.0, 25.0, 15.0, 5.0]);
    Allocator::default()
        .set_amount(&mut set, 0, dec!(700000), dec!(1000000))
        .unwrap();
    // Excess of 30 split over 60 points of others: each loses half
    assert_percentages(&set, &[70.0, 7.5, 12.5, 7.5, 2.5]);
}

#[test]
fn test_amount_shortfall_is_left_unallocated() {
    let mut set = make_set(&[40.0, 15.0, 25.0, 15.0, 5.0]);
    Allocator::default()
        .set_amount(&mut set, 0, dec!(100000), dec!(1000000))
        .unwrap();
    assert_percentages(&set, &[10.0, 15.0, 25.0, 15.0, 5.0]);
    assert!((set.total_percentage() - 70.0).abs() < 1e-9);
}

#[test]
fn test_amount_above_total_caps_at_full_share() {
    let mut set = make_set(&[50.0, 50.0]);
    Allocator::default()
        .set_amount(&mut set, 0, dec!(5000), dec!(1000))
        .unwrap();
    assert_percentages(&set, &[100.0, 0.0]);
}

#[test]
fn test_amount_rejects_bad_budget() {
    let alloc = Allocator::default();
    let mut set = make_set(&[50.0, 50.0]);
    assert_eq!(
        alloc.set_amount(&mut set, 0, dec!(10), Decimal::ZERO),
        Err(AllocError::DivisionByZero)
    );
    assert_eq!(
        alloc.set_amount(&mut set, 0, dec!(10), dec!(-100)),
        Err(AllocError::NegativeBudget(dec!(-100)))
    );
    assert_eq!(
        alloc.set_amount(&mut set, 5, dec!(10), dec!(100)),
        Err(AllocError::IndexOutOfBounds { index: 5, len: 2 })
    );
    assert_percentages(&set, &[50.0, 50.0]);
}

// ── apply_recommended_ratios ──────────────────────────────────

#[test]
fn test_recommended_from_reference_amounts() {
    let amounts = [
        dec!(400000),
        dec!(100000),
        dec!(300000),
        dec!(200000),
        dec!(50000),
    ];
    let ratios = normalize_ratios(&amounts).unwrap();
    let mut set = make_set(&[20.0; 5]);
    apply_recommended_ratios(&mut set, &ratios).unwrap();
    assert_percentages(&set, &[38.1, 9.5, 28.6, 19.0, 4.8]);
}

#[test]
fn test_recommended_rounding_error_goes_to_first_max() {
    let mut set = make_set(&[0.0, 0.0, 0.0]);
    apply_recommended_ratios(&mut set, &[33.33, 33.33, 33.33]).unwrap();
    assert_percentages(&set, &[33.4, 33.3, 33.3]);

    let mut set = make_set(&[0.0, 0.0, 0.0]);
    apply_recommended_ratios(&mut set, &[33.36, 33.36, 33.28]).unwrap();
    assert_percentages(&set, &[33.3, 33.4, 33.3]);
}

#[test]
fn test_recommended_is_a_direct_overwrite() {
    let mut set = make_set(&[100.0, 0.0]);
    apply_recommended_ratios(&mut set, &[25.0, 75.0]).unwrap();
    assert_percentages(&set, &[25.0, 75.0]);
}

#[test]
fn test_recommended_rejects_bad_ratios() {
    let mut set = make_set(&[50.0, 50.0]);
    assert_eq!(
        apply_recommended_ratios(&mut set, &[100.0]),
        Err(AllocError::RatioCountMismatch {
            expected: 2,
            actual: 1
        })
    );
    assert!(matches!(
        apply_recommended_ratios(&mut set, &[-10.0, 110.0]),
        Err(AllocError::InvalidRatios(_))
    ));
    assert!(matches!(
        apply_recommended_ratios(&mut set, &[0.0, 0.0]),
        Err(AllocError::InvalidRatios(_))
    ));
    assert!(matches!(
        apply_recommended_ratios(&mut make_set(&[0.0; 3]), &[60.0, 60.0, 60.0]),
        Err(AllocError::InvalidRatios(_))
    ));
    assert!(matches!(
        apply_recommended_ratios(&mut set, &[f64::INFINITY, 0.0]),
        Err(AllocError::NotFinite(_))
    ));
    assert_eq!(
        apply_recommended_ratios(&mut CategorySet::default(), &[]),
        Err(AllocError::EmptySet)
    );
    assert_percentages(&set, &[50.0, 50.0]);
}

#[test]
fn test_normalize_ratios_rejects_degenerate_reference() {
    assert!(normalize_ratios(&[Decimal::ZERO, Decimal::ZERO]).is_err());
    assert!(normalize_ratios(&[dec!(-1), dec!(5)]).is_err());
    assert!(normalize_ratios(&[]).is_err());
}

// ── apply ─────────────────────────────────────────────────────

#[test]
fn test_apply_reports_changes() {
    let mut set = make_set(&[40.0, 15.0, 25.0, 15.0, 5.0]);
    let changes = Allocator::default()
        .apply(
            &mut set,
            dec!(1000000),
            &Edit::Percent {
                index: 0,
                value: 60.0,
            },
        )
        .unwrap();
    let indices: Vec<usize> = changes.iter().map(|c| c.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);
    assert_eq!(changes[0].before, 40.0);
    assert_eq!(changes[0].after, 60.0);
    assert!((changes[2].delta() + 10.0).abs() < 1e-9);
}

#[test]
fn test_apply_amount_and_recommend() {
    let alloc = Allocator::default();
    let mut set = make_set(&[100.0, 0.0, 0.0]);
    let changes = alloc
        .apply(
            &mut set,
            dec!(1000000),
            &Edit::Amount {
                index: 1,
                amount: dec!(500000),
            },
        )
        .unwrap();
    assert_eq!(changes.len(), 2);

    let changes = alloc
        .apply(
            &mut set,
            dec!(1000000),
            &Edit::Recommend {
                ratios: vec![50.0, 50.0, 0.0],
            },
        )
        .unwrap();
    assert!(changes.is_empty());
}

#[test]
fn test_apply_no_op_reports_nothing() {
    let mut set = make_set(&[40.0, 15.0, 25.0, 15.0, 5.0]);
    let changes = Allocator::default()
        .apply(
            &mut set,
            dec!(1000000),
            &Edit::Percent {
                index: 3,
                value: 15.0,
            },
        )
        .unwrap();
    assert!(changes.is_empty());
}

#[test]
fn test_is_balanced() {
    assert!(is_balanced(&make_set(&[40.0, 15.0, 25.0, 15.0, 5.0])));
    assert!(is_balanced(&make_set(&[33.3, 33.3, 33.35])));
    assert!(!is_balanced(&make_set(&[40.0, 15.0])));
}

// ── convert ───────────────────────────────────────────────────

#[test]
fn test_to_amount() {
    assert_eq!(to_amount(40.0, dec!(1000000)), dec!(400000));
    assert_eq!(to_amount(0.0, dec!(1000000)), Decimal::ZERO);
    assert_eq!(to_amount(33.3333, dec!(1000)), dec!(333));
    // Half rounds away from zero
    assert_eq!(to_amount(12.5, dec!(100)), dec!(13));
    assert_eq!(to_amount(50.0, Decimal::ZERO), Decimal::ZERO);
}

#[test]
fn test_to_percentage() {
    assert_eq!(to_percentage(dec!(250000), dec!(1000000)).unwrap(), 25.0);
    assert_eq!(to_percentage(dec!(2000), dec!(1000)).unwrap(), 100.0);
    assert_eq!(to_percentage(dec!(-10), dec!(1000)).unwrap(), 0.0);
    assert_eq!(
        to_percentage(dec!(10), Decimal::ZERO),
        Err(AllocError::DivisionByZero)
    );
    assert_eq!(
        to_percentage(dec!(10), dec!(-1)),
        Err(AllocError::NegativeBudget(dec!(-1)))
    );
}

#[test]
fn test_spending_ratio() {
    assert_eq!(spending_ratio(dec!(50), dec!(200)), 25.0);
    assert_eq!(spending_ratio(dec!(500), dec!(200)), 100.0);
    assert_eq!(spending_ratio(dec!(50), Decimal::ZERO), 0.0);
}

// ── Properties ────────────────────────────────────────────────

fn balanced_set(weights: &[u32]) -> CategorySet {
    let amounts: Vec<Decimal> = weights.iter().map(|w| Decimal::from(*w)).collect();
    let ratios = normalize_ratios(&amounts).unwrap();
    let mut set = make_set(&vec![0.0; weights.len()]);
    apply_recommended_ratios(&mut set, &ratios).unwrap();
    set
}

proptest! {
    #[test]
    fn prop_slider_edits_keep_sum_and_sign(
        weights in prop::collection::vec(1u32..100, 1..8),
        edits in prop::collection::vec((0usize..16, 0.0f64..=100.0), 1..20),
        step in prop_oneof![Just(1.0f64), Just(5.0), Just(10.0)],
    ) {
        let alloc = Allocator::new(step).unwrap();
        let mut set = balanced_set(&weights);
        for (selector, value) in edits {
            let index = selector % set.len();
            alloc.set_percentage(&mut set, index, value).unwrap();
            prop_assert!((set.total_percentage() - 100.0).abs() <= SUM_TOLERANCE);
            prop_assert!(set.iter().all(|c| c.percentage >= 0.0 && c.percentage <= 100.0));
        }
    }

    #[test]
    fn prop_amount_edits_never_go_negative_or_overflow(
        weights in prop::collection::vec(1u32..100, 1..8),
        edits in prop::collection::vec((0usize..16, 0u32..2_000_000), 1..20),
    ) {
        let alloc = Allocator::default();
        let mut set = balanced_set(&weights);
        for (selector, amount) in edits {
            let index = selector % set.len();
            alloc
                .set_amount(&mut set, index, Decimal::from(amount), dec!(1000000))
                .unwrap();
            prop_assert!(set.iter().all(|c| c.percentage >= 0.0));
            prop_assert!(set.total_percentage() <= 100.0 + SUM_TOLERANCE);
        }
    }

    #[test]
    fn prop_no_op_edit_is_identity(
        weights in prop::collection::vec(1u32..100, 1..8),
        selector in 0usize..16,
    ) {
        let mut set = balanced_set(&weights);
        let before = set.percentages();
        let index = selector % set.len();
        Allocator::default().set_percentage(&mut set, index, before[index]).unwrap();
        prop_assert_eq!(set.percentages(), before);
    }

    #[test]
    fn prop_no_op_edit_after_amount_edit_is_identity(
        weights in prop::collection::vec(1u32..100, 2..8),
        amount in 0u32..1_000_000,
        selector in 0usize..16,
    ) {
        let alloc = Allocator::default();
        let mut set = balanced_set(&weights);
        alloc
            .set_amount(&mut set, 0, Decimal::from(amount), dec!(1000000))
            .unwrap();
        let before = set.percentages();
        let index = selector % set.len();
        alloc.set_percentage(&mut set, index, before[index]).unwrap();
        prop_assert_eq!(set.percentages(), before);
    }

    #[test]
    fn prop_recommended_ratios_sum_to_hundred(
        weights in prop::collection::vec(0u32..1_000_000, 1..10)
            .prop_filter("not all zero", |w| w.iter().any(|v| *v > 0)),
    ) {
        let set = balanced_set(&weights);
        prop_assert!((set.total_percentage() - 100.0).abs() <= 0.05);
        prop_assert!(set.iter().all(|c| c.percentage >= 0.0));
    }

    #[test]
    fn prop_amount_round_trip(
        percentage in 0.0f64..=100.0,
        total in 100i64..1_000_000_000,
    ) {
        let total = Decimal::from(total);
        let back = to_percentage(to_amount(percentage, total), total).unwrap();
        prop_assert!((back - percentage).abs() <= 0.5);
    }
}
