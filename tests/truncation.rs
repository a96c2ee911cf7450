// TCTRUNC TRUNCATION-LEVEL TESTS
// PER-EVENT BUNDLE MAXIMA, PERCENTILE CUTS, CUT COST, RATIO TO BEST

use tctrunc::histogram::Occupancy;
use tctrunc::truncation::{
    truncation_report, BEST_SPREAD, RATIO_PERCENTILE, TRUNCATION_PERCENTILES,
};
use tctrunc::TruncError;

// 5 EVENTS x 2 BUNDLES x 2 BINS. BUNDLE 0 BIN 0 CARRIES 1, 2, 3, 4, 10.
// EVERYTHING ELSE IS EMPTY.
fn spiky() -> Occupancy {
    let events = [1.0, 2.0, 3.0, 4.0, 10.0]
        .iter()
        .map(|&v| vec![vec![v, 0.0], vec![0.0, 0.0]])
        .collect();
    Occupancy::from_nested(events).unwrap()
}

// === DEFAULTS ===

#[test]
fn constants() {
    assert_eq!(TRUNCATION_PERCENTILES, [99.0, 95.0, 90.0]);
    assert_eq!(RATIO_PERCENTILE, 99.0);
    assert_eq!(BEST_SPREAD, 2.5);
}

// === CUTS ===

#[test]
fn cuts_follow_percentiles_of_event_maxima() {
    let o = spiky();
    let r = truncation_report(&o, &o, &TRUNCATION_PERCENTILES).unwrap();

    // p99 = 9.76 -> 10, p95 = 8.8 -> 9, p90 = 7.6 -> 8
    let cuts: Vec<Vec<f64>> = r.levels.iter().map(|l| l.thresholds.clone()).collect();
    assert_eq!(cuts, vec![vec![10.0, 0.0], vec![9.0, 0.0], vec![8.0, 0.0]]);

    assert_eq!(r.max_per_bin, vec![10.0, 0.0]);
    assert_eq!(r.max_sum, 10.0);
    let sums: Vec<f64> = r.levels.iter().map(|l| l.max_sum).collect();
    assert_eq!(sums, vec![10.0, 9.0, 8.0]);
}

#[test]
fn only_the_spike_event_is_cut() {
    let o = spiky();
    let r = truncation_report(&o, &o, &TRUNCATION_PERCENTILES).unwrap();
    // 10 - 9 = 1 AND 10 - 8 = 2 TCs, SPREAD OVER 2 BUNDLES
    assert_eq!(r.levels[0].truncated_per_bundle, vec![0.0; 5]);
    assert_eq!(r.levels[1].truncated_per_bundle, vec![0.0, 0.0, 0.0, 0.0, 0.5]);
    assert_eq!(r.levels[2].truncated_per_bundle, vec![0.0, 0.0, 0.0, 0.0, 1.0]);
}

#[test]
fn event_maximum_is_taken_over_bundles() {
    // THE SPIKE MOVES TO BUNDLE 1 IN THE LAST EVENT: SAME CUTS
    let mut events: Vec<Vec<Vec<f64>>> = [1.0, 2.0, 3.0, 4.0]
        .iter()
        .map(|&v| vec![vec![v, 0.0], vec![0.0, 0.0]])
        .collect();
    events.push(vec![vec![0.0, 0.0], vec![10.0, 0.0]]);
    let o = Occupancy::from_nested(events).unwrap();
    let r = truncation_report(&o, &o, &[90.0]).unwrap();
    assert_eq!(r.levels[0].thresholds, vec![8.0, 0.0]);
}

// === BEST LIKELY ===

#[test]
fn ratio_to_best_uses_mean_and_bundle_spread() {
    let o = spiky();
    let r = truncation_report(&o, &o, &[]).unwrap();
    // MEAN OVER 10 SAMPLES = 2. STD: BUNDLE 0 = sqrt(10), BUNDLE 1 = 0.
    let best = 2.0 + BEST_SPREAD * 10f64.sqrt() / 2.0;
    assert!((r.best_likely[0] - best).abs() < 1e-12);
    assert!((r.ratio_to_best[0] - 10.0 / best).abs() < 1e-12);
    // EMPTY BIN: NO BEST LIKELY, RATIO FALLS BACK TO 0
    assert_eq!(r.best_likely[1], 0.0);
    assert_eq!(r.ratio_to_best[1], 0.0);
}

#[test]
fn best_likely_reads_the_inclusive_array() {
    let o = spiky();
    let flat = Occupancy::from_nested(vec![vec![vec![2.0, 0.0], vec![2.0, 0.0]]; 5]).unwrap();
    let r = truncation_report(&flat, &o, &[]).unwrap();
    // NO SPREAD: BEST LIKELY IS THE MEAN
    assert_eq!(r.best_likely, vec![2.0, 0.0]);
    assert_eq!(r.ratio_to_best[0], 5.0);
}

// === VALIDATION ===

#[test]
fn mismatched_arrays_rejected() {
    let o = spiky();
    let other = Occupancy::from_nested(vec![vec![vec![1.0, 0.0], vec![0.0, 0.0]]]).unwrap();
    assert!(matches!(
        truncation_report(&other, &o, &TRUNCATION_PERCENTILES),
        Err(TruncError::ShapeMismatch { what: "events", .. })
    ));
}

#[test]
fn empty_archive_rejected() {
    let empty = Occupancy::from_nested(vec![]).unwrap();
    assert!(matches!(
        truncation_report(&empty, &empty, &TRUNCATION_PERCENTILES),
        Err(TruncError::EmptyInput { .. })
    ));
}

#[test]
fn bad_percentile_rejected() {
    let o = spiky();
    assert!(matches!(
        truncation_report(&o, &o, &[120.0]),
        Err(TruncError::InvalidParameter { name: "percentile", .. })
    ));
}
