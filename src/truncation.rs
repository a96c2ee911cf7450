// TCTRUNC TRUNCATION-LEVEL STUDY
// ONE UNIFORM CUT PER BIN, TAKEN AT A PERCENTILE (OVER EVENTS) OF THE
// PER-EVENT MAXIMUM OVER BUNDLES. REPORTS WHAT EACH CUT KEEPS AND COSTS.

use log::debug;

use crate::error::Result;
use crate::histogram::Occupancy;

pub const TRUNCATION_PERCENTILES: [f64; 3] = [99.0, 95.0, 90.0];

// THE CUT COMPARED AGAINST THE BEST LIKELY OCCUPANCY
pub const RATIO_PERCENTILE: f64 = 99.0;

// BEST LIKELY = MEAN + BEST_SPREAD x (MEAN OVER BUNDLES OF THE STD OVER EVENTS)
pub const BEST_SPREAD: f64 = 2.5;

#[derive(Clone, Debug, PartialEq)]
pub struct TruncationLevel {
    pub percentile: f64,
    // ROUNDED TO WHOLE TCs (HALF TO EVEN)
    pub thresholds: Vec<f64>,
    // SUM OVER BINS OF THE LARGEST SAMPLE LEFT AFTER THE CUT
    pub max_sum: f64,
    // PER EVENT: TCs CUT, AVERAGED OVER BUNDLES
    pub truncated_per_bundle: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TruncationReport {
    pub max_per_bin: Vec<f64>,
    pub max_sum: f64,
    pub levels: Vec<TruncationLevel>,
    pub best_likely: Vec<f64>,
    // 0.0 WHERE best_likely IS 0
    pub ratio_to_best: Vec<f64>,
}

fn rounded_percentile(event_max: &Occupancy, p: f64) -> Result<Vec<f64>> {
    Ok(event_max
        .bin_percentile(p)?
        .into_iter()
        .map(f64::round_ties_even)
        .collect())
}

// inclusive: X + Y, FOR THE BEST-LIKELY ESTIMATE.
// profiled: THE ARRAY BEING CUT (X + Y, OR max(X + Y, 2 x Y)).
pub fn truncation_report(
    inclusive: &Occupancy,
    profiled: &Occupancy,
    percentiles: &[f64],
) -> Result<TruncationReport> {
    inclusive.check_same_shape(profiled)?;
    let event_max = profiled.max_over_bundles()?;
    let max_per_bin = event_max.bin_max()?;
    let max_sum: f64 = max_per_bin.iter().sum();
    let bundles = profiled.bundles() as f64;

    let mut levels = Vec::with_capacity(percentiles.len());
    for &percentile in percentiles {
        let thresholds = rounded_percentile(&event_max, percentile)?;
        let kept_sum: f64 = thresholds
            .iter()
            .zip(&max_per_bin)
            .map(|(t, m)| t.min(*m))
            .sum();
        let truncated_per_bundle: Vec<f64> = profiled
            .event_excess(&thresholds)?
            .into_iter()
            .map(|c| c / bundles)
            .collect();
        debug!("p{} cut: max sum {} -> {}", percentile, max_sum, kept_sum);
        levels.push(TruncationLevel {
            percentile,
            thresholds,
            max_sum: kept_sum,
            truncated_per_bundle,
        });
    }

    let mean = inclusive.bin_mean()?;
    let spread = inclusive.mean_bundle_std()?;
    let best_likely: Vec<f64> = mean
        .iter()
        .zip(&spread)
        .map(|(m, s)| m + BEST_SPREAD * s)
        .collect();
    let cut = rounded_percentile(&event_max, RATIO_PERCENTILE)?;
    let ratio_to_best = cut
        .iter()
        .zip(&best_likely)
        .map(|(&c, &b)| if b == 0.0 { 0.0 } else { c / b })
        .collect();

    Ok(TruncationReport {
        max_per_bin,
        max_sum,
        levels,
        best_likely,
        ratio_to_best,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cuts_are_whole_tcs() {
        // ONE BUNDLE, ONE BIN, EVENTS 0..=4: p50 = 2, p30 = 1.2 -> 1, p90 = 3.6 -> 4
        let o = Occupancy::from_flat(5, 1, 1, vec![0.0, 1.0, 2.0, 3.0, 4.0]).unwrap();
        let r = truncation_report(&o, &o, &[50.0, 30.0, 90.0]).unwrap();
        let cuts: Vec<f64> = r.levels.iter().map(|l| l.thresholds[0]).collect();
        assert_eq!(cuts, vec![2.0, 1.0, 4.0]);
    }

    #[test]
    fn no_levels_still_reports_maxima() {
        let o = Occupancy::from_flat(2, 1, 2, vec![1.0, 0.0, 3.0, 0.0]).unwrap();
        let r = truncation_report(&o, &o, &[]).unwrap();
        assert!(r.levels.is_empty());
        assert_eq!(r.max_per_bin, vec![3.0, 0.0]);
        assert_eq!(r.max_sum, 3.0);
        assert_eq!(r.ratio_to_best[1], 0.0);
    }
}
