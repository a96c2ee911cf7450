// TCTRUNC HISTOGRAM AGGREGATOR
// REDUCES event x bundle x bin OCCUPANCY ARRAYS TO PER-BIN STATISTICS.
// PURE FUNCTIONS OF AN IMMUTABLE ARRAY: SAME INPUT, BIT-IDENTICAL OUTPUT.

use crate::error::{Result, TruncError};

// --- OCCUPANCY ARRAY ---

// ROW-MAJOR [event][bundle][bin]. SAMPLES ARE NON-NEGATIVE AND FINITE
// (FRACTIONAL AFTER GEOMETRIC CORRECTION).
#[derive(Clone, Debug, PartialEq)]
pub struct Occupancy {
    events: usize,
    bundles: usize,
    bins: usize,
    data: Vec<f64>,
}

// PER-BUNDLE PROFILE OVER EVENTS
#[derive(Clone, Debug, PartialEq)]
pub struct BundleProfile {
    pub max: Vec<f64>,
    pub mean: Vec<f64>,
    pub mean_plus_std: Vec<f64>,
}

impl Occupancy {
    pub fn from_flat(events: usize, bundles: usize, bins: usize, data: Vec<f64>) -> Result<Self> {
        let expected = events * bundles * bins;
        if data.len() != expected {
            return Err(TruncError::ShapeMismatch {
                what: "occupancy buffer",
                expected,
                found: data.len(),
            });
        }
        if bins > 0 {
            for (i, &v) in data.iter().enumerate() {
                if !v.is_finite() || v < 0.0 {
                    return Err(TruncError::InvalidSample { bin: i % bins, value: v });
                }
            }
        }
        Ok(Self { events, bundles, bins, data })
    }

    // events[e][bundle][bin]. EVERY EVENT MUST HAVE THE SAME BUNDLE AND BIN COUNT.
    pub fn from_nested(events: Vec<Vec<Vec<f64>>>) -> Result<Self> {
        let n_events = events.len();
        let n_bundles = events.first().map_or(0, |e| e.len());
        let n_bins = events
            .first()
            .and_then(|e| e.first())
            .map_or(0, |b| b.len());

        let mut data = Vec::with_capacity(n_events * n_bundles * n_bins);
        for event in events {
            if event.len() != n_bundles {
                return Err(TruncError::ShapeMismatch {
                    what: "bundles per event",
                    expected: n_bundles,
                    found: event.len(),
                });
            }
            for bundle in event {
                if bundle.len() != n_bins {
                    return Err(TruncError::ShapeMismatch {
                        what: "bins per bundle",
                        expected: n_bins,
                        found: bundle.len(),
                    });
                }
                data.extend(bundle);
            }
        }
        Self::from_flat(n_events, n_bundles, n_bins, data)
    }

    pub fn events(&self) -> usize {
        self.events
    }

    pub fn bundles(&self) -> usize {
        self.bundles
    }

    pub fn bins(&self) -> usize {
        self.bins
    }

    pub fn get(&self, event: usize, bundle: usize, bin: usize) -> f64 {
        self.data[(event * self.bundles + bundle) * self.bins + bin]
    }

    // NUMBER OF (event, bundle) SAMPLES PER BIN
    pub fn samples_per_bin(&self) -> usize {
        self.events * self.bundles
    }

    fn ensure_populated(&self) -> Result<()> {
        if self.events == 0 {
            return Err(TruncError::EmptyInput { what: "zero events" });
        }
        if self.bundles == 0 {
            return Err(TruncError::EmptyInput { what: "zero bundles" });
        }
        if self.bins == 0 {
            return Err(TruncError::EmptyInput { what: "zero bins" });
        }
        Ok(())
    }

    pub(crate) fn check_same_shape(&self, other: &Occupancy) -> Result<()> {
        let dims = [
            ("events", self.events, other.events),
            ("bundles", self.bundles, other.bundles),
            ("bins", self.bins, other.bins),
        ];
        for (what, expected, found) in dims {
            if expected != found {
                return Err(TruncError::ShapeMismatch { what, expected, found });
            }
        }
        Ok(())
    }

    // ROWS OF LENGTH bins, ONE PER (event, bundle)
    fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.bins.max(1))
    }

    // ALL SAMPLES OF ONE BIN, FLATTENED OVER EVENTS AND BUNDLES
    pub fn bin_samples(&self, bin: usize) -> Vec<f64> {
        self.rows().map(|row| row[bin]).collect()
    }

    pub fn bin_max(&self) -> Result<Vec<f64>> {
        self.ensure_populated()?;
        let mut out = vec![f64::NEG_INFINITY; self.bins];
        for row in self.rows() {
            for (m, &v) in out.iter_mut().zip(row) {
                *m = m.max(v);
            }
        }
        Ok(out)
    }

    pub fn bin_sum(&self) -> Result<Vec<f64>> {
        self.ensure_populated()?;
        let mut out = vec![0.0; self.bins];
        for row in self.rows() {
            for (s, &v) in out.iter_mut().zip(row) {
                *s += v;
            }
        }
        Ok(out)
    }

    pub fn bin_mean(&self) -> Result<Vec<f64>> {
        let n = self.samples_per_bin() as f64;
        Ok(self.bin_sum()?.into_iter().map(|s| s / n).collect())
    }

    // p-TH PERCENTILE PER BIN, LINEAR INTERPOLATION BETWEEN ORDER STATISTICS
    pub fn bin_percentile(&self, p: f64) -> Result<Vec<f64>> {
        if !(0.0..=100.0).contains(&p) {
            return Err(TruncError::InvalidParameter { name: "percentile", value: p });
        }
        self.ensure_populated()?;
        Ok((0..self.bins)
            .map(|bin| {
                let mut samples = self.bin_samples(bin);
                samples.sort_by(|a, b| a.total_cmp(b));
                percentile_sorted(&samples, p)
            })
            .collect())
    }

    // PER BIN: sum(min(sample, thresholds[bin]))
    pub fn truncated_sums(&self, thresholds: &[f64]) -> Result<Vec<f64>> {
        self.ensure_populated()?;
        if thresholds.len() != self.bins {
            return Err(TruncError::ShapeMismatch {
                what: "threshold vector",
                expected: self.bins,
                found: thresholds.len(),
            });
        }
        let mut out = vec![0.0; self.bins];
        for row in self.rows() {
            for ((s, &v), &t) in out.iter_mut().zip(row).zip(thresholds) {
                *s += v.min(t);
            }
        }
        Ok(out)
    }

    // ELEMENT-WISE SUM OF TWO REGIONS WITH IDENTICAL SHAPE
    pub fn combined(&self, other: &Occupancy) -> Result<Occupancy> {
        self.check_same_shape(other)?;
        let data = self.data.iter().zip(&other.data).map(|(a, b)| a + b).collect();
        Ok(Occupancy { data, ..*self })
    }

    // ELEMENT-WISE max(self, other * factor), PER EVENT AND BUNDLE
    pub fn envelope_with(&self, other: &Occupancy, factor: f64) -> Result<Occupancy> {
        self.check_same_shape(other)?;
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| a.max(b * factor))
            .collect();
        Ok(Occupancy { data, ..*self })
    }

    // EVERY SAMPLE MULTIPLIED BY factor
    pub fn scaled(&self, factor: f64) -> Result<Occupancy> {
        if !factor.is_finite() || factor < 0.0 {
            return Err(TruncError::InvalidParameter { name: "scale factor", value: factor });
        }
        let data = self.data.iter().map(|v| v * factor).collect();
        Ok(Occupancy { data, ..*self })
    }

    // PER EVENT AND BIN: MAX OVER BUNDLES. RESULT HAS ONE BUNDLE.
    pub fn max_over_bundles(&self) -> Result<Occupancy> {
        self.ensure_populated()?;
        let mut data = vec![f64::NEG_INFINITY; self.events * self.bins];
        for (i, row) in self.rows().enumerate() {
            let event = i / self.bundles;
            let out = &mut data[event * self.bins..(event + 1) * self.bins];
            for (m, &v) in out.iter_mut().zip(row) {
                *m = m.max(v);
            }
        }
        Ok(Occupancy { bundles: 1, data, ..*self })
    }

    // PER EVENT: SUM OVER BUNDLES AND BINS OF WHAT thresholds CUT AWAY
    pub fn event_excess(&self, thresholds: &[f64]) -> Result<Vec<f64>> {
        self.ensure_populated()?;
        if thresholds.len() != self.bins {
            return Err(TruncError::ShapeMismatch {
                what: "threshold vector",
                expected: self.bins,
                found: thresholds.len(),
            });
        }
        let mut out = vec![0.0; self.events];
        for (i, row) in self.rows().enumerate() {
            out[i / self.bundles] += row
                .iter()
                .zip(thresholds)
                .map(|(&v, &t)| (v - t).max(0.0))
                .sum::<f64>();
        }
        Ok(out)
    }

    // PER BIN: MEAN OVER BUNDLES OF THE STD OVER EVENTS
    pub fn mean_bundle_std(&self) -> Result<Vec<f64>> {
        self.ensure_populated()?;
        let mut out = vec![0.0; self.bins];
        for bundle in 0..self.bundles {
            let (_, _, std) = self.bundle_moments(bundle);
            for (o, s) in out.iter_mut().zip(std) {
                *o += s;
            }
        }
        let n = self.bundles as f64;
        Ok(out.into_iter().map(|s| s / n).collect())
    }

    // MAX, MEAN AND MEAN+STD OF ONE BUNDLE, REDUCED OVER EVENTS ONLY
    pub fn bundle_profile(&self, bundle: usize) -> Result<BundleProfile> {
        self.ensure_populated()?;
        if bundle >= self.bundles {
            return Err(TruncError::ShapeMismatch {
                what: "bundle index",
                expected: self.bundles,
                found: bundle,
            });
        }
        let (max, mean, std) = self.bundle_moments(bundle);
        let mean_plus_std = mean.iter().zip(&std).map(|(m, s)| m + s).collect();
        Ok(BundleProfile { max, mean, mean_plus_std })
    }

    // (MAX, MEAN, POPULATION STD) OVER EVENTS. CALLER CHECKS bundle AND POPULATION.
    fn bundle_moments(&self, bundle: usize) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let n = self.events as f64;
        let mut max = vec![f64::NEG_INFINITY; self.bins];
        let mut sum = vec![0.0; self.bins];
        for e in 0..self.events {
            for bin in 0..self.bins {
                let v = self.get(e, bundle, bin);
                max[bin] = max[bin].max(v);
                sum[bin] += v;
            }
        }
        let mean: Vec<f64> = sum.iter().map(|s| s / n).collect();

        // POPULATION STD (ddof = 0)
        let mut sq = vec![0.0; self.bins];
        for e in 0..self.events {
            for bin in 0..self.bins {
                let d = self.get(e, bundle, bin) - mean[bin];
                sq[bin] += d * d;
            }
        }
        let std = sq.iter().map(|s| (s / n).sqrt()).collect();
        (max, mean, std)
    }
}

// SAMPLES MUST BE SORTED ASCENDING AND NON-EMPTY
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Occupancy {
        // 2 EVENTS x 2 BUNDLES x 3 BINS
        Occupancy::from_nested(vec![
            vec![vec![1.0, 0.0, 4.0], vec![3.0, 2.0, 0.0]],
            vec![vec![5.0, 0.0, 2.0], vec![7.0, 6.0, 0.0]],
        ])
        .unwrap()
    }

    #[test]
    fn max_mean_sum_per_bin() {
        let o = sample();
        assert_eq!(o.bin_max().unwrap(), vec![7.0, 6.0, 4.0]);
        assert_eq!(o.bin_sum().unwrap(), vec![16.0, 8.0, 6.0]);
        assert_eq!(o.bin_mean().unwrap(), vec![4.0, 2.0, 1.5]);
    }

    #[test]
    fn percentile_interpolates_linearly() {
        let o = sample();
        // BIN 0 SORTED: 1 3 5 7. p50 -> RANK 1.5 -> 4.0
        assert_eq!(o.bin_percentile(50.0).unwrap()[0], 4.0);
        // p99 -> RANK 2.97 -> 5 + 2*0.97
        let p99 = o.bin_percentile(99.0).unwrap()[0];
        assert!((p99 - 6.94).abs() < 1e-12);
        assert_eq!(o.bin_percentile(100.0).unwrap(), o.bin_max().unwrap());
    }

    #[test]
    fn percentile_rejects_out_of_range() {
        assert!(matches!(
            sample().bin_percentile(101.0),
            Err(TruncError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn zero_events_is_empty_input() {
        let o = Occupancy::from_nested(vec![]).unwrap();
        assert_eq!(o.bin_max(), Err(TruncError::EmptyInput { what: "zero events" }));
        assert!(o.bin_percentile(99.0).is_err());
    }

    #[test]
    fn ragged_input_rejected() {
        let r = Occupancy::from_nested(vec![vec![vec![1.0, 2.0], vec![1.0]]]);
        assert!(matches!(r, Err(TruncError::ShapeMismatch { what: "bins per bundle", .. })));
    }

    #[test]
    fn negative_sample_rejected() {
        let r = Occupancy::from_flat(1, 1, 2, vec![1.0, -1.0]);
        assert_eq!(r, Err(TruncError::InvalidSample { bin: 1, value: -1.0 }));
    }

    #[test]
    fn aggregation_is_repeatable() {
        let o = sample();
        let a = o.bin_percentile(99.0).unwrap();
        let b = o.bin_percentile(99.0).unwrap();
        assert_eq!(a.iter().map(|v| v.to_bits()).collect::<Vec<_>>(),
                   b.iter().map(|v| v.to_bits()).collect::<Vec<_>>());
    }

    #[test]
    fn truncated_sums_clip_each_sample() {
        let o = sample();
        assert_eq!(o.truncated_sums(&[4.0, 1.0, 10.0]).unwrap(), vec![12.0, 2.0, 6.0]);
    }

    #[test]
    fn combined_and_envelope() {
        let o = sample();
        let c = o.combined(&o).unwrap();
        assert_eq!(c.get(1, 1, 0), 14.0);
        let env = o.envelope_with(&c, 0.25).unwrap();
        // max(7, 14 * 0.25)
        assert_eq!(env.get(1, 1, 0), 7.0);
        // max(0, 0)
        assert_eq!(env.get(0, 0, 1), 0.0);
    }

    #[test]
    fn max_over_bundles_keeps_events() {
        let m = sample().max_over_bundles().unwrap();
        assert_eq!((m.events(), m.bundles(), m.bins()), (2, 1, 3));
        assert_eq!(m.bin_samples(0), vec![3.0, 7.0]);
        assert_eq!(m.bin_samples(1), vec![2.0, 6.0]);
        assert_eq!(m.bin_samples(2), vec![4.0, 2.0]);
    }

    #[test]
    fn event_excess_sums_what_is_cut() {
        assert_eq!(sample().event_excess(&[4.0, 1.0, 10.0]).unwrap(), vec![1.0, 9.0]);
        assert!(sample().event_excess(&[1.0]).is_err());
    }

    #[test]
    fn mean_bundle_std_averages_bundles() {
        assert_eq!(sample().mean_bundle_std().unwrap(), vec![2.0, 1.0, 0.5]);
    }

    #[test]
    fn scaled_multiplies_every_sample() {
        let half = sample().scaled(0.5).unwrap();
        assert_eq!(half.get(1, 1, 0), 3.5);
        assert!(sample().scaled(f64::NAN).is_err());
    }

    #[test]
    fn bundle_profile_reduces_over_events() {
        let p = sample().bundle_profile(1).unwrap();
        assert_eq!(p.max, vec![7.0, 6.0, 0.0]);
        assert_eq!(p.mean, vec![5.0, 4.0, 0.0]);
        assert_eq!(p.mean_plus_std, vec![7.0, 6.0, 0.0]);
    }
}
