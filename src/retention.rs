// TCTRUNC RETENTION CURVE
// FRACTION OF EACH BIN'S TOTAL LOAD THAT SURVIVES A THRESHOLD VECTOR.

use crate::error::{guarded_fraction, Result, TruncError};
use crate::histogram::Occupancy;
use crate::policy::region_b_capacity;

#[derive(Clone, Debug, PartialEq)]
pub struct RetentionReport {
    pub region_a: Vec<f64>,
    pub region_b: Vec<f64>,
    pub thresholds_b: Vec<i64>,
}

// sum(min(sample, thr)) / sum(sample) PER BIN; EMPTY BINS RETAIN 1.0
pub fn retention_fractions(region: &Occupancy, thresholds: &[i64]) -> Result<Vec<f64>> {
    let thr: Vec<f64> = thresholds.iter().map(|&t| t as f64).collect();
    let kept = region.truncated_sums(&thr)?;
    let total = region.bin_sum()?;
    Ok(kept
        .iter()
        .zip(&total)
        .map(|(&k, &t)| guarded_fraction(k, t))
        .collect())
}

// REGION A THRESHOLDS AS GIVEN, REGION B THRESHOLDS VIA THE RATIO POLICY
pub fn retention_report(
    region_a: &Occupancy,
    region_b: &Occupancy,
    thresholds_a: &[i64],
    ratio: f64,
) -> Result<RetentionReport> {
    if !ratio.is_finite() || ratio <= 0.0 {
        return Err(TruncError::InvalidParameter { name: "ratio", value: ratio });
    }
    let thresholds_b = region_b_capacity(thresholds_a, ratio);
    Ok(RetentionReport {
        region_a: retention_fractions(region_a, thresholds_a)?,
        region_b: retention_fractions(region_b, &thresholds_b)?,
        thresholds_b,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bin_retains_everything() {
        // BIN 1 NEVER SEES A HIT
        let o = Occupancy::from_nested(vec![
            vec![vec![4.0, 0.0]],
            vec![vec![2.0, 0.0]],
        ])
        .unwrap();
        let f = retention_fractions(&o, &[3, 0]).unwrap();
        assert_eq!(f, vec![5.0 / 6.0, 1.0]);
    }

    #[test]
    fn report_scales_region_b_thresholds() {
        let a = Occupancy::from_nested(vec![vec![vec![6.0, 2.0]]]).unwrap();
        let b = Occupancy::from_nested(vec![vec![vec![3.0, 1.0]]]).unwrap();
        let r = retention_report(&a, &b, &[3, 2], 2.0).unwrap();
        assert_eq!(r.thresholds_b, vec![2, 1]);
        assert_eq!(r.region_a, vec![0.5, 1.0]);
        assert_eq!(r.region_b, vec![2.0 / 3.0, 1.0]);
    }
}
