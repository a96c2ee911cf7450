// TCTRUNC PENALTY OBJECTIVE
// SCORES ONE GLOBAL TRUNCATION FACTOR t AGAINST BOTH REGIONS AT ONCE.
// OVERSHOOTING A CAP COSTS 1.5X WHAT THE SAME UNDERSHOOT COSTS.
//
// A BOUNDED GOLDEN-SECTION SEARCH OVER t IN [-1, 1] DRIVES IT.

use log::debug;

use crate::budget::RegionCaps;
use crate::error::{Result, TruncError};
use crate::histogram::Occupancy;

pub const OVERSHOOT_PENALTY: f64 = -1.5;
pub const TRUNCATION_BOUNDS: (f64, f64) = (-1.0, 1.0);

pub struct TruncationProblem {
    samples_a: Vec<Vec<f64>>,
    samples_b: Vec<Vec<f64>>,
    max_a: Vec<f64>,
    max_b: Vec<f64>,
    envelope: Vec<f64>,
    caps: RegionCaps,
}

impl TruncationProblem {
    pub fn new(region_a: &Occupancy, region_b: &Occupancy, caps: RegionCaps) -> Result<Self> {
        if region_b.bins() != region_a.bins() {
            return Err(TruncError::ShapeMismatch {
                what: "region B bins",
                expected: region_a.bins(),
                found: region_b.bins(),
            });
        }
        let max_a = region_a.bin_max()?;
        let max_b = region_b.bin_max()?;
        let ratio = caps.ratio();
        let envelope = max_a.iter().zip(&max_b).map(|(&a, &b)| a.max(b * ratio)).collect();

        Ok(Self {
            samples_a: (0..region_a.bins()).map(|b| region_a.bin_samples(b)).collect(),
            samples_b: (0..region_b.bins()).map(|b| region_b.bin_samples(b)).collect(),
            max_a,
            max_b,
            envelope,
            caps,
        })
    }

    pub fn envelope(&self) -> &[f64] {
        &self.envelope
    }

    // PER-BIN FLOAT THRESHOLDS IMPLIED BY t (REGION A UNITS)
    pub fn thresholds_at(&self, t: f64) -> Vec<f64> {
        self.envelope.iter().map(|e| t * e).collect()
    }

    pub fn penalty(&self, t: f64) -> f64 {
        let ratio = self.caps.ratio();
        let sum_a = clipped_max_sum(&self.samples_a, &self.max_a, |bin| t * self.envelope[bin]);
        let sum_b = clipped_max_sum(&self.samples_b, &self.max_b, |bin| t * self.envelope[bin] / ratio);

        let mut val_a = self.caps.cap_a() - sum_a;
        let mut val_b = self.caps.cap_b() - sum_b;
        if val_a < 0.0 {
            val_a *= OVERSHOOT_PENALTY;
        }
        if val_b < 0.0 {
            val_b *= OVERSHOOT_PENALTY;
        }
        val_a + val_b
    }

    pub fn solve(&self, params: &MinimizeParams) -> Result<Minimum> {
        let (lo, hi) = TRUNCATION_BOUNDS;
        let m = minimize_bounded(|t| self.penalty(t), lo, hi, params)?;
        debug!("truncation factor {:.6} penalty {:.4} after {} iterations", m.x, m.value, m.iterations);
        Ok(m)
    }
}

// PER BIN: MAX OVER SAMPLES OF (s < T ? s : min(T, bin max)), SUMMED OVER BINS
fn clipped_max_sum(samples: &[Vec<f64>], maxima: &[f64], threshold: impl Fn(usize) -> f64) -> f64 {
    samples
        .iter()
        .zip(maxima)
        .enumerate()
        .map(|(bin, (bin_samples, &max))| {
            let t = threshold(bin);
            let clip = t.min(max);
            bin_samples
                .iter()
                .map(|&s| if s < t { s } else { clip })
                .fold(f64::NEG_INFINITY, f64::max)
        })
        .sum()
}

// --- BOUNDED SCALAR MINIMIZER ---

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MinimizeParams {
    pub xatol: f64,
    pub max_iter: u32,
}

impl Default for MinimizeParams {
    fn default() -> Self {
        Self { xatol: 1e-5, max_iter: 500 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Minimum {
    pub x: f64,
    pub value: f64,
    pub iterations: u32,
    pub converged: bool,
}

// GOLDEN-SECTION SEARCH ON [lo, hi]. ASSUMES f IS UNIMODAL THERE.
pub fn minimize_bounded(
    mut f: impl FnMut(f64) -> f64,
    lo: f64,
    hi: f64,
    params: &MinimizeParams,
) -> Result<Minimum> {
    if !lo.is_finite() || !hi.is_finite() || lo >= hi {
        return Err(TruncError::InvalidParameter { name: "bounds", value: hi - lo });
    }
    if !(params.xatol > 0.0) {
        return Err(TruncError::InvalidParameter { name: "xatol", value: params.xatol });
    }

    let inv_phi = (5f64.sqrt() - 1.0) / 2.0;
    let (mut a, mut b) = (lo, hi);
    let mut c = b - inv_phi * (b - a);
    let mut d = a + inv_phi * (b - a);
    let mut fc = f(c);
    let mut fd = f(d);

    let mut iterations = 0;
    while b - a > params.xatol && iterations < params.max_iter {
        if fc < fd {
            b = d;
            d = c;
            fd = fc;
            c = b - inv_phi * (b - a);
            fc = f(c);
        } else {
            a = c;
            c = d;
            fc = fd;
            d = a + inv_phi * (b - a);
            fd = f(d);
        }
        iterations += 1;
    }

    let x = (a + b) / 2.0;
    Ok(Minimum {
        x,
        value: f(x),
        iterations,
        converged: b - a <= params.xatol,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn golden_section_finds_parabola_minimum() {
        let m = minimize_bounded(|x| (x - 0.3) * (x - 0.3), -1.0, 1.0, &MinimizeParams::default())
            .unwrap();
        assert!(m.converged);
        assert!((m.x - 0.3).abs() < 1e-4);
    }

    #[test]
    fn golden_section_respects_bounds() {
        let m = minimize_bounded(|x| -x, -1.0, 1.0, &MinimizeParams::default()).unwrap();
        assert!(m.x <= 1.0 && m.x > 0.999);
    }

    #[test]
    fn inverted_bounds_rejected() {
        let r = minimize_bounded(|x| x, 1.0, -1.0, &MinimizeParams::default());
        assert!(matches!(r, Err(TruncError::InvalidParameter { name: "bounds", .. })));
    }
}
