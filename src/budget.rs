// TCTRUNC BIN-BUDGET SOLVER
// PER-BIN 99TH PERCENTILES FOR REGIONS A AND B + TWO GLOBAL CAPS
// -> INTEGER PER-BIN CAPACITY VECTOR FOR A (AND B VIA THE RATIO POLICY).
//
// PIPELINE (EACH STAGE TAKES AND RETURNS A WHOLE VECTOR):
//   envelope -> scale_factor -> scaled_budget -> floor_budget
//   -> distribute_deficit -> smooth -> enforce_caps
// ORDER MATTERS: EVERY STAGE READS WHAT THE PREVIOUS ONE WROTE.

use log::{debug, info};

use crate::error::{Result, TruncError};
use crate::histogram::Occupancy;
use crate::policy::{ascending_order, cap_trim_order, region_b_capacity};

pub const BUDGET_PERCENTILE: f64 = 99.0;

pub const DEFAULT_SMOOTHING_PASSES: usize = 1;
pub const DEFAULT_SMOOTHING_WINDOW: usize = 10;

// ABSORBS FLOATING-POINT NOISE WHEN THE SCALED SUM LANDS JUST UNDER AN INTEGER
const ROUNDING_EPS: f64 = 1e-9;

// --- CAPS ---

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RegionCaps {
    cap_a: f64,
    cap_b: f64,
}

impl RegionCaps {
    pub fn new(cap_a: f64, cap_b: f64) -> Result<Self> {
        for (region, value) in [("A", cap_a), ("B", cap_b)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(TruncError::InvalidCapacity { region, value });
            }
        }
        Ok(Self { cap_a, cap_b })
    }

    pub fn cap_a(&self) -> f64 {
        self.cap_a
    }

    pub fn cap_b(&self) -> f64 {
        self.cap_b
    }

    // TCratio = maxTCs_A / maxTCs_B
    pub fn ratio(&self) -> f64 {
        self.cap_a / self.cap_b
    }
}

// --- PARAMETERS ---

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BudgetParams {
    pub smoothing_passes: usize,
    pub smoothing_window: usize,
}

impl Default for BudgetParams {
    fn default() -> Self {
        Self {
            smoothing_passes: DEFAULT_SMOOTHING_PASSES,
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
        }
    }
}

// INTERMEDIATE VECTORS, KEPT FOR REPORTING
#[derive(Clone, Debug, PartialEq)]
pub struct BudgetTrace {
    pub target: Vec<f64>,
    pub scalar: f64,
    pub scaled: Vec<f64>,
    pub floored: Vec<i64>,
    pub deficit: i64,
    pub after_deficit: Vec<i64>,
    pub smoothed: Vec<i64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BudgetSolution {
    pub region_a: Vec<i64>,
    pub region_b: Vec<i64>,
    pub trace: BudgetTrace,
}

// --- STAGES ---

// target[i] = max(pcA[i], pcB[i] * ratio)
pub fn envelope(pc_a: &[f64], pc_b: &[f64], ratio: f64) -> Result<Vec<f64>> {
    if pc_a.is_empty() {
        return Err(TruncError::EmptyInput { what: "zero bins" });
    }
    if pc_a.len() != pc_b.len() {
        return Err(TruncError::ShapeMismatch {
            what: "region B statistic vector",
            expected: pc_a.len(),
            found: pc_b.len(),
        });
    }
    for (bin, &v) in pc_a.iter().chain(pc_b).enumerate() {
        if !v.is_finite() || v < 0.0 {
            return Err(TruncError::InvalidSample { bin: bin % pc_a.len(), value: v });
        }
    }
    Ok(pc_a.iter().zip(pc_b).map(|(&a, &b)| a.max(b * ratio)).collect())
}

// THE TIGHTER OF THE TWO CAPS, IN REGION A UNITS, OVER THE ENVELOPE TOTAL
pub fn scale_factor(target: &[f64], caps: &RegionCaps) -> Result<f64> {
    let total: f64 = target.iter().sum();
    if total <= 0.0 {
        return Err(TruncError::InvalidCapacity { region: "envelope", value: total });
    }
    Ok((caps.cap_a / total).min(caps.cap_b * caps.ratio() / total))
}

pub fn scaled_budget(target: &[f64], scalar: f64) -> Vec<f64> {
    target.iter().map(|t| t * scalar).collect()
}

// FLOOR EVERY BIN. RETURNS THE FLOORED VECTOR AND THE WHOLE SLOTS LOST.
pub fn floor_budget(scaled: &[f64]) -> (Vec<i64>, i64) {
    let floored: Vec<i64> = scaled.iter().map(|v| v.floor() as i64).collect();
    let lost = scaled.iter().sum::<f64>() - floored.iter().sum::<i64>() as f64;
    (floored, (lost + ROUNDING_EPS).floor().max(0.0) as i64)
}

// +1 TO THE `deficit` LOWEST BINS (TIES: LOWER BIN INDEX FIRST)
pub fn distribute_deficit(mut budget: Vec<i64>, deficit: i64) -> Vec<i64> {
    let order = ascending_order(&budget);
    for &i in order.iter().take(deficit.max(0) as usize) {
        budget[i] += 1;
    }
    budget
}

// MOVE ONE UNIT FROM EACH OF THE `window` LARGEST BINS TO EACH OF THE
// `window` SMALLEST, `passes` TIMES. TOTAL IS UNCHANGED.
// A BIN IN BOTH SETS (FEWER THAN 2 * window BINS) NETS TO ZERO.
// A DONOR ALREADY AT ZERO GIVES NOTHING AND ONE RECIPIENT GOES WITHOUT.
pub fn smooth(mut budget: Vec<i64>, params: &BudgetParams) -> Vec<i64> {
    let n = budget.len();
    let window = params.smoothing_window.min(n);
    for _ in 0..params.smoothing_passes {
        let order = ascending_order(&budget);
        let raise = &order[..window];
        let lower = &order[n - window..];

        let mut delta = vec![0i64; n];
        for &i in raise {
            delta[i] += 1;
        }
        for &i in lower {
            delta[i] -= 1;
        }

        let dry: Vec<usize> = (0..n).filter(|&i| delta[i] < 0 && budget[i] == 0).collect();
        let skipped: Vec<usize> = raise
            .iter()
            .rev()
            .copied()
            .filter(|&i| delta[i] > 0)
            .take(dry.len())
            .collect();
        for i in dry.into_iter().chain(skipped) {
            delta[i] = 0;
        }

        for (b, d) in budget.iter_mut().zip(delta) {
            *b += d;
        }
    }
    budget
}

// WHOLE UNITS OVER A CAP; ZERO WITHIN ROUNDING NOISE
fn excess_units(excess: f64) -> i64 {
    if excess > ROUNDING_EPS {
        excess.ceil() as i64
    } else {
        0
    }
}

// -1 FROM THE `diff` SMALLEST NON-ZERO BINS, REPEATED UNTIL PAID OFF
fn trim_smallest(mut budget: Vec<i64>, mut diff: i64) -> Vec<i64> {
    while diff > 0 {
        let order = cap_trim_order(&budget);
        if order.is_empty() {
            break;
        }
        let take = order.len().min(diff as usize);
        for &i in &order[..take] {
            budget[i] -= 1;
        }
        diff -= take as i64;
    }
    budget
}

// HARD CAPS, A THEN B, SO THE SECOND CHECK SEES THE FIRST CORRECTION
pub fn enforce_caps(budget: Vec<i64>, caps: &RegionCaps) -> Vec<i64> {
    let total_a = budget.iter().sum::<i64>() as f64;
    let diff_a = excess_units(total_a - caps.cap_a);
    if diff_a > 0 {
        debug!("cap A exceeded by {}, trimming smallest bins", diff_a);
    }
    let budget = trim_smallest(budget, diff_a);

    let total_b = budget.iter().sum::<i64>() as f64 * (caps.cap_b / caps.cap_a);
    let diff_b = excess_units(total_b - caps.cap_b);
    if diff_b > 0 {
        debug!("cap B exceeded by {}, trimming smallest bins", diff_b);
    }
    trim_smallest(budget, diff_b)
}

// --- SOLVER ---

pub fn solve_bin_budget(
    pc_a: &[f64],
    pc_b: &[f64],
    caps: &RegionCaps,
    params: &BudgetParams,
) -> Result<BudgetSolution> {
    let ratio = caps.ratio();
    let target = envelope(pc_a, pc_b, ratio)?;
    let scalar = scale_factor(&target, caps)?;
    let scaled = scaled_budget(&target, scalar);
    let (floored, deficit) = floor_budget(&scaled);
    debug!("scalar={:.6} floor_sum={} deficit={}", scalar, floored.iter().sum::<i64>(), deficit);

    let after_deficit = distribute_deficit(floored.clone(), deficit);
    let smoothed = smooth(after_deficit.clone(), params);
    let region_a = enforce_caps(smoothed.clone(), caps);
    let region_b = region_b_capacity(&region_a, ratio);

    info!(
        "bin budget: {} bins, sum A={} (cap {}), sum B={} (cap {})",
        region_a.len(),
        region_a.iter().sum::<i64>(),
        caps.cap_a,
        region_b.iter().sum::<i64>(),
        caps.cap_b,
    );

    Ok(BudgetSolution {
        region_a,
        region_b,
        trace: BudgetTrace {
            target,
            scalar,
            scaled,
            floored,
            deficit,
            after_deficit,
            smoothed,
        },
    })
}

// AGGREGATE BOTH REGIONS AT THE 99TH PERCENTILE, THEN SOLVE
pub fn solve_from_regions(
    region_a: &Occupancy,
    region_b: &Occupancy,
    caps: &RegionCaps,
    params: &BudgetParams,
) -> Result<BudgetSolution> {
    let pc_a = region_a.bin_percentile(BUDGET_PERCENTILE)?;
    let pc_b = region_b.bin_percentile(BUDGET_PERCENTILE)?;
    solve_bin_budget(&pc_a, &pc_b, caps, params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excess_ignores_rounding_noise() {
        assert_eq!(excess_units(0.0), 0);
        assert_eq!(excess_units(1e-12), 0);
        assert_eq!(excess_units(-3.0), 0);
        assert_eq!(excess_units(0.2), 1);
        assert_eq!(excess_units(2.0), 2);
    }

    #[test]
    fn trim_smallest_takes_one_per_bin_per_pass() {
        assert_eq!(trim_smallest(vec![4, 1, 2], 2), vec![4, 0, 1]);
        // SECOND PASS SKIPS THE BIN THAT HIT ZERO
        assert_eq!(trim_smallest(vec![4, 1, 2], 4), vec![3, 0, 0]);
        assert_eq!(trim_smallest(vec![5, 5], 0), vec![5, 5]);
    }

    #[test]
    fn trim_smallest_stops_at_all_zero() {
        assert_eq!(trim_smallest(vec![1, 0], 5), vec![0, 0]);
    }

    #[test]
    fn envelope_takes_ratio_scaled_maximum() {
        assert_eq!(envelope(&[10.0, 20.0], &[5.0, 30.0], 2.0), Ok(vec![10.0, 60.0]));
    }
}
