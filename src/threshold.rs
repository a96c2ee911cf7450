// TCTRUNC THRESHOLD-SEARCH SOLVER
// INVERSE OF THE BIN BUDGET: FOR EACH BIN FIND THE INTEGER THRESHOLD WHOSE
// TRUNCATED SUM SITS CLOSEST TO A TARGET FRACTION OF THE BIN'S TOTAL LOAD,
// THEN HAND THE LEFTOVER BUDGET TO THE LOWEST BINS.

use log::{debug, info, warn};

use crate::error::{Result, TruncError};
use crate::histogram::Occupancy;
use crate::policy::{ascending_order, descending_order, SparePolicy};

pub const DEFAULT_RETENTION: f64 = 0.993;
pub const DEFAULT_MAX_THRESHOLD: u32 = 40;
pub const DEFAULT_FALLBACK_THRESHOLD: u32 = 1;
pub const DEFAULT_TARGET_TOTAL: i64 = 400;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThresholdParams {
    pub retention: f64,
    pub max_threshold: u32,
    // USED WHEN NO THRESHOLD IN RANGE DROPS BELOW TARGET (EMPTY / ALL-ZERO BIN)
    pub fallback: u32,
    pub target_total: i64,
    pub spare_policy: SparePolicy,
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self {
            retention: DEFAULT_RETENTION,
            max_threshold: DEFAULT_MAX_THRESHOLD,
            fallback: DEFAULT_FALLBACK_THRESHOLD,
            target_total: DEFAULT_TARGET_TOTAL,
            spare_policy: SparePolicy::default(),
        }
    }
}

impl ThresholdParams {
    fn validate(&self) -> Result<()> {
        if !(self.retention > 0.0 && self.retention <= 1.0) {
            return Err(TruncError::InvalidParameter { name: "retention", value: self.retention });
        }
        if self.target_total < 0 {
            return Err(TruncError::InvalidParameter {
                name: "target_total",
                value: self.target_total as f64,
            });
        }
        Ok(())
    }
}

fn truncated_sum(samples: &[f64], x: f64) -> f64 {
    samples.iter().map(|s| s.min(x)).sum()
}

// SCAN x DOWN FROM max_threshold. AT THE FIRST x WHOSE TRUNCATED SUM FALLS
// BELOW TARGET, PICK x OR x+1, WHICHEVER IS CLOSER (TIE -> x+1).
// x+1 NEVER LEAVES [0, max_threshold].
pub fn search_bin_threshold(samples: &[f64], params: &ThresholdParams) -> Result<i64> {
    params.validate()?;
    if samples.is_empty() {
        return Err(TruncError::EmptyInput { what: "bin without samples" });
    }
    let target = params.retention * samples.iter().sum::<f64>();

    for x in (0..=params.max_threshold).rev() {
        let below = truncated_sum(samples, x as f64);
        if below >= target {
            continue;
        }
        if x == params.max_threshold {
            return Ok(x as i64);
        }
        let above = truncated_sum(samples, (x + 1) as f64);
        return Ok(if (target - below).abs() < (target - above).abs() {
            x as i64
        } else {
            x as i64 + 1
        });
    }
    Ok(params.fallback as i64)
}

// POSITIVE SPARE: +1 TO THE `spare` SMALLEST THRESHOLDS (ONE PASS).
// NEGATIVE SPARE: PER SparePolicy. TrimLargest ALWAYS LANDS ON target_total.
pub fn distribute_spare(
    mut thresholds: Vec<i64>,
    target_total: i64,
    policy: SparePolicy,
) -> Result<Vec<i64>> {
    let total: i64 = thresholds.iter().sum();
    let spare = target_total - total;

    if spare > 0 {
        let order = ascending_order(&thresholds);
        if order.len() < spare as usize {
            warn!("spare {} exceeds {} bins, total stays below target", spare, order.len());
        }
        for &i in order.iter().take(spare as usize) {
            thresholds[i] += 1;
        }
    } else if spare < 0 {
        match policy {
            SparePolicy::Reject => {
                return Err(TruncError::OverAllocated {
                    total: total as u64,
                    target: target_total as u64,
                });
            }
            SparePolicy::TrimLargest => {
                if (-spare) as usize > thresholds.len() {
                    warn!(
                        "overshoot {} exceeds {} bins, trimming in several passes",
                        -spare,
                        thresholds.len()
                    );
                }
                thresholds = trim_largest(thresholds, -spare, target_total)?;
            }
        }
    }
    Ok(thresholds)
}

// -1 FROM THE `excess` LARGEST NON-ZERO THRESHOLDS, REPEATED UNTIL PAID OFF
fn trim_largest(
    mut thresholds: Vec<i64>,
    mut excess: i64,
    target_total: i64,
) -> Result<Vec<i64>> {
    while excess > 0 {
        let order: Vec<usize> = descending_order(&thresholds)
            .into_iter()
            .filter(|&i| thresholds[i] > 0)
            .collect();
        if order.is_empty() {
            return Err(TruncError::OverAllocated {
                total: thresholds.iter().sum::<i64>().max(0) as u64,
                target: target_total.max(0) as u64,
            });
        }
        let take = order.len().min(excess as usize);
        for &i in &order[..take] {
            thresholds[i] -= 1;
        }
        excess -= take as i64;
    }
    Ok(thresholds)
}

pub fn solve_thresholds(region_a: &Occupancy, params: &ThresholdParams) -> Result<Vec<i64>> {
    params.validate()?;
    if region_a.bins() == 0 {
        return Err(TruncError::EmptyInput { what: "zero bins" });
    }

    // BINS ARE INDEPENDENT
    let mut thresholds = Vec::with_capacity(region_a.bins());
    for bin in 0..region_a.bins() {
        let x = search_bin_threshold(&region_a.bin_samples(bin), params)?;
        debug!("bin {} threshold {}", bin, x);
        thresholds.push(x);
    }

    let searched: i64 = thresholds.iter().sum();
    let thresholds = distribute_spare(thresholds, params.target_total, params.spare_policy)?;
    info!(
        "threshold search: searched sum {}, final sum {} (target {})",
        searched,
        thresholds.iter().sum::<i64>(),
        params.target_total,
    );
    Ok(thresholds)
}

// REGION B AND THE CANDIDATE CAPACITY VECTOR ONLY CONSTRAIN SHAPE
pub fn reverse_truncation(
    region_a: &Occupancy,
    region_b: &Occupancy,
    candidate: &[i64],
    params: &ThresholdParams,
) -> Result<Vec<i64>> {
    if region_b.bins() != region_a.bins() {
        return Err(TruncError::ShapeMismatch {
            what: "region B bins",
            expected: region_a.bins(),
            found: region_b.bins(),
        });
    }
    if candidate.len() != region_a.bins() {
        return Err(TruncError::ShapeMismatch {
            what: "candidate capacity vector",
            expected: region_a.bins(),
            found: candidate.len(),
        });
    }
    solve_thresholds(region_a, params)
}
