// TCTRUNC ROUNDING AND TIE-BREAK POLICIES
// FIXED HEURISTICS TUNED AGAINST OBSERVED TRUNCATION BEHAVIOUR.
// KEPT AS NAMED FUNCTIONS SO EACH ONE IS PINNED BY ITS OWN TEST.

// STABLE ASCENDING INDEX ORDER: TIES KEEP BIN ORDER (LOWER BIN FIRST)
pub fn ascending_order(values: &[i64]) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..values.len()).collect();
    idx.sort_by_key(|&i| values[i]);
    idx
}

// STABLE DESCENDING INDEX ORDER: TIES KEEP BIN ORDER (LOWER BIN FIRST)
pub fn descending_order(values: &[i64]) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..values.len()).collect();
    idx.sort_by_key(|&i| std::cmp::Reverse(values[i]));
    idx
}

// HARD-CAP TRIM ORDER: REMOVE FROM THE SMALLEST ALLOCATIONS FIRST.
// BINS ALREADY AT ZERO ARE NOT CANDIDATES.
pub fn cap_trim_order(values: &[i64]) -> Vec<usize> {
    ascending_order(values)
        .into_iter()
        .filter(|&i| values[i] > 0)
        .collect()
}

// REGION B CAPACITY FROM REGION A CAPACITY.
// EXACT INTEGER RATIO: CEIL, SO 0.5 GOES UP (ratio 1 OR 2).
// OTHERWISE: ROUND HALF TO EVEN.
pub fn region_b_capacity(region_a: &[i64], ratio: f64) -> Vec<i64> {
    let integer_ratio = ratio.fract() == 0.0;
    region_a
        .iter()
        .map(|&a| {
            let scaled = a as f64 / ratio;
            if integer_ratio {
                scaled.ceil() as i64
            } else {
                scaled.round_ties_even() as i64
            }
        })
        .collect()
}

// NEGATIVE SPARE IN THE THRESHOLD SEARCH (SUM ALREADY ABOVE TARGET TOTAL)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SparePolicy {
    // TAKE ONE UNIT FROM EACH OF THE LARGEST THRESHOLDS, MIRRORING THE
    // LOW-BIN REWARD FOR POSITIVE SPARE
    #[default]
    TrimLargest,
    // SURFACE TruncError::OverAllocated TO THE CALLER
    Reject,
}
