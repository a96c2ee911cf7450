// TCTRUNC ERROR TYPES
// EVERY SOLVER EITHER RETURNS A FULL nBins VECTOR OR ONE OF THESE.
// NO PARTIAL VECTORS, NO SILENT ZERO DEFAULTS.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum TruncError {
    // ZERO EVENTS, ZERO BUNDLES, ZERO BINS, OR A BIN WITHOUT SAMPLES
    EmptyInput { what: &'static str },
    // CAP ZERO / NEGATIVE / NAN, OR AN ENVELOPE THAT SUMS TO ZERO
    InvalidCapacity { region: &'static str, value: f64 },
    ShapeMismatch { what: &'static str, expected: usize, found: usize },
    InvalidSample { bin: usize, value: f64 },
    InvalidParameter { name: &'static str, value: f64 },
    // THRESHOLD SEARCH OVERSHOT THE CONFIGURED TOTAL UNDER SparePolicy::Reject
    OverAllocated { total: u64, target: u64 },
}

impl fmt::Display for TruncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TruncError::EmptyInput { what } => write!(f, "empty input: {what}"),
            TruncError::InvalidCapacity { region, value } => {
                write!(f, "invalid capacity for region {region}: {value}")
            }
            TruncError::ShapeMismatch { what, expected, found } => {
                write!(f, "shape mismatch in {what}: expected {expected}, found {found}")
            }
            TruncError::InvalidSample { bin, value } => {
                write!(f, "invalid occupancy sample {value} in bin {bin}")
            }
            TruncError::InvalidParameter { name, value } => {
                write!(f, "invalid parameter {name} = {value}")
            }
            TruncError::OverAllocated { total, target } => {
                write!(f, "threshold total {total} exceeds target total {target}")
            }
        }
    }
}

impl std::error::Error for TruncError {}

pub type Result<T> = std::result::Result<T, TruncError>;

// DIVISION GUARD: A RATIO OVER AN EMPTY TOTAL IS "ALL OF NOTHING RETAINED" = 1.0
pub fn guarded_fraction(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        1.0
    } else {
        numerator / denominator
    }
}
