use anyhow::{bail, Result};

use tctrunc::input::load_divisions;

use super::format_vector;
use crate::SummaryArgs;

// REGION B CARRIES HALF THE PHI RANGE: COMPARE IT AT TWICE ITS OCCUPANCY
pub const HALF_PHI_SCALE: f64 = 2.0;

// PROFILED COUNTS ARE DIVIDED BY THIS
pub const DEFAULT_PROFILE_DIVISOR: f64 = 6.0;

fn one_decimal(values: &[f64]) -> Vec<String> {
    values.iter().map(|x| format!("{:.1}", x)).collect()
}

pub fn run_summary(args: &SummaryArgs) -> Result<()> {
    if !(args.divisor.is_finite() && args.divisor > 0.0) {
        bail!("divisor must be positive, got {}", args.divisor);
    }
    let divisions = load_divisions(&args.events)?;
    let scale = 1.0 / args.divisor;
    let y = divisions.y.scaled(scale)?;
    let inclusive = divisions.x.scaled(scale)?.combined(&y)?;
    let profiled = if args.inclusive_only {
        inclusive
    } else {
        inclusive.envelope_with(&y, HALF_PHI_SCALE)?
    };

    println!(
        "PER-BUNDLE PROFILES ({} EVENTS, COUNTS / {})",
        profiled.events(),
        args.divisor
    );
    for bundle in 0..profiled.bundles() {
        let p = profiled.bundle_profile(bundle)?;
        println!("BUNDLE {}", bundle);
        println!("  MAX:        {}", format_vector(&one_decimal(&p.max), 5));
        println!("  MEAN+STD:   {}", format_vector(&one_decimal(&p.mean_plus_std), 5));
        println!("  MEAN:       {}", format_vector(&one_decimal(&p.mean), 5));
    }

    let overall = one_decimal(&profiled.bin_max()?);
    println!();
    println!("MAXIMUM PER BIN OVER ALL BUNDLES: {}", format_vector(&overall, 5));
    Ok(())
}
