use anyhow::Result;

use tctrunc::input::load_divisions;
use tctrunc::truncation::{truncation_report, TruncationLevel, TRUNCATION_PERCENTILES};

use super::format_vector;
use super::summary::HALF_PHI_SCALE;
use crate::TruncationArgs;

fn whole(values: &[f64]) -> Vec<String> {
    values.iter().map(|x| format!("{:.0}", x)).collect()
}

// (MEAN, MAX) OVER EVENTS OF THE TCs CUT PER BUNDLE
fn cut_stats(level: &TruncationLevel) -> (f64, f64) {
    let cut = &level.truncated_per_bundle;
    let mean = cut.iter().sum::<f64>() / cut.len().max(1) as f64;
    let max = cut.iter().copied().fold(0.0, f64::max);
    (mean, max)
}

pub fn run_truncation(args: &TruncationArgs) -> Result<()> {
    let divisions = load_divisions(&args.events)?;
    let inclusive = divisions.x.combined(&divisions.y)?;
    let profiled = if args.inclusive_only {
        inclusive.clone()
    } else {
        inclusive.envelope_with(&divisions.y, HALF_PHI_SCALE)?
    };
    let report = truncation_report(&inclusive, &profiled, &TRUNCATION_PERCENTILES)?;

    println!("TRUNCATION LEVELS ({} EVENTS, {} BUNDLES)", profiled.events(), profiled.bundles());
    println!("MAXIMUM TC PER BIN:      {}", format_vector(&whole(&report.max_per_bin), 4));
    println!("SUM OF PER-BIN MAXIMA:   {:.0}", report.max_sum);
    println!();
    println!("{:<8} {:<12} {:<16} {:<16}", "CUT", "MAX SUM", "MEAN CUT/BUNDLE", "MAX CUT/BUNDLE");
    println!("{}", "-".repeat(54));
    for level in &report.levels {
        let (mean, max) = cut_stats(level);
        println!(
            "{:<8} {:<12.0} {:<16.3} {:<16.3}",
            format!("p{}", level.percentile),
            level.max_sum,
            mean,
            max
        );
        println!("  CUTS: {}", format_vector(&whole(&level.thresholds), 4));
    }
    println!();
    let ratio: Vec<String> = report.ratio_to_best.iter().map(|r| format!("{:.2}", r)).collect();
    println!("RATIO TO BEST LIKELY:    {}", format_vector(&ratio, 5));
    Ok(())
}
