use std::fmt::Write;

use anyhow::{Context, Result};

use tctrunc::budget::BudgetParams;
use tctrunc::policy::SparePolicy;
use tctrunc::study::{study_option, OptionStudy};
use tctrunc::threshold::ThresholdParams;

use super::{format_fractions, format_vector, load_inputs, save_report};
use crate::StudyArgs;

fn render(study: &OptionStudy, out: &mut String) -> std::fmt::Result {
    let b = &study.budget;
    writeln!(out, "{}", "=".repeat(72))?;
    writeln!(
        out,
        "{}  {}  maxTCsA={}  maxTCsB={}  TCratio={:.3}",
        study.name.to_uppercase(),
        study.option.topology.label(),
        study.option.cap_a,
        study.option.cap_b,
        study.option.ratio()
    )?;
    writeln!(out, "{}", "=".repeat(72))?;
    writeln!(out, "  SCALAR:            {:.6}", b.trace.scalar)?;
    writeln!(out, "  DEFICIT:           {}", b.trace.deficit)?;
    writeln!(out, "  BUDGET A (SUM {}):", b.region_a.iter().sum::<i64>())?;
    writeln!(out, "    {}", format_vector(&b.region_a, 3))?;
    writeln!(out, "  BUDGET B (SUM {}):", b.region_b.iter().sum::<i64>())?;
    writeln!(out, "    {}", format_vector(&b.region_b, 3))?;
    writeln!(out, "  REVERSE THRESHOLDS (SUM {}):", study.thresholds.iter().sum::<i64>())?;
    writeln!(out, "    {}", format_vector(&study.thresholds, 3))?;
    writeln!(out, "  RETAINED A:")?;
    writeln!(out, "    {}", format_fractions(&study.retention.region_a))?;
    writeln!(out, "  RETAINED B:")?;
    writeln!(out, "    {}", format_fractions(&study.retention.region_b))?;
    Ok(())
}

pub fn run_study(args: &StudyArgs) -> Result<()> {
    let (divisions, selected) = load_inputs(&args.input)?;

    let budget_params = BudgetParams {
        smoothing_passes: args.smoothing_passes,
        smoothing_window: args.smoothing_window,
    };
    let threshold_params = ThresholdParams {
        retention: args.retention,
        max_threshold: args.max_threshold,
        fallback: args.fallback,
        target_total: args.target_total,
        spare_policy: if args.reject_overallocation {
            SparePolicy::Reject
        } else {
            SparePolicy::TrimLargest
        },
    };

    let mut report = String::new();
    for (name, option) in &selected {
        let study = study_option(name, option, &divisions, &budget_params, &threshold_params)
            .with_context(|| format!("option {name}"))?;
        render(&study, &mut report)?;
    }

    print!("{}", report);
    if let Some(path) = &args.out {
        save_report(&report, path)?;
    }
    Ok(())
}
