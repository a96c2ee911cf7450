// TCTRUNC OPTION STUDY
// ONE OPTION END TO END: COMPOSE REGIONS, SOLVE THE BIN BUDGET,
// RE-DERIVE THRESHOLDS FROM RAW SAMPLES, MEASURE RETENTION.

use log::info;

use crate::budget::{self, BudgetParams, BudgetSolution};
use crate::error::Result;
use crate::input::PhiDivisions;
use crate::options::TruncationOption;
use crate::retention::{retention_report, RetentionReport};
use crate::threshold::{reverse_truncation, ThresholdParams};

#[derive(Clone, Debug, PartialEq)]
pub struct OptionStudy {
    pub name: String,
    pub option: TruncationOption,
    pub budget: BudgetSolution,
    pub thresholds: Vec<i64>,
    pub retention: RetentionReport,
}

pub fn study_option(
    name: &str,
    option: &TruncationOption,
    divisions: &PhiDivisions,
    budget_params: &BudgetParams,
    threshold_params: &ThresholdParams,
) -> Result<OptionStudy> {
    info!(
        "studying {} ({}, maxTCsA={}, maxTCsB={})",
        name,
        option.topology.label(),
        option.cap_a,
        option.cap_b
    );

    let caps = option.caps()?;
    let region_a = option.topology.region_a(&divisions.x, &divisions.y)?;
    let region_b = &divisions.y;

    let budget = budget::solve_from_regions(&region_a, region_b, &caps, budget_params)?;
    let thresholds = reverse_truncation(&region_a, region_b, &budget.region_a, threshold_params)?;
    let retention = retention_report(&region_a, region_b, &thresholds, caps.ratio())?;

    Ok(OptionStudy {
        name: name.to_string(),
        option: *option,
        budget,
        thresholds,
        retention,
    })
}
