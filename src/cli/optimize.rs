use anyhow::{Context, Result};
use log::warn;

use tctrunc::objective::{MinimizeParams, TruncationProblem};

use super::{format_vector, load_inputs};
use crate::OptimizeArgs;

pub fn run_optimize(args: &OptimizeArgs) -> Result<()> {
    let (divisions, selected) = load_inputs(&args.input)?;
    let params = MinimizeParams {
        xatol: args.xatol,
        max_iter: args.max_iter,
    };

    println!("{:<12} {:<8} {:<12} {:<12} {:<10}", "OPTION", "LINKS", "FACTOR", "PENALTY", "ITERS");
    println!("{}", "-".repeat(58));

    for (name, option) in &selected {
        let caps = option.caps().with_context(|| format!("option {name}"))?;
        let region_a = option.topology.region_a(&divisions.x, &divisions.y)?;
        let problem = TruncationProblem::new(&region_a, &divisions.y, caps)
            .with_context(|| format!("option {name}"))?;
        let m = problem.solve(&params)?;
        if !m.converged {
            warn!("{}: search stopped after {} iterations without converging", name, m.iterations);
        }

        println!(
            "{:<12} {:<8} {:<12.6} {:<12.4} {:<10}",
            name,
            option.topology.n_links(),
            m.x,
            m.value,
            m.iterations
        );
        let thresholds: Vec<String> =
            problem.thresholds_at(m.x).iter().map(|t| format!("{:.2}", t)).collect();
        println!("  THRESHOLDS: {}", format_vector(&thresholds, 6));
    }
    Ok(())
}
