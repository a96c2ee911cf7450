pub mod optimize;
pub mod study;
pub mod summary;
pub mod truncation;

use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use tctrunc::input::{load_divisions, PhiDivisions};
use tctrunc::options::{OptionTable, TruncationOption};

use crate::InputArgs;

pub fn load_inputs(args: &InputArgs) -> Result<(PhiDivisions, Vec<(String, TruncationOption)>)> {
    let table = OptionTable::load(&args.config)?;
    let selected = table
        .select(&args.options)
        .with_context(|| format!("selecting options {:?}", args.options))?;
    let divisions = load_divisions(&args.events)?;
    info!(
        "loaded {} events, {} bundles, {} bins; {} options selected",
        divisions.x.events(),
        divisions.x.bundles(),
        divisions.x.bins(),
        selected.len()
    );
    Ok((divisions, selected))
}

// [a, b, c] WITH A FIXED COLUMN WIDTH
pub fn format_vector<T: std::fmt::Display>(values: &[T], width: usize) -> String {
    let cells: Vec<String> = values.iter().map(|v| format!("{:>width$}", v)).collect();
    format!("[{}]", cells.join(","))
}

pub fn format_fractions(values: &[f64]) -> String {
    let cells: Vec<String> = values.iter().map(|v| format!("{:.3}", v)).collect();
    format!("[{}]", cells.join(","))
}

pub fn save_report(content: &str, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    std::fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;
    info!("report saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_columns_are_padded() {
        assert_eq!(format_vector(&[1, 22, 3], 3), "[  1, 22,  3]");
        assert_eq!(format_fractions(&[1.0, 0.5]), "[1.000,0.500]");
    }

    #[test]
    fn report_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/report.txt");
        save_report("X", &path).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "X");
    }
}
