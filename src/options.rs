// TCTRUNC TRUNCATION OPTIONS
// EACH NAMED OPTION = LINK TOPOLOGY + TWO CAPS. READ-ONLY INPUT TO THE SOLVERS.
//
// JSON LAYOUT (FIELD NAMES MATCH THE EXISTING OPTION FILES):
//   { "option1": { "nLinks": 3, "maxTCsA": 400, "maxTCsB": 200 }, ... }

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::Deserialize;

use crate::budget::RegionCaps;
use crate::error::TruncError;
use crate::histogram::Occupancy;

// --- TOPOLOGY ---

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "u8")]
pub enum Topology {
    // REGION A = PHI DIVISION X + PHI DIVISION Y
    ThreeLink,
    // REGION A = PHI DIVISION X
    FourLink,
}

impl TryFrom<u8> for Topology {
    type Error = String;

    fn try_from(n_links: u8) -> std::result::Result<Self, Self::Error> {
        match n_links {
            3 => Ok(Self::ThreeLink),
            4 => Ok(Self::FourLink),
            n => Err(format!("unsupported nLinks {n} (expected 3 or 4)")),
        }
    }
}

impl Topology {
    pub fn n_links(self) -> u8 {
        match self {
            Self::ThreeLink => 3,
            Self::FourLink => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::ThreeLink => "3-LINK",
            Self::FourLink => "4-LINK",
        }
    }

    // REGION B IS ALWAYS PHI DIVISION Y
    pub fn region_a(self, x: &Occupancy, y: &Occupancy) -> std::result::Result<Occupancy, TruncError> {
        match self {
            Self::ThreeLink => x.combined(y),
            Self::FourLink => Ok(x.clone()),
        }
    }
}

// --- OPTION RECORD ---

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct TruncationOption {
    #[serde(rename = "nLinks")]
    pub topology: Topology,
    #[serde(rename = "maxTCsA")]
    pub cap_a: u32,
    #[serde(rename = "maxTCsB")]
    pub cap_b: u32,
}

impl TruncationOption {
    pub fn caps(&self) -> std::result::Result<RegionCaps, TruncError> {
        RegionCaps::new(self.cap_a as f64, self.cap_b as f64)
    }

    pub fn ratio(&self) -> f64 {
        self.cap_a as f64 / self.cap_b as f64
    }
}

// --- OPTION TABLE ---

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct OptionTable(BTreeMap<String, TruncationOption>);

impl OptionTable {
    pub fn from_json(text: &str) -> Result<Self> {
        let table: OptionTable = serde_json::from_str(text).context("malformed option table")?;
        for (name, option) in &table.0 {
            option.caps().with_context(|| format!("option {name}"))?;
        }
        Ok(table)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading option table {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("in {}", path.display()))
    }

    pub fn get(&self, name: &str) -> Option<&TruncationOption> {
        self.0.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    // RESOLVE A SELECTION LIKE "1,3-5" OR "option2" AGAINST THE TABLE
    pub fn select(&self, selection: &str) -> Result<Vec<(String, TruncationOption)>> {
        parse_selection(selection)?
            .into_iter()
            .map(|name| match self.0.get(&name) {
                Some(option) => Ok((name, *option)),
                None => bail!("option {name} not found in table"),
            })
            .collect()
    }
}

// "1,3-5" -> [option1, option3, option4, option5]. "option" PREFIX OPTIONAL.
pub fn parse_selection(selection: &str) -> Result<Vec<String>> {
    let token = Regex::new(r"^\s*(?:option)?(\d+)\s*(?:-\s*(?:option)?(\d+)\s*)?$")?;
    let mut names = Vec::new();
    for part in selection.split(',') {
        let caps = token
            .captures(part)
            .with_context(|| format!("bad option selector {part:?}"))?;
        let first: u32 = caps[1].parse()?;
        let last: u32 = match caps.get(2) {
            Some(m) => m.as_str().parse()?,
            None => first,
        };
        if last < first {
            bail!("empty option range {part:?}");
        }
        names.extend((first..=last).map(|n| format!("option{n}")));
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"{
        "option1": { "nLinks": 3, "maxTCsA": 400, "maxTCsB": 200 },
        "option4": { "nLinks": 4, "maxTCsA": 300, "maxTCsB": 120 }
    }"#;

    #[test]
    fn table_parses_camel_case_field_names() {
        let t = OptionTable::from_json(TABLE).unwrap();
        let o = t.get("option4").unwrap();
        assert_eq!(o.topology, Topology::FourLink);
        assert_eq!(o.ratio(), 2.5);
        assert_eq!(t.names().collect::<Vec<_>>(), vec!["option1", "option4"]);
    }

    #[test]
    fn unknown_link_count_rejected() {
        let r = OptionTable::from_json(r#"{ "x": { "nLinks": 5, "maxTCsA": 1, "maxTCsB": 1 } }"#);
        assert!(r.is_err());
    }

    #[test]
    fn zero_cap_rejected() {
        let r = OptionTable::from_json(r#"{ "x": { "nLinks": 3, "maxTCsA": 0, "maxTCsB": 1 } }"#);
        assert!(r.is_err());
    }

    #[test]
    fn selection_ranges_and_prefixes() {
        assert_eq!(
            parse_selection("1, 3-4,option7").unwrap(),
            vec!["option1", "option3", "option4", "option7"]
        );
        assert!(parse_selection("4-2").is_err());
        assert!(parse_selection("abc").is_err());
    }

    #[test]
    fn select_reports_missing_option() {
        let t = OptionTable::from_json(TABLE).unwrap();
        assert_eq!(t.select("1,4").unwrap().len(), 2);
        assert!(t.select("2").is_err());
    }

    #[test]
    fn topology_composes_region_a() {
        let x = Occupancy::from_nested(vec![vec![vec![1.0, 2.0]]]).unwrap();
        let y = Occupancy::from_nested(vec![vec![vec![3.0, 4.0]]]).unwrap();
        let three = Topology::ThreeLink.region_a(&x, &y).unwrap();
        assert_eq!(three.bin_sum().unwrap(), vec![4.0, 6.0]);
        assert_eq!(Topology::FourLink.region_a(&x, &y).unwrap(), x);
    }
}
