// TCTRUNC OBSERVATION ARCHIVE LOADER
// JSON [event][phi division][bundle][bin], OPTIONALLY GZIP-COMPRESSED (.gz).
// DIVISION 0 = PHI DIVISION X, DIVISION 1 = PHI DIVISION Y.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{bail, Context, Result};
use flate2::read::GzDecoder;

use crate::histogram::Occupancy;

const PHI_DIVISIONS: usize = 2;

#[derive(Clone, Debug, PartialEq)]
pub struct PhiDivisions {
    pub x: Occupancy,
    pub y: Occupancy,
}

type RawEvents = Vec<Vec<Vec<Vec<f64>>>>;

pub fn parse_divisions(reader: impl Read) -> Result<PhiDivisions> {
    let events: RawEvents =
        serde_json::from_reader(BufReader::new(reader)).context("malformed event archive")?;

    let mut x = Vec::with_capacity(events.len());
    let mut y = Vec::with_capacity(events.len());
    for (e, event) in events.into_iter().enumerate() {
        if event.len() != PHI_DIVISIONS {
            bail!("event {e}: expected {PHI_DIVISIONS} phi divisions, found {}", event.len());
        }
        let mut divisions = event.into_iter();
        x.extend(divisions.next());
        y.extend(divisions.next());
    }

    let x = Occupancy::from_nested(x).context("phi division X")?;
    let y = Occupancy::from_nested(y).context("phi division Y")?;
    if (x.bundles(), x.bins()) != (y.bundles(), y.bins()) {
        bail!(
            "phi divisions disagree: X has {}x{} bundles x bins, Y has {}x{}",
            x.bundles(), x.bins(), y.bundles(), y.bins()
        );
    }
    Ok(PhiDivisions { x, y })
}

pub fn load_divisions(path: &Path) -> Result<PhiDivisions> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let gz = path.extension().is_some_and(|ext| ext == "gz");
    let divisions = if gz {
        parse_divisions(GzDecoder::new(file))
    } else {
        parse_divisions(file)
    };
    divisions.with_context(|| format!("loading {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use flate2::write::GzEncoder;
    use flate2::Compression;

    // 2 EVENTS, 2 BUNDLES, 3 BINS
    const ARCHIVE: &str = r#"[
        [ [[1,2,3],[0,0,1]], [[1,1,1],[2,2,2]] ],
        [ [[4,0,0],[1,1,1]], [[0,0,0],[3,0,1]] ]
    ]"#;

    #[test]
    fn parses_two_divisions() {
        let d = parse_divisions(ARCHIVE.as_bytes()).unwrap();
        assert_eq!(d.x.events(), 2);
        assert_eq!(d.x.bundles(), 2);
        assert_eq!(d.x.bins(), 3);
        assert_eq!(d.x.get(1, 0, 0), 4.0);
        assert_eq!(d.y.get(1, 1, 0), 3.0);
    }

    #[test]
    fn rejects_single_division() {
        assert!(parse_divisions("[[ [[1,2]] ]]".as_bytes()).is_err());
    }

    #[test]
    fn rejects_negative_occupancy() {
        assert!(parse_divisions("[[ [[1,-2]], [[1,2]] ]]".as_bytes()).is_err());
    }

    #[test]
    fn loads_plain_and_gzip_files() {
        let dir = tempfile::tempdir().unwrap();

        let plain = dir.path().join("events.json");
        std::fs::write(&plain, ARCHIVE).unwrap();

        let packed = dir.path().join("events.json.gz");
        let mut enc = GzEncoder::new(File::create(&packed).unwrap(), Compression::default());
        enc.write_all(ARCHIVE.as_bytes()).unwrap();
        enc.finish().unwrap();

        assert_eq!(load_divisions(&plain).unwrap(), load_divisions(&packed).unwrap());
    }

    #[test]
    fn missing_file_names_path() {
        let err = load_divisions(Path::new("/nonexistent/events.json")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/events.json"));
    }
}
