use crate::config::TelemetryConfig;
use crate::error::Result;
use csv::ReaderBuilder;
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

// column names follow the timing-data lap export; everything else in the file is ignored
#[derive(Debug, Deserialize)]
struct RawLapData {
    #[serde(rename = "LapNumber", default, deserialize_with = "csv::invalid_option")]
    lap_number: Option<f64>,
    #[serde(rename = "Compound", default)]
    compound: Option<String>,
    #[serde(rename = "LapTime", default)]
    lap_time: Option<String>,
}

/// One completed lap from a reference race. Any field may be missing in raw
/// timing data; feature preparation decides what is usable.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalLap {
    pub lap_number: Option<u32>,
    pub compound: Option<String>,
    pub lap_time: Option<Duration>,
}

impl HistoricalLap {
    pub fn new(lap_number: u32, compound: impl Into<String>, lap_time: Duration) -> Self {
        Self {
            lap_number: Some(lap_number),
            compound: Some(compound.into()),
            lap_time: Some(lap_time),
        }
    }

    fn from_raw(raw: RawLapData) -> Self {
        let lap_number = raw
            .lap_number
            .filter(|n| n.is_finite() && *n >= 1.0)
            .map(|n| n.round() as u32);
        let compound = raw
            .compound
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("nan"));
        let lap_time = raw.lap_time.as_deref().and_then(parse_lap_time);

        Self { lap_number, compound, lap_time }
    }
}

/// Provider of historical laps for one race.
pub trait TelemetrySource {
    /// Short label for logs.
    fn describe(&self) -> String;

    fn load_laps(&self) -> Result<Vec<HistoricalLap>>;
}

/// Reads a lap export (`LapNumber`, `Compound`, `LapTime` columns) from disk.
pub struct CsvTelemetrySource {
    path: PathBuf,
    label: String,
}

impl CsvTelemetrySource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let label = path.display().to_string();
        Self { path, label }
    }

    pub fn from_config(config: &TelemetryConfig) -> Self {
        let mut source = Self::new(&config.laps_csv);
        if let (Some(season), Some(event)) = (config.season, config.event.as_deref()) {
            source.label = format!("{season} {event}");
        }
        source
    }
}

impl TelemetrySource for CsvTelemetrySource {
    fn describe(&self) -> String {
        self.label.clone()
    }

    fn load_laps(&self) -> Result<Vec<HistoricalLap>> {
        let laps = read_laps(std::fs::File::open(&self.path)?)?;
        info!(source = %self.label, laps = laps.len(), "loaded historical laps");
        Ok(laps)
    }
}

/// Parses lap rows from any CSV reader with a header line.
pub fn read_laps<R: Read>(input: R) -> Result<Vec<HistoricalLap>> {
    let mut reader = ReaderBuilder::new().has_headers(true).flexible(true).from_reader(input);
    let mut laps = Vec::new();

    for res in reader.deserialize() {
        let raw: RawLapData = res?;
        laps.push(HistoricalLap::from_raw(raw));
    }
    debug!(rows = laps.len(), "parsed lap csv");
    Ok(laps)
}

/// Accepts plain seconds (`91.2`), clock forms (`1:31.2`, `0:01:31.2`) and the
/// pandas timedelta form (`0 days 00:01:31.200000`).
pub fn parse_lap_time(text: &str) -> Option<Duration> {
    let text = text.trim();
    if text.is_empty() || text.eq_ignore_ascii_case("nat") || text.eq_ignore_ascii_case("nan") {
        return None;
    }

    let (days, clock) = match text.split_once("days") {
        Some((d, rest)) => (d.trim().parse::<f64>().ok()?, rest.trim()),
        None => match text.split_once("day") {
            Some((d, rest)) => (d.trim().parse::<f64>().ok()?, rest.trim()),
            None => (0.0, text),
        },
    };

    // only the leading field may exceed 59; later fields are sexagesimal digits
    let mut seconds = 0.0;
    for (i, part) in clock.split(':').enumerate() {
        let value = part.trim().parse::<f64>().ok()?;
        if i > 0 && !(0.0..60.0).contains(&value) {
            return None;
        }
        seconds = seconds * 60.0 + value;
    }
    seconds += days * 86_400.0;

    if !seconds.is_finite() || seconds <= 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(seconds).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lap_time_formats() {
        let secs = |s: &str| parse_lap_time(s).map(|d| d.as_secs_f64());

        assert_eq!(secs("91.5"), Some(91.5));
        assert_eq!(secs("1:31.5"), Some(91.5));
        assert_eq!(secs("0:01:31.5"), Some(91.5));
        assert_eq!(secs("0 days 00:01:31.500000"), Some(91.5));
    }

    #[test]
    fn rejects_missing_lap_times() {
        for s in ["", "NaT", "nan", "abc", "0", "-3.0", "1:xx"] {
            assert_eq!(parse_lap_time(s), None, "{s:?}");
        }
    }

    #[test]
    fn rejects_out_of_range_clock_fields() {
        for s in ["1:-30.0", "2:-90", "1:60.0", "1:75.5", "0:61:10.0", "0 days 00:01:-5.0"] {
            assert_eq!(parse_lap_time(s), None, "{s:?}");
        }
        // the leading field carries any overflow
        assert_eq!(parse_lap_time("90:00").map(|d| d.as_secs()), Some(5400));
        assert_eq!(parse_lap_time("1:59.5").map(|d| d.as_secs_f64()), Some(119.5));
    }

    #[test]
    fn reads_rows_and_keeps_gaps() {
        let csv = "\
Driver,LapNumber,LapTime,Compound
VER,1.0,0 days 00:01:32.100000,SOFT
VER,2.0,NaT,SOFT
VER,,0 days 00:01:31.900000,MEDIUM
VER,4.0,0 days 00:01:31.700000,
";
        let laps = read_laps(csv.as_bytes()).unwrap();
        assert_eq!(laps.len(), 4);

        assert_eq!(laps[0].lap_number, Some(1));
        assert_eq!(laps[0].compound.as_deref(), Some("SOFT"));
        assert!((laps[0].lap_time.unwrap().as_secs_f64() - 92.1).abs() < 1e-9);

        assert_eq!(laps[1].lap_time, None);
        assert_eq!(laps[2].lap_number, None);
        assert_eq!(laps[3].compound, None);
    }

    #[test]
    fn garbage_lap_number_becomes_missing() {
        let csv = "LapNumber,Compound,LapTime\nabc,HARD,90.0\n";
        let laps = read_laps(csv.as_bytes()).unwrap();
        assert_eq!(laps[0].lap_number, None);
        assert_eq!(laps[0].compound.as_deref(), Some("HARD"));
    }
}
