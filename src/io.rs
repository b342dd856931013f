//! CSV input and per-interval output for the command line.

use std::io::{Read, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::domain::DispatchSchedule;

#[derive(Debug, Deserialize)]
struct SeriesRow {
    #[serde(default)]
    generation_mw: Option<f64>,
    #[serde(default)]
    generation_kw: Option<f64>,
    #[serde(alias = "price")]
    price_eur_per_mwh: f64,
}

/// Generation and price columns of an input file, in MW and EUR/MWh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSeries {
    pub generation_mw: Vec<f64>,
    pub price_eur_per_mwh: Vec<f64>,
}

impl InputSeries {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        Self::from_reader(file).with_context(|| format!("failed to read series from {}", path.display()))
    }

    /// Header row required. `generation_kw` is converted to MW when
    /// `generation_mw` is absent.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut series = Self::default();

        for (line, row) in reader.deserialize::<SeriesRow>().enumerate() {
            let row = row.with_context(|| format!("invalid CSV record {}", line + 1))?;
            let generation = match (row.generation_mw, row.generation_kw) {
                (Some(mw), _) => mw,
                (None, Some(kw)) => kw / 1000.0,
                (None, None) => bail!("record {} has neither generation_mw nor generation_kw", line + 1),
            };
            series.generation_mw.push(generation);
            series.price_eur_per_mwh.push(row.price_eur_per_mwh);
        }

        tracing::debug!(rows = series.generation_mw.len(), "series loaded");
        Ok(series)
    }
}

/// Writes one row per step of `schedule`, with a header
pub fn write_intervals<W: Write>(schedule: &DispatchSchedule, writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for interval in schedule.intervals() {
        writer.serialize(interval)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_intervals_to_path(schedule: &DispatchSchedule, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    write_intervals(schedule, file)?;
    tracing::info!(path = %path.display(), rows = schedule.len(), "intervals written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_mw_columns() {
        let csv = "generation_mw,price_eur_per_mwh\n0.0,35.5\n1.25,-4\n";
        let series = InputSeries::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(series.generation_mw, vec![0.0, 1.25]);
        assert_eq!(series.price_eur_per_mwh, vec![35.5, -4.0]);
    }

    #[test]
    fn test_converts_kw_column() {
        let csv = "timestamp,generation_kw,price\n2024-06-01T12:00:00Z,1500,20\n";
        let series = InputSeries::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(series.generation_mw, vec![1.5]);
        assert_eq!(series.price_eur_per_mwh, vec![20.0]);
    }

    #[test]
    fn test_missing_generation_is_an_error() {
        let csv = "price_eur_per_mwh\n20\n";
        assert!(InputSeries::from_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("series.csv");
        std::fs::write(&path, "generation_mw,price_eur_per_mwh\n2,50\n").unwrap();
        let series = InputSeries::from_path(&path).unwrap();
        assert_eq!(series.generation_mw.len(), 1);
    }

    #[test]
    fn test_writes_one_row_per_interval() {
        let schedule = DispatchSchedule {
            step_hours: 1.0,
            generation_mw: vec![1.0, 0.0],
            price_eur_per_mwh: vec![20.0, 80.0],
            charge_mw: vec![1.0, 0.0],
            discharge_mw: vec![0.0, 0.9],
            charging: vec![true, false],
            discharging: vec![false, true],
            soc_mwh: vec![0.0, 0.9, 0.0],
            grid_power_mw: vec![0.0, 0.9],
        };
        let mut buf = Vec::new();
        write_intervals(&schedule, &mut buf).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("index,generation_mw,price_eur_per_mwh,charge_mw,discharge_mw,battery_flow_mw"));
        assert!(lines[1].starts_with("0,1.0,20.0,1.0,0.0,-1.0,0.0,0.9"));
    }
}
