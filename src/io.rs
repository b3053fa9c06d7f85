//! Tabular input and output of time series.

use crate::series::{Observation, TimeSeries};
use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rmp_serde::{decode, encode};
use serde::{Deserialize, Serialize};
use std::{
    collections::{HashMap, hash_map::Entry},
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

/// File format of a time series.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Comma-separated values with a header row.
    Csv,
    /// MessagePack-encoded list of observations.
    Msgpack,
}

impl Format {
    /// Guess the format from the file extension, defaulting to CSV.
    pub fn from_path<P: AsRef<Path>>(file: P) -> Self {
        match file.as_ref().extension().and_then(|ext| ext.to_str()) {
            Some("msgpack" | "mpk") => Format::Msgpack,
            _ => Format::Csv,
        }
    }
}

/// Names of the columns holding dates and values.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Columns {
    pub date: String,
    pub value: String,
}

impl Columns {
    pub fn new(date: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            value: value.into(),
        }
    }
}

/// Load a [`TimeSeries`] from a file.
pub fn load<P: AsRef<Path>>(file: P, format: Format, columns: &Columns) -> Result<TimeSeries> {
    let file = file.as_ref();
    let reader = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
    let reader = BufReader::new(reader);
    let series = match format {
        Format::Csv => read_csv(reader, columns),
        Format::Msgpack => read_msgpack(reader),
    };
    series.with_context(|| format!("failed to read {file:?}"))
}

/// Save a [`TimeSeries`] to a file.
pub fn save<P: AsRef<Path>>(
    series: &TimeSeries,
    file: P,
    format: Format,
    columns: &Columns,
) -> Result<()> {
    let file = file.as_ref();
    let writer = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
    let mut writer = BufWriter::new(writer);
    let written = match format {
        Format::Csv => write_csv(series, &mut writer, columns),
        Format::Msgpack => write_msgpack(series, &mut writer),
    };
    written.with_context(|| format!("failed to write {file:?}"))?;
    writer.flush().context("failed to flush writer stream")?;
    Ok(())
}

/// Read a [`TimeSeries`] from CSV with a header row.
///
/// Rows with an empty value cell are missing observations and are skipped.
/// Columns other than the date and value columns are ignored.
pub fn read_csv<R: Read>(reader: R, columns: &Columns) -> Result<TimeSeries> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers().context("failed to read header row")?;
    let i_date = column_index(headers, &columns.date)?;
    let i_value = column_index(headers, &columns.value)?;

    let mut obs_vec = Vec::new();
    let mut first_rows = HashMap::new();
    let mut n_missing = 0;
    for (i_row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("failed to read row {}", i_row + 1))?;

        let date_str = record.get(i_date).unwrap_or_default();
        let date = parse_date(date_str).with_context(|| {
            format!("invalid {:?} in row {}: {date_str:?}", columns.date, i_row + 1)
        })?;

        let value_str = record.get(i_value).unwrap_or_default();
        if value_str.is_empty() {
            n_missing += 1;
            continue;
        }
        let value = parse_value(value_str).with_context(|| {
            format!("invalid {:?} in row {}: {value_str:?}", columns.value, i_row + 1)
        })?;

        match first_rows.entry(date) {
            Entry::Occupied(entry) => {
                let (i_first, first_value) = *entry.get();
                if first_value != value {
                    bail!(
                        "invalid {:?} in row {}: date {date} already has value {first_value} in row {}",
                        columns.value,
                        i_row + 1,
                        i_first + 1
                    );
                }
            }
            Entry::Vacant(entry) => {
                entry.insert((i_row, value));
            }
        }

        obs_vec.push(Observation::new(date, value));
    }

    if n_missing > 0 {
        log::debug!("skipped {n_missing} rows with missing {:?}", columns.value);
    }

    TimeSeries::new(obs_vec).context("failed to construct series")
}

/// Write a [`TimeSeries`] as CSV with a `date,<value>` header row.
pub fn write_csv<W: Write>(series: &TimeSeries, writer: W, columns: &Columns) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer
        .write_record([columns.date.as_str(), columns.value.as_str()])
        .context("failed to write header row")?;
    for obs in series {
        writer
            .write_record([obs.date.to_string(), obs.value.to_string()])
            .with_context(|| format!("failed to write observation on {}", obs.date))?;
    }
    writer.flush().context("failed to flush csv writer")?;
    Ok(())
}

/// Read a [`TimeSeries`] from a MessagePack-encoded list of observations.
pub fn read_msgpack<R: Read>(mut reader: R) -> Result<TimeSeries> {
    let obs_vec: Vec<Observation> =
        decode::from_read(&mut reader).context("failed to deserialize observations")?;
    TimeSeries::new(obs_vec).context("failed to construct series")
}

/// Write a [`TimeSeries`] as a MessagePack-encoded list of observations.
pub fn write_msgpack<W: Write>(series: &TimeSeries, mut writer: W) -> Result<()> {
    encode::write_named(&mut writer, series.observations())
        .context("failed to serialize observations")?;
    Ok(())
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    match headers.iter().position(|header| header == name) {
        Some(idx) => Ok(idx),
        None => bail!("column {name:?} not found in header {headers:?}"),
    }
}

/// Parse a date, accepting an optional time part which is dropped.
fn parse_date(s: &str) -> Result<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(date_time) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(date_time.date());
    }
    if let Ok(date_time) = DateTime::parse_from_rfc3339(s) {
        return Ok(date_time.date_naive());
    }
    bail!("date must be formatted as YYYY-MM-DD")
}

fn parse_value(s: &str) -> Result<f64> {
    let value: f64 = s.parse().context("failed to parse number")?;
    if !value.is_finite() {
        bail!("value must be finite");
    }
    Ok(value)
}
