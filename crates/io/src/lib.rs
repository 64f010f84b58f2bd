//! Delimited text dumps of decoded readings, one row per race-on packet.

use delta_config::DumpFormat;
use model::{PacketFormat, ParamId, ParseParamError, Reading};
use std::{
    fs::{File, OpenOptions},
    io::Write,
    path::Path,
    str::FromStr,
    time::Instant,
};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::info;

const PROGRESS_EVERY: u64 = 60;

#[derive(Debug, thiserror::Error)]
pub enum DumpError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("formatting wall clock: {0}")]
    Time(#[from] time::error::Format),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    /// Session seconds with race-off time removed.
    Time,
    WallClock,
    Param(ParamId),
}

impl Column {
    pub fn name(&self) -> &'static str {
        match self {
            Column::Time => "time",
            Column::WallClock => "wall_clock",
            Column::Param(p) => p.name(),
        }
    }
}

impl FromStr for Column {
    type Err = ParseParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "time" => Ok(Column::Time),
            "wall_clock" => Ok(Column::WallClock),
            other => other.parse().map(Column::Param),
        }
    }
}

/// Column set for a dump: the configured names, or every field of `format`.
/// Motec mode puts `time` first.
pub fn columns(
    format: PacketFormat,
    parameter_list: Option<&[String]>,
    motec: bool,
    wall_clock: bool,
) -> Result<Vec<Column>, ParseParamError> {
    let mut cols: Vec<Column> = match parameter_list {
        Some(names) => names.iter().map(|n| n.parse()).collect::<Result<_, _>>()?,
        None => ParamId::for_format(format).iter().copied().map(Column::Param).collect(),
    };
    if motec {
        cols.retain(|c| *c != Column::Time);
        cols.insert(0, Column::Time);
    }
    if wall_clock && !cols.contains(&Column::WallClock) {
        cols.push(Column::WallClock);
    }
    Ok(cols)
}

/// Session clock for motec exports: starts at the first packet and does not
/// advance while the race is off.
#[derive(Debug, Clone, Default)]
pub struct MotecClock {
    origin: Option<Instant>,
    paused_at: Option<Instant>,
}

impl MotecClock {
    pub fn new() -> Self { Self::default() }

    /// Seconds for a race-on packet arriving at `now`; `None` while paused.
    pub fn observe(&mut self, race_on: bool, now: Instant) -> Option<f64> {
        let origin = self.origin.get_or_insert(now);
        if race_on {
            if let Some(paused) = self.paused_at.take() {
                *origin += now.saturating_duration_since(paused);
            }
            Some(now.saturating_duration_since(*origin).as_secs_f64())
        } else {
            self.paused_at.get_or_insert(now);
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct DumpOptions {
    pub format: DumpFormat,
    pub append: bool,
    pub columns: Vec<Column>,
}

pub struct DumpWriter<W: Write> {
    out: csv::Writer<W>,
    columns: Vec<Column>,
    clock: MotecClock,
    rows: u64,
}

impl DumpWriter<File> {
    pub fn create(path: &Path, options: DumpOptions) -> Result<Self, DumpError> {
        let file = if options.append {
            OpenOptions::new().create(true).append(true).open(path)?
        } else {
            File::create(path)?
        };
        Self::new(file, options)
    }
}

impl<W: Write> DumpWriter<W> {
    /// Writes the header row unless appending.
    pub fn new(inner: W, options: DumpOptions) -> Result<Self, DumpError> {
        let mut out = csv::WriterBuilder::new()
            .delimiter(options.format.delimiter())
            .has_headers(false)
            .from_writer(inner);
        if !options.append {
            out.write_record(options.columns.iter().map(|c| c.name()))?;
            out.flush()?;
        }
        Ok(Self { out, columns: options.columns, clock: MotecClock::new(), rows: 0 })
    }

    pub fn rows(&self) -> u64 { self.rows }

    /// Writes a row for race-on readings. Returns whether a row was written.
    pub fn record(&mut self, reading: &Reading, arrived: Instant) -> Result<bool, DumpError> {
        let session_time = self.clock.observe(reading.is_race_on, arrived);
        if !reading.is_race_on {
            if self.rows > 0 {
                info!(rows = self.rows, "out of race, stopped logging data");
            }
            self.rows = 0;
            return Ok(false);
        }
        if self.rows == 0 {
            info!("in race, logging data");
        }

        let mut row = Vec::with_capacity(self.columns.len());
        for col in &self.columns {
            row.push(match col {
                Column::Time => format!("{:.6}", session_time.unwrap_or_default()),
                Column::WallClock => OffsetDateTime::now_utc().format(&Rfc3339)?,
                Column::Param(p) => p.value(reading).to_string(),
            });
        }
        self.out.write_record(&row)?;
        self.out.flush()?;

        self.rows += 1;
        if self.rows % PROGRESS_EVERY == 0 {
            info!(rows = self.rows, "logged packets");
        }
        Ok(true)
    }

    pub fn into_inner(self) -> Result<W, DumpError> {
        self.out.into_inner().map_err(|e| DumpError::Io(e.into_error()))
    }
}
