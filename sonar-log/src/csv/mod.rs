//! Plain-text point logs
//!
//! One record per line, values separated by a single character. Which column
//! holds which value is described by a [`ValuesOrder`]; a column is bound to
//! a field when its configured name contains the field name, ignoring case.

pub mod compass;

use crate::primitives::{CoordinatePoint, DepthPointSource, LinearDimension, LinearUnit};
use crate::types::{Result, Timestamp};
use chrono::Utc;
use std::collections::BTreeMap;
use std::fmt;
use std::io::{BufRead, Write};

pub use compass::{CompassLogData, CompassLogEntry};

/// Column index to field name mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValuesOrder {
    columns: BTreeMap<usize, String>,
}

impl ValuesOrder {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Latitude, Longitude, Depth`
    pub fn csv_default() -> Self {
        Self::from_names(["Latitude", "Longitude", "Depth"])
    }

    /// `Time, Latitude, Longitude, Heading, Pitch, Roll`
    pub fn compass_default() -> Self {
        Self::from_names(["Time", "Latitude", "Longitude", "Heading", "Pitch", "Roll"])
    }

    /// Consecutive columns starting at index 0
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: names.into_iter().map(Into::into).enumerate().collect(),
        }
    }

    pub fn with_column(mut self, index: usize, name: impl Into<String>) -> Self {
        self.columns.insert(index, name.into());
        self
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.columns.get(&index).map(String::as_str)
    }

    /// Which of `fields` the column at `index` is bound to
    pub(crate) fn field_at<'f>(&self, index: usize, fields: &[&'f str]) -> Option<Column<'f>> {
        let name = self.columns.get(&index)?.to_lowercase();
        let field = fields
            .iter()
            .find(|field| name.contains(&field.to_lowercase()))
            .copied();
        Some(match field {
            Some(field) => Column::Field(field),
            None => Column::Ignored,
        })
    }
}

/// Binding of one configured column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Column<'f> {
    Field(&'f str),
    /// Configured under a name that matches no known field
    Ignored,
}

const LATITUDE: &str = "latitude";
const LONGITUDE: &str = "longitude";
const DEPTH: &str = "depth";

/// One point with its water depth. Entries compare equal on point and
/// depth alone.
#[derive(Debug, Clone)]
pub struct CsvLogEntry {
    pub point: CoordinatePoint,
    pub depth: LinearDimension,
    /// Unmapped columns, in their original order
    pub extra_values: Vec<String>,
}

impl CsvLogEntry {
    pub fn new(point: CoordinatePoint, depth: LinearDimension) -> Self {
        Self {
            point,
            depth,
            extra_values: Vec::new(),
        }
    }

    pub fn from_source<P: DepthPointSource>(source: &P) -> Self {
        Self::new(source.point(), source.depth())
    }

    /// Parse one line. Returns `None` when the line has fewer values than
    /// mapped columns, when a mapped value fails to parse, or when latitude,
    /// longitude or depth is missing.
    pub fn parse(line: &str, separator: char, unit: LinearUnit, order: &ValuesOrder) -> Option<Self> {
        let values: Vec<&str> = line.trim_end_matches(['\r', '\n']).split(separator).collect();
        if line.is_empty() || values.len() < order.len() {
            return None;
        }

        let (mut latitude, mut longitude, mut depth) = (None, None, None);
        let mut extra_values = Vec::new();
        for (index, value) in values.iter().enumerate() {
            match order.field_at(index, &[LATITUDE, LONGITUDE, DEPTH]) {
                Some(Column::Field(LATITUDE)) => latitude = Some(parse_degrees(value)?),
                Some(Column::Field(LONGITUDE)) => longitude = Some(parse_degrees(value)?),
                Some(Column::Field(_)) => depth = Some(LinearDimension::parse(value, unit)?),
                Some(Column::Ignored) => {}
                None => extra_values.push(value.to_string()),
            }
        }

        let point = CoordinatePoint::try_new(latitude?, longitude?).ok()?;
        Some(Self {
            point,
            depth: depth?,
            extra_values,
        })
    }
}

pub(crate) fn parse_degrees(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

impl DepthPointSource for CsvLogEntry {
    fn point(&self) -> CoordinatePoint {
        self.point
    }

    fn depth(&self) -> LinearDimension {
        self.depth
    }

    fn with_depth(&self, depth: LinearDimension) -> Self {
        Self {
            depth,
            ..self.clone()
        }
    }
}

impl PartialEq for CsvLogEntry {
    fn eq(&self, other: &Self) -> bool {
        self.point == other.point && self.depth == other.depth
    }
}

/// Always the default `latitude,longitude,depth` order in meters, followed by
/// the extra values. A line read with a custom [`ValuesOrder`] is written
/// back normalized.
impl fmt::Display for CsvLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.point, self.depth.meters())?;
        for value in &self.extra_values {
            write!(f, ",{}", value)?;
        }
        Ok(())
    }
}

/// A text log of depth points
#[derive(Debug, Clone)]
pub struct CsvLogData {
    pub name: String,
    pub creation_time: Timestamp,
    pub points: Vec<CsvLogEntry>,
}

impl CsvLogData {
    pub fn new(points: Vec<CsvLogEntry>) -> Self {
        Self {
            name: describe(&points),
            creation_time: Utc::now(),
            points,
        }
    }

    /// Entries for every point of `sources`, keeping the first entry seen
    /// at each position
    pub fn from_sources<P: DepthPointSource>(sources: &[P]) -> Self {
        let points = crate::depth_adjuster::unique_depth_points(sources)
            .into_iter()
            .map(CsvLogEntry::from_source)
            .collect();
        Self::new(points)
    }

    /// Read comma separated lines in meters, skipping lines that do not parse
    pub fn read_from<R: BufRead>(reader: R, order: &ValuesOrder) -> Result<Self> {
        let mut points = Vec::new();
        let mut skipped = 0usize;
        for line in reader.lines() {
            match CsvLogEntry::parse(&line?, ',', LinearUnit::Meters, order) {
                Some(entry) => points.push(entry),
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            log::debug!("Skipped {} unparseable CSV lines", skipped);
        }
        Ok(Self::new(points))
    }

    /// Write one normalized line per point, see the `Display` impl of
    /// [`CsvLogEntry`]
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        for point in &self.points {
            writeln!(writer, "{}", point)?;
        }
        Ok(())
    }
}

fn describe(points: &[CsvLogEntry]) -> String {
    let depths = points.iter().map(|point| point.depth.meters());
    let min = depths.clone().fold(f64::INFINITY, f64::min);
    let max = depths.fold(f64::NEG_INFINITY, f64::max);
    if points.is_empty() {
        "0 points.".to_string()
    } else {
        format!("{} points with depths from {} to {}.", points.len(), min, max)
    }
}
