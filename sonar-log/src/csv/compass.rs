//! Compass attitude logs
//!
//! Same line format as the point logs, with a required Unix-millisecond
//! time column and optional position, heading, pitch and roll columns.

use super::{parse_degrees, Column, ValuesOrder};
use crate::primitives::CoordinatePoint;
use crate::types::{Result, Timestamp};
use chrono::{DateTime, Utc};
use std::fmt;
use std::io::{BufRead, Write};

const TIME: &str = "time";
const LATITUDE: &str = "latitude";
const LONGITUDE: &str = "longitude";
const HEADING: &str = "heading";
const PITCH: &str = "pitch";
const ROLL: &str = "roll";

const FIELDS: [&str; 6] = [TIME, LATITUDE, LONGITUDE, HEADING, PITCH, ROLL];

#[derive(Debug, Clone, PartialEq)]
pub struct CompassLogEntry {
    pub timestamp: Timestamp,
    /// Present only when both latitude and longitude columns parse
    pub point: Option<CoordinatePoint>,
    /// Magnetic azimuth in degrees
    pub heading: f64,
    /// Degrees, negative when the bow goes down
    pub pitch: f64,
    /// Degrees, positive for a right side turn
    pub roll: f64,
}

impl CompassLogEntry {
    pub fn parse(line: &str, separator: char, order: &ValuesOrder) -> Option<Self> {
        let values: Vec<&str> = line.trim_end_matches(['\r', '\n']).split(separator).collect();
        if line.is_empty() || values.len() < order.len() {
            return None;
        }

        let mut timestamp = None;
        let (mut latitude, mut longitude) = (None, None);
        let (mut heading, mut pitch, mut roll) = (0.0, 0.0, 0.0);
        for (index, value) in values.iter().enumerate() {
            let Some(Column::Field(field)) = order.field_at(index, &FIELDS) else {
                continue;
            };
            match field {
                TIME => {
                    let millis = value.trim().parse::<i64>().ok()?;
                    timestamp = Some(DateTime::<Utc>::from_timestamp_millis(millis)?);
                }
                LATITUDE => latitude = parse_degrees(value),
                LONGITUDE => longitude = parse_degrees(value),
                HEADING => heading = parse_degrees(value)?,
                PITCH => pitch = parse_degrees(value)?,
                _ => roll = parse_degrees(value)?,
            }
        }

        let point = match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => CoordinatePoint::try_new(latitude, longitude).ok(),
            _ => None,
        };
        Some(Self {
            timestamp: timestamp?,
            point,
            heading,
            pitch,
            roll,
        })
    }
}

impl fmt::Display for CompassLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},", self.timestamp.timestamp_millis())?;
        match &self.point {
            Some(point) => write!(f, "{}", point)?,
            None => f.write_str(",")?,
        }
        write!(f, ",{},{},{}", self.heading, self.pitch, self.roll)
    }
}

#[derive(Debug, Clone)]
pub struct CompassLogData {
    pub name: String,
    pub creation_time: Timestamp,
    pub entries: Vec<CompassLogEntry>,
}

impl CompassLogData {
    pub fn new(entries: Vec<CompassLogEntry>) -> Self {
        Self {
            name: format!("{} compass entries.", entries.len()),
            creation_time: Utc::now(),
            entries,
        }
    }

    pub fn read_from<R: BufRead>(reader: R, order: &ValuesOrder) -> Result<Self> {
        let mut entries = Vec::new();
        for line in reader.lines() {
            if let Some(entry) = CompassLogEntry::parse(&line?, ',', order) {
                entries.push(entry);
            }
        }
        Ok(Self::new(entries))
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        for entry in &self.entries {
            writeln!(writer, "{}", entry)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_full_line() {
        let order = ValuesOrder::compass_default();
        let entry = CompassLogEntry::parse("1600000000250,60.5,32.25,181.5,-0.1,0.05", ',', &order).unwrap();
        assert_eq!(entry.timestamp.timestamp_millis(), 1_600_000_000_250);
        assert_eq!(entry.point, Some(CoordinatePoint::new(60.5, 32.25)));
        assert_eq!(entry.heading, 181.5);
        assert_eq!(entry.pitch, -0.1);
        assert_eq!(entry.roll, 0.05);
        assert_eq!(entry.to_string(), "1600000000250,60.5,32.25,181.5,-0.1,0.05");
    }

    #[test]
    fn test_position_is_optional() {
        let order = ValuesOrder::compass_default();
        let entry = CompassLogEntry::parse("1000,,,90,0,0", ',', &order).unwrap();
        assert_eq!(entry.point, None);
        assert_eq!(entry.to_string(), "1000,,,90,0,0");
    }

    #[test]
    fn test_time_is_required() {
        let order = ValuesOrder::new().with_column(0, "Heading").with_column(1, "Pitch");
        assert!(CompassLogEntry::parse("90,0.1", ',', &order).is_none());

        let order = ValuesOrder::compass_default();
        assert!(CompassLogEntry::parse("soon,60,32,90,0,0", ',', &order).is_none());
        assert!(CompassLogEntry::parse("1000,60,32,east,0,0", ',', &order).is_none());
    }

    #[test]
    fn test_read_and_write() {
        let text = "1000,60.1,32.1,10,0,0\n# header\n2000,60.2,32.2,20,0.5,-0.5\n";
        let data = CompassLogData::read_from(Cursor::new(text), &ValuesOrder::compass_default()).unwrap();
        assert_eq!(data.entries.len(), 2);
        assert_eq!(data.name, "2 compass entries.");

        let mut out = Vec::new();
        data.write_to(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "1000,60.1,32.1,10,0,0\n2000,60.2,32.2,20,0.5,-0.5\n"
        );
    }
}
