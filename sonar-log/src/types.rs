//! Core types for the sonar log library
//!
//! This module defines the enumerations shared by the codec, the scanner and the
//! channel generator, together with the library error type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Timestamp type used throughout the library
pub type Timestamp = DateTime<Utc>;

/// Result type for sonar log operations
pub type Result<T> = std::result::Result<T, SonarLogError>;

/// Errors that can occur while reading, transforming or writing sonar logs
#[derive(Debug, thiserror::Error)]
pub enum SonarLogError {
    #[error("Invalid log format: {0}")]
    Format(String),

    #[error("Cannot determine file format: no known frame signature found")]
    UnknownFormat,

    #[error("Argument '{argument}' out of range: {reason}")]
    OutOfRange {
        argument: &'static str,
        reason: String,
    },

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Empty input: {0}")]
    EmptyInput(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SonarLogError {
    pub(crate) fn out_of_range(argument: &'static str, reason: impl Into<String>) -> Self {
        SonarLogError::OutOfRange {
            argument,
            reason: reason.into(),
        }
    }
}

/// Container file version stored in the first two bytes of a log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileVersion {
    Slg,
    Sl2,
    Sl3,
}

impl FileVersion {
    /// Map the on-disk version number, `None` for anything unrecognized
    pub fn from_raw(value: i16) -> Option<Self> {
        match value {
            1 => Some(FileVersion::Slg),
            2 => Some(FileVersion::Sl2),
            3 => Some(FileVersion::Sl3),
            _ => None,
        }
    }

    pub fn raw(self) -> i16 {
        match self {
            FileVersion::Slg => 1,
            FileVersion::Sl2 => 2,
            FileVersion::Sl3 => 3,
        }
    }

    /// Lowercase file extension for this version
    pub fn extension(self) -> &'static str {
        match self {
            FileVersion::Slg => "slg",
            FileVersion::Sl2 => "sl2",
            FileVersion::Sl3 => "sl3",
        }
    }
}

impl fmt::Display for FileVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileVersion::Slg => write!(f, "SLG"),
            FileVersion::Sl2 => write!(f, "SL2"),
            FileVersion::Sl3 => write!(f, "SL3"),
        }
    }
}

/// Sonar channel (transducer beam) of a frame
///
/// Values 7, 8, 10 and 11 occur in real logs but carry no known meaning. They
/// decode as [`ChannelType::Reserved`] and are never written back out.
/// Serialized as the raw channel number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u16", into = "u16")]
pub enum ChannelType {
    Primary,
    Secondary,
    DownScan,
    SidescanLeft,
    SidescanRight,
    SidescanComposite,
    ThreeD,
    Reserved(u16),
}

impl ChannelType {
    /// All channels that can be encoded, in numeric order
    pub const KNOWN: [ChannelType; 7] = [
        ChannelType::Primary,
        ChannelType::Secondary,
        ChannelType::DownScan,
        ChannelType::SidescanLeft,
        ChannelType::SidescanRight,
        ChannelType::SidescanComposite,
        ChannelType::ThreeD,
    ];

    pub fn from_raw(value: u16) -> Self {
        match value {
            0 => ChannelType::Primary,
            1 => ChannelType::Secondary,
            2 => ChannelType::DownScan,
            3 => ChannelType::SidescanLeft,
            4 => ChannelType::SidescanRight,
            5 => ChannelType::SidescanComposite,
            9 => ChannelType::ThreeD,
            other => ChannelType::Reserved(other),
        }
    }

    pub fn raw(self) -> u16 {
        match self {
            ChannelType::Primary => 0,
            ChannelType::Secondary => 1,
            ChannelType::DownScan => 2,
            ChannelType::SidescanLeft => 3,
            ChannelType::SidescanRight => 4,
            ChannelType::SidescanComposite => 5,
            ChannelType::ThreeD => 9,
            ChannelType::Reserved(value) => value,
        }
    }

    /// Channels whose sounded data covers a single range from zero outward
    pub fn is_single_sided(self) -> bool {
        matches!(
            self,
            ChannelType::Primary
                | ChannelType::Secondary
                | ChannelType::DownScan
                | ChannelType::SidescanRight
        )
    }

    pub fn is_reserved(self) -> bool {
        matches!(self, ChannelType::Reserved(_))
    }

    /// Slot in the per-channel "last frame offset" table, if the channel has one
    pub(crate) fn last_offset_slot(self) -> Option<usize> {
        match self {
            ChannelType::Primary => Some(0),
            ChannelType::Secondary => Some(1),
            ChannelType::DownScan => Some(2),
            ChannelType::SidescanLeft => Some(3),
            ChannelType::SidescanRight => Some(4),
            ChannelType::SidescanComposite => Some(5),
            ChannelType::ThreeD => Some(6),
            ChannelType::Reserved(_) => None,
        }
    }
}

impl From<u16> for ChannelType {
    fn from(value: u16) -> Self {
        ChannelType::from_raw(value)
    }
}

impl From<ChannelType> for u16 {
    fn from(channel: ChannelType) -> Self {
        channel.raw()
    }
}

impl PartialOrd for ChannelType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ChannelType {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw().cmp(&other.raw())
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelType::Primary => write!(f, "Primary"),
            ChannelType::Secondary => write!(f, "Secondary"),
            ChannelType::DownScan => write!(f, "DownScan"),
            ChannelType::SidescanLeft => write!(f, "SidescanLeft"),
            ChannelType::SidescanRight => write!(f, "SidescanRight"),
            ChannelType::SidescanComposite => write!(f, "SidescanComposite"),
            ChannelType::ThreeD => write!(f, "ThreeD"),
            ChannelType::Reserved(value) => write!(f, "Reserved({})", value),
        }
    }
}

/// Transducer frequency code
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Frequency {
    #[default]
    F200kHz,
    F50kHz,
    F83kHz,
    F455kHz,
    F800kHz,
    F38kHz,
    F28kHz,
    F130to210kHz,
    F90to150kHz,
    F40to60kHz,
    F25to45kHz,
    Other(u8),
}

impl Frequency {
    pub fn from_raw(value: u8) -> Self {
        match value {
            0 => Frequency::F200kHz,
            1 => Frequency::F50kHz,
            2 => Frequency::F83kHz,
            3 => Frequency::F455kHz,
            4 => Frequency::F800kHz,
            5 => Frequency::F38kHz,
            6 => Frequency::F28kHz,
            7 => Frequency::F130to210kHz,
            8 => Frequency::F90to150kHz,
            9 => Frequency::F40to60kHz,
            10 => Frequency::F25to45kHz,
            other => Frequency::Other(other),
        }
    }

    pub fn raw(self) -> u8 {
        match self {
            Frequency::F200kHz => 0,
            Frequency::F50kHz => 1,
            Frequency::F83kHz => 2,
            Frequency::F455kHz => 3,
            Frequency::F800kHz => 4,
            Frequency::F38kHz => 5,
            Frequency::F28kHz => 6,
            Frequency::F130to210kHz => 7,
            Frequency::F90to150kHz => 8,
            Frequency::F40to60kHz => 9,
            Frequency::F25to45kHz => 10,
            Frequency::Other(value) => value,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::F200kHz => write!(f, "200 kHz"),
            Frequency::F50kHz => write!(f, "50 kHz"),
            Frequency::F83kHz => write!(f, "83 kHz"),
            Frequency::F455kHz => write!(f, "455 kHz"),
            Frequency::F800kHz => write!(f, "800 kHz"),
            Frequency::F38kHz => write!(f, "38 kHz"),
            Frequency::F28kHz => write!(f, "28 kHz"),
            Frequency::F130to210kHz => write!(f, "130-210 kHz"),
            Frequency::F90to150kHz => write!(f, "90-150 kHz"),
            Frequency::F40to60kHz => write!(f, "40-60 kHz"),
            Frequency::F25to45kHz => write!(f, "25-45 kHz"),
            Frequency::Other(value) => write!(f, "unknown ({})", value),
        }
    }
}
