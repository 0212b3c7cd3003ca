//! Sonar Log Library
//!
//! Reads and writes Lowrance SL2/SL3 sonar logs and converts them to and from
//! plain-text point logs.
//!
//! # Architecture
//!
//! - The frame-map scanner recovers frame boundaries from a container that has
//!   no index, resynchronizing on known channel signatures after corruption
//! - The frame codec decodes and encodes frames through per-version layouts
//! - The channel generator derives frames of one sonar channel from another,
//!   remapping or synthesizing the sounded data
//! - The depth adjuster shifts one survey onto another through its closest
//!   pair of points
//!
//! Option parsing, console reporting and file naming live in the application
//! layer (sonar-log-cli).
//!
//! # Example Usage
//!
//! ```no_run
//! use sonar_log::{FrameFilter, FileVersion, LowranceLogData, ChannelType};
//! use std::path::Path;
//!
//! let log = LowranceLogData::read_from_path(Path::new("trip.sl2")).unwrap();
//! for summary in log.channels() {
//!     println!("{}: {} frames", summary.channel, summary.frame_count);
//! }
//!
//! let filter = FrameFilter::new()
//!     .with_channels(vec![ChannelType::Primary])
//!     .with_frames_to(500);
//! let primary = log.filtered(&filter).converted_to(FileVersion::Sl3).unwrap();
//! primary.write_to_path(Path::new("trip.sl3")).unwrap();
//! ```

// Public modules
pub mod config;
pub mod csv;
pub mod depth_adjuster;
pub mod lowrance;
pub mod primitives;
pub mod types;

// Re-export main types for convenience
pub use config::{FrameFilter, GenerationConfig};
pub use csv::{CompassLogData, CompassLogEntry, CsvLogData, CsvLogEntry, ValuesOrder};
pub use depth_adjuster::{adjust_depth, find_nearest_points, AdjustedDepths, NearestPoints};
pub use lowrance::{Frame, FrameBuilder, Header, LowranceLogData, SoundedData};
pub use primitives::{CoordinatePoint, DepthPointSource, LinearDimension, LinearUnit};
pub use types::{ChannelType, FileVersion, Frequency, Result, SonarLogError, Timestamp};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Smoke test: an empty log still writes a header
        let log = LowranceLogData::new(Header::SL2, chrono::DateTime::<chrono::Utc>::UNIX_EPOCH, Vec::new());
        let mut bytes = Vec::new();
        assert_eq!(log.write_to(&mut bytes).unwrap(), Header::LEN);
        assert!(!VERSION.is_empty());
    }
}
