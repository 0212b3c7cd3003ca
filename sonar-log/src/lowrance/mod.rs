//! Lowrance SL2/SL3 containers
//!
//! This module contains the frame-map scanner, the per-version frame layouts,
//! the frame codec and the channel frame generator.

mod channel_gen;
mod codec;
mod frame;
mod frame_map;
mod header;
mod log_data;
mod offsets;
mod sounded;

// Re-export key types for convenience
pub use channel_gen::{generate, generate_channel_frames};
pub use codec::{
    decode_frame, decode_frame_since, encode_frames, position_from_projection,
    position_to_projection, write_frames,
};
pub use frame::{Frame, FrameBuilder, FrameFlags};
pub use frame_map::{detect_version, research_values, scan, FrameMap, FrameMapEntry, ResearchValue};
pub use header::Header;
pub use log_data::{ChannelSummary, LowranceLogData};
pub use offsets::{layout, FrameField, FrameFlag, FrameLayout};
pub use sounded::SoundedData;
