//! Configuration types for frame selection and channel generation

use crate::lowrance::Frame;
use crate::types::ChannelType;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Selects frames by channel and by inclusive frame-index range
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameFilter {
    /// Optional: only keep frames of these channels
    #[serde(default)]
    pub channels: Option<Vec<ChannelType>>,

    /// Optional: first frame index to keep
    #[serde(default)]
    pub frames_from: Option<u32>,

    /// Optional: last frame index to keep
    #[serde(default)]
    pub frames_to: Option<u32>,
}

impl FrameFilter {
    /// Create a filter that keeps every frame
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set channel filter
    pub fn with_channels(mut self, channels: Vec<ChannelType>) -> Self {
        self.channels = Some(channels);
        self
    }

    /// Builder method: set first frame index
    pub fn with_frames_from(mut self, from: u32) -> Self {
        self.frames_from = Some(from);
        self
    }

    /// Builder method: set last frame index
    pub fn with_frames_to(mut self, to: u32) -> Self {
        self.frames_to = Some(to);
        self
    }

    /// True when the filter keeps everything
    pub fn is_pass_through(&self) -> bool {
        self.channels.is_none() && self.frames_from.is_none() && self.frames_to.is_none()
    }

    /// Check if a channel should be kept
    pub fn should_process_channel(&self, channel: ChannelType) -> bool {
        match &self.channels {
            Some(channels) => channels.contains(&channel),
            None => true,
        }
    }

    /// Check if a frame index should be kept
    pub fn should_process_index(&self, frame_index: u32) -> bool {
        self.frames_from.map_or(true, |from| frame_index >= from)
            && self.frames_to.map_or(true, |to| frame_index <= to)
    }

    pub fn accepts(&self, frame: &Frame) -> bool {
        self.should_process_channel(frame.channel()) && self.should_process_index(frame.frame_index())
    }
}

/// Which channel to derive from which, and how
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub source: ChannelType,
    pub destination: ChannelType,

    /// Synthesize sounded data from depth instead of remapping the source
    #[serde(default)]
    pub synthesize: bool,

    /// Seed for reproducible synthesis
    #[serde(default)]
    pub seed: Option<u64>,
}

impl GenerationConfig {
    pub fn new(source: ChannelType, destination: ChannelType) -> Self {
        Self {
            source,
            destination,
            synthesize: false,
            seed: None,
        }
    }

    /// Builder method: enable or disable synthesis
    pub fn with_synthesis(mut self, enabled: bool) -> Self {
        self.synthesize = enabled;
        self
    }

    /// Builder method: fix the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Random source for synthesis, seeded when a seed is configured
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}
