//! Sonar frame: one ping on one channel plus the telemetry sampled with it

use super::offsets::{self, FrameFlag};
use super::sounded::SoundedData;
use crate::primitives::{CoordinatePoint, DepthPointSource, LinearDimension};
use crate::types::{ChannelType, FileVersion, Frequency, Timestamp};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// Raw 16-bit flags field. Every bit is kept, named flags are looked up
/// through the bit table of a container version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FrameFlags(u16);

impl FrameFlags {
    pub fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u16 {
        self.0
    }

    pub fn bit(self, bit: u8) -> bool {
        bit < 16 && self.0 & (1 << bit) != 0
    }

    pub fn with_bit(self, bit: u8, value: bool) -> Self {
        if bit >= 16 {
            return self;
        }
        if value {
            Self(self.0 | (1 << bit))
        } else {
            Self(self.0 & !(1 << bit))
        }
    }

    /// Named flag for a version. SLG has no layout and reports nothing set.
    pub fn get(self, flag: FrameFlag, version: FileVersion) -> bool {
        offsets::layout(version)
            .map(|layout| self.bit(layout.flag_bit(flag)))
            .unwrap_or(false)
    }

    pub fn with(self, flag: FrameFlag, version: FileVersion, value: bool) -> Self {
        match offsets::layout(version) {
            Ok(layout) => self.with_bit(layout.flag_bit(flag), value),
            Err(_) => self,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    channel: ChannelType,
    frame_index: u32,
    frequency: Frequency,
    depth: LinearDimension,
    keel_depth: LinearDimension,
    speed_gps: f64,
    water_speed: f64,
    course_over_ground: f32,
    heading: f32,
    altitude: LinearDimension,
    temperature: f32,
    point: CoordinatePoint,
    flags: FrameFlags,
    timestamp: Timestamp,
    sounded_data: SoundedData,
}

impl Frame {
    pub fn builder(channel: ChannelType) -> FrameBuilder {
        FrameBuilder::new(channel)
    }

    /// Builder preloaded with every field of this frame
    pub fn to_builder(&self) -> FrameBuilder {
        FrameBuilder {
            frame: self.clone(),
        }
    }

    pub fn channel(&self) -> ChannelType {
        self.channel
    }

    /// Length of the sounded data in bytes
    pub fn packet_size(&self) -> usize {
        self.sounded_data.len()
    }

    pub fn frame_index(&self) -> u32 {
        self.frame_index
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn depth(&self) -> LinearDimension {
        self.depth
    }

    pub fn keel_depth(&self) -> LinearDimension {
        self.keel_depth
    }

    /// Speed over ground, meters per second
    pub fn speed_gps(&self) -> f64 {
        self.speed_gps
    }

    /// Speed through water, meters per second
    pub fn water_speed(&self) -> f64 {
        self.water_speed
    }

    /// Radians
    pub fn course_over_ground(&self) -> f32 {
        self.course_over_ground
    }

    /// Radians
    pub fn heading(&self) -> f32 {
        self.heading
    }

    pub fn altitude(&self) -> LinearDimension {
        self.altitude
    }

    /// Degrees Celsius
    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn point(&self) -> CoordinatePoint {
        self.point
    }

    pub fn flags(&self) -> FrameFlags {
        self.flags
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn sounded_data(&self) -> &SoundedData {
        &self.sounded_data
    }

    /// Sort key used before writing a container
    pub fn order_key(&self) -> (u32, ChannelType) {
        (self.frame_index, self.channel)
    }

    pub(crate) fn cmp_order(&self, other: &Frame) -> Ordering {
        self.order_key().cmp(&other.order_key())
    }
}

impl DepthPointSource for Frame {
    fn point(&self) -> CoordinatePoint {
        self.point
    }

    fn depth(&self) -> LinearDimension {
        self.depth
    }

    fn with_depth(&self, depth: LinearDimension) -> Self {
        self.to_builder().depth(depth).build()
    }
}

/// Accumulates frame fields and produces an immutable [`Frame`]
#[derive(Debug, Clone)]
pub struct FrameBuilder {
    frame: Frame,
}

impl FrameBuilder {
    pub fn new(channel: ChannelType) -> Self {
        Self {
            frame: Frame {
                channel,
                frame_index: 0,
                frequency: Frequency::default(),
                depth: LinearDimension::ZERO,
                keel_depth: LinearDimension::ZERO,
                speed_gps: 0.0,
                water_speed: 0.0,
                course_over_ground: 0.0,
                heading: 0.0,
                altitude: LinearDimension::ZERO,
                temperature: 0.0,
                point: CoordinatePoint::default(),
                flags: FrameFlags::default(),
                timestamp: DateTime::<Utc>::UNIX_EPOCH,
                sounded_data: SoundedData::empty(channel),
            },
        }
    }

    pub fn channel(mut self, channel: ChannelType) -> Self {
        self.frame.channel = channel;
        self
    }

    pub fn frame_index(mut self, frame_index: u32) -> Self {
        self.frame.frame_index = frame_index;
        self
    }

    pub fn frequency(mut self, frequency: Frequency) -> Self {
        self.frame.frequency = frequency;
        self
    }

    pub fn depth(mut self, depth: LinearDimension) -> Self {
        self.frame.depth = depth;
        self
    }

    pub fn keel_depth(mut self, keel_depth: LinearDimension) -> Self {
        self.frame.keel_depth = keel_depth;
        self
    }

    pub fn speed_gps(mut self, meters_per_second: f64) -> Self {
        self.frame.speed_gps = meters_per_second;
        self
    }

    pub fn water_speed(mut self, meters_per_second: f64) -> Self {
        self.frame.water_speed = meters_per_second;
        self
    }

    pub fn course_over_ground(mut self, radians: f32) -> Self {
        self.frame.course_over_ground = radians;
        self
    }

    pub fn heading(mut self, radians: f32) -> Self {
        self.frame.heading = radians;
        self
    }

    pub fn altitude(mut self, altitude: LinearDimension) -> Self {
        self.frame.altitude = altitude;
        self
    }

    pub fn temperature(mut self, celsius: f32) -> Self {
        self.frame.temperature = celsius;
        self
    }

    pub fn point(mut self, point: CoordinatePoint) -> Self {
        self.frame.point = point;
        self
    }

    pub fn flags(mut self, flags: FrameFlags) -> Self {
        self.frame.flags = flags;
        self
    }

    pub fn timestamp(mut self, timestamp: Timestamp) -> Self {
        self.frame.timestamp = timestamp;
        self
    }

    pub fn sounded_data(mut self, sounded_data: SoundedData) -> Self {
        self.frame.sounded_data = sounded_data;
        self
    }

    pub fn build(self) -> Frame {
        self.frame
    }
}
