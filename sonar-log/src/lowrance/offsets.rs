//! Byte offsets of frame fields for each container version
//!
//! Offsets are relative to the start of a frame. Bytes not covered by any
//! field are reserved and are zero-filled on write.

use crate::types::{ChannelType, FileVersion, Result, SonarLogError};

/// Fields stored in a frame record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameField {
    FrameOffset,
    LastPrimaryOffset,
    LastSecondaryOffset,
    LastDownScanOffset,
    LastSidescanLeftOffset,
    LastSidescanRightOffset,
    LastSidescanCompositeOffset,
    LastThreeDOffset,
    ThisFrameSize,
    PreviousFrameSize,
    ChannelType,
    PacketSize,
    FrameIndex,
    UpperLimit,
    LowerLimit,
    Frequency,
    CreationTime,
    Depth,
    KeelDepth,
    SpeedGps,
    Temperature,
    IntLongitude,
    IntLatitude,
    WaterSpeed,
    CourseOverGround,
    Altitude,
    Heading,
    Flags,
    TimeOffset,
}

const FIELD_COUNT: usize = FrameField::TimeOffset as usize + 1;

/// Named validity flags and their bit position in the 16-bit flags field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFlag {
    TrackValid,
    WaterSpeedValid,
    PositionValid,
    WaterTempValid,
    SpeedValid,
    AltitudeValid,
    HeadingValid,
}

impl FrameFlag {
    pub const ALL: [FrameFlag; 7] = [
        FrameFlag::TrackValid,
        FrameFlag::WaterSpeedValid,
        FrameFlag::PositionValid,
        FrameFlag::WaterTempValid,
        FrameFlag::SpeedValid,
        FrameFlag::AltitudeValid,
        FrameFlag::HeadingValid,
    ];
}

/// Field layout of one container version
#[derive(Debug)]
pub struct FrameLayout {
    version: FileVersion,
    offsets: [Option<u16>; FIELD_COUNT],
    header_len: usize,
    flag_bits: [(FrameFlag, u8); 7],
    signatures: &'static [u32],
    signature_offset: usize,
}

impl FrameLayout {
    pub fn version(&self) -> FileVersion {
        self.version
    }

    pub fn offset(&self, field: FrameField) -> Option<usize> {
        self.offsets[field as usize].map(usize::from)
    }

    /// Offset of a field every layout of this version must carry
    pub(crate) fn required(&self, field: FrameField) -> usize {
        // Only called for fields present in every table below
        self.offsets[field as usize].map(usize::from).unwrap_or(0)
    }

    /// Fixed part of a frame, sounded data starts right after it
    pub fn header_len(&self) -> usize {
        self.header_len
    }

    pub fn flag_bit(&self, flag: FrameFlag) -> u8 {
        self.flag_bits
            .iter()
            .find(|(candidate, _)| *candidate == flag)
            .map(|(_, bit)| *bit)
            .unwrap_or(0)
    }

    /// Known 32-bit values at [`FrameLayout::signature_offset`] used to
    /// relocate a frame start after corrupted bytes
    pub fn signatures(&self) -> &'static [u32] {
        self.signatures
    }

    pub fn signature_offset(&self) -> usize {
        self.signature_offset
    }

    /// Field holding the per-channel "last frame" back reference
    pub fn last_offset_field(&self, channel: ChannelType) -> Option<FrameField> {
        let field = match channel {
            ChannelType::Primary => FrameField::LastPrimaryOffset,
            ChannelType::Secondary => FrameField::LastSecondaryOffset,
            ChannelType::DownScan => FrameField::LastDownScanOffset,
            ChannelType::SidescanLeft => FrameField::LastSidescanLeftOffset,
            ChannelType::SidescanRight => FrameField::LastSidescanRightOffset,
            ChannelType::SidescanComposite => FrameField::LastSidescanCompositeOffset,
            ChannelType::ThreeD => FrameField::LastThreeDOffset,
            ChannelType::Reserved(_) => return None,
        };
        self.offset(field).map(|_| field)
    }
}

const FLAG_BITS: [(FrameFlag, u8); 7] = [
    (FrameFlag::TrackValid, 0),
    (FrameFlag::WaterSpeedValid, 1),
    (FrameFlag::PositionValid, 3),
    (FrameFlag::WaterTempValid, 5),
    (FrameFlag::SpeedValid, 6),
    (FrameFlag::AltitudeValid, 14),
    (FrameFlag::HeadingValid, 15),
];

// channel type in the low half, packet size in the high half
const SL2_SIGNATURES: [u32; 6] = [
    0x0780_0000, // Primary, 1920
    0x0C00_0000, // Primary, 3072
    0x0780_0001, // Secondary, 1920
    0x0780_0002, // DownScan, 1920
    0x0578_0002, // DownScan, 1400
    0x0AF0_0005, // SidescanComposite, 2800
];

// packet size followed by two zero bytes
const SL3_SIGNATURES: [u32; 3] = [3072, 2800, 1400];

const fn sl2_offsets() -> [Option<u16>; FIELD_COUNT] {
    let mut table = [None; FIELD_COUNT];
    table[FrameField::FrameOffset as usize] = Some(0);
    table[FrameField::LastPrimaryOffset as usize] = Some(4);
    table[FrameField::LastSecondaryOffset as usize] = Some(8);
    table[FrameField::LastDownScanOffset as usize] = Some(12);
    table[FrameField::LastSidescanLeftOffset as usize] = Some(16);
    table[FrameField::LastSidescanRightOffset as usize] = Some(20);
    table[FrameField::LastSidescanCompositeOffset as usize] = Some(24);
    table[FrameField::ThisFrameSize as usize] = Some(28);
    table[FrameField::PreviousFrameSize as usize] = Some(30);
    table[FrameField::ChannelType as usize] = Some(32);
    table[FrameField::PacketSize as usize] = Some(34);
    table[FrameField::FrameIndex as usize] = Some(36);
    table[FrameField::UpperLimit as usize] = Some(40);
    table[FrameField::LowerLimit as usize] = Some(44);
    table[FrameField::Frequency as usize] = Some(50);
    table[FrameField::CreationTime as usize] = Some(60);
    table[FrameField::Depth as usize] = Some(64);
    table[FrameField::KeelDepth as usize] = Some(68);
    table[FrameField::SpeedGps as usize] = Some(100);
    table[FrameField::Temperature as usize] = Some(104);
    table[FrameField::IntLongitude as usize] = Some(108);
    table[FrameField::IntLatitude as usize] = Some(112);
    table[FrameField::WaterSpeed as usize] = Some(116);
    table[FrameField::CourseOverGround as usize] = Some(120);
    table[FrameField::Altitude as usize] = Some(124);
    table[FrameField::Heading as usize] = Some(128);
    table[FrameField::Flags as usize] = Some(132);
    table[FrameField::TimeOffset as usize] = Some(140);
    table
}

const fn sl3_offsets() -> [Option<u16>; FIELD_COUNT] {
    let mut table = [None; FIELD_COUNT];
    table[FrameField::FrameOffset as usize] = Some(0);
    table[FrameField::ThisFrameSize as usize] = Some(8);
    table[FrameField::PreviousFrameSize as usize] = Some(10);
    table[FrameField::ChannelType as usize] = Some(12);
    table[FrameField::FrameIndex as usize] = Some(16);
    table[FrameField::UpperLimit as usize] = Some(20);
    table[FrameField::LowerLimit as usize] = Some(24);
    table[FrameField::CreationTime as usize] = Some(40);
    table[FrameField::PacketSize as usize] = Some(44);
    table[FrameField::Depth as usize] = Some(48);
    table[FrameField::Frequency as usize] = Some(52);
    table[FrameField::SpeedGps as usize] = Some(84);
    table[FrameField::Temperature as usize] = Some(88);
    table[FrameField::IntLongitude as usize] = Some(92);
    table[FrameField::IntLatitude as usize] = Some(96);
    table[FrameField::WaterSpeed as usize] = Some(100);
    table[FrameField::CourseOverGround as usize] = Some(104);
    table[FrameField::Altitude as usize] = Some(108);
    table[FrameField::Heading as usize] = Some(112);
    table[FrameField::Flags as usize] = Some(116);
    table[FrameField::TimeOffset as usize] = Some(124);
    table[FrameField::LastPrimaryOffset as usize] = Some(128);
    table[FrameField::LastSecondaryOffset as usize] = Some(132);
    table[FrameField::LastDownScanOffset as usize] = Some(136);
    table[FrameField::LastSidescanLeftOffset as usize] = Some(140);
    table[FrameField::LastSidescanRightOffset as usize] = Some(144);
    table[FrameField::LastSidescanCompositeOffset as usize] = Some(148);
    table[FrameField::LastThreeDOffset as usize] = Some(164);
    table
}

static SL2_LAYOUT: FrameLayout = FrameLayout {
    version: FileVersion::Sl2,
    offsets: sl2_offsets(),
    header_len: 144,
    flag_bits: FLAG_BITS,
    signatures: &SL2_SIGNATURES,
    signature_offset: 32,
};

static SL3_LAYOUT: FrameLayout = FrameLayout {
    version: FileVersion::Sl3,
    offsets: sl3_offsets(),
    header_len: 168,
    flag_bits: FLAG_BITS,
    signatures: &SL3_SIGNATURES,
    signature_offset: 44,
};

/// Layout for a container version, SLG has no known frame layout
pub fn layout(version: FileVersion) -> Result<&'static FrameLayout> {
    match version {
        FileVersion::Sl2 => Ok(&SL2_LAYOUT),
        FileVersion::Sl3 => Ok(&SL3_LAYOUT),
        FileVersion::Slg => Err(SonarLogError::Unsupported(
            "SLG frame layout is not implemented".to_string(),
        )),
    }
}

/// Both implemented layouts, in the order signature detection tries them
pub(crate) fn known_layouts() -> [&'static FrameLayout; 2] {
    [&SL2_LAYOUT, &SL3_LAYOUT]
}
