//! Hand-assembled SL2 containers for integration tests
//!
//! Built byte by byte from the on-disk layout so the reader is checked
//! against bytes the codec never produced.
#![allow(dead_code)]

use byteorder::{ByteOrder, LittleEndian};

pub const PACKET: usize = 1920;
pub const RECORD: usize = 144 + PACKET;
pub const CREATION_SECONDS: i32 = 1_600_000_000;
pub const SL2_HEADER: [u8; 8] = [2, 0, 1, 0, 0xB2, 0x07, 0, 0];

pub const INT_LONGITUDE: i32 = 3_600_000;
pub const INT_LATITUDE: i32 = 8_000_000;
pub const FLAGS: u16 = 0b1100_0000_0110_1011;

/// Fields that differ between the fixture frames
#[derive(Debug, Clone, Copy)]
pub struct RawFrame {
    pub channel: u16,
    pub index: u32,
    pub time_offset_ms: i32,
    pub depth_feet: f32,
    pub fill: u8,
}

pub fn fixture_frames() -> [RawFrame; 3] {
    [
        RawFrame { channel: 0, index: 0, time_offset_ms: 0, depth_feet: 10.0, fill: 0x11 },
        RawFrame { channel: 2, index: 0, time_offset_ms: 0, depth_feet: 10.0, fill: 0x22 },
        RawFrame { channel: 0, index: 1, time_offset_ms: 500, depth_feet: 12.5, fill: 0x33 },
    ]
}

/// Last-offset field positions for Primary, Secondary, DownScan, Left,
/// Right and Composite
const LAST_OFFSET_FIELDS: [usize; 6] = [4, 8, 12, 16, 20, 24];

fn record(raw: &RawFrame, offset: u32, previous: u16, last_offsets: &[u32; 6]) -> Vec<u8> {
    let mut bytes = vec![0u8; RECORD];
    LittleEndian::write_u32(&mut bytes[0..4], offset);
    for (slot, &field) in LAST_OFFSET_FIELDS.iter().enumerate() {
        LittleEndian::write_u32(&mut bytes[field..field + 4], last_offsets[slot]);
    }
    LittleEndian::write_u16(&mut bytes[28..30], RECORD as u16);
    LittleEndian::write_u16(&mut bytes[30..32], previous);
    LittleEndian::write_u16(&mut bytes[32..34], raw.channel);
    LittleEndian::write_u16(&mut bytes[34..36], PACKET as u16);
    LittleEndian::write_u32(&mut bytes[36..40], raw.index);
    LittleEndian::write_f32(&mut bytes[40..44], 0.0);
    LittleEndian::write_f32(&mut bytes[44..48], 60.0);
    bytes[50] = 2;
    LittleEndian::write_i32(&mut bytes[60..64], CREATION_SECONDS);
    LittleEndian::write_f32(&mut bytes[64..68], raw.depth_feet);
    LittleEndian::write_f32(&mut bytes[68..72], 1.5);
    LittleEndian::write_f32(&mut bytes[100..104], 4.0);
    LittleEndian::write_f32(&mut bytes[104..108], 15.5);
    LittleEndian::write_i32(&mut bytes[108..112], INT_LONGITUDE);
    LittleEndian::write_i32(&mut bytes[112..116], INT_LATITUDE);
    LittleEndian::write_f32(&mut bytes[116..120], 3.0);
    LittleEndian::write_f32(&mut bytes[120..124], 0.75);
    LittleEndian::write_f32(&mut bytes[124..128], 320.0);
    LittleEndian::write_f32(&mut bytes[128..132], 1.25);
    LittleEndian::write_u16(&mut bytes[132..134], FLAGS);
    LittleEndian::write_i32(&mut bytes[140..144], raw.time_offset_ms);
    bytes[144..].fill(raw.fill);
    bytes
}

/// Route library logs through the test harness (`RUST_LOG=debug`)
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// The three fixture frames written as a clean SL2 container
pub fn sl2_fixture() -> Vec<u8> {
    sl2_fixture_with_garbage(usize::MAX, &[])
}

/// Like [`sl2_fixture`] with `garbage` inserted in front of frame
/// `before_frame`. Records keep correct self offsets.
pub fn sl2_fixture_with_garbage(before_frame: usize, garbage: &[u8]) -> Vec<u8> {
    let mut bytes = SL2_HEADER.to_vec();
    let mut last_offsets = [0u32; 6];
    let mut previous = 0u16;
    for (position, raw) in fixture_frames().iter().enumerate() {
        if position == before_frame {
            bytes.extend_from_slice(garbage);
        }
        let offset = bytes.len() as u32;
        let slot = match raw.channel {
            0 => 0,
            _ => 2,
        };
        last_offsets[slot] = offset;
        bytes.extend(record(raw, offset, previous, &last_offsets));
        previous = RECORD as u16;
    }
    bytes
}
