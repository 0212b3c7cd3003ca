mod common;

use common::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use sonar_log::lowrance::generate_channel_frames;
use sonar_log::{
    adjust_depth, ChannelType, CsvLogData, DepthPointSource, FileVersion, GenerationConfig,
    LinearDimension, LowranceLogData, ValuesOrder,
};
use std::io::Cursor;

fn fixture_log() -> LowranceLogData {
    LowranceLogData::read_from(&mut Cursor::new(sl2_fixture())).unwrap()
}

#[test]
fn test_depth_adjust_between_two_logs() {
    init_logging();
    let base = fixture_log();
    let mut adjustable = fixture_log();
    adjustable.shift_depth(LinearDimension::from_meters(-1.0));

    let adjusted = adjust_depth(&base.frames, &adjustable.frames).unwrap();
    assert!(adjusted.nearest().distance.meters() < 1e-6);
    assert!((adjusted.correction().meters() - 1.0).abs() < 1e-9);

    let frames: Vec<_> = adjusted.collect();
    assert_eq!(frames.len(), adjustable.frames.len());
    for (adjusted, original) in frames.iter().zip(&base.frames) {
        assert!((adjusted.depth().meters() - original.depth().meters()).abs() < 1e-9);
        assert_eq!(adjusted.frame_index(), original.frame_index());
    }
}

#[test]
fn test_generated_composite_survives_container_round_trip() {
    let mut log = fixture_log();
    let config = GenerationConfig::new(ChannelType::Primary, ChannelType::SidescanComposite)
        .with_synthesis(true)
        .with_seed(7);
    let generated = generate_channel_frames(&log.frames, &config, &mut config.rng()).unwrap();
    assert_eq!(generated.len(), 2);
    log.frames.extend(generated);

    let mut bytes = Vec::new();
    log.write_to(&mut bytes).unwrap();
    let back = LowranceLogData::read_from(&mut Cursor::new(bytes)).unwrap();

    let composite: Vec<_> = back
        .frames
        .iter()
        .filter(|f| f.channel() == ChannelType::SidescanComposite)
        .collect();
    assert_eq!(composite.len(), 2);
    assert!(composite.iter().all(|f| f.packet_size() == 2 * PACKET));
    assert!(composite[0].sounded_data().upper_limit().meters() < 0.0);
}

#[test]
fn test_seeded_generation_is_reproducible() {
    let log = fixture_log();
    let config = GenerationConfig::new(ChannelType::DownScan, ChannelType::SidescanRight)
        .with_synthesis(true)
        .with_seed(42);
    let first = generate_channel_frames(&log.frames, &config, &mut config.rng()).unwrap();
    let second = generate_channel_frames(&log.frames, &config, &mut StdRng::seed_from_u64(42)).unwrap();
    assert_eq!(first, second);
    assert_eq!(first[0].packet_size(), PACKET);
}

#[test]
fn test_three_d_frames_dropped_for_sl2() {
    let mut log = fixture_log().converted_to(FileVersion::Sl3).unwrap();
    let three_d = log.frames[0].to_builder().channel(ChannelType::ThreeD).build();
    log.frames.push(three_d);

    let sl2 = log.converted_to(FileVersion::Sl2).unwrap();
    assert_eq!(sl2.frames.len(), 3);
    let mut bytes = Vec::new();
    assert!(sl2.write_to(&mut bytes).is_ok());
}

#[test]
fn test_csv_export_keeps_first_point() {
    let log = fixture_log();
    let csv = CsvLogData::from_sources(&log.frames);
    assert_eq!(csv.points.len(), 1);
    assert_eq!(csv.points[0].depth, log.frames[0].depth());

    let mut text = Vec::new();
    csv.write_to(&mut text).unwrap();
    let back = CsvLogData::read_from(Cursor::new(text), &ValuesOrder::csv_default()).unwrap();
    assert_eq!(back.points.len(), 1);
    assert_eq!(back.points[0].point, log.frames[0].point());
}
