//! Conversion pipeline
//!
//! Read, adjust, generate, filter, write. Each output is written to a
//! temporary file next to its destination and renamed when complete.

use crate::config::{OutputFormat, RunOptions};
use crate::report;
use anyhow::{Context, Result};
use sonar_log::lowrance::{generate_channel_frames, research_values};
use sonar_log::{adjust_depth, CsvLogData, FileVersion, Header, LinearDimension, LowranceLogData};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::NamedTempFile;

pub fn run(options: &RunOptions) -> Result<()> {
    let mut data = read_log(&options.input)?;
    if options.json {
        report::print_json(&data)?;
    } else {
        report::print_log_info(&data);
    }

    if let Some(path) = &options.depth_adjust {
        let adjust = read_log(path)?;
        let started = Instant::now();
        let adjusted = adjust_depth(&data.frames, &adjust.frames)
            .with_context(|| format!("Failed to adjust depths of {:?}", path))?;
        if !options.json {
            report::print_nearest(adjusted.nearest());
        }
        let frames: Vec<_> = adjusted.collect();
        log::info!("Adjusted {} frames in {:?}", frames.len(), started.elapsed());
        data.frames.extend(frames);
    }

    if let Some(shift) = options.depth_shift {
        log::info!("Shifting depths by {} m", shift);
        data.shift_depth(LinearDimension::from_meters(shift));
    }

    if let Some(generation) = &options.generation {
        let mut rng = generation.rng();
        let generated = generate_channel_frames(&data.frames, generation, &mut rng)
            .context("Failed to generate channel frames")?;
        data.frames.extend(generated);
    }

    if let Some(offset) = options.research_offset {
        research(&options.input, offset, data.version(), options)?;
    }

    if options.outputs.is_empty() {
        log::debug!("No output formats requested");
        return Ok(());
    }

    let mut selected = data.filtered(&options.filter);
    log::info!("{} of {} frames selected for output", selected.frames.len(), data.frames.len());
    if options.anonymous {
        selected.anonymize();
    }

    for &format in &options.outputs {
        let path = options.output_dir.join(format.file_name());
        let started = Instant::now();
        let written = write_output(&selected, format, &path)?;
        println!("✓ Wrote {:?} ({} bytes) in {:?}", path, written, started.elapsed());
    }

    Ok(())
}

fn read_log(path: &Path) -> Result<LowranceLogData> {
    let started = Instant::now();
    let data = LowranceLogData::read_from_path(path)
        .with_context(|| format!("Failed to read sonar log: {:?}", path))?;
    log::info!("Read {:?} ({}) in {:?}", path, data, started.elapsed());
    Ok(data)
}

fn research(input: &Path, offset: u64, version: FileVersion, options: &RunOptions) -> Result<()> {
    println!("Research values at byte offset {}\n", offset);
    let mut reader = BufReader::new(
        File::open(input).with_context(|| format!("Failed to open {:?}", input))?,
    );
    let values = research_values(&mut reader, Header::LEN as u64, offset, version)?;
    report::print_research(&values, &options.filter);
    Ok(())
}

/// Write one output format, returns the bytes written
fn write_output(data: &LowranceLogData, format: OutputFormat, path: &Path) -> Result<u64> {
    let target = match format {
        OutputFormat::Sl2 => Some(FileVersion::Sl2),
        OutputFormat::Sl3 => Some(FileVersion::Sl3),
        OutputFormat::Csv => None,
    };

    write_atomically(path, |writer| {
        match target {
            Some(version) => {
                data.converted_to(version)?.write_to(writer)?;
            }
            None => CsvLogData::from_sources(&data.frames).write_to(writer)?,
        }
        Ok(())
    })
    .with_context(|| format!("Failed to write {:?}", path))
}

/// Run `write` against a temporary file in the destination directory, then
/// move it over `path`
fn write_atomically<F>(path: &Path, write: F) -> Result<u64>
where
    F: FnOnce(&mut BufWriter<&mut File>) -> Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut temp = NamedTempFile::new_in(&dir)?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        write(&mut writer)?;
        writer.flush()?;
    }
    let file = temp.persist(path)?;
    Ok(file.metadata()?.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use sonar_log::{ChannelType, CoordinatePoint, Frame, FrameFilter, SoundedData};

    fn sample_log() -> LowranceLogData {
        let frames = (0..4)
            .map(|index| {
                let channel = if index % 2 == 0 { ChannelType::Primary } else { ChannelType::ThreeD };
                Frame::builder(channel)
                    .frame_index(index / 2)
                    .depth(LinearDimension::from_meters(2.0 + f64::from(index)))
                    .point(CoordinatePoint::new(60.0 + f64::from(index) * 0.001, 32.0))
                    .sounded_data(SoundedData::new(
                        vec![9; 32],
                        channel,
                        LinearDimension::ZERO,
                        LinearDimension::from_meters(10.0),
                    ))
                    .build()
            })
            .collect();
        LowranceLogData::new(Header::SL3, DateTime::from_timestamp(1_600_000_000, 0).unwrap(), frames)
    }

    fn options(input: PathBuf, output_dir: PathBuf, outputs: Vec<OutputFormat>) -> RunOptions {
        RunOptions {
            input,
            depth_adjust: None,
            depth_shift: None,
            research_offset: None,
            filter: FrameFilter::default(),
            anonymous: false,
            generation: None,
            outputs,
            output_dir,
            json: true,
        }
    }

    #[test]
    fn test_write_atomically_replaces_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "old").unwrap();

        let written = write_atomically(&path, |writer| {
            writer.write_all(b"60,32,1\n")?;
            Ok(())
        })
        .unwrap();
        assert_eq!(written, 8);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "60,32,1\n");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_failed_write_keeps_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.sl2");
        std::fs::write(&path, "old").unwrap();

        let result = write_atomically(&path, |_| Err(anyhow::anyhow!("encoder failed")));
        assert!(result.is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "old");
    }

    #[test]
    fn test_run_writes_every_format() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("trip.sl3");
        sample_log().write_to_path(&input).unwrap();

        let mut run_options = options(
            input,
            dir.path().to_path_buf(),
            vec![OutputFormat::Sl2, OutputFormat::Sl3, OutputFormat::Csv],
        );
        run_options.depth_shift = Some(-1.0);
        run(&run_options).unwrap();

        let sl2 = LowranceLogData::read_from_path(&dir.path().join("out.sl2")).unwrap();
        assert_eq!(sl2.header, Header::SL2);
        assert_eq!(sl2.frames.len(), 2);
        assert!((sl2.frames[0].depth().meters() - 1.0).abs() < 1e-6);

        let sl3 = LowranceLogData::read_from_path(&dir.path().join("out.sl3")).unwrap();
        assert_eq!(sl3.frames.len(), 4);

        let csv = std::fs::read_to_string(dir.path().join("out.csv")).unwrap();
        assert_eq!(csv.lines().count(), 4);
    }

    #[test]
    fn test_run_filters_and_anonymizes() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("trip.sl3");
        sample_log().write_to_path(&input).unwrap();

        let mut run_options = options(input, dir.path().to_path_buf(), vec![OutputFormat::Sl3]);
        run_options.filter = FrameFilter::new().with_channels(vec![ChannelType::ThreeD]);
        run_options.anonymous = true;
        run(&run_options).unwrap();

        let out = LowranceLogData::read_from_path(&dir.path().join("out.sl3")).unwrap();
        assert_eq!(out.frames.len(), 2);
        assert!(out.frames.iter().all(|f| f.channel() == ChannelType::ThreeD));
        assert!(out
            .frames
            .iter()
            .all(|f| f.point().latitude().abs() < 1e-9 && f.point().longitude().abs() < 1e-9));
    }
}
