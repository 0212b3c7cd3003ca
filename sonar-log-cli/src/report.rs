//! Console reports
//!
//! Channel tables, research tables and the `--json` summary.

use serde::Serialize;
use sonar_log::lowrance::ResearchValue;
use sonar_log::{FrameFilter, LowranceLogData, NearestPoints};
use sonar_log::{DepthPointSource, Frame};

const RULE: &str = "───────────────────────────────────────────────────────────────────────────────────────";

#[derive(Debug, Serialize)]
pub struct ChannelRow {
    pub channel: String,
    pub raw: u16,
    pub frequency: String,
    pub first_frame: u32,
    pub last_frame: u32,
    pub frames: usize,
}

/// Machine-readable description of a log
#[derive(Debug, Serialize)]
pub struct LogSummary {
    pub name: String,
    pub file_version: String,
    pub hardware_version: i16,
    pub block_size: i16,
    pub creation_time: String,
    pub frames: usize,
    pub channels: Vec<ChannelRow>,
}

impl LogSummary {
    pub fn from_log(log: &LowranceLogData) -> Self {
        Self {
            name: log.name.clone(),
            file_version: log.version().to_string(),
            hardware_version: log.header.hardware_version,
            block_size: log.header.block_size,
            creation_time: log.creation_time.to_rfc3339(),
            frames: log.frames.len(),
            channels: log
                .channels()
                .into_iter()
                .map(|summary| ChannelRow {
                    channel: summary.channel.to_string(),
                    raw: summary.channel.raw(),
                    frequency: summary.frequency.to_string(),
                    first_frame: summary.first_frame_index,
                    last_frame: summary.last_frame_index,
                    frames: summary.frame_count,
                })
                .collect(),
        }
    }
}

pub fn print_log_info(log: &LowranceLogData) {
    let summary = LogSummary::from_log(log);

    println!("═══════════════════════════════════════════════");
    println!("  {} ({})", summary.name, summary.file_version);
    println!("═══════════════════════════════════════════════\n");
    println!(
        "File Version = {}, Hardware Version = {}, Block Size = {}",
        summary.file_version, summary.hardware_version, summary.block_size
    );
    println!("Created: {}\n", summary.creation_time);

    println!(
        "|{:>22}|{:>22}|{:>13}|{:>12}|{:>12}|",
        "Channel Type", "Frequency", "First Frame", "Last Frame", "Frames Total"
    );
    println!("{}", RULE);
    for row in &summary.channels {
        println!(
            "|{:>22}|{:>22}|{:>13}|{:>12}|{:>12}|",
            format!("{}({})", row.channel, row.raw),
            row.frequency,
            row.first_frame,
            row.last_frame,
            row.frames
        );
    }
    println!("{}", RULE);
    println!("|{:>22}|{:>22}|{:>13}|{:>12}|{:>12}|\n", "", "", "", "", summary.frames);
}

pub fn print_json(log: &LowranceLogData) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&LogSummary::from_log(log))?);
    Ok(())
}

/// Research rows passing the channel and index filters
pub fn print_research(values: &[ResearchValue], filter: &FrameFilter) {
    println!(
        "|{:>12}|{:>16}|{:>8}|{:>8}|{:>12}|{:>15}|{:>11}|{:>17}|",
        "Hex", "Bytes", "Short #1", "Short #2", "Integer", "Float", "Frame Index", "Channel"
    );
    println!("{}", RULE);

    let shown = values
        .iter()
        .filter(|value| filter.should_process_channel(value.channel))
        .filter(|value| filter.should_process_index(value.frame_index));
    for value in shown {
        let hex: Vec<String> = value.bytes.iter().map(|b| format!("{:02X}", b)).collect();
        let bytes: Vec<String> = value.bytes.iter().map(u8::to_string).collect();
        println!(
            "|{:>12}|{:>16}|{:>8}|{:>8}|{:>12}|{:>15}|{:>11}|{:>17}|",
            hex.join("-"),
            bytes.join(","),
            value.first_i16,
            value.second_i16,
            value.as_i32,
            value.as_f32,
            value.frame_index,
            value.channel.to_string()
        );
    }
}

pub fn print_nearest(nearest: &NearestPoints<Frame, Frame>) {
    println!("Nearest points:");
    println!("  Base   {} at depth {}", nearest.base.point(), nearest.base.depth());
    println!("  Adjust {} at depth {}", nearest.adjustable.point(), nearest.adjustable.depth());
    println!("  Distance {}, correction {}\n", nearest.distance, nearest.correction());
}
