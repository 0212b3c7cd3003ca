//! Sonar Log CLI Application
//!
//! Command-line front end for the sonar-log library. It adds:
//! - Channel tables and JSON summaries of SL2/SL3 logs
//! - Research mode for undocumented frame fields
//! - Depth adjustment and depth shifting across logs
//! - Conversion to SL2, SL3 and CSV

use anyhow::{anyhow, Result};
use clap::Parser;
use sonar_log::{ChannelType, GenerationConfig};
use std::path::PathBuf;

mod config;
mod convert;
mod report;

use config::{AppConfig, OutputFormat, RunOptions};

/// Sonar Log Converter - Inspect, adjust and convert Lowrance sonar logs
#[derive(Parser, Debug)]
#[command(name = "sonar-log-cli")]
#[command(about = "Inspect, adjust and convert Lowrance sonar logs (SL2, SL3)", long_about = None)]
#[command(version)]
struct Args {
    /// SL2/SL3 log to process
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output formats, separated by ':' (sl2:sl3:csv)
    #[arg(short, long, value_enum, value_delimiter = ':')]
    output: Vec<OutputFormat>,

    /// Directory for out.sl2, out.sl3 and out.csv (default: current directory)
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Channels to keep, separated by ':' (Primary = 0, Secondary = 1,
    /// DownScan = 2, SidescanLeft = 3, SidescanRight = 4,
    /// SidescanComposite = 5, ThreeD = 9)
    #[arg(short, long, value_delimiter = ':', value_parser = parse_channel)]
    channel: Vec<ChannelType>,

    /// First frame index to keep
    #[arg(short, long, value_name = "INDEX")]
    from: Option<u32>,

    /// Last frame index to keep
    #[arg(short, long, value_name = "INDEX")]
    to: Option<u32>,

    /// Replace every position with 0,0
    #[arg(short, long)]
    anonymous: bool,

    /// Log whose depths are adjusted onto the input and appended to it
    #[arg(short, long, value_name = "FILE")]
    depth_adjust: Option<PathBuf>,

    /// Depth shift in meters, 'm' prefix subtracts and 'p' adds (m1.15, p0.5)
    #[arg(short = 's', long, value_name = "SHIFT", allow_hyphen_values = true)]
    depth_shift: Option<String>,

    /// Print the 4 bytes at this offset of every frame
    #[arg(long, value_name = "OFFSET")]
    research: Option<u64>,

    /// Generate frames of this channel
    #[arg(long, value_name = "CHANNEL", value_parser = parse_channel, requires = "generate_from")]
    generate: Option<ChannelType>,

    /// Channel the generated frames are derived from
    #[arg(long, value_name = "CHANNEL", value_parser = parse_channel, requires = "generate")]
    generate_from: Option<ChannelType>,

    /// Synthesize generated sounded data from depth
    #[arg(long)]
    synthesize: bool,

    /// Seed for reproducible synthesis
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Print the log summary as JSON
    #[arg(long)]
    json: bool,

    /// Path to configuration file (TOML)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn parse_channel(text: &str) -> std::result::Result<ChannelType, String> {
    text.trim()
        .parse::<u16>()
        .map(ChannelType::from_raw)
        .map_err(|_| format!("invalid channel number: {:?}", text))
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Sonar Log CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using sonar-log library v{}", sonar_log::VERSION);

    let file_config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    if args.input.is_none() && file_config.input.file.is_none() {
        println!("Sonar Log Converter - No input specified");
        println!("\nQuick Start:");
        println!("  sonar-log-cli -i trip.sl2");
        println!("  sonar-log-cli -i trip.sl2 -f 10 -t 509 -c 0 -a -o sl2:csv");
        println!("  sonar-log-cli -i base.sl2 -d adjust.sl2 -o csv");
        println!("  sonar-log-cli -i trip.sl3 --research 30 -t 10 -c 0:2");
        println!("\nFor repeatable runs:");
        println!("  sonar-log-cli --config run.toml");
        println!("\nUse --help for more options");
        return Ok(());
    }

    let options = resolve_options(args, file_config)?;
    convert::run(&options)
}

/// Merge command line flags over the configuration file
fn resolve_options(args: Args, file: AppConfig) -> Result<RunOptions> {
    let input = args
        .input
        .or(file.input.file)
        .ok_or_else(|| anyhow!("No input file given"))?;

    let depth_shift = args
        .depth_shift
        .or(file.transform.depth_shift)
        .map(|text| config::parse_depth_shift(&text))
        .transpose()?;

    let mut filter = file.filter;
    if !args.channel.is_empty() {
        filter = filter.with_channels(args.channel);
    }
    if let Some(from) = args.from {
        filter = filter.with_frames_from(from);
    }
    if let Some(to) = args.to {
        filter = filter.with_frames_to(to);
    }

    let generation = match (args.generate_from, args.generate) {
        (Some(source), Some(destination)) => {
            let mut generation = GenerationConfig::new(source, destination).with_synthesis(args.synthesize);
            if let Some(seed) = args.seed {
                generation = generation.with_seed(seed);
            }
            Some(generation)
        }
        _ => file.generate.map(|mut generation| {
            generation.synthesize |= args.synthesize;
            generation.seed = args.seed.or(generation.seed);
            generation
        }),
    };

    let outputs = if args.output.is_empty() {
        file.output.formats
    } else {
        args.output
    };

    Ok(RunOptions {
        input,
        depth_adjust: args.depth_adjust.or(file.input.depth_adjust),
        depth_shift,
        research_offset: args.research.or(file.transform.research_offset),
        filter,
        anonymous: args.anonymous || file.transform.anonymous,
        generation,
        outputs,
        output_dir: args
            .output_dir
            .or(file.output.output_dir)
            .unwrap_or_else(|| PathBuf::from(".")),
        json: args.json || file.output.json,
    })
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
