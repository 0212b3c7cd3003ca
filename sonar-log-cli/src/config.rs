//! Configuration loading and parsing

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use sonar_log::{FrameFilter, GenerationConfig};
use std::fs;
use std::path::{Path, PathBuf};

/// Application configuration (loaded from a TOML file). Command line flags
/// override every value given here.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub filter: FrameFilter,
    #[serde(default)]
    pub transform: TransformConfig,
    pub generate: Option<GenerationConfig>,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InputConfig {
    pub file: Option<PathBuf>,
    /// Log whose depths are adjusted onto the input
    pub depth_adjust: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TransformConfig {
    #[serde(default)]
    pub anonymous: bool,
    /// Same notation as `--depth-shift`, e.g. "m1.15"
    pub depth_shift: Option<String>,
    pub research_offset: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub formats: Vec<OutputFormat>,
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Sl2,
    Sl3,
    Csv,
}

impl OutputFormat {
    pub fn file_name(self) -> &'static str {
        match self {
            OutputFormat::Sl2 => "out.sl2",
            OutputFormat::Sl3 => "out.sl3",
            OutputFormat::Csv => "out.csv",
        }
    }
}

/// Everything one conversion run needs, after merging file and flags
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub input: PathBuf,
    pub depth_adjust: Option<PathBuf>,
    pub depth_shift: Option<f64>,
    pub research_offset: Option<u64>,
    pub filter: FrameFilter,
    pub anonymous: bool,
    pub generation: Option<GenerationConfig>,
    pub outputs: Vec<OutputFormat>,
    pub output_dir: PathBuf,
    pub json: bool,
}

/// Parse a depth shift in meters. `m` and `p` prefixes stand for minus and
/// plus, a bare number is taken as is.
pub fn parse_depth_shift(text: &str) -> Result<f64> {
    let text = text.trim();
    let (sign, number) = match text.chars().next() {
        Some('m') | Some('M') => (-1.0, &text[1..]),
        Some('p') | Some('P') => (1.0, &text[1..]),
        _ => (1.0, text),
    };
    let value: f64 = number
        .parse()
        .map_err(|_| anyhow!("Invalid depth shift {:?}, expected e.g. m1.15 or p0.5", text))?;
    if !value.is_finite() {
        return Err(anyhow!("Depth shift {:?} is not a finite number", text));
    }
    Ok(sign * value)
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    if let Some(shift) = &config.transform.depth_shift {
        parse_depth_shift(shift).with_context(|| format!("In config file: {:?}", path))?;
    }

    Ok(config)
}
