//! Sounded data: one ping's intensity samples and the water column they cover
//!
//! Limits use a signed convention. Single-sided channels sample from the
//! transducer downward or to the right (both limits non-negative), the left
//! side scan samples to the left (both limits non-positive) and the composite
//! side scan spans both sides (`upper <= 0 <= lower`).

use crate::primitives::LinearDimension;
use crate::types::{ChannelType, Result, SonarLogError};
use rand::Rng;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct SoundedData {
    data: Vec<u8>,
    channel: ChannelType,
    upper_limit: LinearDimension,
    lower_limit: LinearDimension,
}

impl SoundedData {
    pub fn new(
        data: Vec<u8>,
        channel: ChannelType,
        upper_limit: LinearDimension,
        lower_limit: LinearDimension,
    ) -> Self {
        Self {
            data,
            channel,
            upper_limit,
            lower_limit,
        }
    }

    /// No samples, both limits zero
    pub fn empty(channel: ChannelType) -> Self {
        Self::new(Vec::new(), channel, LinearDimension::ZERO, LinearDimension::ZERO)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn channel(&self) -> ChannelType {
        self.channel
    }

    pub fn upper_limit(&self) -> LinearDimension {
        self.upper_limit
    }

    pub fn lower_limit(&self) -> LinearDimension {
        self.lower_limit
    }

    /// Mirror a composite side scan left-to-right. Other channels are returned
    /// unchanged.
    pub fn flip(&self) -> Result<SoundedData> {
        match self.channel {
            ChannelType::SidescanComposite => {
                let mut data = self.data.clone();
                data.reverse();
                Ok(SoundedData::new(
                    data,
                    self.channel,
                    -self.lower_limit,
                    -self.upper_limit,
                ))
            }
            ChannelType::ThreeD => Err(SonarLogError::Unsupported(
                "flipping ThreeD sounded data".to_string(),
            )),
            _ => Ok(self.clone()),
        }
    }

    /// Synthesize a plausible echo profile from depth alone.
    ///
    /// The column from the surface down to `lower_limit` gets a one meter band
    /// of surface noise and, when the bottom lies above `lower_limit`, a bottom
    /// return band from `depth` down. Both bands are random decreasing ramps.
    /// The returned window is the `packet_size` samples between the limits.
    /// This is a visual stand-in for display software, not an acoustic model.
    pub fn generate<R: Rng + ?Sized>(
        packet_size: usize,
        channel: ChannelType,
        depth: LinearDimension,
        upper_limit: LinearDimension,
        lower_limit: LinearDimension,
        rng: &mut R,
    ) -> Result<SoundedData> {
        if depth.meters() < 0.0 {
            return Err(SonarLogError::out_of_range(
                "depth",
                format!("{} is negative for {}", depth, channel),
            ));
        }
        if upper_limit > lower_limit {
            return Err(SonarLogError::out_of_range(
                "upper_limit",
                format!(
                    "{} is below lower limit {} for {}",
                    upper_limit, lower_limit, channel
                ),
            ));
        }

        match channel {
            ChannelType::Primary
            | ChannelType::Secondary
            | ChannelType::DownScan
            | ChannelType::SidescanRight => {
                require_sign(channel, upper_limit, lower_limit, Sign::NonNegative, Sign::NonNegative)?;
                let data = water_column(packet_size, depth, upper_limit, lower_limit, rng)?;
                Ok(SoundedData::new(data, channel, upper_limit, lower_limit))
            }
            ChannelType::SidescanLeft => {
                require_sign(channel, upper_limit, lower_limit, Sign::NonPositive, Sign::NonPositive)?;
                let mut data = water_column(packet_size, depth, -lower_limit, -upper_limit, rng)?;
                data.reverse();
                Ok(SoundedData::new(data, channel, upper_limit, lower_limit))
            }
            ChannelType::SidescanComposite => {
                require_sign(channel, upper_limit, lower_limit, Sign::NonPositive, Sign::NonNegative)?;
                let half = packet_size / 2;
                let right = water_column(half, depth, LinearDimension::ZERO, lower_limit, rng)?;
                let mut data = vec![0u8; packet_size];
                for (slot, value) in data[..half].iter_mut().zip(right.iter().rev()) {
                    *slot = *value;
                }
                data[half..half * 2].copy_from_slice(&right);
                Ok(SoundedData::new(data, channel, upper_limit, lower_limit))
            }
            ChannelType::ThreeD => Err(SonarLogError::Unsupported(
                "generating ThreeD sounded data".to_string(),
            )),
            ChannelType::Reserved(value) => Err(SonarLogError::out_of_range(
                "channel",
                format!("reserved channel {} has no sounded data geometry", value),
            )),
        }
    }
}

impl fmt::Display for SoundedData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} from {} to {}, {} samples",
            self.channel,
            self.upper_limit,
            self.lower_limit,
            self.data.len()
        )
    }
}

#[derive(Clone, Copy)]
enum Sign {
    NonNegative,
    NonPositive,
}

impl Sign {
    fn check(self, value: LinearDimension) -> bool {
        match self {
            Sign::NonNegative => value.meters() >= 0.0,
            Sign::NonPositive => value.meters() <= 0.0,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Sign::NonNegative => "must not be negative",
            Sign::NonPositive => "must not be positive",
        }
    }
}

fn require_sign(
    channel: ChannelType,
    upper_limit: LinearDimension,
    lower_limit: LinearDimension,
    upper: Sign,
    lower: Sign,
) -> Result<()> {
    if !upper.check(upper_limit) {
        return Err(SonarLogError::out_of_range(
            "upper_limit",
            format!("{} {} for {}", upper_limit, upper.describe(), channel),
        ));
    }
    if !lower.check(lower_limit) {
        return Err(SonarLogError::out_of_range(
            "lower_limit",
            format!("{} {} for {}", lower_limit, lower.describe(), channel),
        ));
    }
    Ok(())
}

/// Random ramp from near full intensity down to zero
fn decreasing_surface<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Vec<u8> {
    let step = f64::from(u8::MAX) / len as f64;
    (0..len)
        .map(|i| {
            let level = f64::from(u8::MAX) - i as f64 * step;
            (level * f64::from(rng.gen_range(0..100u8)) / 200.0) as u8
        })
        .collect()
}

/// Largest column height, as a multiple of the sampled window
const MAX_COLUMN_RATIO: f64 = 1024.0;

/// Single-sided profile for non-negative limits
fn water_column<R: Rng + ?Sized>(
    packet_size: usize,
    depth: LinearDimension,
    upper_limit: LinearDimension,
    lower_limit: LinearDimension,
    rng: &mut R,
) -> Result<Vec<u8>> {
    if packet_size == 0 {
        return Ok(Vec::new());
    }
    if lower_limit <= upper_limit {
        return Err(SonarLogError::out_of_range(
            "lower_limit",
            format!("column from {} to {} has no height", upper_limit, lower_limit),
        ));
    }

    let ratio = lower_limit / (lower_limit - upper_limit);
    if !ratio.is_finite() || ratio > MAX_COLUMN_RATIO {
        return Err(SonarLogError::out_of_range(
            "upper_limit",
            format!("window from {} to {} is too narrow to synthesize", upper_limit, lower_limit),
        ));
    }
    let column_len = (ratio * packet_size as f64).ceil() as usize;
    let column_len = column_len.max(packet_size);
    let mut column = vec![0u8; column_len];

    let one_meter = ((column_len as f64 / lower_limit.meters()) as usize).min(column_len);
    let noise = decreasing_surface(one_meter, rng);
    column[..one_meter].copy_from_slice(&noise);

    if depth < lower_limit {
        let bottom_len = (((lower_limit - depth) / lower_limit) * column_len as f64) as usize;
        let bottom_len = bottom_len.min(column_len);
        let bottom = decreasing_surface(bottom_len, rng);
        column[column_len - bottom_len..].copy_from_slice(&bottom);
    }

    Ok(column.split_off(column_len - packet_size))
}
