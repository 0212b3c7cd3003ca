//! Derive frames of one channel from frames of another
//!
//! Telemetry is copied unchanged. Sounded data is either remapped from the
//! source geometry or synthesized from depth for the destination geometry.

use super::frame::Frame;
use super::sounded::SoundedData;
use crate::config::GenerationConfig;
use crate::primitives::LinearDimension;
use crate::types::{ChannelType, Result, SonarLogError};
use rand::Rng;

/// Build a `destination` channel frame from `source`.
pub fn generate<R: Rng + ?Sized>(
    destination: ChannelType,
    source: &Frame,
    synthesize: bool,
    rng: &mut R,
) -> Result<Frame> {
    let source_channel = source.channel();
    if destination == source_channel {
        return Err(SonarLogError::out_of_range(
            "destination",
            format!("{} frames cannot be generated from themselves", destination),
        ));
    }
    if destination == ChannelType::ThreeD {
        return Err(SonarLogError::Unsupported(
            "ThreeD geometry cannot be derived from other channels".to_string(),
        ));
    }
    for channel in [destination, source_channel] {
        if let ChannelType::Reserved(value) = channel {
            return Err(SonarLogError::Unsupported(format!(
                "reserved channel {} has no known geometry",
                value
            )));
        }
    }

    let sounded = source.sounded_data();
    let sounded_data = if synthesize {
        let (packet_size, upper, lower) = if source_channel == ChannelType::ThreeD {
            three_d_geometry(sounded, destination)
        } else {
            let geometry = remap(sounded, destination)?;
            (geometry.len(), geometry.upper_limit(), geometry.lower_limit())
        };
        SoundedData::generate(packet_size, destination, source.depth(), upper, lower, rng)?
    } else {
        if source_channel == ChannelType::ThreeD {
            return Err(SonarLogError::Unsupported(
                "ThreeD sounded data cannot be remapped, enable synthesis".to_string(),
            ));
        }
        remap(sounded, destination)?
    };

    Ok(source
        .to_builder()
        .channel(destination)
        .sounded_data(sounded_data)
        .build())
}

/// Generate one `config.destination` frame per `config.source` frame
pub fn generate_channel_frames<R: Rng + ?Sized>(
    frames: &[Frame],
    config: &GenerationConfig,
    rng: &mut R,
) -> Result<Vec<Frame>> {
    let generated = frames
        .iter()
        .filter(|frame| frame.channel() == config.source)
        .map(|frame| generate(config.destination, frame, config.synthesize, &mut *rng))
        .collect::<Result<Vec<_>>>()?;

    if generated.is_empty() {
        log::warn!("No {} frames to generate {} from", config.source, config.destination);
    } else {
        log::info!(
            "Generated {} {} frames from {}",
            generated.len(),
            config.destination,
            config.source
        );
    }
    Ok(generated)
}

fn reversed(data: &[u8]) -> Vec<u8> {
    data.iter().rev().copied().collect()
}

/// Geometric remapping of existing samples
fn remap(sounded: &SoundedData, destination: ChannelType) -> Result<SoundedData> {
    let source = sounded.channel();
    let data = sounded.data();
    let upper = sounded.upper_limit();
    let lower = sounded.lower_limit();

    let remapped = match (source, destination) {
        (s, d) if s.is_single_sided() && d.is_single_sided() => {
            SoundedData::new(data.to_vec(), d, upper, lower)
        }
        (s, ChannelType::SidescanLeft) if s.is_single_sided() => {
            SoundedData::new(reversed(data), destination, -lower, -upper)
        }
        (ChannelType::SidescanLeft, d) if d.is_single_sided() => {
            SoundedData::new(reversed(data), d, -lower, -upper)
        }
        (s, ChannelType::SidescanComposite) if s.is_single_sided() => {
            let mut composite = reversed(data);
            composite.extend_from_slice(data);
            SoundedData::new(composite, destination, -lower, lower)
        }
        (ChannelType::SidescanLeft, ChannelType::SidescanComposite) => {
            let right = remap(sounded, ChannelType::SidescanRight)?;
            return remap(&right, destination);
        }
        (ChannelType::SidescanComposite, d) if d.is_single_sided() => {
            let half = data.len() / 2;
            SoundedData::new(data[half..].to_vec(), d, LinearDimension::ZERO, lower)
        }
        (ChannelType::SidescanComposite, ChannelType::SidescanLeft) => {
            let half = data.len() / 2;
            SoundedData::new(data[..half].to_vec(), destination, upper, LinearDimension::ZERO)
        }
        (s, d) => {
            return Err(SonarLogError::Unsupported(format!(
                "no remapping from {} to {}",
                s, d
            )))
        }
    };
    Ok(remapped)
}

/// Destination geometry synthesized from the extent of a 3D ping
fn three_d_geometry(
    sounded: &SoundedData,
    destination: ChannelType,
) -> (usize, LinearDimension, LinearDimension) {
    let (upper, lower) = (sounded.upper_limit().abs(), sounded.lower_limit().abs());
    let extent = if upper > lower { upper } else { lower };
    let (upper, lower) = match destination {
        ChannelType::SidescanLeft => (-extent, LinearDimension::ZERO),
        ChannelType::SidescanComposite => (-extent, extent),
        _ => (LinearDimension::ZERO, extent),
    };
    (sounded.len(), upper, lower)
}
