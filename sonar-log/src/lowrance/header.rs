use crate::types::{FileVersion, Result, SonarLogError};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::io::{Read, Seek, SeekFrom, Write};

/// Fixed 8-byte record at the start of every container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub file_version: FileVersion,
    pub hardware_version: i16,
    /// Device-specific sonar type tag
    pub block_size: i16,
}

impl Header {
    pub const LEN: usize = 8;

    pub const SL2: Header = Header {
        file_version: FileVersion::Sl2,
        hardware_version: 1,
        block_size: 1970,
    };

    pub const SL3: Header = Header {
        file_version: FileVersion::Sl3,
        hardware_version: 1,
        block_size: 3200,
    };

    /// Standard header for fresh output of a version
    pub fn standard(version: FileVersion) -> Result<Header> {
        match version {
            FileVersion::Sl2 => Ok(Header::SL2),
            FileVersion::Sl3 => Ok(Header::SL3),
            FileVersion::Slg => Err(SonarLogError::Unsupported(
                "writing SLG containers".to_string(),
            )),
        }
    }

    pub fn read<R: Read + Seek>(reader: &mut R, offset: u64) -> Result<Header> {
        reader.seek(SeekFrom::Start(offset))?;
        let mut buf = [0u8; Self::LEN];
        reader.read_exact(&mut buf).map_err(|e| {
            SonarLogError::Format(format!("stream too short for header: {}", e))
        })?;

        let mut cursor = &buf[..];
        let raw_version = cursor.read_i16::<LittleEndian>()?;
        let hardware_version = cursor.read_i16::<LittleEndian>()?;
        let block_size = cursor.read_i16::<LittleEndian>()?;

        let file_version = FileVersion::from_raw(raw_version).ok_or_else(|| {
            SonarLogError::Format(format!("unrecognized file version {}", raw_version))
        })?;

        Ok(Header {
            file_version,
            hardware_version,
            block_size,
        })
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_i16::<LittleEndian>(self.file_version.raw())?;
        writer.write_i16::<LittleEndian>(self.hardware_version)?;
        writer.write_i16::<LittleEndian>(self.block_size)?;
        writer.write_all(&[0, 0])?;
        Ok(())
    }
}
