//! The LAS/LAZ file header: the 227/235/375-byte fixed prefix carrying
//! version, point format, record counts, scale/offset and the bounding box.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

use crate::{LasZipError, Result};

const FILE_SIGNATURE: [u8; 4] = *b"LASF";

/// LAS version, major.minor. This crate reads/writes 1.0 through 1.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

impl Version {
    pub fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    /// Size in bytes of the fixed header prefix for this version.
    pub fn header_size(&self) -> u16 {
        if *self <= Version::new(1, 2) {
            227
        } else if *self == Version::new(1, 3) {
            235
        } else {
            375
        }
    }

    pub fn has_waveform_offset(&self) -> bool {
        *self >= Version::new(1, 3)
    }

    pub fn has_evlrs(&self) -> bool {
        *self >= Version::new(1, 4)
    }

    pub fn has_extended_point_counts(&self) -> bool {
        *self >= Version::new(1, 4)
    }
}

impl Default for Version {
    fn default() -> Self {
        Version::new(1, 2)
    }
}

/// The point data format: which semantic items (Core10/Core14, GpsTime11,
/// Rgb12, Nir, WavePacket13) make up one point record, and how many trailing
/// extra bytes follow them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointFormat {
    pub id: u8,
    pub extra_bytes: u16,
}

impl PointFormat {
    pub fn new(id: u8, extra_bytes: u16) -> Result<Self> {
        if id > 10 {
            return Err(LasZipError::UnsupportedPointFormat(id));
        }
        Ok(Self { id, extra_bytes })
    }

    /// True for the "extended" formats (6..10) that use the 30-byte Core14
    /// record instead of Core10 + GpsTime11.
    pub fn is_extended(&self) -> bool {
        self.id >= 6
    }

    pub fn has_gps_time(&self) -> bool {
        matches!(self.id, 1 | 3 | 4 | 5) || self.is_extended()
    }

    pub fn has_rgb(&self) -> bool {
        matches!(self.id, 2 | 3 | 5 | 7 | 8 | 10)
    }

    pub fn has_nir(&self) -> bool {
        matches!(self.id, 8 | 10)
    }

    pub fn has_wave_packet(&self) -> bool {
        matches!(self.id, 4 | 5 | 9 | 10)
    }

    /// Size in bytes of this point format's base fields, excluding extra bytes.
    pub fn base_len(&self) -> u16 {
        let core = if self.is_extended() { 30 } else { 20 };
        let gps_time = if self.has_gps_time() && !self.is_extended() {
            8
        } else {
            0
        };
        let rgb = if self.has_rgb() { 6 } else { 0 };
        let nir = if self.has_nir() { 2 } else { 0 };
        let wave_packet = if self.has_wave_packet() { 29 } else { 0 };
        core + gps_time + rgb + nir + wave_packet
    }

    /// Total record length, extra bytes included.
    pub fn len(&self) -> u16 {
        self.base_len() + self.extra_bytes
    }
}

/// `las 1.4`: counters that only exist from 1.4 onward, wide enough to hold
/// files with more than 2^32 points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtendedCounts {
    pub number_of_point_records: u64,
    pub number_of_points_by_return: [u64; 15],
}

/// `las 1.4`: pointer to the first EVLR, if any are present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvlrPointer {
    pub start_of_first_evlr: u64,
    pub number_of_evlrs: u32,
}

impl EvlrPointer {
    fn into_option(self) -> Option<Self> {
        if self.start_of_first_evlr > 0 && self.number_of_evlrs > 0 {
            Some(self)
        } else {
            None
        }
    }
}

/// The LAS/LAZ fixed header.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub file_source_id: u16,
    pub global_encoding: u16,
    pub guid: [u8; 16],
    pub version: Version,
    pub system_identifier: [u8; 32],
    pub generating_software: [u8; 32],
    pub file_creation_day_of_year: u16,
    pub file_creation_year: u16,
    pub header_size: u16,
    pub offset_to_point_data: u32,
    pub number_of_variable_length_records: u32,
    pub point_format: PointFormat,
    pub number_of_point_records: u32,
    pub number_of_points_by_return: [u32; 5],
    pub x_scale_factor: f64,
    pub y_scale_factor: f64,
    pub z_scale_factor: f64,
    pub x_offset: f64,
    pub y_offset: f64,
    pub z_offset: f64,
    pub max_x: f64,
    pub min_x: f64,
    pub max_y: f64,
    pub min_y: f64,
    pub max_z: f64,
    pub min_z: f64,
    pub start_of_waveform_data_packet_record: Option<u64>,
    pub evlr: Option<EvlrPointer>,
    pub extended_counts: Option<ExtendedCounts>,
    /// Bytes between the fixed header prefix and `header_size`, should a
    /// writer have extended the public header block. Preserved verbatim.
    pub padding: Vec<u8>,
}

impl Header {
    /// Returns the currently-effective point count, applying the invariant
    /// that the extended (1.4) count takes precedence over the legacy one
    /// whenever it is non-zero.
    pub fn effective_point_count(&self) -> u64 {
        match self.extended_counts {
            Some(counts) if counts.number_of_point_records != 0 => {
                if self.number_of_point_records != 0
                    && u64::from(self.number_of_point_records) != counts.number_of_point_records
                {
                    log::warn!(
                        "legacy point count ({}) disagrees with extended point count ({}), preferring extended",
                        self.number_of_point_records,
                        counts.number_of_point_records
                    );
                }
                counts.number_of_point_records
            }
            _ => u64::from(self.number_of_point_records),
        }
    }

    pub fn read_from<R: Read>(mut src: R) -> Result<Self> {
        let mut file_signature = [0u8; 4];
        src.read_exact(&mut file_signature)?;
        if file_signature != FILE_SIGNATURE {
            return Err(LasZipError::BadMagic);
        }

        let file_source_id = src.read_u16::<LittleEndian>()?;
        let global_encoding = src.read_u16::<LittleEndian>()?;
        let mut guid = [0u8; 16];
        src.read_exact(&mut guid)?;
        let version = Version::new(src.read_u8()?, src.read_u8()?);
        if version.major != 1 || version.minor > 4 {
            return Err(LasZipError::UnsupportedVersion(version.major, version.minor));
        }
        let mut system_identifier = [0u8; 32];
        src.read_exact(&mut system_identifier)?;
        let mut generating_software = [0u8; 32];
        src.read_exact(&mut generating_software)?;
        let file_creation_day_of_year = src.read_u16::<LittleEndian>()?;
        let file_creation_year = src.read_u16::<LittleEndian>()?;
        let header_size = src.read_u16::<LittleEndian>()?;
        if header_size < version.header_size() {
            return Err(LasZipError::InvalidHeader(
                "header_size too small for its version",
            ));
        }
        let offset_to_point_data = src.read_u32::<LittleEndian>()?;
        let number_of_variable_length_records = src.read_u32::<LittleEndian>()?;
        let point_format_id = src.read_u8()?;
        let point_data_record_length = src.read_u16::<LittleEndian>()?;
        let point_format = PointFormat::new(point_format_id & 0x7f, 0)?;
        if point_data_record_length < point_format.base_len() {
            return Err(LasZipError::InvalidHeader(
                "point_data_record_length smaller than the point format's base size",
            ));
        }
        let point_format = PointFormat::new(
            point_format_id & 0x7f,
            point_data_record_length - point_format.base_len(),
        )?;
        let number_of_point_records = src.read_u32::<LittleEndian>()?;
        let mut number_of_points_by_return = [0u32; 5];
        for n in &mut number_of_points_by_return {
            *n = src.read_u32::<LittleEndian>()?;
        }
        let x_scale_factor = src.read_f64::<LittleEndian>()?;
        let y_scale_factor = src.read_f64::<LittleEndian>()?;
        let z_scale_factor = src.read_f64::<LittleEndian>()?;
        let x_offset = src.read_f64::<LittleEndian>()?;
        let y_offset = src.read_f64::<LittleEndian>()?;
        let z_offset = src.read_f64::<LittleEndian>()?;
        let max_x = src.read_f64::<LittleEndian>()?;
        let min_x = src.read_f64::<LittleEndian>()?;
        let max_y = src.read_f64::<LittleEndian>()?;
        let min_y = src.read_f64::<LittleEndian>()?;
        let max_z = src.read_f64::<LittleEndian>()?;
        let min_z = src.read_f64::<LittleEndian>()?;

        if min_x > max_x || min_y > max_y || min_z > max_z {
            log::warn!(
                "implausible bounding box: min ({}, {}, {}) exceeds max ({}, {}, {})",
                min_x,
                min_y,
                min_z,
                max_x,
                max_y,
                max_z
            );
        }
        if x_scale_factor == 0.0 || y_scale_factor == 0.0 || z_scale_factor == 0.0 {
            log::warn!("zero scale factor in header, quantized coordinates will be unusable");
        }

        let start_of_waveform_data_packet_record = if version.has_waveform_offset() {
            match src.read_u64::<LittleEndian>()? {
                0 => None,
                n => Some(n),
            }
        } else {
            None
        };

        let evlr = if version.has_evlrs() {
            EvlrPointer {
                start_of_first_evlr: src.read_u64::<LittleEndian>()?,
                number_of_evlrs: src.read_u32::<LittleEndian>()?,
            }
            .into_option()
        } else {
            None
        };

        let extended_counts = if version.has_extended_point_counts() {
            let number_of_point_records = src.read_u64::<LittleEndian>()?;
            let mut number_of_points_by_return = [0u64; 15];
            for n in &mut number_of_points_by_return {
                *n = src.read_u64::<LittleEndian>()?;
            }
            Some(ExtendedCounts {
                number_of_point_records,
                number_of_points_by_return,
            })
        } else {
            None
        };

        let padding = if header_size > version.header_size() {
            let mut bytes = vec![0u8; (header_size - version.header_size()) as usize];
            src.read_exact(&mut bytes)?;
            bytes
        } else {
            Vec::new()
        };

        Ok(Self {
            file_source_id,
            global_encoding,
            guid,
            version,
            system_identifier,
            generating_software,
            file_creation_day_of_year,
            file_creation_year,
            header_size,
            offset_to_point_data,
            number_of_variable_length_records,
            point_format,
            number_of_point_records,
            number_of_points_by_return,
            x_scale_factor,
            y_scale_factor,
            z_scale_factor,
            x_offset,
            y_offset,
            z_offset,
            max_x,
            min_x,
            max_y,
            min_y,
            max_z,
            min_z,
            start_of_waveform_data_packet_record,
            evlr,
            extended_counts,
            padding,
        })
    }

    pub fn write_to<W: Write>(&self, mut dst: W) -> Result<()> {
        dst.write_all(&FILE_SIGNATURE)?;
        dst.write_u16::<LittleEndian>(self.file_source_id)?;
        dst.write_u16::<LittleEndian>(self.global_encoding)?;
        dst.write_all(&self.guid)?;
        dst.write_u8(self.version.major)?;
        dst.write_u8(self.version.minor)?;
        dst.write_all(&self.system_identifier)?;
        dst.write_all(&self.generating_software)?;
        dst.write_u16::<LittleEndian>(self.file_creation_day_of_year)?;
        dst.write_u16::<LittleEndian>(self.file_creation_year)?;
        dst.write_u16::<LittleEndian>(self.header_size)?;
        dst.write_u32::<LittleEndian>(self.offset_to_point_data)?;
        dst.write_u32::<LittleEndian>(self.number_of_variable_length_records)?;
        dst.write_u8(self.point_format.id)?;
        dst.write_u16::<LittleEndian>(self.point_format.len())?;
        dst.write_u32::<LittleEndian>(self.number_of_point_records)?;
        for n in &self.number_of_points_by_return {
            dst.write_u32::<LittleEndian>(*n)?;
        }
        dst.write_f64::<LittleEndian>(self.x_scale_factor)?;
        dst.write_f64::<LittleEndian>(self.y_scale_factor)?;
        dst.write_f64::<LittleEndian>(self.z_scale_factor)?;
        dst.write_f64::<LittleEndian>(self.x_offset)?;
        dst.write_f64::<LittleEndian>(self.y_offset)?;
        dst.write_f64::<LittleEndian>(self.z_offset)?;
        dst.write_f64::<LittleEndian>(self.max_x)?;
        dst.write_f64::<LittleEndian>(self.min_x)?;
        dst.write_f64::<LittleEndian>(self.max_y)?;
        dst.write_f64::<LittleEndian>(self.min_y)?;
        dst.write_f64::<LittleEndian>(self.max_z)?;
        dst.write_f64::<LittleEndian>(self.min_z)?;

        if self.version.has_waveform_offset() {
            dst.write_u64::<LittleEndian>(self.start_of_waveform_data_packet_record.unwrap_or(0))?;
        }
        if self.version.has_evlrs() {
            let evlr = self.evlr.unwrap_or_default();
            dst.write_u64::<LittleEndian>(evlr.start_of_first_evlr)?;
            dst.write_u32::<LittleEndian>(evlr.number_of_evlrs)?;
        }
        if self.version.has_extended_point_counts() {
            let counts = self.extended_counts.unwrap_or_default();
            dst.write_u64::<LittleEndian>(counts.number_of_point_records)?;
            for n in &counts.number_of_points_by_return {
                dst.write_u64::<LittleEndian>(*n)?;
            }
        }
        if !self.padding.is_empty() {
            dst.write_all(&self.padding)?;
        }
        Ok(())
    }
}

impl Default for Header {
    fn default() -> Self {
        let version = Version::default();
        let point_format = PointFormat::new(0, 0).expect("format 0 is always valid");
        Self {
            file_source_id: 0,
            global_encoding: 0,
            guid: [0u8; 16],
            version,
            system_identifier: [0u8; 32],
            generating_software: [0u8; 32],
            file_creation_day_of_year: 0,
            file_creation_year: 0,
            header_size: version.header_size(),
            offset_to_point_data: u32::from(version.header_size()),
            number_of_variable_length_records: 0,
            point_format,
            number_of_point_records: 0,
            number_of_points_by_return: [0u32; 5],
            x_scale_factor: 0.001,
            y_scale_factor: 0.001,
            z_scale_factor: 0.001,
            x_offset: 0.,
            y_offset: 0.,
            z_offset: 0.,
            max_x: 0.,
            min_x: 0.,
            max_y: 0.,
            min_y: 0.,
            max_z: 0.,
            min_z: 0.,
            start_of_waveform_data_packet_record: None,
            evlr: None,
            extended_counts: None,
            padding: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn rejects_bad_magic() {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"XXXX");
        buf.resize(227, 0);
        assert!(matches!(
            Header::read_from(Cursor::new(buf)),
            Err(LasZipError::BadMagic)
        ));
    }

    macro_rules! roundtrip {
        ($name:ident, $minor:expr) => {
            #[test]
            fn $name() {
                let version = Version::new(1, $minor);
                let mut header = Header {
                    version,
                    header_size: version.header_size(),
                    offset_to_point_data: u32::from(version.header_size()),
                    ..Default::default()
                };
                if $minor == 4 {
                    header.extended_counts = Some(ExtendedCounts::default());
                }
                let mut buf = Vec::new();
                header.write_to(&mut buf).unwrap();
                assert_eq!(buf.len(), version.header_size() as usize);
                let read_back = Header::read_from(Cursor::new(buf)).unwrap();
                assert_eq!(read_back, header);
            }
        };
    }

    roundtrip!(roundtrips_1_0, 0);
    roundtrip!(roundtrips_1_1, 1);
    roundtrip!(roundtrips_1_2, 2);
    roundtrip!(roundtrips_1_3, 3);
    roundtrip!(roundtrips_1_4, 4);

    #[test]
    fn effective_point_count_prefers_extended_when_nonzero() {
        let mut header = Header {
            number_of_point_records: 5,
            ..Default::default()
        };
        assert_eq!(header.effective_point_count(), 5);

        header.extended_counts = Some(ExtendedCounts {
            number_of_point_records: 42,
            ..Default::default()
        });
        assert_eq!(header.effective_point_count(), 42);

        header.extended_counts = Some(ExtendedCounts::default());
        assert_eq!(header.effective_point_count(), 5);
    }

    #[test]
    fn point_format_sizes_match_spec() {
        assert_eq!(PointFormat::new(0, 0).unwrap().len(), 20);
        assert_eq!(PointFormat::new(1, 0).unwrap().len(), 28);
        assert_eq!(PointFormat::new(3, 0).unwrap().len(), 34);
        assert_eq!(PointFormat::new(6, 0).unwrap().len(), 30);
        assert_eq!(PointFormat::new(7, 0).unwrap().len(), 36);
        assert_eq!(PointFormat::new(8, 0).unwrap().len(), 38);
        assert_eq!(PointFormat::new(10, 0).unwrap().len(), 67);
    }
}
