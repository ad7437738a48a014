//! The LASzip VLR: its `record_data` layout, the `LazItem`s describing the
//! point dimensions it compresses, and the builders used to assemble both.
use std::io::{Read, Seek, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::las::nir::Nir;
use crate::las::point6::Point6;
use crate::las::rgb::RGB;
use crate::las::wavepacket::LasWavepacket;
use crate::las::Point0;
use crate::LasZipError;

const DEFAULT_CHUNK_SIZE: usize = 50_000;

#[derive(Debug, Copy, Clone, Default)]
struct Version {
    major: u8,
    minor: u8,
    revision: u16,
}

impl Version {
    fn read_from<R: Read>(src: &mut R) -> std::io::Result<Self> {
        Ok(Self {
            major: src.read_u8()?,
            minor: src.read_u8()?,
            revision: src.read_u16::<LittleEndian>()?,
        })
    }

    fn write_to<W: Write>(&self, dst: &mut W) -> std::io::Result<()> {
        dst.write_u8(self.major)?;
        dst.write_u8(self.minor)?;
        dst.write_u16::<LittleEndian>(self.revision)?;
        Ok(())
    }
}

/// The different types of data / fields found in the definition of LAS points.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LazItemType {
    Byte(u16),
    Point10,
    GpsTime,
    RGB12,
    WavePacket13,
    Point14,
    RGB14,
    RGBNIR14,
    WavePacket14,
    Byte14(u16),
}

impl LazItemType {
    fn size(&self) -> u16 {
        match self {
            LazItemType::Byte(size) => *size,
            LazItemType::Point10 => Point0::SIZE as u16,
            LazItemType::GpsTime => std::mem::size_of::<f64>() as u16,
            LazItemType::RGB12 => RGB::SIZE as u16,
            LazItemType::WavePacket13 => LasWavepacket::SIZE as u16,
            LazItemType::Point14 => Point6::SIZE as u16,
            LazItemType::RGB14 => RGB::SIZE as u16,
            LazItemType::RGBNIR14 => (RGB::SIZE + Nir::SIZE) as u16,
            LazItemType::WavePacket14 => LasWavepacket::SIZE as u16,
            LazItemType::Byte14(size) => *size,
        }
    }
}

impl From<LazItemType> for u16 {
    fn from(t: LazItemType) -> Self {
        match t {
            LazItemType::Byte(_) => 0,
            LazItemType::Point10 => 6,
            LazItemType::GpsTime => 7,
            LazItemType::RGB12 => 8,
            LazItemType::WavePacket13 => 9,
            LazItemType::Point14 => 10,
            LazItemType::RGB14 => 11,
            LazItemType::RGBNIR14 => 12,
            LazItemType::WavePacket14 => 13,
            LazItemType::Byte14(_) => 14,
        }
    }
}

/// One entry of the LASzip VLR `record_data`: which dimension is compressed,
/// its uncompressed size, and the codec version used for it.
#[derive(Debug, Copy, Clone)]
pub struct LazItem {
    pub(crate) item_type: LazItemType,
    pub(crate) size: u16,
    pub(crate) version: u16,
}

impl LazItem {
    pub(crate) fn new(item_type: LazItemType, version: u16) -> Self {
        let size = item_type.size();
        Self {
            item_type,
            size,
            version,
        }
    }

    fn read_from<R: Read>(src: &mut R) -> Result<Self, LasZipError> {
        let item_type = src.read_u16::<LittleEndian>()?;
        let size = src.read_u16::<LittleEndian>()?;
        let item_type = match item_type {
            0 => LazItemType::Byte(size),
            6 => LazItemType::Point10,
            7 => LazItemType::GpsTime,
            8 => LazItemType::RGB12,
            9 => LazItemType::WavePacket13,
            10 => LazItemType::Point14,
            11 => LazItemType::RGB14,
            12 => LazItemType::RGBNIR14,
            13 => LazItemType::WavePacket14,
            14 => LazItemType::Byte14(size),
            _ => return Err(LasZipError::UnknownLazItem(item_type)),
        };
        Ok(Self {
            item_type,
            size,
            version: src.read_u16::<LittleEndian>()?,
        })
    }

    fn write_to<W: Write>(&self, dst: &mut W) -> std::io::Result<()> {
        dst.write_u16::<LittleEndian>(self.item_type.into())?;
        dst.write_u16::<LittleEndian>(self.size)?;
        dst.write_u16::<LittleEndian>(self.version)?;
        Ok(())
    }
}

macro_rules! define_trait_for_version {
    ($trait_name:ident, $trait_fn_name:ident) => {
        pub trait $trait_name {
            fn $trait_fn_name(num_extra_bytes: u16) -> Vec<LazItem>;
        }
    };
}

define_trait_for_version!(DefaultVersion, default_version);
define_trait_for_version!(Version1, version_1);
define_trait_for_version!(Version2, version_2);
define_trait_for_version!(Version3, version_3);

/// Builds the list of [LazItem] describing a point's layout, either from the
/// items a point format implements by default or by hand with [LazItemRecordBuilder::add_item].
pub struct LazItemRecordBuilder {
    items: Vec<LazItemType>,
}

impl LazItemRecordBuilder {
    pub fn default_version_of<PointFormat: DefaultVersion>(num_extra_bytes: u16) -> Vec<LazItem> {
        PointFormat::default_version(num_extra_bytes)
    }

    pub fn version_1_of<PointFormat: Version1>(num_extra_bytes: u16) -> Vec<LazItem> {
        PointFormat::version_1(num_extra_bytes)
    }

    pub fn version_2_of<PointFormat: Version2>(num_extra_bytes: u16) -> Vec<LazItem> {
        PointFormat::version_2(num_extra_bytes)
    }

    pub fn version_3_of<PointFormat: Version3>(num_extra_bytes: u16) -> Vec<LazItem> {
        PointFormat::version_3(num_extra_bytes)
    }

    /// Builds the default set of laz items for a given LAS point format id.
    ///
    /// Formats that carry wave packet data (4, 5, 9, 10) are not backed by a
    /// dedicated `Point4`/`Point5`/`Point9`/`Point10` type, their item list is
    /// assembled directly from the formats they are built on top of.
    pub fn default_for_point_format_id(point_format_id: u8, num_extra_bytes: u16) -> Vec<LazItem> {
        use crate::las::{Point1, Point2, Point3, Point7, Point8};

        fn with_extra_bytes(mut items: Vec<LazItem>, num_extra_bytes: u16, version: u16) -> Vec<LazItem> {
            if num_extra_bytes > 0 {
                let byte_type = if version >= 3 {
                    LazItemType::Byte14(num_extra_bytes)
                } else {
                    LazItemType::Byte(num_extra_bytes)
                };
                items.push(LazItem::new(byte_type, version));
            }
            items
        }

        match point_format_id {
            0 => LazItemRecordBuilder::default_version_of::<Point0>(num_extra_bytes),
            1 => LazItemRecordBuilder::default_version_of::<Point1>(num_extra_bytes),
            2 => LazItemRecordBuilder::default_version_of::<Point2>(num_extra_bytes),
            3 => LazItemRecordBuilder::default_version_of::<Point3>(num_extra_bytes),
            4 => with_extra_bytes(
                vec![
                    LazItem::new(LazItemType::Point10, 2),
                    LazItem::new(LazItemType::GpsTime, 2),
                    LazItem::new(LazItemType::WavePacket13, 2),
                ],
                num_extra_bytes,
                2,
            ),
            5 => with_extra_bytes(
                vec![
                    LazItem::new(LazItemType::Point10, 2),
                    LazItem::new(LazItemType::GpsTime, 2),
                    LazItem::new(LazItemType::RGB12, 2),
                    LazItem::new(LazItemType::WavePacket13, 2),
                ],
                num_extra_bytes,
                2,
            ),
            6 => LazItemRecordBuilder::default_version_of::<Point6>(num_extra_bytes),
            7 => LazItemRecordBuilder::default_version_of::<Point7>(num_extra_bytes),
            8 => LazItemRecordBuilder::default_version_of::<Point8>(num_extra_bytes),
            9 => with_extra_bytes(
                vec![
                    LazItem::new(LazItemType::Point14, 3),
                    LazItem::new(LazItemType::WavePacket14, 3),
                ],
                num_extra_bytes,
                3,
            ),
            10 => with_extra_bytes(
                vec![
                    LazItem::new(LazItemType::Point14, 3),
                    LazItem::new(LazItemType::RGB14, 3),
                    LazItem::new(LazItemType::WavePacket14, 3),
                ],
                num_extra_bytes,
                3,
            ),
            _ => panic!("Point format id: {} is not supported", point_format_id),
        }
    }

    pub fn new() -> Self {
        Self { items: vec![] }
    }

    pub fn add_item(&mut self, item_type: LazItemType) -> &mut Self {
        self.items.push(item_type);
        self
    }

    pub fn build(&self) -> Vec<LazItem> {
        self.items
            .iter()
            .map(|item_type| {
                let size = item_type.size();
                let version = match item_type {
                    LazItemType::Byte(_) => 2,
                    LazItemType::Point10 => 2,
                    LazItemType::GpsTime => 2,
                    LazItemType::RGB12 => 2,
                    LazItemType::WavePacket13 => 2,
                    LazItemType::Point14 => 3,
                    LazItemType::RGB14 => 3,
                    LazItemType::RGBNIR14 => 3,
                    LazItemType::WavePacket14 => 3,
                    LazItemType::Byte14(_) => 3,
                };
                LazItem {
                    item_type: *item_type,
                    size,
                    version,
                }
            })
            .collect()
    }
}

impl Default for LazItemRecordBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn read_laz_items_from<R: Read>(mut src: &mut R) -> Result<Vec<LazItem>, LasZipError> {
    let num_items = src.read_u16::<LittleEndian>()?;
    let mut items = Vec::<LazItem>::with_capacity(num_items as usize);
    for _ in 0..num_items {
        items.push(LazItem::read_from(&mut src)?)
    }
    Ok(items)
}

fn write_laz_items_to<W: Write>(laz_items: &[LazItem], mut dst: &mut W) -> std::io::Result<()> {
    dst.write_u16::<LittleEndian>(laz_items.len() as u16)?;
    for item in laz_items {
        item.write_to(&mut dst)?;
    }
    Ok(())
}

/// The compression strategy recorded in the VLR: whether points are grouped
/// into chunks, and whether each chunk's dimensions are interleaved
/// (sequential codecs) or split into layers (layered codecs).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CompressorType {
    None = 0,
    /// No chunks, or rather only 1 chunk with all the points.
    PointWise = 1,
    /// Points are compressed into chunks of `chunk_size` points each.
    PointWiseChunked = 2,
    /// Points are compressed into chunks, with each point's fields split into
    /// separate layers. Used for point formats 6 and up.
    LayeredChunked = 3,
}

impl CompressorType {
    fn from_u16(t: u16) -> Option<Self> {
        match t {
            0 => Some(CompressorType::None),
            1 => Some(CompressorType::PointWise),
            2 => Some(CompressorType::PointWiseChunked),
            3 => Some(CompressorType::LayeredChunked),
            _ => None,
        }
    }
}

impl Default for CompressorType {
    fn default() -> Self {
        CompressorType::PointWiseChunked
    }
}

/// Tells how many uncompressed bytes make up a decompressed chunk, when that
/// number is knowable ahead of time.
///
/// Variable-size chunks store their point count alongside the chunk table
/// entry, so the byte count of any given chunk cannot be known without
/// reading that entry first.
#[derive(Debug, Copy, Clone)]
pub enum DecompressedChunkSize {
    Fixed { num_bytes: usize },
    Variable,
}

impl DecompressedChunkSize {
    pub fn fixed(self) -> Option<usize> {
        match self {
            DecompressedChunkSize::Fixed { num_bytes } => Some(num_bytes),
            DecompressedChunkSize::Variable => None,
        }
    }
}

/// The data stored in the `record_data` of the LASzip VLR.
///
/// This describes how the point records following the VLR are compressed:
/// the [CompressorType], the chunking strategy, and the ordered [LazItem]s
/// making up one point.
#[derive(Debug, Clone)]
pub struct LazVlr {
    pub(crate) compressor: CompressorType,
    // 0 means ArithmeticCoder, it's the only choice
    coder: u16,

    version: Version,
    options: u32,
    /// Number of points per chunk.
    chunk_size: u32,

    // -1 if unused
    number_of_special_evlrs: i64,
    // -1 if unused
    offset_to_special_evlrs: i64,

    items: Vec<LazItem>,
}

impl LazVlr {
    pub const USER_ID: &'static str = "laszip encoded";
    pub const RECORD_ID: u16 = 22204;
    pub const DESCRIPTION: &'static str = "http://laszip.org";

    pub fn new() -> Self {
        Self {
            compressor: CompressorType::default(),
            coder: 0,
            version: Version {
                major: 2,
                minor: 2,
                revision: 0,
            },
            options: 0,
            chunk_size: DEFAULT_CHUNK_SIZE as u32,
            number_of_special_evlrs: -1,
            offset_to_special_evlrs: -1,
            items: vec![],
        }
    }

    pub fn from_laz_items(items: Vec<LazItem>) -> Self {
        let mut me = Self::new();
        if items.iter().any(|item| item.version >= 3) {
            me.compressor = CompressorType::LayeredChunked;
        }
        me.items = items;
        me
    }

    /// Tries to read the Vlr information from the `record_data` buffer.
    pub fn from_buffer(record_data: &[u8]) -> Result<Self, LasZipError> {
        let mut cursor = std::io::Cursor::new(record_data);
        Self::read_from(&mut cursor)
    }

    /// Tries to read the Vlr information from the `record_data` source.
    pub fn read_from<R: Read>(mut src: &mut R) -> Result<Self, LasZipError> {
        let compressor_type = src.read_u16::<LittleEndian>()?;
        let compressor = match CompressorType::from_u16(compressor_type) {
            Some(c) => c,
            None => return Err(LasZipError::UnknownCompressorType(compressor_type)),
        };

        Ok(Self {
            compressor,
            coder: src.read_u16::<LittleEndian>()?,
            version: Version::read_from(&mut src)?,
            options: src.read_u32::<LittleEndian>()?,
            chunk_size: src.read_u32::<LittleEndian>()?,
            number_of_special_evlrs: src.read_i64::<LittleEndian>()?,
            offset_to_special_evlrs: src.read_i64::<LittleEndian>()?,
            items: read_laz_items_from(&mut src)?,
        })
    }

    /// Writes the Vlr to the source. This only writes the `record_data`, the
    /// VLR header must be written beforehand.
    pub fn write_to<W: Write>(&self, mut dst: &mut W) -> std::io::Result<()> {
        dst.write_u16::<LittleEndian>(self.compressor as u16)?;
        dst.write_u16::<LittleEndian>(self.coder)?;
        self.version.write_to(&mut dst)?;
        dst.write_u32::<LittleEndian>(self.options)?;
        dst.write_u32::<LittleEndian>(self.chunk_size)?;
        dst.write_i64::<LittleEndian>(self.number_of_special_evlrs)?;
        dst.write_i64::<LittleEndian>(self.offset_to_special_evlrs)?;
        write_laz_items_to(&self.items, &mut dst)?;
        Ok(())
    }

    pub fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    pub fn items(&self) -> &Vec<LazItem> {
        &self.items
    }

    /// Returns the sum of the sizes of the laz items, which corresponds to
    /// the expected size of an uncompressed point.
    pub fn items_size(&self) -> u64 {
        u64::from(self.items.iter().map(|item| item.size).sum::<u16>())
    }

    /// True when the number of points making up a chunk can vary from one
    /// chunk to the next, which is the case for layered (point format 6+)
    /// compression.
    pub fn uses_variable_size_chunks(&self) -> bool {
        self.compressor == CompressorType::LayeredChunked
    }

    /// Returns the number of decompressed bytes making up a chunk, when that
    /// number is fixed ahead of time (i.e. not [CompressorType::LayeredChunked]).
    pub fn num_bytes_in_decompressed_chunk(&self) -> DecompressedChunkSize {
        if self.uses_variable_size_chunks() {
            DecompressedChunkSize::Variable
        } else {
            DecompressedChunkSize::Fixed {
                num_bytes: self.chunk_size as usize * self.items_size() as usize,
            }
        }
    }
}

impl Default for LazVlr {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [LazVlr], for the cases where the default chunk size or a
/// hand-picked set of items is needed.
pub struct LazVlrBuilder {
    laz_vlr: LazVlr,
}

impl LazVlrBuilder {
    pub fn new() -> Self {
        Self {
            laz_vlr: Default::default(),
        }
    }

    /// Starts from a [`LazVlr`] already built from a set of items, so its
    /// other settings (chunk size, variable chunking) can still be adjusted.
    pub fn from_laz_items(laz_items: Vec<LazItem>) -> Self {
        Self::new().with_laz_items(laz_items)
    }

    pub fn with_chunk_size(mut self, chunk_size: u32) -> Self {
        self.laz_vlr.chunk_size = chunk_size;
        self
    }

    pub fn with_laz_items(mut self, laz_items: Vec<LazItem>) -> Self {
        if laz_items.iter().any(|item| item.version >= 3) {
            self.laz_vlr.compressor = CompressorType::LayeredChunked;
        }
        self.laz_vlr.items = laz_items;
        self
    }

    /// Forces chunks to be addressed by point count instead of a fixed
    /// `chunk_size`, so the writer's `chunk()` can close chunks of whatever
    /// size the caller wants. Implied automatically for layered (point
    /// format 6+) items; this lets callers opt a point-wise/chunked item set
    /// into the same behavior.
    pub fn with_variable_chunk_size(mut self) -> Self {
        self.laz_vlr.compressor = CompressorType::LayeredChunked;
        self
    }

    pub fn build(self) -> LazVlr {
        self.laz_vlr
    }
}

impl Default for LazVlrBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wave_packet_items_round_trip_type_code() {
        assert_eq!(u16::from(LazItemType::WavePacket13), 9);
        assert_eq!(u16::from(LazItemType::WavePacket14), 13);
    }

    #[test]
    fn vlr_round_trips_through_buffer() {
        let vlr = LazVlr::from_laz_items(
            LazItemRecordBuilder::new()
                .add_item(LazItemType::Point10)
                .add_item(LazItemType::GpsTime)
                .build(),
        );
        let mut buf = Vec::new();
        vlr.write_to(&mut buf).unwrap();
        let read_back = LazVlr::from_buffer(&buf).unwrap();
        assert_eq!(read_back.items().len(), 2);
        assert_eq!(read_back.chunk_size(), vlr.chunk_size());
    }

    #[test]
    fn default_items_for_wave_packet_formats_include_wave_packet() {
        for format in [4u8, 5, 9, 10] {
            let items = LazItemRecordBuilder::default_for_point_format_id(format, 0);
            assert!(items
                .iter()
                .any(|item| matches!(
                    item.item_type,
                    LazItemType::WavePacket13 | LazItemType::WavePacket14
                )));
        }
    }
}
