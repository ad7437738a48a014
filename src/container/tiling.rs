//! The `LAStools` tiling VLR: records which tile of a larger split a file
//! represents, so tools can stitch tiles back together.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

use crate::container::vlr::Vlr;
use crate::Result;

pub const USER_ID: &str = "LAStools";
pub const RECORD_ID: u16 = 10;
const PAYLOAD_LEN: usize = 28;

/// Payload of the tiling VLR: `{level, level_index, flags, min_x, max_x,
/// min_y, max_y}`, the last four as `f32`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TilingInfo {
    pub level: u32,
    pub level_index: u32,
    pub implicit_levels: u32,
    pub buffer: bool,
    pub reversible: bool,
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl TilingInfo {
    pub fn read_from<R: Read>(mut src: R) -> Result<Self> {
        let level = src.read_u32::<LittleEndian>()?;
        let level_index = src.read_u32::<LittleEndian>()?;
        let flags = src.read_u32::<LittleEndian>()?;
        let min_x = src.read_f32::<LittleEndian>()?;
        let max_x = src.read_f32::<LittleEndian>()?;
        let min_y = src.read_f32::<LittleEndian>()?;
        let max_y = src.read_f32::<LittleEndian>()?;
        Ok(Self {
            level,
            level_index,
            implicit_levels: flags & 0x00ff_ffff,
            buffer: flags & (1 << 24) != 0,
            reversible: flags & (1 << 25) != 0,
            min_x,
            max_x,
            min_y,
            max_y,
        })
    }

    pub fn write_to<W: Write>(&self, mut dst: W) -> Result<()> {
        let mut flags = self.implicit_levels & 0x00ff_ffff;
        if self.buffer {
            flags |= 1 << 24;
        }
        if self.reversible {
            flags |= 1 << 25;
        }
        dst.write_u32::<LittleEndian>(self.level)?;
        dst.write_u32::<LittleEndian>(self.level_index)?;
        dst.write_u32::<LittleEndian>(flags)?;
        dst.write_f32::<LittleEndian>(self.min_x)?;
        dst.write_f32::<LittleEndian>(self.max_x)?;
        dst.write_f32::<LittleEndian>(self.min_y)?;
        dst.write_f32::<LittleEndian>(self.max_y)?;
        Ok(())
    }

    pub fn from_vlr(vlr: &Vlr) -> Result<Option<Self>> {
        if !vlr.matches(USER_ID, RECORD_ID) {
            return Ok(None);
        }
        if vlr.data.len() != PAYLOAD_LEN {
            return Err(crate::LasZipError::InvalidHeader(
                "tiling VLR payload is not 28 bytes",
            ));
        }
        Self::read_from(vlr.data.as_slice()).map(Some)
    }

    pub fn to_vlr(&self) -> Result<Vlr> {
        let mut data = Vec::with_capacity(PAYLOAD_LEN);
        self.write_to(&mut data)?;
        Ok(Vlr::new(USER_ID, RECORD_ID, "LAStools tile", data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_a_vlr() {
        let info = TilingInfo {
            level: 2,
            level_index: 7,
            implicit_levels: 3,
            buffer: true,
            reversible: false,
            min_x: -10.5,
            max_x: 10.5,
            min_y: 0.0,
            max_y: 20.25,
        };
        let vlr = info.to_vlr().unwrap();
        assert_eq!(vlr.data.len(), PAYLOAD_LEN);
        let read_back = TilingInfo::from_vlr(&vlr).unwrap().unwrap();
        assert_eq!(read_back, info);
    }

    #[test]
    fn ignores_unrelated_vlrs() {
        let vlr = Vlr::new("other", 1, "", vec![0u8; PAYLOAD_LEN]);
        assert_eq!(TilingInfo::from_vlr(&vlr).unwrap(), None);
    }
}
