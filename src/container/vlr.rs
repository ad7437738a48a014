//! Variable length records (VLR) and extended variable length records (EVLR).
//!
//! Both share the same logical layout; only the width of the record length
//! field and of the header itself differ (54 bytes for a VLR, 60 for an
//! EVLR).

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

use crate::Result;

/// Header shared by VLRs and EVLRs, stripped of the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VlrHeader {
    pub reserved: u16,
    pub user_id: [u8; 16],
    pub record_id: u16,
    pub description: [u8; 32],
}

impl Default for VlrHeader {
    fn default() -> Self {
        Self {
            reserved: 0,
            user_id: [0u8; 16],
            record_id: 0,
            description: [0u8; 32],
        }
    }
}

/// A variable length record: a typed, described, arbitrary-length payload
/// attached to a LAS/LAZ header.
///
/// Known `(user_id, record_id)` pairs are interpreted by higher layers (the
/// LASzip descriptor, the tiling VLR, the compatibility marker); everything
/// else is carried as an opaque payload and reserialized byte-for-byte.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vlr {
    pub header: VlrHeader,
    pub data: Vec<u8>,
}

impl Vlr {
    pub fn new(user_id: &str, record_id: u16, description: &str, data: Vec<u8>) -> Self {
        let mut header = VlrHeader {
            record_id,
            ..Default::default()
        };
        copy_ascii_into(user_id, &mut header.user_id);
        copy_ascii_into(description, &mut header.description);
        Self { header, data }
    }

    pub fn user_id(&self) -> &str {
        trimmed_str(&self.header.user_id)
    }

    pub fn description(&self) -> &str {
        trimmed_str(&self.header.description)
    }

    pub fn matches(&self, user_id: &str, record_id: u16) -> bool {
        self.user_id() == user_id && self.header.record_id == record_id
    }

    /// Reads a 54-byte-header VLR. `record.data` is resized to the
    /// `record_length_after_header` read from the stream, so the caller does
    /// not need to know the payload size ahead of time.
    pub fn read_from<R: Read>(mut src: R) -> Result<Self> {
        let mut header = VlrHeader::default();
        header.reserved = src.read_u16::<LittleEndian>()?;
        src.read_exact(&mut header.user_id)?;
        header.record_id = src.read_u16::<LittleEndian>()?;
        let record_length = src.read_u16::<LittleEndian>()?;
        src.read_exact(&mut header.description)?;
        let mut data = vec![0u8; record_length as usize];
        if let Err(e) = src.read_exact(&mut data) {
            log::warn!(
                "truncated VLR ({}, {}): declared {} bytes of payload but the stream ended first",
                trimmed_str(&header.user_id),
                header.record_id,
                record_length
            );
            return Err(e.into());
        }
        Ok(Self { header, data })
    }

    /// Reads a 60-byte-header EVLR (the `record_length_after_header` field is
    /// a `u64` instead of a `u16`).
    pub fn read_extended_from<R: Read>(mut src: R) -> Result<Self> {
        let mut header = VlrHeader::default();
        header.reserved = src.read_u16::<LittleEndian>()?;
        src.read_exact(&mut header.user_id)?;
        header.record_id = src.read_u16::<LittleEndian>()?;
        let record_length = src.read_u64::<LittleEndian>()?;
        src.read_exact(&mut header.description)?;
        let mut data = vec![0u8; record_length as usize];
        src.read_exact(&mut data)?;
        Ok(Self { header, data })
    }

    pub fn write_to<W: Write>(&self, mut dst: W) -> Result<()> {
        dst.write_u16::<LittleEndian>(self.header.reserved)?;
        dst.write_all(&self.header.user_id)?;
        dst.write_u16::<LittleEndian>(self.header.record_id)?;
        dst.write_u16::<LittleEndian>(self.data.len() as u16)?;
        dst.write_all(&self.header.description)?;
        dst.write_all(&self.data)?;
        Ok(())
    }

    pub fn write_extended_to<W: Write>(&self, mut dst: W) -> Result<()> {
        dst.write_u16::<LittleEndian>(self.header.reserved)?;
        dst.write_all(&self.header.user_id)?;
        dst.write_u16::<LittleEndian>(self.header.record_id)?;
        dst.write_u64::<LittleEndian>(self.data.len() as u64)?;
        dst.write_all(&self.header.description)?;
        dst.write_all(&self.data)?;
        Ok(())
    }

    /// Size in bytes this record would occupy as a VLR, header included.
    pub fn vlr_len(&self) -> u64 {
        54 + self.data.len() as u64
    }

    /// Size in bytes this record would occupy as an EVLR, header included.
    pub fn evlr_len(&self) -> u64 {
        60 + self.data.len() as u64
    }
}

fn copy_ascii_into(s: &str, out: &mut [u8]) {
    let bytes = s.as_bytes();
    let n = bytes.len().min(out.len());
    out[..n].copy_from_slice(&bytes[..n]);
}

fn trimmed_str(bytes: &[u8]) -> &str {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    std::str::from_utf8(&bytes[..end]).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn vlr_round_trips() {
        let vlr = Vlr::new("my_one_VLR", 12345, "", vec![]);
        let mut buf = Vec::new();
        vlr.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), vlr.vlr_len() as usize);
        let read_back = Vlr::read_from(Cursor::new(&buf)).unwrap();
        assert_eq!(read_back, vlr);
    }

    #[test]
    fn evlr_round_trips_with_payload() {
        let vlr = Vlr::new("my_other_VLR", 23456, "desc", vec![7u8; 64]);
        let mut buf = Vec::new();
        vlr.write_extended_to(&mut buf).unwrap();
        assert_eq!(buf.len(), vlr.evlr_len() as usize);
        let read_back = Vlr::read_extended_from(Cursor::new(&buf)).unwrap();
        assert_eq!(read_back, vlr);
    }

    #[test]
    fn matches_checks_user_id_and_record_id() {
        let vlr = Vlr::new("laszip encoded", 22204, "", vec![]);
        assert!(vlr.matches("laszip encoded", 22204));
        assert!(!vlr.matches("laszip encoded", 1));
    }
}
