//! The read-side façade: opens a LAS/LAZ stream, parses the container, and
//! drives the point codec one record (or a seek) at a time.

use std::io::{Read, Seek, SeekFrom};

use crate::container::header::Header;
use crate::container::vlr::Vlr;
use crate::container::Vlrs;
use crate::laszip::{LasZipDecompressor, LazVlr};
use crate::las::selective::DecompressionSelection;
use crate::{LasZipError, Result};

/// Which of the two on-disk encodings a stream holds. Centralizes the
/// extension dispatch that would otherwise be scattered across openers;
/// recognizes only the formats this crate actually reads/writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Las,
    Laz,
}

/// Maps a file name's extension to the format this crate should open it as.
/// Unknown extensions (including the ancillary formats this crate doesn't
/// implement: bin/qi/wrl/txt/json and friends) resolve to `None`.
pub fn sniff(name: &str) -> Option<Format> {
    let ext = name.rsplit('.').next()?.to_ascii_lowercase();
    match ext.as_str() {
        "las" => Some(Format::Las),
        "laz" => Some(Format::Laz),
        _ => None,
    }
}

enum PointSource<R: Read + Seek + Send + Sync> {
    Compressed(Box<LasZipDecompressor<'static, R>>),
    Raw(R),
}

/// Reads a LAS/LAZ file: the fixed header, its VLR/EVLR tables, and the
/// point stream behind them.
pub struct Reader<R: Read + Seek + Send + Sync> {
    header: Header,
    vlrs: Vlrs,
    point_len: usize,
    points_read: u64,
    source: PointSource<R>,
}

impl<R: Read + Seek + Send + Sync + 'static> Reader<R> {
    /// Parses the header and VLR/EVLR tables, then positions the point
    /// codec at the start of point data. Decompresses every field.
    pub fn new(stream: R) -> Result<Self> {
        Self::selective(stream, DecompressionSelection::all())
    }

    /// Like [`new`](Self::new), but only decompresses the fields selected by
    /// `selection`. Fields left out of the selection keep whatever value they
    /// held on the previous point (the first point of each chunk is always
    /// decompressed in full, regardless of selection). Has no effect on
    /// uncompressed (plain LAS) streams, which always read every byte, or on
    /// point-wise (non-layered) compressed streams, which don't support
    /// selective decompression.
    pub fn selective(mut stream: R, selection: DecompressionSelection) -> Result<Self> {
        let header = Header::read_from(&mut stream)?;

        let mut vlrs = Vlrs::default();
        for _ in 0..header.number_of_variable_length_records {
            vlrs.vlrs.push(Vlr::read_from(&mut stream)?);
        }

        if let Some(evlr_ptr) = header.evlr {
            let saved_pos = stream.seek(SeekFrom::Current(0))?;
            stream.seek(SeekFrom::Start(evlr_ptr.start_of_first_evlr))?;
            for _ in 0..evlr_ptr.number_of_evlrs {
                vlrs.evlrs.push(Vlr::read_extended_from(&mut stream)?);
            }
            stream.seek(SeekFrom::Start(saved_pos))?;
        }

        stream.seek(SeekFrom::Start(u64::from(header.offset_to_point_data)))?;

        let point_len = header.point_format.len() as usize;
        let source = match vlrs.get(LazVlr::USER_ID, LazVlr::RECORD_ID) {
            Some(laszip_vlr) => {
                let vlr = LazVlr::read_from(&mut laszip_vlr.data.as_slice())?;
                PointSource::Compressed(Box::new(LasZipDecompressor::selective(
                    stream, vlr, selection,
                )?))
            }
            None => PointSource::Raw(stream),
        };

        Ok(Self {
            header,
            vlrs,
            point_len,
            points_read: 0,
            source,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn vlrs(&self) -> &Vlrs {
        &self.vlrs
    }

    /// Size in bytes of one (uncompressed) point record.
    pub fn point_len(&self) -> usize {
        self.point_len
    }

    pub fn num_points(&self) -> u64 {
        self.header.effective_point_count()
    }

    /// Reads the next point record into `buf`, which must be exactly
    /// [`point_len`](Self::point_len) bytes.
    pub fn read_point(&mut self, buf: &mut [u8]) -> Result<()> {
        if buf.len() != self.point_len {
            return Err(LasZipError::BufferLenNotMultipleOfPointSize {
                buffer_len: buf.len(),
                point_size: self.point_len,
            });
        }
        match &mut self.source {
            PointSource::Compressed(decompressor) => decompressor.decompress_one(buf)?,
            PointSource::Raw(stream) => stream.read_exact(buf)?,
        }
        self.points_read += 1;
        Ok(())
    }

    /// Seeks so that the next [`read_point`](Self::read_point) returns the
    /// point at `point_index`.
    pub fn seek(&mut self, point_index: u64) -> Result<()> {
        match &mut self.source {
            PointSource::Compressed(decompressor) => decompressor.seek(point_index)?,
            PointSource::Raw(stream) => {
                let offset = u64::from(self.header.offset_to_point_data)
                    + point_index * self.point_len as u64;
                stream.seek(SeekFrom::Start(offset))?;
            }
        }
        self.points_read = point_index;
        Ok(())
    }

    pub fn into_inner(self) -> R {
        match self.source {
            PointSource::Compressed(decompressor) => decompressor.into_inner(),
            PointSource::Raw(stream) => stream,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use crate::container::header::{PointFormat, Version};
    use crate::las::point6::{LasPoint6, Point6};
    use crate::las::selective::DecompressionSelection;
    use crate::laszip::{LasZipCompressor, LazItemRecordBuilder};
    use crate::packers::Packable;

    #[test]
    fn sniffs_known_extensions() {
        assert_eq!(sniff("cloud.las"), Some(Format::Las));
        assert_eq!(sniff("cloud.LAZ"), Some(Format::Laz));
        assert_eq!(sniff("cloud.bin"), None);
        assert_eq!(sniff("noextension"), None);
    }

    fn point_6(x: i32, y: i32, z: i32, classification: u8, intensity: u16) -> Point6 {
        let mut p = Point6::default();
        p.set_x(x);
        p.set_y(y);
        p.set_z(z);
        p.set_classification(classification);
        p.set_intensity(intensity);
        p
    }

    fn laz_stream_with_two_points(p0: Point6, p1: Point6) -> (Vec<u8>, LazVlr) {
        let items = LazItemRecordBuilder::default_for_point_format_id(6, 0);
        let laz_vlr = LazVlr::from_laz_items(items);

        let mut compressor =
            LasZipCompressor::new(Cursor::new(Vec::<u8>::new()), laz_vlr.clone()).unwrap();
        let mut buf = [0u8; Point6::SIZE];
        p0.pack_into(&mut buf);
        compressor.compress_one(&buf).unwrap();
        p1.pack_into(&mut buf);
        compressor.compress_one(&buf).unwrap();
        compressor.done().unwrap();

        (compressor.into_inner().into_inner(), laz_vlr)
    }

    fn wrap_in_las_stream(compressed_points: Vec<u8>, laz_vlr: &LazVlr) -> Cursor<Vec<u8>> {
        let mut laz_vlr_bytes = Vec::new();
        laz_vlr.write_to(&mut laz_vlr_bytes).unwrap();

        let header_size = Version::new(1, 2).header_size();
        let offset_to_point_data = header_size as u32 + 54 + laz_vlr_bytes.len() as u32;

        let header = Header {
            point_format: PointFormat::new(6, 0).unwrap(),
            header_size,
            offset_to_point_data,
            number_of_variable_length_records: 1,
            number_of_point_records: 2,
            ..Default::default()
        };

        let mut stream = Vec::new();
        header.write_to(&mut stream).unwrap();
        Vlr::new(LazVlr::USER_ID, LazVlr::RECORD_ID, "", laz_vlr_bytes)
            .write_to(&mut stream)
            .unwrap();
        stream.extend_from_slice(&compressed_points);

        Cursor::new(stream)
    }

    #[test]
    fn selective_decompression_leaves_unselected_fields_at_their_prior_value() {
        let p0 = point_6(100_000, 200_000, 300, 5, 111);
        let p1 = point_6(100_010, 200_020, 305, 9, 222);

        let (compressed_points, laz_vlr) = laz_stream_with_two_points(p0, p1);
        let stream = wrap_in_las_stream(compressed_points, &laz_vlr);

        let selection = DecompressionSelection(DecompressionSelection::Z);
        let mut reader = Reader::selective(stream, selection).unwrap();

        let mut buf = [0u8; Point6::SIZE];
        reader.read_point(&mut buf).unwrap();
        let first = Point6::unpack_from(&buf);
        assert_eq!(first.x(), p0.x());
        assert_eq!(first.classification(), p0.classification());

        reader.read_point(&mut buf).unwrap();
        let second = Point6::unpack_from(&buf);
        // x/y are always decompressed, and z was explicitly selected.
        assert_eq!(second.x(), p1.x());
        assert_eq!(second.y(), p1.y());
        assert_eq!(second.z(), p1.z());
        // classification/intensity were not selected: they stay at the first point's value.
        assert_eq!(second.classification(), p0.classification());
        assert_eq!(second.intensity(), p0.intensity());
    }

    #[test]
    fn full_decompression_matches_every_field() {
        let p0 = point_6(1, 2, 3, 1, 10);
        let p1 = point_6(4, 5, 6, 2, 20);

        let (compressed_points, laz_vlr) = laz_stream_with_two_points(p0, p1);
        let stream = wrap_in_las_stream(compressed_points, &laz_vlr);

        let mut reader = Reader::new(stream).unwrap();

        let mut buf = [0u8; Point6::SIZE];
        reader.read_point(&mut buf).unwrap();
        assert_eq!(Point6::unpack_from(&buf), p0);

        reader.read_point(&mut buf).unwrap();
        assert_eq!(Point6::unpack_from(&buf), p1);
    }
}
