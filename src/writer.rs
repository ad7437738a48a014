//! The write-side façade: emits the container header and VLR tables, drives
//! the point codec, and patches the header with the accrued inventory once
//! writing is done.

use std::io::{Seek, SeekFrom, Write};

use crate::container::header::Header;
use crate::container::vlr::Vlr;
use crate::container::{offset_to_point_data, Inventory, Vlrs};
use crate::laszip::{LasZipCompressor, LazItemRecordBuilder, LazVlr};
use crate::Result;

enum PointSink<W: Write + Seek + Send + Sync> {
    Compressed(Box<LasZipCompressor<'static, W>>),
    Raw(W),
}

/// Writes a LAS/LAZ file: the fixed header, its VLR table, and the point
/// stream that follows.
///
/// `close` is the only commit point (see the concurrency notes on
/// [`Reader`](crate::Reader)); dropping a `Writer` before calling it leaves
/// the header's point counts and bounding box unpatched.
pub struct Writer<W: Write + Seek + Send + Sync> {
    header: Header,
    vlrs: Vlrs,
    inventory: Inventory,
    sink: PointSink<W>,
}

impl<W: Write + Seek + Send + Sync + 'static> Writer<W> {
    /// Starts a new file. `header.point_format` determines the item layout;
    /// `compressed` selects LAZ (arithmetic-coded) vs plain LAS output.
    pub fn new(mut stream: W, mut header: Header, mut vlrs: Vlrs, compressed: bool) -> Result<Self> {
        let laz_items = LazItemRecordBuilder::default_for_point_format_id(
            header.point_format.id,
            header.point_format.extra_bytes,
        );

        if compressed {
            let vlr = LazVlr::from_laz_items(laz_items);
            let mut data = Vec::new();
            vlr.write_to(&mut data)?;
            vlrs.add(LazVlr::USER_ID, LazVlr::RECORD_ID, LazVlr::DESCRIPTION, data);
        } else {
            vlrs.remove(LazVlr::USER_ID, LazVlr::RECORD_ID);
        }

        header.number_of_variable_length_records = vlrs.vlrs.len() as u32;
        header.offset_to_point_data = offset_to_point_data(&header, &vlrs)?;
        header.write_to(&mut stream)?;
        for vlr in &vlrs.vlrs {
            vlr.write_to(&mut stream)?;
        }

        let sink = if compressed {
            let laszip_vlr_data = vlrs
                .get(LazVlr::USER_ID, LazVlr::RECORD_ID)
                .expect("just inserted")
                .data
                .clone();
            let vlr = LazVlr::read_from(&mut laszip_vlr_data.as_slice())?;
            PointSink::Compressed(Box::new(LasZipCompressor::new(stream, vlr)?))
        } else {
            PointSink::Raw(stream)
        };

        Ok(Self {
            header,
            vlrs,
            inventory: Inventory::new(),
            sink,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn vlrs(&self) -> &Vlrs {
        &self.vlrs
    }

    pub fn add_vlr(&mut self, vlr: Vlr) {
        self.vlrs.vlrs.push(vlr);
    }

    /// Writes one point record. `point` must already be packed in the
    /// header's point format layout, little-endian.
    ///
    /// `x`/`y`/`z`/`return_number`/`gps_time`/`intensity` feed the running
    /// [`Inventory`] used to patch the header at [`close`](Self::close);
    /// callers that already decoded these fields from `point` pass them
    /// along instead of making this module re-parse the buffer.
    #[allow(clippy::too_many_arguments)]
    pub fn write_point(
        &mut self,
        point: &[u8],
        x: f64,
        y: f64,
        z: f64,
        return_number: u8,
        gps_time: Option<f64>,
        intensity: u16,
    ) -> Result<()> {
        match &mut self.sink {
            PointSink::Compressed(compressor) => compressor.compress_one(point)?,
            PointSink::Raw(stream) => stream.write_all(point)?,
        }
        self.inventory
            .add_point(x, y, z, return_number, gps_time, intensity);
        Ok(())
    }

    /// Closes the current chunk, so the next written point starts a new
    /// one. Only meaningful for LAZ output using variable-size chunks; a
    /// no-op for plain LAS output.
    pub fn chunk(&mut self) -> Result<()> {
        if let PointSink::Compressed(compressor) = &mut self.sink {
            compressor.finish_current_chunk()?;
        }
        Ok(())
    }

    /// Finalizes the point stream, patches the header's point counts and
    /// bounding box from the accrued inventory, and returns the underlying
    /// stream.
    pub fn close(mut self) -> Result<W> {
        let mut stream = match self.sink {
            PointSink::Compressed(mut compressor) => {
                compressor.done()?;
                compressor.into_inner()
            }
            PointSink::Raw(stream) => stream,
        };

        self.inventory.patch_header(&mut self.header);
        stream.seek(SeekFrom::Start(0))?;
        self.header.write_to(&mut stream)?;
        Ok(stream)
    }
}
