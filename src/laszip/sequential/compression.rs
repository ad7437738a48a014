use std::io::{Seek, SeekFrom, Write};

use byteorder::{LittleEndian, WriteBytesExt};

use crate::laszip::chunk_table::{update_chunk_table_offset, ChunkTable, ChunkTableEntry};
use crate::laszip::details::record_compressor_from_laz_items;
use crate::record::RecordCompressor;
use crate::{LasZipError, LazVlr};

/// LasZip compressor that compresses points into the given destination.
///
/// Supports both **fixed-size** and **variable-size** chunks; which one is
/// used is controlled by the [`LazVlr`] the compressor was built from.
pub struct LasZipCompressor<'a, W: Write + 'a> {
    vlr: LazVlr,
    record_compressor: Box<dyn RecordCompressor<W> + Send + Sync + 'a>,
    chunk_table: ChunkTable,
    table_offset: i64,
    chunk_point_written: u64,
    last_chunk_pos: u64,
}

impl<'a, W: Write + Seek + Send + Sync + 'a> LasZipCompressor<'a, W> {
    pub fn new(output: W, vlr: LazVlr) -> crate::Result<Self> {
        let record_compressor = record_compressor_from_laz_items(&vlr.items(), output)?;
        Ok(Self {
            vlr,
            record_compressor,
            chunk_table: ChunkTable::default(),
            table_offset: -1,
            chunk_point_written: 0,
            last_chunk_pos: 0,
        })
    }

    /// Reserves and prepares the offset to chunk table that will be updated
    /// when [`done`](Self::done) is called.
    ///
    /// Called automatically on the first point compressed; exposed so an
    /// appender can reserve it ahead of writing any points itself.
    pub fn reserve_offset_to_chunk_table(&mut self) -> crate::Result<()> {
        let stream = self.record_compressor.get_mut();
        self.table_offset = stream.seek(SeekFrom::Current(0))? as i64;
        stream.write_i64::<LittleEndian>(-1)?;
        self.last_chunk_pos = (self.table_offset + 8) as u64;
        Ok(())
    }

    /// Compresses one point and writes the compressed data to the
    /// destination given when the compressor was constructed.
    ///
    /// The input is expected to hold the point's fields in the order the
    /// LAS spec lists them, in little-endian byte order.
    pub fn compress_one(&mut self, input: &[u8]) -> crate::Result<()> {
        if self.table_offset == -1 {
            self.reserve_offset_to_chunk_table()?;
        }

        if !self.vlr.uses_variable_size_chunks()
            && self.chunk_point_written == u64::from(self.vlr.chunk_size())
        {
            self.finish_current_chunk()?;
        }

        self.record_compressor.compress_next(input)?;
        self.chunk_point_written += 1;
        Ok(())
    }

    /// Compresses many points, forming complete fixed-size chunks as
    /// `self.vlr`'s chunk size is reached.
    ///
    /// Must only be called when writing **fixed-size** chunks.
    pub fn compress_many(&mut self, points: &[u8]) -> crate::Result<()> {
        debug_assert!(!self.vlr.uses_variable_size_chunks());
        let point_size = self.vlr.items_size() as usize;
        for point in points.chunks_exact(point_size) {
            self.compress_one(point)?;
        }
        Ok(())
    }

    /// Compresses each item of `chunks` as its own independently-coded
    /// chunk.
    ///
    /// Must only be called when writing **variable-size** chunks.
    pub fn compress_chunks<Chunks, Item>(&mut self, chunks: Chunks) -> crate::Result<()>
    where
        Item: AsRef<[u8]>,
        Chunks: IntoIterator<Item = Item>,
    {
        assert!(self.vlr.uses_variable_size_chunks());
        for chunk in chunks {
            let data = chunk.as_ref();
            debug_assert_eq!(data.len() % self.vlr.items_size() as usize, 0);
            if self.chunk_point_written != 0 {
                self.finish_current_chunk()?;
            }
            self.record_compressor.compress_many(data)?;
            self.chunk_point_written = (data.len() / self.vlr.items_size() as usize) as u64;
            self.finish_current_chunk()?;
        }
        Ok(())
    }

    /// Closes the chunk currently being written: flushes the coder, records
    /// its entry in the chunk table, and resets the point codec so the next
    /// compressed point starts a fresh chunk.
    ///
    /// Only meaningful to call directly when writing **variable-size**
    /// chunks; fixed-size chunks close themselves automatically.
    pub fn finish_current_chunk(&mut self) -> crate::Result<()> {
        if self.table_offset == -1 {
            self.reserve_offset_to_chunk_table()?;
        }
        self.record_compressor.done()?;
        let current_pos = self.record_compressor.get_mut().seek(SeekFrom::Current(0))?;
        self.chunk_table.push(ChunkTableEntry {
            point_count: self.chunk_point_written,
            byte_count: current_pos - self.last_chunk_pos,
        });
        self.last_chunk_pos = current_pos;
        self.chunk_point_written = 0;
        self.record_compressor.reset();
        self.record_compressor.set_fields_from(&self.vlr.items())?;
        Ok(())
    }

    /// Tells the compressor that no more points will be compressed.
    ///
    /// - Compresses & writes the rest of the points to form the last chunk.
    /// - Writes the chunk table.
    /// - Updates the offset to the chunk table.
    pub fn done(&mut self) -> crate::Result<()> {
        if self.table_offset == -1 {
            self.reserve_offset_to_chunk_table()?;
        }
        if self.chunk_point_written != 0 || self.chunk_table.is_empty() {
            self.finish_current_chunk()?;
        }
        let stream = self.record_compressor.get_mut();
        update_chunk_table_offset(stream, SeekFrom::Start(self.table_offset as u64))?;
        self.chunk_table.write_to(stream, &self.vlr)?;
        Ok(())
    }

    pub fn vlr(&self) -> &LazVlr {
        &self.vlr
    }

    pub fn into_inner(self) -> W {
        self.record_compressor.box_into_inner()
    }

    pub fn get_mut(&mut self) -> &mut W {
        self.record_compressor.get_mut()
    }

    pub fn get(&self) -> &W {
        self.record_compressor.get()
    }

    pub(crate) fn chunk_table_position_offset(&self) -> i64 {
        self.table_offset
    }

    pub(crate) fn chunk_table(&self) -> &ChunkTable {
        &self.chunk_table
    }
}

impl<'a, W: Write + Seek + Send + Sync + 'a> crate::LazCompressor for LasZipCompressor<'a, W> {
    fn compress_one(&mut self, point: &[u8]) -> crate::Result<()> {
        LasZipCompressor::compress_one(self, point)
    }

    fn compress_many(&mut self, points: &[u8]) -> crate::Result<()> {
        LasZipCompressor::compress_many(self, points)
    }

    fn reserve_offset_to_chunk_table(&mut self) -> crate::Result<()> {
        LasZipCompressor::reserve_offset_to_chunk_table(self)
    }

    fn done(&mut self) -> crate::Result<()> {
        LasZipCompressor::done(self)
    }
}

/// Compresses all the points in `uncompressed_points`, writing the offset to
/// chunk table, the compressed chunks and the chunk table itself to `dst`.
///
/// `uncompressed_points`'s length must be a multiple of `laz_vlr.items_size()`.
pub fn compress_buffer<W: Write + Seek + Send + Sync>(
    dst: &mut W,
    uncompressed_points: &[u8],
    laz_vlr: LazVlr,
) -> crate::Result<()> {
    let point_size = laz_vlr.items_size() as usize;
    if uncompressed_points.len() % point_size != 0 {
        return Err(LasZipError::BufferLenNotMultipleOfPointSize {
            buffer_len: uncompressed_points.len(),
            point_size,
        });
    }
    let mut compressor = LasZipCompressor::new(dst, laz_vlr)?;
    compressor.compress_many(uncompressed_points)?;
    compressor.done()
}
