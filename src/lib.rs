//! Reader, writer and LASzip codec for the LAS/LAZ point cloud format.
//!
//! [`LasZipCompressor`] and [`LasZipDecompressor`] are the two types that
//! users wishing to compress and / or decompress raw LAZ point records
//! should use. For reading/writing whole `.las`/`.laz` files (header, VLRs,
//! points) see the [`reader`] and [`writer`] modules.
//!
//! # LasZipCompressor Examples
//!
//! ```
//! use lazpoint::{LasZipError, LasZipCompressor, LazItemType, LazItemRecordBuilder};
//!
//! # fn main() -> Result<(), LasZipError> {
//! // Here we use a Cursor but a std::fs::File will work just fine
//! let mut compressed_output = std::io::Cursor::new(vec![]);
//!
//! // LazItem may have multiple versions of the compression algorithm
//! // the builder selects a default one
//! let items = LazItemRecordBuilder::new()
//!             .add_item(LazItemType::Point10)
//!             .add_item(LazItemType::RGB12)
//!             .build();
//! let mut compressor = LasZipCompressor::from_laz_items(&mut compressed_output, items)?;
//!
//! let point = vec![0u8; 26];
//! compressor.compress_one(&point)?;
//! compressor.done()?; // don't forget to call done when you are...done compressing
//!
//! # Ok(())
//! # }
//! ```
//!
//! LasZipCompressors can also be constructed from a LazVlr if you need to change the chunk size
//! or if you have the LazVlr from the original LAZ file that you want to write back
//! ```
//! use lazpoint::{LasZipError, LasZipCompressor, LazItemType, LazItemRecordBuilder, LazVlrBuilder};
//!
//! # fn main() -> Result<(), LasZipError> {
//!
//! let mut compressed_output = std::io::Cursor::new(vec![]);
//! let items = LazItemRecordBuilder::new()
//!             .add_item(LazItemType::Point10)
//!             .add_item(LazItemType::RGB12)
//!             .build();
//! let vlr = LazVlrBuilder::new()
//!           .with_laz_items(items)
//!           .with_chunk_size(5_000)
//!           .build();
//!
//! let mut compressor = LasZipCompressor::from_laz_vlr(&mut compressed_output, vlr)?;
//!
//! let point = vec![0u8; 26];
//! compressor.compress_one(&point)?;
//! compressor.done()?;
//! # Ok(())
//! # }
//! ```
//!
//! To create a [`LasZipDecompressor`] you need to have the record_data found in the LAZ file.
//!
//! # LasZipDecompressor Examples
//!
//! ```
//! # const LAS_HEADER_SIZE: u64 = 227;
//! # const VLR_HEADER_SIZE: u64 = 54;
//! # const OFFSET_TO_LASZIP_VLR_DATA: u64 = LAS_HEADER_SIZE + VLR_HEADER_SIZE;
//!
//! use lazpoint::{LasZipError, LazVlr, LasZipDecompressor};
//! use std::fs::File;
//!
//! # fn seek_to_start_of_laszip_record_data(file: &mut File) -> std::io::Result<()> {
//! #    use std::io::{Seek, SeekFrom};
//! #    file.seek(SeekFrom::Start(OFFSET_TO_LASZIP_VLR_DATA))?;
//! #    Ok(())
//! # }
//! # fn main() -> Result<(), LasZipError> {
//! let mut laz_file = File::open("tests/data/point10.laz")?;
//! seek_to_start_of_laszip_record_data(&mut laz_file)?;
//!
//! let vlr = LazVlr::read_from(&mut laz_file)?;
//! let mut decompression_output = vec![0u8; vlr.items_size() as usize];
//! let mut decompressor = LasZipDecompressor::new(&mut laz_file, vlr)?;
//!
//! decompressor.decompress_one(&mut decompression_output)?;
//!
//! # Ok(())
//! # }
//! ```

pub(crate) mod byteslice;
pub(crate) mod compressors;
pub(crate) mod decoders;
pub(crate) mod decompressors;
pub(crate) mod encoders;
pub(crate) mod models;

pub mod compat;
pub mod container;
pub mod errors;
pub mod las;
pub mod laszip;
pub mod packers;
#[macro_use]
pub mod record;
pub mod reader;
pub mod writer;

pub use errors::LasZipError;
pub use las::selective::DecompressionSelection;
pub use laszip::{
    CompressorType, LasZipAppender, LasZipCompressor, LasZipDecompressor, LazItem,
    LazItemRecordBuilder, LazItemType, LazVlr, LazVlrBuilder,
};
pub use container::header::{Header, PointFormat};
pub use container::vlr::{Vlr, VlrHeader};
pub use reader::Reader;
pub use writer::Writer;

#[cfg(feature = "parallel")]
pub use laszip::parallel;

/// Convenience alias for results returned by this crate's fallible operations.
pub type Result<T> = std::result::Result<T, LasZipError>;
