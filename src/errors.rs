//! Definitions of error related things.

use thiserror::Error;

use crate::laszip::{CompressorType, LazItemType};

/// Errors of this crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LasZipError {
    /// The Laz item is not known.
    #[error("Item with type code: {0} is unknown")]
    UnknownLazItem(u16),
    /// The compression version used for the item is not supported.
    #[error("Item {0:?} with compression version: {1} is not supported")]
    UnsupportedLazItemVersion(LazItemType, u16),
    /// The type of compressor used is not known.
    #[error("Compressor type {0} is not valid")]
    UnknownCompressorType(u16),
    /// The type of compressor exists but it is not supported.
    #[error("Compressor type {0:?} is not supported")]
    UnsupportedCompressorType(CompressorType),
    /// The point format id is not supported.
    #[error("Point format {0} is not supported")]
    UnsupportedPointFormat(u8),
    /// The first four bytes of the file are not `LASF`.
    #[error("File signature is not 'LASF'")]
    BadMagic,
    /// The LAS/LAZ version recorded in the header is not one this crate can read.
    #[error("LAS version {0}.{1} is not supported")]
    UnsupportedVersion(u8, u8),
    /// A value read from the stream violates the format's own invariants.
    #[error("Corrupt stream: {0}")]
    CorruptStream(&'static str),
    /// A header field failed to validate against the rest of the header.
    #[error("Invalid header: {0}")]
    InvalidHeader(&'static str),
    /// An arithmetic computation on a length or offset over/underflowed.
    #[error("Integer overflow while computing: {0}")]
    IntegerOverflow(&'static str),
    /// Wrapper around an io error from the std lib.
    #[error("IoError: {0}")]
    IoError(#[from] std::io::Error),
    #[error("The len of the buffer ({buffer_len}) is not a multiple of the point size {point_size}")]
    BufferLenNotMultipleOfPointSize {
        buffer_len: usize,
        point_size: usize,
    },
    /// The chunk table could not be found in the file and it is required for
    /// the operation.
    #[error("The chunk table could not be found")]
    MissingChunkTable,
}
