//! The non-point-data half of a LAS/LAZ file: the fixed header, the VLR/EVLR
//! tables, and the ancillary sidecars (tiling, spatial index) that hang off
//! them.

pub mod header;
pub mod inventory;
pub mod spatial_index;
pub mod tiling;
pub mod vlr;

pub use header::{Header, PointFormat, Version};
pub use inventory::Inventory;
pub use vlr::{Vlr, VlrHeader};

use crate::Result;

/// user_id / record_id private to this implementation's lineage: consumed
/// on load and not re-emitted on save unless the caller asks to preserve
/// them (see [`Vlrs::retain_public`]).
const PRIVATE_VLRS: &[(&str, u16)] = &[
    ("laszip encoded", 22204),
    ("lascompatible", 22204),
    ("LAStools", 10),
];

/// user_id / record_id of the COPC spatial-indexing EVLRs.
const COPC_VLRS: &[(&str, u16)] = &[("copc", 1), ("copc", 10000)];

/// The VLR and EVLR tables of a file, with the lookups §4.G needs.
#[derive(Debug, Clone, Default)]
pub struct Vlrs {
    pub vlrs: Vec<Vlr>,
    pub evlrs: Vec<Vlr>,
}

impl Vlrs {
    pub fn get(&self, user_id: &str, record_id: u16) -> Option<&Vlr> {
        self.vlrs
            .iter()
            .chain(self.evlrs.iter())
            .find(|v| v.matches(user_id, record_id))
    }

    pub fn add(&mut self, user_id: &str, record_id: u16, description: &str, data: Vec<u8>) {
        self.remove(user_id, record_id);
        self.vlrs.push(Vlr::new(user_id, record_id, description, data));
    }

    pub fn remove(&mut self, user_id: &str, record_id: u16) {
        self.vlrs.retain(|v| !v.matches(user_id, record_id));
        self.evlrs.retain(|v| !v.matches(user_id, record_id));
    }

    /// True when `user_id`/`record_id` names a VLR this implementation owns
    /// the lifecycle of, and that should not be silently carried over to a
    /// re-saved file.
    pub fn is_private(user_id: &str, record_id: u16) -> bool {
        PRIVATE_VLRS
            .iter()
            .any(|(id, rid)| *id == user_id && *rid == record_id)
    }

    pub fn is_copc(user_id: &str, record_id: u16) -> bool {
        COPC_VLRS
            .iter()
            .any(|(id, rid)| *id == user_id && *rid == record_id)
    }

    /// Drops the private VLRs that `save` would otherwise re-emit stale
    /// copies of. `keep_copc` controls whether COPC indexing EVLRs survive
    /// the strip, letting a caller turn an indexed COPC file into a plain
    /// LAZ file by passing `false`.
    pub fn retain_public(&mut self, keep_copc: bool) {
        self.vlrs
            .retain(|v| !Vlrs::is_private(v.user_id(), v.header.record_id));
        self.evlrs.retain(|v| {
            !Vlrs::is_private(v.user_id(), v.header.record_id)
                && (keep_copc || !Vlrs::is_copc(v.user_id(), v.header.record_id))
        });
    }

    pub fn total_vlr_bytes(&self) -> u64 {
        self.vlrs.iter().map(Vlr::vlr_len).sum()
    }
}

/// Computes `offset_to_point_data` for a header with no extra user-data
/// padding before or after the VLR table: `header_size + sum(vlr_len)`.
pub fn offset_to_point_data(header: &Header, vlrs: &Vlrs) -> Result<u32> {
    let total = u64::from(header.header_size) + vlrs.total_vlr_bytes();
    u32::try_from(total).map_err(|_| crate::LasZipError::IntegerOverflow("offset_to_point_data"))
}
