//! Down-converts v1.4 extended point records (formats 6..10) into their
//! legacy counterparts (1 or 3) so they can be stored in a v1.2-style file,
//! and reverses the transform on read.
//!
//! The extended record's Core14 fields don't fit in Core10 + GpsTime11: the
//! return number/number of returns are 4 bits wider, the scan angle is a
//! `i16` instead of an `i8`, there's a dedicated scanner channel, and the
//! classification byte carries extra flag bits. Those are stashed into three
//! extra-byte attributes appended after the legacy record, and a marker VLR
//! records that the stash happened.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::container::vlr::Vlr;
use crate::las::gps::LasGpsTime;
use crate::las::point0::LasPoint0;
use crate::las::point6::LasPoint6;
use crate::las::rgb::LasRGB;
use crate::Result;

pub const MARKER_USER_ID: &str = "lascompatible";
pub const MARKER_RECORD_ID: u16 = 22204;

/// The extended-only bits of a Core14 record, stashed as extra bytes when
/// writing into a legacy (Core10) point format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StashedFields {
    pub extended_return_number: u8,
    pub extended_number_of_returns: u8,
    pub extended_classification: u8,
    pub extended_scan_angle: i16,
    pub scanner_channel: u8,
    pub extended_flags: u8,
}

impl StashedFields {
    pub const ENCODED_LEN: usize = 5;

    /// Packs the stash into the fixed 5-byte layout appended to a
    /// compatibility-transformed legacy record.
    pub fn encode(&self) -> [u8; Self::ENCODED_LEN] {
        let mut out = [0u8; Self::ENCODED_LEN];
        out[0] = (self.extended_return_number << 4) | self.extended_number_of_returns;
        out[1] = self.extended_classification;
        let mut cursor = &mut out[2..4];
        cursor
            .write_i16::<LittleEndian>(self.extended_scan_angle)
            .expect("2-byte slice always fits an i16");
        out[4] = (self.scanner_channel << 4) | (self.extended_flags & 0x0f);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::ENCODED_LEN {
            return Err(crate::LasZipError::CorruptStream(
                "compatibility stash is not 5 bytes",
            ));
        }
        let mut scan_angle = &bytes[2..4];
        Ok(Self {
            extended_return_number: bytes[0] >> 4,
            extended_number_of_returns: bytes[0] & 0x0f,
            extended_classification: bytes[1],
            extended_scan_angle: scan_angle.read_i16::<LittleEndian>()?,
            scanner_channel: bytes[4] >> 4,
            extended_flags: bytes[4] & 0x0f,
        })
    }
}

/// Builds the marker VLR that signals a file's legacy-format points carry a
/// compatibility stash in their trailing extra bytes.
pub fn marker_vlr() -> Vlr {
    Vlr::new(
        MARKER_USER_ID,
        MARKER_RECORD_ID,
        "extended fields stashed as extra bytes",
        Vec::new(),
    )
}

pub fn has_marker(vlrs: &[Vlr]) -> bool {
    vlrs.iter().any(|v| v.matches(MARKER_USER_ID, MARKER_RECORD_ID))
}

/// Down-converts an extended point format id (6..10) to the legacy format it
/// can be losslessly represented in once [`StashedFields`] are appended:
/// format 6/9/10 become 1, format 7/8 become 3 (both carry RGB).
pub fn legacy_format_for(extended_format_id: u8) -> Result<u8> {
    match extended_format_id {
        6 | 9 | 10 => Ok(1),
        7 | 8 => Ok(3),
        other => Err(crate::LasZipError::UnsupportedPointFormat(other)),
    }
}

/// Copies an extended (Core14) point onto a legacy (Core10 + GpsTime11)
/// point, returning the extended-only bits the legacy record can't hold.
///
/// RGB and GPS time are copied as-is: both formats represent them
/// identically. NIR has no legacy counterpart and isn't handled here; point
/// formats 8 and 10 can't be round-tripped through compatibility mode by
/// this function alone.
pub fn downconvert_point<E, L>(extended: &E, legacy: &mut L) -> StashedFields
where
    E: LasPoint6 + LasRGB + ?Sized,
    L: LasPoint0 + LasGpsTime + LasRGB + ?Sized,
{
    legacy.set_x(extended.x());
    legacy.set_y(extended.y());
    legacy.set_z(extended.z());
    legacy.set_intensity(extended.intensity());
    legacy.set_user_data(extended.user_data());
    legacy.set_point_source_id(extended.point_source_id());
    legacy.set_gps_time(extended.gps_time());
    legacy.set_red(extended.red());
    legacy.set_green(extended.green());
    legacy.set_blue(extended.blue());

    let return_number = extended.return_number().min(0x7);
    let number_of_returns = extended.number_of_returns_of_given_pulse().min(0x7);
    let bit_fields = (extended.edge_of_flight_line() as u8) << 7
        | (extended.scan_direction_flag() as u8) << 6
        | (number_of_returns << 3)
        | return_number;
    legacy.set_bit_fields(bit_fields);

    let synthetic = extended.classification_flags() & 0x1 != 0;
    let key_point = extended.classification_flags() & 0x2 != 0;
    let withheld = extended.classification_flags() & 0x4 != 0;
    legacy.set_classification(
        (extended.classification() & 0x1f)
            | (synthetic as u8) << 5
            | (key_point as u8) << 6
            | (withheld as u8) << 7,
    );

    legacy.set_scan_angle_rank(
        extended
            .scan_angle_rank()
            .clamp(i16::from(i8::MIN), i16::from(i8::MAX)) as i8,
    );

    StashedFields {
        extended_return_number: extended.return_number(),
        extended_number_of_returns: extended.number_of_returns_of_given_pulse(),
        extended_classification: extended.classification(),
        extended_scan_angle: extended.scan_angle_rank(),
        scanner_channel: extended.scanner_channel(),
        extended_flags: extended.classification_flags(),
    }
}

/// Reverses [`downconvert_point`]: restores a legacy point plus its stash
/// back into an extended point, recovering the exact original extended
/// record (NIR aside, see [`downconvert_point`]).
pub fn upconvert_point<L, E>(legacy: &L, stash: &StashedFields, extended: &mut E)
where
    L: LasPoint0 + LasGpsTime + LasRGB + ?Sized,
    E: LasPoint6 + LasRGB + ?Sized,
{
    extended.set_x(legacy.x());
    extended.set_y(legacy.y());
    extended.set_z(legacy.z());
    extended.set_intensity(legacy.intensity());
    extended.set_user_data(legacy.user_data());
    extended.set_point_source_id(legacy.point_source_id());
    extended.set_gps_time(legacy.gps_time());
    extended.set_red(legacy.red());
    extended.set_green(legacy.green());
    extended.set_blue(legacy.blue());

    extended.set_return_number(stash.extended_return_number);
    extended.set_number_of_returns(stash.extended_number_of_returns);
    extended.set_classification(stash.extended_classification);
    extended.set_scan_angle_rank(stash.extended_scan_angle);

    let flags = (legacy.edge_of_flight_line() as u8) << 7
        | (legacy.scan_direction_flag() as u8) << 6
        | (stash.scanner_channel & 0x3) << 4
        | (stash.extended_flags & 0x0f);
    extended.set_flags(flags);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stash_round_trips() {
        let stash = StashedFields {
            extended_return_number: 9,
            extended_number_of_returns: 12,
            extended_classification: 200,
            extended_scan_angle: -12000,
            scanner_channel: 3,
            extended_flags: 0b0101,
        };
        let encoded = stash.encode();
        let decoded = StashedFields::decode(&encoded).unwrap();
        assert_eq!(decoded, stash);
    }

    #[test]
    fn legacy_format_mapping() {
        assert_eq!(legacy_format_for(6).unwrap(), 1);
        assert_eq!(legacy_format_for(9).unwrap(), 1);
        assert_eq!(legacy_format_for(7).unwrap(), 3);
        assert_eq!(legacy_format_for(8).unwrap(), 3);
        assert!(legacy_format_for(0).is_err());
    }

    #[test]
    fn marker_vlr_is_recognized() {
        let vlrs = vec![marker_vlr()];
        assert!(has_marker(&vlrs));
        assert!(!has_marker(&[]));
    }

    #[test]
    fn extended_point_round_trips_through_compatibility_mode() {
        use crate::las::{Point3, Point7};

        let mut extended = Point7::default();
        extended.set_x(123_456);
        extended.set_y(-98_765);
        extended.set_z(4_321);
        extended.set_intensity(777);
        extended.set_user_data(42);
        extended.set_point_source_id(9001);
        extended.set_gps_time(1234.5678);
        extended.set_red(1000);
        extended.set_green(2000);
        extended.set_blue(3000);
        extended.set_return_number(9);
        extended.set_number_of_returns(12);
        extended.set_classification(250);
        extended.set_scan_angle_rank(-12_000);
        // scanner_channel = 2, classification_flags = 0b0101, scan_direction_flag
        // and edge_of_flight_line both set.
        extended.set_flags(0b1110_0101);

        let mut legacy = Point3::default();
        let stash = downconvert_point(&extended, &mut legacy);

        // Fields common to both formats come through untouched.
        assert_eq!(legacy.x(), extended.x());
        assert_eq!(legacy.y(), extended.y());
        assert_eq!(legacy.z(), extended.z());
        assert_eq!(legacy.intensity(), extended.intensity());
        assert_eq!(legacy.user_data(), extended.user_data());
        assert_eq!(legacy.point_source_id(), extended.point_source_id());
        assert_eq!(legacy.gps_time(), extended.gps_time());
        assert_eq!(legacy.red(), extended.red());
        assert_eq!(legacy.green(), extended.green());
        assert_eq!(legacy.blue(), extended.blue());

        // Return counts are truncated to what the legacy record can hold.
        assert_eq!(legacy.return_number(), 7);
        assert_eq!(legacy.number_of_returns_of_given_pulse(), 7);
        assert!(legacy.scan_direction_flag());
        assert!(legacy.edge_of_flight_line());

        // The stash carries the bits the legacy record can't.
        assert_eq!(stash.extended_return_number, 9);
        assert_eq!(stash.extended_number_of_returns, 12);
        assert_eq!(stash.extended_classification, 250);
        assert_eq!(stash.extended_scan_angle, -12_000);
        assert_eq!(stash.scanner_channel, 2);
        assert_eq!(stash.extended_flags, 0b0101);

        let mut restored = Point7::default();
        upconvert_point(&legacy, &stash, &mut restored);
        assert_eq!(restored, extended);
    }
}
