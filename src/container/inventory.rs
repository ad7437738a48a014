//! Running counters a writer keeps while points stream past it, so the
//! header can be patched in one shot at `close` instead of requiring a
//! second pass over the data.

use crate::container::header::{ExtendedCounts, Header};

/// Per-return and bounding-box bookkeeping, updated incrementally as each
/// point is written.
#[derive(Debug, Clone, PartialEq)]
pub struct Inventory {
    total_points: u64,
    points_by_return: [u64; 15],
    min_x: f64,
    max_x: f64,
    min_y: f64,
    max_y: f64,
    min_z: f64,
    max_z: f64,
    min_gps_time: f64,
    max_gps_time: f64,
    min_intensity: u16,
    max_intensity: u16,
}

impl Default for Inventory {
    fn default() -> Self {
        Self {
            total_points: 0,
            points_by_return: [0u64; 15],
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            min_y: f64::INFINITY,
            max_y: f64::NEG_INFINITY,
            min_z: f64::INFINITY,
            max_z: f64::NEG_INFINITY,
            min_gps_time: f64::INFINITY,
            max_gps_time: f64::NEG_INFINITY,
            min_intensity: u16::MAX,
            max_intensity: 0,
        }
    }
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one point's fields into the running counters. `return_number`
    /// is 1-based as stored on disk; out of range values are clamped into
    /// the last bucket rather than rejected, matching how overflowing
    /// return counts are tracked on the legacy 5-slot header fields.
    #[allow(clippy::too_many_arguments)]
    pub fn add_point(
        &mut self,
        x: f64,
        y: f64,
        z: f64,
        return_number: u8,
        gps_time: Option<f64>,
        intensity: u16,
    ) {
        self.total_points += 1;

        let bucket = return_number.saturating_sub(1).min(14) as usize;
        self.points_by_return[bucket] += 1;

        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
        self.min_z = self.min_z.min(z);
        self.max_z = self.max_z.max(z);

        if let Some(t) = gps_time {
            self.min_gps_time = self.min_gps_time.min(t);
            self.max_gps_time = self.max_gps_time.max(t);
        }

        self.min_intensity = self.min_intensity.min(intensity);
        self.max_intensity = self.max_intensity.max(intensity);
    }

    pub fn total_points(&self) -> u64 {
        self.total_points
    }

    pub fn bounds(&self) -> ([f64; 3], [f64; 3]) {
        if self.total_points == 0 {
            ([0.0, 0.0, 0.0], [0.0, 0.0, 0.0])
        } else {
            (
                [self.min_x, self.min_y, self.min_z],
                [self.max_x, self.max_y, self.max_z],
            )
        }
    }

    pub fn gps_time_bounds(&self) -> Option<(f64, f64)> {
        if self.min_gps_time.is_finite() {
            Some((self.min_gps_time, self.max_gps_time))
        } else {
            None
        }
    }

    pub fn intensity_bounds(&self) -> (u16, u16) {
        if self.total_points == 0 {
            (0, 0)
        } else {
            (self.min_intensity, self.max_intensity)
        }
    }

    /// Patches `header`'s point counts and bounding box in place. The four
    /// fields (extended count, legacy count, per-return counters, bounding
    /// box) are written together so a caller never observes a partially
    /// updated header.
    pub fn patch_header(&self, header: &mut Header) {
        let (min, max) = self.bounds();

        header.number_of_point_records = self.total_points.min(u64::from(u32::MAX)) as u32;
        for (slot, count) in header.number_of_points_by_return.iter_mut().zip(&self.points_by_return[..5]) {
            *slot = (*count).min(u64::from(u32::MAX)) as u32;
        }

        if header.version.has_extended_point_counts() {
            header.extended_counts = Some(ExtendedCounts {
                number_of_point_records: self.total_points,
                number_of_points_by_return: self.points_by_return,
            });
        }

        header.min_x = min[0];
        header.min_y = min[1];
        header.min_z = min[2];
        header.max_x = max[0];
        header.max_y = max[1];
        header.max_z = max[2];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_bounds_and_counts() {
        let mut inventory = Inventory::new();
        inventory.add_point(1.0, 2.0, 3.0, 1, Some(10.0), 100);
        inventory.add_point(-1.0, 5.0, 0.0, 2, Some(20.0), 50);

        assert_eq!(inventory.total_points(), 2);
        assert_eq!(inventory.bounds(), ([-1.0, 2.0, 0.0], [1.0, 5.0, 3.0]));
        assert_eq!(inventory.gps_time_bounds(), Some((10.0, 20.0)));
        assert_eq!(inventory.intensity_bounds(), (50, 100));
    }

    #[test]
    fn patches_header_atomically() {
        let mut inventory = Inventory::new();
        inventory.add_point(0.0, 0.0, 0.0, 1, None, 0);
        let mut header = Header::default();
        inventory.patch_header(&mut header);
        assert_eq!(header.number_of_point_records, 1);
        assert_eq!(header.number_of_points_by_return[0], 1);
    }
}
