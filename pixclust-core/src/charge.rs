//! Charge calibration lookup.
//!
//! A [`ChargeLookup`] is provided by the calibration step and maps a pixel
//! and its TOT code to a charge estimate. The clusterizer copies it into a
//! dense [`ChargeMap`] it owns, so lookups during clustering are a single
//! indexed load.

use crate::clustering::MapGeometry;

/// Charge estimate as a function of pixel and TOT code.
pub trait ChargeLookup {
    /// Returns the charge for a hit at (`column`, `row`) with the given TOT.
    fn charge(&self, column: u16, row: u16, tot: u16) -> f32;
}

impl<F> ChargeLookup for F
where
    F: Fn(u16, u16, u16) -> f32,
{
    #[inline]
    fn charge(&self, column: u16, row: u16, tot: u16) -> f32 {
        self(column, row, tot)
    }
}

/// Dense charge table covering every pixel and TOT code of a geometry.
///
/// TOT codes beyond the table saturate to the last bin.
#[derive(Debug, Clone)]
pub struct ChargeMap {
    columns: usize,
    rows: usize,
    tot_bins: usize,
    values: Vec<f32>,
}

impl ChargeMap {
    /// Creates a table filled with zeros.
    #[must_use]
    pub fn new(geometry: &MapGeometry) -> Self {
        let columns = usize::from(geometry.columns);
        let rows = usize::from(geometry.rows);
        let tot_bins = usize::from(geometry.tot_bins);
        Self {
            columns,
            rows,
            tot_bins,
            values: vec![0.0; columns * rows * tot_bins],
        }
    }

    /// Fills the table from an external lookup.
    #[allow(clippy::cast_possible_truncation)]
    pub fn fill<L: ChargeLookup + ?Sized>(&mut self, lookup: &L) {
        let mut idx = 0;
        for column in 0..self.columns {
            for row in 0..self.rows {
                for tot in 0..self.tot_bins {
                    self.values[idx] = lookup.charge(column as u16, row as u16, tot as u16);
                    idx += 1;
                }
            }
        }
    }

    /// Returns true if the table covers exactly the pixels and TOT codes of
    /// `geometry`.
    #[must_use]
    pub fn fits(&self, geometry: &MapGeometry) -> bool {
        self.columns == usize::from(geometry.columns)
            && self.rows == usize::from(geometry.rows)
            && self.tot_bins == usize::from(geometry.tot_bins)
    }

    /// Resets every entry to zero.
    pub fn clear(&mut self) {
        self.values.fill(0.0);
    }

    #[inline]
    fn index(&self, column: u16, row: u16, tot: u16) -> Option<usize> {
        let column = usize::from(column);
        let row = usize::from(row);
        if column >= self.columns || row >= self.rows || self.tot_bins == 0 {
            return None;
        }
        let tot = usize::from(tot).min(self.tot_bins - 1);
        Some((column * self.rows + row) * self.tot_bins + tot)
    }
}

impl ChargeLookup for ChargeMap {
    #[inline]
    fn charge(&self, column: u16, row: u16, tot: u16) -> f32 {
        self.index(column, row, tot)
            .map_or(0.0, |idx| self.values[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fill_from_closure() {
        let geometry = MapGeometry::new(4, 3, 1, 8);
        let mut map = ChargeMap::new(&geometry);
        assert_relative_eq!(map.charge(1, 1, 1), 0.0);

        map.fill(&|column: u16, row: u16, tot: u16| {
            f32::from(column) * 100.0 + f32::from(row) * 10.0 + f32::from(tot)
        });
        assert_relative_eq!(map.charge(3, 2, 5), 325.0);
        assert_relative_eq!(map.charge(0, 0, 0), 0.0);
    }

    #[test]
    fn test_tot_saturates_and_bounds() {
        let geometry = MapGeometry::new(2, 2, 1, 4);
        let mut map = ChargeMap::new(&geometry);
        map.fill(&|_: u16, _: u16, tot: u16| f32::from(tot) + 1.0);

        assert_relative_eq!(map.charge(1, 1, 3), 4.0);
        assert_relative_eq!(map.charge(1, 1, 200), 4.0);
        assert_relative_eq!(map.charge(2, 0, 1), 0.0);

        map.clear();
        assert_relative_eq!(map.charge(1, 1, 3), 0.0);
    }

    #[test]
    fn test_fits_geometry() {
        let geometry = MapGeometry::new(4, 3, 2, 8);
        let map = ChargeMap::new(&geometry);
        assert!(map.fits(&geometry));
        // Time buckets do not shape the table.
        assert!(map.fits(&MapGeometry::new(4, 3, 16, 8)));
        assert!(!map.fits(&MapGeometry::new(4, 3, 2, 16)));
        assert!(!map.fits(&MapGeometry::new(5, 3, 2, 8)));
    }
}
