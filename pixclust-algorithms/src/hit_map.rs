//! Occupancy and index maps for one event.
//!
//! The map is a dense 3D grid over (column, row, time bucket) allocated once
//! from the [`MapGeometry`]. Each occupied cell stores the TOT of its hit and
//! the position of that hit in the caller's input slice. Between events only
//! the touched column/row rectangle is cleared.

use pixclust_core::clustering::MapGeometry;
use pixclust_core::error::ClusteringError;

/// Inclusive column/row rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    /// Smallest column.
    pub min_column: u16,
    /// Largest column.
    pub max_column: u16,
    /// Smallest row.
    pub min_row: u16,
    /// Largest row.
    pub max_row: u16,
}

impl Bounds {
    fn point(column: u16, row: u16) -> Self {
        Self {
            min_column: column,
            max_column: column,
            min_row: row,
            max_row: row,
        }
    }

    fn extend(&mut self, column: u16, row: u16) {
        self.min_column = self.min_column.min(column);
        self.max_column = self.max_column.max(column);
        self.min_row = self.min_row.min(row);
        self.max_row = self.max_row.max(row);
    }
}

/// Reusable occupancy grid with a parallel hit index grid.
#[derive(Debug, Clone)]
pub struct HitMap {
    geometry: MapGeometry,
    /// Occupancy map: TOT of the hit in each cell.
    tot: Vec<Option<u16>>,
    /// Index map: input position of the hit in each occupied cell.
    index: Vec<usize>,
    occupied: usize,
    touched: Option<Bounds>,
}

impl HitMap {
    /// Allocates an empty map.
    #[must_use]
    pub fn new(geometry: MapGeometry) -> Self {
        let len = geometry.len();
        Self {
            geometry,
            tot: vec![None; len],
            index: vec![0; len],
            occupied: 0,
            touched: None,
        }
    }

    /// Map dimensions.
    #[must_use]
    pub fn geometry(&self) -> &MapGeometry {
        &self.geometry
    }

    /// Number of occupied cells.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.occupied
    }

    /// Returns true if no cell is occupied.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.occupied == 0
    }

    /// Rectangle covering every hit stored since the last reset.
    #[must_use]
    pub fn touched_bounds(&self) -> Option<Bounds> {
        self.touched
    }

    /// Linear cell index; `None` outside the map.
    #[inline]
    fn cell(&self, column: i32, row: i32, time_bucket: i32) -> Option<usize> {
        let column = usize::try_from(column).ok()?;
        let row = usize::try_from(row).ok()?;
        let time_bucket = usize::try_from(time_bucket).ok()?;
        let columns = usize::from(self.geometry.columns);
        let rows = usize::from(self.geometry.rows);
        if column >= columns || row >= rows || time_bucket >= usize::from(self.geometry.time_buckets)
        {
            return None;
        }
        Some((time_bucket * rows + row) * columns + column)
    }

    /// Stores a hit.
    ///
    /// # Errors
    /// [`ClusteringError::HitOutOfBounds`] if the coordinate is outside the
    /// map, [`ClusteringError::DuplicateHit`] if the cell is already occupied.
    /// The map is left unchanged in both cases.
    pub fn put(
        &mut self,
        column: u16,
        row: u16,
        time_bucket: i16,
        tot: u16,
        source_index: usize,
    ) -> Result<(), ClusteringError> {
        let cell = self
            .cell(i32::from(column), i32::from(row), i32::from(time_bucket))
            .ok_or(ClusteringError::HitOutOfBounds {
                index: source_index,
                column,
                row,
                time_bucket,
            })?;

        if self.tot[cell].is_some() {
            return Err(ClusteringError::DuplicateHit {
                column,
                row,
                time_bucket,
                first: self.index[cell],
                second: source_index,
            });
        }

        self.tot[cell] = Some(tot);
        self.index[cell] = source_index;
        self.occupied += 1;
        match &mut self.touched {
            Some(bounds) => bounds.extend(column, row),
            None => self.touched = Some(Bounds::point(column, row)),
        }
        Ok(())
    }

    /// Returns true if the cell holds a hit. Probes outside the map are empty.
    #[inline]
    #[must_use]
    pub fn exists(&self, column: i32, row: i32, time_bucket: i32) -> bool {
        self.get(column, row, time_bucket).is_some()
    }

    /// TOT and source index of the hit in the cell.
    #[inline]
    #[must_use]
    pub fn get(&self, column: i32, row: i32, time_bucket: i32) -> Option<(u16, usize)> {
        let cell = self.cell(column, row, time_bucket)?;
        self.tot[cell].map(|tot| (tot, self.index[cell]))
    }

    /// Removes the hit in the cell and returns its TOT and source index.
    #[inline]
    pub fn take(&mut self, column: i32, row: i32, time_bucket: i32) -> Option<(u16, usize)> {
        let cell = self.cell(column, row, time_bucket)?;
        let tot = self.tot[cell].take()?;
        self.occupied -= 1;
        Some((tot, self.index[cell]))
    }

    /// Removes the hit in the cell; returns true if the map is empty afterwards.
    pub fn remove(&mut self, column: i32, row: i32, time_bucket: i32) -> bool {
        self.take(column, row, time_bucket).is_some() && self.is_empty()
    }

    /// Clears the inclusive column/row rectangle in every time bucket.
    pub fn reset_range(&mut self, min_column: u16, max_column: u16, min_row: u16, max_row: u16) {
        let columns = usize::from(self.geometry.columns);
        let rows = usize::from(self.geometry.rows);
        if columns == 0 || rows == 0 || min_column > max_column || min_row > max_row {
            return;
        }
        let col_lo = usize::from(min_column).min(columns - 1);
        let col_hi = usize::from(max_column).min(columns - 1);
        let row_lo = usize::from(min_row).min(rows - 1);
        let row_hi = usize::from(max_row).min(rows - 1);

        for time_bucket in 0..usize::from(self.geometry.time_buckets) {
            for row in row_lo..=row_hi {
                let start = (time_bucket * rows + row) * columns;
                for slot in &mut self.tot[start + col_lo..=start + col_hi] {
                    if slot.take().is_some() {
                        self.occupied -= 1;
                    }
                }
            }
        }
    }

    /// Clears everything stored since the last reset.
    pub fn reset_touched(&mut self) {
        if let Some(bounds) = self.touched.take() {
            self.reset_range(
                bounds.min_column,
                bounds.max_column,
                bounds.min_row,
                bounds.max_row,
            );
        }
        debug_assert_eq!(self.occupied, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_map() -> HitMap {
        HitMap::new(MapGeometry::new(8, 6, 4, 16))
    }

    #[test]
    fn test_put_and_take() {
        let mut map = small_map();
        assert!(map.is_empty());

        map.put(2, 3, 1, 7, 0).unwrap();
        map.put(3, 3, 1, 5, 1).unwrap();
        assert_eq!(map.len(), 2);
        assert!(map.exists(2, 3, 1));
        assert!(!map.exists(2, 3, 0));
        assert_eq!(map.get(3, 3, 1), Some((5, 1)));

        assert_eq!(map.take(2, 3, 1), Some((7, 0)));
        assert_eq!(map.take(2, 3, 1), None);
        assert!(!map.exists(2, 3, 1));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_remove_reports_empty() {
        let mut map = small_map();
        map.put(1, 1, 0, 1, 0).unwrap();
        map.put(1, 2, 0, 1, 1).unwrap();

        assert!(!map.remove(1, 1, 0));
        assert!(!map.remove(1, 1, 0));
        assert!(map.remove(1, 2, 0));
        assert!(map.is_empty());
    }

    #[test]
    fn test_out_of_range_probes() {
        let mut map = small_map();
        map.put(0, 0, 0, 1, 0).unwrap();

        assert!(!map.exists(-1, 0, 0));
        assert!(!map.exists(0, -1, 0));
        assert!(!map.exists(0, 0, -1));
        assert!(!map.exists(8, 0, 0));
        assert!(!map.exists(0, 6, 0));
        assert!(!map.exists(0, 0, 4));
        assert_eq!(map.take(0, 0, 4), None);
    }

    #[test]
    fn test_put_rejects_out_of_bounds() {
        let mut map = small_map();
        assert_eq!(
            map.put(8, 0, 0, 1, 3),
            Err(ClusteringError::HitOutOfBounds {
                index: 3,
                column: 8,
                row: 0,
                time_bucket: 0
            })
        );
        assert!(map.put(0, 0, -1, 1, 4).is_err());
        assert!(map.put(0, 0, 4, 1, 5).is_err());
        assert!(map.is_empty());
        assert_eq!(map.touched_bounds(), None);
    }

    #[test]
    fn test_put_rejects_duplicate() {
        let mut map = small_map();
        map.put(4, 4, 2, 9, 0).unwrap();
        assert_eq!(
            map.put(4, 4, 2, 3, 5),
            Err(ClusteringError::DuplicateHit {
                column: 4,
                row: 4,
                time_bucket: 2,
                first: 0,
                second: 5
            })
        );
        assert_eq!(map.get(4, 4, 2), Some((9, 0)));
        assert_eq!(map.len(), 1);

        // Same pixel in another time bucket is a different cell.
        map.put(4, 4, 3, 3, 5).unwrap();
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_touched_bounds_and_reset() {
        let mut map = small_map();
        map.put(2, 5, 0, 1, 0).unwrap();
        map.put(6, 1, 3, 1, 1).unwrap();
        map.put(4, 3, 2, 1, 2).unwrap();

        assert_eq!(
            map.touched_bounds(),
            Some(Bounds {
                min_column: 2,
                max_column: 6,
                min_row: 1,
                max_row: 5
            })
        );

        map.reset_touched();
        assert!(map.is_empty());
        assert_eq!(map.touched_bounds(), None);
        assert!(!map.exists(2, 5, 0));
        assert!(!map.exists(6, 1, 3));

        // Cells are reusable after the reset.
        map.put(2, 5, 0, 4, 0).unwrap();
        assert_eq!(map.get(2, 5, 0), Some((4, 0)));
    }

    #[test]
    fn test_reset_range_is_partial() {
        let mut map = small_map();
        map.put(1, 1, 0, 1, 0).unwrap();
        map.put(1, 1, 3, 1, 1).unwrap();
        map.put(5, 5, 1, 1, 2).unwrap();

        map.reset_range(0, 2, 0, 2);
        assert_eq!(map.len(), 1);
        assert!(!map.exists(1, 1, 0));
        assert!(!map.exists(1, 1, 3));
        assert!(map.exists(5, 5, 1));
    }
}
