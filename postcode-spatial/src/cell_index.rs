//! Sorted cell index over a uniform lon/lat grid.
//!
//! The index maps grid cells to subjects (postcode or area slots). Cell ids
//! are row-major (`row * columns + column`, rows counted up from -90°,
//! columns east from -180°), so every run of cells along one grid row is a
//! contiguous id range. Entries are sorted by `(cell_id, subject)`, which
//! allows:
//! - range scans for one grid row of a covering in a single binary search
//! - deterministic scan order for identical store state

use crate::geometry::BBox;
use std::cmp::Ordering;

/// A single entry in the cell index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellEntry {
    /// Grid cell id (row-major).
    pub cell_id: u64,

    /// Slot of the indexed record in the store.
    pub subject: u32,
}

impl CellEntry {
    /// Create a new cell entry.
    pub fn new(cell_id: u64, subject: u32) -> Self {
        Self { cell_id, subject }
    }

    /// Compare for index ordering: (cell_id, subject).
    pub fn cmp_index(&self, other: &Self) -> Ordering {
        self.cell_id
            .cmp(&other.cell_id)
            .then(self.subject.cmp(&other.subject))
    }
}

/// Column/row position of a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    pub column: i64,
    pub row: i64,
}

/// Uniform lon/lat grid.
#[derive(Debug, Clone, Copy)]
pub struct CellGrid {
    cell_size: f64,
    columns: i64,
    rows: i64,
}

impl CellGrid {
    /// Create a grid with square cells of `cell_size` degrees.
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            columns: (360.0 / cell_size).ceil() as i64,
            rows: (180.0 / cell_size).ceil() as i64,
        }
    }

    /// Cell size in degrees.
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn columns(&self) -> i64 {
        self.columns
    }

    pub fn rows(&self) -> i64 {
        self.rows
    }

    /// Cell containing a lon/lat coordinate (clamped onto the grid).
    pub fn cell_at(&self, lng: f64, lat: f64) -> GridCell {
        let column = ((lng + 180.0) / self.cell_size).floor() as i64;
        let row = ((lat + 90.0) / self.cell_size).floor() as i64;
        GridCell {
            column: column.clamp(0, self.columns - 1),
            row: row.clamp(0, self.rows - 1),
        }
    }

    /// Row-major cell id. The cell must lie on the grid.
    pub fn cell_id(&self, cell: GridCell) -> u64 {
        (cell.row * self.columns + cell.column) as u64
    }

    /// Column/row of a cell id.
    pub fn position(&self, cell_id: u64) -> GridCell {
        let id = cell_id as i64;
        GridCell {
            column: id % self.columns,
            row: id / self.columns,
        }
    }

    /// Check a column/row pair lies on the grid.
    pub fn on_grid(&self, column: i64, row: i64) -> bool {
        (0..self.columns).contains(&column) && (0..self.rows).contains(&row)
    }

    /// Cells covering a bounding box, as inclusive cell-id ranges (one per row).
    pub fn covering(&self, bbox: &BBox) -> Vec<(u64, u64)> {
        let lo = self.cell_at(bbox.min_lng, bbox.min_lat);
        let hi = self.cell_at(bbox.max_lng, bbox.max_lat);
        (lo.row..=hi.row)
            .map(|row| {
                (
                    self.cell_id(GridCell {
                        column: lo.column,
                        row,
                    }),
                    self.cell_id(GridCell {
                        column: hi.column,
                        row,
                    }),
                )
            })
            .collect()
    }

    /// Number of cells covering a bounding box.
    pub fn covering_size(&self, bbox: &BBox) -> u64 {
        let lo = self.cell_at(bbox.min_lng, bbox.min_lat);
        let hi = self.cell_at(bbox.max_lng, bbox.max_lat);
        ((hi.row - lo.row + 1) * (hi.column - lo.column + 1)) as u64
    }
}

/// Builder that accumulates unsorted entries.
#[derive(Default)]
pub struct CellIndexBuilder {
    entries: Vec<CellEntry>,
}

impl CellIndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: CellEntry) {
        self.entries.push(entry);
    }

    /// Add `subject` to every cell of the given id ranges.
    pub fn push_ranges(&mut self, ranges: &[(u64, u64)], subject: u32) {
        for &(min_cell, max_cell) in ranges {
            for cell_id in min_cell..=max_cell {
                self.entries.push(CellEntry::new(cell_id, subject));
            }
        }
    }

    /// Sort, drop duplicates and freeze.
    pub fn build(mut self, grid: CellGrid) -> CellIndex {
        self.entries.sort_by(|a, b| a.cmp_index(b));
        self.entries.dedup();

        let extent = self.entries.iter().fold(None, |acc: Option<GridExtent>, e| {
            let cell = grid.position(e.cell_id);
            Some(match acc {
                None => GridExtent {
                    min: cell,
                    max: cell,
                },
                Some(ext) => ext.including(cell),
            })
        });

        CellIndex {
            grid,
            entries: self.entries,
            extent,
        }
    }
}

/// Smallest column/row rectangle holding every indexed cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridExtent {
    pub min: GridCell,
    pub max: GridCell,
}

impl GridExtent {
    fn including(self, cell: GridCell) -> Self {
        Self {
            min: GridCell {
                column: self.min.column.min(cell.column),
                row: self.min.row.min(cell.row),
            },
            max: GridCell {
                column: self.max.column.max(cell.column),
                row: self.max.row.max(cell.row),
            },
        }
    }

    /// Chebyshev ring distance from `cell` to the nearest cell in the extent.
    pub fn ring_distance_to(&self, cell: GridCell) -> i64 {
        let dc = (self.min.column - cell.column)
            .max(cell.column - self.max.column)
            .max(0);
        let dr = (self.min.row - cell.row).max(cell.row - self.max.row).max(0);
        dc.max(dr)
    }

    /// Chebyshev ring distance from `cell` to the farthest cell in the extent.
    pub fn ring_span_from(&self, cell: GridCell) -> i64 {
        let dc = (cell.column - self.min.column)
            .abs()
            .max((self.max.column - cell.column).abs());
        let dr = (cell.row - self.min.row)
            .abs()
            .max((self.max.row - cell.row).abs());
        dc.max(dr)
    }

    pub fn contains_column(&self, column: i64) -> bool {
        (self.min.column..=self.max.column).contains(&column)
    }
}

/// Immutable sorted cell index.
pub struct CellIndex {
    grid: CellGrid,
    entries: Vec<CellEntry>,
    extent: Option<GridExtent>,
}

impl CellIndex {
    pub fn grid(&self) -> &CellGrid {
        &self.grid
    }

    /// Extent of the indexed cells, `None` when the index is empty.
    pub fn extent(&self) -> Option<GridExtent> {
        self.extent
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries with `min_cell <= cell_id <= max_cell`, using binary search.
    pub fn scan_range(&self, min_cell: u64, max_cell: u64) -> &[CellEntry] {
        if self.entries.is_empty() || min_cell > max_cell {
            return &[];
        }

        // Find first entry with cell_id >= min_cell
        let start = self.entries.partition_point(|e| e.cell_id < min_cell);
        // Find first entry with cell_id > max_cell
        let end = self.entries[start..].partition_point(|e| e.cell_id <= max_cell) + start;

        &self.entries[start..end]
    }

    /// Entries in one grid cell.
    pub fn scan_cell(&self, cell: GridCell) -> &[CellEntry] {
        let id = self.grid.cell_id(cell);
        self.scan_range(id, id)
    }

    /// Entries in the square ring of cells at Chebyshev distance `ring`
    /// around `center`, restricted to the index extent.
    pub fn scan_ring(&self, center: GridCell, ring: i64) -> Vec<&[CellEntry]> {
        let Some(extent) = self.extent else {
            return Vec::new();
        };

        let mut slices = Vec::new();
        let first_row = (center.row - ring).max(extent.min.row);
        let last_row = (center.row + ring).min(extent.max.row);
        let min_col = (center.column - ring).max(extent.min.column);
        let max_col = (center.column + ring).min(extent.max.column);

        for row in first_row..=last_row {
            if row == center.row - ring || row == center.row + ring {
                // Top/bottom edge: one contiguous run of the row
                if min_col <= max_col {
                    let lo = self.grid.cell_id(GridCell {
                        column: min_col,
                        row,
                    });
                    let hi = self.grid.cell_id(GridCell {
                        column: max_col,
                        row,
                    });
                    slices.push(self.scan_range(lo, hi));
                }
            } else {
                // Side edges: the two end cells of the row
                for column in [center.column - ring, center.column + ring] {
                    if extent.contains_column(column) && self.grid.on_grid(column, row) {
                        slices.push(self.scan_cell(GridCell { column, row }));
                    }
                }
            }
        }

        slices.retain(|s| !s.is_empty());
        slices
    }
}
