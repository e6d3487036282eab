//! Board grid, enemy path and the generators that produce them.

use path_defence_core::{CellCoord, MapKind, TowerKind};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Columns of the standard board.
pub const STANDARD_COLUMNS: u32 = 26;

/// Rows of the standard board.
pub const STANDARD_ROWS: u32 = 26;

/// Marker stored for every board cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellMarker {
    /// Free cell where towers may be built.
    Empty,
    /// Cell traversed by the enemy path.
    Path,
    /// First cell of the path.
    Start,
    /// Last cell of the path, defended by the player.
    Base,
    /// Cell occupied by a tower of the provided kind.
    Tower(TowerKind),
}

impl CellMarker {
    /// Reports whether the marker belongs to the enemy path.
    #[must_use]
    pub const fn is_path(self) -> bool {
        matches!(self, Self::Path | Self::Start | Self::Base)
    }
}

/// Reasons a board or path description is rejected.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    /// The board is too small to hold a path.
    #[error("board of {columns}x{rows} cells is too small")]
    BoardTooSmall {
        /// Requested column count.
        columns: u32,
        /// Requested row count.
        rows: u32,
    },
    /// The path has fewer than two cells.
    #[error("path needs at least two cells, found {len}")]
    PathTooShort {
        /// Number of cells supplied.
        len: usize,
    },
    /// A path cell lies outside the board.
    #[error("path cell ({column}, {row}) lies outside the board")]
    OutOfBounds {
        /// Column of the offending cell.
        column: u32,
        /// Row of the offending cell.
        row: u32,
    },
    /// Two consecutive path cells are not neighbours.
    #[error("path breaks after cell {index}")]
    Disconnected {
        /// Index of the first cell of the broken pair.
        index: usize,
    },
    /// The path begins where it ends.
    #[error("path start and base must differ")]
    StartIsBase,
}

/// Static board plus the ordered path enemies follow from start to base.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapLayout {
    kind: Option<MapKind>,
    columns: u32,
    rows: u32,
    path: Vec<CellCoord>,
    markers: Vec<CellMarker>,
}

impl MapLayout {
    /// Builds the standard 26x26 board for the provided generator.
    #[must_use]
    pub fn standard(kind: MapKind, seed: u64) -> Self {
        let path = generate_path(kind, STANDARD_COLUMNS, STANDARD_ROWS, seed);
        Self::from_trusted_path(Some(kind), STANDARD_COLUMNS, STANDARD_ROWS, path)
    }

    /// Builds a board of arbitrary size for the provided generator.
    pub fn generate(kind: MapKind, columns: u32, rows: u32, seed: u64) -> Result<Self, MapError> {
        if columns < 3 || rows < 2 {
            return Err(MapError::BoardTooSmall { columns, rows });
        }
        let path = generate_path(kind, columns, rows, seed);
        Ok(Self::from_trusted_path(Some(kind), columns, rows, path))
    }

    /// Validates a caller-provided path and builds the board around it.
    ///
    /// The resulting board reports no generator kind.
    pub fn from_path(columns: u32, rows: u32, path: Vec<CellCoord>) -> Result<Self, MapError> {
        if columns == 0 || rows == 0 {
            return Err(MapError::BoardTooSmall { columns, rows });
        }
        if path.len() < 2 {
            return Err(MapError::PathTooShort { len: path.len() });
        }
        if let Some(cell) = path
            .iter()
            .find(|cell| cell.column() >= columns || cell.row() >= rows)
        {
            return Err(MapError::OutOfBounds {
                column: cell.column(),
                row: cell.row(),
            });
        }
        if let Some(index) = path
            .windows(2)
            .position(|pair| pair[0].chebyshev_distance(pair[1]) != 1)
        {
            return Err(MapError::Disconnected { index });
        }
        if path.first() == path.last() {
            return Err(MapError::StartIsBase);
        }
        Ok(Self::from_trusted_path(None, columns, rows, path))
    }

    pub(crate) fn with_kind(mut self, kind: Option<MapKind>) -> Self {
        self.kind = kind;
        self
    }

    fn from_trusted_path(
        kind: Option<MapKind>,
        columns: u32,
        rows: u32,
        path: Vec<CellCoord>,
    ) -> Self {
        let capacity = usize::try_from(u64::from(columns) * u64::from(rows)).unwrap_or(0);
        let mut layout = Self {
            kind,
            columns,
            rows,
            path,
            markers: vec![CellMarker::Empty; capacity],
        };
        let last = layout.path.len().saturating_sub(1);
        for (position, cell) in layout.path.clone().into_iter().enumerate() {
            let marker = match position {
                0 => CellMarker::Start,
                _ if position == last => CellMarker::Base,
                _ => CellMarker::Path,
            };
            if let Some(index) = layout.index(cell) {
                if !matches!(layout.markers[index], CellMarker::Start | CellMarker::Base) {
                    layout.markers[index] = marker;
                }
            }
        }
        layout
    }

    /// Generator that produced the path, if any.
    #[must_use]
    pub const fn kind(&self) -> Option<MapKind> {
        self.kind
    }

    /// Number of columns on the board.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows on the board.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Ordered path cells from start to base.
    #[must_use]
    pub fn path(&self) -> &[CellCoord] {
        &self.path
    }

    /// First cell of the path.
    #[must_use]
    pub fn start(&self) -> CellCoord {
        self.path.first().copied().unwrap_or(CellCoord::new(0, 0))
    }

    /// Last cell of the path.
    #[must_use]
    pub fn base(&self) -> CellCoord {
        self.path.last().copied().unwrap_or(CellCoord::new(0, 0))
    }

    /// Reports whether the cell lies on the board.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Marker stored for the cell, or `None` when it lies outside the board.
    #[must_use]
    pub fn marker(&self, cell: CellCoord) -> Option<CellMarker> {
        self.index(cell).map(|index| self.markers[index])
    }

    /// Rows of markers in reading order, for text renderers.
    pub fn marker_rows(&self) -> impl Iterator<Item = &[CellMarker]> {
        let width = usize::try_from(self.columns).unwrap_or(1).max(1);
        self.markers.chunks(width)
    }

    pub(crate) fn place_tower(&mut self, cell: CellCoord, kind: TowerKind) {
        if let Some(index) = self.index(cell) {
            self.markers[index] = CellMarker::Tower(kind);
        }
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        Some(row * width + column)
    }
}

fn generate_path(kind: MapKind, columns: u32, rows: u32, seed: u64) -> Vec<CellCoord> {
    match kind {
        MapKind::Linear => linear_path(columns, rows),
        MapKind::Winding => winding_path(columns, rows, seed),
        MapKind::Diagonal => diagonal_path(columns, rows),
    }
}

fn linear_path(columns: u32, rows: u32) -> Vec<CellCoord> {
    let column = columns / 2;
    (0..rows).map(|row| CellCoord::new(column, row)).collect()
}

fn diagonal_path(columns: u32, rows: u32) -> Vec<CellCoord> {
    let target = CellCoord::new(columns.saturating_sub(1), rows.saturating_sub(1));
    let mut cell = CellCoord::new(0, 0);
    let mut path = vec![cell];
    while cell != target {
        cell = cell.step_toward(target);
        path.push(cell);
    }
    path
}

fn winding_path(columns: u32, rows: u32, seed: u64) -> Vec<CellCoord> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let lowest = 1.min(columns - 1);
    let highest = columns.saturating_sub(2).max(lowest);
    let mut column = columns / 2;
    let mut path = Vec::with_capacity(usize::try_from(rows).unwrap_or(0));
    for row in 0..rows {
        if row > 0 {
            column = match rng.gen_range(0..3) {
                0 if column > lowest => column - 1,
                2 if column < highest => column + 1,
                _ => column,
            };
        }
        path.push(CellCoord::new(column, row));
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_connected(layout: &MapLayout) {
        for pair in layout.path().windows(2) {
            assert_eq!(pair[0].chebyshev_distance(pair[1]), 1, "{pair:?}");
        }
    }

    #[test]
    fn standard_generators_produce_connected_paths() {
        for kind in [MapKind::Linear, MapKind::Winding, MapKind::Diagonal] {
            let layout = MapLayout::standard(kind, 7);
            assert_eq!(layout.columns(), STANDARD_COLUMNS);
            assert_eq!(layout.rows(), STANDARD_ROWS);
            assert_connected(&layout);
            assert_ne!(layout.start(), layout.base());
            assert_eq!(layout.marker(layout.start()), Some(CellMarker::Start));
            assert_eq!(layout.marker(layout.base()), Some(CellMarker::Base));
        }
    }

    #[test]
    fn linear_path_runs_down_the_middle() {
        let layout = MapLayout::standard(MapKind::Linear, 0);
        assert_eq!(layout.start(), CellCoord::new(13, 0));
        assert_eq!(layout.base(), CellCoord::new(13, 25));
        assert_eq!(layout.path().len(), 26);
    }

    #[test]
    fn diagonal_path_reaches_far_corner() {
        let layout = MapLayout::generate(MapKind::Diagonal, 6, 4, 0).expect("valid board");
        assert_eq!(layout.start(), CellCoord::new(0, 0));
        assert_eq!(layout.base(), CellCoord::new(5, 3));
        assert_eq!(layout.kind(), Some(MapKind::Diagonal));
        assert_connected(&layout);
    }

    #[test]
    fn winding_path_is_deterministic_per_seed() {
        let first = MapLayout::standard(MapKind::Winding, 99);
        let second = MapLayout::standard(MapKind::Winding, 99);
        assert_eq!(first, second);
        for pair in first.path().windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }

    #[test]
    fn custom_paths_are_validated() {
        assert_eq!(
            MapLayout::from_path(4, 4, vec![CellCoord::new(0, 0)]),
            Err(MapError::PathTooShort { len: 1 })
        );
        assert_eq!(
            MapLayout::from_path(4, 4, vec![CellCoord::new(0, 0), CellCoord::new(4, 0)]),
            Err(MapError::OutOfBounds { column: 4, row: 0 })
        );
        assert_eq!(
            MapLayout::from_path(
                4,
                4,
                vec![
                    CellCoord::new(0, 0),
                    CellCoord::new(1, 0),
                    CellCoord::new(3, 0)
                ]
            ),
            Err(MapError::Disconnected { index: 1 })
        );
        assert_eq!(
            MapLayout::from_path(
                4,
                4,
                vec![
                    CellCoord::new(0, 0),
                    CellCoord::new(1, 0),
                    CellCoord::new(0, 0)
                ]
            ),
            Err(MapError::StartIsBase)
        );
    }

    #[test]
    fn markers_outside_board_are_absent() {
        let layout = MapLayout::standard(MapKind::Linear, 0);
        assert_eq!(layout.marker(CellCoord::new(26, 0)), None);
        assert_eq!(layout.marker(CellCoord::new(0, 0)), Some(CellMarker::Empty));
        assert_eq!(layout.marker_rows().count(), 26);
    }
}
