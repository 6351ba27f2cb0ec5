use crate::{Scalar, Vec2};
use na::Vector2;
use smallvec::SmallVec;
use std::ops::{Index, IndexMut};

/// A 2d Coordinate composed of 2 integers.
pub type Coord = Vector2<usize>;

/// Represents a single grid cell. A grid cell contains a list of the particles within it, and the
/// ids of the cells that have to be checked for interactions with it.
///
/// `SmallVec`s are used to prevent unnecessary allocation.
#[derive(Clone, Debug, Default)]
pub struct GridCell {
    pub particles: SmallVec<[usize; 8]>,
    /// The forward half of the neighborhood: the next cell in the row, and the three cells in the
    /// row above. Visiting only these means every pair of cells is seen once.
    pub neighbors: SmallVec<[usize; 4]>,
}

/// How the domain `[0, bounds.x] x [0, bounds.y]` is divided into cells, without any particles.
///
/// This is all the pointer needs to find the cell it is in, so solvers that don't bucket their
/// particles keep only this.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellLayout {
    dims: Coord,
    bounds: Vec2,
}

impl CellLayout {
    /// Cells are at least `cell_size` wide, and there is always at least one.
    pub fn new(bounds: Vec2, cell_size: Scalar) -> Self {
        CellLayout {
            dims: bounds.map(|b| ((b / cell_size).floor() as usize).max(1)),
            bounds,
        }
    }

    pub fn dims(&self) -> Coord {
        self.dims
    }

    pub fn num_cells(&self) -> usize {
        self.dims.x * self.dims.y
    }

    pub(crate) fn coord_to_index(&self, i: Coord) -> usize {
        i.x + self.dims.x * i.y
    }

    /// Returns the coordinate of the cell containing `pos`, or `None` if `pos` is outside the
    /// grid (or not a number).
    pub fn try_position_to_coord(&self, pos: Vec2) -> Option<Coord> {
        let i = (self.dims.x as Scalar * pos.x / self.bounds.x).floor();
        let j = (self.dims.y as Scalar * pos.y / self.bounds.y).floor();

        // NaN fails both comparisons
        let in_range = |v: Scalar, max: usize| v >= 0. && v < max as Scalar;
        if in_range(i, self.dims.x) && in_range(j, self.dims.y) {
            Some(Vector2::new(i as usize, j as usize))
        } else {
            None
        }
    }

    /// Like `try_position_to_coord`, but positions outside of the grid are clamped to the closest
    /// cell. A NaN component is clamped to the first row/column.
    pub fn position_to_coord(&self, pos: Vec2) -> Coord {
        if let Some(coord) = self.try_position_to_coord(pos) {
            return coord;
        }

        tracing::warn!(?pos, "particle outside of the grid, clamping it into range");

        let clamp = |p: Scalar, bound: Scalar, dim: usize| {
            let i = (dim as Scalar * p / bound).floor();
            if i.is_nan() || i < 0. {
                0
            } else {
                usize::min(i as usize, dim - 1)
            }
        };
        Vector2::new(
            clamp(pos.x, self.bounds.x, self.dims.x),
            clamp(pos.y, self.bounds.y, self.dims.y),
        )
    }
}

/// The Grid structure used to speed up SPH neighbor finding.
///
/// Cells are at least `cell_size` wide, so two particles within `cell_size` of each other are
/// always in the same or adjacent cells.
#[derive(Clone, Debug)]
pub struct Grid {
    pub(crate) cells: Vec<GridCell>,
    layout: CellLayout,
}

impl Grid {
    pub fn new(bounds: Vec2, cell_size: Scalar) -> Self {
        let layout = CellLayout::new(bounds, cell_size);
        let dims = layout.dims();

        let mut cells = vec![GridCell::default(); layout.num_cells()];
        for j in 0..dims.y {
            for i in 0..dims.x {
                let id = i + j * dims.x;
                let neighbors = &mut cells[id].neighbors;
                if i + 1 < dims.x {
                    neighbors.push(id + 1);
                }
                if j + 1 < dims.y {
                    for i2 in i.saturating_sub(1)..=usize::min(dims.x - 1, i + 1) {
                        neighbors.push(i2 + (j + 1) * dims.x);
                    }
                }
            }
        }

        Grid { cells, layout }
    }

    pub fn layout(&self) -> CellLayout {
        self.layout
    }

    pub fn dims(&self) -> Coord {
        self.layout.dims()
    }

    /// Removes every particle from every cell. The neighbor lists are kept.
    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|cell| cell.particles.clear());
    }

    pub fn add_particle(&mut self, pos: Vec2, index: usize) {
        let coord = self.layout.position_to_coord(pos);
        self[coord].particles.push(index);
    }

    /// Rebuilds the grid from scratch, so that every particle is in exactly one cell.
    pub fn rebuild(&mut self, positions: &[Vec2]) {
        self.clear();
        for (index, &pos) in positions.iter().enumerate() {
            self.add_particle(pos, index);
        }
    }

    /// Calls `f` once for every unordered pair of particles that are in the same or in
    /// neighboring cells. Each pair is passed with the lower index first.
    pub fn for_each_pair(&self, mut f: impl FnMut(usize, usize)) {
        for cell in &self.cells {
            for (a, &i) in cell.particles.iter().enumerate() {
                for &j in &cell.particles[a + 1..] {
                    f(usize::min(i, j), usize::max(i, j));
                }

                for &neighbor in &cell.neighbors {
                    for &j in &self.cells[neighbor].particles {
                        f(usize::min(i, j), usize::max(i, j));
                    }
                }
            }
        }
    }
}

impl Index<Coord> for Grid {
    type Output = GridCell;

    fn index(&self, i: Coord) -> &Self::Output {
        let dims = self.layout.dims();
        if i.x >= dims.x || i.y >= dims.y {
            panic!("Attempted to get index out of bounds: {:?}", i);
        }
        let index = self.layout.coord_to_index(i);
        &self.cells[index]
    }
}

impl IndexMut<Coord> for Grid {
    fn index_mut(&mut self, i: Coord) -> &mut Self::Output {
        let dims = self.layout.dims();
        if i.x >= dims.x || i.y >= dims.y {
            panic!("Attempted to get index out of bounds: {:?}", i);
        }
        let index = self.layout.coord_to_index(i);
        &mut self.cells[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn index_to_coord(layout: &CellLayout, index: usize) -> Coord {
        Vector2::new(index % layout.dims().x, index / layout.dims().x)
    }

    proptest! {
        #[test]
        fn index_coord_test(i in 0usize..200) {
            let layout = CellLayout::new(Vec2::new(20., 10.), 1.);
            let coord = index_to_coord(&layout, i);
            let index = layout.coord_to_index(coord);

            prop_assert_eq!(index, i);
        }

        #[test]
        fn positions_always_get_a_cell(x in -50f64..50., y in -50f64..50.) {
            let grid = Grid::new(Vec2::new(7.5, 3.2), 1.);
            let coord = grid.layout().position_to_coord(Vec2::new(x, y));

            prop_assert!(coord.x < grid.dims().x);
            prop_assert!(coord.y < grid.dims().y);
        }
    }

    #[test]
    fn test_dims() {
        let grid = Grid::new(Vec2::new(14.28, 3.9), 1.);
        assert_eq!(grid.dims(), Vector2::new(14, 3));

        let grid = Grid::new(Vec2::new(0.5, 0.5), 1.);
        assert_eq!(grid.dims(), Vector2::new(1, 1));
    }

    #[test]
    fn test_forward_neighbors() {
        let grid = Grid::new(Vec2::new(3., 3.), 1.);

        // bottom left corner: right, and the two cells above
        assert_eq!(grid.cells[0].neighbors.as_slice(), &[1, 3, 4]);
        // middle: right, and the three cells above
        assert_eq!(grid.cells[4].neighbors.as_slice(), &[5, 6, 7, 8]);
        // right edge of the middle row: only the two cells above
        assert_eq!(grid.cells[5].neighbors.as_slice(), &[7, 8]);
        // top row: only the next cell
        assert_eq!(grid.cells[7].neighbors.as_slice(), &[8]);
        assert!(grid.cells[8].neighbors.is_empty());
    }

    #[test]
    fn every_close_pair_is_visited_once() {
        let bounds = Vec2::new(5., 4.);
        let h = 1.;
        let mut grid = Grid::new(bounds, h);

        let positions: Vec<Vec2> = itertools::iproduct!(0..12, 0..9)
            .map(|(i, j)| Vec2::new(0.05 + i as f64 * 0.41, 0.03 + j as f64 * 0.43))
            .collect();
        grid.rebuild(&positions);

        let mut visited = HashSet::new();
        grid.for_each_pair(|i, j| {
            let key = (usize::min(i, j), usize::max(i, j));
            assert_ne!(i, j);
            assert!(visited.insert(key), "pair {:?} visited twice", key);
        });

        for i in 0..positions.len() {
            for j in i + 1..positions.len() {
                if (positions[i] - positions[j]).magnitude_squared() < h * h {
                    assert!(visited.contains(&(i, j)), "missed pair {:?}", (i, j));
                }
            }
        }
    }

    #[test]
    fn out_of_range_particles_are_clamped() {
        let mut grid = Grid::new(Vec2::new(4., 4.), 1.);
        grid.rebuild(&[
            Vec2::new(-1., 2.),
            Vec2::new(2., 9.),
            Vec2::new(f64::NAN, 1.),
        ]);

        let count: usize = grid.cells.iter().map(|c| c.particles.len()).sum();
        assert_eq!(count, 3);
        assert_eq!(grid[Vector2::new(0, 2)].particles.as_slice(), &[0]);
        assert_eq!(grid[Vector2::new(2, 3)].particles.as_slice(), &[1]);
        assert_eq!(grid[Vector2::new(0, 1)].particles.as_slice(), &[2]);
        assert_eq!(grid.layout().try_position_to_coord(Vec2::new(-1., 2.)), None);
    }

    #[test]
    fn pairs_come_lower_index_first() {
        let mut grid = Grid::new(Vec2::new(4., 4.), 1.);
        // particle 0 sits in a later cell than 1 and 2
        grid.rebuild(&[
            Vec2::new(2.1, 2.5),
            Vec2::new(1.8, 2.5),
            Vec2::new(1.5, 2.4),
        ]);

        let mut pairs = Vec::new();
        grid.for_each_pair(|i, j| pairs.push((i, j)));
        pairs.sort_unstable();

        assert_eq!(pairs, vec![(0, 1), (0, 2), (1, 2)]);
    }

    #[test]
    fn fine_layouts_need_no_cells() {
        let layout = CellLayout::new(Vec2::new(16., 16.), 1. / 128.);
        assert_eq!(layout.dims(), Vector2::new(2048, 2048));
        assert_eq!(
            layout.try_position_to_coord(Vec2::new(0.01, 15.)),
            Some(Vector2::new(1, 1920))
        );
    }
}
