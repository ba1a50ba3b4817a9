//! Uniform grid bucketing for pairwise neighbour scans.
//!
//! Agents are counting-sorted into square cells (cell start offsets plus a
//! flat index table), so a query only visits the 3×3 block of cells around a
//! point. With a cell size at least the query radius, every pair closer than
//! the radius is found. Candidates come back sorted by agent index, which
//! keeps results identical to a plain `for j in i + 1..n` scan.

use glam::Vec2;

/// Upper bound on cells per agent. Sparse grids are coarsened to stay under it.
const MAX_CELLS_PER_AGENT: usize = 4;
const MIN_CELLS: usize = 64;

#[derive(Debug, Clone, Default)]
pub struct SpatialGrid {
    cell_size: f32,
    cols: usize,
    rows: usize,
    /// `cell_start[c]..cell_start[c + 1]` indexes into `entries` for cell `c`.
    cell_start: Vec<u32>,
    entries: Vec<u32>,
    cell_of_agent: Vec<u32>,
}

impl SpatialGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Effective cell size of the last rebuild.
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Grid dimensions in cells.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    /// Bucket `positions` into cells no smaller than `radius`.
    pub fn rebuild(&mut self, bounds: Vec2, radius: f32, positions: &[Vec2]) {
        let w = if bounds.x.is_finite() { bounds.x.max(0.0) } else { 0.0 };
        let h = if bounds.y.is_finite() { bounds.y.max(0.0) } else { 0.0 };

        let max_cells = (positions.len() * MAX_CELLS_PER_AGENT).max(MIN_CELLS);
        let mut cell = if radius.is_finite() && radius > 0.0 {
            radius
        } else {
            w.max(h).max(1.0)
        };
        let min_for_budget = ((w * h) / max_cells as f32).sqrt();
        if cell < min_for_budget {
            cell = min_for_budget;
        }

        self.cell_size = cell;
        self.cols = ((w / cell).ceil() as usize).max(1);
        self.rows = ((h / cell).ceil() as usize).max(1);
        let cells = self.cols * self.rows;

        let mut cell_of_agent = std::mem::take(&mut self.cell_of_agent);
        cell_of_agent.clear();
        cell_of_agent.extend(positions.iter().map(|&p| self.cell_index(p) as u32));
        self.cell_of_agent = cell_of_agent;

        // Counting sort: histogram, exclusive prefix sum, scatter.
        self.cell_start.clear();
        self.cell_start.resize(cells + 1, 0);
        for &c in &self.cell_of_agent {
            self.cell_start[c as usize + 1] += 1;
        }
        for c in 0..cells {
            self.cell_start[c + 1] += self.cell_start[c];
        }
        self.entries.clear();
        self.entries.resize(positions.len(), 0);
        let mut cursor: Vec<u32> = self.cell_start[..cells].to_vec();
        for (agent, &c) in self.cell_of_agent.iter().enumerate() {
            let slot = &mut cursor[c as usize];
            self.entries[*slot as usize] = agent as u32;
            *slot += 1;
        }
    }

    fn cell_coords(&self, p: Vec2) -> (usize, usize) {
        // `as usize` saturates: negatives and NaN land in cell 0.
        let cx = ((p.x / self.cell_size).floor() as usize).min(self.cols - 1);
        let cy = ((p.y / self.cell_size).floor() as usize).min(self.rows - 1);
        (cx, cy)
    }

    fn cell_index(&self, p: Vec2) -> usize {
        let (cx, cy) = self.cell_coords(p);
        cy * self.cols + cx
    }

    /// Indices of agents in the 3×3 cells around `agent` that are greater
    /// than `agent`, ascending. `out` is cleared first.
    pub fn candidates_after(&self, agent: usize, out: &mut Vec<usize>) {
        out.clear();
        let Some(&cell) = self.cell_of_agent.get(agent) else {
            return;
        };
        let cx = cell as usize % self.cols;
        let cy = cell as usize / self.cols;
        for y in cy.saturating_sub(1)..=(cy + 1).min(self.rows - 1) {
            for x in cx.saturating_sub(1)..=(cx + 1).min(self.cols - 1) {
                let c = y * self.cols + x;
                let range = self.cell_start[c] as usize..self.cell_start[c + 1] as usize;
                out.extend(
                    self.entries[range]
                        .iter()
                        .map(|&j| j as usize)
                        .filter(|&j| j > agent),
                );
            }
        }
        out.sort_unstable();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn brute_force(positions: &[Vec2], radius: f32) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for i in 0..positions.len() {
            for j in i + 1..positions.len() {
                if positions[i].distance(positions[j]) < radius {
                    pairs.push((i, j));
                }
            }
        }
        pairs
    }

    fn via_grid(bounds: Vec2, positions: &[Vec2], radius: f32) -> Vec<(usize, usize)> {
        let mut grid = SpatialGrid::new();
        grid.rebuild(bounds, radius, positions);
        let mut pairs = Vec::new();
        let mut scratch = Vec::new();
        for i in 0..positions.len() {
            grid.candidates_after(i, &mut scratch);
            for &j in &scratch {
                if positions[i].distance(positions[j]) < radius {
                    pairs.push((i, j));
                }
            }
        }
        pairs
    }

    #[test]
    fn test_grid_matches_brute_force() {
        let mut rng = SmallRng::seed_from_u64(7);
        let bounds = Vec2::new(640.0, 480.0);
        let positions: Vec<Vec2> = (0..400)
            .map(|_| Vec2::new(rng.gen::<f32>() * bounds.x, rng.gen::<f32>() * bounds.y))
            .collect();
        for radius in [5.0, 37.5, 100.0, 1000.0] {
            assert_eq!(via_grid(bounds, &positions, radius), brute_force(&positions, radius));
        }
    }

    #[test]
    fn test_edges_and_out_of_bounds() {
        let bounds = Vec2::new(100.0, 100.0);
        let positions = vec![
            Vec2::new(100.0, 100.0),
            Vec2::new(95.0, 99.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(-3.0, 2.0),
            Vec2::new(140.0, 50.0),
            Vec2::new(f32::NAN, 5.0),
        ];
        assert_eq!(via_grid(bounds, &positions, 10.0), brute_force(&positions, 10.0));
    }

    #[test]
    fn test_candidates_sorted_and_after() {
        let positions = vec![Vec2::splat(5.0); 6];
        let mut grid = SpatialGrid::new();
        grid.rebuild(Vec2::splat(10.0), 20.0, &positions);
        let mut out = Vec::new();
        grid.candidates_after(2, &mut out);
        assert_eq!(out, vec![3, 4, 5]);
        grid.candidates_after(99, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_sparse_grid_is_coarsened() {
        let positions = vec![Vec2::ZERO; 4];
        let mut grid = SpatialGrid::new();
        grid.rebuild(Vec2::new(10_000.0, 10_000.0), 1.0, &positions);
        let (cols, rows) = grid.dimensions();
        assert!(cols * rows <= MIN_CELLS + cols + rows);
    }

    #[test]
    fn test_empty_bounds() {
        let positions = vec![Vec2::ZERO; 3];
        let mut grid = SpatialGrid::new();
        grid.rebuild(Vec2::ZERO, 50.0, &positions);
        assert_eq!(grid.dimensions(), (1, 1));
        let mut out = Vec::new();
        grid.candidates_after(0, &mut out);
        assert_eq!(out, vec![1, 2]);
    }
}
