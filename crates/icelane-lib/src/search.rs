//! 8-connected A* search over a navigability grid.
//!
//! Working state is arena-style: cumulative costs and predecessors live in
//! flat row-major arrays addressed by `row * width + col`, and the path is
//! reconstructed by walking predecessor indices only after the frontier
//! reaches the goal. An exhausted frontier is a domain outcome (no maritime
//! route), reported as an empty path rather than an error.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::f64::consts::SQRT_2;

use serde::Serialize;
use tracing::debug;

use crate::classify::NavigabilityGrid;
use crate::corridor::CorridorModel;
use crate::error::{Error, Result};
use crate::geocode::Geocoder;
use crate::raster::GridCell;

/// Base cost of an orthogonal step.
const ORTHOGONAL_COST: f64 = 1.0;
/// Base cost of a diagonal step.
const DIAGONAL_COST: f64 = SQRT_2;

/// The four orthogonal and four diagonal neighbor offsets.
const NEIGHBOR_OFFSETS: [(i64, i64); 8] = [
    (-1, 0),
    (1, 0),
    (0, -1),
    (0, 1),
    (-1, -1),
    (-1, 1),
    (1, -1),
    (1, 1),
];

/// Ordered cell sequence from start to goal with its accumulated cost.
///
/// An empty path means the search ran to completion without connecting the
/// endpoints.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PixelPath {
    pub cells: Vec<GridCell>,
    pub total_cost: f64,
    /// Nodes expanded before termination, for observability.
    pub expanded: usize,
}

impl PixelPath {
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }
}

/// Safety limits applied to a single search invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SearchLimits {
    /// Abort with [`Error::SearchTimedOut`] after this many expansions.
    pub max_expansions: Option<usize>,
}

/// Corridor-aware traversal costs with a lazily filled per-cell cache.
///
/// The corridor query walks every lane geometry, so each cell's multiplier
/// is computed at most once per search.
pub struct TraversalCosts<'a> {
    corridor: &'a CorridorModel,
    geocoder: &'a Geocoder,
    width: usize,
    cache: RefCell<Vec<f64>>,
}

impl<'a> TraversalCosts<'a> {
    pub fn new(
        corridor: &'a CorridorModel,
        geocoder: &'a Geocoder,
        width: usize,
        height: usize,
    ) -> Self {
        Self {
            corridor,
            geocoder,
            width,
            cache: RefCell::new(vec![f64::NAN; width * height]),
        }
    }

    fn multiplier(&self, cell: GridCell) -> f64 {
        let index = cell.index(self.width);
        let cached = self.cache.borrow()[index];
        if !cached.is_nan() {
            return cached;
        }

        let (lon, lat) = self.geocoder.to_lonlat(cell);
        let multiplier = self.corridor.cost_multiplier(lon, lat);
        self.cache.borrow_mut()[index] = multiplier;
        multiplier
    }
}

/// Find the nearest traversable cell within `radius` of `cell`, scanning
/// Chebyshev rings outward. Fails with [`Error::NoOpenCellNearby`] when the
/// neighborhood is fully blocked.
pub fn snap_to_open(grid: &NavigabilityGrid, cell: GridCell, radius: usize) -> Result<GridCell> {
    if grid.is_traversable(cell) {
        return Ok(cell);
    }

    let (row, col) = (cell.row as i64, cell.col as i64);
    for ring in 1..=radius as i64 {
        for dr in -ring..=ring {
            for dc in -ring..=ring {
                if dr.abs() != ring && dc.abs() != ring {
                    continue; // interior of the ring, already scanned
                }
                let (r, c) = (row + dr, col + dc);
                if !grid.in_bounds(r, c) {
                    continue;
                }
                let candidate = GridCell::new(r as usize, c as usize);
                if grid.is_traversable(candidate) {
                    debug!(
                        from = ?cell,
                        to = ?candidate,
                        ring,
                        "snapped blocked endpoint to open water"
                    );
                    return Ok(candidate);
                }
            }
        }
    }

    Err(Error::NoOpenCellNearby {
        row: cell.row,
        col: cell.col,
        radius,
    })
}

/// Run A* from `start` to `goal` over the grid.
///
/// Neighbors are enqueued only when in bounds and traversable; relaxation
/// requires a strict improvement; frontier ties break on lower cumulative
/// cost, then lower cell index, so results are deterministic. When `costs`
/// is supplied, each step is scaled by the corridor multiplier of the cell
/// being entered.
pub fn find_path(
    grid: &NavigabilityGrid,
    start: GridCell,
    goal: GridCell,
    costs: Option<&TraversalCosts<'_>>,
    limits: SearchLimits,
) -> Result<PixelPath> {
    let width = grid.width();

    if start == goal {
        return Ok(PixelPath {
            cells: vec![start],
            total_cost: 0.0,
            expanded: 0,
        });
    }

    let mut g_score = vec![f64::INFINITY; width * grid.height()];
    let mut parents = vec![usize::MAX; width * grid.height()];
    let mut frontier = BinaryHeap::new();
    let mut expanded = 0usize;

    let start_index = start.index(width);
    let goal_index = goal.index(width);
    g_score[start_index] = 0.0;
    frontier.push(FrontierEntry::new(
        manhattan(start, goal),
        0.0,
        start_index,
    ));

    while let Some(entry) = frontier.pop() {
        // Stale entry from a later relaxation of the same cell.
        if entry.cost.0 > g_score[entry.index] {
            continue;
        }

        if entry.index == goal_index {
            return Ok(reconstruct(
                &parents,
                start_index,
                goal_index,
                g_score[goal_index],
                expanded,
                width,
            ));
        }

        expanded += 1;
        if let Some(max_expansions) = limits.max_expansions {
            if expanded > max_expansions {
                return Err(Error::SearchTimedOut { max_expansions });
            }
        }

        let (row, col) = (
            (entry.index / width) as i64,
            (entry.index % width) as i64,
        );
        for (dr, dc) in NEIGHBOR_OFFSETS {
            let (r, c) = (row + dr, col + dc);
            if !grid.in_bounds(r, c) {
                continue;
            }
            let neighbor = GridCell::new(r as usize, c as usize);
            if !grid.is_traversable(neighbor) {
                continue;
            }

            let base = if dr != 0 && dc != 0 {
                DIAGONAL_COST
            } else {
                ORTHOGONAL_COST
            };
            let step = match costs {
                Some(costs) => base * costs.multiplier(neighbor),
                None => base,
            };

            let tentative = g_score[entry.index] + step;
            let neighbor_index = neighbor.index(width);
            if tentative < g_score[neighbor_index] {
                g_score[neighbor_index] = tentative;
                parents[neighbor_index] = entry.index;
                frontier.push(FrontierEntry::new(
                    tentative + manhattan(neighbor, goal),
                    tentative,
                    neighbor_index,
                ));
            }
        }
    }

    debug!(expanded, "frontier exhausted without reaching the goal");
    Ok(PixelPath {
        cells: Vec::new(),
        total_cost: 0.0,
        expanded,
    })
}

/// Manhattan distance heuristic on grid indices.
fn manhattan(a: GridCell, b: GridCell) -> f64 {
    (a.row.abs_diff(b.row) + a.col.abs_diff(b.col)) as f64
}

fn reconstruct(
    parents: &[usize],
    start_index: usize,
    goal_index: usize,
    total_cost: f64,
    expanded: usize,
    width: usize,
) -> PixelPath {
    let mut cells = Vec::new();
    let mut current = goal_index;
    loop {
        cells.push(GridCell::new(current / width, current % width));
        if current == start_index {
            break;
        }
        current = parents[current];
    }
    cells.reverse();

    PixelPath {
        cells,
        total_cost,
        expanded,
    }
}

#[derive(Copy, Clone, Debug, Default)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq(&other.0)
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct FrontierEntry {
    estimate: FloatOrd,
    cost: FloatOrd,
    index: usize,
}

impl FrontierEntry {
    fn new(estimate: f64, cost: f64, index: usize) -> Self {
        Self {
            estimate: FloatOrd(estimate),
            cost: FloatOrd(cost),
            index,
        }
    }
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering so BinaryHeap becomes a min-heap: lower estimate
        // first, ties by lower cumulative cost, then lower cell index.
        other
            .estimate
            .cmp(&self.estimate)
            .then_with(|| other.cost.cmp(&self.cost))
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
