//! Uniform grid bucketing for neighbour queries.
//!
//! The arena is covered by a dense square of cells; anything that lands outside is clamped
//! into the border cells, which keeps queries conservative. Grids are rebuilt from scratch
//! every tick, so there is no removal path.

use super::types::{Pellet, Point, Snake};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SegmentRef {
    /// Index into `World::snakes`.
    pub snake: usize,
    /// Segment `i` spans `body[i]..body[i + 1]`.
    pub segment: usize,
}

#[derive(Debug, Clone)]
pub struct SpatialGrid<T> {
    cell_size: f64,
    min_cell: i32,
    dim: i32,
    buckets: Vec<Vec<T>>,
    len: usize,
}

pub type BodyGrid = SpatialGrid<SegmentRef>;
pub type PelletGrid = SpatialGrid<u32>;

impl<T: Copy> SpatialGrid<T> {
    pub fn new(cell_size: f64, half_extent: f64) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            1.0
        };
        let half_cells = ((half_extent.abs() / cell_size).ceil() as i32) + 2;
        let dim = half_cells * 2 + 1;
        let bucket_count = (dim as usize) * (dim as usize);
        Self {
            cell_size,
            min_cell: -half_cells,
            dim,
            buckets: vec![Vec::new(); bucket_count],
            len: 0,
        }
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.len = 0;
    }

    fn max_cell(&self) -> i32 {
        self.min_cell + self.dim - 1
    }

    fn axis_cell(&self, value: f64) -> i32 {
        let raw = (value / self.cell_size).floor();
        let cell = if raw.is_finite() { raw as i32 } else { 0 };
        cell.clamp(self.min_cell, self.max_cell())
    }

    pub fn cell_of(&self, point: Point) -> (i32, i32) {
        (self.axis_cell(point.x), self.axis_cell(point.y))
    }

    fn bucket_index(&self, cx: i32, cy: i32) -> usize {
        let ix = (cx - self.min_cell) as usize;
        let iy = (cy - self.min_cell) as usize;
        iy * self.dim as usize + ix
    }

    pub fn insert_point(&mut self, point: Point, item: T) {
        let (cx, cy) = self.cell_of(point);
        let idx = self.bucket_index(cx, cy);
        self.buckets[idx].push(item);
        self.len += 1;
    }

    /// Inserts `item` into every cell overlapped by the box.
    pub fn insert_aabb(&mut self, min: Point, max: Point, item: T) {
        let (min_x, min_y) = self.cell_of(min);
        let (max_x, max_y) = self.cell_of(max);
        for cy in min_y..=max_y {
            for cx in min_x..=max_x {
                let idx = self.bucket_index(cx, cy);
                self.buckets[idx].push(item);
            }
        }
        self.len += 1;
    }

    /// Visits every entry of every cell overlapping the box. Multi-cell entries can be
    /// visited more than once.
    pub fn query_aabb<F>(&self, min: Point, max: Point, mut visit: F)
    where
        F: FnMut(T),
    {
        let (min_x, min_y) = self.cell_of(min);
        let (max_x, max_y) = self.cell_of(max);
        for cy in min_y..=max_y {
            for cx in min_x..=max_x {
                let idx = self.bucket_index(cx, cy);
                for item in &self.buckets[idx] {
                    visit(*item);
                }
            }
        }
    }

    pub fn query_radius<F>(&self, center: Point, radius: f64, visit: F)
    where
        F: FnMut(T),
    {
        let (min, max) = expanded_aabb(center, center, radius);
        self.query_aabb(min, max, visit);
    }
}

impl<T: Copy + Ord> SpatialGrid<T> {
    /// Like `query_radius`, but sorted and without duplicates.
    pub fn query_radius_unique(&self, center: Point, radius: f64, out: &mut Vec<T>) {
        out.clear();
        self.query_radius(center, radius, |item| out.push(item));
        out.sort_unstable();
        out.dedup();
    }
}

pub fn expanded_aabb(a: Point, b: Point, radius: f64) -> (Point, Point) {
    let radius = radius.max(0.0);
    (
        Point {
            x: a.x.min(b.x) - radius,
            y: a.y.min(b.y) - radius,
        },
        Point {
            x: a.x.max(b.x) + radius,
            y: a.y.max(b.y) + radius,
        },
    )
}

/// Endpoints of segment `index`, or `None` past the end.
pub fn segment_points(snake: &Snake, index: usize) -> Option<(Point, Point)> {
    let a = *snake.body.get(index)?;
    let b = *snake.body.get(index + 1)?;
    Some((a, b))
}

pub fn rebuild_body_grid(grid: &mut BodyGrid, snakes: &[Snake]) {
    grid.clear();
    for (snake_index, snake) in snakes.iter().enumerate() {
        if !snake.is_collidable() {
            continue;
        }
        for segment in 0..snake.body.len().saturating_sub(1) {
            let Some((a, b)) = segment_points(snake, segment) else { break };
            let (min, max) = expanded_aabb(a, b, snake.radius);
            grid.insert_aabb(
                min,
                max,
                SegmentRef {
                    snake: snake_index,
                    segment,
                },
            );
        }
    }
}

pub fn rebuild_pellet_grid(grid: &mut PelletGrid, pellets: &[Pellet]) {
    grid.clear();
    for (index, pellet) in pellets.iter().enumerate() {
        grid.insert_point(pellet.position, index as u32);
    }
}
