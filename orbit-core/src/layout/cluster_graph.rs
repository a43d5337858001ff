// Packing of clusters onto a grid.
//
// Two coordinate systems:
// - the grid: rows and columns of positions with no size. Every row has the
//   same number of positions and each position holds at most one cluster.
// - the unit graph: "graph paper" of `cluster_unit_size` cells. Once the
//   clusters are measured, every position gets a unit footprint large
//   enough for its cluster, placed so that no two footprints overlap.
//
// Edits only touch the grid. Unit footprints and cluster layouts are derived
// state; they are computed on demand (`calculate`) and dropped after every
// edit.
//
// Insertion:
// - first empty position in row-major order, else grow the grid by a row or
//   a column, whichever keeps the unit graph closer to square.
// - near a context cluster: first empty position of its insert zone
//   (above-right, right, below-right, below, below-left). Zone positions
//   outside the grid are created on demand. If the zone is full, a column is
//   shifted in to the right of the anchor or a row below it.
// Removal contracts any row or column left completely empty.

use std::collections::HashMap;

use tracing::{debug, info};

use super::{Cluster, ClusterLayout, LayoutConfig, PointI, SizeI, UnitGraph};
use crate::arrows::{self, ArrowGraph, CanvasId};
use crate::codec::{self, GridRecord, PositionRecord};
use crate::error::{LayoutError, Result};

#[derive(Debug, Clone, Default)]
struct Position {
    x_unit: i32,
    y_unit: i32,
    x_unit_span: i32,
    y_unit_span: i32,
    row: usize,
    column: usize,
    cluster: Option<Cluster>,
    /// Layout around the local origin, from the last `calculate`.
    layout: Option<ClusterLayout>,
}

impl Position {
    fn new(row: usize, column: usize) -> Self {
        Self { row, column, ..Self::default() }
    }

    fn from_record(record: &PositionRecord) -> Self {
        Self {
            x_unit: record.x_unit,
            y_unit: record.y_unit,
            x_unit_span: record.x_unit_span,
            y_unit_span: record.y_unit_span,
            row: record.row,
            column: record.column,
            cluster: record.root.map(Cluster::new),
            layout: None,
        }
    }

    fn is_empty(&self) -> bool {
        self.cluster.is_none()
    }

    fn root(&self) -> Option<CanvasId> {
        self.cluster.as_ref().map(Cluster::root)
    }

    fn right_extent(&self) -> i32 {
        self.x_unit + self.x_unit_span
    }

    fn down_extent(&self) -> i32 {
        self.y_unit + self.y_unit_span
    }

    fn record(&self) -> PositionRecord {
        PositionRecord {
            x_unit: self.x_unit,
            y_unit: self.y_unit,
            x_unit_span: self.x_unit_span,
            y_unit_span: self.y_unit_span,
            row: self.row,
            column: self.column,
            root: self.root(),
        }
    }

    /// Center the measured layout in this position's unit bounds.
    fn centered_layout(&mut self, unit: SizeI) -> Option<ClusterLayout> {
        let mut layout = self.layout.clone()?;
        let bounds = SizeI {
            w: self.x_unit_span * unit.w,
            h: self.y_unit_span * unit.h,
        };
        let center = layout.center_within_bounds(bounds);
        let location = PointI::new(self.x_unit * unit.w + center.x, self.y_unit * unit.h + center.y);

        // the stored layout is centered on the origin
        layout.translate_by(location.x, location.y);
        if let Some(cluster) = self.cluster.as_mut() {
            cluster.set_location(location);
        }
        Some(layout)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Direction {
    Down,
    Right,
}

#[derive(Debug, Clone)]
pub struct ClusterGraph {
    config: LayoutConfig,
    rows: Vec<Vec<Position>>,
    column_count: usize,
    /// Root canvas -> (row, column).
    index: HashMap<CanvasId, (usize, usize)>,
    calculated: bool,
    unit_graph: UnitGraph,
}

impl ClusterGraph {
    /// An empty 1x1 grid.
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            rows: vec![vec![Position::new(0, 0)]],
            column_count: 1,
            index: HashMap::new(),
            calculated: false,
            unit_graph: UnitGraph::new(),
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    pub fn contains(&self, root: CanvasId) -> bool {
        self.index.contains_key(&root)
    }

    /// `(row, column)` of the position holding the cluster rooted at `root`.
    pub fn position_of(&self, root: CanvasId) -> Option<(usize, usize)> {
        self.index.get(&root).copied()
    }

    /// Roots of every placed cluster, in row-major order.
    pub fn roots(&self) -> Vec<CanvasId> {
        self.rows.iter().flatten().filter_map(Position::root).collect()
    }

    /// Snapshot of every position. Unit fields reflect the last calculation.
    pub fn to_record(&self) -> GridRecord {
        GridRecord {
            rows: self
                .rows
                .iter()
                .map(|row| row.iter().map(Position::record).collect())
                .collect(),
        }
    }

    /// Insert a cluster at the first empty position, growing the grid if
    /// there is none. Inserting a root that is already placed does nothing.
    pub fn insert<A: ArrowGraph + ?Sized>(&mut self, arrows: &A, root: CanvasId) -> Result<()> {
        if self.contains(root) {
            debug!(cluster = %arrows::label(arrows, root), "cluster already placed");
            return Ok(());
        }
        self.calculate(arrows)?;

        let (r, c) = self.find_empty_position();
        self.occupy(r, c, root);
        info!(cluster = %arrows::label(arrows, root), row = r, column = c, "cluster inserted");
        Ok(())
    }

    /// Insert a cluster next to the cluster rooted at `context_root`.
    pub fn insert_near<A: ArrowGraph + ?Sized>(&mut self, arrows: &A, context_root: CanvasId, root: CanvasId) -> Result<()> {
        let anchor = self
            .position_of(context_root)
            .ok_or(LayoutError::UnknownCluster { canvas: context_root })?;
        if self.contains(root) {
            debug!(cluster = %arrows::label(arrows, root), "cluster already placed");
            return Ok(());
        }
        self.calculate(arrows)?;

        let (r, c) = match self.find_empty_in_zone(anchor) {
            Some(cell) => cell,
            None => {
                match self.shallowest_direction() {
                    Direction::Right => self.shift_columns_over_from(anchor.1 + 1),
                    Direction::Down => self.shift_rows_down_from(anchor.0 + 1),
                }
                match self.find_empty_in_zone(anchor) {
                    Some(cell) => cell,
                    None => self.find_empty_position(),
                }
            }
        };
        self.occupy(r, c, root);
        info!(
            cluster = %arrows::label(arrows, root),
            near = %arrows::label(arrows, context_root),
            row = r,
            column = c,
            "cluster inserted"
        );
        Ok(())
    }

    /// Clear the position of the cluster rooted at `root`, if there is one,
    /// then drop its row and column if they are now completely empty.
    pub fn remove_if_any(&mut self, root: CanvasId) -> bool {
        let Some((r, c)) = self.index.remove(&root) else {
            return false;
        };
        self.rows[r][c].cluster = None;
        self.rows[r][c].layout = None;

        self.contract_row_if_empty(r);
        self.contract_column_if_empty(c);
        self.renumber();
        self.reset();
        info!(cluster = %root, row = r, column = c, "cluster removed");
        true
    }

    /// Hand the position of `original_root` to a cluster rooted at
    /// `new_root`, keeping the packing as it is.
    pub fn replace(&mut self, original_root: CanvasId, new_root: CanvasId) -> Result<()> {
        if !self.contains(original_root) {
            return Err(LayoutError::UnknownCluster { canvas: original_root });
        }
        if original_root != new_root && self.contains(new_root) {
            self.remove_if_any(new_root);
        }
        let (r, c) = self
            .position_of(original_root)
            .ok_or(LayoutError::UnknownCluster { canvas: original_root })?;

        self.rows[r][c].cluster = Some(Cluster::new(new_root));
        self.rows[r][c].layout = None;
        self.index.remove(&original_root);
        self.index.insert(new_root, (r, c));
        self.reset();
        info!(from = %original_root, to = %new_root, row = r, column = c, "cluster replaced");
        Ok(())
    }

    /// Measure every cluster and assign unit footprints. Does nothing if
    /// nothing changed since the last call.
    pub fn calculate<A: ArrowGraph + ?Sized>(&mut self, arrows: &A) -> Result<()> {
        if self.calculated {
            return Ok(());
        }
        let unit = self.unit_size();
        self.unit_graph.clear();

        for column in 0..self.column_count {
            for row in 0..self.rows.len() {
                let position = &mut self.rows[row][column];
                match position.cluster.as_mut() {
                    Some(cluster) => {
                        let layout = cluster.layout_as_circles(arrows, &self.config)?;
                        let size = layout.bounding_box();
                        position.x_unit_span = div_ceil(size.w, unit.w).max(1);
                        position.y_unit_span = div_ceil(size.h, unit.h).max(1);
                        position.layout = Some(layout);
                    }
                    None => {
                        position.x_unit_span = 0;
                        position.y_unit_span = 0;
                        position.layout = None;
                    }
                }
                let (x, y) = self.unit_graph.place(position.x_unit_span, position.y_unit_span);
                position.x_unit = x;
                position.y_unit = y;
            }
            self.unit_graph.next_column();
        }

        self.calculated = true;
        Ok(())
    }

    /// Lay out every cluster and center it in its unit bounds. Layouts come
    /// back in column-major order, the order the unit graph fills.
    pub fn layout_all<A: ArrowGraph + ?Sized>(&mut self, arrows: &A) -> Result<Vec<ClusterLayout>> {
        self.calculate(arrows)?;
        let unit = self.unit_size();

        let mut layouts = Vec::with_capacity(self.index.len());
        for column in 0..self.column_count {
            for row in 0..self.rows.len() {
                layouts.extend(self.rows[row][column].centered_layout(unit));
            }
        }
        Ok(layouts)
    }

    /// Persisted form of the grid, with freshly calculated unit footprints.
    pub fn serialize<A: ArrowGraph + ?Sized>(&mut self, arrows: &A) -> Result<String> {
        self.calculate(arrows)?;
        Ok(codec::emit_grid(&self.to_record()))
    }

    /// Replace the whole grid with a persisted one. On error the current grid
    /// is left untouched.
    pub fn load(&mut self, text: &str) -> Result<()> {
        let record = codec::parse_grid(text)?;

        let rows: Vec<Vec<Position>> = record
            .rows
            .iter()
            .map(|row| row.iter().map(Position::from_record).collect())
            .collect();

        self.column_count = record.column_count();
        self.rows = rows;
        self.renumber();
        self.reset();
        info!(
            rows = self.rows.len(),
            columns = self.column_count,
            clusters = self.index.len(),
            "cluster graph loaded"
        );
        Ok(())
    }

    fn unit_size(&self) -> SizeI {
        SizeI {
            w: self.config.cluster_unit_size.w.max(1),
            h: self.config.cluster_unit_size.h.max(1),
        }
    }

    /// Drop derived state so the next use recalculates. Needed whenever the
    /// arrow graph changes behind the grid's back.
    pub fn reset(&mut self) {
        self.calculated = false;
        self.unit_graph.clear();
        for position in self.rows.iter_mut().flatten() {
            position.layout = None;
            if let Some(cluster) = position.cluster.as_mut() {
                cluster.reset();
            }
        }
    }

    fn occupy(&mut self, r: usize, c: usize, root: CanvasId) {
        self.rows[r][c].cluster = Some(Cluster::new(root));
        self.renumber();
        self.reset();
    }

    /// Resync every position's indices with its place and rebuild the root
    /// index.
    fn renumber(&mut self) {
        self.index.clear();
        for (r, row) in self.rows.iter_mut().enumerate() {
            for (c, position) in row.iter_mut().enumerate() {
                position.row = r;
                position.column = c;
                if let Some(root) = position.root() {
                    self.index.insert(root, (r, c));
                }
            }
        }
    }

    fn add_row(&mut self) {
        let r = self.rows.len();
        self.rows.push((0..self.column_count).map(|c| Position::new(r, c)).collect());
    }

    fn add_column(&mut self) {
        let c = self.column_count;
        for (r, row) in self.rows.iter_mut().enumerate() {
            row.push(Position::new(r, c));
        }
        self.column_count += 1;
    }

    /// Grow the grid until `(r, c)` exists.
    fn materialize(&mut self, r: usize, c: usize) {
        while self.rows.len() <= r {
            self.add_row();
        }
        while self.column_count <= c {
            self.add_column();
        }
    }

    fn find_empty_position(&mut self) -> (usize, usize) {
        for (r, row) in self.rows.iter().enumerate() {
            if let Some(c) = row.iter().position(Position::is_empty) {
                return (r, c);
            }
        }

        match self.shallowest_direction() {
            Direction::Right => {
                self.add_column();
                (0, self.column_count - 1)
            }
            Direction::Down => {
                self.add_row();
                (self.rows.len() - 1, 0)
            }
        }
    }

    fn insert_zone((r, c): (usize, usize)) -> Vec<(usize, usize)> {
        let mut zone = Vec::with_capacity(5);
        if r > 0 {
            zone.push((r - 1, c + 1));
        }
        zone.push((r, c + 1));
        zone.push((r + 1, c + 1));
        zone.push((r + 1, c));
        if c > 0 {
            zone.push((r + 1, c - 1));
        }
        zone
    }

    fn find_empty_in_zone(&mut self, anchor: (usize, usize)) -> Option<(usize, usize)> {
        for (r, c) in Self::insert_zone(anchor) {
            if r >= self.rows.len() || c >= self.column_count {
                self.materialize(r, c);
                return Some((r, c));
            }
            if self.rows[r][c].is_empty() {
                return Some((r, c));
            }
        }
        None
    }

    /// Grow along the axis with less extent so the packing stays compact.
    /// Ties grow rightward.
    fn shallowest_direction(&self) -> Direction {
        let max_right = self
            .rows
            .iter()
            .filter_map(|row| row.last())
            .map(Position::right_extent)
            .max()
            .unwrap_or(0);
        let max_down = self
            .rows
            .last()
            .map(|row| row.iter().map(Position::down_extent).max().unwrap_or(0))
            .unwrap_or(0);

        if max_right > max_down { Direction::Down } else { Direction::Right }
    }

    fn shift_columns_over_from(&mut self, column: usize) {
        for (r, row) in self.rows.iter_mut().enumerate() {
            row.insert(column.min(row.len()), Position::new(r, column));
        }
        self.column_count += 1;
        self.renumber();
    }

    fn shift_rows_down_from(&mut self, row: usize) {
        let new_row = (0..self.column_count).map(|c| Position::new(row, c)).collect();
        self.rows.insert(row.min(self.rows.len()), new_row);
        self.renumber();
    }

    fn contract_row_if_empty(&mut self, r: usize) {
        if self.rows.len() <= 1 || !self.rows[r].iter().all(Position::is_empty) {
            return;
        }
        self.rows.remove(r);
    }

    fn contract_column_if_empty(&mut self, c: usize) {
        if self.column_count <= 1 || !self.rows.iter().all(|row| row[c].is_empty()) {
            return;
        }
        for row in &mut self.rows {
            row.remove(c);
        }
        self.column_count -= 1;
    }
}

fn div_ceil(value: i32, unit: i32) -> i32 {
    (value + unit - 1).div_euclid(unit)
}
